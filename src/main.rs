use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use voteroll::export::{Exporter, JsonExporter};
use voteroll::ocr::RecognitionProfile;
use voteroll::pipeline::{extract_document, PipelineConfig};

#[derive(Parser, Debug)]
#[command(name = "voteroll")]
#[command(version, about = "Extract voter records from scanned bilingual electoral-roll PDFs", long_about = None)]
struct Cli {
    /// Input PDF file path
    input: PathBuf,

    /// First page to process (1-based)
    start_page: Option<usize>,

    /// Last page to process (inclusive)
    end_page: Option<usize>,

    /// Rendering DPI for page rasterization
    #[arg(long, default_value_t = 400)]
    dpi: u32,

    /// Pixels added around each detected cell
    #[arg(long, default_value_t = 15)]
    padding: u32,

    /// Recognition languages for whole-cell reads
    #[arg(long, default_value = "hin+eng")]
    body_lang: String,

    /// Recognition languages for the identity-code pass
    #[arg(long, default_value = "eng")]
    header_lang: String,

    /// Recognition languages for the page banner
    #[arg(long, default_value = "hin")]
    village_lang: String,

    /// Directory holding the tesseract language data
    #[arg(long)]
    tessdata_dir: Option<String>,

    /// Write the JSON array to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "voteroll=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if !cli.input.exists() {
        anyhow::bail!("Input file does not exist: {}", cli.input.display());
    }
    if !cli.input.is_file() {
        anyhow::bail!("Input is not a file: {}", cli.input.display());
    }

    let mut config = PipelineConfig::new(cli.input.clone(), cli.dpi)
        .with_page_range(cli.start_page, cli.end_page);
    config.padding = cli.padding;
    config.rescue.body_profile = RecognitionProfile::body(cli.body_lang);
    config.rescue.header_profile = RecognitionProfile::header(cli.header_lang);
    config.village_lang = cli.village_lang;
    config.tessdata_dir = cli.tessdata_dir;

    let result = extract_document(&config)
        .with_context(|| format!("Failed to process PDF: {}", cli.input.display()))?;

    JsonExporter::new(cli.output.clone())
        .pretty(cli.pretty)
        .export(&result.records)
        .with_context(|| "Failed to write voter records")?;

    Ok(())
}
