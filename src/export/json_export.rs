use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::model::VoterRecord;
use crate::export::Exporter;

/// Writes the records as one JSON array, to a file or to stdout.
#[derive(Debug, Clone, Default)]
pub struct JsonExporter {
    destination: Option<PathBuf>,
    pretty: bool,
}

impl JsonExporter {
    pub fn new(destination: Option<PathBuf>) -> Self {
        Self {
            destination,
            pretty: false,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn render(&self, records: &[VoterRecord]) -> Result<String> {
        let data = if self.pretty {
            serde_json::to_string_pretty(records)?
        } else {
            serde_json::to_string(records)?
        };
        Ok(data)
    }
}

impl Exporter for JsonExporter {
    fn export(&self, records: &[VoterRecord]) -> Result<()> {
        let data = self.render(records)?;
        match &self.destination {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, data)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{data}").with_context(|| "failed to write to stdout")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}
