use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{DynamicImage, GrayImage, Luma};
use pretty_assertions::assert_eq;

use voteroll::export::JsonExporter;
use voteroll::ocr::{PageLayout, RecognitionProfile, Rasterizer, Recognizer};
use voteroll::parser::TextLayerReader;
use voteroll::pipeline::{PageOrchestrator, PipelineConfig};
use voteroll::{Gender, RelationType};

/// Two rows of three bordered cells, the way a roll page prints them.
fn grid_page() -> DynamicImage {
    let mut page = GrayImage::from_pixel(720, 800, Luma([255]));
    for y in [40u32, 260] {
        for x in [20u32, 250, 480] {
            for t in 0..2 {
                for dx in 0..200 {
                    page.put_pixel(x + dx, y + t, Luma([0]));
                    page.put_pixel(x + dx, y + 149 - t, Luma([0]));
                }
                for dy in 0..150 {
                    page.put_pixel(x + t, y + dy, Luma([0]));
                    page.put_pixel(x + 199 - t, y + dy, Luma([0]));
                }
            }
        }
    }
    DynamicImage::ImageLuma8(page)
}

/// Renders the grid for every page except those listed as broken.
struct FakeRasterizer {
    broken: Vec<usize>,
}

impl Rasterizer for FakeRasterizer {
    fn rasterize(&self, _pdf_path: &Path, page_number: usize, _dpi: u32) -> Result<DynamicImage> {
        if self.broken.contains(&page_number) {
            anyhow::bail!("corrupt page stream");
        }
        Ok(grid_page())
    }
}

enum FakeTextLayer {
    Banner(&'static str),
    Missing,
    Broken,
}

impl TextLayerReader for FakeTextLayer {
    fn read_text_layer(&self, _pdf_path: &Path, _page_number: usize) -> Result<Option<String>> {
        match self {
            FakeTextLayer::Banner(text) => Ok(Some(text.to_string())),
            FakeTextLayer::Missing => Ok(None),
            FakeTextLayer::Broken => anyhow::bail!("pdftotext exited with status 1"),
        }
    }
}

/// Answers banner reads with a fixed text and cell reads from a script.
struct FakeRecognizer {
    banner: &'static str,
    cells: RefCell<VecDeque<&'static str>>,
    banner_calls: RefCell<usize>,
    cell_calls: RefCell<usize>,
}

impl FakeRecognizer {
    fn new(banner: &'static str, cells: Vec<&'static str>) -> Self {
        Self {
            banner,
            cells: RefCell::new(cells.into()),
            banner_calls: RefCell::new(0),
            cell_calls: RefCell::new(0),
        }
    }
}

impl Recognizer for FakeRecognizer {
    fn recognize(&self, _image: &GrayImage, profile: &RecognitionProfile) -> Result<String> {
        if profile.engine_mode.is_none() && profile.layout == PageLayout::SparseText {
            *self.banner_calls.borrow_mut() += 1;
            return Ok(self.banner.to_string());
        }
        *self.cell_calls.borrow_mut() += 1;
        Ok(self.cells.borrow_mut().pop_front().unwrap_or_default().to_string())
    }
}

const FULL_HINDI: &str = "ABC1234567\nनिर्वाचक का नाम : रामकुमार\nपिता का नाम : श्याम\nमकान संख्या : 45\nउम्र : 34 लिंग : पुरुष";
const FULL_ENGLISH: &str = "MNP4455667\nName : Geeta\nHusband's Name : Mohan\nHouse Number : 12\nAge : 41";

/// One scripted read per recognition call, in cell order.
fn scripted_page() -> Vec<&'static str> {
    vec![
        // cell 1: clean read
        FULL_HINDI,
        // cell 2: deleted voter
        "ABC7654321\nविलोपित",
        // cell 3: name on the first read, code on the adaptive read
        "निर्वाचक का नाम : सीता\nपति का नाम : राम\nउम्र : 29",
        "ABD1112223",
        // cell 4: only the header read finds the code
        "~~~",
        "~~~",
        "XYZ9876543",
        // cell 5: nothing readable
        "~~~",
        "~~~",
        "",
        // cell 6: clean read
        FULL_ENGLISH,
    ]
}

fn config(start: Option<usize>, end: Option<usize>) -> PipelineConfig {
    PipelineConfig::new(PathBuf::from("roll.pdf"), 400).with_page_range(start, end)
}

#[test]
fn extracts_records_in_reading_order() -> Result<()> {
    let rasterizer = FakeRasterizer { broken: vec![] };
    let text_layer = FakeTextLayer::Banner("अनुभाग संख्या व नाम : 1-रामपुर\n");
    let recognizer = FakeRecognizer::new("", scripted_page());
    let config = config(None, None);

    let orchestrator = PageOrchestrator::new(&rasterizer, &text_layer, &recognizer, &config);
    let (records, report) = orchestrator.process_page(1)?;

    let boxes: Vec<usize> = records.iter().map(|r| r.box_index).collect();
    assert_eq!(boxes, vec![1, 3, 4, 6]);
    assert_eq!(report.candidate_boxes, 6);
    assert_eq!(report.parsed, 4);
    assert_eq!(report.village, "रामपुर");
    assert_eq!(*recognizer.cell_calls.borrow(), 11);
    assert_eq!(*recognizer.banner_calls.borrow(), 0);

    let first = &records[0];
    assert_eq!(first.epic, "ABC1234567");
    assert_eq!(first.name, "रामकुमार");
    assert_eq!(first.relative_name, "श्याम");
    assert_eq!(first.house_number, "45");
    assert_eq!(first.age, "34");
    assert_eq!(first.gender, Gender::M);

    let rescued = &records[1];
    assert_eq!(rescued.name, "सीता");
    assert_eq!(rescued.epic, "ABD1112223");
    assert_eq!(rescued.relation_type, RelationType::Husband);
    assert_eq!(rescued.gender, Gender::F);

    assert_eq!(records[2].epic, "XYZ9876543");
    assert_eq!(records[2].name, "Unknown");

    assert_eq!(records[3].name, "Geeta");
    assert_eq!(records[3].relative_name, "Mohan");

    for record in &records {
        assert_eq!(record.page_number, 1);
        assert_eq!(record.village, "रामपुर");
    }
    Ok(())
}

#[test]
fn failing_page_is_skipped() {
    let rasterizer = FakeRasterizer { broken: vec![2] };
    let text_layer = FakeTextLayer::Missing;
    let recognizer = FakeRecognizer::new(
        "वार्ड नाम : गोकुलपुर",
        vec![FULL_HINDI; 6].into_iter().chain(vec![FULL_ENGLISH; 6]).collect(),
    );
    let config = config(Some(1), Some(3));

    let result = PageOrchestrator::new(&rasterizer, &text_layer, &recognizer, &config).run(5);

    assert_eq!(result.failed_pages, vec![2]);
    assert_eq!(result.reports.len(), 2);
    assert_eq!(result.records.len(), 12);

    let pages: Vec<usize> = result.records.iter().map(|r| r.page_number).collect();
    assert_eq!(pages, [vec![1; 6], vec![3; 6]].concat());
    assert!(result.records.iter().all(|r| r.village == "गोकुलपुर"));
    assert_eq!(*recognizer.banner_calls.borrow(), 2);
}

#[test]
fn broken_text_layer_falls_back_to_banner() -> Result<()> {
    let rasterizer = FakeRasterizer { broken: vec![] };
    let text_layer = FakeTextLayer::Broken;
    let recognizer = FakeRecognizer::new("Section No. & Name : 2 - Rampur\n", vec![FULL_ENGLISH]);
    let config = config(None, None);

    let (records, report) =
        PageOrchestrator::new(&rasterizer, &text_layer, &recognizer, &config).process_page(1)?;

    assert_eq!(report.village, "Rampur");
    assert_eq!(*recognizer.banner_calls.borrow(), 1);
    // the first cell reads cleanly, the others come back blank
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].village, "Rampur");
    Ok(())
}

#[test]
fn empty_page_range_produces_nothing() {
    let rasterizer = FakeRasterizer { broken: vec![] };
    let text_layer = FakeTextLayer::Missing;
    let recognizer = FakeRecognizer::new("", vec![]);
    let config = config(Some(4), Some(2));

    let result = PageOrchestrator::new(&rasterizer, &text_layer, &recognizer, &config).run(10);

    assert!(result.records.is_empty());
    assert!(result.reports.is_empty());
    assert_eq!(*recognizer.cell_calls.borrow(), 0);
}

#[test]
fn records_serialize_with_every_key() -> Result<()> {
    let rasterizer = FakeRasterizer { broken: vec![] };
    let text_layer = FakeTextLayer::Banner("Ward Name : Lakhanpur\n");
    let recognizer = FakeRecognizer::new("", vec!["PQR1234567\nName : Asha  Father's Name : Ravi  House No : 9"]);
    let config = config(None, None);

    let (records, _) =
        PageOrchestrator::new(&rasterizer, &text_layer, &recognizer, &config).process_page(7)?;
    let json = JsonExporter::default().render(&records)?;
    let value: serde_json::Value = serde_json::from_str(&json)?;

    let record = &value[0];
    assert_eq!(record["epic"], "PQR1234567");
    assert_eq!(record["name"], "Asha");
    assert_eq!(record["relativeName"], "Ravi");
    assert_eq!(record["relationType"], "Father");
    assert_eq!(record["houseNumber"], "9");
    assert_eq!(record["age"], "");
    assert_eq!(record["gender"], "M");
    assert_eq!(record["boxIndex"], 1);
    assert_eq!(record["pageNumber"], 7);
    assert_eq!(record["village"], "Lakhanpur");
    Ok(())
}
