pub mod core;
pub mod export;
pub mod layout;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod rescue;

pub use crate::core::geometry::BoundingBox;
pub use crate::core::model::{CellParse, Gender, PageReport, RelationType, VoterRecord};
pub use crate::pipeline::{extract_document, ExtractionResult, PageOrchestrator, PipelineConfig};
