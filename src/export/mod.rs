pub mod json_export;

use anyhow::Result;

use crate::core::model::VoterRecord;

pub use json_export::JsonExporter;

pub trait Exporter {
    fn export(&self, records: &[VoterRecord]) -> Result<()>;
}
