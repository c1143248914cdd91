pub mod box_detector;

pub use box_detector::{BoxDetector, BoxDetectorConfig};
