pub mod coordinator;
pub mod line_delimited;
pub mod markup;
pub mod tabular;

pub use coordinator::{ExtractionCoordinator, ExtractionOutcome, ExtractionProgress, SourceSummary};
pub use line_delimited::LineDelimitedExtractor;
pub use markup::MarkupExtractor;
pub use tabular::TabularExtractor;

use crate::error::Result;
use crate::record::RecordSet;
use crate::scanner::SourceFormat;
use std::path::Path;

/// Turns one source file into records.
pub trait RecordExtractor {
    fn format(&self) -> SourceFormat;

    fn extract(&self, path: &Path) -> Result<RecordSet>;
}

/// The extractor that reads `format`.
pub fn extractor_for(format: SourceFormat) -> Box<dyn RecordExtractor> {
    match format {
        SourceFormat::Tabular => Box::new(TabularExtractor::new()),
        SourceFormat::LineDelimited => Box::new(LineDelimitedExtractor::new()),
        SourceFormat::Markup => Box::new(MarkupExtractor::new()),
    }
}
