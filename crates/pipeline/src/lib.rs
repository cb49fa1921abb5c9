// Consolidation pipeline: four stages sharing one output workbook.
//
// Stage order matters only in one place: stages 2 and 3 join against the
// summary index that stage 1 produces. The index is passed by reference, so
// a full pipeline run never re-reads its own output to recover join keys;
// standalone stage runs rebuild it from the saved Summary tab instead.

pub mod breakup;
pub mod error;
pub mod invoice;
pub mod layout;
pub mod orders;
pub mod report;
pub mod scan;
pub mod summary;

pub use error::PipelineError;
pub use report::StageReport;
pub use summary::{SummaryIndex, SummaryMeta, SummaryRecord};
