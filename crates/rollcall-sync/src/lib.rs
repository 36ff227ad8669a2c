pub mod error;
pub mod import;
pub mod pipeline;
pub mod sms_backup;
pub mod source;
pub mod tabular;

pub use error::{Result, SourceKind, SyncError};
pub use import::{ImportOptions, ImportStats, Importer};
pub use pipeline::{FailedSource, Pipeline, PipelineOptions, PipelineReport, PipelineRequest};
pub use sms_backup::{BackupOptions, ExtractStats};
pub use tabular::{TabularOptions, TabularStats};
