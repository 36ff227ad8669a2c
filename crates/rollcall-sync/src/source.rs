use crate::error::{Result, SourceKind, SyncError};
use std::path::Path;

/// Reads a whole input document; both source formats are UTF-8 text.
pub fn read_document(path: &Path, kind: SourceKind) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| SyncError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|err| {
        SyncError::malformed(
            kind,
            format!("not valid UTF-8 at byte {}", err.utf8_error().valid_up_to()),
        )
    })
}
