//! Input validation: cheap checks on the uploaded file before any parsing.
//!
//! The upload layer in front of this library is expected to enforce the
//! extension allow-list and size cap already. Re-checking here costs one
//! `stat` and turns a confusing parser error ("invalid zip header") into a
//! precise one ("unsupported file type 'csv'").

use crate::config::ConversionConfig;
use crate::error::SheetShotError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A local spreadsheet that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub path: PathBuf,
    pub extension: String,
    pub size_bytes: u64,
}

/// Lower-cased extension without the dot, or empty.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Validate that `path` is a readable, non-empty spreadsheet within limits.
pub fn validate_input(
    path: &Path,
    config: &ConversionConfig,
) -> Result<ValidatedInput, SheetShotError> {
    let path = path.to_path_buf();

    let metadata = match std::fs::metadata(&path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(SheetShotError::FileNotFound { path }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SheetShotError::PermissionDenied { path })
        }
        Err(_) => return Err(SheetShotError::FileNotFound { path }),
    };

    // Check read permission by attempting to open
    if let Err(e) = std::fs::File::open(&path) {
        return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
            SheetShotError::PermissionDenied { path }
        } else {
            SheetShotError::FileNotFound { path }
        });
    }

    let extension = extension_of(&path);
    if !config.accepts_extension(&extension) {
        return Err(SheetShotError::UnsupportedFormat {
            path,
            extension,
            allowed: config.allowed_extensions.join(", "),
        });
    }

    let size_bytes = metadata.len();
    if size_bytes == 0 {
        return Err(SheetShotError::EmptyFile { path });
    }
    if size_bytes > config.max_input_bytes {
        return Err(SheetShotError::FileTooLarge {
            path,
            size: size_bytes,
            limit: config.max_input_bytes,
        });
    }

    debug!("Validated input '{}' ({} bytes)", path.display(), size_bytes);
    Ok(ValidatedInput {
        path,
        extension,
        size_bytes,
    })
}
