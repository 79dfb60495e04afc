//! Screenshot artifacts: naming, directory setup, verification, relocation.
//!
//! Artifact names are `<stem>_<8 hex>.png`. The random suffix is the only
//! thing keeping concurrent conversions of the same upload from overwriting
//! each other; nothing is content-addressed and no lock is taken.

use crate::error::SheetShotError;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

/// File-system-safe version of the input's base name.
pub fn sanitize_stem(input: &Path) -> String {
    let raw = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned = UNSAFE_CHARS.replace_all(&raw, "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        "sheet".to_string()
    } else {
        cleaned.to_string()
    }
}

/// A fresh, collision-resistant artifact path inside `output_dir`.
pub fn screenshot_path(output_dir: &Path, input: &Path) -> PathBuf {
    let suffix: u32 = rand::thread_rng().gen();
    output_dir.join(format!("{}_{:08x}.png", sanitize_stem(input), suffix))
}

/// Create `dir` (and parents) if it does not exist yet.
pub async fn ensure_output_dir(dir: &Path) -> Result<(), SheetShotError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SheetShotError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Confirm the capture left a non-empty, decodable image behind.
/// Returns its pixel dimensions.
pub fn verify_artifact(path: &Path) -> Result<(u32, u32), SheetShotError> {
    let missing = |detail: String| SheetShotError::ArtifactMissing {
        path: path.to_path_buf(),
        detail,
    };

    let meta = std::fs::metadata(path).map_err(|e| missing(e.to_string()))?;
    if meta.len() == 0 {
        return Err(missing("file is empty".into()));
    }
    let (w, h) = image::image_dimensions(path).map_err(|e| missing(e.to_string()))?;
    debug!("Verified artifact {} ({w}×{h} px, {} bytes)", path.display(), meta.len());
    Ok((w, h))
}

/// Move an artifact, falling back to copy + remove across file systems.
pub async fn move_artifact(from: &Path, to: &Path) -> Result<(), SheetShotError> {
    let write_failed = |source: std::io::Error| SheetShotError::OutputWriteFailed {
        path: to.to_path_buf(),
        source,
    };

    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await.map_err(write_failed)?;
    tokio::fs::remove_file(from).await.map_err(write_failed)?;
    Ok(())
}
