//! Native dialogs where a desktop window exists, plain fallbacks elsewhere.

#[cfg(feature = "desktop")]
pub mod desktop;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::record::RecordId;
use crate::usecase::services::export_service::ExportArtifact;

/// Asks before a delete is sent. Without native dialogs nothing can be
/// confirmed, so deletes are refused.
pub fn confirm_delete(label: &str, id: &RecordId) -> bool {
    #[cfg(feature = "desktop")]
    {
        desktop::dialogs::confirm(
            &format!("Delete {label}"),
            &format!("Delete record {id}? This cannot be undone."),
        )
    }
    #[cfg(not(feature = "desktop"))]
    {
        tracing::warn!(label, %id, "no confirmation dialog available, delete refused");
        false
    }
}

/// Writes an export where the user chooses, or into the working directory when
/// there is no save dialog. `Ok(None)` means the user cancelled.
pub fn save_artifact(artifact: &ExportArtifact) -> Result<Option<PathBuf>> {
    let target = choose_target(artifact)?;
    let Some(path) = target else {
        info!(filename = %artifact.filename, "export cancelled");
        return Ok(None);
    };
    write_artifact(&path, artifact)?;
    Ok(Some(path))
}

#[cfg(feature = "desktop")]
fn choose_target(artifact: &ExportArtifact) -> Result<Option<PathBuf>> {
    let extension = Path::new(&artifact.filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("*");
    Ok(desktop::dialogs::pick_save_path(&artifact.filename, extension))
}

#[cfg(not(feature = "desktop"))]
fn choose_target(artifact: &ExportArtifact) -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    Ok(Some(cwd.join(&artifact.filename)))
}

pub fn write_artifact(path: &Path, artifact: &ExportArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create export dir: {}", parent.display()))?;
    }
    std::fs::write(path, &artifact.bytes)
        .with_context(|| format!("failed to write export: {}", path.display()))?;
    info!(path = %path.display(), bytes = artifact.bytes.len(), "export saved");
    Ok(())
}
