use crate::types::{NormalizedItem, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Write the selected items as pretty-printed JSON, creating parent directories.
pub fn write_items_json(path: impl AsRef<Path>, items: &[NormalizedItem]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(items)?)?;
    info!("Wrote {} items to {}", items.len(), path.display());
    Ok(())
}
