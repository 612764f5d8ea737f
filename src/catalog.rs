use crate::error::{Result, StarSyncError};
use crate::models::{Descriptor, DESCRIPTOR_FILE};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// List the immediate subdirectories of `root`, case-insensitively sorted.
///
/// Failing to list `root` is fatal for the run; individual entries that
/// cannot be inspected are skipped.
pub fn scan_slugs(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root).map_err(|e| {
        StarSyncError::EnvError(format!("Cannot read catalog root {}: {}", root.display(), e))
    })?;

    let mut slugs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Skipping unreadable catalog entry");
                continue;
            }
        };

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }

        slugs.push(entry.file_name().to_string_lossy().into_owned());
    }

    slugs.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    debug!(count = slugs.len(), "Scanned catalog");
    Ok(slugs)
}

/// Read and validate a single descriptor.
pub fn load_descriptor(root: &Path, slug: &str) -> Result<Descriptor> {
    let path = root.join(slug).join(DESCRIPTOR_FILE);
    let raw = fs::read_to_string(&path)?;
    let value: Value = serde_json::from_str(&raw)?;

    let record: Map<String, Value> = match value {
        Value::Object(map) => map,
        _ => {
            return Err(StarSyncError::InvalidDescriptor {
                path,
                reason: "expected a JSON object".to_string(),
            });
        }
    };

    Ok(Descriptor {
        slug: slug.to_string(),
        path,
        record,
    })
}

/// Load every slug's descriptor, skipping the ones that cannot be read.
pub fn load_descriptors(root: &Path, slugs: &[String]) -> Vec<Descriptor> {
    slugs
        .iter()
        .filter_map(|slug| match load_descriptor(root, slug) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!(%slug, error = %e, "Skipping descriptor");
                None
            }
        })
        .collect()
}

/// Serialize a record the way descriptors are stored on disk.
pub fn render_record(record: &Map<String, Value>) -> Result<String> {
    let mut out = serde_json::to_string_pretty(record)?;
    out.push('\n');
    Ok(out)
}

/// Overwrite the descriptor's file with its current record.
pub fn write_descriptor(descriptor: &Descriptor) -> Result<()> {
    let rendered = render_record(&descriptor.record)?;
    fs::write(&descriptor.path, rendered)?;
    Ok(())
}
