use std::fs;
use std::path::PathBuf;

use crate::format::RunResultDocument;

/// Writes `measurements/<epoch_seconds>.json`, creating the directory if
/// it's missing.
pub fn persist(doc: &RunResultDocument) -> anyhow::Result<PathBuf> {
    let dir = PathBuf::from("measurements");
    fs::create_dir_all(&dir)?;

    let path = dir.join(format!("{}.json", doc.timestamp.seconds));
    let json = serde_json::to_string_pretty(doc)?;
    fs::write(&path, json)?;
    Ok(path)
}
