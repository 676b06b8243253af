//! JSON files owned by the binary: the roster and the correction memory.

use std::path::Path;

use gradevox_command::CorrectionMemory;
use gradevox_core::{GradevoxError, Result, Roster};

pub fn read_roster(path: &Path) -> Result<Roster> {
    let content = std::fs::read_to_string(path)?;
    let roster: Roster = serde_json::from_str(&content)?;
    if roster.headers.is_empty() {
        return Err(GradevoxError::Roster(format!(
            "{} has no headers",
            path.display()
        )));
    }
    tracing::info!(path = %path.display(), rows = roster.len(), "Roster loaded");
    Ok(roster)
}

pub fn write_roster(path: &Path, roster: &Roster) -> Result<()> {
    write_json(path, roster)?;
    tracing::info!(path = %path.display(), rows = roster.len(), "Roster saved");
    Ok(())
}

/// Missing or unreadable memory starts empty.
pub fn read_memory(path: &Path) -> CorrectionMemory {
    if !path.exists() {
        return CorrectionMemory::new();
    }
    let loaded = std::fs::read_to_string(path)
        .map_err(GradevoxError::from)
        .and_then(|c| serde_json::from_str(&c).map_err(GradevoxError::from));
    match loaded {
        Ok(memory) => memory,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to load correction memory: {}", e);
            CorrectionMemory::new()
        }
    }
}

pub fn write_memory(path: &Path, memory: &CorrectionMemory) -> Result<()> {
    write_json(path, memory)?;
    tracing::debug!(path = %path.display(), entries = memory.len(), "Correction memory saved");
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}
