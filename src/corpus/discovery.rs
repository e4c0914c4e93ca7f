// Input enumeration for a corpus run

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors that stop a run before any file is processed
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Cannot read file list {0}: {1}")]
    FileList(PathBuf, #[source] std::io::Error),

    #[error("No input files found")]
    NoInputs,
}

/// Expand input locations into a sorted, de-duplicated file list.
///
/// Files are taken as given. Directories contribute files whose extension is
/// in `extensions` (case-insensitive), searching subdirectories only when
/// `recursive` is set.
pub fn discover_inputs(
    locations: &[PathBuf],
    recursive: bool,
    extensions: &[String],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();

    for location in locations {
        if location.is_file() {
            files.push(location.clone());
            continue;
        }
        if !location.is_dir() {
            return Err(DiscoveryError::PathNotFound(location.clone()));
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(location).max_depth(max_depth).follow_links(false) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    // Unreadable subtrees do not abort discovery
                    log::warn!("Error accessing entry under {}: {}", location.display(), e);
                }
            }
        }
    }

    files.sort();
    files.dedup();

    if files.is_empty() {
        return Err(DiscoveryError::NoInputs);
    }

    log::debug!("Discovered {} input files", files.len());
    Ok(files)
}

/// Read an explicit file list: one path per line, blank lines and `#` comments skipped.
pub fn read_file_list(path: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DiscoveryError::FileList(path.to_path_buf(), e))?;

    let files: Vec<PathBuf> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect();

    if files.is_empty() {
        return Err(DiscoveryError::NoInputs);
    }
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
