//! Artifact Store
//!
//! Persisted HTML artifacts, one file per successful synthesis, named under
//! the contract `<up to 3 keyword tokens joined by "_">_<YYYYMMDD>_<HHMMSS>.html`.
//! Lookup is a deliberately loose recall-oriented filter: a topically similar
//! prior artifact is an acceptable cache hit, and ties converge on the most
//! recently written file.

use crate::error::ToolError;
use crate::keywords::{extract_keywords, tokenize};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Maximum keyword tokens carried into an artifact name.
const NAME_KEYWORD_COUNT: usize = 3;

/// Character cap on the keyword portion of an artifact name. Tunable
/// compatibility constant.
const NAME_KEYWORD_MAX_CHARS: usize = 30;

/// Fallback name token when the request yields no keyword tokens.
const NAME_FALLBACK: &str = "tool";

/// Store of previously generated artifacts in a single flat directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Find a previously generated artifact matching the request by fuzzy
    /// keyword overlap against persisted names. Read-only; every internal
    /// failure is treated as a miss so the pipeline fails open toward
    /// generation.
    pub fn find(&self, request: &str) -> Option<String> {
        let keywords = extract_keywords(request);
        if keywords.is_empty() {
            // An unspecific request never claims a cache hit.
            return None;
        }

        let entries = match fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(_) => return None,
        };

        let mut best: Option<(PathBuf, usize, SystemTime)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.ends_with(".html") {
                continue;
            }

            let match_count = keywords
                .iter()
                .filter(|k| name.contains(&k.to_lowercase()))
                .count();
            if !qualifies(match_count, keywords.len()) {
                continue;
            }

            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            let better = match &best {
                None => true,
                Some((_, best_count, best_modified)) => {
                    match_count > *best_count
                        || (match_count == *best_count && modified > *best_modified)
                }
            };
            if better {
                best = Some((entry.path(), match_count, modified));
            }
        }

        let (path, match_count, _) = best?;
        debug!(path = %path.display(), match_count, "artifact store hit");
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read matched artifact, treating as miss");
                None
            }
        }
    }

    /// Persist a generated artifact under the naming contract. Returns the
    /// path of the written file.
    pub fn save(&self, request: &str, content: &str) -> Result<PathBuf, ToolError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(artifact_filename(request, Local::now()));
        fs::write(&path, content)?;
        debug!(path = %path.display(), "artifact saved");
        Ok(path)
    }
}

/// A name qualifies when it matches at least one keyword and either half of
/// the query's keywords (rounded down) or all of them.
fn qualifies(match_count: usize, keyword_count: usize) -> bool {
    match_count > 0 && (match_count >= keyword_count / 2 || match_count == keyword_count)
}

/// Build an artifact filename from a request and a timestamp:
/// up to three raw tokens joined by `_`, capped at 30 characters, then
/// `_YYYYMMDD_HHMMSS.html`. Falls back to the literal `tool` token when the
/// request yields nothing.
pub fn artifact_filename(request: &str, timestamp: DateTime<Local>) -> String {
    let tokens = tokenize(request);
    let name = if tokens.is_empty() {
        NAME_FALLBACK.to_string()
    } else {
        tokens
            .iter()
            .take(NAME_KEYWORD_COUNT)
            .cloned()
            .collect::<Vec<_>>()
            .join("_")
    };

    let name: String = name.chars().take(NAME_KEYWORD_MAX_CHARS).collect();
    format!("{}_{}.html", name, timestamp.format("%Y%m%d_%H%M%S"))
}
