//! ripgrep location provider
//!
//! Takes the identifier under the cursor and searches the workspace with
//! `rg --json`. References are whole-word hits; implementations are lines
//! that implement, extend or implement-for the identifier.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::core::error::TreeError;
use crate::core::location::{FileId, Location, Position, QueryKind, TextRange};
use crate::core::paths::{file_id_for, resolve};
use crate::core::util::{byte_to_char_offset, command_exists};
use crate::tree::provider::{LocationFuture, LocationProvider};

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("Invalid WORD regex"));

/// Check if ripgrep is available
pub fn is_rg_available() -> bool {
    command_exists("rg")
}

/// Identifier touching `character` on `line`, if any.
///
/// A cursor right after the last character still selects the word; a
/// cursor past the end of the line sits at the end.
pub fn word_at(line: &str, character: u32) -> Option<String> {
    let byte = line
        .char_indices()
        .nth(character as usize)
        .map_or(line.len(), |(i, _)| i);
    WORD.find_iter(line)
        .find(|m| m.start() <= byte && byte <= m.end())
        .map(|m| m.as_str().to_string())
}

/// rg search pattern and whether it is a literal
fn search_pattern(word: &str, kind: QueryKind) -> (String, bool) {
    match kind {
        QueryKind::References => (word.to_string(), true),
        QueryKind::Implementations => {
            let w = regex::escape(word);
            (
                format!(
                    r"\bimpl\b[^{{;]*\b{w}\b|\bclass\s+\w+[^{{;]*\b(?:extends|implements)\b[^{{;]*\b{w}\b"
                ),
                false,
            )
        }
    }
}

pub struct RgProvider {
    root: PathBuf,
}

impl RgProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn query(
        &self,
        file: &FileId,
        position: Position,
        kind: QueryKind,
    ) -> Result<Option<Vec<Location>>, TreeError> {
        if !is_rg_available() {
            debug!("ripgrep (rg) is not installed");
            return Ok(None);
        }

        let text = tokio::fs::read_to_string(resolve(&self.root, file)).await?;
        let Some(word) = text
            .lines()
            .nth(position.line as usize)
            .and_then(|line| word_at(line, position.character))
        else {
            debug!(%file, %position, "no identifier under cursor");
            return Ok(None);
        };

        let (pattern, literal) = search_pattern(&word, kind);
        let mut cmd = Command::new("rg");
        cmd.arg("--json");
        if literal {
            cmd.arg("-w").arg("-F");
        }
        cmd.arg("-e").arg(&pattern).arg(&self.root);

        debug!(query = kind.provider_id(), %word, "running rg");
        let output = cmd.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let locations = parse_rg_json(&stdout, &self.root, &word);

        // rg exits 1 for "no matches" and 2 for errors
        if output.status.code() == Some(2) && locations.is_empty() {
            return Err(TreeError::Provider {
                provider: self.name().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(Some(locations))
    }
}

impl LocationProvider for RgProvider {
    fn name(&self) -> &str {
        "rg"
    }

    fn locations<'a>(
        &'a self,
        file: &'a FileId,
        position: Position,
        kind: QueryKind,
    ) -> LocationFuture<'a> {
        Box::pin(self.query(file, position, kind))
    }
}

/// Convert `rg --json` output into locations of `word`.
///
/// Each submatch yields one location; when a submatch is wider than the
/// word (implementation patterns), the last occurrence of the word inside
/// it is used.
pub fn parse_rg_json(stdout: &str, root: &Path, word: &str) -> Vec<Location> {
    let mut locations = Vec::new();

    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let v: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(_) => continue,
        };

        if v.get("type").and_then(|t| t.as_str()) != Some("match") {
            continue;
        }

        let data = match v.get("data") {
            Some(d) => d,
            None => continue,
        };

        let path_text = match data
            .get("path")
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
        {
            Some(p) => p,
            None => continue,
        };

        let line_text = data
            .get("lines")
            .and_then(|l| l.get("text"))
            .and_then(|t| t.as_str())
            .unwrap_or("");

        let line_num = match data.get("line_number").and_then(|n| n.as_u64()) {
            Some(n) if n > 0 => (n - 1) as u32,
            _ => continue,
        };

        let file = file_id_for(root, Path::new(path_text));
        let submatches = data
            .get("submatches")
            .and_then(|s| s.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();

        for sub in submatches {
            let (Some(start), Some(end)) = (
                sub.get("start").and_then(|s| s.as_u64()),
                sub.get("end").and_then(|e| e.as_u64()),
            ) else {
                continue;
            };
            let (start, end) = (start as usize, end as usize);
            let (start, end) = match line_text.get(start..end).and_then(|s| s.rfind(word)) {
                Some(offset) if end - start > word.len() => {
                    (start + offset, start + offset + word.len())
                }
                _ => (start, end),
            };

            locations.push(Location::new(
                file.clone(),
                TextRange::on_line(
                    line_num,
                    byte_to_char_offset(line_text, start),
                    byte_to_char_offset(line_text, end),
                ),
            ));
        }
    }

    locations
}
