//! Source locations
//!
//! Positions, ranges and file identities shared by the tree, the providers
//! and the renderer. Positions are zero-based, like the language-server
//! protocol; the CLI converts from 1-based input at the edge.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A zero-based (line, character) position. Orders by line, then character.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// True if `self` comes strictly after `other`
    pub fn is_after(&self, other: &Position) -> bool {
        self > other
    }
}

impl fmt::Display for Position {
    /// 1-based `line:col`, the way editors show it
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A start/end position pair within one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range on a single line spanning `[start_char, end_char)`
    pub fn on_line(line: u32, start_char: u32, end_char: u32) -> Self {
        Self::new(
            Position::new(line, start_char),
            Position::new(line, end_char),
        )
    }

    /// Containment with an inclusive end, so a cursor resting just after
    /// an identifier still hits it.
    pub fn contains(&self, position: &Position) -> bool {
        self.start <= *position && *position <= self.end
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

/// Canonical identity of a file: a `/`-separated path string.
///
/// Grouping and ordering of matches both key on this value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of leading characters shared with `other`
    pub fn common_prefix_len(&self, other: &FileId) -> usize {
        self.0
            .chars()
            .zip(other.0.chars())
            .take_while(|(a, b)| a == b)
            .count()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        FileId::new(s)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        FileId::new(s)
    }
}

/// A span of text in a specific file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: FileId,
    pub range: TextRange,
}

impl Location {
    pub fn new(file: impl Into<FileId>, range: TextRange) -> Self {
        Self {
            file: file.into(),
            range,
        }
    }

    /// Tree order: file identity first, then range start.
    ///
    /// Range ends are ignored, so equal starts compare equal and a stable
    /// sort keeps their input order.
    pub fn tree_order(&self, other: &Location) -> Ordering {
        self.file
            .cmp(&other.file)
            .then_with(|| self.range.start.cmp(&other.range.start))
    }
}

/// Which provider produced the locations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    #[default]
    References,
    Implementations,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::References => "references",
            QueryKind::Implementations => "implementations",
        }
    }

    /// Opaque identifier of the provider backing this kind
    pub fn provider_id(&self) -> &'static str {
        match self {
            QueryKind::References => "refnav.provider.references",
            QueryKind::Implementations => "refnav.provider.implementations",
        }
    }
}

impl std::str::FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "references" | "refs" => Ok(QueryKind::References),
            "implementations" | "impls" => Ok(QueryKind::Implementations),
            _ => Err(format!("Unknown query kind: {}", s)),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
