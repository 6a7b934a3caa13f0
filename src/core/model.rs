//! Output Model
//!
//! Every command maps its tree (or failure) to rows of this model before
//! rendering output.

use serde::{Deserialize, Serialize};

use crate::core::location::TextRange;

/// The kind of result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    File,
    Match,
    Error,
}

/// Metadata for a result row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Number of matches in the file (file rows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    /// This match is where navigation starts
    #[serde(default, skip_serializing_if = "is_false")]
    pub nearest: bool,

    /// Content hash (XXH3) of the loaded file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Whether the loaded content was truncated
    #[serde(default)]
    pub truncated: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Error information for a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub code: String,
    pub message: String,
}

impl ItemError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// One output row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub kind: Kind,

    /// Tree id of the group or entry (`g0`, `e3`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// File identity, `/`-separated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Zero-based range of the match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TextRange>,

    /// Preview of the matched line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
}

impl ResultItem {
    /// Create a file row
    pub fn file(path: impl Into<String>, count: usize) -> Self {
        Self {
            kind: Kind::File,
            id: None,
            path: Some(path.into()),
            range: None,
            excerpt: None,
            meta: Meta {
                count: Some(count),
                ..Meta::default()
            },
            errors: Vec::new(),
        }
    }

    /// Create a match row
    pub fn match_result(path: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind: Kind::Match,
            id: None,
            path: Some(path.into()),
            range: Some(range),
            excerpt: None,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// Create an error row
    pub fn error(error: ItemError) -> Self {
        Self {
            kind: Kind::Error,
            id: None,
            path: None,
            range: None,
            excerpt: None,
            meta: Meta::default(),
            errors: vec![error],
        }
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    /// Mark as the navigation starting point
    pub fn nearest(mut self) -> Self {
        self.meta.nearest = true;
        self
    }

    pub fn with_error(mut self, error: ItemError) -> Self {
        self.errors.push(error);
        self
    }
}

/// Rows of one command, in output order
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Headline for human-readable formats
    pub summary: Option<String>,
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            summary: None,
            items: iter.into_iter().collect(),
        }
    }
}
