//! Replay provider
//!
//! Answers every query with locations recorded in a JSON file:
//!
//! ```json
//! {"locations": [{"file": "src/a.rs",
//!                 "range": {"start": {"line": 0, "character": 4},
//!                           "end":   {"line": 0, "character": 8}}}]}
//! ```
//!
//! or `{"unsupported": true}` to simulate a provider with no answer.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::core::error::TreeError;
use crate::core::location::{FileId, Location, Position, QueryKind};
use crate::tree::provider::{LocationFuture, LocationProvider};

#[derive(Debug, Deserialize)]
struct ReplayFile {
    #[serde(default)]
    unsupported: bool,
    #[serde(default)]
    locations: Vec<Location>,
}

#[derive(Debug, Clone)]
pub struct ReplayProvider {
    answer: Option<Vec<Location>>,
}

impl ReplayProvider {
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let file: ReplayFile = serde_json::from_str(json)?;
        Ok(Self {
            answer: (!file.unsupported).then_some(file.locations),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, TreeError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| TreeError::Replay {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl LocationProvider for ReplayProvider {
    fn name(&self) -> &str {
        "replay"
    }

    fn locations<'a>(
        &'a self,
        _file: &'a FileId,
        _position: Position,
        _kind: QueryKind,
    ) -> LocationFuture<'a> {
        Box::pin(async move { Ok(self.answer.clone()) })
    }
}
