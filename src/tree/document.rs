//! Document loading for file groups
//!
//! Each group owns a [`DocumentCell`]: empty until first requested, shared
//! while the load is in flight, then fixed to the outcome for the group's
//! lifetime. A failed load is remembered like a successful one.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::core::error::LoadError;
use crate::core::location::{FileId, TextRange};

/// Characters of context kept before a match in a preview
pub const PREVIEW_BEFORE_CHARS: usize = 8;

/// Characters of context kept after a match in a preview
pub const PREVIEW_AFTER_CHARS: usize = 70;

/// Loaded text of one file
#[derive(Debug, Clone)]
pub struct Document {
    file: FileId,
    text: String,
    line_starts: Vec<usize>,
    /// Content was cut at the loader's size limit
    pub truncated: bool,
    /// Invalid UTF-8 was replaced while decoding
    pub lossy: bool,
}

impl Document {
    pub fn new(file: FileId, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file,
            text,
            line_starts,
            truncated: false,
            lossy: false,
        }
    }

    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    pub fn with_lossy(mut self, lossy: bool) -> Self {
        self.lossy = lossy;
        self
    }

    pub fn file(&self) -> &FileId {
        &self.file
    }

    #[allow(dead_code)]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[allow(dead_code)]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Zero-based line without its line terminator
    pub fn line(&self, line: u32) -> Option<&str> {
        let line = line as usize;
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let raw = &self.text[start..end];
        Some(raw.trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// XXH3 content hash, hex encoded
    pub fn hash(&self) -> String {
        format!("{:016x}", xxh3_64(self.text.as_bytes()))
    }
}

/// Boxed load future; `'static` so a prefetch can be spawned
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<Document, LoadError>> + Send + 'static>>;

/// Loads a file's text by identity
pub trait DocumentLoader: Send + Sync {
    fn load(&self, file: &FileId) -> LoadFuture;
}

/// Memoized load outcome of one group
#[derive(Debug, Clone, Default)]
pub(crate) struct DocumentCell(Arc<OnceCell<Result<Arc<Document>, LoadError>>>);

impl DocumentCell {
    pub(crate) fn is_loaded(&self) -> bool {
        self.0.initialized()
    }

    /// Load on first call; later and concurrent callers share that outcome
    pub(crate) async fn get(
        &self,
        loader: &Arc<dyn DocumentLoader>,
        file: &FileId,
    ) -> Result<Arc<Document>, LoadError> {
        self.0
            .get_or_init(|| async {
                debug!(file = %file, "loading document");
                loader.load(file).await.map(Arc::new)
            })
            .await
            .clone()
    }

    /// Start loading in the background without waiting for it.
    ///
    /// Returns false when nothing was started: already loaded, or no tokio
    /// runtime to spawn on.
    pub(crate) fn prefetch(&self, loader: Arc<dyn DocumentLoader>, file: FileId) -> bool {
        if self.is_loaded() {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(file = %file, "no runtime, skipping prefetch");
            return false;
        };
        let cell = self.clone();
        runtime.spawn(async move {
            if let Err(err) = cell.get(&loader, &file).await {
                warn!(file = %file, error = %err, "prefetch failed");
            }
        });
        true
    }
}

/// Text around a match, split so the match itself can be highlighted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    pub before: String,
    pub inside: String,
    pub after: String,
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.before, self.inside, self.after)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Build the one-line preview of `range` in `document`.
///
/// Leading context is cut at [`PREVIEW_BEFORE_CHARS`] and then widened back
/// to the start of the word it lands in. Multi-line ranges show their first
/// line only.
pub fn preview(document: &Document, range: &TextRange) -> Preview {
    let Some(line) = document.line(range.start.line) else {
        return Preview::default();
    };
    let chars: Vec<char> = line.chars().collect();

    let start = (range.start.character as usize).min(chars.len());
    let end = if range.is_single_line() {
        (range.end.character as usize).clamp(start, chars.len())
    } else {
        chars.len()
    };

    let mut from = start.saturating_sub(PREVIEW_BEFORE_CHARS);
    while from > 0 && from < start && is_word_char(chars[from - 1]) && is_word_char(chars[from]) {
        from -= 1;
    }
    let to = (end + PREVIEW_AFTER_CHARS).min(chars.len());

    let before: String = chars[from..start].iter().collect();
    let after: String = chars[end..to].iter().collect();

    Preview {
        before: before.trim_start().to_string(),
        inside: chars[start..end].iter().collect(),
        after: after.trim_end().to_string(),
    }
}
