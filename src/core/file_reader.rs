//! File reading strategies for document loading
//!
//! Provides consistent handling for:
//! - Non-UTF-8 files
//! - Oversized files
//! - Binary files

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::core::error::LoadError;
use crate::core::location::FileId;
use crate::tree::document::Document;

/// Default maximum file size in bytes (64 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Default truncation size in bytes (1 MB)
pub const DEFAULT_TRUNCATE_SIZE: usize = 1024 * 1024;

/// Strategy for handling non-UTF-8 content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingStrategy {
    /// Refuse non-UTF-8 and binary files
    Skip,
    /// Replace invalid bytes with U+FFFD
    #[default]
    Lossy,
}

/// Strategy for handling oversized files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeStrategy {
    /// Refuse files exceeding the size limit
    Skip,
    /// Truncate content and mark the document as truncated
    #[default]
    Truncate,
    /// Read entire file regardless of size
    Full,
}

/// Configuration for file reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReadConfig {
    /// Maximum file size to process (bytes)
    pub max_file_size: u64,

    /// Size at which to truncate content (bytes)
    pub truncate_size: usize,

    pub encoding_strategy: EncodingStrategy,

    pub size_strategy: SizeStrategy,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            truncate_size: DEFAULT_TRUNCATE_SIZE,
            encoding_strategy: EncodingStrategy::Lossy,
            size_strategy: SizeStrategy::Truncate,
        }
    }
}

impl FileReadConfig {
    /// Truncating config with a custom cut-off
    pub fn with_truncate_size(truncate_size: usize) -> Self {
        Self {
            truncate_size,
            ..Self::default()
        }
    }
}

fn skipped(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::Skipped {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn io_error(path: &Path, err: std::io::Error) -> LoadError {
    if err.kind() == std::io::ErrorKind::NotFound {
        LoadError::NotFound(path.to_path_buf())
    } else {
        LoadError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Read `path` as the document for `file`
pub fn read_document(
    path: &Path,
    file: FileId,
    config: &FileReadConfig,
) -> Result<Document, LoadError> {
    let metadata = fs::metadata(path).map_err(|e| io_error(path, e))?;
    if metadata.is_dir() {
        return Err(skipped(path, "Is a directory"));
    }

    let file_size = metadata.len();
    if config.size_strategy == SizeStrategy::Skip && file_size > config.max_file_size {
        return Err(skipped(
            path,
            format!(
                "File size {} exceeds limit {}",
                file_size, config.max_file_size
            ),
        ));
    }

    let bytes = read_file_bytes(path, config).map_err(|e| io_error(path, e))?;

    // Binary if the first 8KB contain a null byte
    let check_len = std::cmp::min(8192, bytes.len());
    if bytes[..check_len].contains(&0) && config.encoding_strategy == EncodingStrategy::Skip {
        return Err(skipped(path, "Binary file"));
    }

    let (content, lossy) = match String::from_utf8(bytes) {
        Ok(content) => (content, false),
        Err(err) => {
            if config.encoding_strategy == EncodingStrategy::Skip {
                return Err(skipped(path, "Invalid UTF-8"));
            }
            warn!(path = %path.display(), "lossy UTF-8 conversion applied");
            (String::from_utf8_lossy(err.as_bytes()).into_owned(), true)
        }
    };

    let truncated =
        config.size_strategy == SizeStrategy::Truncate && content.len() > config.truncate_size;
    let content = if truncated {
        warn!(
            path = %path.display(),
            from = content.len(),
            to = config.truncate_size,
            "document truncated"
        );
        truncate_at_char_boundary(&content, config.truncate_size)
    } else {
        content
    };

    Ok(Document::new(file, content)
        .with_truncated(truncated)
        .with_lossy(lossy))
}

/// Read file bytes with size handling
fn read_file_bytes(path: &Path, config: &FileReadConfig) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let file_size = file.metadata()?.len() as usize;

    let read_size = match config.size_strategy {
        SizeStrategy::Truncate => std::cmp::min(file_size, config.truncate_size + 1024),
        SizeStrategy::Skip | SizeStrategy::Full => file_size,
    };

    let mut reader = std::io::BufReader::new(file);
    let mut buffer = Vec::with_capacity(read_size);

    if read_size < file_size {
        reader.take(read_size as u64).read_to_end(&mut buffer)?;
    } else {
        reader.read_to_end(&mut buffer)?;
    }

    Ok(buffer)
}

/// Truncate string at a valid UTF-8 character boundary
fn truncate_at_char_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Write `bytes` to a fresh temp file and load it as a document
    fn load(bytes: &[u8], config: &FileReadConfig) -> (TempDir, Result<Document, LoadError>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample");
        fs::write(&path, bytes).unwrap();
        let result = read_document(&path, FileId::new("sample"), config);
        (dir, result)
    }

    fn skipping_encoding() -> FileReadConfig {
        FileReadConfig {
            encoding_strategy: EncodingStrategy::Skip,
            ..FileReadConfig::default()
        }
    }

    const INVALID_UTF8: &[u8] = &[0xC3, 0x28, b'o', b'k'];

    #[test]
    fn test_defaults_truncate_and_decode_lossily() {
        let config = FileReadConfig::default();
        assert_eq!(config.truncate_size, DEFAULT_TRUNCATE_SIZE);
        assert_eq!(config.encoding_strategy, EncodingStrategy::Lossy);
        assert_eq!(config.size_strategy, SizeStrategy::Truncate);
        assert_eq!(FileReadConfig::with_truncate_size(10).truncate_size, 10);
    }

    #[test]
    fn test_plain_text_document() {
        let (_dir, doc) = load(b"fn a() {}\nfn b() {}", &FileReadConfig::default());
        let doc = doc.unwrap();
        assert_eq!(doc.file().as_str(), "sample");
        assert_eq!(doc.line(1), Some("fn b() {}"));
        assert!(!doc.truncated && !doc.lossy);
    }

    #[test]
    fn test_long_document_is_truncated() {
        let text = "let x = 1;\n".repeat(200);
        let (_dir, doc) = load(text.as_bytes(), &FileReadConfig::with_truncate_size(64));
        let doc = doc.unwrap();
        assert!(doc.truncated);
        assert_eq!(doc.text().len(), 64);
    }

    #[test]
    fn test_oversized_document_skipped() {
        let config = FileReadConfig {
            max_file_size: 4,
            size_strategy: SizeStrategy::Skip,
            ..FileReadConfig::default()
        };
        let (_dir, doc) = load(b"0123456789", &config);
        assert!(matches!(doc, Err(LoadError::Skipped { .. })));
    }

    #[test]
    fn test_full_strategy_keeps_everything() {
        let config = FileReadConfig {
            truncate_size: 4,
            size_strategy: SizeStrategy::Full,
            ..FileReadConfig::default()
        };
        let (_dir, doc) = load(b"0123456789", &config);
        let doc = doc.unwrap();
        assert_eq!(doc.text(), "0123456789");
        assert!(!doc.truncated);
    }

    #[test]
    fn test_nul_bytes_mean_binary() {
        let (_dir, doc) = load(&[b'a', 0, b'b'], &skipping_encoding());
        match doc.unwrap_err() {
            LoadError::Skipped { reason, .. } => assert_eq!(reason, "Binary file"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let (_dir, doc) = load(INVALID_UTF8, &FileReadConfig::default());
        let doc = doc.unwrap();
        assert!(doc.lossy);
        assert_eq!(doc.text(), "\u{FFFD}(ok");
    }

    #[test]
    fn test_invalid_utf8_skipped() {
        let (_dir, doc) = load(INVALID_UTF8, &skipping_encoding());
        match doc.unwrap_err() {
            LoadError::Skipped { reason, .. } => assert_eq!(reason, "Invalid UTF-8"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_directory() {
        let dir = TempDir::new().unwrap();
        let config = FileReadConfig::default();

        let missing = read_document(&dir.path().join("gone.rs"), FileId::new("gone.rs"), &config);
        assert!(matches!(missing, Err(LoadError::NotFound(_))));

        let directory = read_document(dir.path(), FileId::new("."), &config);
        assert!(matches!(directory, Err(LoadError::Skipped { .. })));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncate_at_char_boundary("short", 10), "short");
        // "é" is two bytes
        assert_eq!(truncate_at_char_boundary("caféine", 4), "caf");
        assert_eq!(truncate_at_char_boundary("caféine", 5), "café");
    }
}
