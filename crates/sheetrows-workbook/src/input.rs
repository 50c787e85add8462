//! Turning caller input into a path the workbook parser can open.
//!
//! The parser only reads from disk, so byte buffers and base64 text are
//! spilled into a randomly named temporary file. The returned
//! [`PreparedInput`] owns that file and deletes it when dropped, whichever
//! way the enclosing call exits.

use crate::error::ReadError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Text shorter than this is never treated as base64 content.
pub const BASE64_MIN_LEN: usize = 500;

/// How text input should be interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Sniff the content: base64 when [`looks_like_base64`] says so, else a path.
    #[default]
    Auto,
    Path,
    Base64,
}

/// A workbook handed to one of the read operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkbookInput {
    /// Text whose meaning is decided by [`looks_like_base64`].
    Text(String),
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// Base64 transcription of the container bytes.
    Base64(String),
}

impl WorkbookInput {
    /// Build from text with an explicit interpretation instead of sniffing.
    pub fn with_kind(text: impl Into<String>, kind: InputKind) -> Self {
        let text = text.into();
        match kind {
            InputKind::Auto => WorkbookInput::Text(text),
            InputKind::Path => WorkbookInput::Path(PathBuf::from(text)),
            InputKind::Base64 => WorkbookInput::Base64(text),
        }
    }

    /// Resolve to an on-disk path, spilling bytes to a temp file if needed.
    pub fn prepare(self) -> Result<PreparedInput, ReadError> {
        match self {
            WorkbookInput::Text(text) => {
                if text.is_empty() {
                    return Err(ReadError::InvalidInput("file path must not be empty".into()));
                }
                if looks_like_base64(&text) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(len = text.len(), "text input classified as base64 content");
                    PreparedInput::from_bytes(&decode_base64(&text)?)
                } else {
                    PreparedInput::from_path(Path::new(&text))
                }
            }
            WorkbookInput::Path(path) => {
                if path.as_os_str().is_empty() {
                    return Err(ReadError::InvalidInput("file path must not be empty".into()));
                }
                PreparedInput::from_path(&path)
            }
            WorkbookInput::Bytes(bytes) => PreparedInput::from_bytes(&bytes),
            WorkbookInput::Base64(text) => PreparedInput::from_bytes(&decode_base64(&text)?),
        }
    }
}

impl From<&str> for WorkbookInput {
    fn from(s: &str) -> Self {
        WorkbookInput::Text(s.to_string())
    }
}

impl From<String> for WorkbookInput {
    fn from(s: String) -> Self {
        WorkbookInput::Text(s)
    }
}

impl From<&Path> for WorkbookInput {
    fn from(p: &Path) -> Self {
        WorkbookInput::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for WorkbookInput {
    fn from(p: PathBuf) -> Self {
        WorkbookInput::Path(p)
    }
}

impl From<&PathBuf> for WorkbookInput {
    fn from(p: &PathBuf) -> Self {
        WorkbookInput::Path(p.clone())
    }
}

impl From<Vec<u8>> for WorkbookInput {
    fn from(b: Vec<u8>) -> Self {
        WorkbookInput::Bytes(b)
    }
}

impl From<&[u8]> for WorkbookInput {
    fn from(b: &[u8]) -> Self {
        WorkbookInput::Bytes(b.to_vec())
    }
}

/// Heuristic used for [`WorkbookInput::Text`].
///
/// True only when the text is longer than [`BASE64_MIN_LEN`], uses nothing but
/// the base64 alphabet, `=` and whitespace, and carries a ZIP signature
/// (`UEs`/`PK` prefix) or a typical padding run (`AAAA`, `////`). A path made
/// of the same characters is misread; use [`InputKind`] to force a reading.
pub fn looks_like_base64(text: &str) -> bool {
    if text.len() <= BASE64_MIN_LEN {
        return false;
    }
    let alphabet_only = text.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=') || c.is_whitespace()
    });
    if !alphabet_only {
        return false;
    }
    let head = text.trim_start();
    head.starts_with("UEs")
        || head.starts_with("PK")
        || text.contains("AAAA")
        || text.contains("////")
}

fn decode_base64(text: &str) -> Result<Vec<u8>, ReadError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ReadError::InvalidInput(format!("invalid base64 content: {e}")))
}

/// A path ready for the workbook parser, plus the temp file backing it.
///
/// Dropping the value releases the temp file exactly once. Deletion errors
/// are logged and swallowed so they never replace the error of the call.
#[derive(Debug)]
pub struct PreparedInput {
    path: PathBuf,
    temp: Option<NamedTempFile>,
}

impl PreparedInput {
    fn from_path(path: &Path) -> Result<Self, ReadError> {
        let path = std::path::absolute(path)?;
        if !path.exists() {
            return Err(ReadError::NotFound { path });
        }
        Ok(Self { path, temp: None })
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ReadError> {
        if bytes.is_empty() {
            return Err(ReadError::InvalidInput("workbook bytes must not be empty".into()));
        }
        let mut temp = tempfile::Builder::new()
            .prefix("sheetrows-")
            .suffix(".xlsx")
            .tempfile()?;
        temp.write_all(bytes)?;
        temp.flush()?;
        let path = temp.path().to_path_buf();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            path = %path.display(),
            len = bytes.len(),
            "spilled workbook bytes to temp file"
        );
        Ok(Self {
            path,
            temp: Some(temp),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Release early; equivalent to dropping.
    pub fn release(self) {}
}

impl Drop for PreparedInput {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            match temp.close() {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(path = %self.path.display(), "removed temp workbook");
                }
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %_err,
                        "failed to remove temp workbook"
                    );
                }
            }
        }
    }
}
