use std::path::PathBuf;

/// Coarse classification of a [`ReadError`], one per failure class a caller
/// is expected to handle differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing, empty or undecodable call argument.
    Input,
    /// A path that does not exist.
    NotFound,
    /// The requested sheet is absent from the workbook.
    SheetNotFound,
    /// Header row index beyond the available rows.
    Range,
    /// Opaque failure reported by the workbook parser.
    Collaborator,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("sheet not found: {sheet}")]
    SheetNotFound { sheet: String },

    #[error("header row index {header_row} is out of range ({row_count} rows)")]
    HeaderRowOutOfRange { header_row: usize, row_count: usize },

    #[error("{backend} error: {message}")]
    Backend { backend: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    pub fn from_backend(backend: &str, err: impl std::fmt::Display) -> Self {
        ReadError::Backend {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadError::InvalidInput(_) | ReadError::Io(_) => ErrorKind::Input,
            ReadError::NotFound { .. } => ErrorKind::NotFound,
            ReadError::SheetNotFound { .. } => ErrorKind::SheetNotFound,
            ReadError::HeaderRowOutOfRange { .. } => ErrorKind::Range,
            ReadError::Backend { .. } => ErrorKind::Collaborator,
        }
    }
}
