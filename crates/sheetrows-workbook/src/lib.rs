//! Workbook access for sheetrows.
//!
//! [`WorkbookReader`] is the seam between the table engine and whatever
//! parses the container. The default [`XlsxReader`] reads cell text through
//! calamine and pulls media blobs and drawing anchors out of the zip package
//! itself. [`WorkbookInput`] accepts paths, raw bytes or base64 text and
//! hands the reader a path it can open.

pub mod backends;
pub mod error;
pub mod input;
pub mod traits;

#[cfg(feature = "calamine")]
pub use backends::{ReaderConfig, XlsxReader};
pub use error::{ErrorKind, ReadError};
pub use input::{InputKind, PreparedInput, WorkbookInput, looks_like_base64};
pub use traits::WorkbookReader;

pub use sheetrows_common::{CellPos, ImageAnchor, ImageAsset, SheetGrid, WorkbookData};
