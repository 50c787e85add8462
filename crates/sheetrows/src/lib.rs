//! Turn spreadsheet sheets into header-keyed records, with embedded images
//! attached to the row and column they visually occupy.
//!
//! ```no_run
//! use sheetrows::{TableOptions, read_table_as_json};
//!
//! let options = TableOptions::new().sheet("Products").map_header("Photo", "image");
//! let records = read_table_as_json("products.xlsx", &options)?;
//! for record in &records {
//!     if let Some(image) = record.get("image").and_then(|v| v.as_image()) {
//!         println!("{} ({} bytes)", image.name, image.bytes.len());
//!     }
//! }
//! # Ok::<(), sheetrows::ReadError>(())
//! ```
//!
//! The pipeline is [`TableProjector`] (grid rows to records),
//! [`ImageRowResolver`] (anchors to rows) and [`RecordAssembler`] (the
//! merge). Workbook parsing sits behind [`WorkbookReader`]; the `*_with`
//! operations accept any implementation.

pub mod api;
pub mod assembler;
pub mod options;
pub mod projector;
pub mod resolver;

#[cfg(feature = "calamine")]
pub use api::{extract_images, get_sheet_names, read_excel, read_table_as_json};
pub use api::{
    extract_images_with, get_sheet_names_with, read_excel_with, read_table_as_json_with,
    records_from_workbook, select_sheet,
};
pub use assembler::RecordAssembler;
pub use options::{HeaderCollision, IMAGE_REPLACES_TEXT, TableOptions};
pub use projector::TableProjector;
pub use resolver::{ImageRowResolver, ResolvedImage};

pub use sheetrows_common::{
    AnchorKind, CellPos, HeaderMap, ImageAnchor, ImageAsset, ImageRef, Record, RecordValue,
    SheetGrid, WorkbookData,
};
#[cfg(feature = "calamine")]
pub use sheetrows_workbook::{ReaderConfig, XlsxReader};
pub use sheetrows_workbook::{
    ErrorKind, InputKind, PreparedInput, ReadError, WorkbookInput, WorkbookReader,
};

/// Workbook access layer, for custom readers and direct package inspection.
pub use sheetrows_workbook as workbook;
