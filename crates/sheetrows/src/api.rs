//! The public read operations.
//!
//! Each operation prepares its input, hands the resulting path to a
//! [`WorkbookReader`], and lets the [`PreparedInput`] guard go out of scope
//! before returning, so a temporary file never outlives the call that made
//! it, whether the call succeeds or fails.
//!
//! [`PreparedInput`]: sheetrows_workbook::PreparedInput

use crate::assembler::RecordAssembler;
use crate::options::TableOptions;
use crate::projector::TableProjector;
use crate::resolver::ImageRowResolver;
use sheetrows_common::{ImageAsset, Record, SheetGrid, WorkbookData};
use sheetrows_workbook::{ReadError, WorkbookInput, WorkbookReader};

#[cfg(feature = "calamine")]
use sheetrows_workbook::XlsxReader;

/// Sheets, images and image positions of a workbook.
#[cfg(feature = "calamine")]
pub fn read_excel(input: impl Into<WorkbookInput>) -> Result<WorkbookData, ReadError> {
    read_excel_with(&XlsxReader::new(), input)
}

/// Every image embedded in a workbook, in container order.
#[cfg(feature = "calamine")]
pub fn extract_images(input: impl Into<WorkbookInput>) -> Result<Vec<ImageAsset>, ReadError> {
    extract_images_with(&XlsxReader::new(), input)
}

/// Sheet names in workbook order.
#[cfg(feature = "calamine")]
pub fn get_sheet_names(input: impl Into<WorkbookInput>) -> Result<Vec<String>, ReadError> {
    get_sheet_names_with(&XlsxReader::new(), input)
}

/// One sheet as header-keyed records with images attached.
#[cfg(feature = "calamine")]
pub fn read_table_as_json(
    input: impl Into<WorkbookInput>,
    options: &TableOptions,
) -> Result<Vec<Record>, ReadError> {
    read_table_as_json_with(&XlsxReader::new(), input, options)
}

pub fn read_excel_with<R: WorkbookReader>(
    reader: &R,
    input: impl Into<WorkbookInput>,
) -> Result<WorkbookData, ReadError> {
    let prepared = input.into().prepare()?;
    reader.read(prepared.path())
}

pub fn extract_images_with<R: WorkbookReader>(
    reader: &R,
    input: impl Into<WorkbookInput>,
) -> Result<Vec<ImageAsset>, ReadError> {
    let prepared = input.into().prepare()?;
    reader.images(prepared.path())
}

pub fn get_sheet_names_with<R: WorkbookReader>(
    reader: &R,
    input: impl Into<WorkbookInput>,
) -> Result<Vec<String>, ReadError> {
    let prepared = input.into().prepare()?;
    reader.sheet_names(prepared.path())
}

pub fn read_table_as_json_with<R: WorkbookReader>(
    reader: &R,
    input: impl Into<WorkbookInput>,
    options: &TableOptions,
) -> Result<Vec<Record>, ReadError> {
    let prepared = input.into().prepare()?;
    let data = reader.read(prepared.path())?;
    records_from_workbook(&data, options)
}

/// Project already-read workbook data. No I/O.
pub fn records_from_workbook(
    data: &WorkbookData,
    options: &TableOptions,
) -> Result<Vec<Record>, ReadError> {
    let grid = select_sheet(data, options.requested_sheet())?;

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "read_table",
        sheet = %grid.name,
        header_row = options.header_row,
        rows = grid.row_count()
    )
    .entered();

    let projector = TableProjector::new(grid, options)?;
    let resolver = ImageRowResolver::new(&data.images, &data.image_positions, &grid.name);
    let records = RecordAssembler::new(&projector, &resolver, options.image_replaces_text).assemble();

    #[cfg(feature = "tracing")]
    tracing::debug!(records = records.len(), "table projected");
    Ok(records)
}

/// The named sheet, or the first one when no name is given.
pub fn select_sheet<'a>(
    data: &'a WorkbookData,
    name: Option<&str>,
) -> Result<&'a SheetGrid, ReadError> {
    match name {
        Some(name) => data.sheet(name).ok_or_else(|| ReadError::SheetNotFound {
            sheet: name.to_string(),
        }),
        None => data.sheets.first().ok_or_else(|| ReadError::SheetNotFound {
            sheet: "no sheets in workbook".to_string(),
        }),
    }
}
