use crate::backends::package::XlsxPackage;
use crate::error::ReadError;
use crate::traits::WorkbookReader;
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use serde::{Deserialize, Serialize};
use sheetrows_common::{ImageAsset, SheetGrid, WorkbookData};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const BACKEND: &str = "calamine";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    /// Drop media entries with an empty file name or no bytes.
    pub skip_empty_media: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            skip_empty_media: true,
        }
    }
}

/// XLSX reader: cell text through calamine, media and drawing anchors
/// straight from the zip package.
#[derive(Clone, Debug, Default)]
pub struct XlsxReader {
    config: ReaderConfig,
}

impl XlsxReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    fn open(path: &Path) -> Result<Xlsx<BufReader<File>>, ReadError> {
        open_workbook(path).map_err(|e| ReadError::from_backend(BACKEND, e))
    }

    /// Render one cell the way it reads in the grid.
    pub fn cell_text(data: &Data) -> String {
        match data {
            Data::Empty => String::new(),
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            // Serial number, matching what the cell holds before formatting.
            Data::DateTime(dt) => dt.as_f64().to_string(),
            Data::Error(e) => e.to_string(),
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
        }
    }

    /// Lay a used range out on absolute coordinates: grid row 0 is sheet row
    /// 1 even when the first used cell is further down or right.
    pub fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
        let (Some((start_row, start_col)), Some((_, end_col))) = (range.start(), range.end())
        else {
            return Vec::new();
        };
        let width = end_col as usize + 1;
        let mut rows = vec![vec![String::new(); width]; start_row as usize];
        rows.reserve(range.height());
        for cells in range.rows() {
            let mut row = Vec::with_capacity(width);
            row.resize(start_col as usize, String::new());
            row.extend(cells.iter().map(Self::cell_text));
            rows.push(row);
        }
        rows
    }
}

impl WorkbookReader for XlsxReader {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn read(&self, path: &Path) -> Result<WorkbookData, ReadError> {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::info_span!("read_workbook", backend = BACKEND, path = %path.display()).entered();

        let mut workbook = Self::open(path)?;
        let names = workbook.sheet_names();
        let mut sheets = Vec::with_capacity(names.len());
        for name in &names {
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| ReadError::from_backend(BACKEND, e))?;
            sheets.push(SheetGrid::new(name.clone(), Self::range_to_rows(&range)));
        }

        let mut package = XlsxPackage::open(path)?;
        let images = package.media(self.config.skip_empty_media)?;
        let image_positions = package.anchors(&names)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sheets = sheets.len(),
            images = images.len(),
            anchors = image_positions.len(),
            "workbook read"
        );
        Ok(WorkbookData {
            sheets,
            images,
            image_positions,
        })
    }

    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, ReadError> {
        Ok(Self::open(path)?.sheet_names())
    }

    fn images(&self, path: &Path) -> Result<Vec<ImageAsset>, ReadError> {
        XlsxPackage::open(path)?.media(self.config.skip_empty_media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn cells_render_as_plain_text() {
        assert_eq!(XlsxReader::cell_text(&Data::Empty), "");
        assert_eq!(XlsxReader::cell_text(&Data::Float(25.0)), "25");
        assert_eq!(XlsxReader::cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(XlsxReader::cell_text(&Data::Int(-3)), "-3");
        assert_eq!(XlsxReader::cell_text(&Data::Bool(true)), "true");
        assert_eq!(
            XlsxReader::cell_text(&Data::Error(CellErrorType::Div0)),
            "#DIV/0!"
        );
    }

    #[test]
    fn ranges_are_padded_to_absolute_positions() {
        let mut range = Range::new((1, 1), (2, 2));
        range.set_value((1, 1), Data::String("h".into()));
        range.set_value((2, 2), Data::Float(7.0));
        let rows = XlsxReader::range_to_rows(&range);
        assert_eq!(
            rows,
            vec![
                vec!["", "", ""],
                vec!["", "h", ""],
                vec!["", "", "7"],
            ]
        );
    }

    #[test]
    fn empty_range_has_no_rows() {
        let range: Range<Data> = Range::empty();
        assert!(XlsxReader::range_to_rows(&range).is_empty());
    }
}
