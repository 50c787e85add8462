use crate::options::{HeaderCollision, TableOptions};
use sheetrows_common::{Record, SheetGrid};
use sheetrows_workbook::ReadError;
use std::collections::BTreeSet;

/// Projects one sheet grid into header-keyed records.
///
/// Construction validates the header row and resolves the mapped header of
/// every column once; [`TableProjector::rows`] can then be iterated any number
/// of times and always yields the same records.
#[derive(Clone, Debug)]
pub struct TableProjector<'a> {
    grid: &'a SheetGrid,
    headers: Vec<String>,
    skip: BTreeSet<usize>,
    collision: HeaderCollision,
}

impl<'a> TableProjector<'a> {
    pub fn new(grid: &'a SheetGrid, options: &TableOptions) -> Result<Self, ReadError> {
        let header_row = options.header_row;
        let labels = match grid.row(header_row) {
            Some(labels) => labels,
            None => {
                return Err(ReadError::HeaderRowOutOfRange {
                    header_row,
                    row_count: grid.row_count(),
                });
            }
        };
        let headers = labels
            .iter()
            .map(|label| options.header_map.map(label).to_string())
            .collect();
        let mut skip: BTreeSet<usize> = options.skip_rows.iter().copied().collect();
        skip.insert(header_row);
        Ok(Self {
            grid,
            headers,
            skip,
            collision: options.header_collision,
        })
    }

    pub fn grid(&self) -> &'a SheetGrid {
        self.grid
    }

    /// Mapped header of every column, empty where the column is suppressed.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Property name for a 0-based column, `None` past the header row or
    /// where the header is empty.
    pub fn header_for(&self, col: usize) -> Option<&str> {
        self.headers
            .get(col)
            .map(String::as_str)
            .filter(|h| !h.is_empty())
    }

    pub fn is_skipped(&self, row: usize) -> bool {
        self.skip.contains(&row)
    }

    /// `(grid row index, record)` for every row not skipped, in ascending
    /// row order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, Record)> + '_ {
        (0..self.grid.row_count())
            .filter(|i| !self.is_skipped(*i))
            .map(|i| (i, self.project_row(i)))
    }

    fn project_row(&self, index: usize) -> Record {
        let cells = self.grid.row(index).unwrap_or(&[]);
        let mut record = Record::with_capacity(self.headers.len());
        for (col, header) in self.headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = cells.get(col).cloned().unwrap_or_default();
            if self.collision.store(&mut record, header, value) {
                #[cfg(feature = "tracing")]
                tracing::debug!(header = %header, row = index, col, "header collision; later column wins");
            }
        }
        record
    }
}
