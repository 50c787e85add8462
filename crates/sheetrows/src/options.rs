use serde::{Deserialize, Serialize};
use sheetrows_common::{HeaderMap, Record};

/// Whether an image anchored on a cell replaces text already stored under
/// the same property.
pub const IMAGE_REPLACES_TEXT: bool = true;

/// What happens when two columns map to the same property name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderCollision {
    /// The higher column index overwrites the lower one; the property keeps
    /// the position of its first column.
    #[default]
    LastWins,
}

impl HeaderCollision {
    /// Store a cell under `key`. Returns `true` when an earlier column's
    /// value was displaced.
    pub(crate) fn store(self, record: &mut Record, key: &str, value: String) -> bool {
        match self {
            HeaderCollision::LastWins => record.insert(key, value).is_some(),
        }
    }
}

/// How a sheet is projected into records.
///
/// Deserializes from the camelCase option names used on the wire
/// (`sheetName`, `headerRow`, `skipRows`, `headerMap`); missing fields take
/// their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableOptions {
    /// Sheet to read; the first sheet when `None` or empty.
    pub sheet_name: Option<String>,
    /// 0-based grid row holding the header labels.
    pub header_row: usize,
    /// Extra 0-based grid rows to leave out. The header row is always skipped.
    pub skip_rows: Vec<usize>,
    pub header_map: HeaderMap,
    pub header_collision: HeaderCollision,
    /// See [`IMAGE_REPLACES_TEXT`]. When `false`, non-empty text wins and
    /// the image is dropped for that cell.
    pub image_replaces_text: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            sheet_name: None,
            header_row: 0,
            skip_rows: Vec::new(),
            header_map: HeaderMap::new(),
            header_collision: HeaderCollision::default(),
            image_replaces_text: IMAGE_REPLACES_TEXT,
        }
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    pub fn header_row(mut self, row: usize) -> Self {
        self.header_row = row;
        self
    }

    pub fn skip_row(mut self, row: usize) -> Self {
        self.skip_rows.push(row);
        self
    }

    pub fn map_header(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.header_map.insert(from, to);
        self
    }

    pub fn image_replaces_text(mut self, replace: bool) -> Self {
        self.image_replaces_text = replace;
        self
    }

    /// The requested sheet name, treating an empty name as absent.
    pub fn requested_sheet(&self) -> Option<&str> {
        self.sheet_name.as_deref().filter(|s| !s.is_empty())
    }
}
