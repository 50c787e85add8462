use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SheetGrid;

/// An image blob embedded in the workbook container.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAsset {
    /// File name inside the container, e.g. `image1.png`. May be empty or repeated.
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub mime_type: String,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "data", with = "crate::image::base64_bytes")
    )]
    pub bytes: Arc<[u8]>,
}

impl ImageAsset {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Zero-based cell coordinate of one anchor corner.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellPos {
    pub col: u32,
    pub row: u32,
}

impl CellPos {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorKind {
    /// Confined to a single row (`from.row == to.row`).
    Embedded,
    /// Spans several rows; only the top row claims the image.
    Floating,
}

/// Where an image sits on a sheet. Both corners are inclusive.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAnchor {
    /// Name expected to match an [`ImageAsset::name`], not guaranteed exactly.
    #[cfg_attr(feature = "serde", serde(rename = "image"))]
    pub image_ref: String,
    #[cfg_attr(feature = "serde", serde(rename = "sheet"))]
    pub sheet_name: String,
    pub from: CellPos,
    pub to: CellPos,
}

impl ImageAnchor {
    pub fn new(
        image_ref: impl Into<String>,
        sheet_name: impl Into<String>,
        from: CellPos,
        to: CellPos,
    ) -> Self {
        Self {
            image_ref: image_ref.into(),
            sheet_name: sheet_name.into(),
            from,
            to,
        }
    }

    /// `None` for an inverted anchor (`to.row < from.row`), which never claims a row.
    pub fn kind(&self) -> Option<AnchorKind> {
        match self.from.row.cmp(&self.to.row) {
            std::cmp::Ordering::Equal => Some(AnchorKind::Embedded),
            std::cmp::Ordering::Less => Some(AnchorKind::Floating),
            std::cmp::Ordering::Greater => None,
        }
    }
}

/// Everything the workbook parser hands over for one file.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkbookData {
    pub sheets: Vec<SheetGrid>,
    pub images: Vec<ImageAsset>,
    pub image_positions: Vec<ImageAnchor>,
}

impl WorkbookData {
    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }
}

#[cfg(feature = "serde")]
pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, B>(bytes: &B, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        B: AsRef<[u8]>,
    {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D, B>(deserializer: D) -> Result<B, D::Error>
    where
        D: Deserializer<'de>,
        B: From<Vec<u8>>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(B::from)
            .map_err(serde::de::Error::custom)
    }
}
