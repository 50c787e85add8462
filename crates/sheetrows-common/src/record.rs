use indexmap::IndexMap;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::ser::{SerializeMap, SerializeSeq};
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

use crate::ImageAsset;

/// An image attached to a record cell.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    #[cfg_attr(
        feature = "serde",
        serde(rename = "data", serialize_with = "crate::image::base64_bytes::serialize")
    )]
    pub bytes: Arc<[u8]>,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub mime_type: String,
}

impl From<&ImageAsset> for ImageRef {
    fn from(asset: &ImageAsset) -> Self {
        Self {
            bytes: Arc::clone(&asset.bytes),
            name: asset.name.clone(),
            mime_type: asset.mime_type.clone(),
        }
    }
}

/// Value of one record property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordValue {
    Text(String),
    Image(ImageRef),
    /// Two or more images landed on the same property, in column order.
    Images(Vec<ImageRef>),
}

impl RecordValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageRef> {
        match self {
            RecordValue::Image(img) => Some(img),
            _ => None,
        }
    }

    /// All images held by this value; empty for text.
    pub fn images(&self) -> &[ImageRef] {
        match self {
            RecordValue::Text(_) => &[],
            RecordValue::Image(img) => std::slice::from_ref(img),
            RecordValue::Images(imgs) => imgs,
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, RecordValue::Text(_))
    }
}

impl From<String> for RecordValue {
    fn from(s: String) -> Self {
        RecordValue::Text(s)
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        RecordValue::Text(s.to_string())
    }
}

impl From<ImageRef> for RecordValue {
    fn from(img: ImageRef) -> Self {
        RecordValue::Image(img)
    }
}

#[cfg(feature = "serde")]
impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordValue::Text(s) => serializer.serialize_str(s),
            RecordValue::Image(img) => img.serialize(serializer),
            RecordValue::Images(imgs) => {
                let mut seq = serializer.serialize_seq(Some(imgs.len()))?;
                for img in imgs {
                    seq.serialize_element(img)?;
                }
                seq.end()
            }
        }
    }
}

/// One output row: property names in first-insertion order.
///
/// Re-inserting an existing property replaces its value in place, so the
/// position of a key never moves. Equality compares keys in order.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: IndexMap<String, RecordValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RecordValue> {
        self.fields.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Set `key`, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<RecordValue>,
    ) -> Option<RecordValue> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_vec(self) -> Vec<(String, RecordValue)> {
        self.fields.into_iter().collect()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for Record {}

#[cfg(feature = "serde")]
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
