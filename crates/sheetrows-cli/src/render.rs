use clap::ValueEnum;
use serde_json::{Map, Value, json};
use sheetrows::{ImageAsset, ImageRef, Record, RecordValue};
use std::collections::HashSet;

/// How image-valued properties appear in `table` output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImageMode {
    /// `{data, name, type}` with base64 data.
    Base64,
    /// Leave image-valued properties out.
    Omit,
    /// `{name, type, size}` without the bytes.
    Meta,
}

pub fn records_to_json(records: &[Record], mode: ImageMode) -> Value {
    Value::Array(records.iter().map(|r| record_to_json(r, mode)).collect())
}

fn record_to_json(record: &Record, mode: ImageMode) -> Value {
    let mut map = Map::with_capacity(record.len());
    for (key, value) in record.iter() {
        let rendered = match (value, mode) {
            (RecordValue::Text(text), _) => Value::String(text.clone()),
            (_, ImageMode::Omit) => continue,
            (RecordValue::Image(image), _) => image_to_json(image, mode),
            (RecordValue::Images(images), _) => {
                Value::Array(images.iter().map(|i| image_to_json(i, mode)).collect())
            }
        };
        map.insert(key.to_string(), rendered);
    }
    Value::Object(map)
}

fn image_to_json(image: &ImageRef, mode: ImageMode) -> Value {
    match mode {
        ImageMode::Meta => json!({
            "name": image.name,
            "type": image.mime_type,
            "size": image.bytes.len(),
        }),
        _ => serde_json::to_value(image).unwrap_or(Value::Null),
    }
}

/// A distinct file name per image. Empty or repeated container names get a
/// positional name instead.
pub fn output_file_names(images: &[ImageAsset]) -> Vec<String> {
    let mut used = HashSet::new();
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let name = if image.name.is_empty() || used.contains(&image.name) {
                format!("image-{}{}", i + 1, extension(&image.name))
            } else {
                image.name.clone()
            };
            used.insert(name.clone());
            name
        })
        .collect()
}

fn extension(name: &str) -> &str {
    name.rfind('.').map_or("", |i| &name[i..])
}
