//! Direct access to the parts of an XLSX package that calamine does not
//! surface: media blobs, drawing anchors and the relationships tying
//! drawings to worksheets.

use crate::error::ReadError;
use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, Event};
use sheetrows_common::{CellPos, ImageAnchor, ImageAsset};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const MEDIA_DIR: &str = "xl/media/";
const DRAWINGS_DIR: &str = "xl/drawings/";
const DRAWING_REL_TYPE: &str = "/drawing";

/// One `<Relationship>` entry of a `.rels` part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// A picture anchor as written in a drawing part, before its embed id is
/// resolved to a media file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawingAnchor {
    pub embed: String,
    pub from: CellPos,
    pub to: CellPos,
}

pub struct XlsxPackage<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl XlsxPackage<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> XlsxPackage<R> {
    pub fn new(reader: R) -> Result<Self, ReadError> {
        let archive = ZipArchive::new(reader).map_err(|e| ReadError::from_backend("zip", e))?;
        Ok(Self { archive })
    }

    /// Part names in archive order.
    fn part_names(&mut self) -> Result<Vec<String>, ReadError> {
        let mut names = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(i)
                .map_err(|e| ReadError::from_backend("zip", e))?;
            names.push(entry.name().to_string());
        }
        Ok(names)
    }

    fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>, ReadError> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(ReadError::from_backend("zip", e)),
        };
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn read_text_part(&mut self, name: &str) -> Result<Option<String>, ReadError> {
        Ok(self
            .read_part(name)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Every file under `xl/media/`, in archive order.
    pub fn media(&mut self, skip_empty: bool) -> Result<Vec<ImageAsset>, ReadError> {
        let mut images = Vec::new();
        for part in self.part_names()? {
            if !part.starts_with(MEDIA_DIR) || part.ends_with('/') {
                continue;
            }
            let Some(bytes) = self.read_part(&part)? else {
                continue;
            };
            let name = file_name(&part).to_string();
            if skip_empty && (name.is_empty() || bytes.is_empty()) {
                continue;
            }
            let mime = mime_type_for(&name);
            images.push(ImageAsset::new(name, mime, bytes));
        }
        Ok(images)
    }

    /// Picture anchors of every drawing part, attributed to sheets.
    ///
    /// `sheet_names` is the workbook's sheet order, used when the
    /// worksheet → drawing relationships cannot be followed.
    pub fn anchors(&mut self, sheet_names: &[String]) -> Result<Vec<ImageAnchor>, ReadError> {
        let owners = self.drawing_owners()?;
        let mut anchors = Vec::new();
        for part in self.part_names()? {
            let Some(file) = part.strip_prefix(DRAWINGS_DIR) else {
                continue;
            };
            if file.contains('/') || !file.ends_with(".xml") {
                continue;
            }
            let sheet = match owners.get(&part) {
                Some(sheet) => sheet.clone(),
                None => match positional_owner(file, sheet_names) {
                    Some(sheet) => sheet.to_string(),
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(part = %part, "drawing not attached to a sheet; skipping");
                        continue;
                    }
                },
            };
            let Some(xml) = self.read_text_part(&part)? else {
                continue;
            };
            let raw = match parse_drawing(&xml) {
                Ok(raw) => raw,
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(part = %part, error = %_err, "unreadable drawing part");
                    continue;
                }
            };
            if raw.is_empty() {
                continue;
            }
            let rels = self.relationships(&format!("{DRAWINGS_DIR}_rels/{file}.rels"))?;
            for anchor in raw {
                let image_ref = match rels.get(&anchor.embed) {
                    Some(rel) => file_name(&rel.target).to_string(),
                    None => anchor.embed.clone(),
                };
                anchors.push(ImageAnchor::new(image_ref, sheet.clone(), anchor.from, anchor.to));
            }
        }
        Ok(anchors)
    }

    fn relationships(&mut self, part: &str) -> Result<HashMap<String, Relationship>, ReadError> {
        let Some(xml) = self.read_text_part(part)? else {
            return Ok(HashMap::new());
        };
        match parse_relationships(&xml) {
            Ok(rels) => Ok(rels.into_iter().map(|r| (r.id.clone(), r)).collect()),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(part = %part, error = %_err, "unreadable relationships part");
                Ok(HashMap::new())
            }
        }
    }

    /// Drawing part path → owning sheet name, following
    /// workbook.xml → workbook rels → worksheet rels.
    fn drawing_owners(&mut self) -> Result<HashMap<String, String>, ReadError> {
        let mut owners = HashMap::new();
        let Some(workbook_xml) = self.read_text_part("xl/workbook.xml")? else {
            return Ok(owners);
        };
        let Ok(sheets) = parse_workbook_sheets(&workbook_xml) else {
            return Ok(owners);
        };
        let workbook_rels = self.relationships("xl/_rels/workbook.xml.rels")?;
        for (sheet_name, rel_id) in sheets {
            let Some(rel) = workbook_rels.get(&rel_id) else {
                continue;
            };
            let sheet_part = resolve_target("xl", &rel.target);
            let (dir, file) = split_part(&sheet_part);
            let sheet_rels = self.relationships(&format!("{dir}/_rels/{file}.rels"))?;
            for rel in sheet_rels.values() {
                if rel.rel_type.ends_with(DRAWING_REL_TYPE) {
                    owners.insert(resolve_target(dir, &rel.target), sheet_name.clone());
                }
            }
        }
        Ok(owners)
    }
}

/// `drawingN.xml` belongs to the N-th sheet when nothing better is known.
fn positional_owner<'a>(file: &str, sheet_names: &'a [String]) -> Option<&'a str> {
    let n: usize = file
        .strip_prefix("drawing")?
        .strip_suffix(".xml")?
        .parse()
        .ok()?;
    sheet_names.get(n.checked_sub(1)?).map(String::as_str)
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn split_part(part: &str) -> (&str, &str) {
    match part.rfind('/') {
        Some(i) => (&part[..i], &part[i + 1..]),
        None => ("", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

pub fn mime_type_for(name: &str) -> &'static str {
    let ext = match name.rfind('.') {
        Some(i) => name[i + 1..].to_ascii_lowercase(),
        None => return "application/octet-stream",
    };
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, ReadError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut out = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_value(&e, b"Id");
                let target = attr_value(&e, b"Target");
                if let (Some(id), Some(target)) = (id, target) {
                    out.push(Relationship {
                        id,
                        rel_type: attr_value(&e, b"Type").unwrap_or_default(),
                        target,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReadError::from_backend("quick-xml", e)),
            _ => {}
        }
    }
    Ok(out)
}

/// `(sheet name, relationship id)` for every `<sheet>` in workbook.xml.
pub fn parse_workbook_sheets(xml: &str) -> Result<Vec<(String, String)>, ReadError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut out = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attr_value(&e, b"name"), attr_value(&e, b"id")) {
                    out.push((name, id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReadError::from_backend("quick-xml", e)),
            _ => {}
        }
    }
    Ok(out)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Corner {
    From,
    To,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Col,
    Row,
}

struct AnchorBuilder {
    one_cell: bool,
    embed: Option<String>,
    from: CellPos,
    to: CellPos,
}

/// Picture anchors of one drawing part.
///
/// `twoCellAnchor` keeps both corners; `oneCellAnchor` has no bottom-right
/// cell and is reported with `to == from`. `absoluteAnchor` carries no cell
/// coordinates and is ignored, as are anchors holding shapes or charts.
pub fn parse_drawing(xml: &str) -> Result<Vec<DrawingAnchor>, ReadError> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut out = Vec::new();
    let mut current: Option<AnchorBuilder> = None;
    let mut corner: Option<Corner> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    current = Some(AnchorBuilder {
                        one_cell: e.local_name().as_ref() == b"oneCellAnchor",
                        embed: None,
                        from: CellPos::default(),
                        to: CellPos::default(),
                    });
                }
                b"from" if current.is_some() => corner = Some(Corner::From),
                b"to" if current.is_some() => corner = Some(Corner::To),
                b"col" if corner.is_some() => field = Some(Field::Col),
                b"row" if corner.is_some() => field = Some(Field::Row),
                b"blip" => set_embed(&mut current, &e),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"blip" => {
                set_embed(&mut current, &e);
            }
            Ok(Event::Text(t)) => {
                if let (Some(builder), Some(c), Some(f)) = (current.as_mut(), corner, field) {
                    let value = String::from_utf8_lossy(&t).trim().parse().unwrap_or(0);
                    let pos = match c {
                        Corner::From => &mut builder.from,
                        Corner::To => &mut builder.to,
                    };
                    match f {
                        Field::Col => pos.col = value,
                        Field::Row => pos.row = value,
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"col" | b"row" => field = None,
                b"from" | b"to" => corner = None,
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    if let Some(builder) = current.take() {
                        if let Some(embed) = builder.embed {
                            let to = if builder.one_cell {
                                builder.from
                            } else {
                                builder.to
                            };
                            out.push(DrawingAnchor {
                                embed,
                                from: builder.from,
                                to,
                            });
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReadError::from_backend("quick-xml", e)),
            _ => {}
        }
    }
    Ok(out)
}

fn set_embed(current: &mut Option<AnchorBuilder>, e: &BytesStart<'_>) {
    if let Some(builder) = current.as_mut() {
        if builder.embed.is_none() {
            builder.embed = attr_value(e, b"embed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAWING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <xdr:twoCellAnchor editAs="oneCell">
    <xdr:from><xdr:col>2</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>1</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:to><xdr:col>3</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>4</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
    <xdr:pic><xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill></xdr:pic>
    <xdr:clientData/>
  </xdr:twoCellAnchor>
  <xdr:oneCellAnchor>
    <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>6</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:ext cx="100" cy="100"/>
    <xdr:pic><xdr:blipFill><a:blip r:embed="rId2"></a:blip></xdr:blipFill></xdr:pic>
    <xdr:clientData/>
  </xdr:oneCellAnchor>
  <xdr:twoCellAnchor>
    <xdr:from><xdr:col>5</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>5</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
    <xdr:to><xdr:col>6</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>6</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
    <xdr:sp><xdr:nvSpPr><xdr:cNvPr id="3" name="Shape"/></xdr:nvSpPr></xdr:sp>
    <xdr:clientData/>
  </xdr:twoCellAnchor>
  <xdr:absoluteAnchor>
    <xdr:pos x="0" y="0"/><xdr:ext cx="1" cy="1"/>
    <xdr:pic><xdr:blipFill><a:blip r:embed="rId3"/></xdr:blipFill></xdr:pic>
  </xdr:absoluteAnchor>
</xdr:wsDr>"#;

    #[test]
    fn drawing_anchors_are_read_in_document_order() {
        let anchors = parse_drawing(DRAWING).unwrap();
        assert_eq!(
            anchors,
            vec![
                DrawingAnchor {
                    embed: "rId1".into(),
                    from: CellPos::new(2, 1),
                    to: CellPos::new(3, 4),
                },
                DrawingAnchor {
                    embed: "rId2".into(),
                    from: CellPos::new(0, 6),
                    to: CellPos::new(0, 6),
                },
            ]
        );
    }

    #[test]
    fn relationships_keep_type_and_target() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#;
        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].id, "rId1");
        assert!(rels[0].rel_type.ends_with("/image"));
        assert_eq!(file_name(&rels[0].target), "image1.png");
    }

    #[test]
    fn workbook_sheets_pair_names_with_ids() {
        let xml = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>
  <sheet name="Data" sheetId="1" r:id="rId1"/><sheet name="照片" sheetId="2" r:id="rId2"/>
</sheets></workbook>"#;
        assert_eq!(
            parse_workbook_sheets(xml).unwrap(),
            vec![
                ("Data".to_string(), "rId1".to_string()),
                ("照片".to_string(), "rId2".to_string())
            ]
        );
    }

    #[test]
    fn targets_resolve_relative_to_source_dir() {
        assert_eq!(
            resolve_target("xl/worksheets", "../drawings/drawing1.xml"),
            "xl/drawings/drawing1.xml"
        );
        assert_eq!(resolve_target("xl", "worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(
            resolve_target("xl", "/xl/worksheets/sheet3.xml"),
            "xl/worksheets/sheet3.xml"
        );
    }

    #[test]
    fn positional_owner_uses_drawing_number() {
        let sheets = vec!["A".to_string(), "B".to_string()];
        assert_eq!(positional_owner("drawing2.xml", &sheets), Some("B"));
        assert_eq!(positional_owner("drawing3.xml", &sheets), None);
        assert_eq!(positional_owner("drawing0.xml", &sheets), None);
    }

    #[test]
    fn mime_types_follow_extension() {
        assert_eq!(mime_type_for("image1.PNG"), "image/png");
        assert_eq!(mime_type_for("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_type_for("vector.emf"), "image/x-emf");
        assert_eq!(mime_type_for("blob"), "application/octet-stream");
    }
}
