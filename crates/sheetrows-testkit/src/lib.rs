//! Minimal XLSX packages written by hand, so tests can place pictures on
//! exact cells without a spreadsheet application.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::FileOptions;

/// A 1x1 transparent PNG.
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_XDR: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

#[derive(Clone, Debug)]
struct Picture {
    media: String,
    from: (u32, u32),
    /// `None` writes a `oneCellAnchor`.
    to: Option<(u32, u32)>,
}

#[derive(Clone, Debug)]
struct Sheet {
    name: String,
    rows: Vec<Vec<String>>,
    pictures: Vec<Picture>,
}

/// Builder for an XLSX package. Coordinates are 0-based `(col, row)`.
#[derive(Clone, Debug, Default)]
pub struct XlsxFixture {
    sheets: Vec<Sheet>,
    media: Vec<(String, Vec<u8>)>,
    omit_sheet_rels: bool,
}

impl XlsxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet. Cells that parse as numbers are stored as numbers,
    /// everything else as inline strings; empty cells are omitted.
    pub fn sheet<R, C, S>(mut self, name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sheets.push(Sheet {
            name: name.to_string(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
            pictures: Vec::new(),
        });
        self
    }

    pub fn media(mut self, name: &str, bytes: &[u8]) -> Self {
        self.media.push((name.to_string(), bytes.to_vec()));
        self
    }

    /// Two-cell anchor spanning `from..=to`.
    pub fn picture(mut self, sheet: &str, media: &str, from: (u32, u32), to: (u32, u32)) -> Self {
        self.sheet_mut(sheet).pictures.push(Picture {
            media: media.to_string(),
            from,
            to: Some(to),
        });
        self
    }

    /// One-cell anchor at `at`.
    pub fn cell_picture(mut self, sheet: &str, media: &str, at: (u32, u32)) -> Self {
        self.sheet_mut(sheet).pictures.push(Picture {
            media: media.to_string(),
            from: at,
            to: None,
        });
        self
    }

    /// Leave out the worksheet `.rels` parts, so drawings can only be
    /// attributed to sheets by their number.
    pub fn without_sheet_rels(mut self) -> Self {
        self.omit_sheet_rels = true;
        self
    }

    fn sheet_mut(&mut self, name: &str) -> &mut Sheet {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("fixture has no sheet named {name}"))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut put = |name: &str, data: &[u8]| {
            zip.start_file(name, FileOptions::default())
                .expect("zip start_file");
            zip.write_all(data).expect("zip write");
        };

        put("[Content_Types].xml", self.content_types().as_bytes());
        put(
            "_rels/.rels",
            rels(&[(
                "rId1",
                "officeDocument",
                "xl/workbook.xml".to_string(),
            )])
            .as_bytes(),
        );
        put("xl/workbook.xml", self.workbook_xml().as_bytes());
        let sheet_rels: Vec<_> = (1..=self.sheets.len())
            .map(|i| (format!("rId{i}"), format!("worksheets/sheet{i}.xml")))
            .collect();
        put(
            "xl/_rels/workbook.xml.rels",
            rels(
                &sheet_rels
                    .iter()
                    .map(|(id, target)| (id.as_str(), "worksheet", target.clone()))
                    .collect::<Vec<_>>(),
            )
            .as_bytes(),
        );

        // Drawings are numbered only over sheets that have pictures, so the
        // drawing number need not match the sheet number.
        let mut drawing_no = 0;
        for (i, sheet) in self.sheets.iter().enumerate() {
            let sheet_no = i + 1;
            let has_drawing = !sheet.pictures.is_empty();
            put(
                &format!("xl/worksheets/sheet{sheet_no}.xml"),
                sheet_xml(sheet, has_drawing).as_bytes(),
            );
            if !has_drawing {
                continue;
            }
            drawing_no += 1;
            if !self.omit_sheet_rels {
                put(
                    &format!("xl/worksheets/_rels/sheet{sheet_no}.xml.rels"),
                    rels(&[(
                        "rId1",
                        "drawing",
                        format!("../drawings/drawing{drawing_no}.xml"),
                    )])
                    .as_bytes(),
                );
            }
            put(
                &format!("xl/drawings/drawing{drawing_no}.xml"),
                drawing_xml(&sheet.pictures).as_bytes(),
            );
            let pic_rels: Vec<_> = sheet
                .pictures
                .iter()
                .enumerate()
                .map(|(j, p)| (format!("rId{}", j + 1), format!("../media/{}", p.media)))
                .collect();
            put(
                &format!("xl/drawings/_rels/drawing{drawing_no}.xml.rels"),
                rels(
                    &pic_rels
                        .iter()
                        .map(|(id, target)| (id.as_str(), "image", target.clone()))
                        .collect::<Vec<_>>(),
                )
                .as_bytes(),
            );
        }

        for (name, bytes) in &self.media {
            put(&format!("xl/media/{name}"), bytes);
        }

        zip.finish().expect("zip finish").into_inner()
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).expect("write fixture");
    }

    fn content_types(&self) -> String {
        let mut out = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="png" ContentType="image/png"/>
<Default Extension="jpeg" ContentType="image/jpeg"/>
<Default Extension="jpg" ContentType="image/jpeg"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
        );
        for i in 1..=self.sheets.len() {
            out.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{i}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n"
            ));
        }
        out.push_str("</Types>");
        out
    }

    fn workbook_xml(&self) -> String {
        let mut out = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<workbook xmlns=\"{NS_MAIN}\" xmlns:r=\"{NS_REL}\"><sheets>"
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            let n = i + 1;
            out.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>",
                escape(&sheet.name)
            ));
        }
        out.push_str("</sheets></workbook>");
        out
    }
}

fn rels(entries: &[(&str, &str, String)]) -> String {
    let mut out = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{NS_PKG_REL}\">"
    );
    for (id, kind, target) in entries {
        out.push_str(&format!(
            "<Relationship Id=\"{id}\" Type=\"{NS_REL}/{kind}\" Target=\"{}\"/>",
            escape(target)
        ));
    }
    out.push_str("</Relationships>");
    out
}

fn sheet_xml(sheet: &Sheet, has_drawing: bool) -> String {
    let mut out = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<worksheet xmlns=\"{NS_MAIN}\" xmlns:r=\"{NS_REL}\"><sheetData>"
    );
    for (r, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(String::is_empty) {
            continue;
        }
        let row_no = r + 1;
        out.push_str(&format!("<row r=\"{row_no}\">"));
        for (c, text) in row.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let cell_ref = format!("{}{row_no}", column_letters(c as u32));
            if text.parse::<f64>().is_ok_and(f64::is_finite) {
                out.push_str(&format!("<c r=\"{cell_ref}\"><v>{text}</v></c>"));
            } else {
                out.push_str(&format!(
                    "<c r=\"{cell_ref}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                    escape(text)
                ));
            }
        }
        out.push_str("</row>");
    }
    out.push_str("</sheetData>");
    if has_drawing {
        out.push_str("<drawing r:id=\"rId1\"/>");
    }
    out.push_str("</worksheet>");
    out
}

fn marker(tag: &str, (col, row): (u32, u32)) -> String {
    format!(
        "<xdr:{tag}><xdr:col>{col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:{tag}>"
    )
}

fn drawing_xml(pictures: &[Picture]) -> String {
    let mut out = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<xdr:wsDr xmlns:xdr=\"{NS_XDR}\" xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_REL}\">"
    );
    for (j, pic) in pictures.iter().enumerate() {
        let id = j + 1;
        let body = format!(
            "<xdr:pic><xdr:nvPicPr><xdr:cNvPr id=\"{}\" name=\"Picture {id}\"/><xdr:cNvPicPr/></xdr:nvPicPr><xdr:blipFill><a:blip r:embed=\"rId{id}\"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr/></xdr:pic><xdr:clientData/>",
            id + 1
        );
        match pic.to {
            Some(to) => out.push_str(&format!(
                "<xdr:twoCellAnchor editAs=\"oneCell\">{}{}{body}</xdr:twoCellAnchor>",
                marker("from", pic.from),
                marker("to", to)
            )),
            None => out.push_str(&format!(
                "<xdr:oneCellAnchor>{}<xdr:ext cx=\"952500\" cy=\"952500\"/>{body}</xdr:oneCellAnchor>",
                marker("from", pic.from)
            )),
        }
    }
    out.push_str("</xdr:wsDr>");
    out
}

/// `0 → A`, `25 → Z`, `26 → AA`.
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii column letters")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Write `fixture` into a fresh temp dir and return the dir guard with the
/// workbook path. Keep the guard alive for as long as the file is needed.
pub fn build_xlsx(fixture: &XlsxFixture) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fixture.xlsx");
    fixture.write_to(&path);
    (dir, path)
}
