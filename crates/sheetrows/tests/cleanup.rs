//! Temporary files made for byte and base64 input are gone once the call
//! returns, including when the reader fails.

use sheetrows::{
    ErrorKind, InputKind, ReadError, SheetGrid, TableOptions, WorkbookData, WorkbookInput,
    WorkbookReader,
    extract_images_with, get_sheet_names_with, read_excel_with, read_table_as_json_with,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Remembers every path it was asked to open, then fails or serves `data`.
#[derive(Default)]
struct RecordingReader {
    seen: Mutex<Vec<PathBuf>>,
    fail: bool,
    data: WorkbookData,
}

impl RecordingReader {
    fn serving(data: WorkbookData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl WorkbookReader for RecordingReader {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    fn read(&self, path: &Path) -> Result<WorkbookData, ReadError> {
        assert!(path.exists(), "reader must see an existing file");
        self.seen.lock().unwrap().push(path.to_path_buf());
        if self.fail {
            Err(ReadError::from_backend("recording", "corrupt container"))
        } else {
            Ok(self.data.clone())
        }
    }
}

fn zip_like_base64(len: usize) -> String {
    let mut text = String::from("UEs");
    text.extend(std::iter::repeat_n('A', len - 3));
    text
}

#[test]
fn temp_file_removed_after_collaborator_error() {
    let reader = RecordingReader::failing();
    let err = read_table_as_json_with(&reader, b"PK\x03\x04junk".to_vec(), &TableOptions::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Collaborator);

    let seen = reader.seen();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists(), "temp file leaked: {}", seen[0].display());
}

#[test]
fn temp_file_removed_after_sheet_not_found() {
    // An empty workbook has no sheets, which fails after the read succeeded.
    let reader = RecordingReader::default();
    let err = read_table_as_json_with(&reader, vec![1u8, 2, 3], &TableOptions::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SheetNotFound);
    assert!(!reader.seen()[0].exists());
}

#[test]
fn temp_file_removed_after_range_error() {
    let reader = RecordingReader::serving(WorkbookData {
        sheets: vec![SheetGrid::from_rows("S", [vec!["name"]])],
        ..WorkbookData::default()
    });
    let err = read_table_as_json_with(&reader, vec![1u8, 2, 3], &TableOptions::new().header_row(5))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);

    let seen = reader.seen();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists(), "temp file leaked: {}", seen[0].display());
}

#[test]
fn temp_file_removed_after_success() {
    let reader = RecordingReader::default();
    read_excel_with(&reader, vec![1u8, 2, 3]).unwrap();
    get_sheet_names_with(&reader, vec![4u8]).unwrap();
    extract_images_with(&reader, vec![5u8]).unwrap();
    let seen = reader.seen();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|p| !p.exists()));
}

#[test]
fn zip_signature_base64_is_content_not_a_path() {
    let text = zip_like_base64(600);
    assert_eq!(text.len(), 600);
    assert!(sheetrows::workbook::looks_like_base64(&text));

    let reader = RecordingReader::failing();
    let err = get_sheet_names_with(&reader, text.as_str()).unwrap_err();
    assert_ne!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.kind(), ErrorKind::Collaborator);
    assert!(!reader.seen()[0].exists());
}

#[test]
fn forced_kinds_bypass_sniffing() {
    let reader = RecordingReader::default();

    let short = "UEsDBA==";
    read_excel_with(&reader, WorkbookInput::with_kind(short, InputKind::Base64)).unwrap();
    assert_eq!(reader.seen().len(), 1);

    let err = read_excel_with(&reader, WorkbookInput::with_kind(zip_like_base64(600), InputKind::Path))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn undecodable_base64_is_invalid_input() {
    let reader = RecordingReader::default();
    let err = read_excel_with(&reader, WorkbookInput::with_kind("not base64!", InputKind::Base64))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(reader.seen().is_empty());
}

#[test]
fn empty_bytes_are_invalid_input() {
    let reader = RecordingReader::default();
    let err = read_excel_with(&reader, Vec::<u8>::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}
