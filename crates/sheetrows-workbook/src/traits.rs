use crate::error::ReadError;
use sheetrows_common::{ImageAsset, WorkbookData};
use std::path::Path;

/// Anything that can turn a workbook file on disk into sheet grids, image
/// blobs and image anchors.
///
/// Implementations are synchronous and stateless between calls; a failure to
/// read the container is reported as [`ReadError::Backend`].
pub trait WorkbookReader {
    /// Short name used in log fields and backend errors.
    fn backend_name(&self) -> &'static str;

    fn read(&self, path: &Path) -> Result<WorkbookData, ReadError>;

    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, ReadError> {
        Ok(self.read(path)?.sheet_names())
    }

    fn images(&self, path: &Path) -> Result<Vec<ImageAsset>, ReadError> {
        Ok(self.read(path)?.images)
    }
}

impl<R: WorkbookReader + ?Sized> WorkbookReader for &R {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn read(&self, path: &Path) -> Result<WorkbookData, ReadError> {
        (**self).read(path)
    }

    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, ReadError> {
        (**self).sheet_names(path)
    }

    fn images(&self, path: &Path) -> Result<Vec<ImageAsset>, ReadError> {
        (**self).images(path)
    }
}
