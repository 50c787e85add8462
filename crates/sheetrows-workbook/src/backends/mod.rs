#[cfg(feature = "calamine")]
pub mod package;
#[cfg(feature = "calamine")]
pub mod xlsx;

#[cfg(feature = "calamine")]
pub use xlsx::{ReaderConfig, XlsxReader};
