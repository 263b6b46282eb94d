pub mod error_handling;
pub mod http_page_source;
pub mod kol_page_source;
pub mod page_loader;
pub mod page_source;
pub mod virtual_table;

pub use error_handling::{ErrorReporter, LoaderError, ToastReporter, TracingErrorReporter};
pub use http_page_source::HttpPageSource;
pub use kol_page_source::KolPageSource;
pub use page_loader::{LoadOutcome, LoaderSnapshot, PageLoader, SkipReason};
pub use page_source::{FnPageSource, PageSource, VecPageSource};
pub use virtual_table::{RowView, VirtualTable};
