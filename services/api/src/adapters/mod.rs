pub mod clipboard;
pub mod dataset_http;
pub mod file_store;

pub use clipboard::SystemClipboard;
pub use dataset_http::HttpDatasetAdapter;
pub use file_store::FileStore;
