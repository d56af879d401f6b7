pub mod json_loader;

pub use json_loader::{derive_output_path, load_document, save_document};
