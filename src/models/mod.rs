pub mod loaders;
pub mod question;
pub mod unit;

pub use loaders::{derive_output_path, load_document, save_document};
pub use question::{Question, QuestionPatch};
pub use unit::{Document, QuestionPath, Unit, UnitPath, Visit};
