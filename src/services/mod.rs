pub mod question_validator;
pub mod repair_service;
pub mod structure_checker;

pub use question_validator::{FailureDetail, QuestionValidator, Validation};
pub use repair_service::RepairService;
pub use structure_checker::missing_fields;
