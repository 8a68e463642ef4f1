//! Input validation rules shared by every engine operation.

pub mod validation;

pub use validation::{
    validate_change_description, validate_dataset_name, validate_metadata, validate_page,
    validate_tag_name, validate_user_tag,
};
