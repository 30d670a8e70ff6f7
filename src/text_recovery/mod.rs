pub mod json_salvage;
pub mod normalizer;

pub use json_salvage::{extract_object, ExtractError};
pub use normalizer::normalize;
