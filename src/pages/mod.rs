pub mod content;
pub mod not_found;
