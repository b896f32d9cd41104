pub mod analyze;
pub mod upload;
