pub mod diarize;
pub mod merge;
pub mod validate;
