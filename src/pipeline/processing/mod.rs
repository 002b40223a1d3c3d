// Pipeline stages in run order, plus the descriptive reports

pub mod clean;
pub mod indices;
pub mod classify;
pub mod summary;
