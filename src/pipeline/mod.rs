// Survey processing pipeline: cleaning, scoring, and grouping

pub mod processing;
