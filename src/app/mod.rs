pub mod ports;
pub mod survey_use_case;
