//! Pipeline counters recorded through the `metrics` facade.
//!
//! The binary installs no recorder, so these are no-ops unless an embedding
//! application installs one.

pub mod clean {
    pub fn columns_dropped(count: usize) {
        ::metrics::counter!("survey_clean_columns_dropped_total").increment(count as u64);
    }

    pub fn fields_resolved(count: usize) {
        ::metrics::counter!("survey_clean_fields_resolved_total").increment(count as u64);
    }

    pub fn coercion_warning(field: &str) {
        ::metrics::counter!("survey_clean_coercion_warnings_total", "field" => field.to_string())
            .increment(1);
    }

    pub fn respondents_processed(count: usize) {
        ::metrics::counter!("survey_respondents_processed_total", "stage" => "clean")
            .increment(count as u64);
    }
}

pub mod indices {
    pub fn coercion_warning(field: &str) {
        ::metrics::counter!("survey_indices_coercion_warnings_total", "field" => field.to_string())
            .increment(1);
    }

    pub fn index_absent(index: &str, count: usize) {
        ::metrics::counter!("survey_indices_absent_total", "index" => index.to_string())
            .increment(count as u64);
    }

    pub fn respondents_scored(count: usize) {
        ::metrics::counter!("survey_respondents_processed_total", "stage" => "indices")
            .increment(count as u64);
    }
}

pub mod classify {
    pub fn fallback_applied(classifier: &str) {
        ::metrics::counter!("survey_classify_fallbacks_total", "classifier" => classifier.to_string())
            .increment(1);
    }

    pub fn respondents_classified(count: usize) {
        ::metrics::counter!("survey_respondents_processed_total", "stage" => "classify")
            .increment(count as u64);
    }
}

pub mod run {
    pub fn duration(seconds: f64) {
        ::metrics::histogram!("survey_run_duration_seconds").record(seconds);
    }

    pub fn warnings(kind: &'static str, count: usize) {
        ::metrics::counter!("survey_run_warnings_total", "kind" => kind).increment(count as u64);
    }
}
