mod error_coverage;
mod history_index;
