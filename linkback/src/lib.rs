pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    OutputFormat, build_config, collect_requests, load_targets_from_file, parse_url_line,
    render_outcome, report_json,
};
