// Statement text processing: comment stripping, placeholder scanning,
// script splitting, and compilation into the cacheable artifact

pub mod comment_stripper;
pub mod compiler;
pub mod param_scanner;
pub mod script_splitter;

pub use comment_stripper::strip_sql_comments;
pub use compiler::compile_statement;
pub use param_scanner::{ScanOutcome, scan_parameters};
pub use script_splitter::split_script;
