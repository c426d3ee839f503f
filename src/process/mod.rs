//! Column harmonization, date normalization and the post-save column filter.

pub mod date_parser;
pub mod filter;
pub mod harmonize;
pub mod utils;

pub use date_parser::{normalize_date, normalize_date_column};
pub use filter::{clean_combined_file, filter_columns, FilterOutcome};
pub use harmonize::{harmonize_configured, harmonize_union, union_columns};
