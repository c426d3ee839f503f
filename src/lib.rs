//! Acquisition and harmonization of the EuroMillions draw-history CSV files.

pub mod archive;
pub mod config;
pub mod csv_io;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod save;
pub mod source;
pub mod table;

pub use config::{AcquireConfig, CsvFormat, HarmonizeConfig};
pub use save::SaveOutcome;
pub use table::{Table, Value};
