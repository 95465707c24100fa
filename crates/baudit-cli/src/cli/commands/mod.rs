//! CLI command handlers, one file per command.

mod audit;
mod checksum;
mod export;
mod plan;
mod records;

pub use audit::run_audit;
pub use checksum::run_checksum;
pub use export::run_export;
pub use plan::run_plan;
pub use records::run_records;
