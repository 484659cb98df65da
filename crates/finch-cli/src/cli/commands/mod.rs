//! CLI command handlers. Each command is in its own file.

mod cancel;
mod context;
mod record;
mod reset_stamp;
mod retrieve;
mod run;
mod schedule;
mod status;

pub use cancel::run_cancel;
pub use context::Context;
pub use record::run_record;
pub use reset_stamp::run_reset_stamp;
pub use retrieve::run_retrieve;
pub use run::run_jobs;
pub use schedule::run_schedule;
pub use status::run_status;
