// Mon Jul 27 2026 - Alex

pub mod args;
pub mod commands;

pub use args::{Args, CheckArgs, Command, CompareArgs, DumpArgs, LayoutArgs};
pub use commands::{run_check, run_compare, run_dump, run_layout, EXIT_FINDINGS};
