//! CLI subcommand implementations.

pub mod days;
pub mod history;
pub mod import;
pub mod move_entry;
pub mod normalize;
pub mod parse_time;
pub mod reorder;
pub mod set_start;
pub mod show;
pub mod util;
