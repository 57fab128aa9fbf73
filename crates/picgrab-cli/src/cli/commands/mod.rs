//! CLI command handlers, one file per command.

mod checksum;
mod grab;
mod update;

pub use checksum::run_checksum;
pub use grab::{build_options, read_page_list, run_grab_command};
pub use update::run_update;
