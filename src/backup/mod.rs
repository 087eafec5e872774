// backupper/src/backup/mod.rs
mod logic;
pub(crate) mod dump_command;
pub(crate) mod executor;
pub(crate) mod resolver;

pub use logic::run_backup_flow;
