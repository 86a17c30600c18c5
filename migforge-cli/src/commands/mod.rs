pub mod create;
pub mod db;
pub mod list;
pub mod rebuild;

use clap::ValueEnum;

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
