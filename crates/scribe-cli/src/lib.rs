pub mod commands;
pub mod error;
pub mod output;

pub use commands::{
    BlocksCommand, ConfigCommand, ExportCommand, InspectCommand, PushCommand, RenderCommand,
};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, truncate_string};
