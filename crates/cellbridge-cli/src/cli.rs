use crate::script::UnitNaming;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cellbridge",
    about = "Run a cell script through the execution context bridge",
    version
)]
pub struct Cli {
    /// YAML cell script to run.
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Bridge configuration file.
    #[arg(short = 'c', long, env = "CELLBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, overriding the configured level (e.g. `debug`, `cellbridge_render=trace`).
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Give cells without an `id` a random UUID instead of their position.
    #[arg(long = "generate-ids")]
    pub generate_ids: bool,
}

impl Cli {
    pub fn unit_naming(&self) -> UnitNaming {
        if self.generate_ids {
            UnitNaming::Generated
        } else {
            UnitNaming::Positional
        }
    }
}
