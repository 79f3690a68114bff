use crate::domain::models::PathOverrides;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "confcache",
    version,
    about = "Precompile application configuration into a single verified cache file"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        env = "CONFCACHE_BASE",
        default_value = ".",
        help = "Application base directory"
    )]
    pub base: PathBuf,
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Increase log verbosity (-v info, -vv debug)"
    )]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, write and verify the configuration cache.
    Cache {
        #[command(flatten)]
        paths: PathArgs,
        #[arg(long, help = "Regex flagging env lookups in application code")]
        pattern: Option<String>,
        #[arg(long, help = "Exit with status 3 when the guard skips the build")]
        strict: bool,
    },
    /// Remove the configuration cache.
    Clear {
        #[arg(long)]
        cache_path: Option<String>,
    },
    /// Run only the env lookup guard and list offending files.
    Scan {
        #[command(flatten)]
        paths: PathArgs,
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Decode and print the current configuration cache.
    Show {
        #[arg(long)]
        cache_path: Option<String>,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct PathArgs {
    #[arg(long, help = "Application source directory scanned by the guard")]
    pub app_dir: Option<String>,
    #[arg(long, help = "Configuration source directory")]
    pub config_dir: Option<String>,
    #[arg(long)]
    pub env_file: Option<String>,
    #[arg(long)]
    pub cache_path: Option<String>,
}

impl From<&PathArgs> for PathOverrides {
    fn from(a: &PathArgs) -> Self {
        PathOverrides {
            app_dir: a.app_dir.clone(),
            config_dir: a.config_dir.clone(),
            env_file: a.env_file.clone(),
            cache_path: a.cache_path.clone(),
        }
    }
}
