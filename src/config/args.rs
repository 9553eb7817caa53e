//! Command-line arguments

use clap::Parser;

use super::DEFAULT_CONFIG_PATH;

/// Anonymous URL shortener service
#[derive(Parser, Debug)]
#[command(name = "urlshortener")]
#[command(version)]
#[command(about = "An anonymous URL shortener service", long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Skip loading a `.env` file from the working directory
    #[arg(long)]
    pub no_dotenv: bool,
}
