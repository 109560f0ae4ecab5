//! esmify CLI - rewrites CommonJS modules into native ES modules
//!
//! Lets browsers load npm packages and legacy sources without a bundler.

mod commands;
mod logging;

use clap::Parser;
use commands::Commands;
use logging::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "esmify",
    author,
    version,
    about = "Rewrites CommonJS modules into ES modules",
    long_about = "esmify turns require() calls into imports, module.exports into default exports\n\
                  and resolves import specifiers to files, so browsers can load the result\n\
                  without a bundler."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set the log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level, cli.log_json);

    match cli.command {
        Commands::Transform(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}
