//! CLI command implementations

pub mod init;
pub mod transform;

pub use init::InitArgs;
pub use transform::TransformArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite a CommonJS file, or a directory of them, into ES modules
    Transform(TransformArgs),

    /// Create an esmify.toml configuration in the current directory
    Init(InitArgs),
}
