mod args;
mod config;
mod global;
mod handlers;
mod logging;

use clap::{Parser, Subcommand};
use radixpack::CharsetRegistry;

use args::{CharsetsArgs, DecodeArgs, EncodeArgs};
use global::GlobalArgs;

#[derive(Parser)]
#[command(name = "radixpack")]
#[command(version)]
#[command(about = "Pack typed values into compact text over any alphabet", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode JSON values with a schema into packed text
    Encode(EncodeArgs),

    /// Decode packed text back into JSON values
    Decode(DecodeArgs),

    /// List available charsets
    Charsets(CharsetsArgs),
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.global.log_level, cli.global.log_json);

    // Load charsets with user overrides
    let registry = CharsetRegistry::load_with_overrides()?;

    match cli.command {
        Commands::Encode(args) => handlers::encode::handle(args, &registry),
        Commands::Decode(args) => handlers::decode::handle(args, &registry),
        Commands::Charsets(args) => handlers::charsets::handle(args, &registry),
    }
}
