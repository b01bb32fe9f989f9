use clap::Args;
use std::path::PathBuf;

/// Schema and alphabet selection shared by `encode` and `decode`
#[derive(Args, Debug)]
pub struct CodecArgs {
    /// Schema as inline JSON or a path to a JSON file
    #[arg(short = 's', long, value_name = "JSON|PATH")]
    pub schema: String,

    /// Registry charset to pack into
    #[arg(short = 'c', long, value_name = "NAME", conflicts_with = "symbols")]
    pub charset: Option<String>,

    /// Literal alphabet, one symbol per character
    #[arg(long, value_name = "STR")]
    pub symbols: Option<String>,

    /// Reject out-of-range values instead of coercing them
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for encoding values
#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub codec: CodecArgs,

    /// JSON input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,
}

/// Arguments for decoding packed text
#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub codec: CodecArgs,

    /// Number of items to read when the schema has no limit
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,

    /// Pretty-print JSON output
    #[arg(short = 'p', long)]
    pub pretty: bool,

    /// Packed input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,
}

/// Arguments for listing charsets
#[derive(Args, Debug)]
pub struct CharsetsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
