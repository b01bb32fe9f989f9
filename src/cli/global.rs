use clap::Args;

/// Global arguments that apply to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "radixpack=trace")
    #[arg(long, global = true, default_value = "warn", value_name = "LEVEL")]
    pub log_level: String,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}
