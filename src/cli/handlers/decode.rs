use crate::cli::{
    args::DecodeArgs,
    config::{load_schema, read_input, resolve_charset},
};
use radixpack::{CharsetRegistry, Decoder, Value};
use tracing::debug;

pub fn handle(args: DecodeArgs, registry: &CharsetRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_schema(&args.codec.schema)?;
    let charset = resolve_charset(registry, &args.codec)?;
    let strict = args.codec.strict || registry.settings().strict;

    let input = read_input(args.file.as_ref())?;
    // Only the line terminator `encode` prints is dropped, spaces may be symbols
    let text = input
        .strip_suffix('\n')
        .map_or(input.as_str(), |line| line.strip_suffix('\r').unwrap_or(line));
    let mut dec = Decoder::new(text, charset, strict);
    let values = dec.read(&options, args.count)?;
    debug!(count = values.len(), position = dec.position(), "decoded values");
    dec.finish()?;

    // One item without a stored count prints bare, anything else as an array
    let output = if args.count == 1 && options.limit().is_none() && values.len() == 1 {
        values[0].to_json()
    } else {
        serde_json::Value::Array(values.iter().map(Value::to_json).collect())
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", text);

    Ok(())
}
