use crate::cli::{
    args::EncodeArgs,
    config::{load_schema, read_input, resolve_charset},
};
use radixpack::{CharsetRegistry, Encoder, Value};
use tracing::debug;

pub fn handle(args: EncodeArgs, registry: &CharsetRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_schema(&args.codec.schema)?;
    let charset = resolve_charset(registry, &args.codec)?;
    let strict = args.codec.strict || registry.settings().strict;

    let input = read_input(args.file.as_ref())?;
    let document: serde_json::Value =
        serde_json::from_str(&input).map_err(|e| format!("Input is not valid JSON: {}", e))?;

    // A top-level array is a sequence of items
    let values: Vec<Value> = match &document {
        serde_json::Value::Array(items) => items.iter().map(Value::from_json).collect(),
        other => vec![Value::from_json(other)],
    };
    debug!(count = values.len(), strict, "encoding values");

    let mut enc = Encoder::new(strict);
    enc.write(&values, &options)?;
    println!("{}", enc.pack(&charset)?);

    Ok(())
}
