use radixpack::{Charset, CharsetNotFoundError, CharsetRegistry, Options, find_closest_charset};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::args::CodecArgs;

/// Parses the `--schema` argument.
///
/// The argument is read as a file when it names one (after tilde
/// expansion), otherwise it is taken as inline JSON.
pub fn load_schema(arg: &str) -> Result<Options, Box<dyn std::error::Error>> {
    let expanded = shellexpand::tilde(arg);
    let path = Path::new(expanded.as_ref());

    let json = if path.is_file() {
        debug!(path = %path.display(), "reading schema file");
        fs::read_to_string(path)
            .map_err(|e| format!("Cannot read schema '{}': {}", path.display(), e))?
    } else {
        arg.to_string()
    };

    Options::from_json(&json).map_err(|e| format!("Invalid schema: {}", e).into())
}

/// Picks the output alphabet: `--symbols`, then `--charset`, then the
/// configured default.
pub fn resolve_charset(
    registry: &CharsetRegistry,
    args: &CodecArgs,
) -> Result<Charset, Box<dyn std::error::Error>> {
    if let Some(symbols) = &args.symbols {
        return Ok(Charset::from_symbols(symbols)?);
    }

    let name = match &args.charset {
        Some(name) => name.clone(),
        None => registry.settings().default_charset,
    };

    let entry = registry.get_charset(&name).ok_or_else(|| {
        let suggestion = find_closest_charset(&name, &registry.names());
        CharsetNotFoundError::new(&name, suggestion)
    })?;

    let charset = entry
        .build()
        .map_err(|e| format!("Invalid charset '{}': {}", name, e))?;
    debug!(charset = %name, size = charset.size(), "resolved charset");
    Ok(charset)
}

/// Reads the whole input from a file or stdin.
pub fn read_input(file: Option<&PathBuf>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}
