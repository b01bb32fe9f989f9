use crate::cli::args::CharsetsArgs;
use radixpack::CharsetRegistry;

const PREVIEW_LEN: usize = 20;

pub fn handle(args: CharsetsArgs, registry: &CharsetRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let default_name = registry.settings().default_charset;
    let mut listing = Vec::new();

    for name in registry.names() {
        let Some(entry) = registry.get_charset(&name) else {
            continue;
        };
        // Broken user entries are listed rather than aborting the whole listing
        let (size, preview) = match entry.build() {
            Ok(charset) => {
                let suffix = if charset.size() > PREVIEW_LEN as u64 { "..." } else { "" };
                (Some(charset.size()), format!("{}{}", charset.preview(PREVIEW_LEN), suffix))
            }
            Err(e) => (None, format!("(invalid: {})", e)),
        };
        listing.push((name, size, preview, entry.description.clone()));
    }

    if args.json {
        let items: Vec<serde_json::Value> = listing
            .into_iter()
            .map(|(name, size, preview, description)| {
                let is_default = name == default_name;
                serde_json::json!({
                    "name": name,
                    "size": size,
                    "preview": preview,
                    "description": description,
                    "default": is_default,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!("Available charsets:\n");
    for (name, size, preview, description) in listing {
        let marker = if name == default_name { "*" } else { " " };
        let size = size.map_or_else(|| "?".to_string(), |s| s.to_string());
        println!("{} {:<15} base-{:<5} {}", marker, name, size, preview);
        if let Some(description) = description {
            println!("  {:<15} {}", "", description);
        }
    }

    Ok(())
}
