use std::path::Path;

use dm_dsl::diagnostics::{SourceMap, render_diagnostics};
use dm_dsl::{LoadError, read_source};

pub fn run(file: &Path, json: bool) -> Result<(), String> {
    let (text, parsed) = read_source(file).map_err(|e| e.to_string())?;
    let name = file.display().to_string();

    let tree = match parsed {
        Ok(tree) => tree,
        Err(error) => {
            let diagnostic = LoadError::Syntax {
                file: name.clone(),
                error,
            }
            .to_diagnostic();
            let sources = SourceMap::from([(name, text)]);
            eprint!("{}", render_diagnostics(&sources, &[diagnostic]));
            return Err("parse failed".into());
        }
    };

    if json {
        let out = serde_json::to_string_pretty(&tree).map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        print!("{tree}");
    }
    Ok(())
}
