use std::{fs, path::PathBuf};

use clap::Parser;
use import_transformer::{ImportMap, Loader, Rewriter, Strategy};

#[derive(Parser, Debug)]
#[command(name = "fixtures")]
#[command(about = "Create or validate fixture files", long_about = None)]
struct Args {
    /// Write fixtures instead of validating them
    #[arg(long, short)]
    write: bool,

    /// Path to the fixtures directory (defaults to "./fixtures")
    #[arg(long, default_value = "fixtures")]
    dir: PathBuf,
}

const IMPORT_MAP: &str = "importmap.json";

fn strategies(import_map: &ImportMap) -> [(&'static str, Strategy<'_>); 4] {
    [
        ("import-map", Strategy::ImportMap(Some(import_map))),
        ("dynamic-import", Strategy::Loader(Loader::DynamicImport)),
        ("require", Strategy::Loader(Loader::Require)),
        ("strip", Strategy::Strip),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let import_map_path = args.dir.join(IMPORT_MAP);
    let import_map = if import_map_path.exists() {
        ImportMap::from_json(&fs::read_to_string(&import_map_path)?)
    } else {
        ImportMap::default()
    };

    let mut input_files = Vec::new();
    for entry in fs::read_dir(&args.dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or("invalid filename")?;

        // Skip .out. files and anything that isn't a module
        if filename.contains(".out.") || !filename.ends_with(".js") {
            continue;
        }
        input_files.push(path);
    }

    input_files.sort();

    println!(
        "{} fixtures...",
        if args.write { "Creating" } else { "Validating" }
    );
    let mut mismatches = Vec::new();

    for input_path in &input_files {
        let filename = input_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or("invalid filename")?;
        let basename = filename
            .rsplit_once('.')
            .ok_or("filename missing extension")?
            .0;

        let rewriter = Rewriter::new(fs::read_to_string(input_path)?)?;

        for (mode, strategy) in strategies(&import_map) {
            let out_path = args.dir.join(format!("{basename}.{mode}.out.js"));
            let result = rewriter.rewrite(strategy);

            if args.write {
                match result {
                    Ok(res) => {
                        fs::write(&out_path, &res.code)?;
                        println!("  Created {}", out_path.display());
                    }
                    Err(err) => {
                        if out_path.exists() {
                            fs::remove_file(&out_path)?;
                        }
                        println!("  Skipped {filename} ({mode}): {err}");
                    }
                }
                continue;
            }

            match (result, out_path.exists()) {
                (Ok(res), true) => {
                    if res.code.as_bytes() != fs::read(&out_path)? {
                        mismatches.push(format!("{filename} ({mode}): code mismatch"));
                    }
                }
                (Ok(_), false) => mismatches.push(format!(
                    "{filename} ({mode}): missing output file {}",
                    out_path.display()
                )),
                (Err(err), true) => {
                    mismatches.push(format!("{filename} ({mode}): unexpected error: {err}"))
                }
                (Err(_), false) => {}
            }
        }

        if !args.write && !mismatches.iter().any(|m| m.starts_with(filename)) {
            println!("  ✓ {filename}");
        }
    }

    if !mismatches.is_empty() {
        eprintln!("\nValidation failed:");
        for mismatch in &mismatches {
            eprintln!("  ✗ {mismatch}");
        }
        return Err(format!("{} validation error(s)", mismatches.len()).into());
    }

    println!("\nDone with {} fixtures.", input_files.len());
    Ok(())
}
