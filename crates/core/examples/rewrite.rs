use std::{fs, path::PathBuf};

use clap::Parser;
use import_transformer::{ImportMap, Loader, Rewriter, Rewritten};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Replace import sources found in --import-map
    ImportMap,
    /// `import x from "m"` -> `const x = await import("m")`
    DynamicImport,
    /// `import x from "m"` -> `const x = require("m")`
    Require,
    /// Comment out imports and exports
    Strip,
    /// Print whether the module has any import declaration
    HasImports,
}

#[derive(Parser, Debug)]
#[command(name = "rewrite")]
#[command(about = "Rewrite the import/export declarations of a JavaScript module", long_about = None)]
struct Args {
    /// Path to the source file to transform
    input: PathBuf,

    /// Rewrite mode
    #[arg(long, short, value_enum, default_value_t = Mode::ImportMap)]
    mode: Mode,

    /// Import map JSON file (`{ "imports": { ... } }`), used by --mode import-map
    #[arg(long)]
    import_map: Option<PathBuf>,

    /// Output path for transformed source (defaults to stdout)
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Output path for the sourcemap (defaults to <out>.map if --out is provided)
    #[arg(long)]
    out_sourcemap: Option<PathBuf>,

    /// Write the stripped imports/exports as JSON to this path (--mode strip only)
    #[arg(long)]
    out_bookkeeping: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = fs::read_to_string(&args.input)?;
    let rewriter = Rewriter::new(source)?;

    let rewritten = match args.mode {
        Mode::HasImports => {
            println!("{}", rewriter.has_imports());
            return Ok(());
        }
        Mode::ImportMap => {
            let import_map = args
                .import_map
                .as_ref()
                .map(fs::read_to_string)
                .transpose()?
                .map(|json| ImportMap::from_json(&json));
            rewriter.transform_with_import_map(import_map.as_ref())?
        }
        Mode::DynamicImport => rewriter.rewrite(Loader::DynamicImport.into())?,
        Mode::Require => rewriter.rewrite(Loader::Require.into())?,
        Mode::Strip => {
            let out = rewriter.strip_imports_and_exports()?;
            if let Some(path) = &args.out_bookkeeping {
                fs::write(path, serde_json::to_string_pretty(&out)?)?;
            }
            Rewritten {
                code: out.code,
                edits: out.edits,
            }
        }
    };

    let out_map_path = args.out_sourcemap.clone().or_else(|| {
        args.out
            .as_ref()
            .map(|out| PathBuf::from(format!("{}.map", out.display())))
    });

    if let Some(out_map_path) = out_map_path {
        let filename = args
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or("input file must have a valid filename")?;
        fs::write(out_map_path, rewriter.create_sourcemap(&rewritten, filename)?)?;
    }

    match &args.out {
        None => {
            print!("{}", rewritten.code);
        }
        Some(out) => {
            fs::write(out, rewritten.code)?;
        }
    }

    Ok(())
}
