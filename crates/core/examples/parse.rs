use std::{fs, path::PathBuf};

use clap::Parser;
use import_transformer::parse::{parse, parse_program};

#[derive(Parser, Debug)]
#[command(name = "parse")]
#[command(about = "Parse a JavaScript module and print the CST or the lowered program", long_about = None)]
struct Args {
    /// Path to the source file to parse
    input: PathBuf,

    /// Print the tree in S-expression format instead of the default dump format
    #[arg(long, short, conflicts_with = "program")]
    sexp: bool,

    /// Print the lowered import/export program instead of the CST
    #[arg(long, short)]
    program: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let source = fs::read_to_string(&args.input)?;

    if args.program {
        let program = parse_program(&source)?;
        println!("{program:#?}");
        return Ok(());
    }

    let tree = parse(&source)?;
    let root = tree.root_node();

    if args.sexp {
        println!("{}", root.to_sexp());
    } else {
        dump_tree(&source, root, 0);
    }

    Ok(())
}

fn dump_tree(source: &str, node: tree_sitter::Node<'_>, depth: usize) {
    let indent = "  ".repeat(depth);

    let start = node.start_position();
    let end = node.end_position();

    let text_preview = node
        .utf8_text(source.as_bytes())
        .ok()
        .map(|t| t.replace('\n', "\\n"))
        .unwrap_or_else(|| "<non-utf8>".to_string());

    let field = node
        .parent()
        .and_then(|parent| {
            let mut cursor = parent.walk();
            parent
                .children(&mut cursor)
                .position(|c| c == node)
                .and_then(|i| parent.field_name_for_child(i as u32))
        })
        .map(|name| format!("{name}: "))
        .unwrap_or_default();

    println!(
        "{indent}{field}{kind} [{sb}..{eb}] ({sl}:{sc})..({el}:{ec}) \"{text}\"",
        kind = node.kind(),
        sb = node.start_byte(),
        eb = node.end_byte(),
        sl = start.row,
        sc = start.column,
        el = end.row,
        ec = end.column,
        text = truncate(&text_preview, 120),
    );

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        dump_tree(source, child, depth + 1);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }

    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
