//! Rewrite strategies.
//!
//! Each strategy is one left-to-right fold over the program body: statements are matched by
//! kind, an [`Edit`] is synthesized from original-source spans, and [`EditPass`] applies it to
//! the partially rewritten string with the running offset. Statements a strategy does not touch
//! contribute no edit and no offset.

use indexmap::IndexSet;
use serde::Serialize;

use crate::{
    RewriteError,
    ast::{ExportDeclaration, ImportDeclaration, Program, Span, Statement},
    classify::{self, ExportShape},
    edit::{Edit, EditPass},
    import_map::ImportMap,
};

/// Block comment delimiters used when stripping.
pub const COMMENT_OPEN: &str = "/* ";
pub const COMMENT_CLOSE: &str = " */";

/// Call that replaces a static import in loader conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    /// `const x = await import("x")`
    DynamicImport,
    /// `const x = require("x")`
    Require,
}

impl Loader {
    pub fn prefix(self) -> &'static str {
        match self {
            Loader::DynamicImport => "await import",
            Loader::Require => "require",
        }
    }
}

/// One of the rewrite modes, for callers that pick the mode at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy<'m> {
    ImportMap(Option<&'m ImportMap>),
    Loader(Loader),
    /// Bookkeeping is dropped; use [`strip`] directly to keep it.
    Strip,
}

impl From<Loader> for Strategy<'_> {
    fn from(loader: Loader) -> Self {
        Strategy::Loader(loader)
    }
}

/// Run `strategy` over `program`.
pub fn rewrite(
    source: &str,
    program: &Program,
    strategy: Strategy<'_>,
) -> Result<Rewritten, RewriteError> {
    match strategy {
        Strategy::ImportMap(import_map) => substitute(source, program, import_map),
        Strategy::Loader(loader) => convert_to_loader(source, program, loader),
        Strategy::Strip => {
            let out = strip(source, program)?;
            Ok(Rewritten {
                code: out.code,
                edits: out.edits,
            })
        }
    }
}

/// Output of a substitution or loader conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub code: String,
    /// Applied edits, in original coordinates (see [`crate::create_sourcemap`]).
    pub edits: Vec<Edit>,
}

/// Output of a stripping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StripOutput {
    pub code: String,
    #[serde(skip)]
    pub edits: Vec<Edit>,
    /// Original text of every stripped import statement.
    pub imports: IndexSet<String>,
    /// Original text of every fully commented export, or the synthesized `export { ... };` for
    /// declarations whose keyword alone was commented.
    pub exports: IndexSet<String>,
    /// Every exported name; `"default"` stands in for a default export.
    pub named_exports: IndexSet<String>,
}

/// Replace the inner text of every mapped import source literal.
///
/// Quotes and everything around the literal stay as written. With no map, the source comes back
/// unchanged.
pub fn substitute(
    source: &str,
    program: &Program,
    import_map: Option<&ImportMap>,
) -> Result<Rewritten, RewriteError> {
    let mut pass = EditPass::new(source);

    if let Some(import_map) = import_map.filter(|m| !m.is_empty()) {
        for decl in program.imports() {
            let Some(mapped) = import_map
                .resolve(&decl.source.value)
                .filter(|m| !m.is_empty())
            else {
                tracing::trace!(specifier = %decl.source.value, "no import map entry");
                continue;
            };
            pass.apply(Edit::builder(decl.source.inner_span()).insert(mapped).build())?;
        }
    }

    let (code, edits) = pass.finish();
    tracing::debug!(edits = edits.len(), "import map substitution done");
    Ok(Rewritten { code, edits })
}

/// Turn every import declaration into `const <bindings> = <loader>(<source>)`.
pub fn convert_to_loader(
    source: &str,
    program: &Program,
    loader: Loader,
) -> Result<Rewritten, RewriteError> {
    let mut pass = EditPass::new(source);

    for decl in program.imports() {
        pass.apply(loader_edit(source, decl, loader)?)?;
    }

    let (code, edits) = pass.finish();
    tracing::debug!(edits = edits.len(), loader = loader.prefix(), "loader conversion done");
    Ok(Rewritten { code, edits })
}

/// The edit covers `import ... "<source>"`; whatever follows the literal (the semicolon) stays.
fn loader_edit(source: &str, decl: &ImportDeclaration, loader: Loader) -> Result<Edit, RewriteError> {
    let span = Span::new(decl.span.start, decl.source.span.end);
    let mut builder = Edit::builder(span);
    if let Some(list) = classify::specifier_list(source, decl)? {
        builder = builder.insert("const ").copy(source, list)?.insert(" = ");
    }
    Ok(builder
        .insert(loader.prefix())
        .insert("(")
        .copy(source, decl.source.span)?
        .insert(")")
        .build())
}

/// Comment out imports and exports, recording what was removed.
pub fn strip(source: &str, program: &Program) -> Result<StripOutput, RewriteError> {
    let mut pass = EditPass::new(source);
    let mut out = StripOutput::default();

    for stmt in &program.body {
        match stmt {
            Statement::Import(decl) => {
                out.imports.insert(statement_text(source, decl.span)?.to_string());
                pass.apply(comment_out(source, decl.span)?)?;
            }
            Statement::Export(decl) => {
                let names = classify::exported_names(decl)?;
                match (classify::export_shape(decl), decl) {
                    (
                        ExportShape::KeywordOnly,
                        ExportDeclaration::Declaration { keyword, .. },
                    ) => {
                        out.exports.insert(format!("export {{ {} }};", names.join(", ")));
                        pass.apply(comment_out_keyword(source, *keyword)?)?;
                    }
                    _ => {
                        out.exports
                            .insert(statement_text(source, decl.span())?.to_string());
                        pass.apply(comment_out(source, decl.span())?)?;
                    }
                }
                out.named_exports.extend(names);
            }
            Statement::Other(span) => {
                tracing::trace!(start = span.start, end = span.end, "statement left as is");
            }
        }
    }

    let (code, edits) = pass.finish();
    out.code = code;
    out.edits = edits;
    tracing::debug!(
        imports = out.imports.len(),
        exports = out.exports.len(),
        named_exports = out.named_exports.len(),
        "stripping done"
    );
    Ok(out)
}

/// True iff the program has at least one import declaration.
pub fn has_imports(program: &Program) -> bool {
    program.imports().next().is_some()
}

fn statement_text(source: &str, span: Span) -> Result<&str, RewriteError> {
    span.text(source).ok_or_else(|| {
        RewriteError::MalformedDeclaration(format!(
            "statement span [{},{}) is outside the source",
            span.start, span.end
        ))
    })
}

/// `<stmt>` -> `/* <stmt> */`.
fn comment_out(source: &str, span: Span) -> Result<Edit, RewriteError> {
    let text = statement_text(source, span)?;
    if text.contains("*/") {
        return Err(RewriteError::MalformedDeclaration(format!(
            "cannot wrap a statement containing `*/` in a block comment: {text}"
        )));
    }
    Ok(Edit::builder(span)
        .insert(COMMENT_OPEN)
        .copy(source, span)?
        .insert(COMMENT_CLOSE)
        .build())
}

/// `export <decl>` -> `/* export */<decl>`; one space after the keyword is absorbed.
fn comment_out_keyword(source: &str, keyword: Span) -> Result<Edit, RewriteError> {
    let text = statement_text(source, keyword)?;
    if text != "export" {
        return Err(RewriteError::MalformedDeclaration(format!(
            "expected the `export` keyword, found: {text}"
        )));
    }
    let end = if source[keyword.end..].starts_with(' ') {
        keyword.end + 1
    } else {
        keyword.end
    };
    Ok(Edit::builder(Span::new(keyword.start, end))
        .insert(COMMENT_OPEN)
        .copy(source, keyword)?
        .insert(COMMENT_CLOSE)
        .build())
}
