//! tree-sitter parsing and lowering into [`Program`].
//!
//! The JavaScript grammar is loaded once per thread. Lowering walks only the top-level children
//! of `program`; nested statements are never rewritten. All offsets are byte offsets
//! (tree-sitter's model).

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

use crate::{
    RewriteError,
    alloc::ensure_tree_sitter_allocator,
    ast::{
        Binding, Declaration, ExportDeclaration, ExportSpecifier, Identifier, ImportClause,
        ImportDeclaration, ImportSpecifier, NamedImports, PatternProperty, Program, Span,
        Statement, StringLiteral, VariableDeclarator,
    },
};

thread_local! {
    /// Shared Tree-sitter parser instance. We reuse it to avoid reloading the language for each call.
    static JS_PARSER: RefCell<Parser> = {
        ensure_tree_sitter_allocator();

        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_javascript::LANGUAGE.into();
        parser
            .set_language(&language)
            .expect("tree-sitter-javascript language load failed");
        RefCell::new(parser)
    };
}

/// Parse JavaScript module source.
pub fn parse(source: &str) -> Result<Tree, RewriteError> {
    ensure_tree_sitter_allocator();

    JS_PARSER
        .with(|p| {
            let mut parser = p.borrow_mut();
            parser.parse(source, None)
        })
        .ok_or(RewriteError::ParseFailed)
}

/// Parse `source` and lower it into a [`Program`].
pub fn parse_program(source: &str) -> Result<Program, RewriteError> {
    let tree = parse(source)?;
    Program::from_tree(source, &tree)
}

impl Program {
    /// Lower a tree produced by the JavaScript grammar for `source`.
    ///
    /// Fails with [`RewriteError::Syntax`] if the tree contains error recovery nodes.
    pub fn from_tree(source: &str, tree: &Tree) -> Result<Program, RewriteError> {
        let root = tree.root_node();
        if root.has_error() {
            let offset = first_error(root).map_or(root.start_byte(), |n| n.start_byte());
            return Err(RewriteError::Syntax { offset });
        }

        let mut body = Vec::new();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            let stmt = match child.kind() {
                "comment" | "hash_bang_line" => continue,
                "import_statement" => Statement::Import(lower_import(source, child)?),
                "export_statement" => Statement::Export(lower_export(source, child)?),
                _ => Statement::Other(span_of(child)),
            };
            body.push(stmt);
        }
        Ok(Program { body })
    }
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error()
            && let Some(found) = first_error(child)
        {
            return Some(found);
        }
    }
    None
}

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

/// Node text; empty if the tree does not belong to `source`.
fn text_of<'s>(source: &'s str, node: Node<'_>) -> &'s str {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or_default()
}

fn malformed(what: &str, source: &str, node: Node<'_>) -> RewriteError {
    RewriteError::MalformedDeclaration(format!("{what}: {}", text_of(source, node)))
}

fn lower_string(source: &str, node: Node<'_>) -> StringLiteral {
    let span = span_of(node);
    let raw = text_of(source, node);
    let value = if raw.len() >= 2 {
        raw[1..raw.len() - 1].to_string()
    } else {
        String::new()
    };
    StringLiteral { span, value }
}

/// `identifier` or `string` in an export/import name position; strings are unquoted.
fn module_export_name(source: &str, node: Node<'_>) -> String {
    if node.kind() == "string" {
        lower_string(source, node).value
    } else {
        text_of(source, node).to_string()
    }
}

fn lower_import(source: &str, node: Node<'_>) -> Result<ImportDeclaration, RewriteError> {
    let source_node = node
        .child_by_field_name("source")
        .ok_or_else(|| malformed("import without a module source", source, node))?;

    let mut clause = None;
    let mut has_attributes = false;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_clause" => clause = Some(lower_import_clause(source, child)?),
            "import_attribute" => has_attributes = true,
            _ => {}
        }
    }

    Ok(ImportDeclaration {
        span: span_of(node),
        clause,
        source: lower_string(source, source_node),
        has_attributes,
    })
}

fn lower_import_clause(source: &str, node: Node<'_>) -> Result<ImportClause, RewriteError> {
    let mut clause = ImportClause {
        span: span_of(node),
        default: None,
        namespace: None,
        named: None,
    };

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                clause.default = Some(Identifier {
                    span: span_of(child),
                    name: text_of(source, child).to_string(),
                });
            }
            "namespace_import" => {
                let mut inner = child.walk();
                let ident = child
                    .named_children(&mut inner)
                    .find(|n| n.kind() == "identifier")
                    .ok_or_else(|| malformed("namespace import without a name", source, child))?;
                clause.namespace = Some(Identifier {
                    span: span_of(ident),
                    name: text_of(source, ident).to_string(),
                });
            }
            "named_imports" => {
                let mut inner = child.walk();
                let specifiers = child
                    .named_children(&mut inner)
                    .filter(|n| n.kind() == "import_specifier")
                    .map(|spec| lower_import_specifier(source, spec))
                    .collect::<Result<Vec<_>, _>>()?;
                clause.named = Some(NamedImports {
                    span: span_of(child),
                    specifiers,
                });
            }
            _ => {}
        }
    }

    Ok(clause)
}

fn lower_import_specifier(source: &str, node: Node<'_>) -> Result<ImportSpecifier, RewriteError> {
    let name = node
        .child_by_field_name("name")
        .ok_or_else(|| malformed("import specifier without a name", source, node))?;
    Ok(ImportSpecifier {
        span: span_of(node),
        name: module_export_name(source, name),
        alias: node
            .child_by_field_name("alias")
            .map(|alias| text_of(source, alias).to_string()),
    })
}

fn lower_export(source: &str, node: Node<'_>) -> Result<ExportDeclaration, RewriteError> {
    let span = span_of(node);

    let mut keyword = None;
    let mut is_default = false;
    let mut is_star = false;
    let mut clause = None;
    let mut namespace = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "export" => keyword = Some(span_of(child)),
            "default" => is_default = true,
            "*" => is_star = true,
            "export_clause" => clause = Some(child),
            "namespace_export" => namespace = Some(child),
            _ => {}
        }
    }

    if is_default {
        return Ok(ExportDeclaration::Default { span });
    }

    if let Some(declaration) = node.child_by_field_name("declaration") {
        let keyword =
            keyword.ok_or_else(|| malformed("export without an `export` keyword", source, node))?;
        return Ok(ExportDeclaration::Declaration {
            span,
            keyword,
            declaration: lower_declaration(source, declaration),
        });
    }

    let source_literal = node
        .child_by_field_name("source")
        .map(|s| lower_string(source, s));

    if let Some(clause) = clause {
        let mut inner = clause.walk();
        let specifiers = clause
            .named_children(&mut inner)
            .filter(|n| n.kind() == "export_specifier")
            .map(|spec| lower_export_specifier(source, spec))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ExportDeclaration::Named {
            span,
            specifiers,
            source: source_literal,
        });
    }

    if namespace.is_some() || is_star {
        let source_literal = source_literal
            .ok_or_else(|| malformed("star export without a module source", source, node))?;
        let exported = match namespace {
            Some(ns) => {
                let mut inner = ns.walk();
                let name = ns
                    .named_children(&mut inner)
                    .find(|n| matches!(n.kind(), "identifier" | "string"))
                    .ok_or_else(|| malformed("namespace export without a name", source, ns))?;
                Some(module_export_name(source, name))
            }
            None => None,
        };
        return Ok(ExportDeclaration::All {
            span,
            exported,
            source: source_literal,
        });
    }

    Err(malformed("unrecognized export statement", source, node))
}

fn lower_export_specifier(source: &str, node: Node<'_>) -> Result<ExportSpecifier, RewriteError> {
    let name = node
        .child_by_field_name("name")
        .ok_or_else(|| malformed("export specifier without a name", source, node))?;
    Ok(ExportSpecifier {
        span: span_of(node),
        name: module_export_name(source, name),
        alias: node
            .child_by_field_name("alias")
            .map(|alias| module_export_name(source, alias)),
    })
}

fn lower_declaration(source: &str, node: Node<'_>) -> Declaration {
    let name_of = |node: Node<'_>| {
        node.child_by_field_name("name")
            .map(|name| text_of(source, name).to_string())
    };

    match node.kind() {
        "function_declaration" | "generator_function_declaration" => match name_of(node) {
            Some(name) => Declaration::Function { name },
            None => Declaration::Unsupported {
                kind: node.kind().to_string(),
            },
        },
        "class_declaration" => match name_of(node) {
            Some(name) => Declaration::Class { name },
            None => Declaration::Unsupported {
                kind: node.kind().to_string(),
            },
        },
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = node.walk();
            let declarators = node
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "variable_declarator")
                .map(|decl| VariableDeclarator {
                    span: span_of(decl),
                    binding: lower_binding(source, decl.child_by_field_name("name")),
                })
                .collect();
            Declaration::Variable { declarators }
        }
        other => Declaration::Unsupported {
            kind: other.to_string(),
        },
    }
}

fn lower_binding(source: &str, target: Option<Node<'_>>) -> Binding {
    let Some(target) = target else {
        return Binding::Unsupported {
            kind: "missing".to_string(),
        };
    };

    match target.kind() {
        "identifier" => Binding::Identifier(text_of(source, target).to_string()),
        "object_pattern" => {
            let mut cursor = target.walk();
            let properties = target
                .named_children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .map(|prop| lower_pattern_property(source, prop))
                .collect();
            Binding::Object(properties)
        }
        other => Binding::Unsupported {
            kind: other.to_string(),
        },
    }
}

/// `{ ... }`, `[ ... ]`, or either with a default (`{ ... } = init`).
fn is_nested_pattern(node: Node<'_>) -> bool {
    match node.kind() {
        "object_pattern" | "array_pattern" => true,
        "assignment_pattern" => node
            .child_by_field_name("left")
            .is_some_and(|left| matches!(left.kind(), "object_pattern" | "array_pattern")),
        _ => false,
    }
}

fn lower_pattern_property(source: &str, node: Node<'_>) -> PatternProperty {
    let key_of = |key: Node<'_>| match key.kind() {
        "property_identifier" | "shorthand_property_identifier_pattern" | "number" => {
            PatternProperty::Key(text_of(source, key).to_string())
        }
        "string" => PatternProperty::Key(lower_string(source, key).value),
        _ => PatternProperty::Computed,
    };

    match node.kind() {
        "shorthand_property_identifier_pattern" => {
            PatternProperty::Key(text_of(source, node).to_string())
        }
        "pair_pattern" => {
            if node.child_by_field_name("value").is_some_and(is_nested_pattern) {
                return PatternProperty::Nested;
            }
            node.child_by_field_name("key")
                .map_or(PatternProperty::Computed, key_of)
        }
        "object_assignment_pattern" => match node.child_by_field_name("left") {
            Some(left) if is_nested_pattern(left) => PatternProperty::Nested,
            Some(left) => key_of(left),
            None => PatternProperty::Computed,
        },
        "rest_pattern" => {
            let mut cursor = node.walk();
            let ident = node
                .named_children(&mut cursor)
                .find(|n| n.kind() == "identifier");
            match ident {
                Some(ident) => PatternProperty::Rest(text_of(source, ident).to_string()),
                None => PatternProperty::Computed,
            }
        }
        _ => PatternProperty::Computed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(src: &str) -> Program {
        parse_program(src).unwrap()
    }

    fn only_import(src: &str) -> ImportDeclaration {
        match program(src).body.into_iter().next() {
            Some(Statement::Import(decl)) => decl,
            other => panic!("expected import, got {other:?}"),
        }
    }

    fn only_export(src: &str) -> ExportDeclaration {
        match program(src).body.into_iter().next() {
            Some(Statement::Export(decl)) => decl,
            other => panic!("expected export, got {other:?}"),
        }
    }

    /// Import spans include the trailing semicolon; the source literal keeps its quotes.
    #[test]
    fn lowers_named_import() {
        let src = r#"import {html, css, LitElement} from "lit";"#;
        let decl = only_import(src);
        assert_eq!(decl.span, Span::new(0, src.len()));
        assert_eq!(decl.source.value, "lit");
        assert_eq!(decl.source.span.text(src), Some(r#""lit""#));
        assert_eq!(decl.source.inner_span().text(src), Some("lit"));

        let clause = decl.clause.unwrap();
        assert!(clause.default.is_none());
        assert!(clause.namespace.is_none());
        let named = clause.named.unwrap();
        assert_eq!(named.span.text(src), Some("{html, css, LitElement}"));
        let names: Vec<_> = named.specifiers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["html", "css", "LitElement"]);
    }

    #[test]
    fn lowers_default_and_namespace_imports() {
        let decl = only_import(r#"import noop from "@zachleat/noop";"#);
        assert_eq!(decl.clause.unwrap().default.unwrap().name, "noop");

        let src = r#"import * as name from 'my-module.js';"#;
        let decl = only_import(src);
        let ns = decl.clause.unwrap().namespace.unwrap();
        assert_eq!(ns.name, "name");
        assert_eq!(ns.span.text(src), Some("name"));
        assert_eq!(decl.source.span.text(src), Some("'my-module.js'"));
    }

    #[test]
    fn lowers_side_effect_import() {
        let decl = only_import(r#"import "./polyfill.js";"#);
        assert!(decl.clause.is_none());
        assert_eq!(decl.source.value, "./polyfill.js");
    }

    #[test]
    fn lowers_aliased_import_specifier() {
        let decl = only_import(r#"import { a as b } from "x";"#);
        let spec = &decl.clause.unwrap().named.unwrap().specifiers[0];
        assert_eq!(spec.name, "a");
        assert_eq!(spec.alias.as_deref(), Some("b"));
    }

    #[test]
    fn lowers_export_declarations() {
        match only_export("export function testing() {}") {
            ExportDeclaration::Declaration {
                keyword,
                declaration,
                ..
            } => {
                assert_eq!(keyword, Span::new(0, 6));
                assert_eq!(
                    declaration,
                    Declaration::Function {
                        name: "testing".to_string()
                    }
                );
            }
            other => panic!("unexpected {other:?}"),
        }

        match only_export("export const { name1, name2: bar, ...rest } = o;") {
            ExportDeclaration::Declaration { declaration, .. } => {
                let Declaration::Variable { declarators } = declaration else {
                    panic!("expected variable declaration");
                };
                assert_eq!(
                    declarators[0].binding,
                    Binding::Object(vec![
                        PatternProperty::Key("name1".to_string()),
                        PatternProperty::Key("name2".to_string()),
                        PatternProperty::Rest("rest".to_string()),
                    ])
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lowers_nested_patterns_as_nested() {
        let binding = |src: &str| match only_export(src) {
            ExportDeclaration::Declaration {
                declaration: Declaration::Variable { mut declarators },
                ..
            } => declarators.remove(0).binding,
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(
            binding("export const { a: { b }, c } = o;"),
            Binding::Object(vec![
                PatternProperty::Nested,
                PatternProperty::Key("c".to_string()),
            ])
        );
        assert_eq!(
            binding("export const { a: [b] = [], d = 1 } = o;"),
            Binding::Object(vec![
                PatternProperty::Nested,
                PatternProperty::Key("d".to_string()),
            ])
        );
    }

    #[test]
    fn lowers_export_clauses() {
        match only_export(r#"export { default as name, b } from "mod";"#) {
            ExportDeclaration::Named {
                specifiers, source, ..
            } => {
                let names: Vec<_> = specifiers.iter().map(|s| s.exported_name()).collect();
                assert_eq!(names, ["name", "b"]);
                assert_eq!(source.unwrap().value, "mod");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            only_export("export default 42;"),
            ExportDeclaration::Default { .. }
        ));
        assert!(matches!(
            only_export(r#"export * from "x";"#),
            ExportDeclaration::All { exported: None, .. }
        ));
        match only_export(r#"export * as ns from "x";"#) {
            ExportDeclaration::All { exported, .. } => assert_eq!(exported.as_deref(), Some("ns")),
            other => panic!("unexpected {other:?}"),
        }
    }

    /// Comments are extras, not statements.
    #[test]
    fn skips_comments() {
        let p = program("// lead\nimport a from \"a\";\n/* mid */\nfoo();\n");
        assert_eq!(p.body.len(), 2);
        assert!(matches!(p.body[0], Statement::Import(_)));
        assert!(matches!(p.body[1], Statement::Other(_)));
    }

    #[test]
    fn rejects_syntax_errors() {
        assert!(matches!(
            parse_program("import { from"),
            Err(RewriteError::Syntax { .. })
        ));
    }
}
