//! Declaration shape analysis.
//!
//! Strategies never look at tree-sitter nodes; they ask this module what shape an import or
//! export has, which span holds its specifier list, and which names it introduces. Anything the
//! strategies cannot rewrite faithfully is rejected here with
//! [`RewriteError::MalformedDeclaration`].

use crate::{
    RewriteError,
    ast::{Binding, Declaration, ExportDeclaration, ImportDeclaration, PatternProperty, Span},
};

/// Binding shape of an import clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportShape {
    /// `import "x"`
    SideEffect,
    /// `import a from "x"`
    Default,
    /// `import * as a from "x"`
    Namespace,
    /// `import { a, b } from "x"`
    Named,
    /// `import a, { b } from "x"`
    DefaultAndNamed,
    /// `import a, * as b from "x"`
    DefaultAndNamespace,
}

pub fn import_shape(decl: &ImportDeclaration) -> ImportShape {
    let Some(clause) = &decl.clause else {
        return ImportShape::SideEffect;
    };
    match (&clause.default, &clause.namespace, &clause.named) {
        (Some(_), Some(_), _) => ImportShape::DefaultAndNamespace,
        (Some(_), None, Some(_)) => ImportShape::DefaultAndNamed,
        (Some(_), None, None) => ImportShape::Default,
        (None, Some(_), _) => ImportShape::Namespace,
        (None, None, _) => ImportShape::Named,
    }
}

/// How an export is neutralized when stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportShape {
    /// `export const|let|var|function|class ...`: only the keyword goes, the declaration stays.
    KeywordOnly,
    /// `export { ... }`, `export * ...`, `export default ...`: the statement goes entirely.
    WholeStatement,
}

pub fn export_shape(decl: &ExportDeclaration) -> ExportShape {
    match decl {
        ExportDeclaration::Declaration { .. } => ExportShape::KeywordOnly,
        ExportDeclaration::Named { .. }
        | ExportDeclaration::All { .. }
        | ExportDeclaration::Default { .. } => ExportShape::WholeStatement,
    }
}

/// Span of the binding text a loader conversion turns into a `const` target.
///
/// - `import a from "x"` -> `a`
/// - `import * as a from "x"` -> `a`
/// - `import { a, b } from "x"` -> `{ a, b }`
/// - `import "x"` -> `None`
///
/// Combined clauses, aliased specifiers and import attributes have no faithful single-binding
/// form and are rejected.
pub fn specifier_list(source: &str, decl: &ImportDeclaration) -> Result<Option<Span>, RewriteError> {
    let text = decl.span.text(source).ok_or_else(|| {
        RewriteError::MalformedDeclaration(format!(
            "import span [{},{}) is outside the source",
            decl.span.start, decl.span.end
        ))
    })?;
    let Some(after_keyword) = text.strip_prefix("import").filter(|rest| {
        rest.starts_with(|c: char| c.is_whitespace() || matches!(c, '{' | '*' | '"' | '\''))
    }) else {
        return Err(RewriteError::MalformedDeclaration(format!(
            "could not find `import` in import declaration: {text}"
        )));
    };
    // Default and named lists start right after `import `, so comments before the binding stay.
    let list_start =
        decl.span.start + "import".len() + usize::from(after_keyword.starts_with(' '));

    if decl.has_attributes {
        return Err(RewriteError::MalformedDeclaration(format!(
            "import attributes cannot be carried into a loader call: {text}"
        )));
    }

    let clause = decl.clause.as_ref();
    match import_shape(decl) {
        ImportShape::SideEffect => Ok(None),
        ImportShape::Default => Ok(clause
            .and_then(|c| c.default.as_ref())
            .map(|id| Span::new(list_start, id.span.end))),
        ImportShape::Namespace => Ok(clause.and_then(|c| c.namespace.as_ref()).map(|id| id.span)),
        ImportShape::Named => {
            let Some(named) = clause.and_then(|c| c.named.as_ref()) else {
                return Ok(None);
            };
            if named.specifiers.iter().any(|s| s.alias.is_some()) {
                return Err(RewriteError::MalformedDeclaration(format!(
                    "aliased import specifiers are not supported: {text}"
                )));
            }
            Ok(Some(Span::new(list_start, named.span.end)))
        }
        ImportShape::DefaultAndNamed | ImportShape::DefaultAndNamespace => {
            Err(RewriteError::MalformedDeclaration(format!(
                "combined default and named/namespace imports are not supported: {text}"
            )))
        }
    }
}

/// Names introduced by an exported declaration, in declaration order.
pub fn declared_names(declaration: &Declaration) -> Result<Vec<String>, RewriteError> {
    let names = match declaration {
        Declaration::Function { name } | Declaration::Class { name } => vec![name.clone()],
        Declaration::Variable { declarators } => {
            let mut names = Vec::new();
            for declarator in declarators {
                match &declarator.binding {
                    Binding::Identifier(name) => names.push(name.clone()),
                    Binding::Object(properties) => {
                        for property in properties {
                            match property {
                                PatternProperty::Key(name) | PatternProperty::Rest(name) => {
                                    names.push(name.clone())
                                }
                                PatternProperty::Computed => {
                                    return Err(RewriteError::MalformedDeclaration(
                                        "computed keys in an exported destructuring pattern"
                                            .to_string(),
                                    ));
                                }
                                PatternProperty::Nested => {
                                    return Err(RewriteError::MalformedDeclaration(
                                        "nested destructuring in an exported declaration"
                                            .to_string(),
                                    ));
                                }
                            }
                        }
                    }
                    Binding::Unsupported { kind } => {
                        return Err(RewriteError::MalformedDeclaration(format!(
                            "unsupported binding target in exported declaration: {kind}"
                        )));
                    }
                }
            }
            names
        }
        Declaration::Unsupported { kind } => {
            return Err(RewriteError::MalformedDeclaration(format!(
                "unsupported exported declaration: {kind}"
            )));
        }
    };

    if names.is_empty() {
        return Err(RewriteError::MalformedDeclaration(
            "exported declaration introduces no names".to_string(),
        ));
    }
    Ok(names)
}

/// Names an export statement makes visible to importers. `export default` is `"default"`.
pub fn exported_names(decl: &ExportDeclaration) -> Result<Vec<String>, RewriteError> {
    match decl {
        ExportDeclaration::Declaration { declaration, .. } => declared_names(declaration),
        ExportDeclaration::Named { specifiers, .. } => Ok(specifiers
            .iter()
            .map(|s| s.exported_name().to_string())
            .collect()),
        ExportDeclaration::All { exported, .. } => Ok(exported.iter().cloned().collect()),
        ExportDeclaration::Default { .. } => Ok(vec!["default".to_string()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast::Statement, parse::parse_program};

    fn import(src: &str) -> ImportDeclaration {
        match parse_program(src).unwrap().body.remove(0) {
            Statement::Import(decl) => decl,
            other => panic!("expected import, got {other:?}"),
        }
    }

    fn export(src: &str) -> ExportDeclaration {
        match parse_program(src).unwrap().body.remove(0) {
            Statement::Export(decl) => decl,
            other => panic!("expected export, got {other:?}"),
        }
    }

    fn spec_text(src: &str) -> Option<String> {
        specifier_list(src, &import(src))
            .unwrap()
            .map(|span| span.text(src).unwrap().to_string())
    }

    #[test]
    fn classifies_import_shapes() {
        assert_eq!(import_shape(&import(r#"import "x";"#)), ImportShape::SideEffect);
        assert_eq!(import_shape(&import(r#"import a from "x";"#)), ImportShape::Default);
        assert_eq!(
            import_shape(&import(r#"import * as a from "x";"#)),
            ImportShape::Namespace
        );
        assert_eq!(import_shape(&import(r#"import { a } from "x";"#)), ImportShape::Named);
        assert_eq!(
            import_shape(&import(r#"import a, { b } from "x";"#)),
            ImportShape::DefaultAndNamed
        );
        assert_eq!(
            import_shape(&import(r#"import a, * as b from "x";"#)),
            ImportShape::DefaultAndNamespace
        );
    }

    #[test]
    fn specifier_list_per_shape() {
        assert_eq!(spec_text(r#"import noop from "n";"#).as_deref(), Some("noop"));
        assert_eq!(
            spec_text(r#"import * as name from "my-module.js";"#).as_deref(),
            Some("name")
        );
        assert_eq!(
            spec_text(r#"import { html, css, LitElement } from "lit";"#).as_deref(),
            Some("{ html, css, LitElement }")
        );
        assert_eq!(spec_text(r#"import "side-effect";"#), None);
    }

    #[test]
    fn specifier_list_keeps_comments_after_import_keyword() {
        assert_eq!(
            spec_text("import /* c */ a from 'x';").as_deref(),
            Some("/* c */ a")
        );
        assert_eq!(spec_text("import{a}from'x';").as_deref(), Some("{a}"));
    }

    /// The list ends at the clause, even when the module name itself contains " from ".
    #[test]
    fn specifier_list_ignores_from_inside_literal() {
        assert_eq!(
            spec_text(r#"import {a} from "x from y";"#).as_deref(),
            Some("{a}")
        );
    }

    #[test]
    fn specifier_list_rejects_unsupported_shapes() {
        for src in [
            r#"import myDefault, { myModule } from "/modules/my-module.js";"#,
            r#"import { reallyReallyLongModuleExportName as shortName } from "my-module.js";"#,
            r#"import a, * as b from "x";"#,
        ] {
            assert!(
                matches!(
                    specifier_list(src, &import(src)),
                    Err(RewriteError::MalformedDeclaration(_))
                ),
                "expected rejection: {src}"
            );
        }
    }

    #[test]
    fn specifier_list_rejects_import_attributes() {
        let src = r#"import data from "./data.json";"#;
        let mut decl = import(src);
        decl.has_attributes = true;
        assert!(matches!(
            specifier_list(src, &decl),
            Err(RewriteError::MalformedDeclaration(_))
        ));
    }

    #[test]
    fn specifier_list_rejects_span_without_import_keyword() {
        let src = r#"import a from "x";"#;
        let mut decl = import(src);
        decl.span = Span::new(7, src.len());
        assert!(matches!(
            specifier_list(src, &decl),
            Err(RewriteError::MalformedDeclaration(_))
        ));
    }

    #[test]
    fn declared_names_for_declarations() {
        let names = |src: &str| exported_names(&export(src)).unwrap();
        assert_eq!(names("export function testing() {}"), ["testing"]);
        assert_eq!(names("export function* gen() {}"), ["gen"]);
        assert_eq!(names("export class Widget {}"), ["Widget"]);
        assert_eq!(names("export let a = 1, b = 2;"), ["a", "b"]);
        assert_eq!(
            names("export const { name1, name2: bar } = o;"),
            ["name1", "name2"]
        );
        assert_eq!(names("export var { a = 1, ...rest } = o;"), ["a", "rest"]);
    }

    #[test]
    fn declared_names_rejects_unrecoverable_targets() {
        for src in [
            "export const [a, b] = arr;",
            "export const { [key]: value } = o;",
            "export const { a: { b } } = o;",
            "export const { a: [b] } = o;",
            "export const { a: [b, c] = [] } = o;",
        ] {
            assert!(
                matches!(
                    exported_names(&export(src)),
                    Err(RewriteError::MalformedDeclaration(_))
                ),
                "expected rejection: {src}"
            );
        }
        assert!(matches!(
            declared_names(&Declaration::Variable {
                declarators: Vec::new()
            }),
            Err(RewriteError::MalformedDeclaration(_))
        ));
    }

    #[test]
    fn exported_names_for_statement_forms() {
        let names = |src: &str| exported_names(&export(src)).unwrap();
        assert_eq!(names("export { a, b as c };"), ["a", "c"]);
        assert_eq!(names(r#"export { default as name } from "m";"#), ["name"]);
        assert_eq!(names("export default function () {}"), ["default"]);
        assert_eq!(names(r#"export * as ns from "m";"#), ["ns"]);
        assert!(names(r#"export * from "m";"#).is_empty());
    }

    #[test]
    fn export_shapes() {
        assert_eq!(export_shape(&export("export const a = 1;")), ExportShape::KeywordOnly);
        assert_eq!(export_shape(&export("export { a };")), ExportShape::WholeStatement);
        assert_eq!(export_shape(&export("export default a;")), ExportShape::WholeStatement);
    }
}
