use crate::error::{ImportsError, Result};
use crate::language::Dialect;
use crate::types::{ImportRef, ModuleImports, Reexport, ReexportNames};
use tree_sitter::{Node, Parser};

/// Tree-sitter backed extractor for module dependencies.
///
/// Holds one parser per dialect; create one per thread and reuse it across files.
pub struct ImportParser {
    typescript: Parser,
    tsx: Parser,
}

impl ImportParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            typescript: Dialect::TypeScript.parser()?,
            tsx: Dialect::Tsx.parser()?,
        })
    }

    /// Extract imports, type imports, re-exports and exported names from source text
    pub fn parse(&mut self, content: &str, dialect: Dialect) -> Result<ModuleImports> {
        let parser = match dialect {
            Dialect::TypeScript => &mut self.typescript,
            Dialect::Tsx => &mut self.tsx,
        };
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ImportsError::parse("Failed to parse source code"))?;

        let root = tree.root_node();
        let mut collector = Collector {
            source: content.as_bytes(),
            out: ModuleImports {
                had_errors: root.has_error(),
                ..ModuleImports::default()
            },
        };
        if collector.out.had_errors {
            log::debug!("Syntax errors recovered while parsing {} module", dialect.as_str());
        }

        collector.visit_program(root);
        collector.visit_calls(root);

        Ok(collector.out)
    }
}

/// One-shot convenience wrapper around [`ImportParser`]
pub fn parse_module(content: &str, dialect: Dialect) -> Result<ModuleImports> {
    ImportParser::new()?.parse(content, dialect)
}

struct Collector<'s> {
    source: &'s [u8],
    out: ModuleImports,
}

impl<'s> Collector<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    fn visit_program(&mut self, root: Node) {
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "import_statement" => self.import_statement(child),
                "export_statement" => self.export_statement(child),
                _ => {}
            }
        }
    }

    fn import_statement(&mut self, node: Node) {
        let statement_type_only = has_type_modifier(node);
        let mut value_names = Vec::new();
        let mut type_names = Vec::new();
        let mut has_clause = false;
        let mut require_source = None;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_clause" => {
                    has_clause = true;
                    self.import_clause(child, &mut value_names, &mut type_names);
                }
                // import x = require('y')
                "import_require_clause" => {
                    require_source = child.child_by_field_name("source");
                    let mut inner = child.walk();
                    for part in child.named_children(&mut inner) {
                        if part.kind() == "identifier" {
                            value_names.push(self.text(part).to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        let Some(source) = node.child_by_field_name("source").or(require_source) else {
            return;
        };
        let specifier = unquote(self.text(source));
        if specifier.is_empty() {
            return;
        }

        if statement_type_only {
            value_names.append(&mut type_names);
            self.out
                .type_imports
                .push(ImportRef::new(specifier, value_names));
            return;
        }

        if !has_clause || !value_names.is_empty() || type_names.is_empty() {
            self.out
                .value_imports
                .push(ImportRef::new(specifier.clone(), value_names));
        }
        if !type_names.is_empty() {
            self.out
                .type_imports
                .push(ImportRef::new(specifier, type_names));
        }
    }

    fn import_clause(&self, clause: Node, value_names: &mut Vec<String>, type_names: &mut Vec<String>) {
        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                // default import
                "identifier" => value_names.push(self.text(child).to_string()),
                "namespace_import" => {
                    let mut inner = child.walk();
                    let ident = child
                        .named_children(&mut inner)
                        .find(|n| n.kind() == "identifier");
                    if let Some(ident) = ident {
                        value_names.push(self.text(ident).to_string());
                    }
                }
                "named_imports" => {
                    let mut inner = child.walk();
                    for spec in child.named_children(&mut inner) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(bound) = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                        else {
                            continue;
                        };
                        let bound = unquote(self.text(bound));
                        if has_type_modifier(spec) {
                            type_names.push(bound);
                        } else {
                            value_names.push(bound);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn export_statement(&mut self, node: Node) {
        if let Some(source) = node.child_by_field_name("source") {
            self.reexport(node, source);
            return;
        }

        let mut cursor = node.walk();
        if node
            .children(&mut cursor)
            .any(|child| !child.is_named() && child.kind() == "default")
        {
            self.out.exports.push("default".to_string());
            return;
        }

        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.declaration_names(declaration);
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "export_clause" {
                for (name, _) in self.export_clause(child) {
                    self.out.exports.push(name);
                }
            }
        }
    }

    fn reexport(&mut self, node: Node, source: Node) {
        let specifier = unquote(self.text(source));
        if specifier.is_empty() {
            return;
        }

        let statement_type_only = has_type_modifier(node);
        let mut names = ReexportNames::All;
        let mut type_only = statement_type_only;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "namespace_export" => {
                    let mut inner = child.walk();
                    let name = child.named_children(&mut inner).last();
                    if let Some(name) = name {
                        names = ReexportNames::Namespace(unquote(self.text(name)));
                    }
                }
                "export_clause" => {
                    let specs = self.export_clause(child);
                    if !specs.is_empty() && specs.iter().all(|(_, typed)| *typed) {
                        type_only = true;
                    }
                    names = ReexportNames::Named(specs.into_iter().map(|(name, _)| name).collect());
                }
                _ => {}
            }
        }

        self.out.reexports.push(Reexport {
            specifier,
            names,
            type_only,
        });
    }

    /// Exported names of `{ a, b as c }` paired with their inline `type` marker
    fn export_clause(&self, clause: Node) -> Vec<(String, bool)> {
        let mut specs = Vec::new();
        let mut cursor = clause.walk();
        for spec in clause.named_children(&mut cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let Some(exported) = spec
                .child_by_field_name("alias")
                .or_else(|| spec.child_by_field_name("name"))
            else {
                continue;
            };
            specs.push((unquote(self.text(exported)), has_type_modifier(spec)));
        }
        specs
    }

    fn declaration_names(&mut self, declaration: Node) {
        match declaration.kind() {
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = declaration.walk();
                for declarator in declaration.named_children(&mut cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(name) = declarator.child_by_field_name("name") {
                        self.binding_names(name);
                    }
                }
            }
            // export declare ...
            "ambient_declaration" => {
                let mut cursor = declaration.walk();
                for inner in declaration.named_children(&mut cursor) {
                    self.declaration_names(inner);
                }
            }
            _ => {
                if let Some(name) = declaration.child_by_field_name("name") {
                    self.out.exports.push(unquote(self.text(name)));
                }
            }
        }
    }

    /// Identifiers bound by a declarator name, including destructuring patterns
    fn binding_names(&mut self, pattern: Node) {
        let mut stack = vec![pattern];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "identifier" | "shorthand_property_identifier_pattern" => {
                    self.out.exports.push(self.text(node).to_string());
                }
                // `{ key: value }`: only the value side binds
                "pair_pattern" => {
                    if let Some(value) = node.child_by_field_name("value") {
                        stack.push(value);
                    }
                }
                _ => {
                    let mut cursor = node.walk();
                    let children: Vec<_> = node.named_children(&mut cursor).collect();
                    stack.extend(children.into_iter().rev());
                }
            }
        }
    }

    /// Dynamic `import('x')` and `require('x')` anywhere in the file
    fn visit_calls(&mut self, root: Node) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "call_expression" {
                self.call_expression(node);
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn call_expression(&mut self, call: Node) {
        let Some(function) = call.child_by_field_name("function") else {
            return;
        };
        let is_loader = match function.kind() {
            "import" => true,
            "identifier" => self.text(function) == "require",
            _ => false,
        };
        if !is_loader {
            return;
        }

        let Some(arguments) = call.child_by_field_name("arguments") else {
            return;
        };
        let mut cursor = arguments.walk();
        let first = arguments.named_children(&mut cursor).next();
        if let Some(arg) = first.filter(|arg| arg.kind() == "string") {
            let specifier = unquote(self.text(arg));
            if !specifier.is_empty() {
                self.out
                    .value_imports
                    .push(ImportRef::new(specifier, Vec::new()));
            }
        }
    }
}

/// `type`/`typeof` keyword directly under a statement or specifier
fn has_type_modifier(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && matches!(child.kind(), "type" | "typeof"));
    found
}

fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    for quote in ['"', '\'', '`'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return raw[1..raw.len() - 1].to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_strips_matching_quotes_only() {
        assert_eq!(unquote("'./a'"), "./a");
        assert_eq!(unquote("\"@s/p\""), "@s/p");
        assert_eq!(unquote("`x`"), "x");
        assert_eq!(unquote("'x\""), "'x\"");
    }

    #[test]
    fn tsx_dialect_parses_jsx() {
        let code = r#"
import React from "react";
import { Button } from "./Button";
export const App = () => <Button label="hi" />;
"#;
        let parsed = parse_module(code, Dialect::Tsx).unwrap();
        assert_eq!(parsed.value_imports.len(), 2);
        assert_eq!(parsed.exports, vec!["App".to_string()]);
    }
}
