//! Import extraction from Go source with tree-sitter-go.
//!
//! Only the file header matters: the package clause and the import
//! declarations that follow it. Anything after the first non-import
//! declaration is ignored, including syntax errors.

use crate::GoError;
use geomys_rules::{BoxError, ImportParser};
use tree_sitter::{Node, Parser};

/// [`ImportParser`] backed by tree-sitter-go.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoImportParser;

impl GoImportParser {
    /// Import paths of `source`, in declaration order.
    pub fn imports(&self, source: &[u8]) -> Result<Vec<String>, GoError> {
        let content = std::str::from_utf8(source)
            .map_err(|_| GoError::Parse("source is not valid UTF-8".to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| GoError::Parse(format!("failed to load Go grammar: {e}")))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| GoError::Parse("parser produced no tree".to_string()))?;

        let root = tree.root_node();
        let mut cursor = root.walk();
        let mut decls = root
            .named_children(&mut cursor)
            .filter(|node| node.kind() != "comment");

        match decls.next() {
            Some(node) if node.kind() == "package_clause" && !node.has_error() => {}
            Some(node) if node.kind() == "package_clause" || node.kind() == "ERROR" => {
                return Err(syntax_error(&node, "package clause"));
            }
            _ => return Err(GoError::Parse("missing package clause".to_string())),
        }

        let mut imports = Vec::new();
        for node in decls {
            match node.kind() {
                "import_declaration" => {
                    if node.has_error() {
                        return Err(syntax_error(&node, "import declaration"));
                    }
                    collect_specs(&node, content, &mut imports);
                }
                "ERROR" if !starts_later_declaration(&content[node.byte_range()]) => {
                    return Err(syntax_error(&node, "import declaration"));
                }
                _ => break,
            }
        }

        Ok(imports)
    }
}

impl ImportParser for GoImportParser {
    fn parse_imports(&self, source: &[u8]) -> Result<Vec<String>, BoxError> {
        Ok(self.imports(source)?)
    }
}

fn collect_specs(decl: &Node, content: &str, imports: &mut Vec<String>) {
    let mut cursor = decl.walk();
    for child in decl.children(&mut cursor) {
        match child.kind() {
            "import_spec" => imports.extend(spec_path(&child, content)),
            "import_spec_list" => {
                let mut list_cursor = child.walk();
                for spec in child.children(&mut list_cursor) {
                    if spec.kind() == "import_spec" {
                        imports.extend(spec_path(&spec, content));
                    }
                }
            }
            _ => {}
        }
    }
}

/// The unquoted `path` of an import spec; aliases are ignored.
fn spec_path(spec: &Node, content: &str) -> Option<String> {
    let path = spec.child_by_field_name("path")?;
    let text = &content[path.byte_range()];
    let unquoted = match path.kind() {
        "raw_string_literal" => text.trim_matches('`'),
        _ => text.trim_matches('"'),
    };
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}

/// Whether unparsable text begins a declaration that may follow the imports.
fn starts_later_declaration(text: &str) -> bool {
    ["func", "type", "var", "const"].iter().any(|kw| {
        text.strip_prefix(kw)
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '('))
    })
}

fn syntax_error(node: &Node, what: &str) -> GoError {
    let pos = node.start_position();
    GoError::Parse(format!(
        "syntax error in {what} at {}:{}",
        pos.row + 1,
        pos.column + 1
    ))
}
