//! BUCK files as a list of statements, parsed with tree-sitter.
//!
//! Starlark is read with the Python grammar. A top-level call statement,
//! `kind(arg = value, ...)`, becomes a [`Rule`]; every other statement
//! (assignments, conditionals, expressions) is kept verbatim as
//! [`Stmt::Raw`].

use crate::SyntaxError;
use tree_sitter::{Node, Parser};

/// A parsed build file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFile {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Rule(Rule),
    /// Verbatim text, including any comment lines directly above it.
    Raw(String),
}

/// A top-level call such as `go_library(name = "x", ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Comment lines directly above the call, `#` included.
    pub comments: Vec<String>,
    pub kind: String,
    pub args: Vec<Arg>,
    /// Original text when the call held comments of its own. Printed as-is
    /// until the rule is modified.
    pub verbatim: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    /// `None` for positional arguments.
    pub name: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    List(Vec<String>),
    Bool(bool),
    /// Any other expression, as source text.
    Expr(String),
}

impl Rule {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            comments: Vec::new(),
            kind: kind.into(),
            args: Vec::new(),
            verbatim: None,
        }
    }

    /// The `name` argument, if it is a string.
    pub fn name(&self) -> Option<&str> {
        match self.get("name")? {
            Value::String(name) => Some(name),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.args
            .iter()
            .find(|arg| arg.name.as_deref() == Some(key))
            .map(|arg| &arg.value)
    }

    /// Set a named argument, replacing any existing value.
    pub fn set(&mut self, key: &str, value: Value) {
        self.verbatim = None;
        match self
            .args
            .iter_mut()
            .find(|arg| arg.name.as_deref() == Some(key))
        {
            Some(arg) => arg.value = value,
            None => self.args.push(Arg {
                name: Some(key.to_string()),
                value,
            }),
        }
    }
}

impl BuildFile {
    /// Rules in file order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.stmts.iter().filter_map(|stmt| match stmt {
            Stmt::Rule(rule) => Some(rule),
            Stmt::Raw(_) => None,
        })
    }

    pub fn find_rule(&self, name: &str) -> Option<&Rule> {
        self.rules().find(|rule| rule.name() == Some(name))
    }
}

/// Parse build file text.
///
/// Fails on the first syntax error; statements that parse but are not rule
/// calls are kept as [`Stmt::Raw`].
pub fn parse(text: &str) -> Result<BuildFile, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_python::language().into())
        .map_err(|e| SyntaxError::Grammar(e.to_string()))?;
    let tree = parser
        .parse(text, None)
        .ok_or_else(|| SyntaxError::Grammar("parser produced no tree".to_string()))?;

    let root = tree.root_node();
    if let Some(node) = first_error(root) {
        return Err(SyntaxError::Invalid {
            line: node.start_position().row + 1,
        });
    }

    let mut reader = StmtReader::new(text);
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if node.kind() == "comment" {
            reader.comment(node);
        } else {
            reader.statement(node);
        }
    }
    Ok(reader.finish())
}

/// Depth-first search for an `ERROR` or `MISSING` node.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    Some(node)
}

/// Groups top-level nodes into statements, attaching comments.
struct StmtReader<'a> {
    source: &'a str,
    stmts: Vec<Stmt>,
    /// Comment lines not yet attached, with the row of the last one.
    pending: Vec<String>,
    pending_row: usize,
    /// Last row and source text of the previous statement.
    last: Option<(usize, &'a str)>,
}

impl<'a> StmtReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            stmts: Vec::new(),
            pending: Vec::new(),
            pending_row: 0,
            last: None,
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        let source: &'a str = self.source;
        &source[node.byte_range()]
    }

    fn comment(&mut self, node: Node<'_>) {
        let row = node.start_position().row;
        let text = self.text(node);

        if let Some((last_row, last_text)) = self.last
            && last_row == row
            && self.pending.is_empty()
        {
            self.attach_trailing(last_text, text);
            return;
        }

        if !self.pending.is_empty() && row > self.pending_row + 1 {
            self.flush_comments();
        }
        self.pending.push(text.trim_end().to_string());
        self.pending_row = row;
    }

    /// A comment on the same line as the end of the previous statement.
    fn attach_trailing(&mut self, stmt_text: &str, comment: &str) {
        match self.stmts.last_mut() {
            Some(Stmt::Raw(raw)) => {
                raw.push_str("  ");
                raw.push_str(comment);
            }
            Some(Stmt::Rule(rule)) => {
                let base = rule.verbatim.take().unwrap_or_else(|| stmt_text.to_string());
                rule.verbatim = Some(format!("{base}  {comment}"));
            }
            None => {}
        }
        self.last = None;
    }

    fn statement(&mut self, node: Node<'_>) {
        let start = node.start_position().row;
        if !self.pending.is_empty() && start > self.pending_row + 1 {
            self.flush_comments();
        }
        let leading = std::mem::take(&mut self.pending);
        let text = self.text(node);

        match self.read_rule(node) {
            Some(mut rule) => {
                rule.comments = leading;
                self.stmts.push(Stmt::Rule(rule));
            }
            None => {
                let mut raw = leading;
                raw.push(text.trim_end().to_string());
                self.stmts.push(Stmt::Raw(raw.join("\n")));
            }
        }
        self.last = Some((node.end_position().row, text));
    }

    fn flush_comments(&mut self) {
        if !self.pending.is_empty() {
            let block = std::mem::take(&mut self.pending).join("\n");
            self.stmts.push(Stmt::Raw(block));
        }
    }

    fn finish(mut self) -> BuildFile {
        self.flush_comments();
        BuildFile { stmts: self.stmts }
    }

    /// A statement that is exactly one call to a (possibly dotted) name.
    fn read_rule(&self, stmt: Node<'_>) -> Option<Rule> {
        if stmt.kind() != "expression_statement" || stmt.named_child_count() != 1 {
            return None;
        }
        let call = stmt.named_child(0)?;
        if call.kind() != "call" {
            return None;
        }
        let function = call.child_by_field_name("function")?;
        if !matches!(function.kind(), "identifier" | "attribute") {
            return None;
        }
        let arguments = call.child_by_field_name("arguments")?;
        if arguments.kind() != "argument_list" {
            return None;
        }

        let mut args = Vec::new();
        let mut cursor = arguments.walk();
        for arg in arguments.named_children(&mut cursor) {
            match arg.kind() {
                "comment" => {}
                "keyword_argument" => {
                    let name = arg.child_by_field_name("name")?;
                    let value = arg.child_by_field_name("value")?;
                    args.push(Arg {
                        name: Some(self.text(name).to_string()),
                        value: self.read_value(value),
                    });
                }
                _ => args.push(Arg {
                    name: None,
                    value: self.read_value(arg),
                }),
            }
        }

        Some(Rule {
            comments: Vec::new(),
            kind: self.text(function).to_string(),
            args,
            verbatim: contains_comment(stmt).then(|| self.text(stmt).trim_end().to_string()),
        })
    }

    fn read_value(&self, node: Node<'_>) -> Value {
        let text = self.text(node);
        match node.kind() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "string" => decode_string(text).map_or_else(|| Value::Expr(text.to_string()), Value::String),
            "list" => {
                let mut items = Vec::new();
                let mut cursor = node.walk();
                for item in node.named_children(&mut cursor) {
                    if item.kind() == "comment" {
                        continue;
                    }
                    match (item.kind(), decode_string(self.text(item))) {
                        ("string", Some(s)) => items.push(s),
                        _ => return Value::Expr(text.to_string()),
                    }
                }
                Value::List(items)
            }
            _ => Value::Expr(text.to_string()),
        }
    }
}

fn contains_comment(node: Node<'_>) -> bool {
    if node.kind() == "comment" {
        return true;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(contains_comment);
    found
}

/// Decode a plain single-line string literal. Prefixed and triple-quoted
/// strings are left to [`Value::Expr`].
fn decode_string(text: &str) -> Option<String> {
    let quote = text.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let triple: String = std::iter::repeat_n(quote, 3).collect();
    if text.len() < 2 || text.starts_with(&triple) || !text.ends_with(quote) {
        return None;
    }

    let mut out = String::new();
    let mut chars = text[1..text.len() - 1].chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(e @ ('\\' | '"' | '\'')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}
