//! Canonical printing of build files.
//!
//! Arguments are printed with positional ones first, then `name`, then the
//! rest alphabetically. Lists with more than one element go one item per
//! line with a trailing comma. Statements are separated by one blank line.

use crate::syntax::{Arg, BuildFile, Rule, Stmt, Value};

const INDENT: &str = "    ";

pub fn format(file: &BuildFile) -> String {
    let mut out = String::new();
    for (idx, stmt) in file.stmts.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        match stmt {
            Stmt::Raw(text) => {
                out.push_str(text.trim_end());
                out.push('\n');
            }
            Stmt::Rule(rule) => write_rule(&mut out, rule),
        }
    }
    out
}

fn write_rule(out: &mut String, rule: &Rule) {
    for comment in &rule.comments {
        out.push_str(comment);
        out.push('\n');
    }
    if let Some(text) = &rule.verbatim {
        out.push_str(text.trim_end());
        out.push('\n');
        return;
    }

    let args = ordered_args(rule);
    out.push_str(&rule.kind);
    out.push('(');

    if args.iter().all(|arg| arg.name.is_none()) {
        let inline: Vec<String> = args.iter().map(|arg| value_text(&arg.value, "")).collect();
        out.push_str(&inline.join(", "));
        out.push_str(")\n");
        return;
    }

    out.push('\n');
    for arg in args {
        out.push_str(INDENT);
        if let Some(name) = &arg.name {
            out.push_str(name);
            out.push_str(" = ");
        }
        out.push_str(&value_text(&arg.value, INDENT));
        out.push_str(",\n");
    }
    out.push_str(")\n");
}

fn ordered_args(rule: &Rule) -> Vec<&Arg> {
    let mut args: Vec<&Arg> = rule.args.iter().collect();
    // Stable sort: positional args keep their relative order.
    args.sort_by(|a, b| arg_rank(a).cmp(&arg_rank(b)));
    args
}

fn arg_rank(arg: &Arg) -> (u8, &str) {
    match arg.name.as_deref() {
        None => (0, ""),
        Some("name") => (1, ""),
        Some(name) => (2, name),
    }
}

fn value_text(value: &Value, indent: &str) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Expr(text) => text.clone(),
        Value::List(items) if items.len() <= 1 => {
            format!("[{}]", items.iter().map(|s| quote(s)).collect::<String>())
        }
        Value::List(items) => {
            let mut text = String::from("[\n");
            for item in items {
                text.push_str(indent);
                text.push_str(INDENT);
                text.push_str(&quote(item));
                text.push_str(",\n");
            }
            text.push_str(indent);
            text.push(']');
            text
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
