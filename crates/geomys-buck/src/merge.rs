//! Merging generated rules into an existing build file.

use crate::format::format;
use crate::syntax::{Arg, BuildFile, Rule, Stmt, Value, parse};
use crate::SyntaxError;
use geomys_rules::{AttrValue, RuleSpec};
use std::collections::HashMap;
use tracing::debug;

impl From<&AttrValue> for Value {
    fn from(value: &AttrValue) -> Self {
        match value {
            AttrValue::String(s) => Value::String(s.clone()),
            AttrValue::List(items) => Value::List(items.clone()),
            AttrValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl From<&RuleSpec> for Rule {
    fn from(spec: &RuleSpec) -> Self {
        let mut rule = Rule::new(spec.kind.as_str());
        rule.args.push(Arg {
            name: Some("name".to_string()),
            value: Value::String(spec.name.clone()),
        });
        for (key, value) in &spec.attrs {
            rule.set(key, value.into());
        }
        rule
    }
}

/// Counts of what a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub updated: usize,
    pub replaced: usize,
    pub added: usize,
}

/// Merge `rules` into `file` by name.
///
/// A rule with the same name and kind has the generated attributes
/// overwritten and keeps the rest; a kind change replaces the rule but keeps
/// its leading comments. New rules are appended in order. Rules no longer
/// generated are left in place.
pub fn merge_rules(file: &mut BuildFile, rules: &[RuleSpec]) -> MergeStats {
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (idx, stmt) in file.stmts.iter().enumerate() {
        if let Stmt::Rule(rule) = stmt
            && let Some(name) = rule.name()
        {
            by_name.entry(name.to_string()).or_insert(idx);
        }
    }

    let mut stats = MergeStats::default();
    for spec in rules {
        let existing = match by_name.get(&spec.name) {
            Some(&idx) => match &mut file.stmts[idx] {
                Stmt::Rule(rule) => Some(rule),
                Stmt::Raw(_) => None,
            },
            None => None,
        };

        match existing {
            Some(rule) if rule.kind == spec.kind.as_str() => {
                for (key, value) in &spec.attrs {
                    rule.set(key, value.into());
                }
                stats.updated += 1;
            }
            Some(rule) => {
                debug!(name = %spec.name, from = %rule.kind, to = spec.kind.as_str(), "rule kind changed");
                let comments = std::mem::take(&mut rule.comments);
                *rule = Rule::from(spec);
                rule.comments = comments;
                stats.replaced += 1;
            }
            None => {
                by_name.insert(spec.name.clone(), file.stmts.len());
                file.stmts.push(Stmt::Rule(Rule::from(spec)));
                stats.added += 1;
            }
        }
    }
    stats
}

/// Parse `existing`, merge `rules` into it, and print the result.
pub fn merge_into_file(existing: &str, rules: &[RuleSpec]) -> Result<String, SyntaxError> {
    let mut file = parse(existing)?;
    let stats = merge_rules(&mut file, rules);
    debug!(
        updated = stats.updated,
        replaced = stats.replaced,
        added = stats.added,
        "merged build file"
    );
    Ok(format(&file))
}
