//! Renders a [`FilterModel`] into a filter expression string.
//!
//! Groups are emitted left to right as `(c1 AND c2)`, each later group
//! prefixed by ` AND ` or ` OR `. No brackets are added across groups, so
//! `(A) OR (B) AND (C)` follows the evaluator's usual precedence.

use super::model::{Condition, FilterModel, Operator};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ANNOTATED_CODE: Regex = Regex::new(r"^(.*)\s*\((.*)\)$").unwrap();
}

/// Maps a value as the user sees it back to the value stored in the data.
pub trait ValueResolver {
    fn resolve(&self, field: &str, raw: &str) -> String;
}

impl<F> ValueResolver for F
where
    F: Fn(&str, &str) -> String,
{
    fn resolve(&self, field: &str, raw: &str) -> String {
        self(field, raw)
    }
}

/// Returns every value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl ValueResolver for IdentityResolver {
    fn resolve(&self, _field: &str, raw: &str) -> String {
        raw.to_string()
    }
}

/// Resolves `raw` against a field's code → label map.
///
/// - `{d1,d2}` resolves each member label and re-emits `{k1,k2}`
/// - `Label (code)` yields `code`
/// - a plain label found in the map yields its code
/// - anything else comes back unchanged
pub fn resolve_value(raw: &str, value_map: Option<&IndexMap<String, String>>) -> String {
    if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        let codes: Vec<String> = inner
            .split(',')
            .map(|item| item.trim().trim_matches(|c: char| c == '"' || c == '\''))
            .filter(|item| !item.is_empty())
            .map(|label| lookup_code(label, value_map).to_string())
            .collect();
        return format!("{{{}}}", codes.join(","));
    }

    if let Some(caps) = ANNOTATED_CODE.captures(raw) {
        return caps[2].to_string();
    }

    lookup_code(raw, value_map).to_string()
}

// Duplicate labels resolve to the last code carrying them.
fn lookup_code<'a>(label: &'a str, value_map: Option<&'a IndexMap<String, String>>) -> &'a str {
    value_map
        .and_then(|map| map.iter().rev().find(|(_, l)| l.as_str() == label))
        .map(|(code, _)| code.as_str())
        .unwrap_or(label)
}

/// Digits with at most one decimal point, e.g. `30`, `2.5`, `.5`.
fn is_numeric_literal(value: &str) -> bool {
    let digits = value.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn render_condition(cond: &Condition, resolver: &dyn ValueResolver) -> Option<String> {
    let f = &cond.field;
    let v1 = resolver.resolve(f, cond.value1.trim());

    let clause = match cond.operator {
        Operator::IsEmpty => format!("(\"{f}\" IS NULL OR \"{f}\" = '{{}}')"),
        Operator::IsNotEmpty => format!("(\"{f}\" IS NOT NULL AND \"{f}\" != '{{}}')"),
        Operator::Contains => format!("\"{f}\" ILIKE '%{v1}%'"),
        Operator::Between => {
            let v2 = resolver.resolve(f, cond.value2.trim());
            format!("\"{f}\" >= '{v1}' AND \"{f}\" <= '{v2}'")
        }
        op => {
            if v1.is_empty() {
                tracing::debug!(field = %f, operator = %op, "skipping condition without a value");
                return None;
            }
            if is_numeric_literal(&v1) {
                format!("\"{f}\" {op} {v1}")
            } else {
                format!("\"{f}\" {op} '{v1}'")
            }
        }
    };

    Some(clause)
}

pub fn compile(model: &FilterModel, resolver: &dyn ValueResolver) -> String {
    let mut expr = String::new();

    for (i, group) in model.groups().iter().enumerate() {
        let conds: Vec<String> = group
            .conditions()
            .iter()
            .filter_map(|cond| render_condition(cond, resolver))
            .collect();

        if i > 0 {
            expr.push(' ');
            expr.push_str(group.join().keyword());
            expr.push(' ');
        }
        expr.push('(');
        expr.push_str(&conds.join(" AND "));
        expr.push(')');
    }

    expr
}
