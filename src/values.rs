use crate::catalog::FieldInfo;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_yaml::Value as YamlValue;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    All,
    Sample(usize),
    UsedOnly,
}

/// Counts how often each value of `field` occurs across `records`.
/// Sequences and `{a,b}` set literals count once per member.
pub fn collect_values(records: &[YamlValue], field: &str) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(value) = record.get(field) else {
            continue;
        };

        match value {
            YamlValue::Sequence(arr) => {
                for item in arr {
                    if let Some(s) = value_to_string(item) {
                        *counts.entry(s).or_default() += 1;
                    }
                }
            }
            YamlValue::String(s) if is_set_literal(s) => {
                for member in set_members(s) {
                    *counts.entry(member.to_string()).or_default() += 1;
                }
            }
            _ => {
                if let Some(s) = value_to_string(value) {
                    *counts.entry(s).or_default() += 1;
                }
            }
        }
    }

    counts
}

/// Candidate values for a condition on `field`.
///
/// Mapped fields list `label (code)` in map order; `UsedOnly` keeps only
/// codes found in `records`. Other fields list their distinct record
/// values sorted.
pub fn sample_values<R: Rng + ?Sized>(
    field: &FieldInfo,
    mode: SampleMode,
    records: &[YamlValue],
    rng: &mut R,
) -> Vec<String> {
    if let Some(map) = &field.value_map {
        let mut codes: Vec<&String> = map.keys().collect();
        match mode {
            SampleMode::All => {}
            SampleMode::Sample(n) => {
                codes = codes.choose_multiple(rng, n.min(codes.len())).copied().collect();
            }
            SampleMode::UsedOnly => {
                let used = collect_values(records, &field.name);
                codes.retain(|code| used.contains_key(code.as_str()));
            }
        }
        return codes
            .into_iter()
            .map(|code| format!("{} ({})", map[code.as_str()], code))
            .collect();
    }

    let distinct: Vec<String> = collect_values(records, &field.name).into_keys().collect();
    let mut items = match mode {
        SampleMode::Sample(n) => distinct
            .choose_multiple(rng, n.min(distinct.len()))
            .cloned()
            .collect(),
        SampleMode::All | SampleMode::UsedOnly => distinct,
    };
    items.sort();
    items
}

pub fn format_values(counts: HashMap<String, usize>, show_count: bool) -> Vec<String> {
    let mut items: Vec<(String, usize)> = counts.into_iter().collect();

    if show_count {
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items
            .into_iter()
            .map(|(val, count)| format!("{}: {}", val, count))
            .collect()
    } else {
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items.into_iter().map(|(val, _)| val).collect()
    }
}

fn is_set_literal(s: &str) -> bool {
    s.starts_with('{') && s.ends_with('}')
}

fn set_members(s: &str) -> impl Iterator<Item = &str> {
    s[1..s.len() - 1]
        .split(',')
        .map(|part| part.trim().trim_matches(|c: char| c == '\'' || c == '"'))
        .filter(|part| !part.is_empty())
}

pub(crate) fn yaml_to_string(v: &YamlValue) -> Option<String> {
    match v {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_string(v: &YamlValue) -> Option<String> {
    yaml_to_string(v).filter(|s| !s.is_empty())
}
