//! Field metadata for a layer: names, display aliases, date typing and
//! code → label maps used to turn picked labels back into stored codes.
//!
//! ```yaml
//! fields:
//!   - name: status
//!     alias: Status
//!     value_map: {A: Approved, R: Rejected}
//!   - name: created_on
//!     type: Date
//!   - name: owner_id
//!     relation: {key: id, value: name}
//! ```

use crate::error::{Error, Result};
use crate::filter::compile::{resolve_value, ValueResolver};
use crate::filter::model::FilterModel;
use crate::values::yaml_to_string;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value as YamlValue;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, rename = "type")]
    pub type_name: String,
    #[serde(default, deserialize_with = "scalar_map")]
    pub value_map: Option<IndexMap<String, String>>,
    #[serde(default)]
    pub relation: Option<Relation>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            type_name: String::new(),
            value_map: None,
            relation: None,
        }
    }

    pub fn is_date(&self) -> bool {
        self.type_name.to_lowercase().contains("date")
    }

    /// The configured alias, or the name with underscores as spaces in
    /// title case.
    pub fn display_alias(&self) -> String {
        match &self.alias {
            Some(alias) if !alias.is_empty() => alias.clone(),
            _ => title_case(&self.name.replace('_', " ")),
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.display_alias(), self.name)
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn scalar_map<'de, D>(deserializer: D) -> std::result::Result<Option<IndexMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?;
    Ok(mapping.map(|m| {
        m.iter()
            .filter_map(|(k, v)| Some((yaml_to_string(k)?, yaml_to_string(v)?)))
            .collect()
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCatalog {
    #[serde(default)]
    fields: Vec<FieldInfo>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<FieldInfo>) -> Self {
        Self { fields }
    }

    pub fn from_yaml(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|e| Error::Format(format!("field catalog: {}", e)))
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn first_field(&self) -> Option<&str> {
        self.fields.first().map(|f| f.name.as_str())
    }

    pub fn new_model(&self) -> FilterModel {
        FilterModel::new(self.first_field().unwrap_or_default())
    }

    /// Fills the value map of every relation field from `records`, mapping
    /// each record's key column to its value column.
    pub fn resolve_relations(&mut self, records: &[YamlValue]) {
        for field in &mut self.fields {
            let Some(relation) = &field.relation else {
                continue;
            };
            let map: IndexMap<String, String> = records
                .iter()
                .filter_map(|record| {
                    let key = yaml_to_string(record.get(&relation.key)?)?;
                    let value = yaml_to_string(record.get(&relation.value)?)?;
                    Some((key, value))
                })
                .collect();
            tracing::debug!(field = %field.name, entries = map.len(), "resolved relation");
            field.value_map = Some(map);
        }
    }

    /// Ties a loaded model to this catalog: marks date conditions and
    /// replaces date values that do not parse with `today`.
    pub fn bind(&self, model: &mut FilterModel, today: NaiveDate) {
        if model.default_field().is_empty() {
            if let Some(first) = self.first_field() {
                model.set_default_field(first);
            }
        }

        for cond in model.conditions_mut() {
            let Some(field) = self.field(&cond.field) else {
                tracing::warn!(field = %cond.field, "condition refers to an unknown field");
                continue;
            };
            cond.is_date = field.is_date();
            if !cond.is_date {
                continue;
            }
            for value in [&mut cond.value1, &mut cond.value2] {
                if NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).is_err() {
                    tracing::warn!(field = %field.name, value = %value, "unreadable date, using today");
                    *value = today.format(DATE_FORMAT).to_string();
                }
            }
        }
    }
}

impl ValueResolver for FieldCatalog {
    fn resolve(&self, field: &str, raw: &str) -> String {
        let value_map = self.field(field).and_then(|f| f.value_map.as_ref());
        resolve_value(raw, value_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::compile::compile;
    use crate::filter::document::parse;

    const CATALOG: &str = r#"
fields:
  - name: status
    alias: Status
    value_map: {A: Approved, R: Rejected}
  - name: created_on
    type: Date
  - name: zone_code
    value_map: {1: Residential, 2: Commercial}
  - name: owner_id
    relation: {key: id, value: name}
"#;

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_yaml(CATALOG).unwrap()
    }

    #[test]
    fn test_load_catalog() {
        let catalog = catalog();
        assert_eq!(catalog.fields().len(), 4);
        assert_eq!(catalog.first_field(), Some("status"));
        assert!(catalog.field("created_on").unwrap().is_date());
        assert!(!catalog.field("status").unwrap().is_date());

        let zone = catalog.field("zone_code").unwrap();
        let map = zone.value_map.as_ref().unwrap();
        assert_eq!(map.get("2").map(String::as_str), Some("Commercial"));
    }

    #[test]
    fn test_new_model_uses_first_field() {
        let catalog = FieldCatalog::new(vec![FieldInfo::new("height"), FieldInfo::new("width")]);
        let mut model = catalog.new_model();
        model.add_condition(0).unwrap();
        assert!(model.groups()[0].conditions().iter().all(|c| c.field == "height"));

        let model = FieldCatalog::default().new_model();
        assert_eq!(model.default_field(), "");
    }

    #[test]
    fn test_display_alias() {
        let catalog = catalog();
        assert_eq!(catalog.field("status").unwrap().label(), "Status (status)");
        assert_eq!(catalog.field("zone_code").unwrap().display_alias(), "Zone Code");
        assert_eq!(FieldInfo::new("ZIP_code").display_alias(), "Zip Code");
    }

    #[test]
    fn test_catalog_resolves_values() {
        let catalog = catalog();
        assert_eq!(catalog.resolve("status", "Approved (A)"), "A");
        assert_eq!(catalog.resolve("status", "{Approved,Rejected}"), "{A,R}");
        assert_eq!(catalog.resolve("status", "Rejected"), "R");
        assert_eq!(catalog.resolve("created_on", "Rejected"), "Rejected");
        assert_eq!(catalog.resolve("missing", "x"), "x");
    }

    #[test]
    fn test_compile_with_catalog() {
        let mut model = catalog().new_model();
        model.condition_mut(0, 0).unwrap().value1 = "Commercial".to_string();
        model.condition_mut(0, 0).unwrap().field = "zone_code".to_string();
        assert_eq!(compile(&model, &catalog()), r#"("zone_code" = 2)"#);
    }

    #[test]
    fn test_relation_lookup() {
        let records: Vec<YamlValue> =
            serde_yaml::from_str("[{id: 7, name: Alice}, {id: 9, name: Bob}, {name: Nobody}]")
                .unwrap();
        let mut catalog = catalog();
        catalog.resolve_relations(&records);
        assert_eq!(catalog.resolve("owner_id", "Bob"), "9");
        assert_eq!(catalog.field("owner_id").unwrap().value_map.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_bind_repairs_unreadable_dates() {
        let mut model = parse(
            r#"{"groups": [{"op": "UND", "blocks": [
                {"field": "created_on", "operator": "zwischen", "value1": "2021-03-04", "value2": "soon"},
                {"field": "status", "operator": "=", "value1": "soon"}
            ]}]}"#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        catalog().bind(&mut model, today);

        let conds = model.groups()[0].conditions();
        assert!(conds[0].is_date);
        assert_eq!(conds[0].value1, "2021-03-04");
        assert_eq!(conds[0].value2, "2024-05-06");
        assert!(!conds[1].is_date);
        assert_eq!(conds[1].value1, "soon");
        assert_eq!(model.default_field(), "status");
    }
}
