//! File access for filter documents, field catalogs and record data.
//! The engine itself never touches the filesystem.

use crate::catalog::FieldCatalog;
use crate::error::{Error, Result};
use crate::filter::document::{serialize, Document};
use crate::filter::model::FilterModel;
use ignore::WalkBuilder;
use serde_yaml::Value as YamlValue;
use std::fs;
use std::path::{Path, PathBuf};

/// Saved filters (`*.json`) below `dir`, honoring `.gitignore` and
/// `.qbignore` files.
pub fn collect_filter_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false)
        .add_custom_ignore_filename(".qbignore")
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

pub fn read_document(path: &Path) -> Result<Document> {
    Document::from_json(&read_text(path)?)
}

pub fn write_document(path: &Path, model: &FilterModel) -> Result<()> {
    let json = serialize(model).to_json()?;
    fs::write(path, json).map_err(|e| Error::io(path, e))?;
    tracing::debug!(path = %path.display(), groups = model.groups().len(), "saved filter");
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<FieldCatalog> {
    FieldCatalog::from_yaml(&read_text(path)?)
}

/// Records are a YAML sequence of attribute mappings.
pub fn read_records(path: &Path) -> Result<Vec<YamlValue>> {
    let value: YamlValue = serde_yaml::from_str(&read_text(path)?)
        .map_err(|e| Error::Format(format!("records: {}", e)))?;
    match value {
        YamlValue::Sequence(records) => Ok(records),
        YamlValue::Null => Ok(Vec::new()),
        _ => Err(Error::Format(
            "records file must contain a sequence".to_string(),
        )),
    }
}
