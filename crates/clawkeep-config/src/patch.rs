//! Field-level edits on the raw JSON document.
//!
//! The typed [`OpenClawConfig`](crate::OpenClawConfig) only understands part of
//! the file, so edits never go through it. Each patch re-reads the file as a
//! plain `serde_json` object, changes one nested path and writes the whole
//! object back.
//!
//! There is no file locking. Two writers (two processes, or two stores in one
//! process) patching the same file can interleave and the later write wins,
//! dropping the earlier edit. Every write uses its own temp file, so the file
//! on disk is always one complete document. Callers are expected to keep a
//! single writer per file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clawkeep_common::{Error, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// The untyped form of the config document.
pub type Document = Map<String, Value>;

pub const PRIMARY_MODEL_PATH: [&str; 4] = ["agents", "defaults", "model", "primary"];
pub const FALLBACK_MODELS_PATH: [&str; 4] = ["agents", "defaults", "model", "fallbacks"];

/// Read `path` fresh and parse it as a JSON object.
pub fn read_document(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::Read(format!("{}: {e}", path.display())))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| Error::Decode(format!("{}: {e}", path.display())))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::NotAMapping(format!(
            "{} has a {} at the root",
            path.display(),
            json_kind(&other)
        ))),
    }
}

/// Serialize `doc` and replace `path` with it in one rename.
///
/// The new contents go to a uniquely named temp file next to the target, so a
/// failed write leaves the original file untouched. A symlinked `path` keeps
/// its link: the file it points at is the one replaced.
pub fn write_document(path: &Path, doc: &Document) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(doc)?;
    bytes.push(b'\n');

    let target = resolve_target(path);
    write_and_rename(&target, &bytes)
        .map_err(|e| Error::Write(format!("{}: {e}", path.display())))
}

/// Follow symlinks to the real file. A path that does not exist yet is used
/// as given.
fn resolve_target(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn write_and_rename(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = target
        .file_name()
        .map(|n| format!(".{}.", n.to_string_lossy()))
        .unwrap_or_else(|| ".config.".to_string());

    // Dropped without persisting on any error, which removes it.
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    // Keep the original mode; the file holds credentials.
    if let Ok(meta) = fs::metadata(target) {
        let _ = fs::set_permissions(tmp.path(), meta.permissions());
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Read, mutate and rewrite the document at `path`.
///
/// If `mutation` returns an error nothing is written.
pub fn apply_patch<T, F>(path: &Path, mutation: F) -> Result<T>
where
    F: FnOnce(&mut Document) -> Result<T>,
{
    let mut doc = read_document(path)?;
    let out = mutation(&mut doc)?;
    write_document(path, &doc)?;
    debug!("patched {}", path.display());
    Ok(out)
}

/// Look up a nested value by key path.
pub fn get_value_at<'a>(doc: &'a Document, keys: &[&str]) -> Option<&'a Value> {
    let (last, parents) = keys.split_last()?;
    let mut node = doc;
    for key in parents {
        node = node.get(*key)?.as_object()?;
    }
    node.get(*last)
}

/// Set a nested value, creating intermediate objects as needed.
///
/// An intermediate that exists but is not an object is replaced by an empty
/// object. Siblings along the path are left alone.
pub fn set_value_at(doc: &mut Document, keys: &[&str], value: Value) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut node = doc;
    for key in parents {
        let slot = node
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            return;
        };
        node = map;
    }
    node.insert(last.to_string(), value);
}

pub fn set_primary_model(doc: &mut Document, model: &str) {
    info!("setting primary model to {model}");
    set_value_at(doc, &PRIMARY_MODEL_PATH, Value::String(model.to_string()));
}

pub fn set_fallback_models(doc: &mut Document, models: &[String]) {
    info!("setting {} fallback model(s)", models.len());
    let list = models.iter().cloned().map(Value::String).collect();
    set_value_at(doc, &FALLBACK_MODELS_PATH, Value::Array(list));
}

/// Current fallback list as stored on disk. Non-array values read as empty.
pub fn fallback_list(doc: &Document) -> Vec<Value> {
    get_value_at(doc, &FALLBACK_MODELS_PATH)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

pub fn add_fallback_model(doc: &mut Document, model: &str) {
    let mut list = fallback_list(doc);
    list.push(Value::String(model.to_string()));
    info!("appending fallback model {model} at position {}", list.len());
    set_value_at(doc, &FALLBACK_MODELS_PATH, Value::Array(list));
}

/// Remove the fallback at `index` (0-based) and return it.
pub fn remove_fallback_model(doc: &mut Document, index: usize) -> Result<Value> {
    let mut list = fallback_list(doc);
    if index >= list.len() {
        return Err(out_of_range(index, list.len()));
    }
    let removed = list.remove(index);
    info!("removing fallback model at position {}", index + 1);
    set_value_at(doc, &FALLBACK_MODELS_PATH, Value::Array(list));
    Ok(removed)
}

/// Replace the fallback at `index` (0-based), returning the previous entry.
pub fn replace_fallback_model(doc: &mut Document, index: usize, model: &str) -> Result<Value> {
    let mut list = fallback_list(doc);
    let Some(slot) = list.get_mut(index) else {
        return Err(out_of_range(index, list.len()));
    };
    let previous = std::mem::replace(slot, Value::String(model.to_string()));
    info!("replacing fallback model at position {} with {model}", index + 1);
    set_value_at(doc, &FALLBACK_MODELS_PATH, Value::Array(list));
    Ok(previous)
}

fn out_of_range(index: usize, len: usize) -> Error {
    Error::InvalidEdit(format!(
        "fallback index {index} is out of range (list has {len} entries)"
    ))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn set_value_creates_missing_parents() {
        let mut d = doc(json!({ "gateway": { "port": 1 } }));
        set_primary_model(&mut d, "openai/gpt-4o-mini");
        assert_eq!(
            Value::Object(d),
            json!({
                "gateway": { "port": 1 },
                "agents": { "defaults": { "model": { "primary": "openai/gpt-4o-mini" } } }
            })
        );
    }

    #[test]
    fn set_value_keeps_siblings() {
        let mut d = doc(json!({
            "agents": {
                "defaults": {
                    "model": { "primary": "a", "fallbacks": ["b"] },
                    "workspace": "~/clawd"
                },
                "list": [1, 2]
            }
        }));
        set_primary_model(&mut d, "z");
        assert_eq!(d["agents"]["defaults"]["model"]["fallbacks"], json!(["b"]));
        assert_eq!(d["agents"]["defaults"]["workspace"], json!("~/clawd"));
        assert_eq!(d["agents"]["list"], json!([1, 2]));
    }

    #[test]
    fn set_value_replaces_scalar_intermediate() {
        let mut d = doc(json!({ "agents": "broken" }));
        set_value_at(&mut d, &["agents", "defaults", "workspace"], json!("w"));
        assert_eq!(d["agents"], json!({ "defaults": { "workspace": "w" } }));
    }

    #[test]
    fn set_value_with_empty_path_is_noop() {
        let mut d = doc(json!({ "a": 1 }));
        set_value_at(&mut d, &[], json!(2));
        assert_eq!(Value::Object(d), json!({ "a": 1 }));
    }

    #[test]
    fn get_value_walks_objects_only() {
        let d = doc(json!({ "a": { "b": [ { "c": 1 } ] } }));
        assert_eq!(get_value_at(&d, &["a", "b"]), Some(&json!([{ "c": 1 }])));
        assert_eq!(get_value_at(&d, &["a", "b", "c"]), None);
        assert_eq!(get_value_at(&d, &[]), None);
    }

    #[test]
    fn fallback_list_edits() {
        let mut d = doc(json!({
            "agents": { "defaults": { "model": { "primary": "p", "fallbacks": ["a", "b"] } } }
        }));

        add_fallback_model(&mut d, "c");
        assert_eq!(fallback_list(&d), vec![json!("a"), json!("b"), json!("c")]);

        let removed = remove_fallback_model(&mut d, 0).unwrap();
        assert_eq!(removed, json!("a"));
        assert_eq!(fallback_list(&d), vec![json!("b"), json!("c")]);

        let previous = replace_fallback_model(&mut d, 1, "d").unwrap();
        assert_eq!(previous, json!("c"));
        assert_eq!(fallback_list(&d), vec![json!("b"), json!("d")]);
    }

    #[test]
    fn fallback_index_out_of_range_is_rejected() {
        let mut d = doc(json!({
            "agents": { "defaults": { "model": { "primary": "p", "fallbacks": ["a"] } } }
        }));
        assert!(matches!(
            remove_fallback_model(&mut d, 1),
            Err(Error::InvalidEdit(_))
        ));
        assert!(matches!(
            replace_fallback_model(&mut d, 3, "x"),
            Err(Error::InvalidEdit(_))
        ));
        assert_eq!(fallback_list(&d), vec![json!("a")]);
    }

    #[test]
    fn add_fallback_to_missing_list_creates_it() {
        let mut d = doc(json!({}));
        add_fallback_model(&mut d, "groq/llama-3.3-70b-versatile");
        assert_eq!(
            d["agents"]["defaults"]["model"]["fallbacks"],
            json!(["groq/llama-3.3-70b-versatile"])
        );
    }

    #[test]
    fn duplicate_fallbacks_are_allowed() {
        let mut d = doc(json!({}));
        set_fallback_models(&mut d, &["a".to_string(), "a".to_string()]);
        assert_eq!(fallback_list(&d), vec![json!("a"), json!("a")]);
    }

    #[test]
    fn temp_sibling_stays_in_same_directory() {
        let tmp = temp_sibling(Path::new("/home/u/.openclaw/openclaw.json"));
        assert_eq!(tmp.parent(), Some(Path::new("/home/u/.openclaw")));
        assert!(tmp.file_name().unwrap().to_string_lossy().starts_with(".openclaw.json."));
    }
}
