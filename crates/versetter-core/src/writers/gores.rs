//! Nested JSON key-path patching (`gores`).
//!
//! Built for `go-winres` manifests, where the version appears in several
//! places (`RT_MANIFEST/#1/0409/identity/version`, `RT_VERSION/#1/0000/fixed/
//! file_version`, ...). The property lists every location as slash-separated
//! key paths joined by commas.
//!
//! A path that cannot be resolved is reported and skipped; the remaining
//! paths are still applied and the document is written.

use std::fmt;

use camino::Utf8Path;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::{WriteError, WriteResult, read_target, require_target, write_target};
use crate::record::VersionRecord;

/// A slash-separated path of object keys, e.g. `RT_VERSION/#1/0000/fixed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Split `a/b/c` into its keys.
    pub fn parse(path: &str) -> Self {
        Self(path.split('/').map(str::to_owned).collect())
    }

    /// The keys from root to leaf.
    pub fn keys(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Parse a comma-separated list of key paths.
pub fn parse_paths(property: &str) -> Vec<KeyPath> {
    property.split(',').map(KeyPath::parse).collect()
}

/// Why a single key path was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A key along the path does not exist.
    #[error("can't find key {key} for property {path}")]
    MissingKey {
        /// The key that was not found.
        key: String,
        /// The full path being resolved.
        path: String,
    },

    /// An intermediate key holds something other than an object.
    #[error("key {key} for property {path} is not an object")]
    NotAnObject {
        /// The offending key.
        key: String,
        /// The full path being resolved.
        path: String,
    },
}

/// Set the leaf of `path` to `version`, if every key along it exists.
fn set_path(root: &mut Map<String, Value>, path: &KeyPath, version: &str) -> Result<(), PathError> {
    let missing = |key: &str| PathError::MissingKey {
        key: key.to_owned(),
        path: path.to_string(),
    };

    let Some((leaf, parents)) = path.keys().split_last() else {
        return Err(missing(""));
    };

    let mut node = root;
    for key in parents {
        node = match node.get_mut(key) {
            Some(Value::Object(child)) => child,
            Some(_) => {
                return Err(PathError::NotAnObject {
                    key: key.clone(),
                    path: path.to_string(),
                });
            }
            None => return Err(missing(key)),
        };
    }

    let slot = node.get_mut(leaf).ok_or_else(|| missing(leaf))?;
    *slot = Value::String(version.to_owned());
    Ok(())
}

/// Apply every path to `root`, returning the ones that were skipped.
pub fn patch_paths(
    root: &mut Map<String, Value>,
    paths: &[KeyPath],
    version: &str,
) -> Vec<PathError> {
    paths
        .iter()
        .filter_map(|path| set_path(root, path, version).err())
        .collect()
}

/// Patch a JSON document, returning the new text and any skipped paths.
///
/// # Errors
///
/// Fails if `content` is not a JSON object.
pub fn patch(
    content: &str,
    paths: &[KeyPath],
    version: &str,
) -> WriteResult<(String, Vec<PathError>)> {
    let Value::Object(mut root) = serde_json::from_str::<Value>(content)? else {
        return Err(WriteError::NotAnObject);
    };
    let skipped = patch_paths(&mut root, paths, version);
    let text = serde_json::to_string(&Value::Object(root))?;
    Ok((text, skipped))
}

/// Set the full version at every key path in the JSON file at `path`.
///
/// # Errors
///
/// Fails if the file is missing, unreadable, not a JSON object, or cannot be
/// written. Unresolvable key paths are logged, not returned.
#[instrument(skip(record, paths), fields(version = %record, paths = paths.len()))]
pub fn write(record: &VersionRecord, paths: &[KeyPath], path: &Utf8Path) -> WriteResult<()> {
    require_target(path)?;
    let content = read_target(path)?;

    let (patched, skipped) = patch(&content, paths, &record.semantic_string())?;
    for err in &skipped {
        warn!(error = %err, "skipping key path");
    }

    write_target(path, patched)?;
    debug!(
        applied = paths.len() - skipped.len(),
        skipped = skipped.len(),
        "json key paths rewritten"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    const WINRES: &str = r##"{"RT_GROUP_ICON":{"APP":{"0000":"icon.png"}},"RT_MANIFEST":{"#1":{"0409":{"identity":{"name":"app","version":"0.0.0.0"}}}},"RT_VERSION":{"#1":{"0000":{"fixed":{"file_version":"0.0.0.0","product_version":"0.0.0.0"}}}}}"##;

    #[test]
    fn parses_comma_and_slash_separated_paths() {
        let paths = parse_paths("a/b/c,x/y");
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].keys(), ["a", "b", "c"]);
        assert_eq!(paths[1].to_string(), "x/y");
    }

    #[test]
    fn patches_every_path() {
        let paths = parse_paths(
            "RT_MANIFEST/#1/0409/identity/version,RT_VERSION/#1/0000/fixed/file_version",
        );
        let (out, skipped) = patch(WINRES, &paths, "1.2.0-rc.1").unwrap();
        assert!(skipped.is_empty());

        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            doc["RT_MANIFEST"]["#1"]["0409"]["identity"]["version"],
            "1.2.0-rc.1"
        );
        assert_eq!(
            doc["RT_VERSION"]["#1"]["0000"]["fixed"]["file_version"],
            "1.2.0-rc.1"
        );
        assert_eq!(
            doc["RT_VERSION"]["#1"]["0000"]["fixed"]["product_version"],
            "0.0.0.0"
        );
    }

    #[test]
    fn preserves_key_order() {
        let (out, _) = patch(r#"{"z":1,"a":{"v":"0"},"m":2}"#, &parse_paths("a/v"), "1.0.0")
            .unwrap();
        assert_eq!(out, r#"{"z":1,"a":{"v":"1.0.0"},"m":2}"#);
    }

    #[test]
    fn missing_intermediate_key_skips_only_that_path() {
        let paths = parse_paths("nope/version,a/v");
        let (out, skipped) = patch(r#"{"a":{"v":"0"}}"#, &paths, "2.0.0").unwrap();
        assert_eq!(
            skipped,
            vec![PathError::MissingKey {
                key: "nope".into(),
                path: "nope/version".into(),
            }]
        );
        assert_eq!(out, r#"{"a":{"v":"2.0.0"}}"#);
    }

    #[test]
    fn missing_leaf_is_not_created() {
        let (out, skipped) = patch(r#"{"a":{}}"#, &parse_paths("a/v"), "2.0.0").unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(out, r#"{"a":{}}"#);
    }

    #[test]
    fn scalar_intermediate_is_reported() {
        let (_, skipped) = patch(r#"{"a":"flat"}"#, &parse_paths("a/v"), "2.0.0").unwrap();
        assert!(matches!(skipped[0], PathError::NotAnObject { .. }));
    }

    #[test]
    fn top_level_key_can_be_patched() {
        let (out, _) = patch(r#"{"version":"0"}"#, &parse_paths("version"), "1.0.0").unwrap();
        assert_eq!(out, r#"{"version":"1.0.0"}"#);
    }

    #[test]
    fn non_object_document_fails() {
        assert!(matches!(
            patch("[1,2]", &parse_paths("a"), "1.0.0"),
            Err(WriteError::NotAnObject)
        ));
        assert!(matches!(
            patch("{not json", &parse_paths("a"), "1.0.0"),
            Err(WriteError::Json(_))
        ));
    }

    #[test]
    fn write_requires_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("winres.json")).unwrap();
        let err = write(&VersionRecord::new(1, 0, 0), &parse_paths("a"), &path).unwrap_err();
        assert!(matches!(err, WriteError::TargetNotFound(_)));
        assert!(!path.exists());
    }

    #[test]
    fn write_invalid_json_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("winres.json")).unwrap();
        std::fs::write(&path, "{ broken").unwrap();

        let err = write(&VersionRecord::new(1, 0, 0), &parse_paths("a"), &path).unwrap_err();
        assert!(matches!(err, WriteError::Json(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ broken");
    }

    #[test]
    fn write_uses_full_version() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("winres.json")).unwrap();
        std::fs::write(&path, WINRES).unwrap();

        let record = VersionRecord::new(2, 3, 4).with_prerelease("beta");
        write(
            &record,
            &parse_paths("RT_MANIFEST/#1/0409/identity/version"),
            &path,
        )
        .unwrap();

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            doc["RT_MANIFEST"]["#1"]["0409"]["identity"]["version"],
            "2.3.4-beta"
        );
    }
}
