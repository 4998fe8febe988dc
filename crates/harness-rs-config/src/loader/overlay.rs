//! Overlay documents: bundled registry, file reads, and decoding.

use super::utils;
use crate::ConfigError;
use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// One overlay document packaged into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundledOverlay {
    pub name: &'static str,
    pub contents: &'static str,
}

/// Fixed namespace of packaged overlay documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledOverlays {
    entries: &'static [BundledOverlay],
}

impl BundledOverlays {
    pub const fn new(entries: &'static [BundledOverlay]) -> Self {
        Self { entries }
    }

    /// Registry with no overlays.
    pub const fn empty() -> Self {
        Self { entries: &[] }
    }

    /// Document registered under `name`.
    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.contents)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }
}

/// Where an overlay document comes from.
#[derive(Debug, Clone, Copy)]
pub enum OverlaySource<'a> {
    /// Look the name up in a bundled registry.
    Bundled(&'a BundledOverlays),
    /// Treat the name as a path relative to this working directory.
    File { cwd: &'a Path },
}

/// Resolve an overlay to its raw bytes.
pub fn load(name: &str, source: OverlaySource<'_>) -> Result<Vec<u8>, ConfigError> {
    match source {
        OverlaySource::Bundled(bundled) => {
            debug!("loading bundled overlay (name={name})");
            bundled
                .get(name)
                .map(|contents| contents.as_bytes().to_vec())
                .ok_or_else(|| ConfigError::OverlayNotFound {
                    name: name.to_string(),
                })
        }
        OverlaySource::File { cwd } => {
            let path = resolve_overlay_path(cwd, Path::new(name));
            debug!("loading overlay file (path={})", path.display());
            fs::read(&path).map_err(|source| ConfigError::OverlayRead { path, source })
        }
    }
}

/// Absolute path of a custom overlay relative to `cwd`.
pub(super) fn resolve_overlay_path(cwd: &Path, name: &Path) -> PathBuf {
    utils::clean_path(&cwd.join(name))
}

/// Parse an overlay document into a JSON value tree.
///
/// Empty documents parse to `Null`, which merges as a no-op. A document
/// whose root is not a mapping is rejected as unparseable.
pub(super) fn parse(label: &str, bytes: &[u8]) -> Result<Value, ConfigError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    let document: Option<Map<String, Value>> =
        serde_yaml::from_slice(bytes).map_err(|source| ConfigError::OverlayParse {
            overlay: label.to_string(),
            source,
        })?;
    Ok(document.map_or(Value::Null, Value::Object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    static ENTRIES: &[BundledOverlay] = &[
        BundledOverlay {
            name: "first",
            contents: "name: first\n",
        },
        BundledOverlay {
            name: "second",
            contents: "name: second\n",
        },
    ];

    #[test]
    fn bundled_lookup_and_names() {
        let bundled = BundledOverlays::new(ENTRIES);
        assert_eq!(bundled.names().collect::<Vec<_>>(), vec!["first", "second"]);
        let bytes = load("second", OverlaySource::Bundled(&bundled)).expect("load");
        assert_eq!(bytes, b"name: second\n".to_vec());
    }

    #[test]
    fn missing_bundled_overlay_names_it() {
        let bundled = BundledOverlays::new(ENTRIES);
        let err = load("third", OverlaySource::Bundled(&bundled)).unwrap_err();
        assert!(matches!(err, ConfigError::OverlayNotFound { ref name } if name == "third"));
        assert!(format!("{err}").contains("third"));
    }

    #[test]
    fn file_overlay_reads_relative_to_cwd() {
        let temp = tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("overlays")).expect("dir");
        fs::write(temp.path().join("overlays/custom.yaml"), "dryRun: true\n").expect("write");
        let bytes = load(
            "overlays/custom.yaml",
            OverlaySource::File { cwd: temp.path() },
        )
        .expect("load");
        assert_eq!(bytes, b"dryRun: true\n".to_vec());
    }

    #[test]
    fn missing_file_overlay_reports_resolved_path() {
        let temp = tempdir().expect("tempdir");
        let err = load("./nope/../missing.yaml", OverlaySource::File { cwd: temp.path() })
            .unwrap_err();
        match err {
            ConfigError::OverlayRead { path, .. } => {
                assert_eq!(path, utils::clean_path(&temp.path().join("missing.yaml")));
                assert!(path.is_absolute());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_accepts_empty_and_rejects_scalars() {
        assert_eq!(parse("empty", b"").expect("empty"), Value::Null);
        assert_eq!(parse("tilde", b"~\n").expect("null document"), Value::Null);
        let err = parse("broken", b"key: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::OverlayParse { .. }));
    }

    #[test]
    fn non_mapping_documents_are_parse_errors() {
        for (label, bytes) in [
            ("scalar", &b"just a string"[..]),
            ("number", &b"42\n"[..]),
            ("sequence", &b"- a\n- b\n"[..]),
        ] {
            let err = parse(label, bytes).unwrap_err();
            match err {
                ConfigError::OverlayParse { ref overlay, .. } => assert_eq!(overlay, label),
                other => panic!("unexpected error for {label}: {other}"),
            }
        }
    }

    #[test]
    fn resolve_overlay_path_is_lexically_clean() {
        let cwd = PathBuf::from("/work/run");
        assert_eq!(
            resolve_overlay_path(&cwd, Path::new("./configs/../custom.yaml")),
            PathBuf::from("/work/run/custom.yaml")
        );
    }
}
