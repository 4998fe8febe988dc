//! Layered configuration resolution.
//!
//! Populates a [`Schema`] in four ordered passes: descriptor defaults,
//! bundled overlays, an optional custom overlay file, then environment
//! variables. Later passes override earlier ones.

mod merge;
mod overlay;
mod schema;
mod utils;


pub use overlay::{BundledOverlay, BundledOverlays, OverlaySource, load};

use crate::descriptor::{FieldRef, Leaf, LeafVisitor, walk_fields};
use crate::transform::{self, TEMP_DIR_PREFIX, Transform};
use crate::{ConfigError, Environment, ProcessEnvironment, Schema};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::path::{Path, PathBuf};

/// One of the ordered resolution passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Descriptor default literals.
    Defaults,
    /// Named overlays packaged with the binary.
    BundledOverlay,
    /// Caller-supplied overlay file.
    CustomOverlay,
    /// Process environment variables.
    Environment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Defaults => "defaults",
            Stage::BundledOverlay => "from bundled overlay",
            Stage::CustomOverlay => "from custom overlay",
            Stage::Environment => "from environment",
        };
        f.write_str(name)
    }
}

/// Resolves configuration structures from defaults, overlays and environment.
///
/// Owns the collaborators a resolution needs: the bundled overlay registry,
/// the environment source, and the random generator used by `__RND_<n>__`.
pub struct Resolver {
    bundled: BundledOverlays,
    environment: Box<dyn Environment>,
    rng: StdRng,
    temp_root: Option<PathBuf>,
    cwd: Option<PathBuf>,
}

impl Resolver {
    /// Resolver over the process environment with an OS-seeded generator.
    pub fn new(bundled: BundledOverlays) -> Self {
        Self {
            bundled,
            environment: Box::new(ProcessEnvironment),
            rng: StdRng::from_os_rng(),
            temp_root: None,
            cwd: None,
        }
    }

    /// Read environment variables from `environment` instead of the process.
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Box::new(environment);
        self
    }

    /// Use a deterministic generator seeded with `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Allocate `__TMP_DIR__` directories under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl AsRef<Path>) -> Self {
        self.temp_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Resolve custom overlay paths against `cwd` instead of the process working directory.
    pub fn with_cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Bundled overlay registry used by this resolver.
    pub fn bundled(&self) -> &BundledOverlays {
        &self.bundled
    }

    /// Populate `target` from all sources.
    ///
    /// Order: defaults, each bundled overlay in the given order, the custom
    /// overlay when `custom_overlay` is a non-empty path, then environment.
    /// The first failure aborts; `target` may be partially updated.
    pub fn resolve<S, N>(
        &mut self,
        target: &mut S,
        bundled_overlays: &[N],
        custom_overlay: Option<&Path>,
    ) -> Result<(), ConfigError>
    where
        S: Schema,
        N: AsRef<str>,
    {
        info!(
            "resolving config (overlays={}, custom={})",
            bundled_overlays.len(),
            custom_overlay.is_some()
        );

        self.apply_fields(target, Stage::Defaults)
            .map_err(|err| err.in_stage(Stage::Defaults))?;

        for name in bundled_overlays {
            let name = name.as_ref();
            self.apply_bundled(target, name)
                .map_err(|err| err.in_stage(Stage::BundledOverlay))?;
        }

        if let Some(path) = custom_overlay.filter(|path| !path.as_os_str().is_empty()) {
            info!("custom overlay provided, loading from {}", path.display());
            self.apply_custom(target, path)
                .map_err(|err| err.in_stage(Stage::CustomOverlay))?;
        }

        self.apply_fields(target, Stage::Environment)
            .map_err(|err| err.in_stage(Stage::Environment))?;

        info!("config resolved");
        Ok(())
    }

    /// Run the default or environment pass over every leaf of `target`.
    fn apply_fields<S: Schema>(&mut self, target: &mut S, stage: Stage) -> Result<(), ConfigError> {
        let mut assign = Assign {
            stage,
            environment: self.environment.as_ref(),
            rng: &mut self.rng,
            temp_root: self.temp_root.as_deref(),
        };
        walk_fields(target, "", &mut assign)
    }

    fn apply_bundled<S: Schema>(&self, target: &mut S, name: &str) -> Result<(), ConfigError> {
        let bytes = load(name, OverlaySource::Bundled(&self.bundled))?;
        merge_overlay(target, name, &bytes)?;
        debug!("applied bundled overlay {name}");
        Ok(())
    }

    fn apply_custom<S: Schema>(&self, target: &mut S, path: &Path) -> Result<(), ConfigError> {
        let cwd = utils::working_dir(self.cwd.as_deref())?;
        let resolved = overlay::resolve_overlay_path(&cwd, path);
        let label = resolved.display().to_string();
        let bytes = load(&path.to_string_lossy(), OverlaySource::File { cwd: &cwd })?;
        merge_overlay(target, &label, &bytes)?;
        debug!("applied custom overlay {label}");
        Ok(())
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("bundled", &self.bundled)
            .field("temp_root", &self.temp_root)
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

/// Resolve `target` with a fresh [`Resolver`] over the process environment.
pub fn resolve<S, N>(
    target: &mut S,
    bundled: BundledOverlays,
    bundled_overlays: &[N],
    custom_overlay: Option<&Path>,
) -> Result<(), ConfigError>
where
    S: Schema,
    N: AsRef<str>,
{
    Resolver::new(bundled).resolve(target, bundled_overlays, custom_overlay)
}

/// Structurally merge an overlay document into `target`.
///
/// Only keys present in the document overwrite fields.
fn merge_overlay<S: Schema>(target: &mut S, label: &str, bytes: &[u8]) -> Result<(), ConfigError> {
    let overlay = overlay::parse(label, bytes)?;
    if overlay.is_null() {
        debug!("overlay {label} is empty");
        return Ok(());
    }
    schema::warn_unknown_keys::<S>(&overlay, label);

    let decode_error = |source| ConfigError::OverlayDecode {
        overlay: label.to_string(),
        source,
    };
    let mut merged = serde_json::to_value(&*target).map_err(decode_error)?;
    if !merged.is_object() {
        return Err(ConfigError::Schema(
            "config target must serialize to a mapping".to_string(),
        ));
    }
    merge::merge_json_values(&mut merged, &overlay);
    *target = serde_json::from_value::<S>(merged).map_err(decode_error)?;
    Ok(())
}

/// Leaf visitor that assigns default or environment values.
struct Assign<'r> {
    stage: Stage,
    environment: &'r dyn Environment,
    rng: &'r mut StdRng,
    temp_root: Option<&'r Path>,
}

impl LeafVisitor for Assign<'_> {
    fn visit(&mut self, leaf: Leaf<'_>) -> Result<(), ConfigError> {
        let raw = match self.stage {
            Stage::Defaults => match leaf.default {
                Some(value) => value.to_string(),
                None => return Ok(()),
            },
            Stage::Environment => {
                let Some(name) = leaf.env else {
                    return Ok(());
                };
                match self.environment.get(name) {
                    Some(value) if !value.is_empty() => {
                        debug!("environment override for {} from {name}", leaf.path);
                        value
                    }
                    _ => return Ok(()),
                }
            }
            stage => {
                return Err(ConfigError::Schema(format!(
                    "field values are not assigned {stage}"
                )));
            }
        };
        self.assign(&leaf.path, leaf.value, &raw)
    }
}

impl Assign<'_> {
    fn assign(&mut self, path: &str, slot: FieldRef<'_>, raw: &str) -> Result<(), ConfigError> {
        match slot {
            FieldRef::String(slot) => *slot = self.transform(path, raw)?,
            FieldRef::Bool(slot) => {
                *slot = parse_bool(raw)
                    .ok_or_else(|| self.parse_error(path, format!("invalid boolean {raw:?}")))?;
            }
            FieldRef::Int32(slot) => {
                *slot = raw
                    .parse::<i32>()
                    .map_err(|err| self.parse_error(path, format!("{raw:?}: {err}")))?;
            }
            FieldRef::Int64(slot) => {
                *slot = raw
                    .parse::<i64>()
                    .map_err(|err| self.parse_error(path, format!("{raw:?}: {err}")))?;
            }
            FieldRef::StringList(slot) => *slot = split_list(raw),
        }
        Ok(())
    }

    /// Expand sentinel values; plain strings pass through.
    fn transform(&mut self, path: &str, raw: &str) -> Result<String, ConfigError> {
        let pending = Transform::detect(raw).map_err(|message| ConfigError::Transform {
            field: path.to_string(),
            message,
        })?;
        match pending {
            Transform::None => Ok(raw.to_string()),
            Transform::TempDir => {
                let dir = self.allocate_temp_dir(path)?;
                info!("generated temporary directory {dir} for field {path}");
                Ok(dir)
            }
            Transform::RandomString(length) => {
                let value = transform::random_string(&mut *self.rng, length);
                debug!("generated random string for field {path} (len={length})");
                Ok(value)
            }
        }
    }

    fn allocate_temp_dir(&self, path: &str) -> Result<String, ConfigError> {
        let transform_error = |message: String| ConfigError::Transform {
            field: path.to_string(),
            message,
        };
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let dir = match self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|err| transform_error(format!("failed to create temporary directory: {err}")))?;
        dir.keep().into_os_string().into_string().map_err(|dir| {
            transform_error(format!(
                "temporary directory {} is not valid unicode",
                dir.to_string_lossy()
            ))
        })
    }

    fn parse_error(&self, path: &str, message: String) -> ConfigError {
        ConfigError::FieldParse {
            field: path.to_string(),
            stage: self.stage,
            message,
        }
    }
}

/// Boolean literals accepted for default and environment values.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated value; an empty value is an empty list.
fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}
