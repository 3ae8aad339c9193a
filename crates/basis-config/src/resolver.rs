//! The loading pipeline: read a config file, substitute placeholders, load it,
//! resolve its `_base_` chain and merge the result.
//!
//! ```rust,ignore
//! use basis_config::{LoadOptions, Loader};
//!
//! let loaded = Loader::new(LoadOptions::default()).load("configs/exp.yaml")?;
//! println!("{}", loaded.text);
//! ```
//!
//! Each file goes through the same steps, and base files recurse into them:
//!
//! 1. predefined variables (`{{ fileDirname }}`, ...) are substituted
//! 2. `{{ _base_.path }}` placeholders are swapped for opaque tokens
//! 3. the text is parsed by the [`DocumentLoader`]
//! 4. `_deprecation_` is popped and reported
//! 5. bases named by `_base_` are loaded, checked for duplicate keys and
//!    combined; tokens are then replaced by base values and the child is
//!    merged over the combined base

use crate::base_vars::{extract_base_vars, substitute_base_vars_in_map};
use crate::loader::{BuiltinLoader, DocumentLoader, FileFormat};
use crate::merge::merge_maps;
use crate::predefined::substitute_predefined_vars;
use crate::pretty::format_value;
use crate::runtime::{NativeReader, SourceReader, normalize_path};
use crate::types::{
    BASE_KEY, ConfigError, ConfigMap, ConfigResult, ConfigValue, DEPRECATION_KEY, RESERVED_KEYS,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Options for loading a config file.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Substitute `{{ fileDirname }}` and friends before parsing (default: true).
    ///
    /// Applies to base files as well.
    pub use_predefined_variables: bool,

    /// Maximum length of a `_base_` chain (default: 64).
    ///
    /// Loading fails with `ConfigError::BaseDepthExceeded` beyond this depth.
    pub max_base_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_predefined_variables: true,
            max_base_depth: 64,
        }
    }
}

/// A `_deprecation_` entry found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationNotice {
    /// The deprecated config file.
    pub path: PathBuf,
    /// The config to use instead.
    pub expected: Option<String>,
    /// Where to find more information.
    pub reference: Option<String>,
}

impl DeprecationNotice {
    fn from_value(path: &Path, value: &ConfigValue) -> Self {
        let field = |name: &str| {
            value.as_map().and_then(|m| m.get(name)).map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => format_value(v),
            })
        };
        Self {
            path: path.to_path_buf(),
            expected: field("expected"),
            reference: field("reference"),
        }
    }
}

impl fmt::Display for DeprecationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The config file {} will be deprecated in the future.",
            self.path.display()
        )?;
        if let Some(expected) = &self.expected {
            write!(f, " Please use {} instead.", expected)?;
        }
        if let Some(reference) = &self.reference {
            write!(f, " More information can be found at {}", reference)?;
        }
        Ok(())
    }
}

/// Result of loading a config file and its bases.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    /// The merged mapping.
    pub map: ConfigMap,
    /// Source texts of the bases and the file itself, each prefixed by its path.
    pub text: String,
    /// Deprecation notices, in load order.
    pub deprecations: Vec<DeprecationNotice>,
}

/// Loads config files through a [`SourceReader`] and a [`DocumentLoader`].
#[derive(Debug, Clone)]
pub struct Loader<R = NativeReader, L = BuiltinLoader> {
    reader: R,
    loader: L,
    options: LoadOptions,
}

impl Loader {
    /// A loader reading from disk with the built-in formats.
    pub fn new(options: LoadOptions) -> Self {
        Self::with_collaborators(NativeReader::new(), BuiltinLoader, options)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

/// State threaded through one load.
#[derive(Default)]
struct Resolution {
    /// Files currently being loaded, outermost first.
    stack: Vec<PathBuf>,
    deprecations: Vec<DeprecationNotice>,
}

impl<R: SourceReader, L: DocumentLoader> Loader<R, L> {
    pub fn with_collaborators(reader: R, loader: L, options: LoadOptions) -> Self {
        Self {
            reader,
            loader,
            options,
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Load `path` and everything it inherits from.
    ///
    /// # Errors
    ///
    /// Any error from any file in the chain aborts the whole load.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<LoadedConfig> {
        let path = path.as_ref();
        let path = self.reader.absolute(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut resolution = Resolution::default();
        let (map, text) = self.load_file(&path, &mut resolution)?;

        Ok(LoadedConfig {
            map,
            text,
            deprecations: resolution.deprecations,
        })
    }

    fn load_file(
        &self,
        path: &Path,
        resolution: &mut Resolution,
    ) -> ConfigResult<(ConfigMap, String)> {
        if resolution.stack.iter().any(|p| p == path) {
            let mut chain = resolution.stack.clone();
            chain.push(path.to_path_buf());
            return Err(ConfigError::CircularBase { chain });
        }
        if resolution.stack.len() > self.options.max_base_depth {
            return Err(ConfigError::BaseDepthExceeded {
                max_depth: self.options.max_base_depth,
                path: path.to_path_buf(),
            });
        }
        if !self.reader.is_file(path) {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let format = FileFormat::from_path(path)?;

        tracing::debug!(path = %path.display(), %format, "loading config");

        let source = self
            .reader
            .read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let substituted = if self.options.use_predefined_variables {
            substitute_predefined_vars(&source, path)
        } else {
            source.clone()
        };
        let (substituted, placeholders) = extract_base_vars(&substituted);

        let mut map = self.loader.load(&substituted, path, format)?;

        if let Some(info) = map.remove(DEPRECATION_KEY) {
            let notice = DeprecationNotice::from_value(path, &info);
            tracing::warn!("{}", notice);
            resolution.deprecations.push(notice);
        }

        check_reserved_keys(&map, Some(path))?;

        let text = format!("{}\n{}", path.display(), source);

        let Some(base_ref) = map.remove(BASE_KEY) else {
            let map = substitute_base_vars_in_map(&map, &placeholders, &ConfigMap::new())?;
            return Ok((map, text));
        };

        let base_paths = base_paths(path, &base_ref)?;

        resolution.stack.push(path.to_path_buf());
        let mut combined = ConfigMap::new();
        let mut texts = Vec::with_capacity(base_paths.len() + 1);
        for base_path in &base_paths {
            tracing::debug!(config = %path.display(), base = %base_path.display(), "resolving base config");

            let (base_map, base_text) = self.load_file(base_path, resolution)?;

            let mut duplicates: Vec<String> = base_map
                .keys()
                .filter(|k| combined.contains_key(k))
                .map(str::to_string)
                .collect();
            if !duplicates.is_empty() {
                duplicates.sort();
                return Err(ConfigError::DuplicateBaseKey {
                    path: base_path.clone(),
                    keys: duplicates,
                });
            }

            combined.extend(base_map);
            texts.push(base_text);
        }
        resolution.stack.pop();

        let child = substitute_base_vars_in_map(&map, &placeholders, &combined)?;
        let merged = merge_maps(&child, &combined, false)?;

        texts.push(text);
        Ok((merged, texts.join("\n")))
    }
}

/// Fail if `map` defines a name reserved for document accessors.
pub fn check_reserved_keys(map: &ConfigMap, path: Option<&Path>) -> ConfigResult<()> {
    match map.keys().find(|k| RESERVED_KEYS.contains(k)) {
        Some(key) => Err(ConfigError::ReservedKey {
            key: key.to_string(),
            path: path.map(Path::to_path_buf),
        }),
        None => Ok(()),
    }
}

/// Resolve a `_base_` value to absolute base paths.
fn base_paths(path: &Path, base_ref: &ConfigValue) -> ConfigResult<Vec<PathBuf>> {
    let invalid = |found: &'static str| ConfigError::InvalidBaseReference {
        path: path.to_path_buf(),
        found,
    };

    let entries: Vec<&str> = match base_ref {
        ConfigValue::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(|| invalid(item.type_name())))
            .collect::<ConfigResult<_>>()?,
        other => vec![other.as_str().ok_or_else(|| invalid(other.type_name()))?],
    };

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(entries
        .into_iter()
        .map(|entry| normalize_path(&dir.join(entry)))
        .collect())
}
