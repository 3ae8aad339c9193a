//! The loaded configuration document.

use crate::dump::{DumpFormat, dump, dump_to_file};
use crate::flatten::{FlatKey, flatten};
use crate::loader::{BuiltinLoader, FileFormat};
use crate::overrides::apply_overrides;
use crate::pretty::pretty_text;
use crate::resolver::{DeprecationNotice, LoadOptions, Loader, check_reserved_keys};
use crate::runtime::{MemoryReader, NativeReader, SourceReader};
use crate::types::{ConfigError, ConfigMap, ConfigResult, ConfigValue};
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory of the synthetic path used for in-memory documents.
pub const MEMORY_DIR: &str = "<memory>";

/// A fully resolved config: the merged mapping plus its provenance.
///
/// Top-level values are reachable both attribute-style ([`attr`](Self::attr))
/// and key-style ([`item`](Self::item)); the two fail with different errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    map: ConfigMap,
    filename: Option<PathBuf>,
    text: String,
    deprecations: Vec<DeprecationNotice>,
}

impl ConfigDocument {
    /// Build a document from an already merged mapping.
    ///
    /// Without `text`, the text is read from `filename` when given, and is
    /// empty otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReservedKey`] if the mapping uses `filename`,
    /// `text` or `pretty_text` as a top-level key.
    pub fn new(
        map: ConfigMap,
        text: Option<String>,
        filename: Option<PathBuf>,
    ) -> ConfigResult<Self> {
        check_reserved_keys(&map, None)?;

        let text = match (text, &filename) {
            (Some(text), _) => text,
            (None, Some(path)) => {
                NativeReader::new()
                    .read_to_string(path)
                    .map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?
            }
            (None, None) => String::new(),
        };

        Ok(Self {
            map,
            filename,
            text,
            deprecations: Vec::new(),
        })
    }

    /// Load a config file and everything it inherits from.
    pub fn from_file(path: impl AsRef<Path>, options: &LoadOptions) -> ConfigResult<Self> {
        let path = path.as_ref();
        let loaded = Loader::new(options.clone()).load(path)?;
        Ok(Self {
            map: loaded.map,
            filename: Some(path.to_path_buf()),
            text: loaded.text,
            deprecations: loaded.deprecations,
        })
    }

    /// Load config text held in memory.
    ///
    /// The text is treated as the file `<memory>/config.<ext>`; relative
    /// `_base_` references can therefore not reach the filesystem.
    pub fn from_str(text: &str, format: FileFormat) -> ConfigResult<Self> {
        let path = PathBuf::from(MEMORY_DIR).join(format!("config{}", format.extension()));
        let reader = MemoryReader::new().with_file(&path, text);
        let loaded = Loader::with_collaborators(reader, BuiltinLoader, LoadOptions::default())
            .load(&path)?;
        Ok(Self {
            map: loaded.map,
            filename: Some(path),
            text: loaded.text,
            deprecations: loaded.deprecations,
        })
    }

    /// Attribute-style access to a top-level value.
    pub fn attr(&self, name: &str) -> ConfigResult<&ConfigValue> {
        self.map
            .get(name)
            .ok_or_else(|| ConfigError::NoSuchAttribute {
                type_name: "ConfigDocument",
                name: name.to_string(),
            })
    }

    /// Key-style access to a top-level value.
    pub fn item(&self, key: &str) -> ConfigResult<&ConfigValue> {
        self.map.item(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.map.get(key)
    }

    /// Look up a dotted path such as `model.backbone.depth`.
    pub fn get_path(&self, dotted: &str) -> Option<&ConfigValue> {
        self.map.get_path(dotted)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.map.iter()
    }

    pub fn as_map(&self) -> &ConfigMap {
        &self.map
    }

    pub fn into_map(self) -> ConfigMap {
        self.map
    }

    /// The path the document was loaded from, as given.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Source texts of the file and its bases, each prefixed by its path.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pretty_text(&self) -> String {
        pretty_text(&self.map)
    }

    pub fn deprecations(&self) -> &[DeprecationNotice] {
        &self.deprecations
    }

    /// Apply dotted-key overrides and return the resulting document.
    ///
    /// Numeric segments index into arrays: `layers.0.size`.
    pub fn merge_from_dict(&self, options: &ConfigMap) -> ConfigResult<Self> {
        let map = apply_overrides(&self.map, options)?;
        check_reserved_keys(&map, None)?;
        Ok(Self {
            map,
            ..self.clone()
        })
    }

    pub fn flatten(&self) -> Vec<FlatKey<'_>> {
        flatten(&self.map)
    }

    pub fn dump(&self, format: DumpFormat) -> ConfigResult<String> {
        dump(&self.map, format)
    }

    pub fn dump_to_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        dump_to_file(&self.map, path.as_ref())
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filename = match &self.filename {
            Some(path) => path.display().to_string(),
            None => "None".to_string(),
        };
        let body = serde_json::to_string(&self.map).map_err(|_| fmt::Error)?;
        write!(f, "Config (path: {}): {}", filename, body)
    }
}

impl<'a> IntoIterator for &'a ConfigDocument {
    type Item = (&'a str, &'a ConfigValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a ConfigValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.map.iter())
    }
}
