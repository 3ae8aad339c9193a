//! Hierarchical configuration loading with `_base_` inheritance.
//!
//! A config file may inherit from one or more base files and override
//! individual values:
//!
//! ```yaml
//! _base_: [../models/resnet50.yaml, ../schedules/1x.yaml]
//! model:
//!   backbone:
//!     depth: 101
//!   head:
//!     num_classes: {{ _base_.num_classes }}
//! work_dir: ./runs/{{ fileBasenameNoExtension }}
//! ```
//!
//! # Key Features
//!
//! - **Inheritance**: bases are loaded recursively and merged under the child;
//!   sibling bases may not define the same top-level key
//! - **Explicit merge semantics**: mappings merge recursively, sequences and
//!   scalars replace, `_delete_: true` replaces a whole mapping
//! - **Placeholders**: `{{ fileDirname }}` and friends are filled from the file
//!   path; `{{ _base_.dotted.path }}` pulls typed values from the bases
//! - **Formats**: JSON, YAML and TOML, loaded through a [`DocumentLoader`]
//!
//! # Example
//!
//! ```rust,no_run
//! use basis_config::{ConfigDocument, LoadOptions};
//!
//! let cfg = ConfigDocument::from_file("configs/exp.yaml", &LoadOptions::default())?;
//! let depth = cfg.get_path("model.backbone.depth").and_then(|v| v.as_i64());
//! println!("{}", cfg.pretty_text());
//! # Ok::<(), basis_config::ConfigError>(())
//! ```

mod base_vars;
mod document;
mod dump;
mod flatten;
mod loader;
mod merge;
mod overrides;
mod predefined;
mod pretty;
mod resolver;
mod runtime;
mod types;
mod yaml;

pub use types::{
    BASE_KEY,
    ConfigError,
    ConfigMap,
    ConfigResult,
    ConfigValue,
    DELETE_KEY,
    DEPRECATION_KEY,
    RESERVED_KEYS,
    Scalar,
};

pub use base_vars::{
    PlaceholderMap,
    extract_base_vars,
    substitute_base_vars,
    substitute_base_vars_in_map,
};

pub use predefined::{PredefinedVars, substitute_predefined_vars};

pub use loader::{
    BuiltinLoader,
    DocumentLoader,
    FileFormat,
    config_value_from_json,
    config_value_from_toml,
};

pub use runtime::{MemoryReader, NativeReader, SourceReader, absolute_path, normalize_path};

pub use merge::{merge_a_into_b, merge_maps};

pub use resolver::{DeprecationNotice, LoadOptions, LoadedConfig, Loader, check_reserved_keys};

pub use document::{ConfigDocument, MEMORY_DIR};

pub use overrides::{apply_overrides, expand_dotted_keys, parse_override, parse_overrides};

pub use dump::{DumpFormat, dump, dump_to_file};

pub use flatten::{ArgKind, FlatKey, flatten};

pub use pretty::{format_value, pretty_text};

pub use yaml::parse_yaml;
