//! Substitution of predefined, path-derived variables.
//!
//! Supports placeholders like:
//! - `{{ fileDirname }}` - Directory containing the config file
//! - `{{ fileBasename }}` - File name with extension
//! - `{{ fileBasenameNoExtension }}` - File name without extension
//! - `{{ fileExtname }}` - Extension including the leading dot
//!
//! Unknown tags are left untouched.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// The values of the predefined variables for one config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedVars {
    pub file_dirname: String,
    pub file_basename: String,
    pub file_basename_no_extension: String,
    pub file_extname: String,
}

impl PredefinedVars {
    /// Derive the variables from a config file path.
    ///
    /// Path separators are normalized to `/`.
    pub fn from_path(path: &Path) -> Self {
        let normalize = |s: &str| s.replace('\\', "/");
        let to_string = |s: Option<&std::ffi::OsStr>| {
            s.map(|s| normalize(&s.to_string_lossy()))
                .unwrap_or_default()
        };

        Self {
            file_dirname: path
                .parent()
                .map(|p| normalize(&p.to_string_lossy()))
                .unwrap_or_default(),
            file_basename: to_string(path.file_name()),
            file_basename_no_extension: to_string(path.file_stem()),
            file_extname: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        }
    }

    /// Resolve a tag name to its value.
    pub fn resolve(&self, tag: &str) -> Option<&str> {
        match tag {
            "fileDirname" => Some(&self.file_dirname),
            "fileBasename" => Some(&self.file_basename),
            "fileBasenameNoExtension" => Some(&self.file_basename_no_extension),
            "fileExtname" => Some(&self.file_extname),
            _ => None,
        }
    }

    /// Replace every recognized `{{ tag }}` in `text`.
    pub fn substitute(&self, text: &str) -> String {
        TAG_REGEX
            .replace_all(text, |caps: &Captures| match self.resolve(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Substitute the predefined variables derived from `path` into `text`.
pub fn substitute_predefined_vars(text: &str, path: &Path) -> String {
    PredefinedVars::from_path(path).substitute(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        let vars = PredefinedVars::from_path(Path::new("/work/configs/model.yaml"));
        assert_eq!(vars.file_dirname, "/work/configs");
        assert_eq!(vars.file_basename, "model.yaml");
        assert_eq!(vars.file_basename_no_extension, "model");
        assert_eq!(vars.file_extname, ".yaml");
    }

    #[test]
    fn test_no_extension() {
        let vars = PredefinedVars::from_path(Path::new("/work/config"));
        assert_eq!(vars.file_extname, "");
        assert_eq!(vars.file_basename_no_extension, "config");
    }

    #[test]
    fn test_substitute_whitespace_tolerant() {
        let text = "name: {{fileBasenameNoExtension}}\nwork_dir: ./runs/{{  fileBasenameNoExtension }}\next: '{{ fileExtname}}'";
        let out = substitute_predefined_vars(text, Path::new("/cfg/exp1.yaml"));
        assert_eq!(out, "name: exp1\nwork_dir: ./runs/exp1\next: '.yaml'");
    }

    #[test]
    fn test_unknown_tags_untouched() {
        let text = "a: {{ fileSize }}\nb: {{ _base_.lr }}";
        let out = substitute_predefined_vars(text, Path::new("/cfg/exp1.yaml"));
        assert_eq!(out, text);
    }

    #[test]
    fn test_no_placeholders_is_noop() {
        let text = "model:\n  depth: 50\n";
        assert_eq!(substitute_predefined_vars(text, Path::new("/cfg/a.yaml")), text);
    }

    #[test]
    fn test_value_inserted_literally() {
        let vars = PredefinedVars {
            file_dirname: "/tmp/$1".into(),
            file_basename: String::new(),
            file_basename_no_extension: String::new(),
            file_extname: String::new(),
        };
        assert_eq!(vars.substitute("dir: {{fileDirname}}"), "dir: /tmp/$1");
    }
}
