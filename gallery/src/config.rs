use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;

use nbsite::{err, error};
use nbsite::error::{Chainable, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the notebooks.
    pub notebooks: PathBuf,
    /// Directory the site is written to.
    pub output: PathBuf,
    pub templates: PathBuf,
    #[serde(rename = "static")]
    pub static_dir: PathBuf,
    /// Notebook file names to leave out of the site.
    pub ignore: Vec<String>,
    /// URL prefix of every generated link.
    pub root: String,
    /// Everything else: available to templates as `site`.
    #[serde(flatten)]
    pub globals: FxHashMap<String, toml::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            notebooks: ".".into(),
            output: "build".into(),
            templates: "templates".into(),
            static_dir: "static".into(),
            ignore: vec![],
            root: "/".into(),
            globals: FxHashMap::default(),
        }
    }
}

impl Settings {
    /// `config.toml`, or `config_<name>.toml` for a named configuration.
    pub fn file_name(name: Option<&str>) -> String {
        match name {
            Some(name) => format!("config_{name}.toml"),
            None => crate::CONFIG_FILE.into(),
        }
    }

    /// Reads the configuration `name` from the current directory.
    ///
    /// A missing `config.toml` means defaults; a missing named configuration
    /// is an error.
    pub fn load(name: Option<&str>) -> Result<Settings> {
        let path = PathBuf::from(Settings::file_name(name));
        match (path.exists(), name) {
            (true, _) => Settings::read(&path),
            (false, None) => {
                tracing::debug!("no {} found, using defaults", path.display());
                Ok(Settings::default())
            }
            (false, Some(name)) => err! {
                "configuration file not found",
                "configuration" => name,
                "expected path" => path.display(),
            },
        }
    }

    pub fn read(path: &Path) -> Result<Settings> {
        let string = std::fs::read_to_string(path).chain_with(|| error! {
            "failed to read configuration",
            "path" => path.display(),
        })?;

        Settings::parse(&string).chain_with(|| error! {
            "invalid configuration",
            "path" => path.display(),
        })
    }

    pub fn parse(string: &str) -> Result<Settings> {
        Ok(toml::from_str(string)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.notebooks, Path::new("."));
        assert_eq!(settings.output, Path::new("build"));
        assert_eq!(settings.static_dir, Path::new("static"));
        assert_eq!(settings.root, "/");
        assert!(settings.globals.is_empty());
    }

    #[test]
    fn extra_keys_are_globals() {
        let settings = Settings::parse(r#"
            notebooks = "notebooks"
            static = "assets"
            ignore = ["scratch.ipynb"]
            title = "Interactive Notebooks"

            [links]
            source = "https://example.com/src"
        "#).unwrap();

        assert_eq!(settings.notebooks, Path::new("notebooks"));
        assert_eq!(settings.static_dir, Path::new("assets"));
        assert_eq!(settings.ignore, ["scratch.ipynb"]);
        assert_eq!(settings.globals["title"].as_str(), Some("Interactive Notebooks"));
        assert!(settings.globals["links"].get("source").is_some());
        assert!(!settings.globals.contains_key("notebooks"));
    }

    #[test]
    fn named_configurations() {
        assert_eq!(Settings::file_name(None), "config.toml");
        assert_eq!(Settings::file_name(Some("live")), "config_live.toml");
    }

    #[test]
    fn invalid_types_are_errors() {
        assert!(Settings::parse("ignore = 3").is_err());
    }
}
