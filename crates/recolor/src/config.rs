use std::fs;
use std::path::{Path, PathBuf};

use color_schemes::{SchemeDef, SchemeRegistry};
use serde::Deserialize;
use tracing::debug;

use crate::converter::{ConvertOptions, Mode};
use crate::preview::{clamp_preview_dpi, DEFAULT_PREVIEW_DPI};
use crate::{RecolorError, Result};

const CONFIG_ENV: &str = "PDF_RECOLOR_CONFIG";
const APP_DIR: &str = "pdf-recolor";

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub convert: ConvertConfig,
    pub preview: PreviewConfig,
    pub schemes: Vec<SchemeDef>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConvertConfig {
    pub scheme: String,
    pub mode: Mode,
    pub replace_page_fills: bool,
    pub compress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scheme: "Dark Mode".to_string(),
            mode: Mode::Remap,
            replace_page_fills: true,
            compress: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreviewConfig {
    pub dpi: u32,
    /// 0-indexed
    pub page: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_PREVIEW_DPI,
            page: 0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(RecolorError::Config(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            RecolorError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        let parsed = Self::from_toml(&raw).map_err(|e| match e {
            RecolorError::Config(msg) => {
                RecolorError::Config(format!("failed to parse config {}: {msg}", path.display()))
            }
            other => other,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(parsed)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let parsed = toml::from_str::<Self>(raw).map_err(|e| RecolorError::Config(e.to_string()))?;
        Ok(parsed.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.preview.dpi = clamp_preview_dpi(self.preview.dpi);
        if self.convert.scheme.trim().is_empty() {
            self.convert.scheme = ConvertConfig::default().scheme;
        }
        self
    }

    /// Built-in schemes plus the ones defined in `[[schemes]]`
    pub fn registry(&self) -> Result<SchemeRegistry> {
        Ok(SchemeRegistry::with_custom(self.schemes.clone())?)
    }

    /// Conversion options for the configured scheme
    pub fn convert_options(&self, registry: &SchemeRegistry) -> Result<ConvertOptions> {
        let scheme = registry.get(&self.convert.scheme)?.clone();
        Ok(ConvertOptions::new(scheme)
            .with_mode(self.convert.mode)
            .with_replace_page_fills(self.convert.replace_page_fills)
            .with_compression(self.convert.compress))
    }
}

fn non_empty_env(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Some(explicit) = non_empty_env(CONFIG_ENV) {
        return Some(explicit);
    }
    if let Some(xdg) = non_empty_env("XDG_CONFIG_HOME") {
        return Some(xdg.join(APP_DIR).join("config.toml"));
    }
    if let Some(home) = non_empty_env("HOME") {
        return Some(home.join(".config").join(APP_DIR).join("config.toml"));
    }
    non_empty_env("APPDATA").map(|appdata| appdata.join(APP_DIR).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;

    use super::{Config, Mode};
    use crate::RecolorError;

    fn unique_temp_path(suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("pdf_recolor_config_{suffix}_{}_{}", process::id(), nanos));
        path
    }

    #[test]
    fn load_from_path_returns_defaults_for_missing_file() {
        let missing = unique_temp_path("missing.toml");
        let config = Config::load_from_path(&missing).expect("missing config should fallback");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_from_path_applies_partial_overrides_and_sanitizes() {
        let path = unique_temp_path("custom.toml");
        fs::write(
            &path,
            r#"
[convert]
scheme = "Sepia"
mode = "rebuild"

[preview]
dpi = 5000
"#,
        )
        .expect("config should be written");

        let config = Config::load_from_path(&path).expect("config should parse");
        fs::remove_file(&path).ok();

        assert_eq!(config.convert.scheme, "Sepia");
        assert_eq!(config.convert.mode, Mode::Rebuild);
        assert!(config.convert.replace_page_fills);
        assert_eq!(config.preview.dpi, 600);
        assert_eq!(config.preview.page, 0);
    }

    #[test]
    fn load_from_path_rejects_directories() {
        let dir = std::env::temp_dir();
        let err = Config::load_from_path(&dir).expect_err("directory should be rejected");
        assert!(matches!(err, RecolorError::Config(_)));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = Config::from_toml("[convert]\nmode = \"invert\"").expect_err("bad mode");
        assert!(matches!(err, RecolorError::Config(_)));
    }

    #[test]
    fn custom_schemes_feed_the_registry() {
        let config = Config::from_toml(
            r##"
[convert]
scheme = "solarized"

[[schemes]]
key = "Solarized"
name = "Solarized Light"
background = "#FDF6E3"
text = "#657B83"
"##,
        )
        .expect("config should parse");

        let registry = config.registry().expect("schemes should be valid");
        let options = config.convert_options(&registry).expect("scheme should resolve");
        assert_eq!(options.scheme.name, "Solarized Light");
        assert_eq!(options.mode, Mode::Remap);
        assert!(options.compress);
    }

    #[test]
    fn unknown_configured_scheme_is_reported() {
        let config = Config::from_toml("[convert]\nscheme = \"Nope\"").expect("config should parse");
        let registry = config.registry().expect("no custom schemes");
        assert!(matches!(
            config.convert_options(&registry),
            Err(RecolorError::Scheme(_))
        ));
    }

    #[test]
    fn blank_scheme_falls_back_to_default() {
        let config = Config::from_toml("[convert]\nscheme = \"  \"").expect("config should parse");
        assert_eq!(config.convert.scheme, "Dark Mode");
    }
}
