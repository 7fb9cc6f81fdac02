//! User configuration (`config.toml`).

use directories::ProjectDirs;
use meja_core::Locale;
use meja_core::format::DateFormat;
use meja_core::io::CsvOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB
const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 4.0;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    locale: Option<String>,
    csv: Option<CsvSection>,
    view: Option<ViewSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CsvSection {
    separator: Option<String>,
    delimiter: Option<String>,
    date_format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ViewSection {
    default_zoom: Option<f32>,
}

/// Settings resolved from the config file and command line.
#[derive(Clone, Debug, PartialEq)]
pub struct MejaConfig {
    pub locale: Locale,
    pub csv: CsvOptions,
    pub default_zoom: f32,
}

impl Default for MejaConfig {
    fn default() -> Self {
        MejaConfig {
            locale: Locale::default(),
            csv: CsvOptions::default(),
            default_zoom: 1.0,
        }
    }
}

impl MejaConfig {
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        self.csv.locale = locale;
    }
}

/// Load `path`, or the user config when `path` is `None`.
///
/// Problems never abort loading; they are returned as warnings and the
/// affected settings keep their defaults.
pub fn load_config(path: Option<&Path>) -> (MejaConfig, Vec<String>) {
    let mut warnings = Vec::new();
    let explicit = path.is_some();
    let Some(path) = path.map(Path::to_path_buf).or_else(user_config_path) else {
        return (MejaConfig::default(), warnings);
    };

    if !path.exists() {
        if explicit {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (MejaConfig::default(), warnings);
    }

    let content = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            return (MejaConfig::default(), warnings);
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                return (MejaConfig::default(), warnings);
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            return (MejaConfig::default(), warnings);
        }
    };

    let (config, parse_warnings) = parse_config(&content, &path.display().to_string());
    warnings.extend(parse_warnings);
    (config, warnings)
}

/// Parse config text. `origin` names the source in warnings.
pub fn parse_config(content: &str, origin: &str) -> (MejaConfig, Vec<String>) {
    let mut warnings = Vec::new();
    let mut config = MejaConfig::default();
    let file = match toml::from_str::<ConfigFile>(content) {
        Ok(file) => file,
        Err(err) => {
            warnings.push(format!("Failed to parse {origin}: {err}"));
            return (config, warnings);
        }
    };

    if let Some(tag) = file.locale.as_deref() {
        match Locale::from_tag(tag) {
            Some(locale) => config.set_locale(locale),
            None => warnings.push(format!("{origin}: unknown locale '{tag}'")),
        }
    }

    if let Some(csv) = file.csv {
        if let Some(separator) = csv.separator.as_deref() {
            if separator.eq_ignore_ascii_case("auto") {
                config.csv.separator = None;
            } else if let Some(c) = single_char(separator, "csv.separator", origin, &mut warnings) {
                config.csv.separator = Some(c);
            }
        }
        if let Some(delimiter) = csv.delimiter.as_deref()
            && let Some(c) = single_char(delimiter, "csv.delimiter", origin, &mut warnings)
        {
            config.csv.delimiter = c;
        }
        if let Some(format) = csv.date_format.as_deref() {
            match format.parse::<DateFormat>() {
                Ok(format) => config.csv.date_format = format,
                Err(err) => warnings.push(format!("{origin}: csv.date_format: {err}")),
            }
        }
    }

    if let Some(zoom) = file.view.and_then(|v| v.default_zoom) {
        if (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            config.default_zoom = zoom;
        } else {
            warnings.push(format!(
                "{origin}: view.default_zoom must be between {MIN_ZOOM} and {MAX_ZOOM}, got {zoom}"
            ));
        }
    }

    (config, warnings)
}

fn single_char(value: &str, key: &str, origin: &str, warnings: &mut Vec<String>) -> Option<char> {
    let value = if value == "\\t" { "\t" } else { value };
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Some(c),
        _ => {
            warnings.push(format!(
                "{origin}: {key} must be a single ASCII character, got '{value}'"
            ));
            None
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "meja")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let (config, warnings) = parse_config(
            r#"
locale = "de-DE"

[csv]
separator = "auto"
delimiter = "'"
date_format = "iso"

[view]
default_zoom = 1.5
"#,
            "test",
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.locale, Locale::Germany);
        assert_eq!(config.csv.locale, Locale::Germany);
        assert_eq!(config.csv.separator, None);
        assert_eq!(config.csv.effective_separator(), ';');
        assert_eq!(config.csv.delimiter, '\'');
        assert_eq!(config.csv.date_format, DateFormat::Iso);
        assert_eq!(config.default_zoom, 1.5);
    }

    #[test]
    fn test_bad_values_warn_and_keep_defaults() {
        let (config, warnings) = parse_config(
            r#"
locale = "xx"

[csv]
separator = ";;"

[view]
default_zoom = 12.0
"#,
            "test",
        );
        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert_eq!(config, MejaConfig::default());
    }

    #[test]
    fn test_tab_separator() {
        let (config, warnings) = parse_config("[csv]\nseparator = \"\\\\t\"\n", "test");
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.csv.separator, Some('\t'));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let (config, warnings) = parse_config("colour = \"blue\"\n", "test");
        assert_eq!(config, MejaConfig::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Failed to parse test"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "locale = \"fr\"\n").unwrap();
        let (config, warnings) = load_config(Some(&path));
        assert!(warnings.is_empty());
        assert_eq!(config.locale, Locale::France);

        let missing = dir.path().join("missing.toml");
        let (config, warnings) = load_config(Some(&missing));
        assert_eq!(config, MejaConfig::default());
        assert_eq!(warnings.len(), 1);
    }
}
