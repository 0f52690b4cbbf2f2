//! Preset file authority
//!
//! `ConfigurationManager` owns the on-disk `items.json` and the in-memory
//! preset. Every read goes through `load()` so the legacy fallback and the
//! default substitution apply; every write goes through `save()`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::catalog::WidgetCatalog;
use crate::config::error::ConfigurationError;
use crate::config::legacy;
use crate::config::model::TouchBarConfiguration;
use crate::config::validation::{self, ValidationResult};
use crate::constants;

/// Where the legacy flat-array copy goes on save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacyExport {
    /// Canonical file only
    Off,
    /// Separate `items.legacy.json` next to the preset
    #[default]
    Sibling,
    /// Legacy form replaces the canonical file (older consumers read `items.json`)
    Overwrite,
}

impl LegacyExport {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Some(LegacyExport::Off),
            "sibling" => Some(LegacyExport::Sibling),
            "overwrite" => Some(LegacyExport::Overwrite),
            _ => None,
        }
    }

    /// False when a save leaves the legacy form at the preset path
    pub fn keeps_canonical(self) -> bool {
        self != LegacyExport::Overwrite
    }
}

/// Which representation a successful load came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Canonical,
    Legacy { skipped: Vec<String> },
    /// No file on disk, starter preset in use
    DefaultCreated,
}

pub struct ConfigurationManager {
    path: PathBuf,
    catalog: &'static WidgetCatalog,
    legacy_export: LegacyExport,
    current: TouchBarConfiguration,
}

impl ConfigurationManager {
    /// `<application support>/MTMR/items.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(constants::config::APP_DIR);
        path.push(constants::config::FILENAME);
        path
    }

    pub fn new(path: impl Into<PathBuf>, catalog: &'static WidgetCatalog) -> Self {
        Self {
            path: path.into(),
            catalog,
            legacy_export: LegacyExport::default(),
            current: TouchBarConfiguration::starter(catalog),
        }
    }

    pub fn with_legacy_export(mut self, legacy_export: LegacyExport) -> Self {
        self.legacy_export = legacy_export;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.path.with_file_name(constants::config::LEGACY_FILENAME)
    }

    pub fn catalog(&self) -> &'static WidgetCatalog {
        self.catalog
    }

    /// The in-memory preset; always usable, even after a failed load
    pub fn configuration(&self) -> &TouchBarConfiguration {
        &self.current
    }

    /// Replace the in-memory preset without touching disk
    pub fn replace(&mut self, config: TouchBarConfiguration) {
        self.current = config;
    }

    /// Read the preset file into memory
    ///
    /// On any failure the starter preset is substituted before the error is
    /// returned, so the caller can keep running degraded.
    pub fn load(&mut self) -> Result<LoadSource, ConfigurationError> {
        match self.read() {
            Ok((config, source)) => {
                info!(path = %self.path.display(), widgets = config.widgets.len(), source = ?source, "Loaded preset");
                self.current = config;
                Ok(source)
            }
            Err(ConfigurationError::MissingFile(path)) => {
                info!(path = %path.display(), "Preset file not found, using starter preset");
                self.current = TouchBarConfiguration::starter(self.catalog);
                Ok(LoadSource::DefaultCreated)
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to load preset, using starter preset");
                self.current = TouchBarConfiguration::starter(self.catalog);
                Err(e)
            }
        }
    }

    fn read(&self) -> Result<(TouchBarConfiguration, LoadSource), ConfigurationError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigurationError::MissingFile(self.path.clone()));
            }
            Err(source) => {
                return Err(ConfigurationError::LoadingFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        decode(&contents, self.catalog)
    }

    /// Check a preset without modifying it
    pub fn validate(&self, config: &TouchBarConfiguration) -> ValidationResult {
        validation::validate(config, self.catalog)
    }

    /// Validate, then write `config` to disk and make it current
    ///
    /// Validation problems do not block the write; they are logged and
    /// returned for the caller to surface.
    pub fn save(&mut self, config: &TouchBarConfiguration) -> Result<ValidationResult, ConfigurationError> {
        let result = self.validate(config);
        for problem in &result.errors {
            warn!(path = %self.path.display(), error = %problem, "Saving preset with validation error");
        }
        for advisory in &result.warnings {
            info!(path = %self.path.display(), warning = %advisory, "Preset validation warning");
        }

        let contents = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigurationError::saving(&self.path, e))?;
        write_file(&self.path, &contents)?;
        // Memory tracks the canonical file from here on
        self.current = config.clone();
        info!(path = %self.path.display(), widgets = config.widgets.len(), "Saved preset");

        match self.legacy_export {
            LegacyExport::Off => {}
            LegacyExport::Sibling => {
                let legacy_path = self.legacy_path();
                if let Err(e) = self.write_legacy(config, &legacy_path) {
                    warn!(path = %legacy_path.display(), error = %e, "Failed to write legacy preset copy");
                }
            }
            LegacyExport::Overwrite => {
                warn!(path = %self.path.display(), "Overwriting canonical preset with legacy form");
                self.write_legacy(config, &self.path)?;
            }
        }

        Ok(result)
    }

    /// Write the legacy flat-array form of the current preset to `path`
    pub fn export_legacy(&self, path: &Path) -> Result<(), ConfigurationError> {
        self.write_legacy(&self.current, path)
    }

    fn write_legacy(&self, config: &TouchBarConfiguration, path: &Path) -> Result<(), ConfigurationError> {
        let contents = legacy::encode(config).map_err(|e| ConfigurationError::saving(path, e))?;
        write_file(path, &contents)?;
        info!(path = %path.display(), "Wrote legacy preset");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigurationError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConfigurationError::saving(path, e))?;
    }
    fs::write(path, contents).map_err(|e| ConfigurationError::saving(path, e))
}

/// Decode a preset document, canonical first, then legacy
pub fn decode(
    contents: &str,
    catalog: &WidgetCatalog,
) -> Result<(TouchBarConfiguration, LoadSource), ConfigurationError> {
    let canonical_error = match decode_canonical(contents) {
        Ok(config) => return Ok((config, LoadSource::Canonical)),
        Err(e) => e,
    };

    match legacy::decode(contents, catalog) {
        Ok(decoded) => {
            info!(skipped = decoded.skipped.len(), "Preset decoded from legacy format");
            Ok((decoded.configuration, LoadSource::Legacy { skipped: decoded.skipped }))
        }
        Err(legacy_error) => Err(ConfigurationError::InvalidFormat {
            canonical: canonical_error.to_string(),
            legacy: legacy_error.to_string(),
        }),
    }
}

/// Canonical presets are JSON objects; arrays never decode as canonical
fn decode_canonical(contents: &str) -> serde_json::Result<TouchBarConfiguration> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    if !value.is_object() {
        return Err(<serde_json::Error as serde::de::Error>::custom(
            "expected a JSON object at the top level",
        ));
    }
    serde_json::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::WidgetConfiguration;
    use crate::config::validation::ValidationError;
    use crate::schema::Alignment;
    use crate::value::ConfigValue;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> ConfigurationManager {
        ConfigurationManager::new(dir.path().join("MTMR").join("items.json"), WidgetCatalog::builtin())
    }

    fn sample() -> TouchBarConfiguration {
        let catalog = WidgetCatalog::builtin();
        let mut config = TouchBarConfiguration::starter(catalog);
        let weather = config.add_widget(catalog.by_identifier("weather").unwrap());
        weather.set("Location", ConfigValue::Map(
            [("lat".to_string(), ConfigValue::Double(52.52)), ("lon".to_string(), ConfigValue::Double(13.4))]
                .into_iter()
                .collect(),
        ));
        weather.set("Api Key", "abc123");
        config.layout.alignment = Alignment::Trailing;
        config.layout.spacing = 12.0;
        config.global_settings.haptic_feedback = false;
        config.global_settings.blacklisted_apps = vec!["com.apple.Terminal".to_string()];
        config
    }

    #[test]
    fn test_missing_file_yields_starter_every_time() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);

        assert_eq!(manager.load().unwrap(), LoadSource::DefaultCreated);
        let first = manager.configuration().clone();
        assert_eq!(manager.load().unwrap(), LoadSource::DefaultCreated);
        assert_eq!(manager.configuration(), &first);
        assert_eq!(first, TouchBarConfiguration::starter(WidgetCatalog::builtin()));
        // Loading never writes
        assert!(!manager.path().exists());
    }

    #[test]
    fn test_canonical_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir).with_legacy_export(LegacyExport::Off);
        let config = sample();

        let result = manager.save(&config).unwrap();
        assert!(result.is_valid(), "{:?}", result.errors);

        let mut fresh = self::manager(&dir);
        assert_eq!(fresh.load().unwrap(), LoadSource::Canonical);
        assert_eq!(fresh.configuration(), &config);
    }

    #[test]
    fn test_sibling_export_keeps_canonical_file() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);
        manager.save(&sample()).unwrap();

        let legacy: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manager.legacy_path()).unwrap()).unwrap();
        assert_eq!(legacy.as_array().unwrap().len(), 5);
        assert_eq!(legacy[0]["type"], "escape");

        let mut fresh = self::manager(&dir);
        assert_eq!(fresh.load().unwrap(), LoadSource::Canonical);
    }

    #[test]
    fn test_overwrite_export_leaves_legacy_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir).with_legacy_export(LegacyExport::Overwrite);
        let config = sample();
        manager.save(&config).unwrap();

        let mut fresh = self::manager(&dir);
        assert_eq!(fresh.load().unwrap(), LoadSource::Legacy { skipped: Vec::new() });
        let widgets: Vec<_> = fresh.configuration().widgets.iter().map(|w| w.identifier().to_string()).collect();
        assert_eq!(widgets, vec!["escape", "volume", "brightness", "timeButton", "weather"]);
        // Layout and global settings are not representable in the legacy form
        assert_eq!(fresh.configuration().layout.alignment, Alignment::Center);
    }

    #[test]
    fn test_legacy_file_is_rewrapped() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);
        write_file(
            manager.path(),
            r#"[{"type":"escape","title":"esc"}, {"type":"doesNotExist"}, {"type":"volume"}]"#,
        )
        .unwrap();

        assert_eq!(
            manager.load().unwrap(),
            LoadSource::Legacy { skipped: vec!["doesNotExist".to_string()] }
        );
        let widgets = &manager.configuration().widgets;
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].get("title"), Some(&ConfigValue::from("esc")));
        assert_eq!(widgets[1].position, 2);
    }

    #[test]
    fn test_garbage_file_substitutes_starter() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);
        manager.replace(sample());
        write_file(manager.path(), "{ this is not json").unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidFormat { .. }));
        assert_eq!(manager.configuration(), &TouchBarConfiguration::starter(WidgetCatalog::builtin()));
    }

    #[test]
    fn test_unreadable_path_is_loading_failure() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be
        let mut manager = ConfigurationManager::new(dir.path(), WidgetCatalog::builtin());
        let err = manager.load().unwrap_err();
        assert!(matches!(err, ConfigurationError::LoadingFailed { .. }));
        assert_eq!(manager.configuration().widgets.len(), 4);
    }

    #[test]
    fn test_save_proceeds_with_validation_errors() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir).with_legacy_export(LegacyExport::Off);
        let mut config = sample();
        config.widgets[1].position = 0;

        let result = manager.save(&config).unwrap();
        assert_eq!(result.errors, vec![ValidationError::DuplicatePositions(vec![0])]);
        assert!(manager.path().exists());
        assert_eq!(manager.configuration(), &config);
    }

    #[test]
    fn test_save_failure_is_typed_and_keeps_current() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        // Parent is a regular file, so the directory cannot be created
        let mut manager = ConfigurationManager::new(blocker.join("items.json"), WidgetCatalog::builtin());
        let before = manager.configuration().clone();

        let err = manager.save(&sample()).unwrap_err();
        assert!(matches!(err, ConfigurationError::SavingFailed { .. }));
        assert_eq!(manager.configuration(), &before);
    }

    #[test]
    fn test_sibling_export_failure_keeps_memory_in_sync_with_disk() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir);
        // A directory where the legacy copy should go makes that write fail
        fs::create_dir_all(manager.legacy_path()).unwrap();
        let config = sample();
        assert!(!config.global_settings.haptic_feedback);

        let result = manager.save(&config).unwrap();
        assert!(result.is_valid(), "{:?}", result.errors);
        assert_eq!(manager.configuration(), &config);

        let mut fresh = self::manager(&dir);
        assert_eq!(fresh.load().unwrap(), LoadSource::Canonical);
        assert_eq!(fresh.configuration(), manager.configuration());
        assert!(manager.legacy_path().is_dir());
    }

    #[test]
    fn test_export_legacy_writes_current() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir);
        let out = dir.path().join("export.json");
        manager.export_legacy(&out).unwrap();

        let decoded = legacy::decode(&fs::read_to_string(&out).unwrap(), WidgetCatalog::builtin()).unwrap();
        assert_eq!(decoded.configuration.widgets.len(), 4);
    }

    #[test]
    fn test_key_normalization_consistent_across_save_and_validate() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager(&dir).with_legacy_export(LegacyExport::Off);
        let catalog = WidgetCatalog::builtin();
        let mut config = TouchBarConfiguration::default();
        let battery = WidgetConfiguration::with_id("b", catalog.by_identifier("battery").unwrap().clone(), 0);
        assert!(battery.configuration.contains_key("update_interval"));
        config.widgets.push(battery);
        config.widgets[0].set("Update Interval", 9000.0);

        let result = manager.save(&config).unwrap();
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationError::ValueOutOfRange { field, .. }] if field == "update_interval"
        ));

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(manager.path()).unwrap()).unwrap();
        assert_eq!(raw["widgets"][0]["configuration"]["update_interval"], 9000.0);
    }

    #[test]
    fn test_decode_rejects_empty_document() {
        let err = decode("", WidgetCatalog::builtin()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_overwrite_does_not_keep_canonical() {
        assert!(LegacyExport::Off.keeps_canonical());
        assert!(LegacyExport::Sibling.keeps_canonical());
        assert!(!LegacyExport::Overwrite.keeps_canonical());
    }

    #[test]
    fn test_legacy_export_parse() {
        assert_eq!(LegacyExport::parse("Sibling"), Some(LegacyExport::Sibling));
        assert_eq!(LegacyExport::parse("off"), Some(LegacyExport::Off));
        assert_eq!(LegacyExport::parse("both"), None);
    }
}
