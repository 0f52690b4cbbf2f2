//! Preset validation rules
//!
//! Validation is a pure read over a `TouchBarConfiguration`. Problems are
//! returned as data so a caller can show all of them at once.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::catalog::WidgetCatalog;
use crate::config::model::{TouchBarConfiguration, WidgetConfiguration};
use crate::constants::validation::{
    MAX_RECOMMENDED_WIDGETS, MIN_UPDATE_INTERVAL_SECS, UPDATE_INTERVAL_KEY,
};
use crate::schema::ValueRange;
use crate::value::ConfigValue;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Duplicate widget positions: {0:?}")]
    DuplicatePositions(Vec<i32>),

    #[error("Widget '{widget}' is missing required field '{field}'")]
    MissingRequiredField { field: String, widget: String },

    #[error("Field '{field}' value {value} is outside {range}")]
    ValueOutOfRange {
        field: String,
        value: f64,
        range: ValueRange,
    },

    #[error("Unknown widget type '{0}'")]
    InvalidWidgetType(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationWarning {
    #[error("{0} widgets configured; the Touch Bar may not fit them all")]
    TooManyWidgets(usize),

    #[error("Widget '{widget}' uses deprecated field '{field}'")]
    DeprecatedField { field: String, widget: String },

    #[error("Widget '{widget}': {message}")]
    PerformanceImpact { widget: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check `config` against the schemas of its widgets
pub fn validate(config: &TouchBarConfiguration, catalog: &WidgetCatalog) -> ValidationResult {
    let mut result = ValidationResult::default();

    if let Some(duplicates) = duplicate_positions(config) {
        result.errors.push(ValidationError::DuplicatePositions(duplicates));
    }

    for widget in &config.widgets {
        if catalog.by_identifier(widget.identifier()).is_none() {
            result
                .errors
                .push(ValidationError::InvalidWidgetType(widget.identifier().to_string()));
        }
        check_fields(widget, &mut result);
    }

    let count = config.widgets.len();
    if count > MAX_RECOMMENDED_WIDGETS {
        result.warnings.push(ValidationWarning::TooManyWidgets(count));
    }

    result
}

/// Every position that occurs more than once, ascending
fn duplicate_positions(config: &TouchBarConfiguration) -> Option<Vec<i32>> {
    let mut seen: BTreeMap<i32, usize> = BTreeMap::new();
    for widget in &config.widgets {
        *seen.entry(widget.position).or_default() += 1;
    }
    let duplicates: Vec<i32> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(position, _)| position)
        .collect();
    (!duplicates.is_empty()).then_some(duplicates)
}

fn check_fields(widget: &WidgetConfiguration, result: &mut ValidationResult) {
    let descriptor = &widget.descriptor;

    for field in descriptor.schema.fields() {
        let key = field.key();
        let value = widget.configuration.get(&key);

        if field.is_required() && is_blank(value) {
            result.errors.push(ValidationError::MissingRequiredField {
                field: key.clone(),
                widget: descriptor.identifier.clone(),
            });
        }

        // Non-numeric values are left to the widget at render time
        if let (Some(range), Some(number)) = (field.range(), value.and_then(ConfigValue::as_f64)) {
            if !range.contains(number) {
                result.errors.push(ValidationError::ValueOutOfRange {
                    field: key.clone(),
                    value: number,
                    range,
                });
            }
        }
    }

    for key in &descriptor.deprecated_keys {
        if widget.configuration.contains_key(key) {
            result.warnings.push(ValidationWarning::DeprecatedField {
                field: key.clone(),
                widget: descriptor.identifier.clone(),
            });
        }
    }

    if let Some(interval) = widget.configuration.get(UPDATE_INTERVAL_KEY).and_then(ConfigValue::as_f64) {
        if interval < MIN_UPDATE_INTERVAL_SECS {
            result.warnings.push(ValidationWarning::PerformanceImpact {
                widget: descriptor.identifier.clone(),
                message: format!("update interval of {interval}s polls more than once per second"),
            });
        }
    }
}

fn is_blank(value: Option<&ConfigValue>) -> bool {
    match value {
        None | Some(ConfigValue::Null) => true,
        Some(ConfigValue::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{WidgetCategory, WidgetDescriptor};
    use crate::schema::{ConfigField, ConfigSchema};

    fn catalog() -> &'static WidgetCatalog {
        WidgetCatalog::builtin()
    }

    fn widget(identifier: &str, position: i32) -> WidgetConfiguration {
        let descriptor = catalog().by_identifier(identifier).unwrap().clone();
        WidgetConfiguration::with_id(format!("{identifier}-{position}"), descriptor, position)
    }

    fn config(widgets: Vec<WidgetConfiguration>) -> TouchBarConfiguration {
        TouchBarConfiguration {
            widgets,
            ..TouchBarConfiguration::default()
        }
    }

    #[test]
    fn test_starter_preset_is_valid() {
        let result = validate(&TouchBarConfiguration::starter(catalog()), catalog());
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_positions_reported_once_each() {
        let result = validate(
            &config(vec![widget("escape", 2), widget("volume", 2), widget("cpu", 0)]),
            catalog(),
        );
        assert!(!result.is_valid());
        assert_eq!(result.errors, vec![ValidationError::DuplicatePositions(vec![2])]);

        let result = validate(
            &config(vec![
                widget("escape", 5),
                widget("volume", 1),
                widget("cpu", 5),
                widget("battery", 1),
                widget("network", 5),
            ]),
            catalog(),
        );
        assert_eq!(result.errors, vec![ValidationError::DuplicatePositions(vec![1, 5])]);
    }

    #[test]
    fn test_value_out_of_range() {
        let mut brightness = widget("brightness", 0);
        brightness.set("Initial Value", 1.5);

        let result = validate(&config(vec![brightness]), catalog());
        assert_eq!(
            result.errors,
            vec![ValidationError::ValueOutOfRange {
                field: "initial_value".to_string(),
                value: 1.5,
                range: ValueRange::new(0.0, 1.0),
            }]
        );
    }

    #[test]
    fn test_number_field_outside_declared_range() {
        let descriptor = WidgetDescriptor {
            identifier: "dimmer".to_string(),
            name: "Dimmer".to_string(),
            description: String::new(),
            category: WidgetCategory::Custom,
            icon: String::new(),
            schema: ConfigSchema::Simple(vec![ConfigField::NumberField {
                name: "Opacity".to_string(),
                default: 0.5,
                range: Some(ValueRange::new(0.0, 1.0)),
                required: false,
            }]),
            deprecated_keys: Vec::new(),
        };
        let catalog = WidgetCatalog::new(vec![descriptor.clone()]);

        let mut dimmer = WidgetConfiguration::with_id("d", descriptor, 0);
        assert!(validate(&config(vec![dimmer.clone()]), &catalog).is_valid());

        dimmer.set("Opacity", 1.5);
        let result = validate(&config(vec![dimmer]), &catalog);
        assert_eq!(
            result.errors,
            vec![ValidationError::ValueOutOfRange {
                field: "opacity".to_string(),
                value: 1.5,
                range: ValueRange::new(0.0, 1.0),
            }]
        );
    }

    #[test]
    fn test_integer_value_checked_against_range() {
        let mut pomodoro = widget("pomodoro", 0);
        pomodoro.set("Work Time", 5);
        let result = validate(&config(vec![pomodoro]), catalog());
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationError::ValueOutOfRange { field, .. }] if field == "work_time"
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let mut button = widget("staticButton", 0);
        // Default title is empty
        let result = validate(&config(vec![button.clone()]), catalog());
        assert_eq!(
            result.errors,
            vec![ValidationError::MissingRequiredField {
                field: "title".to_string(),
                widget: "staticButton".to_string(),
            }]
        );

        button.set("title", "Deploy");
        assert!(validate(&config(vec![button.clone()]), catalog()).is_valid());

        button.configuration.remove("title");
        assert!(!validate(&config(vec![button]), catalog()).is_valid());
    }

    #[test]
    fn test_unknown_keys_are_tolerated() {
        let mut escape = widget("escape", 0);
        escape.set("future_option", true);
        assert!(validate(&config(vec![escape]), catalog()).is_valid());
    }

    #[test]
    fn test_invalid_widget_type() {
        let descriptor = WidgetDescriptor {
            identifier: "hologram".to_string(),
            name: "Hologram".to_string(),
            description: String::new(),
            category: WidgetCategory::Custom,
            icon: String::new(),
            schema: ConfigSchema::Simple(vec![ConfigField::Toggle {
                name: "Enabled".to_string(),
                default: true,
            }]),
            deprecated_keys: Vec::new(),
        };
        let result = validate(
            &config(vec![WidgetConfiguration::with_id("h", descriptor, 0)]),
            catalog(),
        );
        assert_eq!(result.errors, vec![ValidationError::InvalidWidgetType("hologram".to_string())]);
    }

    #[test]
    fn test_too_many_widgets_is_only_a_warning() {
        let widgets = (0..11).map(|i| widget("escape", i)).collect();
        let result = validate(&config(widgets), catalog());
        assert!(result.is_valid());
        assert_eq!(result.warnings, vec![ValidationWarning::TooManyWidgets(11)]);

        let widgets = (0..10).map(|i| widget("escape", i)).collect();
        assert!(validate(&config(widgets), catalog()).warnings.is_empty());
    }

    #[test]
    fn test_deprecated_field_warning() {
        let mut time = widget("timeButton", 0);
        time.configuration.insert("formatTemplate".to_string(), ConfigValue::from("HH:mm"));
        let result = validate(&config(vec![time]), catalog());
        assert!(result.is_valid());
        assert_eq!(
            result.warnings,
            vec![ValidationWarning::DeprecatedField {
                field: "formatTemplate".to_string(),
                widget: "timeButton".to_string(),
            }]
        );
    }

    #[test]
    fn test_fast_polling_warns_about_performance() {
        let mut cpu = widget("cpu", 0);
        cpu.set("Update Interval", 0.5);
        let result = validate(&config(vec![cpu]), catalog());
        assert!(result.is_valid());
        assert!(matches!(
            result.warnings.as_slice(),
            [ValidationWarning::PerformanceImpact { widget, .. }] if widget == "cpu"
        ));
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let mut brightness = widget("brightness", 0);
        brightness.set("initial_value", 7.0);
        let config = config(vec![brightness]);
        let before = config.clone();
        let _ = validate(&config, catalog());
        assert_eq!(config, before);
    }
}
