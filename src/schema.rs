//! Declarative widget configuration schemas
//!
//! Every widget type describes its configurable properties as a list of
//! `ConfigField`s. The schema is enough to render a form for the widget, to
//! seed a new instance with defaults and to validate a submitted value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::value::ConfigValue;

/// Derive the storage key for a human-readable field name
///
/// "Update Interval" -> "update_interval". Every place that turns a field
/// name into a configuration key goes through here.
pub fn normalize_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Closed numeric range `min...max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...{}", self.min, self.max)
    }
}

/// Script language hint for code editor fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodeLanguage {
    AppleScript,
    ShellScript,
    JavaScript,
    PlainText,
}

/// Horizontal alignment used by layout directives and the aggregate layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Leading,
    #[default]
    Center,
    Trailing,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Leading => "leading",
            Alignment::Center => "center",
            Alignment::Trailing => "trailing",
        }
    }
}

/// One configurable property of a widget type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ConfigField {
    TextField {
        name: String,
        #[serde(default)]
        placeholder: String,
        #[serde(default)]
        default: String,
        #[serde(default)]
        required: bool,
    },
    NumberField {
        name: String,
        default: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<ValueRange>,
        #[serde(default)]
        required: bool,
    },
    Toggle {
        name: String,
        default: bool,
    },
    Slider {
        name: String,
        default: f64,
        range: ValueRange,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Dropdown {
        name: String,
        options: Vec<String>,
        default: String,
    },
    SegmentedControl {
        name: String,
        options: Vec<String>,
        default: String,
    },
    ColorPicker {
        name: String,
        default: String,
    },
    FilePicker {
        name: String,
        #[serde(default)]
        allowed_extensions: Vec<String>,
        #[serde(default)]
        required: bool,
    },
    AppPicker {
        name: String,
        #[serde(default)]
        required: bool,
    },
    LocationPicker {
        name: String,
    },
    CodeEditor {
        name: String,
        language: CodeLanguage,
        #[serde(default)]
        default: String,
        #[serde(default)]
        required: bool,
    },
    Spacing {
        name: String,
        default: f64,
    },
    Alignment {
        name: String,
        default: Alignment,
    },
}

impl ConfigField {
    pub fn name(&self) -> &str {
        match self {
            ConfigField::TextField { name, .. }
            | ConfigField::NumberField { name, .. }
            | ConfigField::Toggle { name, .. }
            | ConfigField::Slider { name, .. }
            | ConfigField::Dropdown { name, .. }
            | ConfigField::SegmentedControl { name, .. }
            | ConfigField::ColorPicker { name, .. }
            | ConfigField::FilePicker { name, .. }
            | ConfigField::AppPicker { name, .. }
            | ConfigField::LocationPicker { name }
            | ConfigField::CodeEditor { name, .. }
            | ConfigField::Spacing { name, .. }
            | ConfigField::Alignment { name, .. } => name,
        }
    }

    /// Storage key in a widget's configuration map
    pub fn key(&self) -> String {
        normalize_key(self.name())
    }

    /// Declared default, or `None` for pickers that start empty
    pub fn default_value(&self) -> Option<ConfigValue> {
        match self {
            ConfigField::TextField { default, .. }
            | ConfigField::Dropdown { default, .. }
            | ConfigField::SegmentedControl { default, .. }
            | ConfigField::ColorPicker { default, .. }
            | ConfigField::CodeEditor { default, .. } => Some(ConfigValue::String(default.clone())),
            ConfigField::NumberField { default, .. }
            | ConfigField::Slider { default, .. }
            | ConfigField::Spacing { default, .. } => Some(ConfigValue::Double(*default)),
            ConfigField::Toggle { default, .. } => Some(ConfigValue::Bool(*default)),
            ConfigField::Alignment { default, .. } => Some(ConfigValue::from(default.as_str())),
            ConfigField::FilePicker { .. }
            | ConfigField::AppPicker { .. }
            | ConfigField::LocationPicker { .. } => None,
        }
    }

    /// Numeric bounds a submitted value must respect
    pub fn range(&self) -> Option<ValueRange> {
        match self {
            ConfigField::NumberField { range, .. } => *range,
            ConfigField::Slider { range, .. } => Some(*range),
            _ => None,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            ConfigField::TextField { required, .. }
            | ConfigField::NumberField { required, .. }
            | ConfigField::FilePicker { required, .. }
            | ConfigField::AppPicker { required, .. }
            | ConfigField::CodeEditor { required, .. } => *required,
            _ => false,
        }
    }
}

/// How a widget's fields are grouped for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", content = "fields", rename_all = "camelCase")]
pub enum ConfigSchema {
    Simple(Vec<ConfigField>),
    Advanced(Vec<ConfigField>),
    Group(Vec<ConfigField>),
}

impl Default for ConfigSchema {
    fn default() -> Self {
        ConfigSchema::Simple(Vec::new())
    }
}

impl ConfigSchema {
    pub fn fields(&self) -> &[ConfigField] {
        match self {
            ConfigSchema::Simple(fields)
            | ConfigSchema::Advanced(fields)
            | ConfigSchema::Group(fields) => fields,
        }
    }

    /// Look up a field by storage key or display name
    pub fn field(&self, key: &str) -> Option<&ConfigField> {
        let key = normalize_key(key);
        self.fields().iter().find(|field| field.key() == key)
    }

    /// Starter configuration map with every declared default filled in
    pub fn default_configuration(&self) -> BTreeMap<String, ConfigValue> {
        self.fields()
            .iter()
            .filter_map(|field| field.default_value().map(|value| (field.key(), value)))
            .collect()
    }
}
