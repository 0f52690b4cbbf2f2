//! Built-in widget descriptor catalog
//!
//! A descriptor identifies a widget *type*. Identifiers match the `type`
//! strings of legacy presets so old files can be re-wrapped on load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::schema::{Alignment, CodeLanguage, ConfigField, ConfigSchema, ValueRange};
use crate::value::ConfigValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetCategory {
    SystemControls,
    Productivity,
    SystemInfo,
    MediaApps,
    Custom,
}

impl WidgetCategory {
    pub const ALL: [WidgetCategory; 5] = [
        WidgetCategory::SystemControls,
        WidgetCategory::Productivity,
        WidgetCategory::SystemInfo,
        WidgetCategory::MediaApps,
        WidgetCategory::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetCategory::SystemControls => "systemControls",
            WidgetCategory::Productivity => "productivity",
            WidgetCategory::SystemInfo => "systemInfo",
            WidgetCategory::MediaApps => "mediaApps",
            WidgetCategory::Custom => "custom",
        }
    }

    /// Parse either the on-disk name or its kebab-case spelling
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.replace(['-', '_'], "").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().to_lowercase() == wanted)
    }
}

impl fmt::Display for WidgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Immutable metadata for one widget type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDescriptor {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub category: WidgetCategory,
    pub icon: String,
    pub schema: ConfigSchema,
    /// Keys still read for old presets but no longer offered in forms
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deprecated_keys: Vec<String>,
}

impl WidgetDescriptor {
    fn new(
        identifier: &str,
        name: &str,
        description: &str,
        category: WidgetCategory,
        icon: &str,
        schema: ConfigSchema,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category,
            icon: icon.to_string(),
            schema,
            deprecated_keys: Vec::new(),
        }
    }

    fn deprecating(mut self, keys: &[&str]) -> Self {
        self.deprecated_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Configuration map seeded from the schema defaults
    pub fn default_configuration(&self) -> std::collections::BTreeMap<String, ConfigValue> {
        self.schema.default_configuration()
    }
}

/// Read-only lookup table of known widget types
#[derive(Debug, Clone)]
pub struct WidgetCatalog {
    descriptors: Vec<WidgetDescriptor>,
}

static BUILTIN: LazyLock<WidgetCatalog> = LazyLock::new(|| WidgetCatalog::new(builtin_descriptors()));

impl WidgetCatalog {
    pub fn new(descriptors: Vec<WidgetDescriptor>) -> Self {
        Self { descriptors }
    }

    /// The catalog shipped with the application, seeded on first use
    pub fn builtin() -> &'static WidgetCatalog {
        &BUILTIN
    }

    pub fn all(&self) -> &[WidgetDescriptor] {
        &self.descriptors
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<&WidgetDescriptor> {
        self.descriptors.iter().find(|d| d.identifier == identifier)
    }

    pub fn by_category(&self, category: WidgetCategory) -> Vec<&WidgetDescriptor> {
        self.descriptors.iter().filter(|d| d.category == category).collect()
    }

    /// Case-insensitive substring match over name and description
    pub fn search(&self, query: &str) -> Vec<&WidgetDescriptor> {
        let query = query.to_lowercase();
        self.descriptors
            .iter()
            .filter(|d| {
                d.name.to_lowercase().contains(&query) || d.description.to_lowercase().contains(&query)
            })
            .collect()
    }
}

fn text(name: &str, placeholder: &str, default: &str) -> ConfigField {
    ConfigField::TextField {
        name: name.to_string(),
        placeholder: placeholder.to_string(),
        default: default.to_string(),
        required: false,
    }
}

fn required_text(name: &str, placeholder: &str) -> ConfigField {
    ConfigField::TextField {
        name: name.to_string(),
        placeholder: placeholder.to_string(),
        default: String::new(),
        required: true,
    }
}

fn number(name: &str, default: f64, range: Option<(f64, f64)>) -> ConfigField {
    ConfigField::NumberField {
        name: name.to_string(),
        default,
        range: range.map(|(min, max)| ValueRange::new(min, max)),
        required: false,
    }
}

fn toggle(name: &str, default: bool) -> ConfigField {
    ConfigField::Toggle { name: name.to_string(), default }
}

fn slider(name: &str, default: f64, min: f64, max: f64, step: Option<f64>) -> ConfigField {
    ConfigField::Slider {
        name: name.to_string(),
        default,
        range: ValueRange::new(min, max),
        step,
    }
}

fn dropdown(name: &str, options: &[&str], default: &str) -> ConfigField {
    ConfigField::Dropdown {
        name: name.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        default: default.to_string(),
    }
}

fn segmented(name: &str, options: &[&str], default: &str) -> ConfigField {
    ConfigField::SegmentedControl {
        name: name.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        default: default.to_string(),
    }
}

fn color(name: &str, default: &str) -> ConfigField {
    ConfigField::ColorPicker { name: name.to_string(), default: default.to_string() }
}

fn code(name: &str, language: CodeLanguage) -> ConfigField {
    ConfigField::CodeEditor {
        name: name.to_string(),
        language,
        default: String::new(),
        required: true,
    }
}

fn builtin_descriptors() -> Vec<WidgetDescriptor> {
    use ConfigSchema::{Advanced, Group, Simple};
    use WidgetCategory::*;

    vec![
        WidgetDescriptor::new(
            "escape",
            "Escape",
            "Sends the Escape key",
            SystemControls,
            "escape",
            Simple(vec![text("Title", "esc", "esc"), color("Background Color", "#00000000")]),
        ),
        WidgetDescriptor::new(
            "exitTouchbar",
            "Exit Touch Bar",
            "Returns to the system Touch Bar",
            SystemControls,
            "xmark.circle",
            Simple(vec![]),
        ),
        WidgetDescriptor::new(
            "brightness",
            "Brightness",
            "Display brightness slider",
            SystemControls,
            "sun.max",
            Simple(vec![slider("Initial Value", 0.5, 0.0, 1.0, Some(0.05))]),
        ),
        WidgetDescriptor::new(
            "volume",
            "Volume",
            "Output volume slider",
            SystemControls,
            "speaker.wave.2",
            Simple(vec![
                slider("Initial Value", 0.5, 0.0, 1.0, Some(0.05)),
                toggle("Show Icon", true),
            ]),
        ),
        WidgetDescriptor::new(
            "dnd",
            "Do Not Disturb",
            "Toggles Focus / Do Not Disturb",
            SystemControls,
            "moon",
            Simple(vec![]),
        ),
        WidgetDescriptor::new(
            "darkMode",
            "Dark Mode",
            "Switches between light and dark appearance",
            SystemControls,
            "circle.lefthalf.filled",
            Simple(vec![]),
        ),
        WidgetDescriptor::new(
            "inputsource",
            "Input Source",
            "Shows and cycles the keyboard input source",
            SystemControls,
            "keyboard",
            Simple(vec![]),
        ),
        WidgetDescriptor::new(
            "timeButton",
            "Time",
            "Current date and time",
            Productivity,
            "clock",
            Advanced(vec![
                text("Format Template", "HH:mm", "HH:mm"),
                text("Locale", "en_US", ""),
                text("Time Zone", "Europe/London", ""),
            ]),
        )
        .deprecating(&["formatTemplate"]),
        WidgetDescriptor::new(
            "pomodoro",
            "Pomodoro",
            "Work and rest timer",
            Productivity,
            "timer",
            Simple(vec![
                number("Work Time", 1500.0, Some((60.0, 7200.0))),
                number("Rest Time", 600.0, Some((60.0, 3600.0))),
            ]),
        ),
        WidgetDescriptor::new(
            "weather",
            "Weather",
            "Current conditions for your location",
            SystemInfo,
            "cloud.sun",
            Advanced(vec![
                ConfigField::LocationPicker { name: "Location".to_string() },
                segmented("Units", &["metric", "imperial"], "metric"),
                text("Api Key", "openweathermap key", ""),
                toggle("Show Icon", true),
                number("Update Interval", 600.0, Some((60.0, 86400.0))),
            ]),
        )
        .deprecating(&["apiKey"]),
        WidgetDescriptor::new(
            "battery",
            "Battery",
            "Charge level and time remaining",
            SystemInfo,
            "battery.100",
            Simple(vec![number("Update Interval", 10.0, Some((0.1, 600.0)))]),
        ),
        WidgetDescriptor::new(
            "cpu",
            "CPU",
            "Processor load",
            SystemInfo,
            "cpu",
            Simple(vec![number("Update Interval", 5.0, Some((0.1, 600.0)))]),
        ),
        WidgetDescriptor::new(
            "network",
            "Network",
            "Upload and download throughput",
            SystemInfo,
            "network",
            Simple(vec![
                toggle("Flip", false),
                segmented("Units", &["dynamic", "kb", "mb"], "dynamic"),
            ]),
        ),
        WidgetDescriptor::new(
            "currentApp",
            "Current App",
            "Icon of the frontmost application",
            MediaApps,
            "app",
            Simple(vec![]),
        ),
        WidgetDescriptor::new(
            "dock",
            "Dock",
            "Running and pinned applications",
            MediaApps,
            "dock.rectangle",
            Advanced(vec![
                toggle("Auto Resize", false),
                ConfigField::FilePicker {
                    name: "Filter".to_string(),
                    allowed_extensions: vec!["app".to_string()],
                    required: false,
                },
            ]),
        ),
        WidgetDescriptor::new(
            "music",
            "Now Playing",
            "Track info for the active music player",
            MediaApps,
            "music.note",
            Simple(vec![
                number("Update Interval", 5.0, Some((0.5, 60.0))),
                toggle("Disable Marquee", false),
            ]),
        ),
        WidgetDescriptor::new(
            "appleScriptTitledButton",
            "AppleScript Button",
            "Button whose title is produced by an AppleScript",
            Custom,
            "applescript",
            Advanced(vec![
                code("Source", CodeLanguage::AppleScript),
                number("Refresh Interval", 1800.0, Some((1.0, 86400.0))),
                ConfigField::AppPicker { name: "Target App".to_string(), required: false },
            ]),
        ),
        WidgetDescriptor::new(
            "shellScriptTitledButton",
            "Shell Script Button",
            "Button whose title is produced by a shell script",
            Custom,
            "terminal",
            Advanced(vec![
                code("Source", CodeLanguage::ShellScript),
                number("Refresh Interval", 1800.0, Some((1.0, 86400.0))),
            ]),
        ),
        WidgetDescriptor::new(
            "staticButton",
            "Static Button",
            "Button with a fixed title that runs an action",
            Custom,
            "button.programmable",
            Simple(vec![
                required_text("Title", "Title"),
                color("Background Color", "#00000000"),
                dropdown("Action", &["none", "hidKey", "keyPress", "appleScript", "shellScript", "openUrl"], "none"),
            ]),
        ),
        WidgetDescriptor::new(
            "group",
            "Group",
            "Collapsible set of widgets",
            Custom,
            "rectangle.3.group",
            Group(vec![
                required_text("Title", "Group"),
                ConfigField::Spacing { name: "Spacing".to_string(), default: 8.0 },
                ConfigField::Alignment { name: "Alignment".to_string(), default: Alignment::Leading },
            ]),
        ),
    ]
}
