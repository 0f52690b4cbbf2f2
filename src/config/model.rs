//! Touch Bar preset model
//!
//! `TouchBarConfiguration` is the unit written to `items.json`: the ordered
//! widget instances plus layout and global settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{WidgetCatalog, WidgetDescriptor};
use crate::constants;
use crate::schema::{normalize_key, Alignment};
use crate::value::ConfigValue;

/// One placed instance of a widget type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfiguration {
    pub id: String,
    pub descriptor: WidgetDescriptor,
    #[serde(default)]
    pub configuration: BTreeMap<String, ConfigValue>,
    pub position: i32,
}

impl WidgetConfiguration {
    /// New instance with a fresh id, seeded from the schema defaults
    pub fn new(descriptor: WidgetDescriptor, position: i32) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), descriptor, position)
    }

    pub fn with_id(id: impl Into<String>, descriptor: WidgetDescriptor, position: i32) -> Self {
        let configuration = descriptor.default_configuration();
        Self {
            id: id.into(),
            descriptor,
            configuration,
            position,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.descriptor.identifier
    }

    /// Read a value by field name or storage key
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.configuration.get(&normalize_key(key))
    }

    /// Store a value under the normalized key
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.configuration.insert(normalize_key(key), value.into());
    }
}

/// Insets in points, one per edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub leading: f64,
    pub bottom: f64,
    pub trailing: f64,
}

impl EdgeInsets {
    pub const fn uniform(inset: f64) -> Self {
        Self {
            top: inset,
            leading: inset,
            bottom: inset,
            trailing: inset,
        }
    }
}

impl Default for EdgeInsets {
    fn default() -> Self {
        Self::uniform(constants::layout::DEFAULT_PADDING)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfiguration {
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    #[serde(default)]
    pub padding: EdgeInsets,
    #[serde(default)]
    pub alignment: Alignment,
}

fn default_spacing() -> f64 {
    constants::layout::DEFAULT_SPACING
}

impl Default for LayoutConfiguration {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
            padding: EdgeInsets::default(),
            alignment: Alignment::default(),
        }
    }
}

/// Behavior that applies to the whole Touch Bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default = "default_true")]
    pub haptic_feedback: bool,
    #[serde(default = "default_true")]
    pub show_control_strip: bool,
    #[serde(default = "default_true")]
    pub multitouch_gestures: bool,
    /// Bundle identifiers of apps for which the custom bar is hidden
    #[serde(default)]
    pub blacklisted_apps: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            haptic_feedback: true,
            show_control_strip: true,
            multitouch_gestures: true,
            blacklisted_apps: Vec::new(),
        }
    }
}

/// Root persisted entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchBarConfiguration {
    pub widgets: Vec<WidgetConfiguration>,
    #[serde(default)]
    pub layout: LayoutConfiguration,
    #[serde(default)]
    pub global_settings: GlobalSettings,
}

impl TouchBarConfiguration {
    /// Deterministic preset used when no file exists or loading fails
    pub fn starter(catalog: &WidgetCatalog) -> Self {
        let widgets = constants::STARTER_WIDGETS
            .iter()
            .filter_map(|identifier| catalog.by_identifier(identifier))
            .enumerate()
            .map(|(position, descriptor)| {
                WidgetConfiguration::with_id(
                    format!("default-{}", descriptor.identifier),
                    descriptor.clone(),
                    position as i32,
                )
            })
            .collect();

        Self {
            widgets,
            layout: LayoutConfiguration::default(),
            global_settings: GlobalSettings::default(),
        }
    }

    /// Widgets in display order
    pub fn sorted_widgets(&self) -> Vec<&WidgetConfiguration> {
        let mut widgets: Vec<_> = self.widgets.iter().collect();
        widgets.sort_by_key(|w| w.position);
        widgets
    }

    /// First position after the right-most widget
    pub fn next_position(&self) -> i32 {
        self.widgets.iter().map(|w| w.position.saturating_add(1)).max().unwrap_or(0)
    }

    /// Append a new instance of `descriptor` at the end of the bar
    pub fn add_widget(&mut self, descriptor: &WidgetDescriptor) -> &mut WidgetConfiguration {
        let position = self.next_position();
        self.widgets.push(WidgetConfiguration::new(descriptor.clone(), position));
        let last = self.widgets.len() - 1;
        &mut self.widgets[last]
    }

    pub fn remove_widget(&mut self, id: &str) -> Option<WidgetConfiguration> {
        let index = self.widgets.iter().position(|w| w.id == id)?;
        Some(self.widgets.remove(index))
    }

    pub fn is_blacklisted(&self, bundle_id: &str) -> bool {
        self.global_settings
            .blacklisted_apps
            .iter()
            .any(|app| app == bundle_id)
    }
}
