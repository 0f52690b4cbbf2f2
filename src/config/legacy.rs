//! Legacy flat-array preset format
//!
//! Older presets are a bare JSON array of `{ "type": ..., ...fields }`
//! objects. Every extra key becomes the widget's configuration map as-is and
//! the position is the array index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::catalog::WidgetCatalog;
use crate::config::model::{TouchBarConfiguration, WidgetConfiguration};
use crate::value::ConfigValue;

/// One element of a legacy preset array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, ConfigValue>,
}

/// Result of re-wrapping a legacy array into the current model
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDecode {
    pub configuration: TouchBarConfiguration,
    /// `type` strings that matched no descriptor, in file order
    pub skipped: Vec<String>,
}

/// Parse a legacy document; fails only if it is not an array of typed objects
pub fn decode(contents: &str, catalog: &WidgetCatalog) -> serde_json::Result<LegacyDecode> {
    let items: Vec<LegacyItem> = serde_json::from_str(contents)?;
    Ok(from_items(items, catalog))
}

pub fn from_items(items: Vec<LegacyItem>, catalog: &WidgetCatalog) -> LegacyDecode {
    let mut widgets = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        let Some(descriptor) = catalog.by_identifier(&item.kind) else {
            warn!(widget_type = %item.kind, index = index, "Unknown widget type in legacy preset, skipping");
            skipped.push(item.kind);
            continue;
        };

        widgets.push(WidgetConfiguration {
            id: format!("legacy-{index}-{}", item.kind),
            descriptor: descriptor.clone(),
            configuration: item.fields,
            position: index as i32,
        });
    }

    LegacyDecode {
        configuration: TouchBarConfiguration {
            widgets,
            ..TouchBarConfiguration::default()
        },
        skipped,
    }
}

/// Best-effort flat form of `config`, widgets in position order
///
/// Layout, global settings, ids and positions have no legacy counterpart and
/// are dropped.
pub fn to_items(config: &TouchBarConfiguration) -> Vec<LegacyItem> {
    config
        .sorted_widgets()
        .into_iter()
        .map(|widget| {
            let mut fields = widget.configuration.clone();
            // A configuration key named "type" would shadow the discriminator
            if fields.remove("type").is_some() {
                warn!(widget = %widget.id, "Dropping 'type' configuration key from legacy export");
            }
            LegacyItem {
                kind: widget.descriptor.identifier.clone(),
                fields,
            }
        })
        .collect()
}

pub fn encode(config: &TouchBarConfiguration) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&to_items(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> &'static WidgetCatalog {
        WidgetCatalog::builtin()
    }

    #[test]
    fn test_decode_escape_and_volume() {
        let decoded = decode(r#"[{"type":"escape","title":"esc"}, {"type":"volume"}]"#, catalog()).unwrap();
        let widgets = &decoded.configuration.widgets;

        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[0].identifier(), "escape");
        assert_eq!(widgets[0].position, 0);
        assert_eq!(widgets[0].configuration.get("title"), Some(&ConfigValue::from("esc")));
        assert_eq!(widgets[1].identifier(), "volume");
        assert_eq!(widgets[1].position, 1);
        assert!(widgets[1].configuration.is_empty());
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let decoded = decode(
            r#"[{"type":"doesNotExist"}, {"type":"battery","width":60}]"#,
            catalog(),
        )
        .unwrap();

        assert_eq!(decoded.skipped, vec!["doesNotExist".to_string()]);
        assert_eq!(decoded.configuration.widgets.len(), 1);
        // Position keeps the original array index
        assert_eq!(decoded.configuration.widgets[0].position, 1);
        assert_eq!(
            decoded.configuration.widgets[0].configuration.get("width"),
            Some(&ConfigValue::Int(60))
        );
    }

    #[test]
    fn test_rejects_non_array_documents() {
        assert!(decode(r#"{"widgets": []}"#, catalog()).is_err());
        assert!(decode(r#"[{"title": "no type"}]"#, catalog()).is_err());
        assert!(decode("not json", catalog()).is_err());
    }

    #[test]
    fn test_encode_flattens_in_position_order() {
        let mut config = TouchBarConfiguration::starter(catalog());
        config.widgets.swap(0, 1);

        let json: serde_json::Value = serde_json::from_str(&encode(&config).unwrap()).unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0]["type"], "escape");
        assert_eq!(items[0]["title"], "esc");
        assert_eq!(items[1]["type"], "volume");
        assert!(items[0].get("position").is_none());
        assert!(items[0].get("id").is_none());
    }

    #[test]
    fn test_encoded_legacy_decodes_back_to_same_widgets() {
        let config = TouchBarConfiguration::starter(catalog());
        let decoded = decode(&encode(&config).unwrap(), catalog()).unwrap();

        let before: Vec<_> = config.widgets.iter().map(|w| (w.identifier(), &w.configuration)).collect();
        let after: Vec<_> = decoded
            .configuration
            .widgets
            .iter()
            .map(|w| (w.identifier(), &w.configuration))
            .collect();
        assert_eq!(before, after);
    }
}
