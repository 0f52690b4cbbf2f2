//! Preset configuration for the Touch Bar
//!
//! - **model**: the persisted `TouchBarConfiguration` aggregate
//! - **legacy**: the older flat-array preset format
//! - **validation**: pure checks returning errors and warnings as data
//! - **manager**: the single authority reading and writing `items.json`

pub mod error;
pub mod legacy;
pub mod manager;
pub mod model;
pub mod validation;

// Re-export commonly used types
pub use error::ConfigurationError;
pub use manager::{ConfigurationManager, LegacyExport, LoadSource};
pub use model::{EdgeInsets, GlobalSettings, LayoutConfiguration, TouchBarConfiguration, WidgetConfiguration};
pub use validation::{ValidationError, ValidationResult, ValidationWarning};
