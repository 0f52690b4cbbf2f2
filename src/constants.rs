//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the crate, providing a single source of truth for constant values.

/// Preset file location constants
pub mod config {
    /// Directory under the user's application-support dir
    pub const APP_DIR: &str = "MTMR";

    /// Preset file name
    pub const FILENAME: &str = "items.json";

    /// Sibling file receiving the legacy flat-array export
    pub const LEGACY_FILENAME: &str = "items.legacy.json";

    /// Environment variable overriding the preset path
    pub const PATH_ENV: &str = "TOUCHBAR_PRESET";
}

/// Validation thresholds
pub mod validation {
    /// More widgets than this triggers a soft warning
    pub const MAX_RECOMMENDED_WIDGETS: usize = 10;

    /// Storage key for polling intervals checked for performance impact
    pub const UPDATE_INTERVAL_KEY: &str = "update_interval";

    /// Polling faster than this (seconds) is flagged as a performance impact
    pub const MIN_UPDATE_INTERVAL_SECS: f64 = 1.0;
}

/// Default layout values
pub mod layout {
    /// Space between widgets in points
    pub const DEFAULT_SPACING: f64 = 8.0;

    /// Inset applied on every edge in points
    pub const DEFAULT_PADDING: f64 = 4.0;
}

/// Identifiers of the widgets placed in a fresh preset, in order
pub const STARTER_WIDGETS: &[&str] = &["escape", "volume", "brightness", "timeButton"];
