#![forbid(unsafe_code)]

//! Touch Bar preset core: widget catalog, typed preset model and the
//! JSON persistence around `items.json`.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod schema;
pub mod service;
pub mod value;
pub mod watcher;

pub use catalog::{WidgetCatalog, WidgetCategory, WidgetDescriptor};
pub use config::{ConfigurationError, ConfigurationManager, TouchBarConfiguration};
pub use value::ConfigValue;
