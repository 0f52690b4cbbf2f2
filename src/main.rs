#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use touchbar_preset::config::{
    ConfigurationManager, LegacyExport, LoadSource, TouchBarConfiguration, ValidationResult,
};
use touchbar_preset::constants;
use touchbar_preset::service::{self, ConfigEvent};
use touchbar_preset::watcher;
use touchbar_preset::{WidgetCatalog, WidgetCategory};

#[derive(Parser)]
#[command(author, version, about = "Touch Bar preset manager", long_about = None)]
struct Cli {
    /// Preset file (defaults to <application support>/MTMR/items.json)
    #[arg(long, global = true, env = constants::config::PATH_ENV)]
    config: Option<PathBuf>,

    /// Where the legacy flat-array copy goes on save: off, sibling or overwrite
    #[arg(long, global = true, default_value = "sibling", value_parser = parse_legacy_export)]
    legacy_export: LegacyExport,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the loaded preset
    Show {
        /// Dump canonical JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Validate the preset; exits non-zero on errors
    Validate,
    /// Write the starter preset
    Init {
        /// Replace an existing preset
        #[arg(long)]
        force: bool,
    },
    /// Re-save a legacy preset in the canonical format
    Migrate,
    /// Write the legacy flat-array form of the preset
    ExportLegacy {
        /// Output path
        output: PathBuf,
    },
    /// List known widget types
    Catalog {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Print the starter configuration synthesized for a widget type
    Defaults {
        identifier: String,
    },
    /// Reload on every change to the preset file until interrupted
    Watch,
}

fn parse_legacy_export(s: &str) -> Result<LegacyExport, String> {
    LegacyExport::parse(s).ok_or_else(|| format!("unknown legacy export mode '{s}' (off, sibling, overwrite)"))
}

fn init_logging() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_validation(result: &ValidationResult) {
    for e in &result.errors {
        println!("error: {e}");
    }
    for w in &result.warnings {
        println!("warning: {w}");
    }
    if result.errors.is_empty() && result.warnings.is_empty() {
        println!("ok");
    }
}

fn print_summary(config: &TouchBarConfiguration) {
    for widget in config.sorted_widgets() {
        println!(
            "{:>3}  {:<26} {}  ({} keys)",
            widget.position,
            widget.identifier(),
            widget.id,
            widget.configuration.len()
        );
    }
    let layout = &config.layout;
    println!(
        "layout: spacing {} padding {}/{}/{}/{} alignment {}",
        layout.spacing,
        layout.padding.top,
        layout.padding.leading,
        layout.padding.bottom,
        layout.padding.trailing,
        layout.alignment.as_str()
    );
    let global = &config.global_settings;
    println!(
        "global: haptic {} control strip {} gestures {} blacklisted {:?}",
        global.haptic_feedback, global.show_control_strip, global.multitouch_gestures, global.blacklisted_apps
    );
}

/// Load into `manager`, logging rather than failing on a bad file
fn load_degraded(manager: &mut ConfigurationManager) -> Option<LoadSource> {
    match manager.load() {
        Ok(source) => Some(source),
        Err(e) => {
            warn!(error = %e, "Continuing with starter preset");
            None
        }
    }
}

/// Re-save a legacy preset in the canonical format
fn migrate(manager: &mut ConfigurationManager) -> Result<()> {
    match manager.load()? {
        LoadSource::Legacy { skipped } => {
            for kind in &skipped {
                println!("skipped unknown widget type '{kind}'");
            }
            let config = manager.configuration().clone();
            print_validation(&manager.save(&config)?);
            println!("migrated {}", manager.path().display());
        }
        LoadSource::Canonical => println!("already canonical"),
        LoadSource::DefaultCreated => println!("no preset at {}", manager.path().display()),
    }
    Ok(())
}

fn watch(manager: ConfigurationManager) -> Result<()> {
    let path = manager.path().to_path_buf();
    let (handle, join) = service::spawn(manager)?;
    if let Err(e) = handle.load() {
        warn!(error = %e, "Initial load failed, continuing with starter preset");
    }

    let events = handle.subscribe()?;
    let _watcher = watcher::watch(&path, handle.clone())?;

    for event in events {
        match event {
            ConfigEvent::Reloaded { source, configuration } => {
                info!(source = ?source, widgets = configuration.widgets.len(), "Preset reloaded");
                print_validation(&handle.validate(configuration)?);
            }
            ConfigEvent::LoadFailed { message, .. } => {
                error!(error = %message, "Preset reload failed, starter preset in use");
            }
            ConfigEvent::Saved(configuration) => {
                info!(widgets = configuration.widgets.len(), "Preset saved");
            }
        }
    }

    handle.shutdown().ok();
    join.join().map_err(|_| anyhow::anyhow!("Configuration service panicked"))?;
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let catalog = WidgetCatalog::builtin();
    let path = cli.config.unwrap_or_else(ConfigurationManager::default_path);
    let legacy_export = cli.legacy_export;
    let mut manager = ConfigurationManager::new(path, catalog).with_legacy_export(legacy_export);

    match cli.command {
        Command::Show { json } => {
            load_degraded(&mut manager);
            if json {
                println!("{}", serde_json::to_string_pretty(manager.configuration())?);
            } else {
                print_summary(manager.configuration());
            }
        }
        Command::Validate => {
            manager.load().context("Cannot validate an unreadable preset")?;
            let result = manager.validate(manager.configuration());
            print_validation(&result);
            if !result.is_valid() {
                bail!("{} validation error(s)", result.errors.len());
            }
        }
        Command::Init { force } => {
            if manager.path().exists() && !force {
                bail!("{} already exists (use --force to replace it)", manager.path().display());
            }
            let starter = TouchBarConfiguration::starter(catalog);
            print_validation(&manager.save(&starter)?);
            println!("wrote {}", manager.path().display());
        }
        Command::Migrate => {
            if !legacy_export.keeps_canonical() {
                bail!("migrate needs --legacy-export sibling or off; overwrite would leave the legacy form in place");
            }
            migrate(&mut manager)?;
        }
        Command::ExportLegacy { output } => {
            load_degraded(&mut manager);
            manager.export_legacy(&output)?;
            println!("wrote {}", output.display());
        }
        Command::Catalog { category, search } => {
            let mut descriptors: Vec<_> = match category.as_deref() {
                Some(name) => {
                    let category = WidgetCategory::parse(name)
                        .with_context(|| format!("Unknown category '{name}'"))?;
                    catalog.by_category(category)
                }
                None => catalog.all().iter().collect(),
            };
            if let Some(query) = search {
                let matches = catalog.search(&query);
                descriptors.retain(|d| matches.iter().any(|m| m.identifier == d.identifier));
            }
            for d in descriptors {
                println!("{:<26} {:<15} {}", d.identifier, d.category, d.description);
            }
        }
        Command::Defaults { identifier } => {
            let descriptor = catalog
                .by_identifier(&identifier)
                .with_context(|| format!("Unknown widget type '{identifier}'"))?;
            println!("{}", serde_json::to_string_pretty(&descriptor.default_configuration())?);
        }
        Command::Watch => watch(manager)?,
    }

    Ok(())
}
