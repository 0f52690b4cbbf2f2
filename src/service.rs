//! Single-owner configuration service
//!
//! One thread owns the `ConfigurationManager`; everything else talks to it
//! through a `ConfigHandle`. Requests are served strictly in arrival order,
//! so a save is never overtaken by a load issued after it.

use anyhow::{anyhow, Result};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, error, info, warn};

use crate::config::{
    ConfigurationError, ConfigurationManager, LoadSource, TouchBarConfiguration, ValidationResult,
};

/// Requests sent to the service thread
#[derive(Debug)]
pub enum ConfigRequest {
    /// Read the preset file into memory
    Load(Sender<Result<LoadSource, ConfigurationError>>),

    /// Snapshot of the in-memory preset
    Get(Sender<TouchBarConfiguration>),

    /// Validate and persist a preset
    Save(TouchBarConfiguration, Sender<Result<ValidationResult, ConfigurationError>>),

    /// Validate without persisting
    Validate(TouchBarConfiguration, Sender<ValidationResult>),

    /// The file changed on disk; reload wholesale, no reply
    Reload,

    /// Register for change notifications
    Subscribe(Sender<ConfigEvent>),

    /// Stop serving requests
    Shutdown,
}

/// Notifications pushed to subscribers (e.g. the Touch Bar renderer)
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// Preset reloaded from disk
    Reloaded {
        source: LoadSource,
        configuration: TouchBarConfiguration,
    },

    /// Reload failed; the starter preset is now in use
    LoadFailed {
        message: String,
        configuration: TouchBarConfiguration,
    },

    /// Preset written by a `Save` request
    Saved(TouchBarConfiguration),
}

/// Cloneable sender side of the service
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    tx: Sender<ConfigRequest>,
}

impl ConfigHandle {
    fn send(&self, request: ConfigRequest) -> Result<()> {
        self.tx
            .send(request)
            .map_err(|_| anyhow!("Configuration service is not running"))
    }

    fn call<T>(&self, request: impl FnOnce(Sender<T>) -> ConfigRequest) -> Result<T> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(request(reply_tx))?;
        reply_rx
            .recv()
            .map_err(|_| anyhow!("Configuration service stopped before replying"))
    }

    pub fn load(&self) -> Result<LoadSource> {
        Ok(self.call(ConfigRequest::Load)??)
    }

    pub fn configuration(&self) -> Result<TouchBarConfiguration> {
        self.call(ConfigRequest::Get)
    }

    pub fn save(&self, config: TouchBarConfiguration) -> Result<ValidationResult> {
        Ok(self.call(|reply| ConfigRequest::Save(config, reply))??)
    }

    pub fn validate(&self, config: TouchBarConfiguration) -> Result<ValidationResult> {
        self.call(|reply| ConfigRequest::Validate(config, reply))
    }

    /// Queue a wholesale reload; returns once queued, not once done
    pub fn reload(&self) -> Result<()> {
        self.send(ConfigRequest::Reload)
    }

    pub fn subscribe(&self) -> Result<Receiver<ConfigEvent>> {
        let (tx, rx) = mpsc::channel();
        self.send(ConfigRequest::Subscribe(tx))?;
        Ok(rx)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(ConfigRequest::Shutdown)
    }
}

/// Spawn the service thread owning `manager`
pub fn spawn(manager: ConfigurationManager) -> Result<(ConfigHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("config-service".to_string())
        .spawn(move || run(manager, rx))?;
    info!("Configuration service started");
    Ok((ConfigHandle { tx }, handle))
}

fn run(mut manager: ConfigurationManager, rx: Receiver<ConfigRequest>) {
    let mut subscribers: Vec<Sender<ConfigEvent>> = Vec::new();

    for request in rx {
        debug!(request = ?request_name(&request), "Handling configuration request");
        match request {
            ConfigRequest::Load(reply) => {
                let _ = reply.send(manager.load());
            }
            ConfigRequest::Get(reply) => {
                let _ = reply.send(manager.configuration().clone());
            }
            ConfigRequest::Save(config, reply) => {
                let result = manager.save(&config);
                if result.is_ok() {
                    broadcast(&mut subscribers, ConfigEvent::Saved(config));
                }
                let _ = reply.send(result);
            }
            ConfigRequest::Validate(config, reply) => {
                let _ = reply.send(manager.validate(&config));
            }
            ConfigRequest::Reload => {
                // External edits win over unsaved in-memory state
                let event = match manager.load() {
                    Ok(source) => ConfigEvent::Reloaded {
                        source,
                        configuration: manager.configuration().clone(),
                    },
                    Err(e) => {
                        error!(error = %e, "Reload after file change failed");
                        ConfigEvent::LoadFailed {
                            message: e.to_string(),
                            configuration: manager.configuration().clone(),
                        }
                    }
                };
                broadcast(&mut subscribers, event);
            }
            ConfigRequest::Subscribe(tx) => subscribers.push(tx),
            ConfigRequest::Shutdown => {
                info!("Configuration service shutting down");
                return;
            }
        }
    }

    warn!("All configuration handles dropped, service exiting");
}

fn broadcast(subscribers: &mut Vec<Sender<ConfigEvent>>, event: ConfigEvent) {
    subscribers.retain(|tx| tx.send(event.clone()).is_ok());
}

fn request_name(request: &ConfigRequest) -> &'static str {
    match request {
        ConfigRequest::Load(_) => "load",
        ConfigRequest::Get(_) => "get",
        ConfigRequest::Save(..) => "save",
        ConfigRequest::Validate(..) => "validate",
        ConfigRequest::Reload => "reload",
        ConfigRequest::Subscribe(_) => "subscribe",
        ConfigRequest::Shutdown => "shutdown",
    }
}
