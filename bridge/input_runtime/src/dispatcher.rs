//! Routes native plugin envelopes to the plugin registered under their name.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::protocol::{self, Envelope, Message};

pub const MOBILE_INPUT_PLUGIN: &str = "gdmobileinput";
/// Name older native layers still send for the mobile-input plugin.
pub const LEGACY_MOBILE_INPUT_PLUGIN: &str = "mobileinput";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    MobileInput,
}

pub trait Plugin {
    fn on_data(&mut self, data: Message);

    fn on_error(&mut self, data: Message);
}

/// Gives the dispatcher access to the live plugin instances.
pub trait PluginHost {
    fn plugin_mut(&mut self, kind: PluginKind) -> Option<&mut dyn Plugin>;
}

#[derive(Debug, Default)]
pub struct PluginDispatcher {
    routes: HashMap<String, PluginKind>,
    aliases: HashMap<String, String>,
}

impl PluginDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The dispatcher the bridge starts with: mobile input under its current
    /// name, with the legacy name folded onto it.
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(MOBILE_INPUT_PLUGIN, PluginKind::MobileInput);
        dispatcher.alias(LEGACY_MOBILE_INPUT_PLUGIN, MOBILE_INPUT_PLUGIN);
        dispatcher
    }

    /// Returns the handler previously registered under `name`, if any.
    pub fn register(&mut self, name: &str, kind: PluginKind) -> Option<PluginKind> {
        self.routes.insert(name.to_string(), kind)
    }

    /// Messages for `legacy` go to `target`, even when `legacy` has its own
    /// registration.
    pub fn alias(&mut self, legacy: &str, target: &str) {
        self.aliases.insert(legacy.to_string(), target.to_string());
    }

    pub fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Decodes `raw` and finds its plugin without delivering it.
    pub fn route(&self, raw: &str) -> Result<(PluginKind, Envelope)> {
        let mut envelope = protocol::decode_envelope(raw)?;
        let name = self.resolve_name(&envelope.name).to_string();

        let kind = self
            .routes
            .get(&name)
            .copied()
            .ok_or_else(|| BridgeError::UnknownPlugin(name.clone()))?;

        envelope.name = name;
        Ok((kind, envelope))
    }

    /// Delivers one raw envelope. Failures are logged and the message dropped.
    pub fn dispatch(&self, raw: &str, host: &mut dyn PluginHost) {
        let (kind, envelope) = match self.route(raw) {
            Ok(routed) => routed,
            Err(err @ BridgeError::UnknownPlugin(_)) => {
                warn!("{err}");
                return;
            }
            Err(err) => {
                warn!("dropping malformed plugin message: {err}; raw={raw}");
                return;
            }
        };

        let Some(plugin) = host.plugin_mut(kind) else {
            warn!("{} plugin is not running; dropping message", envelope.name);
            return;
        };

        debug!(
            "dispatch {} to {} ({})",
            if envelope.is_error { "error" } else { "data" },
            envelope.name,
            envelope.body.len()
        );

        if envelope.is_error {
            plugin.on_error(envelope.body);
        } else {
            plugin.on_data(envelope.body);
        }
    }
}
