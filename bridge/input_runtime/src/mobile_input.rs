use log::{debug, error, warn};

use crate::config::BridgeSettings;
use crate::dispatcher::{MOBILE_INPUT_PLUGIN, Plugin};
use crate::field::{Frame, NativeInputField, ReadyPolicy};
use crate::geometry::Size;
use crate::peer::NativePeer;
use crate::protocol::{Inbound, Message, NativeEvent};
use crate::registry::{FieldId, FieldRegistry};

/// Last keyboard report from the native layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub visible: bool,
    /// Keyboard height in device pixels, `0` when hidden.
    pub height: i32,
}

/// The mobile-input plugin: owns every native field and the peer they talk
/// to.
pub struct MobileInput {
    peer: Box<dyn NativePeer>,
    fields: FieldRegistry<NativeInputField>,
    policy: ReadyPolicy,
    suspended: bool,
    pending_data: Option<Message>,
    pending_error: Option<Message>,
    keyboard: KeyboardState,
    on_keyboard: Option<Box<dyn FnMut(KeyboardState)>>,
}

impl MobileInput {
    pub fn new(settings: &BridgeSettings, peer: Box<dyn NativePeer>) -> Self {
        Self::with_registry(settings, peer, FieldRegistry::new())
    }

    /// A plugin whose registrations all fail with [`FieldId::INVALID`].
    pub fn inactive(settings: &BridgeSettings, peer: Box<dyn NativePeer>) -> Self {
        Self::with_registry(settings, peer, FieldRegistry::inactive())
    }

    fn with_registry(
        settings: &BridgeSettings,
        peer: Box<dyn NativePeer>,
        fields: FieldRegistry<NativeInputField>,
    ) -> Self {
        Self {
            peer,
            fields,
            policy: ReadyPolicy::from(settings),
            suspended: false,
            pending_data: None,
            pending_error: None,
            keyboard: KeyboardState::default(),
            on_keyboard: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.fields.is_active()
    }

    pub fn set_on_keyboard(&mut self, callback: impl FnMut(KeyboardState) + 'static) {
        self.on_keyboard = Some(Box::new(callback));
    }

    pub fn keyboard(&self) -> KeyboardState {
        self.keyboard
    }

    pub fn field(&self, id: FieldId) -> Option<&NativeInputField> {
        self.fields.resolve(id)
    }

    pub fn field_ids(&self) -> Vec<FieldId> {
        self.fields.ids()
    }

    /// Registers `field` and starts its lifecycle. Returns
    /// [`FieldId::INVALID`] when the plugin is inactive; the field is dropped.
    pub fn attach(&mut self, field: NativeInputField) -> FieldId {
        let id = self.fields.register(field);
        if let Some(field) = self.fields.resolve_mut(id) {
            field.attach(id);
            debug!("attached field {id} ({} live)", self.fields.len());
        }
        id
    }

    pub fn layout_changed(&mut self, id: FieldId, screen: Size) {
        self.with_field(id, |field, peer| field.layout_changed(screen, peer));
    }

    /// Unregisters the field first so late events for `id` are dropped.
    pub fn detach(&mut self, id: FieldId) -> Option<NativeInputField> {
        let mut field = self.fields.remove(id)?;
        field.detach(self.peer.as_mut());
        debug!("detached field {id}");
        Some(field)
    }

    pub fn set_focus(&mut self, id: FieldId, focused: bool) {
        self.with_field(id, |field, peer| field.set_focus(focused, peer));
    }

    pub fn set_visible(&mut self, id: FieldId, visible: bool) {
        self.with_field(id, |field, peer| field.set_visible(visible, peer));
    }

    pub fn set_text(&mut self, id: FieldId, text: &str) {
        self.with_field(id, |field, peer| field.set_text(text, peer));
    }

    pub fn set_placeholder(&mut self, id: FieldId, placeholder: &str) {
        self.with_field(id, |field, peer| field.set_placeholder(placeholder, peer));
    }

    pub fn hide(&mut self, id: FieldId) {
        self.with_field(id, |field, peer| field.hide(peer));
    }

    pub fn engage_overlay(&mut self, id: FieldId) {
        self.with_field(id, |field, peer| field.engage_overlay(peer));
    }

    pub fn disengage_overlay(&mut self, id: FieldId) {
        self.with_field(id, |field, peer| field.disengage_overlay(peer));
    }

    fn with_field(&mut self, id: FieldId, f: impl FnOnce(&mut NativeInputField, &mut dyn NativePeer)) {
        match self.fields.resolve_mut(id) {
            Some(field) => f(field, self.peer.as_mut()),
            None => debug!("no field {id}; ignoring call"),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn pause(&mut self) {
        self.suspended = true;
    }

    /// Replays what arrived while paused: pending data, then pending error.
    pub fn resume(&mut self) {
        self.suspended = false;

        if let Some(data) = self.pending_data.take() {
            self.handle_data(data);
        }
        if let Some(data) = self.pending_error.take() {
            self.handle_error(data);
        }
    }

    /// Losing application focus dismisses every keyboard.
    pub fn app_focus_changed(&mut self, focused: bool) {
        if focused {
            return;
        }

        let peer = self.peer.as_mut();
        for (_, field) in self.fields.iter_mut() {
            field.hide(peer);
        }
    }

    pub fn tick(&mut self, frame: &Frame) {
        let peer = self.peer.as_mut();
        for (_, field) in self.fields.iter_mut() {
            field.tick(frame, self.policy, peer);
        }
    }

    pub fn shutdown(&mut self) {
        for id in self.fields.ids() {
            self.detach(id);
        }
    }

    fn handle_data(&mut self, data: Message) {
        let event = match NativeEvent::decode(&data) {
            Ok(event) => event,
            Err(err) => {
                warn!("{MOBILE_INPUT_PLUGIN}: dropping message: {err}");
                return;
            }
        };

        match event.route() {
            Inbound::Field(id, event) => match self.fields.resolve_mut(id) {
                Some(field) => field.handle(event, self.peer.as_mut()),
                None => debug!("{MOBILE_INPUT_PLUGIN}: no field {id}; dropping {event:?}"),
            },
            Inbound::Keyboard { show, height } => {
                self.keyboard = KeyboardState {
                    visible: show,
                    height: if show { height } else { 0 },
                };
                if let Some(callback) = self.on_keyboard.as_mut() {
                    callback(self.keyboard);
                }
            }
        }
    }

    fn handle_error(&mut self, data: Message) {
        error!("{MOBILE_INPUT_PLUGIN} reported an error: {}", serde_json::Value::Object(data));
    }
}

impl Plugin for MobileInput {
    fn on_data(&mut self, data: Message) {
        if self.suspended {
            self.pending_data = Some(data);
            return;
        }
        self.handle_data(data);
    }

    fn on_error(&mut self, data: Message) {
        if self.suspended {
            self.pending_error = Some(data);
            return;
        }
        self.handle_error(data);
    }
}
