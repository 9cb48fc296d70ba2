use std::mem;

use log::{debug, warn};

use crate::config::{BridgeSettings, FieldConfig, FieldOptions, Rgba};
use crate::element::ManagedElement;
use crate::geometry::{GeometrySync, ScreenRatio, Size, Vec2};
use crate::overlay::{OverlayHost, OverlayReplacement};
use crate::peer::{self, NativePeer, Platform};
use crate::protocol::{Command, CreateEdit, FieldEvent, RectPayload};
use crate::registry::FieldId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPhase {
    Detached,
    /// Registered, waiting for the hosting layout to settle.
    Attaching,
    /// Config captured; no native widget requested yet.
    ConfigPending,
    /// `CREATE_EDIT` sent, waiting for `READY`.
    Created,
    Ready,
    Destroying,
}

/// Key input the managed layer saw this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPress {
    Backspace,
    Enter,
    Char(char),
}

impl KeyPress {
    fn wire_name(&self) -> String {
        match self {
            KeyPress::Backspace => "backspace".to_string(),
            KeyPress::Enter => "enter".to_string(),
            KeyPress::Char(ch) => ch.to_string(),
        }
    }
}

/// Input for one UI update cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Screen size in device pixels.
    pub screen: Size,
    /// Active touch points in device pixels, top-left origin.
    pub touches: Vec<Vec2>,
    pub keys: Vec<KeyPress>,
}

impl Frame {
    pub fn new(screen: Size) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPolicy {
    pub timeout_ticks: u32,
    pub max_create_attempts: u32,
}

impl From<&BridgeSettings> for ReadyPolicy {
    fn from(settings: &BridgeSettings) -> Self {
        Self {
            timeout_ticks: settings.ready_timeout_ticks,
            max_create_attempts: settings.max_create_attempts,
        }
    }
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self::from(&BridgeSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRuntimeState {
    pub created: bool,
    pub visible: bool,
    /// Focus requested before the native widget existed.
    pub pending_focus: Option<bool>,
    /// Visibility requested before the native widget existed.
    pub pending_visible: Option<bool>,
    pub text: String,
    pub placeholder: String,
    /// Last focus state the peer reported.
    pub native_focus: Option<bool>,
}

impl Default for FieldRuntimeState {
    fn default() -> Self {
        Self {
            created: false,
            visible: true,
            pending_focus: None,
            pending_visible: None,
            text: String::new(),
            placeholder: String::new(),
            native_focus: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ReadyWatch {
    waited: u32,
    attempts: u32,
    stalled: bool,
}

#[derive(Default)]
pub struct FieldCallbacks {
    pub on_ready: Option<Box<dyn FnMut()>>,
    pub on_text_changed: Option<Box<dyn FnMut(&str)>>,
    pub on_focus_changed: Option<Box<dyn FnMut(bool)>>,
    pub on_return_pressed: Option<Box<dyn FnMut()>>,
}

/// A managed text element backed by a native widget.
pub struct NativeInputField {
    element: Box<dyn ManagedElement>,
    options: FieldOptions,
    callbacks: FieldCallbacks,
    id: FieldId,
    phase: FieldPhase,
    config: Option<FieldConfig>,
    state: FieldRuntimeState,
    geometry: Option<GeometrySync>,
    screen: Size,
    overlay: OverlayReplacement,
    ready: ReadyWatch,
}

impl NativeInputField {
    pub fn new(element: Box<dyn ManagedElement>, options: FieldOptions) -> Self {
        Self {
            element,
            options,
            callbacks: FieldCallbacks::default(),
            id: FieldId::INVALID,
            phase: FieldPhase::Detached,
            config: None,
            state: FieldRuntimeState::default(),
            geometry: None,
            screen: Size::default(),
            overlay: OverlayReplacement::default(),
            ready: ReadyWatch::default(),
        }
    }

    pub fn on_ready(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.on_ready = Some(Box::new(f));
        self
    }

    pub fn on_text_changed(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.callbacks.on_text_changed = Some(Box::new(f));
        self
    }

    pub fn on_focus_changed(mut self, f: impl FnMut(bool) + 'static) -> Self {
        self.callbacks.on_focus_changed = Some(Box::new(f));
        self
    }

    pub fn on_return_pressed(mut self, f: impl FnMut() + 'static) -> Self {
        self.callbacks.on_return_pressed = Some(Box::new(f));
        self
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn phase(&self) -> FieldPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == FieldPhase::Ready
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn is_stalled(&self) -> bool {
        self.ready.stalled
    }

    pub fn create_attempts(&self) -> u32 {
        self.ready.attempts
    }

    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn config(&self) -> Option<&FieldConfig> {
        self.config.as_ref()
    }

    pub fn runtime_state(&self) -> &FieldRuntimeState {
        &self.state
    }

    pub fn overlay_depth(&self) -> u32 {
        self.overlay.depth()
    }

    pub fn attach(&mut self, id: FieldId) {
        self.id = id;
        self.phase = FieldPhase::Attaching;
        self.config = None;
        self.geometry = None;
        self.ready = ReadyWatch::default();
        self.state = FieldRuntimeState {
            text: self.element.text(),
            placeholder: self.options.placeholder.clone(),
            ..FieldRuntimeState::default()
        };
    }

    /// The hosting layout has settled: measure, capture config and, where a
    /// native peer exists, request the widget.
    pub fn layout_changed(&mut self, screen: Size, peer: &mut dyn NativePeer) {
        if self.phase != FieldPhase::Attaching {
            return;
        }

        let Some(ratio) = ScreenRatio::measure(screen, self.element.root_size()) else {
            debug!("field {}: root not laid out yet; deferring creation", self.id);
            return;
        };

        self.screen = screen;
        self.geometry = Some(GeometrySync::new(ratio));
        let mut config = FieldConfig::capture(&self.element.style(), &self.options);
        config.placeholder = self.state.placeholder.clone();
        self.config = Some(config);
        self.phase = FieldPhase::ConfigPending;

        if peer.platform().has_native_widget() {
            self.create(peer);
        }
    }

    fn create(&mut self, peer: &mut dyn NativePeer) {
        let (Some(geometry), Some(config)) = (self.geometry.as_mut(), self.config.as_ref()) else {
            return;
        };

        let rect = geometry.normalize(self.element.world_bounds(), self.screen);
        geometry.mark_sent(rect);
        let create = Command::CreateEdit(CreateEdit::new(rect, config));

        peer::send(peer, self.id, &create);
        self.state.text = self.element.text();
        peer::send(
            peer,
            self.id,
            &Command::SetText {
                text: self.state.text.clone(),
            },
        );

        self.ready.attempts += 1;
        self.ready.waited = 0;
        self.phase = FieldPhase::Created;
    }

    pub fn handle(&mut self, event: FieldEvent, peer: &mut dyn NativePeer) {
        match event {
            FieldEvent::Ready => self.on_native_ready(peer),
            FieldEvent::TextChange(text) => {
                if text == self.element.text() {
                    return;
                }
                self.apply_text(&text, peer);
            }
            FieldEvent::TextEndEdit(text) => {
                self.apply_text(&text, peer);
                self.set_focus(false, peer);
            }
            FieldEvent::Focus => self.on_native_focus(true),
            FieldEvent::Unfocus => self.on_native_focus(false),
            FieldEvent::ReturnPressed => {
                if let Some(callback) = self.callbacks.on_return_pressed.as_mut() {
                    callback();
                }
            }
        }
    }

    fn on_native_ready(&mut self, peer: &mut dyn NativePeer) {
        if self.phase != FieldPhase::Created {
            debug!("field {}: ignoring READY in {:?}", self.id, self.phase);
            return;
        }

        self.phase = FieldPhase::Ready;
        self.state.created = true;
        self.ready.stalled = false;

        if let Some(visible) = self.state.pending_visible.take() {
            self.apply_visible(visible, peer);
        }
        if let Some(focused) = self.state.pending_focus.take() {
            self.apply_focus(focused, peer);
        }

        if let Some(callback) = self.callbacks.on_ready.as_mut() {
            callback();
        }
    }

    fn on_native_focus(&mut self, focused: bool) {
        self.state.native_focus = Some(focused);
        if let Some(callback) = self.callbacks.on_focus_changed.as_mut() {
            callback(focused);
        }
    }

    fn apply_text(&mut self, text: &str, peer: &mut dyn NativePeer) {
        self.state.text = text.to_string();
        self.element.set_text(text);

        if let Some(callback) = self.callbacks.on_text_changed.as_mut() {
            callback(text);
        }

        self.with_overlay(peer, |overlay, host| overlay.update_while_engaged(text, host));
    }

    /// Focus requests are dropped while the overlay covers the field.
    pub fn set_focus(&mut self, focused: bool, peer: &mut dyn NativePeer) {
        if focused && self.overlay.is_engaged() {
            debug!("field {}: overlay engaged; ignoring focus request", self.id);
            return;
        }
        self.apply_focus(focused, peer);
    }

    fn apply_focus(&mut self, focused: bool, peer: &mut dyn NativePeer) {
        if focused {
            self.state.native_focus = None;
        }

        if self.phase == FieldPhase::Ready {
            peer::send(peer, self.id, &Command::SetFocus { is_focus: focused });
        } else if !peer.platform().has_native_widget() {
            self.element.set_local_focus(focused);
        } else {
            self.state.pending_focus = Some(focused);
        }
    }

    /// While the overlay is engaged the request is kept for the final
    /// disengage instead of reaching the native widget.
    pub fn set_visible(&mut self, visible: bool, peer: &mut dyn NativePeer) {
        if self.overlay.is_engaged() {
            self.overlay.set_restore_visible(visible);
            return;
        }
        self.apply_visible(visible, peer);
    }

    fn apply_visible(&mut self, visible: bool, peer: &mut dyn NativePeer) {
        self.state.visible = visible;

        if self.phase == FieldPhase::Ready {
            peer::send(
                peer,
                self.id,
                &Command::SetVisible {
                    is_visible: visible,
                },
            );
        } else {
            self.state.pending_visible = Some(visible);
        }
    }

    /// Drops focus, which dismisses the keyboard.
    pub fn hide(&mut self, peer: &mut dyn NativePeer) {
        self.set_focus(false, peer);
    }

    pub fn set_text(&mut self, text: &str, peer: &mut dyn NativePeer) {
        if self.element.text() != text {
            self.element.set_text(text);
        }
        self.state.text = text.to_string();

        if self.native_requested() {
            peer::send(
                peer,
                self.id,
                &Command::SetText {
                    text: text.to_string(),
                },
            );
        }

        self.with_overlay(peer, |overlay, host| overlay.update_while_engaged(text, host));
    }

    pub fn set_placeholder(&mut self, placeholder: &str, peer: &mut dyn NativePeer) {
        self.state.placeholder = placeholder.to_string();

        if self.native_requested() {
            peer::send(
                peer,
                self.id,
                &Command::SetPlaceholder {
                    placeholder: placeholder.to_string(),
                },
            );
        }
    }

    fn native_requested(&self) -> bool {
        matches!(self.phase, FieldPhase::Created | FieldPhase::Ready)
    }

    pub fn engage_overlay(&mut self, peer: &mut dyn NativePeer) {
        self.with_overlay(peer, |overlay, host| overlay.engage(host));
    }

    pub fn disengage_overlay(&mut self, peer: &mut dyn NativePeer) {
        self.with_overlay(peer, |overlay, host| overlay.disengage(host));
    }

    fn with_overlay(
        &mut self,
        peer: &mut dyn NativePeer,
        f: impl FnOnce(&mut OverlayReplacement, &mut dyn OverlayHost),
    ) {
        let mut overlay = mem::take(&mut self.overlay);
        f(&mut overlay, &mut FieldOverlay { field: self, peer });
        self.overlay = overlay;
    }

    /// One UI update cycle.
    pub fn tick(&mut self, frame: &Frame, policy: ReadyPolicy, peer: &mut dyn NativePeer) {
        if frame.screen != Size::default() {
            self.screen = frame.screen;
        }

        match self.phase {
            FieldPhase::Created => self.watch_ready(policy, peer),
            FieldPhase::Ready => self.sync_ready(frame, peer),
            _ => {}
        }
    }

    fn watch_ready(&mut self, policy: ReadyPolicy, peer: &mut dyn NativePeer) {
        if self.ready.stalled {
            return;
        }

        self.ready.waited += 1;
        if self.ready.waited < policy.timeout_ticks {
            return;
        }

        if self.ready.attempts >= policy.max_create_attempts {
            self.ready.stalled = true;
            warn!(
                "field {}: native peer never sent READY after {} create attempt(s); giving up",
                self.id, self.ready.attempts
            );
            return;
        }

        warn!(
            "field {}: no READY after {} ticks; recreating native widget",
            self.id, self.ready.waited
        );
        peer::send(peer, self.id, &Command::RemoveEdit);
        self.create(peer);
    }

    fn sync_ready(&mut self, frame: &Frame, peer: &mut dyn NativePeer) {
        let platform = peer.platform();

        if platform == Platform::Android {
            for key in &frame.keys {
                peer::send(
                    peer,
                    self.id,
                    &Command::AndroidKeyDown {
                        key: key.wire_name(),
                    },
                );
            }
        }

        let bounds = self.element.world_bounds();
        let Some(geometry) = self.geometry.as_mut() else {
            return;
        };

        if platform.is_touch() && geometry.any_touch_outside(bounds, &frame.touches) {
            if !self.options.manual_hide_control && self.state.native_focus != Some(false) {
                self.hide(peer);
            }
            return;
        }

        if let Some(rect) = geometry.poll(bounds, self.screen) {
            peer::send(peer, self.id, &Command::SetRect(RectPayload::from(rect)));
        }
    }

    /// Tears down the native widget. `REMOVE_EDIT` goes out in every phase so
    /// an in-flight creation is cancelled too.
    pub fn detach(&mut self, peer: &mut dyn NativePeer) {
        if self.phase == FieldPhase::Detached {
            return;
        }

        let was_ready = self.phase == FieldPhase::Ready;
        self.phase = FieldPhase::Destroying;

        if was_ready {
            peer::send(peer, self.id, &Command::SetFocus { is_focus: false });
            peer::send(peer, self.id, &Command::SetVisible { is_visible: false });
            self.state.visible = false;
        }
        peer::send(peer, self.id, &Command::RemoveEdit);

        if self.overlay.is_engaged() {
            self.element.hide_replacement_label();
            self.overlay = OverlayReplacement::default();
        }

        self.state.created = false;
        self.geometry = None;
        self.id = FieldId::INVALID;
        self.phase = FieldPhase::Detached;
    }

    fn label_colors(&self) -> (Rgba, Rgba) {
        match &self.config {
            Some(config) => (config.text_color, config.placeholder_color),
            None => (self.element.style().text_color, self.options.placeholder_color),
        }
    }
}

struct FieldOverlay<'a> {
    field: &'a mut NativeInputField,
    peer: &'a mut dyn NativePeer,
}

impl OverlayHost for FieldOverlay<'_> {
    fn native_visible(&self) -> bool {
        self.field.state.visible
    }

    fn set_native_visible(&mut self, visible: bool) {
        self.field.apply_visible(visible, &mut *self.peer);
    }

    fn unfocus(&mut self) {
        self.field.apply_focus(false, &mut *self.peer);
    }

    fn text(&self) -> String {
        self.field.state.text.clone()
    }

    fn placeholder(&self) -> String {
        self.field.state.placeholder.clone()
    }

    fn text_color(&self) -> Rgba {
        self.field.label_colors().0
    }

    fn placeholder_color(&self) -> Rgba {
        self.field.label_colors().1
    }

    fn show_label(&mut self, text: &str, color: Rgba) {
        self.field.element.show_replacement_label(text, color);
    }

    fn hide_label(&mut self) {
        self.field.element.hide_replacement_label();
    }
}
