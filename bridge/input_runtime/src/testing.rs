//! Test doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::Rgba;
use crate::element::{ElementStyle, ManagedElement};
use crate::geometry::{Rect, Size};
use crate::peer::{NativePeer, Platform};
use crate::protocol::{Command, Message};
use crate::registry::FieldId;

/// Records every command after decoding it back from the wire form.
#[derive(Debug)]
pub struct RecordingPeer {
    platform: Platform,
    sent: Rc<RefCell<Vec<(FieldId, Command)>>>,
}

impl RecordingPeer {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            sent: Rc::default(),
        }
    }

    /// A second handle onto the same log, for peers moved into a bridge.
    pub fn handle(&self) -> Self {
        Self {
            platform: self.platform,
            sent: self.sent.clone(),
        }
    }

    pub fn sent(&self) -> Vec<(FieldId, Command)> {
        self.sent.borrow().clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.sent().into_iter().map(|(_, command)| command).collect()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.sent.borrow().iter().map(|(_, command)| command.kind()).collect()
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl NativePeer for RecordingPeer {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn execute(&mut self, id: FieldId, message: Message) {
        assert_eq!(message["id"], id.get(), "id must travel with the message");
        let command = Command::decode(&message).expect("peer received a decodable command");
        self.sent.borrow_mut().push((id, command));
    }
}

#[derive(Debug)]
struct ElementState {
    bounds: Rect,
    root_size: Size,
    style: ElementStyle,
    text: String,
    set_text_calls: usize,
    local_focus: Option<bool>,
    label: Option<(String, Rgba)>,
}

/// Managed element whose state stays observable after being boxed.
#[derive(Debug, Clone)]
pub struct FakeElement {
    state: Rc<RefCell<ElementState>>,
}

impl FakeElement {
    pub fn new(text: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(ElementState {
                bounds: Rect::new(10.0, 10.0, 100.0, 40.0),
                root_size: Size::new(1000.0, 2000.0),
                style: ElementStyle::default(),
                text: text.to_string(),
                set_text_calls: 0,
                local_focus: None,
                label: None,
            })),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.state.borrow().bounds
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.state.borrow_mut().bounds = bounds;
    }

    pub fn root_size_value(&self) -> Size {
        self.state.borrow().root_size
    }

    pub fn set_root_size(&self, size: Size) {
        self.state.borrow_mut().root_size = size;
    }

    pub fn text_value(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn set_text_calls(&self) -> usize {
        self.state.borrow().set_text_calls
    }

    pub fn local_focus(&self) -> Option<bool> {
        self.state.borrow().local_focus
    }

    pub fn label(&self) -> Option<(String, Rgba)> {
        self.state.borrow().label.clone()
    }
}

impl ManagedElement for FakeElement {
    fn world_bounds(&self) -> Rect {
        self.bounds()
    }

    fn root_size(&self) -> Size {
        self.root_size_value()
    }

    fn style(&self) -> ElementStyle {
        self.state.borrow().style.clone()
    }

    fn text(&self) -> String {
        self.text_value()
    }

    fn set_text(&mut self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.text = text.to_string();
        state.set_text_calls += 1;
    }

    fn set_local_focus(&mut self, focused: bool) {
        self.state.borrow_mut().local_focus = Some(focused);
    }

    fn show_replacement_label(&mut self, text: &str, color: Rgba) {
        self.state.borrow_mut().label = Some((text.to_string(), color));
    }

    fn hide_replacement_label(&mut self) {
        self.state.borrow_mut().label = None;
    }
}
