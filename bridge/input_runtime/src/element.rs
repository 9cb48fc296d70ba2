use crate::config::{Rgba, TextAlign};
use crate::geometry::{Rect, Size};

/// Resolved style of the managed text element at the moment it is laid out.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementStyle {
    /// Font size in managed-layer points.
    pub font_size: f32,
    pub text_color: Rgba,
    pub background_color: Rgba,
    pub align: TextAlign,
    pub multiline: bool,
    /// Maximum character count, `0` for unlimited.
    pub max_length: i32,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            font_size: 28.0,
            text_color: Rgba::BLACK,
            background_color: Rgba::WHITE,
            align: TextAlign::MiddleLeft,
            multiline: false,
            max_length: 0,
        }
    }
}

/// The managed UI element a native field stands in for.
///
/// Implemented by the UI toolkit integration. All calls happen on the UI
/// thread during the toolkit's update cycle.
pub trait ManagedElement {
    /// Bounds of the text area in managed UI units, relative to the root.
    fn world_bounds(&self) -> Rect;

    /// Size of the root element in managed UI units.
    fn root_size(&self) -> Size;

    fn style(&self) -> ElementStyle;

    fn text(&self) -> String;

    fn set_text(&mut self, text: &str);

    /// Focus or blur the managed element itself. Used when no native widget
    /// exists and the managed layer handles editing on its own.
    fn set_local_focus(&mut self, focused: bool);

    /// Show a plain managed-layer label in place of the native widget.
    fn show_replacement_label(&mut self, _text: &str, _color: Rgba) {}

    fn hide_replacement_label(&mut self) {}
}
