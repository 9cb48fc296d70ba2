//! Temporarily swaps a native widget for a managed-layer label.
//!
//! Native widgets composite above the managed UI, so anything that has to
//! cover a field (dialogs, scroll clipping) needs the widget hidden and a
//! look-alike label drawn in its place.

use crate::config::Rgba;

/// What the overlay needs from the field it is covering.
pub trait OverlayHost {
    fn native_visible(&self) -> bool;
    fn set_native_visible(&mut self, visible: bool);
    fn unfocus(&mut self);
    fn text(&self) -> String;
    fn placeholder(&self) -> String;
    fn text_color(&self) -> Rgba;
    fn placeholder_color(&self) -> Rgba;
    fn show_label(&mut self, text: &str, color: Rgba);
    fn hide_label(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayReplacement {
    depth: u32,
    text: String,
    placeholder: String,
    restore_visible: bool,
}

impl OverlayReplacement {
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_engaged(&self) -> bool {
        self.depth > 0
    }

    /// Nested calls only count; the swap happens on the first one.
    pub fn engage(&mut self, host: &mut dyn OverlayHost) {
        self.depth += 1;
        if self.depth > 1 {
            return;
        }

        host.unfocus();
        self.text = host.text();
        self.placeholder = host.placeholder();
        self.restore_visible = host.native_visible();
        self.refresh_label(host);
        host.set_native_visible(false);
    }

    pub fn update_while_engaged(&mut self, text: &str, host: &mut dyn OverlayHost) {
        if !self.is_engaged() || self.text == text {
            return;
        }

        self.text = text.to_string();
        self.refresh_label(host);
    }

    /// Replaces the visibility the final disengage restores. Ignored when
    /// not engaged.
    pub fn set_restore_visible(&mut self, visible: bool) {
        if self.is_engaged() {
            self.restore_visible = visible;
        }
    }

    /// Unbalanced calls are ignored.
    pub fn disengage(&mut self, host: &mut dyn OverlayHost) {
        if self.depth == 0 {
            return;
        }

        self.depth -= 1;
        if self.depth > 0 {
            return;
        }

        host.set_native_visible(self.restore_visible);
        host.hide_label();
    }

    fn refresh_label(&self, host: &mut dyn OverlayHost) {
        if self.text.is_empty() {
            let color = host.placeholder_color();
            host.show_label(&self.placeholder, color);
        } else {
            let color = host.text_color();
            host.show_label(&self.text, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeHost {
        visible: bool,
        focused: bool,
        text: String,
        placeholder: String,
        label: Option<(String, Rgba)>,
        visibility_changes: usize,
    }

    const TEXT: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    const HINT: Rgba = Rgba::new(0.5, 0.5, 0.5, 1.0);

    impl OverlayHost for FakeHost {
        fn native_visible(&self) -> bool {
            self.visible
        }

        fn set_native_visible(&mut self, visible: bool) {
            self.visible = visible;
            self.visibility_changes += 1;
        }

        fn unfocus(&mut self) {
            self.focused = false;
        }

        fn text(&self) -> String {
            self.text.clone()
        }

        fn placeholder(&self) -> String {
            self.placeholder.clone()
        }

        fn text_color(&self) -> Rgba {
            TEXT
        }

        fn placeholder_color(&self) -> Rgba {
            HINT
        }

        fn show_label(&mut self, text: &str, color: Rgba) {
            self.label = Some((text.to_string(), color));
        }

        fn hide_label(&mut self) {
            self.label = None;
        }
    }

    fn host(text: &str) -> FakeHost {
        FakeHost {
            visible: true,
            focused: true,
            text: text.to_string(),
            placeholder: "Search".to_string(),
            ..FakeHost::default()
        }
    }

    #[test]
    fn engage_swaps_widget_for_label() {
        let mut host = host("hello");
        let mut overlay = OverlayReplacement::default();

        overlay.engage(&mut host);

        assert!(!host.visible);
        assert!(!host.focused);
        assert_eq!(host.label, Some(("hello".to_string(), TEXT)));
    }

    #[test]
    fn empty_text_shows_placeholder() {
        let mut host = host("");
        let mut overlay = OverlayReplacement::default();

        overlay.engage(&mut host);

        assert_eq!(host.label, Some(("Search".to_string(), HINT)));
    }

    #[test]
    fn nested_engagements_toggle_once() {
        let mut host = host("x");
        let mut overlay = OverlayReplacement::default();

        for _ in 0..3 {
            overlay.engage(&mut host);
        }
        assert_eq!(overlay.depth(), 3);
        assert_eq!(host.visibility_changes, 1);

        overlay.disengage(&mut host);
        overlay.disengage(&mut host);
        assert!(!host.visible);
        assert!(host.label.is_some());

        overlay.disengage(&mut host);
        assert!(host.visible);
        assert!(host.label.is_none());
        assert_eq!(host.visibility_changes, 2);
    }

    #[test]
    fn balanced_sequence_restores_prior_visibility() {
        let mut host = host("x");
        host.visible = false;
        let mut overlay = OverlayReplacement::default();

        overlay.engage(&mut host);
        overlay.engage(&mut host);
        overlay.disengage(&mut host);
        overlay.disengage(&mut host);

        assert!(!host.visible);
    }

    #[test]
    fn restore_target_can_change_while_engaged() {
        let mut host = host("x");
        let mut overlay = OverlayReplacement::default();

        overlay.set_restore_visible(false);
        overlay.engage(&mut host);
        overlay.set_restore_visible(false);
        assert!(!host.visible);

        overlay.disengage(&mut host);
        assert!(!host.visible);
        assert!(host.label.is_none());
    }

    #[test]
    fn unbalanced_disengage_is_ignored() {
        let mut host = host("x");
        let mut overlay = OverlayReplacement::default();

        overlay.disengage(&mut host);

        assert_eq!(overlay.depth(), 0);
        assert!(host.visible);
        assert_eq!(host.visibility_changes, 0);
    }

    #[test]
    fn label_follows_text_while_engaged() {
        let mut host = host("");
        let mut overlay = OverlayReplacement::default();

        overlay.update_while_engaged("ignored", &mut host);
        assert!(host.label.is_none());

        overlay.engage(&mut host);
        overlay.update_while_engaged("typed", &mut host);
        assert_eq!(host.label, Some(("typed".to_string(), TEXT)));

        overlay.update_while_engaged("", &mut host);
        assert_eq!(host.label, Some(("Search".to_string(), HINT)));
    }
}
