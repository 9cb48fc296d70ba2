//! Coordinate conversion between the managed UI's units, device pixels and the
//! screen-relative rectangles the native peer understands.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

/// Device pixels per managed UI unit, per axis.
///
/// The two axes are measured independently: letterboxing or a root element
/// that does not fill the screen makes them diverge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRatio {
    pub x: f32,
    pub y: f32,
}

impl ScreenRatio {
    /// Returns `None` until the root element has a usable size.
    pub fn measure(screen: Size, root: Size) -> Option<Self> {
        if root.is_degenerate() || screen.is_degenerate() {
            return None;
        }

        Some(Self {
            x: screen.width / root.width,
            y: screen.height / root.height,
        })
    }

    pub fn to_screen(&self, bounds: Rect) -> Rect {
        Rect {
            x: bounds.x * self.x,
            y: bounds.y * self.y,
            w: bounds.w * self.x,
            h: bounds.h * self.y,
        }
    }
}

/// A rectangle expressed as fractions of the current screen size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn from_screen_rect(rect: Rect, screen: Size) -> Self {
        Self {
            x: rect.x / screen.width,
            y: rect.y / screen.height,
            width: rect.w / screen.width,
            height: rect.h / screen.height,
        }
    }
}

/// Tracks what the native peer was last told about a field's placement.
#[derive(Debug, Clone)]
pub struct GeometrySync {
    ratio: ScreenRatio,
    last_sent: Option<NormalizedRect>,
}

impl GeometrySync {
    pub fn new(ratio: ScreenRatio) -> Self {
        Self {
            ratio,
            last_sent: None,
        }
    }

    pub fn screen_rect(&self, bounds: Rect) -> Rect {
        self.ratio.to_screen(bounds)
    }

    pub fn normalize(&self, bounds: Rect, screen: Size) -> NormalizedRect {
        NormalizedRect::from_screen_rect(self.screen_rect(bounds), screen)
    }

    pub fn mark_sent(&mut self, rect: NormalizedRect) {
        self.last_sent = Some(rect);
    }

    /// Returns the rect to send when it differs from the last one sent.
    ///
    /// Comparison is exact; any float drift counts as a change.
    pub fn poll(&mut self, bounds: Rect, screen: Size) -> Option<NormalizedRect> {
        let rect = self.normalize(bounds, screen);

        if self.last_sent == Some(rect) {
            return None;
        }

        self.last_sent = Some(rect);
        Some(rect)
    }

    pub fn any_touch_outside(&self, bounds: Rect, touches: &[Vec2]) -> bool {
        let rect = self.screen_rect(bounds);
        touches.iter().any(|touch| !rect.contains(*touch))
    }
}
