//! Input model: insertable kinds, modifier keys, pointer samples, and the
//! interaction state.
//!
//! `CanvasState` is the active mode or gesture, carried between pointer
//! events. Each variant holds exactly the context its transitions need;
//! a resize without its starting box or a marquee without an origin cannot
//! be represented.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{LayerKind, Shape};
use crate::geometry::{Bounds, Side};

/// A layer kind the toolbar can insert with a single click.
///
/// Paths are drawn with the pencil rather than inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertableKind {
    Text,
    Note,
    Rectangle,
    Ellipse,
}

impl InsertableKind {
    /// Payload for a freshly inserted layer of this kind.
    #[must_use]
    pub fn shape(self) -> Shape {
        match self {
            Self::Text => Shape::Text,
            Self::Note => Shape::Note,
            Self::Rectangle => Shape::Rectangle,
            Self::Ellipse => Shape::Ellipse,
        }
    }

    #[must_use]
    pub fn kind(self) -> LayerKind {
        match self {
            Self::Text => LayerKind::Text,
            Self::Note => LayerKind::Note,
            Self::Rectangle => LayerKind::Rectangle,
            Self::Ellipse => LayerKind::Ellipse,
        }
    }
}

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// One pointer sample as reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Position in screen space (CSS pixels relative to the canvas).
    pub screen: Point,
    /// Pen pressure in `0.0..=1.0`; mice report 0.5 while a button is held.
    pub pressure: f64,
    /// Whether only the primary button is held (`buttons == 1`).
    pub primary_down: bool,
}

impl Pointer {
    /// A mouse sample with the primary button held.
    #[must_use]
    pub fn pressed(x: f64, y: f64) -> Self {
        Self { screen: Point::new(x, y), pressure: 0.5, primary_down: true }
    }

    /// A mouse sample with no button held.
    #[must_use]
    pub fn hover(x: f64, y: f64) -> Self {
        Self { screen: Point::new(x, y), pressure: 0.0, primary_down: false }
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"z"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Local interaction state of the canvas. Never shared with other participants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CanvasState {
    /// Select mode, no gesture in progress.
    #[default]
    None,
    /// Pointer is down on empty board but has not moved far enough to be a marquee.
    Pressing {
        /// Board-space point where the press started.
        origin: Point,
    },
    /// Marquee (rubber-band) selection in progress.
    SelectionNet {
        origin: Point,
        /// Latest pointer position; `None` until the first update after the threshold is crossed.
        current: Option<Point>,
    },
    /// Dragging the selection.
    Translating {
        /// Board-space pointer position at the previous tick.
        current: Point,
    },
    /// A toolbar shape is armed; the next pointer-up inserts it.
    Inserting { kind: InsertableKind },
    /// Dragging a resize handle of the single selected layer.
    Resizing {
        /// Selection box when the handle was grabbed.
        initial_bounds: Bounds,
        /// Edges that follow the pointer.
        corner: Side,
    },
    /// Freehand drawing mode.
    Pencil,
}

impl CanvasState {
    /// Whether the toolbar's select button should show as active.
    #[must_use]
    pub fn is_select_mode(self) -> bool {
        matches!(
            self,
            Self::None | Self::Pressing { .. } | Self::SelectionNet { .. } | Self::Translating { .. } | Self::Resizing { .. }
        )
    }

    /// Whether pointer-downs on layers and handles are routed to them.
    ///
    /// In `Inserting` and `Pencil` modes the whole board behaves as background.
    #[must_use]
    pub fn routes_to_layers(self) -> bool {
        !matches!(self, Self::Inserting { .. } | Self::Pencil)
    }

    /// A drag or resize of the selection is in progress. Its ticks are grouped
    /// into one undo step until pointer-up.
    #[must_use]
    pub fn is_transforming(self) -> bool {
        matches!(self, Self::Translating { .. } | Self::Resizing { .. })
    }

    /// The marquee rectangle in board space, once it has a current corner.
    #[must_use]
    pub fn marquee(self) -> Option<Bounds> {
        match self {
            Self::SelectionNet { origin, current: Some(current) } => Some(Bounds::from_corners(origin, current)),
            _ => None,
        }
    }
}
