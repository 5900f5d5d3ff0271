//! Shared numeric constants for the canvas crate.

// ── Layers ──────────────────────────────────────────────────────

/// Hard cap on the number of layers a board may hold.
pub const MAX_LAYERS: usize = 100;

/// Width and height of a freshly inserted shape, in board units.
pub const DEFAULT_LAYER_SIZE: f64 = 100.0;

// ── Gestures ────────────────────────────────────────────────────

/// Manhattan distance (board units) a press must travel before it becomes a marquee.
pub const SELECTION_NET_THRESHOLD: f64 = 5.0;

/// Side length of a square resize handle, in pixels.
pub const HANDLE_WIDTH: f64 = 8.0;

/// Gap between the selection bounds and the floating selection toolbar, in pixels.
pub const SELECTION_TOOLBAR_OFFSET: f64 = 16.0;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of undo entries retained.
pub const HISTORY_LIMIT: usize = 100;

// ── Text ────────────────────────────────────────────────────────

/// Weighted luminance above which dark text is used on a fill.
pub const TEXT_CONTRAST_THRESHOLD: f64 = 182.0;

/// Upper bound for auto-sized text and note fonts, in pixels.
pub const MAX_FONT_SIZE: f64 = 96.0;

/// Font size as a fraction of the smaller box dimension for text layers.
pub const TEXT_FONT_SCALE: f64 = 0.5;

/// Font size as a fraction of the smaller box dimension for sticky notes.
pub const NOTE_FONT_SCALE: f64 = 0.15;

// ── Strokes ─────────────────────────────────────────────────────

/// Nominal freehand stroke diameter at pressure 0.5.
pub const PATH_STROKE_SIZE: f64 = 16.0;

// ── Participants ────────────────────────────────────────────────

/// Number of remote avatars listed before collapsing into an overflow count.
pub const MAX_SHOWN_USERS: usize = 2;
