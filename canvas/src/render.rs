//! Rendering: draws the full canvas scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of room state and camera state and produces
//! pixels; it does not mutate any application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.
//! Text measurement is the exception: a failed `measureText` is logged and
//! the text wraps as if every character were too wide.
//!
//! Layout rules that do not need a context (font sizing, placeholders,
//! stroke width, line wrapping) are plain functions so they can be tested
//! natively.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;
use std::fmt::Debug;

use tracing::debug;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::camera::{Camera, Point};
use crate::color::Color;
use crate::consts::{MAX_FONT_SIZE, NOTE_FONT_SCALE, PATH_STROKE_SIZE, TEXT_FONT_SCALE};
use crate::doc::{Layer, LayerKind, PathPoint, Shape};
use crate::geometry::Bounds;
use crate::input::CanvasState;
use crate::presence::{RemoteCursor, remote_cursors, remote_drafts, selection_colors};
use crate::room::Room;
use crate::selection::{resize_handles, selection_bounds, shows_resize_handles};

/// Local selection outline and handle stroke.
const SELECTION_COLOR: &str = "#3B82F6";

/// Marquee fill.
const MARQUEE_FILL: &str = "rgba(59, 130, 246, 0.05)";

/// Marquee dash segment length in pixels.
const MARQUEE_DASH_PX: f64 = 4.0;

/// Font family for text and note layers.
const LAYER_FONT: &str = "Kalam, cursive";

/// Placeholder shown in an empty text layer.
const TEXT_PLACEHOLDER: &str = "Text";

/// Placeholder shown in an empty sticky note.
const NOTE_PLACEHOLDER: &str = "text";

/// Font size of remote cursor name labels.
const CURSOR_LABEL_FONT_PX: f64 = 12.0;

/// CSS-pixel size of the drawing surface and its device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 0.0, height: 0.0, dpr: 1.0 }
    }
}

/// Draw the full scene: layers, selection chrome, strokes in progress, and remote cursors.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw<R: Room + ?Sized>(
    ctx: &CanvasRenderingContext2d,
    room: &R,
    camera: &Camera,
    state: CanvasState,
    viewport: Viewport,
) -> Result<(), JsValue> {
    let storage = room.storage();
    let me = room.presence();
    let others = room.others();

    // Clear in device pixels, then work in board space.
    ctx.set_transform(viewport.dpr, 0.0, 0.0, viewport.dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);
    ctx.translate(camera.x, camera.y)?;

    // Layers back to front, outlined where a peer has them selected.
    let outlines = selection_colors(others);
    for (id, layer) in storage.ordered() {
        draw_layer(ctx, layer, outlines.get(&id).copied())?;
    }

    if let Some(bounds) = selection_bounds(storage, &me.selection) {
        draw_selection_box(ctx, bounds, shows_resize_handles(storage, &me.selection));
    }

    if let Some(marquee) = state.marquee() {
        draw_marquee(ctx, marquee)?;
    }

    for draft in remote_drafts(others) {
        draw_stroke(ctx, Point::default(), draft.points, &draft.color.to_hex())?;
    }
    if let Some(points) = me.pencil_draft.as_deref() {
        let color = me.pen_color.unwrap_or(Color::BLACK);
        draw_stroke(ctx, Point::default(), points, &color.to_hex())?;
    }

    for cursor in remote_cursors(others) {
        draw_cursor(ctx, &cursor)?;
    }

    Ok(())
}

// =============================================================
// Layer dispatch
// =============================================================

fn draw_layer(ctx: &CanvasRenderingContext2d, layer: &Layer, outline: Option<&str>) -> Result<(), JsValue> {
    match &layer.shape {
        Shape::Rectangle => draw_rectangle(ctx, layer, outline),
        Shape::Ellipse => draw_ellipse(ctx, layer, outline),
        Shape::Text => draw_text_layer(ctx, layer, outline),
        Shape::Note => draw_note(ctx, layer, outline),
        Shape::Path { points } => {
            draw_stroke(ctx, Point::new(layer.x, layer.y), points, &layer.fill.to_hex())?;
            if let Some(color) = outline {
                stroke_outline(ctx, layer.bounds(), color);
            }
            Ok(())
        }
    }
}

// =============================================================
// Shape renderers
// =============================================================

fn draw_rectangle(ctx: &CanvasRenderingContext2d, layer: &Layer, outline: Option<&str>) -> Result<(), JsValue> {
    ctx.set_fill_style_str(&layer.fill.to_hex());
    ctx.fill_rect(layer.x, layer.y, layer.width, layer.height);
    if let Some(color) = outline {
        stroke_outline(ctx, layer.bounds(), color);
    }
    Ok(())
}

/// Ellipses use independent radii, so a non-square box draws an oval.
fn draw_ellipse(ctx: &CanvasRenderingContext2d, layer: &Layer, outline: Option<&str>) -> Result<(), JsValue> {
    if layer.width <= 0.0 || layer.height <= 0.0 {
        return Ok(());
    }
    let center = layer.bounds().center();

    ctx.begin_path();
    ctx.ellipse(center.x, center.y, layer.width / 2.0, layer.height / 2.0, 0.0, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str(&layer.fill.to_hex());
    ctx.fill();

    if let Some(color) = outline {
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(1.0);
        ctx.stroke();
    }
    Ok(())
}

fn draw_text_layer(ctx: &CanvasRenderingContext2d, layer: &Layer, outline: Option<&str>) -> Result<(), JsValue> {
    draw_text_block(ctx, layer)?;
    if let Some(color) = outline {
        stroke_outline(ctx, layer.bounds(), color);
    }
    Ok(())
}

fn draw_note(ctx: &CanvasRenderingContext2d, layer: &Layer, outline: Option<&str>) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_shadow_color("rgba(0, 0, 0, 0.15)");
    ctx.set_shadow_blur(12.0);
    ctx.set_shadow_offset_y(4.0);
    ctx.set_fill_style_str(&layer.fill.to_hex());
    ctx.fill_rect(layer.x, layer.y, layer.width, layer.height);
    ctx.restore();

    draw_text_block(ctx, layer)?;
    if let Some(color) = outline {
        stroke_outline(ctx, layer.bounds(), color);
    }
    Ok(())
}

/// Freehand stroke; `points` are relative to `origin`.
fn draw_stroke(ctx: &CanvasRenderingContext2d, origin: Point, points: &[PathPoint], color: &str) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_fill_style_str(color);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");

    if let [only] = points {
        ctx.begin_path();
        ctx.arc(origin.x + only.x, origin.y + only.y, stroke_width(only.pressure) / 2.0, 0.0, 2.0 * PI)?;
        ctx.fill();
    }
    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        ctx.begin_path();
        ctx.set_line_width(stroke_width(to.pressure));
        ctx.move_to(origin.x + from.x, origin.y + from.y);
        ctx.line_to(origin.x + to.x, origin.y + to.y);
        ctx.stroke();
    }

    ctx.restore();
    Ok(())
}

// =============================================================
// Text
// =============================================================

fn draw_text_block(ctx: &CanvasRenderingContext2d, layer: &Layer) -> Result<(), JsValue> {
    if layer.width <= 0.0 || layer.height <= 0.0 {
        return Ok(());
    }
    let size = font_size(layer.kind(), layer.width, layer.height);
    let center = layer.bounds().center();

    ctx.save();
    ctx.set_fill_style_str(&text_color(layer));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_font(&format!("{size}px {LAYER_FONT}"));

    let lines = wrap_lines(display_text(layer), layer.width, |s| measured_text_width(ctx, s));
    let line_height = size * 1.25;
    #[allow(clippy::cast_precision_loss)]
    let start_y = center.y - line_height * (lines.len().saturating_sub(1) as f64) / 2.0;
    for (i, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = start_y + i as f64 * line_height;
        ctx.fill_text(line, center.x, y)?;
    }

    ctx.restore();
    Ok(())
}

fn measured_text_width(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
    width_or_unbounded(ctx.measure_text(text).map(|metrics| metrics.width()))
}

/// A failed measurement is logged and reported as unbounded, which makes the
/// wrapper fall back to one character per line.
fn width_or_unbounded<E: Debug>(measured: Result<f64, E>) -> f64 {
    measured.unwrap_or_else(|error| {
        debug!(?error, "measureText failed");
        f64::INFINITY
    })
}

/// Auto-sized font for a text or note layer: a fraction of the smaller side, capped.
#[must_use]
pub fn font_size(kind: LayerKind, width: f64, height: f64) -> f64 {
    let scale = match kind {
        LayerKind::Note => NOTE_FONT_SCALE,
        _ => TEXT_FONT_SCALE,
    };
    (height * scale).min(width * scale).min(MAX_FONT_SIZE)
}

/// The layer's text, or its kind's placeholder when empty.
#[must_use]
pub fn display_text(layer: &Layer) -> &str {
    match layer.value.as_deref() {
        Some(value) if !value.is_empty() => value,
        _ if layer.kind() == LayerKind::Note => NOTE_PLACEHOLDER,
        _ => TEXT_PLACEHOLDER,
    }
}

/// Text layers are written in their fill; notes use whichever of black or white reads on the fill.
#[must_use]
pub fn text_color(layer: &Layer) -> String {
    match layer.kind() {
        LayerKind::Note => layer.fill.contrasting_text_color().to_owned(),
        _ => layer.fill.to_hex(),
    }
}

/// Stroke diameter for a pressure sample; `PATH_STROKE_SIZE` at pressure 0.5.
#[must_use]
pub fn stroke_width(pressure: f64) -> f64 {
    PATH_STROKE_SIZE * (0.5 + pressure.clamp(0.0, 1.0))
}

/// Greedy word wrap to `max_width`, breaking words that are wider than a line.
///
/// `measure` returns the rendered width of a string. Always returns at least one line.
pub fn wrap_lines(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut out = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let candidate = if current.is_empty() { word.to_owned() } else { format!("{current} {word}") };
            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            if measure(word) <= max_width {
                current = word.to_owned();
                continue;
            }
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if !current.is_empty() && measure(&next) > max_width {
                    out.push(std::mem::replace(&mut current, ch.to_string()));
                } else {
                    current = next;
                }
            }
        }
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

// =============================================================
// Selection UI
// =============================================================

fn stroke_outline(ctx: &CanvasRenderingContext2d, bounds: Bounds, color: &str) {
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(bounds.x, bounds.y, bounds.width, bounds.height);
}

fn draw_selection_box(ctx: &CanvasRenderingContext2d, bounds: Bounds, show_handles: bool) {
    ctx.save();
    stroke_outline(ctx, bounds, SELECTION_COLOR);

    if show_handles {
        ctx.set_fill_style_str("#fff");
        for handle in resize_handles(bounds) {
            let b = handle.bounds;
            ctx.fill_rect(b.x, b.y, b.width, b.height);
            ctx.stroke_rect(b.x, b.y, b.width, b.height);
        }
    }
    ctx.restore();
}

fn draw_marquee(ctx: &CanvasRenderingContext2d, marquee: Bounds) -> Result<(), JsValue> {
    ctx.save();
    let dash = js_sys::Array::new();
    dash.push(&MARQUEE_DASH_PX.into());
    dash.push(&MARQUEE_DASH_PX.into());
    ctx.set_line_dash(&dash)?;
    ctx.set_fill_style_str(MARQUEE_FILL);
    ctx.fill_rect(marquee.x, marquee.y, marquee.width, marquee.height);
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0);
    ctx.stroke_rect(marquee.x, marquee.y, marquee.width, marquee.height);
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Presence
// =============================================================

/// Arrow pointer in the peer's color with a name tag to its lower right.
fn draw_cursor(ctx: &CanvasRenderingContext2d, cursor: &RemoteCursor) -> Result<(), JsValue> {
    let Point { x, y } = cursor.point;

    ctx.save();
    ctx.set_fill_style_str(cursor.color);
    ctx.begin_path();
    ctx.move_to(x, y);
    ctx.line_to(x, y + 16.0);
    ctx.line_to(x + 4.5, y + 12.0);
    ctx.line_to(x + 11.0, y + 12.0);
    ctx.close_path();
    ctx.fill();

    ctx.set_font(&format!("600 {CURSOR_LABEL_FONT_PX}px sans-serif"));
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    let label_w = measured_text_width(ctx, &cursor.name).min(240.0) + 12.0;
    let label_h = CURSOR_LABEL_FONT_PX + 8.0;
    let (label_x, label_y) = (x + 20.0, y + 16.0);
    ctx.fill_rect(label_x, label_y, label_w, label_h);
    ctx.set_fill_style_str("#fff");
    ctx.fill_text(&cursor.name, label_x + 6.0, label_y + label_h / 2.0)?;

    ctx.restore();
    Ok(())
}
