//! The canvas surface: interaction state machine and browser wrapper.
//!
//! [`EngineCore`] owns everything local to one participant's view (camera,
//! interaction state, last-used color) and drives the mutation pipeline
//! against a [`Room`]. It has no browser dependency so the whole state
//! machine runs under `cargo test`. [`Engine`] adds the canvas element and
//! the render loop on top.
//!
//! Handlers return a list of [`Action`]s for the host page: whether to
//! schedule a frame, ids created or deleted, a new selection box for the
//! floating toolbar, and cursor changes.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::{Camera, Point};
use crate::color::Color;
use crate::config::EngineConfig;
use crate::consts::MAX_SHOWN_USERS;
use crate::doc::{Layer, LayerError, LayerId, Storage};
use crate::geometry::{Bounds, Side, find_intersecting_layers};
use crate::hit::{Hit, hit_test};
use crate::input::{CanvasState, InsertableKind, Key, Modifiers, Pointer, WheelDelta};
use crate::mutations;
use crate::presence::{ConnectionId, Participants, Peer, PresencePatch, participants};
use crate::render::{self, Viewport};
use crate::room::{LocalRoom, Room, Tracking};
use crate::selection::{self, BoundsWatcher, handle_cursor};

/// Cursor shown when the pointer is not over a resize handle.
const DEFAULT_CURSOR: &str = "default";

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Something visible changed; schedule a frame.
    RenderNeeded,
    /// A layer was created by this participant.
    LayerCreated(LayerId),
    /// These layers were deleted by this participant.
    LayersDeleted(Vec<LayerId>),
    /// The local selection box moved, resized, appeared, or vanished.
    SelectionBoundsChanged(Option<Bounds>),
    /// Set the CSS cursor of the canvas element.
    SetCursor(&'static str),
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore<R: Room = LocalRoom> {
    room: R,
    camera: Camera,
    state: CanvasState,
    /// Fill for the next inserted shape or stroke.
    last_used_color: Color,
    config: EngineConfig,
    bounds: BoundsWatcher,
    cursor: &'static str,
}

impl Default for EngineCore<LocalRoom> {
    fn default() -> Self {
        Self::local(0, EngineConfig::default())
    }
}

impl EngineCore<LocalRoom> {
    /// An engine over an in-process room.
    #[must_use]
    pub fn local(connection_id: ConnectionId, config: EngineConfig) -> Self {
        Self::new(LocalRoom::new(connection_id, config.history_limit), config)
    }

    /// Hydrate the board from a storage snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerError`] when the snapshot is malformed or its z-order
    /// disagrees with its layers; the current board is left untouched.
    pub fn load_snapshot(&mut self, raw: &str) -> Result<Vec<Action>, LayerError> {
        let storage = Storage::from_json(raw)?;
        self.room.load_storage(storage);
        Ok(self.finish(vec![Action::RenderNeeded]))
    }

    /// Apply a layer created or updated by another participant.
    pub fn apply_remote_upsert(&mut self, id: LayerId, layer: Layer) -> Vec<Action> {
        self.room.apply_remote(|storage| storage.insert(id, layer));
        self.finish(vec![Action::RenderNeeded])
    }

    /// Apply a layer deleted by another participant.
    pub fn apply_remote_delete(&mut self, id: &LayerId) -> Vec<Action> {
        self.room.apply_remote(|storage| {
            storage.remove(id);
        });
        self.finish(vec![Action::RenderNeeded])
    }

    /// A peer connected to the room.
    pub fn join_peer(&mut self, peer: Peer) -> Vec<Action> {
        self.room.join_peer(peer);
        vec![Action::RenderNeeded]
    }

    /// A peer's cursor, selection or draft changed.
    pub fn update_peer(&mut self, connection_id: ConnectionId, patch: PresencePatch) -> Vec<Action> {
        self.room.update_peer(connection_id, patch);
        vec![Action::RenderNeeded]
    }

    pub fn leave_peer(&mut self, connection_id: ConnectionId) -> Vec<Action> {
        self.room.leave_peer(connection_id);
        vec![Action::RenderNeeded]
    }

    /// The participant strip: a few peers, the local user, then an overflow count.
    #[must_use]
    pub fn participants(&self) -> Participants {
        let me = self.room.info().map(|info| (self.room.connection_id(), info));
        participants(me, self.room.others(), MAX_SHOWN_USERS)
    }
}

impl<R: Room> EngineCore<R> {
    #[must_use]
    pub fn new(room: R, config: EngineConfig) -> Self {
        Self {
            room,
            camera: Camera::default(),
            state: CanvasState::None,
            last_used_color: config.default_color,
            config,
            bounds: BoundsWatcher::new(),
            cursor: DEFAULT_CURSOR,
        }
    }

    fn board_point(&self, pointer: &Pointer) -> Point {
        self.camera.screen_to_board(pointer.screen)
    }

    // --- Pointer input ---

    /// Route a pointer-down to the handle, layer, or background handler.
    pub fn on_pointer_down(&mut self, pointer: Pointer) -> Vec<Action> {
        if self.state.routes_to_layers() {
            let point = self.board_point(&pointer);
            match hit_test(point, self.room.storage(), &self.room.presence().selection) {
                Some(Hit::ResizeHandle { side, initial_bounds }) => {
                    return self.on_resize_handle_pointer_down(side, initial_bounds);
                }
                Some(Hit::Layer(id)) => return self.on_layer_pointer_down(pointer, id),
                None => {}
            }
        }
        self.on_background_pointer_down(pointer)
    }

    /// Pointer-down on empty board (or anywhere while a tool is armed).
    pub fn on_background_pointer_down(&mut self, pointer: Pointer) -> Vec<Action> {
        let point = self.board_point(&pointer);
        match self.state {
            CanvasState::Inserting { .. } => Vec::new(),
            CanvasState::Pencil => {
                mutations::start_draft(&mut self.room, point, pointer.pressure, self.last_used_color);
                vec![Action::RenderNeeded]
            }
            _ => {
                self.state = CanvasState::Pressing { origin: point };
                Vec::new()
            }
        }
    }

    /// Pointer-down on a layer body: select it if needed and start dragging the selection.
    pub fn on_layer_pointer_down(&mut self, pointer: Pointer, id: LayerId) -> Vec<Action> {
        if !self.state.routes_to_layers() {
            return Vec::new();
        }
        let point = self.board_point(&pointer);
        self.room.pause_history();
        if !self.room.presence().selection.contains(&id) {
            mutations::select_layer(&mut self.room, id);
        }
        self.state = CanvasState::Translating { current: point };
        self.finish(vec![Action::RenderNeeded])
    }

    /// Pointer-down on a resize handle of the selection box.
    pub fn on_resize_handle_pointer_down(&mut self, corner: Side, initial_bounds: Bounds) -> Vec<Action> {
        self.room.pause_history();
        self.state = CanvasState::Resizing { initial_bounds, corner };
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, pointer: Pointer) -> Vec<Action> {
        let point = self.board_point(&pointer);
        let mut actions = Vec::new();

        match self.state {
            CanvasState::Pressing { origin } => {
                if point.manhattan_distance(origin) > self.config.selection_net_threshold {
                    self.state = CanvasState::SelectionNet { origin, current: Some(point) };
                    actions.push(Action::RenderNeeded);
                }
            }
            CanvasState::SelectionNet { origin, .. } => {
                self.state = CanvasState::SelectionNet { origin, current: Some(point) };
                let ids = find_intersecting_layers(self.room.storage(), origin, point);
                self.room.update_presence(PresencePatch::selection(ids), Tracking::Skip);
                actions.push(Action::RenderNeeded);
            }
            CanvasState::Translating { current } => {
                mutations::translate_selection(&mut self.room, point.delta_from(current));
                self.state = CanvasState::Translating { current: point };
                actions.push(Action::RenderNeeded);
            }
            CanvasState::Resizing { initial_bounds, corner } => {
                mutations::resize_selection(&mut self.room, initial_bounds, corner, point);
                actions.push(Action::RenderNeeded);
            }
            CanvasState::Pencil => {
                if pointer.primary_down {
                    mutations::extend_draft(&mut self.room, point, pointer.pressure);
                    actions.push(Action::RenderNeeded);
                }
            }
            CanvasState::None => {
                if let Some(action) = self.update_hover_cursor(point) {
                    actions.push(action);
                }
            }
            CanvasState::Inserting { .. } => {}
        }

        self.room.update_presence(PresencePatch::cursor(Some(point)), Tracking::Skip);
        self.finish(actions)
    }

    pub fn on_pointer_up(&mut self, pointer: Pointer) -> Vec<Action> {
        let point = self.board_point(&pointer);
        let mut actions = vec![Action::RenderNeeded];

        match self.state {
            CanvasState::None | CanvasState::Pressing { .. } => {
                mutations::clear_selection(&mut self.room);
                self.state = CanvasState::None;
            }
            CanvasState::Pencil => {
                if let Some(id) = mutations::commit_path(&mut self.room, self.last_used_color, self.config.max_layers) {
                    actions.push(Action::LayerCreated(id));
                }
            }
            CanvasState::Inserting { kind } => {
                let inserted = mutations::insert_layer(
                    &mut self.room,
                    kind,
                    point,
                    self.last_used_color,
                    self.config.default_layer_size,
                    self.config.max_layers,
                );
                if let Some(id) = inserted {
                    actions.push(Action::LayerCreated(id));
                }
                self.state = CanvasState::None;
            }
            CanvasState::SelectionNet { .. } | CanvasState::Translating { .. } | CanvasState::Resizing { .. } => {
                self.state = CanvasState::None;
            }
        }

        self.room.resume_history();
        self.finish(actions)
    }

    /// The pointer left the canvas; peers stop seeing this cursor.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.room.update_presence(PresencePatch::cursor(None), Tracking::Skip);
        Vec::new()
    }

    /// Pan the camera by the wheel delta.
    pub fn on_wheel(&mut self, delta: WheelDelta) -> Vec<Action> {
        self.camera.scroll(delta.dx, delta.dy);
        vec![Action::RenderNeeded]
    }

    // --- Keyboard ---

    /// Ctrl/Cmd+Z undoes; with Shift held it redoes. Every other key is ignored.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if !(modifiers.command() && key.0.eq_ignore_ascii_case("z")) {
            return Vec::new();
        }
        if modifiers.shift { self.redo() } else { self.undo() }
    }

    // --- Toolbar ---

    /// Arm a shape; the next pointer-up on the board inserts it.
    pub fn start_inserting(&mut self, kind: InsertableKind) {
        self.state = CanvasState::Inserting { kind };
    }

    pub fn start_pencil(&mut self) {
        self.state = CanvasState::Pencil;
    }

    pub fn start_selecting(&mut self) {
        self.state = CanvasState::None;
    }

    /// Ignored while a drag or resize is in progress.
    pub fn undo(&mut self) -> Vec<Action> {
        if self.state.is_transforming() || !self.room.undo() {
            return Vec::new();
        }
        self.finish(vec![Action::RenderNeeded])
    }

    pub fn redo(&mut self) -> Vec<Action> {
        if self.state.is_transforming() || !self.room.redo() {
            return Vec::new();
        }
        self.finish(vec![Action::RenderNeeded])
    }

    // --- Selection tools ---

    pub fn bring_to_front(&mut self) -> Vec<Action> {
        mutations::bring_to_front(&mut self.room);
        vec![Action::RenderNeeded]
    }

    pub fn send_to_back(&mut self) -> Vec<Action> {
        mutations::send_to_back(&mut self.room);
        vec![Action::RenderNeeded]
    }

    pub fn delete_selection(&mut self) -> Vec<Action> {
        let removed = mutations::delete_selection(&mut self.room);
        let mut actions = vec![Action::RenderNeeded];
        if !removed.is_empty() {
            actions.push(Action::LayersDeleted(removed));
        }
        self.finish(actions)
    }

    /// Recolor the selection. The color also becomes the default for new shapes.
    pub fn set_fill(&mut self, fill: Color) -> Vec<Action> {
        self.last_used_color = fill;
        mutations::set_fill(&mut self.room, fill);
        vec![Action::RenderNeeded]
    }

    /// Commit text typed into a text or note layer.
    pub fn update_text(&mut self, id: LayerId, value: &str) -> Vec<Action> {
        mutations::update_text(&mut self.room, id, value);
        vec![Action::RenderNeeded]
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &[LayerId] {
        &self.room.presence().selection
    }

    /// Union box of the selected layers, resolved against the current board.
    #[must_use]
    pub fn selection_bounds(&self) -> Option<Bounds> {
        selection::selection_bounds(self.room.storage(), self.selection())
    }

    #[must_use]
    pub fn shows_resize_handles(&self) -> bool {
        selection::shows_resize_handles(self.room.storage(), self.selection())
    }

    /// Screen-space anchor for the floating selection toolbar, if anything is selected.
    #[must_use]
    pub fn selection_toolbar_anchor(&self) -> Option<Point> {
        self.selection_bounds()
            .map(|bounds| selection::selection_toolbar_anchor(bounds, &self.camera))
    }

    /// The marquee rectangle in board space while a selection net is active.
    #[must_use]
    pub fn marquee(&self) -> Option<Bounds> {
        self.state.marquee()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Read view of the room; all writes go through the handlers above.
    #[must_use]
    pub fn room(&self) -> &R {
        &self.room
    }

    #[must_use]
    pub fn state(&self) -> CanvasState {
        self.state
    }

    /// Fill for the next inserted shape or stroke.
    #[must_use]
    pub fn last_used_color(&self) -> Color {
        self.last_used_color
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.room.storage().get(id)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.room.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.room.can_redo()
    }

    /// Report a new selection box to the host when it changed.
    fn finish(&mut self, mut actions: Vec<Action>) -> Vec<Action> {
        if self.bounds.refresh(self.room.storage(), &self.room.presence().selection) {
            actions.push(Action::SelectionBoundsChanged(self.bounds.current()));
        }
        actions
    }

    fn update_hover_cursor(&mut self, point: Point) -> Option<Action> {
        let cursor = match hit_test(point, self.room.storage(), &self.room.presence().selection) {
            Some(Hit::ResizeHandle { side, .. }) => handle_cursor(side),
            _ => DEFAULT_CURSOR,
        };
        if cursor == self.cursor {
            return None;
        }
        self.cursor = cursor;
        Some(Action::SetCursor(cursor))
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
    viewport: Viewport,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, core: EngineCore) -> Self {
        Self { canvas, core, viewport: Viewport::default() }
    }

    // --- Viewport ---

    /// Update viewport dimensions and device pixel ratio, resizing the backing store.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport = Viewport { width: width_css, height: height_css, dpr };
        self.canvas.set_width((width_css * dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * dpr).round().max(0.0) as u32);
    }

    // --- Delegated input events ---

    pub fn on_pointer_down(&mut self, pointer: Pointer) -> Vec<Action> {
        self.core.on_pointer_down(pointer)
    }

    pub fn on_pointer_move(&mut self, pointer: Pointer) -> Vec<Action> {
        self.core.on_pointer_move(pointer)
    }

    pub fn on_pointer_up(&mut self, pointer: Pointer) -> Vec<Action> {
        self.core.on_pointer_up(pointer)
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.core.on_pointer_leave()
    }

    pub fn on_wheel(&mut self, delta: WheelDelta) -> Vec<Action> {
        self.core.on_wheel(delta)
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or any `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas 2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        render::draw(&ctx, &self.core.room, &self.core.camera, self.core.state, self.viewport)
    }
}
