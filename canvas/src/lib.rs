//! Canvas editing engine for the collaborative whiteboard.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! client side of a board: translating raw DOM input events into layer
//! mutations against a synchronized room, keeping the local camera,
//! hit-testing layers and resize handles, and rendering the scene. The host
//! JavaScript layer wires DOM events to the engine and relays the returned
//! [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and the testable [`engine::EngineCore`] state machine |
//! | [`mutations`] | Every sanctioned write to the shared layers and selection |
//! | [`room`] | The synchronized room contract and its in-process implementation |
//! | [`doc`] | Layer model and the ordered layer store |
//! | [`presence`] | Per-participant presence, peers, cursor colors, participant strip |
//! | [`history`] | Per-mutation undo/redo with pause/resume grouping |
//! | [`selection`] | Selection bounds, handle layout and visibility |
//! | [`geometry`] | Bounds, resize, path normalization, marquee search |
//! | [`camera`] | Pan camera and coordinate conversions |
//! | [`color`] | RGB colors, hex codec, contrasting text color |
//! | [`input`] | Input event types and the interaction state enum |
//! | [`hit`] | Hit-testing against handles and layers |
//! | [`render`] | Canvas 2D scene rendering |
//! | [`board`] | Board metadata directory |
//! | [`config`] | Engine configuration with defaults and validation |
//! | [`consts`] | Shared numeric constants (capacity, thresholds, font scales) |

pub mod board;
pub mod camera;
pub mod color;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod hit;
pub mod input;
pub mod mutations;
pub mod presence;
pub mod render;
pub mod room;
pub mod selection;
