#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise `self - origin`.
    #[must_use]
    pub fn delta_from(self, origin: Point) -> Point {
        Point { x: self.x - origin.x, y: self.y - origin.y }
    }

    /// L1 distance between two points.
    #[must_use]
    pub fn manhattan_distance(self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Local pan offset for the board. Never shared with other participants.
///
/// Board space is camera-independent; screen space is what pointer events report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to board coordinates.
    #[must_use]
    pub fn screen_to_board(&self, screen: Point) -> Point {
        Point { x: screen.x - self.x, y: screen.y - self.y }
    }

    /// Convert a board-space point to screen coordinates.
    #[must_use]
    pub fn board_to_screen(&self, board: Point) -> Point {
        Point { x: board.x + self.x, y: board.y + self.y }
    }

    /// Shift the camera by a raw wheel delta. Scrolling down moves the board up.
    pub fn scroll(&mut self, dx: f64, dy: f64) {
        self.x -= dx;
        self.y -= dy;
    }
}
