//! Presence: ephemeral per-participant state shared through the room.
//!
//! DESIGN
//! ======
//! Each participant publishes a [`Presence`] (cursor, selection, pencil
//! draft, pen color). It is never persisted and carries no ordering
//! guarantee across participants; the latest value wins. Local changes are
//! expressed as a sparse [`PresencePatch`] so that a cursor update does not
//! clobber the selection and vice versa.
//!
//! The rest of this module derives what the surface draws for *other*
//! participants: cursors, in-progress strokes, selection outlines, and the
//! participant strip.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::color::Color;
use crate::doc::{LayerId, PathPoint};

/// Per-session connection number assigned by the room.
pub type ConnectionId = u32;

/// Colors cycled through by connection id for cursors, outlines, and avatars.
pub const CONNECTION_COLORS: [&str; 5] = ["#DC2626", "#D97706", "#059669", "#7C3AED", "#DB2777"];

/// Color assigned to a connection.
#[must_use]
pub fn connection_color(connection_id: ConnectionId) -> &'static str {
    CONNECTION_COLORS[connection_id as usize % CONNECTION_COLORS.len()]
}

/// Ephemeral state of one participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    /// Board-space cursor, `None` when the pointer is off the canvas.
    pub cursor: Option<Point>,
    /// Selected layer ids; empty when nothing is selected.
    pub selection: Vec<LayerId>,
    /// Board-space samples of a stroke being drawn.
    pub pencil_draft: Option<Vec<PathPoint>>,
    pub pen_color: Option<Color>,
}

impl Presence {
    /// Apply only the fields present in `patch`.
    pub fn apply(&mut self, patch: PresencePatch) {
        if let Some(cursor) = patch.cursor {
            self.cursor = cursor;
        }
        if let Some(selection) = patch.selection {
            self.selection = selection;
        }
        if let Some(draft) = patch.pencil_draft {
            self.pencil_draft = draft;
        }
        if let Some(color) = patch.pen_color {
            self.pen_color = color;
        }
    }
}

/// Sparse update for a [`Presence`]. Only `Some` fields are applied; the inner
/// `Option` distinguishes "clear" from "leave alone".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresencePatch {
    pub cursor: Option<Option<Point>>,
    pub selection: Option<Vec<LayerId>>,
    pub pencil_draft: Option<Option<Vec<PathPoint>>>,
    pub pen_color: Option<Option<Color>>,
}

impl PresencePatch {
    #[must_use]
    pub fn cursor(cursor: Option<Point>) -> Self {
        Self { cursor: Some(cursor), ..Self::default() }
    }

    #[must_use]
    pub fn selection(selection: Vec<LayerId>) -> Self {
        Self { selection: Some(selection), ..Self::default() }
    }

    #[must_use]
    pub fn pencil_draft(draft: Option<Vec<PathPoint>>) -> Self {
        Self { pencil_draft: Some(draft), ..Self::default() }
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: Option<Point>) -> Self {
        self.cursor = Some(cursor);
        self
    }

    #[must_use]
    pub fn with_pen_color(mut self, color: Option<Color>) -> Self {
        self.pen_color = Some(color);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursor.is_none() && self.selection.is_none() && self.pencil_draft.is_none() && self.pen_color.is_none()
    }
}

/// Static profile of a participant, supplied by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Another participant in the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub connection_id: ConnectionId,
    pub info: Option<UserInfo>,
    pub presence: Presence,
}

/// A remote cursor ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    pub connection_id: ConnectionId,
    pub point: Point,
    pub name: String,
    pub color: &'static str,
}

/// A remote in-progress stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDraft<'a> {
    pub connection_id: ConnectionId,
    pub points: &'a [PathPoint],
    pub color: Color,
}

/// Label shown for a participant without a display name.
pub const ANONYMOUS_NAME: &str = "Teammate";

/// Cursors of every peer whose pointer is on the canvas.
#[must_use]
pub fn remote_cursors(others: &[Peer]) -> Vec<RemoteCursor> {
    others
        .iter()
        .filter_map(|peer| {
            let point = peer.presence.cursor?;
            let name = peer
                .info
                .as_ref()
                .and_then(|info| info.name.clone())
                .unwrap_or_else(|| ANONYMOUS_NAME.to_owned());
            Some(RemoteCursor { connection_id: peer.connection_id, point, name, color: connection_color(peer.connection_id) })
        })
        .collect()
}

/// Strokes other participants are drawing right now. Peers without a pen color draw in black.
#[must_use]
pub fn remote_drafts(others: &[Peer]) -> Vec<RemoteDraft<'_>> {
    others
        .iter()
        .filter_map(|peer| {
            let points = peer.presence.pencil_draft.as_deref()?;
            Some(RemoteDraft {
                connection_id: peer.connection_id,
                points,
                color: peer.presence.pen_color.unwrap_or(Color::BLACK),
            })
        })
        .collect()
}

/// Outline color per layer currently selected by another participant.
///
/// When several peers select the same layer, the one listed last wins.
#[must_use]
pub fn selection_colors(others: &[Peer]) -> HashMap<LayerId, &'static str> {
    let mut colors = HashMap::new();
    for peer in others {
        for id in &peer.presence.selection {
            colors.insert(*id, connection_color(peer.connection_id));
        }
    }
    colors
}

/// One avatar in the participant strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub name: String,
    pub picture: Option<String>,
    /// Single-character fallback shown when there is no picture.
    pub fallback: String,
    pub border_color: Option<&'static str>,
}

/// The participant strip: a few peers, then the local user, then an overflow count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participants {
    pub avatars: Vec<Avatar>,
    /// Number of peers not shown individually.
    pub overflow: usize,
}

/// Build the participant strip, showing at most `max_shown` peers before the local user.
#[must_use]
pub fn participants(me: Option<(ConnectionId, &UserInfo)>, others: &[Peer], max_shown: usize) -> Participants {
    let mut avatars: Vec<Avatar> = others
        .iter()
        .take(max_shown)
        .map(|peer| {
            let name = peer.info.as_ref().and_then(|info| info.name.clone()).unwrap_or_default();
            Avatar {
                fallback: initial(&name).unwrap_or_else(|| "T".to_owned()),
                picture: peer.info.as_ref().and_then(|info| info.picture.clone()),
                border_color: Some(connection_color(peer.connection_id)),
                name,
            }
        })
        .collect();

    if let Some((connection_id, info)) = me {
        let name = info.name.clone().unwrap_or_default();
        avatars.push(Avatar {
            fallback: initial(&name).unwrap_or_default(),
            picture: info.picture.clone(),
            border_color: Some(connection_color(connection_id)),
            name: format!("{name} (You)"),
        });
    }

    let overflow = others.len().saturating_sub(max_shown);
    if overflow > 0 {
        avatars.push(Avatar {
            name: format!("{overflow} more"),
            picture: None,
            fallback: format!("+{overflow}"),
            border_color: None,
        });
    }

    Participants { avatars, overflow }
}

fn initial(name: &str) -> Option<String> {
    name.chars().next().map(String::from)
}
