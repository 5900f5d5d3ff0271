//! Board metadata: creating, renaming, and removing boards.
//!
//! DESIGN
//! ======
//! The canvas only needs a board id to scope its room; titles, authors, and
//! thumbnails live behind [`BoardDirectory`]. Every write requires a signed-in
//! [`Identity`]. [`MemoryBoardDirectory`] is the in-process implementation
//! used by tests and offline hosts.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Identifier of a board; also scopes its synchronized room.
pub type BoardId = Uuid;

/// Longest accepted board title, in characters.
pub const MAX_TITLE_LEN: usize = 60;

/// Thumbnails assigned at random to new boards.
pub const PLACEHOLDER_IMAGES: [&str; 10] = [
    "/placeholders/1.svg",
    "/placeholders/2.svg",
    "/placeholders/3.svg",
    "/placeholders/4.svg",
    "/placeholders/5.svg",
    "/placeholders/6.svg",
    "/placeholders/7.svg",
    "/placeholders/8.svg",
    "/placeholders/9.svg",
    "/placeholders/10.svg",
];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("board title is empty")]
    EmptyTitle,
    #[error("board title is longer than {max} characters")]
    TitleTooLong { max: usize },
    #[error("board not found: {0}")]
    NotFound(BoardId),
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    /// The display name, falling back to the email for accounts without one.
    #[must_use]
    pub fn author_name(&self) -> String {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or_default()
            .to_owned()
    }
}

/// Metadata stored for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRecord {
    pub id: BoardId,
    pub title: String,
    pub org_id: String,
    pub author_id: String,
    pub author_name: String,
    pub image_url: String,
}

/// The board metadata service.
pub trait BoardDirectory {
    /// Create a board in `org_id` authored by `identity`.
    ///
    /// # Errors
    ///
    /// [`BoardError::Unauthorized`] without an identity, or a title error.
    fn create(&mut self, identity: Option<&Identity>, title: &str, org_id: &str) -> Result<BoardRecord, BoardError>;

    /// Retitle an existing board.
    ///
    /// # Errors
    ///
    /// [`BoardError::Unauthorized`], a title error, or [`BoardError::NotFound`].
    fn rename(&mut self, identity: Option<&Identity>, id: BoardId, title: &str) -> Result<BoardRecord, BoardError>;

    /// Delete a board.
    ///
    /// # Errors
    ///
    /// [`BoardError::Unauthorized`] or [`BoardError::NotFound`].
    fn remove(&mut self, identity: Option<&Identity>, id: BoardId) -> Result<(), BoardError>;

    fn get(&self, id: &BoardId) -> Option<&BoardRecord>;
}

/// Trim a title and check it against the length limits.
///
/// # Errors
///
/// [`BoardError::EmptyTitle`] or [`BoardError::TitleTooLong`].
pub fn normalize_title(title: &str) -> Result<String, BoardError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BoardError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(BoardError::TitleTooLong { max: MAX_TITLE_LEN });
    }
    Ok(title.to_owned())
}

fn random_image() -> &'static str {
    PLACEHOLDER_IMAGES[rand::rng().random_range(0..PLACEHOLDER_IMAGES.len())]
}

// =============================================================================
// IN-MEMORY DIRECTORY
// =============================================================================

/// Boards kept in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryBoardDirectory {
    boards: HashMap<BoardId, BoardRecord>,
}

impl MemoryBoardDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Boards belonging to `org_id`, sorted by title.
    #[must_use]
    pub fn list(&self, org_id: &str) -> Vec<&BoardRecord> {
        let mut boards: Vec<&BoardRecord> = self.boards.values().filter(|b| b.org_id == org_id).collect();
        boards.sort_by(|a, b| a.title.cmp(&b.title));
        boards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}

impl BoardDirectory for MemoryBoardDirectory {
    fn create(&mut self, identity: Option<&Identity>, title: &str, org_id: &str) -> Result<BoardRecord, BoardError> {
        let identity = identity.ok_or(BoardError::Unauthorized)?;
        let title = normalize_title(title)?;
        let record = BoardRecord {
            id: Uuid::new_v4(),
            title,
            org_id: org_id.to_owned(),
            author_id: identity.user_id.clone(),
            author_name: identity.author_name(),
            image_url: random_image().to_owned(),
        };
        info!(board_id = %record.id, org_id, "board created");
        self.boards.insert(record.id, record.clone());
        Ok(record)
    }

    fn rename(&mut self, identity: Option<&Identity>, id: BoardId, title: &str) -> Result<BoardRecord, BoardError> {
        identity.ok_or(BoardError::Unauthorized)?;
        let title = normalize_title(title)?;
        let board = self.boards.get_mut(&id).ok_or(BoardError::NotFound(id))?;
        board.title = title;
        info!(board_id = %id, "board renamed");
        Ok(board.clone())
    }

    fn remove(&mut self, identity: Option<&Identity>, id: BoardId) -> Result<(), BoardError> {
        identity.ok_or(BoardError::Unauthorized)?;
        self.boards.remove(&id).ok_or(BoardError::NotFound(id))?;
        info!(board_id = %id, "board removed");
        Ok(())
    }

    fn get(&self, id: &BoardId) -> Option<&BoardRecord> {
        self.boards.get(id)
    }
}
