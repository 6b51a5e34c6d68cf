use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CatalogId, MediaKind};

/// The most recent interest signal recommendations are derived from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Seed {
    /// The user submitted a search
    Search {
        term: String,
        captured_at: DateTime<Utc>,
    },
    /// The user added a title to one of their playlists
    PlaylistAdd {
        catalog_id: CatalogId,
        media_kind: MediaKind,
        captured_at: DateTime<Utc>,
    },
}

impl Seed {
    pub fn search(term: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Seed::Search {
            term: term.into(),
            captured_at,
        }
    }

    pub fn playlist_add(
        catalog_id: CatalogId,
        media_kind: MediaKind,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Seed::PlaylistAdd {
            catalog_id,
            media_kind,
            captured_at,
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        match self {
            Seed::Search { captured_at, .. } | Seed::PlaylistAdd { captured_at, .. } => {
                *captured_at
            }
        }
    }

    /// Whether two seeds describe the same interest, ignoring when they were captured.
    /// Search terms compare case-insensitively.
    pub fn same_subject(&self, other: &Seed) -> bool {
        match (self, other) {
            (Seed::Search { term: a, .. }, Seed::Search { term: b, .. }) => {
                a.to_lowercase() == b.to_lowercase()
            }
            (
                Seed::PlaylistAdd {
                    catalog_id: a_id,
                    media_kind: a_kind,
                    ..
                },
                Seed::PlaylistAdd {
                    catalog_id: b_id,
                    media_kind: b_kind,
                    ..
                },
            ) => a_id == b_id && a_kind == b_kind,
            _ => false,
        }
    }
}
