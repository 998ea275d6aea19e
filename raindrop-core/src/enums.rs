//! Enum types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type discriminator for cached responses.
///
/// Each kind owns an independent cache partition per credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Root collection listing
    Collections,
    /// Tag listing across all collections
    Tags,
    /// Authenticated user profile
    User,
}

impl EntityKind {
    /// Every cached entity kind, in a stable order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Collections, EntityKind::Tags, EntityKind::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Collections => "collections",
            EntityKind::Tags => "tags",
            EntityKind::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
