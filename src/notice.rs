use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Outcome message shown on the next management-view render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Single-use correlation tokens carrying a notice across one redirect
pub struct NoticeBoard {
    entries: DashMap<Uuid, (Instant, Notice)>,
    ttl: Duration,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn stash(&self, notice: Notice) -> Uuid {
        let now = Instant::now();
        self.entries
            .retain(|_, (stashed_at, _)| now.duration_since(*stashed_at) < self.ttl);

        let token = Uuid::new_v4();
        self.entries.insert(token, (now, notice));
        token
    }

    /// Redeem a token. Unknown, already-used and expired tokens yield `None`.
    pub fn take(&self, token: &Uuid) -> Option<Notice> {
        let (_, (stashed_at, notice)) = self.entries.remove(token)?;
        if stashed_at.elapsed() >= self.ttl {
            tracing::debug!(%token, "Notice token expired");
            return None;
        }
        Some(notice)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
