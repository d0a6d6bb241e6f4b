//! Module event log.
//!
//! Every successful state transition appends one event:
//! - Configured / Cleared (profile requirement)
//! - Collected / Refunded (escrow entry of a pair)
//!
//! Append-only, chronological. Queried by profile, follower or kind.

use super::types::{AssetAmount, FollowerId, ProfileId};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Configured { requirement: Vec<AssetAmount> },
    Cleared,
    Collected {
        follower: FollowerId,
        deposits: Vec<AssetAmount>,
    },
    Refunded {
        follower: FollowerId,
        deposits: Vec<AssetAmount>,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Configured { .. } => "configured",
            EventKind::Cleared => "cleared",
            EventKind::Collected { .. } => "collected",
            EventKind::Refunded { .. } => "refunded",
        }
    }

    pub fn follower(&self) -> Option<&FollowerId> {
        match self {
            EventKind::Collected { follower, .. } | EventKind::Refunded { follower, .. } => {
                Some(follower)
            }
            _ => None,
        }
    }
}

/// Single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEvent {
    /// Position in the log.
    pub seq: u64,
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    pub profile: ProfileId,
    pub kind: EventKind,
}

/// Query filter. Results are most recent first.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub profile: Option<ProfileId>,
    pub follower: Option<FollowerId>,
    pub kind: Option<&'static str>,
    pub limit: Option<usize>,
}

/// Append-only event log.
#[derive(Debug, Default)]
pub struct EventLog {
    events: RwLock<Vec<ModuleEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, profile: ProfileId, kind: EventKind) -> ModuleEvent {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        let event = ModuleEvent {
            seq: events.len() as u64,
            timestamp,
            profile,
            kind,
        };
        events.push(event.clone());
        event
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events in log order.
    pub fn all(&self) -> Vec<ModuleEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn query(&self, query: &EventQuery) -> Vec<ModuleEvent> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        let matching = events
            .iter()
            .rev()
            .filter(|e| query.profile.map_or(true, |p| e.profile == p))
            .filter(|e| {
                query
                    .follower
                    .as_ref()
                    .map_or(true, |f| e.kind.follower() == Some(f))
            })
            .filter(|e| query.kind.map_or(true, |k| e.kind.name() == k))
            .cloned();

        match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}
