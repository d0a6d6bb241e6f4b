//! Per-key serialization of state-changing operations.
//!
//! - Profile key: `configure`/`clear` take it exclusively, `collect` shares it
//! - Pair key (profile, follower): `collect` and `refund` take it exclusively
//!
//! Operations on disjoint keys never wait on each other. A lock handle lives
//! in its map only while some caller holds or waits on it; the last guard to
//! drop evicts it.

use super::types::{FollowerId, ProfileId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard,
    RwLock as AsyncRwLock,
};

type LockMap<K, L> = Mutex<HashMap<K, Arc<L>>>;
type PairKey = (ProfileId, FollowerId);

/// Held lock on one key. Evicts the key's handle on drop when unused.
pub(crate) struct KeyGuard<'a, K: Eq + Hash, L, G> {
    guard: Option<G>,
    map: &'a LockMap<K, L>,
    key: Option<K>,
}

impl<K: Eq + Hash, L, G> Drop for KeyGuard<'_, K, L, G> {
    fn drop(&mut self) {
        // Release the lock before checking who else still holds the handle.
        self.guard.take();
        if let Some(key) = self.key.take() {
            let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
            if map.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                map.remove(&key);
            }
        }
    }
}

pub(crate) type ProfileReadGuard<'a> =
    KeyGuard<'a, ProfileId, AsyncRwLock<()>, OwnedRwLockReadGuard<()>>;
pub(crate) type ProfileWriteGuard<'a> =
    KeyGuard<'a, ProfileId, AsyncRwLock<()>, OwnedRwLockWriteGuard<()>>;
pub(crate) type PairGuard<'a> = KeyGuard<'a, PairKey, AsyncMutex<()>, OwnedMutexGuard<()>>;

#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    profiles: LockMap<ProfileId, AsyncRwLock<()>>,
    pairs: LockMap<PairKey, AsyncMutex<()>>,
}

fn handle<K: Eq + Hash + Clone, L: Default>(map: &LockMap<K, L>, key: &K) -> Arc<L> {
    let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
    map.entry(key.clone()).or_default().clone()
}

impl KeyLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn profile_read(&self, profile: ProfileId) -> ProfileReadGuard<'_> {
        let lock = handle(&self.profiles, &profile);
        KeyGuard {
            guard: Some(lock.read_owned().await),
            map: &self.profiles,
            key: Some(profile),
        }
    }

    pub(crate) async fn profile_write(&self, profile: ProfileId) -> ProfileWriteGuard<'_> {
        let lock = handle(&self.profiles, &profile);
        KeyGuard {
            guard: Some(lock.write_owned().await),
            map: &self.profiles,
            key: Some(profile),
        }
    }

    pub(crate) async fn pair(&self, profile: ProfileId, follower: &FollowerId) -> PairGuard<'_> {
        let key = (profile, follower.clone());
        let lock = handle(&self.pairs, &key);
        KeyGuard {
            guard: Some(lock.lock_owned().await),
            map: &self.pairs,
            key: Some(key),
        }
    }

    /// Number of live lock handles (profiles, pairs).
    #[cfg(test)]
    pub(crate) fn live_handles(&self) -> (usize, usize) {
        (
            self.profiles
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            self.pairs.lock().unwrap_or_else(PoisonError::into_inner).len(),
        )
    }
}
