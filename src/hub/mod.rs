//! In-process follow hub.
//!
//! Plays the registry and relationship-token roles around a follow module:
//! - Profiles with an owner and an optional attached follow module
//! - `follow` asks the module to collect, then mints a follow token
//! - `burn` destroys the token and calls the module's `refund` synchronously
//!
//! A follow is only finalized (token minted) when `collect` succeeded. The
//! module that collected is remembered per token and is the one refunding,
//! even after the profile detached or replaced it.

use crate::assets::AccountId;
use crate::follow_module::{FollowModule, FollowModuleError, FollowerId, ProfileId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

/// Follow token identifier.
pub type TokenId = u64;

/// Hub errors.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("profile {0} does not exist")]
    ProfileNotFound(ProfileId),

    #[error("{caller} does not own profile {profile}")]
    NotProfileOwner {
        profile: ProfileId,
        caller: AccountId,
    },

    #[error("follow token {0} does not exist")]
    TokenNotFound(TokenId),

    #[error("{caller} does not hold follow token {token}")]
    NotTokenHolder { token: TokenId, caller: AccountId },

    #[error("follow module error: {0}")]
    Module(#[from] FollowModuleError),
}

/// Hub result type.
pub type HubResult<T> = Result<T, HubError>;

/// Token representing one active follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowToken {
    pub id: TokenId,
    pub profile: ProfileId,
    pub follower: FollowerId,
}

#[derive(Clone)]
struct Profile {
    owner: AccountId,
    follow_module: Option<Arc<dyn FollowModule>>,
}

#[derive(Default)]
struct HubState {
    profiles: HashMap<ProfileId, Profile>,
    tokens: HashMap<TokenId, FollowToken>,
    /// Module holding the escrow of each token minted through `collect`.
    escrow_modules: HashMap<TokenId, Arc<dyn FollowModule>>,
    next_profile: u64,
    next_token: TokenId,
}

/// Registry of profiles and follow tokens.
#[derive(Clone, Default)]
pub struct FollowHub {
    state: Arc<Mutex<HubState>>,
}

impl FollowHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a profile owned by `owner`. Ids start at 1.
    pub fn create_profile(&self, owner: &AccountId, handle: &str) -> ProfileId {
        let mut state = self.state();
        state.next_profile += 1;
        let id = ProfileId(state.next_profile);
        state.profiles.insert(
            id,
            Profile {
                owner: owner.clone(),
                follow_module: None,
            },
        );
        info!(profile = %id, handle, owner = %owner, "profile created");
        id
    }

    fn owned_profile(&self, caller: &AccountId, profile: ProfileId) -> HubResult<Profile> {
        let state = self.state();
        let entry = state
            .profiles
            .get(&profile)
            .ok_or(HubError::ProfileNotFound(profile))?;
        if &entry.owner != caller {
            return Err(HubError::NotProfileOwner {
                profile,
                caller: caller.clone(),
            });
        }
        Ok(entry.clone())
    }

    /// Attach `module` to `profile` with encoded init data, or detach with
    /// `None`. The previous module (if any) is cleared first.
    pub async fn set_follow_module(
        &self,
        caller: &AccountId,
        profile: ProfileId,
        module: Option<Arc<dyn FollowModule>>,
        init_data: &[u8],
    ) -> HubResult<()> {
        let current = self.owned_profile(caller, profile)?;

        if let Some(new_module) = &module {
            new_module.configure_encoded(profile, init_data).await?;
        }

        if let Some(old) = current.follow_module {
            let replaced_itself = module.as_ref().is_some_and(|m| Arc::ptr_eq(m, &old));
            if !replaced_itself {
                match old.clear(profile).await {
                    Ok(_) | Err(FollowModuleError::NotConfigured(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let attached = module.is_some();
        if let Some(entry) = self.state().profiles.get_mut(&profile) {
            entry.follow_module = module;
        }
        info!(profile = %profile, attached, "follow module set");
        Ok(())
    }

    /// Follow `profile`, passing `data` to its follow module.
    pub async fn follow(
        &self,
        follower: &FollowerId,
        profile: ProfileId,
        data: &[u8],
    ) -> HubResult<TokenId> {
        let module = {
            let state = self.state();
            state
                .profiles
                .get(&profile)
                .ok_or(HubError::ProfileNotFound(profile))?
                .follow_module
                .clone()
        };

        if let Some(module) = &module {
            module.collect_encoded(profile, follower, data).await?;
        }

        let mut state = self.state();
        state.next_token += 1;
        let id = state.next_token;
        if let Some(module) = module {
            state.escrow_modules.insert(id, module);
        }
        state.tokens.insert(
            id,
            FollowToken {
                id,
                profile,
                follower: follower.clone(),
            },
        );
        info!(profile = %profile, follower = %follower, token = id, "follow token minted");
        Ok(id)
    }

    /// Burn a follow token and refund the follower's deposits.
    ///
    /// A relationship that never escrowed anything burns cleanly. If the
    /// refund fails the token is restored so the burn can be retried.
    pub async fn burn(&self, caller: &AccountId, token: TokenId) -> HubResult<()> {
        let (follow, module) = {
            let mut state = self.state();
            let follow = state
                .tokens
                .get(&token)
                .cloned()
                .ok_or(HubError::TokenNotFound(token))?;
            if &follow.follower != caller {
                return Err(HubError::NotTokenHolder {
                    token,
                    caller: caller.clone(),
                });
            }
            state.tokens.remove(&token);
            let module = state.escrow_modules.remove(&token);
            (follow, module)
        };

        if let Some(module) = &module {
            let refunded = module.refund(follow.profile, &follow.follower).await;
            match refunded {
                Ok(_) => {}
                Err(e) if e.is_benign() => {
                    debug!(token, profile = %follow.profile, "no deposit to refund");
                }
                Err(e) => {
                    let mut state = self.state();
                    state.tokens.insert(token, follow);
                    state.escrow_modules.insert(token, module.clone());
                    return Err(e.into());
                }
            }
        }

        info!(profile = %follow.profile, follower = %follow.follower, token, "follow token burned");
        Ok(())
    }

    pub fn token(&self, token: TokenId) -> Option<FollowToken> {
        self.state().tokens.get(&token).cloned()
    }

    /// Tokens held by `follower`, ordered by id.
    pub fn tokens_of(&self, follower: &FollowerId) -> Vec<FollowToken> {
        let mut tokens: Vec<_> = self
            .state()
            .tokens
            .values()
            .filter(|t| &t.follower == follower)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.id);
        tokens
    }
}
