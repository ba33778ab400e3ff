use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{UserId, UserProfile, UserStatus};

#[derive(Debug, Default)]
struct StoreState {
    current_user_id: Option<UserId>,
    profiles: HashMap<UserId, UserProfile>,
    statuses: HashMap<UserId, UserStatus>,
}

/// Normalized in-memory cache of user records, shared across the client as
/// `Arc<UserStore>`.
///
/// Bulk fetch results land here via `receive_profiles`/`receive_statuses`
/// (merge by id, last write wins); everything else looks records up by id.
#[derive(Debug, Default)]
pub struct UserStore {
    state: RwLock<StoreState>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_user(id: UserId) -> Self {
        let store = Self::new();
        store.set_current_user(id);
        store
    }

    pub fn set_current_user(&self, id: UserId) {
        self.write().current_user_id = Some(id);
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.read().current_user_id.clone()
    }

    pub fn has_profile(&self, id: &UserId) -> bool {
        self.read().profiles.contains_key(id)
    }

    pub fn profile(&self, id: &UserId) -> Option<UserProfile> {
        self.read().profiles.get(id).cloned()
    }

    pub fn status(&self, id: &UserId) -> Option<UserStatus> {
        self.read().statuses.get(id).cloned()
    }

    pub fn receive_profiles(&self, profiles: Vec<UserProfile>) {
        let mut state = self.write();
        for profile in profiles {
            state.profiles.insert(profile.id.clone(), profile);
        }
    }

    pub fn receive_statuses(&self, statuses: Vec<UserStatus>) {
        let mut state = self.write();
        for status in statuses {
            state.statuses.insert(status.user_id.clone(), status);
        }
    }

    pub fn profile_count(&self) -> usize {
        self.read().profiles.len()
    }

    pub fn status_count(&self) -> usize {
        self.read().statuses.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
