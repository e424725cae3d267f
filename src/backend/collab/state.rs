/**
 * Collaborative Notes State
 *
 * Bundles the note store, the user directory and the services built over
 * them. Every service shares the same `Arc`ed store, so cloning the state is
 * cheap and handlers can extract it directly.
 */

use std::sync::Arc;

use super::access::AccessEvaluator;
use super::invites::InviteManager;
use super::notes::NoteService;
use crate::backend::auth::{MemoryDirectory, UserDirectory};
use crate::backend::store::{MemoryStore, NoteStore};

#[derive(Clone)]
pub struct CollabState {
    pub store: Arc<dyn NoteStore>,
    pub directory: Arc<dyn UserDirectory>,
    pub invites: InviteManager,
    pub access: AccessEvaluator,
    pub notes: NoteService,
}

impl CollabState {
    pub fn new(store: Arc<dyn NoteStore>, directory: Arc<dyn UserDirectory>) -> Self {
        let invites = InviteManager::new(store.clone(), directory.clone());
        let access = AccessEvaluator::new(store.clone(), invites.clone());
        let notes = NoteService::new(store.clone(), access.clone());
        Self {
            store,
            directory,
            invites,
            access,
            notes,
        }
    }

    /// State over in-memory tables, for development and tests
    pub fn memory() -> (Self, MemoryStore, MemoryDirectory) {
        let store = MemoryStore::new();
        let directory = MemoryDirectory::new();
        let state = Self::new(Arc::new(store.clone()), Arc::new(directory.clone()));
        (state, store, directory)
    }
}
