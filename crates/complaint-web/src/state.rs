//! Application state shared across handlers.

use database::{Database, TransitionPolicy};

use crate::auth::TokenKeys;
use crate::uploads::UploadStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Attachment storage.
    pub uploads: UploadStore,
    /// Session token keys.
    pub tokens: TokenKeys,
    /// Accepted status changes.
    pub policy: TransitionPolicy,
    /// Body limit for complaint submissions.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        uploads: UploadStore,
        tokens: TokenKeys,
        policy: TransitionPolicy,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            uploads,
            tokens,
            policy,
            max_upload_bytes,
        }
    }
}
