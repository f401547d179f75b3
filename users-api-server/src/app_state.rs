use std::{sync::Arc, time::Duration};

use crate::services::user_store::{RequestDeadline, UserStore};

/// Dependencies shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) db_timeout: Duration,
}

impl AppState {
    /// Bundles the user store with the per-request database deadline.
    pub fn new(users: Arc<dyn UserStore>, db_timeout: Duration) -> Self {
        Self { users, db_timeout }
    }

    /// Deadline for the store call of a request whose handler starts now.
    pub(crate) fn deadline(&self) -> RequestDeadline {
        RequestDeadline::starting_now(self.db_timeout)
    }
}
