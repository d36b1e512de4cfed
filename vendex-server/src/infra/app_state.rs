use std::{fmt, sync::Arc};

use vendex_core::auth::AuthService;

use crate::infra::config::Config;

/// Shared handles threaded through every request.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, config: Arc<Config>) -> Self {
        Self {
            auth_service,
            config,
        }
    }
}
