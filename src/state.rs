//! Shared state injected into every handler.

use sqlx::types::ipnetwork::IpNetwork;
use std::sync::Arc;

use crate::application::services::{UrlService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService>,
    pub user_service: Arc<UserService>,
    /// Clients allowed to read internal stats. `None` denies everyone.
    pub trusted_subnet: Option<IpNetwork>,
}

impl AppState {
    pub fn new(
        url_service: Arc<UrlService>,
        user_service: Arc<UserService>,
        trusted_subnet: Option<IpNetwork>,
    ) -> Self {
        Self {
            url_service,
            user_service,
            trusted_subnet,
        }
    }
}
