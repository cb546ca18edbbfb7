//! Reducer environment: the injected dependencies effects close over

use crate::api::{ApiError, BookingApi, HttpBookingApi};
use crate::config::ApiConfig;
use booking_sync_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Dependencies available to the booking reducer
///
/// Cloning is cheap; both members are shared handles.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Server API client
    pub api: Arc<dyn BookingApi>,
    /// Time source, injectable for deterministic tests
    pub clock: Arc<dyn Clock>,
}

impl BookingEnvironment {
    /// Build an environment from explicit dependencies
    #[must_use]
    pub fn new(api: Arc<dyn BookingApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    /// Build the production environment from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let api = HttpBookingApi::new(config.base_url.clone(), config.request_timeout())?;
        Ok(Self::new(Arc::new(api), Arc::new(SystemClock)))
    }
}

impl std::fmt::Debug for BookingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEnvironment").finish_non_exhaustive()
    }
}
