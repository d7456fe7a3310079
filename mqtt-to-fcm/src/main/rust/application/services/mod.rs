mod bridge_service;
mod credential_provider;
mod event_router;

pub use bridge_service::BridgeService;
pub use credential_provider::{CredentialProvider, DEFAULT_REFRESH_MARGIN};
pub use event_router::{EventRouter, DEFAULT_MAX_IN_FLIGHT};
