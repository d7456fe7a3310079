use async_trait::async_trait;

use crate::domain::errors::AuthError;
use crate::domain::value_objects::Credential;

/// Port for a single credential exchange with the identity provider
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self) -> Result<Credential, AuthError>;
}

/// Port for anything that can hand out a currently valid credential
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<Credential, AuthError>;
}
