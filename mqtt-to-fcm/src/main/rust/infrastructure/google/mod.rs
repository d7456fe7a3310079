mod service_account;
mod service_account_exchanger;

pub use service_account::{ServiceAccountKey, DEFAULT_TOKEN_URI};
pub use service_account_exchanger::{
    AssertionClaims, ServiceAccountExchanger, JWT_BEARER_GRANT, MESSAGING_SCOPE,
};
