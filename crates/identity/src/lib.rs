//! Identity and token lifecycle for the inventory client
//!
//! Wraps an external identity provider behind the `IdentityProvider` trait and
//! builds the token lifecycle on top of it. The provider owns the account and
//! token cache; this crate only asks it for credentials.
//!
//! Token flow:
//! 1. `TokenManager::initialize()` restores a cached account at startup
//! 2. `TokenManager::acquire_token()` tries silent acquisition for the active account
//! 3. On any silent failure it falls back to one interactive attempt
//! 4. `TokenManager::logout()` ends the session (also used after a 401)

pub mod config;
pub mod error;
pub mod provider;
pub mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{CacheLocation, IdentityConfig, ScopeSet};
pub use error::{AuthError, Result};
pub use provider::{
    AccessToken, Account, AuthenticationResult, IdentityProvider, LogoutRequest,
    SilentTokenRequest,
};
pub use session::{RefreshOutcome, SessionState, TokenManager};
