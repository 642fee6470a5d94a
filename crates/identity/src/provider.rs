//! Contract for the external identity provider
//!
//! The provider owns the session cache (accounts, refresh tokens) and all
//! interactive flows. This crate never stores credentials itself; it only asks
//! the provider for them. The trait uses `Pin<Box<dyn Future>>` returns so it
//! stays dyn-compatible and can be shared as `Arc<dyn IdentityProvider>`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use common::Secret;
use serde::{Deserialize, Serialize};

use crate::config::ScopeSet;
use crate::error::Result;

/// A signed-in principal as known to the provider's session cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable cache key for the account
    pub home_account_id: String,
    /// Sign-in name (UPN or email)
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    pub tenant_id: String,
}

/// Opaque bearer credential. Never logged, zeroized on drop.
#[derive(Clone, PartialEq)]
pub struct AccessToken(Secret<String>);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value.into()))
    }

    pub fn secret(&self) -> &str {
        self.0.expose()
    }

    /// `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({:?})", self.0)
    }
}

/// Outcome of any successful token or sign-in operation.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    pub account: Account,
    pub access_token: AccessToken,
    pub scopes: ScopeSet,
}

/// Silent acquisition is always bound to a specific cached account.
#[derive(Debug, Clone)]
pub struct SilentTokenRequest {
    pub scopes: ScopeSet,
    pub account: Account,
}

#[derive(Debug, Clone)]
pub struct LogoutRequest {
    pub account: Option<Account>,
    pub post_logout_redirect_uri: String,
}

/// Operations consumed from the identity provider.
///
/// `active_account`, `all_accounts` and `set_active_account` read or write the
/// provider's local cache only and never touch the network.
pub trait IdentityProvider: Send + Sync {
    /// Identifier for logging (e.g. "msal", "static")
    fn id(&self) -> &str;

    /// Load the persisted cache. Must complete before any other call.
    fn initialize(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    fn all_accounts(&self) -> Vec<Account>;

    fn active_account(&self) -> Option<Account>;

    /// Mark an account as active, or clear the active account with `None`.
    fn set_active_account(&self, account: Option<Account>);

    /// Obtain a token from the cache or refresh token, without user interaction.
    fn acquire_token_silent<'a>(
        &'a self,
        request: &'a SilentTokenRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticationResult>> + Send + 'a>>;

    /// Obtain a token through a user-facing prompt.
    fn acquire_token_popup<'a>(
        &'a self,
        scopes: &'a ScopeSet,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticationResult>> + Send + 'a>>;

    /// Interactive sign-in.
    fn login_popup<'a>(
        &'a self,
        scopes: &'a ScopeSet,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticationResult>> + Send + 'a>>;

    /// Interactive sign-out; clears the account from the provider's cache.
    fn logout_popup<'a>(
        &'a self,
        request: &'a LogoutRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
