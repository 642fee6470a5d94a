//! Identity provider backed by a pre-issued access token
//!
//! A terminal has no popup, so the CLI signs in with a token obtained
//! elsewhere (`INVENTORY_ACCESS_TOKEN` or `access_token_file`). With a token
//! present a synthetic account is cached and made active on `initialize()`;
//! without one the session stays signed out and requests go unauthenticated.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use common::Secret;
use identity::{
    AccessToken, Account, AuthError, AuthenticationResult, IdentityProvider, LogoutRequest,
    ScopeSet, SilentTokenRequest,
};
use tracing::debug;

const NO_INTERACTION: &str = "interactive sign-in is not available in the CLI; set INVENTORY_ACCESS_TOKEN";

pub struct StaticIdentityProvider {
    token: Option<AccessToken>,
    account: Account,
    active: Mutex<Option<Account>>,
}

impl StaticIdentityProvider {
    pub fn new(token: Option<Secret<String>>, tenant_id: &str) -> Self {
        Self {
            token: token.map(|t| AccessToken::new(t.expose().as_str())),
            account: Account {
                home_account_id: "static-token".to_string(),
                username: "static-token".to_string(),
                name: None,
                tenant_id: tenant_id.to_string(),
            },
            active: Mutex::new(None),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<Account>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn id(&self) -> &str {
        "static"
    }

    fn initialize(&self) -> Pin<Box<dyn Future<Output = identity::Result<()>> + Send + '_>> {
        debug!(has_token = self.token.is_some(), "static identity provider ready");
        Box::pin(async { Ok(()) })
    }

    fn all_accounts(&self) -> Vec<Account> {
        match self.token {
            Some(_) => vec![self.account.clone()],
            None => Vec::new(),
        }
    }

    fn active_account(&self) -> Option<Account> {
        self.active().clone()
    }

    fn set_active_account(&self, account: Option<Account>) {
        *self.active() = account;
    }

    fn acquire_token_silent<'a>(
        &'a self,
        request: &'a SilentTokenRequest,
    ) -> Pin<Box<dyn Future<Output = identity::Result<AuthenticationResult>> + Send + 'a>> {
        let result = match &self.token {
            Some(token) => Ok(AuthenticationResult {
                account: request.account.clone(),
                access_token: token.clone(),
                scopes: request.scopes.clone(),
            }),
            None => Err(AuthError::InteractionRequired("no access token configured".into())),
        };
        Box::pin(async move { result })
    }

    fn acquire_token_popup<'a>(
        &'a self,
        _scopes: &'a ScopeSet,
    ) -> Pin<Box<dyn Future<Output = identity::Result<AuthenticationResult>> + Send + 'a>> {
        Box::pin(async { Err(AuthError::InteractionRequired(NO_INTERACTION.into())) })
    }

    fn login_popup<'a>(
        &'a self,
        _scopes: &'a ScopeSet,
    ) -> Pin<Box<dyn Future<Output = identity::Result<AuthenticationResult>> + Send + 'a>> {
        Box::pin(async { Err(AuthError::UserCancelled("login".into())) })
    }

    fn logout_popup<'a>(
        &'a self,
        _request: &'a LogoutRequest,
    ) -> Pin<Box<dyn Future<Output = identity::Result<()>> + Send + 'a>> {
        *self.active() = None;
        Box::pin(async { Ok(()) })
    }
}
