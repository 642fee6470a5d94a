//! Scriptable in-memory identity provider for tests
//!
//! Each interactive and silent operation returns a configured result and bumps
//! a call counter, so tests can assert exactly how often each flow ran.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ScopeSet;
use crate::error::{AuthError, Result};
use crate::provider::{
    AccessToken, Account, AuthenticationResult, IdentityProvider, LogoutRequest,
    SilentTokenRequest,
};

/// Account fixture: `<name>@example.com` in tenant `tenant-test`.
pub fn test_account(name: &str) -> Account {
    Account {
        home_account_id: format!("{name}-oid.tenant-test"),
        username: format!("{name}@example.com"),
        name: Some(name.to_string()),
        tenant_id: "tenant-test".to_string(),
    }
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<Account>,
    active: Option<Account>,
    last_silent: Option<SilentTokenRequest>,
    last_login_scopes: Option<ScopeSet>,
}

/// Identity provider whose every response is scripted up front.
///
/// Defaults: silent acquisition requires interaction, popups are cancelled,
/// logout succeeds.
pub struct FakeIdentityProvider {
    state: Mutex<FakeState>,
    initialize_result: Result<()>,
    silent_result: Result<String>,
    popup_result: Result<String>,
    login_result: Result<Account>,
    logout_result: Result<()>,
    /// Account that signs in while a logout popup is still open
    sign_in_during_logout: Option<Account>,
    initialize_calls: AtomicUsize,
    silent_calls: AtomicUsize,
    popup_calls: AtomicUsize,
    login_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            initialize_result: Ok(()),
            silent_result: Err(AuthError::InteractionRequired("no cached token".into())),
            popup_result: Err(AuthError::UserCancelled("popup".into())),
            login_result: Err(AuthError::UserCancelled("login".into())),
            logout_result: Ok(()),
            sign_in_during_logout: None,
            initialize_calls: AtomicUsize::new(0),
            silent_calls: AtomicUsize::new(0),
            popup_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    /// Put an account in the cache without activating it.
    pub fn with_cached_account(self, account: Account) -> Self {
        self.lock().accounts.push(account);
        self
    }

    /// Cache and activate an account.
    pub fn signed_in(self, account: Account) -> Self {
        {
            let mut state = self.lock();
            if !state.accounts.contains(&account) {
                state.accounts.push(account.clone());
            }
            state.active = Some(account);
        }
        self
    }

    pub fn with_initialize_failure(mut self, error: AuthError) -> Self {
        self.initialize_result = Err(error);
        self
    }

    pub fn with_silent_token(mut self, token: &str) -> Self {
        self.silent_result = Ok(token.to_string());
        self
    }

    pub fn with_silent_failure(mut self, error: AuthError) -> Self {
        self.silent_result = Err(error);
        self
    }

    pub fn with_popup_token(mut self, token: &str) -> Self {
        self.popup_result = Ok(token.to_string());
        self
    }

    pub fn with_popup_failure(mut self, error: AuthError) -> Self {
        self.popup_result = Err(error);
        self
    }

    pub fn with_login_account(mut self, account: Account) -> Self {
        self.login_result = Ok(account);
        self
    }

    pub fn with_logout_failure(mut self, error: AuthError) -> Self {
        self.logout_result = Err(error);
        self
    }

    pub fn with_sign_in_during_logout(mut self, account: Account) -> Self {
        self.sign_in_during_logout = Some(account);
        self
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn silent_calls(&self) -> usize {
        self.silent_calls.load(Ordering::SeqCst)
    }

    pub fn popup_calls(&self) -> usize {
        self.popup_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn last_silent_request(&self) -> Option<SilentTokenRequest> {
        self.lock().last_silent.clone()
    }

    pub fn last_login_scopes(&self) -> Option<ScopeSet> {
        self.lock().last_login_scopes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn token_result(
        &self,
        result: &Result<String>,
        account: Option<Account>,
        scopes: &ScopeSet,
    ) -> Result<AuthenticationResult> {
        let token = result.clone()?;
        let account = account.ok_or(AuthError::NoAccount)?;
        Ok(AuthenticationResult {
            account,
            access_token: AccessToken::new(token),
            scopes: scopes.clone(),
        })
    }
}

impl IdentityProvider for FakeIdentityProvider {
    fn id(&self) -> &str {
        "fake"
    }

    fn initialize(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.initialize_result.clone();
        Box::pin(async move { result })
    }

    fn all_accounts(&self) -> Vec<Account> {
        self.lock().accounts.clone()
    }

    fn active_account(&self) -> Option<Account> {
        self.lock().active.clone()
    }

    fn set_active_account(&self, account: Option<Account>) {
        self.lock().active = account;
    }

    fn acquire_token_silent<'a>(
        &'a self,
        request: &'a SilentTokenRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticationResult>> + Send + 'a>> {
        self.silent_calls.fetch_add(1, Ordering::SeqCst);
        self.lock().last_silent = Some(request.clone());
        let result = self.token_result(
            &self.silent_result,
            Some(request.account.clone()),
            &request.scopes,
        );
        Box::pin(async move { result })
    }

    fn acquire_token_popup<'a>(
        &'a self,
        scopes: &'a ScopeSet,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticationResult>> + Send + 'a>> {
        self.popup_calls.fetch_add(1, Ordering::SeqCst);
        let account = self.active_account();
        let result = self.token_result(&self.popup_result, account, scopes);
        Box::pin(async move { result })
    }

    fn login_popup<'a>(
        &'a self,
        scopes: &'a ScopeSet,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticationResult>> + Send + 'a>> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.lock().last_login_scopes = Some(scopes.clone());
        let result = self.login_result.clone().map(|account| {
            let mut state = self.lock();
            if !state.accounts.contains(&account) {
                state.accounts.push(account.clone());
            }
            AuthenticationResult {
                account,
                access_token: AccessToken::new("at_login"),
                scopes: scopes.clone(),
            }
        });
        Box::pin(async move { result })
    }

    fn logout_popup<'a>(
        &'a self,
        request: &'a LogoutRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.logout_result.clone();
        if result.is_ok() {
            let mut state = self.lock();
            if let Some(account) = &request.account {
                state.accounts.retain(|a| a != account);
            }
            state.active = None;
        }
        if let Some(account) = &self.sign_in_during_logout {
            let mut state = self.lock();
            state.accounts.push(account.clone());
            state.active = Some(account.clone());
        }
        Box::pin(async move { result })
    }
}
