//! Token lifecycle for the active session
//!
//! `TokenManager` produces a bearer token for the currently active account.
//! Acquisition is a two-step operation: a silent attempt against the provider's
//! cache (`try_refresh`), then exactly one interactive attempt
//! (`interactive_refresh`) when the silent step reports that interaction is
//! needed. The provider is injected at construction so tests can substitute a
//! fake.
//!
//! Session states:
//! - SignedOut → SignedIn (login)
//! - SignedIn → SignedIn (silent refresh, invisible to callers)
//! - SignedIn → SignedOut (logout, forced logout after a 401)

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_POST_LOGOUT_REDIRECT_URI, IdentityConfig, ScopeSet};
use crate::error::{AuthError, Result};
use crate::provider::{AccessToken, Account, IdentityProvider, LogoutRequest, SilentTokenRequest};

/// Result of the silent acquisition step.
#[derive(Debug)]
pub enum RefreshOutcome {
    Token(AccessToken),
    /// Silent acquisition failed; carries the reason for logging.
    NeedsInteraction(AuthError),
}

/// Externally visible session state. Refreshing is not a state of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SignedIn(Account),
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::SignedOut => "signed_out",
            SessionState::SignedIn(_) => "signed_in",
        }
    }
}

/// Obtains and refreshes access tokens for the active account.
///
/// Holds no tokens of its own. Concurrent `acquire_token` calls are not
/// de-duplicated here; the provider is responsible for serializing popups.
pub struct TokenManager {
    provider: Arc<dyn IdentityProvider>,
    login_scopes: ScopeSet,
    api_scopes: ScopeSet,
    post_logout_redirect_uri: String,
}

impl TokenManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        login_scopes: ScopeSet,
        api_scopes: ScopeSet,
    ) -> Self {
        Self {
            provider,
            login_scopes,
            api_scopes,
            post_logout_redirect_uri: DEFAULT_POST_LOGOUT_REDIRECT_URI.to_string(),
        }
    }

    /// Build a manager with the scope sets and redirect derived from config.
    pub fn from_config(provider: Arc<dyn IdentityProvider>, config: &IdentityConfig) -> Self {
        Self {
            provider,
            login_scopes: config.login_scopes(),
            api_scopes: config.api_scopes(),
            post_logout_redirect_uri: config.post_logout_redirect_uri.clone(),
        }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn api_scopes(&self) -> &ScopeSet {
        &self.api_scopes
    }

    /// Initialize the provider and restore a cached session.
    ///
    /// If the cache holds accounts but none is active, the first one becomes
    /// active. Failures are logged; the session then simply starts signed out.
    pub async fn initialize(&self) {
        if let Err(e) = self.provider.initialize().await {
            error!(provider = self.provider.id(), error = %e, "identity provider initialization failed");
            return;
        }

        if self.provider.active_account().is_some() {
            return;
        }

        let accounts = self.provider.all_accounts();
        if let Some(first) = accounts.into_iter().next() {
            info!(account = %first.username, "restored cached session");
            self.provider.set_active_account(Some(first));
        } else {
            debug!("no cached accounts, starting signed out");
        }
    }

    /// The account currently marked active. Never touches the network.
    pub fn active_account(&self) -> Option<Account> {
        self.provider.active_account()
    }

    pub fn state(&self) -> SessionState {
        match self.active_account() {
            Some(account) => SessionState::SignedIn(account),
            None => SessionState::SignedOut,
        }
    }

    /// Produce a bearer token for the active account.
    ///
    /// `Ok(None)` means nobody is signed in and the caller should proceed
    /// unauthenticated. An interactive failure is returned as-is.
    pub async fn acquire_token(&self) -> Result<Option<AccessToken>> {
        let Some(account) = self.active_account() else {
            debug!("no active account, proceeding without token");
            return Ok(None);
        };

        match self.try_refresh(&account).await {
            RefreshOutcome::Token(token) => Ok(Some(token)),
            RefreshOutcome::NeedsInteraction(reason) => {
                warn!(account = %account.username, error = %reason, "silent token acquisition failed, trying interactive");
                self.interactive_refresh().await.map(Some)
            }
        }
    }

    /// Silent acquisition bound to `account`. Every failure means interaction
    /// is needed, whatever the underlying cause.
    pub async fn try_refresh(&self, account: &Account) -> RefreshOutcome {
        let request = SilentTokenRequest {
            scopes: self.api_scopes.clone(),
            account: account.clone(),
        };
        match self.provider.acquire_token_silent(&request).await {
            Ok(result) => {
                record_acquisition("silent", "success");
                RefreshOutcome::Token(result.access_token)
            }
            Err(e) => {
                record_acquisition("silent", "failure");
                RefreshOutcome::NeedsInteraction(e)
            }
        }
    }

    /// Interactive acquisition with the API scopes.
    pub async fn interactive_refresh(&self) -> Result<AccessToken> {
        match self.provider.acquire_token_popup(&self.api_scopes).await {
            Ok(result) => {
                record_acquisition("interactive", "success");
                info!(account = %result.account.username, "interactive token acquisition succeeded");
                Ok(result.access_token)
            }
            Err(e) => {
                record_acquisition("interactive", "failure");
                error!(error = %e, "interactive token acquisition failed");
                Err(e)
            }
        }
    }

    /// Interactive sign-in. Returns `None` on cancellation or failure.
    pub async fn login(&self) -> Option<Account> {
        match self.provider.login_popup(&self.login_scopes).await {
            Ok(result) => {
                info!(account = %result.account.username, "signed in");
                self.provider.set_active_account(Some(result.account.clone()));
                Some(result.account)
            }
            Err(e) if e.is_cancellation() => {
                info!(error = %e, "sign-in cancelled");
                None
            }
            Err(e) => {
                error!(error = %e, "sign-in failed");
                None
            }
        }
    }

    /// Interactive sign-out of the active account.
    ///
    /// Never fails from the caller's point of view. The local session ends
    /// even when the provider-side sign-out reports an error.
    pub async fn logout(&self) {
        let Some(account) = self.active_account() else {
            debug!("logout requested with no active account");
            return;
        };

        let request = LogoutRequest {
            account: Some(account.clone()),
            post_logout_redirect_uri: self.post_logout_redirect_uri.clone(),
        };
        match self.provider.logout_popup(&request).await {
            Ok(()) => info!(account = %account.username, "signed out"),
            Err(e) => warn!(account = %account.username, error = %e, "sign-out failed, clearing local session anyway"),
        }

        // Only clear the account this call signed out; a sign-in that
        // completed meanwhile stays active.
        match self.active_account() {
            Some(current) if current != account => {
                info!(account = %current.username, "another account signed in during logout, keeping it active");
            }
            _ => self.provider.set_active_account(None),
        }
    }

    /// Make sure somebody is signed in, prompting once if not.
    pub async fn ensure_signed_in(&self) -> bool {
        if self.active_account().is_some() {
            return true;
        }
        self.login().await;
        self.active_account().is_some()
    }
}

fn record_acquisition(mode: &'static str, outcome: &'static str) {
    metrics::counter!("token_acquisitions_total", "mode" => mode, "outcome" => outcome)
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeIdentityProvider, test_account};
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn manager(provider: &Arc<FakeIdentityProvider>) -> TokenManager {
        TokenManager::from_config(provider.clone(), &IdentityConfig::default())
    }

    #[tokio::test]
    async fn no_active_account_yields_none_without_provider_calls() {
        let provider = Arc::new(FakeIdentityProvider::new());
        let tokens = manager(&provider);

        let token = tokens.acquire_token().await.unwrap();
        assert!(token.is_none());
        assert_eq!(provider.silent_calls(), 0);
        assert_eq!(provider.popup_calls(), 0);
    }

    #[tokio::test]
    async fn silent_success_returns_token() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_silent_token("at_silent"),
        );
        let tokens = manager(&provider);

        let token = tokens.acquire_token().await.unwrap().unwrap();
        assert_eq!(token.secret(), "at_silent");
        assert_eq!(provider.silent_calls(), 1);
        assert_eq!(provider.popup_calls(), 0);
    }

    #[tokio::test]
    async fn silent_request_uses_api_scopes_and_active_account() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_silent_token("at_silent"),
        );
        let tokens = manager(&provider);
        tokens.acquire_token().await.unwrap();

        let request = provider.last_silent_request().unwrap();
        assert_eq!(request.account.username, "ada@example.com");
        assert_eq!(&request.scopes, tokens.api_scopes());
        assert!(request.scopes.to_scope_string().ends_with("/access_as_user"));
    }

    #[tokio::test]
    async fn silent_failure_falls_back_to_popup_exactly_once() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_silent_failure(AuthError::Network("timeout".into()))
                .with_popup_token("at_popup"),
        );
        let tokens = manager(&provider);

        let token = tokens.acquire_token().await.unwrap().unwrap();
        assert_eq!(token.secret(), "at_popup");
        assert_eq!(provider.silent_calls(), 1);
        assert_eq!(provider.popup_calls(), 1);
    }

    #[tokio::test]
    async fn popup_failure_propagates() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_silent_failure(AuthError::InteractionRequired("consent".into()))
                .with_popup_failure(AuthError::UserCancelled("popup".into())),
        );
        let tokens = manager(&provider);

        let err = tokens.acquire_token().await.unwrap_err();
        assert_eq!(err, AuthError::UserCancelled("popup".into()));
        assert_eq!(provider.popup_calls(), 1);
    }

    #[tokio::test]
    async fn try_refresh_reports_needs_interaction() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_silent_failure(AuthError::InteractionRequired("expired".into())),
        );
        let tokens = manager(&provider);

        match tokens.try_refresh(&test_account("ada")).await {
            RefreshOutcome::NeedsInteraction(reason) => {
                assert_eq!(reason, AuthError::InteractionRequired("expired".into()));
            }
            RefreshOutcome::Token(_) => panic!("expected NeedsInteraction"),
        }
        assert_eq!(provider.popup_calls(), 0, "try_refresh must not prompt");
    }

    #[tokio::test]
    async fn login_sets_active_account() {
        let provider = Arc::new(FakeIdentityProvider::new().with_login_account(test_account("ada")));
        let tokens = manager(&provider);
        assert_eq!(tokens.state(), SessionState::SignedOut);

        let account = tokens.login().await.unwrap();
        assert_eq!(account.username, "ada@example.com");
        assert_eq!(tokens.state(), SessionState::SignedIn(account));
        assert_eq!(provider.last_login_scopes().unwrap().as_slice(), ["User.Read"]);
    }

    #[tokio::test]
    async fn login_cancellation_returns_none() {
        let provider = Arc::new(FakeIdentityProvider::new());
        let tokens = manager(&provider);

        assert!(tokens.login().await.is_none());
        assert!(tokens.active_account().is_none());
        assert_eq!(provider.login_calls(), 1);
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let provider = Arc::new(FakeIdentityProvider::new().signed_in(test_account("ada")));
        let tokens = manager(&provider);

        tokens.logout().await;
        assert_eq!(tokens.state(), SessionState::SignedOut);
        assert_eq!(provider.logout_calls(), 1);
    }

    #[tokio::test]
    async fn logout_failure_is_swallowed_and_session_cleared() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_logout_failure(AuthError::UserCancelled("logout".into())),
        );
        let tokens = manager(&provider);

        tokens.logout().await;
        assert_eq!(provider.logout_calls(), 1);
        assert_eq!(tokens.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn logout_without_account_is_noop() {
        let provider = Arc::new(FakeIdentityProvider::new());
        let tokens = manager(&provider);

        tokens.logout().await;
        assert_eq!(provider.logout_calls(), 0);
    }

    #[tokio::test]
    async fn logout_keeps_account_that_signed_in_meanwhile() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_sign_in_during_logout(test_account("grace")),
        );
        let tokens = manager(&provider);

        tokens.logout().await;

        assert_eq!(provider.logout_calls(), 1);
        assert_eq!(tokens.state(), SessionState::SignedIn(test_account("grace")));
    }

    #[tokio::test]
    async fn initialize_activates_first_cached_account() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .with_cached_account(test_account("ada"))
                .with_cached_account(test_account("grace")),
        );
        let tokens = manager(&provider);
        assert!(tokens.active_account().is_none());

        tokens.initialize().await;
        assert_eq!(provider.initialize_calls(), 1);
        assert_eq!(tokens.active_account().unwrap().username, "ada@example.com");
    }

    #[tokio::test]
    async fn initialize_keeps_existing_active_account() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .with_cached_account(test_account("ada"))
                .signed_in(test_account("grace")),
        );
        let tokens = manager(&provider);

        tokens.initialize().await;
        assert_eq!(tokens.active_account().unwrap().username, "grace@example.com");
    }

    #[tokio::test]
    async fn initialize_failure_leaves_session_signed_out() {
        let provider = Arc::new(
            FakeIdentityProvider::new()
                .with_cached_account(test_account("ada"))
                .with_initialize_failure(AuthError::Provider("cache corrupt".into())),
        );
        let tokens = manager(&provider);

        tokens.initialize().await;
        assert_eq!(tokens.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn ensure_signed_in_skips_login_when_active() {
        let provider = Arc::new(FakeIdentityProvider::new().signed_in(test_account("ada")));
        let tokens = manager(&provider);

        assert!(tokens.ensure_signed_in().await);
        assert_eq!(provider.login_calls(), 0);
    }

    #[tokio::test]
    async fn ensure_signed_in_prompts_once() {
        let provider = Arc::new(FakeIdentityProvider::new().with_login_account(test_account("ada")));
        let tokens = manager(&provider);

        assert!(tokens.ensure_signed_in().await);
        assert_eq!(provider.login_calls(), 1);

        let cancelled = Arc::new(FakeIdentityProvider::new());
        let tokens = manager(&cancelled);
        assert!(!tokens.ensure_signed_in().await);
        assert_eq!(cancelled.login_calls(), 1);
    }

    #[test]
    fn session_state_labels() {
        assert_eq!(SessionState::SignedOut.label(), "signed_out");
        assert_eq!(SessionState::SignedIn(test_account("ada")).label(), "signed_in");
    }

    #[tokio::test]
    async fn acquisitions_are_counted_by_mode_and_outcome() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let provider = Arc::new(
            FakeIdentityProvider::new()
                .signed_in(test_account("ada"))
                .with_silent_failure(AuthError::Network("offline".into()))
                .with_popup_token("at_popup"),
        );
        manager(&provider).acquire_token().await.unwrap();

        let output = handle.render();
        assert!(output.contains("token_acquisitions_total"), "got: {output}");
        assert!(output.contains("mode=\"silent\""));
        assert!(output.contains("outcome=\"failure\""));
        assert!(output.contains("mode=\"interactive\""));
    }
}
