//! Identity provider configuration
//!
//! Public client registration values for the inventory application. None of
//! these are secrets: they identify the client application and its tenant.
//! Every value can be overridden from the environment; the constants below
//! are the fallbacks used when nothing is configured.

use serde::Deserialize;

/// Public client ID of the inventory SPA registration
pub const DEFAULT_CLIENT_ID: &str = "168b7935-19c0-4a74-9df8-66f288175948";

/// Directory tenant the client is registered in
pub const DEFAULT_TENANT_ID: &str = "3f27241d-d949-4cf1-a670-1c492efb689c";

/// Authority host; the tenant ID is appended as the path
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173";

/// Where the provider returns after an interactive sign-out
pub const DEFAULT_POST_LOGOUT_REDIRECT_URI: &str = "/";

/// Scope requested at sign-in (profile read only)
pub const LOGIN_SCOPE: &str = "User.Read";

/// Name of the delegated permission exposed by the inventory API registration
pub const API_SCOPE_NAME: &str = "access_as_user";

pub const ENV_CLIENT_ID: &str = "IDENTITY_CLIENT_ID";
pub const ENV_TENANT_ID: &str = "IDENTITY_TENANT_ID";
pub const ENV_REDIRECT_URI: &str = "IDENTITY_REDIRECT_URI";
pub const ENV_CACHE_LOCATION: &str = "IDENTITY_CACHE_LOCATION";

/// Ordered set of permission scopes a credential is requested for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for scope in scopes {
            let scope = scope.into();
            if !scope.is_empty() && !set.contains(&scope) {
                set.push(scope);
            }
        }
        Self(set)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space-separated form used on the wire by OAuth providers.
    pub fn to_scope_string(&self) -> String {
        self.0.join(" ")
    }
}

/// Where the identity provider keeps its token cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheLocation {
    /// Cleared when the browser tab closes
    #[default]
    #[serde(alias = "sessionStorage")]
    Session,
    /// Shared across tabs, survives restarts
    #[serde(alias = "localStorage")]
    Local,
    /// Process memory only
    Memory,
}

impl CacheLocation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "session" | "sessionstorage" => Some(Self::Session),
            "local" | "localstorage" => Some(Self::Local),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Local => "local",
            Self::Memory => "memory",
        }
    }
}

/// Identity client settings.
///
/// Deserializable from the `[identity]` table of the service config; every
/// field has a fallback so an empty table is valid.
///
/// `TokenManager` reads only the scopes and the post-logout redirect.
/// `authority()`, `redirect_uri` and `cache_location` are handed to the
/// `IdentityProvider` implementation when it is constructed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub client_id: String,
    pub tenant_id: String,
    /// Full authority URL; derived from `tenant_id` when unset
    pub authority: Option<String>,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub cache_location: CacheLocation,
    /// Scopes requested at sign-in
    pub login_scopes: Vec<String>,
    /// Full API scope; derived from `client_id` when unset
    pub api_scope: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            authority: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            post_logout_redirect_uri: DEFAULT_POST_LOGOUT_REDIRECT_URI.to_string(),
            cache_location: CacheLocation::default(),
            login_scopes: vec![LOGIN_SCOPE.to_string()],
            api_scope: None,
        }
    }
}

impl IdentityConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> common::Result<Self> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from an environment lookup, then validate.
    ///
    /// Empty variables are treated as unset.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> common::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(client_id) = get(ENV_CLIENT_ID) {
            self.client_id = client_id;
        }
        if let Some(tenant_id) = get(ENV_TENANT_ID) {
            self.tenant_id = tenant_id;
        }
        if let Some(redirect_uri) = get(ENV_REDIRECT_URI) {
            self.redirect_uri = redirect_uri;
        }
        if let Some(location) = get(ENV_CACHE_LOCATION) {
            self.cache_location = CacheLocation::parse(&location).ok_or_else(|| {
                common::Error::env(
                    ENV_CACHE_LOCATION,
                    format!("expected session, local or memory, got {location:?}"),
                )
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> common::Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(common::Error::Config("identity client_id must not be empty".into()));
        }
        if self.authority.is_none() && self.tenant_id.trim().is_empty() {
            return Err(common::Error::Config(
                "identity tenant_id must not be empty when no authority is set".into(),
            ));
        }
        if !self.redirect_uri.starts_with("http://") && !self.redirect_uri.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "redirect_uri must start with http:// or https://, got: {}",
                self.redirect_uri
            )));
        }
        Ok(())
    }

    pub fn authority(&self) -> String {
        match &self.authority {
            Some(authority) => authority.clone(),
            None => format!("{AUTHORITY_HOST}/{}", self.tenant_id),
        }
    }

    pub fn login_scopes(&self) -> ScopeSet {
        ScopeSet::new(self.login_scopes.iter().cloned())
    }

    /// `api://<client_id>/access_as_user` unless overridden.
    pub fn api_scopes(&self) -> ScopeSet {
        match &self.api_scope {
            Some(scope) => ScopeSet::new([scope.clone()]),
            None => ScopeSet::new([format!("api://{}/{API_SCOPE_NAME}", self.client_id)]),
        }
    }
}
