//! Wiring: config → identity → gateway → list fetch

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use api_client::{ApiClient, FetchOutcome, ListOptions, PagedList, Resource};
use identity::TokenManager;
use serde_json::{Value, json};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::Config;
use crate::static_identity::StaticIdentityProvider;

/// Result of one CLI run: the JSON document to print and whether it succeeded.
#[derive(Debug)]
pub struct Report {
    pub outcome: FetchOutcome,
    pub body: Value,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.outcome == FetchOutcome::Applied
    }
}

/// Build the token manager and gateway described by `config`.
pub async fn connect(config: &Config) -> Result<ApiClient> {
    let provider = Arc::new(StaticIdentityProvider::new(
        config.api.access_token.clone(),
        &config.identity.tenant_id,
    ));
    let tokens = Arc::new(TokenManager::from_config(provider, &config.identity));
    tokens.initialize().await;
    info!(
        provider = tokens.provider_id(),
        session = tokens.state().label(),
        authority = %config.identity.authority(),
        redirect_uri = %config.identity.redirect_uri,
        cache_location = config.identity.cache_location.as_str(),
        "identity initialized"
    );

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    Ok(ApiClient::new(http, config.api.base_url.as_str(), tokens)
        .with_timeout(Duration::from_secs(config.api.timeout_secs)))
}

/// Fetch one page of `resource` with the query flags from `args` applied.
pub async fn fetch_page(client: ApiClient, resource: Resource, args: &CliArgs) -> Report {
    let list: PagedList = PagedList::for_resource(client, resource, ListOptions::default());
    list.update_query(|query| args.apply(query));

    let outcome = list.fetch_list().await;
    let state = list.snapshot();
    let body = match outcome {
        FetchOutcome::Applied => json!({
            "resource": resource.name(),
            "page": state.query.page,
            "page_size": state.query.page_size,
            "total": state.total,
            "items": state.items,
        }),
        FetchOutcome::Failed | FetchOutcome::Stale => json!({
            "resource": resource.name(),
            "error": state.error.unwrap_or_else(|| api_client::FETCH_ERROR_MESSAGE.to_string()),
        }),
    };
    Report { outcome, body }
}
