//! Spotify artist search

use super::describe_failure;
use crate::catalog::{CredentialCache, CredentialSource, IssuedToken, SearchProvider};
use crate::config::SpotifyConfig;
use crate::prelude::*;
use async_trait::async_trait;
use marquee_core::entity::{Artist, Slice};
use marquee_core::spotify::{
    token_lifetime, transform_search_response, SpotifySearchResponse, TokenResponse,
    SPOTIFY_MAX_LIMIT,
};
use reqwest::StatusCode;

/// Client-credentials exchange against the Spotify accounts service
pub struct SpotifyCredentials {
    client: reqwest::Client,
    accounts_base: String,
    client_id: String,
    client_secret: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("accounts_base", &self.accounts_base)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl SpotifyCredentials {
    pub fn new(client: reqwest::Client, config: &SpotifyConfig) -> Self {
        Self {
            client,
            accounts_base: config.accounts_base.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    fn basic_auth(&self) -> String {
        use base64::Engine;

        let auth_string = f!("{}:{}", self.client_id, self.client_secret);
        let auth_encoded = base64::engine::general_purpose::STANDARD.encode(auth_string);
        f!("Basic {auth_encoded}")
    }
}

#[async_trait]
impl CredentialSource for SpotifyCredentials {
    async fn exchange(&self) -> CatalogResult<IssuedToken> {
        use reqwest::header::AUTHORIZATION;

        let url = f!("{}/api/token", self.accounts_base);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.basic_auth())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Auth(f!("Failed to reach the Spotify accounts service: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Auth(
                describe_failure(response, "Spotify rejected the client credentials").await,
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(f!("Failed to parse Spotify token response: {e}")))?;

        if token.access_token.is_empty() {
            return Err(Error::Auth("Spotify returned an empty access token".into()));
        }

        Ok(IssuedToken {
            access_token: token.access_token,
            lifetime: token_lifetime(token.expires_in),
        })
    }
}

/// Artist search partitioned by query string, e.g. `genre:rock`
#[derive(Debug)]
pub struct SpotifyProvider {
    client: reqwest::Client,
    api_base: String,
    credentials: CredentialCache<SpotifyCredentials>,
}

impl SpotifyProvider {
    pub fn new(client: reqwest::Client, config: &SpotifyConfig) -> Self {
        Self {
            credentials: CredentialCache::new(SpotifyCredentials::new(client.clone(), config)),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl SearchProvider for SpotifyProvider {
    type Entity = Artist;

    fn name(&self) -> &str {
        "spotify"
    }

    async fn search(
        &self,
        query: &str,
        market: &str,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Slice<Artist>> {
        let token = self.credentials.token().await?;
        let url = f!("{}/search", self.api_base);
        let limit = limit.clamp(1, SPOTIFY_MAX_LIMIT);
        let limit_str = limit.to_string();
        let offset_str = offset.to_string();

        let query_params = [
            ("q", query),
            ("type", "artist"),
            ("market", market),
            ("limit", limit_str.as_str()),
            ("offset", offset_str.as_str()),
        ];

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&query_params)
            .send()
            .await
            .map_err(|e| Error::Upstream(f!("Failed to send request to Spotify: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // the next call exchanges for a new token
            self.credentials.invalidate().await;
        }
        if !status.is_success() {
            return Err(Error::Upstream(
                describe_failure(response, "Spotify search failed").await,
            ));
        }

        let search: SpotifySearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(f!("Failed to parse Spotify response: {e}")))?;

        let mut slice = transform_search_response(search);
        slice.items.truncate(limit);
        Ok(slice)
    }
}
