// ============================================================================
// Client API : statistiques du plugin
// ============================================================================
// Deux endpoints GET sous la même base REST, mêmes paramètres :
// - /stats : un échantillon par jour actif  {date, pageviews, visitors}
// - /posts : une ligne par article          {id, visitors, pageviews, post_title, post_permalink}
//
// Paramètres : start_date, end_date au format yyyy-MM-dd
// Authentification : mot de passe d'application WordPress (HTTP basic)
// ============================================================================

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::models::{rank_posts, DateRange, PostStats, SparseSample};

/// Délai maximal d'une requête
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source des statistiques (le client HTTP, ou un double en test)
///
/// CONCEPT RUST : impl Future dans un trait
/// - chaque implémentation écrit simplement `async fn`
/// - le worker reste générique : StatsClient en production, une source
///   en mémoire dans les tests
pub trait StatsSource {
    fn fetch_stats(&self, range: DateRange) -> impl Future<Output = Result<Vec<SparseSample>>>;
    fn fetch_posts(&self, range: DateRange) -> impl Future<Output = Result<Vec<PostStats>>>;
}

/// Erreur REST renvoyée par WordPress ({"code": ..., "message": ...})
#[derive(Debug, Deserialize)]
struct RestError {
    code: String,
    message: String,
}

/// Client HTTP de l'API statistiques
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    app_password: Option<String>,
}

impl StatsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pageviews/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            http,
            base_url: config.api_base().to_string(),
            username: config.username.clone(),
            app_password: config.app_password.clone(),
        })
    }

    /// URL complète d'un endpoint pour une plage
    pub fn request_url(&self, endpoint: &str, range: &DateRange) -> Result<Url> {
        build_request_url(&self.base_url, endpoint, range)
    }

    /// GET + désérialisation JSON
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, range: &DateRange) -> Result<T> {
        let url = self.request_url(endpoint, range)?;
        debug!(url = %url, "Sending HTTP request");

        let mut request = self.http.get(url);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.app_password.as_ref());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers /{}", endpoint))?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, endpoint, "Stats API returned error status");
            match serde_json::from_str::<RestError>(&body) {
                Ok(rest) => anyhow::bail!("HTTP {} ({}) : {}", status, rest.code, rest.message),
                Err(_) => anyhow::bail!("L'API a retourné une erreur : HTTP {}", status),
            }
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Échec du parsing JSON de /{}", endpoint))
    }
}

impl StatsSource for StatsClient {
    #[instrument(skip(self, range), fields(range = %range))]
    async fn fetch_stats(&self, range: DateRange) -> Result<Vec<SparseSample>> {
        let samples: Vec<SparseSample> = self.get_json("stats", &range).await?;
        info!(samples = samples.len(), "Fetched daily stats");
        Ok(samples)
    }

    #[instrument(skip(self, range), fields(range = %range))]
    async fn fetch_posts(&self, range: DateRange) -> Result<Vec<PostStats>> {
        let mut posts: Vec<PostStats> = self.get_json("posts", &range).await?;
        rank_posts(&mut posts);
        info!(posts = posts.len(), "Fetched posts ranking");
        Ok(posts)
    }
}

/// Construit `{base}/{endpoint}?start_date=...&end_date=...`
pub fn build_request_url(base: &str, endpoint: &str, range: &DateRange) -> Result<Url> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), endpoint);
    Url::parse_with_params(
        &raw,
        &[("start_date", range.start_param()), ("end_date", range.end_param())],
    )
    .with_context(|| format!("URL d'API invalide : {}", raw))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_request_url() {
        let url = build_request_url("https://example.com/wp-json/zero-pageviews/v1/", "stats", &range()).unwrap();

        assert_eq!(url.path(), "/wp-json/zero-pageviews/v1/stats");
        assert_eq!(url.query(), Some("start_date=2024-01-01&end_date=2024-01-03"));
    }

    #[test]
    fn test_build_request_url_rejects_garbage_base() {
        assert!(build_request_url("not a url", "stats", &range()).is_err());
    }

    #[test]
    fn test_client_uses_config_base() {
        let config = Config {
            api_url: "http://localhost:8080/wp-json/zero-pageviews/v1".to_string(),
            ..Config::default()
        };
        let client = StatsClient::new(&config).unwrap();
        let url = client.request_url("posts", &range()).unwrap();

        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(8080));
        assert!(url.as_str().contains("/posts?start_date=2024-01-01"));
    }

    #[test]
    fn test_rest_error_body() {
        let body = r#"{"code":"rest_forbidden","message":"Sorry, you are not allowed to do that.","data":{"status":401}}"#;
        let rest: RestError = serde_json::from_str(body).unwrap();
        assert_eq!(rest.code, "rest_forbidden");
    }

    // Serveur injoignable : l'erreur remonte, sans panic
    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let config = Config {
            api_url: "http://127.0.0.1:9/wp-json/zero-pageviews/v1".to_string(),
            ..Config::default()
        };
        let client = StatsClient::new(&config).unwrap();
        assert!(client.fetch_stats(range()).await.is_err());
    }
}
