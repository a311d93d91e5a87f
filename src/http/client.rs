use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::config::BackendConfig;
use crate::observability::api_metrics;

/// Path below the API base, kept as segments so each one is encoded on
/// its own. A pushed id can never add segments, a query or a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    /// Split a fixed route such as `contacts/suggestions`.
    pub fn new(route: &str) -> Self {
        Self {
            segments: route
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Append one opaque segment, e.g. an item id.
    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }
}

impl From<&str> for ApiPath {
    fn from(route: &str) -> Self {
        ApiPath::new(route)
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Rate-limited, caching client for the dashboard REST backend
#[derive(Debug)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    cache: Option<Cache<String, CacheEntry>>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    fetched_at: DateTime<Utc>,
}

impl BackendClient {
    /// Create a new client from the backend section of the configuration
    pub fn new(settings: &BackendConfig) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&settings.base_url).map_err(|e| ApiError::InvalidUrl {
            url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: settings.base_url.clone(),
                reason: "not a hierarchical URL".to_string(),
            });
        }
        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let per_second =
            NonZeroU32::new(settings.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(settings.rate_limit.burst_capacity).unwrap_or(per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(
            Quota::per_second(per_second).allow_burst(burst),
        ));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds.max(1)))
            .user_agent(concat!("deskflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = (settings.cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(settings.cache_ttl_seconds))
                .build()
        });

        Ok(Self {
            http,
            base_url,
            token: settings.token.clone(),
            rate_limiter,
            cache,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &ApiPath, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let invalid = |reason: String| ApiError::InvalidUrl {
            url: format!("{}{}", self.base_url, path),
            reason,
        };
        if let Some(bad) = path
            .segments
            .iter()
            .find(|segment| matches!(segment.as_str(), "" | "." | ".."))
        {
            return Err(invalid(format!("'{bad}' is not a usable path segment")));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| invalid("not a hierarchical URL".to_string()))?
            .pop_if_empty()
            .extend(&path.segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET a JSON document, served from cache when a fresh copy exists
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: impl Into<ApiPath>,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let path = path.into();
        let url = self.url(&path, query)?;
        self.fetch_json(url, &path.to_string(), true).await
    }

    /// GET that always goes to the backend, for values that change between polls
    pub async fn get_json_fresh<T: DeserializeOwned>(
        &self,
        path: impl Into<ApiPath>,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let path = path.into();
        let url = self.url(&path, query)?;
        self.fetch_json(url, &path.to_string(), false).await
    }

    /// GET a follow-up page named by the backend (`next`). Relative links
    /// resolve against the base URL; links to another origin are refused
    /// so the token never leaves the configured backend.
    pub async fn get_next_page<T: DeserializeOwned>(&self, next: &str) -> Result<T, ApiError> {
        let url = self.base_url.join(next).map_err(|e| ApiError::InvalidUrl {
            url: next.to_string(),
            reason: e.to_string(),
        })?;
        if url.origin() != self.base_url.origin() {
            return Err(ApiError::InvalidUrl {
                url: next.to_string(),
                reason: "next page points outside the configured backend".to_string(),
            });
        }
        let resource = url.path().to_string();
        self.fetch_json(url, &resource, true).await
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: Url,
        resource: &str,
        use_cache: bool,
    ) -> Result<T, ApiError> {
        let cache_key = url.to_string();
        let cache = self.cache.as_ref().filter(|_| use_cache);

        if let Some(cache) = cache {
            if let Some(cached) = cache.get(&cache_key).await {
                api_metrics().record_cache_hit();
                debug!(url = %cache_key, fetched_at = %cached.fetched_at, "Cache hit");
                return Ok(serde_json::from_value(cached.data)?);
            }
            api_metrics().record_cache_miss();
        }

        let response = self.send(self.http.request(Method::GET, url), resource).await?;
        let data: serde_json::Value = response.json().await?;

        if let Some(cache) = cache {
            let entry = CacheEntry {
                data: data.clone(),
                fetched_at: Utc::now(),
            };
            cache.insert(cache_key, entry).await;
        }

        Ok(serde_json::from_value(data)?)
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<B, T>(
        &self,
        path: impl Into<ApiPath>,
        body: &B,
        collection: &str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let path = path.into();
        let url = self.url(&path, &[])?;
        let response = self
            .send(self.http.request(Method::POST, url).json(body), &path.to_string())
            .await?;
        self.invalidate_cache_pattern(collection).await;
        Ok(response.json().await?)
    }

    /// DELETE a resource; any 2xx counts as success
    pub async fn delete(&self, path: impl Into<ApiPath>, collection: &str) -> Result<(), ApiError> {
        let path = path.into();
        let url = self.url(&path, &[])?;
        self.send(self.http.request(Method::DELETE, url), &path.to_string())
            .await?;
        self.invalidate_cache_pattern(collection).await;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, ApiError> {
        // Wait for rate limit permission
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        api_metrics().record_request();
        let response = request.send().await.map_err(|e| {
            api_metrics().record_error();
            warn!(resource, error = %e, "Backend request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        api_metrics().record_error();
        if status.as_u16() == 429 {
            api_metrics().record_rate_limit_hit();
        }
        let body = response.text().await.unwrap_or_default();
        warn!(resource, status = status.as_u16(), "Backend returned an error status");
        Err(ApiError::from_status(status.as_u16(), &body, resource))
    }

    /// Drop every cached response
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            info!("Backend response cache cleared");
        }
    }

    /// Invalidate cached responses whose URL contains `pattern` (used after writes)
    pub async fn invalidate_cache_pattern(&self, pattern: &str) {
        let Some(cache) = &self.cache else {
            return;
        };
        let keys_to_remove: Vec<String> = cache
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in keys_to_remove {
            cache.invalidate(&key).await;
        }

        debug!(pattern, "Invalidated cache entries");
    }
}
