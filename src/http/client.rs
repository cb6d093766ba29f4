//! HTTP client with scope enforcement, rate limiting and proxy support

use crate::core::options::ModuleConfig;
use crate::core::rate_limit::RateLimiter;
use crate::core::scope::Scope;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use anyhow::{Context, Result};
use reqwest::{header, redirect::Policy, Client, Proxy};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl ClientSettings {
    pub fn from_config(config: &ModuleConfig) -> Result<Self> {
        Ok(Self {
            timeout: config.timeout()?,
            proxy: config.proxy().map(String::from),
            user_agent: config.user_agent().to_string(),
        })
    }
}

/// Cheap to clone; clones share the connection pool and rate limiter.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    scope: Scope,
    limiter: RateLimiter,
}

impl HttpClient {
    pub fn new(scope: Scope, limiter: RateLimiter, settings: &ClientSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone());

        if let Some(proxy) = &settings.proxy {
            builder = builder.proxy(
                Proxy::all(proxy.as_str()).with_context(|| format!("Invalid PROXY: {}", proxy))?,
            );
        }

        Ok(Self {
            client: builder.build()?,
            scope,
            limiter,
        })
    }

    #[cfg(test)]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub async fn get(&self, url: url::Url) -> Result<HttpResponse> {
        self.execute(HttpRequest::get(url)).await
    }

    pub async fn execute(&self, req: HttpRequest) -> Result<HttpResponse> {
        let start = Instant::now();
        let mut url = req.url.clone();
        let mut hops = 0;

        loop {
            // ---- RATE LIMIT ENFORCEMENT ----
            self.limiter.wait().await;

            // ---- SCOPE CHECK ----
            if !self.scope.is_in_scope(&url) {
                anyhow::bail!(
                    "Blocked out-of-scope request: {} (scope: {})",
                    url,
                    self.scope.host()
                );
            }

            let response = self
                .client
                .request(req.method.clone(), url.clone())
                .headers(req.headers.clone())
                .send()
                .await
                .with_context(|| format!("Request to {} failed", url))?;

            let status = response.status().as_u16();

            let mut headers: HashMap<String, String> = HashMap::new();
            for (k, v) in response.headers().iter() {
                let value = v.to_str().unwrap_or("").to_string();
                headers
                    .entry(k.as_str().to_string())
                    .and_modify(|existing| {
                        existing.push_str(", ");
                        existing.push_str(&value);
                    })
                    .or_insert(value);
            }

            let redirect_target = if req.follow_redirects && (300..400).contains(&status) {
                response
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|l| l.to_str().ok())
                    .and_then(|l| url.join(l).ok())
            } else {
                None
            };

            if let Some(next) = redirect_target {
                hops += 1;
                if hops > MAX_REDIRECTS {
                    anyhow::bail!("Too many redirects starting at {}", req.url);
                }
                tracing::debug!("Following redirect {} -> {}", url, next);
                url = next;
                continue;
            }

            let body = response.bytes().await.unwrap_or_default().to_vec();

            return Ok(HttpResponse {
                url,
                status,
                headers,
                body,
                elapsed_ms: start.elapsed().as_millis(),
            });
        }
    }
}
