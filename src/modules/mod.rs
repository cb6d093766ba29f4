//! Built-in modules and the target plumbing they share

pub mod osenum;
pub mod osscan;

use crate::core::options::ModuleConfig;
use crate::core::rate_limit::RateLimiter;
use crate::core::scope::Scope;
use crate::http::client::{ClientSettings, HttpClient};
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::scanner::appname::{extract_app_name, AppName};
use crate::scanner::moduleinfo::AppLocation;
use anyhow::Context;
use url::Url;

/// Everything a module needs to talk to its TARGET.
pub struct Target {
    pub url: Url,
    pub location: AppLocation,
    pub client: HttpClient,
}

impl Target {
    pub fn from_config(config: &ModuleConfig, limiter: RateLimiter) -> anyhow::Result<Self> {
        let raw = config.target().trim();
        let url = Url::parse(raw).with_context(|| format!("Invalid TARGET URL: {}", raw))?;
        let scope = Scope::for_target(&url)?;
        let location = AppLocation::from_target(&url)?;
        let settings = ClientSettings::from_config(config)?;
        let client = HttpClient::new(scope, limiter, &settings)?;

        tracing::debug!(
            "Target {} (environment {}, module '{}')",
            url,
            location.environment,
            location.module
        );

        Ok(Self {
            url,
            location,
            client,
        })
    }

    /// Fetch `page` (following in-scope redirects) and read the app name from it.
    pub async fn app_name(&self, page: &Url) -> anyhow::Result<(HttpResponse, Option<AppName>)> {
        let response = self
            .client
            .execute(HttpRequest::get(page.clone()).following_redirects())
            .await?;
        let app = extract_app_name(&response.body_text());
        Ok((response, app))
    }

    pub async fn moduleinfo(&self) -> anyhow::Result<HttpResponse> {
        let mut request = HttpRequest::get(self.location.moduleinfo_url()?);
        request.set_header("Accept", "application/json");
        self.client.execute(request).await
    }
}
