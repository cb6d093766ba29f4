//! Screen enumeration: probe every screen listed by moduleinfo and sort out
//! which ones are reachable without a session.

use crate::core::module::Module;
use crate::core::options::{ModuleConfig, ModuleOption, OptionSet};
use crate::core::rate_limit::RateLimiter;
use crate::core::workspace::WorkspaceManager;
use crate::http::response::HttpResponse;
use crate::modules::Target;
use crate::reporting::status;
use crate::scanner::moduleinfo::screens;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use url::Url;

pub const VERBOSE: &str = "VERBOSE";
pub const RATE: &str = "RATE";

pub struct OsEnum;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenResult {
    pub screen: String,
    pub url: String,
    pub status: String,
    pub http_status: Option<u16>,
    pub location: Option<String>,
    pub elapsed_ms: Option<u128>,
}

#[derive(Debug, Serialize)]
struct EnumResults {
    target: String,
    app_name: Option<String>,
    total_screens: usize,
    summary: BTreeMap<String, usize>,
    screens: Vec<ScreenResult>,
}

fn mentions_login(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("login") || lower.contains("signin")
}

/// Classify one screen response.
///
/// A redirect only counts when it points at a login page; a 200 that renders
/// a login form is `content_redirected`.
pub fn classify(resp: &HttpResponse) -> (String, Option<String>) {
    if resp.is_redirect() {
        if let Some(location) = resp.location() {
            if mentions_login(location) {
                return ("redirected".to_string(), Some(location.to_string()));
            }
        }
        return (format!("status_{}", resp.status), resp.location().map(String::from));
    }

    if resp.status == 200 {
        let body = resp.body_text();
        if mentions_login(&body) && body.to_lowercase().contains("password") {
            return ("content_redirected".to_string(), None);
        }
        return ("available".to_string(), None);
    }

    (format!("status_{}", resp.status), None)
}

impl ScreenResult {
    fn from_response(screen: String, url: &Url, resp: &HttpResponse) -> Self {
        let (status, location) = classify(resp);
        Self {
            screen,
            url: url.to_string(),
            status,
            http_status: Some(resp.status),
            location,
            elapsed_ms: Some(resp.elapsed_ms),
        }
    }
}

fn tally(results: &[ScreenResult]) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for r in results {
        *summary.entry(r.status.clone()).or_insert(0) += 1;
    }
    summary
}

#[async_trait]
impl Module for OsEnum {
    fn id(&self) -> &'static str {
        "osenum"
    }

    fn description(&self) -> &str {
        "Enumeration of OutSystems screens"
    }

    fn options(&self) -> OptionSet {
        OptionSet::new()
            .with(VERBOSE, ModuleOption::optional("false", "Print every screen as it is probed"))
            .with(RATE, ModuleOption::optional("0", "Requests per second (0 = unlimited)"))
    }

    async fn run(&self, config: ModuleConfig, workspace: &WorkspaceManager) -> anyhow::Result<()> {
        let verbose = config.flag(VERBOSE, false);
        let rate = config.parse_or::<u32>(RATE, 0)?;
        let threads = config.threads()?;
        let limiter = RateLimiter::new(rate);
        if !limiter.interval().is_zero() {
            status::info(format!("Rate limit: one request every {:?}", limiter.interval()));
        }
        let target = Target::from_config(&config, limiter)?;

        // ---- APP NAME ----
        let app_name = match target.app_name(&target.url).await {
            Ok((_, Some(app))) if app.is_certain() => {
                status::success(format!("Application name: {}", app.name));
                Some(app.name)
            }
            Ok(_) => {
                status::warning("Could not determine the application name");
                None
            }
            Err(e) => {
                status::failure(format!("Could not fetch target page: {:#}", e));
                None
            }
        };

        // ---- SCREEN LIST ----
        let moduleinfo = target.moduleinfo().await?;
        if moduleinfo.status != 200 {
            anyhow::bail!(
                "moduleinfo returned status {} for {}",
                moduleinfo.status,
                moduleinfo.url
            );
        }
        let body: Value = moduleinfo.json()?;
        let screen_list = screens(&body);

        if screen_list.is_empty() {
            status::failure("No screens found in moduleinfo");
            return Ok(());
        }

        status::info(format!(
            "Probing {} screens with {} threads",
            screen_list.len(),
            threads
        ));

        // ---- PROBE ----
        let semaphore = Arc::new(Semaphore::new(threads));
        let results: Arc<Mutex<Vec<ScreenResult>>> = Arc::new(Mutex::new(Vec::new()));
        let mut tasks = JoinSet::new();

        for screen in screen_list {
            let url = target.location.screen_url(&screen)?;
            let client = target.client.clone();
            let semaphore = semaphore.clone();
            let results = results.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                let result = match client.get(url.clone()).await {
                    Ok(resp) => ScreenResult::from_response(screen, &url, &resp),
                    Err(e) => {
                        tracing::debug!("Probe of {} failed: {:#}", url, e);
                        ScreenResult {
                            screen,
                            url: url.to_string(),
                            status: "error".to_string(),
                            http_status: None,
                            location: None,
                            elapsed_ms: None,
                        }
                    }
                };

                if verbose {
                    match result.elapsed_ms {
                        Some(ms) => println!("    [{}] {} ({} ms)", result.status, result.url, ms),
                        None => println!("    [{}] {}", result.status, result.url),
                    }
                }
                results.lock().await.push(result);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Screen probe task failed: {}", e);
            }
        }

        let mut probed = std::mem::take(&mut *results.lock().await);
        probed.sort_by(|a, b| a.screen.cmp(&b.screen));

        // ---- RECAP ----
        let available: Vec<&ScreenResult> =
            probed.iter().filter(|r| r.status == "available").collect();
        let destinations: BTreeSet<&str> = probed
            .iter()
            .filter(|r| r.status == "redirected")
            .filter_map(|r| r.location.as_deref())
            .collect();
        let summary = tally(&probed);

        println!();
        status::success(format!("Available screens: {}", available.len()));
        for r in &available {
            println!("    {}", r.url);
        }
        if !destinations.is_empty() {
            status::info("Redirect destinations:");
            for d in &destinations {
                println!("    {}", d);
            }
        }
        status::info("Totals:");
        for (state, count) in &summary {
            println!("    {:<20} {}", state, count);
        }

        let report = EnumResults {
            target: target.url.to_string(),
            app_name,
            total_screens: probed.len(),
            summary,
            screens: probed,
        };
        match workspace.save_scan_results("osenum", &report) {
            Ok(path) => status::success(format!("Results saved to {}", path.display())),
            Err(e) => status::failure(format!("Results not saved: {}", e)),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use url::Url;

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
        HttpResponse {
            url: Url::parse("https://victim.example.com/App/Screen").unwrap(),
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            body: body.as_bytes().to_vec(),
            elapsed_ms: 1,
        }
    }

    #[test]
    fn test_redirect_to_login() {
        let resp = response(302, &[("location", "/App/Login?OriginalURL=/App/Screen")], "");
        let (state, location) = classify(&resp);
        assert_eq!(state, "redirected");
        assert_eq!(location.as_deref(), Some("/App/Login?OriginalURL=/App/Screen"));
    }

    #[test]
    fn test_redirect_elsewhere_is_status() {
        let resp = response(301, &[("location", "/App/Home")], "");
        assert_eq!(classify(&resp).0, "status_301");
    }

    #[test]
    fn test_login_form_in_body() {
        let resp = response(200, &[], "<form id=\"Login\"><input type=\"password\"></form>");
        assert_eq!(classify(&resp).0, "content_redirected");
    }

    #[test]
    fn test_available_and_other_status() {
        assert_eq!(classify(&response(200, &[], "<h1>Dashboard</h1>")).0, "available");
        assert_eq!(classify(&response(404, &[], "")).0, "status_404");
    }

    #[test]
    fn test_screen_result_keeps_timing() {
        let result = ScreenResult::from_response(
            "Home".to_string(),
            &Url::parse("https://victim.example.com/App/Home").unwrap(),
            &response(200, &[], "ok"),
        );
        assert_eq!(result.status, "available");
        assert_eq!(result.http_status, Some(200));
        assert_eq!(result.url, "https://victim.example.com/App/Home");
        assert_eq!(result.elapsed_ms, Some(1));
        assert_eq!(serde_json::to_value(&result).unwrap()["elapsed_ms"], 1);
    }

    #[test]
    fn test_tally() {
        let mk = |status: &str| ScreenResult {
            screen: "s".to_string(),
            url: "u".to_string(),
            status: status.to_string(),
            http_status: None,
            location: None,
            elapsed_ms: None,
        };
        let summary = tally(&[mk("available"), mk("available"), mk("error")]);
        assert_eq!(summary.get("available"), Some(&2));
        assert_eq!(summary.get("error"), Some(&1));
    }
}
