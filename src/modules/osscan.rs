//! OutSystems reconnaissance: app name, fingerprint, exposed screens and
//! platform endpoints.

use crate::core::module::Module;
use crate::core::options::{ModuleConfig, ModuleOption, OptionSet};
use crate::core::rate_limit::RateLimiter;
use crate::core::workspace::WorkspaceManager;
use crate::modules::Target;
use crate::reporting::model::{Finding, Severity};
use crate::reporting::reporter::Reporter;
use crate::reporting::{status, text};
use crate::scanner::appname::AppName;
use crate::scanner::fingerprint::{fingerprint_response, Fingerprint};
use crate::scanner::moduleinfo::{is_suspicious, screens};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub const DEEP_SCAN: &str = "DEEP_SCAN";
pub const SAVE_RESULTS: &str = "SAVE_RESULTS";

const UNKNOWN_APP: &str = "UnknownApp";

pub struct OsScan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    Online,
    Blocked,
    Unexpected(u16),
}

impl Connection {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Connection::Online,
            403 => Connection::Blocked,
            other => Connection::Unexpected(other),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScanResults {
    target: String,
    environment: String,
    module: String,
    app: Option<AppName>,
    fingerprint: Option<Fingerprint>,
    connection: Option<Connection>,
    screens: Vec<String>,
    native_apps: Option<Value>,
    findings: Vec<Finding>,
}

/// Number of entries when `GetNativeApps` returned a non-empty array
pub fn native_app_count(body: &Value) -> Option<usize> {
    body.as_array().map(|apps| apps.len()).filter(|n| *n > 0)
}

#[async_trait]
impl Module for OsScan {
    fn id(&self) -> &'static str {
        "osscan"
    }

    fn description(&self) -> &str {
        "Comprehensive OutSystems reconnaissance scanner"
    }

    fn options(&self) -> OptionSet {
        OptionSet::new()
            .with(
                DEEP_SCAN,
                ModuleOption::optional("true", "Query additional platform endpoints"),
            )
            .with(
                SAVE_RESULTS,
                ModuleOption::optional("true", "Save results to the active workspace"),
            )
    }

    async fn run(&self, config: ModuleConfig, workspace: &WorkspaceManager) -> anyhow::Result<()> {
        let deep_scan = config.flag(DEEP_SCAN, true);
        let save_results = config.flag(SAVE_RESULTS, true);
        let target = Target::from_config(&config, RateLimiter::unlimited())?;
        let location = &target.location;

        status::info(format!("Environment: {}", location.environment));
        status::info(format!("Module path: /{}", location.module));

        let mut reporter = Reporter::new();
        let mut results = ScanResults {
            target: target.url.to_string(),
            environment: location.environment.clone(),
            module: location.module.clone(),
            app: None,
            fingerprint: None,
            connection: None,
            screens: Vec::new(),
            native_apps: None,
            findings: Vec::new(),
        };

        // ---- APP NAME + FINGERPRINT ----
        match target.app_name(&location.root()?).await {
            Ok((response, app)) => {
                match &app {
                    Some(app) if app.is_certain() => status::success(format!(
                        "Application name: {} (from {})",
                        app.name, app.source
                    )),
                    Some(app) => status::warning(format!(
                        "Application name (guessed from {}): {}",
                        app.source, app.name
                    )),
                    None => status::warning(format!("Application name: {}", UNKNOWN_APP)),
                }

                let fp = fingerprint_response(&response);
                if let Some(server) = &fp.server {
                    status::info(format!("Server: {}", server));
                }
                if let Some(framework) = &fp.framework_hint {
                    status::info(format!("Framework: {}", framework));
                }
                if let Some(cdn) = &fp.waf_cdn_hint {
                    status::info(format!("WAF/CDN: {}", cdn));
                }
                if fp.is_outsystems() {
                    status::success(format!(
                        "OutSystems markers: {}",
                        fp.outsystems_markers.join(", ")
                    ));
                }

                results.app = app;
                results.fingerprint = Some(fp);
            }
            Err(e) => status::failure(format!("Could not fetch environment root: {:#}", e)),
        }

        // ---- CONNECTION TEST ----
        let moduleinfo = target.moduleinfo().await?;
        let connection = Connection::from_status(moduleinfo.status);
        results.connection = Some(connection);

        match connection {
            Connection::Online => status::success(format!(
                "moduleinfo reachable: {}",
                moduleinfo.url
            )),
            Connection::Blocked => {
                status::failure("moduleinfo access is blocked (403)");
                return finish(results, reporter, save_results, workspace);
            }
            Connection::Unexpected(code) => {
                status::failure(format!("moduleinfo returned status {}", code));
                return finish(results, reporter, save_results, workspace);
            }
        }

        // ---- SCREENS ----
        match moduleinfo.json::<Value>() {
            Ok(body) => {
                results.screens = screens(&body);
                status::info(format!("Found {} screens", results.screens.len()));
                for screen in &results.screens {
                    if is_suspicious(screen) {
                        status::warning(format!("Suspicious screen: {}", screen));
                        let url = location.screen_url(screen)?;
                        reporter.add(Finding::suspicious_screen(url.as_str(), screen));
                    } else {
                        println!("    {}", screen);
                    }
                }
            }
            Err(e) => status::failure(format!(
                "moduleinfo is not valid JSON ({}): {:#}",
                moduleinfo.mime_type().unwrap_or("no content type"),
                e
            )),
        }

        // ---- NATIVE APPS ----
        if deep_scan {
            let url = location.native_apps_url()?;
            match target.client.get(url.clone()).await {
                Ok(resp) if resp.status == 200 => {
                    if let Ok(body) = resp.json::<Value>() {
                        if let Some(count) = native_app_count(&body) {
                            status::warning(format!("Native app inventory exposed ({} apps)", count));
                            reporter.add(Finding::native_apps_exposed(url.as_str(), count));
                            results.native_apps = Some(body);
                        }
                    }
                }
                Ok(resp) => tracing::debug!("GetNativeApps returned {}", resp.status),
                Err(e) => tracing::debug!("GetNativeApps failed: {:#}", e),
            }
        }

        finish(results, reporter, save_results, workspace)
    }
}

fn finish(
    mut results: ScanResults,
    reporter: Reporter,
    save_results: bool,
    workspace: &WorkspaceManager,
) -> anyhow::Result<()> {
    let by_severity = format!(
        "{} medium, {} low",
        reporter.count(Severity::Medium),
        reporter.count(Severity::Low)
    );
    results.findings = reporter.into_findings();

    let app = results
        .app
        .as_ref()
        .map(|a| a.name.clone())
        .unwrap_or_else(|| UNKNOWN_APP.to_string());
    let connection = match results.connection {
        Some(Connection::Online) => "online".to_string(),
        Some(Connection::Blocked) => "blocked".to_string(),
        Some(Connection::Unexpected(code)) => format!("status {}", code),
        None => "unknown".to_string(),
    };

    text::render(
        "OUTSYSTEMS SCAN SUMMARY",
        &[
            ("Target", results.target.clone()),
            ("Application", app),
            ("moduleinfo", connection),
            ("Screens", results.screens.len().to_string()),
            ("Findings", by_severity),
        ],
        &results.findings,
    );

    if save_results {
        match workspace.save_scan_results("osscan", &results) {
            Ok(path) => status::success(format!("Results saved to {}", path.display())),
            Err(e) => status::failure(format!("Results not saved: {}", e)),
        }
    }

    Ok(())
}
