use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct Finding {
    pub title: String,
    pub severity: Severity,
    pub url: String,
    pub evidence: String,
    pub description: String,
}

impl Finding {
    /// A screen whose name suggests test, debug or admin content
    pub fn suspicious_screen(url: &str, screen: &str) -> Self {
        Self {
            title: "Suspicious screen exposed".to_string(),
            severity: Severity::Low,
            url: url.to_string(),
            evidence: format!("Screen mapping: {}", screen),
            description: "The application publishes a screen whose name suggests it \
                          was meant for testing, debugging or administration."
                .to_string(),
        }
    }

    /// The native app builder lists mobile builds without authentication
    pub fn native_apps_exposed(url: &str, count: usize) -> Self {
        Self {
            title: "Mobile app inventory exposed".to_string(),
            severity: Severity::Medium,
            url: url.to_string(),
            evidence: format!("GetNativeApps returned {} application(s)", count),
            description: "The NativeAppBuilder REST endpoint returns the list of \
                          native mobile applications built in this environment."
                .to_string(),
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
        }
    }
}
