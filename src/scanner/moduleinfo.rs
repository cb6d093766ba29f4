//! `moduleservices/moduleinfo` endpoint: URL layout and screen listing

use serde_json::Value;
use url::Url;

/// Screen names that usually should not ship to production
const SUSPICIOUS_SCREEN_WORDS: &[&str] = &[
    "test", "debug", "sample", "demo", "example", "playground", "sandbox", "temp", "tmp",
    "dev", "admin", "backoffice", "config", "setup", "internal", "poc", "mock", "old",
    "backup", "copy",
];

/// Where an application lives on an OutSystems front-end server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLocation {
    /// `scheme://host[:port]`
    pub environment: String,
    /// First path segment after the host, e.g. `Sales` in `/Sales/Home`
    pub module: String,
}

impl AppLocation {
    pub fn from_target(target: &Url) -> anyhow::Result<Self> {
        let host = target
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("TARGET has no host: {}", target))?;
        let environment = match target.port() {
            Some(port) => format!("{}://{}:{}", target.scheme(), host, port),
            None => format!("{}://{}", target.scheme(), host),
        };
        let module = target
            .path_segments()
            .and_then(|mut s| s.find(|seg| !seg.is_empty()).map(String::from))
            .unwrap_or_default();

        Ok(Self {
            environment,
            module,
        })
    }

    pub fn root(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!("{}/", self.environment))?)
    }

    pub fn moduleinfo_url(&self) -> anyhow::Result<Url> {
        let url = if self.module.is_empty() {
            format!("{}/moduleservices/moduleinfo/", self.environment)
        } else {
            format!("{}/{}/moduleservices/moduleinfo/", self.environment, self.module)
        };
        Ok(Url::parse(&url)?)
    }

    pub fn native_apps_url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!(
            "{}/NativeAppBuilder/rest/NativeApps/GetNativeApps",
            self.environment
        ))?)
    }

    /// Absolute URL of a screen path taken from the url mappings
    pub fn screen_url(&self, screen: &str) -> anyhow::Result<Url> {
        Ok(self.root()?.join(screen)?)
    }
}

/// Screen paths from `manifest.urlMappings`, skipping service endpoints.
pub fn screens(moduleinfo: &Value) -> Vec<String> {
    moduleinfo
        .get("manifest")
        .and_then(|m| m.get("urlMappings"))
        .and_then(|u| u.as_object())
        .map(|mappings| {
            mappings
                .keys()
                .filter(|k| !k.to_lowercase().contains("moduleservices"))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_suspicious(screen: &str) -> bool {
    let lower = screen.to_lowercase();
    SUSPICIOUS_SCREEN_WORDS.iter().any(|w| lower.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_from_target() {
        let loc = AppLocation::from_target(&Url::parse("https://victim.example.com/Sales/Home").unwrap())
            .unwrap();
        assert_eq!(loc.environment, "https://victim.example.com");
        assert_eq!(loc.module, "Sales");
        assert_eq!(
            loc.moduleinfo_url().unwrap().as_str(),
            "https://victim.example.com/Sales/moduleservices/moduleinfo/"
        );
        assert_eq!(
            loc.screen_url("/Sales/Dashboard").unwrap().as_str(),
            "https://victim.example.com/Sales/Dashboard"
        );
    }

    #[test]
    fn test_location_keeps_port() {
        let loc = AppLocation::from_target(&Url::parse("http://10.0.0.5:8080/App").unwrap()).unwrap();
        assert_eq!(loc.environment, "http://10.0.0.5:8080");
        assert_eq!(
            loc.native_apps_url().unwrap().as_str(),
            "http://10.0.0.5:8080/NativeAppBuilder/rest/NativeApps/GetNativeApps"
        );
    }

    #[test]
    fn test_screens_skip_services() {
        let data = json!({
            "manifest": {
                "urlMappings": {
                    "/Sales/Home": "/Sales/scripts/Sales.Home.mvc.js",
                    "/Sales/TestScreen": "/Sales/scripts/Sales.TestScreen.mvc.js",
                    "/Sales/moduleservices/moduleversioninfo": "x"
                }
            }
        });
        let mut found = screens(&data);
        found.sort();
        assert_eq!(found, vec!["/Sales/Home", "/Sales/TestScreen"]);
    }

    #[test]
    fn test_screens_missing_manifest() {
        assert!(screens(&json!({"versionToken": "abc"})).is_empty());
    }

    #[test]
    fn test_suspicious_names() {
        assert!(is_suspicious("/Sales/TestScreen"));
        assert!(is_suspicious("/Sales/AdminPanel"));
        assert!(!is_suspicious("/Sales/Home"));
    }
}
