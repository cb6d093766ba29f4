use serde::de::DeserializeOwned;
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub url: Url,
    pub status: u16,
    /// Lower-cased header names; repeated headers are joined with ", "
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub elapsed_ms: u128,
}

impl HttpResponse {
    /// Get body as UTF-8 string (lossy conversion)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    /// Content-Type without parameters, e.g. `application/json`
    pub fn mime_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(|ct| ct.split(';').next().unwrap_or("").trim())
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| anyhow::anyhow!("Invalid JSON from {}: {}", self.url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
        HttpResponse {
            url: Url::parse("https://victim.example.com/App").unwrap(),
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.as_bytes().to_vec(),
            elapsed_ms: 1,
        }
    }

    #[test]
    fn test_mime_type_strips_parameters() {
        let resp = response(200, &[("content-type", "application/json; charset=utf-8")], "[]");
        assert_eq!(resp.mime_type(), Some("application/json"));
        assert_eq!(resp.header("Content-Type"), Some("application/json; charset=utf-8"));
    }

    #[test]
    fn test_redirect_and_location() {
        let resp = response(302, &[("location", "/App/Login")], "");
        assert!(resp.is_redirect());
        assert_eq!(resp.location(), Some("/App/Login"));
    }

    #[test]
    fn test_json_error_names_url() {
        let resp = response(200, &[], "<html>");
        let err = resp.json::<serde_json::Value>().unwrap_err().to_string();
        assert!(err.contains("victim.example.com"));
    }
}
