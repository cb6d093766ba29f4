use crate::http::response::HttpResponse;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Fingerprint {
    pub server: Option<String>,
    pub powered_by: Option<String>,
    pub framework_hint: Option<String>,
    pub waf_cdn_hint: Option<String>,
    /// OutSystems-specific markers seen in cookies and script paths
    pub outsystems_markers: Vec<String>,
}

impl Fingerprint {
    pub fn is_outsystems(&self) -> bool {
        !self.outsystems_markers.is_empty()
    }
}

pub fn fingerprint_response(resp: &HttpResponse) -> Fingerprint {
    let mut fp = Fingerprint::default();

    if let Some(server) = resp.header("server") {
        fp.server = Some(server.to_string());
    }

    if let Some(powered) = resp.header("x-powered-by") {
        fp.powered_by = Some(powered.to_string());
        if powered.to_lowercase().contains("asp.net") {
            fp.framework_hint = Some(".NET".to_string());
        }
    }

    if let Some(cookies) = resp.header("set-cookie") {
        for marker in ["osVisitor", "osVisit", "nr1Users", "nr2Users"] {
            if cookies.contains(marker) {
                fp.outsystems_markers.push(format!("cookie:{}", marker));
            }
        }
    }

    let body = resp.body_text();
    for marker in ["OutSystemsUI", "OutSystemsReactWidgets", "/scripts/OutSystems.js"] {
        if body.contains(marker) {
            fp.outsystems_markers.push(format!("script:{}", marker));
        }
    }

    for (k, v) in resp.headers.iter() {
        let k = k.to_lowercase();
        let v = v.to_lowercase();

        if k.starts_with("cf-") || v.contains("cloudflare") {
            fp.waf_cdn_hint = Some("Cloudflare".to_string());
        } else if v.contains("akamai") {
            fp.waf_cdn_hint = Some("Akamai".to_string());
        } else if k.starts_with("x-amz-cf") {
            fp.waf_cdn_hint = Some("CloudFront".to_string());
        }
    }

    fp
}
