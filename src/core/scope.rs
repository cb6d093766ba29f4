//! Keeps module traffic on the target's host

use url::Url;

#[derive(Debug, Clone)]
pub struct Scope {
    host: String,
    port: Option<u16>,
}

impl Scope {
    pub fn for_target(target: &Url) -> anyhow::Result<Self> {
        let host = target
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid target host: {}", target))?;

        Ok(Self {
            host: host.to_ascii_lowercase(),
            port: target.port_or_known_default(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_in_scope(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                host.eq_ignore_ascii_case(&self.host) && url.port_or_known_default() == self.port
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_host_in_scope() {
        let scope = Scope::for_target(&Url::parse("https://Victim.example.com/App").unwrap()).unwrap();
        assert!(scope.is_in_scope(&Url::parse("https://victim.example.com/App/Home").unwrap()));
        assert!(scope.is_in_scope(&Url::parse("https://victim.example.com:443/x").unwrap()));
    }

    #[test]
    fn test_other_host_or_port_out_of_scope() {
        let scope = Scope::for_target(&Url::parse("https://victim.example.com/App").unwrap()).unwrap();
        assert!(!scope.is_in_scope(&Url::parse("https://evil.example.com/App").unwrap()));
        assert!(!scope.is_in_scope(&Url::parse("https://victim.example.com:8443/App").unwrap()));
        assert!(!scope.is_in_scope(&Url::parse("http://victim.example.com/App").unwrap()));
    }
}
