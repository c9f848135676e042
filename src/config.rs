use std::{
    env,
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: String,
    /// Interface the front end binds to. Loopback unless `HOST` says otherwise.
    pub host: IpAddr,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparseable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();

        if let Some(url) = lookup("BACKEND_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                settings.backend_url = url.to_string();
            }
        }

        if let Some(host) = lookup("HOST").and_then(|value| value.trim().parse::<IpAddr>().ok()) {
            settings.host = host;
        }

        if let Some(port) = lookup("PORT").and_then(|value| value.trim().parse::<u16>().ok()) {
            settings.port = port;
        }

        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
        {
            settings.request_timeout = Duration::from_secs(secs);
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(settings.host, DEFAULT_HOST);
        assert!(settings.host.is_loopback());
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn unparseable_host_keeps_loopback() {
        let settings = Settings::from_lookup(lookup(&[("HOST", "everywhere")]));
        assert_eq!(settings.host, DEFAULT_HOST);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let settings = Settings::from_lookup(lookup(&[
            ("BACKEND_URL", "http://api.example.test/"),
            ("HOST", "0.0.0.0"),
            ("PORT", "not-a-port"),
            ("REQUEST_TIMEOUT_SECS", "3"),
        ]));
        assert_eq!(settings.backend_url, "http://api.example.test");
        assert_eq!(settings.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
    }
}
