use std::time::Duration;
use url::Url;

pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the detection services, without a trailing slash.
    pub backend_url: Option<String>,
    pub backend_api_key: Option<String>,
    pub host: String,
    pub port: u16,
    pub upload_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_api_key: None,
            host: "0.0.0.0".to_string(),
            port: 8081,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let default = Self::default();

        let backend_url = get("BACKEND_URL")
            .or_else(|| get("NEXT_PUBLIC_BACKEND_URL"))
            .and_then(|raw| match normalize_base_url(&raw) {
                Some(url) => Some(url),
                None => {
                    log::error!("Ignoring BACKEND_URL, not an absolute http(s) URL: {}", raw);
                    None
                }
            });

        let port = match get("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Invalid PORT {:?}, using {}", raw, default.port);
                default.port
            }),
            None => default.port,
        };

        let upload_timeout = match get("UPLOAD_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    log::warn!(
                        "Invalid UPLOAD_TIMEOUT_SECS {:?}, using {}s",
                        raw,
                        default.upload_timeout.as_secs()
                    );
                    default.upload_timeout
                }
            },
            None => default.upload_timeout,
        };

        Self {
            backend_url,
            backend_api_key: get("BACKEND_API_KEY"),
            host: get("HOST").unwrap_or(default.host),
            port,
            upload_timeout,
        }
    }

    pub fn with_backend_url(mut self, url: &str) -> Self {
        self.backend_url = normalize_base_url(url);
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(trimmed.to_string())
}
