//! Dynamic passthrough targets
//!
//! `/p/{url}` lets a client name the upstream chat API directly in the
//! request path, e.g. `/p/https://chat.deepseek.com/api/v0/chat/history_messages`.

use url::Url;

use crate::config::ProxyConfig;
use crate::error::{Result, ScribeError};

/// A validated upstream target extracted from the request path
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamTarget {
    pub url: Url,
    /// Host (domain or IP) of `url`
    pub host: String,
}

impl UpstreamTarget {
    /// Parse `/p/{url}` plus the request's raw query string.
    ///
    /// Accepts percent-encoded targets and the single-slash form
    /// (`https:/host`) some clients produce when collapsing slashes. Only
    /// http and https are accepted; fragments and userinfo are dropped. The
    /// query is attached as-is so its encoding reaches the upstream intact.
    pub fn from_path(path: &str, query: Option<&str>) -> Result<Self> {
        let raw = path
            .strip_prefix("/p/")
            .ok_or_else(|| ScribeError::Proxy(format!("Invalid passthrough path: {path}")))?;

        let decoded = percent_decode(raw);

        let normalized = if decoded.starts_with("http:/") && !decoded.starts_with("http://") {
            decoded.replacen("http:/", "http://", 1)
        } else if decoded.starts_with("https:/") && !decoded.starts_with("https://") {
            decoded.replacen("https:/", "https://", 1)
        } else {
            decoded
        };

        let mut url = Url::parse(&normalized)
            .map_err(|e| ScribeError::Proxy(format!("Invalid URL '{normalized}': {e}")))?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(ScribeError::Proxy(format!(
                "Unsupported URL scheme '{scheme}': only http and https are allowed"
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ScribeError::Proxy(format!("URL '{normalized}' has no host")))?
            .to_string();

        url.set_fragment(None);

        if !url.username().is_empty() || url.password().is_some() {
            tracing::warn!("Stripped userinfo from passthrough target {}", host);
            url.set_username("")
                .map_err(|_| ScribeError::Proxy("Failed to strip username from URL".to_string()))?;
            url.set_password(None)
                .map_err(|_| ScribeError::Proxy("Failed to strip password from URL".to_string()))?;
        }

        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.set_query(Some(q));
        }

        Ok(UpstreamTarget { url, host })
    }

    /// Whether the allowlist admits this host; an empty list admits all.
    ///
    /// Patterns are exact hosts or `*.domain`, which also matches `domain`.
    pub fn is_allowed(&self, config: &ProxyConfig) -> bool {
        config.allowed_hosts.is_empty()
            || config
                .allowed_hosts
                .iter()
                .any(|pattern| host_matches_pattern(&self.host, pattern))
    }
}

fn host_matches_pattern(host: &str, pattern: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(suffix) => {
            host == suffix
                || host
                    .strip_suffix(suffix)
                    .is_some_and(|head| head.ends_with('.') && head.len() > 1)
        }
        None => host == pattern,
    }
}

/// Decode `%XX` sequences; malformed sequences are kept literally
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
