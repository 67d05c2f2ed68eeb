use crate::config::AirtableConfig;
use crate::error::{Result, WhatsubError};

/// Description of a single records request: where to connect and which
/// headers to send. The method is always GET.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub host: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    secure: bool,
}

/// What the remote said: status line, headers and the fully accumulated
/// body, exactly as delivered. Remote error statuses land here too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RequestDescriptor {
    pub fn new(host: &str, path: &str) -> Self {
        Self {
            host: host.to_string(),
            path: path.to_string(),
            headers: Vec::new(),
            secure: true,
        }
    }

    /// Splits an origin like `https://api.airtable.com` into scheme and host.
    pub fn from_origin(origin: &str, path: &str) -> Result<Self> {
        let (secure, host) = if let Some(rest) = origin.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = origin.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(WhatsubError::InvalidDescriptor {
                reason: format!("origin {origin} must start with http:// or https://"),
            });
        };
        let host = host.trim_end_matches('/');
        if host.is_empty() || host.contains('/') {
            return Err(WhatsubError::InvalidDescriptor {
                reason: format!("origin {origin} must not carry a path"),
            });
        }
        let mut descriptor = Self::new(host, path);
        descriptor.secure = secure;
        Ok(descriptor)
    }

    /// The canonical listing request for a table: `/v0/{base}/{table}` with
    /// bearer credential and JSON content type. Extra query pairs are
    /// URL-encoded and appended as-is.
    pub fn table_records(
        config: &AirtableConfig,
        table: &str,
        query: &[(String, String)],
    ) -> Result<Self> {
        let mut path = format!("/v0/{}/{}", config.base_id, urlencoding::encode(table));
        for (i, (key, value)) in query.iter().enumerate() {
            path.push(if i == 0 { '?' } else { '&' });
            path.push_str(&urlencoding::encode(key));
            path.push('=');
            path.push_str(&urlencoding::encode(value));
        }
        Ok(Self::from_origin(&config.api_base, &path)?
            .bearer(&config.api_token)
            .header("Content-Type", "application/json"))
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {token}"))
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}{}", scheme, self.host, self.path)
    }

    /// A descriptor is usable when the host looks like a bare DNS name, the
    /// path is absolute and a non-empty Authorization credential is present.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(WhatsubError::InvalidDescriptor {
                reason: "host is empty".to_string(),
            });
        }
        if self
            .host
            .chars()
            .any(|c| c == '/' || c == '@' || c.is_whitespace())
        {
            return Err(WhatsubError::InvalidDescriptor {
                reason: format!("host {} is not a plain host name", self.host),
            });
        }
        if !self.path.starts_with('/') {
            return Err(WhatsubError::InvalidDescriptor {
                reason: format!("path {} must start with /", self.path),
            });
        }
        let has_credential = self.headers.iter().any(|(name, value)| {
            name.eq_ignore_ascii_case("authorization") && !value.trim().is_empty()
        });
        if !has_credential {
            return Err(WhatsubError::InvalidDescriptor {
                reason: "no Authorization credential attached".to_string(),
            });
        }
        Ok(())
    }
}
