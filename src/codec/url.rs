//! Resource-locator parsing with multi-host authority support.
//!
//! The wire form is `scheme://h1,h2,h3/path?query#fragment`, where each host
//! chunk may carry its own `username:password@` and `:port`. Host labels are
//! canonicalized to their ASCII-compatible form (punycode, via the `url`
//! crate's host parser) on output; the decoded form stays available through
//! `unicode_host`.

use std::fmt;

use thiserror::Error;
use url::Host;

/// A malformed resource locator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UrlParseError(pub(crate) String);

impl UrlParseError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One host of a (possibly multi-host) authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPart {
    username: Option<String>,
    password: Option<String>,
    host: String,
    unicode_host: String,
    port: Option<u16>,
}

impl HostPart {
    /// Creates a host part, canonicalizing the host label.
    pub fn new(host: &str) -> Result<Self, UrlParseError> {
        let parsed = Host::parse(host)
            .map_err(|e| UrlParseError::new(format!("invalid host '{}': {}", host, e)))?;
        Ok(Self {
            username: None,
            password: None,
            host: parsed.to_string(),
            unicode_host: host.to_lowercase(),
            port: None,
        })
    }

    /// Sets the username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Username, if present.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Password, if present.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// ASCII-canonical host label.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Decoded (pre-punycode) host label for display.
    pub fn unicode_host(&self) -> &str {
        &self.unicode_host
    }

    /// Port, if present.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Parses one authority chunk: `[user[:pass]@]host[:port]`.
    fn parse(chunk: &str) -> Result<Self, UrlParseError> {
        let (userinfo, hostport) = match chunk.rfind('@') {
            Some(at) => (Some(&chunk[..at]), &chunk[at + 1..]),
            None => (None, chunk),
        };

        let (username, password) = match userinfo {
            Some(info) => match info.split_once(':') {
                Some((u, p)) => (Some(u.to_string()), Some(p.to_string())),
                None => (Some(info.to_string()), None),
            },
            None => (None, None),
        };

        let (raw_host, port) = split_host_port(hostport)?;
        if raw_host.is_empty() {
            return Err(UrlParseError::new("empty host"));
        }

        let mut part = HostPart::new(raw_host)?;
        part.username = username.filter(|u| !u.is_empty());
        part.password = password;
        part.port = port;
        Ok(part)
    }
}

impl fmt::Display for HostPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(username) = &self.username {
            write!(f, "{}", username)?;
            if let Some(password) = &self.password {
                write!(f, ":{}", password)?;
            }
            write!(f, "@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

/// Splits `host[:port]`, honoring IPv6 brackets.
fn split_host_port(hostport: &str) -> Result<(&str, Option<u16>), UrlParseError> {
    if let Some(rest) = hostport.strip_prefix('[') {
        let close = rest
            .find(']')
            .ok_or_else(|| UrlParseError::new("unclosed '[' in host"))?;
        let host = &hostport[..close + 2];
        let after = &rest[close + 1..];
        if after.is_empty() {
            return Ok((host, None));
        }
        let port = after
            .strip_prefix(':')
            .ok_or_else(|| UrlParseError::new("invalid characters after ']'"))?;
        return Ok((host, Some(parse_port(port)?)));
    }
    match hostport.rsplit_once(':') {
        Some((host, port)) => Ok((host, Some(parse_port(port)?))),
        None => Ok((hostport, None)),
    }
}

fn parse_port(port: &str) -> Result<u16, UrlParseError> {
    port.parse::<u16>()
        .map_err(|_| UrlParseError::new(format!("invalid port '{}'", port)))
}

/// A resource locator whose authority may name several hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiHostUrl {
    scheme: String,
    hosts: Vec<HostPart>,
    path: Option<String>,
    query: Option<String>,
    fragment: Option<String>,
}

impl MultiHostUrl {
    /// Parses a locator of the form `scheme://h1,h2/path?query#fragment`.
    pub fn parse(input: &str) -> Result<Self, UrlParseError> {
        let trimmed = input.trim();
        let (scheme, rest) = trimmed
            .split_once("://")
            .ok_or_else(|| UrlParseError::new("missing '://' scheme separator"))?;
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(UrlParseError::new(format!("invalid scheme '{}'", scheme)));
        }

        let (rest, fragment) = match rest.split_once('#') {
            Some((r, frag)) => (r, Some(frag.to_string())),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((r, q)) => (r, Some(q.to_string())),
            None => (rest, None),
        };
        let (authority, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], Some(rest[slash..].to_string())),
            None => (rest, None),
        };
        if authority.is_empty() {
            return Err(UrlParseError::new("empty authority"));
        }

        let hosts = authority
            .split(',')
            .map(HostPart::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            hosts,
            path,
            query,
            fragment,
        })
    }

    /// Reconstructs a locator from components.
    pub fn build(
        scheme: impl Into<String>,
        hosts: Vec<HostPart>,
        path: Option<String>,
        query: Option<String>,
        fragment: Option<String>,
    ) -> Result<Self, UrlParseError> {
        if hosts.is_empty() {
            return Err(UrlParseError::new("at least one host is required"));
        }
        Ok(Self {
            scheme: scheme.into().to_ascii_lowercase(),
            hosts,
            path,
            query,
            fragment,
        })
    }

    /// The locator scheme, lowercased.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The authority hosts, in declaration order.
    pub fn hosts(&self) -> &[HostPart] {
        &self.hosts
    }

    /// Path including its leading slash, if present.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Query string without the '?', if present.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Fragment without the '#', if present.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }
}

impl fmt::Display for MultiHostUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        for (i, host) in self.hosts.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", host)?;
        }
        if let Some(path) = &self.path {
            write!(f, "{}", path)?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

/// A single-host resource locator with the same component surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorUrl {
    inner: MultiHostUrl,
}

impl LocatorUrl {
    /// Parses a single-host locator.
    pub fn parse(input: &str) -> Result<Self, UrlParseError> {
        let inner = MultiHostUrl::parse(input)?;
        if inner.hosts.len() != 1 {
            return Err(UrlParseError::new(format!(
                "expected exactly one host, found {}",
                inner.hosts.len()
            )));
        }
        Ok(Self { inner })
    }

    /// Reconstructs a locator from components.
    pub fn build(
        scheme: impl Into<String>,
        host: HostPart,
        path: Option<String>,
        query: Option<String>,
        fragment: Option<String>,
    ) -> Result<Self, UrlParseError> {
        Ok(Self {
            inner: MultiHostUrl::build(scheme, vec![host], path, query, fragment)?,
        })
    }

    /// The locator scheme, lowercased.
    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    /// Username, if present.
    pub fn username(&self) -> Option<&str> {
        self.inner.hosts[0].username()
    }

    /// Password, if present.
    pub fn password(&self) -> Option<&str> {
        self.inner.hosts[0].password()
    }

    /// ASCII-canonical host label.
    pub fn host(&self) -> &str {
        self.inner.hosts[0].host()
    }

    /// Decoded (pre-punycode) host label for display.
    pub fn unicode_host(&self) -> &str {
        self.inner.hosts[0].unicode_host()
    }

    /// Port, if present.
    pub fn port(&self) -> Option<u16> {
        self.inner.hosts[0].port()
    }

    /// Path including its leading slash, if present.
    pub fn path(&self) -> Option<&str> {
        self.inner.path()
    }

    /// Query string without the '?', if present.
    pub fn query(&self) -> Option<&str> {
        self.inner.query()
    }

    /// Fragment without the '#', if present.
    pub fn fragment(&self) -> Option<&str> {
        self.inner.fragment()
    }
}

impl fmt::Display for LocatorUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let url = LocatorUrl::parse("https://example.com/path?a=1#top").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "example.com");
        assert_eq!(url.path(), Some("/path"));
        assert_eq!(url.query(), Some("a=1"));
        assert_eq!(url.fragment(), Some("top"));
        assert_eq!(url.port(), None);
    }

    #[test]
    fn test_parse_multi_host_with_credentials() {
        let url =
            MultiHostUrl::parse("postgres://alice:pw@db1:5432,bob@db2:5433/app?sslmode=require")
                .unwrap();
        assert_eq!(url.scheme(), "postgres");
        assert_eq!(url.hosts().len(), 2);
        assert_eq!(url.hosts()[0].username(), Some("alice"));
        assert_eq!(url.hosts()[0].password(), Some("pw"));
        assert_eq!(url.hosts()[0].host(), "db1");
        assert_eq!(url.hosts()[0].port(), Some(5432));
        assert_eq!(url.hosts()[1].username(), Some("bob"));
        assert_eq!(url.hosts()[1].password(), None);
        assert_eq!(url.hosts()[1].port(), Some(5433));
        assert_eq!(url.path(), Some("/app"));
        assert_eq!(url.query(), Some("sslmode=require"));
    }

    #[test]
    fn test_international_host_is_punycoded() {
        let url = LocatorUrl::parse("https://bücher.de/katalog").unwrap();
        assert_eq!(url.host(), "xn--bcher-kva.de");
        assert_eq!(url.unicode_host(), "bücher.de");
        assert_eq!(url.to_string(), "https://xn--bcher-kva.de/katalog");
    }

    #[test]
    fn test_ipv6_host_with_port() {
        let url = LocatorUrl::parse("http://[::1]:8080/x").unwrap();
        assert_eq!(url.host(), "[::1]");
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn test_display_round_trip() {
        let text = "mongodb://a:1@h1:27017,h2:27018/db?replicaSet=rs0#frag";
        let url = MultiHostUrl::parse(text).unwrap();
        assert_eq!(url.to_string(), text);
        let reparsed = MultiHostUrl::parse(&url.to_string()).unwrap();
        assert_eq!(reparsed, url);
    }

    #[test]
    fn test_build_from_components() {
        let url = MultiHostUrl::build(
            "Postgres",
            vec![
                HostPart::new("db1").unwrap().with_port(5432),
                HostPart::new("db2")
                    .unwrap()
                    .with_username("u")
                    .with_password("p"),
            ],
            Some("/app".into()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(url.to_string(), "postgres://db1:5432,u:p@db2/app");
    }

    #[test]
    fn test_parse_errors() {
        assert!(MultiHostUrl::parse("no-scheme").is_err());
        assert!(MultiHostUrl::parse("http://").is_err());
        assert!(MultiHostUrl::parse("http://host:notaport/").is_err());
        assert!(LocatorUrl::parse("http://a,b/").is_err());
    }
}
