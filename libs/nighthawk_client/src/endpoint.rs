use std::net::SocketAddr;

use tokio::net::lookup_host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    /// Whether this scheme negotiates an encrypted transport with ALPN
    /// (`h2` or `http/1.1`) rather than plaintext.
    pub fn is_encrypted(self) -> bool {
        matches!(self, Scheme::Https)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("uri is missing a scheme")]
    MissingScheme,
    #[error("unrecognized scheme {0:?}, expected http or https")]
    UnrecognizedScheme(String),
    #[error("uri is missing a host")]
    MissingHost,
    #[error("port {0} is out of range, expected 1-65535")]
    InvalidPort(String),
    #[error("could not resolve host {0:?}")]
    UnresolvableHost(String),
}

/// A parsed, not-yet-resolved target: `http|https://HOST[:PORT]/PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    /// Parses the CLI-supplied URI. Host may be a bracketed IPv6 literal
    /// (`[::1]`); default ports are 80/443 by scheme.
    pub fn parse(uri: &str) -> Result<Self, EndpointError> {
        let (scheme_str, rest) = uri
            .split_once("://")
            .ok_or(EndpointError::MissingScheme)?;

        let scheme = match scheme_str {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(EndpointError::UnrecognizedScheme(other.to_string())),
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        if authority.is_empty() {
            return Err(EndpointError::MissingHost);
        }

        let (host, port_str) = split_authority(authority)?;
        if host.is_empty() {
            return Err(EndpointError::MissingHost);
        }

        let port = match port_str {
            Some(p) => p
                .parse::<u16>()
                .ok()
                .filter(|&p| p != 0)
                .ok_or_else(|| EndpointError::InvalidPort(p.to_string()))?,
            None => scheme.default_port(),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path: path.to_string(),
        })
    }

    pub fn is_https(&self) -> bool {
        self.scheme.is_encrypted()
    }

    pub fn base_url(&self) -> String {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        format!("{scheme}://{}:{}{}", self.display_host(), self.port, self.path)
    }

    fn display_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// Resolves the host to a socket address via the system resolver.
    pub async fn resolve(&self) -> Result<SocketAddr, EndpointError> {
        let lookup_target = format!("{}:{}", self.display_host(), self.port);
        lookup_host(&lookup_target)
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| EndpointError::UnresolvableHost(self.host.clone()))
    }
}

/// Splits `HOST[:PORT]`, accounting for bracketed IPv6 literals such as
/// `[::1]:81` where a plain `:` split would be ambiguous.
fn split_authority(authority: &str) -> Result<(String, Option<&str>), EndpointError> {
    if let Some(rest) = authority.strip_prefix('[') {
        let end = rest.find(']').ok_or(EndpointError::MissingHost)?;
        let host = &rest[..end];
        let after = &rest[end + 1..];
        let port = after.strip_prefix(':');
        return Ok((host.to_string(), port));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => Ok((host.to_string(), Some(port))),
        None => Ok((authority.to_string(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv6_literal_with_port_and_path() {
        let ep = Endpoint::parse("http://[::1]:81/bar").unwrap();
        assert_eq!(ep.scheme, Scheme::Http);
        assert_eq!(ep.host, "::1");
        assert_eq!(ep.port, 81);
        assert_eq!(ep.path, "/bar");
    }

    #[test]
    fn defaults_port_by_scheme() {
        let http = Endpoint::parse("http://example.com/").unwrap();
        assert_eq!(http.port, 80);
        let https = Endpoint::parse("https://example.com/").unwrap();
        assert_eq!(https.port, 443);
    }

    #[test]
    fn defaults_path_to_root() {
        let ep = Endpoint::parse("http://example.com").unwrap();
        assert_eq!(ep.path, "/");
    }

    #[test]
    fn rejects_unrecognized_scheme() {
        assert_eq!(
            Endpoint::parse("foo://a").unwrap_err(),
            EndpointError::UnrecognizedScheme("foo".to_string())
        );
    }

    #[test]
    fn rejects_zero_port() {
        assert!(matches!(
            Endpoint::parse("http://a:0"),
            Err(EndpointError::InvalidPort(_))
        ));
    }

    #[test]
    fn rejects_missing_scheme() {
        assert_eq!(
            Endpoint::parse("a.com/path").unwrap_err(),
            EndpointError::MissingScheme
        );
    }
}
