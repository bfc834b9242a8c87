//! Named endpoint configuration (spec §3, §6).

/// A single `host:port` the transport dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// DNS name or IP literal.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Construct an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// `host:port` suitable for `TcpStream::connect` / DNS resolution.
    #[must_use]
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Immutable pair of push/feedback endpoints plus the TLS server name to
/// present during the handshake (spec §3: "Immutable tuple").
///
/// Replaced wholesale via `ApnsService::configure`; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    /// Push gateway endpoint.
    pub push: Endpoint,
    /// Feedback service endpoint.
    pub feedback: Endpoint,
    /// TLS server name (SNI / certificate verification target).
    pub server_name: String,
}

impl EndpointSet {
    /// Apple's sandbox (development) environment.
    #[must_use]
    pub fn sandbox() -> Self {
        Self {
            push: Endpoint::new("gateway.sandbox.push.apple.com", 2195),
            feedback: Endpoint::new("feedback.sandbox.push.apple.com", 2196),
            server_name: "gateway.sandbox.push.apple.com".to_string(),
        }
    }

    /// Apple's production environment.
    #[must_use]
    pub fn production() -> Self {
        Self {
            push: Endpoint::new("gateway.push.apple.com", 2195),
            feedback: Endpoint::new("feedback.push.apple.com", 2196),
            server_name: "gateway.push.apple.com".to_string(),
        }
    }

    /// A locally hosted stand-in, e.g. a test fixture or staging proxy.
    ///
    /// `push` binds at `base_port`, `feedback` at `base_port + 1`, matching
    /// the default 2195/2196 offset.
    #[must_use]
    pub fn local(base_port: u16) -> Self {
        Self {
            push: Endpoint::new("localhost", base_port),
            feedback: Endpoint::new("localhost", base_port + 1),
            server_name: "localhost".to_string(),
        }
    }
}
