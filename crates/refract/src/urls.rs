// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Dev-server URL resolution.
//!
//! [`resolve_dev_server_url`] computes the canonical URL the browser should
//! use to reach the asset dev server. It is a pure function over the bound
//! socket address and the settings struct: no I/O, no global state, so every
//! priority rule is independently testable.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

/// Protocol for the HMR channel, overriding the inferred one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HmrProtocol {
    /// Plain websocket; assets stay on http.
    Ws,
    /// Secure websocket; assets move to https.
    Wss,
}

/// Explicit HMR overrides (`[dev.hmr]` in `refract.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HmrOverrides {
    /// Overrides the URL protocol (`wss` maps to https, `ws` to http).
    #[serde(default)]
    pub protocol: Option<HmrProtocol>,
    /// Overrides the URL host.
    #[serde(default)]
    pub host: Option<String>,
    /// Overrides the URL port (the port the browser connects to).
    #[serde(default)]
    pub client_port: Option<u16>,
}

/// Inputs to URL resolution beyond the bound address.
#[derive(Debug, Clone, Default)]
pub struct DevServerSettings {
    /// Whether the dev server has TLS material configured.
    pub tls: bool,
    /// Explicitly configured host string, if any.
    pub host: Option<String>,
    /// Running inside a managed container environment; the browser reaches
    /// the server through a forwarded `localhost` port.
    pub container: bool,
    /// Explicit HMR overrides.
    pub hmr: HmrOverrides,
}

/// Computes the public base URL for the dev server.
///
/// Priority per field:
/// - protocol: HMR protocol override, else https when TLS is configured;
/// - host: HMR host, else `localhost` in container mode, else the configured
///   host, else the bound address (bracketed for IPv6 literals);
/// - port: HMR client port, else the bound port.
///
/// The result has the shape `<protocol>://<host>:<port>` with no trailing
/// path.
pub fn resolve_dev_server_url(bound: SocketAddr, settings: &DevServerSettings) -> String {
    let protocol = match settings.hmr.protocol {
        Some(HmrProtocol::Wss) => "https",
        Some(HmrProtocol::Ws) => "http",
        None if settings.tls => "https",
        None => "http",
    };

    let host = settings
        .hmr
        .host
        .clone()
        .or_else(|| settings.container.then(|| "localhost".to_string()))
        .or_else(|| settings.host.clone())
        .unwrap_or_else(|| match bound.ip() {
            IpAddr::V6(ip) => format!("[{ip}]"),
            IpAddr::V4(ip) => ip.to_string(),
        });

    let port = settings.hmr.client_port.unwrap_or_else(|| bound.port());

    format!("{protocol}://{host}:{port}")
}
