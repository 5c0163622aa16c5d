// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

#![warn(missing_docs)]

//! # Refract
//!
//! Inertia-style web application toolkit for Rust.
//!
//! Refract gives an axum (or any other HTTP layer) application declarative
//! routing, Inertia-style page rendering, and asset resolution that follows
//! the dev server / production manifest split: while `refract dev` runs, a
//! hot file points every asset at the dev server; after `refract build`,
//! assets resolve to content-hashed files through the build manifest.
//!
//! ## Features
//!
//! - Route table with named routes, groups, resources, and a JSON cache
//! - Inertia page envelope with HTML-shell rendering for first visits
//! - Asset helper switching between dev server and manifest resolution
//! - Dev-server plumbing: environment guard, TLS discovery, URL resolution,
//!   hot file primitives (consumed by the `refract` CLI)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use refract::{AssetResolver, Page, PluginConfig, RouteTable};
//!
//! let config = PluginConfig::with_input(["resources/js/app.jsx"]).resolve()?;
//! let assets = AssetResolver::new(config);
//!
//! let mut routes = RouteTable::new();
//! routes.get("/", "home.index").named("home");
//!
//! let page = Page::new("Home").url("/").version(assets.version()?);
//! ```

/// Runtime asset resolution (hot file vs manifest).
pub mod assets;
/// Asset pipeline configuration.
pub mod config;
/// Process environment snapshot.
pub mod environment;
/// Error types and reporting.
pub mod error;
/// Environment guard for the dev server.
pub mod guard;
/// Hot file primitives.
pub mod hot;
/// Inertia-style page envelope.
pub mod inertia;
/// Build manifest reading.
pub mod manifest;
/// Declarative route table.
pub mod routing;
/// TLS certificate discovery.
pub mod tls;
/// Dev-server URL resolution.
pub mod urls;

pub use assets::AssetResolver;
pub use config::{
    DetectTls, InputSpec, PluginConfig, RefreshRule, RefreshSpec, ResolvedPluginConfig,
};
pub use environment::Environment;
pub use error::{RefractError, Result};
pub use guard::{ensure_command_should_run_in_environment, GuardedCommand};
pub use hot::HotFile;
pub use inertia::Page;
pub use manifest::{Manifest, ManifestEntry};
pub use routing::{Method, RouteDef, RouteTable};
pub use tls::{
    resolve_development_server_config, resolve_environment_server_config,
    CertificateDirectories, ResolvedServerConfig, TlsMaterial,
};
pub use urls::{resolve_dev_server_url, DevServerSettings, HmrOverrides, HmrProtocol};
