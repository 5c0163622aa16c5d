// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

#![warn(missing_docs)]

//! Command-line companion for refract applications.
//!
//! The `refract` binary scaffolds projects and drives the front-end asset
//! pipeline. `refract dev` runs the development asset server with live
//! reload and writes the hot file the application runtime watches for.
//! `refract build` produces content-hashed bundles plus the manifest, and
//! `refract serve` previews the result. Managed copies of esbuild and
//! Tailwind are downloaded on demand, so projects need no Node toolchain.
//!
//! Projects are configured through `refract.toml` at the project root.

pub mod commands;
pub mod config;
pub mod lifecycle;
pub mod server;
pub mod toolchain;
pub mod watcher;
