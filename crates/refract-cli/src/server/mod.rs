// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Development asset server.
//!
//! `http` owns the Axum router and the TLS-aware bind. `livereload`
//! carries the reload broadcast to browsers and serves the injected
//! client script.

/// HTTP routing and the bound server.
pub mod http;
/// Live reload channel and browser client.
pub mod livereload;
