// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Implementations behind the `refract` subcommands.

/// Production asset build.
pub mod build;
/// Development asset server with live reload.
pub mod dev;
/// Project scaffolding from embedded templates.
pub mod init;
/// Static preview of a production build.
pub mod serve;
