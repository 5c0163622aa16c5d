// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Preview server command.
//!
//! Serves the public directory with the production build in place. No live
//! reload, no rebuilds; a quick way to inspect what a deploy would ship.

use std::io;

use axum::Router;
use console::style;
use tower_http::services::ServeDir;

use refract::{Manifest, RefractError};

use crate::config::Config;

/// Runs the preview server over the production build.
pub async fn run(host: &str, port: u16) -> anyhow::Result<()> {
    let config = Config::load()?;
    let assets = config.assets.clone().resolve()?;
    let working_dir = std::env::current_dir()?;

    let manifest_path = working_dir.join(assets.manifest_path());
    let manifest = match Manifest::read(&manifest_path) {
        Ok(manifest) => manifest,
        Err(RefractError::IoError(err)) if err.kind() == io::ErrorKind::NotFound => {
            println!("{}", style("No production build found.").red().bold());
            println!();
            println!(
                "Run {} first to build your assets.",
                style("refract build").cyan()
            );
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let public_dir = working_dir.join(&assets.public_directory);
    let app = Router::new().fallback_service(ServeDir::new(&public_dir));

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;

    println!("{}", style("Preview server").cyan().bold());
    println!("  {:<10} {}", style("serving").dim(), public_dir.display());
    println!(
        "  {:<10} {} hashed asset(s)",
        style("manifest").dim(),
        manifest.len()
    );
    println!(
        "  {:<10} {}",
        style("url").dim(),
        style(format!("http://{}", addr)).cyan().underlined()
    );

    axum::serve(listener, app).await?;

    Ok(())
}
