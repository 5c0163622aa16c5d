// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The `refract dev` command: build, watch, serve, reload.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use refract::environment::{CONTAINER, DEV_PORT};
use refract::{
    ensure_command_should_run_in_environment, resolve_dev_server_url,
    resolve_development_server_config, resolve_environment_server_config,
    CertificateDirectories, DevServerSettings, Environment, GuardedCommand, HotFile, RefreshRule,
    ResolvedPluginConfig, ResolvedServerConfig,
};

use crate::config::Config;
use crate::lifecycle::HotFileLifecycle;
use crate::server::http::{create_app, AppState, BoundServer};
use crate::toolchain::{
    build::{staged_output_rel, BuildOrchestrator, DEV_STAGING_DIR},
    prepare_build_tools, ToolchainConfig,
};
use crate::watcher::RefreshWatcher;

/// Runs the asset dev server with hot reload.
pub async fn run(
    host: Option<String>,
    port: Option<u16>,
    verbose: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let working_dir = std::env::current_dir()?;
    let assets = config.assets.clone().resolve()?;

    let environment = Environment::from_process();
    ensure_command_should_run_in_environment(GuardedCommand::Serve, &environment)?;

    // Explicit environment material wins over local certificate detection
    let server_config = resolve_server_config(&environment, &assets, &working_dir)?;

    // The staging directory must exist before the watcher starts, or the
    // implicit reload rule for it would have nothing to attach to
    let staging_dir = working_dir.join(DEV_STAGING_DIR);
    std::fs::create_dir_all(&staging_dir)?;

    start_asset_pipeline(&config.toolchain, &assets, &working_dir, verbose, quiet).await?;

    // Browsers subscribe to this channel; the watcher publishes into it
    let (reload_tx, _) = broadcast::channel::<()>(16);
    let reload_tx = Arc::new(reload_tx);

    // Watch the configured refresh rules plus the staged bundles themselves,
    // so both template edits and finished rebuilds trigger a reload
    let mut rules = assets.refresh.clone();
    rules.push(RefreshRule::new([format!("{DEV_STAGING_DIR}/**")]));

    let quiet_watcher = quiet;
    let watcher_tx = reload_tx.clone();

    // Watching starts at construction; the binding keeps it alive until the
    // server exits
    let _watcher =
        RefreshWatcher::new(rules, working_dir.clone(), move |paths: Vec<PathBuf>| {
            let start = Instant::now();

            // Send reload signal immediately
            let _ = watcher_tx.send(());

            // Show reload notification unless quiet
            if !quiet_watcher {
                let display = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");

                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("  {spinner:.cyan} reload {msg}")
                        .unwrap(),
                );
                pb.set_message(display.clone());
                pb.enable_steady_tick(Duration::from_millis(80));

                // Keep spinner for minimum 400ms
                let elapsed = start.elapsed();
                if elapsed < Duration::from_millis(400) {
                    std::thread::sleep(Duration::from_millis(400) - elapsed);
                }

                let total_ms = start.elapsed().as_millis();
                pb.finish_with_message(format!(
                    "{} {} {}",
                    style("✓").green(),
                    style(&display).dim(),
                    style(format!("{}ms", total_ms)).dim()
                ));
            }
        })?;

    // Bind before publishing anything, so the hot file can never name an
    // address that is not accepting connections
    let container = environment.is_set(CONTAINER);
    let bind_host = host
        .clone()
        .or_else(|| container.then(|| "0.0.0.0".to_string()))
        .or_else(|| config.dev.host.clone())
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let bind_port = port
        .or_else(|| environment.get(DEV_PORT).and_then(|value| value.parse().ok()))
        .unwrap_or(config.dev.port);

    let tls = server_config.as_ref().and_then(|c| c.https.clone());
    let has_tls = tls.is_some();
    let server = BoundServer::bind(&format!("{bind_host}:{bind_port}"), tls).await?;
    let bound = server.local_addr()?;

    let url = resolve_dev_server_url(
        bound,
        &DevServerSettings {
            tls: has_tls,
            host: server_config
                .as_ref()
                .map(|c| c.host.clone())
                .or(host)
                .or_else(|| config.dev.host.clone()),
            container,
            hmr: config.dev.hmr.clone(),
        },
    );

    // Hooks must be in place before the hot file exists, so no signal can
    // arrive in a window where the file would be stranded
    let lifecycle = HotFileLifecycle::new(HotFile::new(assets.hot_file.clone()));
    lifecycle.register_shutdown_hooks_once();
    lifecycle.publish(&url)?;

    if !quiet {
        let hot_file = assets.hot_file.display();
        println!("{} {}", style("Dev server:").cyan(), style(&url).green().bold());
        println!("{} {}", style("Hot file:").cyan(), style(hot_file.to_string()).dim());
        println!("{} {}", style("Status:").cyan(), style("Watching for changes...").dim());
        println!();
    }

    // One explicit route per entry point, mapping the logical source path
    // the browser requests to the staged bundle on disk
    let mut entry_routes = HashMap::new();
    for entry in &assets.input {
        entry_routes.insert(
            format!("/{entry}"),
            staging_dir.join(staged_output_rel(entry)),
        );
    }

    let state = AppState {
        entry_routes,
        reload_tx: reload_tx.clone(),
        staging_dir,
        public_dir: working_dir.join(&assets.public_directory),
    };

    server.serve(create_app(state)).await?;

    // Normal exit still removes the hot file
    lifecycle.cleanup();

    Ok(())
}

/// Downloads the enabled tools, runs the initial build, and leaves
/// watch-mode rebuilds running for the life of the server.
async fn start_asset_pipeline(
    toolchain: &ToolchainConfig,
    assets: &ResolvedPluginConfig,
    working_dir: &Path,
    verbose: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    let enabled = toolchain.get_enabled_tools();
    if enabled.is_empty() {
        return Ok(());
    }

    if !quiet {
        let names: Vec<_> = enabled.iter().map(|t| t.as_str()).collect();
        println!("{} {}", style("Build tools:").cyan(), style(names.join(", ")).dim());
    }

    let tool_paths = prepare_build_tools(toolchain).await?;

    let new_orchestrator = |watch: bool| {
        let mut orchestrator = BuildOrchestrator::new(
            assets.clone(),
            toolchain.clone(),
            working_dir.to_path_buf(),
            false,
            watch,
        )
        .with_verbose(verbose);
        for (tool, path) in &tool_paths {
            orchestrator.register_tool(*tool, path.clone());
        }
        orchestrator
    };

    // The first orchestrator blocks until the staging directory is
    // populated; a second keeps rebuilding in watch mode
    let started = Instant::now();
    match new_orchestrator(false).build_all().await {
        Err(err) => eprintln!(
            "  {} {}",
            style("✗").red(),
            style(format!("Initial build failed: {}", err)).red()
        ),
        Ok(()) if !quiet => println!(
            "  {} {} {}",
            style("✓").green(),
            style("Initial build").dim(),
            style(format!("{}ms", started.elapsed().as_millis())).dim()
        ),
        Ok(()) => {}
    }

    let mut watch_orchestrator = new_orchestrator(true);
    tokio::spawn(async move {
        if let Err(err) = watch_orchestrator.build_all().await {
            eprintln!(
                "  {} {}",
                style("✗").red(),
                style(format!("Watch mode failed: {}", err)).red()
            );
        }
    });

    if !quiet {
        println!();
    }

    Ok(())
}

fn resolve_server_config(
    environment: &Environment,
    assets: &ResolvedPluginConfig,
    working_dir: &Path,
) -> anyhow::Result<Option<ResolvedServerConfig>> {
    if let Some(config) = resolve_environment_server_config(environment)? {
        return Ok(Some(config));
    }

    if !assets.detect_tls.is_requested() {
        return Ok(None);
    }

    let dirs = CertificateDirectories::discover().ok_or_else(|| {
        anyhow::anyhow!("detect_tls is enabled but no home directory could be determined")
    })?;

    Ok(resolve_development_server_config(
        &assets.detect_tls,
        &dirs,
        working_dir,
    )?)
}
