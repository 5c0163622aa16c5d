// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Build command for compiling production asset bundles.

use console::style;
use std::time::Instant;

use refract::{ensure_command_should_run_in_environment, Environment, GuardedCommand};

use crate::config::Config;
use crate::toolchain::{build::BuildOrchestrator, prepare_build_tools};

/// Runs the production asset build.
pub async fn run(ssr: bool, verbose: bool, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let working_dir = std::env::current_dir()?;
    let assets = config.assets.clone().resolve()?;

    let environment = Environment::from_process();
    ensure_command_should_run_in_environment(GuardedCommand::Build, &environment)?;

    let enabled_tools = config.toolchain.get_enabled_tools();
    if enabled_tools.is_empty() {
        println!(
            "{}",
            style("No build tools enabled; nothing to build.").yellow()
        );
        return Ok(());
    }

    if !quiet {
        println!("{}", style("Building production assets...").cyan().bold());
        let tools_list: Vec<_> = enabled_tools.iter().map(|t| t.as_str()).collect();
        println!(
            "{} {}",
            style("Build tools:").cyan(),
            style(tools_list.join(", ")).dim()
        );
    }

    // Download/ensure tools are available
    let tool_paths = prepare_build_tools(&config.toolchain).await?;

    let mut orchestrator = BuildOrchestrator::new(
        assets.clone(),
        config.toolchain.clone(),
        working_dir.clone(),
        true,
        false,
    )
    .with_verbose(verbose);

    for (tool, path) in &tool_paths {
        orchestrator.register_tool(*tool, path.clone());
    }

    let start = Instant::now();
    let built = orchestrator.production_build().await?;

    if !quiet {
        println!();
        println!(
            "{} {} asset(s) in {}ms",
            style("Built").green(),
            built.len(),
            start.elapsed().as_millis()
        );
        println!(
            "{} {}",
            style("Manifest:").cyan(),
            style(assets.manifest_path().display().to_string()).dim()
        );
    }

    if ssr {
        if !quiet {
            println!();
            println!("{}", style("Building SSR bundles...").cyan().bold());
        }

        let ssr_start = Instant::now();
        let ssr_built = orchestrator.ssr_build().await?;

        if !quiet {
            println!();
            println!(
                "{} {} SSR bundle(s) in {}ms",
                style("Built").green(),
                ssr_built.len(),
                ssr_start.elapsed().as_millis()
            );
            println!(
                "{} {}",
                style("Output:").cyan(),
                style(&assets.ssr_output_directory).dim()
            );
        }
    }

    Ok(())
}
