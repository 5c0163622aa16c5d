// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Build orchestration for project assets.
//!
//! Dev builds stage bundles under `.refract/dev/`, mirroring each entry's
//! source path so the asset server can serve them under their logical URLs.
//! Production builds write content-hashed bundles under the build directory
//! and emit the manifest the application reads at runtime.

use super::output::{drain_stdout, OutputFilter};
use super::types::{BuildStatus, Tool, ToolchainConfig, ToolchainError, ToolchainResult};
use console::style;
use refract::{ManifestEntry, ResolvedPluginConfig};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tokio::{process::Command as TokioCommand, sync::RwLock};

/// Directory where dev builds stage their output, relative to the project root
pub const DEV_STAGING_DIR: &str = ".refract/dev";

/// Scratch directory for production builds before hashing
const PROD_STAGING_DIR: &str = ".refract/prod";

/// Extensions treated as stylesheet entries
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "pcss", "styl"];

/// Flags every browser bundle gets, watch mode or not.
///
/// The file loaders let source files reference fonts and images; esbuild
/// copies those through next to the bundle.
const ESBUILD_BUNDLE_ARGS: &[&str] = &[
    "--outbase=.",
    "--bundle",
    "--format=esm",
    "--loader:.woff=file",
    "--loader:.woff2=file",
    "--loader:.ttf=file",
    "--loader:.svg=file",
    "--loader:.png=file",
    "--loader:.jpg=file",
    "--loader:.gif=file",
];

fn is_style_entry(entry: &str) -> bool {
    Path::new(entry)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| STYLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Staged output path for an entry, relative to the staging directory.
///
/// Source layout is preserved; only the extension changes to the compiled
/// one (`resources/js/app.jsx` stages to `resources/js/app.js`).
pub fn staged_output_rel(entry: &str) -> PathBuf {
    let ext = if is_style_entry(entry) { "css" } else { "js" };
    Path::new(entry).with_extension(ext)
}

/// A bundle produced by the production build.
#[derive(Debug, Clone)]
pub struct BuiltAsset {
    /// Logical entry point, as listed in the configuration.
    pub source: String,
    /// Output path relative to the build directory.
    pub file: String,
    /// Output size in bytes.
    pub size: u64,
}

/// Runs the bundling tools over the configured entry points.
#[derive(Clone)]
pub struct BuildOrchestrator {
    /// Entry points and output locations from the project configuration
    assets: ResolvedPluginConfig,
    /// Which tools are enabled, and their pinned versions
    config: ToolchainConfig,
    /// Project root; every tool command runs from here
    working_dir: PathBuf,
    is_production: bool,
    is_watch_mode: bool,
    verbose: bool,
    /// Executable path per registered tool
    tools: HashMap<Tool, PathBuf>,
    /// Per-tool progress over the current run
    build_status: Arc<RwLock<HashMap<Tool, BuildStatus>>>,
}

impl BuildOrchestrator {
    /// Creates an orchestrator rooted at `working_dir`.
    ///
    /// Tools still have to be registered before anything can build.
    pub fn new(
        assets: ResolvedPluginConfig,
        config: ToolchainConfig,
        working_dir: PathBuf,
        is_production: bool,
        is_watch_mode: bool,
    ) -> Self {
        Self {
            assets,
            config,
            working_dir,
            is_production,
            is_watch_mode,
            verbose: false,
            tools: HashMap::new(),
            build_status: Arc::default(),
        }
    }

    /// Passes raw tool output through instead of the filtered stream.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Records where `tool`'s executable lives.
    ///
    /// Enabled tools that were never registered are skipped with a notice.
    pub fn register_tool(&mut self, tool: Tool, path: PathBuf) {
        self.tools.insert(tool, path);
    }

    /// Staging root for this build flavor
    fn staging_dir(&self) -> PathBuf {
        if self.is_production {
            self.working_dir.join(PROD_STAGING_DIR)
        } else {
            self.working_dir.join(DEV_STAGING_DIR)
        }
    }

    /// Entries routed to the given tool.
    ///
    /// Stylesheets go to Tailwind when it is enabled; otherwise esbuild
    /// bundles them along with the scripts.
    fn entries_for(&self, tool: Tool) -> Vec<String> {
        let enabled = self.config.get_enabled_tools();
        let tailwind_takes_styles = enabled.contains(&Tool::Tailwind);

        self.assets
            .input
            .iter()
            .filter(|entry| match tool {
                Tool::Tailwind => tailwind_takes_styles && is_style_entry(entry),
                Tool::Esbuild => !tailwind_takes_styles || !is_style_entry(entry),
            })
            .cloned()
            .collect()
    }

    /// Run the staging build pipeline for all enabled tools
    pub async fn build_all(&mut self) -> ToolchainResult<()> {
        let enabled = self.config.get_enabled_tools();

        {
            let mut status = self.build_status.write().await;
            for tool in &enabled {
                status.insert(*tool, BuildStatus::Pending);
            }
        }

        let total_start = Instant::now();

        // Stylesheets first, scripts second
        for tool in [Tool::Tailwind, Tool::Esbuild] {
            if enabled.contains(&tool) {
                self.run_step(tool).await?;
            }
        }

        if !enabled.contains(&Tool::Esbuild) && !self.entries_for(Tool::Esbuild).is_empty() {
            println!(
                "{}",
                style("Some entry points have no bundler enabled (enable \"esbuild\").").yellow()
            );
        }

        if !self.is_watch_mode {
            tracing::debug!("Total asset build time: {:?}", total_start.elapsed());
        }

        Ok(())
    }

    /// Runs a single tool, printing its result line and tracking status.
    async fn run_step(&self, tool: Tool) -> ToolchainResult<()> {
        self.update_status(tool, BuildStatus::InProgress).await;
        let started = Instant::now();

        let result = match tool {
            Tool::Tailwind => self.build_tailwind().await,
            Tool::Esbuild => self.build_esbuild().await,
        };

        match &result {
            Ok(()) => {
                // A watch build returns right after spawning, so elapsed
                // time would only measure the spawn
                if !self.is_watch_mode {
                    println!(
                        "  {:<12} {} {}",
                        style(tool.label()).cyan(),
                        style("✓").green(),
                        style(format!("{}ms", started.elapsed().as_millis())).dim()
                    );
                }
                self.update_status(tool, BuildStatus::Completed).await;
            }
            Err(err) => {
                println!(
                    "  {:<12} {} {}",
                    style(tool.label()).cyan(),
                    style("✗").red(),
                    style(err.to_string()).red()
                );
                self.update_status(tool, BuildStatus::Failed).await;
            }
        }

        result
    }

    /// Build stylesheet entries with Tailwind CSS
    async fn build_tailwind(&self) -> ToolchainResult<()> {
        let Some(program) = self.tools.get(&Tool::Tailwind) else {
            println!("{}", style("Tailwind CSS tool not found.").yellow());
            return Ok(());
        };

        let staging = self.staging_dir();

        for entry in self.entries_for(Tool::Tailwind) {
            let input = self.working_dir.join(&entry);
            let output = staging.join(staged_output_rel(&entry));
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut cmd = Command::new(program);
            cmd.current_dir(&self.working_dir);
            cmd.arg("-i").arg(&input).arg("-o").arg(&output);

            if self.is_watch_mode {
                let mut cmd = TokioCommand::from(cmd);
                cmd.arg("--watch");

                // The reload spinner already reports staged changes, so
                // routine rebuild chatter is dropped entirely
                self.spawn_watcher(cmd, Tool::Tailwind, true)?;
                println!(
                    "  {:<12} {}",
                    style("Tailwind").cyan(),
                    style(format!("watching {}", entry)).dim()
                );
                continue;
            }

            if self.is_production {
                cmd.arg("--minify");
            }
            run_to_completion(cmd, Tool::Tailwind.label(), self.verbose)?;
        }

        Ok(())
    }

    /// Build script entries with esbuild
    async fn build_esbuild(&self) -> ToolchainResult<()> {
        let Some(program) = self.tools.get(&Tool::Esbuild) else {
            println!("{}", style("esbuild tool not found.").yellow());
            return Ok(());
        };

        let entries = self.entries_for(Tool::Esbuild);
        if entries.is_empty() {
            return Ok(());
        }

        let staging = self.staging_dir();
        fs::create_dir_all(&staging)?;

        // One invocation bundles every entry; --outbase preserves the
        // source layout under the staging directory
        let mut cmd = Command::new(program);
        cmd.current_dir(&self.working_dir);
        cmd.args(&entries);
        cmd.arg(format!("--outdir={}", staging.display()));
        cmd.args(ESBUILD_BUNDLE_ARGS);

        if self.is_watch_mode {
            let mut cmd = TokioCommand::from(cmd);
            cmd.arg("--sourcemap=inline").arg("--watch");

            self.spawn_watcher(cmd, Tool::Esbuild, false)?;
            println!(
                "  {:<12} {}",
                style("esbuild").cyan(),
                style(format!("watching {} entry point(s)", entries.len())).dim()
            );
            return Ok(());
        }

        if self.is_production {
            cmd.arg("--minify");
        } else {
            cmd.arg("--sourcemap=inline");
        }
        run_to_completion(cmd, Tool::Esbuild.label(), self.verbose)
    }

    /// Spawns a watch-mode process and attaches the filtered output readers.
    ///
    /// The child is not awaited; it keeps rebuilding in the background.
    fn spawn_watcher(
        &self,
        mut cmd: TokioCommand,
        tool: Tool,
        suppress_rebuilds: bool,
    ) -> ToolchainResult<()> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let mut child = cmd.spawn()?;

        if let Some(stderr) = child.stderr.take() {
            OutputFilter::new(tool.label(), self.verbose)
                .with_suppress_watch_rebuilds(suppress_rebuilds)
                .watch_stderr(stderr);
        }
        if let Some(stdout) = child.stdout.take() {
            drain_stdout(stdout, tool.label(), self.verbose);
        }

        Ok(())
    }

    /// Run the production build: bundle, hash, and write the manifest.
    ///
    /// The build directory is recreated from scratch so stale hashed files
    /// from earlier builds never accumulate.
    pub async fn production_build(&mut self) -> ToolchainResult<Vec<BuiltAsset>> {
        let staging = self.staging_dir();
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let build_dir = self.working_dir.join(self.assets.build_path());
        if build_dir.exists() {
            fs::remove_dir_all(&build_dir)?;
        }
        fs::create_dir_all(build_dir.join("assets"))?;

        // Bundle everything into the scratch directory first
        self.build_all().await?;

        let mut manifest: BTreeMap<String, ManifestEntry> = BTreeMap::new();
        let mut built = Vec::new();

        for entry in &self.assets.input {
            let staged = staging.join(staged_output_rel(entry));
            let (file, size) = hash_and_place(&staged, &build_dir)?;

            // esbuild emits a sibling stylesheet when a script imports CSS
            let mut css = Vec::new();
            if !is_style_entry(entry) {
                let sibling = staged.with_extension("css");
                if sibling.is_file() {
                    let (css_file, _) = hash_and_place(&sibling, &build_dir)?;
                    css.push(css_file);
                }
            }

            println!(
                "  {} {} {}",
                style("✓").green(),
                style(format!("{} -> {}", entry, file)).dim(),
                style(format!("{:.1} KiB", size as f64 / 1024.0)).dim()
            );

            built.push(BuiltAsset {
                source: entry.clone(),
                file: file.clone(),
                size,
            });

            manifest.insert(
                entry.clone(),
                ManifestEntry {
                    file,
                    src: Some(entry.clone()),
                    is_entry: true,
                    css,
                },
            );
        }

        // Write the manifest the application resolves assets through
        let manifest_path = self.working_dir.join(self.assets.manifest_path());
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&manifest_path, json)?;

        // The scratch directory has served its purpose
        fs::remove_dir_all(&staging)?;

        Ok(built)
    }

    /// Bundle the SSR entries for the server runtime.
    ///
    /// SSR bundles are not hashed: the server loads them by path, not
    /// through the manifest.
    pub async fn ssr_build(&mut self) -> ToolchainResult<Vec<BuiltAsset>> {
        let Some(program) = self.tools.get(&Tool::Esbuild) else {
            return Err(ToolchainError::ExecutionFailed(
                "SSR builds require esbuild (enable \"esbuild\" in [toolchain])".to_string(),
            ));
        };

        // Stylesheets have no server-side rendering counterpart
        let entries: Vec<String> = self
            .assets
            .ssr
            .iter()
            .filter(|entry| !is_style_entry(entry))
            .cloned()
            .collect();
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ssr_dir = self.working_dir.join(&self.assets.ssr_output_directory);
        if ssr_dir.exists() {
            fs::remove_dir_all(&ssr_dir)?;
        }
        fs::create_dir_all(&ssr_dir)?;

        let mut cmd = Command::new(program);
        cmd.current_dir(&self.working_dir);
        cmd.args(&entries);
        cmd.arg(format!("--outdir={}", ssr_dir.display()));
        cmd.args(["--outbase=.", "--bundle", "--platform=node", "--format=esm"]);

        if self.is_production {
            cmd.arg("--minify");
        }
        run_to_completion(cmd, Tool::Esbuild.label(), self.verbose)?;

        let mut built = Vec::new();
        for entry in entries {
            let rel = staged_output_rel(&entry);
            let bundle = ssr_dir.join(&rel);
            let size = fs::metadata(&bundle)?.len();

            println!(
                "  {} {} {}",
                style("✓").green(),
                style(format!("{} -> {}", entry, rel.display())).dim(),
                style(format!("{:.1} KiB", size as f64 / 1024.0)).dim()
            );

            built.push(BuiltAsset {
                source: entry,
                file: rel.to_string_lossy().into_owned(),
                size,
            });
        }

        Ok(built)
    }

    async fn update_status(&self, tool: Tool, status: BuildStatus) {
        self.build_status.write().await.insert(tool, status);
    }
}

/// Runs a bundler to completion, surfacing its stderr on failure.
///
/// Both tools write progress chatter to stderr even on success; that only
/// prints in verbose mode.
fn run_to_completion(mut cmd: Command, label: &str, verbose: bool) -> ToolchainResult<()> {
    let output = cmd.output()?;

    if !output.status.success() {
        return Err(ToolchainError::ExecutionFailed(
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    if verbose && !output.stderr.is_empty() {
        eprintln!("{}", style(format!("{} warnings:", label)).yellow());
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
    }

    Ok(())
}

/// Copies a staged bundle into the build directory under a content-hashed
/// name, returning the manifest-relative path and the size in bytes.
fn hash_and_place(staged: &Path, build_dir: &Path) -> ToolchainResult<(String, u64)> {
    let bytes = fs::read(staged).map_err(|err| {
        ToolchainError::ExecutionFailed(format!(
            "expected bundle at {} was not produced: {}",
            staged.display(),
            err
        ))
    })?;

    let digest = format!("{:x}", Sha256::digest(&bytes));
    let stem = staged
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string());
    let ext = staged
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "js".to_string());

    let file = format!("assets/{}-{}.{}", stem, &digest[..8], ext);
    let target = build_dir.join(&file);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let size = bytes.len() as u64;
    fs::write(target, bytes)?;

    Ok((file, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_paths_keep_layout_and_map_extensions() {
        assert_eq!(
            staged_output_rel("resources/js/app.jsx"),
            PathBuf::from("resources/js/app.js")
        );
        assert_eq!(
            staged_output_rel("resources/js/admin.tsx"),
            PathBuf::from("resources/js/admin.js")
        );
        assert_eq!(
            staged_output_rel("resources/css/app.css"),
            PathBuf::from("resources/css/app.css")
        );
        assert_eq!(
            staged_output_rel("resources/css/site.scss"),
            PathBuf::from("resources/css/site.css")
        );
    }

    #[test]
    fn style_entries_are_classified_by_extension() {
        assert!(is_style_entry("resources/css/app.css"));
        assert!(is_style_entry("a/b.PCSS"));
        assert!(!is_style_entry("resources/js/app.jsx"));
        assert!(!is_style_entry("no_extension"));
    }

    #[test]
    fn hashed_placement_writes_under_assets() {
        let tmp = tempfile::TempDir::new().unwrap();
        let staged = tmp.path().join("resources/js/app.js");
        fs::create_dir_all(staged.parent().unwrap()).unwrap();
        fs::write(&staged, b"console.log(1);").unwrap();

        let build_dir = tmp.path().join("public/build");
        fs::create_dir_all(&build_dir).unwrap();

        let (file, size) = hash_and_place(&staged, &build_dir).unwrap();
        assert!(file.starts_with("assets/app-"));
        assert!(file.ends_with(".js"));
        assert_eq!(size, 15);
        assert!(build_dir.join(&file).is_file());

        // Same content hashes to the same name
        let (again, _) = hash_and_place(&staged, &build_dir).unwrap();
        assert_eq!(file, again);
    }

    #[test]
    fn missing_staged_bundle_is_reported_with_its_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = hash_and_place(
            &tmp.path().join("resources/js/ghost.js"),
            &tmp.path().join("public/build"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("ghost.js"));
    }
}
