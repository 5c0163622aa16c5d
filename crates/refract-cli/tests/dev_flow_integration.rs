// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Integration tests for the dev-server flow.
//!
//! These tests run the actual crate code against a scaffolded project tree:
//! configuration loading, hot-file lifecycle as the application's asset
//! helper observes it, and the asset server's routing.

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tempfile::tempdir;
use tokio::sync::broadcast;

use refract::{AssetResolver, HotFile, PluginConfig};
use refract_cli::config::Config;
use refract_cli::lifecycle::HotFileLifecycle;
use refract_cli::server::http::{create_app, AppState, BoundServer};
use refract_cli::toolchain::build::{staged_output_rel, DEV_STAGING_DIR};

/// Create a project structure in a temp directory, including staged
/// watch-mode bundles as if a build had already run.
fn setup_test_project(dir: &Path) {
    fs::create_dir_all(dir.join("resources/js")).unwrap();
    fs::create_dir_all(dir.join("resources/css")).unwrap();
    fs::create_dir_all(dir.join("public")).unwrap();

    fs::write(
        dir.join("refract.toml"),
        r#"
[project]
name = "integration"

[dev]
port = 5199

[assets]
input = ["resources/js/app.jsx", "resources/css/app.css"]
refresh = true

[toolchain]
enabled = ["esbuild", "tailwind"]
"#,
    )
    .unwrap();

    fs::write(
        dir.join("resources/js/app.jsx"),
        "export const answer = 42;\n",
    )
    .unwrap();
    fs::write(dir.join("resources/css/app.css"), "body { margin: 0 }\n").unwrap();
    fs::write(dir.join("public/favicon.svg"), "<svg></svg>").unwrap();

    // Staged bundles, as the watch-mode build would leave them
    let staging = dir.join(DEV_STAGING_DIR);
    let js = staging.join(staged_output_rel("resources/js/app.jsx"));
    fs::create_dir_all(js.parent().unwrap()).unwrap();
    fs::write(&js, "var answer = 42;\n").unwrap();

    let css = staging.join(staged_output_rel("resources/css/app.css"));
    fs::create_dir_all(css.parent().unwrap()).unwrap();
    fs::write(&css, "body{margin:0}\n").unwrap();
}

mod config_tests {
    use super::*;

    #[test]
    fn loads_the_project_configuration() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());

        let config = Config::load_from(&dir.path().join("refract.toml")).unwrap();
        assert_eq!(config.project.name, "integration");
        assert_eq!(config.dev.port, 5199);

        let assets = config.assets.resolve().unwrap();
        assert_eq!(
            assets.input,
            vec!["resources/js/app.jsx", "resources/css/app.css"]
        );
        assert_eq!(assets.hot_file, Path::new("public/hot"));
        assert!(!assets.refresh.is_empty());
    }

    #[test]
    fn missing_configuration_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("refract.toml")).unwrap();
        assert_eq!(config.dev.port, 5173);
        assert!(config.assets.resolve().is_err(), "no entry points configured");
    }
}

mod hot_file_tests {
    use super::*;

    #[test]
    fn published_hot_file_switches_the_asset_helper_to_dev_mode() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());

        let assets = PluginConfig::with_input(["resources/js/app.jsx"])
            .resolve()
            .unwrap();
        let resolver = AssetResolver::with_root(dir.path(), assets.clone());
        assert!(!resolver.is_dev(), "no hot file yet");

        let lifecycle = HotFileLifecycle::new(HotFile::new(dir.path().join(&assets.hot_file)));
        lifecycle.publish("http://127.0.0.1:5199").unwrap();

        assert!(resolver.is_dev());
        assert_eq!(
            resolver.url("resources/js/app.jsx").unwrap(),
            "http://127.0.0.1:5199/resources/js/app.jsx"
        );

        lifecycle.cleanup();
        assert!(!resolver.is_dev(), "cleanup must remove the hot file");
    }

    #[test]
    fn after_cleanup_resolution_goes_through_the_manifest() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());

        let assets = PluginConfig::with_input(["resources/js/app.jsx"])
            .resolve()
            .unwrap();
        let resolver = AssetResolver::with_root(dir.path(), assets.clone());

        fs::create_dir_all(dir.path().join("public/build")).unwrap();
        fs::write(
            dir.path().join("public/build/manifest.json"),
            r#"{"resources/js/app.jsx": {"file": "assets/app-1a2b3c4d.js", "isEntry": true}}"#,
        )
        .unwrap();

        let lifecycle = HotFileLifecycle::new(HotFile::new(dir.path().join(&assets.hot_file)));
        lifecycle.publish("http://127.0.0.1:5199").unwrap();
        assert!(resolver.url("resources/js/app.jsx").unwrap().starts_with("http://"));

        assert_eq!(lifecycle.handle_termination(), 0);
        assert_eq!(
            resolver.url("resources/js/app.jsx").unwrap(),
            "/build/assets/app-1a2b3c4d.js"
        );
    }
}

mod asset_server_tests {
    use super::*;

    async fn spawn_asset_server(project: &Path) -> SocketAddr {
        let staging = project.join(DEV_STAGING_DIR);

        let mut entry_routes = HashMap::new();
        for entry in ["resources/js/app.jsx", "resources/css/app.css"] {
            entry_routes.insert(
                format!("/{entry}"),
                staging.join(staged_output_rel(entry)),
            );
        }

        let (reload_tx, _) = broadcast::channel::<()>(16);
        let state = AppState {
            entry_routes,
            reload_tx: Arc::new(reload_tx),
            staging_dir: staging,
            public_dir: project.join("public"),
        };

        let server = BoundServer::bind("127.0.0.1:0", None).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve(create_app(state)));
        addr
    }

    #[tokio::test]
    async fn serves_staged_bundles_under_their_logical_paths() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());
        let addr = spawn_asset_server(dir.path()).await;

        let response = reqwest::get(format!("http://{addr}/resources/js/app.jsx"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/javascript"));
        assert_eq!(response.text().await.unwrap(), "var answer = 42;\n");
    }

    #[tokio::test]
    async fn stylesheet_entries_get_a_css_content_type() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());
        let addr = spawn_asset_server(dir.path()).await;

        let response = reqwest::get(format!("http://{addr}/resources/css/app.css"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/css"));
    }

    #[tokio::test]
    async fn missing_staged_bundle_is_a_404_not_a_crash() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());
        fs::remove_file(
            dir.path()
                .join(DEV_STAGING_DIR)
                .join(staged_output_rel("resources/js/app.jsx")),
        )
        .unwrap();
        let addr = spawn_asset_server(dir.path()).await;

        let response = reqwest::get(format!("http://{addr}/resources/js/app.jsx"))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        assert!(response.text().await.unwrap().contains("not built yet"));
    }

    #[tokio::test]
    async fn ships_the_livereload_client() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());
        let addr = spawn_asset_server(dir.path()).await;

        let response = reqwest::get(format!("http://{addr}/__refract/livereload.js"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = response.text().await.unwrap();
        assert!(body.contains("__refract/livereload"));
        assert!(body.contains("WebSocket"));
    }

    #[tokio::test]
    async fn falls_back_to_the_public_directory() {
        let dir = tempdir().unwrap();
        setup_test_project(dir.path());
        let addr = spawn_asset_server(dir.path()).await;

        let response = reqwest::get(format!("http://{addr}/favicon.svg"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "<svg></svg>");
    }
}
