// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Inertia-style page envelope.
//!
//! Controllers return a [`Page`]; the HTTP layer either sends it as JSON
//! (when the request carries the `X-Inertia` header, i.e. a client-side
//! visit) or embeds it in the HTML shell as the `data-page` attribute of the
//! mount node for first visits. The `version` field carries the asset
//! manifest hash so clients can detect stale bundles.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Request/response header marking Inertia visits.
pub const INERTIA_HEADER: &str = "X-Inertia";

/// Placeholder in the shell replaced with asset tags.
pub const HEAD_PLACEHOLDER: &str = "%refract.head%";

/// Placeholder in the shell replaced with the mount node.
pub const BODY_PLACEHOLDER: &str = "%refract.body%";

/// Fallback shell used when the application ships none.
pub const DEFAULT_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    %refract.head%
</head>
<body>
    %refract.body%
</body>
</html>
"#;

/// The page envelope exchanged with the client-side adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Component the client should render.
    pub component: String,
    /// Props handed to the component.
    pub props: serde_json::Value,
    /// URL of the visit, echoed back for history handling.
    pub url: String,
    /// Asset version; `null` in dev or before the first build.
    pub version: Option<String>,
}

impl Page {
    /// Creates a page for `component` with empty props.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: serde_json::Value::Object(serde_json::Map::new()),
            url: "/".to_string(),
            version: None,
        }
    }

    /// Sets the component props.
    pub fn props(mut self, props: serde_json::Value) -> Self {
        self.props = props;
        self
    }

    /// Sets the visit URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the asset version.
    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Serializes the envelope.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Whether the `X-Inertia` header value marks a client-side visit.
pub fn is_inertia_request(header: Option<&str>) -> bool {
    header == Some("true")
}

/// Renders the full HTML document for a first visit.
///
/// Substitutes [`HEAD_PLACEHOLDER`] with `head` (normally the asset tags)
/// and [`BODY_PLACEHOLDER`] with the mount node carrying the escaped page
/// envelope.
pub fn render_document(shell: &str, page: &Page, head: &str) -> Result<String> {
    let payload = html_escape(&page.to_json()?);
    let mount = format!("<div id=\"app\" data-page=\"{payload}\"></div>");
    Ok(shell
        .replace(HEAD_PLACEHOLDER, head)
        .replace(BODY_PLACEHOLDER, &mount))
}

/// Escapes text for safe embedding in HTML attributes and content.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
