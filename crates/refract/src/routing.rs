// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Declarative route table.
//!
//! Applications register routes against a [`RouteTable`] (verbs, prefixed
//! groups, REST resources), then hand the table to their HTTP layer. Routes
//! can carry names for reverse URL generation via [`RouteTable::url_for`],
//! and the whole table serializes to JSON so deployments can skip
//! registration with [`RouteTable::cache`] / [`RouteTable::load_cached`].
//!
//! Path parameters use the `:param` segment syntax.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{RefractError, Result};

/// HTTP method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

/// A single registered route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDef {
    /// HTTP method.
    pub method: Method,
    /// Path pattern with `:param` segments.
    pub path: String,
    /// Action handle the HTTP layer dispatches on, e.g. `posts.show`.
    pub action: String,
    /// Route name for reverse URL generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RouteDef {
    /// Names this route for [`RouteTable::url_for`] lookups.
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }
}

/// An ordered collection of routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, method: Method, path: &str, action: &str) -> &mut RouteDef {
        self.routes.push(RouteDef {
            method,
            path: path.to_string(),
            action: action.to_string(),
            name: None,
        });
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }

    /// Registers a GET route.
    pub fn get(&mut self, path: &str, action: &str) -> &mut RouteDef {
        self.push(Method::Get, path, action)
    }

    /// Registers a POST route.
    pub fn post(&mut self, path: &str, action: &str) -> &mut RouteDef {
        self.push(Method::Post, path, action)
    }

    /// Registers a PUT route.
    pub fn put(&mut self, path: &str, action: &str) -> &mut RouteDef {
        self.push(Method::Put, path, action)
    }

    /// Registers a PATCH route.
    pub fn patch(&mut self, path: &str, action: &str) -> &mut RouteDef {
        self.push(Method::Patch, path, action)
    }

    /// Registers a DELETE route.
    pub fn delete(&mut self, path: &str, action: &str) -> &mut RouteDef {
        self.push(Method::Delete, path, action)
    }

    /// Registers routes under a shared path prefix.
    pub fn group<F>(&mut self, prefix: &str, register: F)
    where
        F: FnOnce(&mut RouteGroup<'_>),
    {
        let mut group = RouteGroup {
            table: self,
            prefix: prefix.to_string(),
        };
        register(&mut group);
    }

    /// Registers the seven conventional REST routes for a resource.
    ///
    /// For `resource("posts", "posts")`: index, create, store, show, edit,
    /// update, destroy, named `posts.index` through `posts.destroy`.
    pub fn resource(&mut self, base: &str, controller: &str) {
        let collection = format!("/{}", base.trim_matches('/'));
        let member = format!("{collection}/:id");

        self.get(&collection, &format!("{controller}.index"))
            .named(format!("{base}.index"));
        self.get(&format!("{collection}/create"), &format!("{controller}.create"))
            .named(format!("{base}.create"));
        self.post(&collection, &format!("{controller}.store"))
            .named(format!("{base}.store"));
        self.get(&member, &format!("{controller}.show"))
            .named(format!("{base}.show"));
        self.get(&format!("{member}/edit"), &format!("{controller}.edit"))
            .named(format!("{base}.edit"));
        self.put(&member, &format!("{controller}.update"))
            .named(format!("{base}.update"));
        self.delete(&member, &format!("{controller}.destroy"))
            .named(format!("{base}.destroy"));
    }

    /// All registered routes, in registration order.
    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    /// Finds a route by name.
    pub fn route(&self, name: &str) -> Option<&RouteDef> {
        self.routes
            .iter()
            .find(|route| route.name.as_deref() == Some(name))
    }

    /// Generates a URL for a named route, substituting `:param` segments.
    ///
    /// # Errors
    ///
    /// [`RefractError::RoutingError`] when the name is unknown or a path
    /// parameter has no value.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        let route = self.route(name).ok_or_else(|| {
            RefractError::RoutingError(format!("no route named `{name}` is registered"))
        })?;

        let mut url = String::new();
        for segment in route.path.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            if let Some(param) = segment.strip_prefix(':') {
                let value = params
                    .iter()
                    .find(|(key, _)| *key == param)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| {
                        RefractError::RoutingError(format!(
                            "route `{name}` needs a value for `:{param}`"
                        ))
                    })?;
                url.push_str(value);
            } else {
                url.push_str(segment);
            }
        }

        if url.is_empty() {
            url.push('/');
        }
        Ok(url)
    }

    /// Writes the table to a JSON cache file.
    pub fn cache(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.routes)?;
        fs::write(path.as_ref(), json)?;
        tracing::debug!(routes = self.routes.len(), path = %path.as_ref().display(), "cached route table");
        Ok(())
    }

    /// Restores a table from a JSON cache file.
    pub fn load_cached(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let routes: Vec<RouteDef> = serde_json::from_str(&raw)?;
        Ok(Self { routes })
    }
}

/// Route registration scoped under a path prefix.
pub struct RouteGroup<'a> {
    table: &'a mut RouteTable,
    prefix: String,
}

impl RouteGroup<'_> {
    fn prefixed(&self, path: &str) -> String {
        join_paths(&self.prefix, path)
    }

    /// Registers a GET route under the group prefix.
    pub fn get(&mut self, path: &str, action: &str) -> &mut RouteDef {
        let path = self.prefixed(path);
        self.table.push(Method::Get, &path, action)
    }

    /// Registers a POST route under the group prefix.
    pub fn post(&mut self, path: &str, action: &str) -> &mut RouteDef {
        let path = self.prefixed(path);
        self.table.push(Method::Post, &path, action)
    }

    /// Registers a PUT route under the group prefix.
    pub fn put(&mut self, path: &str, action: &str) -> &mut RouteDef {
        let path = self.prefixed(path);
        self.table.push(Method::Put, &path, action)
    }

    /// Registers a PATCH route under the group prefix.
    pub fn patch(&mut self, path: &str, action: &str) -> &mut RouteDef {
        let path = self.prefixed(path);
        self.table.push(Method::Patch, &path, action)
    }

    /// Registers a DELETE route under the group prefix.
    pub fn delete(&mut self, path: &str, action: &str) -> &mut RouteDef {
        let path = self.prefixed(path);
        self.table.push(Method::Delete, &path, action)
    }

    /// Registers a nested group.
    pub fn group<F>(&mut self, prefix: &str, register: F)
    where
        F: FnOnce(&mut RouteGroup<'_>),
    {
        let mut nested = RouteGroup {
            table: &mut *self.table,
            prefix: join_paths(&self.prefix, prefix),
        };
        register(&mut nested);
    }
}

fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }
    } else {
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_table() -> RouteTable {
        let mut table = RouteTable::new();
        table.get("/", "home.index").named("home");
        table.get("/about", "home.about").named("about");
        table.group("/api", |api| {
            api.get("/posts/:id/comments", "comments.index")
                .named("api.comments");
        });
        table.resource("posts", "posts");
        table
    }

    #[test]
    fn verbs_and_groups_register_in_order() {
        let table = sample_table();
        assert_eq!(table.routes()[0].path, "/");
        assert_eq!(table.routes()[1].path, "/about");
        assert_eq!(table.routes()[2].path, "/api/posts/:id/comments");
        assert_eq!(table.routes()[2].method, Method::Get);
    }

    #[test]
    fn resource_expands_to_seven_actions() {
        let mut table = RouteTable::new();
        table.resource("posts", "posts");

        let summary: Vec<(Method, &str, &str)> = table
            .routes()
            .iter()
            .map(|r| (r.method, r.path.as_str(), r.action.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (Method::Get, "/posts", "posts.index"),
                (Method::Get, "/posts/create", "posts.create"),
                (Method::Post, "/posts", "posts.store"),
                (Method::Get, "/posts/:id", "posts.show"),
                (Method::Get, "/posts/:id/edit", "posts.edit"),
                (Method::Put, "/posts/:id", "posts.update"),
                (Method::Delete, "/posts/:id", "posts.destroy"),
            ]
        );
        assert_eq!(table.route("posts.show").unwrap().path, "/posts/:id");
    }

    #[test]
    fn nested_groups_stack_prefixes() {
        let mut table = RouteTable::new();
        table.group("/api", |api| {
            api.group("/v1", |v1| {
                v1.get("/health", "health.show");
            });
        });
        assert_eq!(table.routes()[0].path, "/api/v1/health");
    }

    #[test]
    fn url_for_substitutes_parameters() {
        let table = sample_table();
        assert_eq!(table.url_for("home", &[]).unwrap(), "/");
        assert_eq!(
            table.url_for("posts.show", &[("id", "42")]).unwrap(),
            "/posts/42"
        );
        assert_eq!(
            table.url_for("api.comments", &[("id", "7")]).unwrap(),
            "/api/posts/7/comments"
        );
    }

    #[test]
    fn url_for_rejects_unknown_names_and_missing_params() {
        let table = sample_table();

        let err = table.url_for("nope", &[]).unwrap_err();
        assert!(err.to_string().contains("nope"));

        let err = table.url_for("posts.show", &[]).unwrap_err();
        assert!(err.to_string().contains(":id"));
    }

    #[test]
    fn cache_round_trips_the_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("routes.json");

        let table = sample_table();
        table.cache(&path).unwrap();
        let restored = RouteTable::load_cached(&path).unwrap();

        assert_eq!(table, restored);
    }
}
