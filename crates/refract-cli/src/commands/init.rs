// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Project initialization command for creating new refract projects.

use include_dir::{include_dir, Dir, DirEntry, File};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

static REACT_TEMPLATE: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates/react");
static VANILLA_TEMPLATE: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates/vanilla");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    React,
    Vanilla,
}

impl Template {
    /// Accepts both menu numbers and names; anything else falls back to
    /// the react template.
    fn parse(choice: &str) -> Self {
        match choice {
            "2" | "vanilla" => Template::Vanilla,
            _ => Template::React,
        }
    }

    fn contents(self) -> &'static Dir<'static> {
        match self {
            Template::React => &REACT_TEMPLATE,
            Template::Vanilla => &VANILLA_TEMPLATE,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Template::React => "react",
            Template::Vanilla => "vanilla",
        }
    }
}

/// Scaffolds a new refract project from a packed template.
pub async fn run(name: Option<String>, template: Option<String>) -> anyhow::Result<()> {
    let template = match template.as_deref() {
        Some(choice) => Template::parse(choice),
        None => select_template()?,
    };

    let scaffold_here = matches!(name.as_deref(), Some(".") | None);
    let (project_dir, project) = resolve_target(name.as_deref())?;

    if !project_dir.exists() {
        fs::create_dir_all(&project_dir)?;
        tracing::info!("created project directory {}", project_dir.display());
    }

    extract_template(template.contents(), &project_dir, &project)?;

    // The hot file lives under public/, so the directory must exist even
    // before the first build populates it
    fs::create_dir_all(project_dir.join("public"))?;

    print_success(&project, template, scaffold_here);

    Ok(())
}

fn select_template() -> anyhow::Result<Template> {
    println!();
    println!("Select a template:");
    println!();
    println!("  1. react (recommended)");
    println!("     React starter with server-driven page components,");
    println!("     shared props, and Tailwind CSS");
    println!();
    println!("  2. vanilla");
    println!("     Plain TypeScript starter without a frontend framework");
    println!();
    print!("Template [1]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let choice = input.trim();
    if !matches!(choice, "" | "1" | "2" | "react" | "vanilla") {
        println!("Unrecognized choice, using the react template");
    }

    Ok(Template::parse(choice))
}

/// Where the project lands and what it is called.
///
/// `refract init` and `refract init .` scaffold into the current directory
/// and name the project after it. Anything else is treated as a path and
/// named after its final component.
fn resolve_target(name: Option<&str>) -> anyhow::Result<(PathBuf, String)> {
    let dir = match name {
        None | Some(".") => std::env::current_dir()?,
        Some(path) => PathBuf::from(path),
    };

    let project = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "my-refract-app".to_string());

    Ok((dir, project))
}

fn extract_template(template: &Dir, target: &Path, project: &str) -> anyhow::Result<()> {
    for entry in template.entries() {
        match entry {
            DirEntry::Dir(dir) => {
                fs::create_dir_all(target.join(dir.path()))?;
                extract_template(dir, target, project)?;
            }
            DirEntry::File(file) => write_template_file(file, target, project)?,
        }
    }
    Ok(())
}

/// Writes one packed file, applying the template rules: `gitignore` is
/// stored unprefixed so cargo publish keeps it, and `*.tmpl` files lose the
/// suffix and have `{{project_name}}` replaced.
fn write_template_file(file: &File, target: &Path, project: &str) -> anyhow::Result<()> {
    let source = file.path();
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid template entry: {:?}", source))?;

    let (name, templated) = match name.strip_suffix(".tmpl") {
        Some(stripped) => (stripped, true),
        None if name == "gitignore" => (".gitignore", false),
        None => (name, false),
    };

    let dest = match source.parent() {
        Some(parent) => target.join(parent).join(name),
        None => target.join(name),
    };
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let text = file
        .contents_utf8()
        .ok_or_else(|| anyhow::anyhow!("template file is not UTF-8: {:?}", source))?;

    if templated {
        fs::write(&dest, text.replace("{{project_name}}", project))?;
    } else {
        fs::write(&dest, text)?;
    }

    Ok(())
}

fn print_success(project: &str, template: Template, scaffold_here: bool) {
    println!(
        "Created refract project: {} ({} template)",
        project,
        template.name()
    );
    println!();
    println!("Next steps:");
    if !scaffold_here {
        println!("  cd {}", project);
    }
    if template == Template::React {
        println!("  npm install");
    }
    println!("  refract dev");
    println!();
    println!("Then start the app server in a second terminal:");
    println!("  cargo run");
    println!();
    println!("Visit http://localhost:3000 once both are running.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flag_values_map_to_templates() {
        assert_eq!(Template::parse("vanilla"), Template::Vanilla);
        assert_eq!(Template::parse("react"), Template::React);
        assert_eq!(Template::parse("anything-else"), Template::React);
    }

    #[test]
    fn react_template_materializes_a_project() {
        let tmp = TempDir::new().unwrap();
        extract_template(Template::React.contents(), tmp.path(), "demo-app").unwrap();

        let manifest = fs::read_to_string(tmp.path().join("refract.toml")).unwrap();
        assert!(manifest.contains(r#"name = "demo-app""#));

        let cargo = fs::read_to_string(tmp.path().join("Cargo.toml")).unwrap();
        assert!(cargo.contains(r#"name = "demo-app""#));

        assert!(tmp.path().join(".gitignore").is_file());
        assert!(tmp.path().join("src/main.rs").is_file());
        assert!(tmp.path().join("resources/js/app.jsx").is_file());
        assert!(tmp.path().join("resources/views/app.html").is_file());
    }

    #[test]
    fn no_template_suffixes_survive_extraction() {
        let tmp = TempDir::new().unwrap();
        extract_template(Template::Vanilla.contents(), tmp.path(), "plain").unwrap();

        let mut stack = vec![tmp.path().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let name = path.file_name().unwrap().to_string_lossy();
                    assert!(!name.ends_with(".tmpl"), "unexpanded template: {name}");
                    assert_ne!(name, "gitignore");
                }
            }
        }
    }

    #[test]
    fn explicit_names_resolve_to_their_final_component() {
        let (path, name) = resolve_target(Some("apps/storefront")).unwrap();
        assert_eq!(path, Path::new("apps/storefront"));
        assert_eq!(name, "storefront");
    }
}
