//! Path resolution for the emitter.
//!
//! Several heuristics (module name from `go.mod`, API path from the
//! `api/<x>/<y>` layout, project root for ancillary outputs) all converge on
//! one resolved-configuration record. It is computed once, from the parsed
//! options and an explicitly passed working directory; downstream code takes
//! the record, never the raw options.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::model::Options;
use crate::util::title;

const DEFAULT_MODULE_NAME: &str = "kratos-project";
const DEFAULT_SERVICE_DIR: &str = "internal/service";
const DEFAULT_MIDDLEWARE_DIR: &str = "internal/middleware";

/// Everything the emitter needs to know about where output goes and how
/// generated imports are spelled.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    /// Absolute directory receiving `types.go`, `service.go`, `handlers.go`.
    pub output_dir: PathBuf,
    /// Go module name read from the nearest `go.mod`.
    pub module_name: String,
    /// The `<x>` of an `api/<x>/<y>` layout.
    pub api_path: String,
    /// The `<y>` of an `api/<x>/<y>` layout, falling back to the template's
    /// `packageName` option.
    pub package_name: String,
    /// Import alias for the generated API package, e.g. `userV1`.
    pub package_alias: String,
    /// Root directory for ancillary outputs (service and middleware stubs).
    pub project_root: PathBuf,
    pub service_output_dir: PathBuf,
    pub middleware_output_dir: PathBuf,
}

/// Derive the resolved output configuration from parsed options and the
/// working directory.
pub fn resolve(options: &Options, cwd: &Path) -> ResolvedPaths {
    let raw = if options.output_dir.is_empty() {
        "."
    } else {
        options.output_dir.as_str()
    };

    let output_dir = if Path::new(raw).is_absolute() {
        lexical_clean(Path::new(raw))
    } else {
        lexical_clean(&cwd.join(raw))
    };

    let module_name =
        find_module_name(&output_dir).unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string());

    let (api_path, package_name) = infer_api_path_and_package(raw, cwd, &options.package_name);
    let package_alias = format!("{}{}", api_path, title(&package_name));

    let project_root = if raw == "." {
        find_go_mod_dir(cwd).unwrap_or_else(|| cwd.to_path_buf())
    } else {
        // Strip the `api/<x>/<y>` tail to get back to the project root.
        let stripped = strip_last_components(Path::new(raw), 3);
        if stripped.is_absolute() {
            stripped
        } else {
            lexical_clean(&cwd.join(stripped))
        }
    };

    let service_dir = non_empty(&options.service_output_dir, DEFAULT_SERVICE_DIR);
    let middleware_dir = non_empty(&options.middleware_output_dir, DEFAULT_MIDDLEWARE_DIR);

    ResolvedPaths {
        service_output_dir: join_rooted(&project_root, service_dir),
        middleware_output_dir: join_rooted(&project_root, middleware_dir),
        output_dir,
        module_name,
        api_path,
        package_name,
        package_alias,
        project_root,
    }
}

fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Drop up to `n` trailing components, bottoming out at `.`.
fn strip_last_components(path: &Path, n: usize) -> PathBuf {
    let mut out = path.to_path_buf();
    for _ in 0..n {
        if !out.pop() {
            break;
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

fn join_rooted(root: &Path, dir: &str) -> PathBuf {
    let dir = Path::new(dir);
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        lexical_clean(&root.join(dir))
    }
}

/// Normalise `.` and `..` components without touching the filesystem.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Walk parents from `start` looking for a `go.mod`; return the module name
/// from its `module ` line.
fn find_module_name(start: &Path) -> Option<String> {
    let dir = find_go_mod_dir(start)?;
    let content = fs::read_to_string(dir.join("go.mod")).ok()?;
    content.lines().find_map(|line| {
        line.trim()
            .strip_prefix("module ")
            .map(|rest| rest.trim().to_string())
    })
}

/// Walk parents from `start` until a directory containing `go.mod` is found.
fn find_go_mod_dir(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join("go.mod").is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// Infer `(api_path, package_name)` from the output directory or, when the
/// output directory is `.`, from the working directory's components.
fn infer_api_path_and_package(raw: &str, cwd: &Path, package_name: &str) -> (String, String) {
    if raw == "." {
        let parts: Vec<String> = normal_components(cwd);
        for (i, part) in parts.iter().enumerate() {
            if part == "api" && i + 2 < parts.len() {
                return (parts[i + 1].clone(), parts[i + 2].clone());
            }
        }
        return (package_name.to_string(), package_name.to_string());
    }

    let parts: Vec<String> = normal_components(Path::new(raw));
    if parts.len() >= 3 && parts[0] == "api" {
        (parts[1].clone(), parts[2].clone())
    } else {
        (package_name.to_string(), package_name.to_string())
    }
}

fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn options(output_dir: &str, package_name: &str) -> Options {
        Options {
            output_dir: output_dir.to_string(),
            package_name: package_name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_relative_output_dir_against_cwd() {
        let dir = tempdir().unwrap();
        let resolved = resolve(&options("./out", "v1"), dir.path());
        assert_eq!(resolved.output_dir, dir.path().join("out"));
    }

    #[test]
    fn empty_output_dir_means_cwd() {
        let dir = tempdir().unwrap();
        let resolved = resolve(&options("", "v1"), dir.path());
        assert_eq!(resolved.output_dir, dir.path());
    }

    #[test]
    fn module_name_is_read_from_nearest_go_mod() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("go.mod"),
            "module github.com/acme/shop\n\ngo 1.22\n",
        )
        .unwrap();
        let resolved = resolve(&options("api/user/v1", "v1"), dir.path());
        assert_eq!(resolved.module_name, "github.com/acme/shop");
    }

    #[test]
    fn missing_go_mod_falls_back_to_default_module() {
        let dir = tempdir().unwrap();
        let resolved = resolve(&options("api/user/v1", "v1"), dir.path());
        assert_eq!(resolved.module_name, "kratos-project");
    }

    #[test]
    fn api_layout_is_inferred_from_output_dir() {
        let dir = tempdir().unwrap();
        let resolved = resolve(&options("api/product/v2", "v1"), dir.path());
        assert_eq!(resolved.api_path, "product");
        assert_eq!(resolved.package_name, "v2");
        assert_eq!(resolved.package_alias, "productV2");
        assert_eq!(resolved.project_root, dir.path());
    }

    #[test]
    fn api_layout_is_inferred_from_cwd_when_output_is_dot() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("api/order/v3");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("go.mod"), "module example\n").unwrap();
        let resolved = resolve(&options(".", "v1"), &nested);
        assert_eq!(resolved.api_path, "order");
        assert_eq!(resolved.package_name, "v3");
        assert_eq!(resolved.package_alias, "orderV3");
        // Project root comes from the go.mod walk.
        assert_eq!(resolved.project_root, dir.path());
    }

    #[test]
    fn heuristic_failure_falls_back_to_package_name() {
        let dir = tempdir().unwrap();
        let resolved = resolve(&options("./out", "v1"), dir.path());
        assert_eq!(resolved.api_path, "v1");
        assert_eq!(resolved.package_name, "v1");
        assert_eq!(resolved.package_alias, "v1V1");
    }

    #[test]
    fn shallow_output_dir_keeps_project_root_at_cwd() {
        let dir = tempdir().unwrap();
        let resolved = resolve(&options("./out", "v1"), dir.path());
        assert_eq!(resolved.project_root, dir.path());
    }

    #[test]
    fn ancillary_dirs_default_under_project_root() {
        let dir = tempdir().unwrap();
        let resolved = resolve(&options("api/user/v1", "v1"), dir.path());
        assert_eq!(
            resolved.service_output_dir,
            dir.path().join("internal/service")
        );
        assert_eq!(
            resolved.middleware_output_dir,
            dir.path().join("internal/middleware")
        );
    }

    #[test]
    fn explicit_ancillary_dirs_are_respected() {
        let dir = tempdir().unwrap();
        let mut opts = options("api/user/v1", "v1");
        opts.service_output_dir = "app/service".to_string();
        opts.middleware_output_dir = "app/middleware".to_string();
        let resolved = resolve(&opts, dir.path());
        assert_eq!(resolved.service_output_dir, dir.path().join("app/service"));
        assert_eq!(
            resolved.middleware_output_dir,
            dir.path().join("app/middleware")
        );
    }
}
