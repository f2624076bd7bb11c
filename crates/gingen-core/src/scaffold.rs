//! Instantiation of the embedded skeleton `.gin` template for `new`.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tera::{Context, Tera};
use tokio::fs;

use crate::error::Result;
use crate::util::title;

static SKELETON: &str = include_str!("templates/new_template.gin.tera");

/// `v1`, `v2`, ... version directory names.
static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^v\d+$").unwrap());

/// Render the skeleton template for `name` and write it to the chosen
/// location. Returns the path of the created file.
///
/// Without `output` the file lands as `<name>.gin` in the working directory;
/// an `output` ending in `.gin` is used verbatim; any other `output` is
/// treated as a directory, created if needed.
pub async fn create_template(name: &str, output: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let prefix = detect_version_prefix(cwd);

    let mut tera = Tera::default();
    tera.add_raw_template("new_template.gin.tera", SKELETON)?;
    tera.autoescape_on(vec![]);

    let mut ctx = Context::new();
    ctx.insert("name", &name.to_lowercase());
    ctx.insert("name_title", &title(name));
    ctx.insert("service_name", &format!("{}Service", title(name)));
    ctx.insert("prefix", &prefix);
    ctx.insert("package_name", &prefix);
    ctx.insert("output_dir", ".");
    let content = tera.render("new_template.gin.tera", &ctx)?;

    let target = match output {
        None => cwd.join(format!("{name}.gin")),
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            };
            if path.extension().is_some_and(|ext| ext == "gin") {
                path
            } else {
                fs::create_dir_all(&path).await?;
                path.join(format!("{name}.gin"))
            }
        }
    };

    fs::write(&target, content).await?;
    Ok(target)
}

/// Infer the version prefix from the working directory: a final component of
/// the form `v<digits>`, or the same on its parent, else `v1`.
fn detect_version_prefix(cwd: &Path) -> String {
    let component = |p: &Path| {
        p.file_name()
            .and_then(|n| n.to_str())
            .filter(|n| VERSION_RE.is_match(n))
            .map(str::to_string)
    };
    component(cwd)
        .or_else(|| cwd.parent().and_then(component))
        .unwrap_or_else(|| "v1".to_string())
}
