//! Route registration emission.
//!
//! Produces the pre-indented body of each generated `RegisterRoutes` method.
//! Prefix composition, middleware ordering, and the service-level /
//! group-level dedup rule all live here, away from the template text.

use crate::model::{Method, RouteGroup, Service};
use crate::util::title;

/// Registration lines for a service: optional prefix group, service-level
/// middleware, top-level methods, then each route group with its filtered
/// middleware and per-method chains.
pub(crate) fn service_route_lines(service: &Service) -> Vec<String> {
    let mut lines = Vec::new();

    let (root, indent) = if service.prefix.is_empty() {
        ("r", "\t")
    } else {
        lines.push(format!("\tPrefixGroup := r.Group(\"/{}\")", service.prefix));
        lines.push("\t{".to_string());
        ("PrefixGroup", "\t\t")
    };

    for mw in &service.middleware {
        lines.push(format!("{indent}{root}.Use(h.middleware.{}())", title(mw)));
    }

    for method in &service.methods {
        lines.push(format!(
            "{indent}{root}.{}(\"{}\", h.{})",
            method.http_method,
            method.path,
            title(&method.name)
        ));
    }

    for group in &service.route_groups {
        let var = format!("{}Group", title(&group.name));
        lines.push(String::new());
        lines.push(format!("{indent}{var} := {root}.Group(\"{}\")", group.path));
        lines.push(format!("{indent}{{"));

        // Middleware already applied at service level is not re-applied.
        for mw in group
            .middleware
            .iter()
            .filter(|mw| !service.middleware.contains(mw))
        {
            lines.push(format!("{indent}\t{var}.Use(h.middleware.{}())", title(mw)));
        }

        for method in &group.methods {
            lines.push(format!(
                "{indent}\t{var}.{}(\"{}\", {}h.{})",
                method.http_method,
                method.path,
                method_chain(method, &service.middleware),
                title(&method.name)
            ));
        }

        lines.push(format!("{indent}}}"));
    }

    if !service.prefix.is_empty() {
        lines.push("\t}".to_string());
    }

    lines
}

/// Registration lines for a free-standing route group.
pub(crate) fn group_route_lines(group: &RouteGroup) -> Vec<String> {
    let var = format!("{}Group", title(&group.name));
    let mut lines = vec![
        format!("\t{var} := r.Group(\"{}\")", group.path),
        "\t{".to_string(),
    ];

    for mw in &group.middleware {
        lines.push(format!("\t\t{var}.Use(h.middleware.{}())", title(mw)));
    }

    for method in &group.methods {
        lines.push(format!(
            "\t\t{var}.{}(\"{}\", {}h.{})",
            method.http_method,
            method.path,
            method_chain(method, &[]),
            title(&method.name)
        ));
    }

    lines.push("\t}".to_string());
    lines
}

/// Registration lines for standalone routes, mounted on the engine root.
pub(crate) fn standalone_route_lines(methods: &[Method]) -> Vec<String> {
    methods
        .iter()
        .map(|m| format!("\tr.{}(\"{}\", h.{})", m.http_method, m.path, title(&m.name)))
        .collect()
}

/// The per-method middleware call chain, minus anything already applied at
/// service level.
fn method_chain(method: &Method, applied: &[String]) -> String {
    method
        .middleware
        .iter()
        .filter(|mw| !applied.contains(mw))
        .map(|mw| format!("h.middleware.{}(), ", title(mw)))
        .collect()
}
