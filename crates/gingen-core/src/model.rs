//! The parsed API model for `.gin` templates.
//!
//! A [`GinTemplate`] is the aggregate the parser produces and the emitter
//! consumes. Services, route groups, and standalone routes form an owned
//! tree; the emitter only borrows it. Declaration order is preserved for
//! every collection in the model.

use crate::util::push_unique;

/// The parsed `.gin` template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GinTemplate {
    pub info: Info,
    pub options: Options,
    pub types: Vec<TypeDef>,
    pub services: Vec<Service>,
    /// Route groups declared outside any service.
    pub route_groups: Vec<RouteGroup>,
    /// `@method` routes declared outside any service or group.
    pub standalone_routes: Vec<Method>,
}

/// API metadata; passed through to the emitted file headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub desc: String,
}

/// Emitter configuration declared in the template's `options` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    /// Global default for per-method gin-context propagation.
    pub with_gin_context: bool,
    pub output_dir: String,
    pub package_name: String,
    pub service_output_dir: String,
    pub generate_service: bool,
    pub middleware_output_dir: String,
    pub generate_middleware: bool,
}

/// A single struct-like type definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub fields: Vec<Field>,
}

/// One field of a type definition. Name and type are opaque strings passed
/// through to the output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    pub name: String,
    pub go_type: String,
    /// Raw struct tag, without the surrounding backticks.
    pub tag: String,
    pub comment: String,
    /// Derived: the tag contains `required`.
    pub required: bool,
}

/// A named collection of HTTP endpoints sharing an optional URL prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    pub name: String,
    /// Optional first URL segment, e.g. `v1`. Empty means none.
    pub prefix: String,
    pub middleware: Vec<String>,
    /// Methods declared directly under the service, excluding group methods.
    pub methods: Vec<Method>,
    pub route_groups: Vec<RouteGroup>,
}

/// A route group nested under a service or free-standing at top level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteGroup {
    pub name: String,
    pub path: String,
    pub middleware: Vec<String>,
    pub methods: Vec<Method>,
}

/// One HTTP endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Method {
    pub name: String,
    /// Normalised to uppercase at parse time.
    pub http_method: String,
    /// Stored verbatim.
    pub path: String,
    pub request: String,
    pub response: String,
    pub description: String,
    pub with_gin_context: bool,
    pub middleware: Vec<String>,
}

impl Service {
    /// All methods of the service in declaration order: top-level methods
    /// first, then each group's methods.
    pub fn all_methods(&self) -> impl Iterator<Item = &Method> {
        self.methods
            .iter()
            .chain(self.route_groups.iter().flat_map(|g| g.methods.iter()))
    }

    /// Ordered union of every middleware identifier referenced in the
    /// service: service-level, per-method, group-level, and group-method.
    /// First occurrence wins.
    pub fn middleware_union(&self) -> Vec<String> {
        let mut union = Vec::new();
        for mw in &self.middleware {
            push_unique(&mut union, mw);
        }
        for method in &self.methods {
            for mw in &method.middleware {
                push_unique(&mut union, mw);
            }
        }
        for group in &self.route_groups {
            for mw in &group.middleware {
                push_unique(&mut union, mw);
            }
            for method in &group.methods {
                for mw in &method.middleware {
                    push_unique(&mut union, mw);
                }
            }
        }
        union
    }
}

impl RouteGroup {
    /// Ordered union of group-level and per-method middleware identifiers.
    pub fn middleware_union(&self) -> Vec<String> {
        let mut union = Vec::new();
        for mw in &self.middleware {
            push_unique(&mut union, mw);
        }
        for method in &self.methods {
            for mw in &method.middleware {
                push_unique(&mut union, mw);
            }
        }
        union
    }
}

impl GinTemplate {
    /// Ordered union of every middleware identifier referenced anywhere in
    /// the template.
    pub fn middleware_union(&self) -> Vec<String> {
        let mut union = Vec::new();
        for service in &self.services {
            for mw in service.middleware_union() {
                push_unique(&mut union, &mw);
            }
        }
        for group in &self.route_groups {
            for mw in group.middleware_union() {
                push_unique(&mut union, &mw);
            }
        }
        for method in &self.standalone_routes {
            for mw in &method.middleware {
                push_unique(&mut union, mw);
            }
        }
        union
    }

    /// Whether any method propagates the gin context, honouring the global
    /// option as a default.
    pub fn uses_gin_context(&self) -> bool {
        let any_method = self
            .services
            .iter()
            .flat_map(|s| s.all_methods())
            .chain(self.route_groups.iter().flat_map(|g| g.methods.iter()))
            .chain(self.standalone_routes.iter());
        let mut any_method = any_method.peekable();
        if any_method.peek().is_none() {
            return false;
        }
        self.options.with_gin_context || any_method.any(|m| m.with_gin_context)
    }
}
