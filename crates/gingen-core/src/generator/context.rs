//! Typed contexts handed to the emission templates.
//!
//! Everything irregular (case folding, middleware dedup, route registration)
//! is computed here once; the templates only substitute and loop.

use serde::Serialize;

use crate::model::{GinTemplate, Method, RouteGroup, Service};
use crate::resolver::ResolvedPaths;
use crate::util::{camel, push_unique, title};

use super::routes;

#[derive(Serialize)]
pub(crate) struct InfoCtx {
    title: String,
    version: String,
    desc: String,
}

#[derive(Serialize)]
pub(crate) struct TypesCtx {
    package_name: String,
    info: InfoCtx,
    types: Vec<TypeCtx>,
}

#[derive(Serialize)]
struct TypeCtx {
    name: String,
    fields: Vec<FieldCtx>,
}

#[derive(Serialize)]
struct FieldCtx {
    name: String,
    go_type: String,
    tag: String,
    comment: String,
}

#[derive(Serialize)]
pub(crate) struct ServiceFileCtx {
    package_name: String,
    has_interfaces: bool,
    services: Vec<IfaceCtx>,
    groups: Vec<IfaceCtx>,
    standalone: Option<IfaceCtx>,
}

#[derive(Serialize)]
struct IfaceCtx {
    name: String,
    methods: Vec<SigCtx>,
}

#[derive(Serialize)]
pub(crate) struct SigCtx {
    name: String,
    request: String,
    response: String,
    description: String,
}

#[derive(Serialize)]
pub(crate) struct HandlersCtx {
    package_name: String,
    has_handlers: bool,
    has_middleware_ops: bool,
    middleware_ops: Vec<String>,
    services: Vec<ServiceHandlerCtx>,
    groups: Vec<GroupHandlerCtx>,
    standalone: Option<StandaloneCtx>,
}

#[derive(Serialize)]
struct ServiceHandlerCtx {
    name: String,
    handler_name: String,
    field_name: String,
    has_middleware: bool,
    register_lines: Vec<String>,
    methods: Vec<HandlerMethodCtx>,
}

#[derive(Serialize)]
struct GroupHandlerCtx {
    handler_name: String,
    service_name: String,
    field_name: String,
    path: String,
    has_middleware: bool,
    register_lines: Vec<String>,
    methods: Vec<HandlerMethodCtx>,
}

#[derive(Serialize)]
struct StandaloneCtx {
    register_lines: Vec<String>,
    methods: Vec<HandlerMethodCtx>,
}

#[derive(Serialize)]
struct HandlerMethodCtx {
    name: String,
    description: String,
    request: String,
    with_gin_context: bool,
}

#[derive(Serialize)]
pub(crate) struct GinutilCtx {
    package_name: String,
}

#[derive(Serialize)]
pub(crate) struct ServiceImplCtx {
    package_alias: String,
    import_path: String,
    name: String,
    methods: Vec<SigCtx>,
}

#[derive(Serialize)]
pub(crate) struct MiddlewareImplCtx {
    package_alias: String,
    import_path: String,
    struct_name: String,
    ops: Vec<String>,
}

pub(crate) fn types_context(template: &GinTemplate, paths: &ResolvedPaths) -> TypesCtx {
    TypesCtx {
        package_name: paths.package_name.clone(),
        info: InfoCtx {
            title: template.info.title.clone(),
            version: template.info.version.clone(),
            desc: template.info.desc.clone(),
        },
        types: template
            .types
            .iter()
            .map(|t| TypeCtx {
                name: t.name.clone(),
                fields: t
                    .fields
                    .iter()
                    .map(|f| FieldCtx {
                        name: title(&f.name),
                        go_type: f.go_type.clone(),
                        tag: f.tag.clone(),
                        comment: f.comment.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn service_file_context(template: &GinTemplate, paths: &ResolvedPaths) -> ServiceFileCtx {
    let services: Vec<IfaceCtx> = template
        .services
        .iter()
        .map(|s| IfaceCtx {
            name: s.name.clone(),
            methods: s.all_methods().map(signature).collect(),
        })
        .collect();
    let groups: Vec<IfaceCtx> = template
        .route_groups
        .iter()
        .map(|g| IfaceCtx {
            name: group_service_name(g),
            methods: g.methods.iter().map(signature).collect(),
        })
        .collect();
    let standalone = if template.standalone_routes.is_empty() {
        None
    } else {
        Some(IfaceCtx {
            name: "StandaloneService".to_string(),
            methods: template.standalone_routes.iter().map(signature).collect(),
        })
    };

    ServiceFileCtx {
        package_name: paths.package_name.clone(),
        has_interfaces: !services.is_empty() || !groups.is_empty() || standalone.is_some(),
        services,
        groups,
        standalone,
    }
}

pub(crate) fn handlers_context(template: &GinTemplate, paths: &ResolvedPaths) -> HandlersCtx {
    let middleware_ops = middleware_ops(template);
    let global_ctx = template.options.with_gin_context;

    let services: Vec<ServiceHandlerCtx> = template
        .services
        .iter()
        .map(|s| ServiceHandlerCtx {
            name: s.name.clone(),
            handler_name: format!("{}Handler", s.name),
            field_name: camel(&s.name),
            has_middleware: !s.middleware_union().is_empty(),
            register_lines: routes::service_route_lines(s),
            methods: s
                .all_methods()
                .map(|m| handler_method(m, global_ctx))
                .collect(),
        })
        .collect();

    let groups: Vec<GroupHandlerCtx> = template
        .route_groups
        .iter()
        .map(|g| GroupHandlerCtx {
            handler_name: format!("{}Handler", title(&g.name)),
            service_name: group_service_name(g),
            field_name: camel(&g.name),
            path: g.path.clone(),
            has_middleware: !g.middleware_union().is_empty(),
            register_lines: routes::group_route_lines(g),
            methods: g
                .methods
                .iter()
                .map(|m| handler_method(m, global_ctx))
                .collect(),
        })
        .collect();

    let standalone = if template.standalone_routes.is_empty() {
        None
    } else {
        Some(StandaloneCtx {
            register_lines: routes::standalone_route_lines(&template.standalone_routes),
            methods: template
                .standalone_routes
                .iter()
                .map(|m| handler_method(m, global_ctx))
                .collect(),
        })
    };

    HandlersCtx {
        package_name: paths.package_name.clone(),
        has_handlers: !services.is_empty() || !groups.is_empty() || standalone.is_some(),
        has_middleware_ops: !middleware_ops.is_empty(),
        middleware_ops,
        services,
        groups,
        standalone,
    }
}

pub(crate) fn ginutil_context(paths: &ResolvedPaths) -> GinutilCtx {
    GinutilCtx {
        package_name: paths.package_name.clone(),
    }
}

pub(crate) fn service_impl_context(service: &Service, paths: &ResolvedPaths) -> ServiceImplCtx {
    ServiceImplCtx {
        package_alias: paths.package_alias.clone(),
        import_path: api_import_path(paths),
        name: service.name.clone(),
        methods: service.all_methods().map(signature).collect(),
    }
}

pub(crate) fn middleware_impl_context(
    paths: &ResolvedPaths,
    struct_name: String,
    ops: Vec<String>,
) -> MiddlewareImplCtx {
    MiddlewareImplCtx {
        package_alias: paths.package_alias.clone(),
        import_path: api_import_path(paths),
        struct_name,
        ops,
    }
}

/// The capability set the host must implement: every middleware identifier in
/// the template, Title-cased, first occurrence first.
pub(crate) fn middleware_ops(template: &GinTemplate) -> Vec<String> {
    let mut ops = Vec::new();
    for name in template.middleware_union() {
        push_unique(&mut ops, &title(&name));
    }
    ops
}

fn api_import_path(paths: &ResolvedPaths) -> String {
    format!(
        "{}/api/{}/{}",
        paths.module_name, paths.api_path, paths.package_name
    )
}

fn group_service_name(group: &RouteGroup) -> String {
    format!("{}Service", title(&group.name))
}

fn signature(method: &Method) -> SigCtx {
    SigCtx {
        name: title(&method.name),
        request: method.request.clone(),
        response: method.response.clone(),
        description: method.description.clone(),
    }
}

fn handler_method(method: &Method, global_ctx: bool) -> HandlerMethodCtx {
    HandlerMethodCtx {
        name: title(&method.name),
        description: method.description.clone(),
        request: method.request.clone(),
        with_gin_context: global_ctx || method.with_gin_context,
    }
}
