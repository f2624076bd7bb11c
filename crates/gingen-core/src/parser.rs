//! Line-oriented parser for `.gin` API template files.
//!
//! The grammar is line-based: every logical line begins with a keyword or an
//! `@` marker, blocks open with `{` on the header line (`(` for type groups)
//! and close with a line holding the matching delimiter. Parsing is a single
//! forward scan that tracks the innermost open scope; lines matching no rule
//! are skipped, which keeps old generators compatible with newer template
//! files.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Field, GinTemplate, Info, Method, Options, RouteGroup, Service, TypeDef};
use crate::util::trim_quotes;

/// `name type `tag`` with an optional trailing `// comment`. The type token
/// accepts slices, maps, pointers and qualified names.
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w+)\s+([\w\[\]{}.,*]+)\s+`([^`]*)`\s*(?://\s*(.*))?").unwrap()
});

/// Method line carrying the `WithGinContext` marker between path and request.
static METHOD_WITH_CTX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@([A-Za-z_]\w*)\s+(\w+)\s+(\S+)\s+WithGinContext\s+(\w+)\s+(\w+)\s*(?://\s*(.*))?")
        .unwrap()
});

/// Plain method line: `@name verb path request response [// description]`.
static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@([A-Za-z_]\w*)\s+(\w+)\s+(\S+)\s+(\w+)\s+(\w+)\s*(?://\s*(.*))?").unwrap()
});

/// In-line middleware list on a method line.
static MIDDLEWARE_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"middleware:\s*\[([^\]]*)\]").unwrap());

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").unwrap());

/// Which collection the currently open route group lives in.
#[derive(Clone, Copy)]
enum GroupSlot {
    /// `(service index, group index)` for groups nested under a service.
    Nested(usize, usize),
    /// Index into the template's free-standing groups.
    Free(usize),
}

/// Parse the textual `.gin` DSL into a [`GinTemplate`].
pub fn parse_gin_template(content: &str) -> Result<GinTemplate> {
    let lines: Vec<&str> = content.lines().collect();
    let mut template = GinTemplate::default();

    let mut current_service: Option<usize> = None;
    let mut current_group: Option<GroupSlot> = None;
    let mut current_type: Option<usize> = None;
    let mut in_type = false;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;

        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if line.starts_with("info") {
            parse_info_block(&lines, &mut i, &mut template.info);
            continue;
        }

        if line.starts_with("options") {
            parse_options_block(&lines, &mut i, &mut template.options);
            continue;
        }

        if line.starts_with("type ") || line.starts_with("type(") {
            if line.contains('(') {
                let rest = line.split_once('(').map_or("", |(_, r)| r.trim());
                parse_type_group(rest, &lines, &mut i, &mut template.types)?;
            } else {
                let rest = line.strip_prefix("type ").unwrap_or_default();
                template.types.push(TypeDef {
                    name: type_name_of(rest),
                    fields: Vec::new(),
                });
                current_type = Some(template.types.len() - 1);
                in_type = true;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("service ") {
            let (name, prefix) = parse_service_header(rest);
            template.services.push(Service {
                name,
                prefix,
                ..Default::default()
            });
            current_service = Some(template.services.len() - 1);
            current_group = None;
            current_type = None;
            in_type = false;
            continue;
        }

        if let Some(rest) = line.strip_prefix("group ") {
            let (name, path) = parse_group_header(rest);
            let group = RouteGroup {
                name,
                path,
                ..Default::default()
            };
            current_group = Some(match current_service {
                Some(si) => {
                    template.services[si].route_groups.push(group);
                    GroupSlot::Nested(si, template.services[si].route_groups.len() - 1)
                }
                None => {
                    template.route_groups.push(group);
                    GroupSlot::Free(template.route_groups.len() - 1)
                }
            });
            in_type = false;
            continue;
        }

        if line.starts_with('}') {
            // Close the innermost open scope.
            if current_group.is_some() {
                current_group = None;
            } else if in_type {
                in_type = false;
                current_type = None;
            } else if current_service.is_some() {
                current_service = None;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("middleware:") {
            let list = rest.trim().trim_matches(|c| c == '[' || c == ']');
            let parsed = parse_middleware_list(list);
            if let Some(slot) = current_group {
                group_mut(&mut template, slot).middleware.extend(parsed);
            } else if let Some(si) = current_service {
                template.services[si].middleware.extend(parsed);
            }
            continue;
        }

        if line.starts_with('@') {
            if current_service.is_none() && current_group.is_none() {
                template.standalone_routes.push(parse_method(line)?);
            } else if !in_type {
                let method = parse_method(line)?;
                if let Some(slot) = current_group {
                    group_mut(&mut template, slot).methods.push(method);
                } else if let Some(si) = current_service {
                    template.services[si].methods.push(method);
                }
            }
            continue;
        }

        if in_type && line.contains(' ') {
            if let Some(ti) = current_type {
                template.types[ti].fields.push(parse_field(line)?);
            }
            continue;
        }

        // Anything else is ignored: unknown keys and constructs stay
        // forward-compatible with newer template dialects.
    }

    Ok(template)
}

fn group_mut(template: &mut GinTemplate, slot: GroupSlot) -> &mut RouteGroup {
    match slot {
        GroupSlot::Nested(si, gi) => &mut template.services[si].route_groups[gi],
        GroupSlot::Free(gi) => &mut template.route_groups[gi],
    }
}

fn parse_info_block(lines: &[&str], i: &mut usize, info: &mut Info) {
    while *i < lines.len() {
        let line = lines[*i].trim();
        *i += 1;
        if line.starts_with('}') {
            break;
        }
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let Some((key, value)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "title" => info.title = value.to_string(),
            "version" => info.version = value.to_string(),
            "desc" => info.desc = value.to_string(),
            _ => {}
        }
    }
}

fn parse_options_block(lines: &[&str], i: &mut usize, options: &mut Options) {
    while *i < lines.len() {
        let line = lines[*i].trim();
        *i += 1;
        if line.starts_with('}') {
            break;
        }
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let Some((key, value)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        // Both `key: value` and the bare `outputDir` / `packageName` forms
        // are accepted.
        let key = key.trim().trim_end_matches(':');
        let value = value.trim().trim_matches('"');
        match key {
            "withGinContext" => options.with_gin_context = value == "true",
            "outputDir" => options.output_dir = value.to_string(),
            "packageName" => options.package_name = value.to_string(),
            "serviceOutputDir" => options.service_output_dir = value.to_string(),
            "generateService" => options.generate_service = value == "true",
            "middlewareOutputDir" => options.middleware_output_dir = value.to_string(),
            "generateMiddleware" => options.generate_middleware = value == "true",
            _ => {}
        }
    }
}

/// Parse a `type ( ... )` group, consuming lines up to the closing `)`.
///
/// `first` is any content that followed the `(` on the header line. An
/// unterminated group is reported but not fatal; the types captured so far
/// are retained.
fn parse_type_group<'a>(
    first: &'a str,
    lines: &[&'a str],
    i: &mut usize,
    types: &mut Vec<TypeDef>,
) -> Result<()> {
    let mut pending = Some(first).filter(|s| !s.is_empty());

    loop {
        let line = match pending.take() {
            Some(line) => line,
            None => {
                if *i >= lines.len() {
                    break;
                }
                let line = lines[*i].trim();
                *i += 1;
                line
            }
        };
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line == ")" {
            return Ok(());
        }
        if !line.contains('{') {
            continue;
        }

        let mut ty = TypeDef {
            name: type_name_of(line),
            fields: Vec::new(),
        };
        if !line.contains('}') {
            // Multi-line body: fields until the closing brace.
            while *i < lines.len() {
                let field_line = lines[*i].trim();
                *i += 1;
                if field_line.is_empty() || field_line.starts_with("//") {
                    continue;
                }
                if field_line.starts_with('}') {
                    break;
                }
                if field_line.contains(' ') {
                    ty.fields.push(parse_field(field_line)?);
                }
            }
        }
        types.push(ty);
    }

    log::warn!("unterminated type group: reached end of input before ')'");
    Ok(())
}

/// Extract the type name from a header like `UserReq {` or `Name struct {`.
fn type_name_of(s: &str) -> String {
    s.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c| c == '{' || c == '}')
        .to_string()
}

/// Split a service header such as `UserService prefix v1 {`.
fn parse_service_header(rest: &str) -> (String, String) {
    let trimmed = rest.trim().trim_matches(|c| c == '{' || c == '}').trim();
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    let name = parts.first().copied().unwrap_or_default().to_string();
    let prefix = if parts.len() >= 3 && parts[1] == "prefix" {
        parts[2].to_string()
    } else {
        String::new()
    };
    (name, prefix)
}

/// Split a group header such as `@admin /v1/admin {` or `/public {`.
///
/// Without an explicit `@name`, the name is derived from the path by removing
/// the leading `/` and deleting any remaining `/`.
fn parse_group_header(rest: &str) -> (String, String) {
    let trimmed = rest.trim().trim_matches(|c| c == '{' || c == '}').trim();
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts.as_slice() {
        [name, path, ..] => (name.trim_start_matches('@').to_string(), path.to_string()),
        [path] => (derive_group_name(path), path.to_string()),
        [] => (String::new(), String::new()),
    }
}

fn derive_group_name(path: &str) -> String {
    path.trim_start_matches('/').replace('/', "")
}

/// Parse a middleware list body (the part between `[` and `]`).
///
/// Each comma-separated element is stripped of a trailing `// ...` comment and
/// of surrounding quotes; anything that is not a bare identifier afterwards is
/// discarded.
fn parse_middleware_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|part| {
            let part = match part.find("//") {
                Some(idx) => &part[..idx],
                None => part,
            };
            trim_quotes(part.trim()).trim().to_string()
        })
        .filter(|part| IDENT_RE.is_match(part))
        .collect()
}

/// Parse a method or standalone-route line.
fn parse_method(line: &str) -> Result<Method> {
    let mut middleware = Vec::new();
    let mut stripped = line.to_string();
    if let Some(caps) = MIDDLEWARE_LIST_RE.captures(&stripped) {
        middleware = parse_middleware_list(caps.get(1).map_or("", |m| m.as_str()));
        stripped = MIDDLEWARE_LIST_RE.replace(&stripped, "").into_owned();
    }

    // The variant carrying `WithGinContext` must win: the plain pattern would
    // otherwise take the marker for the request type.
    if let Some(caps) = METHOD_WITH_CTX_RE.captures(&stripped) {
        return Ok(method_from_captures(&caps, true, middleware));
    }
    if let Some(caps) = METHOD_RE.captures(&stripped) {
        return Ok(method_from_captures(&caps, false, middleware));
    }

    Err(Error::syntax(format!("invalid method line: {line}")))
}

fn method_from_captures(
    caps: &regex::Captures<'_>,
    with_gin_context: bool,
    middleware: Vec<String>,
) -> Method {
    Method {
        name: caps[1].to_string(),
        http_method: caps[2].to_uppercase(),
        path: caps[3].to_string(),
        request: caps[4].to_string(),
        response: caps[5].to_string(),
        description: caps
            .get(6)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        with_gin_context,
        middleware,
    }
}

/// Parse a field line: `name type `tag` [// comment]`.
fn parse_field(line: &str) -> Result<Field> {
    let caps = FIELD_RE
        .captures(line)
        .ok_or_else(|| Error::syntax(format!("invalid field line: {line}")))?;
    let tag = caps[3].to_string();
    Ok(Field {
        name: caps[1].to_string(),
        go_type: caps[2].to_string(),
        required: tag.contains("required"),
        tag,
        comment: caps
            .get(4)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    })
}
