//! Canonical reformatter for `.gin` files.
//!
//! An aesthetic pass only: it re-indents blocks, normalises the space before
//! `{` and `(`, collapses runs of blank lines, and guarantees a single
//! trailing newline. The parse result of a formatted file is identical to
//! that of the original.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;

/// Which block the formatter is currently inside.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Top,
    Options,
    Type,
    TypeGroup,
    Service,
    /// A route group nested in a service.
    Group,
}

/// Rewrite a `.gin` file in canonical form, with a backup/rollback
/// discipline: the original is saved to `<path>.bak`, restored on any write
/// failure, and the backup is removed on every exit path.
pub async fn format_file(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path).await?;
    let backup = backup_path(path);
    fs::write(&backup, &content).await?;

    let formatted = format_content(&content);
    match fs::write(path, formatted).await {
        Ok(()) => {
            fs::remove_file(&backup).await?;
            Ok(())
        }
        Err(err) => {
            // Best effort restore; the original content is still in the
            // backup if even that fails.
            let _ = fs::copy(&backup, path).await;
            let _ = fs::remove_file(&backup).await;
            Err(err.into())
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

/// Canonicalise template text. Pure and idempotent.
pub fn format_content(content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut state = State::Top;

    for raw in content.lines() {
        let line = raw.trim();

        if line.is_empty() || line.starts_with("//") {
            out.push(raw.to_string());
            continue;
        }

        // A fresh header ends an unterminated type group.
        if state == State::TypeGroup
            && (line.starts_with("service ") || line.starts_with("group ") || line.starts_with("type "))
        {
            state = State::Top;
        }

        match state {
            State::Options => {
                if line == "}" {
                    state = State::Top;
                    out.push("}".to_string());
                } else {
                    out.push(format!("\t{}", format_options_line(line)));
                }
            }
            State::Type => {
                if line == "}" {
                    state = State::Top;
                    out.push("}".to_string());
                } else {
                    out.push(format!("\t{line}"));
                }
            }
            State::TypeGroup => {
                if line == ")" {
                    state = State::Top;
                    out.push(")".to_string());
                } else if line == "})" {
                    state = State::Top;
                    out.push("\t}".to_string());
                    out.push(")".to_string());
                } else if line == "}" {
                    out.push("\t}".to_string());
                } else if line.contains('{') {
                    out.push(format!("\t{}", space_before_brace(line)));
                } else {
                    out.push(format!("\t\t{line}"));
                }
            }
            State::Group => {
                if line == "}" {
                    state = State::Service;
                    out.push("\t}".to_string());
                } else {
                    out.push(format!("\t\t{line}"));
                }
            }
            State::Service => {
                if line.starts_with("group ") {
                    state = State::Group;
                    out.push(String::new());
                    out.push(format!("\t{}", space_before_brace(line)));
                } else if line == "}" {
                    state = State::Top;
                    out.push("}".to_string());
                } else {
                    out.push(format!("\t{line}"));
                }
            }
            State::Top => {
                if line.starts_with("options") {
                    state = State::Options;
                    out.push(ensure_open_brace(line));
                } else if line.starts_with("type ") || line.starts_with("type(") {
                    if line.contains('(') {
                        state = State::TypeGroup;
                        out.push(String::new());
                        push_type_group_header(&mut out, line);
                    } else {
                        state = State::Type;
                        out.push(String::new());
                        out.push(space_before_brace(line));
                    }
                } else if line.starts_with("service ") {
                    state = State::Service;
                    out.push(String::new());
                    out.push(space_before_brace(line));
                } else {
                    // Free-standing groups and anything unrecognised pass
                    // through verbatim.
                    out.push(raw.to_string());
                }
            }
        }
    }

    collapse_blank_lines(&out)
}

/// Put exactly one space before the first `{` of a header line.
fn space_before_brace(line: &str) -> String {
    if line.contains('{') && !line.contains(" {") {
        line.replacen('{', " {", 1)
    } else {
        line.to_string()
    }
}

/// Put exactly one space before the first `(` of a type group header.
fn space_before_paren(line: &str) -> String {
    if line.contains('(') && !line.contains(" (") {
        line.replacen('(', " (", 1)
    } else {
        line.to_string()
    }
}

/// `options` headers always end with ` {`, even when the brace was on the
/// next line in the input.
fn ensure_open_brace(line: &str) -> String {
    let mut line = space_before_brace(line);
    if !line.ends_with('{') {
        line.push_str(" {");
    }
    line
}

/// Emit a `type (` header, splitting any same-line type name onto its own
/// indented line.
fn push_type_group_header(out: &mut Vec<String>, line: &str) {
    let line = space_before_paren(line);
    match line.split_once('(') {
        Some((head, rest)) if !rest.trim().is_empty() => {
            out.push(format!("{head}("));
            let rest = rest.trim();
            if rest.contains('{') {
                let rest = space_before_brace(rest);
                match rest.split_once(" {") {
                    Some((name, _)) => out.push(format!("\t{name} {{")),
                    None => out.push(format!("\t{rest}")),
                }
            } else {
                out.push(format!("\t{rest}"));
            }
        }
        _ => out.push(line),
    }
}

/// Normalise `key: value` spacing inside options blocks.
fn format_options_line(line: &str) -> String {
    if let Some((key, value)) = line.split_once(':') {
        if !value.contains(':') {
            return format!("{}: {}", key.trim(), value.trim());
        }
    }
    line.to_string()
}

/// Collapse runs of blank lines to a single blank, drop leading/trailing
/// blanks, and end with exactly one newline.
fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut pending_blank = false;
    let mut started = false;

    for line in lines {
        if line.trim().is_empty() {
            pending_blank = started;
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
        started = true;
    }

    out
}
