//! Keyword-only subset of Python's `str.format`.
//!
//! Templates written in YAML by dbt users (e.g. `/data/{name}.parquet`) were historically
//! expanded with `str.format`, so the brace grammar follows Python: `{{` and `}}` are
//! literal braces, `{field}` is substituted, `{field[0]}` indexes into the value,
//! `{field!r}` / `{field!s}` apply a conversion and `{field:>8.3}` applies a string format
//! spec. Positional fields, attribute access and nested replacement fields are rejected.

use crate::{ErrorCode, FsResult};

/// Substitutes `{key}` fields in `template` with the matching value from `kwargs`.
pub fn format_kwargs(template: &str, kwargs: &[(&str, &str)]) -> FsResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.next_if_eq(&'{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    match c {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(fs_err!(
                                ErrorCode::FmtError,
                                "Nested replacement fields are not supported in '{template}'"
                            ));
                        }
                        _ => field.push(c),
                    }
                }
                if !closed {
                    return Err(fs_err!(
                        ErrorCode::FmtError,
                        "Single '{{' encountered in format string '{template}'"
                    ));
                }
                out.push_str(&render_field(template, &field, kwargs)?);
            }
            '}' => {
                if chars.next_if_eq(&'}').is_none() {
                    return Err(fs_err!(
                        ErrorCode::FmtError,
                        "Single '}}' encountered in format string '{template}'"
                    ));
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

fn render_field(template: &str, field: &str, kwargs: &[(&str, &str)]) -> FsResult<String> {
    let (field_name, conversion, format_spec) = split_field(field);
    let value = resolve_field(template, field_name, kwargs)?;

    let converted = match conversion {
        None | Some("s") => value,
        Some("r") | Some("a") => py_repr(&value),
        Some(other) => {
            return Err(fs_err!(
                ErrorCode::FmtError,
                "Unknown conversion specifier '{other}' in '{template}'"
            ));
        }
    };

    match format_spec {
        None | Some("") => Ok(converted),
        Some(spec) => apply_format_spec(template, converted, spec),
    }
}

/// Splits `name[idx]!conv:spec`; `!` and `:` inside brackets belong to the name
fn split_field(field: &str) -> (&str, Option<&str>, Option<&str>) {
    let mut in_brackets = false;
    let name_end = field
        .char_indices()
        .find(|&(_, c)| match c {
            '[' => {
                in_brackets = true;
                false
            }
            ']' => {
                in_brackets = false;
                false
            }
            '!' | ':' => !in_brackets,
            _ => false,
        })
        .map(|(i, _)| i)
        .unwrap_or(field.len());

    let (name, rest) = field.split_at(name_end);
    if let Some(spec) = rest.strip_prefix(':') {
        (name, None, Some(spec))
    } else if let Some(rest) = rest.strip_prefix('!') {
        match rest.split_once(':') {
            Some((conversion, spec)) => (name, Some(conversion), Some(spec)),
            None => (name, Some(rest), None),
        }
    } else {
        (name, None, None)
    }
}

fn resolve_field(template: &str, field_name: &str, kwargs: &[(&str, &str)]) -> FsResult<String> {
    let arg_end = field_name.find(['.', '[']).unwrap_or(field_name.len());
    let (arg_name, mut accessors) = field_name.split_at(arg_end);

    if arg_name.is_empty() || arg_name.chars().all(|c| c.is_ascii_digit()) {
        return Err(fs_err!(
            ErrorCode::FmtError,
            "Positional replacement fields are not supported in '{template}'; use one of: {}",
            available(kwargs)
        ));
    }
    let Some((_, value)) = kwargs.iter().find(|(key, _)| *key == arg_name) else {
        return Err(fs_err!(
            ErrorCode::FmtError,
            "Unknown replacement field '{arg_name}' in '{template}'; use one of: {}",
            available(kwargs)
        ));
    };

    let mut value = value.to_string();
    while !accessors.is_empty() {
        let Some(rest) = accessors.strip_prefix('[') else {
            return Err(fs_err!(
                ErrorCode::FmtError,
                "Attribute access in replacement field '{field_name}' is not supported in '{template}'"
            ));
        };
        let Some((index, rest)) = rest.split_once(']') else {
            return Err(fs_err!(
                ErrorCode::FmtError,
                "Missing ']' in replacement field '{field_name}' in '{template}'"
            ));
        };
        if !rest.is_empty() && !rest.starts_with(['.', '[']) {
            return Err(fs_err!(
                ErrorCode::FmtError,
                "Only '.' or '[' may follow ']' in replacement field '{field_name}' in '{template}'"
            ));
        }
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            return Err(fs_err!(
                ErrorCode::FmtError,
                "String indices must be integers, got '{index}' in '{template}'"
            ));
        }
        value = index
            .parse::<usize>()
            .ok()
            .and_then(|index| value.chars().nth(index))
            .map(String::from)
            .ok_or_else(|| {
                fs_err!(
                    ErrorCode::FmtError,
                    "String index {index} out of range for '{value}' in '{template}'"
                )
            })?;
        accessors = rest;
    }

    Ok(value)
}

/// Applies a string format spec: `[[fill]align][0][width][.precision][s]`
fn apply_format_spec(template: &str, value: String, spec: &str) -> FsResult<String> {
    let invalid = |reason: &str| {
        fs_err!(
            ErrorCode::FmtError,
            "Invalid format spec '{spec}' in '{template}': {reason}"
        )
    };
    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');

    let chars: Vec<char> = spec.chars().collect();
    let mut pos = 0;
    let (mut fill, mut align) = (None, None);
    if chars.len() >= 2 && is_align(chars[1]) {
        fill = Some(chars[0]);
        align = Some(chars[1]);
        pos = 2;
    } else if chars.first().copied().is_some_and(is_align) {
        align = Some(chars[0]);
        pos = 1;
    }

    match chars.get(pos) {
        Some('+' | '-' | ' ') => return Err(invalid("sign not allowed for strings")),
        Some('z') => return Err(invalid("negative zero coercion not allowed for strings")),
        Some('#') => return Err(invalid("alternate form not allowed for strings")),
        Some('0') if fill.is_none() => {
            fill = Some('0');
            pos += 1;
        }
        _ => {}
    }

    let take_digits = |pos: &mut usize| -> Option<usize> {
        let start = *pos;
        while chars.get(*pos).is_some_and(char::is_ascii_digit) {
            *pos += 1;
        }
        chars[start..*pos].iter().collect::<String>().parse().ok()
    };

    let width = take_digits(&mut pos).unwrap_or(0);
    if matches!(chars.get(pos), Some(',' | '_')) {
        return Err(invalid("grouping not allowed for strings"));
    }
    let precision = if chars.get(pos) == Some(&'.') {
        pos += 1;
        Some(take_digits(&mut pos).ok_or_else(|| invalid("missing precision"))?)
    } else {
        None
    };
    match chars.get(pos) {
        None => {}
        Some('s') if pos + 1 == chars.len() => {}
        Some(code) if pos + 1 == chars.len() => {
            return Err(invalid(format!("unknown format code '{code}' for strings").as_str()));
        }
        Some(_) => return Err(invalid("unexpected trailing characters")),
    }
    if align == Some('=') {
        return Err(invalid("'=' alignment not allowed for strings"));
    }

    let value: String = match precision {
        Some(precision) => value.chars().take(precision).collect(),
        None => value,
    };
    let padding = width.saturating_sub(value.chars().count());
    if padding == 0 {
        return Ok(value);
    }
    let fill = fill.unwrap_or(' ');
    let pad = |n: usize| std::iter::repeat_n(fill, n).collect::<String>();
    Ok(match align.unwrap_or('<') {
        '>' => format!("{}{value}", pad(padding)),
        '^' => format!("{}{value}{}", pad(padding / 2), pad(padding - padding / 2)),
        _ => format!("{value}{}", pad(padding)),
    })
}

fn available(kwargs: &[(&str, &str)]) -> String {
    kwargs
        .iter()
        .map(|(key, _)| format!("{{{key}}}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Mirrors Python's `repr()` for strings
fn py_repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
