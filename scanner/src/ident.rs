#[cfg(test)]
mod tests;

use std::borrow::Cow;

/// Names that cannot be used verbatim as generated identifiers.
///
/// This is the list of Rust keywords plus the names the generated code uses
/// for its own items and locals.
const RESERVED: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield", "core", "interface",
    "listener", "new", "parser", "set_listener", "unset_listener",
];

/// Associated constants the generated proxies define themselves.
const RESERVED_CONSTS: &[&str] = &["INTERFACE"];

/// `wl_example` -> `WlExample`
pub fn upper_camel_case(s: &str) -> String {
    let mut last_was_underscore = true;
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' {
            last_was_underscore = true;
        } else {
            if last_was_underscore {
                res.extend(c.to_uppercase());
            } else {
                res.push(c);
            }
            last_was_underscore = false;
        }
    }
    if res.starts_with(|c: char| c.is_ascii_digit()) {
        res.insert(0, '_');
    }
    res
}

/// `invalid_name` -> `INVALID_NAME`, `interface` -> `INTERFACE_`
pub fn screaming_snake_case(s: &str) -> String {
    let s = s.to_ascii_uppercase();
    if RESERVED_CONSTS.contains(&s.as_str()) {
        return format!("{}_", s);
    }
    safe_ident(&s).into_owned()
}

/// Returns `s` unchanged unless it is reserved or starts with a digit.
///
/// Reserved names get a trailing `_`, names starting with a digit a leading
/// `_`: `interface` -> `interface_`, `90` -> `_90`.
pub fn safe_ident(s: &str) -> Cow<'_, str> {
    if RESERVED.contains(&s) {
        return Cow::Owned(format!("{}_", s));
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        return Cow::Owned(format!("_{}", s));
    }
    Cow::Borrowed(s)
}
