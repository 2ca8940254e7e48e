//! Small helpers over `quick_xml` shared by the workbook and sheet readers.

use super::error::WorkbookError;
use quick_xml::escape::escape;
use quick_xml::events::BytesStart;
use std::borrow::Cow;
use std::fmt::Write as _;

/// Looks up an attribute by local name, ignoring any namespace prefix
/// (`r:id` and `id` both match `b"id"`).
pub(crate) fn attr(
    part: &str,
    element: &BytesStart<'_>,
    local_name: &[u8],
) -> Result<Option<String>, WorkbookError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| WorkbookError::xml(part, e))?;
        if attribute.key.local_name().as_ref() == local_name {
            let value = attribute
                .unescape_value()
                .map_err(|e| WorkbookError::xml(part, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// All attributes of an element as `(qualified name, unescaped value)` pairs.
pub(crate) fn attrs(
    part: &str,
    element: &BytesStart<'_>,
) -> Result<Vec<(String, String)>, WorkbookError> {
    element
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(|e| WorkbookError::xml(part, e))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| WorkbookError::xml(part, e))?;
            Ok((key, value.into_owned()))
        })
        .collect()
}

/// Escapes text for use in element content or a double-quoted attribute.
pub(crate) fn esc(text: &str) -> Cow<'_, str> {
    escape(text)
}

/// Encodes cell text for `<t>` and `<v>` content.
///
/// Control characters XML 1.0 cannot carry become `_xHHHH_` and a literal
/// `_x` becomes `_x005F_x`, so [`decode_text`] restores the exact input.
/// Markup characters are escaped as well.
pub(crate) fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '_' if chars.peek() == Some(&'x') => out.push_str("_x005F_"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "_x{:04X}_", c as u32);
            }
            c => out.push(c),
        }
    }
    esc(&out).into_owned()
}

/// Reverses the `_xHHHH_` escapes written by spreadsheet applications.
/// Sequences that do not name a valid character are kept as they are.
pub(crate) fn decode_text(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find("_x") {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        match escaped_char(tail) {
            Some(c) => {
                out.push(c);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// `_x001D_...` -> U+001D; `tail` starts with `_x`.
fn escaped_char(tail: &str) -> Option<char> {
    if tail.as_bytes().get(6) != Some(&b'_') {
        return None;
    }
    let hex = tail.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Resolves a relationship target against the directory of its source part.
///
/// `base_dir` is e.g. `xl`; absolute targets (`/xl/worksheets/sheet1.xml`)
/// are taken from the package root.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if base_dir.is_empty() => target.to_string(),
        None => format!("{}/{}", base_dir, target),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Directory part of a part name (`xl/workbook.xml` -> `xl`).
pub(crate) fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Relationship part for a given source part
/// (`xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`).
pub(crate) fn rels_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}
