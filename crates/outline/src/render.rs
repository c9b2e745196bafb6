use serde::Serialize;

use crate::types::DocumentOutline;
use crate::OutlineError;

/// Serialise with four-space indentation. Non-ASCII text is written as-is.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, OutlineError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| OutlineError::Parse(e.to_string()))
}

/// Title on the first line, then one heading per line indented two spaces
/// per level below `H1`, with its page.
pub fn format_indented(outline: &DocumentOutline) -> String {
    let mut lines = vec![outline.title.clone()];
    lines.extend(outline.outline.iter().map(|entry| {
        let indent = "  ".repeat(usize::from(entry.level.as_u8()).saturating_sub(1));
        format!("{}{}  (p. {})", indent, entry.text.trim(), entry.page)
    }));
    lines.join("\n")
}

/// Title as a Markdown heading, followed by a nested bullet list.
pub fn format_markdown(outline: &DocumentOutline) -> String {
    let mut out = format!("# {}\n", outline.title);
    if !outline.outline.is_empty() {
        out.push('\n');
    }
    for entry in &outline.outline {
        let indent = "  ".repeat(usize::from(entry.level.as_u8()).saturating_sub(1));
        out.push_str(&format!(
            "{}* {} (p. {})\n",
            indent,
            escape_markdown(entry.text.trim()),
            entry.page
        ));
    }
    out.trim_end().to_string()
}

/// Escape Markdown special characters in text.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
