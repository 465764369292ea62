//! Plain-text sanitization applied to every setting on write.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*?>.*?</script>").expect("valid regex"));
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*?>.*?</style>").expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n\t ]+").expect("valid regex"));
static OCTET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%[a-f0-9]{2}").expect("valid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid regex"));

/// Sanitize a single-line text value.
///
/// Strips markup (dropping `<script>`/`<style>` blocks entirely), escapes a
/// stray `<` that does not open a tag, collapses line breaks, tabs and runs of
/// spaces into one space, removes percent-encoded octets and trims the result.
pub fn sanitize_text_field(input: &str) -> String {
    let mut filtered = input.to_string();

    if filtered.contains('<') {
        filtered = escape_stray_less_than(&filtered);
        filtered = SCRIPT_BLOCK.replace_all(&filtered, "").into_owned();
        filtered = STYLE_BLOCK.replace_all(&filtered, "").into_owned();
        filtered = TAG.replace_all(&filtered, "").into_owned();
        filtered = filtered.replace("<\n", "&lt;\n");
    }

    filtered = WHITESPACE.replace_all(&filtered, " ").trim().to_string();

    if OCTET.is_match(&filtered) {
        while OCTET.is_match(&filtered) {
            filtered = OCTET.replace_all(&filtered, "").into_owned();
        }
        filtered = SPACES.replace_all(filtered.trim(), " ").into_owned();
    }

    filtered
}

/// Escape every `<` that is followed by another `<` or the end of input before
/// any `>`, so only well-formed tags reach the tag stripper.
fn escape_stray_less_than(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let close = after.find('>');
        let next_open = after.find('<');

        match (close, next_open) {
            (Some(c), Some(o)) if c < o => {
                out.push_str(&rest[start..start + c + 2]);
                rest = &after[c + 1..];
            }
            (Some(c), None) => {
                out.push_str(&rest[start..start + c + 2]);
                rest = &after[c + 1..];
            }
            (_, Some(o)) => {
                out.push_str(&html_escape(&rest[start..start + 1 + o]));
                rest = &after[o..];
            }
            (None, None) => {
                out.push_str(&html_escape(&rest[start..]));
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
