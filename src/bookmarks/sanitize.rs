//! Output filtering for user-supplied text.
//!
//! Stored bookmarks keep whatever text the client sent. Before a title or
//! description leaves the API it goes through [`filter_markup`]: a small set of
//! formatting tags survives with a reduced attribute list, everything else that
//! looks like markup has its angle brackets encoded so a browser renders it as
//! text.

use crate::model::Bookmark;

const ALLOWED_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target"]),
    ("b", &[]),
    ("blockquote", &[]),
    ("br", &[]),
    ("code", &[]),
    ("em", &[]),
    ("i", &[]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("li", &[]),
    ("ol", &[]),
    ("p", &[]),
    ("pre", &[]),
    ("strong", &[]),
    ("u", &[]),
    ("ul", &[]),
];

const URL_ATTRIBUTES: &[&str] = &["href", "src"];
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

const NAMED_REFERENCES: &[(&str, char)] = &[
    ("Tab", '\t'),
    ("NewLine", '\n'),
    ("colon", ':'),
    ("sol", '/'),
    ("quest", '?'),
    ("num", '#'),
    ("period", '.'),
    ("lpar", '('),
    ("rpar", ')'),
    ("amp", '&'),
    ("AMP", '&'),
    ("semi", ';'),
    ("nbsp", '\u{A0}'),
];

pub fn sanitize_for_output(bookmark: Bookmark) -> Bookmark {
    Bookmark {
        title: filter_markup(&bookmark.title),
        description: bookmark.description.as_deref().map(filter_markup),
        ..bookmark
    }
}

pub fn filter_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        push_text(&mut out, &rest[..start]);
        let candidate = &rest[start..];

        match tag_end(candidate) {
            Some(end) => {
                let inner = &candidate[1..end];
                match rebuild_tag(inner) {
                    Some(tag) => out.push_str(&tag),
                    None => {
                        out.push_str("&lt;");
                        push_escaped(&mut out, inner);
                        out.push_str("&gt;");
                    }
                }
                rest = &candidate[end + 1..];
            }
            None => {
                out.push_str("&lt;");
                rest = &candidate[1..];
            }
        }
    }

    push_text(&mut out, rest);
    out
}

// Text between tags only needs stray '>' encoded; quotes and ampersands are left alone
// so already-filtered text passes through unchanged.
fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Byte offset of the `>` closing the tag that starts at `candidate[0]`, skipping quoted
/// attribute values. `None` when another `<` opens first or the input ends.
fn tag_end(candidate: &str) -> Option<usize> {
    let mut quote: Option<char> = None;

    for (i, c) in candidate.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '<') => return None,
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }

    None
}

fn rebuild_tag(inner: &str) -> Option<String> {
    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, inner),
    };

    let name_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let name = body[..name_len].to_ascii_lowercase();
    let (_, allowed_attributes) = ALLOWED_TAGS.iter().find(|(tag, _)| *tag == name)?;

    let after_name = &body[name_len..];
    if !after_name.is_empty() && !after_name.starts_with(|c: char| c.is_whitespace() || c == '/') {
        return None;
    }

    if closing {
        return Some(format!("</{name}>"));
    }

    let mut attributes = after_name.trim();
    let self_closing = attributes.ends_with('/');
    if self_closing {
        attributes = attributes[..attributes.len() - 1].trim_end();
    }

    let mut tag = format!("<{name}");
    for (attribute, value) in parse_attributes(attributes) {
        if !allowed_attributes.contains(&attribute.as_str()) {
            continue;
        }

        match value {
            Some(value) => {
                if URL_ATTRIBUTES.contains(&attribute.as_str()) && !is_safe_url(&value) {
                    continue;
                }
                tag.push(' ');
                tag.push_str(&attribute);
                tag.push_str("=\"");
                for c in value.chars() {
                    match c {
                        '"' => tag.push_str("&quot;"),
                        '<' => tag.push_str("&lt;"),
                        '>' => tag.push_str("&gt;"),
                        c => tag.push(c),
                    }
                }
                tag.push('"');
            }
            None => {
                tag.push(' ');
                tag.push_str(&attribute);
            }
        }
    }

    if self_closing {
        tag.push_str(" /");
    }
    tag.push('>');
    Some(tag)
}

fn parse_attributes(src: &str) -> Vec<(String, Option<String>)> {
    let mut attributes = Vec::new();
    let mut rest = src.trim_start();

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_ascii_lowercase();
        rest = rest[name_end..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after_eq) => {
                let after_eq = after_eq.trim_start();
                let (value, remainder) = match after_eq.chars().next() {
                    Some(q @ ('"' | '\'')) => {
                        let quoted = &after_eq[1..];
                        match quoted.find(q) {
                            Some(close) => (&quoted[..close], &quoted[close + 1..]),
                            None => (quoted, ""),
                        }
                    }
                    _ => {
                        let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                        (&after_eq[..end], &after_eq[end..])
                    }
                };
                rest = remainder;
                Some(value.to_string())
            }
            None => None,
        };

        if !name.is_empty() {
            attributes.push((name, value));
        }
        rest = rest.trim_start();
    }

    attributes
}

/// Browsers decode character references inside attribute values before resolving the URL,
/// so the scheme check runs on the decoded, whitespace-stripped text. Relative URLs are kept;
/// absolute ones must use a scheme from `SAFE_SCHEMES`.
fn is_safe_url(value: &str) -> bool {
    let normalized: String = decode_entities(value)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let Some(colon) = normalized.find(':') else {
        return true;
    };
    let scheme = &normalized[..colon];
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    // an undecoded reference in the scheme could still hide a letter
    if scheme.contains('&') {
        return false;
    }

    SAFE_SCHEMES.contains(&scheme)
}

fn decode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let reference = &rest[amp + 1..];

        match decode_reference(reference) {
            Some((c, consumed)) => {
                out.push(c);
                rest = &reference[consumed..];
            }
            None => {
                out.push('&');
                rest = reference;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decodes the reference following an `&`. Returns the character and the number of bytes
/// consumed, including an optional trailing `;`.
fn decode_reference(reference: &str) -> Option<(char, usize)> {
    let (c, len) = if let Some(numeric) = reference.strip_prefix('#') {
        let (radix, digits_start) = match numeric.chars().next()? {
            'x' | 'X' => (16, 2),
            _ => (10, 1),
        };
        let digits = &reference[digits_start..];
        let digits_len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        if digits_len == 0 {
            return None;
        }
        let code = u32::from_str_radix(&digits[..digits_len], radix).ok()?;
        (char::from_u32(code).unwrap_or('\u{FFFD}'), digits_start + digits_len)
    } else {
        let name_len = reference
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(reference.len());
        let c = NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == &reference[..name_len])
            .map(|(_, c)| *c)?;
        (c, name_len)
    };

    let len = if reference[len..].starts_with(';') { len + 1 } else { len };
    Some((c, len))
}
