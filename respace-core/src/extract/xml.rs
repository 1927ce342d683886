//! Minimal forward-only XML scanner for Office Open XML parts.
//!
//! OOXML parts are machine-written, namespace-prefixed and well-formed, so
//! extraction only needs a stream of open/close/text events. No tree is
//! built and no validation is done. Processing instructions, comments,
//! doctype declarations and CDATA markers are skipped.

use memchr::{memchr, memmem};

/// One scanned XML item. All slices borrow from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XmlEvent<'a> {
    /// `<name attrs>` or `<name attrs/>` when `empty`.
    Open {
        name: &'a str,
        attrs: &'a str,
        empty: bool,
    },
    /// `</name>`
    Close { name: &'a str },
    /// Raw character data between tags, entities still encoded.
    Text(&'a str),
}

/// Calls `on_event` for every tag and text run in `xml`, in document order.
pub(crate) fn scan<'a>(xml: &'a str, mut on_event: impl FnMut(XmlEvent<'a>)) {
    let bytes = xml.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let Some(lt) = memchr(b'<', &bytes[i..]).map(|off| i + off) else {
            on_event(XmlEvent::Text(&xml[i..]));
            return;
        };

        if lt > i {
            on_event(XmlEvent::Text(&xml[i..lt]));
        }

        let rest = &xml[lt..];
        let skip_to = if rest.starts_with("<!--") {
            find_after(bytes, lt, b"-->")
        } else if rest.starts_with("<![CDATA[") {
            let body = lt + "<![CDATA[".len();
            let end = memmem::find(&bytes[body..], b"]]>").map_or(bytes.len(), |off| body + off);
            on_event(XmlEvent::Text(&xml[body..end]));
            (end + 3).min(bytes.len())
        } else {
            let Some(gt) = memchr(b'>', &bytes[lt..]).map(|off| lt + off) else {
                return;
            };
            emit_tag(&xml[lt + 1..gt], &mut on_event);
            gt + 1
        };

        i = skip_to;
    }
}

fn find_after(bytes: &[u8], from: usize, needle: &[u8]) -> usize {
    memmem::find(&bytes[from..], needle).map_or(bytes.len(), |off| from + off + needle.len())
}

fn emit_tag<'a>(tag: &'a str, on_event: &mut impl FnMut(XmlEvent<'a>)) {
    if tag.starts_with('?') || tag.starts_with('!') {
        return;
    }

    if let Some(name) = tag.strip_prefix('/') {
        on_event(XmlEvent::Close { name: name.trim() });
        return;
    }

    let (tag, empty) = match tag.strip_suffix('/') {
        Some(inner) => (inner, true),
        None => (tag, false),
    };

    let name_end = tag
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(tag.len());

    on_event(XmlEvent::Open {
        name: &tag[..name_end],
        attrs: tag[name_end..].trim(),
        empty,
    });
}

/// Looks up attribute `key` in a raw attribute string.
pub(crate) fn attr<'a>(attrs: &'a str, key: &str) -> Option<&'a str> {
    let mut rest = attrs;

    while let Some(eq) = rest.find('=') {
        let name = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }

        let value_start = &after[1..];
        let close = value_start.find(quote)?;
        if name == key {
            return Some(&value_start[..close]);
        }

        rest = &value_start[close + 1..];
    }

    None
}

/// Appends `raw` to `out`, decoding the predefined and numeric entities.
///
/// Unknown or malformed references are copied through literally.
pub(crate) fn decode_entities_into(raw: &str, out: &mut String) {
    let bytes = raw.as_bytes();
    let mut start = 0usize;

    while let Some(amp) = memchr(b'&', &bytes[start..]).map(|off| start + off) {
        out.push_str(&raw[start..amp]);

        let Some(semi) = memchr(b';', &bytes[amp..]).map(|off| amp + off) else {
            start = amp;
            break;
        };

        match decode_entity(&raw[amp + 1..semi]) {
            Some(c) => {
                out.push(c);
                start = semi + 1;
            }
            None => {
                out.push('&');
                start = amp + 1;
            }
        }
    }

    out.push_str(&raw[start..]);
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str) -> Vec<XmlEvent<'_>> {
        let mut out = Vec::new();
        scan(xml, |e| out.push(e));
        out
    }

    fn decode(raw: &str) -> String {
        let mut out = String::new();
        decode_entities_into(raw, &mut out);
        out
    }

    #[test]
    fn scans_open_text_close() {
        assert_eq!(
            events(r#"<w:t xml:space="preserve">hi</w:t>"#),
            vec![
                XmlEvent::Open {
                    name: "w:t",
                    attrs: r#"xml:space="preserve""#,
                    empty: false
                },
                XmlEvent::Text("hi"),
                XmlEvent::Close { name: "w:t" },
            ]
        );
    }

    #[test]
    fn self_closing_tags() {
        assert_eq!(
            events("<w:tab/><w:br />"),
            vec![
                XmlEvent::Open {
                    name: "w:tab",
                    attrs: "",
                    empty: true
                },
                XmlEvent::Open {
                    name: "w:br",
                    attrs: "",
                    empty: true
                },
            ]
        );
    }

    #[test]
    fn skips_prolog_and_comments() {
        let xml = r#"<?xml version="1.0"?><!-- note --><a>x</a>"#;
        assert_eq!(
            events(xml),
            vec![
                XmlEvent::Open {
                    name: "a",
                    attrs: "",
                    empty: false
                },
                XmlEvent::Text("x"),
                XmlEvent::Close { name: "a" },
            ]
        );
    }

    #[test]
    fn cdata_is_text() {
        assert_eq!(
            events("<a><![CDATA[1 < 2]]></a>")[1],
            XmlEvent::Text("1 < 2")
        );
    }

    #[test]
    fn truncated_tag_stops() {
        assert_eq!(events("text<unclosed"), vec![XmlEvent::Text("text")]);
    }

    #[test]
    fn attribute_lookup() {
        let attrs = r#"id="256" r:id='rId2' name="Slide""#;
        assert_eq!(attr(attrs, "r:id"), Some("rId2"));
        assert_eq!(attr(attrs, "id"), Some("256"));
        assert_eq!(attr(attrs, "missing"), None);
    }

    #[test]
    fn predefined_entities() {
        assert_eq!(decode("a &amp; b &lt;c&gt; &quot;d&quot; &apos;e&apos;"), "a & b <c> \"d\" 'e'");
    }

    #[test]
    fn numeric_entities() {
        assert_eq!(decode("&#233;t&#xE9;"), "été");
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(decode("&nbsp; & done"), "&nbsp; & done");
        assert_eq!(decode("tail &amp"), "tail &amp");
    }
}
