use super::ResolvedResource;

/// What the widget frame is pointed at.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    /// Loaded through the frame's `src`.
    Url(String),
    /// Rendered from the frame's `srcdoc`.
    Html(String),
}

impl DocumentSource {
    pub fn from_resolved(resolved: &ResolvedResource) -> Option<Self> {
        match resolved {
            ResolvedResource::Direct { url } => Some(DocumentSource::Url(url.clone())),
            ResolvedResource::Inline { html, base_url } => Some(DocumentSource::Html(
                match base_url.as_deref().filter(|b| !b.trim().is_empty()) {
                    Some(base) => inject_base_href(html, base),
                    None => html.clone(),
                },
            )),
            ResolvedResource::Unavailable { .. } => None,
        }
    }
}

/// Inserts `<base href>` right after the opening `<head>` tag so relative
/// references inside inline HTML keep resolving. A document that already
/// declares a base is returned unchanged.
pub fn inject_base_href(html: &str, base_url: &str) -> String {
    let lower = html.to_ascii_lowercase();
    if find_tag(&lower, "base").is_some() {
        return html.to_string();
    }
    let tag = format!(r#"<base href="{}">"#, escape_attr(base_url));

    if let Some(end) = find_tag(&lower, "head").and_then(|start| tag_end(&lower, start)) {
        return splice(html, end, &tag);
    }
    let head = format!("<head>{tag}</head>");
    match find_tag(&lower, "html").and_then(|start| tag_end(&lower, start)) {
        Some(end) => splice(html, end, &head),
        None => format!("{head}{html}"),
    }
}

/// Byte offset of `<name` followed by whitespace, `>` or `/`.
fn find_tag(lower: &str, name: &str) -> Option<usize> {
    let needle = format!("<{name}");
    let mut from = 0;
    while let Some(pos) = lower[from..].find(&needle) {
        let start = from + pos;
        let after = start + needle.len();
        match lower.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => return Some(start),
            None => return None,
            _ => from = after,
        }
    }
    None
}

/// Offset just past the `>` closing the tag that starts at `start`.
fn tag_end(lower: &str, start: usize) -> Option<usize> {
    lower[start..].find('>').map(|i| start + i + 1)
}

fn splice(html: &str, at: usize, insert: &str) -> String {
    let mut out = String::with_capacity(html.len() + insert.len());
    out.push_str(&html[..at]);
    out.push_str(insert);
    out.push_str(&html[at..]);
    out
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::UnavailableReason;
    use pretty_assertions::assert_eq;

    const BASE: &str = "https://widgets.test/board/";

    #[test]
    fn base_goes_right_after_head() {
        let html = r#"<!doctype html><html><HEAD lang="en"><title>x</title></HEAD><body></body></html>"#;
        assert_eq!(
            inject_base_href(html, BASE),
            r#"<!doctype html><html><HEAD lang="en"><base href="https://widgets.test/board/"><title>x</title></HEAD><body></body></html>"#
        );
    }

    #[test]
    fn header_element_is_not_a_head() {
        let html = "<html><body><header>menu</header></body></html>";
        assert_eq!(
            inject_base_href(html, BASE),
            r#"<html><head><base href="https://widgets.test/board/"></head><body><header>menu</header></body></html>"#
        );
    }

    #[test]
    fn fragment_gets_a_head_wrapper() {
        assert_eq!(
            inject_base_href("<div id=root></div>", "/w/"),
            r#"<head><base href="/w/"></head><div id=root></div>"#
        );
    }

    #[test]
    fn existing_base_is_kept() {
        let html = r#"<html><head><base href="/mine/"></head></html>"#;
        assert_eq!(inject_base_href(html, BASE), html);
    }

    #[test]
    fn base_url_is_attribute_escaped() {
        let out = inject_base_href("<head></head>", r#"/a"b&c"#);
        assert_eq!(out, r#"<head><base href="/a&quot;b&amp;c"></head>"#);
    }

    #[test]
    fn document_source_per_resource_kind() {
        assert_eq!(
            DocumentSource::from_resolved(&ResolvedResource::Direct { url: "/w.html".into() }),
            Some(DocumentSource::Url("/w.html".into()))
        );
        assert_eq!(
            DocumentSource::from_resolved(&ResolvedResource::Inline {
                html: "<p>hi</p>".into(),
                base_url: None,
            }),
            Some(DocumentSource::Html("<p>hi</p>".into()))
        );
        assert_eq!(
            DocumentSource::from_resolved(&ResolvedResource::Unavailable {
                reason: UnavailableReason::NoStrategyMatched,
            }),
            None
        );
    }
}
