use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Scheme of backend-defined widget templates, e.g. `ui://widget/board.html`.
pub const WIDGET_SCHEME: &str = "ui://";
const WIDGET_SEGMENT: &str = "widget/";

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `http://` or `https://`
    AbsoluteUrl,
    /// Leading `/`, served by the app itself.
    RootRelative,
    /// `ui://…`
    WidgetScheme,
    Opaque,
}

/// Identifies the widget that renders a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetReference(String);

impl WidgetReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ReferenceKind {
        let s = self.0.trim();
        if starts_with_ignore_case(s, "http://") || starts_with_ignore_case(s, "https://") {
            ReferenceKind::AbsoluteUrl
        } else if s.starts_with('/') {
            ReferenceKind::RootRelative
        } else if starts_with_ignore_case(s, WIDGET_SCHEME) {
            ReferenceKind::WidgetScheme
        } else {
            ReferenceKind::Opaque
        }
    }

    /// Whether the reference can be loaded as-is, without resolution.
    pub fn is_direct(&self) -> bool {
        matches!(
            self.kind(),
            ReferenceKind::AbsoluteUrl | ReferenceKind::RootRelative
        )
    }

    /// Maps a `ui://widget/<name>` reference into the static widget
    /// namespace under `base`. The name is lower-cased and gets an `.html`
    /// extension when it has none.
    pub fn static_asset_path(&self, base: &str) -> Option<String> {
        let s = self.0.trim();
        if !starts_with_ignore_case(s, WIDGET_SCHEME) {
            return None;
        }
        let rest = s[WIDGET_SCHEME.len()..].trim_start_matches('/');
        let rest = strip_prefix_ignore_case(rest, WIDGET_SEGMENT).unwrap_or(rest);
        let rest = rest.trim_matches('/');
        if rest.is_empty() {
            return None;
        }

        let mut name = rest.to_lowercase();
        if !has_extension(&name) {
            name.push_str(".html");
        }
        let path = name
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        Some(format!("{}/{}", base.trim_end_matches('/'), path))
    }
}

impl fmt::Display for WidgetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WidgetReference {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WidgetReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    starts_with_ignore_case(s, prefix).then(|| &s[prefix.len()..])
}

fn has_extension(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rfind('.').is_some_and(|dot| dot > 0 && dot + 1 < file.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_in_priority_order() {
        let cases = [
            ("https://x.test/w.html", ReferenceKind::AbsoluteUrl),
            ("HTTP://x.test/w.html", ReferenceKind::AbsoluteUrl),
            ("/widgets/board.html", ReferenceKind::RootRelative),
            ("ui://widget/board.html", ReferenceKind::WidgetScheme),
            ("UI://widget/board.html", ReferenceKind::WidgetScheme),
            ("board.html", ReferenceKind::Opaque),
            ("file:///etc/passwd", ReferenceKind::Opaque),
        ];
        for (reference, kind) in cases {
            assert_eq!(WidgetReference::from(reference).kind(), kind, "{reference}");
        }
    }

    #[test]
    fn only_urls_and_paths_are_direct() {
        assert!(WidgetReference::from("https://x.test/w.html").is_direct());
        assert!(WidgetReference::from("/w.html").is_direct());
        assert!(!WidgetReference::from("ui://widget/w.html").is_direct());
        assert!(!WidgetReference::from("w").is_direct());
    }

    #[test]
    fn static_path_lowercases_mixed_case_names() {
        let reference = WidgetReference::from("ui://widget/Board.HTML");
        assert_eq!(
            reference.static_asset_path("/widgets").as_deref(),
            Some("/widgets/board.html")
        );
    }

    #[test]
    fn static_path_appends_missing_extension() {
        let reference = WidgetReference::from("ui://widget/kanban");
        assert_eq!(
            reference.static_asset_path("/widgets/").as_deref(),
            Some("/widgets/kanban.html")
        );
    }

    #[test]
    fn static_path_without_widget_segment() {
        let reference = WidgetReference::from("ui://charts/Line Chart.html");
        assert_eq!(
            reference
                .static_asset_path("https://cdn.test/assets")
                .as_deref(),
            Some("https://cdn.test/assets/charts/line%20chart.html")
        );
    }

    #[test]
    fn static_path_needs_the_widget_scheme() {
        assert_eq!(WidgetReference::from("board.html").static_asset_path("/w"), None);
        assert_eq!(WidgetReference::from("ui://widget/").static_asset_path("/w"), None);
    }
}
