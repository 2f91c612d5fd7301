//! Clean-up applied to SVG produced by the diagram renderer.

use lol_html::html_content::ContentType;
use lol_html::{ElementContentHandlers, RewriteStrSettings, Selector, element, rewrite_str};
use std::borrow::Cow;

type Handler = (Cow<'static, Selector>, ElementContentHandlers<'static>);

/// Corner radius for node boxes, in SVG user units.
const NODE_RADIUS: &str = "12";

/// Whether `href` leaves the site (`https://`, `http://` or protocol-relative).
pub fn is_external_href(href: &str) -> bool {
    let rest = href
        .strip_prefix("https:")
        .or_else(|| href.strip_prefix("http:"))
        .unwrap_or(href);
    rest.starts_with("//")
}

/// Rounds node corners and makes diagram links accessible: every anchor
/// gets a label (from `title`, `aria-label`, `data-title`, then the href)
/// exposed as `aria-label` and as a `<title>` tooltip. External targets
/// open in a new tab.
pub fn polish(svg: &str) -> Result<String, lol_html::errors::RewritingError> {
    rewrite_str(
        svg,
        RewriteStrSettings {
            element_content_handlers: vec![rounded_nodes(), labelled_anchors()],
            ..RewriteStrSettings::new()
        },
    )
}

fn rounded_nodes() -> Handler {
    element!(".node rect", |el| {
        el.set_attribute("rx", NODE_RADIUS)?;
        el.set_attribute("ry", NODE_RADIUS)?;
        Ok(())
    })
}

fn labelled_anchors() -> Handler {
    element!("a", |el| {
        let Some(href) = el
            .get_attribute("href")
            .or_else(|| el.get_attribute("xlink:href"))
            .filter(|href| !href.is_empty())
        else {
            return Ok(());
        };

        let label = ["title", "aria-label", "data-title"]
            .iter()
            .find_map(|name| el.get_attribute(name).filter(|value| !value.is_empty()))
            .unwrap_or_else(|| href.clone());
        el.set_attribute("aria-label", &label)?;
        el.prepend(
            &format!("<title>{}</title>", html_escape::encode_text(&label)),
            ContentType::Html,
        );

        if is_external_href(&href) {
            el.set_attribute("target", "_blank")?;
            el.set_attribute("rel", "noreferrer noopener")?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_href_detection() {
        assert!(is_external_href("https://example.com"));
        assert!(is_external_href("http://example.com"));
        assert!(is_external_href("//cdn.example.com/x.js"));
        assert!(!is_external_href("/blog/hello"));
        assert!(!is_external_href("#intro"));
        assert!(!is_external_href("mailto:me@example.com"));
    }

    #[test]
    fn node_rects_get_rounded() {
        let out = polish(r#"<svg><g class="node default"><rect class="basic"></rect></g><rect></rect></svg>"#)
            .unwrap();
        assert_eq!(
            out,
            r#"<svg><g class="node default"><rect class="basic" rx="12" ry="12"></rect></g><rect></rect></svg>"#
        );
    }

    #[test]
    fn anchors_get_labels_and_external_attributes() {
        let out = polish(r#"<svg><a xlink:href="https://example.com" data-title="Docs"><g></g></a></svg>"#)
            .unwrap();
        assert!(out.contains(r#"aria-label="Docs""#), "{out}");
        assert!(out.contains("<title>Docs</title><g></g>"), "{out}");
        assert!(out.contains(r#"target="_blank""#), "{out}");
        assert!(out.contains(r#"rel="noreferrer noopener""#), "{out}");
    }

    #[test]
    fn internal_anchor_falls_back_to_href() {
        let out = polish(r#"<svg><a href="/blog/a"></a></svg>"#).unwrap();
        assert!(out.contains(r#"aria-label="/blog/a""#), "{out}");
        assert!(!out.contains("target="), "{out}");
    }
}
