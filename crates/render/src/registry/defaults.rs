//! The site's default typography overrides.
//!
//! Standard elements get utility classes; blockquotes become alerts,
//! rules become separators, tables get their wrapper, images load lazily
//! and external links open in a new tab with an icon. Anchors inside
//! diagram SVG are left exactly as the diagram pass produced them.

use super::types::ComponentTable;
use crate::transform::highlight::copy_button;
use crate::transform::svg::is_external_href;
use crate::tree::{Element, Node};

const HEADINGS: [(&str, &str); 6] = [
    ("h1", "scroll-m-20 text-4xl font-extrabold tracking-tight text-balance"),
    (
        "h2",
        "mt-10 scroll-m-20 border-b pb-2 text-3xl font-semibold tracking-tight first:mt-0",
    ),
    ("h3", "mt-8 scroll-m-20 text-2xl font-semibold tracking-tight"),
    ("h4", "mt-6 scroll-m-20 text-xl font-semibold tracking-tight"),
    ("h5", "mt-6 text-lg font-semibold"),
    ("h6", "mt-6 text-base font-semibold"),
];

/// Elements that only gain classes (and a `data-slot` for the table parts).
const CLASSED: [(&str, Option<&str>, &str); 11] = [
    ("p", None, "leading-7 [&:not(:first-child)]:mt-6"),
    ("ul", None, "my-6 ml-6 list-disc [&>li]:mt-2"),
    ("ol", None, "my-6 ml-6 list-decimal [&>li]:mt-2"),
    ("li", None, "leading-7"),
    ("thead", Some("table-header"), "[&_tr]:border-b"),
    ("tbody", Some("table-body"), "[&_tr:last-child]:border-0"),
    (
        "tfoot",
        Some("table-footer"),
        "bg-muted/50 border-t font-medium [&>tr]:last:border-b-0",
    ),
    (
        "tr",
        Some("table-row"),
        "hover:bg-muted/50 data-[state=selected]:bg-muted border-b transition-colors",
    ),
    (
        "th",
        Some("table-head"),
        "text-foreground h-10 px-2 text-left align-middle font-medium whitespace-nowrap",
    ),
    ("td", Some("table-cell"), "p-2 align-middle whitespace-nowrap"),
    ("caption", Some("table-caption"), "text-muted-foreground mt-4 text-sm"),
];

const LINK_CLASSES: &str = "text-primary underline-offset-4 hover:underline";
const INLINE_CODE_CLASSES: &str = "relative rounded bg-muted px-1.5 py-0.5 font-mono text-sm";
const PRE_CLASSES: &str = "my-4 overflow-x-auto rounded-lg";
const EXTERNAL_ICON_PATHS: [&str; 4] = ["M14 3h7v7", "M10 14 21 3", "M21 14v7h-7", "M3 10v11h11"];

impl ComponentTable {
    /// The blog's default overrides.
    pub fn typography() -> Self {
        let mut table = ComponentTable::new();
        for (tag, classes) in HEADINGS {
            table.insert(tag, move |el: Element| Node::from(with_classes(el, classes)));
        }
        for (tag, slot, classes) in CLASSED {
            table.insert(tag, move |el: Element| {
                let mut el = with_classes(el, classes);
                if let Some(slot) = slot {
                    el.set_prop("data-slot", slot);
                }
                Node::from(el)
            });
        }
        table
            .with("a", link)
            .with("blockquote", alert)
            .with("code", inline_code)
            .with("pre", pre)
            .with("img", image)
            .with("hr", separator)
            .with("table", table_container)
    }
}

/// `base` classes first, then whatever the element already had.
fn with_classes(mut el: Element, base: &str) -> Element {
    let existing = el.props.remove("class");
    el.set_prop("class", base);
    if let Some(existing) = existing {
        el.add_class(&existing);
    }
    el
}

fn is_svg_anchor(el: &Element) -> bool {
    el.props.contains_key("xlink:href")
        || el.children.iter().any(|child| {
            child
                .as_element()
                .is_some_and(|c| matches!(c.tag.as_str(), "g" | "svg" | "foreignObject"))
        })
}

fn link(el: Element) -> Node {
    if is_svg_anchor(&el) {
        return el.into();
    }
    let external = el.prop("href").is_some_and(is_external_href);
    let mut el = with_classes(el, LINK_CLASSES);
    if external {
        el.set_prop("rel", "noreferrer noopener");
        el.set_prop("target", "_blank");
        el.children.push(external_icon());
    }
    el.into()
}

fn external_icon() -> Node {
    let paths = EXTERNAL_ICON_PATHS
        .iter()
        .map(|d| Element::new("path").with_prop("d", *d).into())
        .collect();
    Element::new("svg")
        .with_prop("aria-hidden", "true")
        .with_prop("class", "ml-1 inline-block size-3 align-[-1px] opacity-70")
        .with_prop("viewBox", "0 0 24 24")
        .with_prop("fill", "none")
        .with_prop("stroke", "currentColor")
        .with_prop("stroke-width", "2")
        .with_children(paths)
        .into()
}

fn alert(el: Element) -> Node {
    let mut wrapper = with_classes(
        Element::new("div").with_prop("class", el.prop("class").unwrap_or_default()),
        "relative w-full rounded-lg border px-4 py-3 text-sm my-6",
    );
    wrapper.set_prop("role", "alert");
    wrapper.set_prop("data-slot", "alert");
    wrapper
        .with_child(
            Element::new("div")
                .with_prop("data-slot", "alert-description")
                .with_prop(
                    "class",
                    "text-muted-foreground grid justify-items-start gap-1 text-sm [&_p]:leading-relaxed",
                )
                .with_children(el.children),
        )
        .into()
}

/// Code blocks keep their highlighter markup; only inline code is styled.
fn inline_code(el: Element) -> Node {
    if el.language().is_some() || el.props.contains_key("data-language") {
        return el.into();
    }
    with_classes(el, INLINE_CODE_CLASSES).into()
}

fn pre(el: Element) -> Node {
    let mut el = with_classes(el, PRE_CLASSES);
    let has_code = el
        .children
        .iter()
        .any(|child| child.as_element().is_some_and(|c| c.tag == "code"));
    let has_button = el
        .children
        .iter()
        .any(|child| child.as_element().is_some_and(|c| c.has_class("rehype-pretty-copy")));
    if has_code && !has_button {
        el.children.push(copy_button());
    }
    el.into()
}

fn image(mut el: Element) -> Node {
    for (name, default) in [("loading", "lazy"), ("decoding", "async"), ("alt", "")] {
        el.props.entry(name.to_string()).or_insert_with(|| default.to_string());
    }
    el.into()
}

fn separator(el: Element) -> Node {
    let mut sep = with_classes(
        Element::new("div").with_prop("class", el.prop("class").unwrap_or_default()),
        "bg-border shrink-0 h-px w-full my-8",
    );
    sep.set_prop("data-slot", "separator");
    sep.set_prop("role", "none");
    sep.set_prop("data-orientation", "horizontal");
    sep.into()
}

fn table_container(el: Element) -> Node {
    let mut table = with_classes(el, "w-full caption-bottom text-sm");
    table.set_prop("data-slot", "table");
    Element::new("div")
        .with_prop("data-slot", "table-container")
        .with_prop("class", "relative w-full overflow-x-auto")
        .with_child(table)
        .into()
}
