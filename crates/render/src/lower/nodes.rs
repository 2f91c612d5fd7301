//! Per-node lowering functions.

use super::context::Context;
use crate::tree::{Element, Node};
use inkpress_core::ContentError;
use markdown::mdast::{self, AlignKind, AttributeContent, AttributeValue};

type Result<T = ()> = std::result::Result<T, ContentError>;

fn unsupported(construct: &str, node: &mdast::Node) -> ContentError {
    let (line, column) = node
        .position()
        .map(|pos| (pos.start.line, pos.start.column))
        .unwrap_or((1, 1));
    ContentError::unsupported(construct, line, column)
}

fn lower_children<'a>(children: &'a [mdast::Node], ctx: &mut Context<'a>) -> Result<Vec<Node>> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        lower_node(child, ctx, &mut out)?;
    }
    Ok(out)
}

fn wrap<'a>(tag: &str, children: &'a [mdast::Node], ctx: &mut Context<'a>) -> Result<Node> {
    Ok(Element::new(tag)
        .with_children(lower_children(children, ctx)?)
        .into())
}

/// Lowers `node`, appending zero or more render nodes to `out`.
pub(super) fn lower_node<'a>(
    node: &'a mdast::Node,
    ctx: &mut Context<'a>,
    out: &mut Vec<Node>,
) -> Result {
    match node {
        mdast::Node::Root(root) => {
            for child in &root.children {
                lower_node(child, ctx, out)?;
            }
        }
        mdast::Node::Paragraph(para) => {
            let children = lower_children(&para.children, ctx)?;
            // A paragraph holding only an MDX comment lowers to nothing.
            if !children.is_empty() {
                out.push(Element::new("p").with_children(children).into());
            }
        }
        mdast::Node::Heading(heading) => {
            out.push(wrap(&format!("h{}", heading.depth), &heading.children, ctx)?);
        }
        mdast::Node::ThematicBreak(_) => out.push(Element::new("hr").into()),
        mdast::Node::Blockquote(quote) => out.push(wrap("blockquote", &quote.children, ctx)?),
        mdast::Node::List(list) => out.push(lower_list(list, ctx)?),
        // List items are handled by their list; a stray one still renders.
        mdast::Node::ListItem(item) => out.push(lower_list_item(item, false, ctx)?),
        mdast::Node::Code(code) => out.push(lower_code(code)),
        mdast::Node::Html(html) => {
            if ctx.raw_html_allowed() {
                out.push(Node::raw(html.value.clone()));
            } else {
                log::debug!("escaping raw HTML: {}", html.value);
                out.push(Node::text(html.value.clone()));
            }
        }
        mdast::Node::Text(text) => out.push(Node::text(text.value.clone())),
        mdast::Node::Emphasis(em) => out.push(wrap("em", &em.children, ctx)?),
        mdast::Node::Strong(strong) => out.push(wrap("strong", &strong.children, ctx)?),
        mdast::Node::Delete(del) => out.push(wrap("del", &del.children, ctx)?),
        mdast::Node::InlineCode(code) => out.push(
            Element::new("code")
                .with_child(Node::text(code.value.clone()))
                .into(),
        ),
        mdast::Node::Break(_) => out.push(Element::new("br").into()),
        mdast::Node::Link(link) => {
            out.push(lower_link(&link.url, link.title.as_deref(), &link.children, ctx)?);
        }
        mdast::Node::Image(image) => {
            out.push(lower_image(&image.url, &image.alt, image.title.as_deref()));
        }
        mdast::Node::LinkReference(reference) => {
            match ctx.definition(&reference.identifier).cloned() {
                Some(def) => out.push(lower_link(
                    &def.url,
                    def.title.as_deref(),
                    &reference.children,
                    ctx,
                )?),
                None => out.extend(lower_children(&reference.children, ctx)?),
            }
        }
        mdast::Node::ImageReference(reference) => match ctx.definition(&reference.identifier) {
            Some(def) => out.push(lower_image(&def.url, &reference.alt, def.title.as_deref())),
            None => out.push(Node::text(reference.alt.clone())),
        },
        mdast::Node::Definition(_) | mdast::Node::FootnoteDefinition(_) => {}
        mdast::Node::FootnoteReference(reference) => {
            match ctx.footnote_reference(&reference.identifier) {
                Some((id, ordinal, nth)) => {
                    let suffix = if nth == 1 { String::new() } else { format!("-{nth}") };
                    let link = Element::new("a")
                        .with_prop("href", format!("#user-content-fn-{id}"))
                        .with_prop("id", format!("user-content-fnref-{id}{suffix}"))
                        .with_prop("data-footnote-ref", "")
                        .with_prop("aria-describedby", "footnote-label")
                        .with_child(Node::text(ordinal.to_string()));
                    out.push(Element::new("sup").with_child(link).into());
                }
                None => out.push(Node::text(format!("[^{}]", reference.identifier))),
            }
        }
        mdast::Node::Table(table) => out.push(lower_table(table, ctx)?),
        // Rows and cells are handled by their table.
        mdast::Node::TableRow(_) | mdast::Node::TableCell(_) => {}
        mdast::Node::Math(math) => out.push(
            Element::new("pre")
                .with_child(
                    Element::new("code")
                        .with_prop("class", "language-math math-display")
                        .with_child(Node::text(math.value.clone())),
                )
                .into(),
        ),
        mdast::Node::InlineMath(math) => out.push(
            Element::new("code")
                .with_prop("class", "language-math math-inline")
                .with_child(Node::text(math.value.clone()))
                .into(),
        ),
        mdast::Node::Yaml(_) | mdast::Node::Toml(_) => {}
        mdast::Node::MdxJsxFlowElement(el) => {
            lower_jsx(node, el.name.as_deref(), &el.attributes, &el.children, ctx, out)?;
        }
        mdast::Node::MdxJsxTextElement(el) => {
            lower_jsx(node, el.name.as_deref(), &el.attributes, &el.children, ctx, out)?;
        }
        mdast::Node::MdxFlowExpression(expr) => {
            if !is_comment_expression(&expr.value) {
                return Err(unsupported("MDX expression", node));
            }
        }
        mdast::Node::MdxTextExpression(expr) => {
            if !is_comment_expression(&expr.value) {
                return Err(unsupported("MDX expression", node));
            }
        }
        mdast::Node::MdxjsEsm(_) => return Err(unsupported("import/export statement", node)),
        #[allow(unreachable_patterns)]
        _ => log::warn!("unhandled markdown node: {node:?}"),
    }
    Ok(())
}

/// `{/* ... */}` and `{}` carry no content.
fn is_comment_expression(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || (value.starts_with("/*") && value.ends_with("*/") && value.len() >= 4)
}

fn lower_list<'a>(list: &'a mdast::List, ctx: &mut Context<'a>) -> Result<Node> {
    let tight = !list.spread
        && list.children.iter().all(|child| match child {
            mdast::Node::ListItem(item) => !item.spread,
            _ => true,
        });

    let mut el = Element::new(if list.ordered { "ol" } else { "ul" });
    if list.ordered
        && let Some(start) = list.start
        && start != 1
    {
        el.set_prop("start", start.to_string());
    }

    let mut has_tasks = false;
    for child in &list.children {
        match child {
            mdast::Node::ListItem(item) => {
                has_tasks |= item.checked.is_some();
                el.children.push(lower_list_item(item, tight, ctx)?);
            }
            other => lower_node(other, ctx, &mut el.children)?,
        }
    }
    if has_tasks {
        el.add_class("contains-task-list");
    }
    Ok(el.into())
}

fn lower_list_item<'a>(item: &'a mdast::ListItem, tight: bool, ctx: &mut Context<'a>) -> Result<Node> {
    let mut children = Vec::new();
    for child in &item.children {
        match child {
            mdast::Node::Paragraph(para) if tight => {
                children.extend(lower_children(&para.children, ctx)?);
            }
            other => lower_node(other, ctx, &mut children)?,
        }
    }

    let mut li = Element::new("li");
    if let Some(checked) = item.checked {
        li.add_class("task-list-item");
        let mut input = Element::new("input")
            .with_prop("type", "checkbox")
            .with_prop("disabled", "");
        if checked {
            input.set_prop("checked", "");
        }
        let marker = [Node::from(input), Node::text(" ")];
        match children.first_mut().and_then(Node::as_element_mut) {
            Some(p) if p.tag == "p" => {
                p.children.splice(0..0, marker);
            }
            _ => {
                children.splice(0..0, marker);
            }
        }
    }
    li.children = children;
    Ok(li.into())
}

fn lower_code(code: &mdast::Code) -> Node {
    let mut inner = Element::new("code").with_child(Node::text(code.value.clone()));
    if let Some(lang) = code.lang.as_deref().filter(|lang| !lang.is_empty()) {
        inner.set_prop("class", format!("language-{lang}"));
    }
    if let Some(meta) = code.meta.as_deref().filter(|meta| !meta.is_empty()) {
        inner.set_prop("data-meta", meta);
    }
    Element::new("pre").with_child(inner).into()
}

fn lower_link<'a>(
    url: &str,
    title: Option<&str>,
    children: &'a [mdast::Node],
    ctx: &mut Context<'a>,
) -> Result<Node> {
    let mut a = Element::new("a")
        .with_prop("href", url)
        .with_children(lower_children(children, ctx)?);
    if let Some(title) = title {
        a.set_prop("title", title);
    }
    Ok(a.into())
}

fn lower_image(url: &str, alt: &str, title: Option<&str>) -> Node {
    let mut img = Element::new("img").with_prop("src", url).with_prop("alt", alt);
    if let Some(title) = title {
        img.set_prop("title", title);
    }
    img.into()
}

fn lower_table<'a>(table: &'a mdast::Table, ctx: &mut Context<'a>) -> Result<Node> {
    let mut rows = table.children.iter().filter_map(|row| match row {
        mdast::Node::TableRow(row) => Some(row),
        _ => None,
    });

    let mut el = Element::new("table");
    if let Some(head) = rows.next() {
        let tr = lower_table_row(head, "th", &table.align, ctx)?;
        el.children.push(Element::new("thead").with_child(tr).into());
    }
    let mut body = Vec::new();
    for row in rows {
        body.push(lower_table_row(row, "td", &table.align, ctx)?);
    }
    if !body.is_empty() {
        el.children.push(Element::new("tbody").with_children(body).into());
    }
    Ok(el.into())
}

fn lower_table_row<'a>(
    row: &'a mdast::TableRow,
    cell_tag: &str,
    align: &[AlignKind],
    ctx: &mut Context<'a>,
) -> Result<Node> {
    let mut tr = Element::new("tr");
    for (idx, cell) in row.children.iter().enumerate() {
        let mdast::Node::TableCell(cell) = cell else {
            continue;
        };
        let mut td = Element::new(cell_tag).with_children(lower_children(&cell.children, ctx)?);
        match align.get(idx) {
            Some(AlignKind::Left) => td.set_prop("align", "left"),
            Some(AlignKind::Right) => td.set_prop("align", "right"),
            Some(AlignKind::Center) => td.set_prop("align", "center"),
            Some(AlignKind::None) | None => {}
        }
        tr.children.push(td.into());
    }
    Ok(tr.into())
}

fn lower_jsx<'a>(
    node: &'a mdast::Node,
    name: Option<&str>,
    attributes: &'a [AttributeContent],
    children: &'a [mdast::Node],
    ctx: &mut Context<'a>,
    out: &mut Vec<Node>,
) -> Result {
    // Fragments (`<>...</>`) contribute their children only.
    let Some(tag) = name else {
        for child in children {
            lower_node(child, ctx, out)?;
        }
        return Ok(());
    };

    let mut el = Element::new(tag);
    for attr in attributes {
        match attr {
            AttributeContent::Property(prop) => match &prop.value {
                Some(AttributeValue::Literal(value)) => el.set_prop(prop.name.clone(), value.clone()),
                Some(AttributeValue::Expression(_)) => {
                    return Err(unsupported(
                        &format!("attribute expression on <{tag} {}>", prop.name),
                        node,
                    ));
                }
                None => el.set_prop(prop.name.clone(), ""),
            },
            AttributeContent::Expression(_) => {
                return Err(unsupported(&format!("spread attribute on <{tag}>"), node));
            }
        }
    }
    el.children = lower_children(children, ctx)?;
    out.push(el.into());
    Ok(())
}
