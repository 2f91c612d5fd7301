//! Syntax highlighting for code blocks.
//!
//! Each token is colored for both a light and a dark theme through the
//! `--shiki-light` / `--shiki-dark` CSS variables, so the page stylesheet
//! picks one without re-rendering. The `pre` also gets a copy button.

use super::{PassContext, TransformError, TreePass};
use crate::tree::{Element, Node};
use inkpress_core::Warning;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use syntect::easy::ScopeRangeIterator;
use syntect::highlighting::{Color, Highlighter, Theme, ThemeSet};
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);
static NO_THEME: Lazy<Theme> = Lazy::new(Theme::default);

/// Languages rendered as plain text without a warning.
const PLAIN: [&str; 5] = ["text", "txt", "plain", "plaintext", "none"];

/// Fence names mapped onto a bundled syntax.
const ALIASES: [(&str, &str); 11] = [
    ("ts", "js"),
    ("typescript", "js"),
    ("tsx", "js"),
    ("jsx", "js"),
    ("mjs", "js"),
    ("cjs", "js"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("yml", "yaml"),
];

/// Theme pair used for highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightThemes {
    /// Theme name for light mode.
    pub light: String,
    /// Theme name for dark mode.
    pub dark: String,
}

impl Default for HighlightThemes {
    fn default() -> Self {
        Self {
            light: "InspiredGitHub".to_string(),
            dark: "base16-ocean.dark".to_string(),
        }
    }
}

/// The highlighting pass.
pub struct Highlight {
    light: &'static Theme,
    dark: &'static Theme,
    skip_languages: Vec<String>,
}

impl Default for Highlight {
    fn default() -> Self {
        Self::new(&HighlightThemes::default())
    }
}

impl Highlight {
    /// Uses the named bundled themes; unknown names fall back to the defaults.
    pub fn new(themes: &HighlightThemes) -> Self {
        let defaults = HighlightThemes::default();
        Self {
            light: theme(&themes.light, &defaults.light),
            dark: theme(&themes.dark, &defaults.dark),
            skip_languages: vec!["mermaid".to_string()],
        }
    }

    /// Languages left for the diagram pass (or the client) to handle.
    pub fn skip_languages(mut self, languages: Vec<String>) -> Self {
        self.skip_languages = languages;
        self
    }

    fn highlight_all(&self, nodes: &mut [Node], ctx: &mut PassContext) -> Result<(), TransformError> {
        for node in nodes {
            let Node::Element(el) = node else {
                continue;
            };
            if el.tag == "pre" {
                self.highlight_pre(el, ctx)?;
                continue;
            }
            self.highlight_all(&mut el.children, ctx)?;
        }
        Ok(())
    }

    fn highlight_pre(&self, pre: &mut Element, ctx: &mut PassContext) -> Result<(), TransformError> {
        if pre.props.contains_key("data-theme") || pre.props.contains_key("data-diagram-error") {
            return Ok(());
        }
        let [Node::Element(code)] = pre.children.as_mut_slice() else {
            return Ok(());
        };
        if code.tag != "code" {
            return Ok(());
        }
        let language = code.language().map(str::to_string);
        if let Some(lang) = &language
            && self.skip_languages.iter().any(|skip| skip == lang)
        {
            return Ok(());
        }

        let syntax = match language.as_deref() {
            None => SYNTAXES.find_syntax_plain_text(),
            Some(lang) if PLAIN.contains(&lang) => SYNTAXES.find_syntax_plain_text(),
            Some(lang) => find_syntax(lang).unwrap_or_else(|| {
                log::debug!("no syntax for '{lang}', using plain text");
                ctx.diagnostics.add_warning(Warning::UnknownLanguage {
                    language: lang.to_string(),
                });
                SYNTAXES.find_syntax_plain_text()
            }),
        };

        let source = code.text_content();
        let label = language.as_deref().unwrap_or("plaintext");
        code.children = self.tokenize(&source, syntax).map_err(|message| {
            TransformError::Highlight {
                language: label.to_string(),
                message,
            }
        })?;
        code.set_prop("data-language", label);
        code.set_prop("data-theme", "light dark");
        code.set_prop("style", "display: grid;");

        pre.set_prop("data-language", label);
        pre.set_prop("data-theme", "light dark");
        pre.set_prop("tabindex", "0");
        pre.children.push(copy_button());
        Ok(())
    }

    /// One `span[data-line]` per source line, joined by newlines.
    fn tokenize(&self, source: &str, syntax: &SyntaxReference) -> Result<Vec<Node>, String> {
        let light = Highlighter::new(self.light);
        let dark = Highlighter::new(self.dark);
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();

        let source = source.strip_suffix('\n').unwrap_or(source);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(source) {
            let ops = state.parse_line(line, &SYNTAXES).map_err(|err| err.to_string())?;
            let text = line.trim_end_matches(['\n', '\r']);
            let mut tokens: Vec<(String, String)> = Vec::new();
            for (range, op) in ScopeRangeIterator::new(&ops, line) {
                stack.apply(op).map_err(|err| format!("{err:?}"))?;
                let end = range.end.min(text.len());
                if range.start >= end {
                    continue;
                }
                let style = format!(
                    "--shiki-light:{};--shiki-dark:{}",
                    css_color(light.style_for_stack(stack.as_slice()).foreground),
                    css_color(dark.style_for_stack(stack.as_slice()).foreground),
                );
                let piece = &text[range.start..end];
                match tokens.last_mut() {
                    Some((last_style, last_text)) if *last_style == style => last_text.push_str(piece),
                    _ => tokens.push((style, piece.to_string())),
                }
            }

            let spans: Vec<Node> = tokens
                .into_iter()
                .map(|(style, text)| {
                    Element::new("span")
                        .with_prop("style", style)
                        .with_child(Node::text(text))
                        .into()
                })
                .collect();
            if !lines.is_empty() {
                lines.push(Node::text("\n"));
            }
            lines.push(
                Element::new("span")
                    .with_prop("data-line", "")
                    .with_children(spans)
                    .into(),
            );
        }
        Ok(lines)
    }
}

impl TreePass for Highlight {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn transform(&self, nodes: &mut Vec<Node>, ctx: &mut PassContext) -> Result<(), TransformError> {
        self.highlight_all(nodes, ctx)
    }
}

fn theme(name: &str, fallback: &str) -> &'static Theme {
    THEMES
        .themes
        .get(name)
        .or_else(|| {
            log::warn!("unknown highlight theme '{name}', using '{fallback}'");
            THEMES.themes.get(fallback)
        })
        .unwrap_or(&NO_THEME)
}

fn find_syntax(lang: &str) -> Option<&'static SyntaxReference> {
    let lower = lang.to_ascii_lowercase();
    let token = ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, target)| *target)
        .unwrap_or(&lower);
    SYNTAXES.find_syntax_by_token(token)
}

fn css_color(color: Color) -> String {
    if color.a == 0xff {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", color.r, color.g, color.b, color.a)
    }
}

/// `button.rehype-pretty-copy`; the client script copies the sibling
/// `code` text and toggles `rehype-pretty-copied`.
pub(crate) fn copy_button() -> Node {
    Element::new("button")
        .with_prop("type", "button")
        .with_prop("class", "rehype-pretty-copy")
        .with_prop("aria-label", "Copy code")
        .with_prop("title", "Copy code")
        .with_child(Element::new("span").with_prop("class", "ready"))
        .with_child(Element::new("span").with_prop("class", "success"))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{text_content, to_html};

    fn block(lang: Option<&str>, source: &str) -> Vec<Node> {
        let mut code = Element::new("code").with_child(Node::text(source));
        if let Some(lang) = lang {
            code.set_prop("class", format!("language-{lang}"));
        }
        vec![Element::new("pre").with_child(code).into()]
    }

    fn run(nodes: &mut Vec<Node>) -> PassContext {
        let mut ctx = PassContext::default();
        Highlight::default().transform(nodes, &mut ctx).unwrap();
        ctx
    }

    #[test]
    fn rust_block_gets_dual_theme_tokens() {
        let source = "fn main() {\n    println!(\"hi\");\n}\n";
        let mut nodes = block(Some("rust"), source);
        let ctx = run(&mut nodes);
        assert!(!ctx.diagnostics.has_warnings());

        let pre = nodes[0].as_element().unwrap();
        assert_eq!(pre.prop("data-language"), Some("rust"));
        assert_eq!(pre.prop("data-theme"), Some("light dark"));
        let code = pre.children[0].as_element().unwrap();
        // Text is preserved exactly, minus the final newline.
        assert_eq!(code.text_content(), source.trim_end());
        let lines = code
            .children
            .iter()
            .filter(|n| n.as_element().is_some_and(|el| el.props.contains_key("data-line")))
            .count();
        assert_eq!(lines, 3);

        let html = to_html(&nodes);
        assert!(html.contains("--shiki-light:#"), "{html}");
        assert!(html.contains(";--shiki-dark:#"), "{html}");
        // The source is not copied into attributes.
        assert!(!html.contains("data-code"), "{html}");
    }

    #[test]
    fn copy_button_is_appended() {
        let mut nodes = block(Some("rust"), "let x = 1;");
        run(&mut nodes);
        let html = to_html(&nodes);
        assert!(html.ends_with(
            "<button aria-label=\"Copy code\" class=\"rehype-pretty-copy\" title=\"Copy code\" type=\"button\"><span class=\"ready\"></span><span class=\"success\"></span></button></pre>"
        ), "{html}");
    }

    #[test]
    fn unknown_language_falls_back_with_warning() {
        let mut nodes = block(Some("brainfuck"), "+++.");
        let ctx = run(&mut nodes);
        assert_eq!(
            ctx.diagnostics.warnings,
            vec![Warning::UnknownLanguage {
                language: "brainfuck".into()
            }]
        );
        assert_eq!(text_content(&nodes), "+++.");
    }

    #[test]
    fn aliases_and_plain_text() {
        let mut nodes = block(Some("ts"), "const a = 1;");
        assert!(!run(&mut nodes).diagnostics.has_warnings());
        let mut nodes = block(None, "plain");
        let ctx = run(&mut nodes);
        assert!(!ctx.diagnostics.has_warnings());
        assert_eq!(nodes[0].as_element().unwrap().prop("data-language"), Some("plaintext"));
    }

    #[test]
    fn diagrams_and_flagged_blocks_are_not_claimed() {
        let mut nodes = block(Some("mermaid"), "graph TD");
        let before = nodes.clone();
        run(&mut nodes);
        assert_eq!(nodes, before);

        let mut nodes = block(Some("rust"), "x");
        nodes[0]
            .as_element_mut()
            .unwrap()
            .set_prop("data-diagram-error", "");
        let before = nodes.clone();
        run(&mut nodes);
        assert_eq!(nodes, before);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut nodes = block(Some("rust"), "let x = 1;\nlet y = 2;\n");
        run(&mut nodes);
        let once = nodes.clone();
        run(&mut nodes);
        assert_eq!(nodes, once);
    }
}
