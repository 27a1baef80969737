//! Rich text (portable text) normalization and HTML rendering
//!
//! The store returns the body as a JSON array of typed blocks. Each block is
//! normalized into a closed [`Node`] type and every node maps to exactly one
//! HTML fragment. Normalization never fails: anything unrecognized becomes
//! [`Node::Unknown`] and goes through the default renderer.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::post::ImageRef;
use crate::helpers::{html_escape, safe_href};
use crate::store::ImageUrlBuilder;

/// Deepest list nesting rendered; deeper items render at this level
pub const MAX_LIST_DEPTH: usize = 10;

/// A single body node
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum Node {
    Heading {
        level: HeadingLevel,
        content: Vec<Inline>,
    },
    ListItem {
        style: ListStyle,
        level: usize,
        content: Vec<Inline>,
    },
    /// Any other text block (normal paragraphs, quotes, unknown styles)
    Block {
        style: BlockStyle,
        content: Vec<Inline>,
    },
    Image(ImageRef),
    Unknown {
        kind: String,
        content: Vec<Inline>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Bullet,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStyle {
    Normal,
    Blockquote,
    Other(String),
}

/// Inline content of a text block
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text {
        text: String,
        decorators: Vec<Decorator>,
    },
    Link {
        href: String,
        children: Vec<Inline>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decorator {
    Strong,
    Em,
    Code,
    Underline,
    StrikeThrough,
}

impl Decorator {
    fn parse(mark: &str) -> Option<Self> {
        match mark {
            "strong" => Some(Self::Strong),
            "em" => Some(Self::Em),
            "code" => Some(Self::Code),
            "underline" => Some(Self::Underline),
            "strike-through" => Some(Self::StrikeThrough),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Em => "em",
            Self::Code => "code",
            Self::Underline => "u",
            Self::StrikeThrough => "s",
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from_value(&value)
    }
}

impl Node {
    /// Normalize one raw block
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Node::Unknown {
                kind: json_kind(value).to_string(),
                content: Vec::new(),
            };
        };

        match str_field(obj, "_type").unwrap_or("") {
            "block" => block_node(obj),
            "image" => Node::Image(serde_json::from_value(value.clone()).unwrap_or_default()),
            other => Node::Unknown {
                kind: other.to_string(),
                content: inline_content(obj),
            },
        }
    }
}

fn block_node(obj: &Map<String, Value>) -> Node {
    let content = inline_content(obj);

    if let Some(list) = str_field(obj, "listItem") {
        let style = if list == "number" {
            ListStyle::Number
        } else {
            ListStyle::Bullet
        };
        let level = obj
            .get("level")
            .and_then(Value::as_u64)
            .unwrap_or(1)
            .clamp(1, MAX_LIST_DEPTH as u64) as usize;
        return Node::ListItem {
            style,
            level,
            content,
        };
    }

    match str_field(obj, "style").unwrap_or("normal") {
        "h1" => Node::Heading {
            level: HeadingLevel::H1,
            content,
        },
        "h2" => Node::Heading {
            level: HeadingLevel::H2,
            content,
        },
        "h3" => Node::Heading {
            level: HeadingLevel::H3,
            content,
        },
        "normal" => Node::Block {
            style: BlockStyle::Normal,
            content,
        },
        "blockquote" => Node::Block {
            style: BlockStyle::Blockquote,
            content,
        },
        other => Node::Block {
            style: BlockStyle::Other(other.to_string()),
            content,
        },
    }
}

/// Turn `children` spans plus `markDefs` link annotations into inline nodes
fn inline_content(obj: &Map<String, Value>) -> Vec<Inline> {
    let links: HashMap<&str, &str> = obj
        .get("markDefs")
        .and_then(Value::as_array)
        .map(|defs| {
            defs.iter()
                .filter_map(Value::as_object)
                .filter(|d| str_field(d, "_type") == Some("link"))
                .filter_map(|d| Some((str_field(d, "_key")?, str_field(d, "href")?)))
                .collect()
        })
        .unwrap_or_default();

    let mut content: Vec<Inline> = Vec::new();
    let children = obj.get("children").and_then(Value::as_array);

    for child in children.into_iter().flatten() {
        let Some(span) = child.as_object() else {
            continue;
        };
        let Some(text) = str_field(span, "text") else {
            continue;
        };

        let mut decorators = Vec::new();
        let mut href = None;
        let marks = span.get("marks").and_then(Value::as_array);
        for mark in marks.into_iter().flatten().filter_map(Value::as_str) {
            if let Some(d) = Decorator::parse(mark) {
                decorators.push(d);
            } else if let Some(h) = links.get(mark) {
                href = Some(h.to_string());
            }
        }

        let text = Inline::Text {
            text: text.to_string(),
            decorators,
        };

        match href {
            Some(href) => {
                // Adjacent spans under the same annotation form one link
                if let Some(Inline::Link {
                    href: last,
                    children,
                }) = content.last_mut()
                {
                    if *last == href {
                        children.push(text);
                        continue;
                    }
                }
                content.push(Inline::Link {
                    href,
                    children: vec![text],
                });
            }
            None => content.push(text),
        }
    }

    content
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders normalized body nodes to HTML
#[derive(Debug, Clone)]
pub struct RichTextRenderer {
    images: ImageUrlBuilder,
}

impl RichTextRenderer {
    pub fn new(images: ImageUrlBuilder) -> Self {
        Self { images }
    }

    /// Render a whole body, grouping consecutive list items into lists
    pub fn render(&self, nodes: &[Node]) -> String {
        let mut html = String::new();
        let mut lists = ListStack::default();

        for node in nodes {
            match node {
                Node::ListItem {
                    style,
                    level,
                    content,
                } => lists.item(&mut html, *style, *level, &self.render_inlines(content)),
                other => {
                    lists.close_all(&mut html);
                    html.push_str(&self.render_node(other));
                }
            }
        }
        lists.close_all(&mut html);

        html
    }

    /// Render one node to its fragment
    pub fn render_node(&self, node: &Node) -> String {
        match node {
            Node::Heading { level, content } => {
                let (tag, class) = match level {
                    HeadingLevel::H1 => ("h1", "text-2xl font-bold my-5"),
                    HeadingLevel::H2 => ("h2", "text-xl font-bold my-5"),
                    HeadingLevel::H3 => ("h3", "text-l font-bold my-5"),
                };
                format!(
                    r#"<{tag} class="{class}">{}</{tag}>"#,
                    self.render_inlines(content)
                )
            }
            Node::ListItem { content, .. } => {
                format!(
                    r#"<li class="ml-4 list-disc">{}</li>"#,
                    self.render_inlines(content)
                )
            }
            Node::Block { style, content } => match style {
                BlockStyle::Blockquote => {
                    format!("<blockquote>{}</blockquote>", self.render_inlines(content))
                }
                BlockStyle::Normal | BlockStyle::Other(_) => {
                    format!("<p>{}</p>", self.render_inlines(content))
                }
            },
            Node::Image(image) => match self.images.resolve(image) {
                Ok(src) => format!(
                    r#"<img class="my-5" src="{}" alt="{}">"#,
                    html_escape(&src),
                    html_escape(image.alt.as_deref().unwrap_or(""))
                ),
                Err(e) => {
                    tracing::debug!("Skipping body image: {}", e);
                    String::new()
                }
            },
            Node::Unknown { kind, content } => {
                tracing::debug!("No renderer for node type {:?}, using default", kind);
                if content.is_empty() {
                    String::new()
                } else {
                    format!("<p>{}</p>", self.render_inlines(content))
                }
            }
        }
    }

    fn render_inlines(&self, inlines: &[Inline]) -> String {
        inlines.iter().map(render_inline).collect()
    }
}

fn render_inline(inline: &Inline) -> String {
    match inline {
        Inline::Text { text, decorators } => {
            let mut html = html_escape(text).replace('\n', "<br/>");
            for d in decorators {
                html = format!("<{tag}>{html}</{tag}>", tag = d.tag());
            }
            html
        }
        Inline::Link { href, children } => {
            let inner: String = children.iter().map(render_inline).collect();
            match safe_href(href) {
                Some(href) => format!(
                    r#"<a href="{}" class="text-blue-500 hover:underline">{}</a>"#,
                    html_escape(href),
                    inner
                ),
                None => inner,
            }
        }
    }
}

/// Open `<ul>`/`<ol>` elements while rendering list items
#[derive(Default)]
struct ListStack {
    /// Style of each open list and whether its last `<li>` is still open
    open: Vec<(ListStyle, bool)>,
}

impl ListStack {
    fn item(&mut self, html: &mut String, style: ListStyle, level: usize, content: &str) {
        let level = level.clamp(1, MAX_LIST_DEPTH);
        while self.open.len() > level {
            self.close_one(html);
        }
        if self.open.len() == level && self.open.last().map(|(s, _)| *s) != Some(style) {
            self.close_one(html);
        }
        let at_level = self.open.len() == level;
        if let Some((_, li_open)) = self.open.last_mut() {
            if at_level && *li_open {
                html.push_str("</li>");
                *li_open = false;
            }
        }
        while self.open.len() < level {
            html.push_str(list_open_tag(style));
            self.open.push((style, false));
        }

        html.push_str(r#"<li class="ml-4 list-disc">"#);
        html.push_str(content);
        if let Some((_, li_open)) = self.open.last_mut() {
            *li_open = true;
        }
    }

    fn close_one(&mut self, html: &mut String) {
        if let Some((style, li_open)) = self.open.pop() {
            if li_open {
                html.push_str("</li>");
            }
            html.push_str(list_close_tag(style));
        }
    }

    fn close_all(&mut self, html: &mut String) {
        while !self.open.is_empty() {
            self.close_one(html);
        }
    }
}

fn list_open_tag(style: ListStyle) -> &'static str {
    match style {
        ListStyle::Bullet => "<ul>",
        ListStyle::Number => "<ol>",
    }
}

fn list_close_tag(style: ListStyle) -> &'static str {
    match style {
        ListStyle::Bullet => "</ul>",
        ListStyle::Number => "</ol>",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer() -> RichTextRenderer {
        RichTextRenderer::new(ImageUrlBuilder::new("proj", "production"))
    }

    fn block(style: &str, text: &str) -> Value {
        json!({
            "_type": "block",
            "style": style,
            "markDefs": [],
            "children": [{ "_type": "span", "text": text, "marks": [] }]
        })
    }

    fn render(body: Value) -> String {
        let nodes: Vec<Node> = serde_json::from_value(body).unwrap();
        renderer().render(&nodes)
    }

    #[test]
    fn test_headings() {
        let html = render(json!([block("h1", "One"), block("h2", "Two"), block("h3", "Three")]));
        assert_eq!(
            html,
            concat!(
                r#"<h1 class="text-2xl font-bold my-5">One</h1>"#,
                r#"<h2 class="text-xl font-bold my-5">Two</h2>"#,
                r#"<h3 class="text-l font-bold my-5">Three</h3>"#
            )
        );
    }

    #[test]
    fn test_normal_and_fallback_styles() {
        let html = render(json!([block("normal", "Body"), block("h5", "Small"), block("blockquote", "Q")]));
        assert_eq!(html, "<p>Body</p><p>Small</p><blockquote>Q</blockquote>");
    }

    #[test]
    fn test_list_items_are_grouped() {
        let item = |text: &str, list: &str, level: u64| {
            json!({
                "_type": "block", "style": "normal", "listItem": list, "level": level,
                "children": [{ "_type": "span", "text": text }]
            })
        };
        let html = render(json!([
            item("a", "bullet", 1),
            item("b", "bullet", 1),
            item("b1", "bullet", 2),
            item("c", "number", 1),
            block("normal", "after")
        ]));
        assert_eq!(
            html,
            concat!(
                r#"<ul><li class="ml-4 list-disc">a</li><li class="ml-4 list-disc">b"#,
                r#"<ul><li class="ml-4 list-disc">b1</li></ul></li></ul>"#,
                r#"<ol><li class="ml-4 list-disc">c</li></ol>"#,
                "<p>after</p>"
            )
        );
    }

    #[test]
    fn test_list_depth_is_bounded() {
        let html = render(json!([{
            "_type": "block", "style": "normal", "listItem": "bullet", "level": 2_000_000u64,
            "children": [{ "_type": "span", "text": "deep" }]
        }]));
        assert_eq!(html.matches("<ul>").count(), MAX_LIST_DEPTH);
        assert_eq!(html.matches("</ul>").count(), MAX_LIST_DEPTH);
        assert!(html.len() < 200);

        let node = Node::ListItem {
            style: ListStyle::Number,
            level: usize::MAX,
            content: Vec::new(),
        };
        let html = renderer().render(&[node]);
        assert_eq!(html.matches("<ol>").count(), MAX_LIST_DEPTH);
    }

    #[test]
    fn test_links_and_decorators() {
        let html = render(json!([{
            "_type": "block",
            "style": "normal",
            "markDefs": [{ "_key": "k1", "_type": "link", "href": "https://example.com" }],
            "children": [
                { "_type": "span", "text": "Read ", "marks": [] },
                { "_type": "span", "text": "this", "marks": ["k1", "strong"] },
                { "_type": "span", "text": " post", "marks": ["k1"] },
                { "_type": "span", "text": "!", "marks": ["em"] }
            ]
        }]));
        assert_eq!(
            html,
            r#"<p>Read <a href="https://example.com" class="text-blue-500 hover:underline"><strong>this</strong> post</a><em>!</em></p>"#
        );
    }

    #[test]
    fn test_unsafe_link_renders_text_only() {
        let html = render(json!([{
            "_type": "block",
            "markDefs": [{ "_key": "x", "_type": "link", "href": "javascript:alert(1)" }],
            "children": [{ "_type": "span", "text": "click", "marks": ["x"] }]
        }]));
        assert_eq!(html, "<p>click</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render(json!([block("normal", "<script>alert('x')</script>\nnext")]));
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;<br/>next</p>"
        );
    }

    #[test]
    fn test_image_node() {
        let html = render(json!([{
            "_type": "image",
            "alt": "A cat",
            "asset": { "_ref": "image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg", "_type": "reference" }
        }]));
        assert_eq!(
            html,
            r#"<img class="my-5" src="https://cdn.sanity.io/images/proj/production/Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000.jpg" alt="A cat">"#
        );
    }

    #[test]
    fn test_unknown_nodes_use_default_renderer() {
        let nodes: Vec<Node> = serde_json::from_value(json!([
            { "_type": "youtube", "url": "https://youtu.be/x" },
            { "_type": "callout", "children": [{ "_type": "span", "text": "Heads up" }] },
            "stray string",
            { "_type": "image" }
        ]))
        .unwrap();

        assert_eq!(
            nodes[0],
            Node::Unknown {
                kind: "youtube".to_string(),
                content: vec![]
            }
        );
        assert!(matches!(&nodes[2], Node::Unknown { kind, .. } if kind == "string"));
        assert_eq!(renderer().render(&nodes), "<p>Heads up</p>");
    }
}
