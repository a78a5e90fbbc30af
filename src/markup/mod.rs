//! Renders the small markup dialect used in assistant replies into typed nodes.
//!
//! Recognized: `**bold**`, `*italic*`, `1. ` numbered lines, `- ` / `* ` bullet
//! lines and newlines. Anything else is literal text. The output never carries
//! markup strings, so the presentation layer only decides styling.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s(.+)$").expect("numbered item pattern"));
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*]\s(.+)$").expect("bullet item pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "children", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

impl Inline {
    /// Flattens nested emphasis into runs of uniformly styled text.
    pub fn spans(&self) -> Vec<StyledSpan> {
        let mut out = Vec::new();
        self.collect_spans(SpanStyle::default(), &mut out);
        out
    }

    fn collect_spans(&self, style: SpanStyle, out: &mut Vec<StyledSpan>) {
        match self {
            Self::Text(text) => out.push(StyledSpan {
                text: text.clone(),
                style,
            }),
            Self::Bold(children) => {
                let style = SpanStyle { bold: true, ..style };
                for child in children {
                    child.collect_spans(style, out);
                }
            }
            Self::Italic(children) => {
                let style = SpanStyle {
                    italic: true,
                    ..style
                };
                for child in children {
                    child.collect_spans(style, out);
                }
            }
        }
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Bold(children) | Self::Italic(children) => {
                for child in children {
                    child.push_plain_text(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMarker {
    Numbered,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub marker: ListMarker,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct List {
    pub items: Vec<ListItem>,
}

impl List {
    pub fn is_ordered(&self) -> bool {
        self.items
            .iter()
            .all(|item| item.marker == ListMarker::Numbered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Node {
    Inline(Inline),
    LineBreak,
    List(List),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedMarkup {
    pub nodes: Vec<Node>,
}

impl RenderedMarkup {
    /// Text content with breaks as `\n` and one line per list item.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Inline(inline) => inline.push_plain_text(&mut out),
                Node::LineBreak => out.push('\n'),
                Node::List(list) => {
                    for item in &list.items {
                        if !out.is_empty() && !out.ends_with('\n') {
                            out.push('\n');
                        }
                        for inline in &item.content {
                            inline.push_plain_text(&mut out);
                        }
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}

enum SourceLine<'a> {
    Item(ListItem),
    Text(&'a str),
}

// List prefixes are claimed before emphasis pairing, so `* a *b*` is a bullet
// holding an italic word rather than an italic span opened by the marker.
fn classify_line(line: &str) -> SourceLine<'_> {
    if let Some(captures) = NUMBERED_ITEM.captures(line) {
        return SourceLine::Item(ListItem {
            marker: ListMarker::Numbered,
            content: render_inline(&captures[1]),
        });
    }
    if let Some(captures) = BULLET_ITEM.captures(line) {
        return SourceLine::Item(ListItem {
            marker: ListMarker::Bullet,
            content: render_inline(&captures[1]),
        });
    }
    SourceLine::Text(line)
}

struct NodeBuilder {
    nodes: Vec<Node>,
    after_text: bool,
}

impl NodeBuilder {
    fn push_text_line(&mut self, line: &str) {
        if self.after_text {
            self.nodes.push(Node::LineBreak);
        }
        self.nodes
            .extend(render_inline(line).into_iter().map(Node::Inline));
        self.after_text = true;
    }

    fn push_item(&mut self, item: ListItem) {
        match self.nodes.last_mut() {
            Some(Node::List(list)) => list.items.push(item),
            _ => self.nodes.push(Node::List(List { items: vec![item] })),
        }
        self.after_text = false;
    }

    fn continues_list(&self) -> bool {
        matches!(self.nodes.last(), Some(Node::List(_)))
    }
}

/// Converts assistant markup into nodes. Pure; every call starts from scratch.
pub fn render_markup(text: &str) -> RenderedMarkup {
    let mut builder = NodeBuilder {
        nodes: Vec::new(),
        after_text: false,
    };
    // Whitespace-only lines are held back: between two list items they vanish.
    let mut held_blank: Vec<&str> = Vec::new();

    for raw_line in text.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        match classify_line(line) {
            SourceLine::Item(item) => {
                if builder.continues_list() {
                    held_blank.clear();
                } else {
                    for blank in held_blank.drain(..) {
                        builder.push_text_line(blank);
                    }
                }
                builder.push_item(item);
            }
            SourceLine::Text(line) if line.trim().is_empty() => held_blank.push(line),
            SourceLine::Text(line) => {
                for blank in held_blank.drain(..) {
                    builder.push_text_line(blank);
                }
                builder.push_text_line(line);
            }
        }
    }
    for blank in held_blank {
        builder.push_text_line(blank);
    }

    RenderedMarkup {
        nodes: builder.nodes,
    }
}

enum Token {
    Char(char),
    Bold(Vec<Inline>, bool),
}

impl Token {
    fn is_star(&self) -> bool {
        matches!(self, Self::Char('*'))
    }

    fn blocks_italic(&self) -> bool {
        match self {
            Self::Char(ch) => *ch == '*',
            Self::Bold(_, has_star) => *has_star,
        }
    }
}

/// Bold first, then italic over what bold left behind.
pub fn render_inline(line: &str) -> Vec<Inline> {
    let mut tokens = Vec::new();
    let mut rest = line;
    while !rest.is_empty() {
        // `****` has no content to embolden and stays literal.
        if let Some(after_empty) = rest.strip_prefix("****") {
            tokens.extend("****".chars().map(Token::Char));
            rest = after_empty;
            continue;
        }
        if let Some(after_open) = rest.strip_prefix("**") {
            if let Some(close) = after_open.find("**") {
                let inner = &after_open[..close];
                let children = italicize(inner.chars().map(Token::Char).collect());
                tokens.push(Token::Bold(children, has_loose_star(inner)));
                rest = &after_open[close + 2..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            tokens.push(Token::Char(ch));
        }
        rest = chars.as_str();
    }
    italicize(tokens)
}

// Asterisks left in bold content once its own italics are consumed.
fn has_loose_star(inner: &str) -> bool {
    let italicized = italicize(inner.chars().map(Token::Char).collect());
    italicized.iter().any(|inline| match inline {
        Inline::Text(text) => text.contains('*'),
        _ => false,
    })
}

fn italicize(tokens: Vec<Token>) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut tokens: Vec<Option<Token>> = tokens.into_iter().map(Some).collect();
    let mut index = 0;

    while index < tokens.len() {
        if let Some(close) = italic_close(&tokens, index) {
            flush_text(&mut text, &mut out);
            let inner: Vec<Token> = tokens[index + 1..close]
                .iter_mut()
                .filter_map(Option::take)
                .collect();
            out.push(Inline::Italic(tokens_to_inlines(inner)));
            index = close + 1;
            continue;
        }

        match tokens[index].take() {
            Some(Token::Char(ch)) => text.push(ch),
            Some(Token::Bold(children, _)) => {
                flush_text(&mut text, &mut out);
                out.push(Inline::Bold(children));
            }
            None => {}
        }
        index += 1;
    }
    flush_text(&mut text, &mut out);
    out
}

fn italic_close(tokens: &[Option<Token>], open: usize) -> Option<usize> {
    let is_star = |at: usize| matches!(tokens.get(at), Some(Some(token)) if token.is_star());

    if !is_star(open) || (open > 0 && is_star(open - 1)) {
        return None;
    }
    let close = open
        + 1
        + tokens[open + 1..]
            .iter()
            .position(|token| token.as_ref().is_some_and(Token::blocks_italic))?;
    if close == open + 1 || !is_star(close) || is_star(close + 1) {
        return None;
    }
    Some(close)
}

fn tokens_to_inlines(tokens: Vec<Token>) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut text = String::new();
    for token in tokens {
        match token {
            Token::Char(ch) => text.push(ch),
            Token::Bold(children, _) => {
                flush_text(&mut text, &mut out);
                out.push(Inline::Bold(children));
            }
        }
    }
    flush_text(&mut text, &mut out);
    out
}

fn flush_text(text: &mut String, out: &mut Vec<Inline>) {
    if !text.is_empty() {
        out.push(Inline::Text(std::mem::take(text)));
    }
}
