//! # Markdown code extraction
//!
//! The model answers in Markdown. We parse the answer into a small tree with
//! three node kinds and collect the fenced blocks tagged with the target
//! language by walking it depth first.
//!
//! ```rust
//! use codeloop_runner::markdown;
//!
//! let answer = "Intro\n\n```python\nprint(1)\n```\n\n```sh\nls\n```\n";
//! assert_eq!(markdown::extract_source(answer, "python"), "print(1)\n");
//! ```

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};

/// A node of a parsed Markdown document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A fenced code block; `language` is the first word of the info string
    CodeFence { language: String, content: String },
    /// Any block or inline element that holds other nodes
    Container { children: Vec<Node> },
    /// Text and everything else without children
    Leaf(String),
}

impl Node {
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Container { children } => children,
            Node::CodeFence { .. } | Node::Leaf(_) => &[],
        }
    }
}

/// Parse `markdown` into a tree rooted at a container
pub fn parse(markdown: &str) -> Node {
    // Open containers, innermost last. The bottom entry is the document.
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
    // Fence being collected: (language, content)
    let mut fence: Option<(String, String)> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let language = info.split_whitespace().next().unwrap_or("").to_string();
                fence = Some((language, String::new()));
            }
            Event::Start(_) => stack.push(Vec::new()),
            Event::End(_) => {
                if let Some((language, content)) = fence.take() {
                    push(&mut stack, Node::CodeFence { language, content });
                } else if stack.len() > 1 {
                    let children = stack.pop().unwrap_or_default();
                    push(&mut stack, Node::Container { children });
                }
            }
            Event::Text(text) => match fence.as_mut() {
                Some((_, content)) => content.push_str(&text),
                None => push(&mut stack, Node::Leaf(text.into_string())),
            },
            Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                push(&mut stack, Node::Leaf(text.into_string()))
            }
            _ => push(&mut stack, Node::Leaf(String::new())),
        }
    }

    // The parser balances every start with an end, but fold anything left open.
    while stack.len() > 1 {
        let children = stack.pop().unwrap_or_default();
        push(&mut stack, Node::Container { children });
    }

    Node::Container {
        children: stack.pop().unwrap_or_default(),
    }
}

fn push(stack: &mut [Vec<Node>], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.push(node);
    }
}

/// Contents of every fence tagged `language`, in document order
pub fn code_fences<'a>(root: &'a Node, language: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    collect(root, language, &mut found);
    found
}

fn collect<'a>(node: &'a Node, language: &str, found: &mut Vec<&'a str>) {
    if let Node::CodeFence { language: tag, content } = node {
        if tag == language {
            found.push(content);
        }
    }
    for child in node.children() {
        collect(child, language, found);
    }
}

/// Concatenate every `language` fence in `markdown` with no separator
pub fn extract_source(markdown: &str, language: &str) -> String {
    code_fences(&parse(markdown), language).concat()
}
