//! Comment lookup by line: the block above a statement or the comment after it.

use std::collections::{BTreeMap, HashMap};

use tree_sitter::Node;

use super::helpers::node_text;

/// A comment that sits on its own line(s).
#[derive(Debug, Clone)]
struct Block {
    start_row: usize,
    text: String,
}

/// Every comment of one file, indexed by the rows it occupies.
///
/// Rows are 0-based tree-sitter rows. A comment is *standalone* when only
/// whitespace precedes it on its first line; otherwise it *trails* code.
#[derive(Debug, Default)]
pub struct CommentIndex {
    /// Standalone comments keyed by their last row.
    standalone: BTreeMap<usize, Block>,
    /// Trailing comments keyed by their row.
    trailing: HashMap<usize, String>,
    /// Rows that contain only whitespace.
    blank: Vec<bool>,
}

impl CommentIndex {
    pub fn build(root: &Node, source: &[u8]) -> Self {
        let text = String::from_utf8_lossy(source);
        let lines: Vec<&str> = text.lines().collect();
        let mut index = Self {
            blank: lines.iter().map(|l| l.trim().is_empty()).collect(),
            ..Self::default()
        };

        let mut comments = Vec::new();
        collect_comments(root, &mut comments);

        for node in comments {
            let raw = node_text(&node, source);
            let start = node.start_position();
            let end_row = node.end_position().row;
            let before = lines
                .get(start.row)
                .map(|l| l.get(..start.column).unwrap_or(""))
                .unwrap_or("");

            let Some(cleaned) = clean(&raw) else {
                continue;
            };

            if before.trim().is_empty() {
                index.standalone.insert(
                    end_row,
                    Block {
                        start_row: start.row,
                        text: cleaned,
                    },
                );
            } else {
                index.trailing.insert(start.row, cleaned);
            }
        }
        index
    }

    fn is_blank(&self, row: usize) -> bool {
        self.blank.get(row).copied().unwrap_or(false)
    }

    /// Comment block directly above `row`. Blank lines between the block and
    /// the row are tolerated; any code line ends the search.
    pub fn preceding(&self, row: usize) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        let mut r = row;
        while r > 0 {
            r -= 1;
            if let Some(block) = self.standalone.get(&r) {
                parts.push(&block.text);
                r = block.start_row;
            } else if !self.is_blank(r) {
                break;
            }
        }
        parts.reverse();
        join(parts)
    }

    /// Comment after code on `row`.
    pub fn trailing(&self, row: usize) -> Option<String> {
        self.trailing.get(&row).cloned()
    }

    /// Description for a statement spanning `start_row..=end_row`: the block
    /// above it, else a comment trailing its last line.
    pub fn describe(&self, start_row: usize, end_row: usize) -> Option<String> {
        self.preceding(start_row).or_else(|| self.trailing(end_row))
    }

    /// First standalone comment strictly inside `start_row..end_row`.
    pub fn first_within(&self, start_row: usize, end_row: usize) -> Option<String> {
        if start_row + 1 >= end_row {
            return None;
        }
        self.standalone
            .range(start_row + 1..end_row)
            .map(|(_, b)| b)
            .find(|b| b.start_row > start_row && !b.text.is_empty())
            .map(|b| b.text.clone())
    }
}

fn collect_comments<'t>(node: &Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "comment" {
        out.push(*node);
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_comments(&child, out);
        }
    }
}

fn join(parts: Vec<&str>) -> Option<String> {
    let joined = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Strip comment markers. Compiler directives (`//go:generate`) and build
/// tags are not prose and yield `None`.
fn clean(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Some(body) = raw.strip_prefix("//") {
        if body.starts_with("go:") || body.starts_with("nolint") || body.starts_with("+build") {
            return None;
        }
        return Some(body.trim().to_string());
    }

    let body = raw
        .strip_prefix("/*")
        .and_then(|b| b.strip_suffix("*/"))
        .unwrap_or(raw);
    let text = body
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn index(src: &str) -> CommentIndex {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(src, None).unwrap();
        CommentIndex::build(&tree.root_node(), src.as_bytes())
    }

    #[test]
    fn test_preceding_block_joined() {
        let src = "package main\n\n// GetUsers returns all users\n// from the store\nfunc GetUsers() {}\n";
        let idx = index(src);
        assert_eq!(
            idx.preceding(4).as_deref(),
            Some("GetUsers returns all users from the store")
        );
    }

    #[test]
    fn test_code_line_stops_search() {
        let src = "package main\n\n// stale\nvar x = 1\nfunc f() {}\n";
        let idx = index(src);
        assert_eq!(idx.preceding(4), None);
    }

    #[test]
    fn test_blank_line_tolerated() {
        let src = "package main\n\n// Health check\n\nfunc health() {}\n";
        assert_eq!(index(src).preceding(4).as_deref(), Some("Health check"));
    }

    #[test]
    fn test_trailing_and_describe() {
        let src = "package main\n\nfunc main() {\n\tr.GET(\"/a\", a) // list a\n}\n";
        let idx = index(src);
        assert_eq!(idx.trailing(3).as_deref(), Some("list a"));
        assert_eq!(idx.describe(3, 3).as_deref(), Some("list a"));
        // a trailing comment never counts as the block above the next line
        assert_eq!(idx.preceding(4), None);
    }

    #[test]
    fn test_block_comment_and_directive() {
        let src = "package main\n\n/*\n * Create a user\n */\nfunc create() {}\n\n//go:generate foo\nfunc gen() {}\n";
        let idx = index(src);
        assert_eq!(idx.preceding(5).as_deref(), Some("Create a user"));
        assert_eq!(idx.preceding(8), None);
    }

    #[test]
    fn test_first_within() {
        let src = "package main\n\nfunc h() {\n\t// Lists every widget\n\treturn\n}\n";
        let idx = index(src);
        assert_eq!(idx.first_within(2, 5).as_deref(), Some("Lists every widget"));
        assert_eq!(idx.first_within(4, 5), None);
    }
}
