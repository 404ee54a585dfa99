//! Newick parsing into the nested instance-tree form.
//!
//! The parser is a plain byte walker. It builds an intermediate raw tree,
//! then numbers vertices post-order (a leaf takes a fresh id, an internal
//! vertex takes `right.id + 1`), accumulates branch lengths from the root
//! down, and rejects any vertex that is not binary. A missing branch length
//! counts as +infinity, which later disables branch-length-proportional
//! drawing for the whole tree.

use crate::error::{Error, Result};
use crate::model::instance::TreeNode;

/// A parsed Newick tree plus the side tables the binder needs.
#[derive(Debug, Clone)]
pub struct ParsedTree {
    pub title: String,
    pub tree: TreeNode,
    pub num_leaves: usize,
    /// Leaf labels in Newick appearance order (empty string for an unlabelled leaf).
    pub names_order: Vec<String>,
    pub max_cum_branch_length: f64,
}

/// Parse a Newick string. `title` is carried through to the instance record.
pub fn parse_newick(input: &str, title: &str) -> Result<ParsedTree> {
    let mut parser = Parser { input: input.as_bytes(), pos: 0 };
    parser.skip_ws();
    if parser.peek().is_none() {
        return Err(Error::input("newick", "empty input"));
    }
    let raw = parser.parse_subtree()?;
    parser.skip_ws();
    if parser.peek() == Some(b';') {
        parser.advance();
    }
    parser.skip_ws();
    if let Some(c) = parser.peek() {
        return Err(Error::input(
            "newick",
            format!("unexpected trailing character '{}' at byte {}", c as char, parser.pos),
        ));
    }

    let mut builder = TreeBuilder::default();
    let tree = builder.convert(raw, 0.0)?;
    Ok(ParsedTree {
        title: title.to_string(),
        tree,
        num_leaves: builder.names_order.len(),
        names_order: builder.names_order,
        max_cum_branch_length: builder.max_cum_branch_length,
    })
}

struct RawNode {
    label: Option<String>,
    branch_length: Option<f64>,
    children: Vec<RawNode>,
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.advance();
        }
    }

    /// Read a label token up to the next structural character.
    fn read_token(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, b'(' | b')' | b',' | b':' | b';') {
                break;
            }
            self.advance();
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .unwrap_or("")
            .trim()
            .to_string()
    }

    fn read_number(&mut self) -> Result<f64> {
        self.skip_ws();
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.advance();
        }
        while matches!(
            self.peek(),
            Some(b'0'..=b'9') | Some(b'.') | Some(b'e') | Some(b'E') | Some(b'+') | Some(b'-')
        ) {
            self.advance();
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::input("newick", format!("expected a branch length at byte {start}")))
    }

    fn parse_subtree(&mut self) -> Result<RawNode> {
        self.skip_ws();
        let mut node = RawNode { label: None, branch_length: None, children: Vec::new() };

        if self.peek() == Some(b'(') {
            self.advance();
            loop {
                node.children.push(self.parse_subtree()?);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => self.advance(),
                    Some(b')') => {
                        self.advance();
                        break;
                    }
                    Some(c) => {
                        return Err(Error::input(
                            "newick",
                            format!("expected ',' or ')' at byte {}, found '{}'", self.pos, c as char),
                        ));
                    }
                    None => return Err(Error::input("newick", "unbalanced '(': input ended inside a subtree")),
                }
            }
            // Internal label or support value after ')': read and discard.
            self.skip_ws();
            if !matches!(self.peek(), Some(b':') | Some(b';') | Some(b',') | Some(b')') | None) {
                let _ = self.read_token();
            }
        } else {
            let token = self.read_token();
            if token.is_empty() {
                return Err(Error::input("newick", format!("expected a leaf label at byte {}", self.pos)));
            }
            node.label = Some(token);
        }

        self.skip_ws();
        if self.peek() == Some(b':') {
            self.advance();
            node.branch_length = Some(self.read_number()?);
        }

        Ok(node)
    }
}

struct TreeBuilder {
    next_id: u32,
    names_order: Vec<String>,
    max_cum_branch_length: f64,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder { next_id: 0, names_order: Vec::new(), max_cum_branch_length: f64::NEG_INFINITY }
    }
}

impl TreeBuilder {
    /// Post-order conversion; assigns ids and cumulative branch lengths.
    fn convert(&mut self, raw: RawNode, parent_cum: f64) -> Result<TreeNode> {
        let cum = parent_cum + raw.branch_length.unwrap_or(f64::INFINITY);

        match raw.children.len() {
            0 => {
                let site_id = self.names_order.len();
                self.names_order.push(raw.label.clone().unwrap_or_default());
                if cum > self.max_cum_branch_length {
                    self.max_cum_branch_length = cum;
                }
                let id = self.next_id;
                self.next_id += 1;
                Ok(TreeNode {
                    leaf: true,
                    id,
                    cum_branch_length: cum,
                    label: raw.label,
                    site_id: Some(site_id),
                    left: None,
                    right: None,
                })
            }
            _ => {
                let [left_raw, right_raw]: [RawNode; 2] =
                    raw.children.try_into().map_err(|children: Vec<RawNode>| {
                        Error::input(
                            "newick",
                            format!(
                                "vertex with {} children: only strictly binary trees are supported",
                                children.len()
                            ),
                        )
                    })?;
                let left = self.convert(left_raw, cum)?;
                let right = self.convert(right_raw, cum)?;
                let id = self.next_id;
                self.next_id += 1;
                Ok(TreeNode {
                    leaf: false,
                    id,
                    cum_branch_length: cum,
                    label: None,
                    site_id: None,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                })
            }
        }
    }
}
