//! The in-memory solve model: an arena of tree vertices plus the bound sites.
//!
//! The tree is cyclic by reference (children point up, parents point down),
//! so vertices live in a contiguous arena and refer to each other by
//! [`VertexIndex`]. Every vertex carries a shared header (id, dense index,
//! subtree width, cumulative branch length, ancestor list) next to its
//! kind-specific payload. The model is built once per solve and never
//! mutated afterwards; a solve only produces a separate turn vector.
//!
//! The ancestor list of a vertex is ordered from the immediate parent up to
//! the root, each entry tagged with whether the vertex lies in that
//! ancestor's left subtree. It is the basis of the leaf-order coordinates:
//! for a candidate turn vector `t`, a leaf's final slot is
//! `initial_offset + sum(parent_coef[j] * t[ancestor_j])`, a linear function
//! of `t`, which is exactly what makes the crossing constraints linear.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::instance::{Instance, LeaderType, SolveOptions, TreeNode};

/// Index of a vertex in the tree arena.
pub type VertexIndex = usize;

/// A point in drawing-box coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Fields shared by all vertex kinds.
#[derive(Debug, Clone)]
pub struct VertexHeader {
    /// Stable id from the instance tree; key of the output maps.
    pub id: u32,
    /// Dense index among internals (root included) or among leaves.
    pub total_index: usize,
    /// Number of descendant leaves (1 for a leaf).
    pub subtree_width: usize,
    pub cum_branch_length: f64,
    /// `(ancestor, in_left_subtree)`, ordered immediate parent first.
    pub ancestors: Vec<(VertexIndex, bool)>,
}

#[derive(Debug, Clone)]
pub enum VertexKind {
    Root {
        children: (VertexIndex, VertexIndex),
    },
    Internal {
        parent: VertexIndex,
        is_left_child: bool,
        children: (VertexIndex, VertexIndex),
    },
    Leaf {
        parent: VertexIndex,
        is_left_child: bool,
        /// Index of the bound site.
        site: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub header: VertexHeader,
    pub kind: VertexKind,
}

impl Vertex {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, VertexKind::Leaf { .. })
    }

    pub fn children(&self) -> Option<(VertexIndex, VertexIndex)> {
        match self.kind {
            VertexKind::Root { children } | VertexKind::Internal { children, .. } => Some(children),
            VertexKind::Leaf { .. } => None,
        }
    }
}

/// A site with its back-reference to the bound leaf.
#[derive(Debug, Clone)]
pub struct Site {
    pub pos: Point,
    pub leaf: Option<VertexIndex>,
}

/// The tree model for one solve.
#[derive(Debug, Clone)]
pub struct GeoTree {
    vertices: Vec<Vertex>,
    root: VertexIndex,
    /// Dense internal index -> arena index; the root sits at index 0.
    internals: Vec<VertexIndex>,
    /// Dense leaf index -> arena index, in Newick appearance order.
    leaves: Vec<VertexIndex>,
    sites: Vec<Site>,
    top_line: (Point, Point),
    leader_type: LeaderType,
    po_gap: f64,
}

impl GeoTree {
    /// Build the solve model from an instance record.
    ///
    /// Leaf slots are evenly spaced on a top line spanning
    /// `map_width / (n+1) .. n * map_width / (n+1)` at y = 0.
    pub fn from_instance(instance: &Instance, options: &SolveOptions) -> Result<GeoTree> {
        options.validate()?;
        let n_sites = instance.sites.len();
        if n_sites == 0 {
            return Err(Error::input("instance", "no sites"));
        }
        if instance.tree.leaf {
            return Err(Error::input("instance", "the tree root must be an internal vertex"));
        }

        let leaf_x_scale = instance.map_width / (n_sites as f64 + 1.0);
        let top_line = (
            Point { x: leaf_x_scale, y: 0.0 },
            Point { x: n_sites as f64 * leaf_x_scale, y: 0.0 },
        );

        let mut tree = GeoTree {
            vertices: Vec::with_capacity(2 * n_sites),
            root: 0,
            internals: Vec::with_capacity(n_sites),
            leaves: Vec::with_capacity(n_sites),
            sites: instance
                .sites
                .iter()
                .map(|s| Site { pos: Point { x: s.x, y: s.y }, leaf: None })
                .collect(),
            top_line,
            leader_type: options.leader_type,
            po_gap: options.po_gap,
        };

        tree.root = tree.build_vertex(&instance.tree, None)?;
        if tree.leaves.len() != tree.sites.len() {
            return Err(Error::BindingMismatch(format!(
                "{} leaves bound against {} sites",
                tree.leaves.len(),
                tree.sites.len()
            )));
        }
        Ok(tree)
    }

    /// Bottom-up recursive construction: allocate, recurse, then fix up
    /// children and subtree width from the recursion results.
    fn build_vertex(&mut self, node: &TreeNode, parent: Option<(VertexIndex, bool)>) -> Result<VertexIndex> {
        let ancestors = match parent {
            None => Vec::new(),
            Some((p, is_left)) => {
                let above = &self.vertices[p].header.ancestors;
                let mut list = Vec::with_capacity(above.len() + 1);
                list.push((p, is_left));
                list.extend_from_slice(above);
                list
            }
        };

        if node.leaf {
            let (p, is_left) = parent
                .ok_or_else(|| Error::input("instance", "the tree root must be an internal vertex"))?;
            let site = node
                .site_id
                .ok_or_else(|| Error::input("instance", format!("leaf {} without site_id", node.id)))?;
            if site >= self.sites.len() {
                return Err(Error::input("instance", format!("leaf {} references unknown site {site}", node.id)));
            }
            if self.sites[site].leaf.is_some() {
                return Err(Error::input("instance", format!("site {site} is bound by two leaves")));
            }

            let index = self.vertices.len();
            self.vertices.push(Vertex {
                header: VertexHeader {
                    id: node.id,
                    total_index: self.leaves.len(),
                    subtree_width: 1,
                    cum_branch_length: node.cum_branch_length,
                    ancestors,
                },
                kind: VertexKind::Leaf { parent: p, is_left_child: is_left, site },
            });
            self.leaves.push(index);
            self.sites[site].leaf = Some(index);
            return Ok(index);
        }

        let (left_node, right_node) = match (node.left.as_deref(), node.right.as_deref()) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                return Err(Error::input(
                    "instance",
                    format!("internal vertex {} is missing a child", node.id),
                ));
            }
        };

        let index = self.vertices.len();
        self.vertices.push(Vertex {
            header: VertexHeader {
                id: node.id,
                total_index: self.internals.len(),
                subtree_width: 0,
                cum_branch_length: node.cum_branch_length,
                ancestors,
            },
            kind: match parent {
                None => VertexKind::Root { children: (0, 0) },
                Some((p, is_left)) => {
                    VertexKind::Internal { parent: p, is_left_child: is_left, children: (0, 0) }
                }
            },
        });
        self.internals.push(index);

        let left = self.build_vertex(left_node, Some((index, true)))?;
        let right = self.build_vertex(right_node, Some((index, false)))?;

        let width = self.vertices[left].header.subtree_width + self.vertices[right].header.subtree_width;
        let vertex = &mut self.vertices[index];
        vertex.header.subtree_width = width;
        match &mut vertex.kind {
            VertexKind::Root { children } | VertexKind::Internal { children, .. } => {
                *children = (left, right);
            }
            VertexKind::Leaf { .. } => unreachable!(),
        }
        Ok(index)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self.vertices[index]
    }

    pub fn root(&self) -> VertexIndex {
        self.root
    }

    /// Dense internal index -> arena index (root at position 0).
    pub fn internals(&self) -> &[VertexIndex] {
        &self.internals
    }

    /// Dense leaf index -> arena index, in Newick appearance order.
    pub fn leaves(&self) -> &[VertexIndex] {
        &self.leaves
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    pub fn num_internals(&self) -> usize {
        self.internals.len()
    }

    pub fn top_line(&self) -> (Point, Point) {
        self.top_line
    }

    pub fn leader_type(&self) -> LeaderType {
        self.leader_type
    }

    pub fn po_gap(&self) -> f64 {
        self.po_gap
    }

    pub fn subtree_width(&self, index: VertexIndex) -> usize {
        self.vertices[index].header.subtree_width
    }

    /// The leaf bound to `site`.
    pub fn leaf_of_site(&self, site: usize) -> Result<VertexIndex> {
        self.sites
            .get(site)
            .and_then(|s| s.leaf)
            .ok_or_else(|| Error::Internal(format!("site {site} is not bound to a leaf")))
    }

    /// Drawing-box x of leaf slot `index`.
    pub fn slot_x(&self, index: usize) -> f64 {
        let (start, end) = self.top_line;
        if self.num_leaves() < 2 {
            return start.x;
        }
        start.x + index as f64 * (end.x - start.x) / (self.num_leaves() as f64 - 1.0)
    }

    /// Position along the top line, scaled to `[0, |L|-1]`, of drawing-box x.
    pub fn top_line_index_of_x(&self, x: f64) -> f64 {
        let (start, end) = self.top_line;
        (x - start.x) / (end.x - start.x) * (self.num_leaves() as f64 - 1.0)
    }

    // ── Leaf-order coordinates ────────────────────────────────────────────────

    /// Per-ancestor contribution of a turn to this leaf's slot, as
    /// `(internal total_index, coefficient)` pairs.
    ///
    /// Turning an ancestor moves the leaf right by the width of the
    /// ancestor's right subtree when the leaf sits on the left, and left by
    /// the width of the left subtree when it sits on the right.
    pub fn parent_coef(&self, leaf: VertexIndex) -> Vec<(usize, f64)> {
        let ancestors = &self.vertices[leaf].header.ancestors;
        let mut coef = Vec::with_capacity(ancestors.len());
        for &(ancestor, in_left) in ancestors {
            let (left, right) = self.vertices[ancestor]
                .children()
                .expect("ancestor list contains a leaf");
            let value = if in_left {
                self.subtree_width(right) as f64
            } else {
                -(self.subtree_width(left) as f64)
            };
            coef.push((self.vertices[ancestor].header.total_index, value));
        }
        coef
    }

    /// Slot of the leaf when no vertex is turned.
    pub fn initial_offset(&self, leaf: VertexIndex) -> usize {
        let mut offset = 0;
        for &(ancestor, in_left) in &self.vertices[leaf].header.ancestors {
            if !in_left {
                let (left, _) = self.vertices[ancestor]
                    .children()
                    .expect("ancestor list contains a leaf");
                offset += self.subtree_width(left);
            }
        }
        offset
    }

    /// Slot of the leaf under a turn vector indexed by internal total_index.
    pub fn order_index_after_turns(&self, leaf: VertexIndex, turns: &[bool]) -> usize {
        let mut index = self.initial_offset(leaf) as i64;
        for (column, value) in self.parent_coef(leaf) {
            if turns[column] {
                index += value as i64;
            }
        }
        debug_assert!(index >= 0 && (index as usize) < self.num_leaves());
        index as usize
    }

    /// Lowest common ancestor of two leaves, returned as the
    /// `(ancestor, first_leaf_in_left_subtree)` entry from the first leaf's
    /// ancestor list.
    pub fn lowest_common_ancestor(&self, a: VertexIndex, b: VertexIndex) -> Result<(VertexIndex, bool)> {
        let ancestors_a = &self.vertices[a].header.ancestors;
        let ancestors_b = &self.vertices[b].header.ancestors;
        for &(ancestor_a, in_left) in ancestors_a {
            for &(ancestor_b, _) in ancestors_b {
                if ancestor_a == ancestor_b {
                    return Ok((ancestor_a, in_left));
                }
            }
        }
        Err(Error::Internal(format!(
            "vertices {a} and {b} have no common ancestor"
        )))
    }

    /// Translate a solution's `leaf_pos` map into per-site slots.
    pub fn site_slots(&self, leaf_pos: &BTreeMap<String, usize>) -> Result<Vec<usize>> {
        let mut slots = Vec::with_capacity(self.sites.len());
        for site in 0..self.sites.len() {
            let leaf = self.leaf_of_site(site)?;
            let id = self.vertices[leaf].header.id.to_string();
            let slot = leaf_pos
                .get(&id)
                .copied()
                .ok_or_else(|| Error::Internal(format!("leaf id {id} missing from leaf_pos")))?;
            slots.push(slot);
        }
        Ok(slots)
    }
}
