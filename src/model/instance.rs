//! Wire records exchanged with the outside world.
//!
//! An [`Instance`] is the parse-stage output: the tree in nested JSON form,
//! sites already projected into the drawing box, and the Mercator bounding
//! box a background map would be fetched for. A [`Solution`] is the
//! optimize-stage output: the turn flags, the final leaf slots and the
//! crossing count. Field names follow the established JSON schema, so several
//! fields carry `serde` renames.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Leader style connecting a leaf slot to its site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderType {
    /// Straight line from slot to site.
    #[serde(rename = "s")]
    Straight,
    /// Polyline: horizontal from the site, then vertical up to the slot.
    #[serde(rename = "po")]
    Orthogonal,
}

impl FromStr for LeaderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "s" => Ok(LeaderType::Straight),
            "po" => Ok(LeaderType::Orthogonal),
            other => Err(Error::config("leader type", format!("unknown leader type '{other}' (expected 's' or 'po')"))),
        }
    }
}

/// Options for one solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    pub leader_type: LeaderType,
    /// Two sites closer than this in y share a horizontal corridor (`po` only).
    pub po_gap: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions { leader_type: LeaderType::Straight, po_gap: 0.0 }
    }
}

impl SolveOptions {
    pub fn validate(&self) -> Result<()> {
        if self.po_gap < 0.0 || !self.po_gap.is_finite() {
            return Err(Error::config("po gap", format!("must be a non-negative number, got {}", self.po_gap)));
        }
        Ok(())
    }
}

/// A site position in drawing-box coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SitePos {
    pub x: f64,
    pub y: f64,
}

/// One node of the instance tree in its nested JSON form.
///
/// Leaves carry `label` and `site_id`; internal nodes carry `left` and
/// `right`. Ids follow the post-order scheme of the Newick parser: each leaf
/// takes a fresh id, an internal node takes `right.id + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub leaf: bool,
    pub id: u32,
    #[serde(with = "infinite_float")]
    pub cum_branch_length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<TreeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode {
    /// Topology-only Newick rendition (labels, no branch lengths).
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(&mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, out: &mut String) {
        if self.leaf {
            if let Some(ref label) = self.label {
                out.push_str(label);
            }
        } else {
            out.push('(');
            if let Some(ref left) = self.left {
                left.write_newick(out);
            }
            out.push(',');
            if let Some(ref right) = self.right {
                right.write_newick(out);
            }
            out.push(')');
        }
    }
}

/// Parse-stage output: everything the optimizer and the renderer need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub title: String,
    pub tree: TreeNode,
    /// Site positions in drawing-box coordinates, indexed by `site_id`.
    pub sites: Vec<SitePos>,
    pub num_leaves: usize,
    #[serde(rename = "maxCumBranchLength", with = "infinite_float")]
    pub max_cum_branch_length: f64,
    // Padded Mercator bbox, kept for background map fetches.
    pub mercator_min_x: f64,
    pub mercator_min_y: f64,
    pub mercator_max_x: f64,
    pub mercator_max_y: f64,
    pub left_coord: f64,
    pub top_coord: f64,
    pub map_width: f64,
    pub map_height: f64,
}

/// Optimize-stage output.
///
/// `num_intersections` is `-1` for the null (preview) solution. Maps are
/// keyed by the stringified vertex id, matching the JSON object keys the
/// renderer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub num_intersections: i64,
    pub leaf_pos: BTreeMap<String, usize>,
    pub should_rotate: BTreeMap<String, bool>,
    #[serde(rename = "lType")]
    pub l_type: LeaderType,
}

/// Serialize +-infinity as JSON `null` and read `null` back as +infinity.
///
/// Missing branch lengths are +inf internally, and JSON has no `Infinity`.
mod infinite_float {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if v.is_finite() {
            serializer.serialize_f64(*v)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
