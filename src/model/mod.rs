pub mod instance;
pub mod tree;

pub use instance::{Instance, LeaderType, SitePos, SolveOptions, Solution, TreeNode};
pub use tree::{GeoTree, Point, Site, Vertex, VertexHeader, VertexIndex, VertexKind};
