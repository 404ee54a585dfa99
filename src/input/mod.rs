pub mod geo;
pub mod newick;

pub use geo::{csv_to_feature_collection, instance_from_features, mercator};
pub use newick::{parse_newick, ParsedTree};
