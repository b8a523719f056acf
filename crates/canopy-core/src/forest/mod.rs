pub mod classifier;
pub mod params;
pub mod tree;

pub use classifier::RandomForestClassifier;
pub use params::ForestParams;
pub use tree::{DecisionTree, Node, TreeConfig};
