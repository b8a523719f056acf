pub mod schema;
pub mod split;
pub mod table;

pub use schema::{BINARY_CLASSES, PIMA_FEATURES, PIMA_LABEL, Schema};
pub use split::{Split, train_test_split};
pub use table::{Dataset, FeatureMatrix};
