mod flat;

pub use flat::{FlatVectorIndex, INDEX_FILE};
