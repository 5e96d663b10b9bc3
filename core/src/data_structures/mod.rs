pub mod graph;
pub mod source;

pub use self::graph::{Graph, GraphError, GraphRecord};
pub use self::source::{load_graphs, GraphSource};
