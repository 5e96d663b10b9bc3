//! Boundary to the external graph source
//!
//! Dataset loading lives outside the crate. A source only has to hand out
//! [`GraphRecord`]s by stable index; [`load_graphs`] validates every record
//! before any analysis starts, so a malformed record is fatal up front.

use log::debug;

use super::graph::{Graph, GraphError, GraphRecord};

/// Ordered, indexable collection of graph records
pub trait GraphSource {
    /// Number of records; indices `0..len()` must stay stable for a run
    fn len(&self) -> usize;

    /// Record at `index`, if present
    fn record(&self, index: usize) -> Option<GraphRecord>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GraphSource for [GraphRecord] {
    fn len(&self) -> usize {
        <[GraphRecord]>::len(self)
    }

    fn record(&self, index: usize) -> Option<GraphRecord> {
        self.get(index).cloned()
    }
}

impl GraphSource for Vec<GraphRecord> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn record(&self, index: usize) -> Option<GraphRecord> {
        self.get(index).cloned()
    }
}

/// Convert every record of `source` into a [`Graph`], preserving indices
pub fn load_graphs<S>(source: &S) -> Result<Vec<Graph>, GraphError>
where
    S: GraphSource + ?Sized,
{
    let graphs = (0..source.len())
        .map(|index| {
            let record = source.record(index).ok_or(GraphError::MissingRecord(index))?;
            Graph::try_from(record)
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Loaded {} graphs from source", graphs.len());
    Ok(graphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sparse;

    impl GraphSource for Sparse {
        fn len(&self) -> usize {
            2
        }

        fn record(&self, index: usize) -> Option<GraphRecord> {
            (index == 0).then(GraphRecord::default)
        }
    }

    #[test]
    fn test_load_graphs_preserves_order() {
        let records = vec![
            GraphRecord { nodes: vec![0, 1], edges: vec![(0, 1)], ..Default::default() },
            GraphRecord { nodes: vec![0, 1, 2], edges: vec![], ..Default::default() },
        ];
        let graphs = load_graphs(&records).unwrap();
        assert_eq!(graphs.len(), 2);
        assert_eq!(graphs[0].edge_count(), 1);
        assert_eq!(graphs[1].node_count(), 3);
    }

    #[test]
    fn test_invalid_record_is_fatal() {
        let records = vec![
            GraphRecord { nodes: vec![0], edges: vec![], ..Default::default() },
            GraphRecord { nodes: vec![0], edges: vec![(0, 3)], ..Default::default() },
        ];
        assert!(matches!(load_graphs(records.as_slice()), Err(GraphError::InvalidGraph { .. })));
    }

    #[test]
    fn test_missing_record() {
        assert_eq!(load_graphs(&Sparse), Err(GraphError::MissingRecord(1)));
    }
}
