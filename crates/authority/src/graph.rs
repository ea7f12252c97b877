//! Citation graph representation
//!
//! Documents are mapped to contiguous indices and adjacency is stored as
//! sorted, deduplicated index vectors. Both directions are filled from the
//! same edge enumeration, so `b ∈ out(a)` iff `a ∈ in(b)`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Edge in the citation graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CitationEdge {
    /// Citing document ID
    pub citing_document_id: Uuid,

    /// Cited document ID
    pub cited_document_id: Uuid,

    /// Extraction strength; carried for a weighted variant, unused by scoring
    pub strength: Option<f64>,
}

impl CitationEdge {
    pub fn new(citing: Uuid, cited: Uuid) -> Self {
        Self {
            citing_document_id: citing,
            cited_document_id: cited,
            strength: None,
        }
    }
}

/// In-memory citation graph
#[derive(Debug, Clone, Default)]
pub struct CitationGraph {
    /// Index -> document id
    documents: Vec<Uuid>,

    /// Document id -> index
    index: HashMap<Uuid, usize>,

    /// Adjacency list: index -> indices it cites
    outgoing: Vec<Vec<usize>>,

    /// Reverse adjacency: index -> indices citing it
    incoming: Vec<Vec<usize>>,

    edge_count: usize,
}

/// Counters from building a graph out of a corpus snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub documents: usize,
    pub edges: usize,
    pub duplicate_edges: usize,
    pub dropped_edges: usize,
}

impl CitationGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a corpus from one edge enumeration.
    ///
    /// Documents are indexed in ascending id order so the layout does not
    /// depend on enumeration order. Edges touching a document outside the
    /// corpus are dropped.
    pub fn from_corpus<D, E>(documents: D, edges: E) -> (Self, BuildSummary)
    where
        D: IntoIterator<Item = Uuid>,
        E: IntoIterator<Item = CitationEdge>,
    {
        let mut ids: Vec<Uuid> = documents.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let mut graph = Self::new();
        for id in ids {
            graph.add_document(id);
        }

        let mut summary = BuildSummary::default();
        for edge in edges {
            let (citing, cited) = (edge.citing_document_id, edge.cited_document_id);
            match (graph.index.get(&citing), graph.index.get(&cited)) {
                (Some(&from), Some(&to)) => {
                    if !graph.link(from, to) {
                        summary.duplicate_edges += 1;
                    }
                }
                _ => {
                    debug!(%citing, %cited, "Dropping citation edge outside the corpus");
                    summary.dropped_edges += 1;
                }
            }
        }

        summary.documents = graph.node_count();
        summary.edges = graph.edge_count();
        (graph, summary)
    }

    /// Add a document without edges; returns its index
    pub fn add_document(&mut self, id: Uuid) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }

        let idx = self.documents.len();
        self.documents.push(id);
        self.index.insert(id, idx);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    /// Add an edge to the graph, adding missing documents.
    ///
    /// Returns false if the edge was already present.
    pub fn add_edge(&mut self, citing: Uuid, cited: Uuid) -> bool {
        let from = self.add_document(citing);
        let to = self.add_document(cited);
        self.link(from, to)
    }

    fn link(&mut self, from: usize, to: usize) -> bool {
        match self.outgoing[from].binary_search(&to) {
            Ok(_) => false,
            Err(pos) => {
                self.outgoing[from].insert(pos, to);
                if let Err(pos) = self.incoming[to].binary_search(&from) {
                    self.incoming[to].insert(pos, from);
                }
                self.edge_count += 1;
                true
            }
        }
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.documents.len()
    }

    /// Get distinct edge count
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Index of a document
    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Document at an index
    pub fn document_id(&self, idx: usize) -> Uuid {
        self.documents[idx]
    }

    /// All documents in index order
    pub fn documents(&self) -> &[Uuid] {
        &self.documents
    }

    /// Indices cited by the document at `idx`
    pub fn out_indices(&self, idx: usize) -> &[usize] {
        &self.outgoing[idx]
    }

    /// Indices citing the document at `idx`
    pub fn in_indices(&self, idx: usize) -> &[usize] {
        &self.incoming[idx]
    }

    /// Get documents cited by this document
    pub fn out_links(&self, id: Uuid) -> Vec<Uuid> {
        self.index_of(id)
            .map(|idx| self.outgoing[idx].iter().map(|&i| self.documents[i]).collect())
            .unwrap_or_default()
    }

    /// Get documents citing this document
    pub fn in_links(&self, id: Uuid) -> Vec<Uuid> {
        self.index_of(id)
            .map(|idx| self.incoming[idx].iter().map(|&i| self.documents[i]).collect())
            .unwrap_or_default()
    }

    /// Incoming citation count
    pub fn in_degree(&self, idx: usize) -> usize {
        self.incoming[idx].len()
    }

    /// Outgoing citation count
    pub fn out_degree(&self, idx: usize) -> usize {
        self.outgoing[idx].len()
    }

    /// Documents that cite nothing
    pub fn dangling_count(&self) -> usize {
        self.outgoing.iter().filter(|links| links.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_graph_construction() {
        let mut graph = CitationGraph::new();

        let a = id(1);
        let b = id(2);
        let c = id(3);

        // A cites B, B cites C
        graph.add_edge(a, b);
        graph.add_edge(b, c);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.out_links(a), vec![b]);
        assert_eq!(graph.in_links(b), vec![a]);
        assert_eq!(graph.out_links(b), vec![c]);
        assert!(graph.out_links(c).is_empty());
    }

    #[test]
    fn test_citation_counts() {
        let mut graph = CitationGraph::new();

        let a = id(1);
        let b = id(2);
        let c = id(3);

        // Both A and C cite B
        graph.add_edge(a, b);
        graph.add_edge(c, b);

        let b_idx = graph.index_of(b).unwrap();
        let a_idx = graph.index_of(a).unwrap();
        assert_eq!(graph.in_degree(b_idx), 2);
        assert_eq!(graph.out_degree(a_idx), 1);
        assert_eq!(graph.dangling_count(), 1);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let (graph, summary) = CitationGraph::from_corpus(
            [id(1), id(2)],
            [CitationEdge::new(id(1), id(2)), CitationEdge::new(id(1), id(2))],
        );

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(summary.duplicate_edges, 1);
        assert_eq!(graph.in_links(id(2)), vec![id(1)]);
    }

    #[test]
    fn test_isolated_documents_have_empty_sets() {
        let (graph, summary) =
            CitationGraph::from_corpus([id(3), id(1), id(2)], Vec::<CitationEdge>::new());

        assert_eq!(summary.documents, 3);
        assert_eq!(summary.edges, 0);
        for doc in [id(1), id(2), id(3)] {
            let idx = graph.index_of(doc).expect("every corpus document is indexed");
            assert!(graph.out_indices(idx).is_empty());
            assert!(graph.in_indices(idx).is_empty());
        }
        // Indexed in ascending id order
        assert_eq!(graph.documents(), &[id(1), id(2), id(3)]);
    }

    #[test]
    fn test_edges_outside_corpus_dropped() {
        let (graph, summary) = CitationGraph::from_corpus(
            [id(1), id(2)],
            [CitationEdge::new(id(1), id(2)), CitationEdge::new(id(1), id(99))],
        );

        assert_eq!(graph.node_count(), 2);
        assert_eq!(summary.dropped_edges, 1);
        assert_eq!(graph.out_links(id(1)), vec![id(2)]);
    }

    #[test]
    fn test_self_citation_kept() {
        let (graph, _) = CitationGraph::from_corpus([id(1)], [CitationEdge::new(id(1), id(1))]);
        assert_eq!(graph.out_links(id(1)), vec![id(1)]);
        assert_eq!(graph.in_links(id(1)), vec![id(1)]);
    }

    #[test]
    fn test_views_are_consistent() {
        let edges: Vec<CitationEdge> = [(1, 2), (2, 3), (3, 1), (4, 1), (4, 2), (2, 4)]
            .iter()
            .map(|&(a, b)| CitationEdge::new(id(a), id(b)))
            .collect();
        let (graph, _) = CitationGraph::from_corpus((1..=5).map(id), edges);

        for from in 0..graph.node_count() {
            for &to in graph.out_indices(from) {
                assert!(graph.in_indices(to).contains(&from));
            }
            for &src in graph.in_indices(from) {
                assert!(graph.out_indices(src).contains(&from));
            }
        }
        assert_eq!(graph.edge_count(), 6);
    }
}
