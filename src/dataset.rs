//! Line-oriented graph collections keyed by graph id.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

use crate::analysis::{is_connected, is_cyclic};
use crate::ir::GraphDocument;
use crate::parser::parse_graph_lines;

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    graphs: Vec<GraphDocument>,
    index: HashMap<String, usize>,
    /// Ids seen more than once; only the first graph with each id is kept.
    pub duplicates: Vec<String>,
}

impl Dataset {
    /// Reads one graph per line. Graphs without an id take their 0-based
    /// line number as id.
    pub fn from_jsonl(input: &str) -> Result<Self> {
        let graphs = parse_graph_lines(input)?.into_iter().map(|(line, mut graph)| {
            if graph.id.is_none() {
                graph.id = Some(line.to_string());
            }
            graph
        });
        Ok(Self::from_graphs(graphs))
    }

    pub fn from_graphs(graphs: impl IntoIterator<Item = GraphDocument>) -> Self {
        let mut dataset = Self::default();
        for (position, mut graph) in graphs.into_iter().enumerate() {
            let id = graph
                .id
                .get_or_insert_with(|| position.to_string())
                .clone();
            if dataset.index.contains_key(&id) {
                tracing::warn!(%id, "duplicate graph id; keeping the first");
                dataset.duplicates.push(id);
                continue;
            }
            dataset.index.insert(id, dataset.graphs.len());
            dataset.graphs.push(graph);
        }
        dataset
    }

    pub fn get(&self, id: &str) -> Option<&GraphDocument> {
        self.index.get(id).map(|&idx| &self.graphs[idx])
    }

    /// Graph ids in file order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.graphs.iter().filter_map(|graph| graph.id.as_deref())
    }

    pub fn graphs(&self) -> &[GraphDocument] {
        &self.graphs
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Ids of graphs that have a node for every label in `labels`.
    pub fn search_labels(&self, labels: &[&str]) -> Vec<&str> {
        self.graphs
            .iter()
            .filter(|graph| {
                labels
                    .iter()
                    .all(|label| graph.nodes.iter().any(|node| node.label == *label))
            })
            .filter_map(|graph| graph.id.as_deref())
            .collect()
    }

    pub fn summary(&self) -> DatasetSummary {
        let mut summary = DatasetSummary {
            graphs: self.graphs.len(),
            duplicates: self.duplicates.len(),
            ..DatasetSummary::default()
        };
        let mut directed_cyclic = 0usize;
        let mut undirected_cyclic = 0usize;
        let mut disconnected = 0usize;

        for graph in &self.graphs {
            summary.total_nodes += graph.nodes.len();
            summary.total_edges += graph.edges.len();
            summary.total_tokens += graph.tokens.len();

            match structure(graph) {
                Ok((directed, undirected, connected)) => {
                    directed_cyclic += usize::from(directed);
                    undirected_cyclic += usize::from(undirected);
                    disconnected += usize::from(!connected);
                }
                Err(err) => {
                    tracing::warn!(id = graph.id.as_deref().unwrap_or(""), %err, "skipping structural checks");
                    summary.invalid += 1;
                }
            }
        }

        let count = summary.graphs;
        summary.average_nodes = average(summary.total_nodes, count);
        summary.average_edges = average(summary.total_edges, count);
        summary.average_tokens = average(summary.total_tokens, count);
        summary.directed_cyclic_percent = percent(directed_cyclic, count);
        summary.undirected_cyclic_percent = percent(undirected_cyclic, count);
        summary.disconnected_percent = percent(disconnected, count);
        summary
    }
}

/// Aggregate counts over a dataset. Averages and percentages are rounded to
/// two decimals; graphs with dangling edges count towards totals only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub graphs: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_tokens: usize,
    pub average_nodes: f64,
    pub average_edges: f64,
    pub average_tokens: f64,
    pub directed_cyclic_percent: f64,
    pub undirected_cyclic_percent: f64,
    pub disconnected_percent: f64,
}

/// (directed cyclic, undirected cyclic, connected)
fn structure(graph: &GraphDocument) -> crate::layout::Result<(bool, bool, bool)> {
    Ok((
        is_cyclic(graph, true)?,
        is_cyclic(graph, false)?,
        is_connected(graph)?,
    ))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn average(total: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(total as f64 / count as f64)
    }
}

fn percent(part: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(part as f64 * 100.0 / count as f64)
    }
}
