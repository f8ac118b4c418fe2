use crate::ir::GraphDocument;
use anyhow::{Context, Result};
use std::path::Path;

/// Parses a single graph document.
pub fn parse_graph(input: &str) -> Result<GraphDocument> {
    let graph: GraphDocument =
        serde_json::from_str(input.trim_start_matches('\u{feff}')).context("invalid graph document")?;
    Ok(graph)
}

/// Parses a JSON Lines dataset, one graph per non-empty line.
///
/// Returns each graph with its 0-based line number.
pub fn parse_graph_lines(input: &str) -> Result<Vec<(usize, GraphDocument)>> {
    let mut graphs = Vec::new();
    for (line_no, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let graph: GraphDocument = serde_json::from_str(line)
            .with_context(|| format!("invalid graph on line {}", line_no + 1))?;
        graphs.push((line_no, graph));
    }
    Ok(graphs)
}

/// Whether a path names a line-oriented dataset rather than a single graph.
pub fn is_dataset_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jsonl" | "mrp" | "ndjson"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{NodeId, Span};

    #[test]
    fn parses_integer_ids_and_null_anchors() {
        let graph = parse_graph(
            r#"{
                "id": "20001001",
                "input": "Pierre Vinken",
                "tops": [1],
                "nodes": [
                    {"id": 0, "label": "proper_q", "anchors": [{"from": 0, "end": 2}]},
                    {"id": 1, "label": "named", "anchors": null},
                    {"id": "x", "label": "extra"}
                ],
                "edges": [{"source": 0, "target": 1, "label": "BV", "post-label": "ignored"}],
                "tokens": [{"index": 0, "form": "Pierre"}, {"index": 1, "form": "Vinken"}]
            }"#,
        )
        .unwrap();
        assert_eq!(graph.id.as_deref(), Some("20001001"));
        assert_eq!(graph.tops, vec![NodeId::from("1")]);
        assert_eq!(graph.nodes[0].anchors, vec![Span::new(0, 2)]);
        assert!(graph.nodes[1].anchors.is_empty());
        assert!(graph.nodes[2].anchors.is_empty());
        assert_eq!(graph.edges[0].source, NodeId::from("0"));
        assert_eq!(graph.tokens[1].form, "Vinken");
    }

    #[test]
    fn dataset_lines_keep_line_numbers() {
        let input = "{\"id\": \"a\"}\n\n{\"id\": \"b\", \"nodes\": []}\n";
        let graphs = parse_graph_lines(input).unwrap();
        let ids: Vec<(usize, Option<&str>)> = graphs
            .iter()
            .map(|(line, g)| (*line, g.id.as_deref()))
            .collect();
        assert_eq!(ids, vec![(0, Some("a")), (2, Some("b"))]);
    }

    #[test]
    fn reports_the_failing_line() {
        let err = parse_graph_lines("{}\n{oops}\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn alternate_format_keeps_the_json_cause() {
        let err = parse_graph(r#"{"nodes": [{"id": 0, "anchors": 5}]}"#).unwrap_err();
        assert_eq!(format!("{err}"), "invalid graph document");
        let chain = format!("{err:#}");
        assert!(chain.starts_with("invalid graph document: "));
        assert!(chain.contains("line 1"));
    }

    #[test]
    fn recognises_dataset_extensions() {
        assert!(is_dataset_path(Path::new("eds.jsonl")));
        assert!(is_dataset_path(Path::new("dm.MRP")));
        assert!(!is_dataset_path(Path::new("graph.json")));
    }
}
