use crate::analysis::analyze;
use crate::config::{Config, LayoutMode, load_config};
use crate::dataset::Dataset;
use crate::ir::GraphDocument;
use crate::layout::compute_layout;
use crate::layout_dump::write_json;
use crate::parser::{is_dataset_path, parse_graph};
use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "sglayout",
    version,
    about = "Layered layout for token-anchored semantic graphs"
)]
pub struct Args {
    /// Input graph (.json) or dataset (.jsonl), '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout mode; overrides the config file
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<LayoutMode>,

    /// Config file (JSON5) with layout geometry
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Graph id to pick from a dataset
    #[arg(short = 'g', long = "graph")]
    pub graph: Option<String>,

    /// Print structural checks instead of a layout
    #[arg(long)]
    pub analyze: bool,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

/// What the input resolved to after dataset selection.
#[derive(Debug)]
enum Input {
    Graph(GraphDocument),
    Dataset(Dataset),
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.mode = mode;
    }

    let (text, is_dataset) = read_input(args.input.as_deref())?;
    let input = select_graph(&text, is_dataset, args.graph.as_deref())?;
    let output = args.output.as_deref();

    match input {
        Input::Dataset(dataset) if args.analyze => write_json(output, &dataset.summary(), args.pretty),
        Input::Dataset(dataset) => Err(anyhow!(
            "dataset holds {} graphs; pick one with --graph",
            dataset.len()
        )),
        Input::Graph(graph) if args.analyze => write_json(output, &analyze(&graph)?, args.pretty),
        Input::Graph(graph) => {
            let layout = layout_graph(&graph, &config)?;
            write_json(output, &layout, args.pretty)
        }
    }
}

fn layout_graph(graph: &GraphDocument, config: &Config) -> Result<crate::layout::LayoutDocument> {
    let layout = compute_layout(graph, config.mode, &config.layout)?;
    tracing::info!(
        graph = graph.id.as_deref().unwrap_or(""),
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        "layout done"
    );
    Ok(layout)
}

/// Installs the stderr subscriber. Returns false when another global
/// subscriber was already set.
fn init_logging(verbose: u8) -> bool {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = &installed {
        eprintln!("warning: logging not initialised: {err}");
    }
    installed.is_ok()
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|err| anyhow!("cannot read {}: {err}", path.display()))?;
        return Ok((content, is_dataset_path(path)));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn select_graph(text: &str, is_dataset: bool, id: Option<&str>) -> Result<Input> {
    if !is_dataset {
        if id.is_some() {
            tracing::warn!("--graph only applies to datasets; ignoring it");
        }
        return Ok(Input::Graph(parse_graph(text)?));
    }

    let dataset = Dataset::from_jsonl(text)?;
    match id {
        Some(id) => dataset
            .get(id)
            .cloned()
            .map(Input::Graph)
            .ok_or_else(|| anyhow!("no graph with id {id:?} in dataset")),
        None if dataset.len() == 1 => Ok(Input::Graph(dataset.graphs()[0].clone())),
        None => Ok(Input::Dataset(dataset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = concat!(
        r#"{"id": "a", "nodes": [{"id": 0, "label": "x"}]}"#,
        "\n",
        r#"{"id": "b", "nodes": [{"id": 0, "label": "y"}, {"id": 1, "label": "z"}]}"#,
        "\n",
    );

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "sglayout", "-i", "eds.jsonl", "-m", "tree", "-g", "b", "--pretty", "-vv",
        ])
        .unwrap();
        assert_eq!(args.mode, Some(LayoutMode::Tree));
        assert_eq!(args.graph.as_deref(), Some("b"));
        assert!(args.pretty);
        assert_eq!(args.verbose, 2);
        assert!(!args.analyze);
    }

    #[test]
    fn second_logging_init_is_reported_not_fatal() {
        init_logging(0);
        assert!(!init_logging(2));
    }

    #[test]
    fn picks_graph_from_dataset_by_id() {
        let Input::Graph(graph) = select_graph(DATASET, true, Some("b")).unwrap() else {
            panic!("expected a single graph");
        };
        assert_eq!(graph.nodes.len(), 2);
        assert!(select_graph(DATASET, true, Some("zzz")).is_err());
    }

    #[test]
    fn multi_graph_dataset_without_id_stays_a_dataset() {
        assert!(matches!(
            select_graph(DATASET, true, None).unwrap(),
            Input::Dataset(_)
        ));
        let single = r#"{"id": "only", "nodes": []}"#;
        assert!(matches!(
            select_graph(single, true, None).unwrap(),
            Input::Graph(_)
        ));
    }

    #[test]
    fn plain_input_is_a_single_graph() {
        let input = select_graph(r#"{"nodes": [{"id": 1}]}"#, false, None).unwrap();
        assert!(matches!(input, Input::Graph(g) if g.nodes.len() == 1));
    }
}
