use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use graphscape_layout::{LayoutView, LinkKind, SimConfig, SimLink, SimNode};

/// Headless driver for the layout pipeline: loads or synthesizes a resource
/// graph, runs the simulation for a while and prints how it settled.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with {"nodes": [...], "links": [...], "config": {...}}
    #[arg(long)]
    graph: Option<PathBuf>,
    /// Synthetic graph size when no file is given
    #[arg(long, default_value_t = 120)]
    nodes: usize,
    /// Namespace count for the synthetic graph
    #[arg(long, default_value_t = 4)]
    namespaces: usize,
    /// How long to run before printing the summary
    #[arg(long, default_value_t = 3000)]
    duration_ms: u64,
    /// Emit the final zones as JSON instead of the text summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Deserialize)]
struct GraphFile {
    nodes: Vec<SimNode>,
    #[serde(default)]
    links: Vec<SimLink>,
    config: SimConfig,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let (nodes, links, config) = match &args.graph {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let graph: GraphFile = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            (graph.nodes, graph.links, graph.config)
        }
        None => synthetic_graph(args.nodes, args.namespaces),
    };

    let mut view = LayoutView::new()?;
    view.set_graph(&nodes, &links, &config);

    let started = Instant::now();
    let deadline = started + Duration::from_millis(args.duration_ms);
    let mut ready_after = None;
    let mut last_frame = started;
    while Instant::now() < deadline {
        let now = Instant::now();
        view.advance_frame(now.duration_since(last_frame).as_secs_f32());
        last_frame = now;

        if ready_after.is_none() && view.is_ready() {
            ready_after = Some(started.elapsed());
        }
        thread::sleep(Duration::from_millis(16));
    }

    let mut zones = view.zones().to_vec();
    zones.sort_by(|a, b| a.label.cmp(&b.label));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&zones)?);
    } else {
        println!("nodes: {}  links: {}", nodes.len(), links.len());
        match ready_after {
            Some(elapsed) => println!("ready after {:.0} ms", elapsed.as_secs_f64() * 1000.0),
            None => println!("never became ready"),
        }
        println!("kinetic energy at exit: {:.4}", view.kinetic_energy());
        for zone in &zones {
            println!(
                "zone {:<24} centroid ({:>8.1}, {:>8.1})  hull {} vertices",
                zone.label,
                zone.centroid.x,
                zone.centroid.y,
                zone.hull.len()
            );
        }
    }

    view.stop();
    Ok(())
}

/// Shallow ownership tree with a few cross-namespace network links, shaped
/// roughly like a filtered cluster view.
fn synthetic_graph(
    node_count: usize,
    namespace_count: usize,
) -> (Vec<SimNode>, Vec<SimLink>, SimConfig) {
    let namespaces = (0..namespace_count)
        .map(|index| format!("ns-{index}"))
        .collect::<Vec<_>>();

    let mut nodes = Vec::with_capacity(node_count);
    let mut links = Vec::new();
    let mut namespace_sizes: HashMap<String, usize> = HashMap::new();
    let mut cluster_scoped_count = 0usize;

    for index in 0..node_count {
        let namespace = if namespace_count > 0 && index % 7 != 0 {
            Some(namespaces[index % namespace_count].clone())
        } else {
            None
        };
        match &namespace {
            Some(namespace) => *namespace_sizes.entry(namespace.clone()).or_default() += 1,
            None => cluster_scoped_count += 1,
        }

        let kind = if index % 3 == 0 { "deployment" } else { "pod" };
        nodes.push(SimNode {
            id: format!("{kind}-{index}"),
            kind: kind.to_owned(),
            namespace,
        });

        if index > 0 {
            let target = index / 2;
            links.push(SimLink {
                source: nodes[index].id.clone(),
                target: nodes[target].id.clone(),
                kind: if index % 4 == 0 {
                    LinkKind::Network
                } else {
                    LinkKind::Ownership
                },
            });
        }
    }

    let config = SimConfig {
        namespace_projection: true,
        namespaces,
        namespace_sizes,
        cluster_scoped_count,
    };
    (nodes, links, config)
}
