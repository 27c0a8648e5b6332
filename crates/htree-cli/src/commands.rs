//! Subcommand implementations.
//!
//! Each command returns its rendered output so `main` only has to print it.

use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use htree_common::types::{SeqNum, TimeRangeCondition};
use htree_storage::{BasicCodec, BasicInterval, HistoryTree};

use crate::config::CliConfig;
use crate::formatter::{self, OutputFormat};

fn open_tree(path: &Path, config: &CliConfig) -> Result<HistoryTree<BasicCodec>> {
    HistoryTree::open_with_config(path, &config.tree_config(), BasicCodec)
        .with_context(|| format!("cannot open history file {}", path.display()))
}

/// Prints the header and summary of a history file.
pub fn info(path: &Path, config: &CliConfig, format: OutputFormat) -> Result<String> {
    let header = HistoryTree::<BasicCodec>::read_header(path)
        .with_context(|| format!("cannot read header of {}", path.display()))?;
    let tree = open_tree(path, config)?;
    Ok(formatter::format_info(&header, &tree.stats(), format))
}

/// Lists every node of a history file.
pub fn nodes(path: &Path, config: &CliConfig, format: OutputFormat) -> Result<String> {
    let tree = open_tree(path, config)?;
    let nodes = (0..tree.node_count())
        .map(|seq| {
            tree.node(SeqNum::new(seq as i32))
                .map(|node| node.info())
                .with_context(|| format!("cannot read node #{seq}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(formatter::format_nodes(&nodes, format))
}

/// Runs a range query, optionally restricted to one attribute.
pub fn query(
    path: &Path,
    config: &CliConfig,
    start: i64,
    end: i64,
    attribute: Option<i32>,
    format: OutputFormat,
) -> Result<String> {
    let tree = open_tree(path, config)?;
    let condition = TimeRangeCondition::range(start, end);
    debug!(%condition, ?attribute, "running query");

    let mut found = tree
        .get_matching_intervals(condition, |i: &BasicInterval| {
            attribute.map_or(true, |a| i.attribute == a)
        })
        .collect::<Result<Vec<_>, _>>()?;
    found.sort_by_key(|i| (i.start, i.end));
    Ok(formatter::format_intervals(&found, format))
}

/// Builds a synthetic tree of `count` intervals and closes it.
///
/// Intervals start in increasing order with random gaps and durations, so
/// most of them land in leaves while the longer ones climb the branch.
pub fn generate(path: &Path, config: &CliConfig, count: usize, seed: u64) -> Result<String> {
    let tree = HistoryTree::create(path, config.tree_config(), BasicCodec)
        .with_context(|| format!("cannot create history file {}", path.display()))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut time = tree.tree_start();
    for _ in 0..count {
        time += rng.gen_range(0..10);
        let duration = rng.gen_range(0..100);
        let attribute = rng.gen_range(0..16);
        let value: Vec<u8> = (0..rng.gen_range(0..32)).map(|_| rng.gen()).collect();
        tree.insert(BasicInterval::new(time, time + duration, attribute, value))?;
    }

    tree.close_tree(tree.tree_end())?;
    info!(path = %path.display(), count, seed, "generated history file");
    Ok(tree.stats().to_string())
}
