//! Output formatting for tree summaries, node listings and query results.
//!
//! Supports table and JSON output formats.

use comfy_table::{Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

use htree_storage::historytree::{NodeInfo, TreeHeader, TreeStats};
use htree_storage::BasicInterval;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses a format name from the configuration file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

fn end_label(end: Option<i64>) -> String {
    end.map_or_else(|| "...".to_string(), |e| e.to_string())
}

/// Formats a file header together with the tree summary.
pub fn format_info(header: &TreeHeader, stats: &TreeStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(&json!({ "header": header, "tree": stats })),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["Property", "Value"]);
            let rows: [(&str, String); 10] = [
                ("magic", format!("{:#010x}", header.magic)),
                ("file version", header.file_version.to_string()),
                ("provider version", header.provider_version.to_string()),
                ("block size", header.block_size.to_string()),
                ("max children", header.max_children.to_string()),
                ("nodes", header.node_count.to_string()),
                ("depth", stats.depth.to_string()),
                ("root", header.root_seq.to_string()),
                ("time range", format!("[{}, {}]", stats.tree_start, stats.tree_end)),
                (
                    "file size",
                    stats.file_size.map_or_else(|| "-".to_string(), |s| s.to_string()),
                ),
            ];
            for (name, value) in rows {
                table.add_row(vec![Cell::new(name), Cell::new(value)]);
            }
            table.to_string()
        }
    }
}

/// Formats one row per node.
pub fn format_nodes(nodes: &[NodeInfo], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(nodes),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec![
                "Seq", "Type", "Parent", "Start", "End", "Intervals", "Used", "Children",
            ]);
            for node in nodes {
                let children: Vec<String> = node.children.iter().map(|c| c.to_string()).collect();
                table.add_row(vec![
                    Cell::new(node.seq),
                    Cell::new(node.node_type),
                    Cell::new(node.parent),
                    Cell::new(node.start),
                    Cell::new(end_label(node.end)),
                    Cell::new(node.interval_count),
                    Cell::new(format!("{}%", node.usage_percent())),
                    Cell::new(children.join(" ")),
                ]);
            }
            table.to_string()
        }
    }
}

/// Formats query results.
pub fn format_intervals(intervals: &[BasicInterval], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = intervals
                .iter()
                .map(|i| {
                    json!({
                        "start": i.start,
                        "end": i.end,
                        "attribute": i.attribute,
                        "value_len": i.value.len(),
                    })
                })
                .collect();
            to_json(&rows)
        }
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["Start", "End", "Attribute", "Value bytes"]);
            for i in intervals {
                table.add_row(vec![
                    Cell::new(i.start),
                    Cell::new(i.end),
                    Cell::new(i.attribute),
                    Cell::new(i.value.len()),
                ]);
            }
            format!("{table}\n({} intervals)", intervals.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htree_common::types::SeqNum;
    use htree_storage::historytree::NodeType;

    fn sample_nodes() -> Vec<NodeInfo> {
        vec![
            NodeInfo {
                seq: SeqNum::new(1),
                node_type: NodeType::Core,
                parent: SeqNum::NONE,
                start: 0,
                end: None,
                interval_count: 0,
                content_size: 0,
                capacity: 4050,
                on_disk: false,
                children: vec![SeqNum::new(0), SeqNum::new(2)],
            },
            NodeInfo {
                seq: SeqNum::new(0),
                node_type: NodeType::Leaf,
                parent: SeqNum::new(1),
                start: 0,
                end: Some(99),
                interval_count: 10,
                content_size: 640,
                capacity: 4066,
                on_disk: true,
                children: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_output_format_from_name() {
        assert_eq!(OutputFormat::from_name("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("table"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_name("csv"), None);
    }

    #[test]
    fn test_format_nodes_table() {
        let output = format_nodes(&sample_nodes(), OutputFormat::Table);
        assert!(output.contains("Children"));
        assert!(output.contains("#0 #2"));
        assert!(output.contains("..."));
        assert!(output.contains("15%"));
    }

    #[test]
    fn test_format_nodes_json() {
        let output = format_nodes(&sample_nodes(), OutputFormat::Json);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["interval_count"], 10);
        assert!(parsed[0]["end"].is_null());
    }

    #[test]
    fn test_format_intervals() {
        let intervals = vec![
            BasicInterval::new(1, 5, 3, vec![0u8; 4]),
            BasicInterval::new(2, 9, 4, Vec::<u8>::new()),
        ];
        let table = format_intervals(&intervals, OutputFormat::Table);
        assert!(table.contains("Attribute"));
        assert!(table.ends_with("(2 intervals)"));

        let json = format_intervals(&intervals, OutputFormat::Json);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["value_len"], 4);
        assert_eq!(parsed[1]["end"], 9);
    }
}
