//! In-memory graph and node-attribute file loaders (§6).
//!
//! Both formats are line-oriented UTF-8, `\n` or `\r\n` (handled
//! transparently by [`BufRead::lines`]), with `#` or `;` as the first
//! character marking a comment line.

use crate::error::{Result, TvgError};
use crate::flags::Flags;
use crate::graph::SparseGraph;
use crate::util::is_sorted;
use std::io::{self, BufRead};
use tracing::warn;

fn malformed(line: &str) -> TvgError {
    TvgError::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("malformed line: {line}"),
    ))
}

fn is_comment(line: &str) -> bool {
    matches!(line.chars().next(), Some('#') | Some(';'))
}

/// Parses the graph file format: `ts\tsrc\ttgt\tweight` lines, grouped into
/// one [`SparseGraph`] per run of consecutive equal-`ts` lines. The last
/// open group is flushed at end-of-file (§6: "only links it once the next
/// distinct ts confirms the bucket is complete, or end-of-file is
/// reached"). A line that fails to parse surfaces as an `Io`-kind error and
/// no partial graph for its bucket is returned.
pub fn load_graph_file<R: BufRead>(reader: R, flags: Flags) -> Result<Vec<(i64, SparseGraph)>> {
    let mut out: Vec<(i64, SparseGraph)> = Vec::new();
    let mut current_ts: Option<i64> = None;
    let mut current: Option<SparseGraph> = None;

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() || is_comment(&line) {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(malformed(&line));
        }
        let ts: i64 = fields[0].parse().map_err(|_| malformed(&line))?;
        let src: u64 = fields[1].parse().map_err(|_| malformed(&line))?;
        let tgt: u64 = fields[2].parse().map_err(|_| malformed(&line))?;
        let weight: f32 = fields[3].parse().map_err(|_| malformed(&line))?;

        if current_ts != Some(ts) {
            if let (Some(prev_ts), Some(g)) = (current_ts.take(), current.take()) {
                out.push((prev_ts, g));
            }
            current_ts = Some(ts);
            current = Some(SparseGraph::new(flags));
        }
        current.as_mut().expect("just assigned above").set(src, tgt, weight);
    }
    if let (Some(ts), Some(g)) = (current_ts, current) {
        out.push((ts, g));
    }

    if !is_sorted(&out.iter().map(|(ts, _)| *ts).collect::<Vec<_>>()) {
        warn!("graph file is not sorted by ts; loaded buckets reflect encounter order, not chronological order");
    }

    Ok(out)
}

/// One data row from the node-attribute file format.
#[derive(Debug, Clone)]
pub struct NodeAttrRow {
    pub index: u64,
    /// Positional values, aligned with the returned column names. A missing
    /// or empty field is `None`.
    pub values: Vec<Option<String>>,
}

/// Parses the node-attribute file format. Returns the column names (from
/// the `#index\tname1\tname2…` header if present, else `col0, col1, …` by
/// position) and the data rows.
pub fn load_node_attr_file<R: BufRead>(reader: R) -> Result<(Vec<String>, Vec<NodeAttrRow>)> {
    let mut lines = reader.lines();
    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    while let Some(line) = lines.next() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            let body = &line[1..];
            let fields: Vec<&str> = body.split('\t').collect();
            if fields.first() == Some(&"index") {
                header = Some(fields[1..].iter().map(|s| s.to_string()).collect());
            }
            continue;
        }
        if line.starts_with(';') {
            continue;
        }
        parse_data_row(&line, &mut rows)?;
        break;
    }

    for line in lines {
        let line = line?;
        if line.is_empty() || is_comment(&line) {
            continue;
        }
        parse_data_row(&line, &mut rows)?;
    }

    let names = header.unwrap_or_else(|| {
        let width = rows.iter().map(|r| r.values.len()).max().unwrap_or(0);
        (0..width).map(|i| format!("col{i}")).collect()
    });

    Ok((names, rows))
}

fn parse_data_row(line: &str, rows: &mut Vec<NodeAttrRow>) -> Result<()> {
    let mut fields = line.split('\t');
    let index: u64 = fields
        .next()
        .ok_or_else(|| malformed(line))?
        .parse()
        .map_err(|_| malformed(line))?;
    let values: Vec<Option<String>> = fields
        .map(|f| if f.is_empty() { None } else { Some(f.to_string()) })
        .collect();
    rows.push(NodeAttrRow { index, values });
    Ok(())
}
