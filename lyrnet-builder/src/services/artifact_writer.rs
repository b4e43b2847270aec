//! Per-song network artifacts in xnet text format
//!
//! ```text
//! #vertices 3 nonweighted
//! #edges weighted undirected
//! 0 1 1.0
//! 1 2 1.0
//! #v "phones" s
//! "T"
//! "K"
//! "AE1"
//! ```
//!
//! One file per song, named `<song_id>.xnet`. Files are created atomically
//! and never replaced, so the presence of a file means the song is complete.

use crate::graph::{Graph, GraphError};
use lyrnet_common::fs::create_new_atomic;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ARTIFACT_EXTENSION: &str = "xnet";

const VERTICES_HEADER: &str = "#vertices";
const EDGES_HEADER: &str = "#edges weighted undirected";
const LABELS_HEADER: &str = "#v \"phones\" s";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid song id {0:?}")]
    InvalidSongId(String),

    #[error("{labels} labels for {vertices} vertices")]
    LabelCount { vertices: usize, labels: usize },

    #[error("Artifact already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Artifact I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed artifact at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Graph plus per-vertex labels, as stored in an artifact
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledGraph {
    pub graph: Graph,
    pub labels: Vec<String>,
}

/// Writes artifacts into one output directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<song_id>.xnet`; rejects ids that would escape the directory
    pub fn artifact_path(&self, song_id: &str) -> Result<PathBuf, ArtifactError> {
        validate_song_id(song_id)?;
        Ok(self
            .output_dir
            .join(format!("{}.{}", song_id, ARTIFACT_EXTENSION)))
    }

    pub fn exists(&self, song_id: &str) -> Result<bool, ArtifactError> {
        Ok(self.artifact_path(song_id)?.is_file())
    }

    /// Write the artifact for `song_id`; never overwrites
    pub fn write(
        &self,
        song_id: &str,
        graph: &Graph,
        labels: &[String],
    ) -> Result<PathBuf, ArtifactError> {
        if labels.len() != graph.vertex_count() {
            return Err(ArtifactError::LabelCount {
                vertices: graph.vertex_count(),
                labels: labels.len(),
            });
        }
        let path = self.artifact_path(song_id)?;

        match create_new_atomic(&path, |w| write_xnet(w, graph, labels)) {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(ArtifactError::AlreadyExists(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_song_id(song_id: &str) -> Result<(), ArtifactError> {
    let invalid = song_id.is_empty()
        || song_id == "."
        || song_id == ".."
        || song_id.contains(['/', '\\', '\0']);
    if invalid {
        Err(ArtifactError::InvalidSongId(song_id.to_string()))
    } else {
        Ok(())
    }
}

/// Serialize a labeled graph
pub fn write_xnet(w: &mut dyn Write, graph: &Graph, labels: &[String]) -> io::Result<()> {
    writeln!(w, "{} {} nonweighted", VERTICES_HEADER, graph.vertex_count())?;
    writeln!(w, "{}", EDGES_HEADER)?;
    for edge in graph.edges() {
        // {:?} is the shortest representation that parses back exactly
        writeln!(w, "{} {} {:?}", edge.source, edge.target, edge.weight)?;
    }
    writeln!(w, "{}", LABELS_HEADER)?;
    for label in labels {
        writeln!(w, "\"{}\"", escape_label(label))?;
    }
    Ok(())
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape_label(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Read an artifact back from disk
pub fn read_graph(path: &Path) -> Result<LabeledGraph, ArtifactError> {
    let content = std::fs::read_to_string(path)?;
    parse_xnet(&content)
}

/// Parse xnet text produced by [`write_xnet`]
pub fn parse_xnet(content: &str) -> Result<LabeledGraph, ArtifactError> {
    let parse_err = |line: usize, message: &str| ArtifactError::Parse {
        line,
        message: message.to_string(),
    };
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l));

    let (line_no, header) = lines.next().ok_or_else(|| parse_err(1, "empty file"))?;
    let vertex_count = header
        .strip_prefix(VERTICES_HEADER)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| parse_err(line_no, "expected #vertices header"))?;

    match lines.next() {
        Some((_, line)) if line == EDGES_HEADER => {}
        Some((line_no, _)) => return Err(parse_err(line_no, "expected #edges header")),
        None => return Err(parse_err(line_no + 1, "missing #edges header")),
    }

    let mut graph = Graph::new(vertex_count);
    let mut labels = Vec::with_capacity(vertex_count);
    let mut in_labels = false;
    let mut last_line = line_no + 1;

    for (line_no, line) in lines {
        last_line = line_no;
        if line.is_empty() {
            continue;
        }
        if !in_labels {
            if line == LABELS_HEADER {
                in_labels = true;
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [a, b, weight] = fields[..] else {
                return Err(parse_err(line_no, "expected `<u> <v> <weight>`"));
            };
            let (Ok(a), Ok(b), Ok(weight)) = (
                a.parse::<usize>(),
                b.parse::<usize>(),
                weight.parse::<f64>(),
            ) else {
                return Err(parse_err(line_no, "invalid edge field"));
            };
            graph
                .add_edge(a, b, weight)
                .map_err(|e: GraphError| parse_err(line_no, &e.to_string()))?;
        } else {
            let label =
                unescape_label(line).ok_or_else(|| parse_err(line_no, "invalid quoted label"))?;
            labels.push(label);
        }
    }

    if labels.len() != vertex_count {
        return Err(parse_err(
            last_line,
            &format!("{} labels for {} vertices", labels.len(), vertex_count),
        ));
    }

    Ok(LabeledGraph { graph, labels })
}
