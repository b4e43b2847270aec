//! Batch Pipeline Tests
//! Test File: pipeline_tests.rs
//! Covers: end-to-end artifact content, rerun idempotence, per-song failure
//! isolation, empty phoneme sequences, pruning postconditions on disk

use lyrnet_builder::graph::{Graph, GraphError};
use lyrnet_builder::services::artifact_writer::{read_graph, ArtifactWriter};
use lyrnet_builder::services::batch_orchestrator::BatchOrchestrator;
use lyrnet_builder::services::candidate_builder::{CandidateGraphBuilder, MultiScaleBuilder};
use lyrnet_builder::services::dataset_loader::load_songs;
use lyrnet_builder::services::network_verifier::{check_pruned_graph, verify_directory};
use lyrnet_builder::services::phoneme_mapper::PhonemeMapper;
use lyrnet_builder::services::pronouncing_dictionary::PronouncingDictionary;
use lyrnet_builder::{JobOutcome, NetworkParams, SongRecord};
use std::sync::Arc;
use tempfile::TempDir;

const DICTIONARY: &str = ";;; test dictionary
cat K AE1 T
dog D AO1 G
the DH AH0
the(2) DH IY0
sat S AE1 T
on AA1 N
mat M AE1 T
";

fn mapper() -> Arc<PhonemeMapper> {
    let dict = PronouncingDictionary::parse(DICTIONARY).unwrap();
    Arc::new(PhonemeMapper::new(Arc::new(dict)))
}

fn orchestrator(
    out: &TempDir,
    params: NetworkParams,
    builder: Arc<dyn CandidateGraphBuilder>,
) -> BatchOrchestrator {
    BatchOrchestrator::new(params, mapper(), builder, ArtifactWriter::new(out.path()), 4)
}

fn small_params() -> NetworkParams {
    NetworkParams::new(3, 20).unwrap()
}

/// Fails every song whose phonemes contain the marker
struct FailOnPhoneme(&'static str);

impl CandidateGraphBuilder for FailOnPhoneme {
    fn build(&self, phonemes: &[String], window_size: usize) -> Result<Graph, GraphError> {
        if phonemes.iter().any(|p| p == self.0) {
            return Err(GraphError::Construction(format!("refusing {}", self.0)));
        }
        MultiScaleBuilder::new().build(phonemes, window_size)
    }
}

/// TC-PIPE-001: "cat cat dog" with window 3 produces the expected artifact
#[test]
fn tc_pipe_001_end_to_end_example() {
    // Given: one song and window size 3
    let out = TempDir::new().unwrap();
    let orch = orchestrator(&out, small_params(), Arc::new(MultiScaleBuilder::new()));

    // When: the batch runs
    let summary = orch.run(&[SongRecord::new("s1", "cat cat dog")]).unwrap();

    // Then: 9 phonemes -> 7 vertices, only backbone edges survive the window
    assert_eq!(summary.done, 1);
    let text = std::fs::read_to_string(out.path().join("s1.xnet")).unwrap();
    assert_eq!(
        text,
        "#vertices 7 nonweighted\n\
         #edges weighted undirected\n\
         0 1 1.0\n\
         1 2 1.0\n\
         2 3 1.0\n\
         3 4 1.0\n\
         4 5 1.0\n\
         5 6 1.0\n\
         #v \"phones\" s\n\
         \"T\"\n\
         \"K\"\n\
         \"AE1\"\n\
         \"T\"\n\
         \"D\"\n\
         \"AO1\"\n\
         \"G\"\n"
    );
}

/// TC-PIPE-002: A second run skips everything and leaves files untouched
#[test]
fn tc_pipe_002_rerun_is_idempotent() {
    // Given: a completed batch
    let out = TempDir::new().unwrap();
    let orch = orchestrator(&out, small_params(), Arc::new(MultiScaleBuilder::new()));
    let songs = vec![
        SongRecord::new("a", "the cat sat on the mat"),
        SongRecord::new("b", "cat cat dog"),
        SongRecord::new("c", "the dog sat"),
    ];
    let first = orch.run(&songs).unwrap();
    assert_eq!(first.done, 3);
    let before: Vec<Vec<u8>> = ["a", "b", "c"]
        .iter()
        .map(|id| std::fs::read(out.path().join(format!("{}.xnet", id))).unwrap())
        .collect();

    // When: the same batch runs again
    let second = orch.run(&songs).unwrap();

    // Then: every song is skipped and no artifact changed
    assert_eq!(second.skipped, 3);
    assert_eq!(second.done, 0);
    assert!(second.is_complete());
    for (id, content) in ["a", "b", "c"].iter().zip(before) {
        let after = std::fs::read(out.path().join(format!("{}.xnet", id))).unwrap();
        assert_eq!(after, content, "{} changed", id);
    }
}

/// TC-PIPE-003: One failing song does not affect the others
#[test]
fn tc_pipe_003_failure_is_isolated() {
    // Given: a builder that fails on any song containing "dog"
    let out = TempDir::new().unwrap();
    let orch = orchestrator(&out, small_params(), Arc::new(FailOnPhoneme("AO1")));
    let songs = vec![
        SongRecord::new("a", "the cat sat on the mat"),
        SongRecord::new("b", "cat cat dog"),
        SongRecord::new("c", "the cat sat"),
    ];

    // When: the batch runs
    let summary = orch.run(&songs).unwrap();

    // Then: N-1 artifacts, one recorded failure, no partial file
    assert_eq!(summary.done, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].song_id, "b");
    assert!(summary.failures[0].reason.contains("refusing AO1"));
    assert!(out.path().join("a.xnet").exists());
    assert!(!out.path().join("b.xnet").exists());
    assert!(out.path().join("c.xnet").exists());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 2);
}

/// TC-PIPE-004: A failed song is retried on the next run
#[test]
fn tc_pipe_004_failed_song_retried() {
    let out = TempDir::new().unwrap();
    let songs = vec![SongRecord::new("b", "cat cat dog")];

    let failing = orchestrator(&out, small_params(), Arc::new(FailOnPhoneme("AO1")));
    assert_eq!(failing.run(&songs).unwrap().failed, 1);

    let working = orchestrator(&out, small_params(), Arc::new(MultiScaleBuilder::new()));
    let summary = working.run(&songs).unwrap();
    assert_eq!(summary.done, 1);
}

/// TC-PIPE-005: Lyrics with no known words give an empty artifact
#[test]
fn tc_pipe_005_empty_sequence() {
    let out = TempDir::new().unwrap();
    let orch = orchestrator(&out, small_params(), Arc::new(MultiScaleBuilder::new()));

    let report = orch.process_song(&SongRecord::new("empty", "xyzzy plugh !!!"));

    assert_eq!(
        report.outcome,
        JobOutcome::Done {
            vertices: 0,
            edges: 0
        }
    );
    let read = read_graph(&out.path().join("empty.xnet")).unwrap();
    assert_eq!(read.graph.vertex_count(), 0);
    assert!(read.labels.is_empty());
}

/// TC-PIPE-006: Written graphs satisfy the window, backbone and budget rules
#[test]
fn tc_pipe_006_pruning_postconditions() {
    // Given: long lyrics and a tight budget so both filters bite
    let out = TempDir::new().unwrap();
    let params = NetworkParams::new(5, 3).unwrap();
    let orch = orchestrator(&out, params, Arc::new(MultiScaleBuilder::new()));
    let lyrics = "the cat sat on the mat the dog sat on the cat ".repeat(8);
    let songs: Vec<SongRecord> = (0..6)
        .map(|i| SongRecord::new(format!("song{}", i), lyrics.clone()))
        .collect();

    // When: the batch runs
    let summary = orch.run(&songs).unwrap();
    assert_eq!(summary.done, 6);

    // Then: every artifact passes the checks
    for song in &songs {
        let labeled = read_graph(&out.path().join(format!("{}.xnet", song.id))).unwrap();
        let graph = &labeled.graph;
        assert!(graph.vertex_count() > 0);
        assert!(graph.edge_count() <= params.edge_budget(graph.vertex_count()));
        assert!(check_pruned_graph(graph, &params).is_empty());
        assert_eq!(labeled.labels.len(), graph.vertex_count());
    }

    let report = verify_directory(out.path(), &params);
    assert_eq!(report.checked, 6);
    assert!(report.is_clean(), "{}", report.display_string());
}

/// TC-PIPE-007: Verifier flags an artifact written with different rules
#[test]
fn tc_pipe_007_verifier_flags_violations() {
    let out = TempDir::new().unwrap();
    let orch = orchestrator(&out, small_params(), Arc::new(MultiScaleBuilder::new()));
    orch.run(&[SongRecord::new("s1", "the cat sat on the mat")])
        .unwrap();

    let lenient = verify_directory(out.path(), &small_params());
    assert!(lenient.is_clean());

    // 12 backbone edges over 13 vertices exceed floor(13 * 1 / 2)
    let strict = NetworkParams::new(3, 1).unwrap();

    let graph = read_graph(&out.path().join("s1.xnet")).unwrap().graph;
    let problems = check_pruned_graph(&graph, &strict);
    assert!(graph.edge_count() > strict.edge_budget(graph.vertex_count()));
    assert!(problems.iter().any(|p| p.contains("exceed budget")));
}

/// TC-PIPE-008: Dataset file through to artifacts
#[test]
fn tc_pipe_008_dataset_to_artifacts() {
    // Given: a dataset with one English, one French and one lyric-less row
    let root = TempDir::new().unwrap();
    let dataset = root.path().join("songs.tsv");
    std::fs::write(
        &dataset,
        "_id\ttitle\tlyrics\tlanguage\tlanguage_detect\n\
         s1\tOne\t<b>Cat</b> cat dog\teng\tenglish\n\
         s2\tTwo\tle chat\tfra\tfrench\n\
         s3\tThree\t\teng\tenglish\n",
    )
    .unwrap();

    // When: loaded and processed
    let (songs, stats) = load_songs(&dataset).unwrap();
    assert_eq!(stats.kept, 1);
    assert_eq!(songs[0].lyrics, " cat  cat dog");

    let out = TempDir::new().unwrap();
    let orch = orchestrator(&out, small_params(), Arc::new(MultiScaleBuilder::new()));
    let summary = orch.run(&songs).unwrap();

    // Then: the markup never reaches the phoneme sequence
    assert_eq!(summary.done, 1);
    let labeled = read_graph(&out.path().join("s1.xnet")).unwrap();
    assert_eq!(labeled.graph.vertex_count(), 7);
    assert_eq!(labeled.labels[0], "T");
}
