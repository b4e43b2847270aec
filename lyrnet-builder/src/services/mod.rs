//! Pipeline stages, leaves first:
//! dataset -> tokens -> phonemes -> candidate graph -> pruned graph -> artifact

pub mod artifact_writer;
pub mod batch_orchestrator;
pub mod candidate_builder;
pub mod dataset_loader;
pub mod edge_pruner;
pub mod network_verifier;
pub mod phoneme_mapper;
pub mod pronouncing_dictionary;
pub mod tokenizer;
