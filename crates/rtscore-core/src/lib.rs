//! rtscore-core: deterministic scoring for radio-telephony phraseology.
//!
//! This crate holds the three scoring engines (structure, accuracy, fluency),
//! the text normalizer they share, the aggregator that combines them, and the
//! drill-session machinery built on top of them.

pub mod accuracy;
pub mod config;
pub mod engine;
pub mod error;
pub mod fluency;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod results;
pub mod scoring;
pub mod statistics;
pub mod structure;
pub mod traits;
pub mod wer;
