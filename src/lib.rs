//! Part-of-speech tagging with a first-order hidden Markov model.
//!
//! A [`Trainer`] estimates an [`HmmModel`] from a tagged [`Corpus`]; a
//! [`Tagger`] borrows the model and decodes word sequences with the Viterbi
//! algorithm in log space.

pub mod dataset;
pub mod error;
pub mod hmm;
pub mod quark;

pub use dataset::{read_untagged, Corpus, TaggedSentence};
pub use error::{Error, Result};
pub use hmm::{
    model::{HmmModel, Model, ModelFormat},
    tagger::Tagger,
    trainer::{Smoothing, Trainer},
};
pub use quark::{Quark, StringTable, TextVectorizer};
