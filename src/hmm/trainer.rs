use std::{fmt::Display, time::Instant};

use serde::{Deserialize, Serialize};

use crate::{
    dataset::Corpus,
    error::{Error, Result},
    quark::{Quark, StringTable, TextVectorizer},
};

use super::model::HmmModel;

/// Additive smoothing applied to every transition and emission count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoothing {
    pub enabled: bool,
    pub discount: f64,
}

impl Smoothing {
    /// Add-one smoothing.
    pub fn laplace() -> Self {
        Self::additive(1.0)
    }

    pub fn additive(discount: f64) -> Self {
        Self { enabled: true, discount }
    }

    /// Plain relative frequencies; the discount keeps its Laplace default.
    pub fn disabled() -> Self {
        Self { enabled: false, discount: 1.0 }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.discount.is_finite() && self.discount >= 0.0) {
            return Err(Error::invalid_input(format!(
                "smoothing discount must be a finite number >= 0, got {}",
                self.discount
            )));
        }
        Ok(())
    }

    /// The constant added to each count.
    fn delta(&self) -> f64 {
        if self.enabled {
            self.discount
        } else {
            0.0
        }
    }
}

impl Display for Smoothing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.enabled {
            write!(f, "additive (discount: {})", self.discount)
        } else {
            write!(f, "none")
        }
    }
}

/// Estimates an [`HmmModel`] from a tagged corpus by relative frequency.
#[derive(Debug, Clone)]
pub struct Trainer {
    smoothing: Smoothing,
}

impl Trainer {
    pub fn new(smoothing: Smoothing) -> Self {
        Self { smoothing }
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Sets a training parameter from its textual `name=value` form.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "smoothing" => {
                self.smoothing.enabled = match value {
                    "1" | "true" => true,
                    "0" | "false" => false,
                    _ => return Err(Error::invalid_input(format!("{name}: expected a boolean, got {value:?}"))),
                }
            }
            "smoothing.discount" => {
                self.smoothing.discount = value
                    .parse()
                    .map_err(|_| Error::invalid_input(format!("{name}: expected a number, got {value:?}")))?;
            }
            _ => return Err(Error::invalid_input(format!("unknown parameter: {name}"))),
        }
        Ok(())
    }

    pub fn train(&self, corpus: &Corpus) -> Result<HmmModel> {
        self.smoothing.validate()?;
        if corpus.is_empty() {
            return Err(Error::invalid_input("empty training corpus"));
        }
        for (i, s) in corpus.sentences.iter().enumerate() {
            if s.words.len() != s.tags.len() {
                return Err(Error::invalid_input(format!(
                    "sentence {i} has {} words but {} tags",
                    s.words.len(),
                    s.tags.len()
                )));
            }
        }
        let begin = Instant::now();

        let mut labels = Quark::default();
        let mut words = Quark::default();
        let seqs: Vec<Vec<(usize, usize)>> = corpus
            .sentences
            .iter()
            .map(|s| s.iter().map(|(w, t)| (words.find_or_insert(w), labels.find_or_insert(t))).collect())
            .collect();
        if labels.is_empty() {
            return Err(Error::invalid_input("training corpus contains no tagged tokens"));
        }

        let L = labels.len();
        let V = words.len();
        log::info!(
            "set data (N: {}, items: {}, L: {L}, V: {V}, smoothing: {})",
            corpus.len(),
            corpus.total_items(),
            self.smoothing
        );

        let mut trans = vec![0.0; (L + 1) * L];
        let mut emit = vec![0.0; L * (V + 1)];
        for seq in &seqs {
            /* The previous label #L stands for START. */
            let mut prev = L;
            for &(word, label) in seq {
                trans[L * prev + label] += 1.0;
                emit[(V + 1) * label + word] += 1.0;
                prev = label;
            }
        }

        let delta = self.smoothing.delta();
        normalize(&mut trans, L, delta);
        normalize(&mut emit, V + 1, delta);
        log::info!("estimated {} parameters, time cost: {:?}", trans.len() + emit.len(), begin.elapsed());

        HmmModel::new(labels, words, self.smoothing, trans, emit)
    }
}

/// Turns each row of counts into log((count + delta) / (total + delta * width)).
/// A row without any mass becomes all `-inf`.
fn normalize(counts: &mut [f64], width: usize, delta: f64) {
    for row in counts.chunks_mut(width) {
        let total: f64 = row.iter().sum();
        let denom = total + delta * width as f64;
        for x in row.iter_mut() {
            *x = if denom > 0.0 { ((*x + delta) / denom).ln() } else { f64::NEG_INFINITY };
        }
    }
}
