use crate::{
    error::{Error, Result},
    quark::StringTable,
};

use super::{
    context::Lattice,
    model::{HmmModel, Model},
};

/// Viterbi decoder over a borrowed model.
///
/// Every call builds its own lattice, so a single tagger can be shared by
/// any number of threads.
#[derive(Debug)]
pub struct Tagger<'a, M: Model + ?Sized = HmmModel> {
    model: &'a M,
}

impl<M: Model + ?Sized> Clone for Tagger<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: Model + ?Sized> Copy for Tagger<'_, M> {}

impl<'a, M: Model + ?Sized> Tagger<'a, M> {
    pub fn new(model: &'a M) -> Result<Self> {
        if model.labels().is_empty() {
            return Err(Error::inconsistent("cannot decode with an empty tagset"));
        }
        Ok(Self { model })
    }

    pub fn model(&self) -> &'a M {
        self.model
    }

    fn lattice<S: AsRef<str>>(&self, words: &[S]) -> Result<Lattice> {
        if words.is_empty() {
            return Err(Error::invalid_input("cannot tag an empty sequence"));
        }
        let unknown = self.model.unknown();
        let columns: Vec<usize> = words.iter().map(|w| self.model.column(w.as_ref())).collect();
        let oov = columns.iter().filter(|&&c| c == unknown).count();
        if oov > 0 {
            log::debug!("{oov} of {} tokens are out of vocabulary", words.len());
        }
        Ok(Lattice::new(self.model, &columns))
    }

    fn label_ids<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<usize>> {
        tags.iter()
            .map(|t| {
                let t = t.as_ref();
                self.model
                    .labels()
                    .to_id(t)
                    .ok_or_else(|| Error::invalid_input(format!("unknown tag: {t}")))
            })
            .collect()
    }

    fn path<S: AsRef<str>, U: AsRef<str>>(&self, words: &[S], tags: &[U]) -> Result<(Lattice, Vec<usize>)> {
        if words.len() != tags.len() {
            return Err(Error::invalid_input(format!(
                "{} words but {} tags",
                words.len(),
                tags.len()
            )));
        }
        let labels = self.label_ids(tags)?;
        Ok((self.lattice(words)?, labels))
    }

    /// Most probable label ids for `words` with the log probability of that path.
    pub fn viterbi<S: AsRef<str>>(&self, words: &[S]) -> Result<(Vec<usize>, f64)> {
        let mut lattice = self.lattice(words)?;
        let mut labels = vec![0; words.len()];
        let score = lattice.viterbi(self.model, &mut labels);
        Ok((labels, score))
    }

    /// Most probable tag sequence for `words`, one tag per word.
    pub fn tag<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<String>> {
        let (labels, _) = self.viterbi(words)?;
        let table = self.model.labels();
        labels
            .into_iter()
            .map(|l| {
                table
                    .to_str(l)
                    .map(str::to_string)
                    .ok_or_else(|| Error::inconsistent(format!("label #{l} is missing from the tagset")))
            })
            .collect()
    }

    /// Joint log probability of `words` tagged with `tags`.
    pub fn score<S: AsRef<str>, U: AsRef<str>>(&self, words: &[S], tags: &[U]) -> Result<f64> {
        let (lattice, labels) = self.path(words, tags)?;
        Ok(lattice.score(self.model, &labels))
    }

    /// Posterior probability of `tags` given `words`; zero when no path can emit `words`.
    pub fn probability<S: AsRef<str>, U: AsRef<str>>(&self, words: &[S], tags: &[U]) -> Result<f64> {
        let (lattice, labels) = self.path(words, tags)?;
        let score = lattice.score(self.model, &labels);
        let lognorm = lattice.lognorm(self.model);
        if lognorm == f64::NEG_INFINITY {
            return Ok(0.0);
        }
        Ok((score - lognorm).exp())
    }
}
