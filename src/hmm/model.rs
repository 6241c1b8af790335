use std::{convert::TryFrom, fs, io::Write, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    quark::{Quark, StringTable},
};

use super::{tagger::Tagger, trainer::Smoothing};

/// Rows of a probability table must sum to one within this bound.
const ROW_TOLERANCE: f64 = 1e-6;

/// Read-only view of HMM parameters, all in the natural-log domain.
///
/// Labels and words are addressed by their ids in [`Model::labels`] and
/// [`Model::words`]. Two ids are reserved past the end of each alphabet:
/// `labels().len()` is the START state and `words().len()` is the UNKNOWN word.
pub trait Model {
    fn labels(&self) -> &Quark;
    fn words(&self) -> &Quark;
    /// log P(cur | prev), where `prev` may be [`Model::start`].
    fn log_transition(&self, prev: usize, cur: usize) -> f64;
    /// log P(word | label), where `column` may be [`Model::unknown`].
    fn log_emission(&self, label: usize, column: usize) -> f64;

    fn start(&self) -> usize {
        self.labels().len()
    }

    fn unknown(&self) -> usize {
        self.words().len()
    }

    /// Emission column of `word`, falling back to UNKNOWN for unseen words.
    fn column(&self, word: &str) -> usize {
        self.words().to_id_or(word, self.unknown())
    }

    fn tagger(&self) -> Result<Tagger<'_, Self>>
    where
        Self: Sized,
    {
        Tagger::new(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Bson,
}

impl ModelFormat {
    /// `.bson` files hold BSON, everything else is read and written as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|x| x.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bson") => Self::Bson,
            _ => Self::Json,
        }
    }
}

/// A trained bigram HMM.
///
/// Transitions form a `(L + 1) x L` row-major matrix whose last row holds the
/// START distribution. Emissions form a `L x (V + 1)` matrix whose last column
/// is the UNKNOWN word. Both store log-probabilities; `-inf` marks an event
/// with probability zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawModel")]
pub struct HmmModel {
    labels: Quark,
    words: Quark,
    smoothing: Smoothing,
    #[serde(serialize_with = "log_probs::serialize")]
    trans: Vec<f64>,
    #[serde(serialize_with = "log_probs::serialize")]
    emit: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawModel {
    labels: Quark,
    words: Quark,
    smoothing: Smoothing,
    #[serde(deserialize_with = "log_probs::deserialize")]
    trans: Vec<f64>,
    #[serde(deserialize_with = "log_probs::deserialize")]
    emit: Vec<f64>,
}

impl TryFrom<RawModel> for HmmModel {
    type Error = Error;

    fn try_from(raw: RawModel) -> Result<Self> {
        HmmModel::new(raw.labels, raw.words, raw.smoothing, raw.trans, raw.emit)
    }
}

impl HmmModel {
    pub fn new(
        labels: Quark,
        words: Quark,
        smoothing: Smoothing,
        trans: Vec<f64>,
        emit: Vec<f64>,
    ) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::inconsistent("empty tagset"));
        }
        if words.is_empty() {
            return Err(Error::inconsistent("empty vocabulary"));
        }
        let L = labels.len();
        let V = words.len();
        if trans.len() != (L + 1) * L {
            return Err(Error::inconsistent(format!(
                "transition table has {} cells, expected {}",
                trans.len(),
                (L + 1) * L
            )));
        }
        if emit.len() != L * (V + 1) {
            return Err(Error::inconsistent(format!(
                "emission table has {} cells, expected {}",
                emit.len(),
                L * (V + 1)
            )));
        }
        check_rows("transition", &trans, L)?;
        check_rows("emission", &emit, V + 1)?;
        Ok(Self { labels, words, smoothing, trans, emit })
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Size of the vocabulary, not counting UNKNOWN.
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// P(cur | prev); `None` as `prev` asks for the START distribution.
    pub fn transition(&self, prev: Option<&str>, cur: &str) -> Option<f64> {
        let prev = match prev {
            Some(tag) => self.labels.to_id(tag)?,
            None => self.start(),
        };
        let cur = self.labels.to_id(cur)?;
        Some(self.log_transition(prev, cur).exp())
    }

    /// P(word | tag); words outside the vocabulary get the UNKNOWN mass.
    pub fn emission(&self, tag: &str, word: &str) -> Option<f64> {
        let label = self.labels.to_id(tag)?;
        Some(self.log_emission(label, self.column(word)).exp())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let buffer = fs::read(path)?;
        Self::from_memory(&buffer, ModelFormat::from_path(path))
    }

    pub fn from_memory(buffer: &[u8], format: ModelFormat) -> Result<Self> {
        let raw: RawModel = match format {
            ModelFormat::Json => serde_json::from_slice(buffer)?,
            ModelFormat::Bson => bson::from_slice(buffer)?,
        };
        Self::try_from(raw)
    }

    pub fn to_vec(&self, format: ModelFormat) -> Result<Vec<u8>> {
        Ok(match format {
            ModelFormat::Json => serde_json::to_vec(self)?,
            ModelFormat::Bson => bson::to_vec(self)?,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_vec(ModelFormat::from_path(path))?)?;
        log::info!("model written to {}", path.display());
        Ok(())
    }

    /// Writes the alphabets and every non-zero parameter as plain text.
    pub fn dump<W: Write>(&self, w: &mut W) -> Result<()> {
        let L = self.num_labels();
        writeln!(w, "FILEHEADER = {{")?;
        writeln!(w, "  smoothing: {}", self.smoothing)?;
        writeln!(w, "  num_labels: {}", L)?;
        writeln!(w, "  num_words: {}", self.num_words())?;
        writeln!(w, "}}\n")?;

        writeln!(w, "LABELS = {{")?;
        for (i, label) in self.labels.iter().enumerate() {
            writeln!(w, "  {:5}: {}", i, label)?;
        }
        writeln!(w, "}}\n")?;

        writeln!(w, "TRANSITIONS = {{")?;
        for prev in 0..=L {
            let src = self.labels.to_str(prev).unwrap_or("<START>");
            for (cur, dst) in self.labels.iter().enumerate() {
                let p = self.log_transition(prev, cur);
                if p > f64::NEG_INFINITY {
                    writeln!(w, "  {} --> {}: {:.6}", src, dst, p)?;
                }
            }
        }
        writeln!(w, "}}\n")?;

        writeln!(w, "EMISSIONS = {{")?;
        for (label, src) in self.labels.iter().enumerate() {
            for column in 0..=self.num_words() {
                let p = self.log_emission(label, column);
                if p > f64::NEG_INFINITY {
                    let word = self.words.to_str(column).unwrap_or("<UNKNOWN>");
                    writeln!(w, "  {} --> {}: {:.6}", src, word, p)?;
                }
            }
        }
        writeln!(w, "}}")?;
        Ok(())
    }
}

impl Model for HmmModel {
    fn labels(&self) -> &Quark {
        &self.labels
    }

    fn words(&self) -> &Quark {
        &self.words
    }

    #[inline]
    fn log_transition(&self, prev: usize, cur: usize) -> f64 {
        self.trans[self.labels.len() * prev + cur]
    }

    #[inline]
    fn log_emission(&self, label: usize, column: usize) -> f64 {
        self.emit[(self.words.len() + 1) * label + column]
    }
}

/// Every row is either a distribution or entirely zero (a context never observed
/// without smoothing).
fn check_rows(table: &str, cells: &[f64], width: usize) -> Result<()> {
    for (r, row) in cells.chunks(width).enumerate() {
        if let Some(x) = row.iter().find(|x| x.is_nan() || **x > 0.0) {
            return Err(Error::inconsistent(format!(
                "{table} row {r} holds {x}, which is not a log-probability"
            )));
        }
        if row.iter().all(|x| *x == f64::NEG_INFINITY) {
            continue;
        }
        let sum: f64 = row.iter().map(|x| x.exp()).sum();
        if (sum - 1.0).abs() > ROW_TOLERANCE {
            return Err(Error::inconsistent(format!("{table} row {r} sums to {sum}")));
        }
    }
    Ok(())
}

/// Log-probability vectors with `-inf` written as `null`, which JSON can carry.
mod log_probs {
    use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[f64], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(v.len()))?;
        for x in v {
            if x.is_finite() {
                seq.serialize_element(&Some(*x))?;
            } else {
                seq.serialize_element(&None::<f64>)?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        let v = Vec::<Option<f64>>::deserialize(d)?;
        Ok(v.into_iter().map(|x| x.unwrap_or(f64::NEG_INFINITY)).collect())
    }
}
