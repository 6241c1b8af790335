use std::io::BufRead;

use crate::error::{Error, Result};

/// A sentence of the training corpus: words paired position by position with their tags.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaggedSentence {
    pub words: Vec<String>,
    pub tags: Vec<String>,
}

impl TaggedSentence {
    pub fn new(words: Vec<String>, tags: Vec<String>) -> Result<Self> {
        if words.len() != tags.len() {
            return Err(Error::invalid_input(format!(
                "sentence has {} words but {} tags",
                words.len(),
                tags.len()
            )));
        }
        Ok(Self { words, tags })
    }

    pub fn push(&mut self, word: &str, tag: &str) {
        self.words.push(word.to_string());
        self.tags.push(tag.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.words.iter().map(String::as_str).zip(self.tags.iter().map(String::as_str))
    }
}

impl<W: AsRef<str>, T: AsRef<str>> FromIterator<(W, T)> for TaggedSentence {
    fn from_iter<I: IntoIterator<Item = (W, T)>>(iter: I) -> Self {
        let mut sentence = TaggedSentence::default();
        for (w, t) in iter {
            sentence.push(w.as_ref(), t.as_ref());
        }
        sentence
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Corpus {
    pub sentences: Vec<TaggedSentence>,
}

impl<W: AsRef<str>, T: AsRef<str>> From<Vec<Vec<(W, T)>>> for Corpus {
    fn from(value: Vec<Vec<(W, T)>>) -> Self {
        Self { sentences: value.into_iter().map(|s| s.into_iter().collect()).collect() }
    }
}

impl Corpus {
    /// Reads `word <ws> tag` lines; a blank line closes the current sentence.
    pub fn read_tagged<R: BufRead>(reader: R) -> Result<Self> {
        let mut corpus = Corpus::default();
        let mut sentence = TaggedSentence::default();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                if !sentence.is_empty() {
                    corpus.sentences.push(std::mem::take(&mut sentence));
                }
                continue;
            }
            match line.rsplit_once(char::is_whitespace) {
                Some((word, tag)) if !word.trim().is_empty() => sentence.push(word.trim(), tag),
                _ => {
                    return Err(Error::invalid_input(format!(
                        "line {}: expected `word tag`, got {line:?}",
                        n + 1
                    )))
                }
            }
        }
        if !sentence.is_empty() {
            corpus.sentences.push(sentence);
        }
        Ok(corpus)
    }

    pub fn push(&mut self, sentence: TaggedSentence) {
        self.sentences.push(sentence);
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.sentences.iter().map(|x| x.len()).max().unwrap_or_default()
    }

    pub fn total_items(&self) -> usize {
        self.sentences.iter().map(|x| x.len()).sum()
    }
}

/// Reads one token per line (its first field); a blank line closes the current sentence.
pub fn read_untagged<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut sentences = Vec::new();
    let mut words = Vec::new();
    for line in reader.lines() {
        let line = line?;
        match line.split_whitespace().next() {
            Some(word) => words.push(word.to_string()),
            None => {
                if !words.is_empty() {
                    sentences.push(std::mem::take(&mut words));
                }
            }
        }
    }
    if !words.is_empty() {
        sentences.push(words);
    }
    Ok(sentences)
}
