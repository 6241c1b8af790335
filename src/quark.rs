use std::{collections::HashMap, convert::TryFrom};

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub trait StringTable {
    fn to_str(&self, id: usize) -> Option<&str>;
    fn to_id(&self, s: &str) -> Option<usize>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks `s` up, answering `fallback` when it was never interned.
    fn to_id_or(&self, s: &str, fallback: usize) -> usize {
        self.to_id(s).unwrap_or(fallback)
    }
}

pub trait TextVectorizer {
    fn find_or_insert(&mut self, key: &str) -> usize;
}

/// Interned strings with dense ids handed out in first-insertion order.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Quark {
    v: Vec<String>,
    m: HashMap<String, usize>,
}

impl TryFrom<Vec<String>> for Quark {
    type Error = Error;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let mut m = HashMap::with_capacity(value.len());
        for (i, s) in value.iter().enumerate() {
            if m.insert(s.to_string(), i).is_some() {
                return Err(Error::inconsistent(format!("duplicate entry {s:?} in string table")));
            }
        }
        Ok(Self { v: value, m })
    }
}

impl From<Quark> for Vec<String> {
    fn from(value: Quark) -> Self {
        value.v
    }
}

impl StringTable for Quark {
    fn to_str(&self, id: usize) -> Option<&str> {
        self.v.get(id).map(|x| x.as_str())
    }

    fn to_id(&self, s: &str) -> Option<usize> {
        self.m.get(s).copied()
    }

    fn len(&self) -> usize {
        self.v.len()
    }
}

impl TextVectorizer for Quark {
    fn find_or_insert(&mut self, key: &str) -> usize {
        if let Some(&id) = self.m.get(key) {
            return id;
        }
        let idx = self.v.len();
        self.m.insert(key.to_string(), idx);
        self.v.push(key.to_string());
        idx
    }
}

impl Quark {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.v.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for Quark {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut quark = Quark::default();
        for s in iter {
            quark.find_or_insert(s);
        }
        quark
    }
}
