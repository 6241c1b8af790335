use std::{fs::File, io::BufReader};

use hmmtagger::{read_untagged, Corpus, Error, HmmModel, Model, Smoothing, Trainer};

fn tiny(smoothing: Smoothing) -> HmmModel {
    let corpus = Corpus::from(vec![vec![("the", "DET"), ("dog", "NOUN"), ("runs", "VERB")]]);
    Trainer::new(smoothing).train(&corpus).expect("failed to train")
}

fn german(smoothing: Smoothing) -> HmmModel {
    let f = File::open("tests/data/train.tt").expect("failed to open file");
    let corpus = Corpus::read_tagged(BufReader::new(f)).expect("failed to read file");
    assert_eq!(4, corpus.len(), "read count mismatch");
    Trainer::new(smoothing).train(&corpus).expect("failed to train")
}

fn german_test() -> Vec<Vec<String>> {
    let f = File::open("tests/data/test.t").expect("failed to open file");
    read_untagged(BufReader::new(f)).expect("failed to read file")
}

#[test]
fn known_answer() {
    let model = tiny(Smoothing::laplace());
    let tagger = model.tagger().unwrap();
    assert_eq!(tagger.tag(&["the", "dog", "runs"]).unwrap(), ["DET", "NOUN", "VERB"]);
}

#[test]
fn unknown_word() {
    let model = tiny(Smoothing::laplace());
    let tagger = model.tagger().unwrap();
    let tags = tagger.tag(&["the", "cat", "runs"]).unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags, ["DET", "NOUN", "VERB"]);
    let (_, score) = tagger.viterbi(&["the", "cat", "runs"]).unwrap();
    assert!(score.is_finite());
}

#[test]
fn empty_input() {
    let model = tiny(Smoothing::laplace());
    let tagger = model.tagger().unwrap();
    let words: Vec<String> = vec![];
    assert!(matches!(tagger.tag(&words), Err(Error::InvalidInput(_))));
}

#[test]
fn unsmoothed_zero_probability_paths() {
    let model = tiny(Smoothing::disabled());
    let tagger = model.tagger().unwrap();
    let (labels, score) = tagger.viterbi(&["the", "cat", "runs"]).unwrap();
    assert_eq!(score, f64::NEG_INFINITY);
    assert_eq!(labels, [0, 0, 0]);
    assert_eq!(tagger.tag(&["the", "cat", "runs"]).unwrap(), ["DET", "DET", "DET"]);
    /* Seen words still decode exactly. */
    assert_eq!(tagger.tag(&["the", "dog", "runs"]).unwrap(), ["DET", "NOUN", "VERB"]);
}

#[test]
fn german_corpus() {
    let test = german_test();
    assert_eq!(test.len(), 2);
    for smoothing in [Smoothing::laplace(), Smoothing::additive(0.1)] {
        let model = german(smoothing);
        let tagger = model.tagger().unwrap();
        assert_eq!(tagger.tag(&test[0]).unwrap(), ["DET", "NOUN", "VERB", "ADJ", "PUNCT"]);
        /* "Lage" never occurs in training. */
        assert_eq!(tagger.tag(&test[1]).unwrap(), ["DET", "NOUN", "VERB", "ADV", "ADJ", "PUNCT"]);
    }
}

#[test]
fn german_unsmoothed_unknown_word_falls_back_to_first_tag() {
    let model = german(Smoothing::disabled());
    let tagger = model.tagger().unwrap();
    let test = german_test();
    assert_eq!(tagger.tag(&test[0]).unwrap(), ["DET", "NOUN", "VERB", "ADJ", "PUNCT"]);
    assert_eq!(tagger.tag(&test[1]).unwrap(), ["ADV"; 6]);
}

#[test]
fn deterministic() {
    let model = german(Smoothing::laplace());
    let tagger = model.tagger().unwrap();
    for words in german_test() {
        assert_eq!(tagger.viterbi(&words).unwrap(), tagger.viterbi(&words).unwrap());
    }
}

#[test]
fn long_sequence_does_not_underflow() {
    let model = german(Smoothing::laplace());
    let tagger = model.tagger().unwrap();
    let words: Vec<&str> = ["Das", "Essen", "war", "sehr", "gut", "."].iter().copied().cycle().take(6000).collect();
    let (labels, score) = tagger.viterbi(&words).unwrap();
    assert_eq!(labels.len(), words.len());
    assert!(score.is_finite() && score < -1000.0, "{score}");
    let tags = tagger.tag(&words).unwrap();
    assert_eq!(&tags[..6], ["DET", "NOUN", "VERB", "ADV", "ADJ", "PUNCT"]);
}

#[test]
fn shared_model_across_threads() {
    let model = german(Smoothing::laplace());
    let tagger = model.tagger().unwrap();
    let test = german_test();
    let expected: Vec<Vec<String>> = test.iter().map(|s| tagger.tag(s).unwrap()).collect();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| test.iter().map(|s| tagger.tag(s).unwrap()).collect::<Vec<_>>()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}
