use std::{fs::File, io::BufReader};

use hmmtagger::{Corpus, Error, HmmModel, Model, ModelFormat, Smoothing, Trainer};

fn train(smoothing: Smoothing) -> HmmModel {
    let f = File::open("tests/data/train.tt").expect("failed to open file");
    let corpus = Corpus::read_tagged(BufReader::new(f)).expect("failed to read file");
    Trainer::new(smoothing).train(&corpus).expect("failed to train")
}

fn decode_all(model: &HmmModel) -> Vec<(Vec<usize>, f64)> {
    let tagger = model.tagger().unwrap();
    [vec!["Das", "Essen", "ist", "gut", "."], vec!["Die", "Lage", "war", "sehr", "gut", "."], vec!["Lage"]]
        .iter()
        .map(|words| tagger.viterbi(words).unwrap())
        .collect()
}

#[test]
fn save_and_load_json() {
    let model = train(Smoothing::laplace());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    model.save(&path).unwrap();
    let loaded = HmmModel::from_path(&path).unwrap();
    assert_eq!(loaded, model);
    assert_eq!(decode_all(&loaded), decode_all(&model));
}

#[test]
fn save_and_load_bson() {
    let model = train(Smoothing::additive(0.1));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bson");
    model.save(&path).unwrap();
    let loaded = HmmModel::from_path(&path).unwrap();
    assert_eq!(loaded, model);
    assert_eq!(loaded.smoothing(), Smoothing::additive(0.1));
    assert_eq!(decode_all(&loaded), decode_all(&model));
}

#[test]
fn unsmoothed_model_survives_both_formats() {
    let model = train(Smoothing::disabled());
    for format in [ModelFormat::Json, ModelFormat::Bson] {
        let buffer = model.to_vec(format).unwrap();
        let loaded = HmmModel::from_memory(&buffer, format).unwrap();
        assert_eq!(loaded, model, "{:?}", format);
        assert_eq!(loaded.emission("NOUN", "gut"), Some(0.0));
    }
}

#[test]
fn missing_file() {
    match HmmModel::from_path("tests/does-not-exist.json") {
        Err(Error::Io(_)) => {}
        r => panic!("unexpected: {:?}", r),
    }
}

#[test]
fn garbage_model() {
    assert!(matches!(HmmModel::from_memory(b"", ModelFormat::Json), Err(Error::Json(_))));
    assert!(matches!(HmmModel::from_memory(b"{\"labels\": 7}", ModelFormat::Json), Err(Error::Json(_))));
    assert!(matches!(HmmModel::from_memory(b"abcdefg", ModelFormat::Bson), Err(Error::BsonDecode(_))));
}

#[test]
fn inconsistent_model_rejected_on_load() {
    let json = r#"{
        "labels": ["A", "B"],
        "words": ["x"],
        "smoothing": {"enabled": false, "discount": 0.0},
        "trans": [-0.1, -0.1, -0.6931471805599453, -0.6931471805599453, 0.0, null],
        "emit": [0.0, null, 0.0, null]
    }"#;
    match HmmModel::from_memory(json.as_bytes(), ModelFormat::Json) {
        Err(Error::ModelInconsistency(msg)) => assert!(msg.contains("transition row 0"), "{msg}"),
        r => panic!("unexpected: {:?}", r),
    }

    let json = r#"{
        "labels": [],
        "words": ["x"],
        "smoothing": {"enabled": false, "discount": 0.0},
        "trans": [],
        "emit": []
    }"#;
    assert!(matches!(
        HmmModel::from_memory(json.as_bytes(), ModelFormat::Json),
        Err(Error::ModelInconsistency(_))
    ));
}

#[test]
fn dump() {
    let model = train(Smoothing::disabled());
    let mut buffer = Vec::new();
    model.dump(&mut buffer).unwrap();
    let s = String::from_utf8(buffer).unwrap();
    assert!(s.contains("num_labels: 6"), "{s}");
    assert!(s.contains("<START> --> DET: "), "{s}");
    assert!(s.contains("NOUN --> Beratung: "), "{s}");
    assert!(!s.contains("<UNKNOWN>"), "{s}");

    let model = train(Smoothing::laplace());
    let mut buffer = Vec::new();
    model.dump(&mut buffer).unwrap();
    assert!(String::from_utf8(buffer).unwrap().contains("NOUN --> <UNKNOWN>: "));
}
