use std::fs;

use stocktag::{curate_round_robin, curate_single_table, CorpusReader, CuratedTable};

const SMALL_CORPUS: &str = "\
__label__shoes nice red running shoes
__label__electronics great cheap phone
no label on this line at all
__label__electronics __label__misc great cheap phone 4k
__label__shoes 4k 120hz
__label__shoes small shoes
__label__books thick paper fantasy novel
";

#[test]
fn test_single_table_curation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("dataset.csv");
    fs::write(&corpus_path, SMALL_CORPUS).unwrap();

    let corpus = CorpusReader::open(&corpus_path).unwrap();
    let table_path = dir.path().join("curated.csv");
    let labels_path = dir.path().join("labels.json");
    let report = curate_single_table(&corpus, &table_path, &labels_path).unwrap();

    let table = fs::read_to_string(&table_path).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(
        lines,
        vec![
            "description;label",
            "nice red running shoes;0",
            "great cheap phone;1",
            "thick paper fantasy novel;2",
        ]
    );

    let labels: Vec<String> =
        serde_json::from_str(&fs::read_to_string(&labels_path).unwrap()).unwrap();
    assert_eq!(labels, vec!["shoes", "electronics", "books"]);

    // the multi-label and too-short records were counted nowhere
    assert_eq!(report.rows_written(), 3);
    for stats in &report.labels {
        assert_eq!(stats.eligible, 1);
        assert_eq!(stats.written, 1);
        assert_eq!(stats.percent_written(), 100);
    }
}

#[test]
fn test_curated_table_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("dataset.csv");
    fs::write(&corpus_path, SMALL_CORPUS).unwrap();

    let corpus = CorpusReader::open(&corpus_path).unwrap();
    let table_path = dir.path().join("curated.csv");
    let labels_path = dir.path().join("labels.json");
    curate_single_table(&corpus, &table_path, &labels_path).unwrap();

    let table = CuratedTable::read_from(&table_path).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows[0].description, "nice red running shoes");
    assert_eq!(table.rows[0].label_index, 0);
    assert_eq!(table.rows[2].label_index, 2);
}

#[test]
fn test_record_stream_is_restartable() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("dataset.csv");
    fs::write(&corpus_path, SMALL_CORPUS).unwrap();

    let corpus = CorpusReader::open(&corpus_path).unwrap();
    let first_pass: Vec<_> = corpus.records().unwrap().collect();
    let second_pass: Vec<_> = corpus.records().unwrap().collect();
    assert_eq!(first_pass, second_pass);
    // unlabeled and empty-description lines never surface
    assert_eq!(first_pass.len(), 5);
}

fn round_robin_corpus() -> String {
    let mut corpus = String::new();
    for i in 0..12 {
        corpus.push_str(&format!("__label__shoes nice red shoes model{}\n", letter(i)));
    }
    for i in 0..5 {
        corpus.push_str(&format!("__label__electronics great cheap phone{}\n", letter(i)));
    }
    corpus
}

fn letter(i: usize) -> char {
    (b'a' + i as u8) as char
}

#[test]
fn test_round_robin_split_is_eighty_twenty_per_label() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("dataset.csv");
    fs::write(&corpus_path, round_robin_corpus()).unwrap();

    let corpus = CorpusReader::open(&corpus_path).unwrap();
    let train_path = dir.path().join("train.csv");
    let test_path = dir.path().join("test.csv");
    let labels_path = dir.path().join("labels.json");
    curate_round_robin(&corpus, &train_path, &test_path, &labels_path).unwrap();

    let train = CuratedTable::read_from(&train_path).unwrap();
    let test = CuratedTable::read_from(&test_path).unwrap();

    // shoes: slots 0..12 of the 8-train/2-test pattern -> 10 train, 2 test
    let train_shoes = train.rows.iter().filter(|r| r.label_index == 0).count();
    let test_shoes = test.rows.iter().filter(|r| r.label_index == 0).count();
    assert_eq!(train_shoes, 10);
    assert_eq!(test_shoes, 2);

    // electronics: only 5 accepted records, all still in the train slots
    let train_phones = train.rows.iter().filter(|r| r.label_index == 1).count();
    let test_phones = test.rows.iter().filter(|r| r.label_index == 1).count();
    assert_eq!(train_phones, 5);
    assert_eq!(test_phones, 0);
}

#[test]
fn test_round_robin_assignment_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("dataset.csv");
    fs::write(&corpus_path, round_robin_corpus()).unwrap();
    let corpus = CorpusReader::open(&corpus_path).unwrap();

    let mut outputs = Vec::new();
    for run in 0..2 {
        let train_path = dir.path().join(format!("train_{run}.csv"));
        let test_path = dir.path().join(format!("test_{run}.csv"));
        let labels_path = dir.path().join(format!("labels_{run}.json"));
        curate_round_robin(&corpus, &train_path, &test_path, &labels_path).unwrap();
        outputs.push((
            fs::read_to_string(&train_path).unwrap(),
            fs::read_to_string(&test_path).unwrap(),
        ));
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_opening_a_missing_corpus_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(CorpusReader::open(dir.path().join("nope.csv")).is_err());
}
