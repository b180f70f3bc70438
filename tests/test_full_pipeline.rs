//! Integration test: Full pipeline (load → infer → prepare → hand off)

use std::io::Write;
use tabtext::data::{RowSet, Value};
use tabtext::preprocessing::{
    infer_schema, ColumnEncoding, ColumnKind, DatasetPreparer, FitScope, MinMax, PrepareConfig,
    PreparedDataset, TaskMode,
};
use tabtext::session::{PipelineSession, SessionStatus};
use tabtext::utils::DataLoader;
use tabtext::TabTextError;

fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_color_score_regression_scenario() {
    let rows = RowSet::from_records(vec![
        vec![("color", Value::from("red")), ("score", Value::from(5.0))],
        vec![("color", Value::from("blue")), ("score", Value::from(3.0))],
        vec![("color", Value::from("red")), ("score", Value::from(9.0))],
    ]);
    let schema = infer_schema(&rows);
    assert_eq!(schema.kind("score"), Some(ColumnKind::Numeric));
    assert!(schema.get("score").unwrap().unique_count <= 20);

    let prepared = DatasetPreparer::new(
        PrepareConfig::new("score")
            .with_feature_cols(["color"])
            .with_task(TaskMode::Auto)
            .with_random_state(4),
    )
    .prepare(&rows, &schema)
    .unwrap();

    assert!(!prepared.is_classification);
    assert_eq!(prepared.input_dim, 2);
    assert_eq!(
        prepared.encoder.categories("color").unwrap(),
        &["red".to_string(), "blue".to_string()]
    );
    assert_eq!(prepared.encode_row(&rows.rows()[0]), vec![1.0, 0.0]);
    assert_eq!(prepared.encode_row(&rows.rows()[1]), vec![0.0, 1.0]);
}

#[test]
fn test_cat_dog_classification_scenario() {
    let rows = RowSet::from_records(vec![
        vec![("size", Value::from(1.0)), ("label", Value::from("cat"))],
        vec![("size", Value::from(3.0)), ("label", Value::from("dog"))],
        vec![("size", Value::from(1.5)), ("label", Value::from("cat"))],
    ]);
    let schema = infer_schema(&rows);
    assert_eq!(schema.kind("label"), Some(ColumnKind::Categorical));
    assert_eq!(schema.get("label").unwrap().unique_count, 2);

    let prepared = DatasetPreparer::new(PrepareConfig::new("label").with_random_state(4))
        .prepare(&rows, &schema)
        .unwrap();

    assert!(prepared.is_classification);
    assert_eq!(prepared.n_classes, 2);
    let map = prepared.label_map.as_ref().unwrap();
    assert_eq!(map.labels(), &["cat".to_string(), "dog".to_string()]);
}

#[test]
fn test_pairing_vocabulary_scenario() {
    let rows = RowSet::from_records(vec![
        vec![("review", Value::from("good wine pairing")), ("y", Value::from(1.0))],
        vec![("review", Value::from("bad pairing choice")), ("y", Value::from(0.0))],
    ]);
    // short strings are not inferred as text, so declare the kind explicitly
    let schema = tabtext::preprocessing::Schema::from_columns(vec![
        (
            "review".to_string(),
            tabtext::preprocessing::ColumnSchema { kind: ColumnKind::Text, unique_count: 2 },
        ),
        (
            "y".to_string(),
            tabtext::preprocessing::ColumnSchema { kind: ColumnKind::Numeric, unique_count: 2 },
        ),
    ]);

    let prepared = DatasetPreparer::new(
        PrepareConfig::new("y")
            .with_text_col("review")
            .with_vocab_size(100)
            .with_split_pct(0.5)
            .with_random_state(0),
    )
    .prepare(&rows, &schema)
    .unwrap();

    let vocab = prepared.vocabulary.as_ref().unwrap();
    assert_eq!(vocab.size(), 5);
    assert_eq!(vocab.tokens()[0], "pairing");
    assert_eq!(prepared.input_dim, 5);

    let x = prepared.encode_row(&rows.rows()[0]);
    for token in ["good", "wine", "pairing"] {
        assert_eq!(x[vocab.position(token).unwrap()], 1.0);
    }
    for token in ["bad", "choice"] {
        assert_eq!(x[vocab.position(token).unwrap()], 0.0);
    }
}

#[test]
fn test_non_text_column_is_dropped_from_features() {
    let rows = RowSet::from_records(vec![
        vec![("tag", Value::from("a")), ("x", Value::from(1.0)), ("y", Value::from(2.0))],
        vec![("tag", Value::from("b")), ("x", Value::from(2.0)), ("y", Value::from(4.0))],
    ]);
    let schema = infer_schema(&rows);
    let prepared = DatasetPreparer::new(
        PrepareConfig::new("y").with_text_col("tag").with_random_state(0),
    )
    .prepare(&rows, &schema)
    .unwrap();

    assert!(prepared.vocabulary.is_none());
    assert_eq!(prepared.input_dim, 1);
}

#[test]
fn test_csv_to_prepared_dataset() {
    let file = write_csv(&[
        "grape,region,tasting_notes,quality",
        "merlot,bordeaux,soft plum flavours with gentle tannins,good",
        "riesling,mosel,bright acidity and green apple aromas,great",
        "merlot,napa,ripe cherry and vanilla from oak aging,good",
        "syrah,rhone,peppery spice with dark berry character,average",
        "riesling,alsace,dry with citrus peel and stony minerals,great",
        "syrah,barossa,jammy blackberry with chocolate hints,good",
        "merlot,bordeaux,earthy notes with cedar and tobacco,average",
        "riesling,mosel,honeyed sweetness balanced by acidity,great",
        "syrah,rhone,smoked meat and olive tapenade notes,good",
        "merlot,napa,plush texture with mocha and plum,average",
    ]);

    let session = PipelineSession::new();
    let rows = DataLoader::new().load_csv(file.path()).unwrap();
    let schema = session.load(rows).unwrap();
    assert_eq!(schema.kind("tasting_notes"), Some(ColumnKind::Text));
    assert_eq!(schema.guess_target(), Some("quality"));

    let prepared = session
        .prepare(
            PrepareConfig::new("quality")
                .with_text_col("tasting_notes")
                .with_split_pct(0.8)
                .with_random_state(21),
        )
        .unwrap();

    assert_eq!(session.status(), SessionStatus::Prepared);
    assert!(prepared.is_classification);
    assert_eq!(prepared.n_classes, 3);
    assert_eq!(prepared.train_rows(), 8);
    assert_eq!(prepared.test_rows(), 2);
    // grape (3) + region (6) + vocabulary
    assert_eq!(prepared.encoder.dim(), 9);
    assert_eq!(
        prepared.input_dim,
        9 + prepared.vocabulary.as_ref().unwrap().size()
    );

    // the trainer receives the dataset as JSON
    let json = serde_json::to_string(prepared.as_ref()).unwrap();
    let restored: PreparedDataset = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.x_train, prepared.x_train);
    assert_eq!(restored.y_test, prepared.y_test);
    assert_eq!(restored.label_map, prepared.label_map);
    assert_eq!(restored.vocabulary, prepared.vocabulary);
    assert_eq!(restored.encoder, prepared.encoder);
    assert_eq!(restored.label_map.as_ref().unwrap().index_of("great"), Some(1));
}

#[test]
fn test_fit_scope_changes_only_the_statistics() {
    let rows = RowSet::from_records(
        (0..20)
            .map(|i| vec![("x", Value::from(i as f64)), ("y", Value::from((i * 2) as f64))])
            .collect::<Vec<_>>(),
    );
    let schema = infer_schema(&rows);
    let base = PrepareConfig::new("y").with_random_state(99);

    let all = DatasetPreparer::new(base.clone()).prepare(&rows, &schema).unwrap();
    let train = DatasetPreparer::new(base.with_fit_scope(FitScope::TrainOnly))
        .prepare(&rows, &schema)
        .unwrap();

    // same permutation, so labels line up
    assert_eq!(all.y_train, train.y_train);
    assert_eq!(all.y_test, train.y_test);
    assert_eq!(all.input_dim, train.input_dim);

    let min_max = |prepared: &PreparedDataset| match &prepared.encoder.columns()[0].encoding {
        ColumnEncoding::Numeric(Some(stats)) => *stats,
        other => panic!("unexpected encoding {:?}", other),
    };
    assert_eq!(min_max(&all), MinMax { min: 0.0, max: 19.0 });

    // y = 2x, so the training x values are y_train / 2
    let train_x: Vec<f64> = train.y_train.iter().map(|y| y / 2.0).collect();
    let train_min = train_x.iter().cloned().fold(f64::INFINITY, f64::min);
    let train_max = train_x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(min_max(&train), MinMax { min: train_min, max: train_max });

    // the fits differ exactly when an extreme row landed in the test split
    let test_has_extreme = train.y_test.iter().any(|&y| y == 0.0 || y == 38.0);
    assert_eq!(min_max(&train) != min_max(&all), test_has_extreme);
}

#[test]
fn test_train_only_fit_excludes_test_extremes() {
    // one extreme value among many identical rows; with a 50/50 split the
    // extreme either sits in the test split or sets the training max
    let rows = RowSet::from_records(
        (0..10)
            .map(|i| {
                let x = if i == 0 { 100.0 } else { 1.0 + i as f64 };
                vec![("x", Value::from(x)), ("y", Value::from(x))]
            })
            .collect::<Vec<_>>(),
    );
    let schema = infer_schema(&rows);
    let prepared = DatasetPreparer::new(
        PrepareConfig::new("y")
            .with_split_pct(0.5)
            .with_fit_scope(FitScope::TrainOnly)
            .with_random_state(5),
    )
    .prepare(&rows, &schema)
    .unwrap();

    let stats = match &prepared.encoder.columns()[0].encoding {
        ColumnEncoding::Numeric(Some(stats)) => *stats,
        other => panic!("unexpected encoding {:?}", other),
    };
    let extreme_in_train = prepared.y_train.iter().any(|&y| y == 100.0);
    assert_eq!(stats.max == 100.0, extreme_in_train);
    // training features never leave [0, 1]
    for v in prepared.x_train.iter() {
        assert!((-1e-9..=1.0 + 1e-9).contains(v));
    }
}

#[test]
fn test_regression_labels_hold_raw_values() {
    let mut records: Vec<Vec<(&str, Value)>> = (0..9)
        .map(|i| vec![("x", Value::from(i as f64)), ("price", Value::from(3.5 + i as f64))])
        .collect();
    records.push(vec![("x", Value::from(9.0)), ("price", Value::from("n/a"))]);
    let rows = RowSet::from_records(records);
    let schema = infer_schema(&rows);
    assert_eq!(schema.kind("price"), Some(ColumnKind::Numeric));

    let prepared = DatasetPreparer::new(PrepareConfig::new("price").with_random_state(3))
        .prepare(&rows, &schema)
        .unwrap();
    assert!(!prepared.is_classification);

    // x = 9 marks the non-numeric target; every other row has y = x + 3.5
    let x_max = 9.0;
    let pairs = prepared
        .x_train
        .rows()
        .into_iter()
        .zip(prepared.y_train.rows())
        .chain(prepared.x_test.rows().into_iter().zip(prepared.y_test.rows()));
    let mut seen = 0;
    for (x, y) in pairs {
        let raw_x = (x[0] * (x_max + tabtext::preprocessing::RANGE_EPSILON)).round();
        if raw_x == 9.0 {
            assert_eq!(y[0], 0.0);
        } else {
            assert_eq!(y[0], raw_x + 3.5);
        }
        seen += 1;
    }
    assert_eq!(seen, 10);
}

#[test]
fn test_errors_surface_before_work() {
    let session = PipelineSession::new();
    session.load(RowSet::default()).unwrap();
    let err = session.prepare(PrepareConfig::new("y")).unwrap_err();
    assert!(matches!(err, TabTextError::InvalidSchema(_)));
    assert_eq!(session.status(), SessionStatus::Loaded);

    let rows = RowSet::from_records(vec![vec![("x", Value::from(1.0))]]);
    session.load(rows).unwrap();
    let err = session.prepare(PrepareConfig::new("y")).unwrap_err();
    assert!(matches!(err, TabTextError::InvalidColumn(ref c) if c == "y"));
}
