//! TF-IDF over character 5-grams: vocabulary layout, weighting, normalization.

use request_anomaly::config::FeaturesConfig;
use request_anomaly::error::DetectorError;
use request_anomaly::features::{FeatureExtractor, Vocabulary};

const EPS: f64 = 1e-9;

fn extractor() -> FeatureExtractor {
    FeatureExtractor::new(&FeaturesConfig::default())
}

#[test]
fn vocabulary_is_sorted_distinct_grams() {
    let mut fx = extractor();
    let vocab = fx.fit(&["abcdef", "abcdeg", "abcde"]).unwrap();
    assert_eq!(vocab.len(), 3);
    assert_eq!(vocab.term(0), Some("abcde"));
    assert_eq!(vocab.term(1), Some("bcdef"));
    assert_eq!(vocab.term(2), Some("bcdeg"));
    assert_eq!(vocab.documents(), 3);
    assert_eq!(vocab.ngram_len(), 5);
}

#[test]
fn idf_down_weights_common_grams() {
    let mut fx = extractor();
    let vocab = fx.fit(&["abcdef", "abcdeg", "abcde"]).unwrap();
    // present in every document
    assert!((vocab.idf("abcde").unwrap() - 1.0).abs() < EPS);
    let rare = vocab.idf("bcdef").unwrap();
    assert!((rare - ((4.0f64 / 2.0).ln() + 1.0)).abs() < EPS);
    assert!(rare > vocab.idf("abcde").unwrap());
    assert_eq!(vocab.idf("zzzzz"), None);
}

#[test]
fn transform_weights_counts_and_normalizes() {
    let mut fx = extractor();
    let vectors = fx.fit_transform(&["abcdef", "abcdeg"]).unwrap();
    let rare = (3.0f64 / 2.0).ln() + 1.0;
    let norm = (1.0 + rare * rare).sqrt();

    let v = &vectors[0];
    assert_eq!(v.indices, vec![0, 1]);
    assert!((v.values[0] - 1.0 / norm).abs() < EPS);
    assert!((v.values[1] - rare / norm).abs() < EPS);
    assert_eq!(v.get(2), 0.0);
}

#[test]
fn repeated_grams_are_counted() {
    let mut fx = extractor();
    let vocab = fx.fit(&["aaaaaa", "bbbbbb"]).unwrap();
    assert!((vocab.idf("aaaaa").unwrap() - vocab.idf("bbbbb").unwrap()).abs() < EPS);

    // "aaaaa" three times, "bbbbb" once
    let v = fx.transform_one("aaaaaaabbbbb").unwrap();
    assert_eq!(v.indices, vec![0, 1]);
    let norm = 10.0f64.sqrt();
    assert!((v.values[0] - 3.0 / norm).abs() < EPS);
    assert!((v.values[1] - 1.0 / norm).abs() < EPS);
}

#[test]
fn every_vector_has_vocabulary_dimension_and_unit_norm() {
    let corpus = [
        "get/tienda1/index.jsphttp/1.1",
        "get/tienda1/publico/anadir.jsp?id=2http/1.1",
        "posthttp://localhost:8080/tienda1/publico/autenticar.jsphttp/1.1modo=entrar",
        "get/",
    ];
    let mut fx = extractor();
    let vectors = fx.fit_transform(&corpus).unwrap();
    let dim = fx.vocabulary().unwrap().len();
    assert_eq!(vectors.len(), corpus.len());
    for v in &vectors {
        assert_eq!(v.dim, dim);
        assert_eq!(v.to_dense().len(), dim);
        if v.is_zero() {
            continue;
        }
        assert!((v.norm() - 1.0).abs() < EPS);
    }
    // shorter than one gram
    assert!(vectors[3].is_zero());
}

#[test]
fn unseen_grams_contribute_nothing() {
    let mut fx = extractor();
    fx.fit(&["get/index.htmlhttp/1.1"]).unwrap();
    let dim = fx.vocabulary().unwrap().len();

    let unknown = fx.transform_one("zzzzzzzzzz").unwrap();
    assert!(unknown.is_zero());
    assert_eq!(unknown.dim, dim);

    let partial = fx.transform_one("get/index.zzzzz").unwrap();
    assert_eq!(partial.dim, dim);
    assert!(partial.nnz() > 0);
    assert!((partial.norm() - 1.0).abs() < EPS);
}

#[test]
fn transform_before_fit_fails() {
    let fx = extractor();
    assert!(matches!(
        fx.transform(&["get/index.html"]),
        Err(DetectorError::UntrainedModel(_))
    ));
    assert!(fx.transform_one("get/index.html").is_err());
}

#[test]
fn fit_rejects_empty_corpus_and_refits() {
    let mut fx = extractor();
    let empty: [&str; 0] = [];
    assert!(matches!(fx.fit(&empty), Err(DetectorError::EmptyCorpus(_))));
    assert!(!fx.is_fitted());

    fx.fit(&["get/index.html"]).unwrap();
    assert!(matches!(
        fx.fit(&["get/other.html"]),
        Err(DetectorError::AlreadyFitted(_))
    ));
}

#[test]
fn fitting_is_deterministic() {
    let corpus = ["get/a/b/c/d.jsp?x=1", "get/a/b/e.jsp?y=2", "put/z=1234567"];
    let a = Vocabulary::fit(&corpus, 5).unwrap();
    let b = Vocabulary::fit(&corpus, 5).unwrap();
    assert_eq!(a.len(), b.len());
    for i in 0..a.len() {
        assert_eq!(a.term(i), b.term(i));
    }
    assert_eq!(a.vectorize(corpus[0]), b.vectorize(corpus[0]));
}

#[test]
fn vocabulary_survives_json() {
    let vocab = Vocabulary::fit(&["get/index.htmlhttp/1.1", "get/login.jsp"], 5).unwrap();
    let json = serde_json::to_string(&vocab).unwrap();
    let back: Vocabulary = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), vocab.len());
    assert_eq!(back.index_of("index"), vocab.index_of("index"));
    assert_eq!(back.vectorize("get/index.html").indices, vocab.vectorize("get/index.html").indices);

    let broken = r#"{"ngram_len":5,"documents":1,"terms":["abcde"],"idf":[]}"#;
    assert!(serde_json::from_str::<Vocabulary>(broken).is_err());
}
