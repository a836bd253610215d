use anyhow::Result;
use ironfold::testing::Probe;
use ironfold::{DEFAULT_LEAF_THRESHOLD, ExecMode, FoldConfig, FoldError, Runner, fold_with};

fn fold_error(err: &anyhow::Error) -> &FoldError {
    err.downcast_ref::<FoldError>().expect("expected a FoldError")
}

#[test]
fn defaults() {
    let cfg = FoldConfig::default();
    assert_eq!(cfg.leaf_threshold, DEFAULT_LEAF_THRESHOLD);
    assert_eq!(cfg.leaf_threshold, 50);
    assert_eq!(cfg.mode, ExecMode::Parallel);
    assert_eq!(cfg.threads, None);
    assert!(cfg.validate().is_ok());
}

#[test]
fn zero_threshold_is_rejected_before_folding() {
    let err = Runner::with_threshold(0).err().expect("threshold 0 must be rejected");
    assert_eq!(fold_error(&err), &FoldError::InvalidThreshold { threshold: 0 });
    assert!(fold_error(&err).is_config());

    // a runner that cannot be built never reaches the reducer
    let probe = Probe::new();
    let data: Vec<u64> = (0..10).collect();
    let out = Runner::new(FoldConfig { leaf_threshold: 0, ..FoldConfig::default() })
        .and_then(|r| fold_with(&r, probe.reducer(|a: u64, x: u64| a + x), |a, b| a + b, 0, &data));
    assert!(out.is_err());
    assert_eq!(probe.reduce_calls(), 0);
}

#[test]
fn zero_threads_is_rejected() {
    let err = Runner::new(FoldConfig::new().with_threads(0)).err().expect("threads 0 must be rejected");
    assert_eq!(fold_error(&err), &FoldError::InvalidThreads);
}

#[test]
fn from_json_fills_defaults() -> Result<()> {
    let cfg = FoldConfig::from_json("{}")?;
    assert_eq!(cfg, FoldConfig::default());

    let cfg = FoldConfig::from_json(r#"{ "mode": "sequential", "leaf_threshold": 8 }"#)?;
    assert_eq!(cfg.mode, ExecMode::Sequential);
    assert_eq!(cfg.leaf_threshold, 8);
    Ok(())
}

#[test]
fn from_json_rejects_bad_documents() {
    for doc in [
        r#"{ "leaf_threshold": -5 }"#,
        r#"{ "leaf_threshold": "many" }"#,
        r#"{ "mode": "sideways" }"#,
        r#"{ "partitions": 4 }"#,
        "not json",
    ] {
        let err = FoldConfig::from_json(doc).err().expect("document must be rejected");
        assert!(matches!(fold_error(&err), FoldError::Config(_)), "{doc}: {err}");
    }

    let err = FoldConfig::from_json(r#"{ "leaf_threshold": 0 }"#).err().expect("zero threshold");
    assert_eq!(fold_error(&err), &FoldError::InvalidThreshold { threshold: 0 });

    let err = FoldConfig::from_json(r#"{ "threads": 0 }"#).err().expect("zero threads");
    assert_eq!(fold_error(&err), &FoldError::InvalidThreads);
}

#[test]
fn round_trips_through_json() -> Result<()> {
    let cfg = FoldConfig::new().with_leaf_threshold(64).with_threads(2).sequential();
    let text = serde_json::to_string(&cfg)?;
    assert_eq!(FoldConfig::from_json(&text)?, cfg);
    Ok(())
}

#[test]
fn auto_never_goes_below_default() {
    assert_eq!(FoldConfig::auto(0).leaf_threshold, DEFAULT_LEAF_THRESHOLD);
    assert_eq!(FoldConfig::auto(10).leaf_threshold, DEFAULT_LEAF_THRESHOLD);

    let big = FoldConfig::auto(10_000_000);
    assert!(big.leaf_threshold >= DEFAULT_LEAF_THRESHOLD);
    assert!(big.validate().is_ok());
}

#[test]
fn runner_keeps_its_config() -> Result<()> {
    let cfg = FoldConfig::new().with_leaf_threshold(12);
    let runner = Runner::new(cfg.clone())?;
    assert_eq!(runner.config(), &cfg);
    assert_eq!(runner.leaf_threshold(), 12);
    Ok(())
}
