//! Seeded train/test index split, plain or stratified by label.

use crate::config::EvaluationConfig;
use crate::error::{DetectorError, Result};
use crate::parser::Label;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Sample indices on each side of the split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// `ceil(n * fraction)` held out, at least one sample on each side.
fn held_out(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).ceil() as usize).clamp(1, n - 1)
}

pub fn train_test_split(labels: &[Label], config: &EvaluationConfig) -> Result<Split> {
    let n = labels.len();
    if n == 0 {
        return Err(DetectorError::EmptyCorpus("split"));
    }
    if n < 2 {
        return Err(DetectorError::InvalidConfig(
            "need at least 2 samples to hold one out".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    if !config.stratify {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);
        let train = order.split_off(held_out(n, config.test_fraction));
        return Ok(Split { train, test: order });
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [Label::Anomalous, Label::Normal] {
        let mut members: Vec<usize> = (0..n).filter(|&i| labels[i] == class).collect();
        members.shuffle(&mut rng);
        // a lone sample of a class stays in training
        if members.len() < 2 {
            train.extend(members);
            continue;
        }
        let rest = members.split_off(held_out(members.len(), config.test_fraction));
        test.extend(members);
        train.extend(rest);
    }
    if test.is_empty() {
        return Err(DetectorError::InvalidConfig(
            "too few samples per class for a stratified split".into(),
        ));
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    Ok(Split { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(normal: usize, anomalous: usize) -> Vec<Label> {
        let mut out = vec![Label::Normal; normal];
        out.extend(vec![Label::Anomalous; anomalous]);
        out
    }

    #[test]
    fn plain_split_holds_out_ceil_fraction() {
        let split = train_test_split(&labels(15, 6), &EvaluationConfig::default()).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 18);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..21).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        let l = labels(40, 10);
        let cfg = EvaluationConfig::default();
        assert_eq!(train_test_split(&l, &cfg).unwrap(), train_test_split(&l, &cfg).unwrap());
    }

    #[test]
    fn stratified_split_keeps_both_classes_in_test() {
        let l = labels(90, 10);
        let cfg = EvaluationConfig {
            stratify: true,
            ..EvaluationConfig::default()
        };
        let split = train_test_split(&l, &cfg).unwrap();
        let anomalous = split.test.iter().filter(|&&i| l[i] == Label::Anomalous).count();
        assert_eq!(anomalous, 1);
        assert_eq!(split.test.len(), 10);
    }

    #[test]
    fn single_sample_cannot_split() {
        assert!(train_test_split(&labels(1, 0), &EvaluationConfig::default()).is_err());
        assert!(matches!(
            train_test_split(&[], &EvaluationConfig::default()),
            Err(DetectorError::EmptyCorpus(_))
        ));
    }
}
