//! Histogram gradient-boosted regression trees with native categorical splits.
//!
//! Least-squares boosting over binned features. Numeric features are binned
//! on midpoints between distinct training values (quantile-thinned when
//! there are more than `max_bins` of them) and split on `value <= threshold`.
//! Categorical features keep one bin per category; a split sorts the
//! categories present in a node by their regularised mean gradient and
//! sends the best prefix left. Trees grow leaf-wise, always expanding the
//! leaf with the largest gain, until `max_leaf_nodes` is reached or no split
//! gains anything.
#![forbid(unsafe_code)]
#![expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "histogram boosting is dense numeric code over bin-indexed tables"
)]

use serde::{Deserialize, Serialize};

use crate::encoding::UNKNOWN_CATEGORY;
use crate::error::ModelError;
use crate::features::{FEATURE_COUNT, FeatureKind, FeatureRow, feature_kind};

/// Gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

/// Hyper-parameters of the boosted ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtParams {
    /// Shrinkage applied to every leaf value.
    pub learning_rate: f64,
    /// Number of boosting iterations, one tree each.
    pub max_iter: usize,
    /// Maximum number of leaves per tree.
    pub max_leaf_nodes: usize,
    /// Minimum number of training rows in every leaf.
    pub min_samples_leaf: usize,
    /// Maximum number of bins per numeric feature.
    pub max_bins: usize,
    /// L2 penalty added to every leaf's row count.
    pub l2_regularization: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 100,
            max_leaf_nodes: 31,
            min_samples_leaf: 20,
            max_bins: 255,
            l2_regularization: 1.0,
        }
    }
}

/// Decision rule stored in a split node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SplitRule {
    /// Numeric: go left when `value <= threshold`.
    Threshold(f64),
    /// Categorical: go left for codes in `left`, right for codes in
    /// `right`, and follow `default_left` for codes the node never saw.
    Categories {
        left: Vec<u32>,
        right: Vec<u32>,
        default_left: bool,
    },
}

impl SplitRule {
    fn goes_left(&self, row: &FeatureRow, feature: usize) -> bool {
        match self {
            Self::Threshold(threshold) => row
                .numeric_value(feature)
                .is_none_or(|value| value <= *threshold),
            Self::Categories {
                left,
                right,
                default_left,
            } => {
                let code = row.category_code(feature).unwrap_or(UNKNOWN_CATEGORY);
                if left.binary_search(&code).is_ok() {
                    true
                } else if right.binary_search(&code).is_ok() {
                    false
                } else {
                    *default_left
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        rule: SplitRule,
        left: usize,
        right: usize,
    },
}

/// A single fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Contribution of this tree for `row`.
    #[must_use]
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    rule,
                    left,
                    right,
                }) => index = if rule.goes_left(row, *feature) { *left } else { *right },
                None => return 0.0,
            }
        }
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }
}

/// A fitted least-squares boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    baseline: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    /// Fit an ensemble on `rows` against `targets`.
    ///
    /// Rows beyond the shorter of the two slices are ignored.
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyTrainingSet`] when there are no rows.
    pub fn fit(
        rows: &[FeatureRow],
        targets: &[f64],
        params: &GbdtParams,
    ) -> Result<Self, ModelError> {
        let n = rows.len().min(targets.len());
        if n == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        let (train_rows, train_targets) = (&rows[..n], &targets[..n]);
        let baseline = train_targets.iter().sum::<f64>() / count_f64(n);
        let binned = BinnedMatrix::new(train_rows, params.max_bins);
        let mut raw = vec![baseline; n];
        let mut gradients = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.max_iter);
        for _ in 0..params.max_iter {
            for ((gradient, prediction), target) in
                gradients.iter_mut().zip(&raw).zip(train_targets)
            {
                *gradient = prediction - target;
            }
            let grower = TreeGrower {
                binned: &binned,
                gradients: &gradients,
                params,
            };
            let (tree, leaves) = grower.grow();
            for leaf in &leaves {
                let value = leaf.value;
                for &row in &leaf.rows {
                    raw[row] += value;
                }
            }
            trees.push(tree);
        }
        Ok(Self { baseline, trees })
    }

    /// Predicted target for `row`.
    #[must_use]
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.baseline + self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>()
    }

    /// Mean of the training targets, the ensemble's starting prediction.
    #[must_use]
    pub const fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Fitted trees in boosting order.
    #[must_use]
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "row counts stay far below 2^52"
)]
const fn count_f64(count: usize) -> f64 {
    count as f64
}

/// Training features mapped to bin indices, one column per feature.
struct BinnedMatrix {
    columns: Vec<BinnedColumn>,
}

struct BinnedColumn {
    bins: Vec<usize>,
    n_bins: usize,
    /// Upper edge of each numeric bin except the last.
    thresholds: Vec<f64>,
    /// Category code of each categorical bin.
    codes: Vec<u32>,
}

impl BinnedMatrix {
    fn new(rows: &[FeatureRow], max_bins: usize) -> Self {
        let columns = (0..FEATURE_COUNT)
            .map(|feature| match feature_kind(feature) {
                FeatureKind::Numeric => {
                    let values: Vec<f64> = rows
                        .iter()
                        .map(|row| row.numeric_value(feature).unwrap_or(0.0))
                        .collect();
                    BinnedColumn::numeric(&values, max_bins)
                }
                FeatureKind::Categorical => {
                    let codes: Vec<u32> = rows
                        .iter()
                        .map(|row| row.category_code(feature).unwrap_or(UNKNOWN_CATEGORY))
                        .collect();
                    BinnedColumn::categorical(&codes)
                }
            })
            .collect();
        Self { columns }
    }
}

impl BinnedColumn {
    fn numeric(values: &[f64], max_bins: usize) -> Self {
        let thresholds = numeric_thresholds(values, max_bins);
        let bins = values
            .iter()
            .map(|value| thresholds.partition_point(|threshold| threshold < value))
            .collect();
        Self {
            bins,
            n_bins: thresholds.len() + 1,
            thresholds,
            codes: Vec::new(),
        }
    }

    fn categorical(values: &[u32]) -> Self {
        let mut codes = values.to_vec();
        codes.sort_unstable();
        codes.dedup();
        let bins = values
            .iter()
            .map(|code| codes.binary_search(code).unwrap_or(0))
            .collect();
        Self {
            bins,
            n_bins: codes.len(),
            thresholds: Vec::new(),
            codes,
        }
    }
}

/// Split points for a numeric feature.
///
/// With at most `max_bins` distinct values every gap gets a midpoint;
/// otherwise `max_bins - 1` midpoints are taken at evenly spaced ranks.
fn numeric_thresholds(values: &[f64], max_bins: usize) -> Vec<f64> {
    let mut distinct: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    distinct.sort_unstable_by(f64::total_cmp);
    distinct.dedup();
    let midpoint = |lower: f64, upper: f64| lower + (upper - lower) / 2.0;
    if distinct.len() <= max_bins.max(2) {
        return distinct
            .windows(2)
            .map(|pair| midpoint(pair[0], pair[1]))
            .collect();
    }
    let len = distinct.len();
    let mut thresholds: Vec<f64> = (1..max_bins)
        .map(|k| {
            let rank = (k * len).div_euclid(max_bins);
            midpoint(distinct[rank - 1], distinct[rank])
        })
        .collect();
    thresholds.dedup();
    thresholds
}

/// Per-bin gradient sums and row counts for one feature in one node.
#[derive(Debug, Clone, Copy, Default)]
struct BinStats {
    gradient: f64,
    count: usize,
}

struct SplitCandidate {
    gain: f64,
    feature: usize,
    rule: SplitRule,
    /// Whether each bin of `feature` goes to the left child.
    left_bins: Vec<bool>,
}

struct GrowingLeaf {
    node: usize,
    rows: Vec<usize>,
    value: f64,
    best: Option<SplitCandidate>,
}

/// A finished leaf with the training rows that reached it.
struct FittedLeaf {
    rows: Vec<usize>,
    value: f64,
}

struct TreeGrower<'a> {
    binned: &'a BinnedMatrix,
    gradients: &'a [f64],
    params: &'a GbdtParams,
}

impl TreeGrower<'_> {
    fn grow(&self) -> (RegressionTree, Vec<FittedLeaf>) {
        let root = self.leaf(0, (0..self.gradients.len()).collect());
        let mut nodes = vec![Node::Leaf { value: root.value }];
        let mut open = vec![root];
        let mut closed = Vec::new();
        let mut leaf_count = 1;
        while leaf_count < self.params.max_leaf_nodes {
            let Some(position) = best_open_leaf(&open) else {
                break;
            };
            let parent = open.swap_remove(position);
            let Some(split) = parent.best else {
                closed.push(FittedLeaf {
                    rows: parent.rows,
                    value: parent.value,
                });
                continue;
            };
            let column = &self.binned.columns[split.feature];
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = parent
                .rows
                .into_iter()
                .partition(|&row| split.left_bins[column.bins[row]]);
            let left = self.leaf(nodes.len(), left_rows);
            nodes.push(Node::Leaf { value: left.value });
            let right = self.leaf(nodes.len(), right_rows);
            nodes.push(Node::Leaf { value: right.value });
            nodes[parent.node] = Node::Split {
                feature: split.feature,
                rule: split.rule,
                left: left.node,
                right: right.node,
            };
            open.push(left);
            open.push(right);
            leaf_count += 1;
        }
        closed.extend(open.into_iter().map(|leaf| FittedLeaf {
            rows: leaf.rows,
            value: leaf.value,
        }));
        (RegressionTree { nodes }, closed)
    }

    fn leaf(&self, node: usize, rows: Vec<usize>) -> GrowingLeaf {
        let gradient: f64 = rows.iter().map(|&row| self.gradients[row]).sum();
        let value = -self.params.learning_rate * gradient
            / (count_f64(rows.len()) + self.params.l2_regularization);
        let best = self.best_split(&rows, gradient);
        GrowingLeaf {
            node,
            rows,
            value,
            best,
        }
    }

    fn best_split(&self, rows: &[usize], gradient: f64) -> Option<SplitCandidate> {
        if rows.len() < 2 * self.params.min_samples_leaf.max(1) {
            return None;
        }
        let parent_score = self.score(gradient, rows.len());
        let mut best: Option<SplitCandidate> = None;
        for (feature, column) in self.binned.columns.iter().enumerate() {
            if column.n_bins < 2 {
                continue;
            }
            let histogram = self.histogram(column, rows);
            let found = match feature_kind(feature) {
                FeatureKind::Numeric => {
                    self.numeric_split(feature, column, &histogram, gradient, rows.len())
                }
                FeatureKind::Categorical => {
                    self.categorical_split(feature, column, &histogram, gradient, rows.len())
                }
            };
            if let Some(mut candidate) = found {
                candidate.gain -= parent_score;
                let better = best.as_ref().is_none_or(|current| candidate.gain > current.gain);
                if candidate.gain > MIN_GAIN && better {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn histogram(&self, column: &BinnedColumn, rows: &[usize]) -> Vec<BinStats> {
        let mut histogram = vec![BinStats::default(); column.n_bins];
        for &row in rows {
            let stats = &mut histogram[column.bins[row]];
            stats.gradient += self.gradients[row];
            stats.count += 1;
        }
        histogram
    }

    fn score(&self, gradient: f64, count: usize) -> f64 {
        gradient * gradient / (count_f64(count) + self.params.l2_regularization)
    }

    /// Both children must hold at least one row, even when the configured
    /// minimum is zero.
    fn admissible(&self, left: usize, right: usize) -> bool {
        let minimum = self.params.min_samples_leaf.max(1);
        left >= minimum && right >= minimum
    }

    /// Best `bin <= k` split; the returned gain excludes the parent score.
    fn numeric_split(
        &self,
        feature: usize,
        column: &BinnedColumn,
        histogram: &[BinStats],
        gradient: f64,
        count: usize,
    ) -> Option<SplitCandidate> {
        let mut best: Option<(f64, usize)> = None;
        let (mut left_gradient, mut left_count) = (0.0, 0);
        for (bin, stats) in histogram.iter().enumerate().take(column.n_bins - 1) {
            left_gradient += stats.gradient;
            left_count += stats.count;
            let right_count = count - left_count;
            if !self.admissible(left_count, right_count) {
                continue;
            }
            let gain = self.score(left_gradient, left_count)
                + self.score(gradient - left_gradient, right_count);
            if best.is_none_or(|(top, _)| gain > top) {
                best = Some((gain, bin));
            }
        }
        let (gain, bin) = best?;
        let threshold = *column.thresholds.get(bin)?;
        Some(SplitCandidate {
            gain,
            feature,
            rule: SplitRule::Threshold(threshold),
            left_bins: (0..column.n_bins).map(|b| b <= bin).collect(),
        })
    }

    /// Best prefix of categories ordered by regularised mean gradient.
    fn categorical_split(
        &self,
        feature: usize,
        column: &BinnedColumn,
        histogram: &[BinStats],
        gradient: f64,
        count: usize,
    ) -> Option<SplitCandidate> {
        let lambda = self.params.l2_regularization;
        let mut present: Vec<usize> = (0..column.n_bins)
            .filter(|&bin| histogram[bin].count > 0)
            .collect();
        if present.len() < 2 {
            return None;
        }
        present.sort_by(|&a, &b| {
            let mean = |bin: usize| {
                histogram[bin].gradient / (count_f64(histogram[bin].count) + lambda)
            };
            mean(a).total_cmp(&mean(b))
        });
        let mut best: Option<(f64, usize, usize)> = None;
        let (mut left_gradient, mut left_count) = (0.0, 0);
        for (prefix, &bin) in present.iter().enumerate().take(present.len() - 1) {
            left_gradient += histogram[bin].gradient;
            left_count += histogram[bin].count;
            let right_count = count - left_count;
            if !self.admissible(left_count, right_count) {
                continue;
            }
            let gain = self.score(left_gradient, left_count)
                + self.score(gradient - left_gradient, right_count);
            if best.is_none_or(|(top, _, _)| gain > top) {
                best = Some((gain, prefix + 1, left_count));
            }
        }
        let (gain, prefix, chosen_left) = best?;
        let mut left_bins = vec![false; column.n_bins];
        for &bin in &present[..prefix] {
            left_bins[bin] = true;
        }
        let mut left: Vec<u32> = present[..prefix].iter().map(|&b| column.codes[b]).collect();
        let mut right: Vec<u32> = present[prefix..].iter().map(|&b| column.codes[b]).collect();
        left.sort_unstable();
        right.sort_unstable();
        Some(SplitCandidate {
            gain,
            feature,
            rule: SplitRule::Categories {
                left,
                right,
                default_left: chosen_left >= count - chosen_left,
            },
            left_bins,
        })
    }
}

fn best_open_leaf(open: &[GrowingLeaf]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (position, leaf) in open.iter().enumerate() {
        if let Some(split) = &leaf.best {
            if best.is_none_or(|(_, gain)| split.gain > gain) {
                best = Some((position, split.gain));
            }
        }
    }
    best.map(|(position, _)| position)
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        clippy::integer_division_remainder_used,
        reason = "tests fail loudly on setup errors and build cyclic categories"
    )]

    use super::*;
    use rstest::rstest;

    fn row(numeric: [f64; 4], categorical: [u32; 2]) -> FeatureRow {
        FeatureRow {
            numeric,
            categorical,
        }
    }

    fn rmse(model: &GradientBoostedTrees, rows: &[FeatureRow], targets: &[f64]) -> f64 {
        let sum: f64 = rows
            .iter()
            .zip(targets)
            .map(|(r, t)| (model.predict(r) - t).powi(2))
            .sum();
        (sum / count_f64(rows.len())).sqrt()
    }

    #[rstest]
    fn empty_training_set_is_rejected() {
        let err = GradientBoostedTrees::fit(&[], &[], &GbdtParams::default())
            .expect_err("empty input");
        assert_eq!(err, ModelError::EmptyTrainingSet);
    }

    #[rstest]
    fn small_sets_predict_the_mean() {
        let rows = vec![row([1.0, 1.0, 0.0, 3.0], [0, 0]); 5];
        let targets = [3.0, 4.0, 5.0, 4.0, 4.0];
        let model = GradientBoostedTrees::fit(&rows, &targets, &GbdtParams::default())
            .expect("fit");
        assert!((model.baseline() - 4.0).abs() < 1e-12);
        assert!((model.predict(&rows[0]) - 4.0).abs() < 1e-9);
        assert!(model.trees().iter().all(|tree| tree.leaf_count() == 1));
    }

    #[rstest]
    fn learns_a_numeric_step() {
        let rows: Vec<FeatureRow> = (0..200)
            .map(|i| row([f64::from(i), 1.0, 0.0, 0.0], [0, 0]))
            .collect();
        let targets: Vec<f64> = (0..200).map(|i| if i < 100 { 3.5 } else { 4.5 }).collect();
        let model = GradientBoostedTrees::fit(&rows, &targets, &GbdtParams::default())
            .expect("fit");
        assert!(rmse(&model, &rows, &targets) < 0.05);
        let low = model.predict(&row([10.0, 1.0, 0.0, 0.0], [0, 0]));
        let high = model.predict(&row([190.0, 1.0, 0.0, 0.0], [0, 0]));
        assert!(low < 3.6 && high > 4.4, "low {low}, high {high}");
    }

    #[rstest]
    fn learns_non_contiguous_category_groups() {
        // Codes 0 and 2 rate high, 1 and 3 low: not separable by one threshold.
        let rows: Vec<FeatureRow> = (0..240_u32).map(|i| row([0.0; 4], [i % 4, 0])).collect();
        let targets: Vec<f64> = (0..240_u32)
            .map(|i| if i % 2 == 0 { 4.6 } else { 3.4 })
            .collect();
        let params = GbdtParams {
            max_leaf_nodes: 2,
            ..GbdtParams::default()
        };
        let model = GradientBoostedTrees::fit(&rows, &targets, &params).expect("fit");
        assert!(rmse(&model, &rows, &targets) < 0.05);
        let first = model.trees().first().expect("at least one tree");
        assert_eq!(first.leaf_count(), 2);
    }

    #[rstest]
    fn unseen_categories_predict_finitely() {
        let rows: Vec<FeatureRow> = (0..100_u32).map(|i| row([0.0; 4], [i % 2, i % 3])).collect();
        let targets: Vec<f64> = (0..100_u32).map(|i| 3.0 + f64::from(i % 2)).collect();
        let model = GradientBoostedTrees::fit(&rows, &targets, &GbdtParams::default())
            .expect("fit");
        let prediction = model.predict(&row([0.0; 4], [UNKNOWN_CATEGORY, 17]));
        assert!(prediction.is_finite());
        assert!((2.9..=4.1).contains(&prediction), "prediction {prediction}");
    }

    #[rstest]
    fn leaves_respect_minimum_size() {
        let rows: Vec<FeatureRow> = (0..45).map(|i| row([f64::from(i), 0.0, 0.0, 0.0], [0, 0])).collect();
        let targets: Vec<f64> = (0..45).map(|i| if i < 5 { 1.0 } else { 5.0 }).collect();
        let model = GradientBoostedTrees::fit(&rows, &targets, &GbdtParams::default())
            .expect("fit");
        // Splitting off the five outliers would leave a leaf below 20 rows.
        let first = model.trees().first().expect("at least one tree");
        assert_eq!(first.leaf_count(), 2);
        let isolated = model.predict(&rows[0]);
        assert!(isolated > 2.0, "outliers cannot get their own leaf: {isolated}");
    }

    #[rstest]
    fn zero_leaf_minimum_without_regularisation_stays_finite() {
        let rows: Vec<FeatureRow> = (0..60_u32)
            .map(|i| row([f64::from(i % 7), f64::from(i % 3), 0.0, 1.0], [i % 5, i % 2]))
            .collect();
        let targets: Vec<f64> = (0..60_u32).map(|i| 3.0 + f64::from(i % 4) * 0.4).collect();
        let params = GbdtParams {
            min_samples_leaf: 0,
            l2_regularization: 0.0,
            max_iter: 20,
            ..GbdtParams::default()
        };
        let model = GradientBoostedTrees::fit(&rows, &targets, &params).expect("fit");
        assert!(rows.iter().all(|r| model.predict(r).is_finite()));
        let unseen = model.predict(&row([100.0, -4.0, 9.0, 0.0], [UNKNOWN_CATEGORY, 9]));
        assert!(unseen.is_finite(), "unseen prediction {unseen}");
    }

    #[rstest]
    fn many_distinct_values_are_thinned_to_max_bins() {
        let values: Vec<f64> = (0..1_000).map(f64::from).collect();
        let thresholds = numeric_thresholds(&values, 255);
        assert!(thresholds.len() <= 254);
        assert!(thresholds.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[rstest]
    #[case(&[1.0, 1.0, 1.0], 0)]
    #[case(&[1.0, 2.0, 4.0], 2)]
    fn few_distinct_values_get_every_midpoint(#[case] values: &[f64], #[case] expected: usize) {
        assert_eq!(numeric_thresholds(values, 255).len(), expected);
    }
}
