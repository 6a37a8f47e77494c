use super::MetricError;
use linfa::{dataset::Pr, metrics::BinaryClassification};
use ndarray::prelude::*;
use num_traits::ToPrimitive;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RocCurve {
	/// The points of the curve, ordered by decreasing classification threshold.
	pub points: Vec<RocPoint>,
	/// The area under the curve.
	pub auc: f64,
	pub n_positives: u64,
	pub n_negatives: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RocPoint {
	pub false_positive_rate: f64,
	pub true_positive_rate: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PrecisionRecallCurve {
	/// The points of the curve, ordered by increasing recall.
	pub points: Vec<PrecisionRecallPoint>,
	pub average_precision: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PrecisionRecallPoint {
	pub recall: f64,
	pub precision: f64,
}

/// Compute the receiver operating characteristic curve of `scores` against `labels`. A score is the classifier's confidence in `[0, 1]` that an example belongs to class `1`. Both classes must be present in `labels`.
pub fn roc_curve(scores: &[f32], labels: &[usize]) -> Result<RocCurve, MetricError> {
	if scores.len() != labels.len() {
		return Err(MetricError::LengthMismatch {
			expected: labels.len(),
			actual: scores.len(),
		});
	}
	if let Some(label) = labels.iter().find(|label| **label > 1) {
		return Err(MetricError::InvalidLabel(*label));
	}
	let n_positives = labels.iter().filter(|label| **label == 1).count();
	let n_negatives = labels.len() - n_positives;
	if n_positives == 0 || n_negatives == 0 {
		return Err(MetricError::Undefined {
			metric: "the roc curve",
			reason: "the labels contain a single class",
		});
	}
	let probabilities: Array1<Pr> = scores
		.iter()
		.map(|score| Pr::new(score.max(0.0).min(1.0)))
		.collect();
	let ground_truth: Vec<bool> = labels.iter().map(|label| *label == 1).collect();
	let roc = probabilities
		.roc(ground_truth.as_slice())
		.map_err(|error| MetricError::Library(error.to_string()))?;
	let points = roc
		.get_curve()
		.into_iter()
		.map(|(false_positive_rate, true_positive_rate)| RocPoint {
			false_positive_rate: false_positive_rate.to_f64().unwrap(),
			true_positive_rate: true_positive_rate.to_f64().unwrap(),
		})
		.collect();
	Ok(RocCurve {
		points,
		auc: roc.area_under_curve().to_f64().unwrap(),
		n_positives: n_positives.to_u64().unwrap(),
		n_negatives: n_negatives.to_u64().unwrap(),
	})
}

/// Compute the precision recall curve of `scores` against `labels`. Each point of the roc curve corresponds to a threshold with `tp = tpr * positives` and `fp = fpr * negatives`, which determine the precision and recall at that threshold. Thresholds where nothing is predicted positive have no precision and are skipped.
pub fn precision_recall_curve(
	scores: &[f32],
	labels: &[usize],
) -> Result<PrecisionRecallCurve, MetricError> {
	let roc = roc_curve(scores, labels)?;
	let n_positives = roc.n_positives.to_f64().unwrap();
	let n_negatives = roc.n_negatives.to_f64().unwrap();
	let mut points: Vec<PrecisionRecallPoint> = roc
		.points
		.iter()
		.filter_map(|point| {
			let true_positives = point.true_positive_rate * n_positives;
			let false_positives = point.false_positive_rate * n_negatives;
			let predicted_positives = true_positives + false_positives;
			if predicted_positives <= 0.0 {
				return None;
			}
			Some(PrecisionRecallPoint {
				recall: point.true_positive_rate,
				precision: true_positives / predicted_positives,
			})
		})
		.collect();
	// order by increasing recall, and by decreasing precision among points with equal recall
	points.sort_by(|a, b| {
		a.recall
			.partial_cmp(&b.recall)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then(
				b.precision
					.partial_cmp(&a.precision)
					.unwrap_or(std::cmp::Ordering::Equal),
			)
	});
	// average precision = sum over thresholds of (recall_n - recall_n-1) * precision_n
	let mut previous_recall = 0.0;
	let mut average_precision = 0.0;
	for point in points.iter() {
		average_precision += (point.recall - previous_recall) * point.precision;
		previous_recall = point.recall;
	}
	Ok(PrecisionRecallCurve {
		points,
		average_precision,
	})
}

#[test]
fn test_roc_curve_perfect_separation() {
	let scores = [0.9, 0.8, 0.2, 0.1];
	let labels = [1, 1, 0, 0];
	let roc = roc_curve(&scores, &labels).unwrap();
	assert!((roc.auc - 1.0).abs() < 1e-6);
	assert_eq!(roc.n_positives, 2);
	assert_eq!(roc.n_negatives, 2);
	for point in roc.points.iter() {
		assert!((0.0..=1.0).contains(&point.false_positive_rate));
		assert!((0.0..=1.0).contains(&point.true_positive_rate));
	}
}

#[test]
fn test_roc_curve_inverted_scores() {
	let scores = [0.1, 0.2, 0.8, 0.9];
	let labels = [1, 1, 0, 0];
	let roc = roc_curve(&scores, &labels).unwrap();
	assert!(roc.auc.abs() < 1e-6);
}

#[test]
fn test_roc_curve_single_class() {
	let error = roc_curve(&[0.2, 0.7], &[1, 1]).unwrap_err();
	assert!(matches!(error, MetricError::Undefined { .. }));
	let error = roc_curve(&[0.2], &[1, 0]).unwrap_err();
	assert_eq!(
		error,
		MetricError::LengthMismatch {
			expected: 2,
			actual: 1
		}
	);
}

#[test]
fn test_precision_recall_curve_perfect_separation() {
	let scores = [0.9, 0.8, 0.2, 0.1];
	let labels = [1, 1, 0, 0];
	let curve = precision_recall_curve(&scores, &labels).unwrap();
	assert!((curve.average_precision - 1.0).abs() < 1e-6);
	assert!(!curve.points.is_empty());
	for pair in curve.points.windows(2) {
		assert!(pair[0].recall <= pair[1].recall);
	}
	for point in curve.points.iter() {
		assert!((0.0..=1.0).contains(&point.precision));
		assert!((0.0..=1.0).contains(&point.recall));
	}
}
