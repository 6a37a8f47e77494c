/*!
This crate computes the evaluation metrics reported for a fitted binary classifier: the [`ConfusionMatrix`] with accuracy, precision and recall for the positive class, and the [`RocCurve`] and [`PrecisionRecallCurve`] over the classifier's scores.

Labels and predictions are `0` or `1`, and `1` is the positive class.
*/

#![allow(clippy::tabs_in_doc_comments)]

use thiserror::Error;

mod confusion_matrix;
mod curves;

pub use self::confusion_matrix::ConfusionMatrix;
pub use self::curves::{
	precision_recall_curve, roc_curve, PrecisionRecallCurve, PrecisionRecallPoint, RocCurve,
	RocPoint,
};

/// A metric that cannot be computed for the given predictions and labels.
#[derive(Clone, Debug, Error, PartialEq, serde::Serialize)]
pub enum MetricError {
	#[error("{metric} is undefined because {reason}")]
	Undefined {
		metric: &'static str,
		reason: &'static str,
	},
	#[error("expected {expected} values but got {actual}")]
	LengthMismatch { expected: usize, actual: usize },
	#[error("{0} is not a binary label")]
	InvalidLabel(usize),
	#[error("{0}")]
	Library(String),
}

/// Round `value` to two decimal places for display.
pub fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

#[test]
fn test_round2() {
	assert_eq!(round2(0.956), 0.96);
	assert_eq!(round2(0.5), 0.5);
	assert_eq!(round2(1.0), 1.0);
	assert_eq!(round2(0.004), 0.0);
}
