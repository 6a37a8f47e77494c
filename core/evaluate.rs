/*!
This module evaluates a fitted [`Classifier`] on the test split and assembles the [`Report`] shown to the user.

Precision and recall are computed for the positive class `1`. Accuracy, precision and recall are omitted, along with a [`MetricError`] in [`Report::errors`], when they are undefined. Each requested [`Diagnostic`] that cannot be computed is likewise recorded as an error rather than failing the whole evaluation.
*/

use crate::{classifier::Classifier, model::ClassifierKind};
use amanita_metrics::{
	precision_recall_curve, roc_curve, ConfusionMatrix, MetricError, PrecisionRecallCurve,
	RocCurve,
};
use ndarray::prelude::*;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
	ConfusionMatrix,
	RocCurve,
	PrecisionRecallCurve,
}

#[derive(Debug, Error)]
#[error("unknown metric \"{0}\", expected one of confusion-matrix, roc-curve, precision-recall-curve")]
pub struct UnknownDiagnosticError(String);

impl DiagnosticKind {
	pub const ALL: [DiagnosticKind; 3] = [
		DiagnosticKind::ConfusionMatrix,
		DiagnosticKind::RocCurve,
		DiagnosticKind::PrecisionRecallCurve,
	];

	pub fn title(self) -> &'static str {
		match self {
			DiagnosticKind::ConfusionMatrix => "Confusion Matrix",
			DiagnosticKind::RocCurve => "ROC Curve",
			DiagnosticKind::PrecisionRecallCurve => "Precision-Recall Curve",
		}
	}
}

impl std::str::FromStr for DiagnosticKind {
	type Err = UnknownDiagnosticError;
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_lowercase().replace('_', "-").as_str() {
			"confusion-matrix" => Ok(DiagnosticKind::ConfusionMatrix),
			"roc-curve" | "roc" => Ok(DiagnosticKind::RocCurve),
			"precision-recall-curve" | "pr-curve" => Ok(DiagnosticKind::PrecisionRecallCurve),
			_ => Err(UnknownDiagnosticError(value.to_owned())),
		}
	}
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
	ConfusionMatrix {
		/// The display names of classes `0` and `1`.
		class_names: [String; 2],
		matrix: ConfusionMatrix,
	},
	RocCurve(RocCurve),
	PrecisionRecallCurve(PrecisionRecallCurve),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Report {
	pub classifier: ClassifierKind,
	pub class_names: [String; 2],
	pub n_test_examples: usize,
	pub accuracy: Option<f64>,
	pub precision: Option<f64>,
	pub recall: Option<f64>,
	pub diagnostics: Vec<Diagnostic>,
	/// Metrics that could not be computed.
	pub errors: Vec<MetricError>,
}

/// Evaluate `classifier` on the test features and labels, computing the requested diagnostics in the order given.
pub fn evaluate(
	classifier: &Classifier,
	kind: ClassifierKind,
	class_names: [String; 2],
	x_test: ArrayView2<f64>,
	y_test: ArrayView1<usize>,
	diagnostics: &[DiagnosticKind],
) -> Report {
	let predictions = classifier.predict(x_test).to_vec();
	let labels = y_test.to_vec();
	let report = evaluate_predictions(
		kind,
		class_names,
		&predictions,
		&labels,
		|| classifier.decision_scores(x_test),
		diagnostics,
	);
	tracing::info!(
		classifier = kind.key(),
		accuracy = ?report.accuracy,
		n_errors = report.errors.len(),
		"evaluated classifier"
	);
	report
}

/// Compute the report from predictions and labels. `scores` is only called if a curve was requested.
fn evaluate_predictions(
	kind: ClassifierKind,
	class_names: [String; 2],
	predictions: &[usize],
	labels: &[usize],
	scores: impl FnOnce() -> Vec<f32>,
	diagnostics: &[DiagnosticKind],
) -> Report {
	let mut errors = Vec::new();
	let mut record = |error: MetricError| {
		tracing::warn!(%error, "metric not computed");
		errors.push(error);
	};
	let matrix = ConfusionMatrix::from_predictions(predictions, labels).unwrap_or_else(|error| {
		record(error);
		ConfusionMatrix::new()
	});
	let accuracy = matrix.accuracy().map_err(&mut record).ok();
	let precision = matrix.precision().map_err(&mut record).ok();
	let recall = matrix.recall().map_err(&mut record).ok();
	let needs_scores = diagnostics.iter().any(|diagnostic| {
		matches!(
			diagnostic,
			DiagnosticKind::RocCurve | DiagnosticKind::PrecisionRecallCurve
		)
	});
	let scores = if needs_scores { scores() } else { Vec::new() };
	let mut computed = Vec::with_capacity(diagnostics.len());
	for diagnostic in diagnostics {
		let diagnostic = match diagnostic {
			DiagnosticKind::ConfusionMatrix => Ok(Diagnostic::ConfusionMatrix {
				class_names: class_names.clone(),
				matrix: matrix.clone(),
			}),
			DiagnosticKind::RocCurve => roc_curve(&scores, labels).map(Diagnostic::RocCurve),
			DiagnosticKind::PrecisionRecallCurve => {
				precision_recall_curve(&scores, labels).map(Diagnostic::PrecisionRecallCurve)
			}
		};
		match diagnostic {
			Ok(diagnostic) => computed.push(diagnostic),
			Err(error) => record(error),
		}
	}
	Report {
		classifier: kind,
		class_names,
		n_test_examples: labels.len(),
		accuracy,
		precision,
		recall,
		diagnostics: computed,
		errors,
	}
}

#[cfg(test)]
fn class_names() -> [String; 2] {
	["edible".to_owned(), "poisonous".to_owned()]
}

#[test]
fn test_zero_diagnostics() {
	let report = evaluate_predictions(
		ClassifierKind::Svm,
		class_names(),
		&[0, 1, 1, 0],
		&[0, 1, 0, 0],
		|| panic!("scores are not needed without curves"),
		&[],
	);
	assert_eq!(report.accuracy, Some(0.75));
	assert_eq!(report.precision, Some(0.5));
	assert_eq!(report.recall, Some(1.0));
	assert!(report.diagnostics.is_empty());
	assert!(report.errors.is_empty());
}

#[test]
fn test_all_diagnostics() {
	let report = evaluate_predictions(
		ClassifierKind::RandomForest,
		class_names(),
		&[0, 1, 1, 0],
		&[0, 1, 1, 0],
		|| vec![0.1, 0.9, 0.7, 0.2],
		&DiagnosticKind::ALL,
	);
	assert_eq!(report.accuracy, Some(1.0));
	assert_eq!(report.diagnostics.len(), 3);
	match &report.diagnostics[0] {
		Diagnostic::ConfusionMatrix {
			class_names,
			matrix,
		} => {
			assert_eq!(class_names[1], "poisonous");
			assert_eq!(matrix.counts, [[2, 0], [0, 2]]);
		}
		diagnostic => panic!("unexpected diagnostic {:?}", diagnostic),
	}
	match &report.diagnostics[1] {
		Diagnostic::RocCurve(roc) => assert!((roc.auc - 1.0).abs() < 1e-6),
		diagnostic => panic!("unexpected diagnostic {:?}", diagnostic),
	}
}

#[test]
fn test_undefined_precision_is_not_fatal() {
	let report = evaluate_predictions(
		ClassifierKind::LogisticRegression,
		class_names(),
		&[0, 0, 0, 0],
		&[0, 1, 0, 1],
		|| vec![0.1, 0.2, 0.3, 0.4],
		&[DiagnosticKind::ConfusionMatrix],
	);
	assert_eq!(report.accuracy, Some(0.5));
	assert_eq!(report.precision, None);
	assert_eq!(report.recall, Some(0.0));
	assert_eq!(report.diagnostics.len(), 1);
	insta::assert_debug_snapshot!(report.errors, @r###"
	[
	    Undefined {
	        metric: "precision",
	        reason: "no example was predicted positive",
	    },
	]
	"###);
}

#[test]
fn test_single_class_curve_is_not_fatal() {
	let report = evaluate_predictions(
		ClassifierKind::Svm,
		class_names(),
		&[1, 1],
		&[1, 1],
		|| vec![0.8, 0.9],
		&[DiagnosticKind::RocCurve, DiagnosticKind::ConfusionMatrix],
	);
	assert_eq!(report.accuracy, Some(1.0));
	assert_eq!(report.precision, Some(1.0));
	assert_eq!(report.diagnostics.len(), 1);
	assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_empty_test_set_has_no_accuracy() {
	let report = evaluate_predictions(
		ClassifierKind::Svm,
		class_names(),
		&[],
		&[],
		Vec::new,
		&[DiagnosticKind::ConfusionMatrix],
	);
	assert_eq!(report.n_test_examples, 0);
	assert_eq!(report.accuracy, None);
	assert_eq!(report.precision, None);
	assert_eq!(report.recall, None);
	assert_eq!(report.diagnostics.len(), 1);
	insta::assert_snapshot!(report.errors[0], @"accuracy is undefined because there are no examples");
}

#[test]
fn test_diagnostic_kind() {
	assert_eq!(
		"confusion-matrix".parse::<DiagnosticKind>().unwrap(),
		DiagnosticKind::ConfusionMatrix
	);
	assert_eq!(
		"precision_recall_curve".parse::<DiagnosticKind>().unwrap(),
		DiagnosticKind::PrecisionRecallCurve
	);
	assert!("lift".parse::<DiagnosticKind>().is_err());
}
