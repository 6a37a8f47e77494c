use amanita_core::{Diagnostic, DiagnosticKind, Report, Widget, WidgetKind};
use amanita_dataframe::DataFrame;
use amanita_metrics::round2;
use amanita_util::table::Table;
use colored::Colorize;
use ndarray::prelude::*;
use std::fmt::Write;

/// Curves with more points than this are thinned out for display.
const MAX_CURVE_ROWS: usize = 21;

pub fn report(report: &Report) -> String {
	let mut output = String::new();
	let optional = |value: Option<f64>| match value {
		Some(value) => format!("{:.2}", round2(value)),
		None => "undefined".to_owned(),
	};
	writeln!(output, "{}", format!("{} Results", report.classifier.title()).bold()).ok();
	writeln!(output, "Accuracy: {}", optional(report.accuracy)).ok();
	writeln!(output, "Precision: {}", optional(report.precision)).ok();
	writeln!(output, "Recall: {}", optional(report.recall)).ok();
	for error in report.errors.iter() {
		writeln!(output, "{}: {}", "warning".yellow().bold(), error).ok();
	}
	for diagnostic in report.diagnostics.iter() {
		writeln!(output).ok();
		output.push_str(&self::diagnostic(diagnostic));
	}
	output
}

fn diagnostic(diagnostic: &Diagnostic) -> String {
	match diagnostic {
		Diagnostic::ConfusionMatrix {
			class_names,
			matrix,
		} => {
			let header: Vec<String> = std::iter::once(String::new())
				.chain(class_names.iter().map(|name| format!("predicted {}", name)))
				.collect();
			let values = Array2::from_shape_fn((2, 3), |(actual, column)| match column {
				0 => format!("actual {}", class_names[actual]),
				_ => matrix.counts[actual][column - 1].to_string(),
			});
			format!(
				"{}\n{}",
				DiagnosticKind::ConfusionMatrix.title().bold(),
				Table::new(&header, &values)
			)
		}
		Diagnostic::RocCurve(roc) => {
			let header = vec![
				"False Positive Rate".to_owned(),
				"True Positive Rate".to_owned(),
			];
			let points: Vec<[f64; 2]> = roc
				.points
				.iter()
				.map(|point| [point.false_positive_rate, point.true_positive_rate])
				.collect();
			format!(
				"{} (AUC = {:.2})\n{}",
				DiagnosticKind::RocCurve.title().bold(),
				round2(roc.auc),
				Table::new(&header, &curve_values(&points))
			)
		}
		Diagnostic::PrecisionRecallCurve(curve) => {
			let header = vec!["Recall".to_owned(), "Precision".to_owned()];
			let points: Vec<[f64; 2]> = curve
				.points
				.iter()
				.map(|point| [point.recall, point.precision])
				.collect();
			format!(
				"{} (AP = {:.2})\n{}",
				DiagnosticKind::PrecisionRecallCurve.title().bold(),
				round2(curve.average_precision),
				Table::new(&header, &curve_values(&points))
			)
		}
	}
}

/// Format the points of a curve, keeping the first and last point and an evenly spaced selection of the rest.
fn curve_values(points: &[[f64; 2]]) -> Array2<String> {
	let indices: Vec<usize> = if points.len() <= MAX_CURVE_ROWS {
		(0..points.len()).collect()
	} else {
		let last = points.len() - 1;
		let mut indices: Vec<usize> = (0..MAX_CURVE_ROWS)
			.map(|i| i * last / (MAX_CURVE_ROWS - 1))
			.collect();
		indices.dedup();
		indices
	};
	Array2::from_shape_fn((indices.len(), 2), |(row, column)| {
		format!("{:.2}", round2(points[indices[row]][column]))
	})
}

pub fn widgets(widgets: &[Widget]) -> String {
	let header = vec![
		"Key".to_owned(),
		"Label".to_owned(),
		"Values".to_owned(),
		"Default".to_owned(),
	];
	let values = Array2::from_shape_fn((widgets.len(), 4), |(row, column)| {
		let widget = &widgets[row];
		match column {
			0 => widget.key.to_owned(),
			1 => widget.label.to_owned(),
			2 => match &widget.kind {
				WidgetKind::Number { min, max, step, .. } => {
					format!("{} to {} in steps of {}", min, max, step)
				}
				WidgetKind::Integer { min, max, step, .. } => {
					format!("{} to {} in steps of {}", min, max, step)
				}
				WidgetKind::Slider { min, max, .. } => format!("{} to {}", min, max),
				WidgetKind::Choice { options, .. } => options.join(", "),
			},
			_ => widget.default_value(),
		}
	});
	Table::new(&header, &values).to_string()
}

/// Render the first `n_rows` rows of `dataframe`.
pub fn dataframe(dataframe: &DataFrame, n_rows: usize) -> String {
	let header: Vec<String> = dataframe
		.column_names()
		.into_iter()
		.map(|name| name.to_owned())
		.collect();
	let n_rows = n_rows.min(dataframe.nrows());
	let values = Array2::from_shape_fn((n_rows, dataframe.ncols()), |(row, column)| {
		dataframe.display_value(row, column).unwrap_or_default()
	});
	let mut output = Table::new(&header, &values).to_string();
	writeln!(
		output,
		"{} of {} rows, {} columns",
		n_rows,
		dataframe.nrows(),
		dataframe.ncols()
	)
	.ok();
	output
}

#[test]
fn test_curve_values() {
	let points: Vec<[f64; 2]> = (0..=100)
		.map(|i| [i as f64 / 100.0, (i as f64 / 100.0).sqrt()])
		.collect();
	let values = curve_values(&points);
	assert_eq!(values.nrows(), MAX_CURVE_ROWS);
	assert_eq!(values[(0, 0)], "0.00");
	assert_eq!(values[(MAX_CURVE_ROWS - 1, 0)], "1.00");
	assert_eq!(values[(MAX_CURVE_ROWS - 1, 1)], "1.00");
	assert_eq!(curve_values(&points[..3]).nrows(), 3);
}

#[test]
fn test_widgets() {
	let widgets = amanita_core::ClassifierKind::LogisticRegression.widgets();
	insta::assert_snapshot!(self::widgets(&widgets), @r###"
	| Key      | Label                        | Values                      | Default |
	|----------|------------------------------|-----------------------------|---------|
	| c        | C (Regularization parameter) | 0.01 to 10 in steps of 0.01 | 0.01    |
	| max_iter | Maximum number of iterations | 100 to 500                  | 100     |
	"###);
}

#[test]
fn test_report_with_undefined_metrics() {
	let report = Report {
		classifier: amanita_core::ClassifierKind::Svm,
		class_names: ["edible".to_owned(), "poisonous".to_owned()],
		n_test_examples: 0,
		accuracy: None,
		precision: None,
		recall: Some(0.5),
		diagnostics: Vec::new(),
		errors: Vec::new(),
	};
	let output = self::report(&report);
	assert!(output.contains("Accuracy: undefined\n"));
	assert!(output.contains("Precision: undefined\n"));
	assert!(output.contains("Recall: 0.50\n"));
}
