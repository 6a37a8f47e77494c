/*!
This module defines the classifiers a user can choose from, the hyperparameters of each, and the widgets a shell renders to collect them.

Hyperparameter structs can only be constructed through their validating constructors, so a [`ModelConfig`] always holds values inside the ranges its widgets declare.
*/

use std::{collections::BTreeMap, ops::RangeInclusive};
use thiserror::Error;

pub const C_RANGE: RangeInclusive<f64> = 0.01..=10.0;
pub const MAX_ITER_RANGE: RangeInclusive<u64> = 100..=500;
pub const N_ESTIMATORS_RANGE: RangeInclusive<u64> = 100..=5000;
pub const MAX_DEPTH_RANGE: RangeInclusive<u64> = 1..=20;

#[derive(
	Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
	Svm,
	LogisticRegression,
	RandomForest,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvalidParameterError {
	#[error("{label} must be between {min} and {max} but it is {value}")]
	OutOfRange {
		label: &'static str,
		min: f64,
		max: f64,
		value: f64,
	},
	#[error("\"{value}\" is not a valid value for {label}, expected a number")]
	NotANumber { label: &'static str, value: String },
	#[error("\"{value}\" is not a valid value for {label}, expected one of {expected}")]
	InvalidChoice {
		label: &'static str,
		value: String,
		expected: String,
	},
	#[error("the {classifier} classifier has no parameter named \"{key}\"")]
	UnknownParameter {
		classifier: &'static str,
		key: String,
	},
	#[error("unknown classifier \"{0}\", expected one of svm, logistic-regression, random-forest")]
	UnknownClassifier(String),
}

/// A control the shell renders to collect one hyperparameter.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Widget {
	pub key: &'static str,
	pub label: &'static str,
	pub kind: WidgetKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetKind {
	Number {
		min: f64,
		max: f64,
		step: f64,
		default: f64,
	},
	Integer {
		min: u64,
		max: u64,
		step: u64,
		default: u64,
	},
	Slider {
		min: u64,
		max: u64,
		default: u64,
	},
	Choice {
		options: &'static [&'static str],
		default: &'static str,
	},
}

impl ClassifierKind {
	pub const ALL: [ClassifierKind; 3] = [
		ClassifierKind::Svm,
		ClassifierKind::LogisticRegression,
		ClassifierKind::RandomForest,
	];

	/// The name used on the command line.
	pub fn key(self) -> &'static str {
		match self {
			ClassifierKind::Svm => "svm",
			ClassifierKind::LogisticRegression => "logistic-regression",
			ClassifierKind::RandomForest => "random-forest",
		}
	}

	pub fn title(self) -> &'static str {
		match self {
			ClassifierKind::Svm => "Support Vector Machine (SVM)",
			ClassifierKind::LogisticRegression => "Logistic Regression",
			ClassifierKind::RandomForest => "Random Forest",
		}
	}

	pub fn widgets(self) -> Vec<Widget> {
		let c = Widget {
			key: "c",
			label: "C (Regularization parameter)",
			kind: WidgetKind::Number {
				min: *C_RANGE.start(),
				max: *C_RANGE.end(),
				step: 0.01,
				default: *C_RANGE.start(),
			},
		};
		match self {
			ClassifierKind::Svm => vec![
				c,
				Widget {
					key: "kernel",
					label: "Kernel",
					kind: WidgetKind::Choice {
						options: &["rbf", "linear"],
						default: "rbf",
					},
				},
				Widget {
					key: "gamma",
					label: "Gamma (Kernel Coefficient)",
					kind: WidgetKind::Choice {
						options: &["scale", "auto"],
						default: "scale",
					},
				},
			],
			ClassifierKind::LogisticRegression => vec![
				c,
				Widget {
					key: "max_iter",
					label: "Maximum number of iterations",
					kind: WidgetKind::Slider {
						min: *MAX_ITER_RANGE.start(),
						max: *MAX_ITER_RANGE.end(),
						default: *MAX_ITER_RANGE.start(),
					},
				},
			],
			ClassifierKind::RandomForest => vec![
				Widget {
					key: "n_estimators",
					label: "The number of trees in the forest",
					kind: WidgetKind::Integer {
						min: *N_ESTIMATORS_RANGE.start(),
						max: *N_ESTIMATORS_RANGE.end(),
						step: 10,
						default: *N_ESTIMATORS_RANGE.start(),
					},
				},
				Widget {
					key: "max_depth",
					label: "The maximum depth of the tree",
					kind: WidgetKind::Integer {
						min: *MAX_DEPTH_RANGE.start(),
						max: *MAX_DEPTH_RANGE.end(),
						step: 1,
						default: *MAX_DEPTH_RANGE.start(),
					},
				},
				Widget {
					key: "bootstrap",
					label: "Bootstrap samples when building trees",
					kind: WidgetKind::Choice {
						options: &["True", "False"],
						default: "True",
					},
				},
			],
		}
	}
}

impl std::str::FromStr for ClassifierKind {
	type Err = InvalidParameterError;
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_lowercase().as_str() {
			"svm" | "support-vector-machine" => Ok(ClassifierKind::Svm),
			"logistic-regression" | "lr" => Ok(ClassifierKind::LogisticRegression),
			"random-forest" | "rf" => Ok(ClassifierKind::RandomForest),
			_ => Err(InvalidParameterError::UnknownClassifier(value.to_owned())),
		}
	}
}

impl std::fmt::Display for ClassifierKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.title())
	}
}

impl Widget {
	/// The widget's default rendered the way a user would type it.
	pub fn default_value(&self) -> String {
		match &self.kind {
			WidgetKind::Number { default, .. } => default.to_string(),
			WidgetKind::Integer { default, .. } => default.to_string(),
			WidgetKind::Slider { default, .. } => default.to_string(),
			WidgetKind::Choice { default, .. } => (*default).to_owned(),
		}
	}

	fn number(&self, value: &str) -> Result<f64, InvalidParameterError> {
		let value: f64 = value
			.trim()
			.parse()
			.map_err(|_| InvalidParameterError::NotANumber {
				label: self.label,
				value: value.to_owned(),
			})?;
		let (min, max) = match &self.kind {
			WidgetKind::Number { min, max, .. } => (*min, *max),
			WidgetKind::Integer { min, max, .. } | WidgetKind::Slider { min, max, .. } => {
				(*min as f64, *max as f64)
			}
			WidgetKind::Choice { .. } => (f64::NEG_INFINITY, f64::INFINITY),
		};
		check_range(self.label, value, min, max)
	}

	fn integer(&self, value: &str) -> Result<u64, InvalidParameterError> {
		let not_a_number = || InvalidParameterError::NotANumber {
			label: self.label,
			value: value.to_owned(),
		};
		let parsed: u64 = value.trim().parse().map_err(|_| not_a_number())?;
		self.number(value)?;
		Ok(parsed)
	}

	fn choice(&self, value: &str) -> Result<&'static str, InvalidParameterError> {
		let options: &'static [&'static str] = match &self.kind {
			WidgetKind::Choice { options, .. } => options,
			_ => &[],
		};
		options
			.iter()
			.find(|option| option.eq_ignore_ascii_case(value.trim()))
			.copied()
			.ok_or_else(|| InvalidParameterError::InvalidChoice {
				label: self.label,
				value: value.to_owned(),
				expected: options.join(", "),
			})
	}
}

fn check_range(
	label: &'static str,
	value: f64,
	min: f64,
	max: f64,
) -> Result<f64, InvalidParameterError> {
	if value.is_finite() && value >= min && value <= max {
		Ok(value)
	} else {
		Err(InvalidParameterError::OutOfRange {
			label,
			min,
			max,
			value,
		})
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
	Rbf,
	Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
	/// `1 / (n_features * variance of the training features)`
	Scale,
	/// `1 / n_features`
	Auto,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SvmParams {
	c: f64,
	kernel: Kernel,
	gamma: Gamma,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LogisticRegressionParams {
	c: f64,
	max_iter: u64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RandomForestParams {
	n_estimators: u64,
	max_depth: u64,
	bootstrap: bool,
}

impl SvmParams {
	pub fn new(c: f64, kernel: Kernel, gamma: Gamma) -> Result<Self, InvalidParameterError> {
		let c = check_range(
			"C (Regularization parameter)",
			c,
			*C_RANGE.start(),
			*C_RANGE.end(),
		)?;
		Ok(Self { c, kernel, gamma })
	}

	pub fn c(&self) -> f64 {
		self.c
	}

	pub fn kernel(&self) -> Kernel {
		self.kernel
	}

	pub fn gamma(&self) -> Gamma {
		self.gamma
	}
}

impl LogisticRegressionParams {
	pub fn new(c: f64, max_iter: u64) -> Result<Self, InvalidParameterError> {
		let c = check_range(
			"C (Regularization parameter)",
			c,
			*C_RANGE.start(),
			*C_RANGE.end(),
		)?;
		if !MAX_ITER_RANGE.contains(&max_iter) {
			return Err(InvalidParameterError::OutOfRange {
				label: "Maximum number of iterations",
				min: *MAX_ITER_RANGE.start() as f64,
				max: *MAX_ITER_RANGE.end() as f64,
				value: max_iter as f64,
			});
		}
		Ok(Self { c, max_iter })
	}

	pub fn c(&self) -> f64 {
		self.c
	}

	pub fn max_iter(&self) -> u64 {
		self.max_iter
	}
}

impl RandomForestParams {
	pub fn new(
		n_estimators: u64,
		max_depth: u64,
		bootstrap: bool,
	) -> Result<Self, InvalidParameterError> {
		if !N_ESTIMATORS_RANGE.contains(&n_estimators) {
			return Err(InvalidParameterError::OutOfRange {
				label: "The number of trees in the forest",
				min: *N_ESTIMATORS_RANGE.start() as f64,
				max: *N_ESTIMATORS_RANGE.end() as f64,
				value: n_estimators as f64,
			});
		}
		if !MAX_DEPTH_RANGE.contains(&max_depth) {
			return Err(InvalidParameterError::OutOfRange {
				label: "The maximum depth of the tree",
				min: *MAX_DEPTH_RANGE.start() as f64,
				max: *MAX_DEPTH_RANGE.end() as f64,
				value: max_depth as f64,
			});
		}
		Ok(Self {
			n_estimators,
			max_depth,
			bootstrap,
		})
	}

	pub fn n_estimators(&self) -> u64 {
		self.n_estimators
	}

	pub fn max_depth(&self) -> u64 {
		self.max_depth
	}

	pub fn bootstrap(&self) -> bool {
		self.bootstrap
	}
}

/// Exactly one classifier along with the hyperparameters valid for it.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "classifier", rename_all = "snake_case")]
pub enum ModelConfig {
	Svm(SvmParams),
	LogisticRegression(LogisticRegressionParams),
	RandomForest(RandomForestParams),
}

impl ModelConfig {
	pub fn kind(&self) -> ClassifierKind {
		match self {
			ModelConfig::Svm(_) => ClassifierKind::Svm,
			ModelConfig::LogisticRegression(_) => ClassifierKind::LogisticRegression,
			ModelConfig::RandomForest(_) => ClassifierKind::RandomForest,
		}
	}

	/// Build the config for `kind` from widget values keyed by [`Widget::key`]. Widgets without a value take their default.
	pub fn from_values(
		kind: ClassifierKind,
		values: &BTreeMap<String, String>,
	) -> Result<Self, InvalidParameterError> {
		let widgets = kind.widgets();
		if let Some(key) = values
			.keys()
			.find(|key| !widgets.iter().any(|widget| widget.key == key.as_str()))
		{
			return Err(InvalidParameterError::UnknownParameter {
				classifier: kind.key(),
				key: key.clone(),
			});
		}
		let value = |key: &str| widget_value(kind, &widgets, values, key);
		let config = match kind {
			ClassifierKind::Svm => {
				let (widget, c) = value("c")?;
				let c = widget.number(&c)?;
				let (widget, kernel) = value("kernel")?;
				let kernel = match widget.choice(&kernel)? {
					"linear" => Kernel::Linear,
					_ => Kernel::Rbf,
				};
				let (widget, gamma) = value("gamma")?;
				let gamma = match widget.choice(&gamma)? {
					"auto" => Gamma::Auto,
					_ => Gamma::Scale,
				};
				ModelConfig::Svm(SvmParams::new(c, kernel, gamma)?)
			}
			ClassifierKind::LogisticRegression => {
				let (widget, c) = value("c")?;
				let c = widget.number(&c)?;
				let (widget, max_iter) = value("max_iter")?;
				let max_iter = widget.integer(&max_iter)?;
				ModelConfig::LogisticRegression(LogisticRegressionParams::new(c, max_iter)?)
			}
			ClassifierKind::RandomForest => {
				let (widget, n_estimators) = value("n_estimators")?;
				let n_estimators = widget.integer(&n_estimators)?;
				let (widget, max_depth) = value("max_depth")?;
				let max_depth = widget.integer(&max_depth)?;
				let (widget, bootstrap) = value("bootstrap")?;
				let bootstrap = widget.choice(&bootstrap)? == "True";
				ModelConfig::RandomForest(RandomForestParams::new(
					n_estimators,
					max_depth,
					bootstrap,
				)?)
			}
		};
		Ok(config)
	}
}

/// Find the widget declared for `key` and the value given for it, falling back to the widget's default.
fn widget_value<'a>(
	kind: ClassifierKind,
	widgets: &'a [Widget],
	values: &BTreeMap<String, String>,
	key: &str,
) -> Result<(&'a Widget, String), InvalidParameterError> {
	let widget = widgets
		.iter()
		.find(|widget| widget.key == key)
		.ok_or_else(|| InvalidParameterError::UnknownParameter {
			classifier: kind.key(),
			key: key.to_owned(),
		})?;
	let value = values
		.get(key)
		.cloned()
		.unwrap_or_else(|| widget.default_value());
	Ok((widget, value))
}

#[cfg(test)]
fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
	pairs
		.iter()
		.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
		.collect()
}

#[test]
fn test_defaults() {
	let svm = ModelConfig::from_values(ClassifierKind::Svm, &BTreeMap::new()).unwrap();
	assert_eq!(
		svm,
		ModelConfig::Svm(SvmParams::new(0.01, Kernel::Rbf, Gamma::Scale).unwrap())
	);
	let lr = ModelConfig::from_values(ClassifierKind::LogisticRegression, &BTreeMap::new())
		.unwrap();
	assert_eq!(
		lr,
		ModelConfig::LogisticRegression(LogisticRegressionParams::new(0.01, 100).unwrap())
	);
	let rf = ModelConfig::from_values(ClassifierKind::RandomForest, &BTreeMap::new()).unwrap();
	assert_eq!(
		rf,
		ModelConfig::RandomForest(RandomForestParams::new(100, 1, true).unwrap())
	);
	assert_eq!(rf.kind(), ClassifierKind::RandomForest);
}

#[test]
fn test_from_values() {
	let svm = ModelConfig::from_values(
		ClassifierKind::Svm,
		&values(&[("c", "1.0"), ("kernel", "linear"), ("gamma", "auto")]),
	)
	.unwrap();
	assert_eq!(
		svm,
		ModelConfig::Svm(SvmParams::new(1.0, Kernel::Linear, Gamma::Auto).unwrap())
	);
	let rf = ModelConfig::from_values(
		ClassifierKind::RandomForest,
		&values(&[("n_estimators", "250"), ("max_depth", "5"), ("bootstrap", "false")]),
	)
	.unwrap();
	assert_eq!(
		rf,
		ModelConfig::RandomForest(RandomForestParams::new(250, 5, false).unwrap())
	);
}

#[test]
fn test_invalid_values() {
	let error =
		ModelConfig::from_values(ClassifierKind::Svm, &values(&[("c", "0.001")])).unwrap_err();
	insta::assert_snapshot!(error, @"C (Regularization parameter) must be between 0.01 and 10 but it is 0.001");
	let error = ModelConfig::from_values(ClassifierKind::Svm, &values(&[("kernel", "poly")]))
		.unwrap_err();
	assert!(matches!(error, InvalidParameterError::InvalidChoice { .. }));
	let error = ModelConfig::from_values(
		ClassifierKind::LogisticRegression,
		&values(&[("max_iter", "1000")]),
	)
	.unwrap_err();
	assert!(matches!(error, InvalidParameterError::OutOfRange { .. }));
	let error = ModelConfig::from_values(
		ClassifierKind::RandomForest,
		&values(&[("max_depth", "2.5")]),
	)
	.unwrap_err();
	assert!(matches!(error, InvalidParameterError::NotANumber { .. }));
	let error = ModelConfig::from_values(
		ClassifierKind::LogisticRegression,
		&values(&[("kernel", "rbf")]),
	)
	.unwrap_err();
	assert!(matches!(error, InvalidParameterError::UnknownParameter { .. }));
	assert!(SvmParams::new(f64::NAN, Kernel::Rbf, Gamma::Scale).is_err());
	assert!(RandomForestParams::new(99, 1, true).is_err());
	assert!(RandomForestParams::new(100, 21, true).is_err());
}

#[test]
fn test_classifier_kind() {
	assert_eq!("svm".parse::<ClassifierKind>(), Ok(ClassifierKind::Svm));
	assert_eq!("RF".parse::<ClassifierKind>(), Ok(ClassifierKind::RandomForest));
	assert_eq!(
		"logistic-regression".parse::<ClassifierKind>(),
		Ok(ClassifierKind::LogisticRegression)
	);
	assert!("knn".parse::<ClassifierKind>().is_err());
	for kind in ClassifierKind::ALL.iter() {
		assert_eq!(kind.key().parse::<ClassifierKind>(), Ok(*kind));
		for widget in kind.widgets() {
			assert!(!widget.default_value().is_empty());
		}
	}
	assert_eq!(ClassifierKind::Svm.to_string(), "Support Vector Machine (SVM)");
}

#[test]
fn test_widget_value() {
	let widgets = ClassifierKind::Svm.widgets();
	let (widget, value) =
		widget_value(ClassifierKind::Svm, &widgets, &values(&[("c", "2.5")]), "c").unwrap();
	assert_eq!(widget.key, "c");
	assert_eq!(value, "2.5");
	let (widget, value) =
		widget_value(ClassifierKind::Svm, &widgets, &BTreeMap::new(), "kernel").unwrap();
	assert_eq!(widget.key, "kernel");
	assert_eq!(value, "rbf");
	let error =
		widget_value(ClassifierKind::Svm, &widgets, &BTreeMap::new(), "max_iter").unwrap_err();
	assert!(matches!(
		error,
		InvalidParameterError::UnknownParameter { key, .. } if key == "max_iter"
	));
}
