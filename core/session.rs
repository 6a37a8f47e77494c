/*!
A [`Session`] handles classify requests from a shell. It keeps the most recently loaded dataset and its split so that repeated requests against the same source only fit and evaluate a model.
*/

use crate::{
	classifier::Classifier,
	config::Config,
	evaluate::{evaluate, DiagnosticKind, Report},
	model::ModelConfig,
};
use amanita_dataframe::{
	train_test_split, DataFrame, LoadError, Source, Split, SplitError, SplitOptions,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifyRequest {
	pub source: Source,
	/// The name of the column to predict.
	pub target: String,
	pub split: SplitOptions,
	pub model: ModelConfig,
	pub diagnostics: Vec<DiagnosticKind>,
	/// Display names for the values of the target column. Values without an entry are shown as they are.
	pub class_names: BTreeMap<String, String>,
}

impl ClassifyRequest {
	pub fn new(
		config: &Config,
		model: ModelConfig,
		diagnostics: Vec<DiagnosticKind>,
	) -> Result<Self> {
		Ok(Self {
			source: config.source()?,
			target: config.target().to_owned(),
			split: config.split_options(),
			model,
			diagnostics,
			class_names: config.class_names(),
		})
	}
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
	Report(Report),
	/// The dataset could not be loaded, so nothing was split or fitted.
	DataUnavailable { message: String },
}

#[derive(Default)]
pub struct Session {
	cached: Option<Cached>,
	n_loads: usize,
}

struct Cached {
	source: Source,
	/// The encoded dataset.
	dataframe: DataFrame,
	split: Option<CachedSplit>,
}

struct CachedSplit {
	target: String,
	options: SplitOptions,
	split: Split,
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	/// The number of times a dataset was read from its source.
	pub fn n_loads(&self) -> usize {
		self.n_loads
	}

	/// Load, split, fit and evaluate. Failing to load the dataset is reported as [`Outcome::DataUnavailable`], any later failure is returned as an error.
	pub fn handle(&mut self, request: &ClassifyRequest) -> Result<Outcome> {
		let cached = match self.load(&request.source) {
			Ok(cached) => cached,
			Err(error) => {
				let message = format!("{:#}", anyhow::Error::from(error));
				tracing::warn!(%message, "data unavailable");
				return Ok(Outcome::DataUnavailable { message });
			}
		};
		let split = cached
			.split(&request.target, request.split)
			.context("failed to split the dataset")?;
		let classifier = Classifier::fit(
			&request.model,
			split.x_train.view(),
			split.y_train.view(),
			request.split.seed,
		)?;
		let class_names = split
			.class_names
			.clone()
			.map(|name| request.class_names.get(&name).cloned().unwrap_or(name));
		let report = evaluate(
			&classifier,
			request.model.kind(),
			class_names,
			split.x_test.view(),
			split.y_test.view(),
			&request.diagnostics,
		);
		Ok(Outcome::Report(report))
	}

	/// Retrieve the encoded dataset at `source`, loading it if it is not the cached one.
	pub fn raw_data(&mut self, source: &Source) -> Result<&DataFrame, LoadError> {
		Ok(&self.load(source)?.dataframe)
	}

	fn load(&mut self, source: &Source) -> Result<&mut Cached, LoadError> {
		let cached = match self.cached.take() {
			Some(cached) if cached.source == *source => {
				tracing::debug!(%source, "reusing cached dataset");
				cached
			}
			_ => {
				let dataframe = DataFrame::load(source)?.encode();
				self.n_loads += 1;
				Cached {
					source: source.clone(),
					dataframe,
					split: None,
				}
			}
		};
		Ok(self.cached.insert(cached))
	}
}

impl Cached {
	fn split(&mut self, target: &str, options: SplitOptions) -> Result<&Split, SplitError> {
		let split = match self.split.take() {
			Some(split) if split.target == target && split.options == options => {
				tracing::debug!(column = target, "reusing cached split");
				split
			}
			_ => CachedSplit {
				target: target.to_owned(),
				options,
				split: train_test_split(&self.dataframe, target, options)?,
			},
		};
		Ok(&self.split.insert(split).split)
	}
}

#[cfg(test)]
fn mushrooms_csv(n_rows: usize) -> tempfile::NamedTempFile {
	use std::io::Write;
	let odors = ["a", "f", "n", "s"];
	let colors = ["n", "w", "y"];
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "type,odor,cap-color").unwrap();
	for i in 0..n_rows {
		let odor = odors[i % odors.len()];
		let kind = if odor == "f" || odor == "s" { "p" } else { "e" };
		writeln!(file, "{},{},{}", kind, odor, colors[i % colors.len()]).unwrap();
	}
	file
}

#[cfg(test)]
fn request(
	source: Source,
	model: ModelConfig,
	diagnostics: Vec<DiagnosticKind>,
) -> ClassifyRequest {
	let mut request = ClassifyRequest::new(&Config::default(), model, diagnostics).unwrap();
	request.source = source;
	request
}

#[test]
fn test_svm_report() {
	use crate::{evaluate::Diagnostic, model::ClassifierKind};
	let file = mushrooms_csv(80);
	let mut values = BTreeMap::new();
	values.insert("c".to_owned(), "1.0".to_owned());
	let model = ModelConfig::from_values(ClassifierKind::Svm, &values).unwrap();
	let request = request(
		Source::Path(file.path().to_owned()),
		model,
		vec![DiagnosticKind::ConfusionMatrix],
	);
	let mut session = Session::new();
	let report = match session.handle(&request).unwrap() {
		Outcome::Report(report) => report,
		outcome => panic!("unexpected outcome {:?}", outcome),
	};
	assert!(report.accuracy.unwrap() >= 0.5);
	assert_eq!(report.n_test_examples, 24);
	assert_eq!(
		report.class_names,
		["edible".to_owned(), "poisonous".to_owned()]
	);
	match &report.diagnostics[..] {
		[Diagnostic::ConfusionMatrix { matrix, .. }] => {
			assert_eq!(matrix.counts.len(), 2);
			assert_eq!(matrix.n_examples(), 24);
		}
		diagnostics => panic!("unexpected diagnostics {:?}", diagnostics),
	}
}

#[test]
fn test_zero_diagnostics() {
	use crate::model::ClassifierKind;
	let file = mushrooms_csv(80);
	let mut values = BTreeMap::new();
	values.insert("c".to_owned(), "1.0".to_owned());
	let model = ModelConfig::from_values(ClassifierKind::LogisticRegression, &values).unwrap();
	let request = request(Source::Path(file.path().to_owned()), model, vec![]);
	let outcome = Session::new().handle(&request).unwrap();
	let report = match outcome {
		Outcome::Report(report) => report,
		outcome => panic!("unexpected outcome {:?}", outcome),
	};
	assert!((0.0..=1.0).contains(&report.accuracy.unwrap()));
	assert!(report.diagnostics.is_empty());
	assert!(report.precision.is_some() || !report.errors.is_empty());
	assert!(report.recall.is_some());
}

#[test]
fn test_unreachable_source() {
	use crate::model::ClassifierKind;
	let source = Source::parse("http://127.0.0.1:1/mushrooms.csv").unwrap();
	let model = ModelConfig::from_values(ClassifierKind::Svm, &BTreeMap::new()).unwrap();
	let request = request(source, model, vec![DiagnosticKind::RocCurve]);
	let mut session = Session::new();
	let outcome = session.handle(&request).unwrap();
	match outcome {
		Outcome::DataUnavailable { message } => {
			assert!(message.starts_with("failed to fetch http://127.0.0.1:1/mushrooms.csv"))
		}
		outcome => panic!("unexpected outcome {:?}", outcome),
	}
	assert_eq!(session.n_loads(), 0);
	assert!(session.cached.is_none());
}

#[test]
fn test_cache() {
	use crate::model::ClassifierKind;
	let a = mushrooms_csv(40);
	let b = mushrooms_csv(60);
	let model = ModelConfig::from_values(ClassifierKind::RandomForest, &BTreeMap::new()).unwrap();
	let mut session = Session::new();
	let request_a = request(Source::Path(a.path().to_owned()), model.clone(), vec![]);
	session.handle(&request_a).unwrap();
	session.handle(&request_a).unwrap();
	assert_eq!(session.n_loads(), 1);
	assert_eq!(session.raw_data(&request_a.source).unwrap().nrows(), 40);
	assert_eq!(session.n_loads(), 1);
	let request_b = request(Source::Path(b.path().to_owned()), model, vec![]);
	session.handle(&request_b).unwrap();
	assert_eq!(session.n_loads(), 2);
	assert_eq!(session.raw_data(&request_b.source).unwrap().nrows(), 60);
}

#[test]
fn test_missing_target_is_an_error() {
	use crate::model::ClassifierKind;
	let file = mushrooms_csv(20);
	let model = ModelConfig::from_values(ClassifierKind::Svm, &BTreeMap::new()).unwrap();
	let mut request = request(Source::Path(file.path().to_owned()), model, vec![]);
	request.target = "class".to_owned();
	let error = Session::new().handle(&request).unwrap_err();
	assert_eq!(error.to_string(), "failed to split the dataset");
}
