use crate::model::{Gamma, Kernel, ModelConfig};
use anyhow::{bail, Context, Result};
use linfa::prelude::*;
use linfa_ensemble::{EnsembleLearner, EnsembleLearnerParams};
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use linfa_svm::Svm;
use linfa_trees::DecisionTree;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::{seq::index, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::ops::Neg;

/// A fitted binary classifier. Labels are `0` or `1`.
pub enum Classifier {
	Svm(Svm<f64, bool>),
	LogisticRegression(FittedLogisticRegression<f64, usize>),
	RandomForest(EnsembleLearner<DecisionTree<f64, usize>>),
}

impl Classifier {
	/// Fit the classifier `config` describes to the training `features` and `labels`. `seed` seeds the row and feature samples of random forests.
	pub fn fit(
		config: &ModelConfig,
		features: ArrayView2<f64>,
		labels: ArrayView1<usize>,
		seed: u64,
	) -> Result<Classifier> {
		if features.nrows() != labels.len() {
			bail!(
				"the features have {} rows but there are {} labels",
				features.nrows(),
				labels.len()
			);
		}
		if features.nrows() == 0 {
			bail!("cannot fit a classifier to an empty training set");
		}
		if features.ncols() == 0 {
			bail!("cannot fit a classifier without features");
		}
		if let Some(label) = labels.iter().find(|label| **label > 1) {
			bail!("{} is not a binary label", label);
		}
		let n_positives = labels.iter().filter(|label| **label == 1).count();
		if n_positives == 0 || n_positives == labels.len() {
			bail!("the training labels contain a single class");
		}
		let n_features = features.ncols();
		tracing::info!(
			classifier = config.kind().key(),
			n_examples = features.nrows(),
			n_features,
			"fitting classifier"
		);
		let classifier = match config {
			ModelConfig::Svm(params) => {
				let targets = labels.mapv(|label| label == 1);
				let dataset = Dataset::new(features.to_owned(), targets);
				let svm_params = Svm::<f64, bool>::params().pos_neg_weights(params.c(), params.c());
				let svm_params = match params.kernel() {
					Kernel::Linear => svm_params.linear_kernel(),
					Kernel::Rbf => {
						let gamma = compute_gamma(params.gamma(), features);
						tracing::debug!(gamma, "rbf kernel");
						svm_params.gaussian_kernel(1.0 / gamma)
					}
				};
				let model = svm_params
					.fit(&dataset)
					.context("failed to fit the support vector machine")?;
				Classifier::Svm(model)
			}
			ModelConfig::LogisticRegression(params) => {
				let dataset = Dataset::new(features.to_owned(), labels.to_owned());
				let model = LogisticRegression::default()
					.alpha(1.0 / params.c())
					.max_iterations(params.max_iter())
					.fit(&dataset)
					.context("failed to fit the logistic regression")?;
				Classifier::LogisticRegression(model)
			}
			ModelConfig::RandomForest(params) => {
				let max_depth = params
					.max_depth()
					.to_usize()
					.context("max depth does not fit in usize")?;
				let ensemble_size = params
					.n_estimators()
					.to_usize()
					.context("n_estimators does not fit in usize")?;
				let tree_params = DecisionTree::<f64, usize>::params().max_depth(Some(max_depth));
				let n_split_features = split_feature_count(n_features);
				let mut rng = Xoshiro256Plus::seed_from_u64(seed);
				let model = if params.bootstrap() {
					let dataset = Dataset::new(features.to_owned(), labels.to_owned());
					EnsembleLearnerParams::new_fixed_rng(tree_params, rng)
						.ensemble_size(ensemble_size)
						.bootstrap_proportion(1.0)
						.feature_proportion(
							n_split_features.to_f64().unwrap() / n_features.to_f64().unwrap(),
						)
						.fit(&dataset)
						.context("failed to fit the random forest")?
				} else {
					// Every tree sees all rows, so the trees differ only in their features.
					let mut models = Vec::with_capacity(ensemble_size);
					let mut model_features = Vec::with_capacity(ensemble_size);
					for _ in 0..ensemble_size {
						let mut selected =
							index::sample(&mut rng, n_features, n_split_features).into_vec();
						selected.sort_unstable();
						let dataset =
							Dataset::new(features.select(Axis(1), &selected), labels.to_owned());
						let tree = tree_params
							.fit(&dataset)
							.context("failed to fit the random forest")?;
						models.push(tree);
						model_features.push(selected);
					}
					EnsembleLearner {
						models,
						model_features,
					}
				};
				tracing::debug!(
					n_trees = model.models.len(),
					n_split_features,
					bootstrap = params.bootstrap(),
					"random forest"
				);
				Classifier::RandomForest(model)
			}
		};
		Ok(classifier)
	}

	pub fn predict(&self, features: ArrayView2<f64>) -> Array1<usize> {
		let features = features.to_owned();
		match self {
			Classifier::Svm(model) => {
				let predictions: Array1<bool> = model.predict(&features);
				predictions.mapv(usize::from)
			}
			Classifier::LogisticRegression(model) => model.predict(&features),
			Classifier::RandomForest(model) => model.predict(&features),
		}
	}

	/// The fraction of examples whose prediction equals the label.
	pub fn score(&self, features: ArrayView2<f64>, labels: ArrayView1<usize>) -> f64 {
		if labels.is_empty() {
			return 0.0;
		}
		let predictions = self.predict(features);
		let n_correct = predictions
			.iter()
			.zip(labels.iter())
			.filter(|(prediction, label)| prediction == label)
			.count();
		n_correct.to_f64().unwrap() / labels.len().to_f64().unwrap()
	}

	/// Compute a score in `[0, 1]` for each example that increases with the model's confidence that the example belongs to class `1`.
	pub fn decision_scores(&self, features: ArrayView2<f64>) -> Vec<f32> {
		let features = features.to_owned();
		let scores: Vec<f64> = match self {
			Classifier::Svm(model) => features
				.axis_iter(Axis(0))
				.map(|example| sigmoid(model.weighted_sum(&example) - model.rho))
				.collect(),
			Classifier::LogisticRegression(model) => {
				model.predict_probabilities(&features).to_vec()
			}
			Classifier::RandomForest(model) => {
				let subsets: Vec<Array2<f64>> = model
					.model_features
					.iter()
					.map(|selected| features.select(Axis(1), selected))
					.collect();
				let mut votes = Array1::<f64>::zeros(features.nrows());
				let mut n_trees = 0;
				for predictions in model.generate_predictions::<_, Array1<usize>>(&subsets) {
					votes.zip_mut_with(&predictions, |votes, prediction| {
						*votes += prediction.to_f64().unwrap()
					});
					n_trees += 1;
				}
				if n_trees > 0 {
					votes /= n_trees.to_f64().unwrap();
				}
				votes.to_vec()
			}
		};
		scores
			.into_iter()
			.map(|score| score.to_f32().unwrap_or(0.0))
			.collect()
	}
}

/// scale: 1 / (n_features * var(x)), auto: 1 / n_features
fn compute_gamma(gamma: Gamma, features: ArrayView2<f64>) -> f64 {
	let n_features = features.ncols().max(1).to_f64().unwrap();
	match gamma {
		Gamma::Auto => 1.0 / n_features,
		Gamma::Scale => {
			let n_values = features.len().max(1).to_f64().unwrap();
			let mean = features.sum() / n_values;
			let variance = features
				.iter()
				.map(|value| (value - mean).powi(2))
				.sum::<f64>()
				/ n_values;
			if variance > 0.0 {
				1.0 / (n_features * variance)
			} else {
				1.0
			}
		}
	}
}

/// The number of features each tree of a random forest is fitted on, sqrt(n_features) rounded up.
fn split_feature_count(n_features: usize) -> usize {
	let n = n_features.to_f64().unwrap().sqrt().ceil().to_usize().unwrap_or(1);
	n.clamp(1, n_features.max(1))
}

fn sigmoid(value: f64) -> f64 {
	1.0 / (value.neg().exp() + 1.0)
}

#[cfg(test)]
fn separable_dataset(n_examples: usize) -> (Array2<f64>, Array1<usize>) {
	let labels = Array1::from_shape_fn(n_examples, |i| i % 2);
	let features = Array2::from_shape_fn((n_examples, 3), |(i, j)| {
		let label = (i % 2) as f64;
		match j {
			0 => label * 4.0 + (i % 5) as f64 * 0.1,
			1 => label * 2.0 - (i % 3) as f64 * 0.1,
			_ => (i % 4) as f64,
		}
	});
	(features, labels)
}

#[cfg(test)]
fn model_config(kind: crate::model::ClassifierKind, pairs: &[(&str, &str)]) -> ModelConfig {
	let values = pairs
		.iter()
		.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
		.collect();
	ModelConfig::from_values(kind, &values).unwrap()
}

#[test]
fn test_svm() {
	use crate::model::ClassifierKind;
	let (features, labels) = separable_dataset(60);
	for kernel in ["rbf", "linear"].iter() {
		let config = model_config(ClassifierKind::Svm, &[("c", "1.0"), ("kernel", kernel)]);
		let classifier = Classifier::fit(&config, features.view(), labels.view(), 0).unwrap();
		assert!(classifier.score(features.view(), labels.view()) >= 0.5);
		let scores = classifier.decision_scores(features.view());
		assert_eq!(scores.len(), 60);
		assert!(scores.iter().all(|score| (0.0..=1.0).contains(score)));
	}
}

#[test]
fn test_svm_scores_agree_with_predictions() {
	use crate::model::ClassifierKind;
	let (features, labels) = separable_dataset(60);
	for kernel in ["rbf", "linear"].iter() {
		let config = model_config(ClassifierKind::Svm, &[("c", "1.0"), ("kernel", kernel)]);
		let classifier = Classifier::fit(&config, features.view(), labels.view(), 0).unwrap();
		let predictions = classifier.predict(features.view());
		let scores = classifier.decision_scores(features.view());
		for (score, prediction) in scores.iter().zip(predictions.iter()) {
			assert_eq!(*score >= 0.5, *prediction == 1, "kernel {}", kernel);
		}
	}
}

#[test]
fn test_logistic_regression() {
	use crate::model::ClassifierKind;
	let (features, labels) = separable_dataset(60);
	let config = model_config(ClassifierKind::LogisticRegression, &[("c", "1.0")]);
	let classifier = Classifier::fit(&config, features.view(), labels.view(), 0).unwrap();
	assert!(classifier.score(features.view(), labels.view()) >= 0.9);
	let predictions = classifier.predict(features.view());
	assert!(predictions.iter().all(|prediction| *prediction <= 1));
	let scores = classifier.decision_scores(features.view());
	assert!(scores.iter().all(|score| (0.0..=1.0).contains(score)));
}

#[test]
fn test_random_forest() {
	use crate::model::ClassifierKind;
	let (features, labels) = separable_dataset(60);
	let config = model_config(
		ClassifierKind::RandomForest,
		&[("n_estimators", "100"), ("max_depth", "3")],
	);
	let classifier = Classifier::fit(&config, features.view(), labels.view(), 7).unwrap();
	assert!(matches!(classifier, Classifier::RandomForest(_)));
	assert!(classifier.score(features.view(), labels.view()) >= 0.9);
	let scores = classifier.decision_scores(features.view());
	assert!(scores.iter().all(|score| (0.0..=1.0).contains(score)));
	let config = model_config(
		ClassifierKind::RandomForest,
		&[("max_depth", "3"), ("bootstrap", "False")],
	);
	let classifier = Classifier::fit(&config, features.view(), labels.view(), 7).unwrap();
	assert_eq!(classifier.score(features.view(), labels.view()), 1.0);
	let scores = classifier.decision_scores(features.view());
	assert!(scores.iter().all(|score| (0.0..=1.0).contains(score)));
}

#[test]
fn test_random_forest_without_bootstrap_uses_n_estimators() {
	use crate::model::ClassifierKind;
	let (features, labels) = separable_dataset(60);
	let n_trees = |n_estimators: &str| {
		let config = model_config(
			ClassifierKind::RandomForest,
			&[
				("n_estimators", n_estimators),
				("max_depth", "3"),
				("bootstrap", "False"),
			],
		);
		match Classifier::fit(&config, features.view(), labels.view(), 7).unwrap() {
			Classifier::RandomForest(model) => {
				assert!(model
					.model_features
					.iter()
					.all(|selected| selected.len() == 2));
				model.models.len()
			}
			_ => panic!("expected a random forest"),
		}
	};
	assert_eq!(n_trees("100"), 100);
	assert_eq!(n_trees("200"), 200);
}

#[test]
fn test_split_feature_count() {
	assert_eq!(split_feature_count(0), 1);
	assert_eq!(split_feature_count(1), 1);
	assert_eq!(split_feature_count(3), 2);
	assert_eq!(split_feature_count(22), 5);
}

#[test]
fn test_fit_errors() {
	use crate::model::ClassifierKind;
	let config = ModelConfig::from_values(ClassifierKind::Svm, &Default::default()).unwrap();
	let (features, labels) = separable_dataset(10);
	let error = Classifier::fit(&config, features.view(), labels.slice(s![..5]), 0)
		.err()
		.unwrap();
	insta::assert_snapshot!(error, @"the features have 10 rows but there are 5 labels");
	let empty_features = Array2::<f64>::zeros((0, 3));
	let empty_labels = Array1::<usize>::zeros(0);
	assert!(Classifier::fit(&config, empty_features.view(), empty_labels.view(), 0).is_err());
	let single_class = Array1::<usize>::zeros(10);
	assert!(Classifier::fit(&config, features.view(), single_class.view(), 0).is_err());
}
