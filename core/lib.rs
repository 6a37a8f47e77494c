/*!
This crate fits binary classifiers to a tabular dataset and evaluates them on a holdout set.

A shell builds a [`ClassifyRequest`] from a [`Config`] and the widget values of one [`ClassifierKind`], and passes it to [`Session::handle`], which loads, encodes and splits the dataset, fits the chosen [`Classifier`], and returns a [`Report`] of its metrics.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod classifier;
pub mod config;
pub mod evaluate;
pub mod model;
pub mod session;

pub use self::{
	classifier::Classifier,
	config::Config,
	evaluate::{evaluate, Diagnostic, DiagnosticKind, Report},
	model::{
		ClassifierKind, Gamma, InvalidParameterError, Kernel, LogisticRegressionParams,
		ModelConfig, RandomForestParams, SvmParams, Widget, WidgetKind,
	},
	session::{ClassifyRequest, Outcome, Session},
};
