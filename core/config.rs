/*!
This module defines the `Config` struct, which is read from an optional yaml file and configures where the dataset comes from and how it is split.
*/

use amanita_dataframe::{Source, SplitOptions};
use anyhow::{Context, Result};
use std::{collections::BTreeMap, path::Path};

pub const DEFAULT_SOURCE: &str = "data/mushrooms.csv";
pub const DEFAULT_TARGET: &str = "type";

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// A path or an http(s) url to a csv file.
	pub source: Option<String>,
	/// The name of the column to predict.
	pub target: Option<String>,
	pub test_fraction: Option<f64>,
	pub seed: Option<u64>,
	/// Display names for the values of the target column.
	pub class_names: Option<BTreeMap<String, String>>,
}

impl Config {
	pub fn from_path(path: &Path) -> Result<Config> {
		let config = std::fs::read_to_string(path)
			.with_context(|| format!("failed to read config file {}", path.display()))?;
		let config = serde_yaml::from_str(&config)
			.with_context(|| format!("failed to parse config file {}", path.display()))?;
		Ok(config)
	}

	/// Load the config at `path` if one was given, and the defaults otherwise.
	pub fn load(path: Option<&Path>) -> Result<Config> {
		match path {
			Some(path) => Self::from_path(path),
			None => Ok(Config::default()),
		}
	}

	pub fn source(&self) -> Result<Source> {
		let source = self.source.as_deref().unwrap_or(DEFAULT_SOURCE);
		Ok(Source::parse(source)?)
	}

	pub fn target(&self) -> &str {
		self.target.as_deref().unwrap_or(DEFAULT_TARGET)
	}

	pub fn split_options(&self) -> SplitOptions {
		let defaults = SplitOptions::default();
		SplitOptions {
			test_fraction: self.test_fraction.unwrap_or(defaults.test_fraction),
			seed: self.seed.unwrap_or(defaults.seed),
		}
	}

	pub fn class_names(&self) -> BTreeMap<String, String> {
		self.class_names.clone().unwrap_or_else(|| {
			let mut class_names = BTreeMap::new();
			class_names.insert("e".to_owned(), "edible".to_owned());
			class_names.insert("p".to_owned(), "poisonous".to_owned());
			class_names
		})
	}
}

#[test]
fn test_defaults() {
	let config = Config::load(None).unwrap();
	assert_eq!(
		config.source().unwrap(),
		Source::Path(DEFAULT_SOURCE.into())
	);
	assert_eq!(config.target(), "type");
	assert_eq!(config.split_options(), SplitOptions::default());
	assert_eq!(config.class_names()["p"], "poisonous");
}

#[test]
fn test_from_path() {
	use std::io::Write;
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(
		file,
		"source: https://example.com/mushrooms.csv\ntest_fraction: 0.25\nseed: 7\nclass_names:\n  e: safe\n  p: toxic"
	)
	.unwrap();
	let config = Config::from_path(file.path()).unwrap();
	assert!(matches!(config.source().unwrap(), Source::Url(_)));
	assert_eq!(config.target(), "type");
	assert_eq!(
		config.split_options(),
		SplitOptions {
			test_fraction: 0.25,
			seed: 7
		}
	);
	assert_eq!(config.class_names()["e"], "safe");
}

#[test]
fn test_unknown_field() {
	use std::io::Write;
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "sauce: mushrooms.csv").unwrap();
	let error = Config::from_path(file.path()).unwrap_err();
	assert!(error.to_string().starts_with("failed to parse config file"));
}
