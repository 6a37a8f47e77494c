//! This module contains the main entrypoint to the amanita cli.

use amanita_core::{
	ClassifierKind, ClassifyRequest, Config, DiagnosticKind, ModelConfig, Outcome, Session,
};
use amanita_dataframe::{Source, SplitOptions};
use anyhow::{bail, format_err, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::{
	collections::BTreeMap,
	io::BufRead,
	path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser)]
#[clap(
	name = "amanita",
	about = "Fit a binary classifier to a csv file and see how well it does.",
	version
)]
enum Options {
	#[clap(name = "classify")]
	Classify(ClassifyOptions),
	#[clap(name = "widgets")]
	Widgets(WidgetsOptions),
	#[clap(name = "data")]
	Data(DataOptions),
	#[clap(name = "repl")]
	Repl(ReplOptions),
}

#[derive(clap::Args, Debug)]
struct DatasetOptions {
	#[clap(long, help = "a path or http(s) url to the .csv file, overrides the config")]
	source: Option<String>,
	#[clap(short, long, help = "the name of the column to predict, overrides the config")]
	target: Option<String>,
	#[clap(short, long, help = "the path to a config file")]
	config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
#[clap(about = "fit and evaluate a classifier")]
#[clap(
	long_about = "fit a classifier to the training split of the dataset and report its metrics on the test split"
)]
struct ClassifyOptions {
	#[clap(help = "svm, logistic-regression or random-forest")]
	classifier: ClassifierKind,
	#[clap(
		short,
		long = "set",
		help = "set a hyperparameter, for example --set c=1.0",
		parse(try_from_str = parse_key_value)
	)]
	set: Vec<(String, String)>,
	#[clap(
		short,
		long = "metric",
		help = "confusion-matrix, roc-curve or precision-recall-curve"
	)]
	metrics: Vec<DiagnosticKind>,
	#[clap(long, help = "the seed of the train test split, overrides the config")]
	seed: Option<u64>,
	#[clap(long, help = "write the outcome as json to this path, or - for stdout")]
	json: Option<PathBuf>,
	#[clap(flatten)]
	dataset: DatasetOptions,
}

#[derive(clap::Args, Debug)]
#[clap(about = "list the hyperparameters of the classifiers")]
struct WidgetsOptions {
	classifier: Option<ClassifierKind>,
}

#[derive(clap::Args, Debug)]
#[clap(about = "show the encoded dataset")]
struct DataOptions {
	#[clap(short = 'n', long, default_value = "20", help = "the number of rows to show")]
	rows: usize,
	#[clap(flatten)]
	dataset: DatasetOptions,
}

#[derive(clap::Args, Debug)]
#[clap(about = "read commands from stdin, keeping the loaded dataset between them")]
struct ReplOptions {}

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
		)
		.with_writer(std::io::stderr)
		.init();
	let options = Options::parse();
	let mut session = Session::new();
	let result = match options {
		Options::Repl(_) => cli_repl(&mut session),
		options => run(options, &mut session),
	};
	if let Err(error) = result {
		print_error(&error);
		std::process::exit(1);
	}
}

fn print_error(error: &anyhow::Error) {
	eprintln!("{}: {:#}", "error".red().bold(), error);
}

fn run(options: Options, session: &mut Session) -> Result<()> {
	match options {
		Options::Classify(options) => cli_classify(options, session),
		Options::Widgets(options) => cli_widgets(options),
		Options::Data(options) => cli_data(options, session),
		Options::Repl(_) => bail!("the repl is already running"),
	}
}

fn cli_classify(options: ClassifyOptions, session: &mut Session) -> Result<()> {
	let config = load_config(&options.dataset)?;
	let values: BTreeMap<String, String> = options.set.into_iter().collect();
	let model = ModelConfig::from_values(options.classifier, &values)?;
	let mut request = ClassifyRequest::new(&config, model, options.metrics)?;
	if let Some(seed) = options.seed {
		request.split = SplitOptions {
			seed,
			..request.split
		};
	}
	let outcome = session.handle(&request)?;
	match options.json.as_deref() {
		Some(path) => write_json(&outcome, path)?,
		None => match &outcome {
			Outcome::Report(report) => print!("{}", render::report(report)),
			Outcome::DataUnavailable { message } => {
				eprintln!("{}: {}", "data unavailable".yellow().bold(), message)
			}
		},
	}
	Ok(())
}

fn cli_widgets(options: WidgetsOptions) -> Result<()> {
	let kinds = match options.classifier {
		Some(kind) => vec![kind],
		None => ClassifierKind::ALL.to_vec(),
	};
	for kind in kinds {
		println!("{}", kind.title().bold());
		println!("{}", render::widgets(&kind.widgets()));
	}
	Ok(())
}

fn cli_data(options: DataOptions, session: &mut Session) -> Result<()> {
	let config = load_config(&options.dataset)?;
	let source = config.source()?;
	let dataframe = session.raw_data(&source)?;
	println!("{}", "Mushroom Data Set (Classification)".bold());
	print!("{}", render::dataframe(dataframe, options.rows));
	Ok(())
}

fn cli_repl(session: &mut Session) -> Result<()> {
	let stdin = std::io::stdin();
	for line in stdin.lock().lines() {
		let line = line.context("failed to read from stdin")?;
		let words: Vec<&str> = line.split_whitespace().collect();
		match words.as_slice() {
			[] => continue,
			["exit"] | ["quit"] => break,
			_ => {}
		}
		let result = Options::try_parse_from(std::iter::once("amanita").chain(words))
			.map_err(|error| format_err!("{}", error))
			.and_then(|options| run(options, session));
		if let Err(error) = result {
			print_error(&error);
		}
	}
	Ok(())
}

/// Load the config file if one was given and apply the overrides from the command line.
fn load_config(options: &DatasetOptions) -> Result<Config> {
	let mut config = Config::load(options.config.as_deref())?;
	if let Some(source) = options.source.as_ref() {
		Source::parse(source)?;
		config.source = Some(source.clone());
	}
	if let Some(target) = options.target.as_ref() {
		config.target = Some(target.clone());
	}
	Ok(config)
}

fn write_json(outcome: &Outcome, path: &Path) -> Result<()> {
	let json = serde_json::to_string_pretty(outcome)?;
	if path == Path::new("-") {
		println!("{}", json);
	} else {
		std::fs::write(path, json)
			.with_context(|| format!("failed to write {}", path.display()))?;
	}
	Ok(())
}

fn parse_key_value(value: &str) -> Result<(String, String), String> {
	let (key, value) = value
		.split_once('=')
		.ok_or_else(|| format!("expected key=value but got \"{}\"", value))?;
	Ok((key.trim().to_owned(), value.trim().to_owned()))
}
