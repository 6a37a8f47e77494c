use super::*;
use ndarray::prelude::*;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SplitOptions {
	/// The fraction of rows held out for evaluation.
	pub test_fraction: f64,
	/// The seed for the shuffle that assigns rows to the train and test sets.
	pub seed: u64,
}

impl Default for SplitOptions {
	fn default() -> Self {
		Self {
			test_fraction: 0.3,
			seed: 0,
		}
	}
}

/// The training and holdout partitions of an encoded [`DataFrame`]. Labels are `0` or `1` and `class_names[label]` is the value the label was encoded from.
#[derive(Clone, Debug)]
pub struct Split {
	pub feature_names: Vec<String>,
	pub class_names: [String; 2],
	pub x_train: Array2<f64>,
	pub x_test: Array2<f64>,
	pub y_train: Array1<usize>,
	pub y_test: Array1<usize>,
	/// The row index in the source frame of each training row.
	pub train_indices: Vec<usize>,
	/// The row index in the source frame of each test row.
	pub test_indices: Vec<usize>,
}

#[derive(Debug, Error)]
pub enum SplitError {
	#[error("did not find target column \"{target}\" among column names \"{column_names}\"")]
	MissingTarget {
		target: String,
		column_names: String,
	},
	#[error("target column \"{target}\" must have exactly two classes but it has {n_classes}")]
	NotBinary { target: String, n_classes: usize },
	#[error("column \"{0}\" has not been encoded")]
	NotEncoded(String),
	#[error("the test fraction must be between 0 and 1 but it is {0}")]
	InvalidTestFraction(f64),
	#[error("cannot split {n_rows} rows into non empty train and test sets with a test fraction of {test_fraction}")]
	TooFewRows { n_rows: usize, test_fraction: f64 },
}

/// Split an encoded frame into features and labels for training and testing. The split depends only on the row order, `options.seed` and `options.test_fraction`, so calling this twice with the same arguments produces the same split.
pub fn train_test_split(
	dataframe: &DataFrame,
	target: &str,
	options: SplitOptions,
) -> Result<Split, SplitError> {
	let SplitOptions {
		test_fraction,
		seed,
	} = options;
	if !(test_fraction > 0.0 && test_fraction < 1.0) {
		return Err(SplitError::InvalidTestFraction(test_fraction));
	}

	// find the target column
	let target_column = dataframe
		.column(target)
		.ok_or_else(|| SplitError::MissingTarget {
			target: target.to_owned(),
			column_names: dataframe.column_names().join(", "),
		})?;
	let (labels, class_names) = binary_labels(target_column)?;

	// compute the sizes of the partitions
	let n_rows = dataframe.nrows();
	let n_test = (n_rows as f64 * test_fraction).round() as usize;
	if n_test == 0 || n_test >= n_rows {
		return Err(SplitError::TooFewRows {
			n_rows,
			test_fraction,
		});
	}

	// assemble the feature matrix from every column other than the target
	let feature_columns: Vec<&Column> = dataframe
		.columns
		.iter()
		.filter(|column| column.name() != target)
		.collect();
	let feature_names: Vec<String> = feature_columns
		.iter()
		.map(|column| column.name().to_owned())
		.collect();
	let mut features = Array2::<f64>::zeros((n_rows, feature_columns.len()));
	for (mut feature, column) in features.axis_iter_mut(Axis(1)).zip(feature_columns) {
		match column {
			Column::Number(column) => {
				feature.assign(&ArrayView1::from(column.data.as_slice()));
			}
			Column::Enum(column) => {
				feature
					.iter_mut()
					.zip(column.data.iter())
					.for_each(|(feature, code)| *feature = *code as f64);
			}
			Column::Text(column) => return Err(SplitError::NotEncoded(column.name.clone())),
		}
	}

	// shuffle the row indices and hold out the first n_test of them
	let mut indices: Vec<usize> = (0..n_rows).collect();
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	indices.shuffle(&mut rng);
	let (test_indices, train_indices) = indices.split_at(n_test);
	let split = Split {
		feature_names,
		class_names,
		x_train: features.select(Axis(0), train_indices),
		x_test: features.select(Axis(0), test_indices),
		y_train: labels.select(Axis(0), train_indices),
		y_test: labels.select(Axis(0), test_indices),
		train_indices: train_indices.to_vec(),
		test_indices: test_indices.to_vec(),
	};
	tracing::info!(
		n_train = split.train_indices.len(),
		n_test = split.test_indices.len(),
		n_features = split.feature_names.len(),
		seed,
		"split dataset"
	);
	Ok(split)
}

/// Retrieve the 0/1 labels of the target column along with the names of the two classes.
fn binary_labels(column: &Column) -> Result<(Array1<usize>, [String; 2]), SplitError> {
	match column {
		Column::Enum(column) => {
			if column.options.len() != 2 {
				return Err(SplitError::NotBinary {
					target: column.name.clone(),
					n_classes: column.options.len(),
				});
			}
			let labels = Array1::from(column.data.clone());
			let class_names = [column.options[0].clone(), column.options[1].clone()];
			Ok((labels, class_names))
		}
		Column::Number(column) => {
			let mut n_zeros = 0;
			let mut n_ones = 0;
			let mut labels = Vec::with_capacity(column.data.len());
			for value in column.data.iter() {
				if *value == 0.0 {
					n_zeros += 1;
					labels.push(0);
				} else if *value == 1.0 {
					n_ones += 1;
					labels.push(1);
				} else {
					let mut distinct: Vec<u64> = column.data.iter().map(|v| v.to_bits()).collect();
					distinct.sort_unstable();
					distinct.dedup();
					return Err(SplitError::NotBinary {
						target: column.name.clone(),
						n_classes: distinct.len(),
					});
				}
			}
			if n_zeros == 0 || n_ones == 0 {
				return Err(SplitError::NotBinary {
					target: column.name.clone(),
					n_classes: 1,
				});
			}
			Ok((Array1::from(labels), ["0".to_owned(), "1".to_owned()]))
		}
		Column::Text(column) => Err(SplitError::NotEncoded(column.name.clone())),
	}
}

#[cfg(test)]
fn synthetic_frame(n_rows: usize) -> DataFrame {
	DataFrame::new(vec![
		Column::Enum(EnumColumn {
			name: "type".to_owned(),
			options: vec!["e".to_owned(), "p".to_owned()],
			data: (0..n_rows).map(|i| i % 2).collect(),
		}),
		Column::Enum(EnumColumn {
			name: "odor".to_owned(),
			options: vec!["a".to_owned(), "f".to_owned(), "n".to_owned()],
			data: (0..n_rows).map(|i| i % 3).collect(),
		}),
		Column::Number(NumberColumn {
			name: "row".to_owned(),
			data: (0..n_rows).map(|i| i as f64).collect(),
		}),
	])
}

#[test]
fn test_split_sizes() {
	let df = synthetic_frame(8124);
	let split = train_test_split(&df, "type", SplitOptions::default()).unwrap();
	assert_eq!(split.x_test.nrows(), 2437);
	assert_eq!(split.y_test.len(), 2437);
	assert_eq!(split.x_train.nrows(), 5687);
	assert_eq!(split.y_train.len(), 5687);
	assert_eq!(split.x_train.ncols(), 2);
	assert_eq!(split.feature_names, vec!["odor", "row"]);
	assert_eq!(split.class_names, ["e".to_owned(), "p".to_owned()]);
}

#[test]
fn test_split_is_reproducible() {
	let df = synthetic_frame(100);
	let a = train_test_split(&df, "type", SplitOptions::default()).unwrap();
	let b = train_test_split(&df, "type", SplitOptions::default()).unwrap();
	assert_eq!(a.train_indices, b.train_indices);
	assert_eq!(a.test_indices, b.test_indices);
	assert_eq!(a.x_train, b.x_train);
	assert_eq!(a.y_test, b.y_test);
	let c = train_test_split(
		&df,
		"type",
		SplitOptions {
			seed: 1,
			..Default::default()
		},
	)
	.unwrap();
	assert_ne!(a.test_indices, c.test_indices);
}

#[test]
fn test_split_partitions_rows() {
	let df = synthetic_frame(50);
	let split = train_test_split(&df, "type", SplitOptions::default()).unwrap();
	let mut all: Vec<usize> = split
		.train_indices
		.iter()
		.chain(split.test_indices.iter())
		.copied()
		.collect();
	all.sort_unstable();
	assert_eq!(all, (0..50).collect::<Vec<_>>());
	// the "row" feature records where each row came from
	for (position, index) in split.test_indices.iter().enumerate() {
		assert_eq!(split.x_test[(position, 1)], *index as f64);
		assert_eq!(split.y_test[position], index % 2);
	}
}

#[test]
fn test_split_errors() {
	let df = synthetic_frame(10);
	assert!(matches!(
		train_test_split(&df, "class", SplitOptions::default()),
		Err(SplitError::MissingTarget { .. })
	));
	assert!(matches!(
		train_test_split(&df, "odor", SplitOptions::default()),
		Err(SplitError::NotBinary { n_classes: 3, .. })
	));
	assert!(matches!(
		train_test_split(&df, "row", SplitOptions::default()),
		Err(SplitError::NotBinary { .. })
	));
	assert!(matches!(
		train_test_split(
			&df,
			"type",
			SplitOptions {
				test_fraction: 1.0,
				seed: 0
			}
		),
		Err(SplitError::InvalidTestFraction(_))
	));
	assert!(matches!(
		train_test_split(
			&df,
			"type",
			SplitOptions {
				test_fraction: 0.01,
				seed: 0
			}
		),
		Err(SplitError::TooFewRows { .. })
	));
}

#[test]
fn test_split_number_target() {
	let df = DataFrame::new(vec![
		Column::Number(NumberColumn {
			name: "label".to_owned(),
			data: vec![0.0, 1.0, 1.0, 0.0],
		}),
		Column::Number(NumberColumn {
			name: "x".to_owned(),
			data: vec![0.5, 1.5, 2.5, 3.5],
		}),
	]);
	let split = train_test_split(
		&df,
		"label",
		SplitOptions {
			test_fraction: 0.5,
			seed: 3,
		},
	)
	.unwrap();
	assert_eq!(split.class_names, ["0".to_owned(), "1".to_owned()]);
	assert_eq!(split.y_train.len() + split.y_test.len(), 4);
}

#[test]
fn test_split_requires_encoding() {
	let df = DataFrame::new(vec![
		Column::Text(TextColumn {
			name: "type".to_owned(),
			data: vec!["e".to_owned(), "p".to_owned()],
		}),
	]);
	assert!(matches!(
		train_test_split(&df, "type", SplitOptions::default()),
		Err(SplitError::NotEncoded(_))
	));
}
