use super::MetricError;
use num_traits::ToPrimitive;

/// A 2x2 table of example counts indexed by `(actual label, predicted label)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConfusionMatrix {
	//            actual  predicted
	//               |       |
	//               v       v
	pub counts: [[u64; 2]; 2],
}

impl ConfusionMatrix {
	pub fn new() -> Self {
		Self::default()
	}

	/// Count each (prediction, label) pair. Every value must be `0` or `1` and the slices must have the same length.
	pub fn from_predictions(predictions: &[usize], labels: &[usize]) -> Result<Self, MetricError> {
		if predictions.len() != labels.len() {
			return Err(MetricError::LengthMismatch {
				expected: labels.len(),
				actual: predictions.len(),
			});
		}
		if let Some(value) = predictions.iter().chain(labels).find(|value| **value > 1) {
			return Err(MetricError::InvalidLabel(*value));
		}
		let mut confusion_matrix = Self::new();
		for (prediction, label) in predictions.iter().zip(labels) {
			confusion_matrix.update(*prediction, *label);
		}
		Ok(confusion_matrix)
	}

	/// Count one example.
	pub fn update(&mut self, prediction: usize, label: usize) {
		self.counts[label][prediction] += 1;
	}

	pub fn true_positives(&self) -> u64 {
		self.counts[1][1]
	}

	pub fn false_positives(&self) -> u64 {
		self.counts[0][1]
	}

	pub fn true_negatives(&self) -> u64 {
		self.counts[0][0]
	}

	pub fn false_negatives(&self) -> u64 {
		self.counts[1][0]
	}

	pub fn n_examples(&self) -> u64 {
		self.counts.iter().flatten().sum()
	}

	/// The proportion of examples where the prediction equals the label.
	pub fn accuracy(&self) -> Result<f64, MetricError> {
		let n_examples = self.n_examples();
		if n_examples == 0 {
			return Err(MetricError::Undefined {
				metric: "accuracy",
				reason: "there are no examples",
			});
		}
		Ok(ratio(
			self.true_positives() + self.true_negatives(),
			n_examples,
		))
	}

	/// precision = tp / (tp + fp)
	pub fn precision(&self) -> Result<f64, MetricError> {
		let predicted_positives = self.true_positives() + self.false_positives();
		if predicted_positives == 0 {
			return Err(MetricError::Undefined {
				metric: "precision",
				reason: "no example was predicted positive",
			});
		}
		Ok(ratio(self.true_positives(), predicted_positives))
	}

	/// recall = tp / (tp + fn)
	pub fn recall(&self) -> Result<f64, MetricError> {
		let actual_positives = self.true_positives() + self.false_negatives();
		if actual_positives == 0 {
			return Err(MetricError::Undefined {
				metric: "recall",
				reason: "no example is labeled positive",
			});
		}
		Ok(ratio(self.true_positives(), actual_positives))
	}
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
	numerator.to_f64().unwrap() / denominator.to_f64().unwrap()
}

#[test]
fn test_confusion_matrix() {
	let labels = [0, 0, 0, 0, 1, 1, 1, 1];
	let predictions = [0, 0, 0, 1, 1, 1, 1, 0];
	let confusion_matrix = ConfusionMatrix::from_predictions(&predictions, &labels).unwrap();
	insta::assert_debug_snapshot!(confusion_matrix, @r###"
	ConfusionMatrix {
	    counts: [
	        [
	            3,
	            1,
	        ],
	        [
	            1,
	            3,
	        ],
	    ],
	}
	"###);
	assert_eq!(confusion_matrix.accuracy(), Ok(0.75));
	assert_eq!(confusion_matrix.precision(), Ok(0.75));
	assert_eq!(confusion_matrix.recall(), Ok(0.75));
}

#[test]
fn test_precision_undefined_without_positive_predictions() {
	let labels = [0, 1, 1, 0];
	let predictions = [0, 0, 0, 0];
	let confusion_matrix = ConfusionMatrix::from_predictions(&predictions, &labels).unwrap();
	assert_eq!(confusion_matrix.accuracy(), Ok(0.5));
	assert!(matches!(
		confusion_matrix.precision(),
		Err(MetricError::Undefined {
			metric: "precision",
			..
		})
	));
	assert_eq!(confusion_matrix.recall(), Ok(0.0));
}

#[test]
fn test_recall_undefined_without_positive_labels() {
	let confusion_matrix = ConfusionMatrix::from_predictions(&[1, 0], &[0, 0]).unwrap();
	assert_eq!(confusion_matrix.precision(), Ok(0.0));
	assert!(confusion_matrix.recall().is_err());
}

#[test]
fn test_invalid_input() {
	assert_eq!(
		ConfusionMatrix::from_predictions(&[0, 1], &[0]),
		Err(MetricError::LengthMismatch {
			expected: 1,
			actual: 2
		})
	);
	assert_eq!(
		ConfusionMatrix::from_predictions(&[0, 2], &[0, 1]),
		Err(MetricError::InvalidLabel(2))
	);
	assert!(ConfusionMatrix::new().accuracy().is_err());
}
