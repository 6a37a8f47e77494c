/*!
This crate provides the small dataframe used by amanita. A [`DataFrame`] is a two dimensional table of data where each column can have a different data type, like a spreadsheet. Frames are loaded from csv files or urls as [`Column::Text`] columns, label encoded with [`DataFrame::encode`], and split into training and holdout sets with [`train_test_split`].
*/

#![allow(clippy::tabs_in_doc_comments)]

use std::collections::{BTreeMap, BTreeSet};

mod load;
mod split;

pub use self::load::*;
pub use self::split::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Number(NumberColumn),
	Enum(EnumColumn),
	Text(TextColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f64>,
}

/// An `EnumColumn` stores each value as a 0-indexed code into `options`, which is sorted and contains no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<String>,
}

impl DataFrame {
	pub fn new(columns: Vec<Column>) -> Self {
		Self { columns }
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|column| column.name()).collect()
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Label encode every column. Columns whose values all parse as finite numbers become [`Column::Number`], all other columns become [`Column::Enum`]. Every column is treated the same way, including the target column.
	pub fn encode(&self) -> DataFrame {
		let columns = self.columns.iter().map(|column| column.encode()).collect();
		DataFrame { columns }
	}

	/// Render the value at (`row`, `column_index`) for display. Enum values are shown as their codes.
	pub fn display_value(&self, row: usize, column_index: usize) -> Option<String> {
		let column = self.columns.get(column_index)?;
		if row >= column.len() {
			return None;
		}
		let value = match column {
			Column::Number(column) => column.data[row].to_string(),
			Column::Enum(column) => column.data[row].to_string(),
			Column::Text(column) => column.data[row].clone(),
		};
		Some(value)
	}
}

impl Column {
	pub fn name(&self) -> &str {
		match self {
			Column::Number(column) => &column.name,
			Column::Enum(column) => &column.name,
			Column::Text(column) => &column.name,
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Column::Number(column) => column.data.len(),
			Column::Enum(column) => column.data.len(),
			Column::Text(column) => column.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Column::Enum(column) => Some(column),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Column::Number(column) => Some(column),
			_ => None,
		}
	}

	/// Label encode this column. Number and enum columns are already encoded and are returned unchanged.
	pub fn encode(&self) -> Column {
		match self {
			Column::Number(column) => Column::Number(column.clone()),
			Column::Enum(column) => Column::Enum(column.clone()),
			Column::Text(column) => column.encode(),
		}
	}
}

impl TextColumn {
	fn encode(&self) -> Column {
		let numbers: Option<Vec<f64>> = self
			.data
			.iter()
			.map(|value| match lexical::parse::<f64, _>(value.as_bytes()) {
				Ok(value) if value.is_finite() => Some(value),
				_ => None,
			})
			.collect();
		match numbers {
			Some(data) if !data.is_empty() => Column::Number(NumberColumn {
				name: self.name.clone(),
				data,
			}),
			_ => Column::Enum(EnumColumn::from_values(self.name.clone(), &self.data)),
		}
	}
}

impl EnumColumn {
	/// Build an enum column whose options are the distinct `values` in sorted order.
	pub fn from_values(name: String, values: &[String]) -> Self {
		let options: Vec<String> = values
			.iter()
			.map(|value| value.as_str())
			.collect::<BTreeSet<&str>>()
			.into_iter()
			.map(|value| value.to_owned())
			.collect();
		let codes: BTreeMap<&str, usize> = options
			.iter()
			.enumerate()
			.map(|(code, option)| (option.as_str(), code))
			.collect();
		let data = values.iter().map(|value| codes[value.as_str()]).collect();
		Self {
			name,
			options,
			data,
		}
	}

	/// Map a code back to the value it was assigned to.
	pub fn decode(&self, code: usize) -> Option<&str> {
		self.options.get(code).map(|option| option.as_str())
	}
}

#[cfg(test)]
fn text_column(name: &str, values: &[&str]) -> Column {
	Column::Text(TextColumn {
		name: name.to_owned(),
		data: values.iter().map(|value| (*value).to_owned()).collect(),
	})
}

#[test]
fn test_encode() {
	let df = DataFrame::new(vec![
		text_column("type", &["p", "e", "e", "p"]),
		text_column("cap-shape", &["x", "b", "x", "?"]),
		text_column("rings", &["1", "2", "1", "0"]),
	]);
	insta::assert_debug_snapshot!(df.encode(), @r###"
	DataFrame {
	    columns: [
	        Enum(
	            EnumColumn {
	                name: "type",
	                options: [
	                    "e",
	                    "p",
	                ],
	                data: [
	                    1,
	                    0,
	                    0,
	                    1,
	                ],
	            },
	        ),
	        Enum(
	            EnumColumn {
	                name: "cap-shape",
	                options: [
	                    "?",
	                    "b",
	                    "x",
	                ],
	                data: [
	                    2,
	                    1,
	                    2,
	                    0,
	                ],
	            },
	        ),
	        Number(
	            NumberColumn {
	                name: "rings",
	                data: [
	                    1.0,
	                    2.0,
	                    1.0,
	                    0.0,
	                ],
	            },
	        ),
	    ],
	}
	"###);
}

#[test]
fn test_encode_is_deterministic() {
	let df = DataFrame::new(vec![
		text_column("odor", &["n", "a", "n", "f", "a", "n"]),
		text_column("type", &["e", "e", "e", "p", "e", "e"]),
	]);
	assert_eq!(df.encode(), df.encode());
	// encoding an encoded frame changes nothing
	assert_eq!(df.encode().encode(), df.encode());
}

#[test]
fn test_encode_is_bijective() {
	let values = ["n", "a", "n", "f", "a", "?", "n"];
	let df = DataFrame::new(vec![text_column("odor", &values)]);
	let encoded = df.encode();
	let column = encoded.columns[0].as_enum().unwrap();
	for (value, code) in values.iter().zip(column.data.iter()) {
		assert_eq!(column.decode(*code), Some(*value));
	}
	assert_eq!(column.decode(column.options.len()), None);
}

#[test]
fn test_mixed_column_is_enum() {
	let df = DataFrame::new(vec![text_column("mixed", &["1", "x", "2.5"])]);
	let encoded = df.encode();
	let column = encoded.columns[0].as_enum().unwrap();
	assert_eq!(column.options, vec!["1", "2.5", "x"]);
	assert_eq!(column.data, vec![0, 2, 1]);
}

#[test]
fn test_display_value() {
	let df = DataFrame::new(vec![text_column("type", &["p", "e"])]).encode();
	assert_eq!(df.nrows(), 2);
	assert_eq!(df.ncols(), 1);
	assert_eq!(df.display_value(0, 0).as_deref(), Some("1"));
	assert_eq!(df.display_value(2, 0), None);
	assert_eq!(df.display_value(0, 1), None);
}
