use ndarray::prelude::*;

/// A plain text table with a header row, as printed by the cli for the confusion matrix and the curves.
pub struct Table<'a> {
	padding: usize,
	header: &'a [String],
	values: &'a Array2<String>,
}

impl<'a> Table<'a> {
	pub fn new(header: &'a [String], values: &'a Array2<String>) -> Self {
		Self {
			padding: 1,
			header,
			values,
		}
	}

	pub fn with_padding(mut self, padding: usize) -> Self {
		self.padding = padding;
		self
	}
}

impl<'a> std::fmt::Display for Table<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let n_columns = self.header.len();
		let mut column_widths: Vec<_> = vec![0; n_columns];
		// update column widths with header
		column_widths
			.iter_mut()
			.zip(self.header)
			.for_each(|(column_width, header)| *column_width = header.chars().count());
		// update column widths with values
		column_widths
			.iter_mut()
			.zip(self.values.axis_iter(Axis(1)))
			.for_each(|(column_width, column)| {
				column.iter().for_each(|value| {
					*column_width = usize::max(*column_width, value.chars().count());
				})
			});
		// write header
		let line = Line {
			column_widths: &column_widths,
			padding: self.padding,
		};
		let header: Vec<&str> = self.header.iter().map(|value| value.as_str()).collect();
		let row = Row {
			column_widths: &column_widths,
			padding: self.padding,
			values: &header,
		};
		writeln!(f, "{}", row)?;
		writeln!(f, "{}", line)?;
		// write values
		for values in self.values.rows() {
			let values: Vec<&str> = values.iter().map(|value| value.as_str()).collect();
			let row = Row {
				column_widths: &column_widths,
				padding: self.padding,
				values: &values,
			};
			writeln!(f, "{}", row)?;
		}
		Ok(())
	}
}

struct Line<'a> {
	column_widths: &'a [usize],
	padding: usize,
}

impl<'a> std::fmt::Display for Line<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for column_width in self.column_widths.iter() {
			for _ in 0..column_width + 2 * self.padding {
				write!(f, "-")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

struct Row<'a> {
	column_widths: &'a [usize],
	padding: usize,
	values: &'a [&'a str],
}

impl<'a> std::fmt::Display for Row<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for (column_width, value) in self.column_widths.iter().zip(self.values) {
			for _ in 0..self.padding {
				write!(f, " ")?;
			}
			write!(f, "{}", value)?;
			for _ in 0..column_width + self.padding - value.chars().count() {
				write!(f, " ")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

#[test]
fn test_table() {
	let header = vec!["a".to_owned(), "bb".to_owned()];
	let values = arr2(&[["1", "22"], ["333", "4"]]).mapv(|value| value.to_owned());
	let table = Table::new(&header, &values);
	assert_eq!(
		table.to_string(),
		"| a   | bb |\n|-----|----|\n| 1   | 22 |\n| 333 | 4  |\n"
	);
}

#[test]
fn test_table_padding() {
	let header = vec!["x".to_owned()];
	let values = arr2(&[["10"]]).mapv(|value| value.to_owned());
	let table = Table::new(&header, &values).with_padding(0);
	assert_eq!(table.to_string(), "|x |\n|--|\n|10|\n");
}
