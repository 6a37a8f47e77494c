use super::*;
use std::{
	io::Read,
	path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

/// Where a csv is read from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
	Path(PathBuf),
	Url(Url),
}

#[derive(Debug, Error)]
pub enum LoadError {
	#[error("the file {} was not found", .path.display())]
	NotFound { path: PathBuf },
	#[error("failed to read {name}")]
	Io {
		name: String,
		#[source]
		source: std::io::Error,
	},
	#[error("\"{value}\" is not a valid url")]
	InvalidUrl {
		value: String,
		#[source]
		source: url::ParseError,
	},
	#[error("failed to fetch {url}")]
	Unreachable {
		url: Url,
		#[source]
		source: Box<ureq::Error>,
	},
	#[error("failed to parse the csv from {name}")]
	Malformed {
		name: String,
		#[source]
		source: csv::Error,
	},
	#[error("{name} contains no data")]
	Empty { name: String },
}

impl Source {
	/// Strings starting with `http://` or `https://` are urls, anything else is a path.
	pub fn parse(value: &str) -> Result<Self, LoadError> {
		if value.starts_with("http://") || value.starts_with("https://") {
			let url = Url::parse(value).map_err(|source| LoadError::InvalidUrl {
				value: value.to_owned(),
				source,
			})?;
			Ok(Source::Url(url))
		} else {
			Ok(Source::Path(PathBuf::from(value)))
		}
	}
}

impl std::str::FromStr for Source {
	type Err = LoadError;
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Source::parse(value)
	}
}

impl std::fmt::Display for Source {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Source::Path(path) => write!(f, "{}", path.display()),
			Source::Url(url) => write!(f, "{}", url),
		}
	}
}

impl DataFrame {
	/// Load every column of the csv at `source` as a [`Column::Text`] column. No partial frame is returned: a missing or unreachable source, a malformed csv, or a csv without any rows is an error.
	pub fn load(source: &Source) -> Result<Self, LoadError> {
		let dataframe = match source {
			Source::Path(path) => Self::from_path(path)?,
			Source::Url(url) => Self::from_url(url)?,
		};
		tracing::info!(
			source = %source,
			n_rows = dataframe.nrows(),
			n_columns = dataframe.ncols(),
			"loaded dataset"
		);
		Ok(dataframe)
	}

	pub fn from_path(path: &Path) -> Result<Self, LoadError> {
		let name = path.display().to_string();
		let file = std::fs::File::open(path).map_err(|source| {
			if source.kind() == std::io::ErrorKind::NotFound {
				LoadError::NotFound {
					path: path.to_owned(),
				}
			} else {
				LoadError::Io {
					name: name.clone(),
					source,
				}
			}
		})?;
		Self::from_csv(&mut csv::Reader::from_reader(file), &name)
	}

	/// Fetch the csv at `url` with a blocking request. The whole body is read before parsing.
	pub fn from_url(url: &Url) -> Result<Self, LoadError> {
		let name = url.to_string();
		tracing::debug!(url = %url, "fetching dataset");
		let response = ureq::get(url.as_str())
			.call()
			.map_err(|source| LoadError::Unreachable {
				url: url.clone(),
				source: Box::new(source),
			})?;
		let mut bytes = Vec::new();
		response
			.into_reader()
			.read_to_end(&mut bytes)
			.map_err(|source| LoadError::Io {
				name: name.clone(),
				source,
			})?;
		Self::from_csv(&mut csv::Reader::from_reader(bytes.as_slice()), &name)
	}

	pub fn from_csv<R>(reader: &mut csv::Reader<R>, name: &str) -> Result<Self, LoadError>
	where
		R: std::io::Read,
	{
		let malformed = |source| LoadError::Malformed {
			name: name.to_owned(),
			source,
		};
		let column_names: Vec<String> = reader
			.headers()
			.map_err(malformed)?
			.iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		if column_names.is_empty() {
			return Err(LoadError::Empty {
				name: name.to_owned(),
			});
		}
		let mut columns: Vec<TextColumn> = column_names
			.into_iter()
			.map(|name| TextColumn {
				name,
				data: Vec::new(),
			})
			.collect();
		// The reader is not flexible, so a record with a different number of fields than the header is an error.
		let mut record = csv::StringRecord::new();
		while reader.read_record(&mut record).map_err(malformed)? {
			for (column, value) in columns.iter_mut().zip(record.iter()) {
				column.data.push(value.to_owned());
			}
		}
		if columns[0].data.is_empty() {
			return Err(LoadError::Empty {
				name: name.to_owned(),
			});
		}
		let columns = columns.into_iter().map(Column::Text).collect();
		Ok(DataFrame { columns })
	}
}

#[cfg(test)]
fn write_csv(contents: &str) -> tempfile::NamedTempFile {
	use std::io::Write;
	let mut file = tempfile::NamedTempFile::new().unwrap();
	file.write_all(contents.as_bytes()).unwrap();
	file
}

#[test]
fn test_load_path() {
	let file = write_csv("type,cap-shape,odor\np,x,p\ne,x,a\ne,b,?\n");
	let df = DataFrame::load(&Source::Path(file.path().to_owned())).unwrap();
	assert_eq!(df.column_names(), vec!["type", "cap-shape", "odor"]);
	assert_eq!(df.nrows(), 3);
	assert_eq!(
		df.column("odor"),
		Some(&Column::Text(TextColumn {
			name: "odor".to_owned(),
			data: vec!["p".to_owned(), "a".to_owned(), "?".to_owned()],
		}))
	);
}

#[test]
fn test_load_missing_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("mushrooms.csv");
	let error = DataFrame::load(&Source::Path(path.clone())).unwrap_err();
	assert!(matches!(error, LoadError::NotFound { path: p } if p == path));
}

#[test]
fn test_load_header_only() {
	let file = write_csv("type,cap-shape\n");
	let error = DataFrame::load(&Source::Path(file.path().to_owned())).unwrap_err();
	assert!(matches!(error, LoadError::Empty { .. }));
}

#[test]
fn test_load_empty_file() {
	let file = write_csv("");
	let error = DataFrame::load(&Source::Path(file.path().to_owned())).unwrap_err();
	assert!(matches!(error, LoadError::Empty { .. }));
}

#[test]
fn test_load_ragged_rows() {
	let file = write_csv("type,cap-shape\np,x\ne\n");
	let error = DataFrame::load(&Source::Path(file.path().to_owned())).unwrap_err();
	assert!(matches!(error, LoadError::Malformed { .. }));
}

#[test]
fn test_load_unreachable_url() {
	let source = Source::parse("http://127.0.0.1:1/mushrooms.csv").unwrap();
	let error = DataFrame::load(&source).unwrap_err();
	assert!(matches!(error, LoadError::Unreachable { .. }));
}

#[test]
fn test_source_parse() {
	assert_eq!(
		Source::parse("data/mushrooms.csv").unwrap(),
		Source::Path(PathBuf::from("data/mushrooms.csv"))
	);
	let source = Source::parse("https://example.com/mushrooms.csv").unwrap();
	assert!(matches!(source, Source::Url(_)));
	assert_eq!(source.to_string(), "https://example.com/mushrooms.csv");
	assert!(matches!(
		Source::parse("https://"),
		Err(LoadError::InvalidUrl { .. })
	));
}
