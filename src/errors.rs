use thiserror::Error;

use crate::academy::NavState;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("authentication failed: {0}")]
	Authentication(String),

	#[error("semester {semester} not found (available: {available:?})")]
	SemesterNotFound { semester: u32, available: Vec<u32> },

	/// Expected markup is missing. Callers treat this as "nothing here".
	#[error("nothing to extract: {0}")]
	ExtractionGap(String),

	#[error("transfer of {url} failed: {reason}")]
	Transfer { url: String, reason: String },

	#[error("cannot {action} before reaching state {required:?}")]
	OutOfOrder { action: &'static str, required: NavState },

	#[error("no subject with index {0}")]
	NoSuchSubject(usize),

	#[error(transparent)]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("invalid portal URL: {0}")]
	Url(#[from] url::ParseError),
}

impl Error {
	/// Fatal errors abort the whole run, everything else skips one item.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Error::Authentication(_) | Error::SemesterNotFound { .. })
	}

	pub(crate) fn gap(what: impl Into<String>) -> Self {
		Error::ExtractionGap(what.into())
	}

	pub(crate) fn transfer(url: impl ToString, reason: impl ToString) -> Self {
		Error::Transfer {
			url: url.to_string(),
			reason: reason.to_string(),
		}
	}
}
