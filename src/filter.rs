use log::warn;
use regex::{Regex, RegexBuilder};



#[derive(Clone, Debug)]
pub enum FilterEntry {
	Literal(String),
	Pattern {
		source: String,
		regex: Regex,
	},
}

impl FilterEntry {
	pub fn compile(entry: &str) -> FilterEntry {
		match RegexBuilder::new(entry).case_insensitive(true).build() {
			Ok(regex) => FilterEntry::Pattern { source: entry.to_string(), regex },
			Err(err) => {
				warn!("Filter entry {:?} is not a valid pattern, matching it literally; error was {}", entry, err);
				FilterEntry::Literal(entry.to_string())
			}
		}
	}

	pub fn matches(&self, key: &str) -> bool {
		match self {
			FilterEntry::Literal(literal) => literal == key,
			// Exact names always match, even when they contain regex metacharacters
			FilterEntry::Pattern { source, regex } => source == key || regex.is_match(key),
		}
	}
}

/// Inclusion-only camera filter. An empty filter lets every camera through.
#[derive(Clone, Debug, Default)]
pub struct CameraFilter {
	entries: Vec<FilterEntry>,
}

impl CameraFilter {
	pub fn new<S: AsRef<str>>(entries: &[S]) -> CameraFilter {
		CameraFilter {
			entries: entries.iter().map(|entry| FilterEntry::compile(entry.as_ref())).collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn includes(&self, key: &str) -> bool {
		self.is_empty() || self.entries.iter().any(|entry| entry.matches(key))
	}
}
