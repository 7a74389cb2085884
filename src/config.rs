//! Portal location and the menu codes the backend routes requests by.
//!
//! The codes were collected by hand from the portal's own requests. The backend
//! never exposes them, so they have to be re-discovered whenever it changes.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::cli::Opt;

/// Server-side handler codes, keyed by the menu action they emulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuCodes {
	pub controller_mode: String,
	pub menu_id: String,
	/// Context id of the "My Courses" menu entry.
	pub my_courses: String,
	pub select_semester: String,
	pub select_subject: String,
	pub select_unit: String,
	pub select_resource: String,
}

impl Default for MenuCodes {
	fn default() -> Self {
		MenuCodes {
			controller_mode: "6403".into(),
			menu_id: "653".into(),
			my_courses: "1153".into(),
			select_semester: "38".into(),
			select_subject: "42".into(),
			select_unit: "43".into(),
			select_resource: "60".into(),
		}
	}
}

impl MenuCodes {
	/// Reads a JSON object; keys that are left out keep their default code.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		serde_json::from_str(&text).with_context(|| format!("invalid menu codes in {}", path.display()))
	}
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
	/// Every endpoint is resolved relative to this URL, so it must end with a slash.
	pub base_url: Url,
	pub codes: MenuCodes,
	pub proxy: Option<String>,
}

impl PortalConfig {
	pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
		let base_url = if base_url.ends_with('/') {
			Url::parse(base_url)?
		} else {
			Url::parse(&format!("{}/", base_url))?
		};
		Ok(PortalConfig {
			base_url,
			codes: MenuCodes::default(),
			proxy: None,
		})
	}

	pub fn from_opt(opt: &Opt) -> Result<Self> {
		let mut config = PortalConfig::new(&opt.portal_url).context("invalid portal URL")?;
		if let Some(path) = opt.menu_codes.as_ref() {
			config.codes = MenuCodes::load(path)?;
		}
		config.proxy = opt.proxy.clone();
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_defaults() {
		let codes: MenuCodes = serde_json::from_str(r#"{ "select_unit": "99" }"#).unwrap();
		assert_eq!(codes.select_unit, "99");
		assert_eq!(codes.select_subject, "42");
		assert_eq!(codes.menu_id, "653");
	}

	#[test]
	fn base_url_gets_trailing_slash() {
		let config = PortalConfig::new("http://127.0.0.1:8080/Academy").unwrap();
		assert_eq!(config.base_url.join("j_spring_security_check").unwrap().path(), "/Academy/j_spring_security_check");
	}
}
