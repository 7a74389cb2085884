// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fmt, sync::Arc};

use cookie_store::CookieStore;
use reqwest::{header::CONTENT_TYPE, Client, Proxy, Response, Url};
use reqwest_cookie_store::CookieStoreMutex;
use scraper::Html;
use serde_json::json;

use crate::{
	cli::Logger,
	config::PortalConfig,
	errors::{Error, Result},
	util::file_escape,
};

pub mod download;
pub mod extract;
pub mod navigation;
pub mod scrape;

const LOGIN_PATH: &str = "j_spring_security_check";
const PROFILE_PATH: &str = "s/studentProfilePESU";
const LOGOUT_PATH: &str = "logout";

/// How far the server-side menu selection has progressed.
///
/// Every selection re-targets the next level, so only the ordering matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NavState {
	Unauthenticated,
	Authenticated,
	SemesterSelected,
	SubjectSelected,
	UnitSelected,
	ResourceSelected,
}

#[derive(Clone)]
pub struct Credentials {
	username: String,
	password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Credentials {
			username: username.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
	pub name: String,
	pub srn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseType {
	Core,
	Elective,
	Unclassified,
}

impl CourseType {
	pub fn from_tag(tag: &str) -> Self {
		match tag.trim() {
			"CC" => CourseType::Core,
			"EC" => CourseType::Elective,
			_ => CourseType::Unclassified,
		}
	}
}

impl fmt::Display for CourseType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(match self {
			CourseType::Core => "Core Course",
			CourseType::Elective => "Elective Course",
			CourseType::Unclassified => "Unclassified",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
	pub code: String,
	pub name: String,
	pub course_type: CourseType,
	pub status: String,
	/// Opaque id the portal expects when the subject is selected.
	pub id: String,
}

impl fmt::Display for Subject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} ({}) - {} - Status: {}",
			self.name, self.code, self.course_type, self.status
		)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
	pub name: String,
	pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
	Note,
	Slide,
}

impl ResourceKind {
	pub fn dir_name(self) -> &'static str {
		match self {
			ResourceKind::Note => "Notes",
			ResourceKind::Slide => "Slides",
		}
	}
}

/// A note or slide row of a unit, with the arguments of its click handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
	pub kind: ResourceKind,
	/// 1-based position among the unit's resources of the same kind.
	pub ordinal: usize,
	pub title: String,
	pub unit_id: String,
	pub selected_data: String,
	pub content_id: String,
}

impl Resource {
	pub fn display_name(&self) -> String {
		format!("({}) {}", self.ordinal, self.title)
	}

	pub fn file_name(&self, frame: usize) -> String {
		file_escape(&format!("{}_{}_{}.pdf", self.ordinal, self.display_name(), frame))
	}
}

/// One embedded document of a selected resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
	pub index: usize,
	pub url: Url,
}

pub struct PesuAcademy {
	config: PortalConfig,
	credentials: Credentials,
	log: Logger,
	client: Client,
	cookies: Arc<CookieStoreMutex>,
	csrf_token: Option<String>,
	state: NavState,
	subjects: Vec<Subject>,
	warned_about_codes: bool,
}

impl PesuAcademy {
	pub fn new(config: PortalConfig, credentials: Credentials, log: Logger) -> Result<Self> {
		let cookie_store = CookieStore::default();
		let cookie_store = reqwest_cookie_store::CookieStoreMutex::new(cookie_store);
		let cookie_store = std::sync::Arc::new(cookie_store);
		let mut builder = Client::builder().cookie_provider(Arc::clone(&cookie_store)).user_agent(concat!(
			env!("CARGO_PKG_NAME"),
			"/",
			env!("CARGO_PKG_VERSION")
		));
		if let Some(proxy) = config.proxy.as_ref() {
			let proxy = Proxy::all(proxy)?;
			builder = builder.proxy(proxy);
		}
		let client = builder
			// timeout is infinite by default
			.build()?;
		Ok(PesuAcademy {
			config,
			credentials,
			log,
			client,
			cookies: cookie_store,
			csrf_token: None,
			state: NavState::Unauthenticated,
			subjects: Vec::new(),
			warned_about_codes: false,
		})
	}

	pub fn state(&self) -> NavState {
		self.state
	}

	pub fn logger(&self) -> &Logger {
		&self.log
	}

	pub fn csrf_token(&self) -> Option<&str> {
		self.csrf_token.as_deref()
	}

	/// Value of a cookie the portal would receive with the next request.
	pub fn session_cookie(&self, name: &str) -> Option<String> {
		self.session_cookies()
			.into_iter()
			.find(|(cookie, _)| cookie == name)
			.map(|(_, value)| value)
	}

	fn session_cookies(&self) -> Vec<(String, String)> {
		let store = match self.cookies.lock() {
			Ok(store) => store,
			Err(_) => return Vec::new(),
		};
		let mut cookies = store
			.matches(&self.config.base_url)
			.into_iter()
			.map(|cookie| (cookie.name().to_owned(), cookie.value().to_owned()))
			.collect::<Vec<_>>();
		cookies.sort();
		cookies
	}

	pub async fn login(&mut self) -> Result<Profile> {
		info!(self.log, "Logging in as {}..", self.credentials.username);
		let root = self.endpoint("")?;
		let text = self.get_page(root).await?;
		let token = extract::csrf_token(&Html::parse_document(&text))
			.ok_or_else(|| Error::Authentication("no anti-forgery token on the portal page".into()))?;
		let before = self.session_cookies();
		debug!(self.log, "Session cookies: {:?}", cookie_names(&before));

		let url = self.endpoint(LOGIN_PATH)?;
		debug!(self.log, "POST {}", url);
		let response = self
			.client
			.post(url)
			.form(&json!({
				"j_username": self.credentials.username,
				"j_password": self.credentials.password,
				"_csrf": token,
			}))
			.send()
			.await?;
		debug!(self.log, "{} {}", response.status(), response.url());
		if !response.status().is_success() {
			return Err(Error::Authentication(format!("login answered {}", response.status())));
		}
		let text = response.text().await?;
		let profile = extract::profile(&Html::parse_document(&text))
			.ok_or_else(|| Error::Authentication("no profile header in reply, incorrect password?".into()))?;

		// the login reply hands out new session cookies, the store already holds them
		let after = self.session_cookies();
		if after != before {
			debug!(self.log, "Session cookies rotated: {:?}", cookie_names(&after));
		}

		let text = self.get_page(self.endpoint(PROFILE_PATH)?).await?;
		let token = extract::csrf_token(&Html::parse_document(&text))
			.ok_or_else(|| Error::Authentication("no anti-forgery token on the profile page".into()))?;
		self.csrf_token = Some(token);
		self.state = NavState::Authenticated;
		success!(self.log, "Logged in as {} ({})!", profile.name, profile.srn);
		Ok(profile)
	}

	/// Ends the session. The portal has no reliable logout, so failures are only logged.
	pub async fn logout(&mut self) {
		info!(self.log, "Logging out");
		match self.endpoint(LOGOUT_PATH) {
			Ok(url) => match self.client.get(url).send().await {
				Ok(response) => debug!(self.log, "{} {}", response.status(), response.url()),
				Err(e) => debug!(self.log, "logout request failed: {}", e),
			},
			Err(e) => debug!(self.log, "no logout URL: {}", e),
		}
		if let Ok(mut store) = self.cookies.lock() {
			*store = CookieStore::default();
		}
		self.csrf_token = None;
		self.subjects.clear();
		self.state = NavState::Unauthenticated;
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		Ok(self.config.base_url.join(path)?)
	}

	fn require(&self, required: NavState, action: &'static str) -> Result<()> {
		if self.state < required {
			return Err(Error::OutOfOrder { action, required });
		}
		Ok(())
	}

	async fn get_page(&self, url: Url) -> Result<String> {
		debug!(self.log, "GET {}", url);
		let response = self.client.get(url).send().await?;
		self.read_page(response).await
	}

	async fn read_page(&self, response: Response) -> Result<String> {
		debug!(
			self.log,
			"{} {} ({})",
			response.status(),
			response.url(),
			response
				.headers()
				.get(CONTENT_TYPE)
				.and_then(|x| x.to_str().ok())
				.unwrap_or("no content type")
		);
		Ok(response.error_for_status()?.text().await?)
	}

	/// Adopts the anti-forgery token of a navigation reply, if it carries one.
	fn adopt_token(&mut self, html: &Html) {
		if let Some(token) = extract::csrf_token(html) {
			if self.csrf_token.as_deref() != Some(token.as_str()) {
				debug!(self.log, "Anti-forgery token refreshed");
				self.csrf_token = Some(token);
			}
		}
	}
}

fn cookie_names(cookies: &[(String, String)]) -> Vec<&str> {
	cookies.iter().map(|(name, _)| name.as_str()).collect()
}
