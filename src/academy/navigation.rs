use scraper::Html;

use super::{extract, Frame, NavState, PesuAcademy, Resource, ResourceKind, Subject, Unit};
use crate::errors::{Error, Result};

const ADMIN_PATH: &str = "s/studentProfilePESUAdmin";
const SEMESTERS_PATH: &str = "a/studentProfilePESU/getStudentSemestersPESU";

/// Notes and slides of one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitContent {
	pub notes: Vec<Resource>,
	pub slides: Vec<Resource>,
}

impl UnitContent {
	pub fn of_kind(&self, kind: ResourceKind) -> &[Resource] {
		match kind {
			ResourceKind::Note => &self.notes,
			ResourceKind::Slide => &self.slides,
		}
	}
}

impl PesuAcademy {
	/// Parameters of an emulated menu click: the fixed codes, the context and the token.
	fn menu_params(&self, action: &str, context: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
		let codes = &self.config.codes;
		let mut params = vec![
			("controllerMode", codes.controller_mode.clone()),
			("actionType", action.to_owned()),
		];
		params.extend(context.iter().map(|(key, value)| (*key, (*value).to_owned())));
		params.push(("menuId", codes.menu_id.clone()));
		if let Some(token) = self.csrf_token.as_ref() {
			params.push(("_csrf", token.clone()));
		}
		params
	}

	fn warn_about_codes(&mut self) {
		if !self.warned_about_codes {
			warning!(
				self.log,
				"Using menu codes collected manually from the portal, they break if the portal changes."
			);
			self.warned_about_codes = true;
		}
	}

	async fn post_menu(&mut self, params: &[(&'static str, String)]) -> Result<Html> {
		let url = self.endpoint(ADMIN_PATH)?;
		debug!(self.log, "POST {} {:?}", url, action_of(params));
		let response = self.client.post(url).form(params).send().await?;
		let text = self.read_page(response).await?;
		let html = Html::parse_document(&text);
		self.adopt_token(&html);
		Ok(html)
	}

	async fn get_menu(&mut self, params: &[(&'static str, String)]) -> Result<Html> {
		let url = self.endpoint(ADMIN_PATH)?;
		debug!(self.log, "GET {} {:?}", url, action_of(params));
		let response = self.client.get(url).query(params).send().await?;
		let text = self.read_page(response).await?;
		let html = Html::parse_document(&text);
		self.adopt_token(&html);
		Ok(html)
	}

	fn keep_parsed<T>(&self, what: &str, rows: Vec<Result<T>>) -> Vec<T> {
		rows.into_iter()
			.filter_map(|row| match row {
				Ok(x) => Some(x),
				Err(e) => {
					warning!(self.log, "Skipping {}: {}", what, e);
					None
				},
			})
			.collect()
	}

	/// Opens "My Courses" for `semester` and loads its subject list.
	pub async fn select_semester(&mut self, semester: u32) -> Result<&[Subject]> {
		self.require(NavState::Authenticated, "select a semester")?;
		// the server-side menu moves with the first request, whatever happens after it
		self.state = NavState::Authenticated;
		self.subjects.clear();
		self.warn_about_codes();
		let codes = self.config.codes.clone();

		info!(self.log, "Selecting \"My Courses\"");
		let params = self.menu_params(&codes.select_semester, &[("id", codes.my_courses.as_str())]);
		self.post_menu(&params).await?;

		info!(self.log, "Collecting semester data");
		let text = self.get_page(self.endpoint(SEMESTERS_PATH)?).await?;
		let semesters = extract::semester_ids(&Html::parse_document(&text));
		debug!(self.log, "Found semesters: {:?}", semesters);
		let semester_id = semesters
			.get(&semester)
			.cloned()
			.ok_or_else(|| Error::SemesterNotFound {
				semester,
				available: semesters.keys().copied().collect(),
			})?;

		info!(
			self.log,
			"Selecting \"My Courses\" for semester {} (id: {})", semester, semester_id
		);
		let params = self.menu_params(&codes.select_semester, &[("id", semester_id.as_str())]);
		let rows = extract::subjects(&self.post_menu(&params).await?);
		self.subjects = self.keep_parsed("subject row", rows);
		self.state = NavState::SemesterSelected;

		let pretty_subjects = self
			.subjects
			.iter()
			.enumerate()
			.map(|(index, subject)| {
				format!(
					"{:<5} {:<50} {:<15} - {:<15} - Status: {}",
					format!("({})", index + 1),
					subject.name,
					format!("({})", subject.code),
					subject.course_type,
					subject.status
				)
			})
			.collect::<Vec<_>>()
			.join("\n");
		info!(self.log, "Found subjects:\n{}", pretty_subjects);
		Ok(&self.subjects)
	}

	/// Subjects of the selected semester, in the portal's order.
	pub fn list_subjects(&self) -> &[Subject] {
		&self.subjects
	}

	/// Selects the subject at `index` (0-based) and returns its units.
	pub async fn select_subject(&mut self, index: usize) -> Result<Vec<Unit>> {
		self.require(NavState::SemesterSelected, "select a subject")?;
		let subject = self.subjects.get(index).cloned().ok_or(Error::NoSuchSubject(index))?;
		self.state = NavState::SemesterSelected;
		info!(self.log, "Scraping subject: {}", subject);

		let action = self.config.codes.select_subject.clone();
		let params = self.menu_params(&action, &[("id", subject.id.as_str())]);
		let rows = extract::units(&self.get_menu(&params).await?);
		self.state = NavState::SubjectSelected;
		match rows {
			Ok(rows) => Ok(self.keep_parsed("unit link", rows)),
			Err(gap) => {
				info!(self.log, "No units published for {}", subject.name);
				debug!(self.log, "{}", gap);
				Ok(Vec::new())
			},
		}
	}

	/// Selects `unit` and returns its notes and slides.
	pub async fn select_unit(&mut self, unit: &Unit) -> Result<UnitContent> {
		self.require(NavState::SubjectSelected, "select a unit")?;
		self.state = NavState::SubjectSelected;
		let action = self.config.codes.select_unit.clone();
		let params = self.menu_params(&action, &[("coursecontentid", unit.id.as_str())]);
		let (notes, slides) = {
			let html = self.get_menu(&params).await?;
			(
				extract::resources(&html, ResourceKind::Note),
				extract::resources(&html, ResourceKind::Slide),
			)
		};
		self.state = NavState::UnitSelected;
		let (notes, slides) = match (notes, slides) {
			(Ok(notes), Ok(slides)) => (self.keep_parsed("note", notes), self.keep_parsed("slide", slides)),
			(Err(gap), _) | (_, Err(gap)) => {
				info!(self.log, "Found no notes or slides for {}", unit.name);
				debug!(self.log, "{}", gap);
				return Ok(UnitContent::default());
			},
		};
		info!(
			self.log,
			"Found {} notes and {} slides for {}:\n{}",
			notes.len(),
			slides.len(),
			unit.name,
			notes
				.iter()
				.chain(slides.iter())
				.map(|r| format!("{} {}", r.kind.dir_name(), r.display_name()))
				.collect::<Vec<_>>()
				.join("\n")
		);
		Ok(UnitContent { notes, slides })
	}

	/// Selects `resource` and returns the documents embedded in its page.
	pub async fn select_resource(&mut self, resource: &Resource) -> Result<Vec<Frame>> {
		self.require(NavState::UnitSelected, "select a resource")?;
		self.state = NavState::UnitSelected;
		let action = self.config.codes.select_resource.clone();
		let params = self.menu_params(
			&action,
			&[
				("url", "studentProfilePESUAdmin"),
				("selectedData", resource.selected_data.as_str()),
				("id", resource.content_id.as_str()),
				("unitid", resource.unit_id.as_str()),
			],
		);
		let frames = extract::frames(&self.get_menu(&params).await?, &self.config.base_url);
		self.state = NavState::ResourceSelected;
		Ok(self.keep_parsed("frame", frames))
	}
}

fn action_of<'a>(params: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
	params
		.iter()
		.filter(|(key, _)| *key != "_csrf")
		.map(|(key, value)| (*key, value.as_str()))
		.collect()
}
