//! A fake portal that serves one semester with one subject, unit and note.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use pesu_academy::{Credentials, Logger, PesuAcademy, PortalConfig, UnitContent};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ADMIN: &str = "/Academy/s/studentProfilePESUAdmin";
pub const SEMESTERS: &str = "/Academy/a/studentProfilePESU/getStudentSemestersPESU";
pub const NOTE_DOCUMENT: &str = "/Academy/a/referenceMeterials/downloadslidecoursedoc/p2";
pub const NOTE_SIZE: usize = 2048;

pub fn page(head: &str, body: &str) -> String {
	format!("<html><head>{}</head><body>{}</body></html>", head, body)
}

pub fn html(body: String) -> ResponseTemplate {
	ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html;charset=UTF-8")
}

pub fn csrf_meta(token: &str) -> String {
	format!(r#"<meta name="csrf-token" content="{}">"#, token)
}

pub fn subject_row(id: &str, code: &str, name: &str, tag: &str, status: &str) -> String {
	format!(
		r#"<tr id="rowWiseCourseContent_{}"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
		id, code, name, tag, status
	)
}

pub fn subject_table(rows: &[String]) -> String {
	format!("<table><thead><tr><th>Code</th></tr></thead><tbody>{}</tbody></table>", rows.concat())
}

pub fn note_row(title: &str, args: &str) -> String {
	format!(
		r#"<tr><td><span class="short-title">{}</span></td><td><a href="javascript:void(0)" onclick="handleclassFormate({})"><span class="pesu-icon-open-book"></span></a></td></tr>"#,
		title, args
	)
}

pub fn iframe(src: &str) -> String {
	format!(r#"<iframe src="{}" width="100%"></iframe>"#, src)
}

pub struct FakePortal {
	pub server: MockServer,
}

impl FakePortal {
	pub async fn start() -> Self {
		let server = MockServer::builder().start().await;
		let portal = FakePortal { server };
		portal.mount_login().await;
		portal.mount_navigation().await;
		portal
	}

	async fn mount_login(&self) {
		Mock::given(method("GET"))
			.and(path("/Academy/"))
			.respond_with(
				html(page(&csrf_meta("root-token"), "<form>login</form>"))
					.insert_header("set-cookie", "JSESSIONID=before-login; Path=/"),
			)
			.mount(&self.server)
			.await;

		Mock::given(method("POST"))
			.and(path("/Academy/j_spring_security_check"))
			.and(body_string_contains("j_username=alice"))
			.and(body_string_contains("j_password=secret"))
			.and(body_string_contains("_csrf=root-token"))
			.respond_with(
				html(page(
					"",
					r#"<h4 class="info_header">Alice</h4><span class="info_text">SRN : PES1UG20CS001</span>"#,
				))
				.insert_header("set-cookie", "JSESSIONID=after-login; Path=/"),
			)
			.with_priority(1)
			.mount(&self.server)
			.await;

		// wrong credentials land on the login form again
		Mock::given(method("POST"))
			.and(path("/Academy/j_spring_security_check"))
			.respond_with(html(page(&csrf_meta("root-token"), "<form>Invalid username or password</form>")))
			.mount(&self.server)
			.await;

		// only reachable with the cookie handed out by the login reply
		Mock::given(method("GET"))
			.and(path("/Academy/s/studentProfilePESU"))
			.and(header("cookie", "JSESSIONID=after-login"))
			.respond_with(html(page(&csrf_meta("profile-token"), "<h1>Profile</h1>")))
			.mount(&self.server)
			.await;
	}

	async fn mount_navigation(&self) {
		Mock::given(method("POST"))
			.and(path(ADMIN))
			.and(body_string_contains("actionType=38"))
			.and(body_string_contains("id=1153"))
			.respond_with(html(page("", "<h2>My Courses</h2>")))
			.mount(&self.server)
			.await;

		Mock::given(method("GET"))
			.and(path(SEMESTERS))
			.respond_with(html(r#"<select><option value=\"9001\" >Sem-3</option></select>"#.to_owned()))
			.mount(&self.server)
			.await;

		self.mount_subjects(&[subject_row("SUB101", "101", "Data Structures", "CC", "Completed")], 5)
			.await;

		Mock::given(method("GET"))
			.and(path(ADMIN))
			.and(query_param("actionType", "42"))
			.and(query_param("id", "SUB101"))
			.respond_with(html(page(
				"",
				r##"<div class="tab-content"><div id="courseUnits"><a href="#courseUnit_55">Unit 1</a></div></div>"##,
			)))
			.mount(&self.server)
			.await;

		self.mount_unit_page(&subject_table(&[note_row("Unit 1", "'55','p1','0','1','p2'")]), 5)
			.await;

		self.mount_resource_page(&iframe(&format!("{}#view=FitH", NOTE_DOCUMENT)), 5)
			.await;

		self.mount_document(NOTE_DOCUMENT, vec![7u8; NOTE_SIZE]).await;
	}

	/// Subject table of semester 9001. A lower `priority` overrides the default table.
	pub async fn mount_subjects(&self, rows: &[String], priority: u8) {
		Mock::given(method("POST"))
			.and(path(ADMIN))
			.and(body_string_contains("actionType=38"))
			.and(body_string_contains("id=9001"))
			.respond_with(html(page("", &subject_table(rows))))
			.with_priority(priority)
			.mount(&self.server)
			.await;
	}

	/// Page of unit 55.
	pub async fn mount_unit_page(&self, body: &str, priority: u8) {
		Mock::given(method("GET"))
			.and(path(ADMIN))
			.and(query_param("actionType", "43"))
			.and(query_param("coursecontentid", "55"))
			.respond_with(html(page("", body)))
			.with_priority(priority)
			.mount(&self.server)
			.await;
	}

	/// Page of the note with selection parameters p1/p2.
	pub async fn mount_resource_page(&self, body: &str, priority: u8) {
		Mock::given(method("GET"))
			.and(path(ADMIN))
			.and(query_param("actionType", "60"))
			.and(query_param("selectedData", "p1"))
			.and(query_param("id", "p2"))
			.and(query_param("unitid", "55"))
			.respond_with(html(page("", body)))
			.with_priority(priority)
			.mount(&self.server)
			.await;
	}

	pub async fn mount_document(&self, at: &str, bytes: Vec<u8>) {
		Mock::given(method("GET"))
			.and(path(at))
			.respond_with(ResponseTemplate::new(200).set_body_raw(bytes, "application/pdf"))
			.mount(&self.server)
			.await;
	}

	pub fn config(&self) -> PortalConfig {
		PortalConfig::new(&format!("{}/Academy/", self.server.uri())).unwrap()
	}

	pub fn academy(&self, username: &str, password: &str) -> PesuAcademy {
		PesuAcademy::new(self.config(), Credentials::new(username, password), Logger::quiet()).unwrap()
	}

	pub async fn requests(&self) -> Vec<Request> {
		self.server.received_requests().await.unwrap_or_default()
	}

	/// Logs in as alice and walks down to unit 55.
	pub async fn academy_at_unit(&self) -> (PesuAcademy, UnitContent) {
		let mut academy = self.academy("alice", "secret");
		academy.login().await.unwrap();
		academy.select_semester(3).await.unwrap();
		let units = academy.select_subject(0).await.unwrap();
		let content = academy.select_unit(&units[0]).await.unwrap();
		(academy, content)
	}
}

/// Every file below `root`, relative to it.
pub fn files_under(root: &Path) -> Vec<PathBuf> {
	fn walk(dir: &Path, root: &Path, files: &mut Vec<PathBuf>) {
		for entry in std::fs::read_dir(dir).unwrap() {
			let path = entry.unwrap().path();
			if path.is_dir() {
				walk(&path, root, files);
			} else {
				files.push(path.strip_prefix(root).unwrap().to_owned());
			}
		}
	}
	let mut files = Vec::new();
	walk(root, root, &mut files);
	files.sort();
	files
}
