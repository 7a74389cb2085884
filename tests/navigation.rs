mod support;

use pesu_academy::{CourseType, Error, NavState, ResourceKind};
use support::{page, subject_row, FakePortal};

#[tokio::test]
async fn unknown_semester_stops_before_selecting() {
	let portal = FakePortal::start().await;
	let mut academy = portal.academy("alice", "secret");
	academy.login().await.unwrap();

	let err = academy.select_semester(5).await.unwrap_err();
	assert!(err.is_fatal());
	match err {
		Error::SemesterNotFound { semester, available } => {
			assert_eq!(semester, 5);
			assert_eq!(available, vec![3]);
		},
		other => panic!("unexpected error {:?}", other),
	}

	let requests = portal.requests().await;
	let last = requests.last().unwrap();
	assert_eq!(last.url.path(), support::SEMESTERS);
	assert!(!requests
		.iter()
		.any(|request| String::from_utf8_lossy(&request.body).contains("id=9001")));
	assert_eq!(academy.state(), NavState::Authenticated);
}

#[tokio::test]
async fn subjects_keep_table_order() {
	let portal = FakePortal::start().await;
	portal
		.mount_subjects(
			&[
				subject_row("SUB301", "301", "Compilers", "CC", "Ongoing"),
				subject_row("SUB101", "101", "Data Structures", "CC", "Completed"),
				subject_row("SUB205", "205", "Film Studies", "EC", "Ongoing"),
				subject_row("SUB999", "999", "Seminar", "XX", "Ongoing"),
			],
			1,
		)
		.await;
	let mut academy = portal.academy("alice", "secret");
	academy.login().await.unwrap();

	let first = academy.select_semester(3).await.unwrap().to_vec();
	let codes = first.iter().map(|s| s.code.as_str()).collect::<Vec<_>>();
	assert_eq!(codes, ["301", "101", "205", "999"]);
	assert_eq!(first[1].id, "SUB101");
	assert_eq!(first[2].course_type, CourseType::Elective);
	assert_eq!(first[3].course_type, CourseType::Unclassified);

	// selecting again replaces the list instead of appending
	let second = academy.select_semester(3).await.unwrap().to_vec();
	assert_eq!(first, second);
	assert_eq!(academy.list_subjects().len(), 4);
}

#[tokio::test]
async fn subject_without_content_tab_has_no_units() {
	let portal = FakePortal::start().await;
	wiremock::Mock::given(wiremock::matchers::method("GET"))
		.and(wiremock::matchers::path(support::ADMIN))
		.and(wiremock::matchers::query_param("actionType", "42"))
		.respond_with(support::html(page("", "<p>No content to display</p>")))
		.with_priority(1)
		.mount(&portal.server)
		.await;
	let mut academy = portal.academy("alice", "secret");
	academy.login().await.unwrap();
	academy.select_semester(3).await.unwrap();

	let units = academy.select_subject(0).await.unwrap();
	assert!(units.is_empty());
	assert_eq!(academy.state(), NavState::SubjectSelected);
}

#[tokio::test]
async fn unit_lists_notes_with_selection_parameters() {
	let portal = FakePortal::start().await;
	let (_academy, content) = portal.academy_at_unit().await;

	assert!(content.slides.is_empty());
	assert_eq!(content.notes.len(), 1);
	let note = &content.notes[0];
	assert_eq!(note.kind, ResourceKind::Note);
	assert_eq!(note.ordinal, 1);
	assert_eq!(note.title, "Unit 1");
	assert_eq!(note.unit_id, "55");
	assert_eq!(note.selected_data, "p1");
	assert_eq!(note.content_id, "p2");
}

#[tokio::test]
async fn unit_without_resource_table_is_empty() {
	let portal = FakePortal::start().await;
	portal.mount_unit_page("<p>Nothing published yet</p>", 1).await;

	let (academy, content) = portal.academy_at_unit().await;
	assert!(content.notes.is_empty());
	assert!(content.slides.is_empty());
	assert_eq!(academy.state(), NavState::UnitSelected);
}

#[tokio::test]
async fn navigation_reply_refreshes_token() {
	let portal = FakePortal::start().await;
	wiremock::Mock::given(wiremock::matchers::method("POST"))
		.and(wiremock::matchers::path(support::ADMIN))
		.and(wiremock::matchers::body_string_contains("id=1153"))
		.respond_with(support::html(page(&support::csrf_meta("courses-token"), "<h2>My Courses</h2>")))
		.with_priority(1)
		.mount(&portal.server)
		.await;
	let mut academy = portal.academy("alice", "secret");
	academy.login().await.unwrap();

	academy.select_semester(3).await.unwrap();
	assert_eq!(academy.csrf_token(), Some("courses-token"));
	let requests = portal.requests().await;
	let semester_post = requests
		.iter()
		.find(|request| String::from_utf8_lossy(&request.body).contains("id=9001"))
		.unwrap();
	assert!(String::from_utf8_lossy(&semester_post.body).contains("_csrf=courses-token"));
}

#[tokio::test]
async fn calls_out_of_order_are_rejected() {
	let portal = FakePortal::start().await;
	let mut academy = portal.academy("alice", "secret");

	let err = academy.select_semester(3).await.unwrap_err();
	assert!(matches!(err, Error::OutOfOrder { .. }), "{:?}", err);
	assert!(portal.requests().await.is_empty());

	academy.login().await.unwrap();
	let err = academy.select_subject(0).await.unwrap_err();
	assert!(
		matches!(err, Error::OutOfOrder { required: NavState::SemesterSelected, .. }),
		"{:?}",
		err
	);

	academy.select_semester(3).await.unwrap();
	assert!(matches!(academy.select_subject(7).await, Err(Error::NoSuchSubject(7))));
}

#[tokio::test]
async fn failed_semester_switch_forgets_previous_subjects() {
	let portal = FakePortal::start().await;
	let mut academy = portal.academy("alice", "secret");
	academy.login().await.unwrap();
	academy.select_semester(3).await.unwrap();
	academy.select_subject(0).await.unwrap();

	let err = academy.select_semester(5).await.unwrap_err();
	assert!(matches!(err, Error::SemesterNotFound { .. }), "{:?}", err);
	assert_eq!(academy.state(), NavState::Authenticated);
	assert!(academy.list_subjects().is_empty());
	assert!(matches!(
		academy.select_subject(0).await,
		Err(Error::OutOfOrder { required: NavState::SemesterSelected, .. })
	));
}

#[tokio::test]
async fn failed_subject_selection_blocks_its_units() {
	let portal = FakePortal::start().await;
	let (mut academy, _) = portal.academy_at_unit().await;
	wiremock::Mock::given(wiremock::matchers::method("GET"))
		.and(wiremock::matchers::path(support::ADMIN))
		.and(wiremock::matchers::query_param("actionType", "42"))
		.respond_with(wiremock::ResponseTemplate::new(500))
		.with_priority(1)
		.mount(&portal.server)
		.await;

	let err = academy.select_subject(0).await.unwrap_err();
	assert!(matches!(err, Error::Http(_)), "{:?}", err);
	assert_eq!(academy.state(), NavState::SemesterSelected);

	let unit = pesu_academy::Unit {
		name: "Unit 1".into(),
		id: "55".into(),
	};
	assert!(matches!(
		academy.select_unit(&unit).await,
		Err(Error::OutOfOrder { required: NavState::SubjectSelected, .. })
	));
}
