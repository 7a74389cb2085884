//! Everything that depends on the portal's markup.
//!
//! Per-row parsers return `Result`s so one malformed row never hides the rest.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use super::{CourseType, Frame, Profile, Resource, ResourceKind, Subject, Unit};
use crate::errors::{Error, Result};

#[allow(non_upper_case_globals)]
mod selectors {
	use once_cell::sync::Lazy;
	use scraper::Selector;
	// construct CSS selectors once
	pub static csrf_meta: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"meta[name="csrf-token"]"#).unwrap());
	pub static info_header: Lazy<Selector> = Lazy::new(|| Selector::parse("h4.info_header").unwrap());
	pub static info_text: Lazy<Selector> = Lazy::new(|| Selector::parse("span.info_text").unwrap());
	pub static option: Lazy<Selector> = Lazy::new(|| Selector::parse("option").unwrap());
	pub static tbody: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody").unwrap());
	pub static tr: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
	pub static td: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
	pub static tab_content: Lazy<Selector> = Lazy::new(|| Selector::parse("div.tab-content").unwrap());
	pub static unit_links: Lazy<Selector> = Lazy::new(|| Selector::parse("#courseUnits a").unwrap());
	pub static short_title: Lazy<Selector> = Lazy::new(|| Selector::parse("span.short-title").unwrap());
	pub static note_marker: Lazy<Selector> = Lazy::new(|| Selector::parse("span.pesu-icon-open-book").unwrap());
	pub static slide_marker: Lazy<Selector> =
		Lazy::new(|| Selector::parse("span.pesu-icon-presentation-graphs").unwrap());
	pub static iframes: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe[src]").unwrap());
}
use selectors::*;

static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*$").unwrap());
static CALL_ARGUMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\((.*)\)").unwrap());

/// Position of the arguments inside a resource click handler.
const ARG_UNIT_ID: usize = 0;
const ARG_SELECTED_DATA: usize = 1;
const ARG_CONTENT_ID: usize = 4;

fn clean_text(el: ElementRef) -> String {
	el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Part of an identifier after the first `_`, e.g. `rowWiseCourseContent_20975`.
fn id_suffix(raw: &str) -> &str {
	raw.split_once('_').map(|(_, id)| id).unwrap_or(raw)
}

fn marker_selector(kind: ResourceKind) -> &'static Selector {
	match kind {
		ResourceKind::Note => &note_marker,
		ResourceKind::Slide => &slide_marker,
	}
}

pub fn csrf_token(html: &Html) -> Option<String> {
	html.select(&csrf_meta)
		.next()
		.and_then(|meta| meta.value().attr("content"))
		.map(|token| token.trim().to_owned())
		.filter(|token| !token.is_empty())
}

/// The profile header is only rendered for a logged in student.
pub fn profile(html: &Html) -> Option<Profile> {
	let name = clean_text(html.select(&info_header).next()?);
	let srn = html
		.select(&info_text)
		.next()
		.map(|el| {
			// "SRN : PES1UG20CS001"
			let text = clean_text(el);
			let srn = text.split(' ').skip(2).collect::<Vec<_>>().join(" ");
			if srn.is_empty() {
				text
			} else {
				srn
			}
		})
		.unwrap_or_default();
	Some(Profile { name, srn })
}

/// Maps semester numbers to the portal's semester ids.
pub fn semester_ids(html: &Html) -> BTreeMap<u32, String> {
	html.select(&option)
		.filter_map(|entry| {
			let label = clean_text(entry);
			let number = TRAILING_NUMBER.captures(&label)?.get(1)?.as_str().parse().ok()?;
			// the endpoint returns escaped markup, e.g. value=\"1234\"
			let id = entry
				.value()
				.attr("value")?
				.trim_matches(|c: char| c == '\\' || c == '"' || c.is_whitespace());
			if id.is_empty() {
				return None;
			}
			Some((number, id.to_owned()))
		})
		.collect()
}

/// Subject rows in table order.
pub fn subjects(html: &Html) -> Vec<Result<Subject>> {
	match html.select(&tbody).next() {
		Some(table) => table.select(&tr).map(subject_row).collect(),
		None => Vec::new(),
	}
}

fn subject_row(row: ElementRef) -> Result<Subject> {
	let cells = row.select(&td).map(clean_text).collect::<Vec<_>>();
	if cells.len() < 4 {
		return Err(Error::gap(format!("subject row with {} cells", cells.len())));
	}
	let id = row.value().attr("id").ok_or_else(|| Error::gap(format!("subject row {:?} without id", cells[1])))?;
	Ok(Subject {
		code: cells[0].clone(),
		name: cells[1].clone(),
		course_type: CourseType::from_tag(&cells[2]),
		status: cells[3].clone(),
		id: id_suffix(id).to_owned(),
	})
}

/// Units listed in a subject's content tab. A subject page without the tab has no units.
pub fn units(html: &Html) -> Result<Vec<Result<Unit>>> {
	let content = html
		.select(&tab_content)
		.next()
		.ok_or_else(|| Error::gap("no content tab"))?;
	Ok(content.select(&unit_links).map(unit_link).collect())
}

fn unit_link(link: ElementRef) -> Result<Unit> {
	let name = clean_text(link);
	let href = link
		.value()
		.attr("href")
		.ok_or_else(|| Error::gap(format!("unit {:?} without href", name)))?;
	if name.is_empty() {
		return Err(Error::gap(format!("unit link {:?} without name", href)));
	}
	Ok(Unit {
		name,
		id: id_suffix(href).to_owned(),
	})
}

/// Resources of one kind in a unit's table, numbered in row order.
pub fn resources(html: &Html, kind: ResourceKind) -> Result<Vec<Result<Resource>>> {
	let table = html
		.select(&tbody)
		.next()
		.ok_or_else(|| Error::gap("no resource table"))?;
	let mut resources = Vec::new();
	let mut ordinal = 0;
	for row in table.select(&tr) {
		let marker = match row.select(marker_selector(kind)).next() {
			Some(marker) => marker,
			None => continue, // row has no resource of this kind
		};
		resources.push(resource_row(row, marker).map(|(title, args)| {
			ordinal += 1;
			Resource {
				kind,
				ordinal,
				title,
				unit_id: args[ARG_UNIT_ID].clone(),
				selected_data: args[ARG_SELECTED_DATA].clone(),
				content_id: args[ARG_CONTENT_ID].clone(),
			}
		}));
	}
	Ok(resources)
}

fn resource_row(row: ElementRef, marker: ElementRef) -> Result<(String, Vec<String>)> {
	let title = row
		.select(&short_title)
		.next()
		.map(clean_text)
		.ok_or_else(|| Error::gap("resource row without title"))?;
	let handler = marker
		.parent()
		.and_then(ElementRef::wrap)
		.and_then(|parent| parent.value().attr("onclick"))
		.ok_or_else(|| Error::gap(format!("resource {:?} without click handler", title)))?;
	let args = click_handler_args(handler)
		.ok_or_else(|| Error::gap(format!("resource {:?} has malformed click handler {:?}", title, handler)))?;
	if args.len() <= ARG_CONTENT_ID {
		return Err(Error::gap(format!(
			"resource {:?} has {} click handler arguments",
			title,
			args.len()
		)));
	}
	Ok((title, args))
}

/// Arguments of an inline handler like `handleclassFormate('55','p1','0','1','p2')`.
pub fn click_handler_args(onclick: &str) -> Option<Vec<String>> {
	let args = CALL_ARGUMENTS.captures(onclick)?.get(1)?.as_str();
	Some(
		args.split(',')
			.map(|arg| arg.trim().trim_matches(|c: char| c == '\'' || c == '"').to_owned())
			.collect(),
	)
}

/// Embedded documents of a resource page, without their in-page anchors.
pub fn frames(html: &Html, base: &Url) -> Vec<Result<Frame>> {
	html.select(&iframes)
		.enumerate()
		.map(|(i, iframe)| {
			let src = iframe.value().attr("src").unwrap_or_default().trim();
			let mut url = base
				.join(src)
				.map_err(|e| Error::gap(format!("frame source {:?}: {}", src, e)))?;
			url.set_fragment(None);
			Ok(Frame { index: i + 1, url })
		})
		.collect()
}
