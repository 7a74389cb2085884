use std::path::Path;

use super::{NavState, PesuAcademy, Resource, ResourceKind, Unit};
use crate::{errors::Result, workdir::DirGuard};

impl PesuAcademy {
	/// Mirrors every subject of the selected semester below the working directory.
	pub async fn scrape_all_subjects(&mut self) -> Result<()> {
		let indices = (0..self.subjects.len()).collect::<Vec<_>>();
		self.scrape_subjects(&indices).await
	}

	/// Mirrors the subjects at `indices` (0-based). A failing subject is logged and skipped.
	pub async fn scrape_subjects(&mut self, indices: &[usize]) -> Result<()> {
		self.require(NavState::SemesterSelected, "scrape subjects")?;
		for &index in indices {
			if let Err(e) = self.scrape_subject(index).await {
				if e.is_fatal() {
					return Err(e);
				}
				error!(self.log, "Scraping subject {}", index + 1; e);
			}
		}
		Ok(())
	}

	/// Mirrors one subject into a directory named after its course code.
	pub async fn scrape_subject(&mut self, index: usize) -> Result<()> {
		let units = self.select_subject(index).await?;
		if units.is_empty() {
			return Ok(());
		}
		let subject = &self.subjects[index];
		let pretty_units = units
			.iter()
			.enumerate()
			.map(|(i, unit)| format!("({}) {}", i + 1, unit.name))
			.collect::<Vec<_>>()
			.join("\n");
		info!(self.log, "Found the following units:\n{}:\n{}", subject.name, pretty_units);

		let dir = DirGuard::enter(&subject.code, &self.log)?;
		for unit in &units {
			if let Err(e) = self.scrape_unit(unit).await {
				if e.is_fatal() {
					return Err(e);
				}
				error!(self.log, "Scraping {}", unit.name; e);
			}
		}
		dir.exit()?;
		Ok(())
	}

	async fn scrape_unit(&mut self, unit: &Unit) -> Result<()> {
		info!(self.log, "Scraping {}", unit.name);
		let content = self.select_unit(unit).await?;
		for &kind in [ResourceKind::Note, ResourceKind::Slide].iter() {
			let resources = content.of_kind(kind);
			if resources.is_empty() {
				continue;
			}
			let unit_dir = DirGuard::enter(&unit.name, &self.log)?;
			let kind_dir = DirGuard::enter(kind.dir_name(), &self.log)?;
			let result = self.download_all(resources).await;
			kind_dir.exit()?;
			unit_dir.exit()?;
			result?;
		}
		Ok(())
	}

	async fn download_all(&mut self, resources: &[Resource]) -> Result<()> {
		for resource in resources {
			if let Err(e) = self.download_resource(resource, Path::new(".")).await {
				if e.is_fatal() {
					return Err(e);
				}
				error!(self.log, "Downloading {}", resource.display_name(); e);
			}
		}
		Ok(())
	}
}
