use std::path::Path;

use crate::{
	academy::PesuAcademy,
	errors::Result,
	workdir::{self, DirGuard},
};

/// Runs a whole sync: login, semester selection, download into
/// `output/Sem-{semester}`, logout.
///
/// `subjects` holds 0-based indices into the subject list; empty means all of
/// them. Logout happens whenever login succeeded.
pub async fn mirror(academy: &mut PesuAcademy, semester: u32, output: &Path, subjects: &[usize]) -> Result<()> {
	let _workdir = workdir::lock().await;
	academy.login().await?;
	let result = mirror_semester(academy, semester, output, subjects).await;
	academy.logout().await;
	result
}

async fn mirror_semester(academy: &mut PesuAcademy, semester: u32, output: &Path, subjects: &[usize]) -> Result<()> {
	academy.select_semester(semester).await?;
	let log = academy.logger().clone();
	let root = DirGuard::enter_path(output, &log)?;
	let semester_dir = DirGuard::enter(&format!("Sem-{}", semester), &log)?;
	let result = if subjects.is_empty() {
		academy.scrape_all_subjects().await
	} else {
		academy.scrape_subjects(subjects).await
	};
	semester_dir.exit()?;
	root.exit()?;
	result
}
