//! Scoped changes of the process working directory.
//!
//! The working directory is process-wide state: a pipeline holds [`lock`] for
//! as long as it has a [`DirGuard`] open.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use tokio::sync::{Mutex, MutexGuard};

use crate::cli::Logger;
use crate::util::file_escape;

static WORKDIR: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Waits until no other pipeline in this process uses the working directory.
pub async fn lock() -> MutexGuard<'static, ()> {
	WORKDIR.lock().await
}

/// Working directory change that is undone by [`DirGuard::exit`], or by `Drop`
/// if the guard is abandoned on an error or panic path.
#[must_use = "the previous directory is restored when the guard goes away"]
#[derive(Debug)]
pub struct DirGuard {
	previous: PathBuf,
	current: PathBuf,
	restored: bool,
}

impl DirGuard {
	/// Enters the directory named after `name`, creating it if necessary.
	pub fn enter(name: &str, log: &Logger) -> io::Result<Self> {
		DirGuard::enter_path(Path::new(&file_escape(name)), log)
	}

	/// Like [`DirGuard::enter`], but `path` is used as is.
	pub fn enter_path(path: &Path, log: &Logger) -> io::Result<Self> {
		let previous = env::current_dir()?;
		match fs::create_dir(path) {
			Ok(()) => debug!(log, "Creating directory {}", path.display()),
			Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
				debug!(log, "Directory {} already exists!", path.display())
			},
			Err(e) if path.components().count() > 1 => {
				debug!(log, "create_dir({}) failed ({}), creating parents", path.display(), e);
				fs::create_dir_all(path)?;
			},
			Err(e) => return Err(e),
		}
		env::set_current_dir(path)?;
		Ok(DirGuard {
			previous,
			current: env::current_dir()?,
			restored: false,
		})
	}

	/// Absolute path of the directory this guard entered.
	pub fn path(&self) -> &Path {
		&self.current
	}

	/// Returns to the directory that was current before [`DirGuard::enter`].
	pub fn exit(mut self) -> io::Result<()> {
		self.restored = true;
		env::set_current_dir(&self.previous)
	}
}

impl Drop for DirGuard {
	fn drop(&mut self) {
		if !self.restored {
			let _ = env::set_current_dir(&self.previous);
		}
	}
}
