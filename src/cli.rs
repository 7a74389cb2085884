// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use structopt::StructOpt;

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = env!("CARGO_PKG_NAME"), about = "Command line notes/slides scraper for www.pesuacademy.com")]
pub struct Opt {
	/// Login username
	pub username: Option<String>,

	/// Login password
	pub password: Option<String>,

	/// Scrape for given semester
	#[structopt(short, long, value_name = "S")]
	pub semester: u32,

	/// No logging
	#[structopt(short, long, conflicts_with = "verbose")]
	pub quiet: bool,

	/// Complete logging
	#[structopt(short, long)]
	pub verbose: bool,

	/// Output directory
	#[structopt(short, long, parse(from_os_str), default_value = ".")]
	pub output: PathBuf,

	/// Only scrape these subjects (numbers as listed after selecting the semester)
	#[structopt(short = "c", long = "subject", value_name = "N")]
	pub subjects: Vec<usize>,

	/// Portal base URL
	#[structopt(long, default_value = "https://www.pesuacademy.com/Academy/")]
	pub portal_url: String,

	/// JSON file overriding the portal's menu codes
	#[structopt(long, parse(from_os_str))]
	pub menu_codes: Option<PathBuf>,

	/// Proxy, e.g. socks5h://127.0.0.1:1080
	#[structopt(short, long)]
	pub proxy: Option<String>,

	/// Also append every log line to this file
	#[structopt(long, parse(from_os_str))]
	pub log_file: Option<PathBuf>,
}

impl Opt {
	pub fn verbosity(&self) -> Verbosity {
		if self.quiet {
			Verbosity::Quiet
		} else if self.verbose {
			Verbosity::Verbose
		} else {
			Verbosity::Normal
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
	Quiet,
	Normal,
	Verbose,
}

/// Log sink handed to the client. Level 0 is progress output, level 1 is request/response detail.
#[derive(Debug, Clone)]
pub struct Logger {
	verbosity: Verbosity,
	progress_bars: bool,
	log_file: Option<Arc<Mutex<File>>>,
}

impl Logger {
	pub fn new(verbosity: Verbosity) -> Self {
		Logger {
			verbosity,
			progress_bars: verbosity != Verbosity::Quiet && atty::is(atty::Stream::Stdout),
			log_file: None,
		}
	}

	/// Appends every printed line to `path` as well, without colors.
	pub fn with_log_file(mut self, path: &Path) -> io::Result<Self> {
		let file = OpenOptions::new().create(true).append(true).open(path)?;
		self.log_file = Some(Arc::new(Mutex::new(file)));
		Ok(self)
	}

	pub fn quiet() -> Self {
		Logger::new(Verbosity::Quiet)
	}

	pub fn enabled(&self, level: usize) -> bool {
		match self.verbosity {
			Verbosity::Quiet => false,
			Verbosity::Normal => level == 0,
			Verbosity::Verbose => true,
		}
	}

	pub fn println(&self, line: String) {
		if let Some(file) = self.log_file.as_ref() {
			if let Ok(mut file) = file.lock() {
				// best effort, the line still goes to stdout
				let _ = writeln!(file, "{}", ANSI_ESCAPE.replace_all(&line, ""));
			}
		}
		println!("{}", line);
	}

	/// Byte progress bar for one transfer, hidden unless attached to a terminal.
	pub fn progress_bar(&self, len: u64) -> ProgressBar {
		if !self.progress_bars {
			return ProgressBar::hidden();
		}
		let bar = ProgressBar::new(len);
		bar.set_draw_target(ProgressDrawTarget::stdout());
		bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {bytes}/{total_bytes} {wide_msg}"));
		bar
	}
}

#[macro_export]
macro_rules! log {
	($logger:expr, $lvl:expr, $($t:expr),+) => {{
		#[allow(unused_imports)]
		use colored::Colorize as _;
		let logger: &$crate::cli::Logger = &$logger;
		if logger.enabled($lvl) {
			logger.println(format!($($t),+));
		}
	}};
}

#[macro_export]
macro_rules! info {
	($logger:expr, $($t:expr),+) => {
		$crate::log!($logger, 0, $($t),+)
	};
}

#[macro_export]
macro_rules! debug {
	($logger:expr, $($t:expr),+) => {
		$crate::log!($logger, 1, $($t),+)
	};
}

#[macro_export]
macro_rules! success {
	($logger:expr, $($t:expr),+) => {
		$crate::log!($logger, 0, "{}", format!($($t),+).bright_green())
	};
}

#[macro_export]
macro_rules! warning {
	($logger:expr; $e:expr) => {
		$crate::log!($logger, 0, "Warning: {}", format!("{}", $e).bright_yellow())
	};
	($logger:expr, $($t:expr),+) => {
		$crate::log!($logger, 0, "Warning: {}", format!($($t),+).bright_yellow())
	};
}

#[macro_export]
macro_rules! error {
	($logger:expr; $e:expr) => {
		$crate::log!($logger, 0, "Error: {}", format!("{}", $e).bright_red())
	};
	($logger:expr, $($prefix:expr),+; $e:expr) => {
		$crate::log!($logger, 0, "{}: {}", format!($($prefix),+), format!("{}", $e).bright_red())
	};
}

pub fn ask_user_pass(opt: &Opt) -> Result<(String, String)> {
	let user = if let Some(username) = opt.username.as_ref() {
		username.clone()
	} else {
		rprompt::prompt_reply_stdout("Username: ").context("username prompt")?
	};
	let pass = if let Some(password) = opt.password.as_ref() {
		password.clone()
	} else {
		rpassword::read_password_from_tty(Some("Password: ")).context("password prompt")?
	};
	Ok((user, pass))
}
