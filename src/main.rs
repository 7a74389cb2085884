// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context, Result};
use structopt::StructOpt;

use pesu_academy::cli::{ask_user_pass, Logger, Opt};
use pesu_academy::{error, success, warning};
use pesu_academy::{mirror, Credentials, Error, PesuAcademy, PortalConfig};

/// Exit status after rejected credentials.
const EXIT_LOGIN_FAILED: i32 = 77;

#[tokio::main]
async fn main() {
	let opt = Opt::from_args();
	let mut log = Logger::new(opt.verbosity());
	if let Some(path) = opt.log_file.as_ref() {
		match log.clone().with_log_file(path) {
			Ok(with_file) => log = with_file,
			Err(e) => warning!(log, "Cannot write log file {}: {}", path.display(), e),
		}
	}
	if let Err(e) = real_main(opt, &log).await {
		error!(log; format!("{:#}", e));
		let code = match e.downcast_ref::<Error>() {
			Some(Error::Authentication(_)) => EXIT_LOGIN_FAILED,
			_ => 1,
		};
		std::process::exit(code);
	}
}

fn credentials(opt: &Opt) -> Result<(String, String)> {
	if let (Some(user), Some(pass)) = (opt.username.as_ref(), opt.password.as_ref()) {
		return Ok((user.clone(), pass.clone()));
	}
	// load .pesulogin file
	let pesulogin = opt.output.join(".pesulogin");
	match std::fs::read_to_string(&pesulogin) {
		Ok(login) if opt.username.is_none() => {
			let mut lines = login.split('\n');
			let user = lines.next().context("missing user in .pesulogin")?;
			let pass = lines.next().context("missing password in .pesulogin")?;
			Ok((user.trim().to_owned(), pass.trim().to_owned()))
		},
		_ => ask_user_pass(opt).context("credentials input failed"),
	}
}

async fn real_main(opt: Opt, log: &Logger) -> Result<()> {
	#[cfg(windows)]
	let _ = colored::control::set_virtual_terminal(true);

	let config = PortalConfig::from_opt(&opt)?;
	let subjects = opt
		.subjects
		.iter()
		.map(|&n| n.checked_sub(1).context("subjects are numbered from 1"))
		.collect::<Result<Vec<_>>>()?;
	let (user, pass) = credentials(&opt)?;

	let mut academy = PesuAcademy::new(config, Credentials::new(user, pass), log.clone())?;
	mirror(&mut academy, opt.semester, &opt.output, &subjects).await?;
	success!(log, "Done!");
	Ok(())
}
