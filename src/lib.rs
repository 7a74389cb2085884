// SPDX-License-Identifier: GPL-3.0-or-later

//! Downloads course notes and slides from PESU Academy.
//!
//! The portal keeps the current menu selection in the session, so every call
//! on [`PesuAcademy`] has to follow the order login → semester → subject →
//! unit → resource.

#[macro_use]
pub mod cli;
pub mod academy;
pub mod config;
pub mod errors;
pub mod mirror;
pub mod util;
pub mod workdir;

pub use academy::{
	navigation::UnitContent, CourseType, Credentials, Frame, NavState, PesuAcademy, Profile, Resource, ResourceKind,
	Subject, Unit,
};
pub use cli::{Logger, Verbosity};
pub use config::{MenuCodes, PortalConfig};
pub use errors::{Error, Result};
pub use mirror::mirror;
