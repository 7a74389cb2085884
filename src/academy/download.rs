use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use tokio::time;

use super::{Frame, PesuAcademy, Resource};
use crate::{
	errors::{Error, Result},
	util::write_stream_to_file,
};

/// Pause after every finished file, to go easy on the portal.
const FRAME_PAUSE: Duration = Duration::from_secs(1);

/// Byte count announced by a response, required to write a frame.
pub fn declared_length(headers: &HeaderMap) -> Result<u64> {
	let value = headers
		.get(CONTENT_LENGTH)
		.ok_or_else(|| Error::gap("response has no Content-Length"))?;
	value
		.to_str()
		.ok()
		.and_then(|x| x.trim().parse().ok())
		.ok_or_else(|| Error::gap(format!("unparsable Content-Length {:?}", value)))
}

impl PesuAcademy {
	/// Downloads every document embedded in `resource` into `dest`.
	///
	/// Returns how many files were written. A frame that cannot be fetched is
	/// skipped with a warning; only a failed resource selection is an error.
	pub async fn download_resource(&mut self, resource: &Resource, dest: &Path) -> Result<usize> {
		let frames = self.select_resource(resource).await?;
		if frames.is_empty() {
			info!(self.log, "No documents in {}", resource.display_name());
			return Ok(0);
		}
		let mut written = 0;
		for frame in &frames {
			let path = dest.join(resource.file_name(frame.index));
			match self.download_frame(frame, &path).await {
				Ok(bytes) => {
					debug!(self.log, "Wrote {} bytes to {}", bytes, path.display());
					written += 1;
					time::sleep(FRAME_PAUSE).await;
				},
				Err(e) => warning!(
					self.log,
					"Skipping document {} of {}: {}",
					frame.index,
					resource.display_name(),
					e
				),
			}
		}
		Ok(written)
	}

	async fn download_frame(&self, frame: &Frame, path: &Path) -> Result<u64> {
		debug!(self.log, "GET {}", frame.url);
		let response = self
			.client
			.get(frame.url.clone())
			.send()
			.await
			.map_err(|e| Error::transfer(&frame.url, e))?;
		debug!(self.log, "{} {} {:?}", response.status(), response.url(), response.headers());
		if !response.status().is_success() {
			return Err(Error::transfer(&frame.url, format!("server answered {}", response.status())));
		}
		let size = declared_length(response.headers())?;

		info!(
			self.log,
			"Download: {} ({:.2} MB)",
			path.file_name().unwrap_or_default().to_string_lossy(),
			size as f64 / (1 << 20) as f64
		);
		let progress = self.log.progress_bar(size);
		let result = write_stream_to_file(path, response.bytes_stream(), size, &progress).await;
		progress.finish_and_clear();
		result.map_err(|e| Error::transfer(&frame.url, e))
	}
}

#[cfg(test)]
mod tests {
	use reqwest::header::HeaderValue;

	use super::*;

	#[test]
	fn content_length_is_required() {
		let mut headers = HeaderMap::new();
		assert!(matches!(declared_length(&headers), Err(Error::ExtractionGap(_))));

		headers.insert(CONTENT_LENGTH, HeaderValue::from_static("many"));
		assert!(matches!(declared_length(&headers), Err(Error::ExtractionGap(_))));

		headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2048"));
		assert_eq!(declared_length(&headers).unwrap(), 2048);
	}
}
