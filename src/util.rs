use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::stream::{Stream, TryStreamExt};
use indicatif::ProgressBar;
use tokio::fs::{self, File as AsyncFile};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;

/// Transfers are copied to disk in pieces of this size.
pub const CHUNK_SIZE: usize = 1 << 10;

const UNSAFE_CHARACTERS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Turns an arbitrary remote name into a single path segment.
///
/// Characters that are unsafe on any common filesystem become `_`, non-ASCII
/// characters are dropped. A result that would not name a new directory entry
/// (empty, `.` or `..`) becomes `_`.
pub fn file_escape(name: &str) -> String {
	let escaped = name
		.chars()
		.filter(char::is_ascii)
		.map(|c| if UNSAFE_CHARACTERS.contains(&c) || c.is_ascii_control() { '_' } else { c })
		.collect::<String>();
	match escaped.as_str() {
		"" | "." | ".." => "_".to_owned(),
		_ => escaped,
	}
}

fn partial_path(path: &Path) -> PathBuf {
	let mut name = path.file_name().map(|x| x.to_os_string()).unwrap_or_default();
	name.push(".part");
	path.with_file_name(name)
}

/// Streams `stream` into `path`, expecting exactly `expected` bytes.
///
/// Data goes to `<path>.part` first and is only renamed into place once the
/// whole body arrived.
pub async fn write_stream_to_file<S>(path: &Path, stream: S, expected: u64, progress: &ProgressBar) -> io::Result<u64>
where
	S: Stream<Item = reqwest::Result<Bytes>>,
{
	let reader = StreamReader::new(stream.map_err(|x| io::Error::new(io::ErrorKind::Other, x)));
	tokio::pin!(reader);
	let partial = partial_path(path);
	let file = AsyncFile::create(&partial).await?;
	let mut file = BufWriter::new(file);
	let mut chunk = vec![0; CHUNK_SIZE];
	let mut written = 0;
	loop {
		let n = reader.read(&mut chunk).await?;
		if n == 0 {
			break;
		}
		file.write_all(&chunk[..n]).await?;
		written += n as u64;
		progress.inc(n as u64);
	}
	file.flush().await?;
	drop(file);
	if written != expected {
		return Err(io::Error::new(
			io::ErrorKind::UnexpectedEof,
			format!("received {} of {} bytes", written, expected),
		));
	}
	fs::rename(&partial, path).await?;
	Ok(written)
}
