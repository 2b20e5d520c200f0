// Copyright 2025 pyke.io
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Just enough HTTP/1.1 to issue a streaming GET and read the response head. The body is left on the wire so the
//! room's decoder sees the raw transfer framing.

use base64::{Engine, engine::general_purpose::STANDARD};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use url::Url;

use crate::Error;

const USER_AGENT: &str = concat!("campfire-stream/", env!("CARGO_PKG_VERSION"));

/// Response heads larger than this are rejected.
pub(crate) const MAX_HEAD_LEN: usize = 64 * 1024;

/// `Authorization` header value for an API token; the password half is ignored by the service.
pub(crate) fn basic_auth(token: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{token}:x")))
}

pub(crate) fn request(url: &Url, token: &str) -> Result<Vec<u8>, Error> {
	let host = url.host_str().ok_or_else(|| Error::MissingHost(url.to_string()))?;
	let host = match url.port() {
		Some(port) => format!("{host}:{port}"),
		None => host.to_string()
	};
	let path = match url.query() {
		Some(query) => format!("{}?{query}", url.path()),
		None => url.path().to_string()
	};
	Ok(format!(
		"GET {path} HTTP/1.1\r\nHost: {host}\r\nAccept: */*\r\nAuthorization: {}\r\nConnection: keep-alive\r\nUser-Agent: {USER_AGENT}\r\n\r\n",
		basic_auth(token)
	)
	.into_bytes())
}

#[derive(Debug)]
pub(crate) struct ResponseHead {
	pub status: StatusCode,
	pub reason: String,
	pub headers: HeaderMap
}

impl ResponseHead {
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Whether the body uses chunked transfer framing.
	pub fn is_chunked(&self) -> bool {
		self.headers
			.get_all(header::TRANSFER_ENCODING)
			.iter()
			.any(|v| v.to_str().is_ok_and(|v| v.to_ascii_lowercase().contains("chunked")))
	}
}

/// Finds the end of the response head in `buf`, returning the offset of the first body byte.
///
/// The head ends at whichever blank line comes first; a bare-`\n` head may be followed by a body that itself contains
/// `\r\n\r\n`.
pub(crate) fn head_end(buf: &[u8]) -> Option<usize> {
	let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4);
	let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| p + 2);
	[crlf, lf].into_iter().flatten().min()
}

pub(crate) fn parse_head(head: &[u8]) -> Result<ResponseHead, Error> {
	let head = std::str::from_utf8(head).map_err(|_| Error::MalformedHead("head is not valid UTF-8"))?;
	let mut lines = head.lines().map(|l| l.trim_end_matches('\r'));

	let status_line = lines.next().ok_or(Error::MalformedHead("missing status line"))?;
	let mut parts = status_line.splitn(3, ' ');
	if !parts.next().is_some_and(|v| v.starts_with("HTTP/")) {
		return Err(Error::MalformedHead("status line does not start with an HTTP version"));
	}
	let status = parts
		.next()
		.and_then(|c| StatusCode::from_bytes(c.as_bytes()).ok())
		.ok_or(Error::MalformedHead("invalid status code"))?;
	let reason = parts.next().unwrap_or_default().trim().to_string();

	let mut headers = HeaderMap::new();
	for line in lines.take_while(|l| !l.is_empty()) {
		let (name, value) = line.split_once(':').ok_or(Error::MalformedHead("header line without a colon"))?;
		let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| Error::MalformedHead("invalid header name"))?;
		let value = HeaderValue::from_str(value.trim()).map_err(|_| Error::MalformedHead("invalid header value"))?;
		headers.append(name, value);
	}

	Ok(ResponseHead { status, reason, headers })
}
