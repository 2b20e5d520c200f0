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

use std::io;

use http::StatusCode;
use thiserror::Error;

/// Errors delivered to `error` listeners, scoped to the room they occurred in.
#[derive(Debug, Error)]
pub enum Error {
	/// The streaming endpoint answered with a non-2xx status. `reason` is the reason phrase from the status line.
	#[error("{} {reason}", .status.as_u16())]
	BadStatus { status: StatusCode, reason: String },
	#[error("connection error: {0}")]
	Io(#[from] io::Error),
	#[cfg(feature = "tls-native")]
	#[error("TLS error: {0}")]
	Tls(#[from] tokio_native_tls::native_tls::Error),
	#[error("TLS support is not enabled; cannot connect to {0}")]
	TlsUnavailable(String),
	#[error("malformed response head: {0}")]
	MalformedHead(&'static str),
	#[error("unsupported URL scheme `{0}`")]
	UnsupportedScheme(String),
	#[error("URL `{0}` has no host")]
	MissingHost(String),
	#[error("{0}")]
	Framing(#[from] FrameError),
	#[error("error when deserializing: {0}")]
	Deserialization(#[from] simd_json::Error),
	#[error("unknown event `{0}`; expected `stream` or `error`")]
	UnknownEvent(String),
	#[error("{0}")]
	Config(#[from] ConfigError)
}

impl Error {
	/// Whether the room's connection is torn down after this error.
	///
	/// Payloads that fail to decode as JSON are reported but do not end the stream.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Error::Deserialization(_))
	}
}

/// A violation of the body framing, or a payload larger than the configured limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
	#[error("chunk size line does not start with a hex digit: {0:?}")]
	InvalidChunkSize(String),
	#[error("chunk size does not fit in memory: {0:?}")]
	ChunkSizeOverflow(String),
	#[error("expected empty line after chunk, got {0:?}")]
	MissingTerminator(String),
	#[error("chunk of {len} bytes exceeds the {max} byte limit")]
	ChunkTooLarge { len: usize, max: usize },
	#[error("line exceeds the {0} byte limit")]
	LineTooLong(usize)
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("missing API token (set CAMPFIRE_TOKEN)")]
	MissingToken,
	#[error("no rooms configured (set CAMPFIRE_ROOMS or pass room IDs as arguments)")]
	NoRooms,
	#[error("invalid room ID {0:?}")]
	InvalidRoom(String),
	#[error("invalid service host {0:?}")]
	InvalidHost(String),
	#[error("invalid endpoint: {0}")]
	InvalidEndpoint(#[from] url::ParseError)
}
