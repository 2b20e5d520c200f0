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

use futures_util::{Stream, stream};
use simd_json::OwnedValue;
use tokio::{
	io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
	net::TcpStream
};
use url::Url;

use crate::{
	Config, Error,
	decode::{ChunkDecoder, Decoder, LineDecoder},
	dispatch::decode_payload,
	wire::{self, ResponseHead}
};

const READ_BUFFER_LEN: usize = 8 * 1024;

pub(crate) trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// A live streaming connection to one room.
///
/// The response body is decoded as chunked or line-delimited depending on the `Transfer-Encoding` the server answered
/// with; this is decided once when the connection is opened.
pub struct RoomConnection {
	room: String,
	io: Box<dyn Io>,
	decoder: Box<dyn Decoder>,
	chunked: bool,
	read_buf: Box<[u8]>,
	eof: bool,
	closed: bool
}

impl RoomConnection {
	/// Connects to the room's streaming URL and reads the response head.
	///
	/// Non-2xx responses are returned as [`Error::BadStatus`] without reading any of the body.
	pub async fn open(config: &Config, room: impl Into<String>) -> Result<Self, Error> {
		let room = room.into();
		let url = config.room_url(&room)?;
		tracing::debug!(%url, "opening room stream");

		let mut io = connect(&url).await?;
		io.write_all(&wire::request(&url, config.token())?).await?;
		io.flush().await?;

		let (head, rest) = read_head(&mut io).await?;
		if !head.is_success() {
			return Err(Error::BadStatus {
				status: head.status,
				reason: head.reason
			});
		}

		let chunked = head.is_chunked();
		tracing::debug!(status = %head.status, chunked, "room stream established");
		let max_len = config.max_payload_len();
		let mut decoder: Box<dyn Decoder> = if chunked {
			Box::new(ChunkDecoder::with_max_len(max_len))
		} else {
			Box::new(LineDecoder::with_max_len(max_len))
		};
		decoder.feed(&rest);

		Ok(Self {
			room,
			io,
			decoder,
			chunked,
			read_buf: vec![0; READ_BUFFER_LEN].into_boxed_slice(),
			eof: false,
			closed: false
		})
	}

	pub fn room(&self) -> &str {
		&self.room
	}

	pub fn is_chunked(&self) -> bool {
		self.chunked
	}

	/// Waits for the next message.
	///
	/// Returns `None` once the server has closed the stream, or after a fatal error has been returned. Payloads that
	/// aren't valid JSON are returned as errors without closing the connection.
	pub async fn next_message(&mut self) -> Option<Result<OwnedValue, Error>> {
		if self.closed {
			return None;
		}
		match self.read_message().await {
			Ok(Some(message)) => Some(Ok(message)),
			Ok(None) => {
				self.closed = true;
				None
			}
			Err(e) => {
				if e.is_fatal() {
					self.closed = true;
				}
				Some(Err(e))
			}
		}
	}

	/// Converts this connection into a [`Stream`] of messages.
	pub fn into_stream(self) -> impl Stream<Item = Result<OwnedValue, Error>> + Send {
		stream::unfold(self, |mut conn| async move { conn.next_message().await.map(|item| (item, conn)) })
	}

	async fn read_message(&mut self) -> Result<Option<OwnedValue>, Error> {
		loop {
			while let Some(payload) = self.decoder.next_payload()? {
				if let Some(message) = decode_payload(payload)? {
					return Ok(Some(message));
				}
			}

			if self.eof {
				return match self.decoder.finish() {
					Some(payload) => decode_payload(payload),
					None => Ok(None)
				};
			}

			let read = self.io.read(&mut self.read_buf).await?;
			if read == 0 {
				self.eof = true;
			} else {
				self.decoder.feed(&self.read_buf[..read]);
			}
		}
	}
}

async fn connect(url: &Url) -> Result<Box<dyn Io>, Error> {
	let tls = match url.scheme() {
		"https" => true,
		"http" => false,
		scheme => return Err(Error::UnsupportedScheme(scheme.to_string()))
	};
	let host = url.host_str().ok_or_else(|| Error::MissingHost(url.to_string()))?;
	let host = host.trim_start_matches('[').trim_end_matches(']');
	let port = url.port_or_known_default().unwrap_or(if tls { 443 } else { 80 });

	let stream = TcpStream::connect((host, port)).await?;
	stream.set_nodelay(true)?;
	if tls { connect_tls(host, stream).await } else { Ok(Box::new(stream)) }
}

#[cfg(feature = "tls-native")]
async fn connect_tls(host: &str, stream: TcpStream) -> Result<Box<dyn Io>, Error> {
	let connector = tokio_native_tls::TlsConnector::from(tokio_native_tls::native_tls::TlsConnector::new()?);
	Ok(Box::new(connector.connect(host, stream).await?))
}

#[cfg(not(feature = "tls-native"))]
async fn connect_tls(host: &str, _stream: TcpStream) -> Result<Box<dyn Io>, Error> {
	Err(Error::TlsUnavailable(host.to_string()))
}

/// Reads up to the end of the response head, returning the parsed head and any body bytes that arrived with it.
async fn read_head(io: &mut Box<dyn Io>) -> Result<(ResponseHead, Vec<u8>), Error> {
	let mut buf = Vec::with_capacity(1024);
	let mut chunk = [0; 1024];
	loop {
		if let Some(end) = wire::head_end(&buf) {
			let rest = buf.split_off(end);
			return Ok((wire::parse_head(&buf)?, rest));
		}
		if buf.len() > wire::MAX_HEAD_LEN {
			return Err(Error::MalformedHead("response head too large"));
		}
		let read = io.read(&mut chunk).await?;
		if read == 0 {
			return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed before response head").into());
		}
		buf.extend_from_slice(&chunk[..read]);
	}
}
