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

//! Incremental body decoders. Bytes are fed in as they arrive off the socket and complete payloads are pulled out;
//! neither decoder performs any I/O itself.

use std::mem;

use crate::FrameError;

/// Splits a response body into payloads.
pub trait Decoder: Send {
	/// Appends bytes received from the connection.
	fn feed(&mut self, data: &[u8]);

	/// Returns the next complete payload, or `None` if more bytes are needed.
	fn next_payload(&mut self) -> Result<Option<Vec<u8>>, FrameError>;

	/// Called once the remote end has closed the stream. Returns any payload that is complete without a trailing line
	/// break.
	fn finish(&mut self) -> Option<Vec<u8>> {
		None
	}
}

/// Payloads (and pending lines) longer than this are rejected unless a decoder is built with a different limit.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// Receive buffer that remembers how far it has already been searched for a line break, so a long line arriving in
/// small reads is only scanned once.
#[derive(Debug, Default)]
struct LineBuffer {
	buf: Vec<u8>,
	scanned: usize
}

impl LineBuffer {
	fn extend(&mut self, data: &[u8]) {
		self.buf.extend_from_slice(data);
	}

	/// Takes one `\n`-terminated line off the front, without the line break and an optional preceding `\r`.
	fn take_line(&mut self, max_len: usize) -> Result<Option<Vec<u8>>, FrameError> {
		let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') else {
			self.scanned = self.buf.len();
			if self.buf.len() > max_len {
				return Err(FrameError::LineTooLong(max_len));
			}
			return Ok(None);
		};
		let end = self.scanned + offset;
		self.scanned = 0;
		let mut line: Vec<u8> = self.buf.drain(..=end).collect();
		line.pop();
		if line.last() == Some(&b'\r') {
			line.pop();
		}
		if line.len() > max_len {
			return Err(FrameError::LineTooLong(max_len));
		}
		Ok(Some(line))
	}

	/// Takes exactly `len` bytes off the front, if that many have arrived.
	fn take(&mut self, len: usize) -> Option<Vec<u8>> {
		if self.buf.len() < len {
			return None;
		}
		self.scanned = 0;
		Some(self.buf.drain(..len).collect())
	}

	fn clear(&mut self) {
		self.buf.clear();
		self.scanned = 0;
	}

	fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	fn take_all(&mut self) -> Vec<u8> {
		self.scanned = 0;
		mem::take(&mut self.buf)
	}
}

/// Forwards each line of a plain (non-chunked) body as one payload.
#[derive(Debug)]
pub struct LineDecoder {
	buf: LineBuffer,
	max_len: usize
}

impl Default for LineDecoder {
	fn default() -> Self {
		Self::with_max_len(DEFAULT_MAX_PAYLOAD_LEN)
	}
}

impl LineDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_len(max_len: usize) -> Self {
		Self { buf: LineBuffer::default(), max_len }
	}
}

impl Decoder for LineDecoder {
	fn feed(&mut self, data: &[u8]) {
		self.buf.extend(data);
	}

	fn next_payload(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
		let line = self.buf.take_line(self.max_len);
		if line.is_err() {
			self.buf.clear();
		}
		line
	}

	fn finish(&mut self) -> Option<Vec<u8>> {
		if self.buf.is_empty() { None } else { Some(self.buf.take_all()) }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunkState {
	ChunkSize,
	ChunkBody(usize),
	Terminator(Vec<u8>),
	Failed(FrameError)
}

/// Decodes an HTTP `Transfer-Encoding: chunked` body, yielding each chunk's data as one payload.
///
/// Every chunk is `<hex length>[extensions]\r\n<data>\r\n`. A chunk's data is handed out once the line following it
/// has arrived; if that line is not empty the data is still handed out, and the *next* call reports the framing
/// violation. Once a violation has been reported the decoder stays failed.
///
/// Zero-length chunks are not treated as the end of the body.
#[derive(Debug)]
pub struct ChunkDecoder {
	buf: LineBuffer,
	state: ChunkState,
	max_len: usize
}

impl Default for ChunkDecoder {
	fn default() -> Self {
		Self::with_max_len(DEFAULT_MAX_PAYLOAD_LEN)
	}
}

impl ChunkDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Rejects chunks larger than `max_len` bytes as soon as their size line is read.
	pub fn with_max_len(max_len: usize) -> Self {
		Self {
			buf: LineBuffer::default(),
			state: ChunkState::ChunkSize,
			max_len
		}
	}

	fn parse_size(line: &[u8]) -> Result<usize, FrameError> {
		let digits = line.iter().take_while(|b| b.is_ascii_hexdigit()).count();
		if digits == 0 {
			return Err(FrameError::InvalidChunkSize(String::from_utf8_lossy(line).into_owned()));
		}
		// only hex digits were taken, so the slice is valid ASCII
		let hex = std::str::from_utf8(&line[..digits]).unwrap_or_default();
		usize::from_str_radix(hex, 16).map_err(|_| FrameError::ChunkSizeOverflow(hex.to_string()))
	}

	fn fail(&mut self, error: FrameError) -> FrameError {
		self.state = ChunkState::Failed(error.clone());
		self.buf.clear();
		error
	}
}

impl Decoder for ChunkDecoder {
	fn feed(&mut self, data: &[u8]) {
		if !matches!(self.state, ChunkState::Failed(_)) {
			self.buf.extend(data);
		}
	}

	fn next_payload(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
		loop {
			match &mut self.state {
				ChunkState::Failed(e) => return Err(e.clone()),
				ChunkState::ChunkSize => {
					let line = match self.buf.take_line(self.max_len) {
						Ok(Some(line)) => line,
						Ok(None) => return Ok(None),
						Err(e) => return Err(self.fail(e))
					};
					match Self::parse_size(&line) {
						Ok(len) if len > self.max_len => {
							let max = self.max_len;
							return Err(self.fail(FrameError::ChunkTooLarge { len, max }));
						}
						Ok(len) => self.state = ChunkState::ChunkBody(len),
						Err(e) => return Err(self.fail(e))
					}
				}
				ChunkState::ChunkBody(len) => {
					let Some(body) = self.buf.take(*len) else {
						return Ok(None);
					};
					self.state = ChunkState::Terminator(body);
				}
				ChunkState::Terminator(body) => {
					let line = match self.buf.take_line(self.max_len) {
						Ok(Some(line)) => line,
						Ok(None) => return Ok(None),
						Err(e) => return Err(self.fail(e))
					};
					let body = mem::take(body);
					if line.is_empty() {
						self.state = ChunkState::ChunkSize;
					} else {
						self.fail(FrameError::MissingTerminator(String::from_utf8_lossy(&line).into_owned()));
					}
					return Ok(Some(body));
				}
			}
		}
	}
}
