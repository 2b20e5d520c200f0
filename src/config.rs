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

use std::env;

use url::Url;

use crate::{ConfigError, decode::DEFAULT_MAX_PAYLOAD_LEN};

pub const DEFAULT_HOST: &str = "campfirenow.com";

pub const TOKEN_VAR: &str = "CAMPFIRE_TOKEN";
pub const ROOMS_VAR: &str = "CAMPFIRE_ROOMS";
pub const HOST_VAR: &str = "CAMPFIRE_HOST";
pub const ENDPOINT_VAR: &str = "CAMPFIRE_ENDPOINT";

/// Connection settings for a [`Client`](crate::Client).
///
/// ```
/// use campfire_stream::Config;
///
/// let config = Config::new("605b32dd", ["1234", "5678"]);
/// assert_eq!(config.room_url("1234").unwrap().as_str(), "https://streaming.campfirenow.com/room/1234/live.json");
/// ```
#[derive(Clone, Debug)]
pub struct Config {
	pub(crate) token: String,
	pub(crate) rooms: Vec<String>,
	pub(crate) host: String,
	pub(crate) endpoint: Option<Url>,
	pub(crate) max_payload_len: usize
}

impl Config {
	pub fn new<R: Into<String>>(token: impl Into<String>, rooms: impl IntoIterator<Item = R>) -> Self {
		Self {
			token: token.into(),
			rooms: rooms.into_iter().map(Into::into).collect(),
			host: DEFAULT_HOST.to_string(),
			endpoint: None,
			max_payload_len: DEFAULT_MAX_PAYLOAD_LEN
		}
	}

	/// Reads `CAMPFIRE_TOKEN`, `CAMPFIRE_ROOMS` (separated by commas or whitespace), `CAMPFIRE_HOST` and
	/// `CAMPFIRE_ENDPOINT` from the environment. Missing values are left empty; call [`Config::validate`] before use.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut config = Config::new(env::var(TOKEN_VAR).unwrap_or_default(), parse_rooms(&env::var(ROOMS_VAR).unwrap_or_default()));
		if let Some(host) = env::var(HOST_VAR).ok().filter(|h| !h.trim().is_empty()) {
			config = config.with_host(host.trim());
		}
		if let Some(endpoint) = env::var(ENDPOINT_VAR).ok().filter(|e| !e.trim().is_empty()) {
			config = config.with_endpoint(Url::parse(endpoint.trim())?);
		}
		Ok(config)
	}

	/// Sets the service host; rooms are streamed from `https://streaming.<host>`.
	pub fn with_host(mut self, host: impl Into<String>) -> Self {
		self.host = host.into();
		self
	}

	/// Streams rooms from `<endpoint>/room/<id>/live.json` instead of the service host. `http` endpoints are
	/// connected to without TLS.
	pub fn with_endpoint(mut self, endpoint: Url) -> Self {
		self.endpoint = Some(endpoint);
		self
	}

	/// Ends a room with a framing error when a single chunk or line would exceed `max_len` bytes.
	pub fn with_max_payload_len(mut self, max_len: usize) -> Self {
		self.max_payload_len = max_len;
		self
	}

	pub fn with_rooms<R: Into<String>>(mut self, rooms: impl IntoIterator<Item = R>) -> Self {
		self.rooms = rooms.into_iter().map(Into::into).collect();
		self
	}

	pub fn token(&self) -> &str {
		&self.token
	}

	pub fn rooms(&self) -> &[String] {
		&self.rooms
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn max_payload_len(&self) -> usize {
		self.max_payload_len
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.token.trim().is_empty() {
			return Err(ConfigError::MissingToken);
		}
		if self.rooms.is_empty() {
			return Err(ConfigError::NoRooms);
		}
		if let Some(room) = self.rooms.iter().find(|r| r.is_empty() || !r.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')) {
			return Err(ConfigError::InvalidRoom(room.clone()));
		}
		if self.endpoint.is_none() && (self.host.is_empty() || self.host.contains(&['/', ':', ' '][..])) {
			return Err(ConfigError::InvalidHost(self.host.clone()));
		}
		Ok(())
	}

	/// The live streaming URL of a room.
	pub fn room_url(&self, room: &str) -> Result<Url, ConfigError> {
		let base = match &self.endpoint {
			Some(endpoint) => endpoint.as_str().trim_end_matches('/').to_string(),
			None => format!("https://streaming.{}", self.host())
		};
		Ok(Url::parse(&format!("{base}/room/{room}/live.json"))?)
	}
}

fn parse_rooms(value: &str) -> Vec<String> {
	value
		.split(|c: char| c == ',' || c.is_whitespace())
		.filter(|r| !r.is_empty())
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_streaming_urls() {
		let config = Config::new("token", ["42"]).with_host("example.com");
		assert_eq!(config.host(), "example.com");
		assert_eq!(config.room_url("42").unwrap().as_str(), "https://streaming.example.com/room/42/live.json");

		let config = config.with_endpoint(Url::parse("http://127.0.0.1:8080/").unwrap());
		assert_eq!(config.room_url("42").unwrap().as_str(), "http://127.0.0.1:8080/room/42/live.json");
	}

	#[test]
	fn rejects_missing_token_and_rooms() {
		assert!(matches!(Config::new("", ["1"]).validate(), Err(ConfigError::MissingToken)));
		assert!(matches!(Config::new("token", Vec::<String>::new()).validate(), Err(ConfigError::NoRooms)));
		assert!(matches!(Config::new("token", ["../1"]).validate(), Err(ConfigError::InvalidRoom(_))));
		assert!(Config::new("token", ["1", "2"]).validate().is_ok());
	}

	#[test]
	fn room_lists_accept_commas_and_spaces() {
		assert_eq!(parse_rooms("1, 2 ,3\n4"), vec!["1", "2", "3", "4"]);
		assert!(parse_rooms("  ").is_empty());
	}
}
