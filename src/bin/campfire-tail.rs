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

//! Prints every message from the given rooms to stdout, one JSON document per line.
//!
//! ```sh
//! CAMPFIRE_TOKEN=605b32dd campfire-tail 1234 5678
//! ```

use std::{env::args, io, process::ExitCode};

use campfire_stream::{Client, Config, Event, EventKind};
use simd_json::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(io::stderr)
		.init();

	let rooms: Vec<String> = args().skip(1).collect();
	let config = match Config::from_env() {
		Ok(config) if rooms.is_empty() => config,
		Ok(config) => config.with_rooms(rooms),
		Err(e) => {
			eprintln!("campfire-tail: {e}");
			return ExitCode::FAILURE;
		}
	};
	let mut client = match Client::new(config) {
		Ok(client) => client,
		Err(e) => {
			eprintln!("campfire-tail: {e}");
			return ExitCode::FAILURE;
		}
	};

	client.on(EventKind::Stream, |_, event| {
		if let Event::Stream { room, message } = event {
			println!("{room}\t{}", message.encode());
		}
	});
	client.on(EventKind::Error, |_, event| {
		if let Event::Error { room, error } = event {
			eprintln!("room {room}: {error}");
		}
	});

	client.start().join().await;
	ExitCode::SUCCESS
}
