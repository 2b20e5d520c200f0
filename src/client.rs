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

use std::{panic, sync::Arc};

use futures_util::{StreamExt, pin_mut};
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::{
	Config, ConfigError, Error, RoomConnection,
	emitter::{Emitter, Event, EventKind, Listener}
};

/// Streams messages from a set of rooms to registered listeners.
///
/// Listeners are registered before the client is started; once [`Client::start`] is called every room is connected
/// concurrently and independently. A room whose connection fails emits one `error` event and is not retried, leaving
/// the other rooms untouched.
///
/// ```no_run
/// use campfire_stream::{Client, Config, Event, EventKind};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let mut client = Client::new(Config::new("605b32dd", ["1234"]))?;
/// client.on(EventKind::Stream, |_, event| {
/// 	if let Event::Stream { room, message } = event {
/// 		println!("{room}: {message:?}");
/// 	}
/// });
/// client.start().join().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client {
	config: Config,
	emitter: Emitter
}

impl Client {
	pub fn new(config: Config) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self { config, emitter: Emitter::new() })
	}

	/// Creates a client from `CAMPFIRE_*` environment variables; see [`Config::from_env`].
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::new(Config::from_env()?)
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Registers a listener, returning it.
	pub fn on<F>(&mut self, kind: EventKind, callback: F) -> Listener
	where
		F: Fn(&Client, &Event<'_>) + Send + Sync + 'static
	{
		self.emitter.on(kind, callback)
	}

	/// Registers a listener by event name (`"stream"` or `"error"`).
	pub fn on_named<F>(&mut self, name: &str, callback: F) -> Result<Listener, Error>
	where
		F: Fn(&Client, &Event<'_>) + Send + Sync + 'static
	{
		Ok(self.on(name.parse()?, callback))
	}

	/// Synchronously invokes the listeners for `event`.
	pub fn emit(&self, event: &Event<'_>) -> &Self {
		self.emitter.emit(self, event);
		self
	}

	/// Connects to every configured room, each on its own task.
	///
	/// # Panics
	/// Panics if called outside of a Tokio runtime.
	pub fn start(self) -> Streams {
		let client = Arc::new(self);
		let mut tasks = JoinSet::new();
		for room in client.config.rooms() {
			let span = tracing::info_span!("room", room = %room);
			tasks.spawn(run_room(Arc::clone(&client), room.clone()).instrument(span));
		}
		Streams { client, tasks }
	}
}

async fn run_room(client: Arc<Client>, room: String) {
	let connection = match RoomConnection::open(&client.config, room.as_str()).await {
		Ok(connection) => connection,
		Err(error) => {
			tracing::warn!(%error, "failed to open room stream");
			client.emit(&Event::Error { room: &room, error: &error });
			return;
		}
	};

	let messages = connection.into_stream();
	pin_mut!(messages);
	while let Some(item) = messages.next().await {
		match item {
			Ok(message) => {
				client.emit(&Event::Stream { room: &room, message: &message });
			}
			Err(error) => {
				tracing::warn!(%error, fatal = error.is_fatal(), "room stream error");
				client.emit(&Event::Error { room: &room, error: &error });
			}
		}
	}
	tracing::debug!("room stream closed");
}

/// Handle to the room tasks of a started [`Client`].
#[derive(Debug)]
pub struct Streams {
	client: Arc<Client>,
	tasks: JoinSet<()>
}

impl Streams {
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// The number of room tasks that have not been joined yet.
	pub fn len(&self) -> usize {
		self.tasks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}

	/// Waits for every room's stream to end.
	///
	/// If a listener panicked, the panic is resumed here once the room task it ran on has been joined.
	pub async fn join(mut self) {
		while let Some(result) = self.tasks.join_next().await {
			if let Err(e) = result {
				if e.is_panic() {
					panic::resume_unwind(e.into_panic());
				}
			}
		}
	}

	/// Disconnects every room.
	pub fn abort(&mut self) {
		self.tasks.abort_all();
	}
}
