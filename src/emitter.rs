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

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use simd_json::OwnedValue;

use crate::{Client, Error};

/// The kinds of events a [`Client`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// A message was received from a room.
	Stream,
	/// A room's connection failed, or a payload could not be decoded.
	Error
}

impl EventKind {
	pub fn name(&self) -> &'static str {
		match self {
			EventKind::Stream => "stream",
			EventKind::Error => "error"
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for EventKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"stream" => Ok(EventKind::Stream),
			"error" => Ok(EventKind::Error),
			_ => Err(Error::UnknownEvent(s.to_string()))
		}
	}
}

#[derive(Debug)]
pub enum Event<'a> {
	Stream { room: &'a str, message: &'a OwnedValue },
	Error { room: &'a str, error: &'a Error }
}

impl<'a> Event<'a> {
	pub fn kind(&self) -> EventKind {
		match self {
			Event::Stream { .. } => EventKind::Stream,
			Event::Error { .. } => EventKind::Error
		}
	}

	/// The ID of the room this event originated from.
	pub fn room(&self) -> &'a str {
		match self {
			Event::Stream { room, .. } | Event::Error { room, .. } => room
		}
	}
}

/// A registered event callback. [`Emitter::on`] hands back the same `Arc` it stored, so listeners can be identified
/// with [`Arc::ptr_eq`].
pub type Listener = Arc<dyn Fn(&Client, &Event<'_>) + Send + Sync>;

/// Maps each event kind to its listeners, kept in registration order.
#[derive(Default)]
pub struct Emitter {
	listeners: HashMap<EventKind, Vec<Listener>>
}

impl Emitter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn on<F>(&mut self, kind: EventKind, callback: F) -> Listener
	where
		F: Fn(&Client, &Event<'_>) + Send + Sync + 'static
	{
		let listener: Listener = Arc::new(callback);
		self.listeners.entry(kind).or_default().push(Arc::clone(&listener));
		listener
	}

	/// Calls every listener registered for the event's kind, in registration order. Panics raised by a listener are
	/// not caught.
	pub fn emit(&self, client: &Client, event: &Event<'_>) -> &Self {
		if let Some(listeners) = self.listeners.get(&event.kind()) {
			for listener in listeners {
				listener(client, event);
			}
		}
		self
	}

	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.listeners.get(&kind).map_or(0, Vec::len)
	}
}

impl fmt::Debug for Emitter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Emitter")
			.field("stream", &self.listener_count(EventKind::Stream))
			.field("error", &self.listener_count(EventKind::Error))
			.finish()
	}
}
