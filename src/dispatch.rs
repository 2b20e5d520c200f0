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

use simd_json::OwnedValue;

use crate::Error;

/// Decodes one payload as JSON. Payloads that are empty or consist only of whitespace (keep-alives, zero-length
/// chunks) decode to `None`.
pub fn decode_payload(mut payload: Vec<u8>) -> Result<Option<OwnedValue>, Error> {
	if payload.iter().all(u8::is_ascii_whitespace) {
		return Ok(None);
	}
	Ok(Some(simd_json::to_owned_value(&mut payload)?))
}
