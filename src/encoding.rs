// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
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

//! Base64 armor for message blobs.
//!
//! CA tooling moves CMC messages around as base64 text files. The decoder
//! tolerates embedded whitespace (wrapped lines, trailing newlines, tabs)
//! because blobs routinely pass through editors and mail gateways; the
//! encoders produce either a single line or CRLF-wrapped lines at a caller
//! chosen width.

use base64::prelude::*;

use crate::error::Result;

/// Decode base64 data, ignoring any embedded ASCII whitespace.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    Ok(BASE64_STANDARD.decode(&cleaned)?)
}

/// Encode data as a single base64 line.
pub fn encode_base64(data: &[u8]) -> String {
    BASE64_STANDARD.encode(data)
}

/// Encode data as base64 wrapped to `line_length` characters per line.
///
/// Lines are joined with CRLF. A `line_length` of zero yields a single
/// unwrapped line.
pub fn encode_base64_wrapped(data: &[u8], line_length: usize) -> String {
    let encoded = BASE64_STANDARD.encode(data);
    if line_length == 0 {
        return encoded;
    }

    encoded
        .as_bytes()
        .chunks(line_length)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect::<Vec<_>>()
        .join("\r\n")
}
