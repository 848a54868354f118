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

//! Construction of individual CMC control attributes.
//!
//! Each method on [`ControlAttributeBuilder`] produces one `TaggedAttribute`
//! for the PKIData control sequence, drawing its body part ID from the shared
//! allocator. Identity-binding controls (transaction ID, identity proof) take
//! the request sequence as input and must only be built after that sequence
//! is frozen.

use std::time::{SystemTime, UNIX_EPOCH};

use der::asn1::{Any, OctetString, Uint};
use der::Encode;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::encoding::encode_base64;
use crate::error::{CmcError, Result};
use crate::request::BodyPartIdAllocator;
use crate::token::{hmac_sha1, DigestAlgorithm};
use crate::types::cmc::{TaggedAttribute, TaggedRequest};
use crate::types::controls::{CmcCertId, GetCert, LraPopWitness, RevokeRequest};
use crate::types::oid;

/// Witness seed shared with CA-side proof-of-possession link verifiers.
///
/// The value is a fixed table, not per-invocation randomness: verifiers
/// recompute HMAC-SHA1 over these exact bytes, so the table is part of the
/// wire contract and must never be regenerated.
pub const POP_LINK_WITNESS_SEED: [u8; 64] = [
    0x28, 0xb2, 0x3c, 0x41, 0x97, 0x0e, 0x65, 0xd5, 0x5e, 0x01, 0x8a, 0xf3, 0x4c, 0xc9, 0x76,
    0x12, 0xa0, 0x5b, 0xee, 0x39, 0xc4, 0x8d, 0x21, 0xfa, 0x07, 0x63, 0xb8, 0x2f, 0xd1, 0x44,
    0x9a, 0xe6, 0x15, 0xc0, 0x7b, 0x52, 0xf8, 0x0d, 0xa6, 0x31, 0x99, 0x4e, 0xe2, 0x67, 0x1c,
    0xb5, 0x80, 0x2b, 0xd8, 0x43, 0x36, 0xcd, 0x58, 0xef, 0x0a, 0x71, 0xbc, 0x26, 0x93, 0x5f,
    0xc2, 0x19, 0xe4, 0x8f,
];

/// Builds CMC control attributes against a shared body part ID allocator.
///
/// The builder is intentionally stateless beyond the allocator borrow; every
/// method allocates exactly one ID and returns one finished attribute.
pub struct ControlAttributeBuilder<'a> {
    ids: &'a mut BodyPartIdAllocator,
}

impl<'a> ControlAttributeBuilder<'a> {
    /// Bind a control builder to an allocator.
    pub fn new(ids: &'a mut BodyPartIdAllocator) -> Self {
        Self { ids }
    }

    /// Build a `transactionId` control.
    ///
    /// When `explicit` is given its bytes become the INTEGER value directly.
    /// Otherwise the ID is the MD5 digest of the first request's raw subject
    /// public key bits, so retried submissions of the same key produce the
    /// same transaction ID. A request sequence without extractable key
    /// material falls back to a digest of a timestamp salt; such IDs are
    /// unique but not reproducible.
    pub fn transaction_id(
        &mut self,
        explicit: Option<&[u8]>,
        requests: &[TaggedRequest],
    ) -> Result<TaggedAttribute> {
        let digest = match explicit {
            Some(bytes) => {
                if bytes.is_empty() {
                    return Err(CmcError::config("explicit transaction ID is empty"));
                }
                bytes.to_vec()
            }
            None => {
                let material =
                    first_public_key_bytes(requests).unwrap_or_else(timestamp_salt);
                DigestAlgorithm::Md5.digest(&material)
            }
        };
        let value = Any::encode_from(&Uint::new(&digest)?)?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::TRANSACTION_ID, value)
    }

    /// Build a `senderNonce` control.
    ///
    /// A missing nonce is generated from a SHA-1 digest of a timestamp salt,
    /// carried base64-encoded the way existing responders expect to echo it
    /// back in `recipientNonce`.
    pub fn sender_nonce(&mut self, nonce: Option<&[u8]>) -> Result<TaggedAttribute> {
        let bytes = match nonce {
            Some(bytes) => {
                if bytes.is_empty() {
                    return Err(CmcError::config("explicit sender nonce is empty"));
                }
                bytes.to_vec()
            }
            None => {
                let digest = DigestAlgorithm::Sha1.digest(&timestamp_salt());
                encode_base64(&digest).into_bytes()
            }
        };
        let value = Any::encode_from(&OctetString::new(bytes)?)?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::SENDER_NONCE, value)
    }

    /// Build a `dataReturn` control carrying opaque client state.
    pub fn data_return(&mut self, data: &[u8]) -> Result<TaggedAttribute> {
        if data.is_empty() {
            return Err(CmcError::config("dataReturn control payload is empty"));
        }
        let value = Any::encode_from(&OctetString::new(data)?)?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::DATA_RETURN, value)
    }

    /// Build a `getCert` control asking the server to return one certificate.
    pub fn get_cert(
        &mut self,
        issuer: Name,
        serial_number: SerialNumber,
    ) -> Result<TaggedAttribute> {
        let value = Any::encode_from(&GetCert::new(issuer, serial_number))?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::GET_CERT, value)
    }

    /// Build a `confirmCertAcceptance` control acknowledging an issued
    /// certificate.
    pub fn confirm_cert_acceptance(
        &mut self,
        issuer: Name,
        serial_number: SerialNumber,
    ) -> Result<TaggedAttribute> {
        let value = Any::encode_from(&CmcCertId::new(issuer, serial_number))?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::CONFIRM_CERT_ACCEPTANCE, value)
    }

    /// Build a `revokeRequest` control from an already-validated request.
    pub fn revoke_request(&mut self, request: &RevokeRequest) -> Result<TaggedAttribute> {
        let value = Any::encode_from(request)?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::REVOKE_REQUEST, value)
    }

    /// Build an `identityProof` control over the frozen request sequence.
    ///
    /// The witness is HMAC-SHA1 keyed with SHA1(sharedSecret) over the DER
    /// encoding of the entire request sequence, binding the proof to those
    /// specific certification requests rather than to the whole message.
    pub fn identity_proof(
        &mut self,
        shared_secret: &str,
        requests: &[TaggedRequest],
    ) -> Result<TaggedAttribute> {
        let key = DigestAlgorithm::Sha1.digest(shared_secret.as_bytes());
        let sequence = requests.to_vec().to_der()?;
        let witness = hmac_sha1(&key, &sequence)?;
        let value = Any::encode_from(&OctetString::new(witness)?)?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::IDENTITY_PROOF, value)
    }

    /// Build a `popLinkWitness` control from the shared seed table.
    pub fn pop_link_witness(&mut self, shared_secret: &str) -> Result<TaggedAttribute> {
        let key = DigestAlgorithm::Sha1.digest(shared_secret.as_bytes());
        let witness = hmac_sha1(&key, &POP_LINK_WITNESS_SEED)?;
        let value = Any::encode_from(&OctetString::new(witness)?)?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::POP_LINK_WITNESS, value)
    }

    /// Build an `lraPopWitness` control from a whitespace-separated list of
    /// body part IDs whose proof-of-possession the RA vouches for.
    pub fn lra_pop_witness(&mut self, body_id_list: &str) -> Result<TaggedAttribute> {
        let body_ids = parse_body_id_list(body_id_list)?;
        let value = Any::encode_from(&LraPopWitness {
            pki_data_body_id: 0,
            body_ids,
        })?;
        TaggedAttribute::new(self.ids.next(), oid::cmc::LRA_POP_WITNESS, value)
    }
}

/// Parse a whitespace-separated body part ID list such as `"1 2 5"`.
pub(crate) fn parse_body_id_list(list: &str) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for token in list.split_whitespace() {
        let id = token.parse::<u32>().map_err(|_| {
            CmcError::config(format!("invalid body part ID in witness list: {token:?}"))
        })?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(CmcError::config("LRA POP witness requires at least one body part ID"));
    }
    Ok(ids)
}

/// Raw subject-public-key bits of the first request, for transaction ID
/// derivation.
fn first_public_key_bytes(requests: &[TaggedRequest]) -> Option<Vec<u8>> {
    match requests.first()? {
        TaggedRequest::Tcr(tcr) => Some(
            tcr.certification_request
                .info
                .public_key
                .subject_public_key
                .raw_bytes()
                .to_vec(),
        ),
        TaggedRequest::Crm(message) => message
            .public_key_bits()
            .map(|bits| bits.raw_bytes().to_vec()),
    }
}

/// Seconds-and-nanos salt for derived transaction IDs and nonces.
fn timestamp_salt() -> Vec<u8> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:09}", now.as_secs(), now.subsec_nanos()).into_bytes()
}
