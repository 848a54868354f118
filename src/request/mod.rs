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

//! CMC request assembly.
//!
//! [`CmcRequestBuilder`] composes a `PKIData` from certification requests
//! (PKCS#10 or CRMF) plus any enabled control attributes, allocating body
//! part IDs from one shared [`BodyPartIdAllocator`]. Controls are emitted in
//! a fixed order; the identity-binding controls (transaction ID, identity
//! proof) are always computed last, against the frozen request sequence.
//!
//! The builder validates its configuration before any assembly starts, so a
//! missing shared secret or malformed witness list is reported as a
//! configuration error rather than surfacing halfway through encoding.
//!
//! # Example
//!
//! ```no_run
//! use cmc_toolkit::request::CmcRequestBuilder;
//! # fn load_csr() -> x509_cert::request::CertReq { unimplemented!() }
//!
//! let pki_data = CmcRequestBuilder::new()
//!     .add_pkcs10_request(load_csr())
//!     .derived_transaction_id()
//!     .generated_sender_nonce()
//!     .shared_secret("correct horse battery staple")
//!     .identity_proof()
//!     .build()?;
//! # Ok::<(), cmc_toolkit::CmcError>(())
//! ```

mod controls;
mod revocation;

pub use controls::{ControlAttributeBuilder, POP_LINK_WITNESS_SEED};
pub use revocation::RevocationRequestBuilder;

use const_oid::ObjectIdentifier;
use der::asn1::Any;
use x509_cert::name::Name;
use x509_cert::request::CertReq;
use x509_cert::serial_number::SerialNumber;

use crate::error::{CmcError, Result};
use crate::types::cmc::{
    BodyPartId, OtherMsg, PkiData, TaggedCertificationRequest, TaggedRequest,
};
use crate::types::crmf::CertReqMsg;

/// Hands out the monotonically increasing body part IDs for one message.
///
/// A fresh allocator starts at 1. Nested assemblies (such as a revocation
/// blob embedded in an outer message) resume from the outer allocator's
/// [`current`](Self::current) value so IDs stay unique across the whole
/// message.
#[derive(Clone, Debug)]
pub struct BodyPartIdAllocator {
    next: BodyPartId,
}

impl BodyPartIdAllocator {
    /// Allocator for a new message, starting at ID 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Allocator resuming an existing sequence.
    pub fn starting_at(first: BodyPartId) -> Self {
        Self { next: first }
    }

    /// Allocate the next ID.
    pub fn next(&mut self) -> BodyPartId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The ID the next call to [`next`](Self::next) will return.
    pub fn current(&self) -> BodyPartId {
        self.next
    }
}

impl Default for BodyPartIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Where an overridable control value comes from.
#[derive(Clone, Debug)]
enum ValueSource {
    /// Control disabled.
    Off,
    /// Control enabled with a derived value.
    Generated,
    /// Control enabled with caller-supplied bytes.
    Explicit(Vec<u8>),
}

/// A certification request queued for the request sequence.
#[derive(Clone, Debug)]
enum RequestEntry {
    Pkcs10(CertReq),
    Crmf(CertReqMsg),
}

/// Composes a `PKIData` from certification requests and enabled controls.
///
/// PKCS#10 requests receive allocated body part IDs; CRMF requests carry
/// their own `certReqId` and do not draw from the allocator.
#[derive(Clone, Debug)]
pub struct CmcRequestBuilder {
    start_id: BodyPartId,
    requests: Vec<RequestEntry>,
    confirm_cert_acceptance: Option<(Name, SerialNumber)>,
    lra_pop_witness: Option<String>,
    get_cert: Option<(Name, SerialNumber)>,
    data_return: Option<Vec<u8>>,
    sender_nonce: ValueSource,
    pop_link_witness: bool,
    transaction_id: ValueSource,
    identity_proof: bool,
    shared_secret: Option<String>,
    other_msgs: Vec<(ObjectIdentifier, Any)>,
}

impl CmcRequestBuilder {
    /// An empty builder with no requests and every control disabled.
    pub fn new() -> Self {
        Self {
            start_id: 1,
            requests: Vec::new(),
            confirm_cert_acceptance: None,
            lra_pop_witness: None,
            get_cert: None,
            data_return: None,
            sender_nonce: ValueSource::Off,
            pop_link_witness: false,
            transaction_id: ValueSource::Off,
            identity_proof: false,
            shared_secret: None,
            other_msgs: Vec::new(),
        }
    }

    /// Resume body part ID allocation from `id` instead of 1.
    pub fn starting_body_part_id(mut self, id: BodyPartId) -> Self {
        self.start_id = id;
        self
    }

    /// Queue a PKCS#10 certification request.
    pub fn add_pkcs10_request(mut self, request: CertReq) -> Self {
        self.requests.push(RequestEntry::Pkcs10(request));
        self
    }

    /// Queue a CRMF certification request message.
    pub fn add_crmf_request(mut self, message: CertReqMsg) -> Self {
        self.requests.push(RequestEntry::Crmf(message));
        self
    }

    /// Acknowledge acceptance of an issued certificate.
    pub fn confirm_cert_acceptance(mut self, issuer: Name, serial_number: SerialNumber) -> Self {
        self.confirm_cert_acceptance = Some((issuer, serial_number));
        self
    }

    /// Vouch for proof-of-possession of the listed body part IDs
    /// (whitespace-separated, e.g. `"1 2"`).
    pub fn lra_pop_witness(mut self, body_id_list: impl Into<String>) -> Self {
        self.lra_pop_witness = Some(body_id_list.into());
        self
    }

    /// Ask the server to return the certificate with this issuer and serial.
    pub fn get_cert(mut self, issuer: Name, serial_number: SerialNumber) -> Self {
        self.get_cert = Some((issuer, serial_number));
        self
    }

    /// Attach opaque client state for the server to echo back.
    pub fn data_return(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data_return = Some(data.into());
        self
    }

    /// Send this exact sender nonce.
    pub fn sender_nonce(mut self, nonce: impl Into<Vec<u8>>) -> Self {
        self.sender_nonce = ValueSource::Explicit(nonce.into());
        self
    }

    /// Send a freshly generated sender nonce.
    pub fn generated_sender_nonce(mut self) -> Self {
        self.sender_nonce = ValueSource::Generated;
        self
    }

    /// Send this exact transaction ID.
    pub fn transaction_id(mut self, id: impl Into<Vec<u8>>) -> Self {
        self.transaction_id = ValueSource::Explicit(id.into());
        self
    }

    /// Derive the transaction ID from the first request's public key.
    pub fn derived_transaction_id(mut self) -> Self {
        self.transaction_id = ValueSource::Generated;
        self
    }

    /// Include a proof-of-possession link witness. Requires a shared secret.
    pub fn pop_link_witness(mut self) -> Self {
        self.pop_link_witness = true;
        self
    }

    /// Include an identity proof over the request sequence. Requires a
    /// shared secret.
    pub fn identity_proof(mut self) -> Self {
        self.identity_proof = true;
        self
    }

    /// Shared secret backing the identity proof and POP link witness.
    pub fn shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }

    /// Append an arbitrary other-message body part.
    pub fn add_other_msg(mut self, msg_type: ObjectIdentifier, value: Any) -> Self {
        self.other_msgs.push((msg_type, value));
        self
    }

    /// Assemble the `PKIData`.
    ///
    /// Requests are emitted first, then controls in their fixed order:
    /// confirmCertAcceptance, lraPopWitness, getCert, dataReturn,
    /// senderNonce, popLinkWitness, transactionId, identityProof. The last
    /// two digest the request sequence, so they cannot be built until it is
    /// frozen.
    pub fn build(self) -> Result<PkiData> {
        self.validate()?;

        let Self {
            start_id,
            requests,
            confirm_cert_acceptance,
            lra_pop_witness,
            get_cert,
            data_return,
            sender_nonce,
            pop_link_witness,
            transaction_id,
            identity_proof,
            shared_secret,
            other_msgs,
        } = self;

        let mut ids = BodyPartIdAllocator::starting_at(start_id);
        let mut pki_data = PkiData::new();

        for entry in requests {
            let tagged = match entry {
                RequestEntry::Pkcs10(request) => TaggedRequest::Tcr(TaggedCertificationRequest {
                    body_part_id: ids.next(),
                    certification_request: request,
                }),
                RequestEntry::Crmf(message) => TaggedRequest::Crm(message),
            };
            pki_data.req_sequence.push(tagged);
        }

        let mut controls = ControlAttributeBuilder::new(&mut ids);
        let mut control_sequence = Vec::new();

        if let Some((issuer, serial_number)) = confirm_cert_acceptance {
            control_sequence.push(controls.confirm_cert_acceptance(issuer, serial_number)?);
        }
        if let Some(list) = &lra_pop_witness {
            control_sequence.push(controls.lra_pop_witness(list)?);
        }
        if let Some((issuer, serial_number)) = get_cert {
            control_sequence.push(controls.get_cert(issuer, serial_number)?);
        }
        if let Some(data) = &data_return {
            control_sequence.push(controls.data_return(data)?);
        }
        match &sender_nonce {
            ValueSource::Off => {}
            ValueSource::Generated => control_sequence.push(controls.sender_nonce(None)?),
            ValueSource::Explicit(bytes) => {
                control_sequence.push(controls.sender_nonce(Some(bytes))?);
            }
        }
        if pop_link_witness {
            let secret = require_secret(&shared_secret, "POP link witness")?;
            control_sequence.push(controls.pop_link_witness(secret)?);
        }
        match &transaction_id {
            ValueSource::Off => {}
            ValueSource::Generated => {
                control_sequence.push(controls.transaction_id(None, &pki_data.req_sequence)?);
            }
            ValueSource::Explicit(bytes) => {
                control_sequence
                    .push(controls.transaction_id(Some(bytes), &pki_data.req_sequence)?);
            }
        }
        if identity_proof {
            let secret = require_secret(&shared_secret, "identity proof")?;
            control_sequence.push(controls.identity_proof(secret, &pki_data.req_sequence)?);
        }

        for (msg_type, value) in other_msgs {
            pki_data.other_msg_sequence.push(OtherMsg {
                body_part_id: ids.next(),
                other_msg_type: msg_type,
                other_msg_value: value,
            });
        }

        pki_data.control_sequence = control_sequence;
        Ok(pki_data)
    }

    /// Reject configurations that could not assemble, before touching any
    /// DER machinery.
    fn validate(&self) -> Result<()> {
        if let ValueSource::Explicit(bytes) = &self.transaction_id {
            if bytes.is_empty() {
                return Err(CmcError::config("explicit transaction ID is empty"));
            }
        }
        if let ValueSource::Explicit(bytes) = &self.sender_nonce {
            if bytes.is_empty() {
                return Err(CmcError::config("explicit sender nonce is empty"));
            }
        }
        if matches!(&self.data_return, Some(data) if data.is_empty()) {
            return Err(CmcError::config("dataReturn control payload is empty"));
        }
        if let Some(list) = &self.lra_pop_witness {
            controls::parse_body_id_list(list)?;
        }
        if self.identity_proof {
            require_secret(&self.shared_secret, "identity proof")?;
        }
        if self.pop_link_witness {
            require_secret(&self.shared_secret, "POP link witness")?;
        }
        Ok(())
    }
}

impl Default for CmcRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared secret, or a configuration error naming the control that
/// needed it.
fn require_secret<'a>(secret: &'a Option<String>, control: &str) -> Result<&'a str> {
    match secret.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(CmcError::config(format!(
            "{control} requires a shared secret"
        ))),
    }
}
