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

//! Revocation request assembly.
//!
//! A revocation is authenticated in one of two mutually exclusive ways:
//!
//! * **Shared secret**: the enrollment secret rides inside the
//!   `revokeRequest` control as its passphrase ([`RevocationRequestBuilder::build`]).
//! * **Subject signature**: no secret exists, so a second copy of the
//!   control is wrapped in its own CMS blob signed by the certificate being
//!   revoked (not the requester) and nested as an other-message
//!   ([`RevocationRequestBuilder::build_signed_by_subject`]). That inner
//!   envelope uses the SHA-256 digest path.
//!
//! Either way the result is a `PKIData` the caller signs and submits like
//! any other CMC message.

use der::asn1::{Any, GeneralizedTime, OctetString};
use x509_cert::ext::pkix::CrlReason;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::envelope;
use crate::error::{CmcError, Result};
use crate::request::{BodyPartIdAllocator, ControlAttributeBuilder};
use crate::token::{CertificateStore, MessageSigner};
use crate::types::cmc::{OtherMsg, PkiData};
use crate::types::controls::{parse_crl_reason, RevokeRequest};
use crate::types::oid;

/// Builds the `PKIData` for revoking one certificate.
#[derive(Clone, Debug)]
pub struct RevocationRequestBuilder {
    issuer: Name,
    serial_number: SerialNumber,
    reason: CrlReason,
    invalidity_date: Option<GeneralizedTime>,
    shared_secret: Option<String>,
    comment: Option<String>,
}

impl RevocationRequestBuilder {
    /// Revoke the certificate with this issuer and serial for `reason`.
    pub fn new(issuer: Name, serial_number: SerialNumber, reason: CrlReason) -> Self {
        Self {
            issuer,
            serial_number,
            reason,
            invalidity_date: None,
            shared_secret: None,
            comment: None,
        }
    }

    /// Like [`new`](Self::new), with the reason given as its config-file
    /// token (`"keyCompromise"`, `"certificateHold"`, ...).
    pub fn with_reason_token(
        issuer: Name,
        serial_number: SerialNumber,
        token: &str,
    ) -> Result<Self> {
        Ok(Self::new(issuer, serial_number, parse_crl_reason(token)?))
    }

    /// When the key is believed to have become invalid.
    pub fn invalidity_date(mut self, at: GeneralizedTime) -> Self {
        self.invalidity_date = Some(at);
        self
    }

    /// Authenticate with the enrollment shared secret.
    pub fn shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }

    /// Free-text comment recorded with the revocation.
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }

    /// Assemble a secret-authenticated revocation.
    ///
    /// Fails with a configuration error when no shared secret is set; such
    /// deployments must use [`build_signed_by_subject`](Self::build_signed_by_subject)
    /// instead.
    pub fn build(self) -> Result<PkiData> {
        let secret = match self.shared_secret.as_deref() {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(CmcError::config(
                    "revocation without a shared secret must be signed by the subject certificate",
                ))
            }
        };
        let request = self.revoke_request(Some(secret))?;

        let mut ids = BodyPartIdAllocator::new();
        let mut controls = ControlAttributeBuilder::new(&mut ids);
        let mut pki_data = PkiData::new();
        pki_data
            .control_sequence
            .push(controls.revoke_request(&request)?);
        Ok(pki_data)
    }

    /// Assemble a revocation authenticated by the subject certificate.
    ///
    /// `subject_nickname` must resolve, in `store`, to the certificate being
    /// revoked; its key signs the nested blob. The outer message repeats the
    /// control so servers that ignore other-messages still see the request.
    pub fn build_signed_by_subject<S, C>(
        self,
        signer: &S,
        store: &C,
        subject_nickname: &str,
    ) -> Result<PkiData>
    where
        S: MessageSigner + ?Sized,
        C: CertificateStore + ?Sized,
    {
        if matches!(self.shared_secret.as_deref(), Some(secret) if !secret.is_empty()) {
            return Err(CmcError::config(
                "shared secret and subject signature are alternative revocation modes; configure one",
            ));
        }
        let request = self.revoke_request(None)?;

        let mut inner_ids = BodyPartIdAllocator::new();
        let mut inner_controls = ControlAttributeBuilder::new(&mut inner_ids);
        let mut inner = PkiData::new();
        inner
            .control_sequence
            .push(inner_controls.revoke_request(&request)?);
        let blob = envelope::sign_revocation_request(&inner, signer, store, subject_nickname)?;
        tracing::debug!(
            "nested subject-signed revocation blob for serial {}",
            request.serial_number
        );

        let mut ids = BodyPartIdAllocator::new();
        let mut controls = ControlAttributeBuilder::new(&mut ids);
        let mut pki_data = PkiData::new();
        pki_data
            .control_sequence
            .push(controls.revoke_request(&request)?);
        pki_data.other_msg_sequence.push(OtherMsg {
            body_part_id: ids.next(),
            other_msg_type: oid::content::ID_SIGNED_DATA,
            other_msg_value: Any::encode_from(blob.content_info())?,
        });
        Ok(pki_data)
    }

    /// The control body, with or without the passphrase.
    fn revoke_request(&self, passphrase: Option<&str>) -> Result<RevokeRequest> {
        let passphrase = match passphrase {
            Some(secret) => Some(OctetString::new(secret.as_bytes())?),
            None => None,
        };
        Ok(RevokeRequest {
            issuer_name: self.issuer.clone(),
            serial_number: self.serial_number.clone(),
            reason: self.reason,
            invalidity_date: self.invalidity_date,
            passphrase,
            comment: self.comment.clone(),
        })
    }
}
