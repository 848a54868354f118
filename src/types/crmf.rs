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

//! CRMF certificate request messages (RFC 4211).
//!
//! Only the subset needed to carry a `CertReqMsg` inside a CMC
//! `TaggedRequest` is modeled: the request template, proof of possession,
//! and the key-archival private-key options. Requests are normally produced
//! by a separate key-generation tool and read from disk here.

use cms::enveloped_data::EnvelopedData;
use der::asn1::{BitString, Int, Null};
use der::{Choice, Enumerated, Sequence};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::attr::{Attribute, AttributeTypeAndValue};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::Extensions;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;
use x509_cert::Version;

/// `CertReqMessages` is the top-level content of a CRMF request file.
///
/// ```text
///   CertReqMessages ::= SEQUENCE SIZE (1..MAX) OF CertReqMsg
/// ```
pub type CertReqMessages = Vec<CertReqMsg>;

/// `Controls` from RFC 4211 Section 6.
pub type Controls = Vec<AttributeTypeAndValue>;

/// `regInfo` attribute sequence.
pub type AttributeSeq = Vec<Attribute>;

/// The `CertReqMsg` type defined in RFC 4211 Section 3.
///
/// ```text
///   CertReqMsg ::= SEQUENCE {
///       certReq   CertRequest,
///       popo      ProofOfPossession  OPTIONAL,
///       regInfo   SEQUENCE SIZE(1..MAX) OF SingleAttribute OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CertReqMsg {
    /// The certificate request proper.
    pub cert_req: CertRequest,
    /// Proof that the requester holds the private key.
    pub popo: Option<ProofOfPossession>,
    /// Registration attributes.
    pub reg_info: Option<AttributeSeq>,
}

impl CertReqMsg {
    /// Raw public-key BIT STRING from the request template, when present.
    ///
    /// Transaction-ID derivation digests exactly these bytes.
    pub fn public_key_bits(&self) -> Option<&BitString> {
        self.cert_req
            .cert_template
            .subject_public_key_info
            .as_ref()
            .map(|spki| &spki.subject_public_key)
    }
}

/// The `CertRequest` type defined in RFC 4211 Section 5.
///
/// ```text
///   CertRequest ::= SEQUENCE {
///       certReqId     INTEGER,
///       certTemplate  CertTemplate,
///       controls      Controls OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CertRequest {
    /// ID for matching request and reply; doubles as the CMC body part ID.
    pub cert_req_id: Int,
    /// Selected fields of the certificate to be issued.
    pub cert_template: CertTemplate,
    /// Attributes affecting issuance.
    pub controls: Option<Controls>,
}

/// The `CertTemplate` type defined in RFC 4211 Section 5.
///
/// ```text
///   CertTemplate ::= SEQUENCE {
///       version      [0] Version               OPTIONAL,
///       serialNumber [1] INTEGER               OPTIONAL,
///       signingAlg   [2] AlgorithmIdentifier   OPTIONAL,
///       issuer       [3] Name                  OPTIONAL,
///       validity     [4] OptionalValidity      OPTIONAL,
///       subject      [5] Name                  OPTIONAL,
///       publicKey    [6] SubjectPublicKeyInfo  OPTIONAL,
///       issuerUID    [7] UniqueIdentifier      OPTIONAL,
///       subjectUID   [8] UniqueIdentifier      OPTIONAL,
///       extensions   [9] Extensions            OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CertTemplate {
    /// Certificate version.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub version: Option<Version>,
    /// Requested serial number (servers assign their own).
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub serial_number: Option<SerialNumber>,
    /// Requested signing algorithm.
    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", optional = "true")]
    pub signing_alg: Option<AlgorithmIdentifierOwned>,
    /// Requested issuer.
    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", optional = "true")]
    pub issuer: Option<Name>,
    /// Requested validity window.
    #[asn1(context_specific = "4", tag_mode = "IMPLICIT", optional = "true")]
    pub validity: Option<OptionalValidity>,
    /// Requested subject.
    #[asn1(context_specific = "5", tag_mode = "EXPLICIT", optional = "true")]
    pub subject: Option<Name>,
    /// Public key to certify.
    #[asn1(context_specific = "6", tag_mode = "IMPLICIT", optional = "true")]
    pub subject_public_key_info: Option<SubjectPublicKeyInfoOwned>,
    /// Issuer unique ID.
    #[asn1(context_specific = "7", tag_mode = "IMPLICIT", optional = "true")]
    pub issuer_unique_id: Option<BitString>,
    /// Subject unique ID.
    #[asn1(context_specific = "8", tag_mode = "IMPLICIT", optional = "true")]
    pub subject_unique_id: Option<BitString>,
    /// Requested extensions.
    #[asn1(context_specific = "9", tag_mode = "IMPLICIT", optional = "true")]
    pub extensions: Option<Extensions>,
}

/// The `OptionalValidity` type defined in RFC 4211 Section 5.
///
/// ```text
///   OptionalValidity ::= SEQUENCE {
///       notBefore  [0] Time OPTIONAL,
///       notAfter   [1] Time OPTIONAL } -- at least one MUST be present
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct OptionalValidity {
    /// Start of the requested validity window.
    #[asn1(
        context_specific = "0",
        tag_mode = "EXPLICIT",
        constructed = "false",
        optional = "true"
    )]
    pub not_before: Option<Time>,
    /// End of the requested validity window.
    #[asn1(
        context_specific = "1",
        tag_mode = "EXPLICIT",
        constructed = "false",
        optional = "true"
    )]
    pub not_after: Option<Time>,
}

/// The `ProofOfPossession` type defined in RFC 4211 Section 4.
///
/// ```text
///   ProofOfPossession ::= CHOICE {
///       raVerified        [0] NULL,
///       signature         [1] POPOSigningKey,
///       keyEncipherment   [2] POPOPrivKey,
///       keyAgreement      [3] POPOPrivKey }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum ProofOfPossession {
    /// POP was verified out of band by an RA.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    RaVerified(Null),

    /// Signature over the request made with the subject private key.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true")]
    Signature(PopoSigningKey),

    /// POP for an encipherment-only key.
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT", constructed = "true")]
    KeyEncipherment(PopoPrivKey),

    /// POP for a key-agreement key.
    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", constructed = "true")]
    KeyAgreement(PopoPrivKey),
}

/// The `POPOSigningKey` type defined in RFC 4211 Section 4.1.
///
/// ```text
///   POPOSigningKey ::= SEQUENCE {
///       poposkInput         [0] POPOSigningKeyInput OPTIONAL,
///       algorithmIdentifier AlgorithmIdentifier,
///       signature           BIT STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PopoSigningKey {
    /// Alternate input when the template lacks subject or public key.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub poposk_input: Option<PopoSigningKeyInput>,
    /// Signature algorithm used for the POP.
    pub alg_id: AlgorithmIdentifierOwned,
    /// The POP signature bits.
    pub signature: BitString,
}

/// The `POPOSigningKeyInput` type defined in RFC 4211 Section 4.1.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PopoSigningKeyInput {
    /// Requester identity binding.
    pub auth_info: PopoSkiAuthInfo,
    /// Public key being certified.
    pub public_key: SubjectPublicKeyInfoOwned,
}

/// `authInfo` choice inside `POPOSigningKeyInput`.
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum PopoSkiAuthInfo {
    /// Authenticated sender name.
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", constructed = "true")]
    Sender(GeneralName),
    /// Shared-secret MAC over the public key.
    PublicKeyMac(PkMacValue),
}

/// The `PKMACValue` type defined in RFC 4211 Section 4.4.
///
/// ```text
///   PKMACValue ::= SEQUENCE {
///       algId  AlgorithmIdentifier,
///       value  BIT STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PkMacValue {
    /// MAC algorithm.
    pub alg_id: AlgorithmIdentifierOwned,
    /// MAC value.
    pub value: BitString,
}

/// The `POPOPrivKey` type defined in RFC 4211 Section 4.2.
///
/// ```text
///   POPOPrivKey ::= CHOICE {
///       thisMessage       [0] BIT STRING,         -- Deprecated
///       subsequentMessage [1] SubsequentMessage,
///       dhMAC             [2] BIT STRING,         -- Deprecated
///       agreeMAC          [3] PKMACValue,
///       encryptedKey      [4] EnvelopedData }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum PopoPrivKey {
    /// Deprecated inline private key.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    ThisMessage(BitString),

    /// POP will be performed in a later exchange.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT")]
    SubsequentMessage(SubsequentMessage),

    /// Deprecated Diffie-Hellman MAC.
    #[asn1(context_specific = "2", tag_mode = "IMPLICIT")]
    DhMac(BitString),

    /// MAC agreed via key agreement.
    #[asn1(context_specific = "3", tag_mode = "IMPLICIT", constructed = "true")]
    AgreeMac(PkMacValue),

    /// Private key escrowed to the server (key archival).
    #[asn1(context_specific = "4", tag_mode = "IMPLICIT", constructed = "true")]
    EncryptedKey(EnvelopedData),
}

/// The `SubsequentMessage` type defined in RFC 4211 Section 4.2.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enumerated)]
#[asn1(type = "INTEGER")]
#[repr(u8)]
pub enum SubsequentMessage {
    /// POP by decrypting the returned certificate.
    EncrCert = 0,
    /// POP by answering a challenge.
    ChallengeResp = 1,
}
