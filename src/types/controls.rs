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

//! Typed CMC control attribute values (RFC 5272 Section 6).
//!
//! Each structure here is the `attrValues` payload of one control kind.
//! Simple controls (transactionId, nonces, dataReturn, identification,
//! identityProof, popLinkWitness) carry bare INTEGER / OCTET STRING /
//! UTF8String values and need no dedicated type.

use der::asn1::{GeneralizedTime, OctetString};
use der::{Choice, Sequence};
use x509_cert::ext::pkix::name::{GeneralName, GeneralNames};
use x509_cert::ext::pkix::CrlReason;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::error::{CmcError, Result};

// ============================================================================
// Status types (RFC 5272 Section 6.1)
// ============================================================================

/// `CMCStatusInfoV2` reports the disposition of one or more body parts.
///
/// ```text
///     CMCStatusInfoV2 ::= SEQUENCE {
///         cMCStatus        CMCStatus,
///         bodyList         SEQUENCE SIZE (1..MAX) OF BodyPartID,
///         statusString     UTF8String OPTIONAL,
///         otherInfo        OtherStatusInfo OPTIONAL
///     }
/// ```
///
/// The status is kept as a raw integer so that out-of-range codes sent by a
/// server are reported instead of being folded into a default.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CmcStatusInfoV2 {
    /// Raw CMCStatus code. Interpret with [`CmcStatus::from_u32`].
    pub status: u32,
    /// Body part IDs this entry applies to.
    pub body_list: Vec<u32>,
    /// Free-text status message from the server.
    pub status_string: Option<String>,
    /// Failure or pending detail.
    pub other_info: Option<OtherInfo>,
}

/// `OtherStatusInfo` distinguishes failure detail from pending detail.
///
/// ```text
///     OtherStatusInfo ::= CHOICE {
///         failInfo         CMCFailInfo,
///         pendInfo         PendInfo
///     }
/// ```
///
/// The tags differ (INTEGER vs SEQUENCE) so the arms decode unambiguously.
/// Anything else under this position is a decode error.
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum OtherInfo {
    /// Raw CMCFailInfo code. Interpret with [`CmcFailInfo::from_u32`].
    Fail(u32),
    /// Pending metadata.
    Pend(PendInfo),
}

/// `PendInfo` carries the tracking token and retry hint for a PENDING entry.
///
/// ```text
///     PendInfo ::= SEQUENCE {
///         pendToken        OCTET STRING,
///         pendTime         GeneralizedTime
///     }
/// ```
///
/// Both fields are modeled as optional so that a lenient encoder still
/// decodes; the status evaluator rejects a PENDING entry without a token.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PendInfo {
    /// Server-assigned request tracking token.
    pub pend_token: Option<OctetString>,
    /// Suggested time to query again.
    pub pend_time: Option<GeneralizedTime>,
}

/// CMC operation status (RFC 5272 Section 6.1.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmcStatus {
    /// Request was granted (0).
    Success = 0,
    /// Reserved (1).
    Reserved = 1,
    /// Request failed, more information in failInfo (2).
    Failed = 2,
    /// Request pending, requester should check back later (3).
    Pending = 3,
    /// No support for the requested operation (4).
    NoSupport = 4,
    /// Confirmation using confirmCertAcceptance required (5).
    ConfirmRequired = 5,
    /// Proof of possession required (6).
    PopRequired = 6,
    /// Partial success, some requests succeeded (7).
    Partial = 7,
}

impl CmcStatus {
    /// Parse from the raw integer value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::Reserved),
            2 => Some(Self::Failed),
            3 => Some(Self::Pending),
            4 => Some(Self::NoSupport),
            5 => Some(Self::ConfirmRequired),
            6 => Some(Self::PopRequired),
            7 => Some(Self::Partial),
            _ => None,
        }
    }

    /// Convert to the raw integer value.
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    /// Upper-case label as printed in status reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Reserved => "RESERVED",
            Self::Failed => "FAILED",
            Self::Pending => "PENDING",
            Self::NoSupport => "NOT SUPPORTED",
            Self::ConfirmRequired => "CONFIRM REQUIRED",
            Self::PopRequired => "POP REQUIRED",
            Self::Partial => "PARTIAL",
        }
    }

    /// Check if this status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if this status indicates a pending operation.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if this status asks for a confirmCertAcceptance round trip.
    pub fn is_confirm_required(&self) -> bool {
        matches!(self, Self::ConfirmRequired)
    }
}

/// CMC failure information (RFC 5272 Section 6.1.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmcFailInfo {
    /// Unrecognized or unsupported algorithm (0).
    BadAlgorithm = 0,
    /// Integrity check (e.g. signature) failed (1).
    BadMessageCheck = 1,
    /// Transaction not permitted or supported (2).
    BadRequest = 2,
    /// Message time field was off by too much (3).
    BadTime = 3,
    /// No certificate could be identified matching the provided criteria (4).
    BadCertId = 4,
    /// A requested X.509 extension is not supported (5).
    UnsupportedExt = 5,
    /// Private key material must be supplied (6).
    MustArchiveKeys = 6,
    /// Identification attribute failed to verify (7).
    BadIdentity = 7,
    /// Proof of possession required (8).
    PopRequired = 8,
    /// Proof of possession failed (9).
    PopFailed = 9,
    /// Old key for an existing certificate may not be reused (10).
    NoKeyReuse = 10,
    /// Internal CA error (11).
    InternalCaError = 11,
    /// Server busy, try again later (12).
    TryLater = 12,
    /// Authentication data failed to verify (13).
    AuthDataFail = 13,
}

impl CmcFailInfo {
    /// Parse from the raw integer value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::BadAlgorithm),
            1 => Some(Self::BadMessageCheck),
            2 => Some(Self::BadRequest),
            3 => Some(Self::BadTime),
            4 => Some(Self::BadCertId),
            5 => Some(Self::UnsupportedExt),
            6 => Some(Self::MustArchiveKeys),
            7 => Some(Self::BadIdentity),
            8 => Some(Self::PopRequired),
            9 => Some(Self::PopFailed),
            10 => Some(Self::NoKeyReuse),
            11 => Some(Self::InternalCaError),
            12 => Some(Self::TryLater),
            13 => Some(Self::AuthDataFail),
            _ => None,
        }
    }

    /// Convert to the raw integer value.
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BadAlgorithm => "Unrecognized or unsupported algorithm",
            Self::BadMessageCheck => "Message integrity check failed",
            Self::BadRequest => "Malformed or invalid request",
            Self::BadTime => "Request time invalid or expired",
            Self::BadCertId => "Invalid certificate ID",
            Self::UnsupportedExt => "Unsupported extension in request",
            Self::MustArchiveKeys => "Key archival required",
            Self::BadIdentity => "Identity verification failed",
            Self::PopRequired => "Proof of possession required",
            Self::PopFailed => "Proof of possession verification failed",
            Self::NoKeyReuse => "Key reuse not allowed",
            Self::InternalCaError => "Internal CA error",
            Self::TryLater => "Server busy, try again later",
            Self::AuthDataFail => "Authentication data verification failed",
        }
    }
}

// ============================================================================
// Certificate identification controls (RFC 5272 Sections 6.9 - 6.11)
// ============================================================================

/// `GetCert` asks the server to return an already-issued certificate.
///
/// ```text
///     GetCert ::= SEQUENCE {
///         issuerName       GeneralName,
///         serialNumber     INTEGER
///     }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct GetCert {
    /// Issuer of the wanted certificate.
    pub issuer_name: GeneralName,
    /// Serial number of the wanted certificate.
    pub serial_number: SerialNumber,
}

impl GetCert {
    /// Identify a certificate by issuer DN and serial number.
    pub fn new(issuer: Name, serial_number: SerialNumber) -> Self {
        Self {
            issuer_name: GeneralName::DirectoryName(issuer),
            serial_number,
        }
    }
}

/// `CMCCertId` identifies the certificate being accepted in a
/// confirmCertAcceptance control (`IssuerSerial` from RFC 5035).
///
/// ```text
///     CMCCertId ::= SEQUENCE {
///         issuer           GeneralNames,
///         serialNumber     INTEGER
///     }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CmcCertId {
    /// Issuer of the accepted certificate.
    pub issuer: GeneralNames,
    /// Serial number of the accepted certificate.
    pub serial_number: SerialNumber,
}

impl CmcCertId {
    /// Identify a certificate by issuer DN and serial number.
    pub fn new(issuer: Name, serial_number: SerialNumber) -> Self {
        Self {
            issuer: vec![GeneralName::DirectoryName(issuer)],
            serial_number,
        }
    }
}

/// `RevokeRequest` asks the server to revoke an issued certificate.
///
/// ```text
///     RevokeRequest ::= SEQUENCE {
///         issuerName       Name,
///         serialNumber     INTEGER,
///         reason           CRLReason,
///         invalidityDate   GeneralizedTime OPTIONAL,
///         passphrase       OCTET STRING OPTIONAL,
///         comment          UTF8String OPTIONAL
///     }
/// ```
///
/// The optional `passphrase` carries the enrollment shared secret when
/// revocation is authenticated by secret rather than by signature.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct RevokeRequest {
    /// Issuer of the certificate to revoke.
    pub issuer_name: Name,
    /// Serial number of the certificate to revoke.
    pub serial_number: SerialNumber,
    /// Revocation reason.
    pub reason: CrlReason,
    /// When the certificate is believed to have become invalid.
    pub invalidity_date: Option<GeneralizedTime>,
    /// Shared secret authenticating the request.
    pub passphrase: Option<OctetString>,
    /// Free-text comment.
    pub comment: Option<String>,
}

/// Map a revocation reason token to [`CrlReason`], case-insensitively.
///
/// Exactly eight tokens are accepted; anything else is a configuration
/// error. `privilegeWithdrawn` and `aACompromise` are deliberately not
/// offered because the servers this tool targets reject them.
pub fn parse_crl_reason(token: &str) -> Result<CrlReason> {
    const TOKENS: [(&str, CrlReason); 8] = [
        ("unspecified", CrlReason::Unspecified),
        ("keyCompromise", CrlReason::KeyCompromise),
        ("caCompromise", CrlReason::CaCompromise),
        ("affiliationChanged", CrlReason::AffiliationChanged),
        ("superseded", CrlReason::Superseded),
        ("cessationOfOperation", CrlReason::CessationOfOperation),
        ("certificateHold", CrlReason::CertificateHold),
        ("removeFromCRL", CrlReason::RemoveFromCRL),
    ];

    TOKENS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, reason)| *reason)
        .ok_or_else(|| CmcError::config(format!("unrecognized revocation reason: {token}")))
}

// ============================================================================
// Proof-of-possession linkage (RFC 5272 Section 6.3)
// ============================================================================

/// `LraPOPWitness` asserts that a local RA verified proof of possession for
/// the referenced body parts.
///
/// ```text
///     LraPopWitness ::= SEQUENCE {
///         pkiDataBodyid    BodyPartID,
///         bodyIds          SEQUENCE OF BodyPartID
///     }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct LraPopWitness {
    /// Body part ID of the PKIData the witnessed parts live in (0 for the
    /// enclosing message).
    pub pki_data_body_id: u32,
    /// Body part IDs whose POP was verified.
    pub body_ids: Vec<u32>,
}
