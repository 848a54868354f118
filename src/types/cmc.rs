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

//! Core CMC message body structures (RFC 5272 Section 3).
//!
//! `PKIData` is the request body and `ResponseBody` (called `PKIResponse` in
//! older drafts) is the response body. Both are plain `der`-derive structures
//! so that encode/decode round-trips byte for byte; the signed envelope
//! digests the exact encoding produced here.

use cms::content_info::ContentInfo;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, Int, SetOfVec};
use der::{Choice, Decode, Encode, Sequence};
use x509_cert::request::CertReq;

use crate::error::{CmcError, Result};
use crate::types::crmf::CertReqMsg;

/// Integer tag identifying one body part within a single CMC message.
///
/// IDs are unique within a message and assigned in strictly increasing
/// order by [`BodyPartIdAllocator`](crate::request::BodyPartIdAllocator).
/// The wire type is `INTEGER (0..4294967295)`.
pub type BodyPartId = u32;

/// `TaggedAttribute` carries one control attribute and its body part ID.
///
/// ```text
///     TaggedAttribute ::= SEQUENCE {
///         bodyPartID         BodyPartID,
///         attrType           OBJECT IDENTIFIER,
///         attrValues         SET OF AttributeValue
///     }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TaggedAttribute {
    /// Body part ID of this control.
    pub body_part_id: BodyPartId,
    /// Control OID (see [`crate::types::oid::cmc`]).
    pub attr_type: ObjectIdentifier,
    /// Control values. CMC controls are single-valued in practice.
    pub attr_values: SetOfVec<Any>,
}

impl TaggedAttribute {
    /// Create a control attribute holding a single value.
    pub fn new(body_part_id: BodyPartId, attr_type: ObjectIdentifier, value: Any) -> Result<Self> {
        Ok(Self {
            body_part_id,
            attr_type,
            attr_values: SetOfVec::try_from(vec![value])?,
        })
    }

    /// The attribute's single value.
    ///
    /// Returns a malformed-structure error when the value set is empty.
    pub fn single_value(&self) -> Result<&Any> {
        self.attr_values.iter().next().ok_or_else(|| {
            CmcError::malformed(format!("control {} carries no value", self.attr_type))
        })
    }
}

/// `TaggedRequest` wraps one certification request.
///
/// ```text
///     TaggedRequest ::= CHOICE {
///         tcr               [0] TaggedCertificationRequest,
///         crm               [1] CertReqMsg,
///         orm               [2] SEQUENCE { ... }
///     }
/// ```
///
/// The `orm` arm is not produced by any deployment this crate talks to and
/// is not modeled; a message carrying one fails to decode.
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum TaggedRequest {
    /// PKCS#10 certification request with its body part ID.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", constructed = "true")]
    Tcr(TaggedCertificationRequest),

    /// CRMF certificate request message; carries its own certReqId.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true")]
    Crm(CertReqMsg),
}

impl TaggedRequest {
    /// The body part ID this request occupies.
    ///
    /// For PKCS#10 this is the allocated `bodyPartID`; for CRMF it is the
    /// request's own `certReqId`. Returns `None` when a CRMF id does not
    /// fit the 32-bit body part range.
    pub fn body_part_id(&self) -> Option<BodyPartId> {
        match self {
            Self::Tcr(tcr) => Some(tcr.body_part_id),
            Self::Crm(crm) => int_to_body_part_id(&crm.cert_req.cert_req_id),
        }
    }
}

/// `TaggedCertificationRequest` binds a PKCS#10 request to a body part ID.
///
/// ```text
///     TaggedCertificationRequest ::= SEQUENCE {
///         bodyPartID            BodyPartID,
///         certificationRequest  CertificationRequest
///     }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TaggedCertificationRequest {
    /// Body part ID of this request.
    pub body_part_id: BodyPartId,
    /// The PKCS#10 certification request.
    pub certification_request: CertReq,
}

/// `TaggedContentInfo` binds a nested CMS message to a body part ID.
///
/// The request assembler leaves `cmsSequence` empty; the type exists so
/// that foreign messages carrying one still round-trip.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TaggedContentInfo {
    /// Body part ID of this nested message.
    pub body_part_id: BodyPartId,
    /// The nested CMS content.
    pub content_info: ContentInfo,
}

/// `OtherMsg` carries an arbitrary typed message body part.
///
/// ```text
///     OtherMsg ::= SEQUENCE {
///         bodyPartID        BodyPartID,
///         otherMsgType      OBJECT IDENTIFIER,
///         otherMsgValue     ANY DEFINED BY otherMsgType
///     }
/// ```
///
/// The revocation path uses this to nest a separately signed revocation
/// message when no shared secret is configured.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct OtherMsg {
    /// Body part ID of this message.
    pub body_part_id: BodyPartId,
    /// Type OID of the value.
    pub other_msg_type: ObjectIdentifier,
    /// The typed value.
    pub other_msg_value: Any,
}

/// `PKIData` is the CMC request body (RFC 5272 Section 3.2.1).
///
/// ```text
///     PKIData ::= SEQUENCE {
///         controlSequence    SEQUENCE SIZE(0..MAX) OF TaggedAttribute,
///         reqSequence        SEQUENCE SIZE(0..MAX) OF TaggedRequest,
///         cmsSequence        SEQUENCE SIZE(0..MAX) OF TaggedContentInfo,
///         otherMsgSequence   SEQUENCE SIZE(0..MAX) OF OtherMsg
///     }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PkiData {
    /// Control attributes, in emission order.
    pub control_sequence: Vec<TaggedAttribute>,
    /// Certification requests.
    pub req_sequence: Vec<TaggedRequest>,
    /// Nested CMS messages (left empty by the assembler).
    pub cms_sequence: Vec<TaggedContentInfo>,
    /// Other typed messages.
    pub other_msg_sequence: Vec<OtherMsg>,
}

impl PkiData {
    /// Create an empty request body.
    pub fn new() -> Self {
        Self {
            control_sequence: Vec::new(),
            req_sequence: Vec::new(),
            cms_sequence: Vec::new(),
            other_msg_sequence: Vec::new(),
        }
    }

    /// Encode to DER.
    pub fn to_der_vec(&self) -> Result<Vec<u8>> {
        Ok(self.to_der()?)
    }

    /// Decode from DER.
    pub fn from_der_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_der(bytes)?)
    }

    /// Find the first control with the given OID.
    pub fn find_control(&self, oid: ObjectIdentifier) -> Option<&TaggedAttribute> {
        self.control_sequence.iter().find(|c| c.attr_type == oid)
    }
}

impl Default for PkiData {
    fn default() -> Self {
        Self::new()
    }
}

/// `ResponseBody` is the CMC response body (RFC 5272 Section 3.2.2,
/// `PKIResponse` on the wire).
///
/// ```text
///     PKIResponse ::= SEQUENCE {
///         controlSequence   SEQUENCE SIZE(0..MAX) OF TaggedAttribute,
///         cmsSequence       SEQUENCE SIZE(0..MAX) OF TaggedContentInfo,
///         otherMsgSequence  SEQUENCE SIZE(0..MAX) OF OtherMsg
///     }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ResponseBody {
    /// Response control attributes.
    pub control_sequence: Vec<TaggedAttribute>,
    /// Nested CMS messages.
    pub cms_sequence: Vec<TaggedContentInfo>,
    /// Other typed messages.
    pub other_msg_sequence: Vec<OtherMsg>,
}

impl ResponseBody {
    /// Create an empty response body.
    pub fn new() -> Self {
        Self {
            control_sequence: Vec::new(),
            cms_sequence: Vec::new(),
            other_msg_sequence: Vec::new(),
        }
    }

    /// Iterate over controls with the given OID.
    pub fn controls(&self, oid: ObjectIdentifier) -> impl Iterator<Item = &TaggedAttribute> {
        self.control_sequence
            .iter()
            .filter(move |c| c.attr_type == oid)
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an arbitrary-precision certReqId to a 32-bit body part ID.
fn int_to_body_part_id(value: &Int) -> Option<BodyPartId> {
    let raw = value.as_bytes();
    if raw.is_empty() || raw[0] & 0x80 != 0 {
        // empty or negative INTEGER: not a valid body part ID
        return None;
    }
    let bytes = match raw.split_first() {
        Some((0, rest)) if !rest.is_empty() => rest,
        _ => raw,
    };
    if bytes.len() > 4 {
        return None;
    }
    let mut id: BodyPartId = 0;
    for byte in bytes {
        id = (id << 8) | BodyPartId::from(*byte);
    }
    Some(id)
}
