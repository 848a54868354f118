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

//! CMC response parsing.
//!
//! A response arrives as a CMS `ContentInfo` wrapping a `SignedData` whose
//! encapsulated content is a `PKIResponse` body. Parsing walks that nesting
//! in one pass: outer `ContentInfo`, `SignedData`, any returned certificates,
//! then the response controls, which are decoded once into
//! [`ResponseControl`] variants. Unrecognized control OIDs are preserved as
//! [`ResponseControl::Unrecognized`] rather than dropped, so they can be
//! logged or inspected, but they never abort parsing.
//!
//! Structural ASN.1 failures are fatal. A mislabeled content type is only a
//! warning: some servers stamp the plain `data` OID (or something else
//! entirely) on perfectly parseable response bodies.

pub mod status;

pub use status::{evaluate, StatusReport, StatusVerdict};

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, OctetString, Uint};
use der::{Decode, Encode};
use x509_cert::Certificate;

use crate::error::{CmcError, Result};
use crate::types::cmc::{ResponseBody, TaggedAttribute};
use crate::types::controls::CmcStatusInfoV2;
use crate::types::oid;

/// One decoded response control.
#[derive(Clone, Debug)]
pub enum ResponseControl {
    /// A `statusInfoV2` entry describing part of the batch.
    StatusInfoV2(CmcStatusInfoV2),
    /// Echoed transaction ID (raw INTEGER magnitude bytes).
    TransactionId(Vec<u8>),
    /// Server's echo of the nonce this client sent.
    RecipientNonce(Vec<u8>),
    /// Nonce the server expects echoed back in a follow-up.
    SenderNonce(Vec<u8>),
    /// Client state returned unmodified.
    DataReturn(Vec<u8>),
    /// Encrypted proof-of-possession challenge, kept undecoded.
    EncryptedPop(Any),
    /// Server-assigned request identifier.
    ResponseInfo(Vec<u8>),
    /// A control this client does not know. Preserved for inspection.
    Unrecognized {
        /// The control's OID.
        oid: ObjectIdentifier,
        /// The undecoded control value.
        value: Any,
    },
}

/// A parsed CMC response.
#[derive(Clone, Debug)]
pub struct CmcResponse {
    certificates: Vec<Certificate>,
    body: ResponseBody,
    controls: Vec<ResponseControl>,
}

impl CmcResponse {
    /// Certificates the server returned in the `SignedData`.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// All decoded controls, in response order.
    pub fn controls(&self) -> &[ResponseControl] {
        &self.controls
    }

    /// The raw response body, for controls beyond the typed surface.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Every `statusInfoV2` entry, in response order.
    pub fn status_infos(&self) -> impl Iterator<Item = &CmcStatusInfoV2> {
        self.controls.iter().filter_map(|control| match control {
            ResponseControl::StatusInfoV2(info) => Some(info),
            _ => None,
        })
    }

    /// Judge every status entry, in order.
    ///
    /// Entries are evaluated independently; a failed entry does not stop
    /// the ones after it. The single fatal case is a pending status without
    /// a token, which aborts with a protocol error.
    pub fn evaluate_statuses(&self) -> Result<Vec<StatusReport>> {
        let mut reports = Vec::new();
        for info in self.status_infos() {
            reports.push(status::evaluate(info)?);
        }
        Ok(reports)
    }

    /// The echoed transaction ID, if present.
    pub fn transaction_id(&self) -> Option<&[u8]> {
        self.controls.iter().find_map(|control| match control {
            ResponseControl::TransactionId(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// The server's echo of this client's nonce, if present.
    pub fn recipient_nonce(&self) -> Option<&[u8]> {
        self.controls.iter().find_map(|control| match control {
            ResponseControl::RecipientNonce(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// The server's own nonce, if present.
    pub fn sender_nonce(&self) -> Option<&[u8]> {
        self.controls.iter().find_map(|control| match control {
            ResponseControl::SenderNonce(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// Returned client state, if present.
    pub fn data_return(&self) -> Option<&[u8]> {
        self.controls.iter().find_map(|control| match control {
            ResponseControl::DataReturn(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// The encrypted POP challenge, if the server issued one.
    pub fn encrypted_pop(&self) -> Option<&Any> {
        self.controls.iter().find_map(|control| match control {
            ResponseControl::EncryptedPop(value) => Some(value),
            _ => None,
        })
    }

    /// The server-assigned request ID, if present.
    pub fn response_info(&self) -> Option<&[u8]> {
        self.controls.iter().find_map(|control| match control {
            ResponseControl::ResponseInfo(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }
}

/// Parse a DER-encoded CMC response.
pub fn parse_response(der: &[u8]) -> Result<CmcResponse> {
    let content_info = ContentInfo::from_der(der)?;
    if content_info.content_type != oid::content::ID_SIGNED_DATA {
        tracing::warn!(
            "response labeled {} instead of signedData, parsing anyway",
            content_info.content_type
        );
    }
    let signed_data = SignedData::from_der(&content_info.content.to_der()?)?;

    let certificates = extract_certificates(&signed_data);

    let econtent_type = signed_data.encap_content_info.econtent_type;
    if econtent_type != oid::content::ID_CCT_PKI_RESPONSE
        && econtent_type != oid::content::ID_DATA
    {
        tracing::warn!(
            "response content labeled {} instead of PKIResponse, parsing anyway",
            econtent_type
        );
    }
    let econtent = signed_data
        .encap_content_info
        .econtent
        .as_ref()
        .ok_or_else(|| CmcError::malformed("response SignedData has no encapsulated content"))?;
    let octets = OctetString::from_der(&econtent.to_der()?)?;
    let body = ResponseBody::from_der(octets.as_bytes())?;

    let mut controls = Vec::new();
    for attribute in &body.control_sequence {
        decode_control(attribute, &mut controls)?;
    }
    tracing::debug!(
        "parsed CMC response: {} control(s), {} certificate(s)",
        controls.len(),
        certificates.len()
    );

    Ok(CmcResponse {
        certificates,
        body,
        controls,
    })
}

/// Parse a base64-armored CMC response, as read from a blob file.
///
/// Embedded whitespace (wrapped lines, trailing newlines) is tolerated.
pub fn parse_response_base64(text: &[u8]) -> Result<CmcResponse> {
    let der = crate::encoding::decode_base64(text)?;
    parse_response(&der)
}

/// Collect the X.509 certificates from a `SignedData`, skipping any other
/// certificate formats with a warning.
fn extract_certificates(signed_data: &SignedData) -> Vec<Certificate> {
    let mut certificates = Vec::new();
    if let Some(cert_set) = &signed_data.certificates {
        for choice in cert_set.0.iter() {
            match choice {
                CertificateChoices::Certificate(certificate) => {
                    certificates.push(certificate.clone());
                }
                _ => tracing::warn!("Skipping non-X.509 certificate in response"),
            }
        }
    }
    certificates
}

/// Decode every value of one control attribute into the closed control
/// enumeration.
fn decode_control(attribute: &TaggedAttribute, out: &mut Vec<ResponseControl>) -> Result<()> {
    for value in attribute.attr_values.iter() {
        let der = value.to_der()?;
        let control = match attribute.attr_type {
            t if t == oid::cmc::STATUS_INFO_V2 => {
                ResponseControl::StatusInfoV2(CmcStatusInfoV2::from_der(&der)?)
            }
            t if t == oid::cmc::TRANSACTION_ID => {
                ResponseControl::TransactionId(Uint::from_der(&der)?.as_bytes().to_vec())
            }
            t if t == oid::cmc::RECIPIENT_NONCE => {
                ResponseControl::RecipientNonce(OctetString::from_der(&der)?.as_bytes().to_vec())
            }
            t if t == oid::cmc::SENDER_NONCE => {
                ResponseControl::SenderNonce(OctetString::from_der(&der)?.as_bytes().to_vec())
            }
            t if t == oid::cmc::DATA_RETURN => {
                ResponseControl::DataReturn(OctetString::from_der(&der)?.as_bytes().to_vec())
            }
            t if t == oid::cmc::ENCRYPTED_POP => ResponseControl::EncryptedPop(value.clone()),
            t if t == oid::cmc::RESPONSE_INFO => {
                ResponseControl::ResponseInfo(OctetString::from_der(&der)?.as_bytes().to_vec())
            }
            other => {
                tracing::debug!("ignoring unrecognized response control {}", other);
                ResponseControl::Unrecognized {
                    oid: other,
                    value: value.clone(),
                }
            }
        };
        out.push(control);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::controls::{OtherInfo, PendInfo};
    use cms::content_info::CmsVersion;
    use cms::signed_data::{EncapsulatedContentInfo, SignerInfos};
    use der::asn1::SetOfVec;
    use der::Tag;

    /// Build a response body with the given controls and wrap it the way a
    /// server would: ResponseBody -> OCTET STRING -> SignedData -> ContentInfo.
    fn wire_response(controls: Vec<TaggedAttribute>, econtent_type: ObjectIdentifier) -> Vec<u8> {
        let body = ResponseBody {
            control_sequence: controls,
            cms_sequence: Vec::new(),
            other_msg_sequence: Vec::new(),
        };
        let body_der = body.to_der().unwrap();

        let signed_data = SignedData {
            version: CmsVersion::V3,
            digest_algorithms: SetOfVec::new(),
            encap_content_info: EncapsulatedContentInfo {
                econtent_type,
                econtent: Some(Any::new(Tag::OctetString, body_der).unwrap()),
            },
            certificates: None,
            crls: None,
            signer_infos: SignerInfos(SetOfVec::new()),
        };
        let content_info = ContentInfo {
            content_type: oid::content::ID_SIGNED_DATA,
            content: Any::encode_from(&signed_data).unwrap(),
        };
        content_info.to_der().unwrap()
    }

    fn status_attr(body_part_id: u32, info: &CmcStatusInfoV2) -> TaggedAttribute {
        TaggedAttribute::new(
            body_part_id,
            oid::cmc::STATUS_INFO_V2,
            Any::encode_from(info).unwrap(),
        )
        .unwrap()
    }

    fn octet_attr(body_part_id: u32, oid: ObjectIdentifier, bytes: &[u8]) -> TaggedAttribute {
        TaggedAttribute::new(
            body_part_id,
            oid,
            Any::encode_from(&OctetString::new(bytes).unwrap()).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_success_response_round_trip() {
        let info = CmcStatusInfoV2 {
            status: 0,
            body_list: vec![1],
            status_string: Some("all good".to_string()),
            other_info: None,
        };
        let der = wire_response(
            vec![
                status_attr(1, &info),
                octet_attr(2, oid::cmc::RECIPIENT_NONCE, b"nonce-echo"),
                octet_attr(3, oid::cmc::RESPONSE_INFO, b"42"),
            ],
            oid::content::ID_CCT_PKI_RESPONSE,
        );

        let response = parse_response(&der).unwrap();
        assert_eq!(response.certificates().len(), 0);
        assert_eq!(response.controls().len(), 3);
        assert_eq!(response.recipient_nonce(), Some(b"nonce-echo".as_slice()));
        assert_eq!(response.response_info(), Some(b"42".as_slice()));

        let reports = response.evaluate_statuses().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_success());
        assert_eq!(reports[0].status_string.as_deref(), Some("all good"));
    }

    #[test]
    fn test_batch_entries_evaluated_independently() {
        let success = CmcStatusInfoV2 {
            status: 0,
            body_list: vec![1],
            status_string: None,
            other_info: None,
        };
        let failed = CmcStatusInfoV2 {
            status: 2,
            body_list: vec![2],
            status_string: None,
            other_info: Some(OtherInfo::Fail(11)),
        };
        let der = wire_response(
            vec![status_attr(1, &failed), status_attr(2, &success)],
            oid::content::ID_CCT_PKI_RESPONSE,
        );

        let response = parse_response(&der).unwrap();
        let reports = response.evaluate_statuses().unwrap();
        // The failed entry comes first and does not stop the second.
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_failure());
        assert!(reports[1].is_success());
    }

    #[test]
    fn test_pending_without_token_is_fatal() {
        let pending = CmcStatusInfoV2 {
            status: 3,
            body_list: vec![1],
            status_string: None,
            other_info: Some(OtherInfo::Pend(PendInfo {
                pend_token: None,
                pend_time: None,
            })),
        };
        let der = wire_response(
            vec![status_attr(1, &pending)],
            oid::content::ID_CCT_PKI_RESPONSE,
        );

        let response = parse_response(&der).unwrap();
        let err = response.evaluate_statuses().unwrap_err();
        assert!(matches!(err, CmcError::Protocol(_)));
    }

    #[test]
    fn test_unknown_controls_preserved_not_fatal() {
        let unknown_oid = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.99");
        let der = wire_response(
            vec![octet_attr(1, unknown_oid, b"mystery")],
            oid::content::ID_CCT_PKI_RESPONSE,
        );

        let response = parse_response(&der).unwrap();
        assert_eq!(response.controls().len(), 1);
        match &response.controls()[0] {
            ResponseControl::Unrecognized { oid, .. } => assert_eq!(*oid, unknown_oid),
            other => panic!("unexpected control: {other:?}"),
        }
    }

    #[test]
    fn test_mislabeled_content_type_still_parses() {
        let info = CmcStatusInfoV2 {
            status: 0,
            body_list: vec![1],
            status_string: None,
            other_info: None,
        };
        // Some servers stamp plain `data`, or stranger things, on responses.
        let der = wire_response(vec![status_attr(1, &info)], oid::content::ID_DATA);
        assert!(parse_response(&der).is_ok());

        let odd = wire_response(
            vec![status_attr(1, &info)],
            ObjectIdentifier::new_unwrap("1.2.3.4"),
        );
        assert!(parse_response(&odd).is_ok());
    }

    #[test]
    fn test_truncated_input_is_fatal() {
        let info = CmcStatusInfoV2 {
            status: 0,
            body_list: vec![1],
            status_string: None,
            other_info: None,
        };
        let mut der = wire_response(vec![status_attr(1, &info)], oid::content::ID_CCT_PKI_RESPONSE);
        der.truncate(der.len() / 2);
        let err = parse_response(&der).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_armored_response_parses() {
        let info = CmcStatusInfoV2 {
            status: 0,
            body_list: vec![1],
            status_string: None,
            other_info: None,
        };
        let der = wire_response(vec![status_attr(1, &info)], oid::content::ID_CCT_PKI_RESPONSE);
        let armored = crate::encoding::encode_base64_wrapped(&der, 64);

        let response = parse_response_base64(armored.as_bytes()).unwrap();
        assert_eq!(response.controls().len(), 1);

        let err = parse_response_base64(b"!!not base64!!").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_transaction_id_echo_decodes_as_integer() {
        let value = Any::encode_from(&Uint::new(&[0x07, 0x5b]).unwrap()).unwrap();
        let attr = TaggedAttribute::new(1, oid::cmc::TRANSACTION_ID, value).unwrap();
        let der = wire_response(vec![attr], oid::content::ID_CCT_PKI_RESPONSE);

        let response = parse_response(&der).unwrap();
        assert_eq!(response.transaction_id(), Some([0x07, 0x5b].as_slice()));
    }
}
