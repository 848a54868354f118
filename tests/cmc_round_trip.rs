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

//! End-to-end tests through the public API: assemble a request, sign it,
//! decode the wire bytes back, and evaluate server-style responses.

use std::str::FromStr;
use std::time::Duration;

use cms::cert::CertificateChoices;
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{CertificateSet, EncapsulatedContentInfo, SignedData, SignerInfos};
use der::asn1::{Any, BitString, OctetString, SetOfVec};
use der::{Decode, Encode, Tag};
use p256::ecdsa::{DerSignature, SigningKey};
use spki::{AlgorithmIdentifierOwned, EncodePublicKey, SubjectPublicKeyInfoOwned};
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::ext::pkix::CrlReason;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;
use x509_cert::Certificate;

use cmc_toolkit::envelope;
use cmc_toolkit::request::{CmcRequestBuilder, RevocationRequestBuilder};
use cmc_toolkit::response::parse_response;
use cmc_toolkit::token::software::SoftwareToken;
use cmc_toolkit::token::SignatureAlgorithm;
use cmc_toolkit::types::cmc::{PkiData, ResponseBody, TaggedAttribute, TaggedRequest};
use cmc_toolkit::types::controls::{CmcStatusInfoV2, OtherInfo, PendInfo, RevokeRequest};
use cmc_toolkit::types::oid;
use cmc_toolkit::{SignatureVerifier, SignedCmcMessage};

/// Self-signed P-256 credentials loaded into a fresh software token.
fn agent_token(nickname: &str) -> (SoftwareToken, Certificate) {
    let signing_key = SigningKey::random(&mut rand::thread_rng());
    let spki_der = signing_key.verifying_key().to_public_key_der().expect("SPKI DER");
    let spki = SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).expect("SPKI decode");
    let subject = Name::from_str("CN=ra-agent,O=Example").expect("subject DN");
    let builder = CertificateBuilder::new(
        Profile::Root,
        SerialNumber::from(42u32),
        Validity::from_now(Duration::from_secs(3600)).expect("validity"),
        subject,
        spki,
        &signing_key,
    )
    .expect("certificate builder");
    let certificate = builder.build::<DerSignature>().expect("certificate");

    let mut token = SoftwareToken::new();
    token
        .insert(nickname, certificate.clone(), Vec::new(), signing_key)
        .expect("token insert");
    (token, certificate)
}

/// A hand-assembled PKCS#10 request. The signature is not validated by the
/// assembler, so placeholder bytes keep the fixture small.
fn device_csr() -> CertReq {
    CertReq {
        info: CertReqInfo {
            version: Version::V1,
            subject: Name::from_str("CN=device-7,O=Example").expect("subject DN"),
            public_key: SubjectPublicKeyInfoOwned {
                algorithm: AlgorithmIdentifierOwned {
                    oid: oid::alg::RSA_ENCRYPTION,
                    parameters: None,
                },
                subject_public_key: BitString::from_bytes(&[0x30, 0x82, 0x01, 0x0a, 0x02, 0x01])
                    .expect("key bits"),
            },
            attributes: Default::default(),
        },
        algorithm: AlgorithmIdentifierOwned {
            oid: oid::alg::SHA256_WITH_RSA,
            parameters: None,
        },
        signature: BitString::from_bytes(&[0x00]).expect("signature bits"),
    }
}

#[test]
fn test_enrollment_request_survives_the_wire() {
    let (token, certificate) = agent_token("agent");

    let pki_data = CmcRequestBuilder::new()
        .add_pkcs10_request(device_csr())
        .derived_transaction_id()
        .generated_sender_nonce()
        .data_return(b"session-0017".to_vec())
        .shared_secret("testing")
        .identity_proof()
        .pop_link_witness()
        .build()
        .expect("assembly");

    // Body part IDs are pairwise distinct and strictly increasing.
    let mut ids = vec![match &pki_data.req_sequence[0] {
        TaggedRequest::Tcr(tcr) => tcr.body_part_id,
        other => panic!("unexpected request variant: {other:?}"),
    }];
    ids.extend(pki_data.control_sequence.iter().map(|c| c.body_part_id));
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let message = envelope::sign_enrollment_request(&pki_data, &token, &token, "agent")
        .expect("signing");

    // Re-read the exact bytes a server would receive.
    let wire = message.to_der().expect("wire bytes");
    let reparsed = SignedCmcMessage::from_der(&wire).expect("reparse");
    let content = reparsed.content_info().content.to_der().expect("content");
    let signed_data = SignedData::from_der(&content).expect("SignedData");

    assert_eq!(
        signed_data.encap_content_info.econtent_type,
        oid::content::ID_CCT_PKI_DATA
    );

    // The encapsulated payload round-trips structurally.
    let econtent = signed_data.encap_content_info.econtent.expect("econtent");
    let octets = OctetString::from_der(&econtent.to_der().expect("econtent DER")).expect("octets");
    let decoded = PkiData::from_der(octets.as_bytes()).expect("PKIData decode");
    assert_eq!(decoded, pki_data);

    // The signature checks out against the embedded signer certificate.
    let embedded = signed_data.certificates.expect("certificate set");
    let first = embedded.0.iter().next().expect("one certificate");
    assert!(matches!(first, CertificateChoices::Certificate(c) if *c == certificate));

    let signer_info = signed_data.signer_infos.0.iter().next().expect("signer info");
    let verified = token
        .verify(
            SignatureAlgorithm::EcdsaWithSha1,
            &certificate.tbs_certificate.subject_public_key_info,
            signer_info.signature.as_bytes(),
            octets.as_bytes(),
        )
        .expect("verification");
    assert!(verified);
}

/// Wrap a response body the way a CA does: OCTET STRING econtent inside a
/// SignedData inside a ContentInfo, with issued certificates alongside.
fn server_response(controls: Vec<TaggedAttribute>, issued: Vec<Certificate>) -> Vec<u8> {
    let body = ResponseBody {
        control_sequence: controls,
        cms_sequence: Vec::new(),
        other_msg_sequence: Vec::new(),
    };
    let body_der = body.to_der().expect("body DER");

    let certificates = if issued.is_empty() {
        None
    } else {
        let choices: Vec<CertificateChoices> = issued
            .into_iter()
            .map(CertificateChoices::Certificate)
            .collect();
        Some(CertificateSet(
            SetOfVec::try_from(choices).expect("certificate set"),
        ))
    };

    let signed_data = SignedData {
        version: CmsVersion::V3,
        digest_algorithms: SetOfVec::new(),
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: oid::content::ID_CCT_PKI_RESPONSE,
            econtent: Some(Any::new(Tag::OctetString, body_der).expect("econtent")),
        },
        certificates,
        crls: None,
        signer_infos: SignerInfos(SetOfVec::new()),
    };
    let content_info = ContentInfo {
        content_type: oid::content::ID_SIGNED_DATA,
        content: Any::encode_from(&signed_data).expect("content"),
    };
    content_info.to_der().expect("response DER")
}

fn status_attr(body_part_id: u32, info: &CmcStatusInfoV2) -> TaggedAttribute {
    TaggedAttribute::new(
        body_part_id,
        oid::cmc::STATUS_INFO_V2,
        Any::encode_from(info).expect("status value"),
    )
    .expect("status attribute")
}

#[test]
fn test_batch_response_with_issued_certificate() {
    let (_, issued) = agent_token("issued");

    let success = CmcStatusInfoV2 {
        status: 0,
        body_list: vec![1],
        status_string: Some("request 1 issued".to_string()),
        other_info: None,
    };
    let pending = CmcStatusInfoV2 {
        status: 3,
        body_list: vec![2],
        status_string: None,
        other_info: Some(OtherInfo::Pend(PendInfo {
            pend_token: Some(OctetString::new(b"req-88".to_vec()).expect("token")),
            pend_time: None,
        })),
    };
    let der = server_response(
        vec![status_attr(1, &success), status_attr(2, &pending)],
        vec![issued.clone()],
    );

    let response = parse_response(&der).expect("parse");
    assert_eq!(response.certificates(), &[issued]);

    let reports = response.evaluate_statuses().expect("evaluation");
    assert_eq!(reports.len(), 2);
    assert!(reports[0].is_success());
    assert!(reports[1].is_pending());
    assert_eq!(reports[0].body_list, vec![1]);
    assert_eq!(reports[1].body_list, vec![2]);
}

#[test]
fn test_revocation_by_shared_secret_survives_the_wire() {
    let (token, _) = agent_token("agent");

    let issuer = Name::from_str("CN=Example CA,O=Example").expect("issuer DN");
    let pki_data = RevocationRequestBuilder::new(
        issuer,
        SerialNumber::from(314159u32),
        CrlReason::KeyCompromise,
    )
    .shared_secret("testing")
    .comment("terminal lost")
    .build()
    .expect("assembly");

    let message = envelope::sign_revocation_request(&pki_data, &token, &token, "agent")
        .expect("signing");
    let wire = message.to_der().expect("wire bytes");

    let reparsed = SignedCmcMessage::from_der(&wire).expect("reparse");
    let content = reparsed.content_info().content.to_der().expect("content");
    let signed_data = SignedData::from_der(&content).expect("SignedData");

    // Revocation requests are digested with SHA-256.
    let digest_oids: Vec<_> = signed_data
        .digest_algorithms
        .iter()
        .map(|alg| alg.oid)
        .collect();
    assert_eq!(digest_oids, vec![oid::alg::SHA256]);

    let econtent = signed_data.encap_content_info.econtent.expect("econtent");
    let octets = OctetString::from_der(&econtent.to_der().expect("econtent DER")).expect("octets");
    let decoded = PkiData::from_der(octets.as_bytes()).expect("PKIData decode");

    assert_eq!(decoded.control_sequence.len(), 1);
    let control = &decoded.control_sequence[0];
    assert_eq!(control.attr_type, oid::cmc::REVOKE_REQUEST);
    let value = control.single_value().expect("control value");
    let request = RevokeRequest::from_der(&value.to_der().expect("value DER")).expect("decode");
    assert_eq!(request.serial_number, SerialNumber::from(314159u32));
    assert_eq!(
        request.passphrase.as_ref().map(|p| p.as_bytes()),
        Some(b"testing".as_slice())
    );
    assert_eq!(request.comment.as_deref(), Some("terminal lost"));
}
