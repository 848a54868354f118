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

//! CMS `SignedData` envelopes around CMC payloads.
//!
//! A finished `PKIData` is wrapped in a single-signer `SignedData`: the
//! payload DER becomes the encapsulated content under `id-cct-PKIData`, the
//! signer's certificate chain rides in the `certificates` set, and one
//! `SignerInfo` binds the signer's issuer and serial to a signature over the
//! payload digest. Signing itself goes through the [`MessageSigner`]
//! capability so hardware-backed keys work the same as software ones.
//!
//! Enrollment envelopes default to SHA-1 digests, which is what deployed
//! CMC responders still expect; revocation envelopes default to SHA-256.
//! [`sign_with_digest`] takes the algorithm explicitly when the default is
//! wrong for a deployment.

use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo, SignerInfos,
};
use der::asn1::{Any, OctetString, SetOfVec};
use der::{Decode, Encode, Tag};

use crate::encoding::{encode_base64, encode_base64_wrapped};
use crate::error::{CmcError, Result};
use crate::token::{CertificateStore, DigestAlgorithm, MessageSigner, SignatureAlgorithm};
use crate::types::cmc::PkiData;
use crate::types::oid;

/// Digest algorithm used for enrollment envelopes unless overridden.
pub const ENROLLMENT_DIGEST: DigestAlgorithm = DigestAlgorithm::Sha1;

/// Digest algorithm used for revocation envelopes unless overridden.
pub const REVOCATION_DIGEST: DigestAlgorithm = DigestAlgorithm::Sha256;

/// A fully signed CMC message, ready for the wire.
#[derive(Clone, Debug)]
pub struct SignedCmcMessage {
    content_info: ContentInfo,
}

impl SignedCmcMessage {
    /// The outer `ContentInfo` (`id-signedData`).
    pub fn content_info(&self) -> &ContentInfo {
        &self.content_info
    }

    /// DER encoding of the complete message.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.content_info.to_der()?)
    }

    /// Unwrapped base64 of the DER encoding.
    pub fn to_base64(&self) -> Result<String> {
        Ok(encode_base64(&self.to_der()?))
    }

    /// Base64 of the DER encoding wrapped to `line_length` columns, for
    /// writing armored request files.
    pub fn to_base64_wrapped(&self, line_length: usize) -> Result<String> {
        Ok(encode_base64_wrapped(&self.to_der()?, line_length))
    }

    /// Decode a message previously produced by this module.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let content_info = ContentInfo::from_der(bytes)?;
        if content_info.content_type != oid::content::ID_SIGNED_DATA {
            return Err(CmcError::malformed(format!(
                "expected signedData content, found {}",
                content_info.content_type
            )));
        }
        Ok(Self { content_info })
    }
}

/// Sign an enrollment `PKIData` with the envelope's enrollment defaults.
pub fn sign_enrollment_request<S, C>(
    payload: &PkiData,
    signer: &S,
    store: &C,
    signer_nickname: &str,
) -> Result<SignedCmcMessage>
where
    S: MessageSigner + ?Sized,
    C: CertificateStore + ?Sized,
{
    sign_with_digest(payload, signer, store, signer_nickname, ENROLLMENT_DIGEST)
}

/// Sign a revocation `PKIData`, defaulting to the SHA-256 digest path.
pub fn sign_revocation_request<S, C>(
    payload: &PkiData,
    signer: &S,
    store: &C,
    signer_nickname: &str,
) -> Result<SignedCmcMessage>
where
    S: MessageSigner + ?Sized,
    C: CertificateStore + ?Sized,
{
    sign_with_digest(payload, signer, store, signer_nickname, REVOCATION_DIGEST)
}

/// Sign a `PKIData` with an explicit digest algorithm.
///
/// The signature algorithm follows from the signing key's type and the
/// digest; an unsupported pairing (such as MD5 with any key) is rejected
/// before anything is encoded.
pub fn sign_with_digest<S, C>(
    payload: &PkiData,
    signer: &S,
    store: &C,
    signer_nickname: &str,
    digest_algorithm: DigestAlgorithm,
) -> Result<SignedCmcMessage>
where
    S: MessageSigner + ?Sized,
    C: CertificateStore + ?Sized,
{
    let (certificate, chain) = store.find_by_nickname(signer_nickname)?;
    let key = store.find_private_key(&certificate)?;
    let algorithm = SignatureAlgorithm::for_key(key.key_type(), digest_algorithm)?;

    let encoded = payload.to_der_vec()?;
    let digest = digest_algorithm.digest(&encoded);
    let signature = signer.sign(algorithm, &key, &digest)?;
    tracing::debug!(
        "signed {} byte PKIData as {:?} under nickname {}",
        encoded.len(),
        algorithm,
        signer_nickname
    );

    build_signed_message(
        oid::content::ID_CCT_PKI_DATA,
        encoded,
        &certificate,
        chain,
        digest_algorithm,
        algorithm,
        signature,
    )
}

/// Assemble the single-signer `SignedData` and its outer `ContentInfo`.
fn build_signed_message(
    econtent_type: const_oid::ObjectIdentifier,
    econtent: Vec<u8>,
    certificate: &x509_cert::Certificate,
    chain: Vec<x509_cert::Certificate>,
    digest_algorithm: DigestAlgorithm,
    algorithm: SignatureAlgorithm,
    signature: Vec<u8>,
) -> Result<SignedCmcMessage> {
    let digest_algorithms = SetOfVec::try_from(vec![digest_algorithm.identifier()])?;

    let encap_content_info = EncapsulatedContentInfo {
        econtent_type,
        econtent: Some(Any::new(Tag::OctetString, econtent)?),
    };

    let choices: Vec<CertificateChoices> = chain
        .into_iter()
        .map(CertificateChoices::Certificate)
        .collect();
    let certificates = SetOfVec::try_from(choices)?;

    let signer_info = SignerInfo {
        // Plain IssuerAndSerialNumber identification, so version 1.
        version: CmsVersion::V1,
        sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: certificate.tbs_certificate.issuer.clone(),
            serial_number: certificate.tbs_certificate.serial_number.clone(),
        }),
        digest_alg: digest_algorithm.identifier(),
        signed_attrs: None,
        signature_algorithm: algorithm.identifier(),
        signature: OctetString::new(signature)?,
        unsigned_attrs: None,
    };
    let signer_infos = SignerInfos(SetOfVec::try_from(vec![signer_info])?);

    let signed_data = SignedData {
        // Encapsulated content is not id-data, which forces version 3.
        version: CmsVersion::V3,
        digest_algorithms,
        encap_content_info,
        certificates: Some(CertificateSet(certificates)),
        crls: None,
        signer_infos,
    };

    Ok(SignedCmcMessage {
        content_info: ContentInfo {
            content_type: oid::content::ID_SIGNED_DATA,
            content: Any::encode_from(&signed_data)?,
        },
    })
}
