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

//! Software-based (in-memory) security token.
//!
//! This module provides an in-memory implementation of the three token
//! capabilities ([`MessageSigner`], [`SignatureVerifier`], and
//! [`CertificateStore`]) backed by the RustCrypto `rsa`, `p256`, and `dsa`
//! crates. It is primarily intended for:
//!
//! - **Development and testing**: exercising the request and response
//!   pipelines without PKCS#11 hardware
//! - **Offline verification**: audit-log checking only needs the verifier
//!   half, which works from public keys alone
//!
//! # Security Considerations
//!
//! **WARNING**: This implementation stores private keys in process memory
//! and should **NOT** be used in production environments where security is
//! critical. Private keys:
//!
//! - Are not protected by hardware security boundaries
//! - May be swapped to disk by the operating system
//! - Can be extracted via memory dumps or debugging tools
//! - Are lost when the process terminates
//!
//! For production use, implement the token traits over an HSM or OS
//! keystore instead.
//!
//! # Example
//!
//! ```no_run
//! use cmc_toolkit::token::{CertificateStore, SoftwareToken};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signing_key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
//! # let certificate: x509_cert::Certificate = unimplemented!();
//!
//! let mut token = SoftwareToken::new();
//! token.insert("enrollment-agent", certificate, Vec::new(), signing_key)?;
//!
//! let (cert, chain) = token.find_by_nickname("enrollment-agent")?;
//! let key = token.find_private_key(&cert)?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use der::{Decode, Encode};
use sha1::Sha1;
use sha2::Sha256;
use spki::{DecodePublicKey, SubjectPublicKeyInfoOwned};
use x509_cert::Certificate;

use rsa::Pkcs1v15Sign;
use signature::hazmat::{PrehashSigner, PrehashVerifier};

use super::{
    CertificateStore, DigestAlgorithm, KeyHandle, KeyType, MessageSigner, SignatureAlgorithm,
    SignatureVerifier,
};
use crate::error::{CmcError, Result};

/// A private key held by the software token.
///
/// Wraps the RustCrypto key types for the three supported key families.
/// `From` impls let callers pass the concrete key type straight to
/// [`SoftwareToken::insert`].
#[derive(Clone)]
pub enum SoftwareKey {
    /// RSA private key.
    Rsa(rsa::RsaPrivateKey),
    /// ECDSA P-256 signing key.
    P256(p256::ecdsa::SigningKey),
    /// DSA signing key.
    Dsa(dsa::SigningKey),
}

impl SoftwareKey {
    /// Type of the wrapped key.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
            Self::P256(_) => KeyType::Ec,
            Self::Dsa(_) => KeyType::Dsa,
        }
    }
}

impl From<rsa::RsaPrivateKey> for SoftwareKey {
    fn from(key: rsa::RsaPrivateKey) -> Self {
        Self::Rsa(key)
    }
}

impl From<p256::ecdsa::SigningKey> for SoftwareKey {
    fn from(key: p256::ecdsa::SigningKey) -> Self {
        Self::P256(key)
    }
}

impl From<dsa::SigningKey> for SoftwareKey {
    fn from(key: dsa::SigningKey) -> Self {
        Self::Dsa(key)
    }
}

#[derive(Clone)]
struct TokenEntry {
    certificate: Certificate,
    intermediates: Vec<Certificate>,
    key: SoftwareKey,
}

/// In-memory token keyed by certificate nickname.
///
/// Each entry pairs a certificate (plus any intermediate certificates) with
/// its private key. The nickname doubles as the [`KeyHandle`] identifier.
#[derive(Clone, Default)]
pub struct SoftwareToken {
    entries: HashMap<String, TokenEntry>,
}

impl SoftwareToken {
    /// Create an empty token.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add a certificate, its intermediates, and its private key under a
    /// nickname.
    ///
    /// `intermediates` holds the rest of the chain in leaf-to-root order and
    /// may be empty for self-signed certificates. Nicknames must be unique.
    pub fn insert(
        &mut self,
        nickname: impl Into<String>,
        certificate: Certificate,
        intermediates: Vec<Certificate>,
        key: impl Into<SoftwareKey>,
    ) -> Result<()> {
        let nickname = nickname.into();
        if self.entries.contains_key(&nickname) {
            return Err(CmcError::config(format!(
                "certificate nickname '{nickname}' already exists"
            )));
        }
        self.entries.insert(
            nickname,
            TokenEntry {
                certificate,
                intermediates,
                key: key.into(),
            },
        );
        Ok(())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the token holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, nickname: &str) -> Result<&TokenEntry> {
        self.entries
            .get(nickname)
            .ok_or_else(|| CmcError::key_not_found(nickname))
    }
}

impl CertificateStore for SoftwareToken {
    fn find_by_nickname(&self, nickname: &str) -> Result<(Certificate, Vec<Certificate>)> {
        let entry = self
            .entries
            .get(nickname)
            .ok_or_else(|| CmcError::certificate_not_found(nickname))?;
        let mut chain = Vec::with_capacity(1 + entry.intermediates.len());
        chain.push(entry.certificate.clone());
        chain.extend(entry.intermediates.iter().cloned());
        Ok((entry.certificate.clone(), chain))
    }

    fn find_private_key(&self, certificate: &Certificate) -> Result<KeyHandle> {
        for (nickname, entry) in &self.entries {
            if entry.certificate == *certificate {
                return Ok(KeyHandle::new(nickname.clone(), entry.key.key_type()));
            }
        }
        Err(CmcError::key_not_found(format!(
            "no private key for certificate with serial {}",
            certificate.tbs_certificate.serial_number
        )))
    }
}

impl MessageSigner for SoftwareToken {
    fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        key: &KeyHandle,
        digest: &[u8],
    ) -> Result<Vec<u8>> {
        let entry = self.entry(key.id())?;
        if entry.key.key_type() != algorithm.key_type() {
            return Err(CmcError::crypto(format!(
                "key '{}' is {} but the signature algorithm requires {}",
                key.id(),
                entry.key.key_type().as_str(),
                algorithm.key_type().as_str()
            )));
        }
        let digest_algorithm = algorithm.digest_algorithm();
        if digest.len() != digest_algorithm.output_len() {
            return Err(CmcError::crypto(format!(
                "digest is {} bytes, {} produces {}",
                digest.len(),
                digest_algorithm.as_str(),
                digest_algorithm.output_len()
            )));
        }

        match &entry.key {
            SoftwareKey::Rsa(private_key) => {
                let padding = rsa_padding(digest_algorithm)?;
                private_key
                    .sign(padding, digest)
                    .map_err(|e| CmcError::crypto(format!("RSA signing: {e}")))
            }
            SoftwareKey::P256(signing_key) => {
                let signature: p256::ecdsa::Signature = signing_key
                    .sign_prehash(digest)
                    .map_err(|e| CmcError::crypto(format!("ECDSA signing: {e}")))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            SoftwareKey::Dsa(signing_key) => {
                let signature = match digest_algorithm {
                    DigestAlgorithm::Sha1 => signing_key.sign_prehashed_rfc6979::<Sha1>(digest),
                    DigestAlgorithm::Sha256 => signing_key.sign_prehashed_rfc6979::<Sha256>(digest),
                    DigestAlgorithm::Md5 => {
                        return Err(CmcError::crypto("MD5 signatures are not supported"))
                    }
                }
                .map_err(|e| CmcError::crypto(format!("DSA signing: {e}")))?;
                Ok(signature.to_der()?)
            }
        }
    }
}

impl SignatureVerifier for SoftwareToken {
    fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        public_key: &SubjectPublicKeyInfoOwned,
        signature: &[u8],
        signed: &[u8],
    ) -> Result<bool> {
        let key_type = KeyType::from_spki(public_key)?;
        if key_type != algorithm.key_type() {
            return Err(CmcError::crypto(format!(
                "public key is {} but the signature algorithm requires {}",
                key_type.as_str(),
                algorithm.key_type().as_str()
            )));
        }
        let digest_algorithm = algorithm.digest_algorithm();
        let digest = digest_algorithm.digest(signed);

        match key_type {
            KeyType::Rsa => {
                let verifying_key = rsa::RsaPublicKey::from_public_key_der(&public_key.to_der()?)
                    .map_err(|e| CmcError::crypto(format!("RSA public key: {e}")))?;
                let padding = rsa_padding(digest_algorithm)?;
                Ok(verifying_key.verify(padding, &digest, signature).is_ok())
            }
            KeyType::Ec => {
                let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(
                    public_key.subject_public_key.raw_bytes(),
                )
                .map_err(|e| CmcError::crypto(format!("EC public key: {e}")))?;
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|e| CmcError::crypto(format!("ECDSA signature encoding: {e}")))?;
                Ok(verifying_key.verify_prehash(&digest, &signature).is_ok())
            }
            KeyType::Dsa => {
                let verifying_key = dsa::VerifyingKey::from_public_key_der(&public_key.to_der()?)
                    .map_err(|e| CmcError::crypto(format!("DSA public key: {e}")))?;
                let signature = dsa::Signature::from_der(signature)
                    .map_err(|e| CmcError::crypto(format!("DSA signature encoding: {e}")))?;
                Ok(verifying_key.verify_prehash(&digest, &signature).is_ok())
            }
        }
    }
}

fn rsa_padding(digest: DigestAlgorithm) -> Result<Pkcs1v15Sign> {
    match digest {
        DigestAlgorithm::Sha1 => Ok(Pkcs1v15Sign::new::<Sha1>()),
        DigestAlgorithm::Sha256 => Ok(Pkcs1v15Sign::new::<Sha256>()),
        DigestAlgorithm::Md5 => Err(CmcError::crypto("MD5 signatures are not supported")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use std::time::Duration;

    use p256::ecdsa::DerSignature;
    use spki::EncodePublicKey;
    use x509_cert::builder::{Builder, CertificateBuilder, Profile};
    use x509_cert::name::Name;
    use x509_cert::serial_number::SerialNumber;
    use x509_cert::time::Validity;

    fn p256_credentials(common_name: &str) -> (Certificate, p256::ecdsa::SigningKey) {
        let signing_key = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let spki_der = signing_key
            .verifying_key()
            .to_public_key_der()
            .expect("encode public key");
        let spki =
            SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).expect("parse public key");
        let subject = Name::from_str(&format!("CN={common_name}")).expect("parse subject");
        let builder = CertificateBuilder::new(
            Profile::Root,
            SerialNumber::from(7u32),
            Validity::from_now(Duration::from_secs(3600)).expect("validity"),
            subject,
            spki,
            &signing_key,
        )
        .expect("certificate builder");
        let certificate = builder.build::<DerSignature>().expect("build certificate");
        (certificate, signing_key)
    }

    #[test]
    fn test_find_by_nickname_returns_leaf_first_chain() {
        let (leaf, key) = p256_credentials("leaf");
        let (issuer, _) = p256_credentials("issuer");

        let mut token = SoftwareToken::new();
        token
            .insert("mine", leaf.clone(), vec![issuer.clone()], key)
            .unwrap();

        let (cert, chain) = token.find_by_nickname("mine").unwrap();
        assert_eq!(cert, leaf);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0], leaf);
        assert_eq!(chain[1], issuer);
    }

    #[test]
    fn test_unknown_nickname() {
        let token = SoftwareToken::new();
        let err = token.find_by_nickname("missing").unwrap_err();
        assert!(matches!(err, CmcError::CertificateNotFound(_)));
    }

    #[test]
    fn test_duplicate_nickname_rejected() {
        let (cert, key) = p256_credentials("dup");
        let mut token = SoftwareToken::new();
        token
            .insert("dup", cert.clone(), Vec::new(), key.clone())
            .unwrap();
        let err = token.insert("dup", cert, Vec::new(), key).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_find_private_key_matches_certificate() {
        let (cert, key) = p256_credentials("signer");
        let (other, _) = p256_credentials("other");

        let mut token = SoftwareToken::new();
        token.insert("signer", cert.clone(), Vec::new(), key).unwrap();

        let handle = token.find_private_key(&cert).unwrap();
        assert_eq!(handle.id(), "signer");
        assert_eq!(handle.key_type(), KeyType::Ec);

        let err = token.find_private_key(&other).unwrap_err();
        assert!(matches!(err, CmcError::KeyNotFound(_)));
    }

    #[test]
    fn test_p256_sign_verify_round_trip() {
        let (cert, key) = p256_credentials("roundtrip");
        let mut token = SoftwareToken::new();
        token.insert("roundtrip", cert.clone(), Vec::new(), key).unwrap();
        let handle = token.find_private_key(&cert).unwrap();

        let message = b"content to protect";
        let algorithm = SignatureAlgorithm::EcdsaWithSha256;
        let digest = algorithm.digest_algorithm().digest(message);
        let signature = token.sign(algorithm, &handle, &digest).unwrap();

        let spki = cert.tbs_certificate.subject_public_key_info.clone();
        assert!(token.verify(algorithm, &spki, &signature, message).unwrap());
        assert!(!token
            .verify(algorithm, &spki, &signature, b"different content")
            .unwrap());
    }

    #[test]
    fn test_rsa_sign_verify_round_trip() {
        let private_key =
            rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("generate RSA key");
        let public_key = private_key.to_public_key();
        let spki_der = public_key.to_public_key_der().expect("encode public key");
        let spki =
            SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).expect("parse public key");

        // Certificate content is irrelevant to the signing path; reuse a
        // P-256 self-signed one as the stored entry.
        let (cert, _) = p256_credentials("placeholder");
        let mut token = SoftwareToken::new();
        token.insert("rsa", cert, Vec::new(), private_key).unwrap();
        let handle = KeyHandle::new("rsa", KeyType::Rsa);

        let message = b"enrollment payload";
        for algorithm in [
            SignatureAlgorithm::Sha1WithRsa,
            SignatureAlgorithm::Sha256WithRsa,
        ] {
            let digest = algorithm.digest_algorithm().digest(message);
            let signature = token.sign(algorithm, &handle, &digest).unwrap();
            assert!(token.verify(algorithm, &spki, &signature, message).unwrap());
            assert!(!token
                .verify(algorithm, &spki, &signature, b"tampered")
                .unwrap());
        }
    }

    #[test]
    fn test_sign_rejects_wrong_digest_length() {
        let (cert, key) = p256_credentials("shortdigest");
        let mut token = SoftwareToken::new();
        token.insert("short", cert, Vec::new(), key).unwrap();
        let handle = KeyHandle::new("short", KeyType::Ec);

        let err = token
            .sign(SignatureAlgorithm::EcdsaWithSha256, &handle, &[0u8; 20])
            .unwrap_err();
        assert!(matches!(err, CmcError::Crypto(_)));
    }

    #[test]
    fn test_sign_rejects_algorithm_key_mismatch() {
        let (cert, key) = p256_credentials("mismatch");
        let mut token = SoftwareToken::new();
        token.insert("mismatch", cert, Vec::new(), key).unwrap();
        let handle = KeyHandle::new("mismatch", KeyType::Ec);

        let err = token
            .sign(SignatureAlgorithm::Sha256WithRsa, &handle, &[0u8; 32])
            .unwrap_err();
        assert!(matches!(err, CmcError::Crypto(_)));
    }

    #[test]
    fn test_sign_unknown_handle() {
        let token = SoftwareToken::new();
        let handle = KeyHandle::new("ghost", KeyType::Ec);
        let err = token
            .sign(SignatureAlgorithm::EcdsaWithSha256, &handle, &[0u8; 32])
            .unwrap_err();
        assert!(matches!(err, CmcError::KeyNotFound(_)));
    }

    #[test]
    fn test_verify_key_type_mismatch_is_error() {
        let (cert, _) = p256_credentials("keytype");
        let spki = cert.tbs_certificate.subject_public_key_info.clone();
        let token = SoftwareToken::new();
        let err = token
            .verify(SignatureAlgorithm::Sha256WithRsa, &spki, &[0u8; 16], b"x")
            .unwrap_err();
        assert!(matches!(err, CmcError::Crypto(_)));
    }

    #[test]
    fn test_verify_garbage_ecdsa_signature_is_error() {
        let (cert, _) = p256_credentials("garbage");
        let spki = cert.tbs_certificate.subject_public_key_info.clone();
        let token = SoftwareToken::new();
        let err = token
            .verify(
                SignatureAlgorithm::EcdsaWithSha256,
                &spki,
                &[0xff, 0x00, 0x12],
                b"x",
            )
            .unwrap_err();
        assert!(matches!(err, CmcError::Crypto(_)));
    }
}
