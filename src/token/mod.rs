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

//! Security-token capability traits and algorithm selection.
//!
//! The message engine never touches private key material. It borrows three
//! read-only capabilities for the duration of one operation:
//!
//! - [`MessageSigner`] produces a raw signature over a precomputed digest,
//! - [`SignatureVerifier`] checks a signature against signed bytes,
//! - [`CertificateStore`] resolves certificates, chains, and key handles by
//!   nickname.
//!
//! Algorithm choice is keyed off the signing key's type alone; an unknown
//! key type is a hard error rather than a silent default:
//!
//! ```
//! use cmc_toolkit::token::{DigestAlgorithm, KeyType, SignatureAlgorithm};
//!
//! let alg = SignatureAlgorithm::for_key(KeyType::Ec, DigestAlgorithm::Sha256)?;
//! assert_eq!(alg, SignatureAlgorithm::EcdsaWithSha256);
//! # Ok::<(), cmc_toolkit::CmcError>(())
//! ```

#[cfg(feature = "soft-token")]
pub mod software;

#[cfg(feature = "soft-token")]
pub use software::SoftwareToken;

use const_oid::ObjectIdentifier;
use der::AnyRef;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::Certificate;

use crate::error::{CmcError, Result};
use crate::types::oid::alg;

/// Handle to a private key held by a token.
///
/// The handle carries a provider-specific identifier (a nickname for the
/// software token) and the key type; the key material itself stays inside
/// the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHandle {
    id: String,
    key_type: KeyType,
}

impl KeyHandle {
    /// Create a handle from a provider-specific identifier and key type.
    pub fn new(id: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            id: id.into(),
            key_type,
        }
    }

    /// Provider-specific key identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Type of the referenced key.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}

/// Supported signing key types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// RSA.
    Rsa,
    /// Elliptic curve (named curve in the key's parameters).
    Ec,
    /// DSA.
    Dsa,
}

impl KeyType {
    /// Get a string representation of the key type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ec => "EC",
            Self::Dsa => "DSA",
        }
    }

    /// Classify a public key by its SubjectPublicKeyInfo algorithm OID.
    ///
    /// Anything other than RSA, EC, or DSA is an unsupported-key-type error.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        Self::from_algorithm_oid(spki.algorithm.oid)
    }

    /// Classify a key by its public-key algorithm OID.
    pub fn from_algorithm_oid(oid: ObjectIdentifier) -> Result<Self> {
        if oid == alg::RSA_ENCRYPTION {
            Ok(Self::Rsa)
        } else if oid == alg::EC_PUBLIC_KEY {
            Ok(Self::Ec)
        } else if oid == alg::DSA {
            Ok(Self::Dsa)
        } else {
            Err(CmcError::unsupported_key_type(format!(
                "public key algorithm {oid}"
            )))
        }
    }
}

/// Digest algorithms used by the message engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// MD5. Used only to derive default transaction IDs, never in signatures.
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Get a string representation of the digest algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
        }
    }

    /// OID of the digest algorithm.
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            Self::Md5 => alg::MD5,
            Self::Sha1 => alg::SHA1,
            Self::Sha256 => alg::SHA256,
        }
    }

    /// Digest output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Compute the digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::digest(data).to_vec(),
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// AlgorithmIdentifier for use in SignerInfo digest fields.
    ///
    /// Parameters are an explicit NULL, matching what the CA-side stacks
    /// emit and expect.
    pub fn identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(AnyRef::NULL.into()),
        }
    }
}

/// Signature algorithms selectable by (key type, digest) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// sha1WithRSAEncryption.
    Sha1WithRsa,
    /// sha256WithRSAEncryption.
    Sha256WithRsa,
    /// ecdsa-with-SHA1.
    EcdsaWithSha1,
    /// ecdsa-with-SHA256.
    EcdsaWithSha256,
    /// dsa-with-sha1.
    DsaWithSha1,
    /// dsa-with-sha256.
    DsaWithSha256,
}

impl SignatureAlgorithm {
    /// Select the signature algorithm for a key type and digest.
    ///
    /// MD5 is rejected; it exists only for transaction-ID derivation.
    pub fn for_key(key_type: KeyType, digest: DigestAlgorithm) -> Result<Self> {
        match (key_type, digest) {
            (KeyType::Rsa, DigestAlgorithm::Sha1) => Ok(Self::Sha1WithRsa),
            (KeyType::Rsa, DigestAlgorithm::Sha256) => Ok(Self::Sha256WithRsa),
            (KeyType::Ec, DigestAlgorithm::Sha1) => Ok(Self::EcdsaWithSha1),
            (KeyType::Ec, DigestAlgorithm::Sha256) => Ok(Self::EcdsaWithSha256),
            (KeyType::Dsa, DigestAlgorithm::Sha1) => Ok(Self::DsaWithSha1),
            (KeyType::Dsa, DigestAlgorithm::Sha256) => Ok(Self::DsaWithSha256),
            (kt, d) => Err(CmcError::crypto(format!(
                "no signature algorithm for {} with {}",
                kt.as_str(),
                d.as_str()
            ))),
        }
    }

    /// OID of the signature algorithm.
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            Self::Sha1WithRsa => alg::SHA1_WITH_RSA,
            Self::Sha256WithRsa => alg::SHA256_WITH_RSA,
            Self::EcdsaWithSha1 => alg::ECDSA_WITH_SHA1,
            Self::EcdsaWithSha256 => alg::ECDSA_WITH_SHA256,
            Self::DsaWithSha1 => alg::DSA_WITH_SHA1,
            Self::DsaWithSha256 => alg::DSA_WITH_SHA256,
        }
    }

    /// The digest half of this algorithm.
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::Sha1WithRsa | Self::EcdsaWithSha1 | Self::DsaWithSha1 => DigestAlgorithm::Sha1,
            Self::Sha256WithRsa | Self::EcdsaWithSha256 | Self::DsaWithSha256 => {
                DigestAlgorithm::Sha256
            }
        }
    }

    /// The key type this algorithm signs with.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Sha1WithRsa | Self::Sha256WithRsa => KeyType::Rsa,
            Self::EcdsaWithSha1 | Self::EcdsaWithSha256 => KeyType::Ec,
            Self::DsaWithSha1 | Self::DsaWithSha256 => KeyType::Dsa,
        }
    }

    /// AlgorithmIdentifier for use in SignerInfo signature fields.
    ///
    /// RSA variants carry NULL parameters; ECDSA and DSA omit them per
    /// RFC 5758 section 3.
    pub fn identifier(&self) -> AlgorithmIdentifierOwned {
        let parameters = match self.key_type() {
            KeyType::Rsa => Some(AnyRef::NULL.into()),
            KeyType::Ec | KeyType::Dsa => None,
        };
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters,
        }
    }
}

/// HMAC-SHA1 as used by the identity-proof and POP-link-witness controls.
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| CmcError::crypto(format!("HMAC-SHA1 key setup: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Produces raw signatures over precomputed digests.
///
/// Implementations hold the private key material; the engine hands them a
/// digest of the encapsulated content and embeds whatever comes back.
/// Expected signature encodings: PKCS#1 v1.5 for RSA, DER-encoded
/// `ECDSA-Sig-Value` for EC, DER-encoded `Dss-Sig-Value` for DSA.
pub trait MessageSigner {
    /// Sign a digest with the key behind `key`.
    ///
    /// The digest length must match `algorithm.digest_algorithm()`.
    fn sign(&self, algorithm: SignatureAlgorithm, key: &KeyHandle, digest: &[u8])
        -> Result<Vec<u8>>;
}

/// Checks signatures against the bytes they claim to sign.
///
/// The verifier hashes `signed` itself with the algorithm's digest half.
pub trait SignatureVerifier {
    /// Verify `signature` over `signed` with the given public key.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match;
    /// errors are reserved for unusable keys or malformed signatures.
    fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        public_key: &SubjectPublicKeyInfoOwned,
        signature: &[u8],
        signed: &[u8],
    ) -> Result<bool>;
}

/// Resolves certificates and private keys by nickname.
pub trait CertificateStore {
    /// Look up a certificate and its chain (leaf first, root last).
    fn find_by_nickname(&self, nickname: &str) -> Result<(Certificate, Vec<Certificate>)>;

    /// Resolve the private-key handle for a stored certificate.
    fn find_private_key(&self, certificate: &Certificate) -> Result<KeyHandle>;
}
