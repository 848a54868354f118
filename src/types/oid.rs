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

//! Object identifiers used by the CMC protocol and its CMS envelopes.
//!
//! Control attribute OIDs live under the id-cmc arc (RFC 5272 Appendix A);
//! content types and algorithm identifiers are the usual PKCS#7/PKIX
//! assignments. Everything is declared as a `const` so tables can be built
//! in static dispatch code without runtime parsing.

use const_oid::ObjectIdentifier;

/// The id-cmc arc under which all CMC control OIDs are assigned.
pub const CMC_OID_ARC: &str = "1.3.6.1.5.5.7.7";

/// CMC control attribute OIDs (RFC 5272 Appendix A).
pub mod cmc {
    use super::ObjectIdentifier;

    /// id-cmc-statusInfo (original v1 status control).
    pub const STATUS_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.1");

    /// id-cmc-identification
    pub const IDENTIFICATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.2");

    /// id-cmc-identityProof
    pub const IDENTITY_PROOF: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.3");

    /// id-cmc-dataReturn
    pub const DATA_RETURN: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.4");

    /// id-cmc-transactionId
    pub const TRANSACTION_ID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.5");

    /// id-cmc-senderNonce
    pub const SENDER_NONCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.6");

    /// id-cmc-recipientNonce
    pub const RECIPIENT_NONCE: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.7");

    /// id-cmc-addExtensions
    pub const ADD_EXTENSIONS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.8");

    /// id-cmc-encryptedPOP
    pub const ENCRYPTED_POP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.9");

    /// id-cmc-decryptedPOP
    pub const DECRYPTED_POP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.10");

    /// id-cmc-lraPOPWitness
    pub const LRA_POP_WITNESS: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.11");

    /// id-cmc-getCert
    pub const GET_CERT: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.15");

    /// id-cmc-getCRL
    pub const GET_CRL: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.16");

    /// id-cmc-revokeRequest
    pub const REVOKE_REQUEST: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.17");

    /// id-cmc-regInfo
    pub const REG_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.18");

    /// id-cmc-responseInfo
    pub const RESPONSE_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.19");

    /// id-cmc-queryPending
    pub const QUERY_PENDING: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.21");

    /// id-cmc-popLinkRandom
    pub const POP_LINK_RANDOM: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.22");

    /// id-cmc-popLinkWitness
    pub const POP_LINK_WITNESS: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.23");

    /// id-cmc-confirmCertAcceptance
    pub const CONFIRM_CERT_ACCEPTANCE: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.24");

    /// id-cmc-statusInfoV2
    pub const STATUS_INFO_V2: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.25");

    /// id-cmc-popLinkWitnessV2
    pub const POP_LINK_WITNESS_V2: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.33");

    /// id-cmc-identityProofV2
    pub const IDENTITY_PROOF_V2: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.7.34");
}

/// CMS and CMC content type OIDs.
pub mod content {
    use super::ObjectIdentifier;

    /// id-data (PKCS#7 plain data).
    pub const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");

    /// id-signedData (PKCS#7/CMS SignedData).
    pub const ID_SIGNED_DATA: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

    /// id-cct-PKIData (CMC request body).
    pub const ID_CCT_PKI_DATA: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.12.2");

    /// id-cct-PKIResponse (CMC response body).
    pub const ID_CCT_PKI_RESPONSE: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.12.3");
}

/// Digest, signature, and public key algorithm OIDs.
pub mod alg {
    use super::ObjectIdentifier;

    /// MD5 (transaction-id derivation only; never used for signatures).
    pub const MD5: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.2.5");

    /// SHA-1
    pub const SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");

    /// SHA-256
    pub const SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

    /// rsaEncryption (RSA public key)
    pub const RSA_ENCRYPTION: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

    /// sha1WithRSAEncryption
    pub const SHA1_WITH_RSA: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");

    /// sha256WithRSAEncryption
    pub const SHA256_WITH_RSA: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

    /// id-ecPublicKey (EC public key)
    pub const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

    /// ecdsa-with-SHA1
    pub const ECDSA_WITH_SHA1: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");

    /// ecdsa-with-SHA256
    pub const ECDSA_WITH_SHA256: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

    /// id-dsa (DSA public key)
    pub const DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");

    /// dsa-with-sha1
    pub const DSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.3");

    /// dsa-with-sha256
    pub const DSA_WITH_SHA256: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.2");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmc_oids_under_arc() {
        for oid in [
            cmc::STATUS_INFO,
            cmc::IDENTITY_PROOF,
            cmc::DATA_RETURN,
            cmc::TRANSACTION_ID,
            cmc::SENDER_NONCE,
            cmc::RECIPIENT_NONCE,
            cmc::ENCRYPTED_POP,
            cmc::LRA_POP_WITNESS,
            cmc::GET_CERT,
            cmc::REVOKE_REQUEST,
            cmc::RESPONSE_INFO,
            cmc::POP_LINK_WITNESS,
            cmc::CONFIRM_CERT_ACCEPTANCE,
            cmc::STATUS_INFO_V2,
        ] {
            assert!(oid.to_string().starts_with(CMC_OID_ARC));
        }
    }

    #[test]
    fn test_control_oids_distinct() {
        // lraPOPWitness (11) and confirmCertAcceptance (24) are distinct
        // assignments; a mixup here silently mislabels controls on the wire.
        assert_ne!(cmc::LRA_POP_WITNESS, cmc::CONFIRM_CERT_ACCEPTANCE);
        assert_eq!(cmc::LRA_POP_WITNESS.to_string(), "1.3.6.1.5.5.7.7.11");
        assert_eq!(
            cmc::CONFIRM_CERT_ACCEPTANCE.to_string(),
            "1.3.6.1.5.5.7.7.24"
        );
    }

    #[test]
    fn test_content_type_oids() {
        assert_eq!(content::ID_CCT_PKI_DATA.to_string(), "1.3.6.1.5.5.7.12.2");
        assert_eq!(
            content::ID_CCT_PKI_RESPONSE.to_string(),
            "1.3.6.1.5.5.7.12.3"
        );
        assert_eq!(content::ID_SIGNED_DATA.to_string(), "1.2.840.113549.1.7.2");
    }
}
