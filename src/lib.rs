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

//! # cmc-toolkit
//!
//! A Rust implementation of CMC (Certificate Management over CMS, RFC 5272)
//! request construction, response parsing, and signed audit log verification
//! for certificate-authority tooling.
//!
//! CMC messages are CMS `SignedData` envelopes around a `PKIData` (requests
//! plus control attributes) or a `PKIResponse` (status and result controls).
//! This library builds and signs the request side, decodes and evaluates the
//! response side, and separately verifies the cryptographic signature chain
//! that a CA threads through its audit logs.
//!
//! ## Features
//!
//! - **Request assembly**: PKCS#10 and CRMF certification requests with the
//!   enrollment control set (transaction ID, nonces, identity proof, POP
//!   link witnesses, data return, getCert, confirmCertAcceptance)
//! - **Revocation requests** authenticated by shared secret or signed by the
//!   subject certificate itself
//! - **CMS signing** with the signature algorithm chosen from the key type
//!   (RSA, EC, or DSA)
//! - **Response parsing** with per-OID control dispatch and independent
//!   evaluation of every status entry in a batch response
//! - **Audit log verification** across multi-file streams with per-span
//!   pass/fail reporting
//! - **Pluggable key material**: signing, verification, and certificate
//!   lookup are capability traits, so HSM-backed and in-memory tokens plug
//!   in the same way
//!
//! ## Building and Signing a Request
//!
//! ```no_run
//! use cmc_toolkit::envelope;
//! use cmc_toolkit::request::CmcRequestBuilder;
//! # #[cfg(feature = "soft-token")]
//! use cmc_toolkit::token::software::SoftwareToken;
//!
//! # #[cfg(feature = "soft-token")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # fn load_csr() -> x509_cert::request::CertReq { unimplemented!() }
//! // Token previously loaded with the agent certificate and key.
//! let token = SoftwareToken::new();
//!
//! let pki_data = CmcRequestBuilder::new()
//!     .add_pkcs10_request(load_csr())
//!     .derived_transaction_id()
//!     .generated_sender_nonce()
//!     .build()?;
//!
//! let message = envelope::sign_enrollment_request(&pki_data, &token, &token, "agent")?;
//! std::fs::write("request.der", message.to_der()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Parsing a Response
//!
//! ```no_run
//! use cmc_toolkit::response::parse_response;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let der = std::fs::read("response.der")?;
//! let response = parse_response(&der)?;
//!
//! for certificate in response.certificates() {
//!     println!("issued: {}", certificate.tbs_certificate.subject);
//! }
//! for report in response.evaluate_statuses()? {
//!     println!("{report}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Verifying a Signed Audit Log
//!
//! ```no_run
//! use cmc_toolkit::audit::AuditLogVerifier;
//! use cmc_toolkit::Certificate;
//! # #[cfg(feature = "soft-token")]
//! use cmc_toolkit::token::software::SoftwareToken;
//!
//! # #[cfg(feature = "soft-token")]
//! # fn example(signing_certificate: Certificate) -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = AuditLogVerifier::for_certificate(&signing_certificate)?;
//! let report = verifier.verify_files(
//!     &SoftwareToken::new(),
//!     &["audit.log.1", "audit.log.2"],
//! )?;
//!
//! println!("{report}");
//! std::process::exit(report.exit_code());
//! # }
//! ```
//!
//! ## Cargo Features
//!
//! - `soft-token` (default): in-memory signer, verifier, and certificate
//!   store backed by the RustCrypto RSA/ECDSA/DSA crates
//!
//! ## RFC 5272 Coverage
//!
//! - Section 3.2.1: `PKIData` composition with body-part-ID bookkeeping
//! - Section 3.2.2: `PKIResponse` decoding
//! - Section 6.1: status evaluation, including fail-info and pend-info detail
//! - Section 6.3: proof-of-possession linking witnesses
//! - Sections 6.9-6.11: getCert, confirmCertAcceptance, and revokeRequest
//!
//! The transaction-ID, nonce, data-return, and identity-proof controls round
//! out the set an RA front end needs for unattended enrollment.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod audit;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod request;
pub mod response;
pub mod token;
pub mod types;

// Re-export main types at crate root for convenience
pub use audit::{AuditLogVerifier, AuditReport};
pub use envelope::SignedCmcMessage;
pub use error::{CmcError, Result};
pub use request::{CmcRequestBuilder, RevocationRequestBuilder};
pub use response::{parse_response, parse_response_base64, CmcResponse, StatusReport, StatusVerdict};
pub use token::{
    CertificateStore, DigestAlgorithm, KeyType, MessageSigner, SignatureAlgorithm,
    SignatureVerifier,
};
pub use types::cmc::PkiData;

// Re-export x509_cert::Certificate for convenience
pub use x509_cert::Certificate;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
