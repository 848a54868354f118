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

//! Error types for the CMC toolkit.
//!
//! This module defines all error types that can occur while assembling,
//! signing, or parsing CMC messages and while verifying signed audit logs.

use thiserror::Error;

/// Result type alias using [`CmcError`].
pub type Result<T> = std::result::Result<T, CmcError>;

/// Errors that can occur during CMC message handling and audit verification.
#[derive(Debug, Error)]
pub enum CmcError {
    /// Invalid or missing configuration parameter.
    ///
    /// Reported before any assembly work begins; no partial output is
    /// produced.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The signing key's type is not one of RSA, EC, or DSA.
    #[error("Unsupported signing key type: {0}")]
    UnsupportedKeyType(String),

    /// A digest, signature, or verification primitive failed.
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    /// Input decoded as ASN.1 but violates the expected message structure.
    #[error("Malformed structure: {0}")]
    Malformed(String),

    /// The peer produced a message that violates the CMC protocol contract.
    ///
    /// Example: a PEND status without the pending token that identifies the
    /// request being tracked.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// No certificate matches the requested nickname.
    #[error("Certificate not found: {0}")]
    CertificateNotFound(String),

    /// No private key is available for the resolved certificate.
    #[error("Private key not found for certificate: {0}")]
    KeyNotFound(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// DER encoding/decoding error.
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CmcError {
    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unsupported key type error with the given description.
    pub fn unsupported_key_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedKeyType(msg.into())
    }

    /// Create a cryptographic error with the given message.
    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    /// Create a malformed structure error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a protocol violation error with the given message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a certificate lookup error for the given nickname.
    pub fn certificate_not_found(nickname: impl Into<String>) -> Self {
        Self::CertificateNotFound(nickname.into())
    }

    /// Create a private key lookup error for the given certificate subject.
    pub fn key_not_found(subject: impl Into<String>) -> Self {
        Self::KeyNotFound(subject.into())
    }

    /// Returns true if this error was caused by caller-supplied parameters
    /// rather than by message content or cryptographic state.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this error was raised while decoding input bytes.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Der(_) | Self::Malformed(_) | Self::Base64(_))
    }

    /// Process exit code for a run aborted by this error.
    ///
    /// Fatal errors map to 1 by convention. Runs that complete but record
    /// verification failures exit 2; that code comes from the pass/fail
    /// report types, not from an error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CmcError::config("revocation reason is required");
        assert_eq!(
            err.to_string(),
            "Configuration error: revocation reason is required"
        );

        let err = CmcError::unsupported_key_type("1.2.840.113549.1.3.1");
        assert_eq!(
            err.to_string(),
            "Unsupported signing key type: 1.2.840.113549.1.3.1"
        );

        let err = CmcError::protocol("PEND status without pending token");
        assert_eq!(
            err.to_string(),
            "Protocol violation: PEND status without pending token"
        );
    }

    #[test]
    fn test_classification() {
        assert!(CmcError::config("missing nickname").is_configuration());
        assert!(!CmcError::crypto("bad digest").is_configuration());

        assert!(CmcError::malformed("truncated control sequence").is_decode());
        assert!(!CmcError::config("missing nickname").is_decode());
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(CmcError::config("x").exit_code(), 1);
        assert_eq!(CmcError::crypto("y").exit_code(), 1);
    }
}
