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

//! Verifies a rotated, ECDSA-signed audit log stream the way the CLI layer
//! would: real signatures, multiple files, and a mix of clean and damaged
//! spans in one run.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use der::Decode;
use p256::ecdsa::{DerSignature, SigningKey};
use spki::{EncodePublicKey, SubjectPublicKeyInfoOwned};
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;
use x509_cert::Certificate;

use cmc_toolkit::audit::{AuditLogVerifier, SpanVerdict, SIGNING_MARKER};
use cmc_toolkit::encoding::encode_base64;
use cmc_toolkit::token::software::SoftwareToken;
use cmc_toolkit::token::{
    CertificateStore, DigestAlgorithm, KeyHandle, MessageSigner, SignatureAlgorithm,
};

/// Writes audit logs the way a signing-enabled CA does: every line feeds the
/// running context, and each marker signs the context accumulated since the
/// previous marker (starting with that marker's own line).
struct LogSigner {
    token: SoftwareToken,
    certificate: Certificate,
    handle: KeyHandle,
    /// Bytes accumulated since the last emitted marker.
    context: Vec<u8>,
    /// Lines of the file currently being written.
    lines: Vec<String>,
}

impl LogSigner {
    fn new() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let spki_der = signing_key.verifying_key().to_public_key_der().expect("SPKI DER");
        let spki = SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).expect("SPKI decode");
        let subject = Name::from_str("CN=CA Audit Signing Certificate").expect("subject DN");
        let builder = CertificateBuilder::new(
            Profile::Root,
            SerialNumber::from(3u32),
            Validity::from_now(Duration::from_secs(3600)).expect("validity"),
            subject,
            spki,
            &signing_key,
        )
        .expect("certificate builder");
        let certificate = builder.build::<DerSignature>().expect("certificate");

        let mut token = SoftwareToken::new();
        token
            .insert("audit", certificate.clone(), Vec::new(), signing_key)
            .expect("token insert");
        let handle = token.find_private_key(&certificate).expect("key handle");

        Self {
            token,
            certificate,
            handle,
            context: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn event(&mut self, text: &str) {
        self.context.extend_from_slice(text.as_bytes());
        self.context.push(b'\n');
        self.lines.push(text.to_string());
    }

    /// Emit a marker. The first marker's signature covers data from before
    /// this stream, so its payload is arbitrary.
    fn sign(&mut self) {
        let line = if self.context.is_empty() {
            format!("[AuditEvent={SIGNING_MARKER}] sig: cm90YXRlZA==")
        } else {
            let digest = DigestAlgorithm::Sha256.digest(&self.context);
            let signature = self
                .token
                .sign(SignatureAlgorithm::EcdsaWithSha256, &self.handle, &digest)
                .expect("signing");
            format!("[AuditEvent={SIGNING_MARKER}] sig: {}", encode_base64(&signature))
        };
        self.context.clear();
        self.event(&line);
    }

    /// Write the lines buffered so far as one log file and start the next.
    fn rotate(&mut self, dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut content = self.lines.join("\n");
        content.push('\n');
        fs::write(&path, content).expect("log write");
        self.lines.clear();
        path
    }
}

#[test]
fn test_rotated_stream_verifies_end_to_end() {
    let mut signer = LogSigner::new();
    let dir = tempfile::tempdir().expect("tempdir");

    signer.sign();
    signer.event("ROLE_ASSUME agent alice");
    signer.event("CERT_REQUEST_PROCESSED requestId=204 SUCCESS");
    signer.sign();
    signer.event("CONFIG_CHANGE profile=caUserCert");
    let first = signer.rotate(&dir, "audit.20260301.log");

    signer.event("CERT_REQUEST_PROCESSED requestId=205 REJECTED");
    signer.sign();
    signer.sign();
    let second = signer.rotate(&dir, "audit.20260302.log");

    let verifier = AuditLogVerifier::for_certificate(&signer.certificate).expect("verifier");
    let report = verifier
        .verify_files(&signer.token, &[first.clone(), second.clone()])
        .expect("verification");

    assert_eq!(report.good_signatures, 3);
    assert_eq!(report.bad_signatures, 0);
    assert_eq!(report.exit_code(), 0);

    // The second span opens in the first file and closes in the second.
    assert_eq!(report.spans[1].range.start_file, first.display().to_string());
    assert_eq!(report.spans[1].range.stop_file, second.display().to_string());
}

#[test]
fn test_tampering_and_truncation_are_both_counted() {
    let mut signer = LogSigner::new();
    let dir = tempfile::tempdir().expect("tempdir");

    signer.sign();
    signer.event("OCSP_REQUEST serial=0x4f21");
    signer.sign();
    signer.event("SELFTESTS_EXECUTION SUCCESS");
    signer.sign();
    signer.event("never signed, as after a crash");
    signer.event("also never signed");
    let log = signer.rotate(&dir, "audit.log");

    // Flip one covered byte after the fact.
    let tampered = fs::read_to_string(&log)
        .expect("read back")
        .replacen("serial=0x4f21", "serial=0x4f22", 1);
    fs::write(&log, tampered).expect("rewrite");

    let verifier = AuditLogVerifier::for_certificate(&signer.certificate).expect("verifier");
    let report = verifier
        .verify_files(&signer.token, &[log])
        .expect("verification");

    assert_eq!(report.good_signatures, 1);
    assert_eq!(report.bad_signatures, 2);
    assert_eq!(report.exit_code(), 2);

    let verdicts: Vec<SpanVerdict> = report.spans.iter().map(|span| span.verdict).collect();
    assert_eq!(
        verdicts,
        vec![
            SpanVerdict::BadSignature,
            SpanVerdict::Good,
            SpanVerdict::UnsignedTail,
        ]
    );
}
