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

//! Signed audit log verification.
//!
//! A signing-enabled CA periodically emits a log line containing
//! [`SIGNING_MARKER`] and a `sig: <base64>` field. The signature covers every
//! line written since the previous marker, starting with the previous marker
//! line itself and ending with the line just before the new marker. Each line
//! is hashed with a single `\n` terminator no matter what line endings the
//! file on disk uses, so logs survive platform round trips.
//!
//! Files supplied to [`AuditLogVerifier::verify_files`] form one logical
//! stream in the order given; a span may begin near the end of one file and
//! close in the next, and reordering the files breaks verification. The first
//! marker in the stream closes a span whose beginning predates the stream
//! (typically lost to log rotation), so its signature is discarded rather
//! than reported as a failure.
//!
//! Verification failures are counted, not thrown: a tampered span, a marker
//! line missing its `sig:` field, and unsigned trailing data all increment
//! the failure count while the rest of the stream is still checked. Only
//! unreadable input aborts the run.

use std::fmt;
use std::fs;
use std::path::Path;

use spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

use crate::encoding;
use crate::error::Result;
use crate::token::{DigestAlgorithm, KeyType, SignatureAlgorithm, SignatureVerifier};

/// Literal that marks a signature line in the audit log.
pub const SIGNING_MARKER: &str = "AUDIT_LOG_SIGNING";

/// Field prefix introducing the base64 signature payload on a marker line.
const SIGNATURE_PREFIX: &str = "sig: ";

/// Line range of one signature span within the logical stream.
///
/// `start` is the marker line that opened the span; `stop` is the last line
/// covered by the closing signature, which lives on the line after `stop`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanRange {
    /// File containing the first covered line.
    pub start_file: String,
    /// 1-based line number of the first covered line.
    pub start_line: usize,
    /// File containing the last covered line.
    pub stop_file: String,
    /// 1-based line number of the last covered line.
    pub stop_line: usize,
}

impl fmt::Display for SpanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}:{}",
            self.start_file, self.start_line, self.stop_file, self.stop_line
        )
    }
}

/// Outcome of checking one span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanVerdict {
    /// The signature verified over the span bytes.
    Good,
    /// The signature did not verify, or the check itself failed.
    BadSignature,
    /// The closing marker line carried no usable `sig:` payload.
    MalformedMarker,
    /// Lines after the last marker were never signed.
    UnsignedTail,
}

impl SpanVerdict {
    /// Whether this verdict counts toward the failure total.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Good)
    }
}

impl fmt::Display for SpanVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "valid signature",
            Self::BadSignature => "signature verification failed",
            Self::MalformedMarker => "malformed signature line",
            Self::UnsignedTail => "unsigned trailing data",
        })
    }
}

/// One checked span: where it lies and how it fared.
#[derive(Clone, Debug)]
pub struct SignatureSpan {
    /// Line range the span covers.
    pub range: SpanRange,
    /// What the check concluded.
    pub verdict: SpanVerdict,
}

/// Aggregate result of a verification run.
///
/// Machine consumers should rely on the counters and [`exit_code`], not on
/// the rendered text.
///
/// [`exit_code`]: AuditReport::exit_code
#[derive(Clone, Debug, Default)]
pub struct AuditReport {
    /// Spans whose signature verified.
    pub good_signatures: usize,
    /// Failed spans: bad signatures, malformed markers, and unsigned tails.
    pub bad_signatures: usize,
    /// Every checked span in stream order.
    pub spans: Vec<SignatureSpan>,
}

impl AuditReport {
    /// The first checked span, if any signature was checked.
    pub fn first_span(&self) -> Option<&SignatureSpan> {
        self.spans.first()
    }

    /// The last checked span, if any signature was checked.
    pub fn last_span(&self) -> Option<&SignatureSpan> {
        self.spans.last()
    }

    /// True when at least one span failed.
    pub fn has_failures(&self) -> bool {
        self.bad_signatures > 0
    }

    /// Process exit code for a completed run: 0 when clean, 2 when the run
    /// finished but counted failures.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            2
        } else {
            0
        }
    }

    fn record(&mut self, span: SignatureSpan) {
        if span.verdict.is_failure() {
            self.bad_signatures += 1;
        } else {
            self.good_signatures += 1;
        }
        self.spans.push(span);
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} good signature(s), {} bad",
            self.good_signatures, self.bad_signatures
        )?;
        if let (Some(first), Some(last)) = (self.first_span(), self.last_span()) {
            write!(f, " over {} through {}", first.range, last.range)?;
        }
        Ok(())
    }
}

/// Position of a line within the stream, by file index.
#[derive(Clone, Copy)]
struct Position {
    file: usize,
    line: usize,
}

/// Checks the signature chain of one or more audit log files.
#[derive(Debug)]
pub struct AuditLogVerifier {
    public_key: SubjectPublicKeyInfoOwned,
    algorithm: SignatureAlgorithm,
}

impl AuditLogVerifier {
    /// Verify against the public key of the log signing certificate.
    ///
    /// Defaults to the SHA-256 signature algorithm for the key's type; use
    /// [`with_digest_algorithm`] for logs signed by older deployments.
    ///
    /// [`with_digest_algorithm`]: AuditLogVerifier::with_digest_algorithm
    pub fn for_certificate(certificate: &Certificate) -> Result<Self> {
        Self::for_public_key(certificate.tbs_certificate.subject_public_key_info.clone())
    }

    /// Verify against a bare public key.
    pub fn for_public_key(public_key: SubjectPublicKeyInfoOwned) -> Result<Self> {
        let key_type = KeyType::from_spki(&public_key)?;
        let algorithm = SignatureAlgorithm::for_key(key_type, DigestAlgorithm::Sha256)?;
        Ok(Self {
            public_key,
            algorithm,
        })
    }

    /// Switch the digest half of the signature algorithm.
    pub fn with_digest_algorithm(mut self, digest: DigestAlgorithm) -> Result<Self> {
        let key_type = KeyType::from_spki(&self.public_key)?;
        self.algorithm = SignatureAlgorithm::for_key(key_type, digest)?;
        Ok(self)
    }

    /// The signature algorithm spans are checked with.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Walk the files as one logical stream and check every signature span.
    ///
    /// File order is significant and must match the order the log was
    /// written in. Returns an error only for unreadable input; signature
    /// failures are reported through the returned [`AuditReport`].
    pub fn verify_files<V, P>(&self, verifier: &V, paths: &[P]) -> Result<AuditReport>
    where
        V: SignatureVerifier + ?Sized,
        P: AsRef<Path>,
    {
        let mut report = AuditReport::default();
        let mut file_names: Vec<String> = Vec::with_capacity(paths.len());
        let mut context: Vec<u8> = Vec::new();
        let mut lines_in_context = 0usize;
        let mut open_span: Option<Position> = None;
        let mut last_line: Option<Position> = None;

        for (file_index, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let content = fs::read_to_string(path)?;
            file_names.push(path.display().to_string());
            tracing::debug!("reading audit log {}", path.display());

            for (offset, line) in content.lines().enumerate() {
                let here = Position {
                    file: file_index,
                    line: offset + 1,
                };

                if line.contains(SIGNING_MARKER) {
                    match open_span.take() {
                        None => {
                            // The first signature covers lines that precede
                            // the stream and cannot be rechecked.
                            tracing::debug!(
                                "discarding first signature at {}:{}",
                                file_names[here.file],
                                here.line
                            );
                        }
                        Some(start) => {
                            let stop = last_line.unwrap_or(here);
                            let range = span_range(&file_names, start, stop);
                            let verdict = self.check_span(verifier, line, &context, &range);
                            report.record(SignatureSpan { range, verdict });
                        }
                    }
                    context.clear();
                    lines_in_context = 0;
                    open_span = Some(here);
                }

                if open_span.is_some() {
                    // Canonical \n regardless of the file's line endings.
                    context.extend_from_slice(line.as_bytes());
                    context.push(b'\n');
                    lines_in_context += 1;
                }
                last_line = Some(here);
            }
        }

        match open_span {
            None => {
                tracing::warn!(
                    "no {} markers in {} file(s); nothing was verifiable",
                    SIGNING_MARKER,
                    paths.len()
                );
            }
            Some(start) => {
                // The closing marker alone carries over into the open span;
                // anything past it was never signed.
                if lines_in_context > 1 {
                    let stop = last_line.unwrap_or(start);
                    let range = span_range(&file_names, start, stop);
                    tracing::warn!("unsigned data after the last signature, {}", range);
                    report.record(SignatureSpan {
                        range,
                        verdict: SpanVerdict::UnsignedTail,
                    });
                }
            }
        }

        tracing::debug!(
            "audit verification complete: {} good, {} bad",
            report.good_signatures,
            report.bad_signatures
        );
        Ok(report)
    }

    fn check_span<V>(
        &self,
        verifier: &V,
        marker_line: &str,
        span: &[u8],
        range: &SpanRange,
    ) -> SpanVerdict
    where
        V: SignatureVerifier + ?Sized,
    {
        let payload = match signature_payload(marker_line) {
            Some(payload) => payload,
            None => {
                tracing::warn!("signature line closing {} has no sig: field", range);
                return SpanVerdict::MalformedMarker;
            }
        };
        let signature = match encoding::decode_base64(payload.as_bytes()) {
            Ok(signature) => signature,
            Err(err) => {
                tracing::warn!("signature payload closing {} is not base64: {}", range, err);
                return SpanVerdict::MalformedMarker;
            }
        };
        match verifier.verify(self.algorithm, &self.public_key, &signature, span) {
            Ok(true) => {
                tracing::debug!("good signature over {}", range);
                SpanVerdict::Good
            }
            Ok(false) => {
                tracing::warn!("signature mismatch over {}", range);
                SpanVerdict::BadSignature
            }
            Err(err) => {
                tracing::warn!("could not check signature over {}: {}", range, err);
                SpanVerdict::BadSignature
            }
        }
    }
}

fn span_range(file_names: &[String], start: Position, stop: Position) -> SpanRange {
    SpanRange {
        start_file: file_names[start.file].clone(),
        start_line: start.line,
        stop_file: file_names[stop.file].clone(),
        stop_line: stop.line,
    }
}

/// Extract the base64 payload following `sig: `, if the line carries one.
fn signature_payload(line: &str) -> Option<&str> {
    let at = line.find(SIGNATURE_PREFIX)?;
    let payload = line[at + SIGNATURE_PREFIX.len()..].trim();
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}
