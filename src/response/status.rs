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

//! Evaluation of `CMCStatusInfoV2` entries.
//!
//! A response can carry several status entries, one per batch of body part
//! IDs, and each is judged on its own. Only one condition is fatal for the
//! whole response: a pending status without a `pendToken`, which leaves the
//! client no way to ever query the request again.

use std::fmt;

use crate::error::{CmcError, Result};
use crate::types::controls::{CmcFailInfo, CmcStatus, CmcStatusInfoV2, OtherInfo};

/// What one status entry means for the request parts it covers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StatusVerdict {
    /// The covered body parts were processed successfully.
    Success,
    /// The server wants an explicit `confirmCertAcceptance` round trip.
    /// Not a failure.
    ConfirmRequired,
    /// The covered body parts failed. `fail_info` is `None` when the server
    /// sent no usable failure detail.
    Failed {
        /// Decoded failure reason, when present and in the known table.
        fail_info: Option<CmcFailInfo>,
    },
    /// The request is queued server-side; poll later quoting `token`.
    Pending {
        /// Server-assigned pending-request identifier.
        token: Vec<u8>,
        /// Suggested check-back time, already formatted for display.
        time: Option<String>,
    },
}

/// One evaluated status entry, ready for reporting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusReport {
    /// Body part IDs this entry covers.
    pub body_list: Vec<u32>,
    /// Raw CMC status code as received.
    pub status: u32,
    /// Server-supplied free text, if any.
    pub status_string: Option<String>,
    /// The evaluated outcome.
    pub verdict: StatusVerdict,
}

impl StatusReport {
    /// Protocol name for the status code, or `"unknown"` for codes outside
    /// the RFC table.
    pub fn status_label(&self) -> &'static str {
        CmcStatus::from_u32(self.status)
            .map(|status| status.label())
            .unwrap_or("unknown")
    }

    /// True when the covered request parts need no further action.
    pub fn is_success(&self) -> bool {
        self.verdict == StatusVerdict::Success
    }

    /// True when this entry represents a hard failure.
    pub fn is_failure(&self) -> bool {
        matches!(self.verdict, StatusVerdict::Failed { .. })
    }

    /// True when the request is parked server-side.
    pub fn is_pending(&self) -> bool {
        matches!(self.verdict, StatusVerdict::Pending { .. })
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} ({})", self.status_label(), self.status)?;
        if !self.body_list.is_empty() {
            write!(f, " for body parts {:?}", self.body_list)?;
        }
        if let Some(text) = &self.status_string {
            write!(f, ": {}", text)?;
        }
        match &self.verdict {
            StatusVerdict::Success => Ok(()),
            StatusVerdict::ConfirmRequired => {
                write!(f, "; certificate acceptance confirmation required")
            }
            StatusVerdict::Failed {
                fail_info: Some(reason),
            } => write!(f, "; failed: {}", reason.description()),
            StatusVerdict::Failed { fail_info: None } => {
                write!(f, "; failed: fail info missing")
            }
            StatusVerdict::Pending { token, time } => {
                write!(f, "; pending as request {}", String::from_utf8_lossy(token))?;
                if let Some(time) = time {
                    write!(f, ", check after {}", time)?;
                }
                Ok(())
            }
        }
    }
}

/// Judge one status entry.
///
/// Success and confirm-required are decided by the status code alone; every
/// other code is interpreted through the attached `OtherInfo`. A pending
/// entry without a `pendToken` is a protocol violation that terminates
/// response processing.
pub fn evaluate(info: &CmcStatusInfoV2) -> Result<StatusReport> {
    let verdict = match CmcStatus::from_u32(info.status) {
        Some(CmcStatus::Success) => StatusVerdict::Success,
        Some(CmcStatus::ConfirmRequired) => StatusVerdict::ConfirmRequired,
        _ => match &info.other_info {
            None => StatusVerdict::Failed { fail_info: None },
            Some(OtherInfo::Fail(code)) => {
                let fail_info = CmcFailInfo::from_u32(*code);
                if fail_info.is_none() {
                    tracing::warn!("fail info code {} not in the reason table", code);
                }
                StatusVerdict::Failed { fail_info }
            }
            Some(OtherInfo::Pend(pend)) => {
                let token = pend.pend_token.as_ref().ok_or_else(|| {
                    CmcError::protocol("pending status carries no pendToken; request cannot be tracked")
                })?;
                StatusVerdict::Pending {
                    token: token.as_bytes().to_vec(),
                    time: pend.pend_time.map(|time| time.to_date_time().to_string()),
                }
            }
        },
    };

    Ok(StatusReport {
        body_list: info.body_list.clone(),
        status: info.status,
        status_string: info.status_string.clone(),
        verdict,
    })
}
