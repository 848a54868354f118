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

//! CMC message types.
//!
//! This module provides the ASN.1 structures for CMC request and response
//! bodies (RFC 5272), the typed control attribute values, the CRMF request
//! subset carried inside them (RFC 4211), and the OID tables for controls,
//! content types, and algorithms.

pub mod cmc;
pub mod controls;
pub mod crmf;
pub mod oid;

pub use cmc::{
    BodyPartId, OtherMsg, PkiData, ResponseBody, TaggedAttribute, TaggedCertificationRequest,
    TaggedContentInfo, TaggedRequest,
};
pub use controls::{
    parse_crl_reason, CmcCertId, CmcFailInfo, CmcStatus, CmcStatusInfoV2, GetCert, LraPopWitness,
    OtherInfo, PendInfo, RevokeRequest,
};
pub use crmf::{CertReqMessages, CertReqMsg, ProofOfPossession};
