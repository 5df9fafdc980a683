// This file is part of the terraform-provider-spotinst project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
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

//! Multai load balancer: balancers, target sets and targets

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::Value as Json;
use tf_provider::ValueString;

use crate::commons::fields::{from_key_values, key_values};

mod balancer;
mod target;
mod target_set;

pub use balancer::{MultaiBalancer, MultaiBalancerState, Timeouts};
pub use target::{MultaiTarget, MultaiTargetState};
pub use target_set::{MultaiTargetSet, MultaiTargetSetState, TargetSetHealthCheck};

/// Multai tags are `{"key", "value"}` pairs
fn tags(map: &BTreeMap<Cow<str>, ValueString>) -> Json {
    key_values(map, "key", "value")
}

fn from_tags<'a>(json: &Json) -> Option<BTreeMap<Cow<'a, str>, ValueString<'a>>> {
    from_key_values(json, "key", "value")
}
