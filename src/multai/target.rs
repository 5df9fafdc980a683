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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tf_provider::{
    map, AttributePath, Block, Description, Diagnostics, Schema, Value, ValueMap, ValueNumber,
    ValueString,
};

use super::{from_tags, tags};
use crate::commons::schema::{id, number, optional, required, string, string_map};
use crate::commons::{force_new, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultaiTargetState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub balancer_id: ValueString<'a>,
    pub target_set_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub host: ValueString<'a>,
    pub port: ValueNumber,
    pub weight: ValueNumber,
    pub tags: ValueMap<'a, ValueString<'a>>,
}
with_id!(MultaiTargetState);

#[derive(Debug, Default, Clone, Copy)]
pub struct MultaiTarget;

#[async_trait]
impl ApiObject for MultaiTarget {
    type State<'a> = MultaiTargetState<'a>;

    const NAME: &'static str = "multai target";
    const PATH: &'static str = "/loadBalancer/target";
    const KEY: &'static str = "target";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Target ID"),
                    "balancer_id" => required(string(), "ID of the balancer"),
                    "target_set_id" => required(string(), "ID of the target set"),
                    "name" => optional(string(), "Name of the target"),
                    "host" => required(string(), "Address of the target"),
                    "port" => optional(number(), "Port of the target"),
                    "weight" => required(number(), "Weight of the target in the target set"),
                    "tags" => optional(string_map(), "Tags of the target"),
                },
                description: Description::plain("Multai target"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &MultaiTargetState<'a>) {
        if let Value::Value(port) = config.port {
            if !(1..=65535).contains(&port) {
                diags.error_short("`port` must be between 1 and 65535", AttributePath::new("port"));
            }
        }
    }

    fn expand<'a>(&self, state: &MultaiTargetState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set_on_create("/balancerId", &state.balancer_id)
            .set_on_create("/targetSetId", &state.target_set_id)
            .set("/name", &state.name)
            .set("/host", &state.host)
            .set("/port", &state.port)
            .set("/weight", &state.weight)
            .set_with("/tags", &state.tags, tags);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut MultaiTargetState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.balancer_id, "/balancerId");
        remote.optional(&mut state.target_set_id, "/targetSetId");
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.host, "/host");
        remote.optional(&mut state.port, "/port");
        remote.optional(&mut state.weight, "/weight");
        remote.optional_with(&mut state.tags, "/tags", from_tags);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &MultaiTargetState<'a>,
        proposed: &MultaiTargetState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "balancer_id", &prior.balancer_id, &proposed.balancer_id);
        force_new(&mut triggers, "target_set_id", &prior.target_set_id, &proposed.target_set_id);
        triggers
    }
}
