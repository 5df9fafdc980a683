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
    map, value, AttributePath, Block, Description, Diagnostics, NestedBlock, Schema, Value,
    ValueMap, ValueNumber, ValueString,
};

use super::{from_tags, tags};
use crate::commons::schema::{id, number, optional, required, string, string_map};
use crate::commons::{force_new, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultaiTargetSetState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub balancer_id: ValueString<'a>,
    pub deployment_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub port: ValueNumber,
    pub weight: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub health_check: Value<TargetSetHealthCheck<'a>>,
    pub tags: ValueMap<'a, ValueString<'a>>,
}
with_id!(MultaiTargetSetState);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSetHealthCheck<'a> {
    #[serde(borrow = "'a")]
    pub protocol: ValueString<'a>,
    pub path: ValueString<'a>,
    pub port: ValueNumber,
    pub interval: ValueNumber,
    pub timeout: ValueNumber,
    pub healthy_threshold: ValueNumber,
    pub unhealthy_threshold: ValueNumber,
}

const PROTOCOLS: &[&str] = &["http", "https"];

#[derive(Debug, Default, Clone, Copy)]
pub struct MultaiTargetSet;

fn check_protocol(diags: &mut Diagnostics, protocol: &ValueString, path: AttributePath) {
    if let Some(protocol) = protocol.as_deref_option() {
        if !PROTOCOLS.contains(&protocol) {
            diags.error(
                "Invalid protocol",
                format!("`{}` is not one of {}", protocol, PROTOCOLS.join(", ")),
                path,
            );
        }
    }
}

#[async_trait]
impl ApiObject for MultaiTargetSet {
    type State<'a> = MultaiTargetSetState<'a>;

    const NAME: &'static str = "multai target set";
    const PATH: &'static str = "/loadBalancer/targetSet";
    const KEY: &'static str = "targetSet";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Target set ID"),
                    "balancer_id" => required(string(), "ID of the balancer"),
                    "deployment_id" => required(string(), "ID of the deployment"),
                    "name" => required(string(), "Name of the target set"),
                    "protocol" => required(string(), "http or https"),
                    "port" => optional(number(), "Port of the targets"),
                    "weight" => required(number(), "Weight of the target set in the balancer"),
                    "tags" => optional(string_map(), "Tags of the target set"),
                },
                blocks: map! {
                    "health_check" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "protocol" => required(string(), "http or https"),
                            "path" => required(string(), "Path to check"),
                            "port" => optional(number(), "Port to check"),
                            "interval" => required(number(), "Seconds between two checks"),
                            "timeout" => required(number(), "Seconds before a check fails"),
                            "healthy_threshold" => required(number(), "Successful checks before a target is healthy"),
                            "unhealthy_threshold" => required(number(), "Failed checks before a target is unhealthy"),
                        },
                        description: Description::plain("Health check of the targets"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Multai target set"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &MultaiTargetSetState<'a>) {
        check_protocol(diags, &config.protocol, AttributePath::new("protocol"));
        if let Value::Value(health_check) = &config.health_check {
            check_protocol(
                diags,
                &health_check.protocol,
                AttributePath::new("health_check").index(0).attribute("protocol"),
            );
        }
        if let Value::Value(weight) = config.weight {
            if !(0..=100).contains(&weight) {
                diags.error_short(
                    "`weight` must be between 0 and 100",
                    AttributePath::new("weight"),
                );
            }
        }
    }

    fn expand<'a>(&self, state: &MultaiTargetSetState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set_on_create("/balancerId", &state.balancer_id)
            .set("/deploymentId", &state.deployment_id)
            .set("/name", &state.name)
            .set("/protocol", &state.protocol)
            .set("/port", &state.port)
            .set("/weight", &state.weight)
            .block("/healthCheck", &state.health_check, |document, check| {
                document
                    .set("/protocol", &check.protocol)
                    .set("/path", &check.path)
                    .set("/port", &check.port)
                    .set("/interval", &check.interval)
                    .set("/timeout", &check.timeout)
                    .set("/healthyThreshold", &check.healthy_threshold)
                    .set("/unhealthyThreshold", &check.unhealthy_threshold);
            })
            .set_with("/tags", &state.tags, tags);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut MultaiTargetSetState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.balancer_id, "/balancerId");
        remote.optional(&mut state.deployment_id, "/deploymentId");
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.protocol, "/protocol");
        remote.optional(&mut state.port, "/port");
        remote.optional(&mut state.weight, "/weight");
        remote.block(&mut state.health_check, "/healthCheck", |check, remote| {
            remote.optional(&mut check.protocol, "/protocol");
            remote.optional(&mut check.path, "/path");
            remote.optional(&mut check.port, "/port");
            remote.optional(&mut check.interval, "/interval");
            remote.optional(&mut check.timeout, "/timeout");
            remote.optional(&mut check.healthy_threshold, "/healthyThreshold");
            remote.optional(&mut check.unhealthy_threshold, "/unhealthyThreshold");
        });
        remote.optional_with(&mut state.tags, "/tags", from_tags);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &MultaiTargetSetState<'a>,
        proposed: &MultaiTargetSetState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "balancer_id", &prior.balancer_id, &proposed.balancer_id);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use tf_provider::{Diagnostics, Value};

    use super::{MultaiTargetSet, MultaiTargetSetState, TargetSetHealthCheck};
    use crate::commons::ApiObject;

    #[test]
    fn validate() {
        let mut config = MultaiTargetSetState {
            protocol: Value::Value(Cow::from("http")),
            weight: Value::Value(50),
            health_check: Value::Value(TargetSetHealthCheck {
                protocol: Value::Value(Cow::from("https")),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        MultaiTargetSet.validate(&mut diags, &config);
        assert!(diags.errors.is_empty());

        config.protocol = Value::Value(Cow::from("tcp"));
        config.weight = Value::Value(150);
        MultaiTargetSet.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn balancer_change_replaces() {
        let prior = MultaiTargetSetState {
            balancer_id: Value::Value(Cow::from("lb-1")),
            weight: Value::Value(1),
            ..Default::default()
        };
        let mut proposed = prior.clone();
        proposed.weight = Value::Value(2);
        assert!(MultaiTargetSet.replace_triggers(&prior, &proposed).is_empty());

        proposed.balancer_id = Value::Unknown;
        assert_eq!(MultaiTargetSet.replace_triggers(&prior, &proposed).len(), 1);
    }
}
