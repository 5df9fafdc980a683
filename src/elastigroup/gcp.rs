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
    map, AttributePath, Block, Description, Diagnostics, NestedBlock, Schema, Value, ValueList,
    ValueMap, ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;

use crate::commons::fields::{from_key_values, from_user_data, key_values, user_data};
use crate::commons::schema::{
    boolean, id, number, optional, optional_computed, required, string, string_list, string_map,
};
use crate::commons::{unknown_if_null, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

use super::{validate_capacity, validate_spot_mix};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElastigroupGcpState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub max_size: ValueNumber,
    pub min_size: ValueNumber,
    pub desired_capacity: ValueNumber,
    pub preemptible_percentage: ValueNumber,
    pub ondemand_count: ValueNumber,
    pub fallback_to_ondemand: ValueBool,
    pub draining_timeout: ValueNumber,
    pub instance_types_ondemand: ValueString<'a>,
    pub instance_types_preemptible: ValueList<ValueString<'a>>,
    pub availability_zones: ValueList<ValueString<'a>>,
    pub service_account: ValueString<'a>,
    pub startup_script: ValueString<'a>,
    pub ip_forwarding: ValueBool,
    pub tags: ValueList<ValueString<'a>>,
    pub labels: ValueMap<'a, ValueString<'a>>,
    pub metadata: ValueMap<'a, ValueString<'a>>,
    pub network_interface: ValueList<Value<GcpNetworkInterface<'a>>>,
}
with_id!(ElastigroupGcpState);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpNetworkInterface<'a> {
    #[serde(borrow = "'a")]
    pub network: ValueString<'a>,
    pub access_configs: ValueList<Value<AccessConfig<'a>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    #[serde(rename = "type")]
    pub access_type: ValueString<'a>,
}

/// GCP elastigroup
#[derive(Debug, Default, Clone, Copy)]
pub struct ElastigroupGcp;

#[async_trait]
impl ApiObject for ElastigroupGcp {
    type State<'a> = ElastigroupGcpState<'a>;

    const NAME: &'static str = "gcp elastigroup";
    const PATH: &'static str = "/gcp/gce/group";
    const KEY: &'static str = "group";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Elastigroup ID"),
                    "name" => required(string(), "Name of the group"),
                    "description" => optional(string(), "Description of the group"),
                    "max_size" => optional_computed(number(), "Maximum number of instances"),
                    "min_size" => optional_computed(number(), "Minimum number of instances"),
                    "desired_capacity" => optional_computed(number(), "Number of instances to launch"),
                    "preemptible_percentage" => optional(number(), "Percentage of preemptible instances"),
                    "ondemand_count" => optional(number(), "Number of on-demand instances"),
                    "fallback_to_ondemand" => optional(boolean(), "Launch on-demand instances when no preemptible is available"),
                    "draining_timeout" => optional_computed(number(), "Seconds to drain an instance before termination"),
                    "instance_types_ondemand" => optional(string(), "On-demand machine type"),
                    "instance_types_preemptible" => optional(string_list(), "Preemptible machine types"),
                    "availability_zones" => optional(string_list(), "Zones of the instances"),
                    "service_account" => optional(string(), "Service account of the instances"),
                    "startup_script" => optional(string(), "Startup script of the instances"),
                    "ip_forwarding" => optional(boolean(), "Allow the instances to forward packets"),
                    "tags" => optional(string_list(), "Network tags of the instances"),
                    "labels" => optional(string_map(), "Labels of the instances"),
                    "metadata" => optional(string_map(), "Metadata of the instances"),
                },
                blocks: map! {
                    "network_interface" => NestedBlock::List(Block {
                        attributes: map! {
                            "network" => required(string(), "Network of the interface"),
                        },
                        blocks: map! {
                            "access_configs" => NestedBlock::List(Block {
                                attributes: map! {
                                    "name" => optional(string(), "Name of the access configuration"),
                                    "type" => optional(string(), "Type of the access configuration"),
                                },
                                description: Description::plain("External access of the interface"),
                                ..Default::default()
                            }),
                        },
                        description: Description::plain("Network interface of the instances"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Spotinst elastigroup on GCP"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &ElastigroupGcpState<'a>) {
        validate_capacity(diags, config.min_size, config.desired_capacity, config.max_size);
        validate_spot_mix(
            diags,
            "preemptible_percentage",
            config.preemptible_percentage,
            "ondemand_count",
            config.ondemand_count,
        );
        if config.instance_types_ondemand.is_null() && config.instance_types_preemptible.is_null() {
            diags.error_short(
                "At least one of `instance_types_ondemand` and `instance_types_preemptible` is required",
                AttributePath::new("instance_types_preemptible"),
            );
        }
    }

    fn expand<'a>(&self, state: &ElastigroupGcpState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set("/description", &state.description)
            .set("/capacity/maximum", &state.max_size)
            .set("/capacity/minimum", &state.min_size)
            .set("/capacity/target", &state.desired_capacity)
            .set("/strategy/preemptiblePercentage", &state.preemptible_percentage)
            .set("/strategy/onDemandCount", &state.ondemand_count)
            .set("/strategy/fallbackToOd", &state.fallback_to_ondemand)
            .set("/strategy/drainingTimeout", &state.draining_timeout)
            .set("/compute/instanceTypes/ondemand", &state.instance_types_ondemand)
            .set("/compute/instanceTypes/preemptible", &state.instance_types_preemptible)
            .set("/compute/availabilityZones", &state.availability_zones)
            .set("/compute/launchSpecification/serviceAccount", &state.service_account)
            .set_with("/compute/launchSpecification/startupScript", &state.startup_script, user_data)
            .set("/compute/launchSpecification/ipForwarding", &state.ip_forwarding)
            .set("/compute/launchSpecification/tags", &state.tags)
            .set_with("/compute/launchSpecification/labels", &state.labels, |labels| {
                key_values(labels, "key", "value")
            })
            .set_with("/compute/launchSpecification/metadata", &state.metadata, |metadata| {
                key_values(metadata, "key", "value")
            })
            .blocks(
                "/compute/networkInterfaces",
                &state.network_interface,
                |document, interface| {
                    document.set("/network", &interface.network).blocks(
                        "/accessConfigs",
                        &interface.access_configs,
                        |document, access| {
                            document
                                .set("/name", &access.name)
                                .set("/type", &access.access_type);
                        },
                    );
                },
            );
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut ElastigroupGcpState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.description, "/description");
        remote.computed(&mut state.max_size, "/capacity/maximum");
        remote.computed(&mut state.min_size, "/capacity/minimum");
        remote.computed(&mut state.desired_capacity, "/capacity/target");
        remote.optional(&mut state.preemptible_percentage, "/strategy/preemptiblePercentage");
        remote.optional(&mut state.ondemand_count, "/strategy/onDemandCount");
        remote.optional(&mut state.fallback_to_ondemand, "/strategy/fallbackToOd");
        remote.computed(&mut state.draining_timeout, "/strategy/drainingTimeout");
        remote.optional(&mut state.instance_types_ondemand, "/compute/instanceTypes/ondemand");
        remote.optional(
            &mut state.instance_types_preemptible,
            "/compute/instanceTypes/preemptible",
        );
        remote.optional(&mut state.availability_zones, "/compute/availabilityZones");

        let launch = |pointer: &str| format!("/compute/launchSpecification{}", pointer);
        remote.optional(&mut state.service_account, &launch("/serviceAccount"));
        remote.optional_with(&mut state.startup_script, &launch("/startupScript"), from_user_data);
        remote.optional(&mut state.ip_forwarding, &launch("/ipForwarding"));
        remote.optional(&mut state.tags, &launch("/tags"));
        remote.optional_with(&mut state.labels, &launch("/labels"), |json| {
            from_key_values(json, "key", "value")
        });
        remote.optional_with(&mut state.metadata, &launch("/metadata"), |json| {
            from_key_values(json, "key", "value")
        });

        remote.blocks(
            &mut state.network_interface,
            "/compute/networkInterfaces",
            |interface, remote| {
                remote.optional(&mut interface.network, "/network");
                remote.blocks(&mut interface.access_configs, "/accessConfigs", |access, remote| {
                    remote.optional(&mut access.name, "/name");
                    remote.optional(&mut access.access_type, "/type");
                });
            },
        );
    }

    fn plan_create<'a>(&self, state: &mut ElastigroupGcpState<'a>) {
        unknown_if_null(&mut state.max_size);
        unknown_if_null(&mut state.min_size);
        unknown_if_null(&mut state.desired_capacity);
        unknown_if_null(&mut state.draining_timeout);
    }
}
