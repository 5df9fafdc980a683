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

//! Single AWS instance kept on spot capacity, with its data persisted across replacements

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tf_provider::{
    map, value, AttributePath, Block, Description, Diagnostics, NestedBlock, Schema, Value,
    ValueList, ValueMap, ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;

use crate::client::DeleteOptions;
use crate::commons::fields::{
    from_instance_profile, from_tags, from_user_data, instance_profile, tags, user_data,
};
use crate::commons::schema::{
    boolean, id, number, optional, optional_computed, required, string, string_list, string_map,
};
use crate::commons::{force_new, unknown_if_null, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

const LIFE_CYCLES: &[&str] = &["spot", "on_demand"];
const BLOCK_DEVICES_MODES: &[&str] = &["reattach", "onLaunch"];
const ORIENTATIONS: &[&str] = &["balanced", "costOriented", "availabilityOriented", "cheapest"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedInstanceAwsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub region: ValueString<'a>,
    pub product: ValueString<'a>,
    pub persist_private_ip: ValueBool,
    pub persist_block_devices: ValueBool,
    pub persist_root_device: ValueBool,
    pub block_devices_mode: ValueString<'a>,
    pub health_check_type: ValueString<'a>,
    pub auto_healing: ValueBool,
    pub grace_period: ValueNumber,
    pub unhealthy_duration: ValueNumber,
    pub life_cycle: ValueString<'a>,
    pub orientation: ValueString<'a>,
    pub fallback_to_ondemand: ValueBool,
    pub draining_timeout: ValueNumber,
    pub utilize_reserved_instances: ValueBool,
    pub instance_types: ValueList<ValueString<'a>>,
    pub preferred_type: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub subnet_ids: ValueList<ValueString<'a>>,
    pub image_id: ValueString<'a>,
    pub key_pair: ValueString<'a>,
    pub security_group_ids: ValueList<ValueString<'a>>,
    pub user_data: ValueString<'a>,
    pub iam_instance_profile: ValueString<'a>,
    pub enable_monitoring: ValueBool,
    pub ebs_optimized: ValueBool,
    pub tags: ValueMap<'a, ValueString<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub delete: Value<ManagedInstanceDelete>,
}
with_id!(ManagedInstanceAwsState);

/// Resources released with the instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedInstanceDelete {
    pub ami_backup_should_delete_images: ValueBool,
    pub should_delete_images: ValueBool,
    pub should_delete_network_interfaces: ValueBool,
    pub should_delete_volumes: ValueBool,
    pub should_delete_snapshots: ValueBool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ManagedInstanceAws;

fn check_one_of(diags: &mut Diagnostics, name: &'static str, value: &ValueString, allowed: &[&str]) {
    if let Some(value) = value.as_deref_option() {
        if !allowed.contains(&value) {
            diags.error(
                format!("Invalid {}", name),
                format!("`{}` is not one of {}", value, allowed.join(", ")),
                AttributePath::new(name),
            );
        }
    }
}

#[async_trait]
impl ApiObject for ManagedInstanceAws {
    type State<'a> = ManagedInstanceAwsState<'a>;

    const NAME: &'static str = "managed instance";
    const PATH: &'static str = "/aws/ec2/managedInstance";
    const KEY: &'static str = "managedInstance";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Managed instance ID"),
                    "name" => required(string(), "Name of the managed instance"),
                    "description" => optional(string(), "Description of the managed instance"),
                    "region" => optional(string(), "AWS region of the instance"),
                    "product" => required(string(), "Operating system of the instance"),
                    "persist_private_ip" => optional(boolean(), "Keep the private IP across replacements"),
                    "persist_block_devices" => optional(boolean(), "Keep the block devices across replacements"),
                    "persist_root_device" => optional(boolean(), "Keep the root device across replacements"),
                    "block_devices_mode" => optional(string(), "How block devices are kept: reattach or onLaunch"),
                    "health_check_type" => optional(string(), "Health check of the instance"),
                    "auto_healing" => optional(boolean(), "Replace the instance when unhealthy"),
                    "grace_period" => optional(number(), "Seconds before the first health check"),
                    "unhealthy_duration" => optional(number(), "Seconds unhealthy before a replacement"),
                    "life_cycle" => optional_computed(string(), "Life cycle of the instance: spot or on_demand"),
                    "orientation" => optional_computed(string(), "Prediction strategy of the instance"),
                    "fallback_to_ondemand" => optional(boolean(), "Launch an on-demand instance when no spot is available"),
                    "draining_timeout" => optional(number(), "Seconds to drain the instance before termination"),
                    "utilize_reserved_instances" => optional(boolean(), "Use the free reserved instances first"),
                    "instance_types" => required(string_list(), "Instance types of the instance"),
                    "preferred_type" => optional(string(), "Instance type launched first"),
                    "vpc_id" => required(string(), "VPC of the instance"),
                    "subnet_ids" => required(string_list(), "Subnets of the instance"),
                    "image_id" => required(string(), "AMI of the instance"),
                    "key_pair" => optional(string(), "Key pair of the instance"),
                    "security_group_ids" => optional(string_list(), "Security groups of the instance"),
                    "user_data" => optional(string(), "User data of the instance"),
                    "iam_instance_profile" => optional(string(), "Instance profile name or ARN"),
                    "enable_monitoring" => optional(boolean(), "Enable detailed monitoring"),
                    "ebs_optimized" => optional(boolean(), "Launch an EBS optimized instance"),
                    "tags" => optional(string_map(), "Tags of the instance"),
                },
                blocks: map! {
                    "delete" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "ami_backup_should_delete_images" => optional(boolean(), "Delete the AMI backups"),
                            "should_delete_images" => optional(boolean(), "Delete the images"),
                            "should_delete_network_interfaces" => optional(boolean(), "Delete the network interfaces"),
                            "should_delete_volumes" => optional(boolean(), "Delete the volumes"),
                            "should_delete_snapshots" => optional(boolean(), "Delete the snapshots"),
                        },
                        description: Description::plain("Resources released with the instance"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Spotinst managed instance on AWS"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &ManagedInstanceAwsState<'a>) {
        check_one_of(diags, "life_cycle", &config.life_cycle, LIFE_CYCLES);
        check_one_of(diags, "block_devices_mode", &config.block_devices_mode, BLOCK_DEVICES_MODES);
        check_one_of(diags, "orientation", &config.orientation, ORIENTATIONS);
    }

    fn expand<'a>(&self, state: &ManagedInstanceAwsState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set("/description", &state.description)
            .set_on_create("/region", &state.region)
            .set("/persistence/persistPrivateIp", &state.persist_private_ip)
            .set("/persistence/persistBlockDevices", &state.persist_block_devices)
            .set("/persistence/persistRootDevice", &state.persist_root_device)
            .set("/persistence/blockDevicesMode", &state.block_devices_mode)
            .set("/healthCheck/type", &state.health_check_type)
            .set("/healthCheck/autoHealing", &state.auto_healing)
            .set("/healthCheck/gracePeriod", &state.grace_period)
            .set("/healthCheck/unhealthyDuration", &state.unhealthy_duration)
            .set("/strategy/lifeCycle", &state.life_cycle)
            .set("/strategy/orientation", &state.orientation)
            .set("/strategy/fallbackToOd", &state.fallback_to_ondemand)
            .set("/strategy/drainingTimeout", &state.draining_timeout)
            .set("/strategy/utilizeReservedInstances", &state.utilize_reserved_instances)
            .set_on_create("/compute/product", &state.product)
            .set("/compute/vpcId", &state.vpc_id)
            .set("/compute/subnetIds", &state.subnet_ids);

        let launch = |pointer: &str| format!("/compute/launchSpecification{}", pointer);
        document
            .set(&launch("/instanceTypes/types"), &state.instance_types)
            .set(&launch("/instanceTypes/preferredType"), &state.preferred_type)
            .set(&launch("/imageId"), &state.image_id)
            .set(&launch("/keyPair"), &state.key_pair)
            .set(&launch("/securityGroupIds"), &state.security_group_ids)
            .set_with(&launch("/userData"), &state.user_data, user_data)
            .set_with(&launch("/iamRole"), &state.iam_instance_profile, instance_profile)
            .set(&launch("/monitoring"), &state.enable_monitoring)
            .set(&launch("/ebsOptimized"), &state.ebs_optimized)
            .set_with(&launch("/tags"), &state.tags, |map| tags(map));
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut ManagedInstanceAwsState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.description, "/description");
        remote.optional(&mut state.region, "/region");
        remote.optional(&mut state.persist_private_ip, "/persistence/persistPrivateIp");
        remote.optional(&mut state.persist_block_devices, "/persistence/persistBlockDevices");
        remote.optional(&mut state.persist_root_device, "/persistence/persistRootDevice");
        remote.optional(&mut state.block_devices_mode, "/persistence/blockDevicesMode");
        remote.optional(&mut state.health_check_type, "/healthCheck/type");
        remote.optional(&mut state.auto_healing, "/healthCheck/autoHealing");
        remote.optional(&mut state.grace_period, "/healthCheck/gracePeriod");
        remote.optional(&mut state.unhealthy_duration, "/healthCheck/unhealthyDuration");
        remote.computed(&mut state.life_cycle, "/strategy/lifeCycle");
        remote.computed(&mut state.orientation, "/strategy/orientation");
        remote.optional(&mut state.fallback_to_ondemand, "/strategy/fallbackToOd");
        remote.optional(&mut state.draining_timeout, "/strategy/drainingTimeout");
        remote.optional(
            &mut state.utilize_reserved_instances,
            "/strategy/utilizeReservedInstances",
        );
        remote.optional(&mut state.product, "/compute/product");
        remote.optional(&mut state.vpc_id, "/compute/vpcId");
        remote.optional(&mut state.subnet_ids, "/compute/subnetIds");

        let launch = |pointer: &str| format!("/compute/launchSpecification{}", pointer);
        remote.optional(&mut state.instance_types, &launch("/instanceTypes/types"));
        remote.optional(&mut state.preferred_type, &launch("/instanceTypes/preferredType"));
        remote.optional(&mut state.image_id, &launch("/imageId"));
        remote.optional(&mut state.key_pair, &launch("/keyPair"));
        remote.optional(&mut state.security_group_ids, &launch("/securityGroupIds"));
        remote.optional_with(&mut state.user_data, &launch("/userData"), from_user_data);
        remote.optional_with(
            &mut state.iam_instance_profile,
            &launch("/iamRole"),
            from_instance_profile,
        );
        remote.optional(&mut state.enable_monitoring, &launch("/monitoring"));
        remote.optional(&mut state.ebs_optimized, &launch("/ebsOptimized"));
        remote.optional_with(&mut state.tags, &launch("/tags"), from_tags);
    }

    fn plan_create<'a>(&self, state: &mut ManagedInstanceAwsState<'a>) {
        unknown_if_null(&mut state.life_cycle);
        unknown_if_null(&mut state.orientation);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &ManagedInstanceAwsState<'a>,
        proposed: &ManagedInstanceAwsState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "region", &prior.region, &proposed.region);
        force_new(&mut triggers, "product", &prior.product, &proposed.product);
        triggers
    }

    fn delete_options<'a>(&self, state: &ManagedInstanceAwsState<'a>) -> DeleteOptions {
        let Value::Value(delete) = &state.delete else {
            return DeleteOptions::default();
        };
        let mut document = Document::new(Op::Create);
        document
            .set("/deallocationConfig/shouldDeleteImages", &delete.should_delete_images)
            .set(
                "/deallocationConfig/shouldDeleteNetworkInterfaces",
                &delete.should_delete_network_interfaces,
            )
            .set("/deallocationConfig/shouldDeleteVolumes", &delete.should_delete_volumes)
            .set("/deallocationConfig/shouldDeleteSnapshots", &delete.should_delete_snapshots)
            .set("/amiBackup/shouldDeleteImages", &delete.ami_backup_should_delete_images);
        let body = document.finish();
        DeleteOptions {
            query: Vec::new(),
            body: (body != Json::Object(Map::new())).then_some(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::{Diagnostics, Value};

    use super::{ManagedInstanceAws, ManagedInstanceAwsState, ManagedInstanceDelete};
    use crate::commons::{ApiObject, Flatten, Op, Refresh};

    fn string<'a>(s: &'static str) -> Value<Cow<'a, str>> {
        Value::Value(Cow::from(s))
    }

    fn state<'a>() -> ManagedInstanceAwsState<'a> {
        ManagedInstanceAwsState {
            name: string("db"),
            product: string("Linux/UNIX"),
            region: string("us-east-1"),
            persist_block_devices: Value::Value(true),
            block_devices_mode: string("reattach"),
            instance_types: Value::Value(vec![string("t3.large"), string("t3a.large")]),
            vpc_id: string("vpc-1"),
            subnet_ids: Value::Value(vec![string("subnet-1")]),
            image_id: string("ami-1"),
            ..Default::default()
        }
    }

    #[test]
    fn expand_persistence() {
        let body = ManagedInstanceAws.expand(&state(), Op::Create);
        assert_eq!(
            body["persistence"],
            json!({"persistBlockDevices": true, "blockDevicesMode": "reattach"})
        );
        assert_eq!(
            body["compute"]["launchSpecification"]["instanceTypes"],
            json!({"types": ["t3.large", "t3a.large"]})
        );
        assert_eq!(body["compute"]["product"], json!("Linux/UNIX"));
    }

    #[test]
    fn computed_strategy() {
        let mut state = state();
        ManagedInstanceAws.plan_create(&mut state);
        assert!(state.life_cycle.is_unknown());

        let remote = json!({"strategy": {"lifeCycle": "spot", "orientation": "balanced"}});
        ManagedInstanceAws.flatten(&mut state, Flatten::new(&remote, Refresh::Apply));
        assert_eq!(state.life_cycle, string("spot"));
        assert_eq!(state.orientation, string("balanced"));
    }

    #[test]
    fn delete_body() {
        let mut state = state();
        assert_eq!(ManagedInstanceAws.delete_options(&state).body, None);

        state.delete = Value::Value(ManagedInstanceDelete {
            should_delete_volumes: Value::Value(true),
            ami_backup_should_delete_images: Value::Value(false),
            ..Default::default()
        });
        assert_eq!(
            ManagedInstanceAws.delete_options(&state).body,
            Some(json!({
                "deallocationConfig": {"shouldDeleteVolumes": true},
                "amiBackup": {"shouldDeleteImages": false},
            }))
        );
    }

    #[test]
    fn validate() {
        let mut diags = Diagnostics::default();
        ManagedInstanceAws.validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let mut config = state();
        config.life_cycle = string("reserved");
        config.block_devices_mode = string("copy");
        ManagedInstanceAws.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);
    }
}
