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
    ValueList, ValueMap, ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;

use crate::client::DeleteOptions;
use crate::commons::fields::{
    from_instance_profile, from_key_values, from_tags, from_user_data, instance_profile,
    key_values, tags, user_data,
};
use crate::commons::schema::{boolean, id, number, optional, required, string, string_list, string_map};
use crate::commons::{force_new, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

pub const TAINT_EFFECTS: &[&str] = &["NoSchedule", "PreferNoSchedule", "NoExecute"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OceanAwsLaunchSpecState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub ocean_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub image_id: ValueString<'a>,
    pub user_data: ValueString<'a>,
    pub security_groups: ValueList<ValueString<'a>>,
    pub subnet_ids: ValueList<ValueString<'a>>,
    pub iam_instance_profile: ValueString<'a>,
    pub root_volume_size: ValueNumber,
    pub instance_types: ValueList<ValueString<'a>>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub labels: ValueMap<'a, ValueString<'a>>,
    pub max_instance_count: ValueNumber,
    pub taints: ValueList<Value<Taint<'a>>>,
    #[serde(with = "value::serde_as_vec")]
    pub delete_options: Value<LaunchSpecDeleteOptions>,
}
with_id!(OceanAwsLaunchSpecState);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint<'a> {
    #[serde(borrow = "'a")]
    pub key: ValueString<'a>,
    pub value: ValueString<'a>,
    pub effect: ValueString<'a>,
}

/// What happens to the nodes of a launch spec when it is deleted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpecDeleteOptions {
    pub force_delete: ValueBool,
    pub delete_nodes: ValueBool,
}

/// Node template of an ocean cluster
#[derive(Debug, Default, Clone, Copy)]
pub struct OceanAwsLaunchSpec;

#[async_trait]
impl ApiObject for OceanAwsLaunchSpec {
    type State<'a> = OceanAwsLaunchSpecState<'a>;

    const NAME: &'static str = "ocean launch spec";
    const PATH: &'static str = "/ocean/aws/k8s/launchSpec";
    const KEY: &'static str = "launchSpec";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Launch spec ID"),
                    "ocean_id" => required(string(), "Ocean cluster of the launch spec"),
                    "name" => optional(string(), "Name of the launch spec"),
                    "image_id" => optional(string(), "AMI of the nodes, the cluster one if not set"),
                    "user_data" => optional(string(), "User data of the nodes"),
                    "security_groups" => optional(string_list(), "Security groups of the nodes"),
                    "subnet_ids" => optional(string_list(), "Subnets of the nodes"),
                    "iam_instance_profile" => optional(string(), "Instance profile name or ARN"),
                    "root_volume_size" => optional(number(), "Size of the root volume, in GB"),
                    "instance_types" => optional(string_list(), "Instance types of the nodes"),
                    "tags" => optional(string_map(), "Tags of the nodes"),
                    "labels" => optional(string_map(), "Kubernetes labels of the nodes"),
                    "max_instance_count" => optional(number(), "Maximum number of nodes"),
                },
                blocks: map! {
                    "taints" => NestedBlock::List(Block {
                        attributes: map! {
                            "key" => required(string(), "Key of the taint"),
                            "value" => optional(string(), "Value of the taint"),
                            "effect" => required(string(), "Effect of the taint: NoSchedule, PreferNoSchedule or NoExecute"),
                        },
                        description: Description::plain("Kubernetes taint of the nodes"),
                        ..Default::default()
                    }),
                    "delete_options" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "force_delete" => optional(boolean(), "Delete even if nodes are still running"),
                            "delete_nodes" => optional(boolean(), "Terminate the nodes with the launch spec"),
                        },
                        description: Description::plain("Deletion behavior"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Spotinst Ocean launch spec on AWS"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &OceanAwsLaunchSpecState<'a>) {
        for (i, taint) in config.taints.iter().flatten().enumerate() {
            let Value::Value(taint) = taint else {
                continue;
            };
            if let Some(effect) = taint.effect.as_deref_option() {
                if !TAINT_EFFECTS.contains(&effect) {
                    diags.error(
                        "Invalid taint effect",
                        format!("`{}` is not one of {}", effect, TAINT_EFFECTS.join(", ")),
                        AttributePath::new("taints").index(i as i64).attribute("effect"),
                    );
                }
            }
        }
    }

    fn expand<'a>(&self, state: &OceanAwsLaunchSpecState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set_on_create("/oceanId", &state.ocean_id)
            .set("/name", &state.name)
            .set("/imageId", &state.image_id)
            .set_with("/userData", &state.user_data, user_data)
            .set("/securityGroupIds", &state.security_groups)
            .set("/subnetIds", &state.subnet_ids)
            .set_with("/iamInstanceProfile", &state.iam_instance_profile, instance_profile)
            .set("/rootVolumeSize", &state.root_volume_size)
            .set("/instanceTypes", &state.instance_types)
            .set_with("/tags", &state.tags, |map| tags(map))
            .set_with("/labels", &state.labels, |labels| key_values(labels, "key", "value"))
            .set("/resourceLimits/maxInstanceCount", &state.max_instance_count)
            .blocks("/taints", &state.taints, |document, taint| {
                document
                    .set("/key", &taint.key)
                    .set("/value", &taint.value)
                    .set("/effect", &taint.effect);
            });
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut OceanAwsLaunchSpecState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.ocean_id, "/oceanId");
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.image_id, "/imageId");
        remote.optional_with(&mut state.user_data, "/userData", from_user_data);
        remote.optional(&mut state.security_groups, "/securityGroupIds");
        remote.optional(&mut state.subnet_ids, "/subnetIds");
        remote.optional_with(
            &mut state.iam_instance_profile,
            "/iamInstanceProfile",
            from_instance_profile,
        );
        remote.optional(&mut state.root_volume_size, "/rootVolumeSize");
        remote.optional(&mut state.instance_types, "/instanceTypes");
        remote.optional_with(&mut state.tags, "/tags", from_tags);
        remote.optional_with(&mut state.labels, "/labels", |json| {
            from_key_values(json, "key", "value")
        });
        remote.optional(&mut state.max_instance_count, "/resourceLimits/maxInstanceCount");
        remote.blocks(&mut state.taints, "/taints", |taint, remote| {
            remote.optional(&mut taint.key, "/key");
            remote.optional(&mut taint.value, "/value");
            remote.optional(&mut taint.effect, "/effect");
        });
    }

    fn replace_triggers<'a>(
        &self,
        prior: &OceanAwsLaunchSpecState<'a>,
        proposed: &OceanAwsLaunchSpecState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "ocean_id", &prior.ocean_id, &proposed.ocean_id);
        triggers
    }

    fn delete_options<'a>(&self, state: &OceanAwsLaunchSpecState<'a>) -> DeleteOptions {
        let mut options = DeleteOptions::default();
        if let Value::Value(delete) = &state.delete_options {
            if let Value::Value(force) = delete.force_delete {
                options.query.push(("forceDelete".to_owned(), force.to_string()));
            }
            if let Value::Value(nodes) = delete.delete_nodes {
                options.query.push(("deleteNodes".to_owned(), nodes.to_string()));
            }
        }
        options
    }
}
