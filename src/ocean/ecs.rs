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
    map, value, AttributePath, Block, Description, Diagnostics, Schema, Value, ValueList, ValueMap,
    ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;

use crate::commons::fields::{
    from_instance_profile, from_tags, from_user_data, instance_profile, tags, user_data,
};
use crate::commons::schema::{
    boolean, id, number, optional, optional_computed, required, string, string_list, string_map,
};
use crate::commons::{force_new, unknown_if_null, ApiObject, Document, Flatten, Op};
use crate::elastigroup::validate_capacity;
use crate::utils::with_id;

use super::{
    autoscaler_schema, expand_autoscaler, flatten_autoscaler, validate_instance_types,
    validate_percentage, Autoscaler,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OceanEcsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub cluster_name: ValueString<'a>,
    pub region: ValueString<'a>,
    pub max_size: ValueNumber,
    pub min_size: ValueNumber,
    pub desired_capacity: ValueNumber,
    pub subnet_ids: ValueList<ValueString<'a>>,
    pub whitelist: ValueList<ValueString<'a>>,
    pub blacklist: ValueList<ValueString<'a>>,
    pub image_id: ValueString<'a>,
    pub security_group_ids: ValueList<ValueString<'a>>,
    pub key_pair: ValueString<'a>,
    pub user_data: ValueString<'a>,
    pub iam_instance_profile: ValueString<'a>,
    pub associate_public_ip_address: ValueBool,
    pub monitoring: ValueBool,
    pub ebs_optimized: ValueBool,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub spot_percentage: ValueNumber,
    pub draining_timeout: ValueNumber,
    pub utilize_reserved_instances: ValueBool,
    #[serde(with = "value::serde_as_vec")]
    pub autoscaler: Value<Autoscaler>,
}
with_id!(OceanEcsState);

/// Ocean cluster running the container instances of an ECS cluster
#[derive(Debug, Default, Clone, Copy)]
pub struct OceanEcs;

#[async_trait]
impl ApiObject for OceanEcs {
    type State<'a> = OceanEcsState<'a>;

    const NAME: &'static str = "ocean ecs cluster";
    const PATH: &'static str = "/ocean/aws/ecs/cluster";
    const KEY: &'static str = "cluster";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Ocean cluster ID"),
                    "name" => required(string(), "Name of the ocean cluster"),
                    "cluster_name" => required(string(), "Name of the ECS cluster"),
                    "region" => required(string(), "AWS region of the cluster"),
                    "max_size" => optional_computed(number(), "Maximum number of container instances"),
                    "min_size" => optional_computed(number(), "Minimum number of container instances"),
                    "desired_capacity" => optional_computed(number(), "Number of container instances to launch"),
                    "subnet_ids" => required(string_list(), "Subnets of the container instances"),
                    "whitelist" => optional(string_list(), "Instance types allowed for the container instances"),
                    "blacklist" => optional(string_list(), "Instance types denied for the container instances"),
                    "image_id" => required(string(), "AMI of the container instances"),
                    "security_group_ids" => required(string_list(), "Security groups of the container instances"),
                    "key_pair" => optional(string(), "Key pair of the container instances"),
                    "user_data" => optional(string(), "User data of the container instances"),
                    "iam_instance_profile" => optional(string(), "Instance profile name or ARN"),
                    "associate_public_ip_address" => optional(boolean(), "Give the container instances a public IP"),
                    "monitoring" => optional(boolean(), "Enable detailed monitoring"),
                    "ebs_optimized" => optional(boolean(), "Launch EBS optimized container instances"),
                    "tags" => optional(string_map(), "Tags of the container instances"),
                    "spot_percentage" => optional(number(), "Percentage of spot container instances"),
                    "draining_timeout" => optional_computed(number(), "Seconds to drain a container instance before termination"),
                    "utilize_reserved_instances" => optional(boolean(), "Use the free reserved instances first"),
                },
                blocks: map! {
                    "autoscaler" => autoscaler_schema(),
                },
                description: Description::plain("Spotinst Ocean cluster for ECS"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &OceanEcsState<'a>) {
        validate_capacity(diags, config.min_size, config.desired_capacity, config.max_size);
        validate_instance_types(diags, &config.whitelist, &config.blacklist);
        validate_percentage(diags, "spot_percentage", config.spot_percentage);
    }

    fn expand<'a>(&self, state: &OceanEcsState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set_on_create("/clusterName", &state.cluster_name)
            .set_on_create("/region", &state.region)
            .set("/capacity/maximum", &state.max_size)
            .set("/capacity/minimum", &state.min_size)
            .set("/capacity/target", &state.desired_capacity)
            .set("/strategy/spotPercentage", &state.spot_percentage)
            .set("/strategy/drainingTimeout", &state.draining_timeout)
            .set("/strategy/utilizeReservedInstances", &state.utilize_reserved_instances)
            .set("/compute/subnetIds", &state.subnet_ids)
            .set("/compute/instanceTypes/whitelist", &state.whitelist)
            .set("/compute/instanceTypes/blacklist", &state.blacklist)
            .set("/compute/launchSpecification/imageId", &state.image_id)
            .set("/compute/launchSpecification/securityGroupIds", &state.security_group_ids)
            .set("/compute/launchSpecification/keyPair", &state.key_pair)
            .set_with("/compute/launchSpecification/userData", &state.user_data, user_data)
            .set_with(
                "/compute/launchSpecification/iamInstanceProfile",
                &state.iam_instance_profile,
                instance_profile,
            )
            .set(
                "/compute/launchSpecification/associatePublicIpAddress",
                &state.associate_public_ip_address,
            )
            .set("/compute/launchSpecification/monitoring", &state.monitoring)
            .set("/compute/launchSpecification/ebsOptimized", &state.ebs_optimized)
            .set_with("/compute/launchSpecification/tags", &state.tags, |map| tags(map))
            .block("/autoScaler", &state.autoscaler, expand_autoscaler);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut OceanEcsState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.cluster_name, "/clusterName");
        remote.optional(&mut state.region, "/region");
        remote.computed(&mut state.max_size, "/capacity/maximum");
        remote.computed(&mut state.min_size, "/capacity/minimum");
        remote.computed(&mut state.desired_capacity, "/capacity/target");
        remote.optional(&mut state.spot_percentage, "/strategy/spotPercentage");
        remote.computed(&mut state.draining_timeout, "/strategy/drainingTimeout");
        remote.optional(
            &mut state.utilize_reserved_instances,
            "/strategy/utilizeReservedInstances",
        );
        remote.optional(&mut state.subnet_ids, "/compute/subnetIds");
        remote.optional(&mut state.whitelist, "/compute/instanceTypes/whitelist");
        remote.optional(&mut state.blacklist, "/compute/instanceTypes/blacklist");

        let launch = |pointer: &str| format!("/compute/launchSpecification{}", pointer);
        remote.optional(&mut state.image_id, &launch("/imageId"));
        remote.optional(&mut state.security_group_ids, &launch("/securityGroupIds"));
        remote.optional(&mut state.key_pair, &launch("/keyPair"));
        remote.optional_with(&mut state.user_data, &launch("/userData"), from_user_data);
        remote.optional_with(
            &mut state.iam_instance_profile,
            &launch("/iamInstanceProfile"),
            from_instance_profile,
        );
        remote.optional(
            &mut state.associate_public_ip_address,
            &launch("/associatePublicIpAddress"),
        );
        remote.optional(&mut state.monitoring, &launch("/monitoring"));
        remote.optional(&mut state.ebs_optimized, &launch("/ebsOptimized"));
        remote.optional_with(&mut state.tags, &launch("/tags"), from_tags);

        remote.block(&mut state.autoscaler, "/autoScaler", flatten_autoscaler);
    }

    fn plan_create<'a>(&self, state: &mut OceanEcsState<'a>) {
        unknown_if_null(&mut state.max_size);
        unknown_if_null(&mut state.min_size);
        unknown_if_null(&mut state.desired_capacity);
        unknown_if_null(&mut state.draining_timeout);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &OceanEcsState<'a>,
        proposed: &OceanEcsState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "region", &prior.region, &proposed.region);
        force_new(&mut triggers, "cluster_name", &prior.cluster_name, &proposed.cluster_name);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::Value;

    use super::{OceanEcs, OceanEcsState};
    use crate::commons::{ApiObject, Op};

    fn string<'a>(s: &'static str) -> Value<Cow<'a, str>> {
        Value::Value(Cow::from(s))
    }

    #[test]
    fn cluster_name_is_create_only() {
        let state = OceanEcsState {
            name: string("ecs"),
            cluster_name: string("prod"),
            region: string("us-east-1"),
            ..Default::default()
        };
        let body = OceanEcs.expand(&state, Op::Create);
        assert_eq!(body["clusterName"], json!("prod"));

        let body = OceanEcs.expand(&state, Op::Update);
        assert!(body.get("clusterName").is_none());
        assert!(body.get("region").is_none());

        let mut proposed = state.clone();
        proposed.cluster_name = string("staging");
        let triggers = OceanEcs.replace_triggers(&state, &proposed);
        assert_eq!(triggers.len(), 1);
    }
}
