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
pub struct OceanAwsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub controller_id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub max_size: ValueNumber,
    pub min_size: ValueNumber,
    pub desired_capacity: ValueNumber,
    pub subnet_ids: ValueList<ValueString<'a>>,
    pub whitelist: ValueList<ValueString<'a>>,
    pub blacklist: ValueList<ValueString<'a>>,
    pub image_id: ValueString<'a>,
    pub security_groups: ValueList<ValueString<'a>>,
    pub key_name: ValueString<'a>,
    pub user_data: ValueString<'a>,
    pub iam_instance_profile: ValueString<'a>,
    pub associate_public_ip_address: ValueBool,
    pub root_volume_size: ValueNumber,
    pub monitoring: ValueBool,
    pub ebs_optimized: ValueBool,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub spot_percentage: ValueNumber,
    pub fallback_to_ondemand: ValueBool,
    pub utilize_reserved_instances: ValueBool,
    pub draining_timeout: ValueNumber,
    pub grace_period: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub autoscaler: Value<Autoscaler>,
}
with_id!(OceanAwsState);

/// Ocean cluster running Kubernetes nodes on AWS
#[derive(Debug, Default, Clone, Copy)]
pub struct OceanAws;

#[async_trait]
impl ApiObject for OceanAws {
    type State<'a> = OceanAwsState<'a>;

    const NAME: &'static str = "ocean cluster";
    const PATH: &'static str = "/ocean/aws/k8s/cluster";
    const KEY: &'static str = "cluster";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Ocean cluster ID"),
                    "name" => required(string(), "Name of the cluster"),
                    "controller_id" => required(string(), "Identifier of the controller running in the cluster"),
                    "region" => required(string(), "AWS region of the cluster"),
                    "max_size" => optional_computed(number(), "Maximum number of nodes"),
                    "min_size" => optional_computed(number(), "Minimum number of nodes"),
                    "desired_capacity" => optional_computed(number(), "Number of nodes to launch"),
                    "subnet_ids" => required(string_list(), "Subnets of the nodes"),
                    "whitelist" => optional(string_list(), "Instance types allowed for the nodes"),
                    "blacklist" => optional(string_list(), "Instance types denied for the nodes"),
                    "image_id" => required(string(), "AMI of the nodes"),
                    "security_groups" => required(string_list(), "Security groups of the nodes"),
                    "key_name" => optional(string(), "Key pair of the nodes"),
                    "user_data" => optional(string(), "User data of the nodes"),
                    "iam_instance_profile" => optional(string(), "Instance profile name or ARN"),
                    "associate_public_ip_address" => optional(boolean(), "Give the nodes a public IP"),
                    "root_volume_size" => optional(number(), "Size of the root volume, in GB"),
                    "monitoring" => optional(boolean(), "Enable detailed monitoring"),
                    "ebs_optimized" => optional(boolean(), "Launch EBS optimized nodes"),
                    "tags" => optional(string_map(), "Tags of the nodes"),
                    "spot_percentage" => optional(number(), "Percentage of spot nodes"),
                    "fallback_to_ondemand" => optional(boolean(), "Launch on-demand nodes when no spot is available"),
                    "utilize_reserved_instances" => optional(boolean(), "Use the free reserved instances first"),
                    "draining_timeout" => optional_computed(number(), "Seconds to drain a node before termination"),
                    "grace_period" => optional_computed(number(), "Seconds before the first health check of a node"),
                },
                blocks: map! {
                    "autoscaler" => autoscaler_schema(),
                },
                description: Description::plain("Spotinst Ocean cluster for Kubernetes on AWS"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &OceanAwsState<'a>) {
        validate_capacity(diags, config.min_size, config.desired_capacity, config.max_size);
        validate_instance_types(diags, &config.whitelist, &config.blacklist);
        validate_percentage(diags, "spot_percentage", config.spot_percentage);
    }

    fn expand<'a>(&self, state: &OceanAwsState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set("/controllerClusterId", &state.controller_id)
            .set_on_create("/region", &state.region)
            .set("/capacity/maximum", &state.max_size)
            .set("/capacity/minimum", &state.min_size)
            .set("/capacity/target", &state.desired_capacity)
            .set("/strategy/spotPercentage", &state.spot_percentage)
            .set("/strategy/fallbackToOd", &state.fallback_to_ondemand)
            .set("/strategy/utilizeReservedInstances", &state.utilize_reserved_instances)
            .set("/strategy/drainingTimeout", &state.draining_timeout)
            .set("/strategy/gracePeriod", &state.grace_period)
            .set("/compute/subnetIds", &state.subnet_ids)
            .set("/compute/instanceTypes/whitelist", &state.whitelist)
            .set("/compute/instanceTypes/blacklist", &state.blacklist)
            .set("/compute/launchSpecification/imageId", &state.image_id)
            .set("/compute/launchSpecification/securityGroupIds", &state.security_groups)
            .set("/compute/launchSpecification/keyPair", &state.key_name)
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
            .set("/compute/launchSpecification/rootVolumeSize", &state.root_volume_size)
            .set("/compute/launchSpecification/monitoring", &state.monitoring)
            .set("/compute/launchSpecification/ebsOptimized", &state.ebs_optimized)
            .set_with("/compute/launchSpecification/tags", &state.tags, |map| tags(map))
            .block("/autoScaler", &state.autoscaler, expand_autoscaler);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut OceanAwsState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.controller_id, "/controllerClusterId");
        remote.optional(&mut state.region, "/region");
        remote.computed(&mut state.max_size, "/capacity/maximum");
        remote.computed(&mut state.min_size, "/capacity/minimum");
        remote.computed(&mut state.desired_capacity, "/capacity/target");
        remote.optional(&mut state.spot_percentage, "/strategy/spotPercentage");
        remote.optional(&mut state.fallback_to_ondemand, "/strategy/fallbackToOd");
        remote.optional(
            &mut state.utilize_reserved_instances,
            "/strategy/utilizeReservedInstances",
        );
        remote.computed(&mut state.draining_timeout, "/strategy/drainingTimeout");
        remote.computed(&mut state.grace_period, "/strategy/gracePeriod");
        remote.optional(&mut state.subnet_ids, "/compute/subnetIds");
        remote.optional(&mut state.whitelist, "/compute/instanceTypes/whitelist");
        remote.optional(&mut state.blacklist, "/compute/instanceTypes/blacklist");

        let launch = |pointer: &str| format!("/compute/launchSpecification{}", pointer);
        remote.optional(&mut state.image_id, &launch("/imageId"));
        remote.optional(&mut state.security_groups, &launch("/securityGroupIds"));
        remote.optional(&mut state.key_name, &launch("/keyPair"));
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
        remote.optional(&mut state.root_volume_size, &launch("/rootVolumeSize"));
        remote.optional(&mut state.monitoring, &launch("/monitoring"));
        remote.optional(&mut state.ebs_optimized, &launch("/ebsOptimized"));
        remote.optional_with(&mut state.tags, &launch("/tags"), from_tags);

        remote.block(&mut state.autoscaler, "/autoScaler", flatten_autoscaler);
    }

    fn plan_create<'a>(&self, state: &mut OceanAwsState<'a>) {
        unknown_if_null(&mut state.max_size);
        unknown_if_null(&mut state.min_size);
        unknown_if_null(&mut state.desired_capacity);
        unknown_if_null(&mut state.draining_timeout);
        unknown_if_null(&mut state.grace_period);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &OceanAwsState<'a>,
        proposed: &OceanAwsState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "region", &prior.region, &proposed.region);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::{Diagnostics, Value};

    use super::{OceanAws, OceanAwsState};
    use crate::commons::{ApiObject, Flatten, Op, Refresh};
    use crate::ocean::Autoscaler;

    fn string<'a>(s: &'static str) -> Value<Cow<'a, str>> {
        Value::Value(Cow::from(s))
    }

    fn state<'a>() -> OceanAwsState<'a> {
        OceanAwsState {
            name: string("k8s"),
            controller_id: string("k8s-prod"),
            region: string("us-west-2"),
            subnet_ids: Value::Value(vec![string("subnet-1"), string("subnet-2")]),
            image_id: string("ami-123"),
            security_groups: Value::Value(vec![string("sg-1")]),
            whitelist: Value::Value(vec![string("m5.large")]),
            autoscaler: Value::Value(Autoscaler {
                autoscale_is_enabled: Value::Value(true),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn expand() {
        let body = OceanAws.expand(&state(), Op::Create);
        assert_eq!(body["controllerClusterId"], json!("k8s-prod"));
        assert_eq!(body["region"], json!("us-west-2"));
        assert_eq!(body["compute"]["instanceTypes"], json!({"whitelist": ["m5.large"]}));
        assert_eq!(body["autoScaler"], json!({"isEnabled": true}));

        let body = OceanAws.expand(&state(), Op::Update);
        assert!(body.get("region").is_none());
        assert_eq!(body["compute"]["instanceTypes"]["blacklist"], json!(null));
    }

    #[test]
    fn autoscaler_drift() {
        let mut state = state();
        let remote = json!({
            "name": "k8s",
            "capacity": {"minimum": 0, "maximum": 1000, "target": 2},
            "autoScaler": {"isEnabled": false, "cooldown": 300},
        });
        OceanAws.flatten(&mut state, Flatten::new(&remote, Refresh::Sync));
        let Value::Value(autoscaler) = &state.autoscaler else {
            panic!("autoscaler was removed");
        };
        assert_eq!(autoscaler.autoscale_is_enabled, Value::Value(false));
        assert_eq!(autoscaler.autoscale_cooldown, Value::Null);
        assert_eq!(state.max_size, Value::Value(1000));
    }

    #[test]
    fn validate() {
        let mut diags = Diagnostics::default();
        OceanAws.validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let mut config = state();
        config.blacklist = Value::Value(vec![string("t2.micro")]);
        config.spot_percentage = Value::Value(101);
        OceanAws.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);
    }
}
