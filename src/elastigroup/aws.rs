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

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tf_provider::{
    map, value, AttributePath, Block, Description, Diagnostics, NestedBlock, Schema, Value,
    ValueList, ValueMap, ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::client::{Request, SpotinstApi};
use crate::commons::fields::{
    from_instance_profile, from_names, from_tags, from_user_data, instance_profile, names, tags,
    user_data,
};
use crate::commons::schema::{
    boolean, id, number, optional, optional_computed, required, string, string_list,
    string_map,
};
use crate::commons::{force_new, unknown_if_null, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

use super::{validate_capacity, validate_spot_mix};

const ORIENTATIONS: &[&str] = &[
    "balanced",
    "costOriented",
    "availabilityOriented",
    "equalAzDistribution",
];
const DEFAULT_CAPACITY_TIMEOUT: i64 = 300;
const CAPACITY_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElastigroupAwsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub product: ValueString<'a>,
    pub region: ValueString<'a>,
    pub max_size: ValueNumber,
    pub min_size: ValueNumber,
    pub desired_capacity: ValueNumber,
    pub capacity_unit: ValueString<'a>,
    pub spot_percentage: ValueNumber,
    pub on_demand_count: ValueNumber,
    pub orientation: ValueString<'a>,
    pub fallback_to_ondemand: ValueBool,
    pub draining_timeout: ValueNumber,
    pub utilize_reserved_instances: ValueBool,
    pub lifetime_period: ValueString<'a>,
    pub instance_types_ondemand: ValueString<'a>,
    pub instance_types_spot: ValueList<ValueString<'a>>,
    pub instance_types_preferred_spot: ValueList<ValueString<'a>>,
    pub availability_zones: ValueList<ValueString<'a>>,
    pub subnet_ids: ValueList<ValueString<'a>>,
    pub image_id: ValueString<'a>,
    pub key_name: ValueString<'a>,
    pub security_groups: ValueList<ValueString<'a>>,
    pub user_data: ValueString<'a>,
    pub iam_instance_profile: ValueString<'a>,
    pub enable_monitoring: ValueBool,
    pub ebs_optimized: ValueBool,
    pub health_check_type: ValueString<'a>,
    pub health_check_grace_period: ValueNumber,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub wait_for_capacity: ValueNumber,
    pub wait_for_capacity_timeout: ValueNumber,
    pub scheduled_task: ValueList<Value<ScheduledTask<'a>>>,
    #[serde(with = "value::serde_as_vec")]
    pub update_policy: Value<UpdatePolicy<'a>>,
}
with_id!(ElastigroupAwsState);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask<'a> {
    #[serde(borrow = "'a")]
    pub task_type: ValueString<'a>,
    pub cron_expression: ValueString<'a>,
    pub is_enabled: ValueBool,
    pub target_capacity: ValueNumber,
    pub min_capacity: ValueNumber,
    pub max_capacity: ValueNumber,
    pub batch_size_percentage: ValueNumber,
    pub grace_period: ValueNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct UpdatePolicy<'a> {
    pub should_roll: ValueBool,
    #[serde(with = "value::serde_as_vec")]
    pub roll_config: Value<RollConfig<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollConfig<'a> {
    pub batch_size_percentage: ValueNumber,
    pub grace_period: ValueNumber,
    #[serde(borrow = "'a")]
    pub health_check_type: ValueString<'a>,
}

/// AWS elastigroup
#[derive(Debug, Default, Clone, Copy)]
pub struct ElastigroupAws;

impl ElastigroupAws {
    fn scheduled_task_block() -> NestedBlock {
        NestedBlock::List(Block {
            attributes: map! {
                "task_type" => required(string(), "Type of the task: scale, roll, backup_ami, statefulUpdateCapacity..."),
                "cron_expression" => optional(string(), "Cron expression of the schedule"),
                "is_enabled" => optional(boolean(), "Whether the task is enabled"),
                "target_capacity" => optional(number(), "Desired capacity set by a scale task"),
                "min_capacity" => optional(number(), "Minimum capacity set by a scale task"),
                "max_capacity" => optional(number(), "Maximum capacity set by a scale task"),
                "batch_size_percentage" => optional(number(), "Batch size of a roll task"),
                "grace_period" => optional(number(), "Grace period of a roll task"),
            },
            description: Description::plain("Scheduled task"),
            ..Default::default()
        })
    }

    fn update_policy_block() -> NestedBlock {
        NestedBlock::Optional(Block {
            attributes: map! {
                "should_roll" => required(boolean(), "Roll the group after an update of its instance configuration"),
            },
            blocks: map! {
                "roll_config" => NestedBlock::Optional(Block {
                    attributes: map! {
                        "batch_size_percentage" => required(number(), "Percentage of the group replaced at once"),
                        "grace_period" => optional(number(), "Seconds to wait for new instances to be healthy"),
                        "health_check_type" => optional(string(), "Health check used during the roll"),
                    },
                    description: Description::plain("How the group is rolled"),
                    ..Default::default()
                }),
            },
            description: Description::plain("Behavior of updates"),
            ..Default::default()
        })
    }

    async fn roll(
        &self,
        diags: &mut Diagnostics,
        api: &dyn SpotinstApi,
        id: &str,
        roll_config: &RollConfig<'_>,
    ) -> Option<()> {
        let mut document = Document::new(Op::Create);
        document
            .set("/batchSizePercentage", &roll_config.batch_size_percentage)
            .set("/gracePeriod", &roll_config.grace_period)
            .set("/healthCheckType", &roll_config.health_check_type);
        let request = Request::put(format!("{}/{}/roll", Self::PATH, id)).body(document.finish());
        match api.call(request).await {
            Ok(_) => {
                info!(kind = Self::NAME, id, "roll started");
                Some(())
            }
            Err(err) => {
                diags.error(
                    format!("Failed to roll elastigroup {}", id),
                    err.to_string(),
                    AttributePath::new("update_policy"),
                );
                None
            }
        }
    }
}

/// Poll the health of the instances until `target` of them are healthy
pub(crate) async fn wait_for_capacity(
    diags: &mut Diagnostics,
    api: &dyn SpotinstApi,
    id: &str,
    target: i64,
    timeout: Duration,
) -> Option<()> {
    let path = format!("{}/{}/instanceHealthiness", ElastigroupAws::PATH, id);
    // Timeouts too large to be represented never expire
    let deadline = Instant::now().checked_add(timeout);
    loop {
        let instances = match api.call(Request::get(path.as_str())).await {
            Ok(instances) => instances,
            Err(err) => {
                diags.error(
                    format!("Failed to get the instances of elastigroup {}", id),
                    err.to_string(),
                    AttributePath::new("wait_for_capacity"),
                );
                return None;
            }
        };
        let healthy = instances
            .iter()
            .filter(|instance| instance.get("healthStatus").and_then(Json::as_str) == Some("HEALTHY"))
            .count() as i64;
        debug!(id, healthy, target, "waiting for capacity");
        if healthy >= target {
            return Some(());
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            diags.error(
                "Timeout while waiting for capacity",
                format!(
                    "Elastigroup {} has {} healthy instances out of {} after {}s",
                    id,
                    healthy,
                    target,
                    timeout.as_secs()
                ),
                AttributePath::new("wait_for_capacity"),
            );
            return None;
        }
        sleep(CAPACITY_POLL_INTERVAL).await;
    }
}

#[async_trait]
impl ApiObject for ElastigroupAws {
    type State<'a> = ElastigroupAwsState<'a>;

    const NAME: &'static str = "elastigroup";
    const PATH: &'static str = "/aws/ec2/group";
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
                    "product" => required(string(), "Operating system of the instances: Linux/UNIX, Windows..."),
                    "region" => optional(string(), "AWS region of the group"),
                    "max_size" => optional_computed(number(), "Maximum number of instances"),
                    "min_size" => optional_computed(number(), "Minimum number of instances"),
                    "desired_capacity" => optional_computed(number(), "Number of instances to launch"),
                    "capacity_unit" => optional_computed(string(), "Unit of the capacity: instance or weight"),
                    "spot_percentage" => optional(number(), "Percentage of spot instances"),
                    "on_demand_count" => optional(number(), "Number of on-demand instances"),
                    "orientation" => optional_computed(string(), "Prediction strategy: balanced, costOriented, availabilityOriented or equalAzDistribution"),
                    "fallback_to_ondemand" => optional(boolean(), "Launch on-demand instances when no spot is available"),
                    "draining_timeout" => optional_computed(number(), "Seconds to drain an instance before termination"),
                    "utilize_reserved_instances" => optional(boolean(), "Use the free reserved instances first"),
                    "lifetime_period" => optional(string(), "Lifetime of the instances"),
                    "instance_types_ondemand" => required(string(), "On-demand instance type"),
                    "instance_types_spot" => required(string_list(), "Spot instance types"),
                    "instance_types_preferred_spot" => optional(string_list(), "Spot instance types launched first"),
                    "availability_zones" => optional(string_list(), "Availability zones of the instances"),
                    "subnet_ids" => optional(string_list(), "Subnets of the instances"),
                    "image_id" => optional(string(), "AMI of the instances"),
                    "key_name" => optional(string(), "Key pair of the instances"),
                    "security_groups" => required(string_list(), "Security groups of the instances"),
                    "user_data" => optional(string(), "User data of the instances"),
                    "iam_instance_profile" => optional(string(), "Instance profile name or ARN"),
                    "enable_monitoring" => optional(boolean(), "Enable detailed monitoring"),
                    "ebs_optimized" => optional(boolean(), "Launch EBS optimized instances"),
                    "health_check_type" => optional(string(), "Health check of the instances: ELB, HCS, TARGET_GROUP..."),
                    "health_check_grace_period" => optional(number(), "Seconds before the first health check"),
                    "tags" => optional(string_map(), "Tags of the instances"),
                    "wait_for_capacity" => optional(number(), "Healthy instances to wait for after an apply"),
                    "wait_for_capacity_timeout" => optional(number(), "Seconds to wait for capacity"),
                },
                blocks: map! {
                    "scheduled_task" => Self::scheduled_task_block(),
                    "update_policy" => Self::update_policy_block(),
                },
                description: Description::plain("Spotinst elastigroup on AWS"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &ElastigroupAwsState<'a>) {
        validate_capacity(diags, config.min_size, config.desired_capacity, config.max_size);
        validate_spot_mix(
            diags,
            "spot_percentage",
            config.spot_percentage,
            "on_demand_count",
            config.on_demand_count,
        );
        if !config.availability_zones.is_null() && !config.subnet_ids.is_null() {
            diags.error_short(
                "`availability_zones` conflicts with `subnet_ids`",
                AttributePath::new("subnet_ids"),
            );
        }
        if let Some(orientation) = config.orientation.as_deref_option() {
            if !ORIENTATIONS.contains(&orientation) {
                diags.error(
                    "Invalid orientation",
                    format!("`{}` is not one of {}", orientation, ORIENTATIONS.join(", ")),
                    AttributePath::new("orientation"),
                );
            }
        }
        if let Value::Value(timeout) = config.wait_for_capacity_timeout {
            if timeout <= 0 {
                diags.error_short(
                    "`wait_for_capacity_timeout` must be positive",
                    AttributePath::new("wait_for_capacity_timeout"),
                );
            }
        }
        if let Value::Value(capacity) = config.wait_for_capacity {
            if capacity < 0 {
                diags.error_short(
                    "`wait_for_capacity` must not be negative",
                    AttributePath::new("wait_for_capacity"),
                );
            }
        }
        if let Value::Value(policy) = &config.update_policy {
            if policy.should_roll == Value::Value(true) && policy.roll_config.is_null() {
                diags.error_short(
                    "`roll_config` is required when `should_roll` is true",
                    AttributePath::new("update_policy").index(0).attribute("roll_config"),
                );
            }
        }
    }

    fn expand<'a>(&self, state: &ElastigroupAwsState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set("/description", &state.description)
            .set_on_create("/region", &state.region)
            .set("/capacity/maximum", &state.max_size)
            .set("/capacity/minimum", &state.min_size)
            .set("/capacity/target", &state.desired_capacity)
            .set_on_create("/capacity/unit", &state.capacity_unit)
            .set("/strategy/risk", &state.spot_percentage)
            .set("/strategy/onDemandCount", &state.on_demand_count)
            .set("/strategy/availabilityVsCost", &state.orientation)
            .set("/strategy/fallbackToOd", &state.fallback_to_ondemand)
            .set("/strategy/drainingTimeout", &state.draining_timeout)
            .set("/strategy/utilizeReservedInstances", &state.utilize_reserved_instances)
            .set("/strategy/lifetimePeriod", &state.lifetime_period)
            .set_on_create("/compute/product", &state.product)
            .set("/compute/instanceTypes/ondemand", &state.instance_types_ondemand)
            .set("/compute/instanceTypes/spot", &state.instance_types_spot)
            .set("/compute/instanceTypes/preferredSpot", &state.instance_types_preferred_spot)
            .set_with("/compute/availabilityZones", &state.availability_zones, |zones| names(zones))
            .set("/compute/subnetIds", &state.subnet_ids)
            .set("/compute/launchSpecification/imageId", &state.image_id)
            .set("/compute/launchSpecification/keyPair", &state.key_name)
            .set("/compute/launchSpecification/securityGroupIds", &state.security_groups)
            .set_with("/compute/launchSpecification/userData", &state.user_data, user_data)
            .set_with(
                "/compute/launchSpecification/iamRole",
                &state.iam_instance_profile,
                instance_profile,
            )
            .set("/compute/launchSpecification/monitoring", &state.enable_monitoring)
            .set("/compute/launchSpecification/ebsOptimized", &state.ebs_optimized)
            .set("/compute/launchSpecification/healthCheckType", &state.health_check_type)
            .set(
                "/compute/launchSpecification/healthCheckGracePeriod",
                &state.health_check_grace_period,
            )
            .set_with("/compute/launchSpecification/tags", &state.tags, |map| {
                tags(map)
            })
            .blocks("/scheduling/tasks", &state.scheduled_task, |document, task| {
                document
                    .set("/taskType", &task.task_type)
                    .set("/cronExpression", &task.cron_expression)
                    .set("/isEnabled", &task.is_enabled)
                    .set("/scaleTargetCapacity", &task.target_capacity)
                    .set("/scaleMinCapacity", &task.min_capacity)
                    .set("/scaleMaxCapacity", &task.max_capacity)
                    .set("/batchSizePercentage", &task.batch_size_percentage)
                    .set("/gracePeriod", &task.grace_period);
            });
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut ElastigroupAwsState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.description, "/description");
        remote.optional(&mut state.region, "/region");
        remote.computed(&mut state.max_size, "/capacity/maximum");
        remote.computed(&mut state.min_size, "/capacity/minimum");
        remote.computed(&mut state.desired_capacity, "/capacity/target");
        remote.computed(&mut state.capacity_unit, "/capacity/unit");
        remote.optional(&mut state.spot_percentage, "/strategy/risk");
        remote.optional(&mut state.on_demand_count, "/strategy/onDemandCount");
        remote.computed(&mut state.orientation, "/strategy/availabilityVsCost");
        remote.optional(&mut state.fallback_to_ondemand, "/strategy/fallbackToOd");
        remote.computed(&mut state.draining_timeout, "/strategy/drainingTimeout");
        remote.optional(
            &mut state.utilize_reserved_instances,
            "/strategy/utilizeReservedInstances",
        );
        remote.optional(&mut state.lifetime_period, "/strategy/lifetimePeriod");
        remote.optional(&mut state.product, "/compute/product");
        remote.optional(&mut state.instance_types_ondemand, "/compute/instanceTypes/ondemand");
        remote.optional(&mut state.instance_types_spot, "/compute/instanceTypes/spot");
        remote.optional(
            &mut state.instance_types_preferred_spot,
            "/compute/instanceTypes/preferredSpot",
        );
        remote.optional_with(&mut state.availability_zones, "/compute/availabilityZones", from_names);
        remote.optional(&mut state.subnet_ids, "/compute/subnetIds");

        let launch = |pointer: &str| format!("/compute/launchSpecification{}", pointer);
        remote.optional(&mut state.image_id, &launch("/imageId"));
        remote.optional(&mut state.key_name, &launch("/keyPair"));
        remote.optional(&mut state.security_groups, &launch("/securityGroupIds"));
        remote.optional_with(&mut state.user_data, &launch("/userData"), from_user_data);
        remote.optional_with(
            &mut state.iam_instance_profile,
            &launch("/iamRole"),
            from_instance_profile,
        );
        remote.optional(&mut state.enable_monitoring, &launch("/monitoring"));
        remote.optional(&mut state.ebs_optimized, &launch("/ebsOptimized"));
        remote.optional(&mut state.health_check_type, &launch("/healthCheckType"));
        remote.optional(
            &mut state.health_check_grace_period,
            &launch("/healthCheckGracePeriod"),
        );
        remote.optional_with(&mut state.tags, &launch("/tags"), from_tags);

        remote.blocks(&mut state.scheduled_task, "/scheduling/tasks", |task, remote| {
            remote.optional(&mut task.task_type, "/taskType");
            remote.optional(&mut task.cron_expression, "/cronExpression");
            remote.optional(&mut task.is_enabled, "/isEnabled");
            remote.optional(&mut task.target_capacity, "/scaleTargetCapacity");
            remote.optional(&mut task.min_capacity, "/scaleMinCapacity");
            remote.optional(&mut task.max_capacity, "/scaleMaxCapacity");
            remote.optional(&mut task.batch_size_percentage, "/batchSizePercentage");
            remote.optional(&mut task.grace_period, "/gracePeriod");
        });
    }

    fn plan_create<'a>(&self, state: &mut ElastigroupAwsState<'a>) {
        unknown_if_null(&mut state.max_size);
        unknown_if_null(&mut state.min_size);
        unknown_if_null(&mut state.desired_capacity);
        unknown_if_null(&mut state.capacity_unit);
        unknown_if_null(&mut state.orientation);
        unknown_if_null(&mut state.draining_timeout);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &ElastigroupAwsState<'a>,
        proposed: &ElastigroupAwsState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "region", &prior.region, &proposed.region);
        force_new(&mut triggers, "product", &prior.product, &proposed.product);
        force_new(
            &mut triggers,
            "capacity_unit",
            &prior.capacity_unit,
            &proposed.capacity_unit,
        );
        triggers
    }

    async fn after_apply<'a>(
        &self,
        diags: &mut Diagnostics,
        api: &dyn SpotinstApi,
        id: &str,
        prior: Option<&ElastigroupAwsState<'a>>,
        state: &ElastigroupAwsState<'a>,
    ) -> Option<()> {
        if let (Some(_), Value::Value(policy)) = (prior, &state.update_policy) {
            if let (Value::Value(true), Value::Value(roll_config)) =
                (policy.should_roll, &policy.roll_config)
            {
                self.roll(diags, api, id, roll_config).await?;
            }
        }

        match state.wait_for_capacity {
            Value::Value(target) if target > 0 => {
                let timeout = state
                    .wait_for_capacity_timeout
                    .unwrap_or(DEFAULT_CAPACITY_TIMEOUT)
                    .max(0) as u64;
                wait_for_capacity(diags, api, id, target, Duration::from_secs(timeout)).await
            }
            _ => Some(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::{AttributePath, Diagnostics, Value};

    use super::{ElastigroupAws, ElastigroupAwsState, ScheduledTask};
    use crate::commons::{ApiObject, Flatten, Op, Refresh};

    fn string<'a>(s: &'static str) -> Value<Cow<'a, str>> {
        Value::Value(Cow::from(s))
    }

    fn state<'a>() -> ElastigroupAwsState<'a> {
        ElastigroupAwsState {
            name: string("web"),
            product: string("Linux/UNIX"),
            region: string("us-west-2"),
            max_size: Value::Value(4),
            min_size: Value::Value(1),
            desired_capacity: Value::Value(2),
            spot_percentage: Value::Value(70),
            instance_types_ondemand: string("m5.large"),
            instance_types_spot: Value::Value(vec![string("m5.large"), string("m5a.large")]),
            availability_zones: Value::Value(vec![string("us-west-2a")]),
            security_groups: Value::Value(vec![string("sg-1")]),
            iam_instance_profile: string("arn:aws:iam::123456789012:instance-profile/web"),
            user_data: string("#!/bin/sh"),
            ..Default::default()
        }
    }

    #[test]
    fn expand_create() {
        let body = ElastigroupAws.expand(&state(), Op::Create);
        assert_eq!(body["region"], json!("us-west-2"));
        assert_eq!(body["capacity"], json!({"maximum": 4, "minimum": 1, "target": 2}));
        assert_eq!(body["strategy"], json!({"risk": 70}));
        assert_eq!(body["compute"]["product"], json!("Linux/UNIX"));
        assert_eq!(body["compute"]["availabilityZones"], json!([{"name": "us-west-2a"}]));
        assert_eq!(
            body["compute"]["launchSpecification"]["iamRole"],
            json!({"arn": "arn:aws:iam::123456789012:instance-profile/web"})
        );
        assert_eq!(
            body["compute"]["launchSpecification"]["userData"],
            json!("IyEvYmluL3No")
        );
        assert!(body.get("scheduling").is_none());
    }

    #[test]
    fn expand_update() {
        let body = ElastigroupAws.expand(&state(), Op::Update);
        assert!(body.get("region").is_none());
        assert!(body["compute"].get("product").is_none());
        assert_eq!(body["strategy"]["onDemandCount"], json!(null));
        assert_eq!(body["description"], json!(null));
    }

    #[test]
    fn scheduled_tasks() {
        let mut config = state();
        config.scheduled_task = Value::Value(vec![Value::Value(ScheduledTask {
            task_type: string("scale"),
            cron_expression: string("0 1 * * *"),
            target_capacity: Value::Value(3),
            ..Default::default()
        })]);
        let body = ElastigroupAws.expand(&config, Op::Create);
        assert_eq!(
            body["scheduling"]["tasks"],
            json!([{"taskType": "scale", "cronExpression": "0 1 * * *", "scaleTargetCapacity": 3}])
        );

        let mut imported = ElastigroupAwsState::default();
        ElastigroupAws.flatten(&mut imported, Flatten::new(&body, Refresh::Import));
        assert_eq!(imported.scheduled_task, config.scheduled_task);
    }

    #[test]
    fn flatten_import() {
        let remote = json!({
            "id": "sig-1",
            "name": "web",
            "capacity": {"minimum": 0, "maximum": 2, "target": 1, "unit": "instance"},
            "strategy": {"risk": 100, "availabilityVsCost": "balanced", "drainingTimeout": 120},
            "compute": {
                "product": "Linux/UNIX",
                "instanceTypes": {"ondemand": "c5.large", "spot": ["c5.large"]},
                "availabilityZones": [{"name": "us-east-1a"}],
                "launchSpecification": {
                    "securityGroupIds": ["sg-1"],
                    "iamRole": {"name": "web"},
                    "tags": [{"tagKey": "env", "tagValue": "prod"}],
                },
            },
        });
        let mut state = ElastigroupAwsState::default();
        ElastigroupAws.flatten(&mut state, Flatten::new(&remote, Refresh::Import));
        assert_eq!(state.desired_capacity, Value::Value(1));
        assert_eq!(state.capacity_unit, string("instance"));
        assert_eq!(state.spot_percentage, Value::Value(100));
        assert_eq!(state.orientation, string("balanced"));
        assert_eq!(state.iam_instance_profile, string("web"));
        assert_eq!(state.availability_zones, Value::Value(vec![string("us-east-1a")]));
        assert_eq!(state.subnet_ids, Value::Null);
        let Value::Value(tags) = &state.tags else {
            panic!("tags were not imported");
        };
        assert_eq!(tags.get("env"), Some(&string("prod")));
    }

    #[test]
    fn flatten_sync_keeps_unmanaged_defaults() {
        let remote = json!({
            "name": "web",
            "description": "set by the console",
            "capacity": {"minimum": 1, "maximum": 5, "target": 3},
            "strategy": {"risk": 50},
        });
        let mut state = state();
        ElastigroupAws.flatten(&mut state, Flatten::new(&remote, Refresh::Sync));
        assert_eq!(state.description, Value::Null);
        assert_eq!(state.spot_percentage, Value::Value(50));
        assert_eq!(state.max_size, Value::Value(5));
        assert_eq!(state.desired_capacity, Value::Value(3));
    }

    #[test]
    fn validate() {
        let mut diags = Diagnostics::default();
        ElastigroupAws.validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let mut config = state();
        config.on_demand_count = Value::Value(1);
        config.subnet_ids = Value::Value(vec![string("subnet-1")]);
        config.orientation = string("cheapest");
        config.desired_capacity = Value::Value(10);
        ElastigroupAws.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 4);
    }

    #[test]
    fn replace_triggers() {
        let prior = state();
        let mut proposed = state();
        proposed.name = string("api");
        assert!(ElastigroupAws.replace_triggers(&prior, &proposed).is_empty());

        proposed.region = string("eu-west-1");
        proposed.product = string("Windows");
        assert_eq!(ElastigroupAws.replace_triggers(&prior, &proposed).len(), 2);
    }

    #[test]
    fn capacity_unit_is_create_only() {
        let mut prior = state();
        prior.capacity_unit = string("instance");
        let mut proposed = prior.clone();
        proposed.capacity_unit = string("weight");

        assert_eq!(
            ElastigroupAws.replace_triggers(&prior, &proposed),
            vec![AttributePath::new("capacity_unit")]
        );
        assert!(ElastigroupAws
            .expand(&proposed, Op::Update)
            .pointer("/capacity/unit")
            .is_none());
    }
}
