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

//! EMR clusters scaled on spot capacity
//!
//! A scaler either creates a new cluster, clones an existing one,
//! or wraps an existing one to scale its task group.

use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tf_provider::{
    map, AttributePath, Block, Description, Diagnostics, Schema, Value, ValueList, ValueMap,
    ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;

use crate::commons::fields::{from_tags, tags};
use crate::commons::schema::{
    boolean, id, number, optional, required, string, string_list, string_map,
};
use crate::commons::{force_new, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

pub const STRATEGIES: &[&str] = &["new", "clone", "wrap"];
const LIFE_CYCLES: &[&str] = &["SPOT", "ON_DEMAND"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrScalerAwsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub region: ValueString<'a>,
    pub strategy: ValueString<'a>,
    pub cluster_id: ValueString<'a>,
    pub release_label: ValueString<'a>,
    pub availability_zones: ValueList<ValueString<'a>>,
    pub ebs_root_volume_size: ValueNumber,
    pub ec2_key_name: ValueString<'a>,
    pub log_uri: ValueString<'a>,
    pub job_flow_role: ValueString<'a>,
    pub service_role: ValueString<'a>,
    pub security_config: ValueString<'a>,
    pub termination_protected: ValueBool,
    pub keep_job_flow_alive: ValueBool,
    pub master_instance_types: ValueList<ValueString<'a>>,
    pub master_lifecycle: ValueString<'a>,
    pub master_target: ValueNumber,
    pub core_instance_types: ValueList<ValueString<'a>>,
    pub core_lifecycle: ValueString<'a>,
    pub core_min_size: ValueNumber,
    pub core_max_size: ValueNumber,
    pub core_desired_capacity: ValueNumber,
    pub task_instance_types: ValueList<ValueString<'a>>,
    pub task_lifecycle: ValueString<'a>,
    pub task_min_size: ValueNumber,
    pub task_max_size: ValueNumber,
    pub task_desired_capacity: ValueNumber,
    pub tags: ValueMap<'a, ValueString<'a>>,
}
with_id!(MrScalerAwsState);

#[derive(Debug, Default, Clone, Copy)]
pub struct MrScalerAws;

/// `us-east-1a:subnet-1` to `{"name": "us-east-1a", "subnetId": "subnet-1"}`
fn availability_zones(zones: &[ValueString]) -> Json {
    Json::Array(
        zones
            .iter()
            .flatten()
            .map(|zone| match zone.split_once(':') {
                Some((name, subnet)) => json!({ "name": name, "subnetId": subnet }),
                None => json!({ "name": zone.to_string() }),
            })
            .collect(),
    )
}

fn from_availability_zones<'a>(json: &Json) -> Option<Vec<ValueString<'a>>> {
    Some(
        json.as_array()?
            .iter()
            .filter_map(|zone| {
                let name = zone.get("name")?.as_str()?;
                let zone = match zone.get("subnetId").and_then(Json::as_str) {
                    Some(subnet) => format!("{}:{}", name, subnet),
                    None => name.to_owned(),
                };
                Some(Value::Value(Cow::Owned(zone)))
            })
            .collect(),
    )
}

/// Pointer of the source cluster for the strategies using one
fn cluster_pointer(strategy: &str) -> Option<&'static str> {
    match strategy {
        "clone" => Some("/strategy/cloning/originClusterId"),
        "wrap" => Some("/strategy/wrapping/sourceClusterId"),
        _ => None,
    }
}

#[async_trait]
impl ApiObject for MrScalerAws {
    type State<'a> = MrScalerAwsState<'a>;

    const NAME: &'static str = "mrscaler";
    const PATH: &'static str = "/aws/emr/mrScaler";
    const KEY: &'static str = "mrScaler";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("MrScaler ID"),
                    "name" => required(string(), "Name of the scaler"),
                    "description" => optional(string(), "Description of the scaler"),
                    "region" => optional(string(), "AWS region of the cluster"),
                    "strategy" => required(string(), "How the cluster is obtained: new, clone or wrap"),
                    "cluster_id" => optional(string(), "Cluster cloned or wrapped"),
                    "release_label" => optional(string(), "EMR release of a new cluster"),
                    "availability_zones" => optional(string_list(), "Zones of the cluster, as `zone:subnet`"),
                    "ebs_root_volume_size" => optional(number(), "Size of the root volumes, in GB"),
                    "ec2_key_name" => optional(string(), "Key pair of the instances"),
                    "log_uri" => optional(string(), "S3 location of the logs"),
                    "job_flow_role" => optional(string(), "Instance profile of the instances"),
                    "service_role" => optional(string(), "IAM role assumed by EMR"),
                    "security_config" => optional(string(), "EMR security configuration"),
                    "termination_protected" => optional(boolean(), "Protect the cluster against termination"),
                    "keep_job_flow_alive" => optional(boolean(), "Keep the cluster when no step is running"),
                    "master_instance_types" => optional(string_list(), "Instance types of the master group"),
                    "master_lifecycle" => optional(string(), "Life cycle of the master group: SPOT or ON_DEMAND"),
                    "master_target" => optional(number(), "Number of master instances"),
                    "core_instance_types" => optional(string_list(), "Instance types of the core group"),
                    "core_lifecycle" => optional(string(), "Life cycle of the core group: SPOT or ON_DEMAND"),
                    "core_min_size" => optional(number(), "Minimum number of core instances"),
                    "core_max_size" => optional(number(), "Maximum number of core instances"),
                    "core_desired_capacity" => optional(number(), "Number of core instances"),
                    "task_instance_types" => optional(string_list(), "Instance types of the task group"),
                    "task_lifecycle" => optional(string(), "Life cycle of the task group: SPOT or ON_DEMAND"),
                    "task_min_size" => optional(number(), "Minimum number of task instances"),
                    "task_max_size" => optional(number(), "Maximum number of task instances"),
                    "task_desired_capacity" => optional(number(), "Number of task instances"),
                    "tags" => optional(string_map(), "Tags of the cluster"),
                },
                description: Description::plain("Spotinst scaler of an AWS EMR cluster"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &MrScalerAwsState<'a>) {
        if let Some(strategy) = config.strategy.as_deref_option() {
            if !STRATEGIES.contains(&strategy) {
                diags.error(
                    "Invalid strategy",
                    format!("`{}` is not one of {}", strategy, STRATEGIES.join(", ")),
                    AttributePath::new("strategy"),
                );
            } else if cluster_pointer(strategy).is_some() && config.cluster_id.is_null() {
                diags.error_short(
                    format!("`cluster_id` is required by the `{}` strategy", strategy),
                    AttributePath::new("cluster_id"),
                );
            } else if strategy != "new" && !config.release_label.is_null() {
                diags.error_short(
                    "`release_label` is only used by the `new` strategy",
                    AttributePath::new("release_label"),
                );
            }
        }
        for (name, lifecycle) in [
            ("master_lifecycle", &config.master_lifecycle),
            ("core_lifecycle", &config.core_lifecycle),
            ("task_lifecycle", &config.task_lifecycle),
        ] {
            if let Some(lifecycle) = lifecycle.as_deref_option() {
                if !LIFE_CYCLES.contains(&lifecycle) {
                    diags.error(
                        "Invalid life cycle",
                        format!("`{}` is not one of {}", lifecycle, LIFE_CYCLES.join(", ")),
                        AttributePath::new(name),
                    );
                }
            }
        }
    }

    fn expand<'a>(&self, state: &MrScalerAwsState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set("/description", &state.description)
            .set_on_create("/region", &state.region);

        if op == Op::Create {
            match state.strategy.as_deref_option().and_then(cluster_pointer) {
                Some(pointer) => {
                    document.set(pointer, &state.cluster_id);
                }
                None => {
                    document.set("/strategy/new/releaseLabel", &state.release_label);
                }
            }
            // The API only knows the strategy through the presence of its block
            if state.strategy.as_deref_option() == Some("new") && state.release_label.is_null() {
                document.set_json("/strategy/new", json!({}));
            }
        }

        document
            .set_with("/compute/availabilityZones", &state.availability_zones, |zones| {
                availability_zones(zones)
            })
            .set("/compute/ebsRootVolumeSize", &state.ebs_root_volume_size)
            .set("/compute/ec2KeyName", &state.ec2_key_name)
            .set_with("/compute/tags", &state.tags, |map| tags(map))
            .set("/cluster/logUri", &state.log_uri)
            .set("/cluster/jobFlowRole", &state.job_flow_role)
            .set("/cluster/serviceRole", &state.service_role)
            .set("/cluster/securityConfiguration", &state.security_config)
            .set("/cluster/terminationProtected", &state.termination_protected)
            .set("/cluster/keepJobFlowAliveWhenNoSteps", &state.keep_job_flow_alive);

        let group = |name: &str, pointer: &str| format!("/compute/instanceGroups/{}{}", name, pointer);
        document
            .set(&group("masterGroup", "/instanceTypes"), &state.master_instance_types)
            .set(&group("masterGroup", "/lifeCycle"), &state.master_lifecycle)
            .set(&group("masterGroup", "/target"), &state.master_target)
            .set(&group("coreGroup", "/instanceTypes"), &state.core_instance_types)
            .set(&group("coreGroup", "/lifeCycle"), &state.core_lifecycle)
            .set(&group("coreGroup", "/capacity/minimum"), &state.core_min_size)
            .set(&group("coreGroup", "/capacity/maximum"), &state.core_max_size)
            .set(&group("coreGroup", "/capacity/target"), &state.core_desired_capacity)
            .set(&group("taskGroup", "/instanceTypes"), &state.task_instance_types)
            .set(&group("taskGroup", "/lifeCycle"), &state.task_lifecycle)
            .set(&group("taskGroup", "/capacity/minimum"), &state.task_min_size)
            .set(&group("taskGroup", "/capacity/maximum"), &state.task_max_size)
            .set(&group("taskGroup", "/capacity/target"), &state.task_desired_capacity);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut MrScalerAwsState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.description, "/description");
        remote.optional(&mut state.region, "/region");

        let strategy = if remote.at("/strategy/cloning").is_some() {
            Some("clone")
        } else if remote.at("/strategy/wrapping").is_some() {
            Some("wrap")
        } else if remote.at("/strategy/new").is_some() {
            Some("new")
        } else {
            None
        };
        remote.optional_with(&mut state.strategy, "/strategy", |_| {
            strategy.map(Cow::Borrowed)
        });
        if let Some(pointer) = strategy.and_then(cluster_pointer) {
            remote.optional(&mut state.cluster_id, pointer);
        }
        remote.optional(&mut state.release_label, "/strategy/new/releaseLabel");

        remote.optional_with(
            &mut state.availability_zones,
            "/compute/availabilityZones",
            from_availability_zones,
        );
        remote.optional(&mut state.ebs_root_volume_size, "/compute/ebsRootVolumeSize");
        remote.optional(&mut state.ec2_key_name, "/compute/ec2KeyName");
        remote.optional_with(&mut state.tags, "/compute/tags", from_tags);
        remote.optional(&mut state.log_uri, "/cluster/logUri");
        remote.optional(&mut state.job_flow_role, "/cluster/jobFlowRole");
        remote.optional(&mut state.service_role, "/cluster/serviceRole");
        remote.optional(&mut state.security_config, "/cluster/securityConfiguration");
        remote.optional(&mut state.termination_protected, "/cluster/terminationProtected");
        remote.optional(&mut state.keep_job_flow_alive, "/cluster/keepJobFlowAliveWhenNoSteps");

        let group = |name: &str, pointer: &str| format!("/compute/instanceGroups/{}{}", name, pointer);
        remote.optional(&mut state.master_instance_types, &group("masterGroup", "/instanceTypes"));
        remote.optional(&mut state.master_lifecycle, &group("masterGroup", "/lifeCycle"));
        remote.optional(&mut state.master_target, &group("masterGroup", "/target"));
        remote.optional(&mut state.core_instance_types, &group("coreGroup", "/instanceTypes"));
        remote.optional(&mut state.core_lifecycle, &group("coreGroup", "/lifeCycle"));
        remote.optional(&mut state.core_min_size, &group("coreGroup", "/capacity/minimum"));
        remote.optional(&mut state.core_max_size, &group("coreGroup", "/capacity/maximum"));
        remote.optional(&mut state.core_desired_capacity, &group("coreGroup", "/capacity/target"));
        remote.optional(&mut state.task_instance_types, &group("taskGroup", "/instanceTypes"));
        remote.optional(&mut state.task_lifecycle, &group("taskGroup", "/lifeCycle"));
        remote.optional(&mut state.task_min_size, &group("taskGroup", "/capacity/minimum"));
        remote.optional(&mut state.task_max_size, &group("taskGroup", "/capacity/maximum"));
        remote.optional(&mut state.task_desired_capacity, &group("taskGroup", "/capacity/target"));
    }

    fn replace_triggers<'a>(
        &self,
        prior: &MrScalerAwsState<'a>,
        proposed: &MrScalerAwsState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "region", &prior.region, &proposed.region);
        force_new(&mut triggers, "strategy", &prior.strategy, &proposed.strategy);
        force_new(&mut triggers, "cluster_id", &prior.cluster_id, &proposed.cluster_id);
        force_new(&mut triggers, "release_label", &prior.release_label, &proposed.release_label);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::{Diagnostics, Value};

    use super::{MrScalerAws, MrScalerAwsState};
    use crate::commons::{ApiObject, Flatten, Op, Refresh};

    fn string<'a>(s: &'static str) -> Value<Cow<'a, str>> {
        Value::Value(Cow::from(s))
    }

    fn wrapping<'a>() -> MrScalerAwsState<'a> {
        MrScalerAwsState {
            name: string("emr"),
            region: string("us-east-1"),
            strategy: string("wrap"),
            cluster_id: string("j-123"),
            task_instance_types: Value::Value(vec![string("m5.xlarge")]),
            task_lifecycle: string("SPOT"),
            task_min_size: Value::Value(0),
            task_max_size: Value::Value(10),
            ..Default::default()
        }
    }

    #[test]
    fn expand_strategies() {
        let body = MrScalerAws.expand(&wrapping(), Op::Create);
        assert_eq!(body["strategy"], json!({"wrapping": {"sourceClusterId": "j-123"}}));
        assert_eq!(
            body["compute"]["instanceGroups"]["taskGroup"],
            json!({
                "instanceTypes": ["m5.xlarge"],
                "lifeCycle": "SPOT",
                "capacity": {"minimum": 0, "maximum": 10},
            })
        );
        assert!(MrScalerAws.expand(&wrapping(), Op::Update).get("strategy").is_none());

        let mut new = wrapping();
        new.strategy = string("new");
        new.cluster_id = Value::Null;
        assert_eq!(MrScalerAws.expand(&new, Op::Create)["strategy"], json!({"new": {}}));
        new.release_label = string("emr-6.2.0");
        assert_eq!(
            MrScalerAws.expand(&new, Op::Create)["strategy"],
            json!({"new": {"releaseLabel": "emr-6.2.0"}})
        );
    }

    #[test]
    fn import_strategy() {
        let remote = json!({
            "name": "emr",
            "strategy": {"cloning": {"originClusterId": "j-456"}},
            "compute": {"availabilityZones": [{"name": "us-east-1a", "subnetId": "subnet-1"}]},
        });
        let mut state = MrScalerAwsState::default();
        MrScalerAws.flatten(&mut state, Flatten::new(&remote, Refresh::Import));
        assert_eq!(state.strategy, string("clone"));
        assert_eq!(state.cluster_id, string("j-456"));
        assert_eq!(state.release_label, Value::Null);
        assert_eq!(
            state.availability_zones,
            Value::Value(vec![string("us-east-1a:subnet-1")])
        );
    }

    #[test]
    fn validate_strategy() {
        let mut diags = Diagnostics::default();
        MrScalerAws.validate(&mut diags, &wrapping());
        assert!(diags.errors.is_empty());

        let mut config = wrapping();
        config.cluster_id = Value::Null;
        MrScalerAws.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        let mut config = wrapping();
        config.strategy = string("migrate");
        config.core_lifecycle = string("RESERVED");
        MrScalerAws.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn strategy_forces_replacement() {
        let prior = wrapping();
        let mut proposed = wrapping();
        proposed.strategy = string("clone");
        let triggers = MrScalerAws.replace_triggers(&prior, &proposed);
        assert_eq!(triggers.len(), 1);
    }
}
