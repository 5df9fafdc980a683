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

//! Ocean clusters: container-driven autoscaling of spot capacity

use serde::{Deserialize, Serialize};
use tf_provider::{
    map, value, AttributePath, Block, Description, Diagnostics, NestedBlock, Value, ValueList,
    ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;

use crate::commons::schema::{boolean, number, optional};
use crate::commons::{Document, Flatten};

mod aws;
mod ecs;
mod launch_spec;

pub use aws::{OceanAws, OceanAwsState};
pub use ecs::{OceanEcs, OceanEcsState};
pub use launch_spec::{
    LaunchSpecDeleteOptions, OceanAwsLaunchSpec, OceanAwsLaunchSpecState, Taint, TAINT_EFFECTS,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autoscaler {
    pub autoscale_is_enabled: ValueBool,
    pub autoscale_is_auto_config: ValueBool,
    pub autoscale_cooldown: ValueNumber,
    pub max_scale_down_percentage: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub resource_limits: Value<ResourceLimits>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub max_vcpu: ValueNumber,
    pub max_memory_gib: ValueNumber,
}

pub(crate) fn autoscaler_schema() -> NestedBlock {
    NestedBlock::Optional(Block {
        attributes: map! {
            "autoscale_is_enabled" => optional(boolean(), "Enable the autoscaler"),
            "autoscale_is_auto_config" => optional(boolean(), "Let the autoscaler compute its headroom"),
            "autoscale_cooldown" => optional(number(), "Seconds between two scaling actions"),
            "max_scale_down_percentage" => optional(number(), "Maximum percentage of the cluster scaled down at once"),
        },
        blocks: map! {
            "resource_limits" => NestedBlock::Optional(Block {
                attributes: map! {
                    "max_vcpu" => optional(number(), "Maximum vCPUs of the cluster"),
                    "max_memory_gib" => optional(number(), "Maximum memory of the cluster, in GiB"),
                },
                description: Description::plain("Limits of the cluster"),
                ..Default::default()
            }),
        },
        description: Description::plain("Autoscaler of the cluster"),
        ..Default::default()
    })
}

pub(crate) fn expand_autoscaler(document: &mut Document, autoscaler: &Autoscaler) {
    document
        .set("/isEnabled", &autoscaler.autoscale_is_enabled)
        .set("/isAutoConfig", &autoscaler.autoscale_is_auto_config)
        .set("/cooldown", &autoscaler.autoscale_cooldown)
        .set("/down/maxScaleDownPercentage", &autoscaler.max_scale_down_percentage)
        .block("/resourceLimits", &autoscaler.resource_limits, |document, limits| {
            document
                .set("/maxVCpu", &limits.max_vcpu)
                .set("/maxMemoryGib", &limits.max_memory_gib);
        });
}

pub(crate) fn flatten_autoscaler(autoscaler: &mut Autoscaler, remote: Flatten) {
    remote.optional(&mut autoscaler.autoscale_is_enabled, "/isEnabled");
    remote.optional(&mut autoscaler.autoscale_is_auto_config, "/isAutoConfig");
    remote.optional(&mut autoscaler.autoscale_cooldown, "/cooldown");
    remote.optional(&mut autoscaler.max_scale_down_percentage, "/down/maxScaleDownPercentage");
    remote.block(&mut autoscaler.resource_limits, "/resourceLimits", |limits, remote| {
        remote.optional(&mut limits.max_vcpu, "/maxVCpu");
        remote.optional(&mut limits.max_memory_gib, "/maxMemoryGib");
    });
}

/// Instance types are either allowed or denied
pub(crate) fn validate_instance_types(
    diags: &mut Diagnostics,
    whitelist: &ValueList<ValueString>,
    blacklist: &ValueList<ValueString>,
) {
    if !whitelist.is_null() && !blacklist.is_null() {
        diags.error_short(
            "`whitelist` conflicts with `blacklist`",
            AttributePath::new("blacklist"),
        );
    }
}

pub(crate) fn validate_percentage(diags: &mut Diagnostics, name: &'static str, value: ValueNumber) {
    if let Value::Value(percentage) = value {
        if !(0..=100).contains(&percentage) {
            diags.error_short(
                format!("`{}` must be between 0 and 100", name),
                AttributePath::new(name),
            );
        }
    }
}
