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

//! Elastigroups: groups of instances mixing spot and on-demand capacity

use tf_provider::{AttributePath, Diagnostics, Value, ValueNumber};

mod aws;
mod azure_v3;
mod gcp;
mod suspension;

pub use aws::{ElastigroupAws, ElastigroupAwsState, RollConfig, ScheduledTask, UpdatePolicy};
pub use azure_v3::{ElastigroupAzureV3, ElastigroupAzureV3State};
pub use gcp::{ElastigroupGcp, ElastigroupGcpState, GcpNetworkInterface};
pub use suspension::{ElastigroupSuspension, ElastigroupSuspensionState, Suspension, PROCESSES};

/// Check `min_size <= desired_capacity <= max_size` for the known values
pub(crate) fn validate_capacity(
    diags: &mut Diagnostics,
    min_size: ValueNumber,
    desired_capacity: ValueNumber,
    max_size: ValueNumber,
) {
    let min = min_size.as_option();
    let desired = desired_capacity.as_option();
    let max = max_size.as_option();

    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            diags.error_short("`min_size` must not exceed `max_size`", AttributePath::new("min_size"));
        }
    }
    if let (Some(min), Some(desired)) = (min, desired) {
        if desired < min {
            diags.error_short(
                "`desired_capacity` must not be lower than `min_size`",
                AttributePath::new("desired_capacity"),
            );
        }
    }
    if let (Some(desired), Some(max)) = (desired, max) {
        if desired > max {
            diags.error_short(
                "`desired_capacity` must not exceed `max_size`",
                AttributePath::new("desired_capacity"),
            );
        }
    }
}

/// Check a percentage and its exclusion with an on-demand count
pub(crate) fn validate_spot_mix(
    diags: &mut Diagnostics,
    percentage_name: &'static str,
    percentage: ValueNumber,
    count_name: &'static str,
    count: ValueNumber,
) {
    if let Value::Value(percentage) = percentage {
        if !(0..=100).contains(&percentage) {
            diags.error_short(
                format!("`{}` must be between 0 and 100", percentage_name),
                AttributePath::new(percentage_name),
            );
        }
    }
    if !percentage.is_null() && !count.is_null() {
        diags.error_short(
            format!("`{}` conflicts with `{}`", percentage_name, count_name),
            AttributePath::new(count_name),
        );
    }
}
