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

//! Cleanup of the objects left over by acceptance tests

use anyhow::{bail, Result};
use futures::future::join_all;
use serde_json::Value as Json;
use tracing::{info, warn};

use crate::client::{DeleteOptions, SpotinstApi, SpotinstApiExt};
use crate::commons::ApiObject;
use crate::elastigroup::{ElastigroupAws, ElastigroupAzureV3, ElastigroupGcp};
use crate::health_check::HealthCheck;
use crate::managed_instance::ManagedInstanceAws;
use crate::mrscaler::MrScalerAws;
use crate::multai::{MultaiBalancer, MultaiTarget, MultaiTargetSet};
use crate::ocean::{OceanAws, OceanAwsLaunchSpec, OceanEcs};
use crate::stateful_node::StatefulNodeAzure;
use crate::subscription::Subscription;

/// Prefix of the names given to acceptance test objects
pub const TEST_PREFIX: &str = "test-acc-";

/// Sweepable collections, children before their parents
pub const STAGES: &[&[&str]] = &[
    &[
        OceanAwsLaunchSpec::PATH,
        MultaiTarget::PATH,
        HealthCheck::PATH,
        Subscription::PATH,
    ],
    &[OceanAws::PATH, MultaiTargetSet::PATH],
    &[
        ElastigroupAws::PATH,
        ElastigroupGcp::PATH,
        ElastigroupAzureV3::PATH,
        OceanEcs::PATH,
        ManagedInstanceAws::PATH,
        StatefulNodeAzure::PATH,
        MrScalerAws::PATH,
        MultaiBalancer::PATH,
    ],
];

/// Ids of the objects of `items` whose name starts with `prefix`
fn matching<'j>(items: &'j [Json], prefix: &str) -> Vec<&'j str> {
    items
        .iter()
        .filter(|item| {
            item.get("name")
                .and_then(Json::as_str)
                .is_some_and(|name| name.starts_with(prefix))
        })
        .filter_map(|item| item.get("id").and_then(Json::as_str))
        .collect()
}

/// Delete every object of `path` whose name starts with `prefix`
///
/// Deletions run concurrently, and all of them are attempted even if some fail.
pub async fn sweep_collection(api: &dyn SpotinstApi, path: &str, prefix: &str) -> Result<usize> {
    let items = api.list_objects(path).await?;
    let ids = matching(&items, prefix);

    let results = join_all(ids.iter().map(|&id| async move {
        let result = api.delete_object(path, id, DeleteOptions::default()).await;
        (id, result)
    }))
    .await;

    let mut deleted = 0;
    let mut failures = Vec::new();
    for (id, result) in results {
        match result {
            Ok(()) => {
                info!(path, id, "swept");
                deleted += 1;
            }
            Err(err) if err.is_not_found() => (),
            Err(err) => {
                warn!(path, id, error = %err, "failed to sweep");
                failures.push(format!("{}/{}: {}", path, id, err));
            }
        }
    }

    if failures.is_empty() {
        Ok(deleted)
    } else {
        bail!("failed to sweep {} objects:\n{}", failures.len(), failures.join("\n"))
    }
}

/// Sweep all the collections, stage after stage
pub async fn sweep(api: &dyn SpotinstApi, prefix: &str) -> Result<usize> {
    let mut deleted = 0;
    let mut failures = Vec::new();
    for stage in STAGES {
        let results = join_all(
            stage
                .iter()
                .map(|&path| sweep_collection(api, path, prefix)),
        )
        .await;
        for result in results {
            match result {
                Ok(count) => deleted += count,
                Err(err) => failures.push(format!("{:#}", err)),
            }
        }
    }

    if failures.is_empty() {
        info!(deleted, prefix, "sweep done");
        Ok(deleted)
    } else {
        bail!("sweep failed:\n{}", failures.join("\n"))
    }
}
