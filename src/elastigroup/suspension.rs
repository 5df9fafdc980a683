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

//! Suspended processes of an AWS elastigroup
//!
//! Suspensions are a setting of the group: the resource id is the group id.

use std::borrow::Cow;
use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tf_provider::{
    map, AttributePath, Block, Description, Diagnostics, NestedBlock, Resource, Schema, Value,
    ValueEmpty, ValueList, ValueString,
};
use tracing::{info, warn};

use crate::client::{ApiError, Request, SpotinstApi};
use crate::commons::schema::{id, required, string};
use crate::commons::{force_new, ApiObject, ClientHandle};

use super::ElastigroupAws;

/// Processes of a group that can be suspended
pub const PROCESSES: &[&str] = &[
    "AUTO_HEALING",
    "OUT_OF_STRATEGY",
    "PREVENTIVE_REPLACEMENT",
    "REVERT_PREFERRED",
    "SCHEDULING",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElastigroupSuspensionState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub group_id: ValueString<'a>,
    pub suspension: ValueList<Value<Suspension<'a>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspension<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
}

impl<'a> ElastigroupSuspensionState<'a> {
    fn names(&self) -> BTreeSet<String> {
        self.suspension
            .iter()
            .flatten()
            .flatten()
            .filter_map(|suspension| suspension.name.as_deref_option())
            .map(str::to_owned)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ElastigroupSuspension {
    client: ClientHandle,
}

impl ElastigroupSuspension {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

fn path(group_id: &str) -> String {
    format!("{}/{}/suspension", ElastigroupAws::PATH, group_id)
}

/// Names of the processes suspended on a group
///
/// Items are either suspensions, or wrap them in a `suspensions` list.
async fn suspended(api: &dyn SpotinstApi, group_id: &str) -> Result<BTreeSet<String>, ApiError> {
    let items = api.call(Request::get(path(group_id))).await?;
    let mut names = BTreeSet::new();
    for item in &items {
        match item.get("suspensions").and_then(Json::as_array) {
            Some(suspensions) => names.extend(
                suspensions
                    .iter()
                    .filter_map(|suspension| suspension.get("name")?.as_str())
                    .map(str::to_owned),
            ),
            None => names.extend(item.get("name").and_then(Json::as_str).map(str::to_owned)),
        }
    }
    Ok(names)
}

async fn suspend(api: &dyn SpotinstApi, group_id: &str, names: &BTreeSet<String>) -> Result<(), ApiError> {
    if names.is_empty() {
        return Ok(());
    }
    let suspensions: Vec<Json> = names.iter().map(|name| json!({ "name": name })).collect();
    api.call(Request::post(path(group_id)).body(json!({ "suspensions": suspensions })))
        .await?;
    Ok(())
}

async fn resume(api: &dyn SpotinstApi, group_id: &str, names: &BTreeSet<String>) -> Result<(), ApiError> {
    if names.is_empty() {
        return Ok(());
    }
    api.call(Request::delete(path(group_id)).body(json!({ "processes": names })))
        .await?;
    Ok(())
}

#[async_trait]
impl Resource for ElastigroupSuspension {
    type State<'a> = Value<ElastigroupSuspensionState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("ID of the suspended group"),
                    "group_id" => required(string(), "Elastigroup whose processes are suspended"),
                },
                blocks: map! {
                    "suspension" => NestedBlock::List(Block {
                        attributes: map! {
                            "name" => required(string(), "Process to suspend"),
                        },
                        description: Description::plain("Suspended process"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Suspended processes of an elastigroup"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            let empty = match &config.suspension {
                Value::Value(suspensions) => suspensions.iter().all(Value::is_null),
                Value::Null => true,
                Value::Unknown => false,
            };
            if empty {
                diags.error_short(
                    "At least one `suspension` block is required",
                    AttributePath::new("suspension"),
                );
            }
            for (i, suspension) in config.suspension.iter().flatten().enumerate() {
                let Value::Value(suspension) = suspension else {
                    continue;
                };
                if let Some(name) = suspension.name.as_deref_option() {
                    if !PROCESSES.contains(&name) {
                        diags.error(
                            "Invalid process",
                            format!("`{}` is not one of {}", name, PROCESSES.join(", ")),
                            AttributePath::new("suspension").index(i as i64).attribute("name"),
                        );
                    }
                }
            }
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = match state {
            Value::Value(state) => state,
            state => return Some((state, private_state)),
        };
        let api = self.client.api(diags)?;
        let group_id = state.id.as_deref_option().unwrap_or_default().to_owned();

        match suspended(api.as_ref(), &group_id).await {
            Ok(names) if names.is_empty() => {
                warn!(group = %group_id, "no process suspended anymore, removing suspension from state");
                Some((Value::Null, private_state))
            }
            Ok(names) => {
                // Keep the configured order when nothing changed
                if state.names() != names {
                    state.suspension = Value::Value(
                        names
                            .into_iter()
                            .map(|name| {
                                Value::Value(Suspension {
                                    name: Value::Value(Cow::Owned(name)),
                                })
                            })
                            .collect(),
                    );
                }
                state.group_id = Value::Value(Cow::Owned(group_id));
                Some((Value::Value(state), private_state))
            }
            Err(err) if err.is_not_found() => {
                warn!(group = %group_id, "elastigroup disappeared, removing suspension from state");
                Some((Value::Null, private_state))
            }
            Err(err) => {
                diags.root_error(
                    format!("Failed to read the suspensions of {}", group_id),
                    err.to_string(),
                );
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = proposed_state.map(|mut state| {
            state.id = state.group_id.clone();
            state
        });
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut trigger_replace = Vec::new();
        if let (Value::Value(prior), Value::Value(proposed)) = (&prior_state, &proposed_state) {
            force_new(&mut trigger_replace, "group_id", &prior.group_id, &proposed.group_id);
        }
        let state = proposed_state.map(|mut state| {
            state.id = state.group_id.clone();
            state
        });
        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        _prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(mut state) = planned_state else {
            diags.root_error_short("Cannot create a null suspension");
            return None;
        };
        let api = self.client.api(diags)?;
        let group_id = state.group_id.as_deref_option().unwrap_or_default().to_owned();

        if let Err(err) = suspend(api.as_ref(), &group_id, &state.names()).await {
            diags.root_error(
                format!("Failed to suspend the processes of {}", group_id),
                err.to_string(),
            );
            return None;
        }
        info!(group = %group_id, "suspended processes");

        state.id = Value::Value(Cow::Owned(group_id));
        Some((Value::Value(state), planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let (Value::Value(prior), Value::Value(state)) = (prior_state, planned_state) else {
            diags.root_error_short("Cannot update a null suspension");
            return None;
        };
        let api = self.client.api(diags)?;
        let group_id = state.group_id.as_deref_option().unwrap_or_default().to_owned();

        let before = prior.names();
        let after = state.names();
        let added = after.difference(&before).cloned().collect();
        let removed = before.difference(&after).cloned().collect();

        let result = match resume(api.as_ref(), &group_id, &removed).await {
            Ok(()) => suspend(api.as_ref(), &group_id, &added).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            diags.root_error(
                format!("Failed to update the suspensions of {}", group_id),
                err.to_string(),
            );
            return None;
        }
        info!(group = %group_id, "updated suspended processes");

        Some((Value::Value(state), planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(state) = state else {
            return Some(());
        };
        let api = self.client.api(diags)?;
        let group_id = state.id.as_deref_option().unwrap_or_default().to_owned();

        match resume(api.as_ref(), &group_id, &state.names()).await {
            Ok(()) => {
                info!(group = %group_id, "resumed processes");
                Some(())
            }
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error(
                    format!("Failed to resume the processes of {}", group_id),
                    err.to_string(),
                );
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = ElastigroupSuspensionState {
            id: Value::Value(Cow::Owned(id)),
            ..Default::default()
        };
        let (state, private_state) = self
            .read(diags, Value::Value(state), Default::default(), Default::default())
            .await?;
        if state.is_null() {
            diags.root_error_short("No process is suspended on this elastigroup");
            return None;
        }
        Some((state, private_state))
    }
}
