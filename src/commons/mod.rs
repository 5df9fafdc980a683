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

//! Lifecycle shared by every Spotinst object
//!
//! An [`ApiObject`] describes how a kind of object maps to the API
//! (collection, body key, field table), and [`SpotinstResource`] turns it
//! into a Terraform resource.

use std::borrow::Cow;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tf_provider::{AttributePath, Diagnostics, Resource, Schema, Value, ValueEmpty};
use tracing::{info, warn};

use crate::client::{DeleteOptions, SpotinstApi, SpotinstApiExt};
use crate::utils::WithId;

pub mod azure;
mod expand;
pub mod fields;
mod flatten;
mod meta;
pub mod schema;

pub use expand::{Document, Op, ToJson};
pub use flatten::{Flatten, FromJson, Refresh};
pub use meta::{ClientHandle, ProviderMeta};

/// Description of a kind of Spotinst object
#[async_trait]
pub trait ApiObject: Debug + Send + Sync + 'static {
    /// Terraform state of the object
    type State<'a>: Serialize
        + Deserialize<'a>
        + Send
        + Sync
        + Clone
        + Debug
        + Default
        + WithId<'a>;

    /// Human readable name of the kind, used in diagnostics and logs
    const NAME: &'static str;
    /// Path of the collection holding the objects
    const PATH: &'static str;
    /// Key wrapping the object in request bodies
    const KEY: &'static str;

    fn schema(&self) -> Schema;

    /// Check a configuration, unknown values must be accepted
    fn validate<'a>(&self, diags: &mut Diagnostics, config: &Self::State<'a>) {
        _ = diags;
        _ = config;
    }

    /// Build the API document from a state
    fn expand<'a>(&self, state: &Self::State<'a>, op: Op) -> Json;

    /// Refresh a state from the API object
    fn flatten<'a>(&self, state: &mut Self::State<'a>, remote: Flatten<'_>);

    /// Mark the values the API is going to generate as unknown
    fn plan_create<'a>(&self, state: &mut Self::State<'a>) {
        _ = state;
    }

    /// Attributes whose change requires a new object
    fn replace_triggers<'a>(
        &self,
        prior: &Self::State<'a>,
        proposed: &Self::State<'a>,
    ) -> Vec<AttributePath> {
        _ = prior;
        _ = proposed;
        Vec::new()
    }

    fn delete_options<'a>(&self, state: &Self::State<'a>) -> DeleteOptions {
        _ = state;
        DeleteOptions::default()
    }

    /// Extra calls once the object has been created (`prior` is `None`) or updated
    async fn after_apply<'a>(
        &self,
        diags: &mut Diagnostics,
        api: &dyn SpotinstApi,
        id: &str,
        prior: Option<&Self::State<'a>>,
        state: &Self::State<'a>,
    ) -> Option<()> {
        _ = (diags, api, id, prior, state);
        Some(())
    }
}

/// Record `name` as a replace trigger if its value changes
pub fn force_new<T: PartialEq>(
    triggers: &mut Vec<AttributePath>,
    name: &'static str,
    prior: &Value<T>,
    proposed: &Value<T>,
) {
    if prior != proposed {
        triggers.push(AttributePath::new(name));
    }
}

/// Mark an optional and computed attribute left null as unknown
pub fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

fn state_id<'a, S: WithId<'a>>(diags: &mut Diagnostics, state: &S) -> Option<String> {
    match state.id().as_deref_option() {
        Some(id) if !id.is_empty() => Some(id.to_owned()),
        _ => {
            diags.error_short("The object has no id", AttributePath::new("id"));
            None
        }
    }
}

/// Terraform resource managing objects of kind `K`
#[derive(Debug)]
pub struct SpotinstResource<K: ApiObject> {
    kind: K,
    client: ClientHandle,
}

impl<K: ApiObject> SpotinstResource<K> {
    pub fn new(kind: K, client: ClientHandle) -> Self {
        Self { kind, client }
    }
}

#[async_trait]
impl<K: ApiObject> Resource for SpotinstResource<K> {
    type State<'a> = Value<K::State<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(self.kind.schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            self.kind.validate(diags, config);
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
        let id = state_id(diags, &state)?;

        match api.read_object(K::PATH, &id).await {
            Ok(remote) => {
                self.kind
                    .flatten(&mut state, Flatten::new(&remote, Refresh::Sync));
                Some((Value::Value(state), private_state))
            }
            Err(err) if err.is_not_found() => {
                warn!(kind = K::NAME, id = %id, "object disappeared, removing it from state");
                Some((Value::Null, private_state))
            }
            Err(err) => {
                diags.root_error(format!("Failed to read {} {}", K::NAME, id), err.to_string());
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
            *state.id_mut() = Value::Unknown;
            self.kind.plan_create(&mut state);
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
        match (prior_state, proposed_state) {
            (Value::Value(prior), Value::Value(mut state)) => {
                let trigger_replace = self.kind.replace_triggers(&prior, &state);
                *state.id_mut() = prior.id().clone();
                Some((Value::Value(state), prior_private_state, trigger_replace))
            }
            (_, state) => Some((state, prior_private_state, Vec::new())),
        }
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
            diags.root_error_short(format!("Cannot create a null {}", K::NAME));
            return None;
        };
        let api = self.client.api(diags)?;

        let body = self.kind.expand(&state, Op::Create);
        let remote = match api.create_object(K::PATH, K::KEY, body).await {
            Ok(remote) => remote,
            Err(err) => {
                diags.root_error(format!("Failed to create {}", K::NAME), err.to_string());
                return None;
            }
        };
        let Some(id) = remote.get("id").and_then(Json::as_str) else {
            diags.root_error(
                format!("Failed to create {}", K::NAME),
                "The API did not return the id of the created object",
            );
            return None;
        };
        info!(kind = K::NAME, id = %id, "created");

        *state.id_mut() = Value::Value(Cow::Owned(id.to_owned()));
        self.kind
            .flatten(&mut state, Flatten::new(&remote, Refresh::Apply));

        // The object exists now: it is kept in the state even if the hooks fail
        _ = self
            .kind
            .after_apply(diags, api.as_ref(), id, None, &state)
            .await;

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
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, planned_state) else {
            diags.root_error_short(format!("Cannot update a null {}", K::NAME));
            return None;
        };
        let api = self.client.api(diags)?;
        let id = state_id(diags, &prior)?;

        let body = self.kind.expand(&state, Op::Update);
        let remote = match api.update_object(K::PATH, &id, K::KEY, body).await {
            Ok(remote) => remote,
            Err(err) => {
                diags.root_error(format!("Failed to update {} {}", K::NAME, id), err.to_string());
                return None;
            }
        };
        info!(kind = K::NAME, id = %id, "updated");

        *state.id_mut() = Value::Value(Cow::Owned(id.clone()));
        self.kind
            .flatten(&mut state, Flatten::new(&remote, Refresh::Apply));

        _ = self
            .kind
            .after_apply(diags, api.as_ref(), &id, Some(&prior), &state)
            .await;

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
        let id = state_id(diags, &state)?;

        let options = self.kind.delete_options(&state);
        match api.delete_object(K::PATH, &id, options).await {
            Ok(()) => {
                info!(kind = K::NAME, id = %id, "deleted");
                Some(())
            }
            Err(err) if err.is_not_found() => {
                warn!(kind = K::NAME, id = %id, "object was already deleted");
                Some(())
            }
            Err(err) => {
                diags.root_error(format!("Failed to delete {} {}", K::NAME, id), err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let meta = self.client.get(diags)?;
        let refresh = if meta.flags.import_full_state {
            Refresh::Import
        } else {
            Refresh::Sync
        };

        let remote = match meta.api.read_object(K::PATH, &id).await {
            Ok(remote) => remote,
            Err(err) => {
                diags.root_error(format!("Cannot import {} {}", K::NAME, id), err.to_string());
                return None;
            }
        };

        info!(kind = K::NAME, id = %id, "importing");
        let mut state: K::State<'a> = Default::default();
        *state.id_mut() = Value::Value(Cow::Owned(id));
        self.kind.flatten(&mut state, Flatten::new(&remote, refresh));

        Some((Value::Value(state), Default::default()))
    }
}
