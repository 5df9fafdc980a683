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

//! Link between a Spotinst account and an AWS IAM role
//!
//! The credentials are a setting of the account, not an object: the resource
//! id is the account id, and deleting the resource only forgets it.

use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use tf_provider::{
    map, AttributePath, Block, Description, Diagnostics, Resource, Schema, Value, ValueEmpty,
    ValueString,
};
use tracing::{info, warn};

use crate::client::{ApiError, Request, SpotinstApi};
use crate::commons::schema::{id, required, string};
use crate::commons::{force_new, ClientHandle};
use crate::config::validate_account;

const PATH: &str = "/setup/credentials/aws";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsAwsState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub account_id: ValueString<'a>,
    pub iam_role: ValueString<'a>,
}

#[derive(Debug, Clone)]
pub struct CredentialsAws {
    client: ClientHandle,
}

impl CredentialsAws {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

/// Get the IAM role currently linked to `account`
async fn linked_role(api: &dyn SpotinstApi, account: &str) -> Result<Option<String>, ApiError> {
    let items = api
        .call(Request::get(PATH).query("accountId", account))
        .await?;
    Ok(items
        .iter()
        .find_map(|item| item.get("iamRole").and_then(Json::as_str))
        .map(str::to_owned))
}

#[async_trait]
impl Resource for CredentialsAws {
    type State<'a> = Value<CredentialsAwsState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Account ID the credentials are set on"),
                    "account_id" => required(string(), "Spotinst account ID"),
                    "iam_role" => required(string(), "ARN of the IAM role Spotinst assumes"),
                },
                description: Description::plain("AWS credentials of a Spotinst account"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            if let Some(account) = config.account_id.as_deref_option() {
                if let Err(err) = validate_account(account) {
                    diags.error("Invalid account", err.to_string(), AttributePath::new("account_id"));
                }
            }
            if let Some(role) = config.iam_role.as_deref_option() {
                if !role.starts_with("arn:aws:iam::") {
                    diags.error(
                        "Invalid IAM role",
                        format!("`{}` is not an IAM role ARN", role),
                        AttributePath::new("iam_role"),
                    );
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
        let account = state.id.as_deref_option().unwrap_or_default().to_owned();

        match linked_role(api.as_ref(), &account).await {
            Ok(Some(role)) => {
                state.account_id = Value::Value(Cow::Owned(account));
                state.iam_role = Value::Value(Cow::Owned(role));
                Some((Value::Value(state), private_state))
            }
            Ok(None) => {
                warn!(account = %account, "no AWS credentials linked anymore, removing them from state");
                Some((Value::Null, private_state))
            }
            Err(err) if err.is_not_found() => Some((Value::Null, private_state)),
            Err(err) => {
                diags.root_error("Failed to read AWS credentials", err.to_string());
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
            state.id = state.account_id.clone();
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
            force_new(&mut trigger_replace, "account_id", &prior.account_id, &proposed.account_id);
            force_new(&mut trigger_replace, "iam_role", &prior.iam_role, &proposed.iam_role);
        }
        Some((proposed_state, prior_private_state, trigger_replace))
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
            diags.root_error_short("Cannot create null AWS credentials");
            return None;
        };
        let api = self.client.api(diags)?;
        let account = state.account_id.as_deref_option().unwrap_or_default().to_owned();
        let role = state.iam_role.as_deref_option().unwrap_or_default().to_owned();

        let request = Request::post(PATH)
            .query("accountId", account.as_str())
            .body(json!({"credentials": {"iamRole": role}}));
        if let Err(err) = api.call(request).await {
            diags.root_error("Failed to set AWS credentials", err.to_string());
            return None;
        }
        info!(account = %account, "linked AWS credentials");

        state.id = Value::Value(Cow::Owned(account));
        Some((Value::Value(state), planned_private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        // Every attribute requires a replacement
        Some((planned_state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        if let Value::Value(state) = &state {
            info!(
                account = state.id.as_deref_option().unwrap_or_default(),
                "forgetting AWS credentials"
            );
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = CredentialsAwsState {
            id: Value::Value(Cow::Owned(id)),
            ..Default::default()
        };
        let (state, private_state) = self
            .read(diags, Value::Value(state), Default::default(), Default::default())
            .await?;
        if state.is_null() {
            diags.root_error_short("No AWS credentials are linked to this account");
            return None;
        }
        Some((state, private_state))
    }
}
