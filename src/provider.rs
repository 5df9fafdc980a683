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

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::data_source::DynamicDataSource;
use tf_provider::resource::DynamicResource;
use tf_provider::{
    map, AttributePath, Block, Description, Diagnostics, Provider, Schema, ValueEmpty,
    ValueString,
};
use tracing::info;

use crate::client::HttpClient;
use crate::commons::schema::{optional, sensitive, string};
use crate::commons::{ClientHandle, SpotinstResource};
use crate::config::{validate_account, FeatureFlags, Settings};
use crate::credentials::CredentialsAws;
use crate::elastigroup::{ElastigroupAws, ElastigroupAzureV3, ElastigroupGcp, ElastigroupSuspension};
use crate::health_check::HealthCheck;
use crate::managed_instance::ManagedInstanceAws;
use crate::mrscaler::MrScalerAws;
use crate::multai::{MultaiBalancer, MultaiTarget, MultaiTargetSet};
use crate::ocean::{OceanAws, OceanAwsLaunchSpec, OceanEcs};
use crate::stateful_node::StatefulNodeAzure;
use crate::subscription::Subscription;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub token: ValueString<'a>,
    pub account: ValueString<'a>,
    pub feature_flags: ValueString<'a>,
}

/// Spotinst provider
///
/// Resources share the client installed by `configure`.
#[derive(Debug, Default, Clone)]
pub struct SpotinstProvider {
    client: ClientHandle,
}

impl SpotinstProvider {
    /// Handle on the client shared by the resources of the provider
    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    /// Configure the provider, looking up missing settings with `settings`
    pub fn configure_with<F>(
        &self,
        diags: &mut Diagnostics,
        config: &ProviderConfig,
        settings: &Settings<F>,
    ) -> Option<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flags = match settings.feature_flags(config.feature_flags.as_deref_option()) {
            Ok(flags) => flags,
            Err(err) => {
                diags.error(
                    "Invalid feature flags",
                    format!("{:#}", err),
                    AttributePath::new("feature_flags"),
                );
                return None;
            }
        };

        let credentials = match settings.credentials(
            config.token.as_deref_option(),
            config.account.as_deref_option(),
        ) {
            Ok(credentials) => credentials,
            Err(err) => {
                diags.root_error("Missing Spotinst credentials", format!("{:#}", err));
                return None;
            }
        };

        let base_url = settings.base_url();
        let client = match HttpClient::new(
            &base_url,
            &credentials.token,
            credentials.account.as_deref(),
        ) {
            Ok(client) => client,
            Err(err) => {
                diags.root_error("Failed to build the Spotinst client", err.to_string());
                return None;
            }
        };
        info!(
            base_url = %base_url,
            account = credentials.account.as_deref().unwrap_or("<default>"),
            "configured spotinst client"
        );

        self.client.install(Arc::new(client), flags);
        Some(())
    }
}

#[async_trait]
impl Provider for SpotinstProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "token" => sensitive(optional(
                        string(),
                        "Spotinst personal API token, defaults to SPOTINST_TOKEN",
                    )),
                    "account" => optional(
                        string(),
                        "Spotinst account ID, defaults to SPOTINST_ACCOUNT",
                    ),
                    "feature_flags" => optional(
                        string(),
                        "Comma separated feature flags, e.g. `ImportFullState=false`",
                    ),
                },
                description: Description::plain("Spotinst"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        if let Some("") = config.token.as_deref_option() {
            diags.error_short("`token` cannot be empty", AttributePath::new("token"));
        }
        if let Some(account) = config.account.as_deref_option() {
            if let Err(err) = validate_account(account) {
                diags.error("Invalid account", err.to_string(), AttributePath::new("account"));
            }
        }
        if let Some(flags) = config.feature_flags.as_deref_option() {
            if let Err(err) = flags.parse::<FeatureFlags>() {
                diags.error(
                    "Invalid feature flags",
                    err.to_string(),
                    AttributePath::new("feature_flags"),
                );
            }
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        info!(terraform_version = %terraform_version, "configuring spotinst provider");
        self.configure_with(diags, &config, &Settings::from_env())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let client = &self.client;
        Some(map! {
            "elastigroup_aws" => SpotinstResource::new(ElastigroupAws, client.clone()),
            "elastigroup_gcp" => SpotinstResource::new(ElastigroupGcp, client.clone()),
            "elastigroup_azure_v3" => SpotinstResource::new(ElastigroupAzureV3, client.clone()),
            "elastigroup_suspension" => ElastigroupSuspension::new(client.clone()),
            "ocean_aws" => SpotinstResource::new(OceanAws, client.clone()),
            "ocean_aws_launch_spec" => SpotinstResource::new(OceanAwsLaunchSpec, client.clone()),
            "ocean_ecs" => SpotinstResource::new(OceanEcs, client.clone()),
            "managed_instance_aws" => SpotinstResource::new(ManagedInstanceAws, client.clone()),
            "stateful_node_azure" => SpotinstResource::new(StatefulNodeAzure, client.clone()),
            "mrscaler_aws" => SpotinstResource::new(MrScalerAws, client.clone()),
            "multai_balancer" => SpotinstResource::new(MultaiBalancer, client.clone()),
            "multai_target_set" => SpotinstResource::new(MultaiTargetSet, client.clone()),
            "multai_target" => SpotinstResource::new(MultaiTarget, client.clone()),
            "health_check" => SpotinstResource::new(HealthCheck, client.clone()),
            "subscription" => SpotinstResource::new(Subscription, client.clone()),
            "credentials_aws" => CredentialsAws::new(client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {})
    }
}
