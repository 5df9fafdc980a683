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

use crate::commons::azure::{
    expand_image, expand_login, expand_network, flatten_image, flatten_login, flatten_network,
    image_schema, login_schema, network_schema, Image, Login, Network,
};
use crate::commons::fields::{from_key_values, from_user_data, key_values, user_data};
use crate::commons::schema::{
    boolean, id, number, optional, optional_computed, required, string, string_list, string_map,
};
use crate::commons::{force_new, unknown_if_null, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

use super::{validate_capacity, validate_spot_mix};

const OPERATING_SYSTEMS: &[&str] = &["Linux", "Windows"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElastigroupAzureV3State<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub region: ValueString<'a>,
    pub resource_group_name: ValueString<'a>,
    pub os: ValueString<'a>,
    pub max_size: ValueNumber,
    pub min_size: ValueNumber,
    pub desired_capacity: ValueNumber,
    pub spot_percentage: ValueNumber,
    pub on_demand_count: ValueNumber,
    pub fallback_to_ondemand: ValueBool,
    pub draining_timeout: ValueNumber,
    pub od_sizes: ValueList<ValueString<'a>>,
    pub spot_sizes: ValueList<ValueString<'a>>,
    pub custom_data: ValueString<'a>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub image: Value<Image<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub login: Value<Login<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub network: Value<Network<'a>>,
}
with_id!(ElastigroupAzureV3State);

/// Azure elastigroup, third version of the Azure API
#[derive(Debug, Default, Clone, Copy)]
pub struct ElastigroupAzureV3;

#[async_trait]
impl ApiObject for ElastigroupAzureV3 {
    type State<'a> = ElastigroupAzureV3State<'a>;

    const NAME: &'static str = "azure elastigroup";
    const PATH: &'static str = "/azure/compute/group";
    const KEY: &'static str = "group";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Elastigroup ID"),
                    "name" => required(string(), "Name of the group"),
                    "region" => required(string(), "Azure region of the group"),
                    "resource_group_name" => required(string(), "Resource group of the virtual machines"),
                    "os" => required(string(), "Operating system: Linux or Windows"),
                    "max_size" => optional_computed(number(), "Maximum number of virtual machines"),
                    "min_size" => optional_computed(number(), "Minimum number of virtual machines"),
                    "desired_capacity" => optional_computed(number(), "Number of virtual machines to launch"),
                    "spot_percentage" => optional(number(), "Percentage of spot virtual machines"),
                    "on_demand_count" => optional(number(), "Number of on-demand virtual machines"),
                    "fallback_to_ondemand" => optional(boolean(), "Launch on-demand virtual machines when no spot is available"),
                    "draining_timeout" => optional_computed(number(), "Seconds to drain a virtual machine before termination"),
                    "od_sizes" => required(string_list(), "On-demand virtual machine sizes"),
                    "spot_sizes" => required(string_list(), "Spot virtual machine sizes"),
                    "custom_data" => optional(string(), "Custom data of the virtual machines"),
                    "tags" => optional(string_map(), "Tags of the virtual machines"),
                },
                blocks: map! {
                    "image" => image_schema(),
                    "login" => login_schema(),
                    "network" => network_schema(),
                },
                description: Description::plain("Spotinst elastigroup on Azure"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &ElastigroupAzureV3State<'a>) {
        validate_capacity(diags, config.min_size, config.desired_capacity, config.max_size);
        validate_spot_mix(
            diags,
            "spot_percentage",
            config.spot_percentage,
            "on_demand_count",
            config.on_demand_count,
        );
        if let Some(os) = config.os.as_deref_option() {
            if !OPERATING_SYSTEMS.contains(&os) {
                diags.error(
                    "Invalid operating system",
                    format!("`{}` is not one of {}", os, OPERATING_SYSTEMS.join(", ")),
                    AttributePath::new("os"),
                );
            }
        }
        for (name, block) in [("image", config.image.is_null()), ("network", config.network.is_null())] {
            if block {
                diags.error_short(format!("`{}` block is required", name), AttributePath::new(name));
            }
        }
    }

    fn expand<'a>(&self, state: &ElastigroupAzureV3State<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set_on_create("/region", &state.region)
            .set_on_create("/resourceGroupName", &state.resource_group_name)
            .set_on_create("/compute/os", &state.os)
            .set("/capacity/maximum", &state.max_size)
            .set("/capacity/minimum", &state.min_size)
            .set("/capacity/target", &state.desired_capacity)
            .set("/strategy/spotPercentage", &state.spot_percentage)
            .set("/strategy/onDemandCount", &state.on_demand_count)
            .set("/strategy/fallbackToOd", &state.fallback_to_ondemand)
            .set("/strategy/drainingTimeout", &state.draining_timeout)
            .set("/compute/vmSizes/odSizes", &state.od_sizes)
            .set("/compute/vmSizes/spotSizes", &state.spot_sizes)
            .set_with("/compute/launchSpecification/customData", &state.custom_data, user_data)
            .set_with("/compute/launchSpecification/tags", &state.tags, |tags| {
                key_values(tags, "key", "value")
            })
            .block("/compute/launchSpecification/image", &state.image, expand_image)
            .block("/compute/launchSpecification/login", &state.login, expand_login)
            .block("/compute/launchSpecification/network", &state.network, expand_network);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut ElastigroupAzureV3State<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.region, "/region");
        remote.optional(&mut state.resource_group_name, "/resourceGroupName");
        remote.optional(&mut state.os, "/compute/os");
        remote.computed(&mut state.max_size, "/capacity/maximum");
        remote.computed(&mut state.min_size, "/capacity/minimum");
        remote.computed(&mut state.desired_capacity, "/capacity/target");
        remote.optional(&mut state.spot_percentage, "/strategy/spotPercentage");
        remote.optional(&mut state.on_demand_count, "/strategy/onDemandCount");
        remote.optional(&mut state.fallback_to_ondemand, "/strategy/fallbackToOd");
        remote.computed(&mut state.draining_timeout, "/strategy/drainingTimeout");
        remote.optional(&mut state.od_sizes, "/compute/vmSizes/odSizes");
        remote.optional(&mut state.spot_sizes, "/compute/vmSizes/spotSizes");
        remote.optional_with(
            &mut state.custom_data,
            "/compute/launchSpecification/customData",
            from_user_data,
        );
        remote.optional_with(&mut state.tags, "/compute/launchSpecification/tags", |json| {
            from_key_values(json, "key", "value")
        });
        remote.block(&mut state.image, "/compute/launchSpecification/image", flatten_image);
        remote.block(&mut state.login, "/compute/launchSpecification/login", flatten_login);
        remote.block(&mut state.network, "/compute/launchSpecification/network", flatten_network);
    }

    fn plan_create<'a>(&self, state: &mut ElastigroupAzureV3State<'a>) {
        unknown_if_null(&mut state.max_size);
        unknown_if_null(&mut state.min_size);
        unknown_if_null(&mut state.desired_capacity);
        unknown_if_null(&mut state.draining_timeout);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &ElastigroupAzureV3State<'a>,
        proposed: &ElastigroupAzureV3State<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "region", &prior.region, &proposed.region);
        force_new(
            &mut triggers,
            "resource_group_name",
            &prior.resource_group_name,
            &proposed.resource_group_name,
        );
        force_new(&mut triggers, "os", &prior.os, &proposed.os);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::{Diagnostics, Value};

    use super::{ElastigroupAzureV3, ElastigroupAzureV3State};
    use crate::commons::azure::{Image, Login, Network, NetworkInterface};
    use crate::commons::{ApiObject, Flatten, Op, Refresh};

    fn string<'a>(s: &'static str) -> Value<Cow<'a, str>> {
        Value::Value(Cow::from(s))
    }

    fn state<'a>() -> ElastigroupAzureV3State<'a> {
        ElastigroupAzureV3State {
            name: string("batch"),
            region: string("eastus"),
            resource_group_name: string("spot-rg"),
            os: string("Linux"),
            spot_percentage: Value::Value(100),
            od_sizes: Value::Value(vec![string("standard_a1_v2")]),
            spot_sizes: Value::Value(vec![string("standard_a1_v2"), string("standard_a2_v2")]),
            image: Value::Value(Image {
                publisher: string("Canonical"),
                offer: string("UbuntuServer"),
                sku: string("18.04-LTS"),
                version: string("latest"),
            }),
            login: Value::Value(Login {
                user_name: string("admin"),
                password: string("s3cret!"),
                ..Default::default()
            }),
            network: Value::Value(Network {
                virtual_network_name: string("vnet"),
                resource_group_name: string("spot-rg"),
                network_interface: Value::Value(vec![Value::Value(NetworkInterface {
                    subnet_name: string("default"),
                    is_primary: Value::Value(true),
                    assign_public_ip: Value::Value(false),
                })]),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn expand_launch_specification() {
        let body = ElastigroupAzureV3.expand(&state(), Op::Create);
        assert_eq!(body["resourceGroupName"], json!("spot-rg"));
        assert_eq!(body["compute"]["os"], json!("Linux"));
        assert_eq!(
            body["compute"]["launchSpecification"]["image"],
            json!({"marketplace": {
                "publisher": "Canonical",
                "offer": "UbuntuServer",
                "sku": "18.04-LTS",
                "version": "latest",
            }})
        );
        assert_eq!(
            body["compute"]["launchSpecification"]["network"]["networkInterfaces"],
            json!([{"subnetName": "default", "isPrimary": true, "assignPublicIp": false}])
        );

        let update = ElastigroupAzureV3.expand(&state(), Op::Update);
        assert!(update.get("region").is_none());
        assert!(update["compute"].get("os").is_none());
    }

    #[test]
    fn sync_keeps_password() {
        let mut state = state();
        let body = ElastigroupAzureV3.expand(&state, Op::Create);
        let mut remote = body.clone();
        if let Some(login) = remote["compute"]["launchSpecification"]["login"].as_object_mut() {
            login.remove("password");
        }
        ElastigroupAzureV3.flatten(&mut state, Flatten::new(&remote, Refresh::Sync));
        let Value::Value(login) = &state.login else {
            panic!("login was removed");
        };
        assert_eq!(login.password, string("s3cret!"));
    }

    #[test]
    fn validate_and_replace() {
        let mut diags = Diagnostics::default();
        ElastigroupAzureV3.validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let mut config = state();
        config.os = string("Plan9");
        config.image = Value::Null;
        ElastigroupAzureV3.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);

        let prior = state();
        let mut proposed = state();
        proposed.os = string("Windows");
        assert_eq!(ElastigroupAzureV3.replace_triggers(&prior, &proposed).len(), 1);
    }
}
