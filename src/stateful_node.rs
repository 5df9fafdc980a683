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

//! Azure virtual machine kept on spot capacity, with its disks and network persisted

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tf_provider::{
    map, value, AttributePath, Block, Description, Diagnostics, NestedBlock, Schema, Value,
    ValueList, ValueMap, ValueNumber, ValueString,
};
use tf_provider::value::ValueBool;

use crate::client::DeleteOptions;
use crate::commons::azure::{
    expand_image, expand_login, expand_network, flatten_image, flatten_login, flatten_network,
    image_schema, login_schema, network_schema, Image, Login, Network,
};
use crate::commons::fields::{from_key_values, from_user_data, key_values, user_data};
use crate::commons::schema::{
    boolean, id, number, optional, required, string, string_list, string_map,
};
use crate::commons::{force_new, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

const PERSISTENCE_MODES: &[&str] = &["reattach", "onLaunch"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatefulNodeAzureState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub region: ValueString<'a>,
    pub resource_group_name: ValueString<'a>,
    pub os: ValueString<'a>,
    pub od_sizes: ValueList<ValueString<'a>>,
    pub spot_sizes: ValueList<ValueString<'a>>,
    pub preferred_spot_sizes: ValueList<ValueString<'a>>,
    pub zones: ValueList<ValueString<'a>>,
    pub fallback_to_on_demand: ValueBool,
    pub draining_timeout: ValueNumber,
    pub should_persist_os_disk: ValueBool,
    pub os_disk_persistence_mode: ValueString<'a>,
    pub should_persist_data_disks: ValueBool,
    pub data_disks_persistence_mode: ValueString<'a>,
    pub should_persist_network: ValueBool,
    pub custom_data: ValueString<'a>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub image: Value<Image<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub login: Value<Login<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub network: Value<Network<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub delete: Value<StatefulNodeDelete>,
}
with_id!(StatefulNodeAzureState);

/// Resources released with the virtual machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatefulNodeDelete {
    pub should_terminate_vm: ValueBool,
    pub network_should_deallocate: ValueBool,
    pub disk_should_deallocate: ValueBool,
    pub snapshot_should_deallocate: ValueBool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StatefulNodeAzure;

#[async_trait]
impl ApiObject for StatefulNodeAzure {
    type State<'a> = StatefulNodeAzureState<'a>;

    const NAME: &'static str = "stateful node";
    const PATH: &'static str = "/azure/compute/statefulNode";
    const KEY: &'static str = "statefulNode";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Stateful node ID"),
                    "name" => required(string(), "Name of the stateful node"),
                    "region" => required(string(), "Azure region of the virtual machine"),
                    "resource_group_name" => required(string(), "Resource group of the virtual machine"),
                    "os" => required(string(), "Operating system: Linux or Windows"),
                    "od_sizes" => required(string_list(), "On-demand virtual machine sizes"),
                    "spot_sizes" => required(string_list(), "Spot virtual machine sizes"),
                    "preferred_spot_sizes" => optional(string_list(), "Spot sizes launched first"),
                    "zones" => optional(string_list(), "Availability zones of the virtual machine"),
                    "fallback_to_on_demand" => optional(boolean(), "Launch an on-demand virtual machine when no spot is available"),
                    "draining_timeout" => optional(number(), "Seconds to drain the virtual machine before termination"),
                    "should_persist_os_disk" => optional(boolean(), "Keep the OS disk across replacements"),
                    "os_disk_persistence_mode" => optional(string(), "How the OS disk is kept: reattach or onLaunch"),
                    "should_persist_data_disks" => optional(boolean(), "Keep the data disks across replacements"),
                    "data_disks_persistence_mode" => optional(string(), "How the data disks are kept: reattach or onLaunch"),
                    "should_persist_network" => optional(boolean(), "Keep the network interfaces across replacements"),
                    "custom_data" => optional(string(), "Custom data of the virtual machine"),
                    "tags" => optional(string_map(), "Tags of the virtual machine"),
                },
                blocks: map! {
                    "image" => image_schema(),
                    "login" => login_schema(),
                    "network" => network_schema(),
                    "delete" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "should_terminate_vm" => optional(boolean(), "Terminate the virtual machine"),
                            "network_should_deallocate" => optional(boolean(), "Release the network interfaces"),
                            "disk_should_deallocate" => optional(boolean(), "Release the disks"),
                            "snapshot_should_deallocate" => optional(boolean(), "Release the snapshots"),
                        },
                        description: Description::plain("Resources released with the virtual machine"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Spotinst stateful node on Azure"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &StatefulNodeAzureState<'a>) {
        for (name, mode) in [
            ("os_disk_persistence_mode", &config.os_disk_persistence_mode),
            ("data_disks_persistence_mode", &config.data_disks_persistence_mode),
        ] {
            if let Some(mode) = mode.as_deref_option() {
                if !PERSISTENCE_MODES.contains(&mode) {
                    diags.error(
                        "Invalid persistence mode",
                        format!("`{}` is not one of {}", mode, PERSISTENCE_MODES.join(", ")),
                        AttributePath::new(name),
                    );
                }
            }
        }
        if config.should_persist_os_disk == Value::Value(true) && config.os_disk_persistence_mode.is_null() {
            diags.error_short(
                "`os_disk_persistence_mode` is required when `should_persist_os_disk` is true",
                AttributePath::new("os_disk_persistence_mode"),
            );
        }
    }

    fn expand<'a>(&self, state: &StatefulNodeAzureState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set_on_create("/region", &state.region)
            .set_on_create("/resourceGroupName", &state.resource_group_name)
            .set_on_create("/compute/os", &state.os)
            .set("/compute/vmSizes/odSizes", &state.od_sizes)
            .set("/compute/vmSizes/spotSizes", &state.spot_sizes)
            .set("/compute/vmSizes/preferredSpotSizes", &state.preferred_spot_sizes)
            .set("/compute/zones", &state.zones)
            .set("/strategy/fallbackToOnDemand", &state.fallback_to_on_demand)
            .set("/strategy/drainingTimeout", &state.draining_timeout)
            .set("/persistence/shouldPersistOsDisk", &state.should_persist_os_disk)
            .set("/persistence/osDiskPersistenceMode", &state.os_disk_persistence_mode)
            .set("/persistence/shouldPersistDataDisks", &state.should_persist_data_disks)
            .set("/persistence/dataDisksPersistenceMode", &state.data_disks_persistence_mode)
            .set("/persistence/shouldPersistNetwork", &state.should_persist_network)
            .set_with("/compute/launchSpecification/customData", &state.custom_data, user_data)
            .set_with("/compute/launchSpecification/tags", &state.tags, |tags| {
                key_values(tags, "tagKey", "tagValue")
            })
            .block("/compute/launchSpecification/image", &state.image, expand_image)
            .block("/compute/launchSpecification/login", &state.login, expand_login)
            .block("/compute/launchSpecification/network", &state.network, expand_network);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut StatefulNodeAzureState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.region, "/region");
        remote.optional(&mut state.resource_group_name, "/resourceGroupName");
        remote.optional(&mut state.os, "/compute/os");
        remote.optional(&mut state.od_sizes, "/compute/vmSizes/odSizes");
        remote.optional(&mut state.spot_sizes, "/compute/vmSizes/spotSizes");
        remote.optional(&mut state.preferred_spot_sizes, "/compute/vmSizes/preferredSpotSizes");
        remote.optional(&mut state.zones, "/compute/zones");
        remote.optional(&mut state.fallback_to_on_demand, "/strategy/fallbackToOnDemand");
        remote.optional(&mut state.draining_timeout, "/strategy/drainingTimeout");
        remote.optional(&mut state.should_persist_os_disk, "/persistence/shouldPersistOsDisk");
        remote.optional(&mut state.os_disk_persistence_mode, "/persistence/osDiskPersistenceMode");
        remote.optional(
            &mut state.should_persist_data_disks,
            "/persistence/shouldPersistDataDisks",
        );
        remote.optional(
            &mut state.data_disks_persistence_mode,
            "/persistence/dataDisksPersistenceMode",
        );
        remote.optional(&mut state.should_persist_network, "/persistence/shouldPersistNetwork");
        remote.optional_with(
            &mut state.custom_data,
            "/compute/launchSpecification/customData",
            from_user_data,
        );
        remote.optional_with(&mut state.tags, "/compute/launchSpecification/tags", |json| {
            from_key_values(json, "tagKey", "tagValue")
        });
        remote.block(&mut state.image, "/compute/launchSpecification/image", flatten_image);
        remote.block(&mut state.login, "/compute/launchSpecification/login", flatten_login);
        remote.block(&mut state.network, "/compute/launchSpecification/network", flatten_network);
    }

    fn replace_triggers<'a>(
        &self,
        prior: &StatefulNodeAzureState<'a>,
        proposed: &StatefulNodeAzureState<'a>,
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

    fn delete_options<'a>(&self, state: &StatefulNodeAzureState<'a>) -> DeleteOptions {
        let Value::Value(delete) = &state.delete else {
            return DeleteOptions::default();
        };
        let mut document = Document::new(Op::Create);
        document
            .set("/deallocationConfig/shouldTerminateVm", &delete.should_terminate_vm)
            .set(
                "/deallocationConfig/networkDeallocationConfig/shouldDeallocate",
                &delete.network_should_deallocate,
            )
            .set(
                "/deallocationConfig/diskDeallocationConfig/shouldDeallocate",
                &delete.disk_should_deallocate,
            )
            .set(
                "/deallocationConfig/snapshotDeallocationConfig/shouldDeallocate",
                &delete.snapshot_should_deallocate,
            );
        let body = document.finish();
        DeleteOptions {
            query: Vec::new(),
            body: (body != Json::Object(Map::new())).then_some(body),
        }
    }
}
