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

//! Launch specification blocks shared by the Azure objects

use serde::{Deserialize, Serialize};
use tf_provider::{map, Block, Description, NestedBlock, Value, ValueList, ValueString};
use tf_provider::value::ValueBool;

use super::schema::{boolean, optional, required, sensitive, string};
use super::{Document, Flatten};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image<'a> {
    #[serde(borrow = "'a")]
    pub publisher: ValueString<'a>,
    pub offer: ValueString<'a>,
    pub sku: ValueString<'a>,
    pub version: ValueString<'a>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login<'a> {
    #[serde(borrow = "'a")]
    pub user_name: ValueString<'a>,
    pub ssh_public_key: ValueString<'a>,
    pub password: ValueString<'a>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network<'a> {
    #[serde(borrow = "'a")]
    pub virtual_network_name: ValueString<'a>,
    pub resource_group_name: ValueString<'a>,
    pub network_interface: ValueList<Value<NetworkInterface<'a>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface<'a> {
    #[serde(borrow = "'a")]
    pub subnet_name: ValueString<'a>,
    pub is_primary: ValueBool,
    pub assign_public_ip: ValueBool,
}

pub fn image_schema() -> NestedBlock {
    NestedBlock::Optional(Block {
        attributes: map! {
            "publisher" => required(string(), "Marketplace image publisher"),
            "offer" => required(string(), "Marketplace image offer"),
            "sku" => required(string(), "Marketplace image SKU"),
            "version" => optional(string(), "Marketplace image version, latest if not set"),
        },
        description: Description::plain("Marketplace image of the virtual machines"),
        ..Default::default()
    })
}

pub fn login_schema() -> NestedBlock {
    NestedBlock::Optional(Block {
        attributes: map! {
            "user_name" => required(string(), "Administrator user name"),
            "ssh_public_key" => optional(string(), "SSH public key of the administrator"),
            "password" => sensitive(optional(string(), "Password of the administrator")),
        },
        description: Description::plain("Administrator login of the virtual machines"),
        ..Default::default()
    })
}

pub fn network_schema() -> NestedBlock {
    NestedBlock::Optional(Block {
        attributes: map! {
            "virtual_network_name" => required(string(), "Name of the virtual network"),
            "resource_group_name" => required(string(), "Resource group of the virtual network"),
        },
        blocks: map! {
            "network_interface" => NestedBlock::List(Block {
                attributes: map! {
                    "subnet_name" => required(string(), "Subnet of the interface"),
                    "is_primary" => required(boolean(), "Is the interface the primary one"),
                    "assign_public_ip" => optional(boolean(), "Assign a public IP to the interface"),
                },
                description: Description::plain("Network interfaces of the virtual machines"),
                ..Default::default()
            }),
        },
        description: Description::plain("Network of the virtual machines"),
        ..Default::default()
    })
}

pub fn expand_image(document: &mut Document, image: &Image) {
    document
        .set("/marketplace/publisher", &image.publisher)
        .set("/marketplace/offer", &image.offer)
        .set("/marketplace/sku", &image.sku)
        .set("/marketplace/version", &image.version);
}

pub fn flatten_image(image: &mut Image, remote: Flatten) {
    remote.optional(&mut image.publisher, "/marketplace/publisher");
    remote.optional(&mut image.offer, "/marketplace/offer");
    remote.optional(&mut image.sku, "/marketplace/sku");
    remote.optional(&mut image.version, "/marketplace/version");
}

pub fn expand_login(document: &mut Document, login: &Login) {
    document
        .set("/userName", &login.user_name)
        .set("/sshPublicKey", &login.ssh_public_key)
        .set("/password", &login.password);
}

/// The password is never returned by the API
pub fn flatten_login(login: &mut Login, remote: Flatten) {
    remote.optional(&mut login.user_name, "/userName");
    remote.optional(&mut login.ssh_public_key, "/sshPublicKey");
}

pub fn expand_network(document: &mut Document, network: &Network) {
    document
        .set("/virtualNetworkName", &network.virtual_network_name)
        .set("/resourceGroupName", &network.resource_group_name)
        .blocks(
            "/networkInterfaces",
            &network.network_interface,
            |document, interface| {
                document
                    .set("/subnetName", &interface.subnet_name)
                    .set("/isPrimary", &interface.is_primary)
                    .set("/assignPublicIp", &interface.assign_public_ip);
            },
        );
}

pub fn flatten_network(network: &mut Network, remote: Flatten) {
    remote.optional(&mut network.virtual_network_name, "/virtualNetworkName");
    remote.optional(&mut network.resource_group_name, "/resourceGroupName");
    remote.blocks(
        &mut network.network_interface,
        "/networkInterfaces",
        |interface, remote| {
            remote.optional(&mut interface.subnet_name, "/subnetName");
            remote.optional(&mut interface.is_primary, "/isPrimary");
            remote.optional(&mut interface.assign_public_ip, "/assignPublicIp");
        },
    );
}
