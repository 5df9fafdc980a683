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
    map, value, AttributePath, Block, Description, Diagnostics, NestedBlock, Schema, Value,
    ValueList, ValueMap, ValueNumber, ValueString,
};

use super::{from_tags, tags};
use crate::commons::schema::{id, number, optional, required, string, string_list, string_map};
use crate::commons::{ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultaiBalancerState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub scheme: ValueString<'a>,
    pub dns_cname_aliases: ValueList<ValueString<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub connection_timeouts: Value<Timeouts>,
    pub tags: ValueMap<'a, ValueString<'a>>,
}
with_id!(MultaiBalancerState);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub idle: ValueNumber,
    pub draining: ValueNumber,
}

const SCHEMES: &[&str] = &["internal", "internet-facing"];

#[derive(Debug, Default, Clone, Copy)]
pub struct MultaiBalancer;

#[async_trait]
impl ApiObject for MultaiBalancer {
    type State<'a> = MultaiBalancerState<'a>;

    const NAME: &'static str = "multai balancer";
    const PATH: &'static str = "/loadBalancer/balancer";
    const KEY: &'static str = "balancer";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Balancer ID"),
                    "name" => required(string(), "Name of the balancer"),
                    "scheme" => optional(string(), "internal or internet-facing"),
                    "dns_cname_aliases" => optional(string_list(), "DNS aliases of the balancer"),
                    "tags" => optional(string_map(), "Tags of the balancer"),
                },
                blocks: map! {
                    "connection_timeouts" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "idle" => optional(number(), "Idle timeout in seconds"),
                            "draining" => optional(number(), "Draining timeout in seconds"),
                        },
                        description: Description::plain("Connection timeouts"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Multai load balancer"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &MultaiBalancerState<'a>) {
        if let Some(scheme) = config.scheme.as_deref_option() {
            if !SCHEMES.contains(&scheme) {
                diags.error(
                    "Invalid scheme",
                    format!("`{}` is not one of {}", scheme, SCHEMES.join(", ")),
                    AttributePath::new("scheme"),
                );
            }
        }
    }

    fn expand<'a>(&self, state: &MultaiBalancerState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set("/scheme", &state.scheme)
            .set("/dnsCnameAliases", &state.dns_cname_aliases)
            .block("/timeouts", &state.connection_timeouts, |document, timeouts| {
                document
                    .set("/idle", &timeouts.idle)
                    .set("/draining", &timeouts.draining);
            })
            .set_with("/tags", &state.tags, tags);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut MultaiBalancerState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.scheme, "/scheme");
        remote.optional(&mut state.dns_cname_aliases, "/dnsCnameAliases");
        remote.block(&mut state.connection_timeouts, "/timeouts", |timeouts, remote| {
            remote.optional(&mut timeouts.idle, "/idle");
            remote.optional(&mut timeouts.draining, "/draining");
        });
        remote.optional_with(&mut state.tags, "/tags", from_tags);
    }
}
