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
    ValueNumber, ValueString,
};

use crate::commons::schema::{id, number, optional, required, string};
use crate::commons::{force_new, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub resource_id: ValueString<'a>,
    pub proxy_address: ValueString<'a>,
    pub proxy_port: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub check: Value<Check<'a>>,
}
with_id!(HealthCheckState);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check<'a> {
    #[serde(borrow = "'a")]
    pub protocol: ValueString<'a>,
    pub endpoint: ValueString<'a>,
    pub port: ValueNumber,
    pub interval: ValueNumber,
    pub timeout: ValueNumber,
    pub healthy: ValueNumber,
    pub unhealthy: ValueNumber,
}

const PROTOCOLS: &[&str] = &["http", "https", "tcp"];

/// Health check of the instances of an elastigroup
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthCheck;

#[async_trait]
impl ApiObject for HealthCheck {
    type State<'a> = HealthCheckState<'a>;

    const NAME: &'static str = "health check";
    const PATH: &'static str = "/healthCheck";
    const KEY: &'static str = "healthCheck";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Health check ID"),
                    "name" => optional(string(), "Name of the health check"),
                    "resource_id" => required(string(), "ID of the checked resource"),
                    "proxy_address" => optional(string(), "Address of the proxy running the checks"),
                    "proxy_port" => optional(number(), "Port of the proxy running the checks"),
                },
                blocks: map! {
                    "check" => NestedBlock::Optional(Block {
                        attributes: map! {
                            "protocol" => required(string(), "Protocol of the check: http, https or tcp"),
                            "endpoint" => optional(string(), "Endpoint to check"),
                            "port" => required(number(), "Port to check"),
                            "interval" => required(number(), "Seconds between two checks"),
                            "timeout" => required(number(), "Seconds before a check fails"),
                            "healthy" => optional(number(), "Successful checks before a resource is healthy"),
                            "unhealthy" => optional(number(), "Failed checks before a resource is unhealthy"),
                        },
                        description: Description::plain("Check to run"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Spotinst health check"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &HealthCheckState<'a>) {
        let Value::Value(check) = &config.check else {
            if config.check.is_null() {
                diags.error_short("`check` block is required", AttributePath::new("check"));
            }
            return;
        };
        if let Some(protocol) = check.protocol.as_deref_option() {
            if !PROTOCOLS.contains(&protocol) {
                diags.error(
                    "Invalid protocol",
                    format!("`{}` is not one of {}", protocol, PROTOCOLS.join(", ")),
                    AttributePath::new("check").index(0).attribute("protocol"),
                );
            }
        }
        if let (Value::Value(interval), Value::Value(timeout)) = (check.interval, check.timeout) {
            if timeout > interval {
                diags.error_short(
                    "`timeout` must not be greater than `interval`",
                    AttributePath::new("check").index(0).attribute("timeout"),
                );
            }
        }
    }

    fn expand<'a>(&self, state: &HealthCheckState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/name", &state.name)
            .set_on_create("/resourceId", &state.resource_id)
            .set("/proxyAddress", &state.proxy_address)
            .set("/proxyPort", &state.proxy_port)
            .block("/check", &state.check, |document, check| {
                document
                    .set("/protocol", &check.protocol)
                    .set("/endpoint", &check.endpoint)
                    .set("/port", &check.port)
                    .set("/interval", &check.interval)
                    .set("/timeout", &check.timeout)
                    .set("/healthy", &check.healthy)
                    .set("/unhealthy", &check.unhealthy);
            });
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut HealthCheckState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.name, "/name");
        remote.optional(&mut state.resource_id, "/resourceId");
        remote.optional(&mut state.proxy_address, "/proxyAddress");
        remote.optional(&mut state.proxy_port, "/proxyPort");
        remote.block(&mut state.check, "/check", |check, remote| {
            remote.optional(&mut check.protocol, "/protocol");
            remote.optional(&mut check.endpoint, "/endpoint");
            remote.optional(&mut check.port, "/port");
            remote.optional(&mut check.interval, "/interval");
            remote.optional(&mut check.timeout, "/timeout");
            remote.optional(&mut check.healthy, "/healthy");
            remote.optional(&mut check.unhealthy, "/unhealthy");
        });
    }

    fn replace_triggers<'a>(
        &self,
        prior: &HealthCheckState<'a>,
        proposed: &HealthCheckState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "resource_id", &prior.resource_id, &proposed.resource_id);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::{Diagnostics, Value};

    use super::{Check, HealthCheck, HealthCheckState};
    use crate::commons::{ApiObject, Op};

    fn state<'a>() -> HealthCheckState<'a> {
        HealthCheckState {
            resource_id: Value::Value(Cow::from("sig-1")),
            check: Value::Value(Check {
                protocol: Value::Value(Cow::from("http")),
                endpoint: Value::Value(Cow::from("http://10.0.0.1/health")),
                port: Value::Value(80),
                interval: Value::Value(10),
                timeout: Value::Value(5),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn expand() {
        let state = state();
        assert_eq!(
            HealthCheck.expand(&state, Op::Create),
            json!({
                "resourceId": "sig-1",
                "check": {
                    "protocol": "http",
                    "endpoint": "http://10.0.0.1/health",
                    "port": 80,
                    "interval": 10,
                    "timeout": 5,
                },
            })
        );
        let update = HealthCheck.expand(&state, Op::Update);
        assert!(update.get("resourceId").is_none());
        assert_eq!(update["name"], json!(null));
    }

    #[test]
    fn validate() {
        let mut diags = Diagnostics::default();
        HealthCheck.validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let mut config = state();
        if let Value::Value(check) = &mut config.check {
            check.protocol = Value::Value(Cow::from("udp"));
            check.timeout = Value::Value(30);
        }
        HealthCheck.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);

        let mut diags = Diagnostics::default();
        HealthCheck.validate(&mut diags, &HealthCheckState::default());
        assert_eq!(diags.errors.len(), 1);
    }
}
