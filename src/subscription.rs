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

use std::borrow::Cow;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tf_provider::{map, AttributePath, Block, Description, Diagnostics, Schema, Value, ValueMap, ValueString};

use crate::commons::schema::{id, optional, required, string, string_map};
use crate::commons::{force_new, ApiObject, Document, Flatten, Op};
use crate::utils::with_id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub resource_id: ValueString<'a>,
    pub event_type: ValueString<'a>,
    pub protocol: ValueString<'a>,
    pub endpoint: ValueString<'a>,
    pub event_format: ValueMap<'a, ValueString<'a>>,
}
with_id!(SubscriptionState);

pub const PROTOCOLS: &[&str] = &["http", "https", "email", "email-json", "aws-sns", "web"];

/// Notification sent when an event happens on a resource
#[derive(Debug, Default, Clone, Copy)]
pub struct Subscription;

/// The event format is sent as a json object, values that parse as json are sent as such
fn event_format(format: &BTreeMap<Cow<str>, ValueString>) -> Json {
    Json::Object(
        format
            .iter()
            .filter_map(|(key, value)| {
                let value = value.as_deref_option()?;
                let value = serde_json::from_str::<Json>(value)
                    .ok()
                    .filter(|json| json.is_object() || json.is_array())
                    .unwrap_or_else(|| Json::String(value.to_owned()));
                Some((key.to_string(), value))
            })
            .collect(),
    )
}

fn from_event_format<'a>(json: &Json) -> Option<BTreeMap<Cow<'a, str>, ValueString<'a>>> {
    Some(
        json.as_object()?
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Json::String(value) => value.clone(),
                    value => value.to_string(),
                };
                (Cow::Owned(key.clone()), Value::Value(Cow::Owned(value)))
            })
            .collect(),
    )
}

/// Compare a configured value with the value returned by the API, ignoring json formatting
fn same_value(configured: &str, remote: &Json) -> bool {
    match remote {
        Json::String(remote) => remote == configured,
        remote => serde_json::from_str::<Json>(configured).map_or(false, |json| &json == remote),
    }
}

#[async_trait]
impl ApiObject for Subscription {
    type State<'a> = SubscriptionState<'a>;

    const NAME: &'static str = "subscription";
    const PATH: &'static str = "/events/subscription";
    const KEY: &'static str = "subscription";

    fn schema(&self) -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => id("Subscription ID"),
                    "resource_id" => required(string(), "ID of the watched resource"),
                    "event_type" => required(string(), "Type of event to notify, e.g. AWS_EC2_INSTANCE_TERMINATE"),
                    "protocol" => required(string(), "Protocol of the notification"),
                    "endpoint" => required(string(), "Where the notification is sent"),
                    "event_format" => optional(string_map(), "Format of the notification payload"),
                },
                description: Description::plain("Spotinst event subscription"),
                ..Default::default()
            },
        }
    }

    fn validate<'a>(&self, diags: &mut Diagnostics, config: &SubscriptionState<'a>) {
        if let Some(protocol) = config.protocol.as_deref_option() {
            if !PROTOCOLS.contains(&protocol) {
                diags.error(
                    "Invalid protocol",
                    format!("`{}` is not one of {}", protocol, PROTOCOLS.join(", ")),
                    AttributePath::new("protocol"),
                );
            }
        }
        if let Some(event_type) = config.event_type.as_deref_option() {
            if event_type.is_empty() {
                diags.error_short("`event_type` cannot be empty", AttributePath::new("event_type"));
            }
        }
    }

    fn expand<'a>(&self, state: &SubscriptionState<'a>, op: Op) -> Json {
        let mut document = Document::new(op);
        document
            .set("/resourceId", &state.resource_id)
            .set_with("/eventType", &state.event_type, |event_type| {
                Json::String(event_type.to_uppercase())
            })
            .set("/protocol", &state.protocol)
            .set("/endpoint", &state.endpoint)
            .set_with("/eventFormat", &state.event_format, event_format);
        document.finish()
    }

    fn flatten<'a>(&self, state: &mut SubscriptionState<'a>, remote: Flatten<'_>) {
        remote.optional(&mut state.resource_id, "/resourceId");
        // Keep the case of the configuration
        let configured = state.event_type.as_deref_option().map(str::to_owned);
        remote.optional_with(&mut state.event_type, "/eventType", |json| {
            let remote = json.as_str()?;
            Some(match configured {
                Some(configured) if configured.eq_ignore_ascii_case(remote) => Cow::Owned(configured),
                _ => Cow::Owned(remote.to_owned()),
            })
        });
        remote.optional(&mut state.protocol, "/protocol");
        remote.optional(&mut state.endpoint, "/endpoint");
        let configured = state.event_format.as_ref_option().cloned();
        remote.optional_with(&mut state.event_format, "/eventFormat", |json| {
            let mut format = from_event_format(json)?;
            for (key, value) in format.iter_mut() {
                let prior = configured.as_ref().and_then(|c| c.get(key));
                if let (Some(Value::Value(prior)), Some(remote)) = (prior, json.get(&**key)) {
                    if same_value(prior, remote) {
                        *value = Value::Value(prior.clone());
                    }
                }
            }
            Some(format)
        });
    }

    fn replace_triggers<'a>(
        &self,
        prior: &SubscriptionState<'a>,
        proposed: &SubscriptionState<'a>,
    ) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        force_new(&mut triggers, "resource_id", &prior.resource_id, &proposed.resource_id);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::collections::BTreeMap;

    use serde_json::json;
    use tf_provider::{Diagnostics, Value};

    use super::{Subscription, SubscriptionState};
    use crate::commons::{ApiObject, Flatten, Op, Refresh};

    fn state<'a>() -> SubscriptionState<'a> {
        let mut format = BTreeMap::new();
        format.insert(Cow::from("event"), Value::Value(Cow::from("%event%")));
        format.insert(
            Cow::from("resource"),
            Value::Value(Cow::from(r#"{"id": "%resource-id%"}"#)),
        );
        SubscriptionState {
            resource_id: Value::Value(Cow::from("sig-1")),
            event_type: Value::Value(Cow::from("aws_ec2_instance_launch")),
            protocol: Value::Value(Cow::from("web")),
            endpoint: Value::Value(Cow::from("https://example.com/hook")),
            event_format: Value::Value(format),
            ..Default::default()
        }
    }

    #[test]
    fn expand() {
        assert_eq!(
            Subscription.expand(&state(), Op::Create),
            json!({
                "resourceId": "sig-1",
                "eventType": "AWS_EC2_INSTANCE_LAUNCH",
                "protocol": "web",
                "endpoint": "https://example.com/hook",
                "eventFormat": {"event": "%event%", "resource": {"id": "%resource-id%"}},
            })
        );
    }

    #[test]
    fn refresh_keeps_event_type_case() {
        let mut state = state();
        let remote = Subscription.expand(&state, Op::Create);
        Subscription.flatten(&mut state, Flatten::new(&remote, Refresh::Sync));
        assert_eq!(state.event_type, Value::Value(Cow::from("aws_ec2_instance_launch")));
        assert_eq!(state.protocol, Value::Value(Cow::from("web")));
        assert_eq!(state.event_format, self::state().event_format);
    }

    #[test]
    fn validate_protocol() {
        let mut config = state();
        config.protocol = Value::Value(Cow::from("sms"));
        let mut diags = Diagnostics::default();
        Subscription.validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }
}
