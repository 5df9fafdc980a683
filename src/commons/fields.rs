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

//! Conversions shared by several field tables

use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value as Json};
use tf_provider::{Value, ValueString};

/// `{"k": "v"}` to `[{"<key>": "k", "<value>": "v"}]`
pub fn key_values(map: &BTreeMap<Cow<str>, ValueString>, key: &str, value: &str) -> Json {
    Json::Array(
        map.iter()
            .filter_map(|(k, v)| {
                let v = v.as_deref_option()?;
                let mut item = Map::new();
                item.insert(key.to_owned(), Json::String(k.to_string()));
                item.insert(value.to_owned(), Json::String(v.to_owned()));
                Some(Json::Object(item))
            })
            .collect(),
    )
}

/// `[{"<key>": "k", "<value>": "v"}]` to `{"k": "v"}`
pub fn from_key_values<'a>(
    json: &Json,
    key: &str,
    value: &str,
) -> Option<BTreeMap<Cow<'a, str>, ValueString<'a>>> {
    let items = json.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| {
                let k = item.get(key)?.as_str()?;
                let v = item.get(value).and_then(Json::as_str).unwrap_or_default();
                Some((Cow::Owned(k.to_owned()), Value::Value(Cow::Owned(v.to_owned()))))
            })
            .collect(),
    )
}

/// AWS tags
pub fn tags(map: &BTreeMap<Cow<str>, ValueString>) -> Json {
    key_values(map, "tagKey", "tagValue")
}

pub fn from_tags<'a>(json: &Json) -> Option<BTreeMap<Cow<'a, str>, ValueString<'a>>> {
    from_key_values(json, "tagKey", "tagValue")
}

/// User data is sent base64 encoded
pub fn user_data(script: &Cow<str>) -> Json {
    Json::String(STANDARD.encode(script.as_bytes()))
}

/// Decode the user data, keeping it as is if it is not valid base64 text
pub fn from_user_data<'a>(json: &Json) -> Option<Cow<'a, str>> {
    let encoded = json.as_str()?;
    let decoded = STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| encoded.to_owned());
    Some(Cow::Owned(decoded))
}

/// Instance profile given either by ARN or by name
pub fn instance_profile(profile: &Cow<str>) -> Json {
    if profile.starts_with("arn:") {
        json!({ "arn": profile.to_string() })
    } else {
        json!({ "name": profile.to_string() })
    }
}

pub fn from_instance_profile<'a>(json: &Json) -> Option<Cow<'a, str>> {
    json.get("arn")
        .or_else(|| json.get("name"))
        .and_then(Json::as_str)
        .map(|profile| Cow::Owned(profile.to_owned()))
}

/// `["a", "b"]` to `[{"name": "a"}, {"name": "b"}]`
pub fn names(list: &[ValueString]) -> Json {
    Json::Array(
        list.iter()
            .flatten()
            .map(|name| json!({ "name": name.to_string() }))
            .collect(),
    )
}

pub fn from_names<'a>(json: &Json) -> Option<Vec<ValueString<'a>>> {
    Some(
        json.as_array()?
            .iter()
            .filter_map(|item| item.get("name")?.as_str())
            .map(|name| Value::Value(Cow::Owned(name.to_owned())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::collections::BTreeMap;

    use serde_json::json;
    use tf_provider::Value;

    use super::{
        from_instance_profile, from_names, from_tags, from_user_data, instance_profile, names,
        tags, user_data,
    };

    #[test]
    fn tags_convert_to_key_value_pairs() {
        let mut map = BTreeMap::new();
        map.insert(Cow::from("Name"), Value::Value(Cow::from("web")));
        map.insert(Cow::from("Env"), Value::Value(Cow::from("prod")));
        map.insert(Cow::from("Skipped"), Value::Null);

        let json = tags(&map);
        assert_eq!(
            json,
            json!([
                {"tagKey": "Env", "tagValue": "prod"},
                {"tagKey": "Name", "tagValue": "web"},
            ])
        );

        map.remove("Skipped");
        assert_eq!(from_tags(&json), Some(map));
    }

    #[test]
    fn user_data_is_base64() {
        let script = Cow::from("#!/bin/bash\necho hello\n");
        let encoded = user_data(&script);
        assert_eq!(encoded, json!("IyEvYmluL2Jhc2gKZWNobyBoZWxsbwo="));
        assert_eq!(from_user_data(&encoded), Some(script));
        assert_eq!(from_user_data(&json!("not base64!")), Some(Cow::from("not base64!")));
    }

    #[test]
    fn zone_names() {
        let zones = vec![Value::Value(Cow::from("us-west-2a")), Value::Null];
        let json = names(&zones);
        assert_eq!(json, json!([{"name": "us-west-2a"}]));
        assert_eq!(from_names(&json), Some(vec![Value::Value(Cow::from("us-west-2a"))]));
    }

    #[test]
    fn instance_profile_by_arn_or_name() {
        let arn = Cow::from("arn:aws:iam::123456789012:instance-profile/web");
        let json = instance_profile(&arn);
        assert_eq!(json, json!({"arn": "arn:aws:iam::123456789012:instance-profile/web"}));
        assert_eq!(from_instance_profile(&json), Some(arn));

        let json = instance_profile(&Cow::from("web"));
        assert_eq!(json, json!({"name": "web"}));
        assert_eq!(from_instance_profile(&json), Some(Cow::from("web")));
    }
}
