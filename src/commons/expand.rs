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
use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value as Json};
use tf_provider::Value;

/// Operation an API document is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Update,
}

/// Conversion of a Terraform value into its API representation
pub trait ToJson {
    fn to_json(&self) -> Json;
}

impl ToJson for Cow<'_, str> {
    fn to_json(&self) -> Json {
        Json::String(self.to_string())
    }
}

impl ToJson for i64 {
    fn to_json(&self) -> Json {
        Json::from(*self)
    }
}

impl ToJson for bool {
    fn to_json(&self) -> Json {
        Json::Bool(*self)
    }
}

impl<T: ToJson> ToJson for Vec<Value<T>> {
    fn to_json(&self) -> Json {
        Json::Array(self.iter().flatten().map(ToJson::to_json).collect())
    }
}

impl<T: ToJson> ToJson for BTreeSet<Value<T>> {
    fn to_json(&self) -> Json {
        Json::Array(self.iter().flatten().map(ToJson::to_json).collect())
    }
}

impl<T: ToJson> ToJson for BTreeMap<Cow<'_, str>, Value<T>> {
    fn to_json(&self) -> Json {
        Json::Object(
            self.iter()
                .filter_map(|(k, v)| Some((k.to_string(), v.as_ref_option()?.to_json())))
                .collect(),
        )
    }
}

/// API document built from a Terraform state
///
/// Values are placed at a json pointer (`/compute/launchSpecification/imageId`),
/// intermediate objects are created on the fly.
///
/// Null values are skipped when creating, and sent as `null` when updating
/// in order to reset the remote value. Unknown values are never sent.
#[derive(Debug, Clone)]
pub struct Document {
    root: Json,
    op: Op,
}

impl Document {
    pub fn new(op: Op) -> Self {
        Self {
            root: Json::Object(Map::new()),
            op,
        }
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// Set the value at `pointer`
    pub fn set<T: ToJson>(&mut self, pointer: &str, value: &Value<T>) -> &mut Self {
        match value {
            Value::Value(value) => insert(&mut self.root, pointer, value.to_json()),
            Value::Null if self.op == Op::Update => insert(&mut self.root, pointer, Json::Null),
            _ => (),
        }
        self
    }

    /// Set the value at `pointer` only when creating the object
    pub fn set_on_create<T: ToJson>(&mut self, pointer: &str, value: &Value<T>) -> &mut Self {
        if self.op == Op::Create {
            self.set(pointer, value);
        }
        self
    }

    /// Set the converted value at `pointer`
    pub fn set_with<T, F>(&mut self, pointer: &str, value: &Value<T>, f: F) -> &mut Self
    where
        F: FnOnce(&T) -> Json,
    {
        match value {
            Value::Value(value) => insert(&mut self.root, pointer, f(value)),
            Value::Null if self.op == Op::Update => insert(&mut self.root, pointer, Json::Null),
            _ => (),
        }
        self
    }

    /// Set a nested block at `pointer`, built by `f`
    pub fn block<T, F>(&mut self, pointer: &str, value: &Value<T>, f: F) -> &mut Self
    where
        F: FnOnce(&mut Document, &T),
    {
        let op = self.op;
        self.set_with(pointer, value, |block| {
            let mut document = Document::new(op);
            f(&mut document, block);
            document.finish()
        })
    }

    /// Set a list of nested blocks at `pointer`, each item built by `f`
    ///
    /// Items are always built like new objects: the API replaces lists as a whole.
    pub fn blocks<T, F>(&mut self, pointer: &str, value: &Value<Vec<Value<T>>>, mut f: F) -> &mut Self
    where
        F: FnMut(&mut Document, &T),
    {
        self.set_with(pointer, value, |blocks| {
            Json::Array(
                blocks
                    .iter()
                    .flatten()
                    .map(|block| {
                        let mut document = Document::new(Op::Create);
                        f(&mut document, block);
                        document.finish()
                    })
                    .collect(),
            )
        })
    }

    /// Set a raw json value at `pointer`
    pub fn set_json(&mut self, pointer: &str, json: Json) -> &mut Self {
        insert(&mut self.root, pointer, json);
        self
    }

    pub fn finish(self) -> Json {
        self.root
    }
}

fn insert(root: &mut Json, pointer: &str, value: Json) {
    let mut keys = pointer.split('/').filter(|key| !key.is_empty()).peekable();
    let mut current = root;
    while let Some(key) = keys.next() {
        if !current.is_object() {
            *current = Json::Object(Map::new());
        }
        let Json::Object(map) = current else {
            return;
        };
        if keys.peek().is_none() {
            map.insert(key.to_owned(), value);
            return;
        }
        current = map
            .entry(key.to_owned())
            .or_insert_with(|| Json::Object(Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use serde_json::json;
    use tf_provider::{Value, ValueList, ValueNumber, ValueString};

    use super::{Document, Op};

    #[test]
    fn nested_pointers() {
        let name: ValueString = Value::Value(Cow::from("web"));
        let minimum: ValueNumber = Value::Value(1);
        let subnets: ValueList<ValueString> = Value::Value(vec![
            Value::Value(Cow::from("subnet-1")),
            Value::Null,
            Value::Value(Cow::from("subnet-2")),
        ]);
        let mut document = Document::new(Op::Create);
        document
            .set("/name", &name)
            .set("/capacity/minimum", &minimum)
            .set("/compute/subnetIds", &subnets);
        assert_eq!(
            document.finish(),
            json!({
                "name": "web",
                "capacity": {"minimum": 1},
                "compute": {"subnetIds": ["subnet-1", "subnet-2"]},
            })
        );
    }

    #[test]
    fn nulls_depend_on_operation() {
        let description: ValueString = Value::Null;
        let target: ValueNumber = Value::Unknown;

        let mut create = Document::new(Op::Create);
        create
            .set("/description", &description)
            .set("/capacity/target", &target);
        assert_eq!(create.finish(), json!({}));

        let mut update = Document::new(Op::Update);
        update
            .set("/description", &description)
            .set("/capacity/target", &target);
        assert_eq!(update.finish(), json!({"description": null}));
    }

    #[test]
    fn create_only_values() {
        let region: ValueString = Value::Value(Cow::from("us-west-2"));
        let mut update = Document::new(Op::Update);
        update.set_on_create("/region", &region);
        assert_eq!(update.finish(), json!({}));

        let mut create = Document::new(Op::Create);
        create.set_on_create("/region", &region);
        assert_eq!(create.finish(), json!({"region": "us-west-2"}));
    }

    #[test]
    fn nested_blocks() {
        #[derive(Default)]
        struct Rule<'a> {
            name: ValueString<'a>,
            port: ValueNumber,
        }
        let rules: ValueList<Value<Rule>> = Value::Value(vec![
            Value::Value(Rule {
                name: Value::Value(Cow::from("http")),
                port: Value::Value(80),
            }),
            Value::Value(Rule {
                name: Value::Value(Cow::from("https")),
                port: Value::Null,
            }),
        ]);
        let strategy: Value<Rule> = Value::Value(Rule {
            name: Value::Value(Cow::from("balanced")),
            port: Value::Null,
        });

        let mut update = Document::new(Op::Update);
        update
            .blocks("/rules", &rules, |document, rule| {
                document.set("/name", &rule.name).set("/port", &rule.port);
            })
            .block("/strategy", &strategy, |document, strategy| {
                document.set("/name", &strategy.name).set("/port", &strategy.port);
            });
        assert_eq!(
            update.finish(),
            json!({
                "rules": [{"name": "http", "port": 80}, {"name": "https"}],
                "strategy": {"name": "balanced", "port": null},
            })
        );
    }

    #[test]
    fn converted_values() {
        let zones: ValueList<ValueString> = Value::Value(vec![Value::Value(Cow::from("a"))]);
        let mut document = Document::new(Op::Create);
        document.set_with("/compute/availabilityZones", &zones, |zones| {
            json!(zones
                .iter()
                .flatten()
                .map(|zone| json!({ "name": zone }))
                .collect::<Vec<_>>())
        });
        assert_eq!(
            document.finish(),
            json!({"compute": {"availabilityZones": [{"name": "a"}]}})
        );
    }
}
