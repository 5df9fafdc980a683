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

use serde_json::Value as Json;
use tf_provider::Value;

/// How the remote object is merged into the Terraform state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// After create or update: only unknown values are filled
    Apply,
    /// During a refresh: attributes managed by the configuration follow the remote object
    Sync,
    /// During an import: every attribute follows the remote object
    Import,
}

/// Conversion of an API value into a Terraform value
pub trait FromJson: Sized {
    fn from_json(json: &Json) -> Option<Self>;
}

impl<'a> FromJson for Cow<'a, str> {
    fn from_json(json: &Json) -> Option<Self> {
        json.as_str().map(|s| Cow::Owned(s.to_owned()))
    }
}

impl FromJson for i64 {
    fn from_json(json: &Json) -> Option<Self> {
        // Integral floats like `3.0` are accepted, anything else has no exact i64
        const BOUND: f64 = 9_223_372_036_854_775_808.0;
        json.as_i64().or_else(|| {
            json.as_f64()
                .filter(|f| f.fract() == 0.0 && (-BOUND..BOUND).contains(f))
                .map(|f| f as i64)
        })
    }
}

impl FromJson for bool {
    fn from_json(json: &Json) -> Option<Self> {
        json.as_bool()
    }
}

impl<T: FromJson> FromJson for Value<T> {
    fn from_json(json: &Json) -> Option<Self> {
        Some(T::from_json(json).map_or(Value::Null, Value::Value))
    }
}

impl<T: FromJson> FromJson for Vec<Value<T>> {
    fn from_json(json: &Json) -> Option<Self> {
        json.as_array()
            .map(|items| items.iter().filter_map(Value::<T>::from_json).collect())
    }
}

impl<T: FromJson + Ord> FromJson for BTreeSet<Value<T>> {
    fn from_json(json: &Json) -> Option<Self> {
        json.as_array()
            .map(|items| items.iter().filter_map(Value::<T>::from_json).collect())
    }
}

impl<'a, T: FromJson> FromJson for BTreeMap<Cow<'a, str>, Value<T>> {
    fn from_json(json: &Json) -> Option<Self> {
        json.as_object().map(|items| {
            items
                .iter()
                .filter_map(|(k, v)| Some((Cow::Owned(k.clone()), Value::<T>::from_json(v)?)))
                .collect()
        })
    }
}

/// View over a remote object used to refresh a Terraform state
#[derive(Debug, Clone, Copy)]
pub struct Flatten<'j> {
    remote: &'j Json,
    refresh: Refresh,
}

impl<'j> Flatten<'j> {
    pub fn new(remote: &'j Json, refresh: Refresh) -> Self {
        Self { remote, refresh }
    }

    pub fn refresh(&self) -> Refresh {
        self.refresh
    }

    pub fn remote(&self) -> &'j Json {
        self.remote
    }

    /// Get the json at `pointer`, if present and not null
    pub fn at(&self, pointer: &str) -> Option<&'j Json> {
        self.remote.pointer(pointer).filter(|json| !json.is_null())
    }

    /// Get the value at `pointer`
    pub fn get<T: FromJson>(&self, pointer: &str) -> Value<T> {
        self.get_with(pointer, T::from_json)
    }

    /// Get the converted value at `pointer`
    pub fn get_with<T, F>(&self, pointer: &str, f: F) -> Value<T>
    where
        F: FnOnce(&'j Json) -> Option<T>,
    {
        self.at(pointer).and_then(f).map_or(Value::Null, Value::Value)
    }

    /// Refresh an optional attribute
    ///
    /// Attributes left null by the configuration stay null while syncing,
    /// so API-side defaults do not show up as changes.
    pub fn optional<T: FromJson>(&self, field: &mut Value<T>, pointer: &str) {
        self.optional_with(field, pointer, T::from_json)
    }

    /// Refresh an optional attribute with a custom conversion
    pub fn optional_with<T, F>(&self, field: &mut Value<T>, pointer: &str, f: F)
    where
        F: FnOnce(&'j Json) -> Option<T>,
    {
        let update = match self.refresh {
            Refresh::Apply => field.is_unknown(),
            Refresh::Sync => !field.is_null(),
            Refresh::Import => true,
        };
        if update {
            *field = self.get_with(pointer, f);
        }
    }

    /// Refresh a computed (or optional and computed) attribute
    pub fn computed<T: FromJson>(&self, field: &mut Value<T>, pointer: &str) {
        self.computed_with(field, pointer, T::from_json)
    }

    /// Refresh a computed attribute with a custom conversion
    pub fn computed_with<T, F>(&self, field: &mut Value<T>, pointer: &str, f: F)
    where
        F: FnOnce(&'j Json) -> Option<T>,
    {
        if self.refresh != Refresh::Apply || field.is_unknown() {
            *field = self.get_with(pointer, f);
        }
    }
}

impl<'j> Flatten<'j> {
    /// Refresh an optional nested block with `f`
    ///
    /// A block left null by the configuration stays null while syncing,
    /// a block missing from the remote object becomes null.
    pub fn block<T, F>(&self, field: &mut Value<T>, pointer: &str, f: F)
    where
        T: Default,
        F: FnOnce(&mut T, Flatten<'j>),
    {
        let Some(remote) = self.at(pointer) else {
            if self.refresh != Refresh::Apply || field.is_unknown() {
                *field = Value::Null;
            }
            return;
        };
        if self.refresh == Refresh::Import || field.is_unknown() {
            let mut block = T::default();
            f(&mut block, Flatten::new(remote, Refresh::Import));
            *field = Value::Value(block);
        } else if let Value::Value(block) = field {
            f(block, Flatten::new(remote, self.refresh));
        }
    }

    /// Refresh a list of nested blocks with `f`
    ///
    /// Items are matched by position, extra remote items are imported.
    pub fn blocks<T, F>(&self, field: &mut Value<Vec<Value<T>>>, pointer: &str, mut f: F)
    where
        T: Default,
        F: FnMut(&mut T, Flatten<'j>),
    {
        let update = match self.refresh {
            Refresh::Apply => field.is_unknown(),
            Refresh::Sync => !field.is_null(),
            Refresh::Import => true,
        };
        if !update {
            return;
        }
        let Some(remote) = self.at(pointer).and_then(Json::as_array) else {
            *field = Value::Null;
            return;
        };

        let mut prior = match std::mem::take(field) {
            Value::Value(blocks) => blocks.into_iter(),
            _ => Vec::new().into_iter(),
        };
        let blocks = remote
            .iter()
            .map(|remote| match prior.next() {
                Some(Value::Value(mut block)) if self.refresh == Refresh::Sync => {
                    f(&mut block, Flatten::new(remote, Refresh::Sync));
                    Value::Value(block)
                }
                _ => {
                    let mut block = T::default();
                    f(&mut block, Flatten::new(remote, Refresh::Import));
                    Value::Value(block)
                }
            })
            .collect();
        *field = Value::Value(blocks);
    }
}
