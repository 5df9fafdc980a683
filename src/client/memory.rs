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

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value as Json};

use super::{ApiError, Request, SpotinstApi};

/// Collections emulated by [`MemoryApi`] with the prefix of their ids
const COLLECTIONS: &[(&str, &str)] = &[
    ("/aws/ec2/group", "sig"),
    ("/gcp/gce/group", "sig"),
    ("/azure/compute/group", "sig"),
    ("/ocean/aws/k8s/cluster", "o"),
    ("/ocean/aws/k8s/launchSpec", "ols"),
    ("/ocean/aws/ecs/cluster", "o"),
    ("/aws/ec2/managedInstance", "smi"),
    ("/azure/compute/statefulNode", "ssn"),
    ("/aws/emr/mrScaler", "simrs"),
    ("/loadBalancer/balancer", "lb"),
    ("/loadBalancer/targetSet", "ts"),
    ("/loadBalancer/target", "t"),
    ("/healthCheck", "hc"),
    ("/events/subscription", "sis"),
];

const TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

/// In-memory emulation of the Spotinst API
///
/// Collections behave like the real ones: objects get an id on creation,
/// updates are merged into the stored object (a `null` removes the key),
/// and missing objects answer with a `*_DOESNT_EXIST` error.
///
/// Any other endpoint (sub-resources like `/aws/ec2/group/{id}/suspension`, or
/// account settings like `/setup/credentials/aws`) stores the items posted to it,
/// returns them on `GET`, and forgets them on `DELETE`.
/// A `DELETE` with a `processes` list only forgets the items with those names.
///
/// Every request is recorded and can be inspected with [`MemoryApi::requests`].
#[derive(Debug, Default)]
pub struct MemoryApi {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<&'static str, BTreeMap<String, Json>>,
    endpoints: BTreeMap<String, Vec<Json>>,
    requests: Vec<Request>,
    next_id: u64,
}

enum Route<'p> {
    Collection(&'static str, &'static str),
    Object(&'static str, &'p str),
    SubResource(&'static str, &'p str),
    Endpoint,
}

fn route(path: &str) -> Route<'_> {
    for &(collection, prefix) in COLLECTIONS {
        let Some(rest) = path.strip_prefix(collection) else {
            continue;
        };
        if rest.is_empty() {
            return Route::Collection(collection, prefix);
        }
        let Some(rest) = rest.strip_prefix('/') else {
            continue;
        };
        return match rest.split_once('/') {
            None => Route::Object(collection, rest),
            Some((id, _)) => Route::SubResource(collection, id),
        };
    }
    Route::Endpoint
}

fn not_found(collection: &str, id: &str) -> ApiError {
    ApiError::Api {
        status: 400,
        code: "RESOURCE_DOESNT_EXIST".to_owned(),
        message: format!("{} `{}` does not exist", collection, id),
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::Api {
        status: 400,
        code: "VALIDATION_ERROR".to_owned(),
        message: message.to_owned(),
    }
}

/// Extract the object wrapped under a single key: `{"group": {...}}`
fn unwrap_body(body: Option<&Json>) -> Result<Map<String, Json>, ApiError> {
    match body {
        Some(Json::Object(wrapper)) if wrapper.len() == 1 => {
            match wrapper.values().next() {
                Some(Json::Object(object)) => Ok(object.clone()),
                _ => Err(bad_request("body must wrap an object")),
            }
        }
        _ => Err(bad_request("body must wrap a single object")),
    }
}

/// Merge `patch` into `target`, `null` values remove keys
fn merge(target: &mut Map<String, Json>, patch: Map<String, Json>) {
    for (key, value) in patch {
        match value {
            Json::Null => {
                target.remove(&key);
            }
            Json::Object(patch) => match target.get_mut(&key) {
                Some(Json::Object(existing)) => merge(existing, patch),
                _ => {
                    let mut object = Map::new();
                    merge(&mut object, patch);
                    target.insert(key, Json::Object(object));
                }
            },
            value => {
                target.insert(key, value);
            }
        }
    }
}

impl MemoryState {
    fn create(
        &mut self,
        collection: &'static str,
        prefix: &str,
        mut object: Map<String, Json>,
    ) -> Json {
        self.next_id += 1;
        let id = format!("{}-{:08x}", prefix, self.next_id);
        object.insert("id".to_owned(), Json::String(id.clone()));
        object.insert("createdAt".to_owned(), TIMESTAMP.into());
        object.insert("updatedAt".to_owned(), TIMESTAMP.into());
        let object = Json::Object(object);
        self.objects
            .entry(collection)
            .or_default()
            .insert(id, object.clone());
        object
    }

    fn object_mut(&mut self, collection: &'static str, id: &str) -> Result<&mut Json, ApiError> {
        self.objects
            .get_mut(collection)
            .and_then(|objects| objects.get_mut(id))
            .ok_or_else(|| not_found(collection, id))
    }

    fn handle(&mut self, request: &Request) -> Result<Vec<Json>, ApiError> {
        let body = request.body.as_ref();
        match (route(&request.path), &request.method) {
            (Route::Collection(collection, prefix), &Method::POST) => {
                let object = unwrap_body(body)?;
                Ok(vec![self.create(collection, prefix, object)])
            }
            (Route::Collection(collection, _), &Method::GET) => Ok(self
                .objects
                .get(collection)
                .map(|objects| objects.values().cloned().collect())
                .unwrap_or_default()),
            (Route::Object(collection, id), &Method::GET) => {
                Ok(vec![self.object_mut(collection, id)?.clone()])
            }
            (Route::Object(collection, id), &Method::PUT) => {
                let patch = unwrap_body(body)?;
                let object = self.object_mut(collection, id)?;
                if let Json::Object(fields) = &mut *object {
                    merge(fields, patch);
                    fields.insert("updatedAt".to_owned(), TIMESTAMP.into());
                }
                Ok(vec![object.clone()])
            }
            (Route::Object(collection, id), &Method::DELETE) => {
                self.objects
                    .get_mut(collection)
                    .and_then(|objects| objects.remove(id))
                    .ok_or_else(|| not_found(collection, id))?;
                let prefix = format!("{}/{}/", collection, id);
                self.endpoints.retain(|path, _| !path.starts_with(&prefix));
                Ok(Vec::new())
            }
            (Route::SubResource(collection, id), method) => {
                self.object_mut(collection, id)?;
                self.handle_endpoint(&request.path, method, body)
            }
            (Route::Endpoint, method) => self.handle_endpoint(&request.path, method, body),
            (_, method) => Err(bad_request(&format!(
                "method {} is not allowed on {}",
                method, request.path
            ))),
        }
    }

    fn handle_endpoint(
        &mut self,
        path: &str,
        method: &Method,
        body: Option<&Json>,
    ) -> Result<Vec<Json>, ApiError> {
        match *method {
            Method::GET => Ok(self.endpoints.get(path).cloned().unwrap_or_default()),
            Method::POST => {
                let items = self.endpoints.entry(path.to_owned()).or_default();
                match body {
                    Some(Json::Object(wrapper)) if wrapper.len() == 1 => {
                        match wrapper.values().next() {
                            Some(Json::Array(values)) => items.extend(values.iter().cloned()),
                            Some(value) => *items = vec![value.clone()],
                            None => (),
                        }
                    }
                    Some(body) => *items = vec![body.clone()],
                    None => (),
                }
                Ok(items.clone())
            }
            Method::DELETE => {
                let processes = body
                    .and_then(|body| body.get("processes"))
                    .and_then(Json::as_array);
                match processes {
                    Some(processes) => {
                        if let Some(items) = self.endpoints.get_mut(path) {
                            items.retain(|item| {
                                !processes.iter().any(|name| Some(name) == item.get("name"))
                            });
                        }
                    }
                    None => {
                        self.endpoints.remove(path);
                    }
                }
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }
}

impl MemoryApi {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All the requests received so far
    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    /// Insert an object directly into a collection, and return its id
    pub fn insert_object(&self, collection: &str, object: Json) -> Option<String> {
        let (collection, prefix) = COLLECTIONS
            .iter()
            .find(|(name, _)| *name == collection)
            .copied()?;
        let Json::Object(object) = object else {
            return None;
        };
        let created = self.lock().create(collection, prefix, object);
        created["id"].as_str().map(str::to_owned)
    }

    /// Get an object from a collection
    pub fn object(&self, collection: &str, id: &str) -> Option<Json> {
        self.lock()
            .objects
            .get(collection)
            .and_then(|objects| objects.get(id))
            .cloned()
    }

    /// Merge a patch into a stored object, emulating an out-of-band change
    pub fn patch_object(&self, collection: &str, id: &str, patch: Json) -> bool {
        let mut state = self.lock();
        let object = state
            .objects
            .get_mut(collection)
            .and_then(|objects| objects.get_mut(id));
        match (object, patch) {
            (Some(Json::Object(object)), Json::Object(patch)) => {
                merge(object, patch);
                true
            }
            _ => false,
        }
    }

    /// Remove an object from a collection, emulating an out-of-band deletion
    pub fn remove_object(&self, collection: &str, id: &str) -> Option<Json> {
        self.lock()
            .objects
            .get_mut(collection)
            .and_then(|objects| objects.remove(id))
    }

    /// Set the items returned by an endpoint
    pub fn seed(&self, path: &str, items: Vec<Json>) {
        self.lock().endpoints.insert(path.to_owned(), items);
    }
}

#[async_trait]
impl SpotinstApi for MemoryApi {
    async fn call(&self, request: Request) -> Result<Vec<Json>, ApiError> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        state.handle(&request)
    }
}
