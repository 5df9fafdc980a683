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

//! Spotinst REST API client
//!
//! Every endpoint of the API is reached through [`SpotinstApi::call`].
//! The typed helpers of [`SpotinstApiExt`] implement the collection conventions
//! shared by all the Spotinst objects:
//!
//! - `POST   {collection}`       with `{"<key>": {...}}` creates an object
//! - `GET    {collection}/{id}`  reads an object
//! - `PUT    {collection}/{id}`  with `{"<key>": {...}}` updates an object
//! - `DELETE {collection}/{id}`  deletes an object

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value as Json};

mod error;
mod http;
mod memory;

pub use error::ApiError;
pub use http::{HttpClient, DEFAULT_BASE_URL};
pub use memory::MemoryApi;

/// Request sent to the Spotinst API
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Json>,
}

impl Request {
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }
    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new(Method::GET, path)
    }
    pub fn post<P: Into<String>>(path: P) -> Self {
        Self::new(Method::POST, path)
    }
    pub fn put<P: Into<String>>(path: P) -> Self {
        Self::new(Method::PUT, path)
    }
    pub fn delete<P: Into<String>>(path: P) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter
    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the json body
    pub fn body(mut self, body: Json) -> Self {
        self.body = Some(body);
        self
    }
}

/// Options attached to the deletion of an object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<Json>,
}

/// Transport to the Spotinst API
#[async_trait]
pub trait SpotinstApi: Debug + Send + Sync {
    /// Send a request and return the `items` of the response envelope
    async fn call(&self, request: Request) -> Result<Vec<Json>, ApiError>;
}

/// Collection helpers available on every [`SpotinstApi`]
#[async_trait]
pub trait SpotinstApiExt: SpotinstApi {
    /// Create an object in a collection and return the created object
    async fn create_object(&self, path: &str, key: &str, body: Json) -> Result<Json, ApiError> {
        let items = self
            .call(Request::post(path).body(wrap(key, body)))
            .await?;
        first_item(items, path)
    }

    /// Read an object from a collection
    async fn read_object(&self, path: &str, id: &str) -> Result<Json, ApiError> {
        let path = format!("{}/{}", path, id);
        let items = self.call(Request::get(path.as_str())).await?;
        first_item(items, &path)
    }

    /// Update an object of a collection and return the updated object
    async fn update_object(
        &self,
        path: &str,
        id: &str,
        key: &str,
        body: Json,
    ) -> Result<Json, ApiError> {
        let items = self
            .call(Request::put(format!("{}/{}", path, id)).body(wrap(key, body)))
            .await?;
        match items.into_iter().next() {
            Some(item) => Ok(item),
            // Some endpoints acknowledge updates without echoing the object
            None => self.read_object(path, id).await,
        }
    }

    /// Delete an object from a collection
    async fn delete_object(
        &self,
        path: &str,
        id: &str,
        options: DeleteOptions,
    ) -> Result<(), ApiError> {
        let mut request = Request::delete(format!("{}/{}", path, id));
        request.query = options.query;
        request.body = options.body;
        self.call(request).await?;
        Ok(())
    }

    /// List all the objects of a collection
    async fn list_objects(&self, path: &str) -> Result<Vec<Json>, ApiError> {
        self.call(Request::get(path)).await
    }
}

impl<T: SpotinstApi + ?Sized> SpotinstApiExt for T {}

fn wrap(key: &str, body: Json) -> Json {
    let mut map = Map::new();
    map.insert(key.to_owned(), body);
    Json::Object(map)
}

fn first_item(items: Vec<Json>, path: &str) -> Result<Json, ApiError> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::EmptyResponse(path.to_owned()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DeleteOptions, MemoryApi, Request, SpotinstApiExt};

    #[test]
    fn request_builder() {
        let request = Request::get("/healthCheck/hc-1")
            .query("accountId", "act-1")
            .body(json!({"a": 1}));
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(request.path, "/healthCheck/hc-1");
        assert_eq!(
            request.query,
            vec![("accountId".to_owned(), "act-1".to_owned())]
        );
        assert_eq!(request.body, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn collection_helpers() {
        let api = MemoryApi::default();

        let created = api
            .create_object("/healthCheck", "healthCheck", json!({"name": "hc"}))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_owned();

        let updated = api
            .update_object("/healthCheck", &id, "healthCheck", json!({"name": "hc2"}))
            .await
            .unwrap();
        assert_eq!(updated["name"], "hc2");

        let read = api.read_object("/healthCheck", &id).await.unwrap();
        assert_eq!(read, updated);
        assert_eq!(api.list_objects("/healthCheck").await.unwrap().len(), 1);

        api.delete_object("/healthCheck", &id, DeleteOptions::default())
            .await
            .unwrap();
        let err = api.read_object("/healthCheck", &id).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
