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

//! Shorthands to declare field tables

use tf_provider::{Attribute, AttributeConstraint, AttributeType, Description};

pub fn string() -> AttributeType {
    AttributeType::String
}

pub fn number() -> AttributeType {
    AttributeType::Number
}

pub fn boolean() -> AttributeType {
    AttributeType::Bool
}

pub fn string_list() -> AttributeType {
    AttributeType::List(AttributeType::String.into())
}

pub fn string_set() -> AttributeType {
    AttributeType::Set(AttributeType::String.into())
}

pub fn string_map() -> AttributeType {
    AttributeType::Map(AttributeType::String.into())
}

fn attribute(attr_type: AttributeType, description: &str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub fn required(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::Required)
}

pub fn optional(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::Optional)
}

pub fn optional_computed(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::OptionalComputed)
}

pub fn computed(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::Computed)
}

/// The `id` attribute shared by every resource
pub fn id(description: &str) -> Attribute {
    computed(AttributeType::String, description)
}

/// Mark an attribute as sensitive
pub fn sensitive(attribute: Attribute) -> Attribute {
    Attribute {
        sensitive: true,
        ..attribute
    }
}
