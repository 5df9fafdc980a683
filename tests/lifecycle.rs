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

//! Full resource lifecycles against the in-memory API

use std::borrow::Cow;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use tf_provider::{AttributePath, Diagnostics, Resource, Value, ValueString};
use tf_provider::value::ValueBool;

use terraform_provider_spotinst::client::{MemoryApi, Request};
use terraform_provider_spotinst::commons::{ClientHandle, SpotinstResource};
use terraform_provider_spotinst::config::FeatureFlags;
use terraform_provider_spotinst::credentials::{CredentialsAws, CredentialsAwsState};
use terraform_provider_spotinst::elastigroup::{
    ElastigroupAws, ElastigroupAwsState, ElastigroupSuspension, ElastigroupSuspensionState,
    RollConfig, Suspension, UpdatePolicy,
};
use terraform_provider_spotinst::managed_instance::{
    ManagedInstanceAws, ManagedInstanceAwsState, ManagedInstanceDelete,
};
use terraform_provider_spotinst::multai::{MultaiBalancer, MultaiBalancerState};
use terraform_provider_spotinst::ocean::{
    LaunchSpecDeleteOptions, OceanAwsLaunchSpec, OceanAwsLaunchSpecState,
};
use terraform_provider_spotinst::stateful_node::{
    StatefulNodeAzure, StatefulNodeAzureState, StatefulNodeDelete,
};

const GROUPS: &str = "/aws/ec2/group";

fn setup() -> (Arc<MemoryApi>, ClientHandle) {
    let api = Arc::new(MemoryApi::default());
    let client = ClientHandle::with_api(api.clone(), FeatureFlags::default());
    (api, client)
}

fn acc_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("test-acc-{}", suffix.to_lowercase())
}

fn string(s: &'static str) -> ValueString<'static> {
    Value::Value(Cow::Borrowed(s))
}

fn group(name: String) -> ElastigroupAwsState<'static> {
    ElastigroupAwsState {
        name: Value::Value(Cow::Owned(name)),
        product: string("Linux/UNIX"),
        region: string("us-west-2"),
        max_size: Value::Value(4),
        min_size: Value::Value(1),
        desired_capacity: Value::Value(2),
        spot_percentage: Value::Value(100),
        instance_types_ondemand: string("m5.large"),
        instance_types_spot: Value::Value(vec![string("m5.large"), string("m5a.large")]),
        availability_zones: Value::Value(vec![string("us-west-2a"), string("us-west-2b")]),
        image_id: string("ami-12345"),
        security_groups: Value::Value(vec![string("sg-1")]),
        user_data: string("#!/bin/sh\necho hello\n"),
        ..Default::default()
    }
}

/// Plan and create `config`, return the new state
async fn create<R>(resource: &R, diags: &mut Diagnostics, config: R::State<'static>) -> R::State<'static>
where
    R: Resource,
    R::State<'static>: Clone,
    R::PrivateState<'static>: Default,
    R::ProviderMetaState<'static>: Default,
{
    let (planned, private) = resource
        .plan_create(diags, config.clone(), config.clone(), Default::default())
        .await
        .expect("plan_create failed");
    let (state, _) = resource
        .create(diags, planned, config, private, Default::default())
        .await
        .expect("create failed");
    state
}

fn inner<T: Clone>(state: &Value<T>) -> T {
    match state {
        Value::Value(state) => state.clone(),
        _ => panic!("state is not a value"),
    }
}

fn changed<F>(state: &Value<ElastigroupAwsState<'static>>, change: F) -> Value<ElastigroupAwsState<'static>>
where
    F: FnOnce(&mut ElastigroupAwsState<'static>),
{
    let mut proposed = inner(state);
    change(&mut proposed);
    Value::Value(proposed)
}

fn group_id(state: &Value<ElastigroupAwsState>) -> String {
    inner(state).id.as_deref_option().expect("no id").to_owned()
}

#[tokio::test]
async fn elastigroup_lifecycle() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();
    let config = Value::Value(group(acc_name()));

    assert!(resource.validate(&mut diags, config.clone()).await.is_some());

    let (planned, _) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), Default::default())
        .await
        .unwrap();
    let plan = inner(&planned);
    assert!(plan.id.is_unknown());
    assert!(plan.capacity_unit.is_unknown());
    assert_eq!(plan.max_size, Value::Value(4));

    let state = create(&resource, &mut diags, config.clone()).await;
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    let id = group_id(&state);
    assert!(id.starts_with("sig-"));
    assert_eq!(inner(&state).capacity_unit, Value::Null);

    let remote = api.object(GROUPS, &id).unwrap();
    assert_eq!(remote["region"], json!("us-west-2"));
    assert_eq!(remote["compute"]["product"], json!("Linux/UNIX"));
    assert_eq!(
        remote["compute"]["launchSpecification"]["userData"],
        json!("IyEvYmluL3NoCmVjaG8gaGVsbG8K")
    );

    // Refreshing right after the creation finds no drift
    let (read, _) = resource
        .read(&mut diags, state.clone(), Default::default(), Default::default())
        .await
        .unwrap();
    assert_eq!(read, state);

    let mut proposed = inner(&read);
    proposed.max_size = Value::Value(6);
    proposed.description = string("resized");
    let proposed = Value::Value(proposed);
    let (planned, private, triggers) = resource
        .plan_update(
            &mut diags,
            read.clone(),
            proposed.clone(),
            proposed.clone(),
            Default::default(),
            Default::default(),
        )
        .await
        .unwrap();
    assert!(triggers.is_empty());
    assert_eq!(group_id(&planned), id);

    let (updated, _) = resource
        .update(&mut diags, read, planned, proposed, private, Default::default())
        .await
        .unwrap();
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert_eq!(inner(&updated).max_size, Value::Value(6));
    let remote = api.object(GROUPS, &id).unwrap();
    assert_eq!(remote["capacity"]["maximum"], json!(6));
    assert_eq!(remote["description"], json!("resized"));
    assert_eq!(remote["region"], json!("us-west-2"));

    assert!(resource
        .destroy(&mut diags, updated.clone(), Default::default())
        .await
        .is_some());
    assert!(api.object(GROUPS, &id).is_none());

    let (gone, _) = resource
        .read(&mut diags, updated, Default::default(), Default::default())
        .await
        .unwrap();
    assert!(gone.is_null());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn deleted_outside_terraform() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();

    let state = create(&resource, &mut diags, Value::Value(group(acc_name()))).await;
    api.remove_object(GROUPS, &group_id(&state)).unwrap();

    let (read, _) = resource
        .read(&mut diags, state.clone(), Default::default(), Default::default())
        .await
        .unwrap();
    assert!(read.is_null());

    // Destroying an object that is already gone succeeds
    assert!(resource
        .destroy(&mut diags, state, Default::default())
        .await
        .is_some());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn changed_outside_terraform() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();

    let state = create(&resource, &mut diags, Value::Value(group(acc_name()))).await;
    let id = group_id(&state);
    assert!(api.patch_object(
        GROUPS,
        &id,
        json!({
            "description": "edited in the console",
            "capacity": {"maximum": 9},
            "strategy": {"risk": 50},
        }),
    ));

    let (read, _) = resource
        .read(&mut diags, state, Default::default(), Default::default())
        .await
        .unwrap();
    let read = inner(&read);
    assert_eq!(read.max_size, Value::Value(9));
    assert_eq!(read.spot_percentage, Value::Value(50));
    assert_eq!(read.description, Value::Null);
}

#[tokio::test]
async fn import_elastigroup() {
    let (api, client) = setup();
    let name = acc_name();
    let id = api
        .insert_object(
            GROUPS,
            json!({
                "name": name,
                "region": "eu-west-1",
                "capacity": {"minimum": 0, "maximum": 3, "target": 1, "unit": "instance"},
                "compute": {
                    "product": "Linux/UNIX",
                    "instanceTypes": {"ondemand": "t3.micro", "spot": ["t3.micro"]},
                    "subnetIds": ["subnet-1"],
                },
            }),
        )
        .unwrap();

    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();
    let (state, _) = resource.import(&mut diags, id.clone()).await.unwrap();
    let state = inner(&state);
    assert_eq!(state.id.as_deref_option(), Some(id.as_str()));
    assert_eq!(state.name.as_deref_option(), Some(name.as_str()));
    assert_eq!(state.region, string("eu-west-1"));
    assert_eq!(state.subnet_ids, Value::Value(vec![string("subnet-1")]));
    assert_eq!(state.desired_capacity, Value::Value(1));

    // Without full imports, only the computed attributes are filled
    let flags = FeatureFlags {
        import_full_state: false,
    };
    let resource = SpotinstResource::new(ElastigroupAws, ClientHandle::with_api(api, flags));
    let (state, _) = resource.import(&mut diags, id).await.unwrap();
    let state = inner(&state);
    assert_eq!(state.name, Value::Null);
    assert_eq!(state.desired_capacity, Value::Value(1));
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);

    assert!(resource
        .import(&mut diags, "sig-missing".to_owned())
        .await
        .is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn region_change_forces_replacement() {
    let (_, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();

    let state = create(&resource, &mut diags, Value::Value(group(acc_name()))).await;
    let mut proposed = inner(&state);
    proposed.region = string("eu-central-1");
    let proposed = Value::Value(proposed);

    let (_, _, triggers) = resource
        .plan_update(
            &mut diags,
            state,
            proposed.clone(),
            proposed,
            Default::default(),
            Default::default(),
        )
        .await
        .unwrap();
    assert_eq!(triggers, vec![AttributePath::new("region")]);
}

#[tokio::test]
async fn invalid_configuration() {
    let (_, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();

    let mut config = group(acc_name());
    config.min_size = Value::Value(5);
    config.on_demand_count = Value::Value(1);
    assert!(resource
        .validate(&mut diags, Value::Value(config))
        .await
        .is_none());
    assert_eq!(diags.errors.len(), 3);
}

#[tokio::test]
async fn unconfigured_provider() {
    let resource = SpotinstResource::new(ElastigroupAws, ClientHandle::default());
    let mut diags = Diagnostics::default();
    let config = Value::Value(group(acc_name()));
    let (planned, private) = resource
        .plan_create(&mut diags, config.clone(), config.clone(), Default::default())
        .await
        .unwrap();
    assert!(resource
        .create(&mut diags, planned, config, private, Default::default())
        .await
        .is_none());
    assert_eq!(diags.errors[0].summary, "Provider is not configured");
}

#[tokio::test(start_paused = true)]
async fn wait_for_capacity() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();

    // Ids are allocated sequentially by the in-memory API
    api.seed(
        "/aws/ec2/group/sig-00000001/instanceHealthiness",
        vec![
            json!({"instanceId": "i-1", "healthStatus": "HEALTHY"}),
            json!({"instanceId": "i-2", "healthStatus": "HEALTHY"}),
            json!({"instanceId": "i-3", "healthStatus": "UNHEALTHY"}),
        ],
    );

    let mut config = group(acc_name());
    config.wait_for_capacity = Value::Value(2);
    let state = create(&resource, &mut diags, Value::Value(config)).await;
    assert_eq!(group_id(&state), "sig-00000001");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);

    let mut config = group(acc_name());
    config.wait_for_capacity = Value::Value(3);
    config.wait_for_capacity_timeout = Value::Value(60);
    api.seed(
        "/aws/ec2/group/sig-00000002/instanceHealthiness",
        vec![json!({"instanceId": "i-4", "healthStatus": "HEALTHY"})],
    );
    let state = create(&resource, &mut diags, Value::Value(config)).await;

    // The group exists: it is kept in the state along with the error
    assert_eq!(group_id(&state), "sig-00000002");
    assert_eq!(diags.errors.len(), 1);
    assert_eq!(diags.errors[0].summary, "Timeout while waiting for capacity");
    let polls = api
        .requests()
        .iter()
        .filter(|request| request.path == "/aws/ec2/group/sig-00000002/instanceHealthiness")
        .count();
    assert_eq!(polls, 7);
}

fn roll_policy(should_roll: bool) -> Value<UpdatePolicy<'static>> {
    Value::Value(UpdatePolicy {
        should_roll: Value::Value(should_roll),
        roll_config: Value::Value(RollConfig {
            batch_size_percentage: Value::Value(33),
            grace_period: Value::Null,
            health_check_type: string("EC2"),
        }),
    })
}

async fn apply_update(
    resource: &SpotinstResource<ElastigroupAws>,
    diags: &mut Diagnostics,
    state: Value<ElastigroupAwsState<'static>>,
    proposed: Value<ElastigroupAwsState<'static>>,
) -> Value<ElastigroupAwsState<'static>> {
    let (state, _) = resource
        .update(
            diags,
            state,
            proposed.clone(),
            proposed,
            Default::default(),
            Default::default(),
        )
        .await
        .unwrap();
    state
}

#[tokio::test]
async fn roll_after_updates() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();
    let rolls = || {
        api.requests()
            .iter()
            .filter(|request| request.path.ends_with("/roll"))
            .cloned()
            .collect::<Vec<_>>()
    };

    let mut config = group(acc_name());
    config.update_policy = roll_policy(false);
    let state = create(&resource, &mut diags, Value::Value(config)).await;
    let id = group_id(&state);

    let proposed = changed(&state, |group| group.image_id = string("ami-67890"));
    let state = apply_update(&resource, &mut diags, state, proposed).await;
    assert!(rolls().is_empty());

    // Capacity changes roll the group as well
    let proposed = changed(&state, |group| {
        group.max_size = Value::Value(6);
        group.update_policy = roll_policy(true);
    });
    apply_update(&resource, &mut diags, state, proposed).await;
    assert_eq!(
        rolls(),
        vec![Request::put(format!("{}/{}/roll", GROUPS, id))
            .body(json!({"batchSizePercentage": 33, "healthCheckType": "EC2"}))]
    );
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn capacity_unit_change_forces_replacement() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();

    let mut config = group(acc_name());
    config.capacity_unit = string("instance");
    let state = create(&resource, &mut diags, Value::Value(config)).await;
    let id = group_id(&state);
    assert_eq!(api.object(GROUPS, &id).unwrap()["capacity"]["unit"], json!("instance"));

    let proposed = changed(&state, |group| group.capacity_unit = string("weight"));
    let (_, _, triggers) = resource
        .plan_update(
            &mut diags,
            state,
            proposed.clone(),
            proposed,
            Default::default(),
            Default::default(),
        )
        .await
        .unwrap();
    assert_eq!(triggers, vec![AttributePath::new("capacity_unit")]);
}

#[tokio::test(start_paused = true)]
async fn unbounded_capacity_timeout() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ElastigroupAws, client);
    let mut diags = Diagnostics::default();

    api.seed(
        "/aws/ec2/group/sig-00000001/instanceHealthiness",
        vec![json!({"instanceId": "i-1", "healthStatus": "HEALTHY"})],
    );
    let mut config = group(acc_name());
    config.wait_for_capacity = Value::Value(1);
    config.wait_for_capacity_timeout = Value::Value(i64::MAX);
    let config = Value::Value(config);
    assert!(resource.validate(&mut diags, config.clone()).await.is_some());

    let state = create(&resource, &mut diags, config).await;
    assert_eq!(group_id(&state), "sig-00000001");
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn suspension_lifecycle() {
    let (api, client) = setup();
    let group_id = api
        .insert_object(GROUPS, json!({"name": acc_name()}))
        .unwrap();
    let resource = ElastigroupSuspension::new(client);
    let mut diags = Diagnostics::default();

    let suspensions = |names: &[&'static str]| {
        Value::Value(
            names
                .iter()
                .map(|&name| Value::Value(Suspension { name: string(name) }))
                .collect::<Vec<_>>(),
        )
    };
    let config = Value::Value(ElastigroupSuspensionState {
        group_id: Value::Value(Cow::Owned(group_id.clone())),
        suspension: suspensions(&["AUTO_HEALING", "OUT_OF_STRATEGY"]),
        ..Default::default()
    });
    assert!(resource.validate(&mut diags, config.clone()).await.is_some());

    let state = create(&resource, &mut diags, config).await;
    assert_eq!(inner(&state).id.as_deref_option(), Some(group_id.as_str()));

    let (read, _) = resource
        .read(&mut diags, state.clone(), Default::default(), Default::default())
        .await
        .unwrap();
    assert_eq!(read, state);

    let mut proposed = inner(&read);
    proposed.suspension = suspensions(&["OUT_OF_STRATEGY", "SCHEDULING"]);
    let proposed = Value::Value(proposed);
    let (updated, _) = resource
        .update(
            &mut diags,
            read,
            proposed.clone(),
            proposed,
            Default::default(),
            Default::default(),
        )
        .await
        .unwrap();

    let (read, _) = resource
        .read(&mut diags, updated.clone(), Default::default(), Default::default())
        .await
        .unwrap();
    assert_eq!(
        inner(&read).suspension,
        suspensions(&["OUT_OF_STRATEGY", "SCHEDULING"])
    );

    assert!(resource
        .destroy(&mut diags, updated.clone(), Default::default())
        .await
        .is_some());
    let (gone, _) = resource
        .read(&mut diags, updated, Default::default(), Default::default())
        .await
        .unwrap();
    assert!(gone.is_null());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);

    let invalid = Value::Value(ElastigroupSuspensionState {
        group_id: Value::Value(Cow::Owned(group_id)),
        suspension: suspensions(&["HIBERNATE"]),
        ..Default::default()
    });
    assert!(resource.validate(&mut diags, invalid).await.is_none());
}

#[tokio::test]
async fn credentials_lifecycle() {
    let (_, client) = setup();
    let resource = CredentialsAws::new(client);
    let mut diags = Diagnostics::default();

    let config = Value::Value(CredentialsAwsState {
        account_id: string("act-12345678"),
        iam_role: string("arn:aws:iam::123456789012:role/spotinst"),
        ..Default::default()
    });
    assert!(resource.validate(&mut diags, config.clone()).await.is_some());

    let state = create(&resource, &mut diags, config).await;
    assert_eq!(inner(&state).id, string("act-12345678"));

    let (read, _) = resource
        .read(&mut diags, state.clone(), Default::default(), Default::default())
        .await
        .unwrap();
    assert_eq!(read, state);

    let (imported, _) = resource
        .import(&mut diags, "act-12345678".to_owned())
        .await
        .unwrap();
    assert_eq!(imported, state);

    assert!(resource
        .destroy(&mut diags, state, Default::default())
        .await
        .is_some());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

#[tokio::test]
async fn multai_balancer_lifecycle() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(MultaiBalancer, client);
    let mut diags = Diagnostics::default();

    let config = Value::Value(MultaiBalancerState {
        name: Value::Value(Cow::Owned(acc_name())),
        scheme: string("internal"),
        ..Default::default()
    });
    let state = create(&resource, &mut diags, config).await;
    let id = inner(&state).id.as_deref_option().unwrap().to_owned();
    assert!(api.object("/loadBalancer/balancer", &id).is_some());

    assert!(resource
        .destroy(&mut diags, state, Default::default())
        .await
        .is_some());
    assert!(api.object("/loadBalancer/balancer", &id).is_none());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}

/// The last DELETE request received by `api`
fn last_deletion(api: &MemoryApi) -> Request {
    api.requests()
        .into_iter()
        .rev()
        .find(|request| request.method == reqwest::Method::DELETE)
        .expect("no DELETE request")
}

const TRUE: ValueBool = Value::Value(true);
const FALSE: ValueBool = Value::Value(false);

#[tokio::test]
async fn launch_spec_delete_options() {
    let (api, client) = setup();
    let ocean_id = api
        .insert_object("/ocean/aws/k8s/cluster", json!({"name": acc_name()}))
        .unwrap();
    let resource = SpotinstResource::new(OceanAwsLaunchSpec, client);
    let mut diags = Diagnostics::default();

    let config = Value::Value(OceanAwsLaunchSpecState {
        ocean_id: Value::Value(Cow::Owned(ocean_id)),
        name: Value::Value(Cow::Owned(acc_name())),
        image_id: string("ami-12345"),
        delete_options: Value::Value(LaunchSpecDeleteOptions {
            force_delete: TRUE,
            delete_nodes: FALSE,
        }),
        ..Default::default()
    });
    let state = create(&resource, &mut diags, config).await;
    let id = inner(&state).id.as_deref_option().unwrap().to_owned();

    assert!(resource
        .destroy(&mut diags, state, Default::default())
        .await
        .is_some());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert!(api.object("/ocean/aws/k8s/launchSpec", &id).is_none());
    assert_eq!(
        last_deletion(&api),
        Request::delete(format!("/ocean/aws/k8s/launchSpec/{}", id))
            .query("forceDelete", "true")
            .query("deleteNodes", "false")
    );
}

#[tokio::test]
async fn managed_instance_deallocation() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(ManagedInstanceAws, client);
    let mut diags = Diagnostics::default();

    let config = Value::Value(ManagedInstanceAwsState {
        name: Value::Value(Cow::Owned(acc_name())),
        region: string("us-west-2"),
        product: string("Linux/UNIX"),
        instance_types: Value::Value(vec![string("t3.micro")]),
        image_id: string("ami-12345"),
        delete: Value::Value(ManagedInstanceDelete {
            ami_backup_should_delete_images: TRUE,
            should_delete_images: TRUE,
            should_delete_network_interfaces: TRUE,
            should_delete_volumes: FALSE,
            should_delete_snapshots: Value::Null,
        }),
        ..Default::default()
    });
    let state = create(&resource, &mut diags, config).await;
    let id = inner(&state).id.as_deref_option().unwrap().to_owned();

    assert!(resource
        .destroy(&mut diags, state, Default::default())
        .await
        .is_some());
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
    assert!(api.object("/aws/ec2/managedInstance", &id).is_none());
    assert_eq!(
        last_deletion(&api),
        Request::delete(format!("/aws/ec2/managedInstance/{}", id)).body(json!({
            "deallocationConfig": {
                "shouldDeleteImages": true,
                "shouldDeleteNetworkInterfaces": true,
                "shouldDeleteVolumes": false,
            },
            "amiBackup": {"shouldDeleteImages": true},
        }))
    );
}

#[tokio::test]
async fn stateful_node_deallocation() {
    let (api, client) = setup();
    let resource = SpotinstResource::new(StatefulNodeAzure, client);
    let mut diags = Diagnostics::default();

    let config = Value::Value(StatefulNodeAzureState {
        name: Value::Value(Cow::Owned(acc_name())),
        region: string("eastus"),
        resource_group_name: string("test-acc-rg"),
        os: string("Linux"),
        od_sizes: Value::Value(vec![string("standard_d2s_v3")]),
        spot_sizes: Value::Value(vec![string("standard_d2s_v3")]),
        delete: Value::Value(StatefulNodeDelete {
            should_terminate_vm: TRUE,
            network_should_deallocate: TRUE,
            disk_should_deallocate: FALSE,
            snapshot_should_deallocate: TRUE,
        }),
        ..Default::default()
    });
    let state = create(&resource, &mut diags, config).await;
    let id = inner(&state).id.as_deref_option().unwrap().to_owned();

    // Without a delete block, the request carries no body
    let mut kept = inner(&state);
    kept.delete = Value::Null;

    assert!(resource
        .destroy(&mut diags, state, Default::default())
        .await
        .is_some());
    assert!(api.object("/azure/compute/statefulNode", &id).is_none());
    assert_eq!(
        last_deletion(&api),
        Request::delete(format!("/azure/compute/statefulNode/{}", id)).body(json!({
            "deallocationConfig": {
                "shouldTerminateVm": true,
                "networkDeallocationConfig": {"shouldDeallocate": true},
                "diskDeallocationConfig": {"shouldDeallocate": false},
                "snapshotDeallocationConfig": {"shouldDeallocate": true},
            },
        }))
    );

    let other = api
        .insert_object("/azure/compute/statefulNode", json!({"name": acc_name()}))
        .unwrap();
    kept.id = Value::Value(Cow::Owned(other.clone()));
    assert!(resource
        .destroy(&mut diags, Value::Value(kept), Default::default())
        .await
        .is_some());
    assert_eq!(
        last_deletion(&api),
        Request::delete(format!("/azure/compute/statefulNode/{}", other))
    );
    assert!(diags.errors.is_empty(), "{:?}", diags.errors);
}
