//! Instance lifecycle against the in-memory backend

mod common;

use common::{FakeDocumentDb, apply, registry, state_of};
use scwflow_cloud::{ErrorKind, Operation, ResourceData, ResourceDiff};
use scwflow_cloud_documentdb::instance;
use serde_json::json;

fn instance_config() -> serde_json::Value {
    json!({
        "name": "t1",
        "engine": "FerretDB-1",
        "node_type": "docdb-play2-pico",
        "user_name": "admin",
        "password": "s3cret-Passw0rd",
        "volume_size_in_gb": 20,
    })
}

#[tokio::test]
async fn test_instance_lifecycle() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut data = ResourceData::new(instance_config());
    apply(&registry, instance::KIND, Operation::Create, &mut data)
        .await
        .unwrap();

    let id = data.id().unwrap().to_string();
    let bare = id.strip_prefix("fr-par/").unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&bare).is_ok());
    assert_eq!(data.get_str("volume_type").as_deref(), Some("block"));
    assert_eq!(data.get::<u64>("volume_size_in_gb"), Some(20));
    assert_eq!(data.get_str("region").as_deref(), Some("fr-par"));
    assert_eq!(data.get::<bool>("telemetry_enabled"), Some(false));

    let mut state = ResourceData::from_state(&id, state_of(&data));
    apply(&registry, instance::KIND, Operation::Read, &mut state)
        .await
        .unwrap();
    assert_eq!(state.id(), Some(id.as_str()));
    assert_eq!(state.get_str("name").as_deref(), Some("t1"));
    let endpoints: Vec<serde_json::Value> = state.get("endpoints").unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0]["load_balancer"], json!(true));

    let mut planned = state_of(&state);
    planned["volume_size_in_gb"] = json!(25);
    let mut update = ResourceData::for_update(&id, state_of(&state), planned);
    apply(&registry, instance::KIND, Operation::Update, &mut update)
        .await
        .unwrap();
    assert_eq!(fake.count("upgrade_instance"), 1);
    assert_eq!(fake.details("upgrade_instance"), vec!["VolumeSizeGb(25)"]);
    assert_eq!(fake.count("update_instance"), 0);
    assert_eq!(update.get::<u64>("volume_size_in_gb"), Some(25));

    let mut delete = ResourceData::from_state(&id, state_of(&update));
    apply(&registry, instance::KIND, Operation::Delete, &mut delete)
        .await
        .unwrap();
    assert!(delete.id().is_none());
    assert!(fake.instance(&bare).is_none());
}

#[tokio::test]
async fn test_generated_name_and_telemetry() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut config = instance_config();
    config["name"] = json!("");
    config["telemetry_enabled"] = json!(true);
    let mut data = ResourceData::new(config);
    apply(&registry, instance::KIND, Operation::Create, &mut data)
        .await
        .unwrap();

    let name = data.get_str("name").unwrap();
    assert!(name.starts_with("docdb-"), "unexpected name {}", name);
    assert_eq!(data.get::<bool>("telemetry_enabled"), Some(true));

    let bare = data.id().unwrap().trim_start_matches("fr-par/").to_string();
    let instance = fake.instance(&bare).unwrap();
    assert_eq!(instance.init_setting("telemetry_reporting"), Some("true"));
}

#[tokio::test]
async fn test_local_volume_with_size_is_rejected_before_any_call() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut config = instance_config();
    config["volume_type"] = json!("local");
    let mut data = ResourceData::new(config);
    let err = apply(&registry, instance::KIND, Operation::Create, &mut data)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.attribute(), Some("volume_size_in_gb"));
    assert_eq!(fake.count("create_instance"), 0);
    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_plan_rejects_odd_volume_size() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut config = instance_config();
    config["volume_size_in_gb"] = json!(23);
    let diff = ResourceDiff::new(config.clone());
    let err = registry
        .plan(instance::KIND, &diff, &config, &common::test_config())
        .unwrap_err();
    assert_eq!(err.attribute(), Some("volume_size_in_gb"));
}

#[tokio::test]
async fn test_shrinking_volume_makes_no_call() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut data = ResourceData::new(instance_config());
    apply(&registry, instance::KIND, Operation::Create, &mut data)
        .await
        .unwrap();
    let id = data.id().unwrap().to_string();

    let mut planned = state_of(&data);
    planned["volume_size_in_gb"] = json!(15);
    let mut update = ResourceData::for_update(&id, state_of(&data), planned);
    let err = apply(&registry, instance::KIND, Operation::Update, &mut update)
        .await
        .unwrap_err();

    assert_eq!(err.attribute(), Some("volume_size_in_gb"));
    assert_eq!(fake.count("upgrade_instance"), 0);
}

#[tokio::test]
async fn test_node_type_and_ha_are_separate_upgrades() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut data = ResourceData::new(instance_config());
    apply(&registry, instance::KIND, Operation::Create, &mut data)
        .await
        .unwrap();
    let id = data.id().unwrap().to_string();

    let mut planned = state_of(&data);
    planned["node_type"] = json!("docdb-pro2-xxs");
    planned["is_ha_cluster"] = json!(true);
    planned["tags"] = json!(["prod"]);
    let mut update = ResourceData::for_update(&id, state_of(&data), planned);
    apply(&registry, instance::KIND, Operation::Update, &mut update)
        .await
        .unwrap();

    assert_eq!(fake.count("update_instance"), 1);
    assert_eq!(
        fake.details("upgrade_instance"),
        vec!["NodeType(\"docdb-pro2-xxs\")", "EnableHa(true)"]
    );
    assert_eq!(update.get::<bool>("is_ha_cluster"), Some(true));
    assert_eq!(update.get::<Vec<String>>("tags"), Some(vec!["prod".to_string()]));
}

#[tokio::test]
async fn test_node_type_case_change_is_not_an_upgrade() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut data = ResourceData::new(instance_config());
    apply(&registry, instance::KIND, Operation::Create, &mut data)
        .await
        .unwrap();
    let id = data.id().unwrap().to_string();

    let mut planned = state_of(&data);
    planned["node_type"] = json!("DOCDB-PLAY2-PICO");
    let mut update = ResourceData::for_update(&id, state_of(&data), planned);
    apply(&registry, instance::KIND, Operation::Update, &mut update)
        .await
        .unwrap();
    assert_eq!(fake.count("upgrade_instance"), 0);
}

#[tokio::test]
async fn test_read_of_deleted_instance_clears_id() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);
    let bare = fake.seed_instance("gone");
    fake.remove_instance(&bare);

    let mut data = ResourceData::from_state(common::regional(&bare), instance_config());
    apply(&registry, instance::KIND, Operation::Read, &mut data)
        .await
        .unwrap();
    assert!(data.id().is_none());
}

#[tokio::test]
async fn test_malformed_id_is_rejected() {
    let fake = FakeDocumentDb::new();
    let registry = registry(&fake);

    let mut data = ResourceData::from_state("fr-par/", instance_config());
    let err = apply(&registry, instance::KIND, Operation::Read, &mut data)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedId);
    assert_eq!(fake.count("get_instance"), 0);
}
