mod common;

use catalog_client::{ClientError, InMemoryCatalog, MetricsSnapshot, RelationshipRef, Status};
use common::*;
use metadata_proxy::{resolve_owners, DefaultUserDetails, ProxyError};
use metadata_types::{Badge, ResourceType, Tag, TagDetail};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn owner_ids(table: &metadata_types::Table) -> Vec<String> {
    table
        .owners
        .iter()
        .filter_map(|u| u.user_id.clone())
        .collect()
}

// ── Owners ────────────────────────────────────────────────────

#[tokio::test]
async fn add_then_delete_owner() {
    let catalog = InMemoryCatalog::new();
    seed_orders_table(&catalog).await;
    let proxy = proxy(&catalog, config());

    proxy.add_owner(TABLE_URI, "carol").await.unwrap();
    let table = proxy.get_table(TABLE_URI).await.unwrap();
    assert_eq!(
        owner_ids(&table),
        vec!["active_owned_by", "carol", "fallback_owner"]
    );
    assert!(catalog.find("User", "carol").await.is_some());

    proxy.delete_owner(TABLE_URI, "carol").await.unwrap();
    let table = proxy.get_table(TABLE_URI).await.unwrap();
    assert_eq!(owner_ids(&table), vec!["active_owned_by", "fallback_owner"]);
}

#[tokio::test]
async fn deleting_unknown_owner_is_bad_request() {
    let catalog = InMemoryCatalog::new();
    seed_orders_table(&catalog).await;
    let proxy = proxy(&catalog, config());

    let err = proxy.delete_owner(TABLE_URI, "nobody").await.unwrap_err();
    assert!(matches!(err, ProxyError::BadRequest(_)));
    assert_eq!(err.http_status(), 400);

    // The attribute owner has no edge to delete.
    assert!(matches!(
        proxy.delete_owner(TABLE_URI, "fallback_owner").await,
        Err(ProxyError::BadRequest(_))
    ));
}

#[tokio::test]
async fn add_owner_on_missing_table_is_not_found() {
    let catalog = InMemoryCatalog::new();
    let proxy = proxy(&catalog, config());

    assert!(matches!(
        proxy.add_owner("hive_table://gold.sales/ghost", "carol").await,
        Err(ProxyError::NotFound(_))
    ));
    assert!(catalog.relationships().await.is_empty());
}

#[tokio::test]
async fn get_user_uses_resolver_profile() {
    let catalog = InMemoryCatalog::new();
    let proxy = proxy(&catalog, config());

    let user = proxy.get_user("dana@example.com").await.unwrap();
    assert_eq!(user.email.as_deref(), Some("dana@example.com"));
    assert_eq!(user.user_id.as_deref(), Some("dana@example.com"));
    assert!(catalog.calls().await.is_empty());
}

fn owner_ref(id: &str, relationship: Status, entity: Status) -> RelationshipRef {
    RelationshipRef {
        guid: Some(format!("guid-{id}")),
        display_text: Some(id.to_string()),
        relationship_status: Some(relationship),
        entity_status: Some(entity),
        ..RelationshipRef::default()
    }
}

fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Active),
        Just(Status::Inactive),
        Just(Status::Deleted)
    ]
}

proptest! {
    #[test]
    fn owners_unique_and_active(
        refs in prop::collection::vec(("[a-d]", status(), status()), 0..12),
        fallback in prop::option::of("[a-f]"),
    ) {
        let data_owners: Vec<RelationshipRef> = refs
            .iter()
            .map(|(id, rel, ent)| owner_ref(id, *rel, *ent))
            .collect();
        let owners = resolve_owners(&DefaultUserDetails, &data_owners, fallback.as_deref());

        let ids: Vec<&str> = owners.iter().filter_map(|u| u.identity_key()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), ids.len());

        for id in &ids {
            let from_active_ref = data_owners
                .iter()
                .any(|r| r.is_active() && r.display_text.as_deref() == Some(*id));
            prop_assert!(from_active_ref || fallback.as_deref() == Some(*id));
        }
        if let Some(fallback) = fallback.as_deref() {
            prop_assert!(ids.contains(&fallback));
        }
    }
}

// ── Tags ──────────────────────────────────────────────────────

#[tokio::test]
async fn tag_round_trip() {
    let catalog = InMemoryCatalog::new();
    seed_orders_table(&catalog).await;
    let proxy = proxy(&catalog, config());

    proxy
        .add_tag(TABLE_URI, "PII", "default", ResourceType::Table)
        .await
        .unwrap();

    assert_eq!(
        proxy.get_tags().await.unwrap(),
        vec![TagDetail {
            tag_name: "PII".into(),
            tag_count: 1
        }]
    );
    assert_eq!(
        proxy.get_table(TABLE_URI).await.unwrap().tags,
        vec![Tag {
            tag_name: "PII".into(),
            tag_type: "default".into()
        }]
    );

    proxy
        .delete_tag(TABLE_URI, "PII", "default", ResourceType::Table)
        .await
        .unwrap();

    assert_eq!(
        proxy.get_tags().await.unwrap(),
        vec![TagDetail {
            tag_name: "PII".into(),
            tag_count: 0
        }]
    );
    assert!(proxy.get_table(TABLE_URI).await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn second_tag_reuses_glossary_and_term() {
    let catalog = InMemoryCatalog::new();
    seed_orders_table(&catalog).await;
    seed(
        &catalog,
        json!({"guid": "other", "typeName": "hive_table", "attributes": {"qualifiedName": "sales.other@gold"}}),
    )
    .await;
    let proxy = proxy(&catalog, config());

    proxy
        .add_tag(TABLE_URI, "PII", "default", ResourceType::Table)
        .await
        .unwrap();
    proxy
        .add_tag("hive_table://gold.sales/other", "PII", "default", ResourceType::Table)
        .await
        .unwrap();

    let calls = catalog.calls().await;
    assert_eq!(calls.iter().filter(|c| *c == "create_glossary").count(), 1);
    assert_eq!(
        calls.iter().filter(|c| *c == "create_glossary_term").count(),
        1
    );
    assert_eq!(proxy.get_tags().await.unwrap()[0].tag_count, 2);
}

#[tokio::test]
async fn duplicate_assignment_surfaces_backend_conflict() {
    let catalog = InMemoryCatalog::new();
    seed_orders_table(&catalog).await;
    let proxy = proxy(&catalog, config());

    proxy
        .add_tag(TABLE_URI, "PII", "default", ResourceType::Table)
        .await
        .unwrap();
    let err = proxy
        .add_tag(TABLE_URI, "PII", "default", ResourceType::Table)
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::Backend(ClientError::Conflict(_))));
}

#[tokio::test]
async fn delete_unknown_tag_is_not_found() {
    let catalog = InMemoryCatalog::new();
    seed_orders_table(&catalog).await;
    let proxy = proxy(&catalog, config());

    assert!(matches!(
        proxy
            .delete_tag(TABLE_URI, "nope", "default", ResourceType::Table)
            .await,
        Err(ProxyError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_unassigned_tag_is_noop() {
    let catalog = InMemoryCatalog::new();
    seed_orders_table(&catalog).await;
    seed(
        &catalog,
        json!({"guid": "other", "typeName": "hive_table", "attributes": {"qualifiedName": "sales.other@gold"}}),
    )
    .await;
    let proxy = proxy(&catalog, config());

    proxy
        .add_tag("hive_table://gold.sales/other", "PII", "default", ResourceType::Table)
        .await
        .unwrap();
    proxy
        .delete_tag(TABLE_URI, "PII", "default", ResourceType::Table)
        .await
        .unwrap();

    assert!(!catalog
        .calls()
        .await
        .iter()
        .any(|c| c == "disassociate_term_from_entities"));
    assert_eq!(proxy.get_tags().await.unwrap()[0].tag_count, 1);
}

#[tokio::test]
async fn tagging_unsupported_resource_is_not_implemented() {
    let catalog = InMemoryCatalog::new();
    let proxy = proxy(&catalog, config());

    assert!(matches!(
        proxy
            .add_tag("some-user", "PII", "default", ResourceType::User)
            .await,
        Err(ProxyError::NotImplemented(_))
    ));
}

#[tokio::test]
async fn badges_from_metrics_sorted() {
    let catalog = InMemoryCatalog::new();
    let proxy = proxy(&catalog, config());
    assert!(proxy.get_badges().await.unwrap().is_empty());

    catalog
        .set_metrics(Some(MetricsSnapshot(json!({
            "tag": {"tagEntities": {"gold": 3, "alpha": 1}}
        }))))
        .await;

    assert_eq!(
        proxy.get_badges().await.unwrap(),
        vec![Badge::classification("alpha"), Badge::classification("gold")]
    );
}
