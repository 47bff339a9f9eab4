//! Shared fixtures for the integration tests.
//!
//! Every test seeds its own `InMemoryCatalog`; nothing is shared between
//! tests except the global tracing subscriber.

#![allow(dead_code)]

use std::sync::Arc;

use catalog_client::InMemoryCatalog;
use metadata_proxy::{telemetry, AtlasProxy, ProxyConfig};
use serde_json::{json, Value};

pub const TABLE_URI: &str = "hive_table://gold.sales/orders";
pub const TABLE_GUID: &str = "table-orders";

pub fn proxy(catalog: &InMemoryCatalog, config: ProxyConfig) -> AtlasProxy {
    telemetry::init();
    AtlasProxy::new(Arc::new(catalog.clone()), &config).unwrap()
}

pub async fn seed(catalog: &InMemoryCatalog, entity: Value) -> String {
    catalog.insert_json(entity).await.unwrap()
}

/// Relationship ref with both statuses ACTIVE.
pub fn active_ref(guid: &str, type_name: &str, display_text: &str) -> Value {
    json!({
        "guid": guid,
        "typeName": type_name,
        "displayText": display_text,
        "relationshipGuid": format!("rel-{guid}"),
        "relationshipStatus": "ACTIVE",
        "entityStatus": "ACTIVE"
    })
}

pub fn config() -> ProxyConfig {
    ProxyConfig::from_yaml(
        r#"
statistics_format_spec:
  min:
    new_name: minimum
    format: "{:,.2f}"
  max:
    drop: true
programmatic_descriptions_exclude_filters:
  - spark.*
watermark_date_formats:
  - "%Y%m%d"
"#,
    )
    .unwrap()
}

pub async fn seed_user(catalog: &InMemoryCatalog, user_id: &str) -> String {
    seed(
        catalog,
        json!({
            "guid": format!("user-{user_id}"),
            "typeName": "User",
            "attributes": {"qualifiedName": user_id, "name": user_id}
        }),
    )
    .await
}

/// A table with columns, owners, partitions, reports and readers.
pub async fn seed_orders_table(catalog: &InMemoryCatalog) {
    seed(
        catalog,
        json!({
            "guid": "col-id",
            "typeName": "hive_column",
            "attributes": {
                "qualifiedName": "sales.orders.id@gold",
                "name": "id",
                "type": "bigint",
                "position": 1,
                "statistics": [
                    {"attributes": {"stat_name": "min", "stat_val": 1500.5, "start_epoch": 1, "end_epoch": 2}},
                    {"attributes": {"stat_name": "max", "stat_val": 9000}},
                    {"attributes": {"stat_name": "count", "stat_val": 10}}
                ]
            }
        }),
    )
    .await;
    seed(
        catalog,
        json!({
            "guid": "col-amount",
            "typeName": "hive_column",
            "attributes": {
                "qualifiedName": "sales.orders.amount@gold",
                "name": "amount",
                "dataType": "decimal",
                "position": 2,
                "description": "order amount"
            },
            "classifications": [
                {"typeName": "active_col_badge", "entityStatus": "ACTIVE"},
                {"typeName": "inactive_col_badge", "entityStatus": "DELETED"}
            ]
        }),
    )
    .await;
    seed(
        catalog,
        json!({
            "guid": "col-old",
            "typeName": "hive_column",
            "status": "DELETED",
            "attributes": {"qualifiedName": "sales.orders.old@gold", "name": "old", "position": 0}
        }),
    )
    .await;

    for (guid, name, status) in [
        ("report-1", "test_report", "ACTIVE"),
        ("report-2", "deleted_report", "DELETED"),
        ("report-3", "test_report3", "ACTIVE"),
    ] {
        seed(
            catalog,
            json!({
                "guid": guid,
                "typeName": "Report",
                "status": status,
                "attributes": {"qualifiedName": name, "name": name, "url": format!("http://reports/{name}")}
            }),
        )
        .await;
    }

    for (guid, user, count) in [("reader-1", "alice", 5), ("reader-2", "bob", 12)] {
        seed(
            catalog,
            json!({
                "guid": guid,
                "typeName": "Reader",
                "attributes": {"qualifiedName": format!("{user}.orders.reader"), "count": count},
                "relationshipAttributes": {"user": active_ref(&format!("user-{user}"), "User", user)}
            }),
        )
        .await;
    }

    seed(
        catalog,
        json!({
            "guid": TABLE_GUID,
            "typeName": "hive_table",
            "updateTime": 1598342400123i64,
            "attributes": {
                "qualifiedName": "sales.orders@gold",
                "name": "orders",
                "description": "all orders",
                "tableType": "EXTERNAL_TABLE",
                "owner": "fallback_owner",
                "popularityScore": 10,
                "columns": [
                    {"guid": "col-amount", "typeName": "hive_column"},
                    {"guid": "col-id", "typeName": "hive_column"},
                    {"guid": "col-old", "typeName": "hive_column"}
                ],
                "parameters": {
                    "testParameterKeyB": "b",
                    "testParameterKeyA": "a",
                    "spark.sql.sources.provider": "parquet"
                }
            },
            "classifications": [{"typeName": "certified", "entityStatus": "ACTIVE"}],
            "relationshipAttributes": {
                "ownedBy": [
                    active_ref("user-active", "User", "active_owned_by"),
                    {
                        "guid": "user-inactive",
                        "typeName": "User",
                        "displayText": "inactive",
                        "relationshipGuid": "rel-inactive",
                        "relationshipStatus": "ACTIVE",
                        "entityStatus": "INACTIVE"
                    }
                ],
                "partitions": [
                    active_ref("part-1", "hive_partition", "ds=20200908"),
                    active_ref("part-2", "hive_partition", "ds=20200911"),
                    {
                        "guid": "part-3",
                        "displayText": "ds=20200901",
                        "relationshipStatus": "DELETED",
                        "entityStatus": "ACTIVE"
                    }
                ],
                "reports": [
                    {"guid": "report-3"},
                    {"guid": "report-2"},
                    {"guid": "report-1"}
                ],
                "readers": [
                    active_ref("reader-1", "Reader", "alice.orders.reader"),
                    active_ref("reader-2", "Reader", "bob.orders.reader")
                ]
            }
        }),
    )
    .await;
}
