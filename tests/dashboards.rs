mod common;

use catalog_client::InMemoryCatalog;
use common::*;
use metadata_proxy::ProxyError;
use metadata_types::{DashboardQuery, ResourceType, Tag};
use pretty_assertions::assert_eq;
use serde_json::json;

const DASHBOARD_URI: &str = "superset_dashboard://gold.group_a/sales_board";

async fn seed_dashboards(catalog: &InMemoryCatalog) {
    seed_orders_table(catalog).await;

    seed(
        catalog,
        json!({
            "guid": "group-a",
            "typeName": "DashboardGroup",
            "attributes": {"qualifiedName": "superset_group://gold.group_a", "name": "Group A", "url": "http://bi/groups/a"}
        }),
    )
    .await;
    for (guid, ts, state) in [
        ("exec-1", 100, "succeeded"),
        ("exec-2", 300, "failed"),
        ("exec-3", 200, "succeeded"),
    ] {
        seed(
            catalog,
            json!({
                "guid": guid,
                "typeName": "DashboardExecution",
                "attributes": {"qualifiedName": guid, "timestamp": ts, "state": state}
            }),
        )
        .await;
    }
    seed(
        catalog,
        json!({
            "guid": "query-1",
            "typeName": "DashboardQuery",
            "attributes": {
                "qualifiedName": "sales_board/q1",
                "name": "weekly revenue",
                "url": "http://bi/queries/1",
                "queryText": "select 1"
            }
        }),
    )
    .await;

    seed(
        catalog,
        json!({
            "guid": "dash-1",
            "typeName": "Dashboard",
            "attributes": {
                "qualifiedName": DASHBOARD_URI,
                "name": "Sales board",
                "url": "http://bi/dashboards/1",
                "description": "weekly sales",
                "cluster": "gold",
                "product": "superset",
                "createdTimestamp": 1600000000,
                "lastModifiedTimestamp": 1600000500,
                "popularityScore": 42
            },
            "classifications": [{"typeName": "certified"}],
            "relationshipAttributes": {
                "group": active_ref("group-a", "DashboardGroup", "group_a"),
                "executions": [
                    active_ref("exec-1", "DashboardExecution", "exec-1"),
                    active_ref("exec-2", "DashboardExecution", "exec-2"),
                    active_ref("exec-3", "DashboardExecution", "exec-3")
                ],
                "charts": [active_ref("chart-1", "DashboardChart", "Revenue chart")],
                "queries": [active_ref("query-1", "DashboardQuery", "weekly revenue")],
                "tables": [active_ref(TABLE_GUID, "hive_table", "orders")],
                "readers": [
                    active_ref("reader-1", "Reader", "alice.orders.reader"),
                    active_ref("reader-2", "Reader", "bob.orders.reader")
                ],
                "ownedBy": [active_ref("user-carol", "User", "carol")]
            }
        }),
    )
    .await;

    seed(
        catalog,
        json!({
            "guid": "dash-2",
            "typeName": "Dashboard",
            "attributes": {
                "qualifiedName": "superset_dashboard://gold.group_b/alpha",
                "name": "Alpha board",
                "url": "http://bi/dashboards/2",
                "cluster": "gold",
                "product": "superset"
            },
            "relationshipAttributes": {
                "group": active_ref("group-missing", "DashboardGroup", "group_b")
            }
        }),
    )
    .await;

    seed(
        catalog,
        json!({
            "guid": "table-kpis",
            "typeName": "hive_table",
            "attributes": {"qualifiedName": "sales.kpis@gold", "name": "kpis"},
            "relationshipAttributes": {"dashboards": [
                active_ref("dash-1", "Dashboard", "Sales board"),
                active_ref("dash-2", "Dashboard", "Alpha board")
            ]}
        }),
    )
    .await;
}

#[tokio::test]
async fn dashboard_detail() {
    let catalog = InMemoryCatalog::new();
    seed_dashboards(&catalog).await;
    let proxy = proxy(&catalog, config());

    let dashboard = proxy.get_dashboard(DASHBOARD_URI).await.unwrap();

    assert_eq!(dashboard.uri, DASHBOARD_URI);
    assert_eq!(dashboard.name, "Sales board");
    assert_eq!(dashboard.group_name, "Group A");
    assert_eq!(dashboard.group_url.as_deref(), Some("http://bi/groups/a"));
    assert_eq!(dashboard.product, "superset");
    assert_eq!(dashboard.cluster, "gold");
    assert_eq!(dashboard.created_timestamp, 1600000000);
    assert_eq!(dashboard.updated_timestamp, 1600000500);
    assert_eq!(dashboard.last_run_timestamp, 300);
    assert_eq!(dashboard.last_run_state, "failed");
    assert_eq!(dashboard.last_successful_run_timestamp, 200);
    assert_eq!(dashboard.recent_view_count, 42);
    assert_eq!(dashboard.chart_names, vec!["Revenue chart"]);
    assert_eq!(dashboard.query_names, vec!["weekly revenue"]);
    assert_eq!(
        dashboard.queries,
        vec![DashboardQuery {
            name: "weekly revenue".into(),
            url: Some("http://bi/queries/1".into()),
            query_text: Some("select 1".into()),
        }]
    );
    assert_eq!(names_of_tables(&dashboard.tables), vec!["orders"]);

    let owners: Vec<_> = dashboard.owners.iter().filter_map(|u| u.user_id.as_deref()).collect();
    assert_eq!(owners, vec!["carol"]);
    let frequent: Vec<_> = dashboard
        .frequent_users
        .iter()
        .filter_map(|u| u.user_id.as_deref())
        .collect();
    assert_eq!(frequent, vec!["bob", "alice"]);
    assert_eq!(dashboard.badges.len(), 1);
}

fn names_of_tables(tables: &[metadata_types::PopularTable]) -> Vec<&str> {
    tables.iter().map(|t| t.name.as_str()).collect()
}

#[tokio::test]
async fn dashboard_tags_round_trip() {
    let catalog = InMemoryCatalog::new();
    seed_dashboards(&catalog).await;
    let proxy = proxy(&catalog, config());

    proxy
        .add_tag(DASHBOARD_URI, "finance", "dashboard", ResourceType::Dashboard)
        .await
        .unwrap();
    assert_eq!(
        proxy.get_dashboard(DASHBOARD_URI).await.unwrap().tags,
        vec![Tag {
            tag_name: "finance".into(),
            tag_type: "default".into()
        }]
    );

    proxy
        .delete_tag(DASHBOARD_URI, "finance", "dashboard", ResourceType::Dashboard)
        .await
        .unwrap();
    assert!(proxy.get_dashboard(DASHBOARD_URI).await.unwrap().tags.is_empty());
}

#[tokio::test]
async fn dashboard_description_round_trip() {
    let catalog = InMemoryCatalog::new();
    seed_dashboards(&catalog).await;
    let proxy = proxy(&catalog, config());

    assert_eq!(
        proxy
            .get_dashboard_description(DASHBOARD_URI)
            .await
            .unwrap()
            .as_deref(),
        Some("weekly sales")
    );
    proxy
        .put_dashboard_description(DASHBOARD_URI, "daily sales")
        .await
        .unwrap();
    assert_eq!(
        proxy
            .get_dashboard_description(DASHBOARD_URI)
            .await
            .unwrap()
            .as_deref(),
        Some("daily sales")
    );
}

#[tokio::test]
async fn unknown_dashboard_is_not_found() {
    let catalog = InMemoryCatalog::new();
    let proxy = proxy(&catalog, config());

    assert!(matches!(
        proxy.get_dashboard("superset_dashboard://gold.x/none").await,
        Err(ProxyError::NotFound(_))
    ));
}

#[tokio::test]
async fn dashboards_using_table_sorted_by_name() {
    let catalog = InMemoryCatalog::new();
    seed_dashboards(&catalog).await;
    let proxy = proxy(&catalog, config());

    let summaries = proxy
        .get_dashboards_using_table("hive_table://gold.sales/kpis")
        .await
        .unwrap();

    let names: Vec<_> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha board", "Sales board"]);

    let alpha = &summaries[0];
    assert_eq!(alpha.group_name, "group_b");
    assert_eq!(alpha.group_url, None);
    assert_eq!(alpha.last_successful_run_timestamp, 0);

    let sales = &summaries[1];
    assert_eq!(sales.uri, DASHBOARD_URI);
    assert_eq!(sales.group_name, "Group A");
    assert_eq!(sales.last_successful_run_timestamp, 200);

    assert!(proxy
        .get_dashboards_using_table(TABLE_URI)
        .await
        .unwrap()
        .is_empty());
}
