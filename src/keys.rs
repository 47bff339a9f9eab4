//! Resource keys and backend qualified names.
//!
//! A table key `{database}://{cluster}.{schema}/{table}` addresses the
//! backend entity of type `{database}` whose qualifiedName is
//! `{schema}.{table}@{cluster}`. Column keys append `/{column}`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ProxyError, Result};

static TABLE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<database>[^:/]+)://(?P<cluster>[^/]+)\.(?P<schema>[^./]+)/(?P<table>[^/]+)$")
        .unwrap()
});

static COLUMN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<database>[^:/]+)://(?P<cluster>[^/]+)\.(?P<schema>[^./]+)/(?P<table>[^/]+)/(?P<column>[^/]+)$",
    )
    .unwrap()
});

static TABLE_QN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<schema>[^.@]+)\.(?P<table>[^@]+)@(?P<cluster>[^@]+)$").unwrap()
});

static COLUMN_QN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<schema>[^.@]+)\.(?P<table>[^.@]+)\.(?P<column>[^@]+)@(?P<cluster>[^@]+)$")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub database: String,
    pub cluster: String,
    pub schema: String,
    pub table: String,
}

impl TableKey {
    pub fn parse(key: &str) -> Result<Self> {
        let caps = TABLE_KEY_RE
            .captures(key)
            .ok_or_else(|| ProxyError::bad_request(format!("invalid table key '{key}'")))?;
        Ok(Self {
            database: caps["database"].to_string(),
            cluster: caps["cluster"].to_string(),
            schema: caps["schema"].to_string(),
            table: caps["table"].to_string(),
        })
    }

    /// Rebuild the key from a backend type name and table qualifiedName.
    pub fn from_qualified_name(type_name: &str, qualified_name: &str) -> Option<Self> {
        let qn = TableQualifiedName::parse(qualified_name)?;
        Some(Self {
            database: type_name.to_string(),
            cluster: qn.cluster,
            schema: qn.schema,
            table: qn.table,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.database
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}@{}", self.schema, self.table, self.cluster)
    }

    pub fn bookmark_qualified_name(&self, user_id: &str) -> String {
        format!(
            "{}.{}.{}.{}.bookmark@{}",
            self.schema, self.table, self.database, user_id, self.cluster
        )
    }
}

impl std::fmt::Display for TableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}://{}.{}/{}",
            self.database, self.cluster, self.schema, self.table
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub table: TableKey,
    pub column: String,
}

impl ColumnKey {
    pub fn parse(key: &str) -> Result<Self> {
        let caps = COLUMN_KEY_RE
            .captures(key)
            .ok_or_else(|| ProxyError::bad_request(format!("invalid column key '{key}'")))?;
        Ok(Self {
            table: TableKey {
                database: caps["database"].to_string(),
                cluster: caps["cluster"].to_string(),
                schema: caps["schema"].to_string(),
                table: caps["table"].to_string(),
            },
            column: caps["column"].to_string(),
        })
    }

    /// Rebuild the key from a backend column type name and column qualifiedName.
    pub fn from_qualified_name(type_name: &str, qualified_name: &str) -> Option<Self> {
        let caps = COLUMN_QN_RE.captures(qualified_name)?;
        Some(Self {
            table: TableKey {
                database: type_name.replace("_column", "_table"),
                cluster: caps["cluster"].to_string(),
                schema: caps["schema"].to_string(),
                table: caps["table"].to_string(),
            },
            column: caps["column"].to_string(),
        })
    }

    pub fn type_name(&self) -> String {
        self.table.database.replace("_table", "_column")
    }

    pub fn qualified_name(&self) -> String {
        format!(
            "{}.{}.{}@{}",
            self.table.schema, self.table.table, self.column, self.table.cluster
        )
    }
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.table, self.column)
    }
}

/// Components of a table qualifiedName.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQualifiedName {
    pub schema: String,
    pub table: String,
    pub cluster: String,
}

impl TableQualifiedName {
    pub fn parse(qualified_name: &str) -> Option<Self> {
        let caps = TABLE_QN_RE.captures(qualified_name)?;
        Some(Self {
            schema: caps["schema"].to_string(),
            table: caps["table"].to_string(),
            cluster: caps["cluster"].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_key_maps_to_qualified_name() {
        let key = TableKey::parse("hive_table://gold.sales/orders").unwrap();
        assert_eq!(key.type_name(), "hive_table");
        assert_eq!(key.qualified_name(), "sales.orders@gold");
        assert_eq!(key.to_string(), "hive_table://gold.sales/orders");
    }

    #[test]
    fn cluster_may_contain_dots() {
        let key = TableKey::parse("hive_table://eu.gold.sales/orders").unwrap();
        assert_eq!(key.cluster, "eu.gold");
        assert_eq!(key.schema, "sales");
    }

    #[test]
    fn malformed_table_key_is_bad_request() {
        let err = TableKey::parse("orders").unwrap_err();
        assert!(matches!(err, ProxyError::BadRequest(_)));
    }

    #[test]
    fn column_key_maps_to_column_type() {
        let key = ColumnKey::parse("hive_table://gold.sales/orders/amount").unwrap();
        assert_eq!(key.type_name(), "hive_column");
        assert_eq!(key.qualified_name(), "sales.orders.amount@gold");
        assert_eq!(key.to_string(), "hive_table://gold.sales/orders/amount");
    }

    #[test]
    fn column_key_rebuilt_from_qualified_name() {
        let key = ColumnKey::from_qualified_name("hive_column", "sales.orders.amount@gold").unwrap();
        assert_eq!(key.to_string(), "hive_table://gold.sales/orders/amount");
    }

    #[test]
    fn bookmark_qualified_name_layout() {
        let key = TableKey::parse("hive_table://gold.sales/orders").unwrap();
        assert_eq!(
            key.bookmark_qualified_name("alice"),
            "sales.orders.hive_table.alice.bookmark@gold"
        );
    }

    #[test]
    fn table_qualified_name_parse() {
        let qn = TableQualifiedName::parse("sales.orders@gold").unwrap();
        assert_eq!(qn.schema, "sales");
        assert_eq!(qn.table, "orders");
        assert_eq!(qn.cluster, "gold");
        assert!(TableQualifiedName::parse("orders").is_none());
    }
}
