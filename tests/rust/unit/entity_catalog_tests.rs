use std::sync::Arc;

use sqlsynth::entity_catalog::{Entity, EntityMetadata, MetadataCache, ResolveOptions};
use sqlsynth::EntityType;

use crate::common::northwind::{Category, EventLog, OrderDetail, Product, Shipment};

#[test]
fn test_product_metadata() {
    let cache = MetadataCache::new();
    let metadata = cache.resolve::<Product>();

    assert_eq!(metadata.entity_name, "Product");
    assert_eq!(metadata.table_name, "Products");
    let columns: Vec<_> = metadata
        .columns
        .iter()
        .map(|c| c.column_name.as_str())
        .collect();
    assert_eq!(
        columns,
        vec![
            "ProductID",
            "ProductName",
            "SupplierID",
            "CategoryID",
            "UnitPrice",
            "Discontinued"
        ]
    );

    let key = &metadata.columns[0];
    assert!(key.is_key);
    assert!(key.is_generated_by_database);
    assert_eq!(key.source_field_name, "product_id");
}

#[test]
fn test_not_mapped_field_only_with_include_excluded() {
    let with_excluded = EntityMetadata::resolve_with(
        &Product::descriptor(),
        ResolveOptions {
            include_excluded: true,
        },
    );
    let category = with_excluded
        .columns
        .iter()
        .find(|c| c.source_field_name == "category")
        .expect("category column present");
    assert!(category.is_excluded);
    assert!(with_excluded.column_for_field("category").is_none());
}

#[test]
fn test_table_annotations() {
    let cache = MetadataCache::new();
    assert_eq!(cache.resolve::<OrderDetail>().table_name, "Order Details");
    assert_eq!(cache.resolve::<EventLog>().table_name, "[audit].[EventLog]");
    assert_eq!(cache.resolve::<Category>().table_name, "Categories");
}

#[test]
fn test_composite_and_missing_keys() {
    let cache = MetadataCache::new();
    let details = cache.resolve::<OrderDetail>();
    let keys: Vec<_> = details.key_columns().map(|c| c.column_name.as_str()).collect();
    assert_eq!(keys, vec!["OrderID", "ProductID"]);
    assert_eq!(details.generated_key_columns().count(), 0);

    assert_eq!(cache.resolve::<EventLog>().key_columns().count(), 0);
    assert_eq!(cache.resolve::<Shipment>().generated_key_columns().count(), 1);
}

#[test]
fn test_cache_returns_same_entry() {
    let cache = MetadataCache::new();
    assert!(cache.is_empty());

    let first = cache.resolve::<Product>();
    let second = cache.resolve_type(EntityType::of::<Product>());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    cache.resolve::<Category>();
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_concurrent_resolution_converges() {
    let cache = MetadataCache::new();
    let resolved: Vec<Arc<EntityMetadata>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| cache.resolve::<OrderDetail>()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(cache.len(), 1);
    let stored = cache.resolve::<OrderDetail>();
    assert!(resolved.iter().all(|m| Arc::ptr_eq(m, &stored)));
}

#[test]
fn test_reflected_field_access() {
    let mut product = Product {
        product_name: "Chai".to_string(),
        ..Default::default()
    };
    assert_eq!(
        product.field_value("product_name"),
        Some(serde_json::json!("Chai"))
    );
    assert_eq!(product.field_value("nope"), None);

    product
        .set_field_value("product_id", serde_json::json!(78))
        .unwrap();
    assert_eq!(product.product_id, Some(78));

    assert!(product
        .set_field_value("product_id", serde_json::json!("not a number"))
        .is_err());
    assert!(product
        .set_field_value("missing", serde_json::json!(1))
        .is_err());
}
