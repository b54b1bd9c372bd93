use serde_json::json;
use sqlsynth::statement_generator::{
    batch_insert_statement, bind_parameters, delete_statement, insert_statement,
    update_many_statement, update_statement,
};
use sqlsynth::{GeneratedKeyKind, MetadataCache, Parameters, SqlServerDialect, SynthesisError};

use crate::common::northwind::{
    product, Customer, EventLog, OrderDetail, Product, Shipment, Shipper,
};

fn assert_no_key_columns(result: Result<impl std::fmt::Debug, SynthesisError>, operation: &str) {
    match result {
        Err(SynthesisError::NoMappableColumns {
            entity,
            operation: op,
        }) => {
            assert_eq!(entity, "EventLog");
            assert_eq!(op, format!("{} (no key columns)", operation));
        }
        other => panic!("expected NoMappableColumns for {}, got {:?}", operation, other),
    }
}

#[test]
fn test_product_insert() {
    let cache = MetadataCache::new();
    let metadata = cache.resolve::<Product>();
    let statement =
        insert_statement(&metadata, &SqlServerDialect, GeneratedKeyKind::Integer).unwrap();

    assert_eq!(
        statement.sql,
        "INSERT INTO Products (ProductName, SupplierID, CategoryID, UnitPrice, Discontinued) \
         VALUES (@ProductName, @SupplierID, @CategoryID, @UnitPrice, @Discontinued); \
         SELECT CAST(SCOPE_IDENTITY() AS int)"
    );
    assert_eq!(statement.key_field.as_deref(), Some("product_id"));

    let parameters = bind_parameters(&product("Chai", 1), &statement.bindings);
    assert_eq!(parameters.len(), 5);
    assert_eq!(parameters["ProductName"], json!("Chai"));
    assert_eq!(parameters["CategoryID"], json!(1));
    assert_eq!(parameters["Discontinued"], json!(false));
    assert!(!parameters.contains_key("ProductID"));
}

#[test]
fn test_unique_identifier_insert() {
    let cache = MetadataCache::new();
    let statement = insert_statement(
        &cache.resolve::<Shipment>(),
        &SqlServerDialect,
        GeneratedKeyKind::UniqueIdentifier,
    )
    .unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO Shipments (Carrier) OUTPUT INSERTED.ShipmentID VALUES (@Carrier)"
    );
    assert_eq!(statement.key_field.as_deref(), Some("shipment_id"));
    assert_eq!(statement.key_kind, GeneratedKeyKind::UniqueIdentifier);
}

#[test]
fn test_natural_key_is_inserted() {
    let cache = MetadataCache::new();
    let statement = insert_statement(
        &cache.resolve::<Customer>(),
        &SqlServerDialect,
        GeneratedKeyKind::Integer,
    )
    .unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO Customers (CustomerID, CompanyName, ContactName) \
         VALUES (@CustomerID, @CompanyName, @ContactName)"
    );
    assert_eq!(statement.key_field, None);
}

#[test]
fn test_batch_insert_returns_every_natural_key() {
    let cache = MetadataCache::new();
    let statement = batch_insert_statement(
        &cache.resolve::<OrderDetail>(),
        &SqlServerDialect,
        GeneratedKeyKind::Integer,
    )
    .unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO [Order Details] (OrderID, ProductID, UnitPrice, Quantity, Discount) \
         OUTPUT INSERTED.OrderID, INSERTED.ProductID \
         VALUES (@OrderID, @ProductID, @UnitPrice, @Quantity, @Discount)"
    );
    assert_eq!(statement.key_field.as_deref(), Some("order_id"));
}

#[test]
fn test_keyless_entity_rejects_writes() {
    let cache = MetadataCache::new();
    let metadata = cache.resolve::<EventLog>();
    let entry = EventLog {
        message: "started".to_string(),
        logged_at: None,
    };

    assert_no_key_columns(
        insert_statement(&metadata, &SqlServerDialect, GeneratedKeyKind::Integer),
        "insert",
    );
    assert_no_key_columns(
        batch_insert_statement(&metadata, &SqlServerDialect, GeneratedKeyKind::Integer),
        "batch insert",
    );
    assert_no_key_columns(update_statement(&metadata, &entry, &SqlServerDialect), "update");
    assert_no_key_columns(delete_statement(&metadata, &entry, &SqlServerDialect), "delete");
}

#[test]
fn test_update_by_key() {
    let cache = MetadataCache::new();
    let mut chai = product("Chai", 1);
    chai.product_id = Some(1);

    let statement =
        update_statement(&cache.resolve::<Product>(), &chai, &SqlServerDialect).unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE Products SET ProductName = @ProductName, SupplierID = @SupplierID, \
         CategoryID = @CategoryID, UnitPrice = @UnitPrice, Discontinued = @Discontinued \
         WHERE ProductID = @ProductID; SELECT @@ROWCOUNT"
    );
    let parameters = bind_parameters(&chai, &statement.bindings);
    assert_eq!(parameters["ProductID"], json!(1));
}

#[test]
fn test_update_without_key_value() {
    let cache = MetadataCache::new();
    let err = update_statement(
        &cache.resolve::<Product>(),
        &product("Chai", 1),
        &SqlServerDialect,
    )
    .unwrap_err();
    assert_eq!(
        err,
        SynthesisError::NoMappableColumns {
            entity: "Product".to_string(),
            operation: "update (all key values are null)".to_string(),
        }
    );
}

#[test]
fn test_composite_delete() {
    let cache = MetadataCache::new();
    let detail = OrderDetail {
        order_id: Some(10248),
        product_id: Some(11),
        unit_price: 14.0,
        quantity: 12,
        discount: 0.0,
    };
    let statement =
        delete_statement(&cache.resolve::<OrderDetail>(), &detail, &SqlServerDialect).unwrap();
    assert_eq!(
        statement.sql,
        "DELETE FROM [Order Details] WHERE OrderID = @OrderID AND ProductID = @ProductID; SELECT @@ROWCOUNT"
    );
    let parameters = bind_parameters(&detail, &statement.bindings);
    assert_eq!(parameters["OrderID"], json!(10248));
    assert_eq!(parameters["ProductID"], json!(11));
}

#[test]
fn test_update_many_composite_keys() {
    let cache = MetadataCache::new();
    let rows = vec![
        OrderDetail {
            order_id: Some(10248),
            product_id: Some(11),
            ..Default::default()
        },
        OrderDetail {
            order_id: Some(10248),
            product_id: Some(42),
            ..Default::default()
        },
    ];
    let mut set = Parameters::new();
    set.insert("@Quantity".to_string(), json!(5));

    let statement = update_many_statement(
        &cache.resolve::<OrderDetail>(),
        &rows,
        &set,
        &SqlServerDialect,
        1000,
    )
    .unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE [Order Details] SET Quantity = @Quantity \
         WHERE (OrderID = @k_0_0 AND ProductID = @k_0_1) OR (OrderID = @k_1_0 AND ProductID = @k_1_1); \
         SELECT @@ROWCOUNT"
    );
    assert_eq!(statement.rows, 2);
    assert_eq!(statement.parameters["Quantity"], json!(5));
    assert_eq!(statement.parameters["k_1_1"], json!(42));
}

#[test]
fn test_update_many_limits() {
    let cache = MetadataCache::new();
    let metadata = cache.resolve::<Shipper>();
    let mut set = Parameters::new();
    set.insert("Phone".to_string(), json!("(503) 555-0000"));

    let none: Vec<Shipper> = Vec::new();
    assert_eq!(
        update_many_statement(&metadata, &none, &set, &SqlServerDialect, 1000).unwrap_err(),
        SynthesisError::EmptyBatch
    );

    let many: Vec<Shipper> = (0..1001)
        .map(|id| Shipper {
            shipper_id: Some(id),
            ..Default::default()
        })
        .collect();
    assert_eq!(
        update_many_statement(&metadata, &many, &set, &SqlServerDialect, 1000).unwrap_err(),
        SynthesisError::BatchTooLarge {
            rows: 1001,
            max: 1000
        }
    );
    assert!(update_many_statement(&metadata, &many[..1000], &set, &SqlServerDialect, 1000).is_ok());

    assert!(matches!(
        update_many_statement(&metadata, &many[..1], &Parameters::new(), &SqlServerDialect, 1000),
        Err(SynthesisError::NoMappableColumns { .. })
    ));
}
