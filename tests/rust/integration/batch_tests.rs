use serde_json::json;
use sqlsynth::{
    EngineConfig, ExecutionError, GeneratedKeyKind, MetadataCache, Parameters, Session,
    SynthesisError,
};
use uuid::Uuid;

use crate::common::northwind::{product, Product, Shipment, Shipper};
use crate::common::fake_store::{FakeStore, FakeStoreError};
use crate::mock_store::MockStore;

fn chai_batch(count: usize) -> Vec<Product> {
    (0..count)
        .map(|i| product(&format!("Chai {}", i), 1))
        .collect()
}

fn shippers() -> Vec<Shipper> {
    (1..=3)
        .map(|id| Shipper {
            shipper_id: Some(id),
            company_name: format!("Shipper {}", id),
            phone: None,
        })
        .collect()
}

#[tokio::test]
async fn test_insert_many_in_one_batch() {
    let store = FakeStore::new();
    for key in [78, 79, 80] {
        store.queue_scalar(Ok(Some(json!(key))));
    }
    let cache = MetadataCache::new();
    let config = EngineConfig::default();
    let session = Session::new(&store, &cache, &config);

    let mut rows = chai_batch(3);
    let keys = session.insert_many(&mut rows).await.unwrap();

    assert_eq!(keys, vec![json!(78), json!(79), json!(80)]);
    assert_eq!(
        rows.iter().map(|p| p.product_id).collect::<Vec<_>>(),
        vec![Some(78), Some(79), Some(80)]
    );
    assert_eq!(store.batch_events(), vec!["begin", "commit"]);

    let statements = store.statements();
    assert_eq!(statements.len(), 3);
    assert!(statements
        .iter()
        .all(|(sql, _)| sql.contains("OUTPUT INSERTED.ProductID VALUES")));
    assert_eq!(statements[2].1["ProductName"], json!("Chai 2"));
}

#[tokio::test]
async fn test_insert_many_normalizes_unique_identifier_keys() {
    let ids = [Uuid::new_v4(), Uuid::new_v4()];
    let store = FakeStore::new();
    for id in ids {
        store.queue_scalar(Ok(Some(json!(format!("{{{}}}", id).to_uppercase()))));
    }
    let cache = MetadataCache::new();
    let config = EngineConfig {
        generated_key_kind: GeneratedKeyKind::UniqueIdentifier,
        ..Default::default()
    };
    let session = Session::new(&store, &cache, &config);

    let mut rows: Vec<Shipment> = ["Speedy Express", "Federal Shipping"]
        .iter()
        .map(|carrier| Shipment {
            shipment_id: None,
            carrier: carrier.to_string(),
        })
        .collect();
    let keys = session.insert_many(&mut rows).await.unwrap();

    assert_eq!(
        keys,
        vec![json!(ids[0].to_string()), json!(ids[1].to_string())]
    );
    assert_eq!(
        rows.iter().map(|s| s.shipment_id).collect::<Vec<_>>(),
        vec![Some(ids[0]), Some(ids[1])]
    );
}

#[tokio::test]
async fn test_insert_many_rolls_back_on_failure() {
    let store = FakeStore::new();
    store.queue_scalar(Ok(Some(json!(78))));
    store.queue_scalar(Err(FakeStoreError::Failure("deadlock".to_string())));
    let cache = MetadataCache::new();
    let config = EngineConfig::default();
    let session = Session::new(&store, &cache, &config);

    let err = session.insert_many(&mut chai_batch(3)).await.unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::Store(FakeStoreError::Failure(ref reason)) if reason == "deadlock"
    ));
    assert_eq!(store.batch_events(), vec!["begin", "rollback"]);
    assert_eq!(store.statements().len(), 2);
}

#[tokio::test]
async fn test_oversized_batch_touches_nothing() {
    // No expectations: any call into the store fails the test
    let store = MockStore::new();
    let cache = MetadataCache::new();
    let config = EngineConfig::default();
    let session = Session::new(&store, &cache, &config);

    let err = session.insert_many(&mut chai_batch(1001)).await.unwrap_err();
    assert_eq!(
        err.synthesis(),
        Some(&SynthesisError::BatchTooLarge {
            rows: 1001,
            max: 1000
        })
    );

    let err = session.insert_many::<Product>(&mut []).await.unwrap_err();
    assert_eq!(err.synthesis(), Some(&SynthesisError::EmptyBatch));
}

#[tokio::test]
async fn test_batch_limit_follows_config() {
    let store = MockStore::new();
    let cache = MetadataCache::new();
    let config = EngineConfig {
        max_batch_rows: 2,
        ..Default::default()
    };
    let session = Session::new(&store, &cache, &config);

    let mut set = Parameters::new();
    set.insert("Phone".to_string(), json!("(503) 555-0000"));
    let err = session.update_many(&shippers(), &set).await.unwrap_err();
    assert_eq!(
        err.synthesis(),
        Some(&SynthesisError::BatchTooLarge { rows: 3, max: 2 })
    );
}

#[tokio::test]
async fn test_update_many() {
    let store = FakeStore::new();
    store.queue_scalar(Ok(Some(json!(3))));
    let cache = MetadataCache::new();
    let config = EngineConfig::default();
    let session = Session::new(&store, &cache, &config);

    let mut set = Parameters::new();
    set.insert("@Phone".to_string(), json!("(503) 555-0000"));
    let affected = session.update_many(&shippers(), &set).await.unwrap();
    assert_eq!(affected, 3);
    assert_eq!(store.batch_events(), vec!["begin", "commit"]);

    let (sql, parameters) = store.statements().remove(0);
    assert_eq!(
        sql,
        "UPDATE Shippers SET Phone = @Phone \
         WHERE (ShipperID = @k_0) OR (ShipperID = @k_1) OR (ShipperID = @k_2); SELECT @@ROWCOUNT"
    );
    assert_eq!(parameters["k_0"], json!(1));
    assert_eq!(parameters["k_2"], json!(3));
    assert_eq!(parameters["Phone"], json!("(503) 555-0000"));
}

#[tokio::test]
async fn test_update_many_column_named_twice_touches_nothing() {
    let store = MockStore::new();
    let cache = MetadataCache::new();
    let config = EngineConfig::default();
    let session = Session::new(&store, &cache, &config);

    let mut set = Parameters::new();
    set.insert("Phone".to_string(), json!("(503) 555-0000"));
    set.insert("@Phone".to_string(), json!("(503) 555-1111"));
    let err = session.update_many(&shippers(), &set).await.unwrap_err();
    assert!(matches!(
        err.synthesis(),
        Some(SynthesisError::DuplicateColumn { column, .. }) if column == "Phone"
    ));
}

#[tokio::test]
async fn test_update_many_rolls_back_on_failure() {
    let mut store = MockStore::new();
    store.expect_begin_batch().times(1).returning(|| Ok(()));
    store
        .expect_execute_scalar()
        .withf(|sql, parameters| sql.starts_with("UPDATE Shippers") && parameters.len() == 4)
        .times(1)
        .returning(|_, _| Err(FakeStoreError::Failure("timeout".to_string())));
    store.expect_rollback_batch().times(1).returning(|| Ok(()));
    store.expect_commit_batch().never();

    let cache = MetadataCache::new();
    let config = EngineConfig::default();
    let session = Session::new(&store, &cache, &config);

    let mut set = Parameters::new();
    set.insert("CompanyName".to_string(), json!("United Package"));
    let err = session.update_many(&shippers(), &set).await.unwrap_err();
    assert!(matches!(err, ExecutionError::Store(_)));
}

#[tokio::test]
async fn test_failed_rollback_keeps_original_error() {
    let mut store = MockStore::new();
    store.expect_begin_batch().returning(|| Ok(()));
    store
        .expect_execute_scalar()
        .returning(|_, _| Err(FakeStoreError::Failure("lost connection".to_string())));
    store
        .expect_rollback_batch()
        .times(1)
        .returning(|| Err(FakeStoreError::Failure("already closed".to_string())));

    let cache = MetadataCache::new();
    let config = EngineConfig::default();
    let session = Session::new(&store, &cache, &config);

    let err = session.insert_many(&mut chai_batch(2)).await.unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::Store(FakeStoreError::Failure(ref reason)) if reason == "lost connection"
    ));
}
