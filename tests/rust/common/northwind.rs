//! Northwind entities used across the test suites

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlsynth::impl_entity;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub category_id: Option<i32>,
    pub category_name: String,
    pub description: Option<String>,
}

impl_entity! {
    #[table = "Categories"]
    Category {
        category_id => "CategoryID" [key, identity],
        category_name => "CategoryName",
        description => "Description",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub product_id: Option<i32>,
    pub product_name: String,
    pub supplier_id: Option<i32>,
    pub category_id: Option<i32>,
    pub unit_price: Option<f64>,
    pub discontinued: bool,
    /// Navigation only, never persisted
    pub category: Option<Category>,
}

impl_entity! {
    #[table = "Products"]
    Product {
        product_id => "ProductID" [key, identity],
        product_name => "ProductName",
        supplier_id => "SupplierID",
        category_id => "CategoryID",
        unit_price => "UnitPrice",
        discontinued => "Discontinued",
        category [not_mapped],
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supplier {
    pub supplier_id: Option<i32>,
    pub company_name: String,
    pub country: Option<String>,
}

impl_entity! {
    #[table = "Suppliers"]
    Supplier {
        supplier_id => "SupplierID" [key, identity],
        company_name => "CompanyName",
        country => "Country",
    }
}

/// Natural string key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub customer_id: Option<String>,
    pub company_name: String,
    pub contact_name: Option<String>,
}

impl_entity! {
    #[table = "Customers"]
    Customer {
        customer_id => "CustomerID" [key],
        company_name => "CompanyName",
        contact_name => "ContactName",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shipper {
    pub shipper_id: Option<i32>,
    pub company_name: String,
    pub phone: Option<String>,
}

impl_entity! {
    #[table = "Shippers"]
    Shipper {
        shipper_id => "ShipperID" [key, identity],
        company_name => "CompanyName",
        phone => "Phone",
    }
}

/// Composite key, table name with a space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDetail {
    pub order_id: Option<i32>,
    pub product_id: Option<i32>,
    pub unit_price: f64,
    pub quantity: i16,
    pub discount: f32,
}

impl_entity! {
    #[table = "Order Details"]
    OrderDetail {
        order_id => "OrderID" [key],
        product_id => "ProductID" [key],
        unit_price => "UnitPrice",
        quantity => "Quantity",
        discount => "Discount",
    }
}

/// Mapped columns but no key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLog {
    pub message: String,
    pub logged_at: Option<NaiveDateTime>,
}

impl_entity! {
    #[table = "EventLog", schema = "audit"]
    EventLog {
        message => "Message",
        logged_at => "LoggedAt",
    }
}

/// Database-generated unique identifier key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shipment {
    pub shipment_id: Option<Uuid>,
    pub carrier: String,
}

impl_entity! {
    #[table = "Shipments"]
    Shipment {
        shipment_id => "ShipmentID" [key, identity],
        carrier => "Carrier",
    }
}

pub fn product(name: &str, category_id: i32) -> Product {
    Product {
        product_name: name.to_string(),
        category_id: Some(category_id),
        supplier_id: Some(1),
        unit_price: Some(18.0),
        ..Default::default()
    }
}
