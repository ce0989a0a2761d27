use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{NewProduct as DomainNewProduct, Product as DomainProduct};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub unit_name: String,
    pub split_unit_name: String,
    pub split_ratio: i32,
    pub min_stock_level: i32,
    pub bound_store_id: Option<i32>,
    pub is_archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub hub_id: i32,
    pub name: &'a str,
    pub sku: Option<&'a str>,
    pub category: Option<&'a str>,
    pub unit_name: &'a str,
    pub split_unit_name: &'a str,
    pub split_ratio: i32,
    pub min_stock_level: i32,
    pub bound_store_id: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl From<Product> for DomainProduct {
    fn from(value: Product) -> Self {
        Self {
            id: value.id,
            hub_id: value.hub_id,
            name: value.name,
            sku: value.sku,
            category: value.category,
            unit_name: value.unit_name,
            split_unit_name: value.split_unit_name,
            split_ratio: value.split_ratio,
            min_stock_level: value.min_stock_level,
            bound_store_id: value.bound_store_id,
            is_archived: value.is_archived,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewProduct> for NewProduct<'a> {
    fn from(value: &'a DomainNewProduct) -> Self {
        Self {
            hub_id: value.hub_id,
            name: value.name.as_str(),
            sku: value.sku.as_deref(),
            category: value.category.as_deref(),
            unit_name: value.unit_name.as_str(),
            split_unit_name: value.split_unit_name.as_str(),
            split_ratio: value.split_ratio,
            min_stock_level: value.min_stock_level,
            bound_store_id: value.bound_store_id,
            updated_at: value.updated_at,
        }
    }
}
