use diesel::prelude::*;
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::product::{NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery},
    models::product::{NewProduct as DbNewProduct, Product as DbProduct},
    repository::{DieselRepository, ProductReader, ProductWriter},
};

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::id.eq(id))
            .filter(products::hub_id.eq(hub_id))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(Into::into))
    }

    fn list_products(
        &self,
        query: ProductListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainProduct>)> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let mut count_query = products::table
            .filter(products::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if !query.include_archived {
            count_query = count_query.filter(products::is_archived.eq(false));
        }

        if let Some(term) = query.search.as_ref() {
            let pattern = format!("%{}%", term);
            count_query = count_query.filter(
                products::name
                    .like(pattern.clone())
                    .or(products::sku.like(pattern)),
            );
        }

        if let Some(sku) = query.sku.as_ref() {
            count_query = count_query.filter(products::sku.eq(sku));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = products::table
            .filter(products::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if !query.include_archived {
            items = items.filter(products::is_archived.eq(false));
        }

        if let Some(term) = query.search.as_ref() {
            let pattern = format!("%{}%", term);
            items = items.filter(
                products::name
                    .like(pattern.clone())
                    .or(products::sku.like(pattern)),
            );
        }

        if let Some(sku) = query.sku.as_ref() {
            items = items.filter(products::sku.eq(sku));
        }

        items = items.order((products::is_archived.asc(), products::name.asc()));

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let products = items
            .load::<DbProduct>(&mut conn)?
            .into_iter()
            .map(DomainProduct::from)
            .collect();

        Ok((total, products))
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let created = diesel::insert_into(products::table)
            .values(DbNewProduct::from(new_product))
            .get_result::<DbProduct>(&mut conn)?;

        Ok(created.into())
    }
}
