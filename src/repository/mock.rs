use mockall::mock;

use super::{
    ProductReader, RolePermissionReader, RolePermissionWriter, StoreReader, UserListQuery,
    UserReader,
};
use crate::domain::{
    permission::RolePermissionRule,
    product::{Product, ProductListQuery},
    store::Store,
    user::User,
};
use pushkind_common::repository::errors::RepositoryResult;

mock! {
    pub StoreReader {}

    impl StoreReader for StoreReader {
        fn get_store_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Store>>;
        fn list_stores(&self, hub_id: i32) -> RepositoryResult<Vec<Store>>;
    }
}

mock! {
    pub ProductReader {}

    impl ProductReader for ProductReader {
        fn get_product_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Product>>;
        fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
    }
}

mock! {
    pub UserReader {}

    impl UserReader for UserReader {
        fn get_user_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<User>>;
        fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>>;
        fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)>;
    }
}

mock! {
    pub RolePermissionReader {}

    impl RolePermissionReader for RolePermissionReader {
        fn list_role_permissions(&self) -> RepositoryResult<Vec<RolePermissionRule>>;
    }
}

mock! {
    pub RolePermissionWriter {}

    impl RolePermissionWriter for RolePermissionWriter {
        fn upsert_role_permission(&self, rule: &RolePermissionRule) -> RepositoryResult<RolePermissionRule>;
    }
}
