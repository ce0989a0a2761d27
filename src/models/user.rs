use chrono::{Local, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::user::{
    NewUser as DomainNewUser, UpdateUser as DomainUpdateUser, User as DomainUser,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    pub email: String,
    pub role_level: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub hub_id: i32,
    pub name: &'a str,
    pub email: &'a str,
    pub role_level: i32,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
pub struct UpdateUser<'a> {
    pub name: Option<&'a str>,
    pub role_level: Option<i32>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::user_store_access)]
pub struct UserStoreAccess {
    pub id: i32,
    pub user_id: i32,
    pub store_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::user_store_access)]
pub struct NewUserStoreAccess {
    pub user_id: i32,
    pub store_id: i32,
}

impl User {
    pub fn into_domain(self, allowed_store_ids: Vec<i32>) -> DomainUser {
        DomainUser {
            id: self.id,
            hub_id: self.hub_id,
            name: self.name,
            email: self.email,
            role_level: self.role_level,
            allowed_store_ids,
        }
    }
}

impl<'a> From<&'a DomainNewUser> for NewUser<'a> {
    fn from(value: &'a DomainNewUser) -> Self {
        Self {
            hub_id: value.hub_id,
            name: value.name.as_str(),
            email: value.email.as_str(),
            role_level: value.role_level,
        }
    }
}

impl<'a> From<&'a DomainUpdateUser> for UpdateUser<'a> {
    fn from(value: &'a DomainUpdateUser) -> Self {
        Self {
            name: value.name.as_deref(),
            role_level: value.role_level,
            updated_at: Local::now().naive_utc(),
        }
    }
}
