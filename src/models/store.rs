use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::store::{Membership, NewStore as DomainNewStore, Store as DomainStore};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::stores)]
pub struct Store {
    pub id: i32,
    pub hub_id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub is_archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::stores)]
pub struct NewStore<'a> {
    pub hub_id: i32,
    pub parent_id: Option<i32>,
    pub name: &'a str,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::store_members)]
#[diesel(belongs_to(Store, foreign_key = store_id))]
pub struct StoreMember {
    pub id: i32,
    pub store_id: i32,
    pub user_id: i32,
    pub membership: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::store_members)]
pub struct NewStoreMember<'a> {
    pub store_id: i32,
    pub user_id: i32,
    pub membership: &'a str,
}

impl Store {
    pub fn into_domain(self, members: &[StoreMember]) -> DomainStore {
        let pick = |kind: Membership| -> Vec<i32> {
            members
                .iter()
                .filter(|member| member.store_id == self.id && member.membership == kind.as_str())
                .map(|member| member.user_id)
                .collect()
        };
        let managers = pick(Membership::Manager);
        let viewers = pick(Membership::Viewer);

        DomainStore {
            id: self.id,
            hub_id: self.hub_id,
            parent_id: self.parent_id,
            name: self.name,
            managers,
            viewers,
            is_archived: self.is_archived,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewStore> for NewStore<'a> {
    fn from(value: &'a DomainNewStore) -> Self {
        Self {
            hub_id: value.hub_id,
            parent_id: value.parent_id,
            name: value.name.as_str(),
        }
    }
}

impl DomainNewStore {
    pub(crate) fn member_rows(&self, store_id: i32) -> Vec<NewStoreMember<'static>> {
        let managers = self.managers.iter().map(move |user_id| NewStoreMember {
            store_id,
            user_id: *user_id,
            membership: Membership::Manager.as_str(),
        });
        let viewers = self.viewers.iter().map(move |user_id| NewStoreMember {
            store_id,
            user_id: *user_id,
            membership: Membership::Viewer.as_str(),
        });
        managers.chain(viewers).collect()
    }
}
