use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::routes::check_role;

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::user::User;
use crate::repository::UserReader;
use crate::services::{ServiceError, ServiceResult};

/// Map the authenticated session onto the inventory user with the same email
/// in the same hub. The stored user carries the role level and store grants.
pub fn resolve_actor<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<User>
where
    R: UserReader + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    match repo
        .get_user_by_email(&user.email, user.hub_id)
        .map_err(ServiceError::from)?
    {
        Some(actor) => Ok(actor),
        None => {
            log::warn!("No inventory user for {} in hub {}", user.email, user.hub_id);
            Err(ServiceError::Unauthorized)
        }
    }
}
