use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthContext;

/// What the caller may do inside one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAccess {
    Owner,
    Staff,
}

impl StoreAccess {
    /// `owner_id` is the store's owner; `is_staff` whether the caller is on its staff list.
    pub fn resolve(user_id: i64, owner_id: i64, is_staff: bool) -> Option<Self> {
        if user_id == owner_id {
            Some(StoreAccess::Owner)
        } else if is_staff {
            Some(StoreAccess::Staff)
        } else {
            None
        }
    }

    pub fn require_owner(self, action: &str) -> Result<(), AppError> {
        match self {
            StoreAccess::Owner => Ok(()),
            StoreAccess::Staff => Err(AppError::forbidden(format!("Only the store owner can {action}"))),
        }
    }
}

#[derive(sqlx::FromRow)]
struct Membership {
    owner_id: i64,
    is_staff: bool,
}

/// Access of the caller to `store_id`. Unknown stores are 404, stores the caller neither owns
/// nor staffs are 403.
pub async fn authorize_store(pool: &PgPool, auth: &AuthContext, store_id: Uuid) -> Result<StoreAccess, AppError> {
    let membership = sqlx::query_as::<_, Membership>(
        "SELECT s.owner_id,
                EXISTS(SELECT 1 FROM store_staff m WHERE m.store_id = s.id AND m.user_id = $2) AS is_staff
         FROM stores s
         WHERE s.id = $1",
    )
    .bind(store_id)
    .bind(auth.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Store not found"))?;

    StoreAccess::resolve(auth.user_id, membership.owner_id, membership.is_staff).ok_or_else(|| {
        tracing::warn!(user_id = auth.user_id, %store_id, "Cross-store access rejected");
        AppError::forbidden("You do not have access to this store")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_of_another_store_is_rejected() {
        assert_eq!(StoreAccess::resolve(2, 1, false), None);
    }

    #[test]
    fn owner_and_staff_are_recognised() {
        assert_eq!(StoreAccess::resolve(1, 1, false), Some(StoreAccess::Owner));
        assert_eq!(StoreAccess::resolve(3, 1, true), Some(StoreAccess::Staff));
    }

    #[test]
    fn staff_cannot_do_owner_actions() {
        assert!(matches!(StoreAccess::Staff.require_owner("delete branches"), Err(AppError::Forbidden(_))));
        assert!(StoreAccess::Owner.require_owner("delete branches").is_ok());
    }
}
