use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Collector,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Collector => "collector",
            Role::Admin => "admin",
        }
    }
}

/// Every state-changing operation in the system, so handlers name the
/// permission they need instead of comparing role strings inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    RequestPickup,
    CancelPickup,
    ViewPickupHistory,
    ClaimPickup,
    UpdatePickup,
    InitiatePayment,
    ManageCategories,
    ManageUsers,
    ViewAdminDashboard,
}

impl Role {
    pub fn allows(&self, permission: Permission) -> bool {
        use Permission::*;
        match self {
            Role::Customer => matches!(
                permission,
                RequestPickup | CancelPickup | ViewPickupHistory | InitiatePayment
            ),
            Role::Collector => matches!(permission, ClaimPickup | UpdatePickup),
            Role::Admin => matches!(
                permission,
                ManageCategories | ManageUsers | ViewAdminDashboard
            ),
        }
    }

    /// Wrong role is a terminal forbidden outcome, checked before any effect.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.allows(permission) {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password_hash: String,
    pub role: Role,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            username: user.username,
            email: user.email,
            phone: user.phone,
            address: user.address,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

/// Username policy carried over from the registration form: digits are
/// stripped and at least two characters must remain.
pub fn normalize_username(raw: &str) -> Result<String, AppError> {
    let stripped: String = raw.chars().filter(|c| !c.is_ascii_digit()).collect();

    if stripped.is_empty() {
        return Err(AppError::ValidationError(
            "Username must contain at least one non-digit character".to_string(),
        ));
    }
    if stripped.chars().count() < 2 {
        return Err(AppError::ValidationError(
            "Username must have at least 2 characters (excluding digits)".to_string(),
        ));
    }

    Ok(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_permissions() {
        let role = Role::Customer;
        assert!(role.allows(Permission::RequestPickup));
        assert!(role.allows(Permission::CancelPickup));
        assert!(role.allows(Permission::InitiatePayment));
        assert!(!role.allows(Permission::ClaimPickup));
        assert!(!role.allows(Permission::ManageUsers));
    }

    #[test]
    fn collector_permissions() {
        let role = Role::Collector;
        assert!(role.allows(Permission::ClaimPickup));
        assert!(role.allows(Permission::UpdatePickup));
        assert!(!role.allows(Permission::RequestPickup));
        assert!(!role.allows(Permission::ViewAdminDashboard));
    }

    #[test]
    fn admin_cannot_act_as_customer_or_collector() {
        let role = Role::Admin;
        assert!(role.allows(Permission::ManageCategories));
        assert!(!role.allows(Permission::RequestPickup));
        assert!(!role.allows(Permission::ClaimPickup));
    }

    #[test]
    fn require_returns_unauthorized_for_wrong_role() {
        assert!(Role::Customer.require(Permission::ClaimPickup).is_err());
        assert!(Role::Collector.require(Permission::ClaimPickup).is_ok());
    }

    #[test]
    fn username_digits_are_stripped() {
        assert_eq!(normalize_username("ram123").unwrap(), "ram");
        assert_eq!(normalize_username("s1i2t3a4").unwrap(), "sita");
    }

    #[test]
    fn username_must_keep_two_chars() {
        assert!(normalize_username("12345").is_err());
        assert!(normalize_username("a1").is_err());
        assert!(normalize_username("ab").is_ok());
    }
}
