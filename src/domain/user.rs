use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum UserRole {
    User,
    CampaignOwner,
    Admin,
}

/// The slice of a platform user this crate reads: identity, role and the
/// ban flag. Credentials and profile data live with the identity layer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
    pub is_banned: bool,
}

impl User {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            email: email.into(),
            role: UserRole::User,
            is_banned: false,
        }
    }
}
