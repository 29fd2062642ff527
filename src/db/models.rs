use serde::Serialize;

/// Public profile fields, as exposed in attendee listings.
#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// The same profile fields keyed the way event payloads expose the creator.
#[derive(Debug, Clone, Serialize)]
pub struct CreatorProfile {
    pub creator_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
}
