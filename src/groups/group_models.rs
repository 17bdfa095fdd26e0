use serde::Deserialize;

/// Default member cap for a freshly created group.
pub const DEFAULT_GROUP_LIMITATION: i64 = 20;

// Member permission levels, highest first in listings.
pub const PERMISSION_OWNER: i64 = 2;
pub const PERMISSION_ADMIN: i64 = 1;
pub const PERMISSION_MEMBER: i64 = 0;

// ** Section: request bodies **

#[derive(Debug, Deserialize, Clone)]
pub struct CreateGroupDto {
    pub group_name: Option<String>,
    pub limitation: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InviteToGroupDto {
    pub invitee_id: Option<i64>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModifyGroupDto {
    pub group_id: Option<i64>,
    pub group_name: Option<String>,
    pub limitation: Option<i64>,
    pub allow_new_member: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MemberPermissionDto {
    pub member_id: Option<i64>,
    pub group_id: Option<i64>,
    pub permission: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExitGroupDto {
    pub group_id: Option<i64>,
    /// Defaults to the session user (leaving on one's own).
    pub target_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DissolveGroupDto {
    pub group_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupMembersQuery {
    pub group_id: Option<i64>,
}
