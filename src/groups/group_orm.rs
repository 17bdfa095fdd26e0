use crate::errors::ApiError;

pub trait GroupOrm {
    /// Call `proc_create_group` and return the new group's id.
    fn create_group(&self, owner_id: i64, group_name: &str, limitation: i64) -> Result<i64, ApiError>;

    /// Call `proc_invite_into_group`.
    fn invite_to_group(&self, inviter_id: i64, invitee_id: i64, group_id: i64) -> Result<(), ApiError>;

    /// Call `proc_modify_group_option`.
    fn modify_group_option(
        &self,
        modifier_id: i64,
        group_id: i64,
        group_name: &str,
        limitation: i64,
        allow_new_member: bool,
    ) -> Result<(), ApiError>;

    /// Call `proc_modify_member_permission`.
    fn modify_member_permission(
        &self,
        modifier_id: i64,
        member_id: i64,
        group_id: i64,
        permission: i64,
    ) -> Result<(), ApiError>;

    /// Call `proc_exit_group`; the requestor may remove another member when
    /// the procedure's permission checks allow it.
    fn exit_group(&self, requestor_id: i64, target_id: i64, group_id: i64) -> Result<(), ApiError>;

    /// Call `proc_dissolve_group`.
    fn dissolve_group(&self, requestor_id: i64, group_id: i64) -> Result<(), ApiError>;

    /// Groups the user belongs to.
    fn get_group_list(&self, user_id: i64) -> Result<Vec<serde_json::Value>, ApiError>;

    /// Members of a group, highest permission first.
    fn get_group_members(&self, group_id: i64) -> Result<Vec<serde_json::Value>, ApiError>;
}

pub mod cfg {
    use crate::dbase::DbPool;

    #[cfg(not(feature = "mockdata"))]
    use super::impls::GroupOrmApp;
    #[cfg(not(feature = "mockdata"))]
    pub fn get_group_orm_app(pool: DbPool) -> GroupOrmApp {
        GroupOrmApp::new(pool)
    }

    #[cfg(feature = "mockdata")]
    use super::tests::GroupOrmApp;
    #[cfg(feature = "mockdata")]
    pub fn get_group_orm_app(_: DbPool) -> GroupOrmApp {
        GroupOrmApp::new()
    }
}

#[cfg(not(feature = "mockdata"))]
pub mod impls {
    use mysql::Value;

    use crate::dbase::{
        self,
        procedures::{self, impls::MySqlSession, OUT_ERR_CODE, OUT_ERR_MSG},
    };
    use crate::errors::{ApiError, ApiErrorKind};
    use crate::settings::err;

    use super::*;

    #[derive(Clone)]
    pub struct GroupOrmApp {
        pub pool: dbase::DbPool,
    }

    impl GroupOrmApp {
        pub fn new(pool: dbase::DbPool) -> Self {
            GroupOrmApp { pool }
        }
        fn get_conn(&self) -> Result<dbase::DbPooledConnection, ApiError> {
            self.pool.get().map_err(|e| db_error(e.to_string()))
        }

        fn call(&self, name: &str, in_params: Vec<Value>) -> Result<(), ApiError> {
            let mut conn = self.get_conn()?;
            let mut session = MySqlSession::new(&mut conn);

            let outcome =
                procedures::call_procedure(&mut session, name, in_params, &[OUT_ERR_CODE, OUT_ERR_MSG]);
            outcome.into_result().map(|_| ())
        }
    }

    fn db_error(info: String) -> ApiError {
        log::error!("{}: {}", err::CD_DATABASE, &info);
        ApiError::with_message(ApiErrorKind::SqlException, &info)
    }

    impl GroupOrm for GroupOrmApp {
        fn create_group(
            &self,
            owner_id: i64,
            group_name: &str,
            limitation: i64,
        ) -> Result<i64, ApiError> {
            let mut conn = self.get_conn()?;
            let mut session = MySqlSession::new(&mut conn);

            let outcome = procedures::call_procedure(
                &mut session,
                "proc_create_group",
                vec![Value::from(owner_id), Value::from(group_name), Value::from(limitation)],
                &["p_group_id", OUT_ERR_CODE, OUT_ERR_MSG],
            );
            let outputs = outcome.into_result()?;

            outputs
                .get("p_group_id")
                .and_then(dbase::value_to_i64)
                .ok_or_else(|| db_error("proc_create_group returned no p_group_id".to_string()))
        }

        fn invite_to_group(
            &self,
            inviter_id: i64,
            invitee_id: i64,
            group_id: i64,
        ) -> Result<(), ApiError> {
            self.call(
                "proc_invite_into_group",
                vec![Value::from(inviter_id), Value::from(invitee_id), Value::from(group_id)],
            )
        }

        fn modify_group_option(
            &self,
            modifier_id: i64,
            group_id: i64,
            group_name: &str,
            limitation: i64,
            allow_new_member: bool,
        ) -> Result<(), ApiError> {
            self.call(
                "proc_modify_group_option",
                vec![
                    Value::from(modifier_id),
                    Value::from(group_id),
                    Value::from(group_name),
                    Value::from(limitation),
                    Value::from(allow_new_member),
                ],
            )
        }

        fn modify_member_permission(
            &self,
            modifier_id: i64,
            member_id: i64,
            group_id: i64,
            permission: i64,
        ) -> Result<(), ApiError> {
            self.call(
                "proc_modify_member_permission",
                vec![
                    Value::from(modifier_id),
                    Value::from(member_id),
                    Value::from(group_id),
                    Value::from(permission),
                ],
            )
        }

        fn exit_group(&self, requestor_id: i64, target_id: i64, group_id: i64) -> Result<(), ApiError> {
            self.call(
                "proc_exit_group",
                vec![Value::from(requestor_id), Value::from(target_id), Value::from(group_id)],
            )
        }

        fn dissolve_group(&self, requestor_id: i64, group_id: i64) -> Result<(), ApiError> {
            self.call(
                "proc_dissolve_group",
                vec![Value::from(requestor_id), Value::from(group_id)],
            )
        }

        fn get_group_list(&self, user_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let mut conn = self.get_conn()?;

            dbase::query_rows(
                &mut conn,
                "SELECT \
                     g.id AS group_id, g.conversation_id, g.group_name, \
                     g.owner_id, u.username AS owner_username, \
                     g.number_of_members, g.limitation, g.allow_new_member, \
                     gm.permission, g.updated_at \
                 FROM chatgroups g \
                 JOIN group_members gm ON gm.group_id = g.id \
                 JOIN users u ON u.id = g.owner_id \
                 JOIN conversations c ON c.id = g.conversation_id \
                 WHERE gm.uid = ? AND c.is_active = 1 \
                 ORDER BY g.updated_at DESC",
                vec![Value::from(user_id)],
            )
            .map_err(db_error)
        }

        fn get_group_members(&self, group_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let mut conn = self.get_conn()?;

            dbase::query_rows(
                &mut conn,
                "SELECT gm.uid, u.username, u.display_name, gm.nickname, gm.permission, gm.updated_at \
                 FROM group_members gm \
                 JOIN users u ON u.id = gm.uid \
                 WHERE gm.group_id = ? \
                 ORDER BY gm.permission DESC, gm.updated_at ASC",
                vec![Value::from(group_id)],
            )
            .map_err(db_error)
        }
    }
}

#[cfg(feature = "mockdata")]
pub mod tests {
    use serde_json::json;

    use crate::errors::{ApiError, ApiErrorKind};
    use crate::groups::group_models::{PERMISSION_ADMIN, PERMISSION_MEMBER, PERMISSION_OWNER};

    use super::*;

    pub const GROUP_ID_START: i64 = 4401;

    #[derive(Debug, Clone)]
    pub struct MockGroup {
        pub id: i64,
        pub group_name: String,
        pub owner_id: i64,
        pub limitation: i64,
        pub allow_new_member: bool,
        /// (uid, permission) pairs.
        pub members: Vec<(i64, i64)>,
    }

    /// In-memory stand-in replaying the observable behavior of the group
    /// procedures.
    #[derive(Debug, Clone)]
    pub struct GroupOrmApp {
        pub group_vec: Vec<MockGroup>,
    }

    impl GroupOrmApp {
        /// Create a new instance.
        pub fn new() -> Self {
            GroupOrmApp { group_vec: Vec::new() }
        }
        /// Create a new instance with the specified group list.
        #[cfg(test)]
        pub fn create(group_list: &[MockGroup]) -> Self {
            GroupOrmApp {
                group_vec: group_list.to_vec(),
            }
        }
        /// Create a new entity instance owned by `owner_id`.
        pub fn new_group(id: i64, group_name: &str, owner_id: i64, member_ids: &[i64]) -> MockGroup {
            let mut members = vec![(owner_id, PERMISSION_OWNER)];
            for member_id in member_ids {
                members.push((*member_id, PERMISSION_MEMBER));
            }
            MockGroup {
                id,
                group_name: group_name.to_string(),
                owner_id,
                limitation: 20,
                allow_new_member: true,
                members,
            }
        }

        fn find_group(&self, group_id: i64) -> Result<&MockGroup, ApiError> {
            self.group_vec
                .iter()
                .find(|group| group.id == group_id)
                .ok_or_else(|| ApiError::kind(ApiErrorKind::GroupNotExists))
        }
    }

    fn permission_of(group: &MockGroup, user_id: i64) -> Option<i64> {
        group
            .members
            .iter()
            .find(|(uid, _)| *uid == user_id)
            .map(|(_, permission)| *permission)
    }

    impl GroupOrm for GroupOrmApp {
        fn create_group(
            &self,
            _owner_id: i64,
            _group_name: &str,
            limitation: i64,
        ) -> Result<i64, ApiError> {
            if limitation < 1 || limitation > 200 {
                return Err(ApiError::kind(ApiErrorKind::InvalidLimitation));
            }
            Ok(GROUP_ID_START + self.group_vec.len() as i64)
        }

        fn invite_to_group(
            &self,
            inviter_id: i64,
            invitee_id: i64,
            group_id: i64,
        ) -> Result<(), ApiError> {
            let group = self.find_group(group_id)?;
            if permission_of(group, inviter_id).is_none() {
                return Err(ApiError::kind(ApiErrorKind::InviterNotInGroup));
            }
            if permission_of(group, invitee_id).is_some() {
                return Err(ApiError::kind(ApiErrorKind::InviteeAlreadyInGroup));
            }
            if group.members.len() as i64 >= group.limitation {
                return Err(ApiError::kind(ApiErrorKind::GroupFull));
            }
            if !group.allow_new_member {
                return Err(ApiError::kind(ApiErrorKind::GroupNotAllowNewMember));
            }
            Ok(())
        }

        fn modify_group_option(
            &self,
            modifier_id: i64,
            group_id: i64,
            _group_name: &str,
            limitation: i64,
            _allow_new_member: bool,
        ) -> Result<(), ApiError> {
            let group = self.find_group(group_id)?;
            let permission = permission_of(group, modifier_id).unwrap_or(PERMISSION_MEMBER - 1);
            if permission < PERMISSION_ADMIN {
                return Err(ApiError::kind(ApiErrorKind::PermissionDenied));
            }
            if limitation < group.members.len() as i64 {
                return Err(ApiError::kind(ApiErrorKind::InvalidLimitation));
            }
            Ok(())
        }

        fn modify_member_permission(
            &self,
            modifier_id: i64,
            member_id: i64,
            group_id: i64,
            _permission: i64,
        ) -> Result<(), ApiError> {
            let group = self.find_group(group_id)?;
            if permission_of(group, modifier_id) != Some(PERMISSION_OWNER) {
                return Err(ApiError::kind(ApiErrorKind::PermissionDenied));
            }
            if permission_of(group, member_id).is_none() {
                return Err(ApiError::kind(ApiErrorKind::MemberNotInGroup));
            }
            Ok(())
        }

        fn exit_group(&self, requestor_id: i64, target_id: i64, group_id: i64) -> Result<(), ApiError> {
            let group = self.find_group(group_id)?;
            if permission_of(group, target_id).is_none() {
                return Err(ApiError::kind(ApiErrorKind::MemberNotInGroup));
            }
            if requestor_id == target_id {
                // The owner has to hand the group over before leaving.
                if group.owner_id == requestor_id {
                    return Err(ApiError::kind(ApiErrorKind::OwnerShouldTransferred));
                }
                return Ok(());
            }
            let requestor_permission =
                permission_of(group, requestor_id).unwrap_or(PERMISSION_MEMBER - 1);
            if requestor_permission < PERMISSION_ADMIN {
                return Err(ApiError::kind(ApiErrorKind::PermissionDenied));
            }
            Ok(())
        }

        fn dissolve_group(&self, requestor_id: i64, group_id: i64) -> Result<(), ApiError> {
            let group = self.find_group(group_id)?;
            if group.owner_id != requestor_id {
                return Err(ApiError::kind(ApiErrorKind::PermissionDenied));
            }
            Ok(())
        }

        fn get_group_list(&self, user_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let rows = self
                .group_vec
                .iter()
                .filter(|group| permission_of(group, user_id).is_some())
                .map(|group| {
                    json!({
                        "group_id": group.id,
                        "group_name": group.group_name,
                        "owner_id": group.owner_id,
                        "number_of_members": group.members.len(),
                        "limitation": group.limitation,
                        "allow_new_member": group.allow_new_member,
                        "permission": permission_of(group, user_id),
                    })
                })
                .collect();
            Ok(rows)
        }

        fn get_group_members(&self, group_id: i64) -> Result<Vec<serde_json::Value>, ApiError> {
            let group = match self.group_vec.iter().find(|group| group.id == group_id) {
                Some(group) => group,
                None => return Ok(Vec::new()),
            };
            let mut members = group.members.clone();
            members.sort_by(|a, b| b.1.cmp(&a.1));
            let rows = members
                .iter()
                .map(|(uid, permission)| {
                    json!({
                        "uid": uid,
                        "username": format!("user{}", uid),
                        "nickname": null,
                        "permission": permission,
                    })
                })
                .collect();
            Ok(rows)
        }
    }
}
