use crate::cli::CliAuthTokenKey;
use crate::data_store::{models, GroupId, StoreError, UserId};
use std::fmt::{Display, Formatter};

pub struct EnumMemberNotExistingError {
    pub member_value: String,
    pub enum_name: &'static str,
}

impl Display for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is not a valid value for {} enum",
            self.member_value, self.enum_name
        )
    }
}

/// Authorization token of the principal behind a request
///
/// The AuthToken holds the user's identity, whether the user is an administrator and the list of
/// groups the user is a member of. From these, the [AccessRole]s of the user in a specific
/// [AccessContext] are derived, which in turn imply specific [Privilege]s.
///
/// This structure is our main protection against accidental unauthorized-access bugs: All
/// data_store access functions require an AuthToken and check the required privilege within the
/// context of the affected group or event. An AuthToken can only be created by
/// [crate::data_store::GroupPlanStoreFacade::get_auth_token_for_session], based on the user
/// identified by a client's session, and by cli functions via [Self::create_for_cli].
#[derive(Debug, Clone)]
pub struct AuthToken {
    user_id: Option<UserId>,
    is_admin: bool,
    group_ids: Vec<GroupId>,
}

impl AuthToken {
    /// Create a new AuthToken for a client session.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::GroupPlanStoreFacade::get_auth_token_for_session] after checking that
    /// the user exists and has been approved, and after looking up the user's group memberships!
    pub(super) fn create_for_session(
        user_id: UserId,
        role: UserRole,
        group_ids: Vec<GroupId>,
    ) -> Self {
        AuthToken {
            user_id: Some(user_id),
            is_admin: role == UserRole::Admin,
            group_ids,
        }
    }

    /// Create a new AuthToken for a command line interface functionality.
    ///
    /// The AuthToken grants the Admin role, but is not associated with any user. Thus, it cannot
    /// be used for making reservations.
    ///
    /// This function must only be used by command line interface functions, not in the context of
    /// the web server!
    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        AuthToken {
            user_id: None,
            is_admin: true,
            group_ids: vec![],
        }
    }

    /// Get the user represented by this token, or None for a cli token
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Get the user represented by this token or a PermissionDenied error, if the token does not
    /// represent a user.
    pub fn require_user_id(&self, privilege: Privilege) -> Result<UserId, StoreError> {
        self.user_id.ok_or(StoreError::PermissionDenied {
            required_privilege: privilege,
            group_id: None,
        })
    }

    /// Ids of all groups, the user is a member of
    pub fn group_ids(&self) -> &[GroupId] {
        &self.group_ids
    }

    /// List the roles of the principal within the given context
    pub fn roles_in(&self, context: AccessContext) -> Vec<AccessRole> {
        let mut roles = Vec::new();
        if self.is_admin {
            roles.push(AccessRole::Admin);
        }
        match context {
            AccessContext::Global => {}
            AccessContext::Group(group_id) => {
                if self.group_ids.contains(&group_id) {
                    roles.push(AccessRole::GroupMember);
                }
            }
            AccessContext::Event {
                group_id,
                creator_id,
            } => {
                if self.group_ids.contains(&group_id) {
                    roles.push(AccessRole::GroupMember);
                }
                if creator_id.is_some() && creator_id == self.user_id {
                    roles.push(AccessRole::EventCreator);
                }
            }
        }
        roles
    }

    /// Check if the AuthToken authorizes for the given `privilege` in the given context.
    ///
    /// The actual authorization check is delegated to [Privilege::qualifying_roles], by checking if
    /// any of the principal's roles in the context qualifies.
    pub fn has_privilege(&self, context: AccessContext, privilege: Privilege) -> bool {
        let roles = self.roles_in(context);
        privilege
            .qualifying_roles()
            .iter()
            .any(|role| roles.contains(role))
    }

    /// Check if the AuthToken authorizes for the given `privilege` in the given context. If not,
    /// return an appropriate PermissionDenied error.
    pub fn check_privilege(
        &self,
        context: AccessContext,
        privilege: Privilege,
    ) -> Result<(), StoreError> {
        if self.has_privilege(context, privilege) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
                group_id: context.group_id(),
            })
        }
    }
}

/// The scope in which a privilege is requested
#[derive(Debug, Clone, Copy)]
pub enum AccessContext {
    Global,
    Group(GroupId),
    Event {
        group_id: GroupId,
        creator_id: Option<UserId>,
    },
}

impl AccessContext {
    pub fn of_event(event: &models::Event) -> Self {
        Self::Event {
            group_id: event.group_id,
            creator_id: event.creator_id,
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            AccessContext::Global => None,
            AccessContext::Group(group_id) => Some(*group_id),
            AccessContext::Event { group_id, .. } => Some(*group_id),
        }
    }
}

/// Account state of a user, as stored in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    /// Registered, but not yet approved by an admin
    Pending,
    Member,
    Admin,
}

impl TryFrom<&str> for UserRole {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(UserRole::Pending),
            "member" => Ok(UserRole::Member),
            "admin" => Ok(UserRole::Admin),
            value => Err(EnumMemberNotExistingError {
                member_value: value.to_owned(),
                enum_name: "UserRole",
            }),
        }
    }
}

/// Roles a principal may hold within an [AccessContext].
///
/// Each role qualifies for a set of [Privilege]s. See [Privilege::qualifying_roles].
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum AccessRole {
    GroupMember,
    EventCreator,
    Admin,
}

impl AccessRole {
    pub fn name(&self) -> &str {
        match self {
            AccessRole::GroupMember => "group member",
            AccessRole::EventCreator => "event creator",
            AccessRole::Admin => "admin",
        }
    }
}

/// Enum of available authorization privileges.
///
/// Each data_store action and web endpoint typically requires a single privilege.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Privilege {
    ShowEvents,
    CreateEvents,
    ReserveSpot,
    EditEvent,
    ListAllEvents,
}

impl Privilege {
    /// Get the list of [AccessRole]s that qualify for this privilege. Each returned role is
    /// individually sufficient for the privilege.
    ///
    /// This is function is our source of truth for authorization!
    pub fn qualifying_roles(&self) -> &'static [AccessRole] {
        match self {
            Privilege::ShowEvents => &[AccessRole::GroupMember, AccessRole::Admin],
            Privilege::CreateEvents => &[AccessRole::GroupMember, AccessRole::Admin],
            Privilege::ReserveSpot => &[AccessRole::GroupMember, AccessRole::Admin],
            Privilege::EditEvent => &[AccessRole::EventCreator, AccessRole::Admin],
            Privilege::ListAllEvents => &[AccessRole::Admin],
        }
    }
}
