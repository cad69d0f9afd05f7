//! Role variants and the fixed capability table.
//!
//! The table is the only source of authorization decisions: a role may perform
//! an action iff the action's capability token is in `permissions_for(role)`.
//! There is no inheritance between roles and `full_access` is an ordinary
//! token, not a wildcard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Teacher,
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Self; 3] = [Self::Administrator, Self::Teacher, Self::Student];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    /// Landing page a client should open after a successful login.
    #[must_use]
    pub fn redirect_target(self) -> &'static str {
        match self {
            Self::Administrator => "/admin",
            Self::Teacher => "/teacher",
            Self::Student => "/student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "administrator" | "admin" => Ok(Self::Administrator),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // administrator
    ManageUsers,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ManageData,
    ViewAllData,
    ConfigureSystem,
    ManageSchools,
    ManageClasses,
    FullAccess,
    // shared
    ViewReports,
    ManageAssignments,
    // teacher
    ViewAssignedClasses,
    CreateAssignment,
    UpdateAssignment,
    DeleteAssignment,
    ViewStudents,
    SubmitGrades,
    UpdateRecords,
    ManageClassContent,
    // student
    ViewProfile,
    ViewEnrolledClasses,
    SubmitAssignments,
    ViewGrades,
    ViewStatus,
    ViewAnnouncements,
    UpdateProfile,
    ViewSchedule,
}

impl Capability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageUsers => "manage_users",
            Self::CreateUser => "create_user",
            Self::UpdateUser => "update_user",
            Self::DeleteUser => "delete_user",
            Self::ManageData => "manage_data",
            Self::ViewAllData => "view_all_data",
            Self::ConfigureSystem => "configure_system",
            Self::ManageSchools => "manage_schools",
            Self::ManageClasses => "manage_classes",
            Self::FullAccess => "full_access",
            Self::ViewReports => "view_reports",
            Self::ManageAssignments => "manage_assignments",
            Self::ViewAssignedClasses => "view_assigned_classes",
            Self::CreateAssignment => "create_assignment",
            Self::UpdateAssignment => "update_assignment",
            Self::DeleteAssignment => "delete_assignment",
            Self::ViewStudents => "view_students",
            Self::SubmitGrades => "submit_grades",
            Self::UpdateRecords => "update_records",
            Self::ManageClassContent => "manage_class_content",
            Self::ViewProfile => "view_profile",
            Self::ViewEnrolledClasses => "view_enrolled_classes",
            Self::SubmitAssignments => "submit_assignments",
            Self::ViewGrades => "view_grades",
            Self::ViewStatus => "view_status",
            Self::ViewAnnouncements => "view_announcements",
            Self::UpdateProfile => "update_profile",
            Self::ViewSchedule => "view_schedule",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMINISTRATOR: &[Capability] = &[
    Capability::ManageUsers,
    Capability::CreateUser,
    Capability::UpdateUser,
    Capability::DeleteUser,
    Capability::ManageData,
    Capability::ViewAllData,
    Capability::ConfigureSystem,
    Capability::ViewReports,
    Capability::ManageSchools,
    Capability::ManageClasses,
    Capability::ManageAssignments,
    Capability::FullAccess,
];

const TEACHER: &[Capability] = &[
    Capability::ViewAssignedClasses,
    Capability::ManageAssignments,
    Capability::CreateAssignment,
    Capability::UpdateAssignment,
    Capability::DeleteAssignment,
    Capability::ViewStudents,
    Capability::SubmitGrades,
    Capability::UpdateRecords,
    Capability::ViewReports,
    Capability::ManageClassContent,
];

const STUDENT: &[Capability] = &[
    Capability::ViewProfile,
    Capability::ViewEnrolledClasses,
    Capability::SubmitAssignments,
    Capability::ViewGrades,
    Capability::ViewStatus,
    Capability::ViewAnnouncements,
    Capability::UpdateProfile,
    Capability::ViewSchedule,
];

/// Capability set granted to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Capability>);

impl PermissionSet {
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Membership test by wire token, e.g. `"submit_grades"`.
    #[must_use]
    pub fn contains_token(&self, token: &str) -> bool {
        self.0.iter().any(|capability| capability.as_str() == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn tokens(&self) -> Vec<&'static str> {
        self.0.iter().map(|capability| capability.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[must_use]
pub fn permissions_for(role: Role) -> PermissionSet {
    let table = match role {
        Role::Administrator => ADMINISTRATOR,
        Role::Teacher => TEACHER,
        Role::Student => STUDENT,
    };
    PermissionSet(table.iter().copied().collect())
}

/// Check that `role` holds `capability`.
///
/// # Errors
/// Returns `AuthError::AuthorizationDenied` with a readable reason on a miss.
pub fn authorize(role: Role, capability: Capability) -> Result<(), AuthError> {
    if permissions_for(role).contains(capability) {
        Ok(())
    } else {
        Err(AuthError::denied(format!(
            "role '{role}' lacks the '{capability}' permission"
        )))
    }
}
