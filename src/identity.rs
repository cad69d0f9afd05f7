//! User identities and their role-specific profiles.
//!
//! Flow Overview: the directory stores a `UserRecord` (identity + credential +
//! profile). Authentication turns a record into a `UserAccount`, a credential
//! free view whose `RoleProfile` variant always matches the identity's role.
//! Role-specific actions live on `UserAccount` and are gated by the permission
//! table before they touch the profile.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::directory::UserRecord;
use crate::error::AuthError;
use crate::permission::{authorize, permissions_for, Capability, PermissionSet, Role, UnknownRole};

pub type UserId = u64;

/// Construction errors for identities and accounts.
///
/// These indicate a broken caller contract or a corrupted record, never bad
/// user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
    #[error("profile for '{profile}' cannot be attached to a '{role}' identity")]
    ProfileMismatch { role: Role, profile: Role },
}

/// Mutable contact and profile attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

/// Role-invariant core record of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: UserId,
    username: String,
    email: String,
    role: Role,
    display_name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    pub details: ProfileDetails,
}

impl Identity {
    #[must_use]
    pub fn new(
        id: UserId,
        username: String,
        email: String,
        role: Role,
        display_name: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            role,
            display_name,
            created_at,
            details: ProfileDetails::default(),
        }
    }

    /// Build an identity from an untyped role name.
    ///
    /// # Errors
    /// Returns `IdentityError::UnknownRole` when `role` is not one of the
    /// three supported roles.
    pub fn with_role_name(
        id: UserId,
        username: String,
        email: String,
        role: &str,
        display_name: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, IdentityError> {
        let role = role.parse::<Role>()?;
        Ok(Self::new(id, username, email, role, display_name, created_at))
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn assign_id(&mut self, id: UserId) {
        self.id = id;
    }
}

pub type ClassRef = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub title: String,
    pub class: ClassRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub assignment: String,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministratorProfile {
    #[serde(default)]
    pub managed_users: Vec<UserId>,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherProfile {
    #[serde(default)]
    pub classes: Vec<ClassRef>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(default)]
    pub classes: Vec<ClassRef>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    /// subject -> grade
    #[serde(default)]
    pub grades: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian: Option<Guardian>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleProfile {
    Administrator(AdministratorProfile),
    Teacher(TeacherProfile),
    Student(StudentProfile),
}

impl RoleProfile {
    #[must_use]
    pub fn empty(role: Role) -> Self {
        match role {
            Role::Administrator => Self::Administrator(AdministratorProfile::default()),
            Role::Teacher => Self::Teacher(TeacherProfile::default()),
            Role::Student => Self::Student(StudentProfile::default()),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Administrator(_) => Role::Administrator,
            Self::Teacher(_) => Role::Teacher,
            Self::Student(_) => Role::Student,
        }
    }
}

/// A role-typed user view: shared identity plus the matching profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    identity: Identity,
    profile: RoleProfile,
}

impl UserAccount {
    /// Attach an empty profile of the identity's role.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        let profile = RoleProfile::empty(identity.role());
        Self { identity, profile }
    }

    /// # Errors
    /// Returns `IdentityError::ProfileMismatch` if `profile` belongs to a
    /// different role than `identity`.
    pub fn with_profile(identity: Identity, profile: RoleProfile) -> Result<Self, IdentityError> {
        if profile.role() != identity.role() {
            return Err(IdentityError::ProfileMismatch {
                role: identity.role(),
                profile: profile.role(),
            });
        }
        Ok(Self { identity, profile })
    }

    /// # Errors
    /// Returns `IdentityError::ProfileMismatch` for a corrupted record.
    pub fn from_record(record: &UserRecord) -> Result<Self, IdentityError> {
        Self::with_profile(record.identity.clone(), record.profile.clone())
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn profile(&self) -> &RoleProfile {
        &self.profile
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.identity.id()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.identity.role()
    }

    #[must_use]
    pub fn permissions(&self) -> PermissionSet {
        permissions_for(self.role())
    }

    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.permissions().contains(capability)
    }

    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` if the role lacks `capability`.
    pub fn authorize(&self, capability: Capability) -> Result<(), AuthError> {
        authorize(self.role(), capability)
    }

    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless the account may configure the system.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<(), AuthError> {
        self.authorize(Capability::ConfigureSystem)?;
        let profile = self.administrator_mut()?;
        profile.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Track a user as managed by this administrator.
    ///
    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless the account may manage users.
    pub fn manage_user(&mut self, user_id: UserId) -> Result<(), AuthError> {
        self.authorize(Capability::ManageUsers)?;
        let profile = self.administrator_mut()?;
        if !profile.managed_users.contains(&user_id) {
            profile.managed_users.push(user_id);
        }
        Ok(())
    }

    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless the account may manage class content.
    pub fn assign_class(&mut self, class: &str) -> Result<(), AuthError> {
        self.authorize(Capability::ManageClassContent)?;
        let profile = self.teacher_mut()?;
        push_unique(&mut profile.classes, class);
        Ok(())
    }

    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless the account may create
    /// assignments, or `AuthError::InvalidFormat` when the title is blank.
    pub fn create_assignment(
        &mut self,
        title: &str,
        class: &str,
        due: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<&Assignment, AuthError> {
        self.authorize(Capability::CreateAssignment)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(AuthError::InvalidFormat {
                reasons: vec!["Assignment title is required".to_string()],
            });
        }
        let profile = self.teacher_mut()?;
        profile.assignments.push(Assignment {
            title: title.to_string(),
            class: class.to_string(),
            due,
            created_at: now,
        });
        profile
            .assignments
            .last()
            .ok_or_else(|| AuthError::Internal("assignment was not stored".to_string()))
    }

    /// Record a grade on a student's profile.
    ///
    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless this account may submit
    /// grades and `student` is a student.
    pub fn record_grade(
        &self,
        student: &mut UserAccount,
        subject: &str,
        grade: &str,
    ) -> Result<(), AuthError> {
        self.authorize(Capability::SubmitGrades)?;
        let RoleProfile::Student(profile) = &mut student.profile else {
            return Err(AuthError::denied("grades can only be recorded for students"));
        };
        profile
            .grades
            .insert(subject.to_string(), grade.to_string());
        Ok(())
    }

    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless the account may submit assignments.
    pub fn submit_assignment(
        &mut self,
        assignment: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        self.authorize(Capability::SubmitAssignments)?;
        let profile = self.student_mut()?;
        profile.submissions.push(Submission {
            assignment: assignment.to_string(),
            content: content.to_string(),
            submitted_at: now,
        });
        Ok(())
    }

    /// Enrolment is a self-service profile update.
    ///
    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless the account may update its profile.
    pub fn enroll(&mut self, class: &str) -> Result<(), AuthError> {
        self.authorize(Capability::UpdateProfile)?;
        let profile = self.student_mut()?;
        push_unique(&mut profile.classes, class);
        Ok(())
    }

    /// # Errors
    /// Returns `AuthError::AuthorizationDenied` unless the account may view grades.
    pub fn grades(&self) -> Result<&BTreeMap<String, String>, AuthError> {
        self.authorize(Capability::ViewGrades)?;
        match &self.profile {
            RoleProfile::Student(profile) => Ok(&profile.grades),
            _ => Err(wrong_profile(self.role())),
        }
    }

    fn administrator_mut(&mut self) -> Result<&mut AdministratorProfile, AuthError> {
        let role = self.role();
        match &mut self.profile {
            RoleProfile::Administrator(profile) => Ok(profile),
            _ => Err(wrong_profile(role)),
        }
    }

    fn teacher_mut(&mut self) -> Result<&mut TeacherProfile, AuthError> {
        let role = self.role();
        match &mut self.profile {
            RoleProfile::Teacher(profile) => Ok(profile),
            _ => Err(wrong_profile(role)),
        }
    }

    fn student_mut(&mut self) -> Result<&mut StudentProfile, AuthError> {
        let role = self.role();
        match &mut self.profile {
            RoleProfile::Student(profile) => Ok(profile),
            _ => Err(wrong_profile(role)),
        }
    }
}

fn wrong_profile(role: Role) -> AuthError {
    AuthError::denied(format!("action is not available to the '{role}' role"))
}

fn push_unique(classes: &mut Vec<ClassRef>, class: &str) {
    if !classes.iter().any(|existing| existing == class) {
        classes.push(class.to_string());
    }
}
