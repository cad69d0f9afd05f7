//! User management on behalf of an authenticated actor.
//!
//! Every operation takes the acting account and checks its capabilities
//! before touching the directory. `bootstrap` is the one exception: it only
//! succeeds while the directory holds no administrator.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::AuthenticationEngine;
use crate::directory::{normalize_email, UserPatch, UserRecord};
use crate::error::AuthError;
use crate::identity::{Identity, ProfileDetails, UserAccount, UserId};
use crate::permission::{Capability, Role};

/// Input for a new account. `role` is the untyped name as entered.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub display_name: String,
    pub details: ProfileDetails,
}

pub struct UserAdministration {
    auth: Arc<AuthenticationEngine>,
}

impl UserAdministration {
    #[must_use]
    pub fn new(auth: Arc<AuthenticationEngine>) -> Self {
        Self { auth }
    }

    /// Create the first administrator.
    ///
    /// # Errors
    /// `AuthorizationDenied` once any administrator exists, otherwise the
    /// same validation outcomes as `create_user`.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub fn bootstrap(&self, mut new_user: NewUser) -> Result<UserAccount, AuthError> {
        let has_admin = self
            .auth
            .directory()
            .list()?
            .iter()
            .any(|record| record.identity.role() == Role::Administrator);
        if has_admin {
            return Err(AuthError::denied("an administrator already exists"));
        }
        new_user.role = Role::Administrator.to_string();
        let account = self.register(new_user)?;
        info!(user_id = account.id(), "bootstrap administrator created");
        Ok(account)
    }

    /// # Errors
    /// `AuthorizationDenied` unless `actor` may create users; `InvalidFormat`,
    /// `WeakPassword` or `DuplicateUser` for bad input.
    #[instrument(skip(self, actor, new_user), fields(actor = actor.id()))]
    pub fn create_user(
        &self,
        actor: &mut UserAccount,
        new_user: NewUser,
    ) -> Result<UserAccount, AuthError> {
        actor.authorize(Capability::CreateUser)?;
        let account = self.register(new_user)?;
        actor.manage_user(account.id())?;
        self.auth
            .directory()
            .update(actor.id(), UserPatch::from_account(actor))?;
        info!(user_id = account.id(), role = %account.role(), "user created");
        Ok(account)
    }

    fn register(&self, new_user: NewUser) -> Result<UserAccount, AuthError> {
        let validator = self.auth.validator();
        let mut verdict = validator
            .validate_email(&new_user.email)
            .and(validator.validate_username(&new_user.username))
            .and(validator.validate_role(&new_user.role));
        if new_user.display_name.trim().is_empty() {
            verdict.accepted = false;
            verdict.reasons.push("Display name is required".to_string());
        }
        if !verdict.accepted {
            return Err(AuthError::InvalidFormat {
                reasons: verdict.reasons,
            });
        }

        let strength = validator.validate_password(&new_user.password);
        if !strength.accepted {
            return Err(AuthError::WeakPassword {
                reasons: strength.reasons,
            });
        }

        let mut identity = Identity::with_role_name(
            0,
            new_user.username.trim().to_string(),
            normalize_email(&new_user.email),
            &new_user.role,
            new_user.display_name.trim().to_string(),
            self.auth.clock().now(),
        )
        .map_err(|err| AuthError::InvalidFormat {
            reasons: vec![err.to_string()],
        })?;
        identity.details = new_user.details;

        let hash = self.auth.hash_password(&new_user.password)?;
        let id = self.auth.directory().add(UserRecord::new(identity, hash))?;
        self.auth.account(id)
    }

    /// Replace contact details. Allowed for the account itself when its role
    /// may update its own profile, or for any account with `update_user`.
    ///
    /// # Errors
    /// `AuthorizationDenied` or `UserNotFound`.
    pub fn update_profile(
        &self,
        actor: &UserAccount,
        user_id: UserId,
        details: ProfileDetails,
    ) -> Result<UserAccount, AuthError> {
        let own = actor.id() == user_id && actor.can(Capability::UpdateProfile);
        if !own {
            actor.authorize(Capability::UpdateUser)?;
        }
        self.auth.directory().update(
            user_id,
            UserPatch {
                details: Some(details),
                ..UserPatch::default()
            },
        )?;
        self.auth.account(user_id)
    }

    /// # Errors
    /// `AuthorizationDenied` unless `actor` may delete users and `user_id` is
    /// not the actor; `UserNotFound` for unknown ids.
    #[instrument(skip(self, actor), fields(actor = actor.id()))]
    pub fn delete_user(&self, actor: &UserAccount, user_id: UserId) -> Result<(), AuthError> {
        actor.authorize(Capability::DeleteUser)?;
        if actor.id() == user_id {
            return Err(AuthError::denied("an account cannot delete itself"));
        }
        self.auth.directory().delete(user_id)?;
        info!(user_id, "user deleted");
        Ok(())
    }

    /// # Errors
    /// `AuthorizationDenied` unless `actor` may view all data.
    pub fn list_users(&self, actor: &UserAccount) -> Result<Vec<UserAccount>, AuthError> {
        actor.authorize(Capability::ViewAllData)?;
        self.auth
            .directory()
            .list()?
            .iter()
            .map(|record| {
                UserAccount::from_record(record).map_err(|err| AuthError::Internal(err.to_string()))
            })
            .collect()
    }

    /// # Errors
    /// `AuthorizationDenied`, `UserNotFound` or `WeakPassword`.
    pub fn reset_password(
        &self,
        actor: &UserAccount,
        email: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        actor.authorize(Capability::UpdateUser)?;
        self.auth.reset_password(email, new_password)
    }

    /// Clear the lockout record for `email`.
    ///
    /// # Errors
    /// `AuthorizationDenied` unless `actor` may manage users.
    pub fn unlock(&self, actor: &UserAccount, email: &str) -> Result<(), AuthError> {
        actor.authorize(Capability::ManageUsers)?;
        self.auth.clear_attempts(email);
        info!("lockout cleared for {}", normalize_email(email));
        Ok(())
    }

    /// Look up another account. Teachers may only see students.
    ///
    /// # Errors
    /// `AuthorizationDenied` or `UserNotFound`.
    pub fn find_account_by_email(
        &self,
        actor: &UserAccount,
        email: &str,
    ) -> Result<UserAccount, AuthError> {
        if actor.can(Capability::ViewAllData) {
            return self.auth.account_by_email(email);
        }
        actor.authorize(Capability::ViewStudents)?;
        let account = self.auth.account_by_email(email)?;
        if account.role() != Role::Student {
            return Err(AuthError::denied("only student records are visible"));
        }
        Ok(account)
    }

    /// Persist the mutable state of `account`, e.g. after a role action.
    ///
    /// # Errors
    /// `AuthorizationDenied` unless `account` is the actor, the actor may
    /// update any user, or the actor may update student records and
    /// `account` is a student.
    pub fn save_account(&self, actor: &UserAccount, account: &UserAccount) -> Result<(), AuthError> {
        let allowed = actor.id() == account.id()
            || actor.can(Capability::UpdateUser)
            || (actor.can(Capability::UpdateRecords) && account.role() == Role::Student);
        if !allowed {
            return Err(AuthError::denied(format!(
                "role '{}' cannot update this account",
                actor.role()
            )));
        }
        self.auth
            .directory()
            .update(account.id(), UserPatch::from_account(account))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialHasher;
    use crate::clock::SystemClock;
    use crate::config::AuthConfig;
    use crate::directory::MemoryStore;
    use crate::identity::RoleProfile;
    use crate::validator::DefaultValidator;
    use anyhow::Result;

    fn admin_service() -> Result<(UserAdministration, Arc<AuthenticationEngine>)> {
        let auth = Arc::new(
            AuthenticationEngine::new(
                Arc::new(MemoryStore::new()),
                Arc::new(DefaultValidator),
                Arc::new(SystemClock),
                &AuthConfig::new(),
            )
            .with_hasher(CredentialHasher::default().with_params(8, 1, 1)?),
        );
        Ok((UserAdministration::new(auth.clone()), auth))
    }

    fn new_user(username: &str, email: &str, role: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            role: role.to_string(),
            display_name: username.to_uppercase(),
            details: ProfileDetails::default(),
        }
    }

    #[test]
    fn bootstrap_only_once() -> Result<()> {
        let (admin, _) = admin_service()?;
        let root = admin.bootstrap(new_user("root", "Root@School.test", "student"))?;
        assert_eq!(root.role(), Role::Administrator);
        assert_eq!(root.identity().email(), "root@school.test");
        assert!(matches!(
            admin.bootstrap(new_user("root2", "root2@school.test", "administrator")),
            Err(AuthError::AuthorizationDenied { .. })
        ));
        Ok(())
    }

    #[test]
    fn create_user_tracks_managed_users() -> Result<()> {
        let (admin, auth) = admin_service()?;
        let mut root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;
        let teacher = admin.create_user(&mut root, new_user("ms_t", "t@school.test", "teacher"))?;
        assert_eq!(teacher.role(), Role::Teacher);

        let stored = auth.account(root.id())?;
        let RoleProfile::Administrator(profile) = stored.profile() else {
            anyhow::bail!("administrator profile expected");
        };
        assert_eq!(profile.managed_users, vec![teacher.id()]);

        assert!(auth.authenticate("t@school.test", "secret1", "teacher").is_ok());
        Ok(())
    }

    #[test]
    fn create_user_rejects_bad_input() -> Result<()> {
        let (admin, _) = admin_service()?;
        let mut root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;

        assert!(matches!(
            admin.create_user(&mut root, new_user("x", "nope", "janitor")),
            Err(AuthError::InvalidFormat { reasons }) if reasons.len() == 3
        ));

        let mut weak = new_user("weak", "weak@school.test", "student");
        weak.password = "123".to_string();
        assert!(matches!(
            admin.create_user(&mut root, weak),
            Err(AuthError::WeakPassword { .. })
        ));

        assert_eq!(
            admin
                .create_user(&mut root, new_user("other", "ROOT@school.test", "student"))
                .err(),
            Some(AuthError::DuplicateUser)
        );
        Ok(())
    }

    #[test]
    fn non_administrators_cannot_manage_users() -> Result<()> {
        let (admin, _) = admin_service()?;
        let mut root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;
        let mut teacher =
            admin.create_user(&mut root, new_user("ms_t", "t@school.test", "teacher"))?;
        assert!(matches!(
            admin.create_user(&mut teacher, new_user("kid", "kid@school.test", "student")),
            Err(AuthError::AuthorizationDenied { .. })
        ));
        assert!(admin.list_users(&teacher).is_err());
        assert!(admin.delete_user(&teacher, root.id()).is_err());
        Ok(())
    }

    #[test]
    fn delete_user_refuses_self() -> Result<()> {
        let (admin, auth) = admin_service()?;
        let mut root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;
        let kid = admin.create_user(&mut root, new_user("kid", "kid@school.test", "student"))?;
        assert!(admin.delete_user(&root, root.id()).is_err());
        admin.delete_user(&root, kid.id())?;
        assert_eq!(auth.account(kid.id()).err(), Some(AuthError::UserNotFound));
        assert_eq!(admin.list_users(&root)?.len(), 1);
        Ok(())
    }

    #[test]
    fn students_update_only_their_own_profile() -> Result<()> {
        let (admin, _) = admin_service()?;
        let mut root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;
        let kid = admin.create_user(&mut root, new_user("kid", "kid@school.test", "student"))?;
        let details = ProfileDetails {
            phone: Some("555-0101".to_string()),
            ..ProfileDetails::default()
        };
        let updated = admin.update_profile(&kid, kid.id(), details.clone())?;
        assert_eq!(updated.identity().details, details);
        assert!(admin
            .update_profile(&kid, root.id(), ProfileDetails::default())
            .is_err());
        Ok(())
    }

    #[test]
    fn teacher_grades_are_persisted() -> Result<()> {
        let (admin, auth) = admin_service()?;
        let mut root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;
        let teacher = admin.create_user(&mut root, new_user("ms_t", "t@school.test", "teacher"))?;
        admin.create_user(&mut root, new_user("kid", "kid@school.test", "student"))?;

        let mut kid = admin.find_account_by_email(&teacher, "kid@school.test")?;
        teacher.record_grade(&mut kid, "math", "A")?;
        admin.save_account(&teacher, &kid)?;

        let reloaded = auth.account(kid.id())?;
        assert_eq!(reloaded.grades()?.get("math").map(String::as_str), Some("A"));
        assert!(admin.find_account_by_email(&teacher, "root@school.test").is_err());
        Ok(())
    }

    #[test]
    fn unlock_clears_lockout() -> Result<()> {
        let (admin, auth) = admin_service()?;
        let root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;
        for _ in 0..5 {
            let _ = auth.authenticate("root@school.test", "wrong-one", "administrator");
        }
        assert!(auth.attempts_for("root@school.test").is_some());
        admin.unlock(&root, "ROOT@school.test")?;
        assert!(auth.attempts_for("root@school.test").is_none());
        assert!(auth
            .authenticate("root@school.test", "secret1", "administrator")
            .is_ok());
        Ok(())
    }

    #[test]
    fn reset_password_requires_update_user() -> Result<()> {
        let (admin, auth) = admin_service()?;
        let mut root = admin.bootstrap(new_user("root", "root@school.test", "administrator"))?;
        let kid = admin.create_user(&mut root, new_user("kid", "kid@school.test", "student"))?;
        assert!(admin.reset_password(&kid, "root@school.test", "hijack1").is_err());
        admin.reset_password(&root, "kid@school.test", "newpass1")?;
        assert!(auth.authenticate("kid@school.test", "newpass1", "student").is_ok());
        Ok(())
    }
}
