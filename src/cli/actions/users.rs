use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use super::{emit, outcome, Services};
use crate::admin::NewUser;
use crate::cli::globals::GlobalArgs;
use crate::identity::{ProfileDetails, UserAccount};

#[derive(Debug)]
pub struct NewUserArgs {
    pub globals: GlobalArgs,
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub display_name: String,
    pub role: String,
}

impl NewUserArgs {
    fn new_user(&self) -> NewUser {
        NewUser {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.expose_secret().to_string(),
            role: self.role.clone(),
            display_name: self.display_name.clone(),
            details: ProfileDetails::default(),
        }
    }
}

fn summary(account: &UserAccount) -> String {
    let identity = account.identity();
    format!(
        "{:>4}  {:<13} {:<20} {}",
        identity.id(),
        identity.role(),
        identity.username(),
        identity.email()
    )
}

pub(super) fn bootstrap(args: NewUserArgs) -> Result<()> {
    let services = Services::open(&args.globals);
    let account = outcome(services.admin.bootstrap(args.new_user()))?;
    emit(&args.globals, &account, || {
        format!("Created administrator\n{}", summary(&account))
    })
}

pub(super) fn add(args: NewUserArgs) -> Result<()> {
    let services = Services::open(&args.globals);
    let mut actor = outcome(services.sessions.current_account())?;
    let account = outcome(services.admin.create_user(&mut actor, args.new_user()))?;
    emit(&args.globals, &account, || {
        format!("Created user\n{}", summary(&account))
    })
}

pub(super) fn list(globals: &GlobalArgs) -> Result<()> {
    let services = Services::open(globals);
    let actor = outcome(services.sessions.current_account())?;
    let accounts = outcome(services.admin.list_users(&actor))?;
    emit(globals, &accounts, || {
        accounts
            .iter()
            .map(summary)
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub(super) fn delete(globals: &GlobalArgs, id: u64) -> Result<()> {
    let services = Services::open(globals);
    let actor = outcome(services.sessions.current_account())?;
    outcome(services.admin.delete_user(&actor, id))?;
    emit(globals, &serde_json::json!({ "deleted": id }), || {
        format!("Deleted user {id}")
    })
}
