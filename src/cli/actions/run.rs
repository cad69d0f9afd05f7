use anyhow::Result;

use super::{password, session, users, Action};

pub(super) fn execute(action: Action) -> Result<()> {
    match action {
        Action::Bootstrap(args) => users::bootstrap(args),
        Action::Login(args) => session::login(args),
        Action::Logout(globals) => session::logout(&globals),
        Action::Session(globals) => session::show(&globals),
        Action::Extend { globals, minutes } => session::extend(&globals, minutes),
        Action::Whoami(globals) => session::whoami(&globals),
        Action::Passwd(args) => password::change(args),
        Action::Permissions { globals, role } => session::permissions(&globals, role),
        Action::UserAdd(args) => users::add(args),
        Action::UserList(globals) => users::list(&globals),
        Action::UserDelete { globals, id } => users::delete(&globals, id),
        Action::UserResetPassword(args) => password::reset(args),
    }
}
