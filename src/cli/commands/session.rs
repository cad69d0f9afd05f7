use clap::{Arg, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_SESSION: &str = "session";
pub const CMD_EXTEND: &str = "extend";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_PASSWD: &str = "passwd";
pub const CMD_PERMISSIONS: &str = "permissions";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_ROLE: &str = "role";
pub const ARG_MINUTES: &str = "minutes";
pub const ARG_CURRENT_PASSWORD: &str = "current-password";
pub const ARG_NEW_PASSWORD: &str = "new-password";

pub(super) fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Account email")
        .required(true)
}

pub(super) fn password_arg(id: &'static str, env: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .env(env)
        .hide_env_values(true)
        .required(true)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Authenticate and open a session")
                .arg(email_arg())
                .arg(password_arg(
                    ARG_PASSWORD,
                    "CLASSGATE_PASSWORD",
                    "Account password",
                ))
                .arg(
                    Arg::new(ARG_ROLE)
                        .short('r')
                        .long(ARG_ROLE)
                        .help("Role to sign in as: administrator, teacher or student")
                        .required(true),
                ),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Destroy the current session"))
        .subcommand(
            Command::new(CMD_SESSION).about("Validate and renew the current session"),
        )
        .subcommand(
            Command::new(CMD_EXTEND)
                .about("Reset the session expiry to the base timeout plus extra minutes")
                .arg(
                    Arg::new(ARG_MINUTES)
                        .help("Additional minutes")
                        .default_value("0")
                        .value_parser(clap::value_parser!(i64).range(0..=24 * 60)),
                ),
        )
        .subcommand(Command::new(CMD_WHOAMI).about("Show the account behind the session"))
        .subcommand(
            Command::new(CMD_PASSWD)
                .about("Change the password of the signed-in account")
                .arg(password_arg(
                    ARG_CURRENT_PASSWORD,
                    "CLASSGATE_CURRENT_PASSWORD",
                    "Current password",
                ))
                .arg(password_arg(
                    ARG_NEW_PASSWORD,
                    "CLASSGATE_NEW_PASSWORD",
                    "New password",
                )),
        )
        .subcommand(
            Command::new(CMD_PERMISSIONS)
                .about("List capabilities of a role, or of the signed-in account")
                .arg(
                    Arg::new(ARG_ROLE)
                        .short('r')
                        .long(ARG_ROLE)
                        .help("Role to describe instead of the signed-in account"),
                ),
        )
}
