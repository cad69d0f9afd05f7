use clap::{Arg, Command};

use super::session::{email_arg, password_arg, ARG_PASSWORD, ARG_ROLE};

pub const CMD_BOOTSTRAP: &str = "bootstrap";
pub const CMD_USER: &str = "user";
pub const CMD_USER_ADD: &str = "add";
pub const CMD_USER_LIST: &str = "list";
pub const CMD_USER_DELETE: &str = "delete";
pub const CMD_USER_RESET_PASSWORD: &str = "reset-password";

pub const ARG_USERNAME: &str = "username";
pub const ARG_DISPLAY_NAME: &str = "display-name";
pub const ARG_ID: &str = "id";

fn new_user_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USERNAME)
                .short('u')
                .long(ARG_USERNAME)
                .help("Login name, 3-32 characters of letters, digits, '.', '_' or '-'")
                .required(true),
        )
        .arg(email_arg())
        .arg(password_arg(
            ARG_PASSWORD,
            "CLASSGATE_PASSWORD",
            "Initial password",
        ))
        .arg(
            Arg::new(ARG_DISPLAY_NAME)
                .short('n')
                .long(ARG_DISPLAY_NAME)
                .help("Name shown to other users")
                .required(true),
        )
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(new_user_args(
            Command::new(CMD_BOOTSTRAP).about("Create the first administrator account"),
        ))
        .subcommand(
            Command::new(CMD_USER)
                .about("Manage accounts (requires a signed-in administrator)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    new_user_args(Command::new(CMD_USER_ADD).about("Create an account")).arg(
                        Arg::new(ARG_ROLE)
                            .short('r')
                            .long(ARG_ROLE)
                            .help("administrator, teacher or student")
                            .required(true),
                    ),
                )
                .subcommand(Command::new(CMD_USER_LIST).about("List all accounts"))
                .subcommand(
                    Command::new(CMD_USER_DELETE).about("Delete an account").arg(
                        Arg::new(ARG_ID)
                            .help("User id")
                            .required(true)
                            .value_parser(clap::value_parser!(u64)),
                    ),
                )
                .subcommand(
                    Command::new(CMD_USER_RESET_PASSWORD)
                        .about("Set a new password without the old one")
                        .arg(email_arg())
                        .arg(password_arg(
                            ARG_PASSWORD,
                            "CLASSGATE_PASSWORD",
                            "New password",
                        )),
                ),
        )
}
