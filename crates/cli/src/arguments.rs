//! Command-line definition and parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use acl::{DEFAULT_GETFACL, DEFAULT_SETFACL};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::OsStringValueParser};

/// Program name used in usage text and diagnostics.
pub const PROGRAM_NAME: &str = "nfs4-share";

/// What to do with the share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create the share directory.
    Create {
        /// Accept an existing directory.
        exist_ok: bool,
    },
    /// Link files and mirror directories into the share.
    Add {
        /// Source paths.
        items: Vec<PathBuf>,
    },
    /// Append the deny-everyone entry recursively.
    Lock,
    /// Remove the deny-everyone entry recursively.
    Unlock,
    /// Print the share directory's ACL.
    Show,
    /// Unlock, un-share everything and remove the directory.
    Destroy {
        /// Remove files whose only link is in the share.
        force: bool,
    },
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// Program used to read ACLs.
    pub getfacl: PathBuf,
    /// Program used to write ACLs.
    pub setfacl: PathBuf,
    /// The share directory.
    pub share: PathBuf,
    /// The requested operation.
    pub action: Action,
}

fn path_arg(name: &'static str) -> Arg {
    Arg::new(name).value_parser(OsStringValueParser::new())
}

/// Builds the `clap` command used for parsing.
pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Share files and trees on an NFSv4 filesystem through hard links and ACLs.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase logging verbosity (repeatable). RUST_LOG takes precedence.")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            path_arg("getfacl")
                .long("getfacl")
                .value_name("PATH")
                .help("Program used to read ACLs.")
                .default_value(DEFAULT_GETFACL),
        )
        .arg(
            path_arg("setfacl")
                .long("setfacl")
                .value_name("PATH")
                .help("Program used to write ACLs.")
                .default_value(DEFAULT_SETFACL),
        )
        .arg(
            path_arg("share")
                .value_name("SHARE")
                .help("The share directory.")
                .required(true),
        )
        .subcommand(
            Command::new("create").about("Create the share directory.").arg(
                Arg::new("exist-ok")
                    .long("exist-ok")
                    .help("Succeed when the directory already exists.")
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(
            Command::new("add")
                .about("Link files and mirror directories into the share.")
                .arg(
                    path_arg("items")
                        .value_name("ITEM")
                        .help("Files or directories to share.")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(Command::new("lock").about("Deny changes to everyone, recursively."))
        .subcommand(Command::new("unlock").about("Lift the lock, recursively."))
        .subcommand(Command::new("show").about("Print the share directory's ACL."))
        .subcommand(
            Command::new("destroy")
                .about("Unlock, un-share everything and remove the share directory.")
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help("Also remove files whose only hard link is in the share.")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn os_path(matches: &ArgMatches, name: &str) -> PathBuf {
    matches
        .get_one::<OsString>(name)
        .map(PathBuf::from)
        .unwrap_or_default()
}

/// Parses the command line, program name included.
pub fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let matches = clap_command().try_get_matches_from(arguments)?;

    let action = match matches.subcommand() {
        Some(("create", sub)) => Action::Create {
            exist_ok: sub.get_flag("exist-ok"),
        },
        Some(("add", sub)) => Action::Add {
            items: sub
                .get_many::<OsString>("items")
                .map(|items| items.map(PathBuf::from).collect())
                .unwrap_or_default(),
        },
        Some(("lock", _)) => Action::Lock,
        Some(("unlock", _)) => Action::Unlock,
        Some(("show", _)) => Action::Show,
        Some(("destroy", sub)) => Action::Destroy {
            force: sub.get_flag("force"),
        },
        _ => {
            return Err(clap_command().error(
                clap::error::ErrorKind::MissingSubcommand,
                "a command is required",
            ));
        }
    };

    Ok(ParsedArgs {
        verbosity: matches.get_count("verbose"),
        getfacl: os_path(&matches, "getfacl"),
        setfacl: os_path(&matches, "setfacl"),
        share: os_path(&matches, "share"),
        action,
    })
}
