//! Type-safe startup script contracts.
//!
//! Nodes run shell scripts checked out from the profile repository when they
//! boot. Instead of concatenating command strings, each script is a Rust
//! struct implementing [`StartupScript`], so flag and argument order live in
//! one place.
//!
//! # Invariants
//!
//! - Scripts are referenced by fixed paths under [`REPOSITORY_DIR`].
//! - `to_cli_args()` returns arguments exactly as the script expects them.
//! - Worker steps handed to the configure script also implement
//!   [`DirectiveScript`]; its `directive_key()` is the variable the configure
//!   script reads to find the command for that step.

/// Where the portal checks out the profile repository on every node
pub const REPOSITORY_DIR: &str = "/local/repository";

/// Absolute path of a script in the repository's `scripts/` directory
pub fn script_path(name: &str) -> String {
    format!("{}/scripts/{}", REPOSITORY_DIR, name)
}

/// Trait for typed startup commands.
///
/// # Example
///
/// ```
/// use clusterspec::script_traits::StartupScript;
/// use clusterspec::scripts::cluster::IsolateCpusArgs;
///
/// let args = IsolateCpusArgs { count: 4 };
/// assert_eq!(args.command_line(), "/local/repository/scripts/isolcpus.sh 4");
/// ```
pub trait StartupScript {
    /// Program to execute, usually a [`script_path`].
    fn program(&self) -> String;

    /// Convert struct fields to CLI arguments.
    fn to_cli_args(&self) -> Vec<String>;

    /// Program followed by its arguments, space separated.
    fn command_line(&self) -> String {
        std::iter::once(self.program())
            .chain(self.to_cli_args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A startup step passed to the configure script as a `KEY="command"` token.
///
/// ```
/// use clusterspec::script_traits::DirectiveScript;
/// use clusterspec::scripts::cluster::IsolateCpusArgs;
///
/// let args = IsolateCpusArgs { count: 4 };
/// assert_eq!(args.to_directive(), "ISOLCPUS=\"/local/repository/scripts/isolcpus.sh 4\"");
/// ```
pub trait DirectiveScript: StartupScript {
    /// Variable name under which the configure script receives this command.
    fn directive_key(&self) -> &'static str;

    /// `KEY="command"` token for the worker configuration.
    fn to_directive(&self) -> String {
        format!("{}=\"{}\"", self.directive_key(), self.command_line())
    }
}
