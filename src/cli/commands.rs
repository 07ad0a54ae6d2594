use clap::Subcommand;

use crate::types::UserId;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the database and bootstrap the administrative group
    Init {
        /// Administrative group that manages itself
        #[arg(long, default_value = "admin")]
        group: String,
    },

    /// Show groups, grants and management edges
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List every group
    List,

    /// Show a group's members, commands and management edges
    Show {
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a group
    Create {
        name: String,

        /// Group that will manage the new group
        #[arg(long)]
        parent: Option<String>,

        /// Act as this user instead of the override user
        #[arg(long = "as")]
        actor: Option<UserId>,
    },

    /// Add a user to a group
    AddMember {
        group: String,
        user: UserId,

        /// Only the override user may protect a membership
        #[arg(long)]
        protected: bool,

        #[arg(long = "as")]
        actor: Option<UserId>,
    },

    /// Remove a user from a group
    RemoveMember {
        group: String,
        user: UserId,

        #[arg(long = "as")]
        actor: Option<UserId>,
    },

    /// Allow a group to run a command
    Grant {
        group: String,

        /// Command path, e.g. `autolabel add`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,

        #[arg(long = "as")]
        actor: Option<UserId>,
    },

    /// Stop a group from running a command
    Revoke {
        group: String,

        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,

        #[arg(long = "as")]
        actor: Option<UserId>,
    },

    /// Let MANAGER administer MANAGED
    Manage {
        manager: String,
        managed: String,

        #[arg(long = "as")]
        actor: Option<UserId>,
    },

    /// Stop MANAGER from administering MANAGED
    Unmanage {
        manager: String,
        managed: String,

        #[arg(long = "as")]
        actor: Option<UserId>,
    },

    /// Delete a group with its memberships, grants and management edges
    Delete {
        name: String,

        #[arg(long = "as")]
        actor: Option<UserId>,
    },
}
