use std::path::Path;

use super::{GroupCommands, open_warden, resolve_actor};

pub fn run_group(config_path: Option<&Path>, command: GroupCommands) -> anyhow::Result<()> {
    let (_, warden) = open_warden(config_path)?;

    match command {
        GroupCommands::List => {
            for group in warden.list_groups()? {
                println!("{}", group.name);
            }
        }
        GroupCommands::Show { name, json } => {
            let details = warden.group_details(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else {
                println!("{}", details.group.name);
                for member in &details.members {
                    let flag = if member.protected { " (protected)" } else { "" };
                    println!("  member {}{flag}", member.user_id);
                }
                for command in &details.commands {
                    println!("  may run \"{command}\"");
                }
                for managed in &details.can_manage {
                    println!("  manages {managed}");
                }
                for manager in &details.is_managed_by {
                    println!("  managed by {manager}");
                }
            }
        }
        GroupCommands::Create {
            name,
            parent,
            actor,
        } => {
            let actor = resolve_actor(&warden, actor)?;
            warden.create_group(actor, &name, parent.as_deref())?;
            println!("Created group \"{name}\"");
        }
        GroupCommands::AddMember {
            group,
            user,
            protected,
            actor,
        } => {
            let actor = resolve_actor(&warden, actor)?;
            warden.add_member(actor, user, &group, protected)?;
            println!("Added user {user} to \"{group}\"");
        }
        GroupCommands::RemoveMember { group, user, actor } => {
            let actor = resolve_actor(&warden, actor)?;
            warden.remove_member(actor, user, &group)?;
            println!("Removed user {user} from \"{group}\"");
        }
        GroupCommands::Grant {
            group,
            command,
            actor,
        } => {
            let actor = resolve_actor(&warden, actor)?;
            let command = command.join(" ");
            if warden.grant_command(actor, &group, &command)? {
                println!("\"{group}\" may now run \"{command}\"");
            } else {
                println!("\"{group}\" could already run \"{command}\"");
            }
        }
        GroupCommands::Revoke {
            group,
            command,
            actor,
        } => {
            let actor = resolve_actor(&warden, actor)?;
            let command = command.join(" ");
            if warden.revoke_command(actor, &group, &command)? {
                println!("\"{group}\" may no longer run \"{command}\"");
            } else {
                println!("\"{group}\" could not run \"{command}\"");
            }
        }
        GroupCommands::Manage {
            manager,
            managed,
            actor,
        } => {
            let actor = resolve_actor(&warden, actor)?;
            warden.add_management_edge(actor, &manager, &managed)?;
            println!("\"{manager}\" now manages \"{managed}\"");
        }
        GroupCommands::Unmanage {
            manager,
            managed,
            actor,
        } => {
            let actor = resolve_actor(&warden, actor)?;
            if warden.remove_management_edge(actor, &manager, &managed)? {
                println!("\"{manager}\" no longer manages \"{managed}\"");
            } else {
                println!("\"{manager}\" did not manage \"{managed}\"");
            }
        }
        GroupCommands::Delete { name, actor } => {
            let actor = resolve_actor(&warden, actor)?;
            warden.delete_group(actor, &name)?;
            println!("Deleted group \"{name}\"");
        }
    }

    Ok(())
}
