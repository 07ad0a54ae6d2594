use std::path::Path;

use serde::Serialize;

use super::open_warden;
use crate::types::GroupDetails;

pub fn run_init(config_path: Option<&Path>, group: &str) -> anyhow::Result<()> {
    let (config, warden) = open_warden(config_path)?;
    let membership = warden.bootstrap(group)?;

    println!();
    println!("Database ready at {}", config.store.path.display());
    println!(
        "User {} holds a protected membership in \"{}\"",
        membership.user_id, membership.group_name
    );
    println!();

    Ok(())
}

#[derive(Serialize)]
struct Info {
    groups: Vec<GroupDetails>,
}

pub fn run_info(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let (_, warden) = open_warden(config_path)?;

    let groups = warden
        .list_groups()?
        .into_iter()
        .map(|group| warden.group_details(&group.name))
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&Info { groups })?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No groups. Run 'hallpass admin init' first.");
        return Ok(());
    }

    for details in &groups {
        println!("{}", details.group.name);
        println!("  members:  {}", details.members.len());
        println!("  commands: {}", details.commands.join(", "));
        println!("  manages:  {}", details.can_manage.join(", "));
    }

    Ok(())
}
