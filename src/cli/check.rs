use std::path::Path;

use super::open_warden;
use crate::types::UserId;

/// Prints the decision; a denial is reported as an error so the exit status
/// reflects it.
pub fn run_check(
    config_path: Option<&Path>,
    user: UserId,
    command: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let (_, warden) = open_warden(config_path)?;
    let command = command.join(" ");
    let decision = warden.check_command(user, &command)?;

    if json {
        println!("{}", serde_json::to_string(&decision)?);
    }

    match decision.denial_message() {
        None => {
            if !json {
                println!("User {user} may run \"{command}\"");
            }
            Ok(())
        }
        Some(message) => anyhow::bail!(message),
    }
}
