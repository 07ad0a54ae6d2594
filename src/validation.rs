use crate::error::{Error, Result};

const MAX_GROUP_NAME_LEN: usize = 64;
const MAX_COMMAND_NAME_LEN: usize = 100;

fn validate_name(
    name: &str,
    entity: &str,
    max_len: usize,
    allow_space: bool,
) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err(format!("{entity} name cannot be empty"));
    }
    if name.len() > max_len {
        return Err(format!("{entity} name cannot exceed {max_len} characters"));
    }
    let valid_char =
        |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || (allow_space && c == ' ');
    if !name.chars().all(valid_char) {
        let mut allowed = "alphanumeric characters, hyphens, and underscores".to_string();
        if allow_space {
            allowed.push_str(", and spaces");
        }
        return Err(format!("{entity} name can only contain {allowed}"));
    }
    if name.starts_with([' ', '-', '_']) || name.ends_with(' ') || name.contains("  ") {
        return Err(format!(
            "{entity} name cannot start with a hyphen, underscore or space, or contain stray spaces"
        ));
    }
    Ok(())
}

pub fn validate_group_name(name: &str) -> Result<()> {
    validate_name(name, "Group", MAX_GROUP_NAME_LEN, false).map_err(Error::InvalidName)
}

/// Subcommands are addressed by their full path, e.g. `autolabel add`.
pub fn validate_command_name(name: &str) -> Result<()> {
    validate_name(name, "Command", MAX_COMMAND_NAME_LEN, true).map_err(Error::InvalidName)
}
