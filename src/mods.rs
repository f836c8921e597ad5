use crate::error::ModError;
use crate::models::ServerModOverride;
use std::collections::HashSet;

/// Normalized form of a mod id: surrounding whitespace removed, ASCII digits only.
pub fn validate_mod_id(id: &str) -> Result<String, ModError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ModError::InvalidId(id.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Appends `id` unless already present. Returns whether the list changed.
pub fn add_mod(mods: &mut Vec<String>, id: &str) -> Result<bool, ModError> {
    let id = validate_mod_id(id)?;
    if mods.contains(&id) {
        return Ok(false);
    }
    mods.push(id);
    Ok(true)
}

pub fn remove_mod(mods: &mut Vec<String>, id: &str) -> bool {
    let before = mods.len();
    let id = id.trim();
    mods.retain(|existing| existing != id);
    mods.len() != before
}

/// Effective mod list for one server: shared mods first, then extras not already shared.
/// With `exclude_shared_mods` only the server's own mods apply.
pub fn resolve(global_mods: &[String], server: Option<&ServerModOverride>) -> Vec<String> {
    let Some(server) = server else {
        return dedupe_mod_ids(global_mods);
    };

    if server.exclude_shared_mods {
        return dedupe_mod_ids(&server.additional_mods);
    }

    let mut result = dedupe_mod_ids(global_mods);
    let mut seen: HashSet<String> = result.iter().cloned().collect();
    for id in &server.additional_mods {
        if seen.insert(id.clone()) {
            result.push(id.clone());
        }
    }
    result
}

pub fn dedupe_mod_ids(mod_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for id in mod_ids {
        if seen.insert(id.clone()) {
            result.push(id.clone());
        }
    }
    result
}

/// Accepts a bare numeric id or a mod page URL carrying one
/// (`...filedetails/?id=123` or `.../projects/123`).
pub fn parse_mod_id_input(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        return extract_mod_id_from_url(trimmed);
    }
    validate_mod_id(trimmed).ok()
}

pub fn extract_mod_id_from_url(url: &str) -> Option<String> {
    let re = regex::Regex::new(r"(?:[?&]id=|/projects/)(\d+)").ok()?;
    re.captures(url)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
}

/// Bulk entry: comma or newline separated ids or URLs. Rejects the whole input on the
/// first malformed entry so nothing is half-applied.
pub fn parse_mod_ids(input: &str) -> Result<Vec<String>, ModError> {
    let mut ids = Vec::new();
    for value in input
        .lines()
        .flat_map(|line| line.split(','))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
    {
        let id = parse_mod_id_input(value).ok_or_else(|| ModError::InvalidId(value.to_string()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
