//! Path-group policy: which profile fields are sealed, and how.
//!
//! The policy is either the built-in profile policy or a YAML file:
//!
//! ```yaml
//! groups:
//!   - name: contact
//!     paths: [email, birth_year]
//!   - name: legacy
//!     mode: block
//!     optional: true
//!     paths: [companies.salary]
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use fieldcrypt::{CipherMode, PathGroup};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GroupEntry {
    name: String,
    #[serde(default)]
    mode: CipherMode,
    #[serde(default)]
    optional: bool,
    paths: Vec<String>,
}

/// The built-in profile policy.
pub fn default_groups() -> Result<Vec<PathGroup>> {
    Ok(vec![
        PathGroup::new("contact", ["email", "birth_year"])?,
        PathGroup::new("contact-optional", ["phone"])?.optional(),
        PathGroup::new("employment", ["companies.position", "companies.salary"])?.optional(),
    ])
}

/// Load a policy from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe a valid
/// policy.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<PathGroup>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read path group file {}", path.display()))?;
    from_yaml(&text).with_context(|| format!("invalid path group file {}", path.display()))
}

/// Parse a policy from YAML text.
///
/// # Errors
///
/// Returns an error for malformed YAML, an empty policy, duplicate group
/// names, groups without paths, or invalid paths.
pub fn from_yaml(text: &str) -> Result<Vec<PathGroup>> {
    let file: PolicyFile = serde_yaml::from_str(text).context("failed to parse YAML")?;
    if file.groups.is_empty() {
        anyhow::bail!("policy must define at least one group");
    }

    let mut names = HashSet::new();
    file.groups
        .into_iter()
        .map(|entry| -> Result<PathGroup> {
            if !names.insert(entry.name.clone()) {
                anyhow::bail!("duplicate group name {:?}", entry.name);
            }
            if entry.paths.is_empty() {
                anyhow::bail!("group {:?} has no paths", entry.name);
            }
            let group = PathGroup::new(entry.name.as_str(), &entry.paths)
                .with_context(|| format!("group {:?}", entry.name))?
                .with_mode(entry.mode);
            Ok(if entry.optional { group.optional() } else { group })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcrypt::Presence;

    #[test]
    fn default_policy_shape() {
        let groups = default_groups().unwrap();
        let names: Vec<_> = groups.iter().map(PathGroup::name).collect();
        assert_eq!(names, ["contact", "contact-optional", "employment"]);
        assert_eq!(groups[0].presence(), Presence::Required);
        assert_eq!(groups[2].presence(), Presence::Optional);
        assert!(groups.iter().all(|g| g.mode() == CipherMode::Aead));
    }

    #[test]
    fn parses_yaml_with_defaults() {
        let groups = from_yaml(
            r#"
groups:
  - name: contact
    paths: [email]
  - name: legacy
    mode: block
    optional: true
    paths:
      - companies.salary
"#,
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].mode(), CipherMode::Aead);
        assert_eq!(groups[0].presence(), Presence::Required);
        assert_eq!(groups[1].mode(), CipherMode::Block);
        assert_eq!(groups[1].presence(), Presence::Optional);
        assert_eq!(groups[1].paths()[0].as_str(), "companies.salary");
    }

    #[test]
    fn rejects_bad_policies() {
        assert!(from_yaml("groups: []").is_err());
        assert!(from_yaml("groups:\n  - name: a\n    paths: []").is_err());
        assert!(from_yaml("groups:\n  - name: a\n    paths: [x]\n  - name: a\n    paths: [y]").is_err());
        assert!(from_yaml("groups:\n  - name: a\n    paths: ['a..b']").is_err());
        assert!(from_yaml("groups:\n  - name: a\n    mode: rot13\n    paths: [x]").is_err());
        assert!(from_yaml("not: a policy").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load("/nonexistent/path-groups.yaml").is_err());
    }
}
