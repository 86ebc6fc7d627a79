//! In-memory user and group directory backing the shell commands.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::ShellConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub members: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    admins: BTreeSet<String>,
    groups: BTreeMap<String, Group>,
}

impl Directory {
    pub fn from_config(config: &ShellConfig) -> Self {
        let groups = config
            .groups
            .iter()
            .map(|(name, members)| {
                let group = Group {
                    name: name.clone(),
                    members: members.iter().cloned().collect(),
                };
                (name.clone(), group)
            })
            .collect();
        Self {
            admins: config.admins.iter().cloned().collect(),
            groups,
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_admin(&self, user: &str) -> bool {
        self.admins.contains(user)
    }

    /// Admins and members of at least one group.
    pub fn is_known(&self, user: &str) -> bool {
        self.is_admin(user) || self.groups.values().any(|g| g.members.contains(user))
    }

    /// Returns false if `user` was already a member.
    pub fn add_member(&mut self, group: &str, user: &str) -> bool {
        self.groups
            .get_mut(group)
            .is_some_and(|g| g.members.insert(user.to_string()))
    }

    /// Returns false if `user` was not a member.
    pub fn remove_member(&mut self, group: &str, user: &str) -> bool {
        self.groups
            .get_mut(group)
            .is_some_and(|g| g.members.remove(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        let mut config = ShellConfig::default();
        config
            .groups
            .insert("staff".to_string(), vec!["alice".to_string()]);
        Directory::from_config(&config)
    }

    #[test]
    fn admins_and_members_are_known() {
        let dir = directory();
        assert!(dir.is_known("root"));
        assert!(dir.is_known("alice"));
        assert!(!dir.is_known("mallory"));
        assert!(dir.is_admin("root"));
        assert!(!dir.is_admin("alice"));
    }

    #[test]
    fn membership_changes_report_effect() {
        let mut dir = directory();
        assert!(dir.add_member("staff", "bob"));
        assert!(!dir.add_member("staff", "bob"));
        assert!(dir.remove_member("staff", "bob"));
        assert!(!dir.remove_member("staff", "bob"));
        assert!(!dir.add_member("missing", "bob"));
    }

    #[test]
    fn group_names_are_sorted() {
        let dir = directory();
        assert_eq!(dir.group_names().collect::<Vec<_>>(), vec!["staff", "wheel"]);
    }
}
