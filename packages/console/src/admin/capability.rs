use std::{collections::HashSet, fmt};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::User => "user",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Broadcast,
    MonitorRooms,
    Record,
    MuteRooms,
    KickUsers,
    LogoutRooms,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Broadcast => "broadcast",
            Capability::MonitorRooms => "monitor-rooms",
            Capability::Record => "record",
            Capability::MuteRooms => "mute-rooms",
            Capability::KickUsers => "kick-users",
            Capability::LogoutRooms => "logout-rooms",
        };
        f.write_str(name)
    }
}

const ADMIN_CAPABILITIES: [Capability; 6] = [
    Capability::Broadcast,
    Capability::MonitorRooms,
    Capability::Record,
    Capability::MuteRooms,
    Capability::KickUsers,
    Capability::LogoutRooms,
];

/// Set of capabilities granted to a role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(HashSet<Capability>);

impl Capabilities {
    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Capabilities in a stable order, for display
    pub fn sorted(&self) -> Vec<Capability> {
        let mut capabilities: Vec<Capability> = self.0.iter().copied().collect();
        capabilities.sort_by_key(|c| c.to_string());
        capabilities
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The single place that decides what a role may do
pub fn resolve_capabilities(role: Role) -> Capabilities {
    match role {
        Role::User => Capabilities::default(),
        // every console operation is an admin operation
        Role::Admin | Role::SuperAdmin => ADMIN_CAPABILITIES.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_has_no_capabilities() {
        // テスト項目: user ロールは何の権限も持たない
        // given (前提条件):
        let role = Role::User;

        // when (操作):
        let capabilities = resolve_capabilities(role);

        // then (期待する結果):
        assert!(capabilities.is_empty());
    }

    #[test]
    fn test_admin_capabilities() {
        // テスト項目: admin はコンソールの全操作の権限を持つ
        // given (前提条件):
        let role = Role::Admin;

        // when (操作):
        let capabilities = resolve_capabilities(role);

        // then (期待する結果):
        for capability in ADMIN_CAPABILITIES {
            assert!(capabilities.contains(capability), "{}", capability);
        }
        assert_eq!(capabilities.sorted().len(), 6);
    }

    #[test]
    fn test_super_admin_has_admin_capabilities() {
        // テスト項目: super_admin は admin と同じ権限を持つ
        // given (前提条件):
        let admin = resolve_capabilities(Role::Admin);

        // when (操作):
        let super_admin = resolve_capabilities(Role::SuperAdmin);

        // then (期待する結果):
        assert_eq!(super_admin, admin);
    }

    #[test]
    fn test_role_uses_snake_case_on_the_wire() {
        // テスト項目: ロールは snake_case でシリアライズされる
        // given (前提条件):
        let role = Role::SuperAdmin;

        // when (操作):
        let json = serde_json::to_string(&role).unwrap();
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();

        // then (期待する結果):
        assert_eq!(json, "\"super_admin\"");
        assert_eq!(parsed, Role::Admin);
        assert_eq!(role.to_string(), "super_admin");
    }
}
