//! Admin session persisted between CLI invocations.
//!
//! The session is written by `switchboard login` and only carries identity
//! and role; it never holds a password.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;

use super::capability::{Capabilities, Capability, Role, resolve_capabilities};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

impl AdminSession {
    /// Open a session for an admin operator.
    ///
    /// `full_name` defaults to the username; the `user` role is refused.
    pub fn login(
        username: &str,
        full_name: Option<&str>,
        role: Role,
    ) -> Result<Self, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }
        if role == Role::User {
            return Err(SessionError::NotAnAdmin {
                username: username.to_string(),
            });
        }
        let full_name = full_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(username);

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            role,
        })
    }

    /// Read the session at `path`; a missing file means nobody is logged in
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Like [`AdminSession::load`], but a missing session is an error
    pub fn require_loaded(path: &Path) -> Result<Self, SessionError> {
        Self::load(path)?.ok_or(SessionError::NotLoggedIn)
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Remove the stored session. Returns whether one existed.
    pub fn clear(path: &Path) -> Result<bool, SessionError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        resolve_capabilities(self.role)
    }

    pub fn require(&self, capability: Capability) -> Result<(), SessionError> {
        if self.capabilities().contains(capability) {
            Ok(())
        } else {
            Err(SessionError::PermissionDenied {
                username: self.username.clone(),
                capability: capability.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session(role: Role) -> AdminSession {
        AdminSession {
            id: "3f1c".to_string(),
            username: "ops".to_string(),
            full_name: "Ops Team".to_string(),
            role,
        }
    }

    #[test]
    fn test_login_builds_admin_session() {
        // テスト項目: ログインで admin のセッションが作られ、氏名は省略時にユーザー名になる
        // given (前提条件):
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        // when (操作):
        let session = AdminSession::login("  ops ", None, Role::SuperAdmin).unwrap();
        session.save(&path).unwrap();

        // then (期待する結果):
        assert_eq!(session.username, "ops");
        assert_eq!(session.full_name, "ops");
        assert!(!session.id.is_empty());
        assert_eq!(AdminSession::load(&path).unwrap(), Some(session));
    }

    #[test]
    fn test_login_refuses_user_role_and_blank_name() {
        // テスト項目: user ロールと空のユーザー名ではログインできない
        // given (前提条件):
        let full_name = Some("Ops Team");

        // when (操作):
        let user = AdminSession::login("guest", full_name, Role::User);
        let blank = AdminSession::login("   ", full_name, Role::Admin);

        // then (期待する結果):
        assert!(matches!(user, Err(SessionError::NotAnAdmin { username }) if username == "guest"));
        assert!(matches!(blank, Err(SessionError::EmptyUsername)));
    }

    #[test]
    fn test_missing_file_is_not_logged_in() {
        // テスト項目: セッションファイルが無い場合は None を返す
        // given (前提条件):
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        // when (操作):
        let loaded = AdminSession::load(&path).unwrap();

        // then (期待する結果):
        assert_eq!(loaded, None);
        assert!(matches!(
            AdminSession::require_loaded(&path),
            Err(SessionError::NotLoggedIn)
        ));
    }

    #[test]
    fn test_save_load_and_clear() {
        // テスト項目: 保存したセッションを読み込め、clear で削除される
        // given (前提条件):
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let stored = session(Role::Admin);

        // when (操作):
        stored.save(&path).unwrap();
        let loaded = AdminSession::load(&path).unwrap();
        let removed = AdminSession::clear(&path).unwrap();
        let removed_again = AdminSession::clear(&path).unwrap();

        // then (期待する結果):
        assert_eq!(loaded, Some(stored));
        assert!(removed);
        assert!(!removed_again);
        assert_eq!(AdminSession::load(&path).unwrap(), None);
    }

    #[test]
    fn test_session_file_never_contains_a_password() {
        // テスト項目: 保存されるセッションにはパスワード項目が含まれない
        // given (前提条件):
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        // when (操作):
        session(Role::SuperAdmin).save(&path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();

        // then (期待する結果):
        assert!(raw.contains("\"fullName\""));
        assert!(raw.contains("\"super_admin\""));
        assert!(!raw.to_lowercase().contains("password"));
    }

    #[test]
    fn test_malformed_file_is_reported() {
        // テスト項目: 壊れたセッションファイルは Format エラーになる
        // given (前提条件):
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        // when (操作):
        let result = AdminSession::load(&path);

        // then (期待する結果):
        assert!(matches!(result, Err(SessionError::Format(_))));
    }

    #[test]
    fn test_require_denies_missing_capability() {
        // テスト項目: ロールに無い権限を要求すると PermissionDenied になる
        // given (前提条件):
        let admin = session(Role::Admin);
        let user = session(Role::User);

        // when (操作):
        let allowed = admin.require(Capability::Record);
        let denied = user.require(Capability::Broadcast);

        // then (期待する結果):
        assert!(allowed.is_ok());
        match denied {
            Err(SessionError::PermissionDenied {
                username,
                capability,
            }) => {
                assert_eq!(username, "ops");
                assert_eq!(capability, "broadcast");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
