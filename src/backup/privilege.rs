//! Who may manage backup sessions.
//!
//! The gate matches the host's: superuser, or a role granted the
//! replication attribute. Streaming-backup tools run as replication
//! roles, so both must pass.

use super::error::BackupError;

/// Identity and privilege bits of the caller, as the host resolved them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub name: String,
    superuser: bool,
    replication: bool,
}

impl Caller {
    pub fn superuser(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superuser: true,
            replication: false,
        }
    }

    pub fn replication(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superuser: false,
            replication: true,
        }
    }

    pub fn unprivileged(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superuser: false,
            replication: false,
        }
    }

    pub fn can_manage_backups(&self) -> bool {
        self.superuser || self.replication
    }
}

/// First check of every session operation.
pub fn require_backup_privilege(caller: &Caller) -> Result<(), BackupError> {
    if caller.can_manage_backups() {
        Ok(())
    } else {
        Err(BackupError::PermissionDenied {
            required: "superuser or replication",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superuser_and_replication_pass() {
        assert!(require_backup_privilege(&Caller::superuser("postgres")).is_ok());
        assert!(require_backup_privilege(&Caller::replication("streamer")).is_ok());
    }

    #[test]
    fn ordinary_roles_are_refused() {
        let err = require_backup_privilege(&Caller::unprivileged("app")).unwrap_err();
        assert!(matches!(err, BackupError::PermissionDenied { .. }));
    }
}
