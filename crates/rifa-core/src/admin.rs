//! Admin session flag kept in the durable store.

use std::sync::Arc;

use crate::db::{keys, KeyValueStore};
use crate::error::{Error, Result};

const ACTIVE: &str = "true";

/// Gate for admin-only operations (manual entries, removals, status changes)
pub struct AdminSession<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> AdminSession<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Compare `password` with the configured one and open a session on match
    pub fn login(&self, password: &str, configured: Option<&str>) -> Result<()> {
        let Some(expected) = configured.filter(|value| !value.is_empty()) else {
            return Err(Error::Unauthorized(
                "no admin password is configured".to_string(),
            ));
        };
        if password != expected {
            tracing::warn!("Rejected admin login attempt");
            return Err(Error::Unauthorized("wrong admin password".to_string()));
        }

        self.store.set(keys::ADMIN_SESSION, ACTIVE)?;
        tracing::info!("Admin session started");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.store.remove(keys::ADMIN_SESSION)
    }

    pub fn is_active(&self) -> Result<bool> {
        Ok(self.store.get(keys::ADMIN_SESSION)?.as_deref() == Some(ACTIVE))
    }

    /// Fail with `Unauthorized` unless a session is open
    pub fn require(&self) -> Result<()> {
        if self.is_active()? {
            Ok(())
        } else {
            Err(Error::Unauthorized(
                "admin login required; run `rifa admin login`".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn session() -> AdminSession<MemoryStore> {
        AdminSession::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn login_with_configured_password_opens_session() {
        let admin = session();
        assert!(!admin.is_active().unwrap());
        assert!(matches!(admin.require(), Err(Error::Unauthorized(_))));

        admin.login("segredo", Some("segredo")).unwrap();
        assert!(admin.is_active().unwrap());
        admin.require().unwrap();

        admin.logout().unwrap();
        assert!(!admin.is_active().unwrap());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let admin = session();
        assert!(matches!(
            admin.login("chute", Some("segredo")),
            Err(Error::Unauthorized(_))
        ));
        assert!(!admin.is_active().unwrap());
    }

    #[test]
    fn login_fails_without_configured_password() {
        let admin = session();
        assert!(matches!(admin.login("", None), Err(Error::Unauthorized(_))));
        assert!(matches!(admin.login("", Some("")), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn logout_without_session_is_fine() {
        session().logout().unwrap();
    }
}
