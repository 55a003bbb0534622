use chrono::{DateTime, Utc};

use super::AppError;

/// Who the current caller is acting for. Created at sign-in, passed
/// explicitly to every service call, and unusable after sign-out.
#[derive(Debug, Clone)]
pub struct Session {
    tenant_id: String,
    started_at: DateTime<Utc>,
    signed_out_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn start(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            started_at: Utc::now(),
            signed_out_at: None,
        }
    }

    /// The tenant every query is scoped to, as long as the session is live.
    pub fn tenant(&self) -> Result<&str, AppError> {
        if self.signed_out_at.is_some() {
            return Err(AppError::SessionClosed(self.tenant_id.clone()));
        }
        Ok(&self.tenant_id)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_active(&self) -> bool {
        self.signed_out_at.is_none()
    }

    pub fn sign_out(&mut self) {
        if self.signed_out_at.is_none() {
            self.signed_out_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::start("acme");
        assert!(session.is_active());
        assert_eq!(session.tenant().unwrap(), "acme");

        session.sign_out();
        assert!(!session.is_active());
        assert!(matches!(session.tenant(), Err(AppError::SessionClosed(t)) if t == "acme"));
    }
}
