use crate::error::{AppError, AppResult};

/// Tells whether identities are provisioned by an external system.
pub trait ManagedInstanceChecker: Send + Sync {
    fn is_instance_managed(&self) -> bool;

    /// Refuse a mutation on a managed instance.
    fn check_not_managed(&self) -> AppResult<()> {
        if self.is_instance_managed() {
            return Err(AppError::ManagedInstance);
        }
        Ok(())
    }
}

/// Reads the `MANAGED_INSTANCE` server setting.
#[derive(Debug, Clone, Copy)]
pub struct ConfigManagedInstanceChecker {
    managed: bool,
}

impl ConfigManagedInstanceChecker {
    pub fn new(managed: bool) -> Self {
        Self { managed }
    }
}

impl ManagedInstanceChecker for ConfigManagedInstanceChecker {
    fn is_instance_managed(&self) -> bool {
        self.managed
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn managed_instance_refuses_mutations() {
        assert_matches!(
            ConfigManagedInstanceChecker::new(true).check_not_managed(),
            Err(AppError::ManagedInstance)
        );
        assert!(ConfigManagedInstanceChecker::new(false)
            .check_not_managed()
            .is_ok());
    }
}
