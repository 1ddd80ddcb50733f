//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Username and login identifier rules

mod credentials;
mod password;

pub use credentials::{CredentialError, LoginIdentifier, validate_username};
pub use password::{PasswordError, hash_password, verify_password};

/// Returns true when `actor` may read or modify the account `target`.
///
/// Users manage their own account; managers manage everyone's.
#[must_use]
pub fn can_manage_account(actor: uuid::Uuid, actor_is_manager: bool, target: uuid::Uuid) -> bool {
    actor_is_manager || actor == target
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_account_access() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(can_manage_account(me, false, me));
        assert!(!can_manage_account(me, false, other));
        assert!(can_manage_account(me, true, other));
    }
}
