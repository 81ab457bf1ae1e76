use uuid::Uuid;

use crate::models::UserId;

/// Namespace for deriving user ids from sign-in emails.
const USER_NAMESPACE: Uuid = Uuid::from_u128(0xa98eef6f_170a_492d_9ae5_257570db6a74);

/// The signed-in user, passed explicitly to every data call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
}

impl Session {
    /// The id is the v5 hash of the email exactly as given, so ids match
    /// ones already issued for the same sign-in string. Case or spacing
    /// differences produce a different user.
    pub fn for_email(email: &str) -> Self {
        Self {
            user_id: Uuid::new_v5(&USER_NAMESPACE, email.as_bytes()),
            email: email.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_per_email() {
        let a = Session::for_email("user@example.com");
        assert_eq!(a, Session::for_email("user@example.com"));
        assert_ne!(a.user_id, Session::for_email("other@example.com").user_id);
        assert_eq!(a.user_id.get_version_num(), 5);
    }

    #[test]
    fn email_hashed_as_given() {
        let lower = Session::for_email("user@example.com");
        let mixed = Session::for_email("User@Example.com");
        assert_eq!(
            lower.user_id,
            Uuid::parse_str("7a9e4efe-b246-54e9-ad07-8bfe283e54a7").unwrap()
        );
        assert_eq!(
            mixed.user_id,
            Uuid::parse_str("44eca80d-2e06-518f-b045-03bdedfabc7c").unwrap()
        );
        assert_eq!(mixed.email, "User@Example.com");
    }
}
