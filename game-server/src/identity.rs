//! Caller identity. The identity provider sits in front of this service and
//! forwards an opaque user id and display name as headers; nothing here
//! verifies credentials.

use game_types::Principal;
use warp::{Filter, Rejection};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const DISPLAY_NAME_HEADER: &str = "x-display-name";
pub const MAX_DISPLAY_NAME_CHARS: usize = 32;

/// Extracts the caller, or `None` when no user id was supplied.
pub fn principal() -> impl Filter<Extract = (Option<Principal>,), Error = Rejection> + Clone {
    warp::header::optional::<String>(USER_ID_HEADER)
        .and(warp::header::optional::<String>(DISPLAY_NAME_HEADER))
        .map(principal_from_headers)
}

/// Blank ids are treated as missing; a missing or blank display name
/// falls back to the id.
pub fn principal_from_headers(
    user_id: Option<String>,
    display_name: Option<String>,
) -> Option<Principal> {
    let user_id = user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())?;
    let display_name = display_name
        .map(|name| name.trim().chars().take(MAX_DISPLAY_NAME_CHARS).collect::<String>())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| user_id.clone());
    Some(Principal::new(user_id, display_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_blank_id_is_anonymous() {
        assert!(principal_from_headers(None, Some("Alice".to_string())).is_none());
        assert!(principal_from_headers(Some("   ".to_string()), None).is_none());
    }

    #[test]
    fn test_display_name_defaults_to_id() {
        let principal = principal_from_headers(Some("guest-42".to_string()), None).unwrap();
        assert_eq!(principal.display_name, "guest-42");

        let principal =
            principal_from_headers(Some("guest-42".to_string()), Some(" ".to_string())).unwrap();
        assert_eq!(principal.display_name, "guest-42");
    }

    #[test]
    fn test_display_name_is_trimmed_and_capped() {
        let long = "x".repeat(100);
        let principal = principal_from_headers(Some("u1".to_string()), Some(long)).unwrap();
        assert_eq!(principal.display_name.len(), MAX_DISPLAY_NAME_CHARS);

        let principal =
            principal_from_headers(Some(" u1 ".to_string()), Some(" Alice ".to_string())).unwrap();
        assert_eq!(principal.user_id, "u1");
        assert_eq!(principal.display_name, "Alice");
    }
}
