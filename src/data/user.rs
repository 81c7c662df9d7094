//! See [`User`]

use serde::{Deserialize, Serialize};

super::id_type! {
    /// Server-assigned identifier of a [`User`].
    UserId as "u"
}

/// A person who submits availability and can be given shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Duplicate of the user's ID.
    pub id: UserId,

    /// Login name. Unique across the server.
    pub username: String,

    /// Name shown on the grid and in reports.
    /// Can be changed without changing the user's ID.
    #[serde(rename = "DisplayName")]
    pub display_name: String,

    /// Administrators manage the schedule and never appear as grid rows.
    #[serde(default)]
    pub admin: bool,
}

/// Find a user by id (`3`, `u.3`) or by exact username.
///
/// Usernames are compared case-sensitively, matching the server.
pub fn find_user<'a>(users: &'a [User], needle: &str) -> Option<&'a User> {
    match needle.parse::<UserId>() {
        Ok(id) => users.iter().find(|user| user.id == id),
        Err(_) => users.iter().find(|user| user.username == needle),
    }
}

/// Usernames that look like `needle`, closest first.
///
/// Used to suggest corrections when [`find_user`] comes up empty.
pub fn similar_usernames<'a>(users: &'a [User], needle: &str) -> Vec<&'a str> {
    let mut scored = users
        .iter()
        .map(|user| {
            (
                strsim::normalized_damerau_levenshtein(&user.username, needle),
                user.username.as_str(),
            )
        })
        .filter(|&(score, _)| score >= 0.5)
        .collect::<Vec<_>>();
    scored.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    scored.into_iter().map(|(_, name)| name).take(3).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users;

    #[test]
    fn test_deserialize_wire_user() {
        let user = serde_json::from_str::<User>(
            r#"{"id": 4, "username": "sato", "DisplayName": "Sato H.", "admin": false}"#,
        )
        .unwrap();
        assert_eq!(
            user,
            User {
                id: UserId(4),
                username: "sato".to_string(),
                display_name: "Sato H.".to_string(),
                admin: false,
            },
        );
    }

    #[test]
    fn test_find_user_by_id_or_name() {
        let users = users! {
            3: "alice" as "Alice",
            7: "bob",
        };
        assert_eq!(find_user(&users, "7").map(|u| u.id), Some(UserId(7)));
        assert_eq!(find_user(&users, "u.3").map(|u| u.id), Some(UserId(3)));
        assert_eq!(find_user(&users, "alice").map(|u| u.id), Some(UserId(3)));
        assert!(find_user(&users, "Alice").is_none(), "display names are not usernames");
        assert!(find_user(&users, "9").is_none());
    }

    #[test]
    fn test_suggest_close_usernames() {
        let users = users! {
            1: "alice",
            2: "alicia",
            3: "zed",
        };
        let suggestions = similar_usernames(&users, "alcie");
        assert_eq!(suggestions.first(), Some(&"alice"));
        assert!(!suggestions.contains(&"zed"), "unrelated names should not be suggested");
    }
}
