/// Discord caps channel names at 100 characters.
pub const MAX_CHANNEL_NAME: usize = 100;
pub const TICKET_PREFIX: &str = "ticket-";

/// Deterministic ticket channel name for a user: `ticket-<handle>`, with the
/// handle reduced to the characters Discord keeps in text channel names.
/// Falls back to the user id when nothing of the handle survives.
pub fn ticket_channel_name(username: &str, user_id: &str) -> String {
    let mut slug = String::with_capacity(username.len());
    for ch in username.chars().flat_map(char::to_lowercase) {
        let keep = ch.is_ascii_alphanumeric() || ch == '_' || ch == '-';
        let next = if keep { ch } else { '-' };
        if next == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(next);
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { user_id } else { slug };

    let mut name = format!("{TICKET_PREFIX}{slug}");
    if name.len() > MAX_CHANNEL_NAME {
        // Only ASCII survives the filter above, but `user_id` is caller-provided.
        let cut = (0..=MAX_CHANNEL_NAME)
            .rev()
            .find(|&i| name.is_char_boundary(i))
            .unwrap_or(0);
        name.truncate(cut);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_keeps_simple_handles() {
        assert_eq!(ticket_channel_name("alice", "1"), "ticket-alice");
        assert_eq!(ticket_channel_name("Bob_99", "1"), "ticket-bob_99");
    }

    #[test]
    fn collapses_other_characters_to_single_dashes() {
        assert_eq!(ticket_channel_name("  Dr. Who?! ", "1"), "ticket-dr-who");
        assert_eq!(ticket_channel_name("a--b", "1"), "ticket-a-b");
        assert_eq!(ticket_channel_name("-x-", "1"), "ticket-x");
    }

    #[test]
    fn falls_back_to_user_id() {
        assert_eq!(ticket_channel_name("ユーザー", "42"), "ticket-42");
        assert_eq!(ticket_channel_name("", "42"), "ticket-42");
    }

    #[test]
    fn same_user_same_name() {
        assert_eq!(
            ticket_channel_name("Alice", "1"),
            ticket_channel_name("alice", "2")
        );
    }

    #[test]
    fn caps_length() {
        let long = "x".repeat(300);
        let name = ticket_channel_name(&long, "1");
        assert_eq!(name.len(), MAX_CHANNEL_NAME);
        assert!(name.starts_with(TICKET_PREFIX));
    }
}
