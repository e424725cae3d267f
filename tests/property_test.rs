//! Property-based tests for cursor math and email normalization

use proptest::prelude::*;

use notecollab::shared::invite::normalize_email;
use notecollab::shared::presence::{clamp_offset, user_hue, TextLayout};

proptest! {
    #[test]
    fn test_clamped_offset_stays_in_bounds(content in "\\PC{0,64}", offset in 0usize..256) {
        let clamped = clamp_offset(offset, &content);
        let len = content.chars().count();
        prop_assert!(clamped <= len);
        if offset <= len {
            prop_assert_eq!(clamped, offset);
        }
    }

    #[test]
    fn test_position_never_passes_content_end(
        content in "[a-z \n]{0,80}",
        offset in 0usize..200,
        wrap in 1usize..20,
    ) {
        let layout = TextLayout::default().with_wrap(wrap);
        let position = layout.position(&content, offset);
        let lines = content.chars().count() + 1;

        prop_assert!(position.offset <= content.chars().count());
        prop_assert!(position.column < wrap);
        prop_assert!(position.line < lines);
    }

    #[test]
    fn test_unwrapped_line_matches_newline_count(content in "[a-z\n]{0,80}", offset in 0usize..100) {
        let position = TextLayout::default().position(&content, offset);
        let newlines = content.chars().take(position.offset).filter(|c| *c == '\n').count();
        prop_assert_eq!(position.line, newlines);
    }

    #[test]
    fn test_hue_in_range(user_id in "\\PC{0,40}") {
        prop_assert!(user_hue(&user_id) < 360);
    }

    #[test]
    fn test_normalize_email_idempotent(email in "[ ]{0,3}[A-Za-z0-9.]{1,12}@[A-Za-z]{1,8}\\.[a-z]{2,4}[ ]{0,3}") {
        let once = normalize_email(&email);
        prop_assert_eq!(normalize_email(&once), once.clone());
        prop_assert_eq!(once.trim(), once.as_str());
        prop_assert_eq!(once.to_lowercase(), once);
    }
}
