//! Property tests for the text heuristics

use chatward_filters::{caps_flags, caps_in_a_row, caps_percentage, edit_distance, similarity};
use proptest::prelude::*;

proptest! {
    #[test]
    fn similarity_is_bounded(a in ".{0,40}", b in ".{0,40}") {
        let score = similarity(&a, &b);
        prop_assert!(score <= 100);
    }

    #[test]
    fn similarity_is_symmetric(a in "[a-zA-Z ]{0,30}", b in "[a-zA-Z ]{0,30}") {
        prop_assert_eq!(similarity(&a, &b), similarity(&b, &a));
    }

    #[test]
    fn identical_strings_are_fully_similar(a in "[a-z0-9 ]{0,40}") {
        prop_assert_eq!(similarity(&a, &a), 100);
        prop_assert_eq!(similarity(&a, &a.to_uppercase()), 100);
    }

    #[test]
    fn edit_distance_bounded_by_longer(a in "[a-z]{0,30}", b in "[a-z]{0,30}") {
        let distance = edit_distance(&a, &b);
        prop_assert!(distance <= a.len().max(b.len()));
        prop_assert!(distance >= a.len().abs_diff(b.len()));
    }

    #[test]
    fn caps_flags_cover_every_char(text in "[a-zA-Z !.]{0,50}") {
        let flags = caps_flags(&text, &[]);
        prop_assert_eq!(flags.len(), text.chars().count());

        let expected = text.chars().filter(|c| c.is_ascii_uppercase()).count();
        prop_assert_eq!(flags.iter().map(|&f| f as usize).sum::<usize>(), expected);
    }

    #[test]
    fn caps_metrics_are_consistent(text in "[a-zA-Z ]{1,50}") {
        let flags = caps_flags(&text, &[]);
        let percentage = caps_percentage(&flags);
        let run = caps_in_a_row(&flags);

        prop_assert!(percentage <= 100);
        prop_assert!(run <= flags.len());
        prop_assert_eq!(run == 0, percentage == 0);
    }

    #[test]
    fn lowercase_text_has_no_caps(text in "[a-z0-9 ]{0,50}") {
        let flags = caps_flags(&text, &[]);
        prop_assert_eq!(caps_percentage(&flags), 0);
        prop_assert_eq!(caps_in_a_row(&flags), 0);
    }
}
