use proptest::prelude::*;
use strata_fs::NormalizedPath;

proptest! {
    #[test]
    fn normalized_paths_have_no_backslashes_or_double_slashes(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
        prop_assert!(!path.as_str().contains("//"));
    }

    #[test]
    fn normalization_is_idempotent(s in "\\PC*") {
        let once = NormalizedPath::new(&s);
        let twice = NormalizedPath::new(once.to_native());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn joining_dot_is_identity(s in "[a-z/]{1,20}") {
        let path = NormalizedPath::new(&s);
        prop_assert_eq!(path.join("."), path.clone());
    }
}
