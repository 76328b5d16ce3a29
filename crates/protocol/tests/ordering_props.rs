use fence_protocol::ordering::{canonical_cmp, canonical_sort, is_canonically_sorted};
use fence_protocol::{ViolationCause, ViolationKey};
use proptest::prelude::*;

fn cause_strategy() -> impl Strategy<Value = ViolationCause> {
    prop::sample::select(ViolationCause::ALL.to_vec())
}

fn key_strategy() -> impl Strategy<Value = ViolationKey> {
    (
        "[a-z@/]{1,8}",
        "[a-z/._]{1,12}",
        cause_strategy(),
        prop::option::of("[a-z:./]{0,10}"),
    )
        .prop_map(|(package, path, cause, specifier)| ViolationKey {
            package,
            path,
            cause,
            specifier,
        })
}

proptest! {
    #[test]
    fn sorting_is_idempotent(mut items in prop::collection::vec(any::<String>(), 0..32)) {
        canonical_sort(&mut items);
        let once = items.clone();
        canonical_sort(&mut items);
        prop_assert_eq!(&items, &once);
        prop_assert!(is_canonically_sorted(&items));
    }

    #[test]
    fn comparison_is_antisymmetric(a in any::<String>(), b in any::<String>()) {
        prop_assert_eq!(canonical_cmp(&a, &b), canonical_cmp(&b, &a).reverse());
    }

    #[test]
    fn key_sort_is_idempotent(mut keys in prop::collection::vec(key_strategy(), 0..24)) {
        keys.sort();
        let once = keys.clone();
        keys.sort();
        prop_assert_eq!(keys, once);
    }

    #[test]
    fn key_decodes_its_own_encoding(key in key_strategy()) {
        let decoded = ViolationKey::decode(&key.encode()).unwrap();
        prop_assert_eq!(decoded, key);
    }
}
