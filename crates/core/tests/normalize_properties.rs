//! Property tests for key normalization and shard partitioning

use docnav_core::normalize::{normalize, token_suffixes};
use docnav_core::ShardScheme;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalize_is_idempotent(s in "[A-Za-z0-9 _.:,()#-]{0,40}") {
        let once = normalize(&s);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn normalized_keys_have_no_edge_or_double_spaces(s in "[A-Za-z0-9 _.:-]{0,40}") {
        let key = normalize(&s);
        prop_assert!(!key.starts_with(' '));
        prop_assert!(!key.ends_with(' '));
        prop_assert!(!key.contains("  "));
        prop_assert_eq!(key.to_lowercase(), key.clone());
    }

    #[test]
    fn shard_key_is_deterministic(s in "[a-z0-9 ]{1,20}", g in 1usize..=2) {
        let scheme = ShardScheme::with_granularity(g).unwrap();
        let key = normalize(&s);
        prop_assert_eq!(scheme.shard_key(&key), scheme.shard_key(&key));
    }

    #[test]
    fn every_key_is_a_candidate_of_its_own_shard(s in "[a-z0-9]{1,6}( [a-z0-9]{1,6}){0,3}", g in 1usize..=2) {
        let scheme = ShardScheme::with_granularity(g).unwrap();
        let shard = scheme.shard_key(&s);
        let catalog = vec![shard.clone()];
        // Any prefix of the key must route back to the shard holding it.
        for end in 1..=s.len() {
            let prefix = normalize(&s[..end]);
            if prefix.is_empty() {
                continue;
            }
            prop_assert_eq!(scheme.candidate_shards(&prefix, &catalog), vec![shard.clone()]);
        }
    }

    #[test]
    fn token_suffixes_are_suffixes(s in "[a-z]{1,5}( [a-z]{1,5}){0,4}") {
        for suffix in token_suffixes(&s) {
            prop_assert!(s.ends_with(suffix));
            prop_assert!(!suffix.starts_with(' '));
        }
    }
}
