use htrc_tokencount::client::data_api::encode_volume_ids;
use htrc_tokencount::client::solr::parse_search_response;
use htrc_tokencount::VolumeIds;
use proptest::prelude::*;

/// Property-based tests for request encoding and response parsing
mod encoding_props {
    use super::*;

    proptest! {
        #[test]
        fn test_separator_count_matches_id_count(ids in prop::collection::vec("[a-z0-9.:/$]{1,20}", 1..20)) {
            let encoded = encode_volume_ids(&VolumeIds::from(ids.clone()));
            prop_assert_eq!(encoded.matches("%7C").count(), ids.len() - 1);
            prop_assert!(!encoded.contains('|'));
        }
    }
}

mod solr_props {
    use super::*;

    proptest! {
        #[test]
        fn test_id_count_ignores_num_found(
            ids in prop::collection::vec("[a-z0-9.]{1,16}", 0..25),
            num_found in 0u64..100_000,
        ) {
            let docs: String = ids
                .iter()
                .map(|id| format!(r#"<doc><str name="id">{id}</str><str name="title">t</str></doc>"#))
                .collect();
            let xml = format!(r#"<response><result name="response" numFound="{num_found}" start="0">{docs}</result></response>"#);

            let result = parse_search_response(&xml).unwrap();
            prop_assert_eq!(result.num_found, Some(num_found));
            prop_assert_eq!(result.ids.as_slice(), ids.as_slice());
        }
    }
}
