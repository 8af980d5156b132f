use feruca::Collator;
use roster_types::{SortKey, UserRecord};

/// Case-insensitive substring match on name or email. `needle` must already
/// be lowercased; an empty needle matches everything.
pub fn matches_query(record: &UserRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.name.to_lowercase().contains(needle)
        || record.email.to_lowercase().contains(needle)
}

fn sort_text(record: &UserRecord, key: SortKey) -> String {
    match key {
        SortKey::Email => record.email.to_lowercase(),
        SortKey::Company => record.company.to_lowercase(),
        _ => record.name.to_lowercase(),
    }
}

/// Filters `records` by `query`, then sorts by `sort`. Text keys are lowercased
/// and compared with the Unicode collation algorithm, so `Émile` sorts
/// before `Zoe`. Equal sort keys keep their relative order from `records`.
pub fn project<'a>(records: &'a [UserRecord], query: &str, sort: SortKey) -> Vec<&'a UserRecord> {
    let needle = query.trim().to_lowercase();
    let mut visible: Vec<&UserRecord> = records
        .iter()
        .filter(|r| matches_query(r, &needle))
        .collect();

    match sort {
        SortKey::AddedRecently => {
            visible.sort_by(|a, b| b.order_marker().cmp(&a.order_marker()));
        }
        key => {
            let mut keyed: Vec<(String, &UserRecord)> =
                visible.into_iter().map(|r| (sort_text(r, key), r)).collect();
            let mut collator = Collator::default();
            keyed.sort_by(|(a, _), (b, _)| collator.collate(a.as_str(), b.as_str()));
            visible = keyed.into_iter().map(|(_, r)| r).collect();
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_types::UserId;

    fn record(id: &str, name: &str, email: &str, company: &str, marker: Option<u64>) -> UserRecord {
        let mut r = UserRecord::new(UserId::from(id), name, email);
        r.company = company.to_string();
        r.created_at = marker;
        r
    }

    fn ids(projected: &[&UserRecord]) -> Vec<String> {
        projected.iter().map(|r| r.id.to_string()).collect()
    }

    fn alice_and_bob() -> Vec<UserRecord> {
        vec![
            record("a", "Alice", "a@x.com", "Zeta", Some(0)),
            record("b", "bob", "b@x.com", "alpha", Some(1)),
        ]
    }

    #[test]
    fn test_query_matches_name_case_insensitively() {
        let records = alice_and_bob();
        for key in SortKey::ALL {
            assert_eq!(ids(&project(&records, "ali", key)), vec!["a"]);
            assert_eq!(ids(&project(&records, "  ALI ", key)), vec!["a"]);
        }
    }

    #[test]
    fn test_query_matches_email() {
        let records = alice_and_bob();
        assert_eq!(ids(&project(&records, "B@X", SortKey::Name)), vec!["b"]);
        assert_eq!(ids(&project(&records, "x.com", SortKey::Name)), vec!["a", "b"]);
        assert!(project(&records, "nomatch", SortKey::Name).is_empty());
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let records = vec![
            record("1", "carol", "c@x.com", "", Some(0)),
            record("2", "Bob", "b@x.com", "", Some(1)),
            record("3", "alice", "a@x.com", "", Some(2)),
        ];
        assert_eq!(ids(&project(&records, "", SortKey::Name)), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_sort_by_email_and_company() {
        let records = alice_and_bob();
        assert_eq!(ids(&project(&records, "", SortKey::Email)), vec!["a", "b"]);
        assert_eq!(ids(&project(&records, "", SortKey::Company)), vec!["b", "a"]);
    }

    #[test]
    fn test_sort_added_is_newest_first() {
        let records = alice_and_bob();
        assert_eq!(ids(&project(&records, "", SortKey::AddedRecently)), vec!["b", "a"]);
        assert_eq!(ids(&project(&records, "", SortKey::Name)), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_marker_sorts_as_zero() {
        let records = vec![
            record("old", "Old", "o@x.com", "", None),
            record("new", "New", "n@x.com", "", Some(5)),
            record("zero", "Zero", "z@x.com", "", Some(0)),
        ];
        assert_eq!(
            ids(&project(&records, "", SortKey::AddedRecently)),
            vec!["new", "old", "zero"]
        );
    }

    #[test]
    fn test_equal_keys_keep_store_order() {
        let records = vec![
            record("1", "Sam", "s1@x.com", "Acme", Some(0)),
            record("2", "sam", "s2@x.com", "ACME", Some(1)),
        ];
        assert_eq!(ids(&project(&records, "", SortKey::Name)), vec!["1", "2"]);
        assert_eq!(ids(&project(&records, "", SortKey::Company)), vec!["1", "2"]);
    }

    #[test]
    fn test_text_sorts_follow_collation_order() {
        let records = vec![
            record("z", "Zoe", "zoe@x.com", "Zenith", Some(0)),
            record("e", "Émile", "émile@x.com", "Ærø Shipping", Some(1)),
            record("a", "adam", "adam@x.com", "Öl & Co", Some(2)),
        ];
        assert_eq!(ids(&project(&records, "", SortKey::Name)), vec!["a", "e", "z"]);
        assert_eq!(ids(&project(&records, "", SortKey::Email)), vec!["a", "e", "z"]);
        assert_eq!(ids(&project(&records, "", SortKey::Company)), vec!["e", "a", "z"]);
    }

    #[test]
    fn test_accented_and_plain_names_stay_stable() {
        let records = vec![
            record("2", "Élan", "e2@x.com", "", Some(0)),
            record("1", "élan", "e1@x.com", "", Some(1)),
            record("3", "Eve", "e3@x.com", "", Some(2)),
        ];
        assert_eq!(ids(&project(&records, "", SortKey::Name)), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_filter_runs_before_sort() {
        let records = vec![
            record("1", "Ann", "ann@x.com", "", Some(3)),
            record("2", "Bea", "bea@y.org", "", Some(2)),
            record("3", "Annette", "net@y.org", "", Some(1)),
        ];
        assert_eq!(ids(&project(&records, "ann", SortKey::AddedRecently)), vec!["1", "3"]);
        assert_eq!(ids(&project(&records, "y.org", SortKey::Name)), vec!["3", "2"]);
    }
}
