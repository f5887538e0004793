use crate::model::{Query, Record};

/// Records whose name or scientific name contains `query`, in corpus order.
pub fn search<'a>(records: &'a [Record], query: &Query) -> Vec<&'a Record> {
    let needle = query.as_str();
    records
        .iter()
        .filter(|record| matches(record, needle))
        .collect()
}

fn matches(record: &Record, needle: &str) -> bool {
    record.normalized_name().contains(needle)
        || record.normalized_scientific_name().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::search;
    use crate::model::{Query, Record};

    #[test]
    fn keeps_insertion_order_instead_of_match_position() {
        let records = vec![
            Record::new("Wild Rose", "Rosa acicularis", "1", "flowering_shrubs"),
            Record::new("Rosemary", "Salvia rosmarinus", "2", "culinary_herbs"),
        ];
        let query = Query::parse("ros").unwrap();

        let ids: Vec<&str> = search(&records, &query)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
