use serde::Serialize;
use serde_json::{Number, Value};

/// One catalog entry, flattened out of its partition payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub scientific_name: String,
    pub id: String,
    pub partition: String,
    pub image_url: String,
    #[serde(skip)]
    normalized_name: String,
    #[serde(skip)]
    normalized_scientific_name: String,
}

impl Record {
    pub fn new(name: &str, scientific_name: &str, id: &str, partition: &str) -> Self {
        Self::from_owned(
            name.to_string(),
            scientific_name.to_string(),
            id.to_string(),
            partition.to_string(),
            String::new(),
        )
    }

    pub fn from_owned(
        name: String,
        scientific_name: String,
        id: String,
        partition: String,
        image_url: String,
    ) -> Self {
        let normalized_name = name.to_lowercase();
        let normalized_scientific_name = scientific_name.to_lowercase();
        Self {
            name,
            scientific_name,
            id,
            partition,
            image_url,
            normalized_name,
            normalized_scientific_name,
        }
    }

    pub fn with_image(mut self, image_url: &str) -> Self {
        self.image_url = image_url.to_string();
        self
    }

    /// Builds a record from one raw payload entry. `position` is the entry's
    /// index inside its partition and stands in for a missing id.
    pub fn from_raw(entry: &Value, partition: &str, position: usize) -> Self {
        let name = text_field(entry, "common_name")
            .or_else(|| text_field(entry, "name"))
            .unwrap_or_default();
        let scientific_name = text_field(entry, "scientific_name").unwrap_or_default();
        let image_url = text_field(entry, "image_url").unwrap_or_default();
        let id = match entry.get("id") {
            None | Some(Value::Null) => position.to_string(),
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => number_text(id),
            Some(other) => other.to_string(),
        };

        Self::from_owned(name, scientific_name, id, partition.to_string(), image_url)
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn normalized_scientific_name(&self) -> &str {
        &self.normalized_scientific_name
    }
}

/// Prints a numeric id the way a browser would: `42.0` becomes `42`.
fn number_text(number: &Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value == 0.0 => "0".to_string(),
        Some(value) if value.fract() == 0.0 && value.abs() < 1e21 => format!("{value:.0}"),
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

fn text_field(entry: &Value, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// A search query that is known to be non-empty, trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Query, Record};
    use serde_json::json;

    #[test]
    fn common_name_wins_over_name() {
        let entry = json!({"common_name": "Neem", "name": "Azadirachta", "id": 7});
        let record = Record::from_raw(&entry, "medicinal_herbs", 0);
        assert_eq!(record.name, "Neem");
        assert_eq!(record.id, "7");
    }

    #[test]
    fn empty_common_name_falls_through_to_name() {
        let entry = json!({"common_name": "", "name": "Tulsi"});
        let record = Record::from_raw(&entry, "medicinal_herbs", 3);
        assert_eq!(record.name, "Tulsi");
        assert_eq!(record.id, "3");
    }

    #[test]
    fn null_id_uses_position_and_string_id_is_kept() {
        let null_id = Record::from_raw(&json!({"id": null}), "p", 5);
        assert_eq!(null_id.id, "5");

        let text_id = Record::from_raw(&json!({"id": "mango-01"}), "p", 5);
        assert_eq!(text_id.id, "mango-01");
    }

    #[test]
    fn whole_float_ids_print_without_fraction() {
        assert_eq!(Record::from_raw(&json!({"id": 42.0}), "fruit_trees", 0).id, "42");
        assert_eq!(Record::from_raw(&json!({"id": -3.0}), "p", 0).id, "-3");
        assert_eq!(Record::from_raw(&json!({"id": 2.5}), "p", 0).id, "2.5");
        assert_eq!(Record::from_raw(&json!({"id": 7}), "p", 0).id, "7");
    }

    #[test]
    fn non_object_entry_yields_empty_record() {
        let record = Record::from_raw(&json!(12), "p", 1);
        assert_eq!(record.name, "");
        assert_eq!(record.scientific_name, "");
        assert_eq!(record.image_url, "");
        assert_eq!(record.id, "1");
    }

    #[test]
    fn query_rejects_blank_input() {
        assert!(Query::parse("   ").is_none());
        assert_eq!(Query::parse("  ROSE ").unwrap().as_str(), "rose");
    }
}
