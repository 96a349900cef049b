use crate::feed::FeedResponse;
use serde_json::Value;

/// A scalar lifted out of the feed before numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    /// `None` for JSON null and missing values. Non-scalar values are kept as
    /// their JSON text so they surface as "no value" after coercion.
    fn from_json(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::Null => None,
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            other => Some(Scalar::Text(other.to_string())),
        }
    }

    /// Numeric reading; text that does not parse as a number yields `None`.
    pub fn to_number(&self) -> Option<f64> {
        let n = match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
        };
        n.filter(|n| !n.is_nan())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// One near-earth object reduced to the five exported fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub min_diameter_km: Option<Scalar>,
    pub absolute_magnitude: Option<Scalar>,
    pub velocity_km_s: Option<f64>,
}

impl FlatRecord {
    /// Extract the fields from one object record. Anything missing or of the
    /// wrong shape becomes `None`.
    pub fn from_object(object: &Value) -> Self {
        let min_diameter = object
            .get("estimated_diameter")
            .and_then(|d| d.get("kilometers"))
            .and_then(|km| km.get("estimated_diameter_min"));

        Self {
            id: text(object.get("neo_reference_id")),
            name: text(object.get("name")),
            min_diameter_km: Scalar::from_json(min_diameter),
            absolute_magnitude: Scalar::from_json(object.get("absolute_magnitude_h")),
            velocity_km_s: first_velocity(object),
        }
    }
}

/// Flatten every object under every date into one sequence, in document
/// order. An absent response flattens to nothing.
pub fn flatten(response: Option<&FeedResponse>) -> Vec<FlatRecord> {
    let Some(response) = response else {
        return Vec::new();
    };
    response
        .days()
        .flat_map(|(_, objects)| objects.iter().map(FlatRecord::from_object))
        .collect()
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// km/s figure of the first close approach that carries one. Later
/// approaches are ignored once a figure is found, even if it does not parse.
fn first_velocity(object: &Value) -> Option<f64> {
    let approaches = object.get("close_approach_data")?.as_array()?;
    approaches
        .iter()
        .filter_map(|ca| ca.get("relative_velocity")?.get("kilometers_per_second"))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .and_then(|v| Scalar::from_json(Some(v)))
        .and_then(|s| s.to_number())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed(value: Value) -> FeedResponse {
        serde_json::from_value(value).unwrap()
    }

    fn eros() -> Value {
        json!({
            "neo_reference_id": "2000433",
            "name": "433 Eros (A898 PA)",
            "absolute_magnitude_h": 10.4,
            "estimated_diameter": {
                "kilometers": { "estimated_diameter_min": 22.0067027115, "estimated_diameter_max": 49.2084832235 }
            },
            "close_approach_data": [
                { "relative_velocity": { "kilometers_per_second": "5.5786194722" } }
            ]
        })
    }

    #[test]
    fn test_extracts_all_five_fields() {
        let record = FlatRecord::from_object(&eros());
        assert_eq!(record.id.as_deref(), Some("2000433"));
        assert_eq!(record.name.as_deref(), Some("433 Eros (A898 PA)"));
        assert_eq!(record.min_diameter_km, Some(Scalar::Number(22.0067027115)));
        assert_eq!(record.absolute_magnitude, Some(Scalar::Number(10.4)));
        assert_eq!(record.velocity_km_s, Some(5.5786194722));
    }

    #[test]
    fn test_first_velocity_wins() {
        let object = json!({
            "close_approach_data": [
                { "relative_velocity": {} },
                { "relative_velocity": { "kilometers_per_second": "5.2" } },
                { "relative_velocity": { "kilometers_per_second": "9.9" } }
            ]
        });
        assert_eq!(FlatRecord::from_object(&object).velocity_km_s, Some(5.2));
    }

    #[test]
    fn test_empty_velocity_strings_are_skipped() {
        let object = json!({
            "close_approach_data": [
                { "relative_velocity": { "kilometers_per_second": "" } },
                { "relative_velocity": { "kilometers_per_second": 7.25 } }
            ]
        });
        assert_eq!(FlatRecord::from_object(&object).velocity_km_s, Some(7.25));
    }

    #[test]
    fn test_no_close_approaches_means_no_velocity() {
        assert_eq!(FlatRecord::from_object(&json!({ "close_approach_data": [] })).velocity_km_s, None);
        assert_eq!(FlatRecord::from_object(&json!({})).velocity_km_s, None);
    }

    #[test]
    fn test_missing_nested_diameter_does_not_abort_batch() {
        let response = feed(json!({
            "near_earth_objects": {
                "2025-01-01": [
                    { "neo_reference_id": "1", "estimated_diameter": { "meters": {} } },
                    { "neo_reference_id": "2", "estimated_diameter": "garbage" },
                    "not even an object",
                    eros()
                ]
            }
        }));
        let records = flatten(Some(&response));
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].min_diameter_km, None);
        assert_eq!(records[1].min_diameter_km, None);
        assert_eq!(records[2], FlatRecord::default());
        assert_eq!(records[3].id.as_deref(), Some("2000433"));
    }

    #[test]
    fn test_dates_are_concatenated_in_document_order() {
        let response = feed(json!({
            "near_earth_objects": {
                "2025-01-02": [{ "neo_reference_id": "b1" }, { "neo_reference_id": "b2" }],
                "2025-01-01": [{ "neo_reference_id": "a1" }]
            }
        }));
        let ids: Vec<String> = flatten(Some(&response)).into_iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, vec!["b1", "b2", "a1"]);
    }

    #[test]
    fn test_absent_response_flattens_to_nothing() {
        assert!(flatten(None).is_empty());
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(Scalar::from(" 10.4 ").to_number(), Some(10.4));
        assert_eq!(Scalar::from("bright").to_number(), None);
        assert_eq!(Scalar::from("NaN").to_number(), None);
        assert_eq!(Scalar::from(0.2).to_number(), Some(0.2));
    }
}
