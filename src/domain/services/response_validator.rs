use serde_json::{Map, Value};

use crate::domain::{AllowedFieldSet, ChartAnswer, MalformedResponse};

const CHART_SPEC_KEY: &str = "chartSpec";
const DESCRIPTION_KEY: &str = "description";
const ENCODING_KEY: &str = "encoding";
const FACET_KEY: &str = "facet";

/// Keys holding inline data rows; never scanned for encodings.
const DATA_KEYS: &[&str] = &["data", "datasets"];

/// Turns untrusted model output into a [`ChartAnswer`].
///
/// The model is asked for `{"chartSpec": {...}, "description": "..."}`. Every
/// `field` named by an encoding channel, at any view depth, must belong to the
/// dataset's [`AllowedFieldSet`].
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn validate(
        raw_text: &str,
        allowed: &AllowedFieldSet,
    ) -> Result<ChartAnswer, MalformedResponse> {
        let mut document = Self::parse_document(raw_text)?;

        let chart_spec = match document.remove(CHART_SPEC_KEY) {
            Some(spec @ Value::Object(_)) => spec,
            _ => return Err(MalformedResponse::MissingField(CHART_SPEC_KEY)),
        };

        let description = match document.remove(DESCRIPTION_KEY) {
            Some(Value::String(text)) if !text.trim().is_empty() => text,
            _ => return Err(MalformedResponse::MissingField(DESCRIPTION_KEY)),
        };

        let mut referenced = Vec::new();
        collect_encoding_fields(&chart_spec, &mut referenced);
        if let Some(unknown) = referenced.into_iter().find(|f| !allowed.contains(f)) {
            return Err(MalformedResponse::FieldNotInDataset(unknown.to_string()));
        }

        Ok(ChartAnswer::new(chart_spec, description))
    }

    /// Parse the payload as a JSON object. Models sometimes wrap the object in
    /// prose or code fences, so the outermost `{…}` block is tried as well.
    fn parse_document(raw_text: &str) -> Result<Map<String, Value>, MalformedResponse> {
        let trimmed = raw_text.trim();
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            return Ok(map);
        }

        let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) else {
            return Err(MalformedResponse::NotStructured);
        };
        if start >= end {
            return Err(MalformedResponse::NotStructured);
        }

        match serde_json::from_str::<Value>(&trimmed[start..=end]) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(MalformedResponse::NotStructured),
        }
    }
}

fn collect_encoding_fields<'a>(node: &'a Value, out: &mut Vec<&'a str>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                if key == ENCODING_KEY {
                    if let Value::Object(channels) = value {
                        for channel in channels.values() {
                            collect_channel_fields(channel, out);
                        }
                    }
                } else if key == FACET_KEY {
                    collect_facet_fields(value, out);
                } else if !DATA_KEYS.contains(&key.as_str()) {
                    collect_encoding_fields(value, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_encoding_fields(item, out);
            }
        }
        _ => {}
    }
}

/// A view-level facet is either one field definition or a `row`/`column`
/// mapping of them.
fn collect_facet_fields<'a>(facet: &'a Value, out: &mut Vec<&'a str>) {
    match facet {
        Value::Object(def) if def.contains_key("field") => collect_channel_fields(facet, out),
        Value::Object(channels) => {
            for channel in channels.values() {
                collect_channel_fields(channel, out);
            }
        }
        _ => {}
    }
}

/// A channel is a definition object, or an array of them (e.g. `tooltip`).
/// Conditional definitions and sort-by-field definitions may name fields too.
fn collect_channel_fields<'a>(channel: &'a Value, out: &mut Vec<&'a str>) {
    match channel {
        Value::Object(def) => {
            if let Some(Value::String(field)) = def.get("field") {
                out.push(field);
            }
            for nested in ["condition", "sort"] {
                if let Some(value) = def.get(nested) {
                    collect_channel_fields(value, out);
                }
            }
        }
        Value::Array(defs) => {
            for def in defs {
                collect_channel_fields(def, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cars() -> AllowedFieldSet {
        AllowedFieldSet::default()
    }

    fn payload(x_field: &str) -> String {
        json!({
            "chartSpec": {
                "mark": "bar",
                "encoding": {
                    "x": {"field": x_field, "bin": true, "type": "quantitative"},
                    "y": {"aggregate": "count", "type": "quantitative"}
                }
            },
            "description": "Histogram of horsepower"
        })
        .to_string()
    }

    #[test]
    fn accepts_known_fields_verbatim() {
        let answer = ResponseValidator::validate(&payload("Horsepower"), &cars()).unwrap();
        assert_eq!(answer.description(), "Histogram of horsepower");
        assert_eq!(answer.chart_spec()["encoding"]["x"]["field"], "Horsepower");
        assert_eq!(answer.chart_spec()["encoding"]["x"]["bin"], true);
    }

    #[test]
    fn rejects_unknown_field() {
        let err = ResponseValidator::validate(&payload("TopSpeed"), &cars()).unwrap_err();
        assert_eq!(err, MalformedResponse::FieldNotInDataset("TopSpeed".into()));
    }

    #[test]
    fn rejects_non_json_text() {
        let err = ResponseValidator::validate("Sure! Here is your chart.", &cars()).unwrap_err();
        assert_eq!(err, MalformedResponse::NotStructured);
    }

    #[test]
    fn rejects_json_that_is_not_an_object() {
        let err = ResponseValidator::validate("[1, 2, 3]", &cars()).unwrap_err();
        assert_eq!(err, MalformedResponse::NotStructured);
    }

    #[test]
    fn requires_chart_spec_and_description() {
        let no_spec = json!({"description": "text"}).to_string();
        assert_eq!(
            ResponseValidator::validate(&no_spec, &cars()).unwrap_err(),
            MalformedResponse::MissingField("chartSpec")
        );

        let null_spec = json!({"chartSpec": null, "description": "text"}).to_string();
        assert_eq!(
            ResponseValidator::validate(&null_spec, &cars()).unwrap_err(),
            MalformedResponse::MissingField("chartSpec")
        );

        let empty_description = json!({"chartSpec": {"mark": "point"}, "description": ""}).to_string();
        assert_eq!(
            ResponseValidator::validate(&empty_description, &cars()).unwrap_err(),
            MalformedResponse::MissingField("description")
        );
    }

    #[test]
    fn tolerates_code_fences_around_the_object() {
        let text = format!("```json\n{}\n```", payload("Weight"));
        assert!(ResponseValidator::validate(&text, &cars()).is_ok());
    }

    #[test]
    fn checks_every_channel_not_only_axes() {
        let text = json!({
            "chartSpec": {
                "mark": "point",
                "encoding": {
                    "x": {"field": "Weight"},
                    "y": {"field": "MPG"},
                    "color": {"field": "Manufacturer"}
                }
            },
            "description": "Weight vs MPG"
        })
        .to_string();
        assert_eq!(
            ResponseValidator::validate(&text, &cars()).unwrap_err(),
            MalformedResponse::FieldNotInDataset("Manufacturer".into())
        );
    }

    #[test]
    fn checks_tooltip_arrays_conditions_and_layers() {
        let tooltip = json!({
            "chartSpec": {
                "mark": "point",
                "encoding": {"tooltip": [{"field": "Model"}, {"field": "Price"}]}
            },
            "description": "Tooltips"
        })
        .to_string();
        assert_eq!(
            ResponseValidator::validate(&tooltip, &cars()).unwrap_err(),
            MalformedResponse::FieldNotInDataset("Price".into())
        );

        let layered = json!({
            "chartSpec": {
                "layer": [
                    {"mark": "line", "encoding": {"x": {"field": "Year"}}},
                    {"mark": "rule", "encoding": {
                        "opacity": {"condition": {"field": "Engine", "value": 1}, "value": 0.3}
                    }}
                ]
            },
            "description": "Layers"
        })
        .to_string();
        assert_eq!(
            ResponseValidator::validate(&layered, &cars()).unwrap_err(),
            MalformedResponse::FieldNotInDataset("Engine".into())
        );
    }

    #[test]
    fn checks_view_level_facets() {
        let single = json!({
            "chartSpec": {
                "facet": {"field": "Cylinders"},
                "spec": {"mark": "bar", "encoding": {"x": {"field": "Brand"}}}
            },
            "description": "Per cylinder count"
        })
        .to_string();
        assert_eq!(
            ResponseValidator::validate(&single, &cars()).unwrap_err(),
            MalformedResponse::FieldNotInDataset("Brand".into())
        );

        let rows = json!({
            "chartSpec": {
                "facet": {"row": {"field": "Origin"}, "column": {"field": "Country"}},
                "spec": {"mark": "point", "encoding": {"x": {"field": "Weight"}}}
            },
            "description": "Grid of origins"
        })
        .to_string();
        assert_eq!(
            ResponseValidator::validate(&rows, &cars()).unwrap_err(),
            MalformedResponse::FieldNotInDataset("Country".into())
        );

        let known = json!({
            "chartSpec": {
                "facet": {"field": "Origin"},
                "spec": {"mark": "bar", "encoding": {"x": {"field": "MPG"}}}
            },
            "description": "MPG per origin"
        })
        .to_string();
        assert!(ResponseValidator::validate(&known, &cars()).is_ok());
    }

    #[test]
    fn checks_sort_by_field_inside_channels() {
        let text = json!({
            "chartSpec": {
                "mark": "bar",
                "encoding": {
                    "x": {"field": "Model", "sort": {"field": "Price", "op": "mean"}},
                    "y": {"field": "MPG"}
                }
            },
            "description": "Models by price"
        })
        .to_string();
        assert_eq!(
            ResponseValidator::validate(&text, &cars()).unwrap_err(),
            MalformedResponse::FieldNotInDataset("Price".into())
        );

        let explicit_order = json!({
            "chartSpec": {
                "mark": "bar",
                "encoding": {"x": {"field": "Origin", "sort": ["USA", "Europe", "Japan"]}}
            },
            "description": "Fixed order"
        })
        .to_string();
        assert!(ResponseValidator::validate(&explicit_order, &cars()).is_ok());
    }

    #[test]
    fn inline_data_is_not_treated_as_encoding() {
        let text = json!({
            "chartSpec": {
                "data": {"values": [{"encoding": {"x": {"field": "Ghost"}}}]},
                "mark": "bar",
                "encoding": {"x": {"field": "Origin"}}
            },
            "description": "Cars per origin"
        })
        .to_string();
        assert!(ResponseValidator::validate(&text, &cars()).is_ok());
    }

    #[test]
    fn spec_without_encoding_is_accepted() {
        let text = json!({"chartSpec": {"mark": "text"}, "description": "Nothing to bind"}).to_string();
        assert!(ResponseValidator::validate(&text, &cars()).is_ok());
    }
}
