//! Operaciones sobre documentos JSON compartidas por los adaptadores

use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::{Collection, Direction, Filter, OrderBy, Precondition, StoreError};

/// Leer un campo por ruta con puntos; ausente equivale a `null`
pub fn get_path<'a>(data: &'a Value, path: &str) -> &'a Value {
    let mut current = data;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return &Value::Null,
        }
    }
    current
}

/// Escribir un campo por ruta con puntos, creando objetos intermedios
pub fn set_path(data: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = data;

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Fusionar campos parciales sobre un documento
pub fn apply_fields(data: &mut Value, fields: &Map<String, Value>) {
    for (path, value) in fields {
        set_path(data, path, value.clone());
    }
}

/// Verificar precondiciones contra el estado actual del documento
pub fn check_preconditions(
    collection: Collection,
    id: &str,
    data: &Value,
    version: u64,
    preconditions: &[Precondition],
) -> Result<(), StoreError> {
    for precondition in preconditions {
        match precondition {
            Precondition::FieldEquals { path, value } => {
                let actual = get_path(data, path);
                if actual != value {
                    return Err(StoreError::PreconditionFailed {
                        collection,
                        id: id.to_string(),
                        detail: format!("{} es {} (esperado {})", path, actual, value),
                    });
                }
            }
            Precondition::Version(expected) => {
                if *expected != version {
                    return Err(StoreError::PreconditionFailed {
                        collection,
                        id: id.to_string(),
                        detail: format!("versión {} (esperada {})", version, expected),
                    });
                }
            }
        }
    }
    Ok(())
}

pub fn matches_filters(data: &Value, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|filter| get_path(data, &filter.path) == &filter.value)
}

/// Orden total sobre valores JSON: null < bool < número < string < resto
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

pub fn compare_by(order: &OrderBy, a: &Value, b: &Value) -> Ordering {
    let ord = compare_values(get_path(a, &order.path), get_path(b, &order.path));
    match order.direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_path_creates_nested_objects() {
        let mut doc = json!({ "status": "AVAILABLE" });
        set_path(&mut doc, "timestamps.startedAt", json!("2025-01-01T00:00:00.000Z"));

        assert_eq!(
            get_path(&doc, "timestamps.startedAt"),
            &json!("2025-01-01T00:00:00.000Z")
        );
        assert_eq!(get_path(&doc, "status"), &json!("AVAILABLE"));
    }

    #[test]
    fn missing_field_reads_as_null() {
        let doc = json!({ "driverId": null });
        assert_eq!(get_path(&doc, "driverId"), &Value::Null);
        assert_eq!(get_path(&doc, "timestamps.returnedAt"), &Value::Null);
    }

    #[test]
    fn failed_precondition_reports_actual_value() {
        let doc = json!({ "status": "ASSIGNED" });
        let err = check_preconditions(
            Collection::Vehicles,
            "V1",
            &doc,
            3,
            &[Precondition::field_equals("status", "AVAILABLE")],
        )
        .unwrap_err();

        match err {
            StoreError::PreconditionFailed { id, detail, .. } => {
                assert_eq!(id, "V1");
                assert!(detail.contains("ASSIGNED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn version_precondition() {
        let doc = json!({});
        assert!(check_preconditions(Collection::Users, "u", &doc, 2, &[Precondition::Version(2)]).is_ok());
        assert!(check_preconditions(Collection::Users, "u", &doc, 2, &[Precondition::Version(1)]).is_err());
    }
}
