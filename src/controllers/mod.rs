//! Controladores de comandos
//!
//! Ejecutan transiciones contra el almacén y devuelven solo el resultado de la
//! escritura; el estado a mostrar llega siempre por las suscripciones.

pub mod lifecycle_controller;
pub mod request_controller;

use serde_json::{Map, Value};

pub use lifecycle_controller::{LifecycleController, TransitionOutcome};
pub use request_controller::{RequestController, RequestOutcome};

pub(crate) fn field_map<'a, I>(entries: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a str, Value)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
