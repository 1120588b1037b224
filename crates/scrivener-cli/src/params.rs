//! Parameter parsing for `--param` and `--json-params`.

use scrivener_client::InvokeError;
use scrivener_protocol::Params;
use serde_json::{Number, Value};

/// Builds the request parameters. `--json-params` replaces every `--param`.
pub(crate) fn build_params(
    pairs: &[String],
    json_params: Option<&str>,
) -> Result<Params, InvokeError> {
    if let Some(text) = json_params {
        return match serde_json::from_str(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(invalid("--json-params must be a JSON object")),
            Err(error) => Err(invalid(format!("--json-params is not valid JSON: {error}"))),
        };
    }

    let mut params = Params::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| invalid(format!("parameter '{pair}' must have the form key=value")))?;
        let name = key.trim();
        if name.is_empty() {
            return Err(invalid(format!("parameter '{pair}' has an empty key")));
        }
        params.insert(name.to_owned(), typed_value(raw));
    }
    Ok(params)
}

/// Interprets `raw` as a boolean, integer or finite float, falling back to a
/// string.
fn typed_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return Value::from(integer);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(raw.to_owned()), Value::Number)
}

fn invalid(message: impl Into<String>) -> InvokeError {
    InvokeError::InvalidArgument {
        message: message.into(),
    }
}
