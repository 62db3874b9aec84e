use std::collections::BTreeMap;

use vg_schemas::ModelError;

/// Split `key=value`. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), ModelError> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(ModelError::schema(format!(
            "expected key=value, got {raw:?}"
        ))),
    }
}

/// Collect `key=value` pairs into a field map. A key given twice is rejected
/// rather than silently overwritten.
pub fn fields_from_assignments<I, S>(pairs: I) -> Result<BTreeMap<String, String>, ModelError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut fields = BTreeMap::new();
    for raw in pairs {
        let (k, v) = parse_assignment(raw.as_ref())?;
        if fields.contains_key(&k) {
            return Err(ModelError::schema(format!("field '{k}' given more than once")));
        }
        fields.insert(k, v);
    }
    Ok(fields)
}
