use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(paths) = expect_optional_object(root, "paths")? {
        validate_optional_string_field(paths, "paths.source_csv", "source_csv")?;
        validate_optional_string_field(paths, "paths.artifacts_dir", "artifacts_dir")?;
    }

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_optional_string_field(corpus, "corpus.source_label", "source_label")?;
        if let Some(columns) = expect_optional_object(corpus, "columns")? {
            for key in ["opportunity", "strategy", "learnings"] {
                validate_optional_string_field(columns, &format!("corpus.columns.{}", key), key)?;
            }
        }
    }

    if let Some(chunking) = expect_optional_object(root, "chunking")? {
        validate_u64_field(chunking, "chunking.max_chars", "max_chars", 1, 1_000_000)?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 1_000)?;
        validate_u64_field(
            retrieval,
            "retrieval.query_timeout_ms",
            "query_timeout_ms",
            1,
            600_000,
        )?;
    }

    if let Some(context) = expect_optional_object(root, "context")? {
        validate_optional_string_field(context, "context.preamble", "preamble")?;
        validate_optional_string_field(context, "context.postamble", "postamble")?;
        validate_optional_string_field(context, "context.separator", "separator")?;
        validate_u64_field(
            context,
            "context.max_context_chars",
            "max_context_chars",
            0,
            10_000_000,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        if let Some(provider) = embedding.get("provider") {
            match provider.as_str() {
                Some("http") | Some("hashing") => {}
                _ => return Err(config_type_error("embedding.provider", "'http' or 'hashing'")),
            }
        }
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 4_096)?;
        validate_u64_field(embedding, "embedding.timeout_secs", "timeout_secs", 1, 86_400)?;
        validate_u64_field(
            embedding,
            "embedding.hashing_dimension",
            "hashing_dimension",
            1,
            65_536,
        )?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_optional_string_field(generation, "generation.base_url", "base_url")?;
        validate_optional_string_field(generation, "generation.model", "model")?;
        validate_u64_field(generation, "generation.max_tokens", "max_tokens", 1, 1_000_000)?;
        validate_u64_field(generation, "generation.timeout_secs", "timeout_secs", 1, 86_400)?;
        validate_f64_field(generation, "generation.temperature", "temperature", 0.0, 2.0)?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(classifier) = expect_optional_object(root, "classifier")? {
        if let Some(rules) = classifier.get("rules") {
            let items = rules
                .as_array()
                .ok_or_else(|| config_type_error("classifier.rules", "array"))?;
            for (index, item) in items.iter().enumerate() {
                let path_prefix = format!("classifier.rules[{}]", index);
                let entry = item
                    .as_object()
                    .ok_or_else(|| config_type_error(&path_prefix, "object"))?;
                validate_required_string_field(entry, &format!("{}.keyword", path_prefix), "keyword")?;
                validate_required_string_field(
                    entry,
                    &format!("{}.category", path_prefix),
                    "category",
                )?;
            }
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if !value.is_null() && value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_a_complete_config() {
        let config = json!({
            "paths": { "source_csv": "data/raw/corpus.csv" },
            "retrieval": { "top_k": 5, "query_timeout_ms": 2000 },
            "embedding": { "provider": "hashing", "hashing_dimension": 128 },
            "generation": { "api_key": null, "temperature": 0.7 },
            "server": { "port": 8080, "cors_allowed_origins": ["http://localhost:3000"] },
            "classifier": { "rules": [{ "keyword": "food", "category": "FoodTech" }] }
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_top_k() {
        let err = validate_config(&json!({ "retrieval": { "top_k": 0 } })).unwrap_err();
        assert!(err.to_string().contains("retrieval.top_k"));
    }

    #[test]
    fn rejects_unknown_embedding_provider() {
        let err = validate_config(&json!({ "embedding": { "provider": "magic" } })).unwrap_err();
        assert!(err.to_string().contains("embedding.provider"));
    }

    #[test]
    fn rejects_rule_without_category() {
        let err = validate_config(&json!({
            "classifier": { "rules": [{ "keyword": "food" }] }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("classifier.rules[0].category"));
    }

    #[test]
    fn rejects_non_object_section() {
        assert!(validate_config(&json!({ "server": "localhost" })).is_err());
    }
}
