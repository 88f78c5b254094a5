//! Currency code table.
//!
//! ```json
//! { "currencyCodes": { "1": "BTC", "2": "ETH" } }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeTable {
    #[serde(default)]
    currency_codes: HashMap<String, String>,
}

/// Load the currency code table. A missing file yields an empty table.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, is not valid JSON, or
/// has a key that is not an integer.
pub fn load_currency_codes(path: impl AsRef<Path>) -> Result<HashMap<i64, String>, ConfigError> {
    let path = path.as_ref();
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Currency code table not found, labels will be empty");
            return Ok(HashMap::new());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let table: CodeTable =
        serde_json::from_str(&json).map_err(|source| ConfigError::CurrencyCodes {
            path: path.to_path_buf(),
            source,
        })?;

    table
        .currency_codes
        .into_iter()
        .map(|(code, symbol)| {
            code.trim()
                .parse::<i64>()
                .map(|code| (code, symbol))
                .map_err(|_| ConfigError::InvalidCurrencyCode(code))
        })
        .collect()
}
