//! Menu catalog fetched from the ledger's menu sheet.

use crate::aliases::{read_field, read_number, read_text, LogicalField};
use crate::amount::Amount;
use crate::config::is_configured_value;
use crate::error::{Error, Result};
use crate::ledger::{set_query_pairs, LedgerRequest, LedgerTransport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Image shown when a row has no usable image URL.
pub const DEFAULT_MENU_IMAGE: &str = "/menu-placeholder.svg";

/// Category for items whose name matches no keyword group.
pub const DEFAULT_CATEGORY: &str = "Popular";

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Beverages",
        &["tea", "coffee", "drink", "juice", "shake", "lassi", "coke", "campa"],
    ),
    (
        "Quick Bites",
        &["sandwich", "vada pav", "samosa", "roll", "burger", "cutlet", "toast"],
    ),
    (
        "South Indian",
        &["idli", "dosa", "uttapam", "poha", "upma", "paratha"],
    ),
    ("Meals", &["noodle", "manchurian", "chowmein", "rice"]),
];

/// One orderable menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Amount,
    pub image: String,
    /// Display label, never empty.
    pub category: String,
    pub active: bool,
}

/// Normalise one loosely shaped menu row. `index` is the row's position, used as the id when
/// the row has none.
///
/// Rows that are not objects, have no name, or have no non-negative numeric price are dropped.
pub fn normalize_menu_row(row: &Value, index: usize) -> Option<MenuItem> {
    let row = row.as_object()?;

    let name = read_text(row, LogicalField::MenuName)?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let price = Amount::try_from(read_number(row, LogicalField::MenuPrice)?).ok()?;
    let id = read_text(row, LogicalField::MenuId).unwrap_or_else(|| (index + 1).to_string());
    let image = normalize_image_url(
        read_text(row, LogicalField::MenuImage)
            .unwrap_or_default()
            .trim(),
    );
    let category = category_label(
        read_text(row, LogicalField::MenuCategory)
            .unwrap_or_default()
            .trim(),
        &name,
    );
    let active = read_field(row, LogicalField::MenuActive)
        .map(is_truthy)
        .unwrap_or(true);

    Some(MenuItem {
        id,
        name,
        price,
        image,
        category,
        active,
    })
}

/// Loose boolean: `true`, `1`, or one of `1, true, yes, y, active` in any case.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "active"
        ),
        _ => false,
    }
}

/// Usable https image URL, or the placeholder.
///
/// http URLs are upgraded to https. Non-web schemes, unparseable values and the retired
/// `source.unsplash.com` service fall back to [`DEFAULT_MENU_IMAGE`].
pub fn normalize_image_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return DEFAULT_MENU_IMAGE.to_string();
    };
    if url.host_str() == Some("source.unsplash.com") {
        return DEFAULT_MENU_IMAGE.to_string();
    }
    match url.scheme() {
        "https" => url.to_string(),
        "http" => match url.set_scheme("https") {
            Ok(()) => url.to_string(),
            Err(()) => DEFAULT_MENU_IMAGE.to_string(),
        },
        _ => DEFAULT_MENU_IMAGE.to_string(),
    }
}

/// Title-cased `raw`, or a category inferred from `name` when `raw` is blank.
pub fn category_label(raw: &str, name: &str) -> String {
    let words: Vec<String> = raw
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        infer_category(name).to_string()
    } else {
        words.join(" ")
    }
}

/// Category guessed from keywords in an item name.
pub fn infer_category(name: &str) -> &'static str {
    let name = name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| name.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Fetch the menu and keep the active items.
///
/// Issues `GET <endpoint>?action=menu`; accepts `{"items": [...]}` or a bare array.
///
/// # Errors
///
/// - `Error::ConfigMissing`: `endpoint` is blank, a placeholder or not a URL.
/// - `Error::NetworkError` / `Error::HttpError`: the request failed.
/// - `Error::DeserializationError`: the body is not JSON.
pub async fn fetch_active_menu<T: LedgerTransport>(
    transport: &T,
    endpoint: &str,
) -> Result<Vec<MenuItem>> {
    if !is_configured_value(endpoint) {
        return Err(Error::ConfigMissing("menu endpoint is not configured".to_string()));
    }
    let base = Url::parse(endpoint.trim())
        .map_err(|e| Error::ConfigMissing(format!("menu endpoint {:?}: {}", endpoint, e)))?;
    let request = LedgerRequest::Get {
        url: set_query_pairs(&base, &[("action".to_string(), "menu".to_string())]),
    };

    let response = transport.send(&request).await?;
    if !response.is_success() {
        return Err(Error::HttpError {
            status: response.status,
            body: response.body.trim().chars().take(200).collect(),
        });
    }
    let payload: Value = serde_json::from_str(&response.body)?;
    let rows: &[Value] = match &payload {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let items: Vec<MenuItem> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| normalize_menu_row(row, index))
        .filter(|item| item.active)
        .collect();
    debug!("Fetched {} active menu items of {} rows", items.len(), rows.len());
    Ok(items)
}
