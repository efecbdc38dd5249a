//! Typed view of the subscriptions document.
//!
//! The JSON store never uses these types; they back the optional
//! `POST /api/subscriptions/validate` check. Every field is defaulted, `null`
//! reads as missing and counts are kept as raw JSON, so partial or sloppy
//! documents still deserialize and problems surface as issues. Only a value
//! of the wrong shape (say, `"webhooks": 5`) fails deserialization.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Read `null` as the field's default, the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Supported webhook targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WebhookType {
    Wework,
    Feishu,
    Dingtalk,
}

impl WebhookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookType::Wework => "wework",
            WebhookType::Feishu => "feishu",
            WebhookType::Dingtalk => "dingtalk",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wework" => Some(WebhookType::Wework),
            "feishu" => Some(WebhookType::Feishu),
            "dingtalk" => Some(WebhookType::Dingtalk),
            _ => None,
        }
    }
}

/// A count sent by the client, kept as raw JSON.
///
/// Missing and `null` both read as 0. Negative, fractional or non-numeric
/// values deserialize fine and are reported by `validate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Count(pub Value);

impl Count {
    /// The count as a non-negative integer, `None` if it is anything else.
    pub fn get(&self) -> Option<u64> {
        match &self.0 {
            Value::Null => Some(0),
            value => value.as_u64(),
        }
    }
}

/// Keyword matching rules for a subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordRules {
    #[serde(default, deserialize_with = "null_as_default")]
    pub normal: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excluded: Vec<String>,
    /// Maximum number of results; 0 means unlimited
    #[serde(default)]
    pub limit: Count,
}

/// A webhook push target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Webhook {
    /// Kept as a string so unknown types are reported instead of rejected.
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// AI-assisted search parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiSearch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default)]
    pub trigger_threshold: Count,
    #[serde(default, deserialize_with = "null_as_default")]
    pub search_keywords: Vec<String>,
    #[serde(default)]
    pub time_range_hours: Count,
    #[serde(default)]
    pub max_results: Count,
}

/// Push schedule for a subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cron: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timezone: String,
}

/// A named rule bundle: keywords, webhook targets and schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    /// Client-generated, never rewritten by the server
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: KeywordRules,
    #[serde(default, deserialize_with = "null_as_default")]
    pub webhooks: Vec<Webhook>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ai_search: AiSearch,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule: Schedule,
}

/// The root of `subscriptions.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub global_settings: serde_json::Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subscriptions: Vec<Subscription>,
}

/// A single problem found in a subscriptions document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON-pointer-like location, e.g. `subscriptions[2].webhooks[0].url`
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result body of `POST /api/subscriptions/validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl From<Vec<ValidationIssue>> for ValidationReport {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }
}

impl SubscriptionDocument {
    /// Check the document for structural problems. An empty list means valid.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut seen_ids = HashSet::new();

        for (i, sub) in self.subscriptions.iter().enumerate() {
            let at = format!("subscriptions[{}]", i);

            if sub.id.trim().is_empty() {
                issues.push(ValidationIssue::new(format!("{}.id", at), "id is required"));
            } else if !seen_ids.insert(sub.id.as_str()) {
                issues.push(ValidationIssue::new(
                    format!("{}.id", at),
                    format!("duplicate subscription id {}", sub.id),
                ));
            }

            if sub.name.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    format!("{}.name", at),
                    "name is required",
                ));
            }

            for (j, hook) in sub.webhooks.iter().enumerate() {
                let hook_at = format!("{}.webhooks[{}]", at, j);
                if WebhookType::parse(&hook.kind).is_none() {
                    issues.push(ValidationIssue::new(
                        format!("{}.type", hook_at),
                        format!(
                            "unknown webhook type {:?}, expected one of wework, feishu, dingtalk",
                            hook.kind
                        ),
                    ));
                }
                if hook.url.trim().is_empty() {
                    issues.push(ValidationIssue::new(
                        format!("{}.url", hook_at),
                        "url is required",
                    ));
                }
            }

            let counts = [
                ("keywords.limit", &sub.keywords.limit),
                ("ai_search.trigger_threshold", &sub.ai_search.trigger_threshold),
                ("ai_search.time_range_hours", &sub.ai_search.time_range_hours),
                ("ai_search.max_results", &sub.ai_search.max_results),
            ];
            for (name, count) in counts {
                if count.get().is_none() {
                    issues.push(ValidationIssue::new(
                        format!("{}.{}", at, name),
                        format!("expected a non-negative integer, got {}", count.0),
                    ));
                }
            }

            if sub.schedule.enabled && sub.schedule.cron.split_whitespace().count() != 5 {
                issues.push(ValidationIssue::new(
                    format!("{}.schedule.cron", at),
                    format!(
                        "cron expression {:?} must have five fields",
                        sub.schedule.cron
                    ),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> SubscriptionDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_example_document_is_valid() {
        let doc = parse(json!({
            "version": "1.0",
            "subscriptions": [{
                "id": "sub_1",
                "name": "A",
                "enabled": true,
                "keywords": {"normal": ["x"], "required": [], "excluded": [], "limit": 0},
                "webhooks": [],
                "ai_search": {"enabled": false, "search_keywords": []},
                "schedule": {"enabled": true, "cron": "0 8 * * *", "timezone": "Asia/Shanghai"}
            }]
        }));

        assert!(doc.validate().is_empty());
        assert_eq!(doc.subscriptions[0].keywords.normal, vec!["x"]);
        assert!(doc.global_settings.is_empty());
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let doc = parse(json!({
            "subscriptions": [
                {"id": "sub_1", "name": "A"},
                {"id": "sub_1", "name": "B"}
            ]
        }));

        let issues = doc.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "subscriptions[1].id");
    }

    #[test]
    fn test_webhook_problems_reported() {
        let doc = parse(json!({
            "subscriptions": [{
                "id": "sub_1",
                "name": "A",
                "webhooks": [
                    {"type": "feishu", "url": "https://open.feishu.cn/hook/abc", "name": "team"},
                    {"type": "slack", "url": "", "name": "other"}
                ]
            }]
        }));

        let fields: Vec<_> = doc.validate().into_iter().map(|i| i.field).collect();
        assert_eq!(
            fields,
            vec![
                "subscriptions[0].webhooks[1].type",
                "subscriptions[0].webhooks[1].url"
            ]
        );
    }

    #[test]
    fn test_bad_cron_only_checked_when_enabled() {
        let disabled = parse(json!({
            "subscriptions": [{"id": "a", "name": "A", "schedule": {"enabled": false, "cron": "bad"}}]
        }));
        assert!(disabled.validate().is_empty());

        let enabled = parse(json!({
            "subscriptions": [{"id": "a", "name": "A", "schedule": {"enabled": true, "cron": "0 8 *"}}]
        }));
        let issues = enabled.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "subscriptions[0].schedule.cron");
    }

    #[test]
    fn test_missing_name_and_id() {
        let doc = parse(json!({"subscriptions": [{}]}));
        assert_eq!(doc.validate().len(), 2);
    }

    #[test]
    fn test_out_of_range_counts_and_nulls_reported() {
        let doc = parse(json!({
            "version": null,
            "subscriptions": [{
                "id": "sub_1",
                "name": null,
                "enabled": null,
                "keywords": {"normal": null, "limit": -1},
                "webhooks": null,
                "ai_search": {
                    "trigger_threshold": 2.5,
                    "time_range_hours": null,
                    "max_results": "10"
                },
                "schedule": null
            }]
        }));

        let fields: Vec<_> = doc.validate().into_iter().map(|i| i.field).collect();
        assert_eq!(
            fields,
            vec![
                "subscriptions[0].name",
                "subscriptions[0].keywords.limit",
                "subscriptions[0].ai_search.trigger_threshold",
                "subscriptions[0].ai_search.max_results",
            ]
        );
        assert_eq!(doc.subscriptions[0].ai_search.time_range_hours.get(), Some(0));
    }

    #[test]
    fn test_count_get() {
        assert_eq!(Count(json!(24)).get(), Some(24));
        assert_eq!(Count(Value::Null).get(), Some(0));
        assert_eq!(Count(json!(-1)).get(), None);
        assert_eq!(Count(json!(1.5)).get(), None);
    }

    #[test]
    fn test_webhook_type_parse() {
        for kind in [WebhookType::Wework, WebhookType::Feishu, WebhookType::Dingtalk] {
            assert_eq!(WebhookType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(WebhookType::parse("slack"), None);
    }

    #[test]
    fn test_report_from_issues() {
        let report = ValidationReport::from(Vec::new());
        assert!(report.valid);
    }
}
