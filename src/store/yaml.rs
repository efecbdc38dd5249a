//! YAML-backed store for the system settings artifact.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use saphyr_parser::{Event, Parser, ScalarStyle, Tag};
use serde_json::{Map, Value};

use super::{
    backup_path_for, is_empty_document, read_primary, write_with_backup, Document, SaveOutcome,
    StoreError, StoreResult,
};

/// Store for the settings document (`config.yaml`).
///
/// Sequences are written in block style, one item per line, so on-disk diffs
/// stay reviewable. Key order is preserved and non-ASCII text is written as is.
///
/// Of the explicit core tags, `!!str` forces a string and `!!null`, `!!seq`
/// and `!!map` are accepted. Any other tag fails the load with `Parse`.
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl YamlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = backup_path_for(&path);
        Self { path, backup_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Load and parse the settings document.
    pub async fn load(&self) -> StoreResult<Document> {
        let content = read_primary(&self.path).await?;

        // An empty YAML stream is a null document, not an error.
        if content.trim().is_empty() {
            return Ok(Document::Null);
        }

        let content = resolve_tags(&content).map_err(|message| {
            tracing::warn!(
                path = %self.path.display(),
                error = %message,
                "Unsupported tag in settings"
            );
            StoreError::parse(&self.path, message)
        })?;

        let doc = serde_saphyr::from_str::<Document>(&content).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to parse settings");
            StoreError::parse(&self.path, e.to_string())
        })?;

        tracing::debug!(path = %self.path.display(), "Loaded settings");
        Ok(doc)
    }

    /// Back up the current file and write `doc` in its place.
    pub async fn save(&self, doc: &Document) -> StoreResult<SaveOutcome> {
        if is_empty_document(doc) {
            return Err(StoreError::empty_document(&self.path));
        }

        let content = render(doc).map_err(|e| StoreError::serialization(&self.path, e))?;

        write_with_backup(&self.path, &self.backup_path, content.as_bytes())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to save settings"))?;

        tracing::info!(path = %self.path.display(), "Saved settings");
        Ok(SaveOutcome {
            message: "Configuration saved".to_string(),
        })
    }
}

/// Render a document as block-style YAML.
///
/// Strings with a line that starts or ends with a space are written as
/// double-quoted scalars, since plain and block styles can drop that space.
/// The result is parsed back and must reproduce `doc`.
fn render(doc: &Document) -> Result<String, String> {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let mut quoted = Vec::new();
    let marked = mark_edge_spaces(doc, &nonce, &mut quoted)?;

    let mut out = serde_saphyr::to_string(&marked).map_err(|e| e.to_string())?;
    for (token, scalar) in &quoted {
        out = out.replacen(token.as_str(), scalar, 1);
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }

    let reparsed = serde_saphyr::from_str::<Document>(&out).map_err(|e| e.to_string())?;
    if &reparsed != doc {
        return Err("rendered YAML does not reproduce the document".to_string());
    }
    Ok(out)
}

/// Copy `value`, swapping each string with edge spaces for a unique plain
/// token. `quoted` collects each token with the JSON-quoted string, which is
/// also a valid YAML double-quoted scalar.
fn mark_edge_spaces(
    value: &Value,
    nonce: &str,
    quoted: &mut Vec<(String, String)>,
) -> Result<Value, String> {
    let mark = |s: &str, quoted: &mut Vec<(String, String)>| -> Result<String, String> {
        if !s
            .split('\n')
            .any(|line| line.starts_with(' ') || line.ends_with(' '))
        {
            return Ok(s.to_string());
        }
        let token = format!("tp{}q{}q", nonce, quoted.len());
        let scalar = serde_json::to_string(s).map_err(|e| e.to_string())?;
        quoted.push((token.clone(), scalar));
        Ok(token)
    };

    Ok(match value {
        Value::String(s) => Value::String(mark(s, quoted)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| mark_edge_spaces(item, nonce, quoted))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                let key = mark(key, quoted)?;
                out.insert(key, mark_edge_spaces(item, nonce, quoted)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

/// Apply explicit tags that the untyped deserializer would ignore.
///
/// A plain scalar tagged `!!str` is rewritten as a double-quoted scalar so it
/// stays a string. Syntax errors are left for the deserializer to report.
fn resolve_tags(content: &str) -> Result<Cow<'_, str>, String> {
    let mut rewrites = Vec::new();

    for event in Parser::new_from_str(content) {
        let Ok((event, span)) = event else { break };
        let line = span.start.line();
        match event {
            Event::Scalar(value, style, _, Some(tag)) => match core_suffix(&tag) {
                Some("str") => {
                    if matches!(style, ScalarStyle::Plain) {
                        let scalar = serde_json::to_string(&*value)
                            .map_err(|e| e.to_string())?;
                        rewrites.push((span.start.index(), span.end.index(), scalar));
                    }
                }
                Some("null") => {}
                _ => return Err(format!("unsupported tag {} on line {}", tag, line)),
            },
            Event::SequenceStart(_, Some(tag)) if core_suffix(&tag) != Some("seq") => {
                return Err(format!("unsupported tag {} on line {}", tag, line));
            }
            Event::MappingStart(_, Some(tag)) if core_suffix(&tag) != Some("map") => {
                return Err(format!("unsupported tag {} on line {}", tag, line));
            }
            _ => {}
        }
    }

    if rewrites.is_empty() {
        return Ok(Cow::Borrowed(content));
    }

    // Parser positions count chars, not bytes.
    let mut out = String::with_capacity(content.len() + rewrites.len() * 2);
    let mut pending = rewrites.iter().peekable();
    let mut skip_until = None;
    for (i, ch) in content.chars().enumerate() {
        if let Some(end) = skip_until {
            if i < end {
                continue;
            }
            skip_until = None;
        }
        if let Some((start, end, scalar)) = pending.peek() {
            if i == *start {
                out.push_str(scalar);
                skip_until = Some(*end);
                pending.next();
                continue;
            }
        }
        out.push(ch);
    }
    Ok(Cow::Owned(out))
}

/// Suffix of a core schema tag (`!!str` gives `str`), `None` for other tags.
fn core_suffix(tag: &Tag) -> Option<&str> {
    tag.is_yaml_core_schema().then_some(tag.suffix.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_settings() -> Document {
        json!({
            "app": {
                "version_check_url": "https://example.com/version",
                "show_version_update": true
            },
            "crawler": {
                "request_interval": 1000,
                "enable_crawler": true,
                "use_proxy": false
            },
            "report": {
                "mode": "daily",
                "rank_threshold": 5
            },
            "weight": {
                "rank_weight": 0.6,
                "frequency_weight": 0.3,
                "hotness_weight": 0.1
            },
            "platforms": [
                {"id": "weibo", "name": "微博"},
                {"id": "zhihu", "name": "知乎"}
            ],
            "notification": {
                "enable_notification": true,
                "push_window": {
                    "enabled": false,
                    "time_range": {"start": "20:00", "end": "22:00"}
                }
            }
        })
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("config.yaml"));
        let doc = sample_settings();

        store.save(&doc).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_lists_are_block_style() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("config.yaml"));

        store
            .save(&json!({"keywords": ["alpha", "beta", "gamma"]}))
            .await
            .unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(!content.contains('['), "flow sequence in:\n{}", content);
        for word in ["alpha", "beta", "gamma"] {
            assert!(
                content.lines().any(|l| l.trim() == format!("- {}", word)),
                "missing block item {} in:\n{}",
                word,
                content
            );
        }
    }

    #[tokio::test]
    async fn test_key_order_and_unicode_preserved() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("config.yaml"));

        store
            .save(&json!({"zeta": "热点新闻", "alpha": 1}))
            .await
            .unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        let zeta = content.find("zeta").unwrap();
        let alpha = content.find("alpha").unwrap();
        assert!(zeta < alpha);
        assert!(content.contains("热点新闻"));
    }

    #[tokio::test]
    async fn test_backup_holds_previous_version() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("config.yaml"));

        store.save(&json!({"report": {"mode": "daily"}})).await.unwrap();
        let first = std::fs::read(store.path()).unwrap();

        store
            .save(&json!({"report": {"mode": "incremental"}}))
            .await
            .unwrap();

        assert_eq!(std::fs::read(store.backup_path()).unwrap(), first);
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded["report"]["mode"], "incremental");
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.yaml");
        let store = YamlConfigStore::new(&path);

        let outcome = store.save(&sample_settings()).await.unwrap();

        assert!(path.exists());
        assert!(!outcome.message.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("missing.yaml"));

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[tokio::test]
    async fn test_load_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "app: [unclosed\n  : : :\n").unwrap();
        let store = YamlConfigStore::new(&path);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[tokio::test]
    async fn test_load_empty_file_is_null() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();

        let doc = YamlConfigStore::new(&path).load().await.unwrap();
        assert!(doc.is_null());
    }

    #[tokio::test]
    async fn test_round_trip_edge_spaces_and_special_scalars() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("config.yaml"));
        let doc = json!({
            "keywords": ["trail ", " lead", "  both  ", "plain"],
            "name": "热点 ",
            "key with space ": "value",
            "yes": "yes",
            "version": "1.0",
            "tilde": "~",
            "octal": "0123",
            "comment": "#c",
            "colon": "a: b",
            "multi": "first line\nsecond line \n",
            "empty": "",
            "null_word": "null",
            "dash": "- item",
            "1": "numeric key"
        });

        store.save(&doc).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, doc);

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("\"trail \""), "unquoted edge space in:\n{}", content);
        assert!(content.contains("- plain"));
    }

    #[tokio::test]
    async fn test_load_str_tag_keeps_string() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "a: !!str 5\nb: !!str true\nc: !!str 'quoted'\nd: 7\nlist:\n  - !!str 0.5\n",
        )
        .unwrap();

        let doc = YamlConfigStore::new(&path).load().await.unwrap();
        assert_eq!(
            doc,
            json!({"a": "5", "b": "true", "c": "quoted", "d": 7, "list": ["0.5"]})
        );
    }

    #[tokio::test]
    async fn test_load_rejects_other_tags() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let store = YamlConfigStore::new(&path);

        for content in ["a: !!int 5\n", "a: !custom value\n", "a: !!binary aGk=\n"] {
            std::fs::write(&path, content).unwrap();
            let err = store.load().await.unwrap_err();
            assert!(matches!(err, StoreError::Parse { .. }), "{}: {}", content, err);
            assert!(err.to_string().contains("unsupported tag"));
        }
    }

    #[test]
    fn test_resolve_tags_leaves_untagged_content_alone() {
        let content = "a: 5\nb: \"!!str\"\n";
        assert!(matches!(resolve_tags(content), Ok(Cow::Borrowed(_))));
    }

    #[tokio::test]
    async fn test_save_rejects_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = YamlConfigStore::new(dir.path().join("config.yaml"));

        let err = store.save(&json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyDocument { .. }));
        assert!(!store.path().exists());
    }
}
