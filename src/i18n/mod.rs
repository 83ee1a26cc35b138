//! 多语言文案
//!
//! 每种语言一个 JSON 文件，首次使用时加载并常驻内存，之后只读。

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fa,
    En,
}

impl Locale {
    pub const SUPPORTED: [Locale; 2] = [Locale::Fa, Locale::En];
    pub const DEFAULT: Locale = Locale::Fa;

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Fa => "fa",
            Locale::En => "en",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// 按语言前缀拼接路径，默认语言不加前缀
    pub fn localized_path(&self, path: &str) -> String {
        if self.is_default() {
            path.to_string()
        } else {
            format!("/{}{}", self.as_str(), path)
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fa" => Ok(Locale::Fa),
            "en" => Ok(Locale::En),
            other => Err(UnsupportedLocale(other.to_string())),
        }
    }
}

/// 扁平化后的文案表，嵌套键用 `.` 连接
#[derive(Debug, Default, Clone, serde::Serialize)]
#[serde(transparent)]
pub struct Bundle {
    entries: HashMap<String, String>,
}

impl Bundle {
    pub fn from_json(value: &Value) -> Self {
        let mut entries = HashMap::new();
        flatten("", value, &mut entries);
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        Value::String(text) => {
            out.insert(prefix.to_string(), text.clone());
        }
        Value::Null => {}
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

pub struct I18n {
    dir: PathBuf,
    bundles: HashMap<Locale, OnceCell<Arc<Bundle>>>,
}

impl I18n {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let bundles = Locale::SUPPORTED
            .iter()
            .map(|locale| (*locale, OnceCell::new()))
            .collect();
        Self {
            dir: dir.into(),
            bundles,
        }
    }

    /// 取指定语言的文案表，加载失败时回退到默认语言
    pub async fn bundle(&self, locale: Locale) -> Arc<Bundle> {
        let loaded = match self.load(locale).await {
            Err(err) if !locale.is_default() => {
                tracing::warn!("Failed to load {} messages, using default: {}", locale, err);
                self.load(Locale::DEFAULT).await
            }
            other => other,
        };

        loaded.unwrap_or_else(|err| {
            tracing::warn!("Failed to load default messages: {}", err);
            Arc::new(Bundle::default())
        })
    }

    pub async fn translator(&self, locale: Locale) -> Translator {
        Translator {
            locale,
            bundle: self.bundle(locale).await,
        }
    }

    async fn load(&self, locale: Locale) -> Result<Arc<Bundle>, String> {
        let cell = self
            .bundles
            .get(&locale)
            .ok_or_else(|| format!("locale {} not configured", locale))?;

        cell.get_or_try_init(|| async {
            let path = self.dir.join(format!("{}.json", locale));
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            let value: Value = serde_json::from_str(&raw)
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            tracing::info!("Loaded {} messages from {}", locale, path.display());
            Ok(Arc::new(Bundle::from_json(&value)))
        })
        .await
        .cloned()
    }
}

pub struct Translator {
    locale: Locale,
    bundle: Arc<Bundle>,
}

impl Translator {
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// 缺失的键记录警告并原样返回
    pub fn t(&self, key: &str) -> String {
        match self.bundle.get(key) {
            Some(text) => text.to_string(),
            None => {
                tracing::warn!("Missing translation for key: \"{}\" ({})", key, self.locale);
                key.to_string()
            }
        }
    }
}
