//! 설정 관리 — 실행 옵션 레이어 병합 및 기본값 적용
//!
//! [`EffectiveOptions`]는 한 번의 탐색 패스에서 사용하는 최종 실행 옵션입니다.
//! 네 개의 [`PartialOptions`] 레이어를 필드 단위로 병합한 뒤 기본값을 채웁니다.
//!
//! # 레이어 우선순위 (낮음 → 높음)
//! 1. 옵션 파일 (`scenic.toml`)
//! 2. 환경변수 (`CUCUMBER_FILTER_TAGS=@smoke` 형식)
//! 3. 시스템 프로퍼티 ([`SystemProperties`], 프로세스 내부 키-값)
//! 4. 스위트 선언 ([`SuiteOptions`], 코드에 선언된 옵션)
//!
//! 상위 레이어에 없는 필드는 하위 레이어의 값을 지우지 않습니다.
//! 레이어 자체가 없으면(`None`) 건너뜁니다.
//!
//! # 사용 예시
//! ```
//! use scenic_core::config::{OptionLayers, PartialOptions, SuiteOptions, SystemProperties};
//!
//! let mut system = SystemProperties::new();
//! system.set("cucumber.filter.tags", "@smoke");
//!
//! let layers = OptionLayers {
//!     file: PartialOptions::parse("features = [\"/a\"]").ok(),
//!     environment: None,
//!     system: Some(system.to_partial()),
//!     suite: Some(SuiteOptions::new().glue(["app::steps"]).to_partial()),
//! };
//! let options = layers.resolve("app::suite").unwrap();
//! assert_eq!(options.feature_paths, vec!["/a"]);
//! assert_eq!(options.glue, vec!["app::steps"]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{ConfigError, ScenicError};

// --- 프로퍼티 키 상수 ---

pub const FEATURES_PROPERTY: &str = "cucumber.features";
pub const GLUE_PROPERTY: &str = "cucumber.glue";
pub const FILTER_TAGS_PROPERTY: &str = "cucumber.filter.tags";
pub const FILTER_NAME_PROPERTY: &str = "cucumber.filter.name";
pub const PLUGIN_PROPERTY: &str = "cucumber.plugin";
pub const DRY_RUN_PROPERTY: &str = "cucumber.execution.dry-run";
pub const LIMIT_PROPERTY: &str = "cucumber.execution.limit";
pub const WIP_PROPERTY: &str = "cucumber.execution.wip";
pub const THREADS_PROPERTY: &str = "cucumber.execution.threads";
pub const ANSI_COLORS_DISABLED_PROPERTY: &str = "cucumber.ansi-colors.disabled";
pub const SNIPPET_TYPE_PROPERTY: &str = "cucumber.snippet-type";
pub const OBJECT_FACTORY_PROPERTY: &str = "cucumber.object-factory";
pub const SUMMARY_DISABLED_PROPERTY: &str = "cucumber.plugin.summary.disabled";
pub const PRETTY_DISABLED_PROPERTY: &str = "cucumber.plugin.pretty.disabled";

/// 인식하는 모든 프로퍼티 키
pub const KNOWN_PROPERTIES: &[&str] = &[
    FEATURES_PROPERTY,
    GLUE_PROPERTY,
    FILTER_TAGS_PROPERTY,
    FILTER_NAME_PROPERTY,
    PLUGIN_PROPERTY,
    DRY_RUN_PROPERTY,
    LIMIT_PROPERTY,
    WIP_PROPERTY,
    THREADS_PROPERTY,
    ANSI_COLORS_DISABLED_PROPERTY,
    SNIPPET_TYPE_PROPERTY,
    OBJECT_FACTORY_PROPERTY,
    SUMMARY_DISABLED_PROPERTY,
    PRETTY_DISABLED_PROPERTY,
];

// --- 기본값 상수 ---

/// 기본 옵션 파일 이름
pub const DEFAULT_OPTIONS_FILE: &str = "scenic.toml";
/// 기본 피처 탐색 루트
pub const DEFAULT_FEATURE_PATH: &str = "tests/features";
/// 기본 포매터 플러그인
pub const PRETTY_PLUGIN: &str = "pretty";
/// 기본 요약 플러그인
pub const SUMMARY_PLUGIN: &str = "summary";

/// 스텝 스니펫 명명 스타일
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetStyle {
    #[default]
    Underscore,
    Camelcase,
}

impl fmt::Display for SnippetStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underscore => write!(f, "underscore"),
            Self::Camelcase => write!(f, "camelcase"),
        }
    }
}

impl FromStr for SnippetStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "underscore" => Ok(Self::Underscore),
            "camelcase" => Ok(Self::Camelcase),
            other => Err(ConfigError::InvalidValue {
                field: SNIPPET_TYPE_PROPERTY.to_owned(),
                reason: format!("unknown snippet type '{other}', expected underscore or camelcase"),
            }),
        }
    }
}

/// 부분 옵션 — 하나의 설정 레이어가 정의한 값만 담습니다.
///
/// 모든 필드가 `Option`이며, `None`은 "이 레이어는 이 값을 정의하지 않음"을 뜻합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialOptions {
    /// 피처 경로
    pub features: Option<Vec<String>>,
    /// 스텝 정의 탐색 네임스페이스
    pub glue: Option<Vec<String>>,
    /// 태그 필터 표현식 (모두 만족해야 함)
    pub tags: Option<Vec<String>>,
    /// 이름 필터 정규식 (하나라도 일치하면 통과)
    pub name: Option<Vec<String>>,
    /// 플러그인 지정 (`"json:target/report.json"` 형식)
    pub plugin: Option<Vec<String>>,
    pub dry_run: Option<bool>,
    pub monochrome: Option<bool>,
    pub wip: Option<bool>,
    /// 실행할 최대 시나리오 수 (0 = 제한 없음)
    pub limit: Option<usize>,
    /// 엔진 워커 스레드 수
    pub threads: Option<usize>,
    pub snippet_type: Option<SnippetStyle>,
    pub object_factory: Option<String>,
    /// 기본 요약 플러그인 비활성화
    pub summary_disabled: Option<bool>,
    /// 기본 포매터 플러그인 비활성화
    pub pretty_disabled: Option<bool>,
}

impl PartialOptions {
    /// TOML 문자열에서 부분 옵션을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ScenicError> {
        toml::from_str(toml_str).map_err(|e| {
            ScenicError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 옵션 파일을 읽습니다. 파일이 없으면 레이어가 없는 것으로 보고 `None`을 반환합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Option<Self>, ScenicError> {
        match Self::from_file(path).await {
            Ok(options) => Ok(Some(options)),
            Err(ScenicError::Config(ConfigError::FileNotFound { path })) => {
                trace!(path = %path, "options file absent, skipping layer");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// 옵션 파일을 읽습니다. 파일이 없으면 에러를 반환합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenicError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScenicError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ScenicError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// `cucumber.*` 키-값 쌍에서 부분 옵션을 만듭니다.
    ///
    /// 알 수 없는 키는 무시하고, 파싱할 수 없는 값은 경고 후 무시합니다.
    pub fn from_properties<I, K, V>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in properties {
            options.apply_property(key.as_ref(), value.as_ref());
        }
        options
    }

    /// 현재 프로세스 환경변수에서 부분 옵션을 만듭니다.
    pub fn from_env() -> Self {
        Self::from_env_vars(std::env::vars())
    }

    /// 주어진 환경변수 목록에서 부분 옵션을 만듭니다.
    ///
    /// 환경변수 이름은 프로퍼티 키를 대문자로 바꾸고 `.`/`-`를 `_`로 바꾼 형태입니다.
    /// 예: `cucumber.filter.tags` → `CUCUMBER_FILTER_TAGS`
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (name, value) in vars {
            let name = name.as_ref();
            if let Some(key) = KNOWN_PROPERTIES
                .iter()
                .find(|key| env_var_name(key) == name)
            {
                options.apply_property(key, value.as_ref());
            }
        }
        options
    }

    fn apply_property(&mut self, key: &str, value: &str) {
        match key {
            FEATURES_PROPERTY => self.features = non_empty(split_csv(value)),
            GLUE_PROPERTY => self.glue = non_empty(split_csv(value)),
            FILTER_TAGS_PROPERTY => self.tags = non_empty(single(value)),
            FILTER_NAME_PROPERTY => self.name = non_empty(single(value)),
            PLUGIN_PROPERTY => self.plugin = non_empty(split_csv(value)),
            DRY_RUN_PROPERTY => override_parsed(&mut self.dry_run, key, value),
            LIMIT_PROPERTY => override_parsed(&mut self.limit, key, value),
            WIP_PROPERTY => override_parsed(&mut self.wip, key, value),
            THREADS_PROPERTY => override_parsed(&mut self.threads, key, value),
            ANSI_COLORS_DISABLED_PROPERTY => override_parsed(&mut self.monochrome, key, value),
            SNIPPET_TYPE_PROPERTY => override_parsed(&mut self.snippet_type, key, value),
            OBJECT_FACTORY_PROPERTY => {
                let value = value.trim();
                if !value.is_empty() {
                    self.object_factory = Some(value.to_owned());
                }
            }
            SUMMARY_DISABLED_PROPERTY => override_parsed(&mut self.summary_disabled, key, value),
            PRETTY_DISABLED_PROPERTY => override_parsed(&mut self.pretty_disabled, key, value),
            _ => trace!(key, "ignoring unknown property"),
        }
    }

    /// `higher` 레이어를 이 레이어 위에 필드 단위로 덮어씁니다.
    ///
    /// `higher`에 없는 필드는 현재 값을 유지합니다.
    pub fn overlay(self, higher: PartialOptions) -> PartialOptions {
        PartialOptions {
            features: higher.features.or(self.features),
            glue: higher.glue.or(self.glue),
            tags: higher.tags.or(self.tags),
            name: higher.name.or(self.name),
            plugin: higher.plugin.or(self.plugin),
            dry_run: higher.dry_run.or(self.dry_run),
            monochrome: higher.monochrome.or(self.monochrome),
            wip: higher.wip.or(self.wip),
            limit: higher.limit.or(self.limit),
            threads: higher.threads.or(self.threads),
            snippet_type: higher.snippet_type.or(self.snippet_type),
            object_factory: higher.object_factory.or(self.object_factory),
            summary_disabled: higher.summary_disabled.or(self.summary_disabled),
            pretty_disabled: higher.pretty_disabled.or(self.pretty_disabled),
        }
    }

    /// 남은 빈 필드에 기본값을 적용하여 최종 옵션을 만듭니다.
    ///
    /// `caller_namespace`는 glue가 지정되지 않았을 때 사용할 기본 네임스페이스입니다.
    pub fn into_effective(self, caller_namespace: &str) -> EffectiveOptions {
        let mut plugins = self.plugin.unwrap_or_default();
        if !self.pretty_disabled.unwrap_or(false) && !has_plugin(&plugins, PRETTY_PLUGIN) {
            plugins.push(PRETTY_PLUGIN.to_owned());
        }
        if !self.summary_disabled.unwrap_or(false) && !has_plugin(&plugins, SUMMARY_PLUGIN) {
            plugins.push(SUMMARY_PLUGIN.to_owned());
        }

        EffectiveOptions {
            feature_paths: self
                .features
                .unwrap_or_else(|| vec![DEFAULT_FEATURE_PATH.to_owned()]),
            glue: self
                .glue
                .unwrap_or_else(|| vec![caller_namespace.to_owned()]),
            tag_expressions: self.tags.unwrap_or_default(),
            name_filters: self.name.unwrap_or_default(),
            plugins,
            dry_run: self.dry_run.unwrap_or(false),
            monochrome: self.monochrome.unwrap_or(false),
            wip: self.wip.unwrap_or(false),
            limit: self.limit.filter(|&n| n > 0),
            threads: self.threads.unwrap_or(1),
            snippet_type: self.snippet_type.unwrap_or_default(),
            object_factory: self.object_factory,
        }
    }
}

/// 프로세스 내부 시스템 프로퍼티
///
/// 전역 가변 상태 대신 값으로 오케스트레이터에 전달됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemProperties {
    values: BTreeMap<String, String>,
}

impl SystemProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `key=value` 형식의 정의 하나를 추가합니다.
    pub fn define(&mut self, definition: &str) -> Result<(), ConfigError> {
        let (key, value) =
            definition
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: definition.to_owned(),
                    reason: "expected key=value".to_owned(),
                })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: definition.to_owned(),
                reason: "property key must not be empty".to_owned(),
            });
        }
        self.set(key, value.trim());
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_partial(&self) -> PartialOptions {
        PartialOptions::from_properties(self.iter())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SystemProperties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 스위트 선언 옵션 — 테스트 스위트 코드에 직접 선언하는 옵션
///
/// 빈 목록, 빈 문자열, `false` 플래그는 "설정하지 않음"으로 취급되어
/// 하위 레이어의 값을 지우지 않습니다.
///
/// ```
/// use scenic_core::config::SuiteOptions;
///
/// let suite = SuiteOptions::new()
///     .glue(["app::steps"])
///     .tags("@important")
///     .plugin(["json"]);
/// let partial = suite.to_partial();
/// assert_eq!(partial.tags, Some(vec!["@important".to_owned()]));
/// assert!(partial.features.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteOptions {
    pub features: Vec<String>,
    pub glue: Vec<String>,
    pub tags: String,
    pub name: Vec<String>,
    pub plugin: Vec<String>,
    pub dry_run: bool,
    pub monochrome: bool,
    pub snippets: Option<SnippetStyle>,
    pub object_factory: Option<String>,
}

impl SuiteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    pub fn glue<I, S>(mut self, glue: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.glue = glue.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn name<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn plugin<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugin = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn monochrome(mut self, monochrome: bool) -> Self {
        self.monochrome = monochrome;
        self
    }

    pub fn snippets(mut self, style: SnippetStyle) -> Self {
        self.snippets = Some(style);
        self
    }

    pub fn object_factory(mut self, name: impl Into<String>) -> Self {
        self.object_factory = Some(name.into());
        self
    }

    /// 선언된 값만 담은 부분 옵션으로 변환합니다.
    pub fn to_partial(&self) -> PartialOptions {
        PartialOptions {
            features: non_empty(self.features.clone()),
            glue: non_empty(self.glue.clone()),
            tags: non_empty(single(&self.tags)),
            name: non_empty(self.name.clone()),
            plugin: non_empty(self.plugin.clone()),
            dry_run: self.dry_run.then_some(true),
            monochrome: self.monochrome.then_some(true),
            snippet_type: self.snippets,
            object_factory: self.object_factory.clone().filter(|s| !s.is_empty()),
            ..PartialOptions::default()
        }
    }
}

/// 설정 레이어 묶음 — 우선순위 순서가 필드 순서로 고정됩니다.
#[derive(Debug, Clone, Default)]
pub struct OptionLayers {
    pub file: Option<PartialOptions>,
    pub environment: Option<PartialOptions>,
    pub system: Option<PartialOptions>,
    pub suite: Option<PartialOptions>,
}

impl OptionLayers {
    /// 레이어를 병합하고 기본값을 적용한 뒤 검증합니다.
    pub fn resolve(self, caller_namespace: &str) -> Result<EffectiveOptions, ScenicError> {
        resolve([self.file, self.environment, self.system, self.suite], caller_namespace)
    }
}

/// 우선순위 순서(낮음 → 높음)의 레이어 목록을 병합하여 최종 옵션을 만듭니다.
pub fn resolve<I>(layers: I, caller_namespace: &str) -> Result<EffectiveOptions, ScenicError>
where
    I: IntoIterator<Item = Option<PartialOptions>>,
{
    let merged = layers
        .into_iter()
        .flatten()
        .fold(PartialOptions::default(), PartialOptions::overlay);
    let options = merged.into_effective(caller_namespace);
    options.validate()?;
    Ok(options)
}

/// 최종 실행 옵션
///
/// 탐색 패스마다 한 번 만들어지며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveOptions {
    pub feature_paths: Vec<String>,
    pub glue: Vec<String>,
    pub tag_expressions: Vec<String>,
    pub name_filters: Vec<String>,
    pub plugins: Vec<String>,
    pub dry_run: bool,
    pub monochrome: bool,
    /// 작업 중 모드. 브리지는 해석하지 않고 `RunContext::options`로 엔진에 넘깁니다.
    pub wip: bool,
    pub limit: Option<usize>,
    pub threads: usize,
    pub snippet_type: SnippetStyle,
    pub object_factory: Option<String>,
}

impl EffectiveOptions {
    /// 옵션 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ScenicError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: THREADS_PROPERTY.to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }
        if self.feature_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: FEATURES_PROPERTY.to_owned(),
                reason: "feature path must not be empty".to_owned(),
            }
            .into());
        }
        // 태그 표현식과 이름 정규식은 필터를 만들어 보면서 검증
        crate::tags::Filters::from_options(self)?;
        Ok(())
    }

    /// 여러 워커 스레드로 시나리오를 실행하는지 여부
    pub fn is_multi_threaded(&self) -> bool {
        self.threads > 1
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        has_plugin(&self.plugins, name)
    }

    /// 최종 옵션을 `cucumber.*` 프로퍼티 목록으로 내보냅니다.
    ///
    /// 자식 러너에 옵션을 넘길 때 사용하며, 다시 읽으면 같은 옵션이 됩니다.
    pub fn to_properties(&self) -> Vec<(&'static str, String)> {
        let mut properties = vec![
            (FEATURES_PROPERTY, self.feature_paths.join(",")),
            (GLUE_PROPERTY, self.glue.join(",")),
            (FILTER_TAGS_PROPERTY, combined_tag_expression(&self.tag_expressions)),
            (FILTER_NAME_PROPERTY, combined_name_filter(&self.name_filters)),
            (PLUGIN_PROPERTY, self.plugins.join(",")),
            (DRY_RUN_PROPERTY, self.dry_run.to_string()),
            (LIMIT_PROPERTY, self.limit.unwrap_or(0).to_string()),
            (WIP_PROPERTY, self.wip.to_string()),
            (THREADS_PROPERTY, self.threads.to_string()),
            (ANSI_COLORS_DISABLED_PROPERTY, self.monochrome.to_string()),
            (SNIPPET_TYPE_PROPERTY, self.snippet_type.to_string()),
            (
                SUMMARY_DISABLED_PROPERTY,
                (!self.has_plugin(SUMMARY_PLUGIN)).to_string(),
            ),
            (
                PRETTY_DISABLED_PROPERTY,
                (!self.has_plugin(PRETTY_PLUGIN)).to_string(),
            ),
        ];
        if let Some(factory) = &self.object_factory {
            properties.push((OBJECT_FACTORY_PROPERTY, factory.clone()));
        }
        properties
    }
}

// --- 파싱 헬퍼 ---

/// 프로퍼티 키에 대응하는 환경변수 이름
pub fn env_var_name(property: &str) -> String {
    property
        .chars()
        .map(|c| match c {
            '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn single(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.is_empty() {
        Vec::new()
    } else {
        vec![value.to_owned()]
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values) }
}

fn override_parsed<T: FromStr>(target: &mut Option<T>, key: &str, value: &str) {
    match value.trim().parse::<T>() {
        Ok(parsed) => *target = Some(parsed),
        Err(_) => warn!(key, value, "failed to parse property value, ignoring"),
    }
}

fn has_plugin(plugins: &[String], name: &str) -> bool {
    plugins
        .iter()
        .any(|spec| spec.split(':').next() == Some(name))
}

fn combined_tag_expression(expressions: &[String]) -> String {
    match expressions {
        [] => String::new(),
        [only] => only.clone(),
        many => many
            .iter()
            .map(|e| format!("({e})"))
            .collect::<Vec<_>>()
            .join(" and "),
    }
}

fn combined_name_filter(patterns: &[String]) -> String {
    match patterns {
        [] => String::new(),
        [only] => only.clone(),
        many => many
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|"),
    }
}
