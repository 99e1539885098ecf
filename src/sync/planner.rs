//! Upload metadata planning.
//!
//! Metadata is derived from an ordered list of `{pattern, effect}` rules,
//! each evaluated once per upload. New header rules are added to the list
//! without touching the engine.

use regex::Regex;
use std::path::Path;

use crate::config::EffectiveConfig;
use crate::error::DeployError;
use crate::fs::types::{ObjectMetadata, Visibility};

/// One-year public caching.
pub const CACHE_FOREVER: &str = "public, max-age=31557600";

/// Keys treated as HTML for the charset rule, compressed or not.
pub const HTML_PATTERN: &str = r"(?i).+\.(html|htm)(\.gz)?$";

/// Sources uploaded with `Content-Encoding: gzip`.
pub const GZIP_PATTERN: &str = r"(?i).+\.gz$";

/// What a rule's pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSubject {
    /// The remote key.
    Key,
    /// The physical file being uploaded.
    Source,
}

/// What a matching rule sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEffect {
    CacheControl(String),
    ContentType(String),
    ContentEncoding(String),
}

#[derive(Debug, Clone)]
pub struct MetadataRule {
    pattern: Regex,
    subject: RuleSubject,
    effect: RuleEffect,
}

impl MetadataRule {
    pub fn new(pattern: Regex, subject: RuleSubject, effect: RuleEffect) -> Self {
        Self {
            pattern,
            subject,
            effect,
        }
    }

    fn matches(&self, key: &str, source: &str) -> bool {
        match self.subject {
            RuleSubject::Key => self.pattern.is_match(key),
            RuleSubject::Source => self.pattern.is_match(source),
        }
    }

    fn apply(&self, metadata: &mut ObjectMetadata) {
        match &self.effect {
            RuleEffect::CacheControl(value) => metadata.cache_control = Some(value.clone()),
            RuleEffect::ContentType(value) => metadata.content_type = Some(value.clone()),
            RuleEffect::ContentEncoding(value) => metadata.content_encoding = Some(value.clone()),
        }
    }
}

/// Compile a user-supplied pattern, naming the setting on failure.
pub fn compile_pattern(setting: &str, pattern: &str) -> Result<Regex, DeployError> {
    Regex::new(pattern)
        .map_err(|e| DeployError::config(format!("Invalid {} {:?}: {}", setting, pattern, e)))
}

#[derive(Debug, Clone, Default)]
pub struct UploadPlanner {
    rules: Vec<MetadataRule>,
}

impl UploadPlanner {
    /// Rules from the configured cache pattern and HTML charset, plus the
    /// gzip encoding rule.
    pub fn new(config: &EffectiveConfig) -> Result<Self, DeployError> {
        let mut rules = Vec::new();

        if let Some(pattern) = &config.cache_pattern {
            rules.push(MetadataRule::new(
                compile_pattern("cache_regex", pattern)?,
                RuleSubject::Key,
                RuleEffect::CacheControl(CACHE_FOREVER.to_string()),
            ));
        }

        if let Some(charset) = &config.html_charset {
            rules.push(MetadataRule::new(
                compile_pattern("html pattern", HTML_PATTERN)?,
                RuleSubject::Key,
                RuleEffect::ContentType(format!("text/html; charset={}", charset)),
            ));
        }

        rules.push(MetadataRule::new(
            compile_pattern("gzip pattern", GZIP_PATTERN)?,
            RuleSubject::Source,
            RuleEffect::ContentEncoding("gzip".to_string()),
        ));

        Ok(Self { rules })
    }

    /// Metadata for uploading `source` under `key`.
    pub fn plan(&self, key: &str, source: &Path) -> ObjectMetadata {
        let source = source.to_string_lossy();
        let mut metadata = ObjectMetadata {
            visibility: Visibility::PublicRead,
            ..Default::default()
        };

        for rule in &self.rules {
            if rule.matches(key, &source) {
                rule.apply(&mut metadata);
            }
        }

        metadata
    }
}
