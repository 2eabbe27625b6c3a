//! Permission policy documents, profiles and path resolution
//!
//! A policy document is an ordered mapping of named sections:
//!
//! ```yaml
//! default:
//!   file: "0644"
//!   directory: "0755"
//! hardened:
//!   "^wp-admin/.*\\.php$": "0640"
//!   "(^|/)\\.htaccess$": "0444"
//! ```
//!
//! `default` supplies the file and directory modes. Every other section is an
//! override set: pattern to mode, evaluated in the order written, with the
//! last matching pattern winning. Document order is kept by deserializing
//! into ordered vectors, never into a hash map.

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use wpsec_fs::ConfigStore;

use crate::mode::FileMode;
use crate::{Error, Result};

/// Name of the section holding the base file/directory modes.
pub const DEFAULT_PROFILE: &str = "default";

/// One pattern/mode pair from an override set.
#[derive(Debug, Clone)]
pub struct PermissionRule {
    pattern: Regex,
    mode: FileMode,
}

impl PermissionRule {
    pub fn new(pattern: &str, mode: FileMode) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            mode,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Unanchored search: the pattern may match anywhere in `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// The active permission policy for one sweep.
#[derive(Debug, Clone)]
pub struct PolicyProfile {
    name: String,
    file: FileMode,
    directory: FileMode,
    rules: Vec<PermissionRule>,
}

impl PolicyProfile {
    pub fn new(name: impl Into<String>, file: FileMode, directory: FileMode) -> Self {
        Self {
            name: name.into(),
            file,
            directory,
            rules: Vec::new(),
        }
    }

    /// Append a rule; it overrides every rule added before it.
    pub fn with_rule(mut self, pattern: &str, mode: FileMode) -> Result<Self> {
        let rule = PermissionRule::new(pattern, mode).map_err(|e| Error::InvalidPolicyProfile {
            name: self.name.clone(),
            reason: format!("bad pattern '{pattern}': {e}"),
        })?;
        self.rules.push(rule);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_mode(&self) -> FileMode {
        self.file
    }

    pub fn directory_mode(&self) -> FileMode {
        self.directory
    }

    pub fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }
}

/// Maps a path to its target mode under a profile.
///
/// This is the only place rule precedence is decided; the permission engine
/// calls it for every entry.
pub struct PathPolicy;

impl PathPolicy {
    /// Resolve the target mode for `path`.
    ///
    /// Starts from the profile default for the entry type, then lets every
    /// matching rule overwrite the result in declared order.
    pub fn resolve(path: &str, is_dir: bool, profile: &PolicyProfile) -> FileMode {
        Self::resolve_with_rule(path, is_dir, profile).0
    }

    /// Like [`resolve`](Self::resolve), also returning the deciding rule.
    pub fn resolve_with_rule<'p>(
        path: &str,
        is_dir: bool,
        profile: &'p PolicyProfile,
    ) -> (FileMode, Option<&'p PermissionRule>) {
        let base = if is_dir {
            profile.directory
        } else {
            profile.file
        };

        // Last match wins: scanning from the end finds it first.
        profile
            .rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path))
            .map_or((base, None), |rule| (rule.mode, Some(rule)))
    }
}

/// Body of one document section, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SectionBody {
    Entries(Vec<(String, FileMode)>),
    /// Present but not a mapping (e.g. `default: ~`)
    NotAMapping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    body: SectionBody,
}

/// A parsed permission policy document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    sections: Vec<Section>,
}

impl PolicyDocument {
    /// Policy used when no document is supplied.
    pub fn builtin() -> Self {
        let entries = |pairs: &[(&str, FileMode)]| {
            SectionBody::Entries(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
        };
        Self {
            sections: vec![
                Section {
                    name: DEFAULT_PROFILE.into(),
                    body: entries(&[("file", FileMode::FILE), ("directory", FileMode::DIRECTORY)]),
                },
                Section {
                    name: "hardened".into(),
                    body: entries(&[
                        (r"^wp-admin/.*\.php$", FileMode::from_raw(0o640)),
                        (r"^wp-includes/.*\.php$", FileMode::from_raw(0o640)),
                        (r"(^|/)\.htaccess$", FileMode::from_raw(0o444)),
                    ]),
                },
            ],
        }
    }

    /// Load a document from YAML, TOML or JSON, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        ConfigStore::new().load(path).map_err(|e| match e {
            wpsec_fs::Error::ConfigParse { message, .. } => Error::PolicyParse { message },
            other => Error::Fs(other),
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::PolicyParse {
            message: e.to_string(),
        })
    }

    /// Names of all sections in document order.
    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Build the named profile.
    ///
    /// `default` yields the base modes with no rules. Any other name must be
    /// a section of the document; its entries become the rules.
    pub fn profile(&self, name: &str) -> Result<PolicyProfile> {
        let (file, directory) = self.default_modes();
        let profile = PolicyProfile::new(name, file, directory);

        if name == DEFAULT_PROFILE {
            return Ok(profile);
        }

        let section = self.section(name).ok_or_else(|| Error::InvalidPolicyProfile {
            name: name.to_string(),
            reason: format!(
                "no such profile (available: {})",
                self.profile_names().collect::<Vec<_>>().join(", ")
            ),
        })?;

        match &section.body {
            SectionBody::Entries(entries) => entries
                .iter()
                .try_fold(profile, |profile, (pattern, mode)| profile.with_rule(pattern, *mode)),
            SectionBody::NotAMapping => Err(Error::InvalidPolicyProfile {
                name: name.to_string(),
                reason: "expected a mapping of pattern to mode".into(),
            }),
        }
    }

    fn default_modes(&self) -> (FileMode, FileMode) {
        let Some(Section {
            body: SectionBody::Entries(entries),
            ..
        }) = self.section(DEFAULT_PROFILE)
        else {
            return (FileMode::LEGACY_FALLBACK, FileMode::LEGACY_FALLBACK);
        };

        let lookup = |key: &str| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map_or(FileMode::LEGACY_FALLBACK, |(_, mode)| *mode)
        };
        (lookup("file"), lookup("directory"))
    }
}

impl<'de> Deserialize<'de> for SectionBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct BodyVisitor;

        impl<'de> Visitor<'de> for BodyVisitor {
            type Value = SectionBody;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of pattern to permission mode")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<SectionBody, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, mode)) = map.next_entry::<String, FileMode>()? {
                    entries.push((key, mode));
                }
                Ok(SectionBody::Entries(entries))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<SectionBody, E> {
                Ok(SectionBody::NotAMapping)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<SectionBody, E> {
                Ok(SectionBody::NotAMapping)
            }

            fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<SectionBody, E> {
                Ok(SectionBody::NotAMapping)
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<SectionBody, E> {
                Ok(SectionBody::NotAMapping)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<SectionBody, E> {
                Ok(SectionBody::NotAMapping)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<SectionBody, E> {
                Ok(SectionBody::NotAMapping)
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<SectionBody, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(SectionBody::NotAMapping)
            }
        }

        deserializer.deserialize_any(BodyVisitor)
    }
}

impl<'de> Deserialize<'de> for PolicyDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = PolicyDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of profile names to permission rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<PolicyDocument, A::Error> {
                let mut sections: Vec<Section> = Vec::new();
                while let Some((name, body)) = map.next_entry::<String, SectionBody>()? {
                    if sections.iter().any(|s| s.name == name) {
                        return Err(de::Error::custom(format!("duplicate profile '{name}'")));
                    }
                    sections.push(Section { name, body });
                }
                Ok(PolicyDocument { sections })
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}
