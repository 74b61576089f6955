//! Patcher configuration
//!
//! File extensions and the tagged-IR calling convention differ between
//! compiler backends, so neither is hardcoded in the passes. Builtin
//! overrides are supplied entirely by the caller; the default table is empty.
//!
//! # Example
//!
//! ```toml
//! calling_convention = "cc75"
//!
//! [extensions]
//! ir-plain = "nvvm"
//! c-style-b = "cl"
//!
//! [overrides]
//! "llvm.nvvm.ldg.global.f" = """
//! define float @llvm.nvvm.ldg.global.f(float* %p, i32 %align) {
//!   %v = load float, float* %p
//!   ret float %v
//! }
//! """
//! ```
//!
//! Keys left out keep their defaults.

use crate::dialect::Dialect;
use crate::error::PatchError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Calling-convention token used by the tagged IR dialect unless configured
pub const DEFAULT_CALLING_CONVENTION: &str = "cc75";

/// File extension for each dialect (without the leading dot)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMap {
    pub ir_plain: String,
    pub ir_tagged: String,
    pub c_style_a: String,
    pub c_style_b: String,
}

impl Default for ExtensionMap {
    fn default() -> Self {
        ExtensionMap {
            ir_plain: "nvvm".to_string(),
            ir_tagged: "spir".to_string(),
            c_style_a: "cu".to_string(),
            c_style_b: "cl".to_string(),
        }
    }
}

impl ExtensionMap {
    pub fn get(&self, dialect: Dialect) -> &str {
        match dialect {
            Dialect::IrPlain => &self.ir_plain,
            Dialect::IrTagged => &self.ir_tagged,
            Dialect::CStyleA => &self.c_style_a,
            Dialect::CStyleB => &self.c_style_b,
        }
    }

    fn slot_mut(&mut self, dialect: Dialect) -> &mut String {
        match dialect {
            Dialect::IrPlain => &mut self.ir_plain,
            Dialect::IrTagged => &mut self.ir_tagged,
            Dialect::CStyleA => &mut self.c_style_a,
            Dialect::CStyleB => &mut self.c_style_b,
        }
    }

    /// Set the extension for one dialect
    pub fn set(&mut self, dialect: Dialect, extension: impl Into<String>) -> Result<(), PatchError> {
        let extension = extension.into();
        validate_extension(dialect, &extension)?;
        *self.slot_mut(dialect) = extension;
        Ok(())
    }
}

fn validate_extension(dialect: Dialect, extension: &str) -> Result<(), PatchError> {
    if extension.is_empty() {
        return Err(PatchError::Config(format!(
            "extension for {} cannot be empty",
            dialect
        )));
    }
    if extension.contains(['.', '/', '\\']) {
        return Err(PatchError::Config(format!(
            "extension '{}' for {} must not contain '.' or path separators",
            extension, dialect
        )));
    }
    Ok(())
}

/// Replacement text for named builtin declarations
///
/// Lookups are by exact name; the map is ordered only so that listings are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinOverrideTable {
    entries: BTreeMap<String, String>,
}

impl BuiltinOverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the override for `name`
    ///
    /// Names must be plain LLVM identifiers: alphanumerics, `_`, `.`, `$`
    /// and `-`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<(), PatchError> {
        let name = name.into();
        validate_builtin_name(&name)?;
        self.entries.insert(name, replacement.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn validate_builtin_name(name: &str) -> Result<(), PatchError> {
    if name.is_empty() {
        return Err(PatchError::Config(
            "builtin override name cannot be empty".to_string(),
        ));
    }
    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '$' | '-') {
            return Err(PatchError::Config(format!(
                "invalid character '{}' in builtin override name '{}'",
                c, name
            )));
        }
    }
    Ok(())
}

/// Everything a [`Patcher`](crate::Patcher) needs besides the dialect and file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatcherConfig {
    /// Token that follows `declare`/`define` in the tagged IR dialect
    pub calling_convention: String,
    pub extensions: ExtensionMap,
    pub overrides: BuiltinOverrideTable,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        PatcherConfig {
            calling_convention: DEFAULT_CALLING_CONVENTION.to_string(),
            extensions: ExtensionMap::default(),
            overrides: BuiltinOverrideTable::new(),
        }
    }
}

/// On-disk shape of the configuration; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    calling_convention: Option<String>,
    #[serde(default)]
    extensions: ExtensionsSection,
    #[serde(default)]
    overrides: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ExtensionsSection {
    ir_plain: Option<String>,
    ir_tagged: Option<String>,
    c_style_a: Option<String>,
    c_style_b: Option<String>,
}

impl ExtensionsSection {
    fn into_pairs(self) -> [(Dialect, Option<String>); 4] {
        [
            (Dialect::IrPlain, self.ir_plain),
            (Dialect::IrTagged, self.ir_tagged),
            (Dialect::CStyleA, self.c_style_a),
            (Dialect::CStyleB, self.c_style_b),
        ]
    }
}

impl PatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML configuration, filling unspecified keys with defaults
    pub fn from_toml(toml_str: &str) -> Result<Self, PatchError> {
        let file: ConfigFile = toml::from_str(toml_str)
            .map_err(|e| PatchError::Config(format!("failed to parse config: {}", e)))?;
        let mut config = Self::default();
        config.merge(file)?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, PatchError> {
        let content = fs::read_to_string(path).map_err(|e| PatchError::io(path, e))?;
        Self::from_toml(&content)
    }

    fn merge(&mut self, file: ConfigFile) -> Result<(), PatchError> {
        if let Some(cc) = file.calling_convention {
            self.set_calling_convention(cc)?;
        }
        for (dialect, extension) in file.extensions.into_pairs() {
            if let Some(extension) = extension {
                self.extensions.set(dialect, extension)?;
            }
        }
        for (name, replacement) in file.overrides {
            self.overrides.insert(name, replacement)?;
        }
        Ok(())
    }

    fn set_calling_convention(&mut self, cc: String) -> Result<(), PatchError> {
        if cc.is_empty() || cc.chars().any(char::is_whitespace) {
            return Err(PatchError::Config(format!(
                "calling convention '{}' must be a single non-empty token",
                cc
            )));
        }
        self.calling_convention = cc;
        Ok(())
    }

    /// Builder: add a builtin override
    pub fn with_override(
        mut self,
        name: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, PatchError> {
        self.overrides.insert(name, replacement)?;
        Ok(self)
    }

    /// Builder: add a builtin override given as `NAME=PATH`, reading the
    /// replacement text from PATH
    pub fn with_override_file(self, spec: &str) -> Result<Self, PatchError> {
        let (name, file) = spec.split_once('=').ok_or_else(|| {
            PatchError::Config(format!("override '{}' must have the form NAME=PATH", spec))
        })?;
        let text = fs::read_to_string(file).map_err(|e| PatchError::io(file, e))?;
        self.with_override(name, text)
    }

    /// Builder: change one dialect's file extension
    pub fn with_extension(
        mut self,
        dialect: Dialect,
        extension: impl Into<String>,
    ) -> Result<Self, PatchError> {
        self.extensions.set(dialect, extension)?;
        Ok(self)
    }

    /// Builder: change the tagged-IR calling convention
    pub fn with_calling_convention(mut self, cc: impl Into<String>) -> Result<Self, PatchError> {
        self.set_calling_convention(cc.into())?;
        Ok(self)
    }
}
