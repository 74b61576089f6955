//! Dialect selection
//!
//! A [`Dialect`] is chosen once from its tag at the entry point and carries
//! everything the engine needs afterwards: which grammar applies, whether a
//! calling-convention token is expected, and whether builtin overrides run.
//! File extensions are deployment-specific and come from
//! [`PatcherConfig`](crate::PatcherConfig).

use std::fmt;

/// The four textual formats the patcher understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    /// LLVM-like IR with the default calling convention (`nvvm`)
    IrPlain,
    /// LLVM-like IR whose declarations carry a calling-convention token (`spir`)
    IrTagged,
    /// C-like kernel source (`cuda`)
    CStyleA,
    /// C-like kernel source (`opencl`)
    CStyleB,
}

/// Line grammar shared by a group of dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectFamily {
    /// `declare`/`define` based IR
    Ir,
    /// C-like statements
    Kernel,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::IrPlain,
        Dialect::IrTagged,
        Dialect::CStyleA,
        Dialect::CStyleB,
    ];

    /// Parse a dialect tag.
    ///
    /// Accepts the canonical names (`ir-plain`, `ir-tagged`, `c-style-a`,
    /// `c-style-b`) and the backend names used by build scripts (`nvvm`,
    /// `spir`, `cuda`, `opencl`). Returns `None` for anything else, which
    /// callers treat as "nothing to do".
    pub fn from_tag(tag: &str) -> Option<Dialect> {
        match tag {
            "ir-plain" | "nvvm" => Some(Dialect::IrPlain),
            "ir-tagged" | "spir" => Some(Dialect::IrTagged),
            "c-style-a" | "cuda" => Some(Dialect::CStyleA),
            "c-style-b" | "opencl" => Some(Dialect::CStyleB),
            _ => None,
        }
    }

    /// Canonical tag, also used as the key in the `[extensions]` config table
    pub fn name(self) -> &'static str {
        match self {
            Dialect::IrPlain => "ir-plain",
            Dialect::IrTagged => "ir-tagged",
            Dialect::CStyleA => "c-style-a",
            Dialect::CStyleB => "c-style-b",
        }
    }

    pub fn family(self) -> DialectFamily {
        match self {
            Dialect::IrPlain | Dialect::IrTagged => DialectFamily::Ir,
            Dialect::CStyleA | Dialect::CStyleB => DialectFamily::Kernel,
        }
    }

    /// Whether declarations and definitions carry the calling-convention token
    pub fn is_tagged(self) -> bool {
        self == Dialect::IrTagged
    }

    /// Whether the builtin override pass runs after magic-ID resolution
    pub fn applies_builtin_overrides(self) -> bool {
        self == Dialect::IrPlain
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
