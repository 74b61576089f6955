//! Magic-ID resolution and attribute stripping for LLVM-like IR
//!
//! One left-to-right scan. Each line is handled by exactly one rule, tried in
//! this order:
//!
//! 1. `declare <T> @magic_*_id(<T>)` becomes an identity definition
//! 2. an attribute group declaration (`attributes #N = {...}`) is dropped
//! 3. anything else is kept with its `#N` references removed

use super::PassOutput;
use crate::document::split_terminator;
use crate::error::PatchError;
use crate::grammar::{Declaration, is_attribute_block, parse_declaration, strip_attribute_refs};
use std::borrow::Cow;
use tracing::info;

/// Run the pass.
///
/// `calling_convention` is `Some` for the tagged dialect; the token is then
/// required on declarations and reproduced on the emitted definitions.
///
/// Fails on the first magic ID whose return and argument types differ.
pub fn resolve(
    lines: &[String],
    calling_convention: Option<&str>,
) -> Result<PassOutput, PatchError> {
    let mut out = PassOutput::with_capacity(lines.len());

    for line in lines {
        let (body, terminator) = split_terminator(line);

        if let Some(decl) = parse_declaration(body, calling_convention)
            && decl.is_magic_id()
        {
            check_identity_signature(&decl)?;
            info!("Patching magic ID {}", decl.name);
            out.lines
                .extend(identity_definition(&decl, calling_convention, terminator));
            out.patched_magic_ids.push(decl.name.to_string());
            out.changed = true;
            continue;
        }

        if is_attribute_block(body) {
            info!("Removing attribute declarations");
            out.attribute_blocks_removed += 1;
            out.changed = true;
            continue;
        }

        match strip_attribute_refs(line) {
            Cow::Borrowed(kept) => out.lines.push(kept.to_string()),
            Cow::Owned(stripped) => {
                out.lines.push(stripped);
                out.changed = true;
            }
        }
    }

    Ok(out)
}

fn check_identity_signature(decl: &Declaration<'_>) -> Result<(), PatchError> {
    if decl.return_type != decl.params {
        return Err(PatchError::TypeContractViolation {
            name: decl.name.to_string(),
            return_type: decl.return_type.to_string(),
            argument_type: decl.params.to_string(),
        });
    }
    Ok(())
}

/// Three-line definition returning its only parameter.
///
/// Inner lines end with the declaration's terminator (or `\n` if it had
/// none); the closing brace keeps the original terminator as-is.
fn identity_definition(
    decl: &Declaration<'_>,
    calling_convention: Option<&str>,
    terminator: &str,
) -> [String; 3] {
    let eol = if terminator.is_empty() { "\n" } else { terminator };
    let ty = decl.return_type;
    let cc = calling_convention
        .map(|cc| format!("{} ", cc))
        .unwrap_or_default();
    [
        format!("define {}{} @{}({} %name) {{{}", cc, ty, decl.name, ty, eol),
        format!("  ret {} %name{}", ty, eol),
        format!("}}{}", terminator),
    ]
}
