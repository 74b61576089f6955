//! Line grammars for the IR and kernel-source dialects
//!
//! Each recognizer takes one line body (terminator already removed) and
//! either returns the pieces it matched or `None`. A line that only looks
//! similar to a pattern is `None` and gets passed through by the caller;
//! there is no partial match.
//!
//! # Recognized forms
//!
//! - IR declaration: `declare [<cc> ]<ret> @<name>(<params>)`
//! - kernel assignment: `<lhs> = <name>(<arg>);`
//! - attribute group declaration: any line containing `attributes #`
//! - attribute reference: `#` followed by one or more digits

use std::borrow::Cow;

const MAGIC_PREFIX: &str = "magic_";
const MAGIC_SUFFIX: &str = "_id";

/// Whether `name` is a magic identity function (`magic_*_id`)
pub fn is_magic_id(name: &str) -> bool {
    name.len() >= MAGIC_PREFIX.len() + MAGIC_SUFFIX.len()
        && name.starts_with(MAGIC_PREFIX)
        && name.ends_with(MAGIC_SUFFIX)
}

/// A forward declaration in LLVM-like IR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub return_type: &'a str,
    pub name: &'a str,
    /// Everything between the parentheses, verbatim
    pub params: &'a str,
}

impl Declaration<'_> {
    pub fn is_magic_id(&self) -> bool {
        is_magic_id(self.name)
    }
}

/// Parse `declare <ret> @<name>(<params>)`.
///
/// With `calling_convention` set, the token must directly follow `declare`
/// (`declare cc75 i32 @f(i32)`). Nothing may follow the closing parenthesis,
/// so declarations still carrying attribute references do not match.
pub fn parse_declaration<'a>(
    body: &'a str,
    calling_convention: Option<&str>,
) -> Option<Declaration<'a>> {
    let rest = body.strip_prefix("declare ")?;
    let rest = match calling_convention {
        Some(cc) => rest.strip_prefix(cc)?.strip_prefix(' ')?,
        None => rest,
    };

    let at = rest.find(" @")?;
    let return_type = &rest[..at];
    if return_type.trim().is_empty() {
        return None;
    }

    let callee = &rest[at + 2..];
    let open = callee.find('(')?;
    let name = &callee[..open];
    if !is_ir_identifier(name) {
        return None;
    }
    let params = callee[open + 1..].strip_suffix(')')?;
    if !parens_balanced(params) {
        return None;
    }

    Some(Declaration {
        return_type,
        name,
        params,
    })
}

/// A kernel-source statement `<lhs> = <callee>(<argument>);` calling a magic ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    /// Left-hand side including any indentation
    pub lhs: &'a str,
    pub callee: &'a str,
    pub argument: &'a str,
}

/// Parse an assignment whose right-hand side is exactly one magic-ID call.
///
/// The first ` = ` followed by a complete call is taken as the split point,
/// so `a = b = magic_x_id(c);` yields lhs `a = b`.
pub fn parse_assignment(body: &str) -> Option<Assignment<'_>> {
    body.match_indices(" = ").find_map(|(idx, sep)| {
        let lhs = &body[..idx];
        let rhs = body[idx + sep.len()..].strip_suffix(';')?;
        let (callee, argument) = parse_magic_call(rhs)?;
        Some(Assignment {
            lhs,
            callee,
            argument,
        })
    })
}

/// Split `magic_*_id(<arg>)` into callee and argument.
///
/// The text must be the call and nothing else, with balanced parentheses in
/// the argument.
pub fn parse_magic_call(text: &str) -> Option<(&str, &str)> {
    let open = text.find('(')?;
    let callee = &text[..open];
    if !is_magic_id(callee) || !is_c_identifier(callee) {
        return None;
    }
    let argument = text[open + 1..].strip_suffix(')')?;
    if !parens_balanced(argument) {
        return None;
    }
    Some((callee, argument))
}

/// Whether the line declares an attribute group (`attributes #0 = { ... }`)
pub fn is_attribute_block(body: &str) -> bool {
    body.contains("attributes #")
}

/// Remove every attribute-group reference (`#` followed by digits).
///
/// All other text, including whitespace around the reference, is kept.
pub fn strip_attribute_refs(line: &str) -> Cow<'_, str> {
    let bytes = line.as_bytes();
    let mut stripped: Option<String> = None;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'#' {
            let digits = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if digits > 0 {
                let buf = stripped.get_or_insert_with(|| String::with_capacity(line.len()));
                buf.push_str(&line[copied..i]);
                i += 1 + digits;
                copied = i;
                continue;
            }
        }
        i += 1;
    }

    match stripped {
        Some(mut buf) => {
            buf.push_str(&line[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(line),
    }
}

fn parens_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

fn is_ir_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | '-'))
}

fn is_c_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
