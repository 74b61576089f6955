//! Builtin override injection for plain IR
//!
//! A declaration `declare <ret> @<name>(...)` whose name is a key of the
//! [`BuiltinOverrideTable`] is replaced by the table's text, whatever its
//! signature. The text is inserted verbatim and must bring its own line
//! terminators.

use super::PassOutput;
use crate::config::BuiltinOverrideTable;
use crate::document::split_terminator;
use crate::grammar::parse_declaration;
use tracing::info;

pub fn inject(lines: &[String], table: &BuiltinOverrideTable) -> PassOutput {
    if table.is_empty() {
        return PassOutput::unchanged(lines);
    }

    let mut out = PassOutput::with_capacity(lines.len());
    for line in lines {
        let (body, _) = split_terminator(line);
        let replacement = parse_declaration(body, None)
            .and_then(|decl| table.get(decl.name).map(|text| (decl.name, text)));

        match replacement {
            Some((name, text)) => {
                info!("Injecting builtin override for {}", name);
                out.overrides_applied.push(name.to_string());
                out.changed |= text != line.as_str();
                out.lines.push(text.to_string());
            }
            None => out.lines.push(line.clone()),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.split_inclusive('\n').map(str::to_string).collect()
    }

    #[test]
    fn test_empty_table_is_noop() {
        let input = lines("declare void @foo()\ndeclare i32 @bar(i32)\n");
        let out = inject(&input, &BuiltinOverrideTable::new());
        assert!(!out.changed);
        assert_eq!(out.lines, input);
        assert!(out.overrides_applied.is_empty());
    }

    #[test]
    fn test_declaration_replaced_verbatim() {
        let mut table = BuiltinOverrideTable::new();
        table.insert("foo", "define void @foo() {}\n").unwrap();

        let out = inject(&lines("; a\ndeclare void @foo()\n; b\n"), &table);
        assert_eq!(out.lines.concat(), "; a\ndefine void @foo() {}\n; b\n");
        assert_eq!(out.overrides_applied, vec!["foo"]);
        assert!(out.changed);
    }

    #[test]
    fn test_signature_does_not_matter() {
        let mut table = BuiltinOverrideTable::new();
        table
            .insert(
                "llvm.nvvm.fmin.f",
                "define float @llvm.nvvm.fmin.f(float %a, float %b) {\n  %m = call float @llvm.minnum.f32(float %a, float %b)\n  ret float %m\n}\n",
            )
            .unwrap();

        let out = inject(
            &lines("declare float @llvm.nvvm.fmin.f(float, float)\n"),
            &table,
        );
        assert_eq!(out.lines.len(), 1);
        assert!(out.lines[0].starts_with("define float @llvm.nvvm.fmin.f("));
        assert!(out.lines[0].ends_with("}\n"));
    }

    #[test]
    fn test_only_exact_names_match() {
        let mut table = BuiltinOverrideTable::new();
        table.insert("foo", "REPLACED\n").unwrap();

        let input = lines("declare void @foobar()\ndeclare void @fo()\ncall void @foo()\n");
        let out = inject(&input, &table);
        assert!(!out.changed);
        assert_eq!(out.lines, input);
    }
}
