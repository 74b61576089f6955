//! Magic-ID inlining for C-like kernel source
//!
//! `x = magic_foo_id(y);` becomes `x = y;`. The source compiler has already
//! type-checked the call, so no signature check happens here.

use super::PassOutput;
use crate::document::split_terminator;
use crate::grammar::{parse_assignment, parse_magic_call};
use tracing::info;

pub fn resolve(lines: &[String]) -> PassOutput {
    let mut out = PassOutput::with_capacity(lines.len());

    for line in lines {
        let (body, terminator) = split_terminator(line);
        let Some(assignment) = parse_assignment(body) else {
            out.lines.push(line.clone());
            continue;
        };

        info!("Patching magic ID {}", assignment.callee);
        out.patched_magic_ids.push(assignment.callee.to_string());

        // magic_a_id(magic_b_id(y)) collapses to y in one pass
        let mut argument = assignment.argument;
        while let Some((callee, inner)) = parse_magic_call(argument) {
            info!("Patching magic ID {}", callee);
            out.patched_magic_ids.push(callee.to_string());
            argument = inner;
        }

        out.lines
            .push(format!("{} = {};{}", assignment.lhs, argument, terminator));
        out.changed = true;
    }

    out
}
