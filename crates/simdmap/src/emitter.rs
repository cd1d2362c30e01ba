//! Candidate emitter: renders one bound candidate as feature-gated code.

use alloc::string::String;
use core::fmt::Write;

use crate::binder::Binding;

/// Render `binding` as
///
/// ```text
/// if <package>.X86.<feature>() {
/// 	<dest> = <arg0>.<method>(<args...>)[.Masked(<mask>)] // <notes>
/// }
/// ```
///
/// Returns `None` when the binding has no feature gate.
pub fn render(binding: &Binding, package: &str) -> Option<String> {
    if binding.feature.is_empty() {
        return None;
    }
    let (receiver, rest) = binding.args.split_first()?;

    let mut out = String::with_capacity(128);
    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "if {}.X86.{}() {{\n\t{} = {}.{}(",
        package,
        binding.feature,
        binding.dest,
        receiver.render(package),
        binding.method
    );
    for (i, arg) in rest.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&arg.render(package));
    }
    out.push(')');
    if let Some(mask) = &binding.mask {
        let _ = write!(out, ".Masked({})", mask);
    }
    if !binding.notes.is_empty() {
        out.push_str(" // ");
        out.push_str(&binding.notes.join(", "));
    }
    out.push_str("\n}");
    Some(out)
}
