//! Principal-unknown resolution.

use crate::alphabet::Symbol;
use crate::equation::ParsedStep;

/// The first free symbol of the first parsed equation that has one.
///
/// Symbols are taken in order of first appearance, left side before right
/// side. Parse failures are skipped. `None` means no equation mentions a
/// variable at all.
pub fn resolve_principal<'a, I>(steps: I) -> Option<Symbol>
where
    I: IntoIterator<Item = &'a ParsedStep>,
{
    steps
        .into_iter()
        .filter_map(ParsedStep::as_equation)
        .find_map(|eq| eq.free_symbols().first().copied())
}
