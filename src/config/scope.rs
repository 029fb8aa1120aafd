//! The [`ConfigScope`] trait and `{token}` interpolation.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Transient per-query key/value map supplied by callers.
///
/// Overlay entries mask stored data at every level of the scope chain. The
/// overlay is never stored; it only lives for the duration of one lookup.
pub type RuntimeOverlay = HashMap<String, String>;

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\{([A-Za-z0-9._\-]*)\}").unwrap())
}

/// One link of a hierarchical key/value scope chain.
///
/// Implementors own their table exclusively; the parent is a non-owning
/// upward reference, so the chain is structurally acyclic (parents always
/// point toward the platform root).
///
/// The two lookup entry points differ only in interpolation:
/// [`raw_value`](ConfigScope::raw_value) returns the stored text verbatim,
/// [`value_with`](ConfigScope::value_with) additionally performs one
/// [`resolve_tokens`] pass against the context scope.
pub trait ConfigScope {
    /// The scope's own key/value table, in declaration order.
    fn data(&self) -> &IndexMap<String, String>;

    /// Parent scope, if any.
    fn parent(&self) -> Option<&dyn ConfigScope>;

    /// Short human-readable identity, used in diagnostics.
    fn describe(&self) -> String;

    /// Look up `key` without token interpolation.
    ///
    /// Precedence: runtime overlay, own data, then the parent chain — the
    /// parent is queried with the original calling `context` so that child
    /// overrides stay visible while resolving ancestor values.
    fn raw_value(
        &self,
        key: &str,
        context: &dyn ConfigScope,
        overlay: Option<&RuntimeOverlay>,
    ) -> Option<String> {
        if let Some(value) = overlay.and_then(|o| o.get(key)) {
            return Some(value.clone());
        }
        if let Some(value) = self.data().get(key) {
            return Some(value.clone());
        }
        self.parent().and_then(|p| p.raw_value(key, context, overlay))
    }

    /// Look up `key`, then resolve `{token}` references in the result
    /// against `context`.
    ///
    /// Absence is a normal outcome: `None` means no scope in the chain
    /// defines the key.
    fn value_with(
        &self,
        key: &str,
        context: &dyn ConfigScope,
        overlay: Option<&RuntimeOverlay>,
    ) -> Option<String> {
        self.raw_value(key, context, overlay)
            .map(|raw| resolve_tokens(&raw, context, overlay))
    }

    /// Convenience lookup using `self` as the resolution context.
    fn value(&self, key: &str) -> Option<String>
    where
        Self: Sized,
    {
        self.value_with(key, self, None)
    }

    /// Convenience lookup with an overlay, using `self` as the context.
    fn value_overlaid(&self, key: &str, overlay: &RuntimeOverlay) -> Option<String>
    where
        Self: Sized,
    {
        self.value_with(key, self, Some(overlay))
    }
}

/// Replace `{identifier}` references in `value` with lookups against
/// `context`.
///
/// Identifiers are letters, digits, `.`, `-` and `_`. Substitution is
/// single-pass: matches are located in the original string, each found token
/// is replaced at all of its occurrences in the working string, and the
/// replacement text is never re-scanned for further tokens. A token with no
/// binding is left verbatim. This is deliberately not full macro expansion;
/// a stored value of `"{b}"` stays `"{b}"` even when `b` itself resolves.
pub fn resolve_tokens(
    value: &str,
    context: &dyn ConfigScope,
    overlay: Option<&RuntimeOverlay>,
) -> String {
    let mut resolved = value.to_string();
    for caps in token_pattern().captures_iter(value) {
        let with_braces = &caps[0];
        let identifier = &caps[1];
        if let Some(replacement) = context.raw_value(identifier, context, overlay) {
            resolved = resolved.replace(with_braces, &replacement);
        }
    }
    resolved
}
