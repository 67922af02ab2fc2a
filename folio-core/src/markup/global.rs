//! Process-wide markup registry for callers that cannot thread one through.
//!
//! Only one scope may be active at a time. A second [`with_markups`] call,
//! nested on the same thread or overlapping from another one, fails with
//! [`RegistryError::ScopeActive`] rather than waiting or sharing state.

use super::{Markup, MarkupRegistry, RegistryError};
use parking_lot::Mutex;
use std::sync::{Arc, LazyLock};

static GLOBAL_REGISTRY: LazyLock<Mutex<MarkupRegistry>> =
    LazyLock::new(|| Mutex::new(MarkupRegistry::new()));

/// Register `markups` globally, run `f` against the registry, then clear it.
pub fn with_markups<I, F, T>(markups: I, f: F) -> Result<T, RegistryError>
where
    I: IntoIterator<Item = Arc<dyn Markup>>,
    F: FnOnce(&MarkupRegistry) -> T,
{
    let mut guard = GLOBAL_REGISTRY
        .try_lock()
        .ok_or(RegistryError::ScopeActive)?;
    let scope = guard.scope(markups);
    Ok(f(&scope))
}

/// Whether a global scope is currently active
pub fn is_active() -> bool {
    GLOBAL_REGISTRY.is_locked()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::tests::TestMarkup;

    // Both assertions share the process-wide registry, so they live in one test.
    #[test]
    fn test_global_scope_lifecycle() {
        let seen = with_markups([TestMarkup::arc("md", &[".md"])], |registry| {
            let nested = with_markups([TestMarkup::arc("asc", &[".asc"])], |_| ());
            assert!(matches!(nested, Err(RegistryError::ScopeActive)));
            registry.markups().len()
        })
        .unwrap();

        assert_eq!(seen, 1);
        assert!(!is_active());
        assert!(GLOBAL_REGISTRY.lock().is_empty());

        let result = std::panic::catch_unwind(|| {
            let _ = with_markups([TestMarkup::arc("md", &[".md"])], |_| {
                panic!("build failed");
            });
        });
        assert!(result.is_err());
        assert!(!is_active());
        assert!(GLOBAL_REGISTRY.lock().is_empty());
    }
}
