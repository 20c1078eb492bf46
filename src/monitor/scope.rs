use super::TimerRegistry;
use crate::error::Result;
use std::time::Duration;
use tracing::warn;

/// Ends its label when dropped, so every `begin` is paired with an `end`
/// whichever way the scope is left.
///
/// The guard does not own its label exclusively. If the label is begun again
/// while the guard is alive (a recursive call using the same label), the
/// later start wins and the guard's `end` times from it. Once an inner guard
/// has closed the shared label, the outer guard's `end` finds nothing pending
/// and is discarded.
#[must_use = "dropping the guard immediately ends the timer"]
#[derive(Debug)]
pub struct ScopedTimer<'a> {
    registry: &'a TimerRegistry,
    label: String,
    finished: bool,
}

impl<'a> ScopedTimer<'a> {
    pub(super) fn new(registry: &'a TimerRegistry, label: &str) -> Self {
        registry.begin(label);

        Self {
            registry,
            label: label.to_string(),
            finished: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Ends the timer now instead of at drop.
    /// # Errors
    /// `TimerError::MissingTimerStart` if the label was already closed or
    /// cleared; a restarted label is still pending and ends normally
    pub fn finish(mut self) -> Result<Duration> {
        self.finished = true;
        self.registry.end(&self.label)
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        if let Err(err) = self.registry.end(&self.label) {
            warn!(label = self.label.as_str(), %err, "scoped timer could not close its label");
        }
    }
}

/// Fully qualified path of the enclosing function, closures are skipped.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let mut name = name.strip_suffix("::f").unwrap_or(name);
        while let Some(outer) = name.strip_suffix("::{{closure}}") {
            name = outer;
        }
        name
    }};
}

/// Times the rest of the enclosing block under the enclosing function's name.
///
/// ```
/// use runtime_monitor::TimerRegistry;
///
/// fn example_function(registry: &TimerRegistry) {
///     let _timer = runtime_monitor::scope_fn!(registry);
///     std::hint::black_box((0..1_000).sum::<u64>());
/// }
///
/// let registry = TimerRegistry::new();
/// example_function(&registry);
/// assert_eq!(registry.len(), 1);
/// ```
#[macro_export]
macro_rules! scope_fn {
    ($registry:expr) => {
        $registry.scope($crate::function_name!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimerError;

    fn parse(registry: &TimerRegistry, input: &str) -> std::result::Result<u32, String> {
        let _timer = registry.scope("parse");

        if input.is_empty() {
            return Err("empty".to_string());
        }

        let value = input.parse::<u32>().map_err(|e| e.to_string())?;

        Ok(value)
    }

    #[test]
    fn test_drop_ends_timer() {
        let registry = TimerRegistry::new();

        {
            let timer = registry.scope("block");
            assert_eq!(timer.label(), "block");
            assert!(registry.is_pending("block"));
        }

        assert!(registry.elapsed("block").is_some());
    }

    #[test]
    fn test_early_return_ends_timer() {
        let registry = TimerRegistry::new();

        assert!(parse(&registry, "").is_err());
        assert!(registry.elapsed("parse").is_some());

        registry.clear();

        assert!(parse(&registry, "nope").is_err());
        assert!(registry.elapsed("parse").is_some());

        assert_eq!(parse(&registry, "7"), Ok(7));
        assert!(!registry.is_pending("parse"));
    }

    #[test]
    fn test_panic_ends_timer() {
        let registry = TimerRegistry::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _timer = registry.scope("boom");
            panic!("unwinding");
        }));

        assert!(result.is_err());
        assert!(registry.elapsed("boom").is_some());
    }

    #[test]
    fn test_finish() -> Result<()> {
        let registry = TimerRegistry::new();

        let timer = registry.scope("explicit");
        let elapsed = timer.finish()?;

        assert_eq!(registry.elapsed("explicit"), Some(elapsed));

        Ok(())
    }

    #[test]
    fn test_finish_after_clear() {
        let registry = TimerRegistry::new();

        let timer = registry.scope("gone");
        registry.clear();

        assert!(matches!(
            timer.finish(),
            Err(TimerError::MissingTimerStart { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_after_clear_does_not_insert() {
        let registry = TimerRegistry::new();

        {
            let _timer = registry.scope("gone");
            registry.clear();
        }

        assert!(registry.state("gone").is_none());
    }

    #[test]
    fn test_nested_scopes() {
        let registry = TimerRegistry::new();

        {
            let _outer = registry.scope("outer");
            {
                let _inner = registry.scope("inner");
                assert!(registry.is_pending("outer"));
            }
            assert!(!registry.is_pending("inner"));
        }

        let outer = registry.elapsed("outer").unwrap();
        let inner = registry.elapsed("inner").unwrap();
        assert!(outer >= inner);
    }

    fn countdown(registry: &TimerRegistry, depth: u32) {
        let _timer = registry.scope("countdown");
        if depth > 0 {
            countdown(registry, depth - 1);
        }
    }

    #[test]
    fn test_recursive_scope_keeps_innermost() {
        let registry = TimerRegistry::new();

        countdown(&registry, 3);

        assert_eq!(registry.len(), 1);
        assert!(registry.elapsed("countdown").is_some());
    }

    #[test]
    fn test_restart_under_guard() -> Result<()> {
        let registry = TimerRegistry::new();

        let timer = registry.scope("shared");
        std::thread::sleep(Duration::from_millis(20));

        let before_restart = std::time::Instant::now();
        registry.begin("shared");
        let elapsed = timer.finish()?;

        assert!(elapsed <= before_restart.elapsed());

        Ok(())
    }

    #[test]
    fn test_function_name() {
        let name = crate::function_name!();
        assert!(name.ends_with("scope::tests::test_function_name"), "{name}");

        let in_closure = (|| crate::function_name!())();
        assert_eq!(in_closure, name);
    }

    #[test]
    fn test_scope_fn() {
        let registry = TimerRegistry::new();

        {
            let _timer = crate::scope_fn!(registry);
        }

        let labels = registry.labels();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].ends_with("tests::test_scope_fn"));
    }
}
