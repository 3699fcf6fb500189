//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants from
//! reducers, particularly for network calls whose result is fed back as an
//! action.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use storefront_core::async_effect;
///
/// let catalog = Arc::clone(&env.catalog);
/// async_effect! {
///     match catalog.list_products().await {
///         Ok(products) => Some(UserAction::ProductsFetched { products }),
///         Err(error) => Some(UserAction::ProductsFetchFailed { error: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use storefront_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(60),
///     action: ProductsApiAction::CollectUnused
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        Loaded { count: usize },
        Expired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Loaded { count: 20 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(60),
            action: TestAction::Expired
        };

        assert!(matches!(
            effect,
            Effect::Delay { duration, .. } if duration == Duration::from_secs(60)
        ));
    }

    #[tokio::test]
    async fn test_async_effect_output() {
        let effect = async_effect! {
            Some(TestAction::Loaded { count: 3 })
        };

        let Effect::Future(fut) = effect else {
            unreachable!("async_effect! always builds a Future");
        };
        assert!(matches!(fut.await, Some(TestAction::Loaded { count: 3 })));
    }
}
