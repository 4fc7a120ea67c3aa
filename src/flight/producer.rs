//! The async operation a coordinator deduplicates

use std::future::Future;

use async_trait::async_trait;

/// An expensive asynchronous operation wrapped by a [`SingleFlight`](super::SingleFlight).
///
/// Implemented for every `Fn(A) -> impl Future<Output = Result<T, E>>`, so a
/// plain async closure can be handed to a coordinator directly.
#[async_trait]
pub trait Producer<A, T, E>: Send + Sync
where
    A: Send + 'static,
{
    /// Run the operation once with the triggering caller's argument
    async fn produce(&self, arg: A) -> Result<T, E>;
}

#[async_trait]
impl<F, Fut, A, T, E> Producer<A, T, E> for F
where
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    A: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    async fn produce(&self, arg: A) -> Result<T, E> {
        (self)(arg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    #[async_trait]
    impl Producer<u32, u32, String> for Doubler {
        async fn produce(&self, arg: u32) -> Result<u32, String> {
            Ok(arg * 2)
        }
    }

    #[tokio::test]
    async fn test_closure_is_producer() {
        let producer = |name: &'static str| async move { Ok::<_, String>(format!("hello {}", name)) };
        let result = producer.produce("flight").await;
        assert_eq!(result, Ok("hello flight".to_string()));
    }

    #[tokio::test]
    async fn test_closure_error_passes_through() {
        let producer = |_: ()| async { Err::<u32, _>("boom") };
        assert_eq!(producer.produce(()).await, Err("boom"));
    }

    #[tokio::test]
    async fn test_struct_producer() {
        assert_eq!(Doubler.produce(21).await, Ok(42));
    }
}
