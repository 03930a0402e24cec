//! Core resource trait
//!
//! A [`Resource`] tells the pool how to create an instance for a key, whether
//! an idle instance is still usable, and how to dispose of it.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

/// Boxed error returned by resource factories and disposers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Lifecycle hooks for a pooled resource type.
///
/// The pool owns every instance it creates. `create` is called at most once
/// per key per creation cycle; `cleanup` is called at most once per instance.
pub trait Resource: Send + Sync + 'static {
    /// Connection identity. Two equal keys share one instance.
    type Key: Eq + Hash + Clone + Debug + Send + Sync + 'static;

    /// The pooled client.
    type Instance: Send + 'static;

    /// Unique string identifier for this resource type (e.g. "ftp").
    fn id(&self) -> &str;

    /// Create a new instance for `key`.
    fn create(&self, key: &Self::Key) -> impl Future<Output = Result<Self::Instance, BoxError>> + Send;

    /// Check whether an idle instance can still be handed out.
    ///
    /// Called with the pool index locked, so it must not block.
    fn is_valid(&self, _instance: &Self::Instance) -> bool {
        true
    }

    /// Dispose of an instance that left the pool for good.
    ///
    /// Errors are logged by the pool and otherwise ignored.
    fn cleanup(&self, instance: Self::Instance) -> impl Future<Output = Result<(), BoxError>> + Send {
        async move {
            drop(instance);
            Ok(())
        }
    }
}
