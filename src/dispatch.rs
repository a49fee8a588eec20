/*!
Listener lists that tolerate mutation and faults during dispatch.

A [`CallbackList`] is a cheap-to-clone handle to a shared list of listeners. Every
invocation works on a snapshot of the list taken when the invocation starts:

- Listeners added while the list is being invoked run starting from the next invocation.
- Listeners removed while the list is being invoked still run in the current one.

Listeners run in reverse registration order, so the most recently added listener
observes the state first.

A listener that returns an error is logged together with the list name and doesn't
prevent the remaining listeners from running. Errors never reach the caller.

```
use bevy::prelude::*;
use bevy_input_state::prelude::*;

let list = CallbackList::<Callback1<u32>>::new("on_value");
let id = list.add(|&value| {
    assert_eq!(value, 42);
    Ok(())
});
list.invoke1(&42);
assert!(list.remove(id));
```
*/

use alloc::{string::String, vec::Vec};
use core::fmt::{self, Debug, Formatter};

use bevy::{
    platform::sync::{Arc, Mutex, MutexGuard, PoisonError},
    prelude::*,
};
use log::{error, trace};

/// Listener without arguments.
pub type Callback = dyn Fn() -> Result<()> + Send + Sync;

/// Listener with a single argument.
pub type Callback1<A> = dyn Fn(&A) -> Result<()> + Send + Sync;

/// Listener with two arguments.
pub type Callback2<A, B> = dyn Fn(&A, &B) -> Result<()> + Send + Sync;

/// Listener with two arguments that reports whether it handled them.
///
/// See [`CallbackList::invoke_any`].
pub type Predicate2<A, B> = dyn Fn(&A, &B) -> Result<bool> + Send + Sync;

/// Identifies a listener inside its [`CallbackList`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct CallbackId(u64);

/// Shared list of listeners of type `F`.
///
/// See the [module-level documentation](self) for dispatch rules.
pub struct CallbackList<F: ?Sized> {
    name: &'static str,
    context: Option<String>,
    listeners: Arc<Mutex<Listeners<F>>>,
}

impl<F: ?Sized> CallbackList<F> {
    /// Creates an empty list.
    ///
    /// The name is used to report listener errors.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            context: None,
            listeners: Default::default(),
        }
    }

    /// Describes the owner of the list for error reports.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Adds an already shared listener.
    pub fn add_shared(&self, callback: Arc<F>) -> CallbackId {
        let mut listeners = self.lock();
        let id = CallbackId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, callback));
        trace!("adding listener {id:?} to '{}'", self.name);
        id
    }

    /// Removes a listener, returns `false` if it wasn't in the list.
    pub fn remove(&self, id: CallbackId) -> bool {
        let mut listeners = self.lock();
        let Some(index) = listeners.entries.iter().position(|&(other, _)| other == id) else {
            return false;
        };
        listeners.entries.remove(index);
        true
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Returns listeners in dispatch order.
    fn snapshot(&self) -> Vec<Arc<F>> {
        self.lock()
            .entries
            .iter()
            .rev()
            .map(|(_, callback)| callback.clone())
            .collect()
    }

    fn report(&self, error: BevyError) {
        match &self.context {
            Some(context) => error!(
                "{error} while executing '{}' callbacks of '{context}'",
                self.name
            ),
            None => error!("{error} while executing '{}' callbacks", self.name),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Listeners<F>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CallbackList<Callback> {
    pub fn add(&self, callback: impl Fn() -> Result<()> + Send + Sync + 'static) -> CallbackId {
        self.add_shared(Arc::new(callback))
    }

    pub fn invoke(&self) {
        for callback in self.snapshot() {
            if let Err(e) = callback() {
                self.report(e);
            }
        }
    }
}

impl<A: ?Sized + 'static> CallbackList<Callback1<A>> {
    pub fn add(&self, callback: impl Fn(&A) -> Result<()> + Send + Sync + 'static) -> CallbackId {
        self.add_shared(Arc::new(callback))
    }

    pub fn invoke1(&self, a: &A) {
        for callback in self.snapshot() {
            if let Err(e) = callback(a) {
                self.report(e);
            }
        }
    }
}

impl<A: ?Sized + 'static, B: ?Sized + 'static> CallbackList<Callback2<A, B>> {
    pub fn add(
        &self,
        callback: impl Fn(&A, &B) -> Result<()> + Send + Sync + 'static,
    ) -> CallbackId {
        self.add_shared(Arc::new(callback))
    }

    pub fn invoke2(&self, a: &A, b: &B) {
        for callback in self.snapshot() {
            if let Err(e) = callback(a, b) {
                self.report(e);
            }
        }
    }
}

impl<A: ?Sized + 'static, B: ?Sized + 'static> CallbackList<Predicate2<A, B>> {
    pub fn add(
        &self,
        callback: impl Fn(&A, &B) -> Result<bool> + Send + Sync + 'static,
    ) -> CallbackId {
        self.add_shared(Arc::new(callback))
    }

    /// Invokes listeners until one of them returns `true`.
    ///
    /// Returns `false` if no listener returned `true`, including when the list is empty.
    /// A failed listener counts as `false`.
    ///
    /// An empty list is deliberately not treated as vacuously `true`, so without
    /// [`InputDevices::on_event`](crate::device::registry::InputDevices::on_event)
    /// listeners no event is consumed.
    pub fn invoke_any(&self, a: &A, b: &B) -> bool {
        for callback in self.snapshot() {
            match callback(a, b) {
                Ok(true) => return true,
                Ok(false) => (),
                Err(e) => self.report(e),
            }
        }
        false
    }
}

impl<F: ?Sized> Clone for CallbackList<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            context: self.context.clone(),
            listeners: self.listeners.clone(),
        }
    }
}

impl<F: ?Sized> Debug for CallbackList<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("CallbackList")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("len", &self.len())
            .finish()
    }
}

struct Listeners<F: ?Sized> {
    next_id: u64,
    entries: Vec<(CallbackId, Arc<F>)>,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use test_log::test;

    use super::*;

    #[test]
    fn reverse_order() {
        let list = CallbackList::<Callback>::new("test");
        let calls = Arc::new(Mutex::new(Vec::new()));
        for index in 0..3 {
            let calls = calls.clone();
            list.add(move || {
                calls.lock().unwrap().push(index);
                Ok(())
            });
        }

        list.invoke();
        assert_eq!(*calls.lock().unwrap(), [2, 1, 0]);
    }

    #[test]
    fn removal_during_dispatch() {
        let list = CallbackList::<Callback>::new("test");
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first_calls = calls.clone();
        let first = list.add(move || {
            first_calls.lock().unwrap().push("first");
            Ok(())
        });

        let handle = list.clone();
        let second_calls = calls.clone();
        list.add(move || {
            second_calls.lock().unwrap().push("second");
            handle.remove(first);
            Ok(())
        });

        list.invoke();
        assert_eq!(
            *calls.lock().unwrap(),
            ["second", "first"],
            "removed listener should still run in the current pass"
        );

        calls.lock().unwrap().clear();
        list.invoke();
        assert_eq!(*calls.lock().unwrap(), ["second"]);
    }

    #[test]
    fn addition_during_dispatch() {
        let list = CallbackList::<Callback1<u32>>::new("test");
        let calls = Arc::new(Mutex::new(Vec::new()));

        let handle = list.clone();
        let outer_calls = calls.clone();
        list.add(move |&value| {
            outer_calls.lock().unwrap().push(value);
            let inner_calls = outer_calls.clone();
            handle.add(move |&value| {
                inner_calls.lock().unwrap().push(value + 100);
                Ok(())
            });
            Ok(())
        });

        list.invoke1(&1);
        assert_eq!(*calls.lock().unwrap(), [1], "added listener shouldn't run yet");
        assert_eq!(list.len(), 2);

        list.invoke1(&2);
        assert_eq!(*calls.lock().unwrap(), [1, 102, 2]);
    }

    #[test]
    fn fault_isolation() {
        let list = CallbackList::<Callback2<u32, u32>>::new("test").with_context("fixture");
        let sum = Arc::new(Mutex::new(0));

        let first_sum = sum.clone();
        list.add(move |a, b| {
            *first_sum.lock().unwrap() += a + b;
            Ok(())
        });
        list.add(|_, _| Err("broken listener".into()));

        list.invoke2(&1, &2);
        assert_eq!(*sum.lock().unwrap(), 3);
    }

    #[test]
    fn any() {
        let list = CallbackList::<Predicate2<u32, u32>>::new("test");
        assert!(!list.invoke_any(&1, &1), "empty list shouldn't handle anything");

        let calls = Arc::new(Mutex::new(vec![]));
        let first_calls = calls.clone();
        list.add(move |_, _| {
            first_calls.lock().unwrap().push("equal");
            Ok(false)
        });
        list.add(|_, _| Err("broken listener".into()));
        let last_calls = calls.clone();
        list.add(move |a, b| {
            last_calls.lock().unwrap().push("greater");
            Ok(a > b)
        });

        assert!(list.invoke_any(&2, &1));
        assert_eq!(*calls.lock().unwrap(), ["greater"], "should stop on the first match");

        calls.lock().unwrap().clear();
        assert!(!list.invoke_any(&1, &1));
        assert_eq!(*calls.lock().unwrap(), ["greater", "equal"]);
    }
}
