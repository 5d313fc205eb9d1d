//! Theme change observers
//!
//! Two kinds of observers are notified on every change: general listeners implementing
//! [`ThemeChangeListener`], held until explicitly unsubscribed, and single-color
//! bindings, which are dropped as soon as their callback reports the target is gone.

use crate::color::{Argb, ColorState};
use crate::config::NightMode;

use super::delegate::ThemeRef;
use super::ids::{ColorId, PropertyId, ThemeId};

pub trait ThemeChangeListener {
    /// A switch from `from` to `to` has started
    fn on_theme_changed(&mut self, _from: ThemeRef<'_>, _to: ThemeRef<'_>) {}

    /// Colors of the current theme changed. `state` is set when a single color was edited.
    fn on_theme_colors_changed(
        &mut self,
        theme: ThemeRef<'_>,
        is_temporary: bool,
        state: Option<&ColorState>,
    );

    /// Whether to receive provisional notifications while a cross-fade runs
    fn needs_temporary_updates(&self) -> bool {
        false
    }

    fn on_theme_property_changed(
        &mut self,
        _theme: ThemeId,
        _property: PropertyId,
        _value: f32,
        _is_default: bool,
    ) {
    }

    fn on_auto_night_mode_changed(&mut self, _mode: NightMode) {}
}

/// Handle returned by [`ListenerList::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    index: usize,
    generation: u64,
}

struct Slot<L: ?Sized> {
    generation: u64,
    listener: Box<L>,
}

/// Generation-counted listener table; freed slots are reused, stale handles are ignored
pub struct ListenerList<L: ?Sized> {
    slots: Vec<Option<Slot<L>>>,
    next_generation: u64,
}

impl<L: ?Sized> Default for ListenerList<L> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_generation: 1,
        }
    }
}

impl<L: ?Sized> ListenerList<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<L>) -> Subscription {
        let generation = self.next_generation;
        self.next_generation += 1;
        let slot = Some(Slot {
            generation,
            listener,
        });
        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = slot;
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        Subscription { index, generation }
    }

    /// Remove a listener; `None` if the handle is stale
    pub fn unsubscribe(&mut self, subscription: Subscription) -> Option<Box<L>> {
        let slot = self.slots.get_mut(subscription.index)?;
        if slot.as_ref().map(|s| s.generation) == Some(subscription.generation) {
            slot.take().map(|s| s.listener)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut L)) {
        for slot in self.slots.iter_mut().flatten() {
            f(slot.listener.as_mut());
        }
    }
}

type BindingFn = dyn FnMut(Argb, bool) -> bool;

/// Binding of a single color slot to some external target
struct ColorBinding {
    color: ColorId,
    apply: Box<BindingFn>,
}

/// Flat list of color bindings
#[derive(Default)]
pub struct ColorBindings {
    bindings: Vec<ColorBinding>,
}

impl ColorBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// `apply` receives the new color and the provisional flag; returning `false`
    /// removes the binding
    pub fn bind(&mut self, color: ColorId, apply: impl FnMut(Argb, bool) -> bool + 'static) {
        self.bindings.push(ColorBinding {
            color,
            apply: Box::new(apply),
        });
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Push current colors to every binding, sweeping dead ones
    pub fn apply(&mut self, theme: ThemeRef<'_>, is_temporary: bool) {
        let before = self.bindings.len();
        self.bindings
            .retain_mut(|binding| (binding.apply)(theme.color(binding.color), is_temporary));
        let removed = before - self.bindings.len();
        if removed > 0 {
            tracing::debug!("Swept {} dead color bindings", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named {
        fn name(&self) -> &str;
    }

    struct N(&'static str);

    impl Named for N {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let mut list: ListenerList<dyn Named> = ListenerList::new();
        let a = list.subscribe(Box::new(N("a")));
        let b = list.subscribe(Box::new(N("b")));
        assert_eq!(list.len(), 2);

        assert_eq!(list.unsubscribe(a).map(|l| l.name().to_string()), Some("a".into()));
        assert!(list.unsubscribe(a).is_none());

        // Slot reuse does not revive the old handle
        let c = list.subscribe(Box::new(N("c")));
        assert_ne!(a, c);
        assert!(list.unsubscribe(a).is_none());

        let mut names = Vec::new();
        list.for_each_mut(|l| names.push(l.name().to_string()));
        names.sort();
        assert_eq!(names, vec!["b".to_string(), "c".to_string()]);
        assert!(list.unsubscribe(b).is_some());
        assert_eq!(list.len(), 1);
    }
}
