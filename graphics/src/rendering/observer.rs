//! Rendering group lifecycle notifications.

use std::fmt;

use super::drawable::Camera;
use crate::engine::Engine;

/// Point of a group's processing at which observers are notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderingGroupStage {
    /// Before the group's depth/stencil auto-clear.
    PreClear,
    /// Before opaque geometry.
    PreOpaque,
    /// Before transparent geometry.
    PreTransparent,
    /// After the group was drawn.
    PostTransparent,
}

/// What observers receive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderingGroupInfo {
    pub rendering_group_id: usize,
    pub stage: RenderingGroupStage,
    pub camera: Option<Camera>,
}

/// Observer callback. The engine is handed over so observers can inject
/// draws at the notified stage.
pub type RenderingGroupObserver = Box<dyn FnMut(&RenderingGroupInfo, &mut Engine)>;

/// Returned by [`RenderingGroupObservable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

/// Mask selecting the notifications of one rendering group.
pub const fn group_mask(rendering_group_id: usize) -> u32 {
    1 << rendering_group_id
}

/// Ordered registry of rendering group observers.
#[derive(Default)]
pub struct RenderingGroupObservable {
    observers: Vec<(ObserverToken, u32, RenderingGroupObserver)>,
    next_token: u64,
}

impl fmt::Debug for RenderingGroupObservable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingGroupObservable")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl RenderingGroupObservable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the groups selected by `mask` (see [`group_mask`]).
    pub fn subscribe(
        &mut self,
        mask: u32,
        observer: impl FnMut(&RenderingGroupInfo, &mut Engine) + 'static,
    ) -> ObserverToken {
        let token = ObserverToken(self.next_token);
        self.next_token += 1;
        self.observers.push((token, mask, Box::new(observer)));
        token
    }

    /// Observe every group.
    pub fn subscribe_all(
        &mut self,
        observer: impl FnMut(&RenderingGroupInfo, &mut Engine) + 'static,
    ) -> ObserverToken {
        self.subscribe(u32::MAX, observer)
    }

    /// Remove an observer; false if the token is unknown.
    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(other, _, _)| *other != token);
        self.observers.len() != before
    }

    pub fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    /// Call, in subscription order, every observer whose mask intersects
    /// `mask`. Returns how many were called.
    pub fn notify(&mut self, info: &RenderingGroupInfo, mask: u32, engine: &mut Engine) -> usize {
        let mut called = 0;
        for (_, observer_mask, observer) in self.observers.iter_mut() {
            if *observer_mask & mask != 0 {
                observer(info, engine);
                called += 1;
            }
        }
        called
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe() {
        let mut observable = RenderingGroupObservable::new();
        let first = observable.subscribe(group_mask(0), |_, _| {});
        let second = observable.subscribe_all(|_, _| {});
        assert_eq!(observable.len(), 2);

        assert!(observable.unsubscribe(first));
        assert!(!observable.unsubscribe(first));
        assert!(observable.has_observers());
        assert!(observable.unsubscribe(second));
        assert!(!observable.has_observers());
    }

    #[test]
    fn test_group_mask() {
        assert_eq!(group_mask(0), 1);
        assert_eq!(group_mask(3), 8);
    }
}
