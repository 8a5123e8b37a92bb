//! Dirty-tracked value cell.

/// A desired value paired with the value last pushed to the context.
///
/// The cell is dirty when nothing was ever pushed or when the desired value
/// differs from the pushed one, so setting a field back to its applied value
/// cancels a pending change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tracked<T> {
    desired: T,
    applied: Option<T>,
}

impl<T: Copy + PartialEq> Tracked<T> {
    /// Create a dirty cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            desired: value,
            applied: None,
        }
    }

    /// The desired value.
    pub fn get(&self) -> T {
        self.desired
    }

    /// Set the desired value.
    pub fn set(&mut self, value: T) {
        self.desired = value;
    }

    /// Update the desired value in place.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.desired);
    }

    /// Whether the desired value still has to be pushed.
    pub fn is_dirty(&self) -> bool {
        self.applied != Some(self.desired)
    }

    /// Return the desired value if dirty and record it as applied.
    pub fn sync(&mut self) -> Option<T> {
        if self.is_dirty() {
            self.applied = Some(self.desired);
            Some(self.desired)
        } else {
            None
        }
    }

    /// Forget the applied value.
    pub fn invalidate(&mut self) {
        self.applied = None;
    }
}
