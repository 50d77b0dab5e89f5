//! Double-buffered slots.

/// Two slots with a swappable "front" role.
///
/// The front slot holds the last committed value; the back slot is the write
/// target of the next pass. `swap` commits the back slot.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    front: usize,
}

impl<T> PingPong<T> {
    /// `a` starts as the front slot.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            front: 0,
        }
    }

    #[inline]
    pub fn front(&self) -> &T {
        &self.slots[self.front]
    }

    #[inline]
    pub fn back(&self) -> &T {
        &self.slots[1 - self.front]
    }

    #[inline]
    pub fn back_mut(&mut self) -> &mut T {
        &mut self.slots[1 - self.front]
    }

    /// Index (0 or 1) of the current front slot.
    #[inline]
    pub fn front_index(&self) -> usize {
        self.front
    }

    /// Slot by absolute index, independent of the current role.
    #[inline]
    pub fn slot(&self, index: usize) -> &T {
        &self.slots[index]
    }

    #[inline]
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

impl<T: Clone> PingPong<T> {
    /// Both slots start with the same value.
    pub fn splat(value: T) -> Self {
        Self::new(value.clone(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_alternates_roles() {
        let mut pp = PingPong::new("a", "b");
        assert_eq!(*pp.front(), "a");
        assert_eq!(*pp.back(), "b");
        pp.swap();
        assert_eq!(*pp.front(), "b");
        assert_eq!(*pp.back(), "a");
        assert_eq!(pp.front_index(), 1);
        pp.swap();
        assert_eq!(pp.front_index(), 0);
    }

    #[test]
    fn test_write_back_then_commit() {
        let mut pp = PingPong::splat(0);
        *pp.back_mut() = 7;
        assert_eq!(*pp.front(), 0);
        pp.swap();
        assert_eq!(*pp.front(), 7);
        assert_eq!(*pp.slot(1), 7);
    }
}
