/// Two interchangeable buffers where each pass reads the last result and
/// writes the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong<T> {
    buffers: [T; 2],
    current: usize,
}

impl<T: Copy + PartialEq> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        debug_assert!(first != second, "ping-pong buffers must be distinct");
        Self {
            buffers: [first, second],
            current: 0,
        }
    }

    /// Buffer holding the most recent result
    pub fn read(&self) -> T {
        self.buffers[self.current]
    }

    /// Buffer the next pass draws into
    pub fn write(&self) -> T {
        self.buffers[self.current ^ 1]
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    /// Index of the current read buffer, 0 or 1
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    pub fn buffers(&self) -> [T; 2] {
        self.buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_write_never_alias() {
        let mut pair = PingPong::new('a', 'b');
        for _ in 0..5 {
            assert_ne!(pair.read(), pair.write());
            pair.swap();
        }
    }

    #[test]
    fn identity_after_n_swaps_is_n_mod_2() {
        for n in 0..9 {
            let mut pair = PingPong::new(0u8, 1u8);
            for _ in 0..n {
                pair.swap();
            }
            assert_eq!(pair.current_index(), n % 2);
            assert_eq!(pair.read() as usize, n % 2);
        }
    }

    #[test]
    fn written_buffer_becomes_readable_after_swap() {
        let mut pair = PingPong::new("left", "right");
        let written = pair.write();
        pair.swap();
        assert_eq!(pair.read(), written);

        pair.reset();
        assert_eq!(pair.read(), "left");
    }
}
