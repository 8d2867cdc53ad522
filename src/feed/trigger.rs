/// The rendered window of a list: `rows` rows starting at item `offset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub rows: usize,
}

impl Viewport {
    /// Whether the sentinel row, which sits right after the last of
    /// `total_items`, is inside the window.
    pub fn sentinel_visible(&self, total_items: usize) -> bool {
        self.rows > 0 && total_items >= self.offset && total_items - self.offset < self.rows
    }
}

/// Turns sentinel visibility into a one-shot "load more" signal.
///
/// Fires only on the transition from hidden to visible, so a sentinel that
/// stays on screen across redraws produces a single signal. After a page
/// lands, [`rearm`](Self::rearm) lets a still-visible sentinel fire again.
#[derive(Debug)]
pub struct ScrollTrigger {
    connected: bool,
    intersecting: bool,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTrigger {
    pub fn new() -> Self {
        Self {
            connected: true,
            intersecting: false,
        }
    }

    /// Record the sentinel's visibility for this frame.
    ///
    /// Returns `true` exactly when it just became visible.
    pub fn observe(&mut self, sentinel_visible: bool) -> bool {
        if !self.connected {
            return false;
        }
        let fired = sentinel_visible && !self.intersecting;
        self.intersecting = sentinel_visible;
        if fired {
            tracing::trace!("Sentinel entered viewport");
        }
        fired
    }

    /// Forget the current intersection.
    pub fn rearm(&mut self) {
        self.intersecting = false;
    }

    /// Stop emitting signals for good.
    pub fn disconnect(&mut self) {
        if self.connected {
            tracing::trace!("Scroll trigger disconnected");
        }
        self.connected = false;
        self.intersecting = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Drop for ScrollTrigger {
    fn drop(&mut self) {
        self.disconnect();
    }
}
