/// Input the host forwards to the game each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// A key was released.
    KeyUp { key_code: u32 },
    /// Request that the looping frame start. In toggle mode this flips it.
    FrameStart,
    /// Request that the looping frame stop. Ignored in toggle mode.
    FrameStop,
}

impl InputEvent {
    pub fn is_frame_request(&self) -> bool {
        matches!(self, InputEvent::FrameStart | InputEvent::FrameStop)
    }
}

/// Events pushed by the host since the last tick. Read during `Game::update`,
/// drained after the physics step.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Take every pending event, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    /// Frame start/stop requests, in arrival order.
    pub fn frame_requests(&self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.iter().copied().filter(InputEvent::is_frame_request)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain() {
        let mut q = InputQueue::new();
        q.push(InputEvent::KeyDown { key_code: 37 });
        q.push(InputEvent::FrameStart);
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(events.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn frame_requests_keep_order_and_skip_keys() {
        let mut q = InputQueue::new();
        q.push(InputEvent::FrameStart);
        q.push(InputEvent::KeyUp { key_code: 40 });
        q.push(InputEvent::FrameStop);
        let requests: Vec<_> = q.frame_requests().collect();
        assert_eq!(requests, vec![InputEvent::FrameStart, InputEvent::FrameStop]);
    }
}
