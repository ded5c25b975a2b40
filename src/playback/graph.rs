use std::sync::Arc;

use crate::audio::SampleBuffer;
use crate::error::PlaybackError;

/// A one-shot playback node bound to a single buffer
///
/// Nodes cannot seek: restarting from another offset means creating a new
/// node.
pub trait SourceNode {
    /// Begin output at `offset_secs` into the buffer
    fn start(&mut self, offset_secs: f64);

    /// Silence the node; must return without waiting on the device
    fn stop(&mut self);

    /// Whether the output has played every frame handed to it
    fn is_finished(&self) -> bool {
        false
    }
}

/// Output graph: a monotonic clock, a gain stage and a source factory
pub trait AudioGraph {
    type Source: SourceNode;

    /// Graph clock in seconds
    fn current_time(&self) -> f64;

    fn create_source(&mut self, buffer: Arc<SampleBuffer>) -> Result<Self::Source, PlaybackError>;

    /// Gain stage between sources and the output; applies to playing nodes too
    fn set_gain(&mut self, gain: f32);
}

/// Hand-driven graph for exercising transport logic without a device
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Arc;

    use super::{AudioGraph, SourceNode};
    use crate::audio::SampleBuffer;
    use crate::error::PlaybackError;

    #[derive(Debug, Default)]
    pub struct GraphLog {
        pub created: usize,
        /// (node id, offset)
        pub started: Vec<(usize, f64)>,
        pub stopped: Vec<usize>,
        pub gain: f32,
        /// Frame count of each buffer handed to a node
        pub frames: Vec<usize>,
        /// Make the next `create_source` fail, as a vanished device would
        pub fail_next: bool,
        /// Report every node as having played out
        pub drained: bool,
    }

    pub struct FakeGraph {
        now: Rc<Cell<f64>>,
        log: Rc<RefCell<GraphLog>>,
    }

    impl FakeGraph {
        pub fn new(start_time: f64) -> (Self, Rc<Cell<f64>>, Rc<RefCell<GraphLog>>) {
            let now = Rc::new(Cell::new(start_time));
            let log = Rc::new(RefCell::new(GraphLog::default()));
            let graph = Self {
                now: Rc::clone(&now),
                log: Rc::clone(&log),
            };
            (graph, now, log)
        }
    }

    pub struct FakeNode {
        id: usize,
        log: Rc<RefCell<GraphLog>>,
    }

    impl SourceNode for FakeNode {
        fn start(&mut self, offset_secs: f64) {
            self.log.borrow_mut().started.push((self.id, offset_secs));
        }

        fn stop(&mut self) {
            self.log.borrow_mut().stopped.push(self.id);
        }

        fn is_finished(&self) -> bool {
            self.log.borrow().drained
        }
    }

    impl AudioGraph for FakeGraph {
        type Source = FakeNode;

        fn current_time(&self) -> f64 {
            self.now.get()
        }

        fn create_source(&mut self, buffer: Arc<SampleBuffer>) -> Result<FakeNode, PlaybackError> {
            let mut log = self.log.borrow_mut();
            if log.fail_next {
                log.fail_next = false;
                return Err(PlaybackError::Device("sink unavailable".into()));
            }
            log.created += 1;
            log.frames.push(buffer.frame_count());
            Ok(FakeNode {
                id: log.created,
                log: Rc::clone(&self.log),
            })
        }

        fn set_gain(&mut self, gain: f32) {
            self.log.borrow_mut().gain = gain;
        }
    }
}
