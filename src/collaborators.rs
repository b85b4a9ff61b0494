//! Hooks into the host that drives generation. The core polls and calls these, it never owns
//! their state.

use std::fmt::Debug;

use crate::builder::ModuleRecord;

/// Pacing of the cooperative stepping, polled once per tile-step.
pub trait PacingController: Debug {
    /// Skip all pacing and run generation to the end in one go.
    fn instant_mode(&self) -> bool;

    /// Suspend before every step until the host signals an advance.
    fn manual_advance_mode(&self) -> bool;

    /// Consume one pending advance signal. Only asked for in manual advance mode.
    fn take_advance(&mut self) -> bool;

    /// The host allows `steps` more steps. Ignored by controllers that never suspend.
    fn signal(&mut self, _steps: usize) {}
}

#[derive(Debug, Default, Copy, Clone)]
pub struct InstantPacing;

impl PacingController for InstantPacing {
    fn instant_mode(&self) -> bool {
        true
    }

    fn manual_advance_mode(&self) -> bool {
        false
    }

    fn take_advance(&mut self) -> bool {
        true
    }
}

/// One step per host frame: every `run` call advances by a single tick.
#[derive(Debug, Default, Copy, Clone)]
pub struct FramePacing;

impl PacingController for FramePacing {
    fn instant_mode(&self) -> bool {
        false
    }

    fn manual_advance_mode(&self) -> bool {
        false
    }

    fn take_advance(&mut self) -> bool {
        true
    }
}

/// Steps only happen when the host signals them, e.g. while a key is held.
#[derive(Debug, Default, Clone)]
pub struct ManualPacing {
    pending: usize,
}

impl ManualPacing {
    pub fn new() -> ManualPacing {
        ManualPacing::default()
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl PacingController for ManualPacing {
    fn instant_mode(&self) -> bool {
        false
    }

    fn manual_advance_mode(&self) -> bool {
        true
    }

    fn take_advance(&mut self) -> bool {
        if self.pending > 0 {
            self.pending -= 1;
            true
        } else {
            false
        }
    }

    fn signal(&mut self, steps: usize) {
        self.pending += steps;
    }
}

/// Downstream geometry work (mesh combining and the like), called once per completed module.
pub trait GeometryOptimizer: Debug {
    fn optimize(&mut self, module: &ModuleRecord);
}

#[derive(Debug, Default, Copy, Clone)]
pub struct NoopOptimizer;

impl GeometryOptimizer for NoopOptimizer {
    fn optimize(&mut self, _: &ModuleRecord) {}
}
