//! Capability context a descriptor is planned against.
//!
//! An [`Engine`] freezes the two facts planning depends on: the ISA level of
//! the executing processor and the worker-pool width the eventual kernel will
//! fan out across. Per-thread scratch regions are sized from `nthreads` at
//! descriptor-build time so execution never allocates.

use crate::isa::{get_isa_level, IsaLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    isa: IsaLevel,
    nthreads: usize,
}

impl Engine {
    /// Detect the host processor and the current rayon pool width.
    pub fn host() -> Self {
        let engine = Self {
            isa: get_isa_level(),
            nthreads: rayon::current_num_threads().max(1),
        };
        log::debug!(
            "host engine: isa={} nthreads={}",
            engine.isa.name(),
            engine.nthreads
        );
        engine
    }

    /// Build a synthetic engine. Used by tests and by callers planning for a
    /// pool narrower than the host's.
    pub fn with_caps(isa: IsaLevel, nthreads: usize) -> Self {
        Self {
            isa,
            nthreads: nthreads.max(1),
        }
    }

    pub fn isa(&self) -> IsaLevel {
        self.isa
    }

    /// Worker-pool width every per-thread scratch region is sized for.
    pub fn nthreads(&self) -> usize {
        self.nthreads
    }

    /// Capability query: can this engine execute code requiring `level`?
    pub fn mayiuse(&self, level: IsaLevel) -> bool {
        self.isa.includes(level)
    }
}
