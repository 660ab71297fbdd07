//! Fixpoint worklist solver
//!
//! Drives the points-to analysis to quiescence:
//! 1. Widen GEP offsets inside cycles (optional preprocessing).
//! 2. Seed the worklist with every node reachable from the root.
//! 3. Apply `before | transfer | after` per node, collect the ones that
//!    grew, and re-enumerate everything transitively reachable from them.
//! 4. Stop when a round changes nothing.
//!
//! Every transfer function is monotone over the finite universe of
//! (node, offset) pairs, so the loop terminates. Re-enumeration walks the
//! graph's *current* edges, which is what lets `function_pointer_call`
//! hooks wire new call edges mid-solve.

use crate::errors::{AnalysisError, Result};
use crate::features::pointer_graph::domain::graph::PointerSubgraph;
use crate::features::pointer_graph::domain::node::{PsNodeId, PsNodeKind};
use crate::features::pointer_graph::domain::offset::{Offset, UNKNOWN_OFFSET};
use crate::features::pointer_graph::domain::pointer::Pointer;
use crate::features::pointer_graph::infrastructure::scc_detector::tarjan_scc;
use crate::features::points_to::domain::memory_object::{MemoryObjectId, MemoryObjects};
use crate::features::points_to::ports::PointerAnalysis;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsToConfig {
    /// Largest offset kept concrete; anything beyond saturates to
    /// `UNKNOWN_OFFSET`. Default is unconstrained.
    pub max_offset: Offset,

    /// Widen GEP offsets inside cycles before solving
    pub preprocess_geps: bool,

    /// Reserved; no effect on the solve
    pub invalidate_nodes: bool,
}

impl Default for PointsToConfig {
    fn default() -> Self {
        Self {
            max_offset: UNKNOWN_OFFSET,
            preprocess_geps: true,
            invalidate_nodes: false,
        }
    }
}

/// Counters for one `run`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverStats {
    /// Fixpoint rounds until quiescence
    pub rounds: usize,

    /// Node visits summed over all rounds
    pub processed: usize,

    /// Nodes whose points-to set grew, summed over all rounds
    pub changed: usize,

    /// GEP offsets forced to unknown by preprocessing
    pub geps_widened: usize,

    pub duration_ms: f64,
}

/// The fixpoint solver, generic over the concrete analysis
pub struct PointsToSolver<A> {
    config: PointsToConfig,
    analysis: A,
    objects: MemoryObjects,
    stats: SolverStats,

    /// Scratch buffer for memory-object queries
    objects_buf: Vec<MemoryObjectId>,
}

impl<A: PointerAnalysis> PointsToSolver<A> {
    pub fn new(analysis: A) -> Self {
        Self::with_config(analysis, PointsToConfig::default())
    }

    pub fn with_config(analysis: A, config: PointsToConfig) -> Self {
        Self {
            config,
            analysis,
            objects: MemoryObjects::new(),
            stats: SolverStats::default(),
            objects_buf: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &PointsToConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    #[inline]
    pub fn memory_objects(&self) -> &MemoryObjects {
        &self.objects
    }

    #[inline]
    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    /// Tear the solver apart after a run
    pub fn into_parts(self) -> (A, MemoryObjects, SolverStats) {
        (self.analysis, self.objects, self.stats)
    }

    /// Run the analysis to quiescence
    pub fn run(&mut self, ps: &mut PointerSubgraph) -> Result<()> {
        let total_start = Instant::now();
        self.stats = SolverStats::default();

        let root = ps.root().ok_or(AnalysisError::MissingRoot)?;

        if self.config.preprocess_geps {
            self.preprocess_geps(ps);
        }

        let mut to_process = ps.reachable_nodes(Some(root));
        debug!(nodes = to_process.len(), "points-to solve start");

        while !to_process.is_empty() {
            let last_processed_num = to_process.len();
            let mut changed = Vec::new();

            for &cur in &to_process {
                let mut enq = self.analysis.before_processed(ps, cur);
                enq |= self.process_node(ps, cur);
                enq |= self.analysis.after_processed(ps, cur);

                if enq {
                    changed.push(cur);
                }
            }

            self.stats.rounds += 1;
            self.stats.processed += last_processed_num;
            self.stats.changed += changed.len();

            to_process.clear();
            if !changed.is_empty() {
                // walk current edges so nodes wired mid-solve are found
                to_process = ps.reachable_from_seeds(&changed, last_processed_num);
                debug_assert!(to_process.len() >= changed.len());
            }
        }

        self.stats.duration_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            rounds = self.stats.rounds,
            processed = self.stats.processed,
            "points-to solve done"
        );
        Ok(())
    }

    /// Force `UNKNOWN_OFFSET` on every GEP inside a cycle
    ///
    /// Pointer arithmetic repeated around a loop widens to unknown after
    /// enough iterations anyway; doing it up front saves those rounds and
    /// never removes pointers from the answer.
    fn preprocess_geps(&mut self, ps: &mut PointerSubgraph) {
        for scc in tarjan_scc(ps) {
            if scc.len() <= 1 {
                continue;
            }
            for node in scc {
                if ps.node(node).kind() == PsNodeKind::Gep {
                    ps.node_mut(node).set_offset(UNKNOWN_OFFSET);
                    self.stats.geps_widened += 1;
                }
            }
        }
        if self.stats.geps_widened > 0 {
            debug!(widened = self.stats.geps_widened, "gep preprocessing");
        }
    }

    /// Dispatch the per-kind transfer function; true iff something grew
    fn process_node(&mut self, ps: &mut PointerSubgraph, cur: PsNodeId) -> bool {
        match ps.node(cur).kind() {
            PsNodeKind::Alloc | PsNodeKind::Function => {
                ps.node_mut(cur).add_pointer(Pointer::new(cur, Offset::ZERO))
            }
            PsNodeKind::Cast | PsNodeKind::Noop => self.copy_operand(ps, cur),
            PsNodeKind::Gep => self.process_gep(ps, cur),
            PsNodeKind::Load => self.process_load(ps, cur),
            PsNodeKind::Store => self.process_store(ps, cur),
            PsNodeKind::Phi | PsNodeKind::Return => self.union_operands(ps, cur),
            PsNodeKind::Call => self.process_call(ps, cur),
            // sentinels are fixed at construction, constants are seeded by
            // the front end; none of them ever change
            PsNodeKind::NullPtr | PsNodeKind::UnknownMem | PsNodeKind::Constant => false,
        }
    }

    /// CAST/NOOP: forward operand 0
    fn copy_operand(&mut self, ps: &mut PointerSubgraph, cur: PsNodeId) -> bool {
        let op = match ps.node(cur).operand(0) {
            Some(op) => op,
            None => return false,
        };
        let pointers: Vec<Pointer> = ps.node(op).points_to.iter().copied().collect();
        ps.node_mut(cur).add_pointers(pointers)
    }

    /// PHI/RETURN: union of all operands
    fn union_operands(&mut self, ps: &mut PointerSubgraph, cur: PsNodeId) -> bool {
        let operands = ps.node(cur).operands().to_vec();
        let mut changed = false;
        for op in operands {
            let pointers: Vec<Pointer> = ps.node(op).points_to.iter().copied().collect();
            changed |= ps.node_mut(cur).add_pointers(pointers);
        }
        changed
    }

    /// GEP: shift every incoming pointer by the node's offset, widening on
    /// unknowns, overflow and offsets past `max_offset`
    fn process_gep(&mut self, ps: &mut PointerSubgraph, cur: PsNodeId) -> bool {
        let op = match ps.node(cur).operand(0) {
            Some(op) => op,
            None => return false,
        };
        let node_offset = ps.node(cur).offset();
        let incoming: Vec<Pointer> = ps.node(op).points_to.iter().copied().collect();

        let mut changed = false;
        for ptr in incoming {
            let offset = ptr.offset.add_capped(node_offset, self.config.max_offset);
            changed |= ps
                .node_mut(cur)
                .add_pointer(Pointer::new(ptr.target, offset));
        }
        changed
    }

    /// LOAD: read every relevant memory object at the pointed-to offset
    fn process_load(&mut self, ps: &mut PointerSubgraph, cur: PsNodeId) -> bool {
        let op = match ps.node(cur).operand(0) {
            Some(op) => op,
            None => return false,
        };
        let sources: Vec<Pointer> = ps.node(op).points_to.iter().copied().collect();
        if sources.is_empty() {
            return self.analysis.error_empty_points_to(cur, op);
        }

        let mut changed = false;
        for ptr in sources {
            if ptr.is_null() {
                continue;
            }
            if ptr.is_unknown() {
                changed |= ps.node_mut(cur).add_pointer(Pointer::unknown());
                continue;
            }

            self.objects_buf.clear();
            self.analysis
                .get_memory_objects(&mut self.objects, ps, cur, ptr, &mut self.objects_buf);
            for i in 0..self.objects_buf.len() {
                let pointers = self.objects.get(self.objects_buf[i]).pointers_at(ptr.offset);
                if !pointers.is_empty() {
                    changed |= ps.node_mut(cur).add_pointers(pointers);
                }
            }
        }
        changed
    }

    /// STORE: record operand 0's pointers into every object operand 1 may
    /// reference; growth of an object re-enqueues the store so dependent
    /// loads get re-enumerated
    fn process_store(&mut self, ps: &mut PointerSubgraph, cur: PsNodeId) -> bool {
        let node = ps.node(cur);
        let (what, dest) = match (node.operand(0), node.operand(1)) {
            (Some(what), Some(dest)) => (what, dest),
            _ => return false,
        };
        let dests: Vec<Pointer> = ps.node(dest).points_to.iter().copied().collect();
        if dests.is_empty() {
            return self.analysis.error_empty_points_to(cur, dest);
        }
        let values: Vec<Pointer> = ps.node(what).points_to.iter().copied().collect();

        let mut changed = false;
        for ptr in dests {
            if ptr.is_null() {
                continue;
            }

            self.objects_buf.clear();
            self.analysis
                .get_memory_objects(&mut self.objects, ps, cur, ptr, &mut self.objects_buf);
            for i in 0..self.objects_buf.len() {
                changed |= self
                    .objects
                    .get_mut(self.objects_buf[i])
                    .add_pointers(ptr.offset, values.iter().copied());
            }
        }
        changed
    }

    /// CALL: value passing over operands, then function-pointer fan-out
    fn process_call(&mut self, ps: &mut PointerSubgraph, cur: PsNodeId) -> bool {
        let mut changed = self.union_operands(ps, cur);

        let targets: Vec<PsNodeId> = ps
            .node(cur)
            .points_to
            .iter()
            .filter(|ptr| ps.node(ptr.target).kind() == PsNodeKind::Function)
            .map(|ptr| ptr.target)
            .collect();
        for target in targets {
            changed |= self.analysis.function_pointer_call(ps, cur, target);
        }
        changed
    }
}
