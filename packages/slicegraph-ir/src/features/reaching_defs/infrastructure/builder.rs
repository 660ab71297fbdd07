//! Reaching-defs graph construction
//!
//! Walks an IR module instruction by instruction and emits the CFG of
//! [`RdNode`]s the reaching-defs solver runs over. Store targets are
//! resolved through the points-to oracle into def-sites; calls splice the
//! callee's (cached) body between a call/return pair; empty blocks are
//! skipped when stitching block successors.
//!
//! Two maps outlive block building: `nodes_map` (IR value → its node, used
//! to resolve allocation targets of stores) and `mapping` (instruction →
//! the node reaching it, recorded before the instruction is processed so
//! later phases can find the defining point).

use crate::errors::{AnalysisError, Result};
use crate::features::pointer_graph::domain::graph::PointerSubgraph;
use crate::features::pointer_graph::domain::offset::{Offset, UNKNOWN_OFFSET};
use crate::features::reaching_defs::domain::node::{
    DefSite, FnSubgraph, RdNodeId, RdNodeKind, ReachingDefsGraph,
};
use crate::features::reaching_defs::ports::PointsToOracle;
use crate::shared::models::{
    BasicBlock, BlockId, Callee, DataLayout, Function, FunctionId, Instruction, Module, Opcode,
    Ty, ValueId,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Instant;
use tracing::warn;

/// Functions the builder recognizes as memory allocators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllocatorKind {
    None,
    Malloc,
    Calloc,
    Alloca,
}

impl AllocatorKind {
    fn classify(name: &str) -> Result<AllocatorKind> {
        match name {
            "malloc" => Ok(AllocatorKind::Malloc),
            "calloc" => Ok(AllocatorKind::Calloc),
            "alloca" => Ok(AllocatorKind::Alloca),
            "realloc" => Err(AnalysisError::unsupported("realloc")),
            _ => Ok(AllocatorKind::None),
        }
    }
}

/// Counters for one build
#[derive(Debug, Clone, Default)]
pub struct RdBuilderStats {
    pub functions_built: usize,
    pub globals: usize,
    pub def_sites: usize,

    /// Def-sites dropped because the pointer target had no node
    pub skipped_defs: usize,

    pub duration_ms: f64,
}

/// Everything a finished build hands to the solver and to later phases
#[derive(Debug)]
pub struct BuiltReachingDefs {
    pub graph: ReachingDefsGraph,

    /// Overall root: the first global, or the entry function's root
    pub root: RdNodeId,

    /// IR value → its own reaching-defs node
    pub nodes_map: FxHashMap<ValueId, RdNodeId>,

    /// Instruction → the node reaching it
    pub mapping: FxHashMap<ValueId, RdNodeId>,

    pub stats: RdBuilderStats,
}

/// Translates one module into a reaching-defs CFG
pub struct RdBuilder<'a, O> {
    module: &'a Module,
    layout: &'a DataLayout,
    ps: &'a PointerSubgraph,
    oracle: &'a O,

    graph: ReachingDefsGraph,
    nodes_map: FxHashMap<ValueId, RdNodeId>,
    mapping: FxHashMap<ValueId, RdNodeId>,
    subgraphs: FxHashMap<FunctionId, FnSubgraph>,
    stats: RdBuilderStats,
}

impl<'a, O: PointsToOracle> RdBuilder<'a, O> {
    pub fn new(
        module: &'a Module,
        layout: &'a DataLayout,
        ps: &'a PointerSubgraph,
        oracle: &'a O,
    ) -> Self {
        Self {
            module,
            layout,
            ps,
            oracle,
            graph: ReachingDefsGraph::new(),
            nodes_map: FxHashMap::default(),
            mapping: FxHashMap::default(),
            subgraphs: FxHashMap::default(),
            stats: RdBuilderStats::default(),
        }
    }

    /// Build the whole module, returning the overall root
    ///
    /// The entry function is `main`; its absence is fatal. Globals are
    /// emitted first so function bodies can resolve stores into them.
    pub fn build(mut self) -> Result<BuiltReachingDefs> {
        let start = Instant::now();

        let main = self
            .module
            .function_named("main")
            .ok_or_else(|| AnalysisError::MissingEntry("main".into()))?;

        let globals = self.build_globals();
        let mut root = self.build_function(main)?;

        if let Some((first, last)) = globals {
            self.graph.add_successor(last, root);
            root = first;
        }
        self.graph.set_root(root);

        self.stats.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(BuiltReachingDefs {
            graph: self.graph,
            root,
            nodes_map: self.nodes_map,
            mapping: self.mapping,
            stats: self.stats,
        })
    }

    /// Emit one allocation-like node per global, chained in declaration
    /// order; returns the (first, last) ends of the chain
    fn build_globals(&mut self) -> Option<(RdNodeId, RdNodeId)> {
        let mut first = None;
        let mut prev: Option<RdNodeId> = None;

        for gv in &self.module.globals {
            let node = self.graph.add_node(RdNodeKind::Global);
            self.graph.node_mut(node).set_name(gv.name.clone());
            self.nodes_map.insert(gv.value, node);
            self.stats.globals += 1;

            match prev {
                Some(p) => self.graph.add_successor(p, node),
                None => first = Some(node),
            }
            prev = Some(node);
        }

        first.map(|f| (f, prev.unwrap()))
    }

    /// Build one function body; returns its entry node
    ///
    /// The subgraph record is cached *before* blocks are built so recursive
    /// calls (direct or mutual) find the entry/exit pair instead of
    /// rebuilding forever.
    fn build_function(&mut self, f: FunctionId) -> Result<RdNodeId> {
        let module = self.module;
        let func = module.function(f);

        let root = self.graph.add_node(RdNodeKind::Entry);
        let ret = self.graph.add_node(RdNodeKind::Exit);
        self.graph.node_mut(root).set_name(format!("entry {}", func.name));
        self.graph.node_mut(ret).set_name(format!("ret {}", func.name));
        self.subgraphs.insert(f, FnSubgraph { root, ret });
        self.stats.functions_built += 1;

        let mut built_blocks: FxHashMap<BlockId, (RdNodeId, RdNodeId)> = FxHashMap::default();
        let mut first = None;
        for (idx, block) in func.blocks.iter().enumerate() {
            let (block_first, block_last) = self.build_block(block)?;
            debug_assert_eq!(block_first.is_some(), block_last.is_some());

            if let (Some(bf), Some(bl)) = (block_first, block_last) {
                built_blocks.insert(idx as BlockId, (bf, bl));
                if first.is_none() {
                    first = Some(bf);
                }
            }
        }

        let first = first.ok_or_else(|| {
            AnalysisError::malformed(&func.name, "body emits no reaching-defs nodes")
        })?;
        self.graph.add_successor(root, first);

        // stitch block successors; a block that gains none is a return site
        let mut rets = Vec::new();
        for idx in 0..func.blocks.len() {
            let block = idx as BlockId;
            let last = match built_blocks.get(&block) {
                Some(&(_, last)) => last,
                None => continue,
            };
            let mut seen = FxHashSet::default();
            let real_succs = self.block_add_successors(&built_blocks, func, last, block, &mut seen);
            if real_succs == 0 {
                rets.push(last);
            }
        }

        if rets.is_empty() {
            return Err(AnalysisError::malformed(&func.name, "no return block"));
        }
        for r in rets {
            self.graph.add_successor(r, ret);
        }

        Ok(root)
    }

    /// Build one basic block; returns its (first, last) emitted nodes, or
    /// `(None, None)` when nothing in it is reaching-defs relevant
    fn build_block(&mut self, block: &BasicBlock) -> Result<(Option<RdNodeId>, Option<RdNodeId>)> {
        let mut first: Option<RdNodeId> = None;
        let mut cur: Option<RdNodeId> = None;

        for inst in &block.instructions {
            // record the reaching point before the instruction is processed
            if let Some(c) = cur {
                self.mapping.insert(inst.value, c);
            }

            match &inst.opcode {
                Opcode::Alloca => {
                    let node = self.create_plain(inst.value, RdNodeKind::Alloc);
                    self.link(&mut first, &mut cur, node);
                }
                Opcode::Store { value_ty, dest } => {
                    let node = self.create_store(inst.value, value_ty, *dest)?;
                    self.link(&mut first, &mut cur, node);
                }
                Opcode::Ret => {
                    // returns shape the control flow even without defs
                    let node = self.create_plain(inst.value, RdNodeKind::Ret);
                    self.link(&mut first, &mut cur, node);
                }
                Opcode::Call(callee) => {
                    if let Some((call, call_ret)) = self.create_call(inst, callee)? {
                        if let Some(c) = cur {
                            self.graph.add_successor(c, call);
                        }
                        if first.is_none() {
                            first = Some(call);
                        }
                        cur = Some(call_ret);
                    }
                }
                Opcode::Other => {}
            }
        }

        Ok((first, cur))
    }

    fn link(&mut self, first: &mut Option<RdNodeId>, cur: &mut Option<RdNodeId>, node: RdNodeId) {
        if let Some(c) = *cur {
            self.graph.add_successor(c, node);
        }
        if first.is_none() {
            *first = Some(node);
        }
        *cur = Some(node);
    }

    /// Fresh node with no def-sites, registered under its IR value
    fn create_plain(&mut self, value: ValueId, kind: RdNodeKind) -> RdNodeId {
        let node = self.graph.add_node(kind);
        self.nodes_map.insert(value, node);
        node
    }

    /// Store node with one def-site per resolvable non-null target
    fn create_store(&mut self, value: ValueId, value_ty: &Ty, dest: ValueId) -> Result<RdNodeId> {
        let ps = self.ps;
        let node = self.graph.add_node(RdNodeKind::Store);
        self.nodes_map.insert(value, node);

        let pts_node = self
            .oracle
            .points_to_node(dest)
            .ok_or(AnalysisError::MissingPointsTo(dest))?;
        let pts = &ps.node(pts_node).points_to;

        // a singleton target permits kill-and-replace of prior defs
        let strong = pts.len() == 1;

        let mut size = Offset(self.layout.type_alloc_size(value_ty));
        if size == Offset(0) {
            size = UNKNOWN_OFFSET;
        }

        for &ptr in pts {
            if ptr.is_null() {
                continue;
            }
            let target_value = match ps.node(ptr.target).user_data() {
                Some(v) => v,
                None => {
                    warn!(node = ptr.target, "store target has no IR value, skipping def-site");
                    self.stats.skipped_defs += 1;
                    continue;
                }
            };
            let alloc_node = match self.nodes_map.get(&target_value) {
                Some(&n) => n,
                None => {
                    warn!(
                        value = target_value,
                        "no reaching-defs node for store target, skipping def-site"
                    );
                    self.stats.skipped_defs += 1;
                    continue;
                }
            };

            self.graph.add_def(
                node,
                DefSite {
                    target: alloc_node,
                    offset: ptr.offset,
                    size,
                    strong,
                },
            );
            self.stats.def_sites += 1;
        }

        Ok(node)
    }

    /// Handle one call instruction; `None` means the call carries no data
    /// flow (debug pseudo-instruction) and nothing was emitted
    fn create_call(
        &mut self,
        inst: &Instruction,
        callee: &Callee,
    ) -> Result<Option<(RdNodeId, RdNodeId)>> {
        let module = self.module;
        let ps = self.ps;

        match callee {
            Callee::Direct(f) => {
                if module.function(*f).is_debug_intrinsic() {
                    return Ok(None);
                }
                self.create_direct_call(inst.value, *f).map(Some)
            }
            Callee::Indirect(called) => {
                let pts_node = self
                    .oracle
                    .points_to_node(*called)
                    .ok_or(AnalysisError::MissingPointsTo(*called))?;
                let pts = &ps.node(pts_node).points_to;
                if pts.is_empty() {
                    return Err(AnalysisError::EmptyCalleePointsTo(*called));
                }

                if pts.len() > 1 {
                    let call = self.graph.add_node(RdNodeKind::Call);
                    let ret = self.graph.add_node(RdNodeKind::CallReturn);
                    self.graph.node_mut(call).set_name("funcptr dispatch");
                    self.nodes_map.insert(inst.value, call);

                    for &ptr in pts {
                        // unknown targets stay with the points-to layer
                        if ptr.is_null() || ptr.is_unknown() {
                            continue;
                        }
                        let function = ps
                            .node(ptr.target)
                            .user_data()
                            .and_then(|v| module.function_by_value(v));
                        let f = match function {
                            Some(f) => f,
                            None => {
                                warn!(
                                    node = ptr.target,
                                    "function-pointer target is not a function, skipping"
                                );
                                continue;
                            }
                        };
                        let (cf_call, cf_ret) = self.create_call_to_function(f)?;
                        self.graph.add_successor(call, cf_call);
                        self.graph.add_successor(cf_ret, ret);
                    }
                    Ok(Some((call, ret)))
                } else {
                    let ptr = pts.iter().next().unwrap();
                    let f = ps
                        .node(ptr.target)
                        .user_data()
                        .and_then(|v| module.function_by_value(v))
                        .ok_or(AnalysisError::UnresolvedCallee(*called))?;
                    self.create_direct_call(inst.value, f).map(Some)
                }
            }
        }
    }

    /// Direct call: allocators and opaque bodies collapse to one node,
    /// intrinsics are fatal, everything else splices the callee's body
    fn create_direct_call(
        &mut self,
        call_value: ValueId,
        f: FunctionId,
    ) -> Result<(RdNodeId, RdNodeId)> {
        let module = self.module;
        let func = module.function(f);

        if AllocatorKind::classify(&func.name)? != AllocatorKind::None
            || func.is_declaration()
        {
            let node = self.create_plain(call_value, RdNodeKind::Alloc);
            return Ok((node, node));
        }
        if func.is_intrinsic {
            return Err(AnalysisError::unsupported(format!(
                "intrinsic function '{}'",
                func.name
            )));
        }

        let pair = self.create_call_to_function(f)?;
        self.nodes_map.insert(call_value, pair.0);
        Ok(pair)
    }

    /// Wire a call/return pair around the callee's (cached) body
    fn create_call_to_function(&mut self, f: FunctionId) -> Result<(RdNodeId, RdNodeId)> {
        let call = self.graph.add_node(RdNodeKind::Call);
        let ret = self.graph.add_node(RdNodeKind::CallReturn);

        if self.subgraphs.get(&f).is_none() {
            self.build_function(f)?;
        }
        let subg = self.subgraphs[&f];

        self.graph.add_successor(call, subg.root);
        self.graph.add_successor(subg.ret, ret);
        Ok((call, ret))
    }

    /// Wire `from` to the first node of every real successor block of
    /// `block`, looking through empty blocks; returns how many edges were
    /// added. `seen` keeps a cycle of empty blocks from recursing forever.
    fn block_add_successors(
        &mut self,
        built_blocks: &FxHashMap<BlockId, (RdNodeId, RdNodeId)>,
        func: &Function,
        from: RdNodeId,
        block: BlockId,
        seen: &mut FxHashSet<BlockId>,
    ) -> usize {
        let mut num = 0;
        for &succ in &func.blocks[block as usize].successors {
            if let Some(&(succ_first, _)) = built_blocks.get(&succ) {
                self.graph.add_successor(from, succ_first);
                num += 1;
            } else if seen.insert(succ) {
                // empty block: pretend to be there for control flow and
                // splice its successors in instead
                num += self.block_add_successors(built_blocks, func, from, succ, seen);
            }
        }
        num
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::pointer_graph::domain::node::PsNodeKind;
    use crate::features::pointer_graph::domain::pointer::Pointer;
    use crate::features::reaching_defs::ports::PointsToMap;

    /// main: a = alloca; store null -> a; ret
    fn simple_setup() -> (Module, PointerSubgraph, PointsToMap) {
        let module = Module::new(
            vec![],
            vec![Function::new(
                100,
                "main",
                vec![BasicBlock::new(
                    vec![
                        Instruction::new(1, Opcode::Alloca),
                        Instruction::new(
                            2,
                            Opcode::Store {
                                value_ty: Ty::Ptr,
                                dest: 1,
                            },
                        ),
                        Instruction::new(3, Opcode::Ret),
                    ],
                    vec![],
                )],
            )],
        );

        let mut ps = PointerSubgraph::new();
        let a = ps.add_node(PsNodeKind::Alloc);
        ps.node_mut(a).set_user_data(1);
        ps.node_mut(a).add_pointer(Pointer::new(a, Offset(0)));
        ps.set_root(a);

        let mut oracle = PointsToMap::new();
        oracle.insert(1, a);

        (module, ps, oracle)
    }

    #[test]
    fn test_missing_main_is_fatal() {
        let module = Module::default();
        let layout = DataLayout::default();
        let ps = PointerSubgraph::new();
        let oracle = PointsToMap::new();

        let err = RdBuilder::new(&module, &layout, &ps, &oracle)
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingEntry(_)));
    }

    #[test]
    fn test_simple_function_shape() {
        let (module, ps, oracle) = simple_setup();
        let layout = DataLayout::default();

        let built = RdBuilder::new(&module, &layout, &ps, &oracle)
            .build()
            .unwrap();

        // entry → alloca → store → ret → unified exit, all reachable
        let reachable = built.graph.reachable_nodes(built.root);
        assert_eq!(reachable.len(), built.graph.len());
        assert_eq!(built.graph.node(built.root).kind(), RdNodeKind::Entry);

        // the store defines a at offset 0 with pointer extent, strongly
        let store = built.nodes_map[&2];
        let defs = built.graph.node(store).defs();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].target, built.nodes_map[&1]);
        assert_eq!(defs[0].offset, Offset(0));
        assert_eq!(defs[0].size, Offset(8));
        assert!(defs[0].strong);
    }

    #[test]
    fn test_mapping_records_reaching_point() {
        let (module, ps, oracle) = simple_setup();
        let layout = DataLayout::default();

        let built = RdBuilder::new(&module, &layout, &ps, &oracle)
            .build()
            .unwrap();

        // the store's reaching point is the alloca's node; the alloca, being
        // first in its block, has none
        assert_eq!(built.mapping.get(&2), Some(&built.nodes_map[&1]));
        assert_eq!(built.mapping.get(&1), None);
    }

    #[test]
    fn test_missing_oracle_entry_is_fatal() {
        let (module, ps, _) = simple_setup();
        let layout = DataLayout::default();
        let empty_oracle = PointsToMap::new();

        let err = RdBuilder::new(&module, &layout, &ps, &empty_oracle)
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingPointsTo(1)));
    }

    #[test]
    fn test_realloc_is_unsupported() {
        let module = Module::new(
            vec![],
            vec![
                Function::declaration(50, "realloc"),
                Function::new(
                    100,
                    "main",
                    vec![BasicBlock::new(
                        vec![
                            Instruction::new(1, Opcode::Call(Callee::Direct(0))),
                            Instruction::new(2, Opcode::Ret),
                        ],
                        vec![],
                    )],
                ),
            ],
        );
        let layout = DataLayout::default();
        let ps = PointerSubgraph::new();
        let oracle = PointsToMap::new();

        let err = RdBuilder::new(&module, &layout, &ps, &oracle)
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Unsupported(_)));
    }

    #[test]
    fn test_debug_pseudo_call_is_skipped() {
        let module = Module::new(
            vec![],
            vec![
                Function::declaration(50, "dbg.value").intrinsic(),
                Function::new(
                    100,
                    "main",
                    vec![BasicBlock::new(
                        vec![
                            Instruction::new(1, Opcode::Alloca),
                            Instruction::new(2, Opcode::Call(Callee::Direct(0))),
                            Instruction::new(3, Opcode::Ret),
                        ],
                        vec![],
                    )],
                ),
            ],
        );
        let layout = DataLayout::default();
        let ps = PointerSubgraph::new();
        let oracle = PointsToMap::new();

        let built = RdBuilder::new(&module, &layout, &ps, &oracle)
            .build()
            .unwrap();

        // no node was emitted for the pseudo-call
        assert!(built.nodes_map.get(&2).is_none());
        // alloca wires straight to ret
        let alloca = built.nodes_map[&1];
        let ret = built.nodes_map[&3];
        assert_eq!(built.graph.node(alloca).successors(), &[ret]);
    }

    #[test]
    fn test_allocating_call_collapses_to_one_node() {
        let module = Module::new(
            vec![],
            vec![
                Function::declaration(50, "malloc"),
                Function::new(
                    100,
                    "main",
                    vec![BasicBlock::new(
                        vec![
                            Instruction::new(1, Opcode::Call(Callee::Direct(0))),
                            Instruction::new(2, Opcode::Ret),
                        ],
                        vec![],
                    )],
                ),
            ],
        );
        let layout = DataLayout::default();
        let ps = PointerSubgraph::new();
        let oracle = PointsToMap::new();

        let built = RdBuilder::new(&module, &layout, &ps, &oracle)
            .build()
            .unwrap();

        let call = built.nodes_map[&1];
        assert_eq!(built.graph.node(call).kind(), RdNodeKind::Alloc);
        assert_eq!(built.stats.functions_built, 1);
    }
}
