use crate::callgraph::CallGraph;
use crate::cfg::{CfgFull, CfgMethod};
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::ids::{BlockId, ClassId, MethodId, StmtId};
use crate::slicer::{BackwardSlicer, ForwardSlicer};
use crate::xref::{XRef, XRefQuery, x_ref};
use cortado_ir::{Block, Class, ClassTable, Method, MethodKey, Statement};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Inputs for constructing a [`Project`] through a [`Lifter`].
#[derive(Clone, Debug, Default)]
pub struct ProjectOptions {
    /// Path of the application to analyze (jar, apk, class directory; the
    /// lifter decides what it accepts).
    pub app_path: PathBuf,
    /// Input format hint forwarded to the lifter.
    pub input_format: Option<String>,
    /// SDK location forwarded to the lifter.
    pub sdk_path: Option<PathBuf>,
    /// Class-table cache location. When the file exists the table is
    /// restored from it and the lifter is not invoked; when it is supplied
    /// but absent, the freshly-lifted table is serialized to it.
    pub cache_path: Option<PathBuf>,
}

/// The bytecode lifter contract.
///
/// The host package producing the IR is pluggable; a lifter only has to
/// produce the class table described by `cortado_ir`.
pub trait Lifter {
    /// Lift the application named by `options` into a class table.
    ///
    /// # Errors
    /// if the application cannot be read or lifted.
    fn lift(&self, options: &ProjectOptions) -> Result<ClassTable>;
}

#[derive(Clone, Copy, Debug)]
struct MethodLoc {
    class: ClassId,
    index: usize,
}

#[derive(Clone, Copy, Debug)]
struct BlockLoc {
    method: MethodId,
    index: usize,
}

#[derive(Clone, Copy, Debug)]
struct StmtLoc {
    block: BlockId,
    index: usize,
}

#[derive(Clone, Copy, Debug)]
struct Span {
    start: usize,
    len: usize,
}

/// Global data for one analyzed application.
///
/// A project owns the immutable class table plus the reverse indices over
/// it (block to method, statement to block/class, method key to method),
/// and lazily materializes the derived graphs. Derived graphs are built on
/// first access and shared by reference; slicers constructed from the
/// project read through these caches.
#[derive(Debug)]
pub struct Project {
    classes: ClassTable,
    methods: IndexMap<MethodKey, MethodId>,
    method_locs: Vec<MethodLoc>,
    method_blocks: Vec<Span>,
    block_locs: Vec<BlockLoc>,
    block_stmts: Vec<Span>,
    stmt_locs: Vec<StmtLoc>,
    hierarchy: RwLock<Option<Arc<Hierarchy>>>,
    cfg_full: RwLock<Option<Arc<CfgFull>>>,
    cfg_full_ret_edges: RwLock<Option<Arc<CfgFull>>>,
    cfg_methods: RwLock<Option<Arc<Vec<CfgMethod>>>>,
    callgraph: RwLock<Option<Arc<CallGraph>>>,
}

impl Project {
    /// Create a project by restoring the class table from the cache or by
    /// invoking the lifter.
    ///
    /// # Errors
    /// if the cache cannot be read or decoded, the lifter fails, or a
    /// freshly-lifted table cannot be written to the cache path.
    pub fn new(options: &ProjectOptions, lifter: &dyn Lifter) -> Result<Self> {
        let cached = options.cache_path.as_ref().filter(|path| path.exists());
        let classes = if let Some(path) = cached {
            info!("Restoring class table from {}", path.display());
            let bytes = std::fs::read(path)?;
            postcard::from_bytes(&bytes)?
        } else {
            info!("Lifting {}", options.app_path.display());
            let classes = lifter.lift(options)?;
            if let Some(path) = &options.cache_path {
                info!("Caching class table to {}", path.display());
                let bytes = postcard::to_allocvec(&classes)?;
                std::fs::write(path, bytes)?;
            }
            classes
        };
        Ok(Self::from_classes(classes))
    }

    /// Create a project around an already-lifted class table.
    #[must_use]
    pub fn from_classes(classes: ClassTable) -> Self {
        let mut methods = IndexMap::new();
        let mut method_locs = Vec::new();
        let mut method_blocks = Vec::new();
        let mut block_locs = Vec::new();
        let mut block_stmts = Vec::new();
        let mut stmt_locs = Vec::new();

        for (class_index, (_, class)) in classes.iter().enumerate() {
            let class_id = ClassId(class_index);
            for (method_index, method) in class.methods.iter().enumerate() {
                let method_id = MethodId(method_locs.len());
                methods.insert(method.key(), method_id);
                method_locs.push(MethodLoc {
                    class: class_id,
                    index: method_index,
                });
                let block_start = block_locs.len();
                for (block_index, block) in method.blocks.iter().enumerate() {
                    let block_id = BlockId(block_locs.len());
                    block_locs.push(BlockLoc {
                        method: method_id,
                        index: block_index,
                    });
                    block_stmts.push(Span {
                        start: stmt_locs.len(),
                        len: block.statements.len(),
                    });
                    for stmt_index in 0..block.statements.len() {
                        stmt_locs.push(StmtLoc {
                            block: block_id,
                            index: stmt_index,
                        });
                    }
                }
                method_blocks.push(Span {
                    start: block_start,
                    len: method.blocks.len(),
                });
            }
        }

        Self {
            classes,
            methods,
            method_locs,
            method_blocks,
            block_locs,
            block_stmts,
            stmt_locs,
            hierarchy: RwLock::new(None),
            cfg_full: RwLock::new(None),
            cfg_full_ret_edges: RwLock::new(None),
            cfg_methods: RwLock::new(None),
            callgraph: RwLock::new(None),
        }
    }

    /// The class table.
    #[must_use]
    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// Method identity to method id, for every method in the project.
    #[must_use]
    pub fn methods(&self) -> &IndexMap<MethodKey, MethodId> {
        &self.methods
    }

    /// Look up a class by id.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    /// Look up a class id by fully-qualified name.
    #[must_use]
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.classes.get_index_of(name).map(ClassId)
    }

    /// Look up a method by id.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &Method {
        let loc = self.method_locs[id.0];
        &self.class(loc.class).methods[loc.index]
    }

    /// Look up a method id by `(class, name, params)` identity.
    #[must_use]
    pub fn method_id(&self, key: &MethodKey) -> Option<MethodId> {
        self.methods.get(key).copied()
    }

    /// The class declaring the given method.
    #[must_use]
    pub fn method_class(&self, id: MethodId) -> ClassId {
        self.method_locs[id.0].class
    }

    /// Look up a block by id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        let loc = self.block_locs[id.0];
        &self.method(loc.method).blocks[loc.index]
    }

    /// The method owning the given block.
    #[must_use]
    pub fn block_method(&self, id: BlockId) -> MethodId {
        self.block_locs[id.0].method
    }

    /// The position of the given block within its method.
    #[must_use]
    pub fn block_index(&self, id: BlockId) -> usize {
        self.block_locs[id.0].index
    }

    /// The id of the `index`-th block of `method`.
    #[must_use]
    pub fn block_id_at(&self, method: MethodId, index: usize) -> BlockId {
        BlockId(self.method_blocks[method.0].start + index)
    }

    /// The block ids of `method`, in source order.
    pub fn method_block_ids(&self, method: MethodId) -> impl Iterator<Item = BlockId> {
        let span = self.method_blocks[method.0];
        (span.start..span.start + span.len).map(BlockId)
    }

    /// The entry block of `method`, if the method has a body.
    #[must_use]
    pub fn entry_block_id(&self, method: MethodId) -> Option<BlockId> {
        let span = self.method_blocks[method.0];
        (span.len > 0).then_some(BlockId(span.start))
    }

    /// Look up a statement by id.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Statement {
        let loc = self.stmt_locs[id.0];
        &self.block(loc.block).statements[loc.index]
    }

    /// The block owning the given statement.
    #[must_use]
    pub fn stmt_block(&self, id: StmtId) -> BlockId {
        self.stmt_locs[id.0].block
    }

    /// The class owning the given statement.
    #[must_use]
    pub fn stmt_class(&self, id: StmtId) -> ClassId {
        self.method_class(self.block_method(self.stmt_block(id)))
    }

    /// The id of the `index`-th statement of `block`.
    #[must_use]
    pub fn stmt_id_at(&self, block: BlockId, index: usize) -> StmtId {
        StmtId(self.block_stmts[block.0].start + index)
    }

    /// All class ids, in class-table order.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> {
        (0..self.classes.len()).map(ClassId)
    }

    /// All method ids, in setup order.
    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> {
        (0..self.method_locs.len()).map(MethodId)
    }

    /// All block ids, in setup order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.block_locs.len()).map(BlockId)
    }

    /// Every statement of the project, in setup order.
    pub fn walk_statements(&self) -> impl Iterator<Item = (StmtId, &Statement)> {
        (0..self.stmt_locs.len())
            .map(StmtId)
            .map(|id| (id, self.stmt(id)))
    }

    /// The interprocedural CFG with call edges.
    #[must_use]
    pub fn cfgfull(&self) -> Arc<CfgFull> {
        if let Some(cfg) = self.cfg_full.read().as_ref() {
            return Arc::clone(cfg);
        }
        info!("Instantiating full CFG");
        let cfg = Arc::new(CfgFull::new(self, false));
        *self.cfg_full.write() = Some(Arc::clone(&cfg));
        cfg
    }

    /// The interprocedural CFG with call and return edges.
    #[must_use]
    pub fn cfgfull_retedges(&self) -> Arc<CfgFull> {
        if let Some(cfg) = self.cfg_full_ret_edges.read().as_ref() {
            return Arc::clone(cfg);
        }
        info!("Instantiating full CFG (with return edges)");
        let cfg = Arc::new(CfgFull::new(self, true));
        *self.cfg_full_ret_edges.write() = Some(Arc::clone(&cfg));
        cfg
    }

    /// One intra-method CFG per method of the project.
    #[must_use]
    pub fn cfgmethods(&self) -> Arc<Vec<CfgMethod>> {
        if let Some(cfgs) = self.cfg_methods.read().as_ref() {
            return Arc::clone(cfgs);
        }
        info!("Instantiating method CFGs");
        let cfgs = Arc::new(
            self.method_ids()
                .map(|method| CfgMethod::new(self, method))
                .collect::<Vec<_>>(),
        );
        *self.cfg_methods.write() = Some(Arc::clone(&cfgs));
        cfgs
    }

    /// The class hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> Arc<Hierarchy> {
        if let Some(hierarchy) = self.hierarchy.read().as_ref() {
            return Arc::clone(hierarchy);
        }
        info!("Instantiating hierarchy");
        let hierarchy = Arc::new(Hierarchy::new(self));
        *self.hierarchy.write() = Some(Arc::clone(&hierarchy));
        hierarchy
    }

    /// The method-level call graph.
    #[must_use]
    pub fn callgraph(&self) -> Arc<CallGraph> {
        if let Some(callgraph) = self.callgraph.read().as_ref() {
            return Arc::clone(callgraph);
        }
        info!("Instantiating call graph");
        let callgraph = Arc::new(CallGraph::new(self));
        *self.callgraph.write() = Some(Arc::clone(&callgraph));
        callgraph
    }

    /// Discard the cached full CFG and rebuild it.
    #[must_use]
    pub fn rebuild_cfgfull(&self) -> Arc<CfgFull> {
        *self.cfg_full.write() = None;
        self.cfgfull()
    }

    /// Discard the cached full CFG with return edges and rebuild it.
    #[must_use]
    pub fn rebuild_cfgfull_retedges(&self) -> Arc<CfgFull> {
        *self.cfg_full_ret_edges.write() = None;
        self.cfgfull_retedges()
    }

    /// Discard the cached method CFGs and rebuild them.
    #[must_use]
    pub fn rebuild_cfgmethods(&self) -> Arc<Vec<CfgMethod>> {
        *self.cfg_methods.write() = None;
        self.cfgmethods()
    }

    /// Discard the cached hierarchy and rebuild it.
    #[must_use]
    pub fn rebuild_hierarchy(&self) -> Arc<Hierarchy> {
        *self.hierarchy.write() = None;
        self.hierarchy()
    }

    /// Discard the cached call graph and rebuild it.
    #[must_use]
    pub fn rebuild_callgraph(&self) -> Arc<CallGraph> {
        *self.callgraph.write() = None;
        self.callgraph()
    }

    /// Drop every cached graph; the next accessor call rebuilds from the IR.
    pub fn release_graphs(&self) {
        *self.hierarchy.write() = None;
        *self.cfg_full.write() = None;
        *self.cfg_full_ret_edges.write() = None;
        *self.cfg_methods.write() = None;
        *self.callgraph.write() = None;
    }

    /// Construct a backward slicer bound to this project.
    #[must_use]
    pub fn backwardslicer(&self) -> BackwardSlicer<'_> {
        BackwardSlicer::new(self)
    }

    /// Construct a forward slicer bound to this project.
    #[must_use]
    pub fn forwardslicer(&self) -> ForwardSlicer<'_> {
        ForwardSlicer::new(self)
    }

    /// Find cross-references to a named entity; see [`XRefQuery`].
    #[must_use]
    pub fn x_ref(&self, query: &XRefQuery) -> Vec<XRef> {
        x_ref(self, query)
    }
}
