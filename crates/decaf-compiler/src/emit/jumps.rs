//! Loop exit labels for `break`.
//!
//! Each loop statement records the label just past its end while its body
//! is generated. `break` finds its loop by walking parent links and jumps to
//! that loop's recorded label.

use decaf_core::StmtId;
use rustc_hash::FxHashMap;

/// Exit labels of the loops currently being generated.
#[derive(Debug, Default)]
pub struct LoopLabels {
    exits: FxHashMap<StmtId, String>,
}

impl LoopLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `exit` as the label following `stmt`.
    pub fn enter_loop(&mut self, stmt: StmtId, exit: String) {
        self.exits.insert(stmt, exit);
    }

    /// Forget `stmt`'s exit label once its body is generated.
    pub fn exit_loop(&mut self, stmt: StmtId) -> Option<String> {
        self.exits.remove(&stmt)
    }

    /// Exit label of `stmt`, if it is a loop being generated.
    pub fn break_target(&self, stmt: StmtId) -> Option<&str> {
        self.exits.get(&stmt).map(String::as_str)
    }

    /// Number of loops currently open.
    pub fn loop_depth(&self) -> usize {
        self.exits.len()
    }
}
