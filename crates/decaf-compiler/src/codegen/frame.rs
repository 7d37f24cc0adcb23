//! Name bindings for the function being generated.
//!
//! This module provides `FrameScope` for tracking formals and locals while
//! a function body is lowered. It handles:
//! - Binding formals at function depth and locals at block depth
//! - Nested block scopes with shadowing restored on exit
//! - Retagging a binding after an object assignment

use rustc_hash::FxHashMap;

use super::Value;
use crate::type_tag::TypeTag;

/// A name bound in the current frame.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    /// Block depth where declared (0 = formals)
    depth: u32,
}

/// Local bindings of one function.
#[derive(Debug, Default)]
pub struct FrameScope {
    /// Visible bindings by name
    variables: FxHashMap<String, Binding>,

    /// Current block depth (0 = function scope)
    scope_depth: u32,

    /// Shadowed bindings as (shadowing_depth, name, old_binding), restored
    /// when the shadowing block exits
    shadowed: Vec<(u32, String, Binding)>,
}

impl FrameScope {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Enter a block.
    pub fn push_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Exit the current block, dropping its bindings and restoring whatever
    /// they shadowed.
    pub fn pop_scope(&mut self) {
        self.variables.retain(|_, b| b.depth < self.scope_depth);

        while let Some((depth, _, _)) = self.shadowed.last() {
            if *depth != self.scope_depth {
                break;
            }
            if let Some((_, name, binding)) = self.shadowed.pop() {
                self.variables.insert(name, binding);
            }
        }

        self.scope_depth = self.scope_depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.scope_depth
    }

    // ==========================================================================
    // Bindings
    // ==========================================================================

    /// Bind `name` at the current depth.
    pub fn declare(&mut self, name: &str, value: Value) {
        let binding = Binding {
            value,
            depth: self.scope_depth,
        };
        if let Some(old) = self.variables.insert(name.to_string(), binding) {
            if old.depth < self.scope_depth {
                self.shadowed.push((self.scope_depth, name.to_string(), old));
            }
        }
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).map(|b| &b.value)
    }

    /// Replace the type tag of the innermost binding of `name`.
    pub fn retag(&mut self, name: &str, tag: TypeTag) -> bool {
        match self.variables.get_mut(name) {
            Some(binding) => {
                binding.value.tag = tag;
                true
            }
            None => false,
        }
    }

    /// Drop every binding.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.shadowed.clear();
        self.scope_depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{Location, Segment};

    fn value(name: &str, offset: i32, tag: TypeTag) -> Value {
        Value::new(Location::new(name, Segment::FpRelative, offset), tag)
    }

    #[test]
    fn block_local_shadows_formal() {
        let mut frame = FrameScope::new();
        frame.declare("n", value("n", 4, TypeTag::Int));

        frame.push_scope();
        frame.declare("n", value("n", -8, TypeTag::Bool));
        assert_eq!(frame.lookup("n").map(|v| v.loc.offset), Some(-8));

        frame.pop_scope();
        assert_eq!(frame.lookup("n").map(|v| v.loc.offset), Some(4));
        assert_eq!(frame.depth(), 0);
    }

    #[test]
    fn block_locals_disappear_on_exit() {
        let mut frame = FrameScope::new();
        frame.push_scope();
        frame.declare("t", value("t", -8, TypeTag::Int));
        frame.push_scope();
        assert!(frame.lookup("t").is_some());
        frame.pop_scope();
        frame.pop_scope();
        assert!(frame.lookup("t").is_none());
    }

    #[test]
    fn retag_updates_innermost() {
        let mut frame = FrameScope::new();
        frame.declare("s", value("s", -8, TypeTag::Class("Shape".into())));
        assert!(frame.retag("s", TypeTag::Class("Circle".into())));
        assert_eq!(
            frame.lookup("s").map(|v| v.tag.clone()),
            Some(TypeTag::Class("Circle".into()))
        );
        assert!(!frame.retag("missing", TypeTag::Int));
    }
}
