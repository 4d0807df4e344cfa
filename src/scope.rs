use crate::ast::FunctionDef;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

pub type ScopeId = usize;

/// The root scope always sits at index 0 and lives as long as the interpreter.
pub const GLOBAL: ScopeId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    Redeclared,
    Undefined,
    OutOfBounds { index: i64, len: usize },
}

/// One name-keyed environment: scalars, fixed-length arrays and functions.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, Value>,
    arrays: HashMap<String, Vec<Value>>,
    functions: HashMap<String, Rc<FunctionDef>>,
    parent: Option<ScopeId>,
}

impl Scope {
    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn has_array(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

/// Arena of live scopes. Function calls push a frame whose parent is the root,
/// never the caller, and pop it when the call returns.
#[derive(Debug, Clone)]
pub struct Scopes {
    frames: Vec<Scope>,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    pub fn new() -> Self {
        Self::from_global(Scope::default())
    }

    pub fn from_global(global: Scope) -> Self {
        Self {
            frames: vec![global],
        }
    }

    pub fn global(&self) -> &Scope {
        &self.frames[GLOBAL]
    }

    pub fn into_global(mut self) -> Scope {
        self.frames.swap_remove(GLOBAL)
    }

    pub fn replace_global(&mut self, global: Scope) {
        self.frames[GLOBAL] = global;
    }

    /// The innermost live scope.
    pub fn current(&self) -> ScopeId {
        self.frames.len() - 1
    }

    pub fn push_call(&mut self) -> ScopeId {
        self.frames.push(Scope {
            parent: Some(GLOBAL),
            ..Scope::default()
        });
        self.current()
    }

    pub fn pop_call(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// First scope on the chain starting at `from` that satisfies `has`.
    fn owner(&self, from: ScopeId, has: impl Fn(&Scope) -> bool) -> Option<ScopeId> {
        let mut id = Some(from);
        while let Some(current) = id {
            let scope = &self.frames[current];
            if has(scope) {
                return Some(current);
            }
            id = scope.parent;
        }
        None
    }

    pub fn declare_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
    ) -> Result<(), ScopeError> {
        let frame = &mut self.frames[scope];
        if frame.variables.contains_key(name) {
            return Err(ScopeError::Redeclared);
        }
        frame.variables.insert(name.to_string(), value);
        Ok(())
    }

    pub fn variable(&self, scope: ScopeId, name: &str) -> Option<&Value> {
        self.owner(scope, |s| s.has_variable(name))
            .and_then(|id| self.frames[id].variables.get(name))
    }

    pub fn assign_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
    ) -> Result<(), ScopeError> {
        let id = self
            .owner(scope, |s| s.has_variable(name))
            .ok_or(ScopeError::Undefined)?;
        self.frames[id].variables.insert(name.to_string(), value);
        Ok(())
    }

    pub fn declare_array(
        &mut self,
        scope: ScopeId,
        name: &str,
        len: usize,
    ) -> Result<(), ScopeError> {
        let frame = &mut self.frames[scope];
        if frame.arrays.contains_key(name) {
            return Err(ScopeError::Redeclared);
        }
        frame.arrays.insert(name.to_string(), vec![Value::zero(); len]);
        Ok(())
    }

    pub fn array_len(&self, scope: ScopeId, name: &str) -> Option<usize> {
        self.owner(scope, |s| s.has_array(name))
            .and_then(|id| self.frames[id].arrays.get(name))
            .map(Vec::len)
    }

    pub fn array_get(&self, scope: ScopeId, name: &str, index: i64) -> Result<Value, ScopeError> {
        let cells = self
            .owner(scope, |s| s.has_array(name))
            .and_then(|id| self.frames[id].arrays.get(name))
            .ok_or(ScopeError::Undefined)?;
        let slot = checked_index(index, cells.len())?;
        Ok(cells[slot].clone())
    }

    pub fn array_set(
        &mut self,
        scope: ScopeId,
        name: &str,
        index: i64,
        value: Value,
    ) -> Result<(), ScopeError> {
        let id = self
            .owner(scope, |s| s.has_array(name))
            .ok_or(ScopeError::Undefined)?;
        let cells = self.frames[id]
            .arrays
            .get_mut(name)
            .ok_or(ScopeError::Undefined)?;
        let slot = checked_index(index, cells.len())?;
        cells[slot] = value;
        Ok(())
    }

    /// Registers a function; an existing definition of the same name is
    /// replaced.
    pub fn define_function(&mut self, scope: ScopeId, def: FunctionDef) {
        self.frames[scope]
            .functions
            .insert(def.name.clone(), Rc::new(def));
    }

    pub fn function(&self, scope: ScopeId, name: &str) -> Option<Rc<FunctionDef>> {
        self.owner(scope, |s| s.has_function(name))
            .and_then(|id| self.frames[id].functions.get(name))
            .cloned()
    }
}

fn checked_index(index: i64, len: usize) -> Result<usize, ScopeError> {
    if index < 0 || index as usize >= len {
        Err(ScopeError::OutOfBounds { index, len })
    } else {
        Ok(index as usize)
    }
}
