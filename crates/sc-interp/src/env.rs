//! Lexical environment: an arena of scopes linked by parent index, plus the
//! process-wide address table that backs `&`/`*`. Scopes are never removed
//! from the arena once pushed — `exit_scope` just walks `current` back up
//! to the parent, mirroring a scope-chain rib tree rather than a stack.

use rustc_hash::FxHashMap;
use sc_par::ast::Ty;
use sc_util::{define_idx, IndexVec, Symbol};

define_idx!(ScopeId);

#[derive(Debug, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    scalars: FxHashMap<Symbol, u32>,
    arrays: FxHashMap<Symbol, Vec<u32>>,
    types: FxHashMap<Symbol, Ty>,
    addresses: FxHashMap<Symbol, u32>,
    array_base: FxHashMap<Symbol, u32>,
    registers: FxHashMap<Symbol, u8>,
}

/// What a memory address resolves to: a scalar cell or one element of an
/// array, both owned by some scope in the arena.
#[derive(Debug, Clone)]
enum AddrTarget {
    Scalar { scope: ScopeId, name: Symbol },
    ArrayElem { scope: ScopeId, name: Symbol, index: u32 },
}

pub struct Environment {
    scopes: IndexVec<ScopeId, Scope>,
    current: ScopeId,
    global: ScopeId,
    addr_table: FxHashMap<u32, AddrTarget>,
    next_addr: u32,
}

impl Environment {
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let global = scopes.push(Scope::default());
        Environment {
            scopes,
            current: global,
            global,
            addr_table: FxHashMap::default(),
            next_addr: 1,
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// Pushes a new scope parented to `parent` and makes it current.
    pub fn enter_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.current = id;
        id
    }

    /// Returns to the parent of the current scope. A no-op at the global
    /// scope (callers are expected not to call this past the root).
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    pub fn set_current(&mut self, scope: ScopeId) {
        self.current = scope;
    }

    pub fn declare_scalar(&mut self, name: Symbol, ty: Ty, value: u32, register_num: Option<u8>) {
        let scope = &mut self.scopes[self.current];
        scope.types.insert(name.clone(), ty);
        scope.scalars.insert(name.clone(), value);
        if let Some(r) = register_num {
            scope.registers.insert(name, r);
        }
    }

    pub fn declare_array(&mut self, name: Symbol, values: Vec<u32>) {
        let scope = &mut self.scopes[self.current];
        scope.arrays.insert(name, values);
    }

    fn find_scalar_owner(&self, name: &Symbol) -> Option<ScopeId> {
        let mut id = self.current;
        loop {
            if self.scopes[id].scalars.contains_key(name) {
                return Some(id);
            }
            match self.scopes[id].parent {
                Some(parent) => id = parent,
                None => return None,
            }
        }
    }

    fn find_array_owner(&self, name: &Symbol) -> Option<ScopeId> {
        let mut id = self.current;
        loop {
            if self.scopes[id].arrays.contains_key(name) {
                return Some(id);
            }
            match self.scopes[id].parent {
                Some(parent) => id = parent,
                None => return None,
            }
        }
    }

    pub fn lookup_scalar(&self, name: &Symbol) -> Option<(u32, Ty)> {
        let owner = self.find_scalar_owner(name)?;
        let scope = &self.scopes[owner];
        Some((scope.scalars[name], scope.types[name]))
    }

    pub fn lookup_register_num(&self, name: &Symbol) -> Option<u8> {
        let owner = self.find_scalar_owner(name)?;
        self.scopes[owner].registers.get(name).copied()
    }

    pub fn assign_scalar(&mut self, name: &Symbol, bits: u32) -> Option<Ty> {
        let owner = self.find_scalar_owner(name)?;
        let scope = &mut self.scopes[owner];
        scope.scalars.insert(name.clone(), bits);
        Some(scope.types[name])
    }

    pub fn array_len(&self, name: &Symbol) -> Option<u32> {
        let owner = self.find_array_owner(name)?;
        Some(self.scopes[owner].arrays[name].len() as u32)
    }

    pub fn array_get(&self, name: &Symbol, index: u32) -> Option<u32> {
        let owner = self.find_array_owner(name)?;
        self.scopes[owner].arrays[name].get(index as usize).copied()
    }

    pub fn array_set(&mut self, name: &Symbol, index: u32, value: u32) -> bool {
        match self.find_array_owner(name) {
            Some(owner) => {
                if let Some(slot) = self.scopes[owner]
                    .arrays
                    .get_mut(name)
                    .and_then(|v| v.get_mut(index as usize))
                {
                    *slot = value;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Lazily allocates (on first address-of) and returns the address of a
    /// scalar variable.
    pub fn address_of_scalar(&mut self, name: &Symbol) -> Option<u32> {
        let owner = self.find_scalar_owner(name)?;
        if let Some(&addr) = self.scopes[owner].addresses.get(name) {
            return Some(addr);
        }
        let addr = self.next_addr;
        self.next_addr += 1;
        self.scopes[owner].addresses.insert(name.clone(), addr);
        self.addr_table.insert(
            addr,
            AddrTarget::Scalar {
                scope: owner,
                name: name.clone(),
            },
        );
        Some(addr)
    }

    /// Lazily allocates the base address of an entire array (one cell per
    /// element) and returns the address of `index` within it.
    pub fn address_of_array_elem(&mut self, name: &Symbol, index: u32) -> Option<u32> {
        let owner = self.find_array_owner(name)?;
        let len = self.scopes[owner].arrays[name].len() as u32;
        let base = if let Some(&base) = self.scopes[owner].array_base.get(name) {
            base
        } else {
            let base = self.next_addr;
            self.next_addr += len;
            self.scopes[owner].array_base.insert(name.clone(), base);
            for i in 0..len {
                self.addr_table.insert(
                    base + i,
                    AddrTarget::ArrayElem {
                        scope: owner,
                        name: name.clone(),
                        index: i,
                    },
                );
            }
            base
        };
        Some(base + index)
    }

    pub fn deref_read(&self, address: u32) -> Option<u32> {
        match self.addr_table.get(&address)? {
            AddrTarget::Scalar { scope, name } => self.scopes[*scope].scalars.get(name).copied(),
            AddrTarget::ArrayElem { scope, name, index } => {
                self.scopes[*scope].arrays.get(name)?.get(*index as usize).copied()
            }
        }
    }

    pub fn deref_write(&mut self, address: u32, value: u32) -> bool {
        match self.addr_table.get(&address).cloned() {
            Some(AddrTarget::Scalar { scope, name }) => {
                self.scopes[scope].scalars.insert(name, value);
                true
            }
            Some(AddrTarget::ArrayElem { scope, name, index }) => {
                if let Some(slot) = self.scopes[scope]
                    .arrays
                    .get_mut(&name)
                    .and_then(|v| v.get_mut(index as usize))
                {
                    *slot = value;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
