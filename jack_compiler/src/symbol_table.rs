//! Jack symbol tables: a class-level scope (statics, fields, known class
//! names, method-entries) and a subroutine-level scope (arguments, locals)
//! that delegates unresolved lookups to its enclosing class.
//!
//! Modeled on the assembler's [`crate::symbol_table`]-style separation of a
//! compile-time-known table (there: predefined registers via PHF; here: the
//! OS class names) from a dynamically populated one, but two levels deep to
//! match Jack's class/subroutine scoping per the spec's data model.

use phf::phf_set;
use std::collections::{HashMap, HashSet};

/// Classes the OS ships; referencing `Math.multiply` etc. must resolve as
/// a static/constructor call, not an instance method call, even though no
/// source for these classes is ever compiled alongside the caller.
static OS_CLASSES: phf::Set<&'static str> = phf_set! {
    "Array", "Keyboard", "Math", "Memory", "Output", "Screen", "String", "Sys",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Var,
}

impl Kind {
    /// VM segment a symbol of this kind lives in, per spec §4.5.5.
    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Kind::Static => "static",
            Kind::Field => "this",
            Kind::Argument => "argument",
            Kind::Var => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub type_name: String,
    pub kind: Kind,
    pub index: u16,
}

/// A method declared in the class currently being compiled. Recorded in
/// pass 1 so unqualified calls (`foo(...)` inside a method body) can be
/// recognised as calls on `this`. See the spec's open question on
/// disambiguation order: a field with the same name as a method always
/// wins (`resolve` below checks fields before consulting this table).
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub owner_class: String,
}

pub struct ClassSymbolTable {
    pub name: String,
    symbols: HashMap<String, Symbol>,
    static_count: u16,
    field_count: u16,
    methods: HashMap<String, MethodEntry>,
    /// Class names known in this compilation unit: the OS set plus every
    /// class discovered by the directory-wide prescan in `main`. Anything
    /// else qualified with `.` is treated as an instance variable per
    /// §4.5.3 ("if X is a known class name").
    known_classes: HashSet<String>,
}

impl ClassSymbolTable {
    #[must_use]
    pub fn new(class_name: &str, sibling_classes: &HashSet<String>) -> Self {
        let mut known_classes: HashSet<String> = OS_CLASSES.iter().map(|s| (*s).to_string()).collect();
        known_classes.extend(sibling_classes.iter().cloned());
        known_classes.insert(class_name.to_string());

        Self {
            name: class_name.to_string(),
            symbols: HashMap::new(),
            static_count: 0,
            field_count: 0,
            methods: HashMap::new(),
            known_classes,
        }
    }

    pub fn declare(&mut self, name: &str, type_name: &str, kind: Kind) {
        let index = match kind {
            Kind::Static => {
                let i = self.static_count;
                self.static_count += 1;
                i
            }
            Kind::Field => {
                let i = self.field_count;
                self.field_count += 1;
                i
            }
            Kind::Argument | Kind::Var => {
                unreachable!("class scope only holds static/field symbols")
            }
        };
        self.symbols.insert(
            name.to_string(),
            Symbol { type_name: type_name.to_string(), kind, index },
        );
    }

    /// Records that `name` is a method of this class, so later unqualified
    /// calls resolve to `call ClassName.name argCount+1` instead of being
    /// mistaken for a free function.
    pub fn declare_method(&mut self, name: &str) {
        self.methods.insert(
            name.to_string(),
            MethodEntry { owner_class: self.name.clone() },
        );
    }

    #[must_use]
    pub fn field_count(&self) -> u16 {
        self.field_count
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    #[must_use]
    pub fn is_known_class(&self, name: &str) -> bool {
        self.known_classes.contains(name)
    }

    /// Field/static lookup takes priority over a method-entry of the same
    /// name (the spec's documented resolution order: field > method-entry).
    #[must_use]
    pub fn is_own_method(&self, name: &str) -> bool {
        self.symbols.get(name).is_none() && self.methods.contains_key(name)
    }
}

/// Subroutine-local scope: arguments and locals, with unresolved lookups
/// delegated to the enclosing class scope. Rebuilt fresh for every
/// subroutine and discarded on exit, per the spec's data model.
pub struct SubroutineSymbolTable<'a> {
    class_scope: &'a ClassSymbolTable,
    symbols: HashMap<String, Symbol>,
    argument_count: u16,
    var_count: u16,
}

impl<'a> SubroutineSymbolTable<'a> {
    #[must_use]
    pub fn new(class_scope: &'a ClassSymbolTable) -> Self {
        Self {
            class_scope,
            symbols: HashMap::new(),
            argument_count: 0,
            var_count: 0,
        }
    }

    pub fn declare(&mut self, name: &str, type_name: &str, kind: Kind) {
        let index = match kind {
            Kind::Argument => {
                let i = self.argument_count;
                self.argument_count += 1;
                i
            }
            Kind::Var => {
                let i = self.var_count;
                self.var_count += 1;
                i
            }
            Kind::Static | Kind::Field => {
                unreachable!("subroutine scope only holds argument/var symbols")
            }
        };
        self.symbols.insert(
            name.to_string(),
            Symbol { type_name: type_name.to_string(), kind, index },
        );
    }

    #[must_use]
    pub fn var_count(&self) -> u16 {
        self.var_count
    }

    /// Resolves `name` against the local scope first, then the enclosing
    /// class scope -- the scope-chain shape the spec's DESIGN NOTES
    /// recommend modeling as a borrowed pair rather than a mutable
    /// current-scope pointer.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name).or_else(|| self.class_scope.lookup(name))
    }

    #[must_use]
    pub fn class_scope(&self) -> &ClassSymbolTable {
        self.class_scope
    }
}
