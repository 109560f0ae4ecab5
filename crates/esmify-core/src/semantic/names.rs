//! Fresh identifier generation.

use std::collections::HashSet;

use swc_atoms::Atom;
use swc_ecma_ast::{Ident, Module};
use swc_ecma_visit::{Visit, VisitWith};

/// Hands out identifiers that clash with nothing written in the module.
///
/// Every identifier occurrence counts as taken, whether it declares, reads or
/// labels, so a fresh name can never capture or shadow an existing one.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<Atom>,
}

impl UniqueNames {
    pub fn from_module(module: &Module) -> Self {
        let mut collector = NameCollector::default();
        module.visit_with(&mut collector);
        Self {
            taken: collector.names,
        }
    }

    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(Atom::from(name));
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&Atom::from(name))
    }

    /// Returns `_hint`, then `_hint2`, `_hint3`... whichever is free first,
    /// and marks it as taken.
    pub fn fresh(&mut self, hint: &str) -> Atom {
        let base = hint.trim_start_matches('_');
        let mut counter = 1usize;
        loop {
            let candidate = if counter > 1 {
                format!("_{base}{counter}")
            } else {
                format!("_{base}")
            };
            let atom = Atom::from(candidate);
            if self.taken.insert(atom.clone()) {
                return atom;
            }
            counter += 1;
        }
    }
}

#[derive(Default)]
struct NameCollector {
    names: HashSet<Atom>,
}

impl Visit for NameCollector {
    fn visit_ident(&mut self, ident: &Ident) {
        self.names.insert(ident.sym.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn names_for(code: &str) -> UniqueNames {
        let parsed = Parser::new().parse_module("test.js", code).unwrap();
        UniqueNames::from_module(&parsed.module)
    }

    #[test]
    fn first_fresh_name_has_no_suffix() {
        let mut names = names_for("const a = 1;");

        assert_eq!(names.fresh("require"), "_require");
        assert_eq!(names.fresh("require"), "_require2");
        assert_eq!(names.fresh("require"), "_require3");
    }

    #[test]
    fn skips_names_used_in_module() {
        let mut names = names_for("var _require = 1; function f() { return _require2; }");

        assert_eq!(names.fresh("require"), "_require3");
    }

    #[test]
    fn reserved_names_are_skipped() {
        let mut names = names_for("");
        names.reserve("_require");

        assert!(names.is_taken("_require"));
        assert_eq!(names.fresh("require"), "_require2");
    }

    #[test]
    fn leading_underscores_in_hint_are_collapsed() {
        let mut names = names_for("");

        assert_eq!(names.fresh("__foo"), "_foo");
    }
}
