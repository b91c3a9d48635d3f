// The immutable half of a calculator: type domain, operators, global symbols
// and the tokenizer configured from them. Shared by any number of calculators.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::domain::TypeDomain;
use crate::environment::Environment;
use crate::error::{CompileError, SetupError};
use crate::executable::Executable;
use crate::operators::OperatorDictionary;
use crate::parser::{self, CompileContext, Notation, TokenStream};
use crate::tokenizer::Tokenizer;
use crate::value::Symbol;

pub const QUOTE_MODIFIER: &str = "'";

// RUST CONCEPT: Interning with shared ownership
// Symbols compare by text, so interning only saves memory; the Mutex keeps the
// engine Sync.
#[derive(Debug, Default)]
pub struct SymbolInterner {
    symbols: Mutex<HashSet<Arc<str>>>,
}

impl SymbolInterner {
    pub fn intern(&self, text: &str) -> Symbol {
        let mut symbols = match self.symbols.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(existing) = symbols.get(text) {
            return Symbol::new(Arc::clone(existing));
        }
        let shared: Arc<str> = Arc::from(text);
        symbols.insert(Arc::clone(&shared));
        Symbol::new(shared)
    }
}

#[derive(Debug)]
pub struct Engine {
    domain: Arc<TypeDomain>,
    operators: Arc<OperatorDictionary>,
    environment: Arc<Environment>,
    tokenizer: Tokenizer,
    symbols: SymbolInterner,
}

impl Engine {
    pub fn new(
        domain: Arc<TypeDomain>,
        operators: Arc<OperatorDictionary>,
        environment: Arc<Environment>,
    ) -> Result<Self, SetupError> {
        if operators.domain().id() != domain.id() || environment.domain_id() != domain.id() {
            return Err(SetupError::DomainMismatch);
        }

        let mut tokenizer = Tokenizer::new();
        for op in operators.ids() {
            tokenizer.add_operator(op);
        }
        tokenizer.add_modifier(QUOTE_MODIFIER);

        Ok(Self {
            domain,
            operators,
            environment,
            tokenizer,
            symbols: SymbolInterner::default(),
        })
    }

    pub fn domain(&self) -> &Arc<TypeDomain> {
        &self.domain
    }

    pub fn operators(&self) -> &Arc<OperatorDictionary> {
        &self.operators
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn intern(&self, text: &str) -> Symbol {
        self.symbols.intern(text)
    }

    pub fn compile(&self, source: &str, notation: Notation) -> Result<Executable, CompileError> {
        let context = CompileContext {
            domain: &self.domain,
            operators: &self.operators,
            environment: &self.environment,
            symbols: &self.symbols,
        };
        let mut stream = TokenStream::new(self.tokenizer.tokenize(source));
        let steps = parser::compile(&context, &mut stream, notation)?;
        let executable = Executable::new(steps);
        debug!("compiled {:?} as {}: {}", source, notation, executable);
        Ok(executable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_shares_storage() {
        let interner = SymbolInterner::default();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        assert_eq!(a, b);
        assert!(a.shares_storage(&b));
    }

    #[test]
    fn test_mismatched_components_rejected() {
        let mut first = TypeDomain::builder();
        first.register_type(crate::value::TypeTag::Int, "int");
        let first = Arc::new(first.build().unwrap());
        let mut second = TypeDomain::builder();
        second.register_type(crate::value::TypeTag::Int, "int");
        let second = Arc::new(second.build().unwrap());

        let operators = Arc::new(OperatorDictionary::builder(&first).build().unwrap());
        let environment = Arc::new(Environment::builder(&second).build());
        assert!(matches!(
            Engine::new(first, operators, environment),
            Err(SetupError::DomainMismatch)
        ));
    }
}
