// Global symbol table: constants, fixed-arity functions, variadic functions
// and native stack words, each with optional documentation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::calculator::Frame;
use crate::dispatch::{BinaryDispatch, UnaryDispatch};
use crate::domain::TypeDomain;
use crate::error::{RuntimeError, SetupError};
use crate::value::{DomainId, TypedValue};

pub type FunctionBody =
    Arc<dyn Fn(&TypeDomain, &[TypedValue]) -> Result<Vec<TypedValue>, RuntimeError> + Send + Sync>;
pub type VariadicBody =
    Arc<dyn Fn(&TypeDomain, &[TypedValue]) -> Result<TypedValue, RuntimeError> + Send + Sync>;
pub type NativeBody =
    Arc<dyn Fn(&mut Frame, Option<usize>, Option<usize>) -> Result<(), RuntimeError> + Send + Sync>;

pub enum SymbolDef {
    /// Pushes a fixed value. Takes no arguments.
    Constant(TypedValue),
    /// Consumes exactly `args` values, produces exactly `rets`.
    Function {
        args: usize,
        rets: usize,
        body: FunctionBody,
    },
    /// Consumes the call-site argument count (or `default_args`), produces one value.
    Variadic { default_args: usize, body: VariadicBody },
    /// Operates on the stack directly and validates counts itself.
    Native(NativeBody),
}

impl SymbolDef {
    pub fn constant(value: TypedValue) -> Self {
        SymbolDef::Constant(value)
    }

    pub fn function<F>(args: usize, rets: usize, body: F) -> Self
    where
        F: Fn(&TypeDomain, &[TypedValue]) -> Result<Vec<TypedValue>, RuntimeError> + Send + Sync + 'static,
    {
        SymbolDef::Function {
            args,
            rets,
            body: Arc::new(body),
        }
    }

    /// One argument, one result, chosen by the argument's type.
    pub fn unary(dispatch: UnaryDispatch) -> Self {
        Self::function(1, 1, move |_, args| Ok(vec![dispatch.apply(&args[0])?]))
    }

    /// Two arguments, one result, chosen by the argument types.
    pub fn binary(dispatch: BinaryDispatch) -> Self {
        Self::function(2, 1, move |_, args| Ok(vec![dispatch.apply(&args[0], &args[1])?]))
    }

    pub fn variadic<F>(default_args: usize, body: F) -> Self
    where
        F: Fn(&TypeDomain, &[TypedValue]) -> Result<TypedValue, RuntimeError> + Send + Sync + 'static,
    {
        SymbolDef::Variadic {
            default_args,
            body: Arc::new(body),
        }
    }

    pub fn native<F>(body: F) -> Self
    where
        F: Fn(&mut Frame, Option<usize>, Option<usize>) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        SymbolDef::Native(Arc::new(body))
    }

    /// Argument count fixed by the definition, if any.
    pub fn fixed_args(&self) -> Option<usize> {
        match self {
            SymbolDef::Constant(_) => Some(0),
            SymbolDef::Function { args, .. } => Some(*args),
            SymbolDef::Variadic { .. } | SymbolDef::Native(_) => None,
        }
    }

    pub fn fixed_rets(&self) -> Option<usize> {
        match self {
            SymbolDef::Constant(_) | SymbolDef::Variadic { .. } => Some(1),
            SymbolDef::Function { rets, .. } => Some(*rets),
            SymbolDef::Native(_) => None,
        }
    }

    /// Runs the definition against the frame.
    ///
    /// The stack is only modified once the body has succeeded, so a failed
    /// call leaves every operand in place.
    pub fn execute(
        &self,
        name: &str,
        frame: &mut Frame,
        args: Option<usize>,
        rets: Option<usize>,
    ) -> Result<(), RuntimeError> {
        match self {
            SymbolDef::Constant(value) => {
                expect_count(name, "arguments", args, 0)?;
                expect_count(name, "results", rets, 1)?;
                frame.push(value.clone());
                Ok(())
            }
            SymbolDef::Function {
                args: arity,
                rets: results,
                body,
            } => {
                expect_count(name, "arguments", args, *arity)?;
                expect_count(name, "results", rets, *results)?;
                let operands = frame.top(*arity, name)?;
                let produced = body(frame.domain(), operands).map_err(|source| wrap(name, source))?;
                if produced.len() != *results {
                    return Err(RuntimeError::StackValidation(format!(
                        "'{}' produced {} value(s), declared {}",
                        name,
                        produced.len(),
                        results
                    )));
                }
                frame.replace_top(*arity, produced);
                Ok(())
            }
            SymbolDef::Variadic { default_args, body } => {
                expect_count(name, "results", rets, 1)?;
                let count = args.unwrap_or(*default_args);
                let operands = frame.top(count, name)?;
                let produced = body(frame.domain(), operands).map_err(|source| wrap(name, source))?;
                frame.replace_top(count, [produced]);
                Ok(())
            }
            SymbolDef::Native(body) => body(frame, args, rets).map_err(|source| wrap(name, source)),
        }
    }
}

fn expect_count(name: &str, what: &str, requested: Option<usize>, actual: usize) -> Result<(), RuntimeError> {
    match requested {
        Some(requested) if requested != actual => Err(RuntimeError::StackValidation(format!(
            "'{}' has {} {}, call site expects {}",
            name, actual, what, requested
        ))),
        _ => Ok(()),
    }
}

fn wrap(name: &str, source: RuntimeError) -> RuntimeError {
    RuntimeError::Symbol {
        name: name.to_string(),
        source: Box::new(source),
    }
}

impl fmt::Debug for SymbolDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolDef::Constant(value) => write!(f, "Constant({:?})", value),
            SymbolDef::Function { args, rets, .. } => write!(f, "Function({}, {})", args, rets),
            SymbolDef::Variadic { default_args, .. } => write!(f, "Variadic({})", default_args),
            SymbolDef::Native(_) => write!(f, "Native"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub definition: Arc<SymbolDef>,
    pub doc: Option<Arc<str>>, // Optional documentation string for help
}

pub struct EnvironmentBuilder {
    domain: Arc<TypeDomain>,
    entries: BTreeMap<Arc<str>, Entry>,
}

impl EnvironmentBuilder {
    pub fn new(domain: &Arc<TypeDomain>) -> Self {
        Self {
            domain: Arc::clone(domain),
            entries: BTreeMap::new(),
        }
    }

    pub fn domain(&self) -> &Arc<TypeDomain> {
        &self.domain
    }

    /// Later definitions replace earlier ones.
    pub fn define(&mut self, name: &str, definition: SymbolDef, doc: Option<&str>) -> Result<&mut Self, SetupError> {
        if let SymbolDef::Constant(value) = &definition {
            self.domain.check(value).map_err(|_| SetupError::DomainMismatch)?;
        }
        self.entries.insert(
            Arc::from(name),
            Entry {
                definition: Arc::new(definition),
                doc: doc.map(Arc::from),
            },
        );
        Ok(self)
    }

    pub fn build(self) -> Environment {
        Environment {
            domain: self.domain.id(),
            entries: self.entries,
        }
    }
}

#[derive(Debug)]
pub struct Environment {
    domain: DomainId,
    entries: BTreeMap<Arc<str>, Entry>,
}

impl Environment {
    pub fn builder(domain: &Arc<TypeDomain>) -> EnvironmentBuilder {
        EnvironmentBuilder::new(domain)
    }

    pub fn domain_id(&self) -> DomainId {
        self.domain
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn doc(&self, name: &str) -> Option<&str> {
        self.get(name)?.doc.as_deref()
    }

    /// Defined names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| name.as_ref())
    }
}
