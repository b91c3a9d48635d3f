//! # Polycalc Core
//!
//! Multi-notation calculator engine over a dynamically typed value domain.
//!
//! Expressions written in infix, prefix or postfix notation compile to the
//! same linear program, which runs against a value stack. Every value carries
//! a type tag from a [`TypeDomain`]; operators and functions pick their
//! implementation from the operand types, widening mixed operands through
//! the domain's coercion rules.
//!
//! ## Features
//!
//! - **Three notations**: switchable mid-expression with `infix(...)`,
//!   `prefix(...)` and `postfix(...)`
//! - **Typed values**: arbitrary precision ints, floats, bools, strings,
//!   complex numbers, symbols, cons lists and records
//! - **Type dispatch**: exact variants, coercion, then a default fallback
//! - **Advanced math**: trigonometry and logarithms behind `advanced_math`
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use polycalc_core::{standard_engine, Calculator, Notation};
//!
//! let engine = Arc::new(standard_engine().unwrap());
//! let mut calc = Calculator::new(engine);
//!
//! let result = calc.evaluate("1 + 2 * 3", Notation::Infix).unwrap();
//! assert_eq!(result.to_string(), "7");
//!
//! let result = calc.evaluate("1 2 3 * +", Notation::Postfix).unwrap();
//! assert_eq!(result.to_string(), "7");
//! ```

// Public modules
pub mod value;
pub mod error;
pub mod domain;
pub mod dispatch;
pub mod operators;
pub mod environment;
pub mod tokenizer;
pub mod value_parser;
pub mod parser;
pub mod executable;
pub mod calculator;
pub mod engine;
pub mod builtins;
pub mod primitives;

// Re-exports for convenience
pub use builtins::{standard_domain, standard_engine, standard_environment, standard_operators};
pub use calculator::{Calculator, Frame, State};
pub use domain::{Coercion, TypeDomain, TypeDomainBuilder};
pub use engine::Engine;
pub use environment::{Environment, EnvironmentBuilder, SymbolDef};
pub use error::{CompileError, Error, RuntimeError, SetupError};
pub use executable::{Executable, Step};
pub use operators::{OperatorDictionary, OperatorDictionaryBuilder};
pub use parser::Notation;
pub use value::{Composite, Cons, Symbol, TypeTag, TypedValue, Unit, Value};
