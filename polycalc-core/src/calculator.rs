// RUST CONCEPT: Calculator = shared engine + private stack
// The engine (domain, operators, environment) is immutable and shared through
// Arc; each calculator owns its operand stack and a fault flag.

use std::sync::Arc;

use log::{debug, trace};

use crate::domain::TypeDomain;
use crate::engine::Engine;
use crate::error::{CompileError, Error, RuntimeError};
use crate::executable::Executable;
use crate::parser::Notation;
use crate::value::TypedValue;

/// The operand stack a program runs against.
#[derive(Debug)]
pub struct Frame {
    stack: Vec<TypedValue>,
    domain: Arc<TypeDomain>,
}

impl Frame {
    pub fn new(domain: Arc<TypeDomain>) -> Self {
        Self {
            stack: Vec::new(),
            domain,
        }
    }

    pub fn domain(&self) -> &Arc<TypeDomain> {
        &self.domain
    }

    pub fn push(&mut self, value: TypedValue) {
        self.stack.push(value);
    }

    pub fn pop(&mut self, context: &str) -> Result<TypedValue, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::StackUnderflow {
            context: context.to_string(),
            needed: 1,
            available: 0,
        })
    }

    pub fn peek(&self) -> Option<&TypedValue> {
        self.stack.last()
    }

    /// The top `count` values, deepest first.
    pub fn top(&self, count: usize, context: &str) -> Result<&[TypedValue], RuntimeError> {
        let available = self.stack.len();
        if count > available {
            return Err(RuntimeError::StackUnderflow {
                context: context.to_string(),
                needed: count,
                available,
            });
        }
        Ok(&self.stack[available - count..])
    }

    /// Drops the top `count` values and pushes `results` in their place.
    pub fn replace_top(&mut self, count: usize, results: impl IntoIterator<Item = TypedValue>) {
        let keep = self.stack.len().saturating_sub(count);
        self.stack.truncate(keep);
        self.stack.extend(results);
    }

    pub fn values(&self) -> &[TypedValue] {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// A step failed. Every execution is refused until [`Calculator::reset`].
    Faulted,
}

pub struct Calculator {
    engine: Arc<Engine>,
    frame: Frame,
    state: State,
}

impl Calculator {
    pub fn new(engine: Arc<Engine>) -> Self {
        let frame = Frame::new(Arc::clone(engine.domain()));
        Self {
            engine,
            frame,
            state: State::Idle,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn compile(&self, source: &str, notation: Notation) -> Result<Executable, CompileError> {
        self.engine.compile(source, notation)
    }

    /// Runs every step in order. The first failing step aborts the run and
    /// faults the calculator; values pushed by earlier steps stay on the stack.
    pub fn execute(&mut self, executable: &Executable) -> Result<(), RuntimeError> {
        if self.state == State::Faulted {
            return Err(RuntimeError::Faulted);
        }
        for step in executable.steps() {
            trace!("step {} on stack of {}", step, self.frame.len());
            if let Err(err) = step.execute(&mut self.frame) {
                debug!("execution failed at '{}': {}", step, err);
                self.state = State::Faulted;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Executes, then pops the single value the program must have produced.
    pub fn execute_and_pop(&mut self, executable: &Executable) -> Result<TypedValue, RuntimeError> {
        let before = self.frame.len();
        self.execute(executable)?;
        let after = self.frame.len();
        if after != before + 1 {
            self.state = State::Faulted;
            return Err(RuntimeError::StackValidation(format!(
                "expected exactly one result, stack went from {} to {} value(s)",
                before, after
            )));
        }
        self.frame.pop("result")
    }

    /// Compiles and runs `source`, returning its single result.
    pub fn evaluate(&mut self, source: &str, notation: Notation) -> Result<TypedValue, Error> {
        let executable = self.compile(source, notation)?;
        Ok(self.execute_and_pop(&executable)?)
    }

    pub fn stack_size(&self) -> usize {
        self.frame.len()
    }

    pub fn peek_stack(&self) -> Option<&TypedValue> {
        self.frame.peek()
    }

    pub fn stack(&self) -> &[TypedValue] {
        self.frame.values()
    }

    pub fn pop_stack(&mut self) -> Option<TypedValue> {
        self.frame.pop("pop").ok()
    }

    /// Clears the stack and the fault flag.
    pub fn reset(&mut self) {
        self.frame.clear();
        self.state = State::Idle;
    }
}
