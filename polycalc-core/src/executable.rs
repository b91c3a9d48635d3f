// Compiled programs: a flat, immutable sequence of steps in postfix order.

use std::fmt;
use std::sync::Arc;

use crate::calculator::Frame;
use crate::environment::SymbolDef;
use crate::error::RuntimeError;
use crate::operators::Operator;
use crate::value::TypedValue;

#[derive(Debug, Clone)]
pub enum Step {
    Push(TypedValue),
    Call {
        name: Arc<str>,
        symbol: Arc<SymbolDef>,
        args: Option<usize>,
        rets: Option<usize>,
    },
    Apply(Operator),
}

impl Step {
    pub fn execute(&self, frame: &mut Frame) -> Result<(), RuntimeError> {
        match self {
            Step::Push(value) => {
                frame.push(value.clone());
                Ok(())
            }
            Step::Call {
                name,
                symbol,
                args,
                rets,
            } => symbol.execute(name, frame, *args, *rets),
            Step::Apply(op) => {
                let operands = frame.top(op.arity(), op.id())?;
                let result = op.apply(operands)?;
                frame.replace_top(op.arity(), [result]);
                Ok(())
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Push(value) => write!(f, "{}", value),
            Step::Call {
                name,
                symbol,
                args,
                rets,
            } => match (args.filter(|n| symbol.fixed_args() != Some(*n)), rets) {
                (None, None) => write!(f, "{}", name),
                (Some(args), None) => write!(f, "{}@{}", name, args),
                (None, Some(rets)) => write!(f, "{}@,{}", name, rets),
                (Some(args), Some(rets)) => write!(f, "{}@{},{}", name, args, rets),
            },
            Step::Apply(op) => write!(f, "{}", op),
        }
    }
}

/// A compiled expression. Cheap to clone and safe to run any number of times.
#[derive(Debug, Clone)]
pub struct Executable {
    steps: Arc<[Step]>,
}

impl Executable {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}
