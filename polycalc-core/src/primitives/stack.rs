// Stack manipulation words, mostly useful in postfix notation
//
// Fixed-shape words are ordinary functions; `depth`, `clear`, `pick` and
// `roll` work on the stack as a whole and validate their own counts.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::builtins::add_builtin;
use crate::calculator::Frame;
use crate::environment::{EnvironmentBuilder, SymbolDef};
use crate::error::{RuntimeError, SetupError};

fn expect_count(name: &str, what: &str, requested: Option<usize>, actual: usize) -> Result<(), RuntimeError> {
    match requested {
        Some(requested) if requested != actual => Err(RuntimeError::StackValidation(format!(
            "'{}' has {} {}, call site expects {}",
            name, actual, what, requested
        ))),
        _ => Ok(()),
    }
}

// RUST CONCEPT: Bounds checking before mutation
// The index is read without popping so a failed pick leaves the stack intact
fn stack_index(frame: &Frame, name: &str) -> Result<usize, RuntimeError> {
    let top = frame.top(1, name)?;
    let n = frame.domain().extract::<BigInt>(&top[0])?;
    n.to_usize()
        .ok_or_else(|| RuntimeError::Precondition(format!("'{}' expects a non-negative index, got {}", name, n)))
}

// Values touched by an index: the item, everything above it, and the index itself
fn window_size(frame: &Frame, name: &str, n: usize) -> Result<usize, RuntimeError> {
    n.checked_add(2).ok_or_else(|| RuntimeError::StackUnderflow {
        context: name.to_string(),
        needed: usize::MAX,
        available: frame.len(),
    })
}

// Depth: ( -- n )
fn depth(frame: &mut Frame, args: Option<usize>, rets: Option<usize>) -> Result<(), RuntimeError> {
    expect_count("depth", "arguments", args, 0)?;
    expect_count("depth", "results", rets, 1)?;
    let depth = frame.domain().create(BigInt::from(frame.len()))?;
    frame.push(depth);
    Ok(())
}

// Clear: ( ... -- )
fn clear(frame: &mut Frame, args: Option<usize>, rets: Option<usize>) -> Result<(), RuntimeError> {
    expect_count("clear", "arguments", args, 0)?;
    expect_count("clear", "results", rets, 0)?;
    frame.clear();
    Ok(())
}

// Pick: ( xn ... x0 n -- xn ... x0 xn )
fn pick(frame: &mut Frame, args: Option<usize>, rets: Option<usize>) -> Result<(), RuntimeError> {
    expect_count("pick", "arguments", args, 1)?;
    expect_count("pick", "results", rets, 1)?;
    let n = stack_index(frame, "pick")?;
    let window = frame.top(window_size(frame, "pick", n)?, "pick")?;
    let item = window[0].clone();
    frame.replace_top(1, [item]);
    Ok(())
}

// Roll: ( xn ... x0 n -- xn-1 ... x0 xn )
fn roll(frame: &mut Frame, args: Option<usize>, rets: Option<usize>) -> Result<(), RuntimeError> {
    expect_count("roll", "arguments", args, 1)?;
    expect_count("roll", "results", rets, 0)?;
    let n = stack_index(frame, "roll")?;
    let size = window_size(frame, "roll", n)?;
    let window = frame.top(size, "roll")?;
    let mut rolled = window[1..=n].to_vec();
    rolled.push(window[0].clone());
    frame.replace_top(size, rolled);
    Ok(())
}

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    add_builtin(
        env,
        "dup",
        SymbolDef::function(1, 2, |_, args| Ok(vec![args[0].clone(), args[0].clone()])),
        "Duplicate the top value.\nStack: ( a -- a a )",
    )?;
    add_builtin(
        env,
        "pop",
        SymbolDef::function(1, 0, |_, _| Ok(Vec::new())),
        "Discard the top value.\nStack: ( a -- )",
    )?;
    add_builtin(
        env,
        "swap",
        SymbolDef::function(2, 2, |_, args| Ok(vec![args[1].clone(), args[0].clone()])),
        "Exchange the top two values.\nStack: ( a b -- b a )",
    )?;
    add_builtin(
        env,
        "over",
        SymbolDef::function(2, 3, |_, args| Ok(vec![args[0].clone(), args[1].clone(), args[0].clone()])),
        "Copy the second value to the top.\nStack: ( a b -- a b a )",
    )?;
    add_builtin(
        env,
        "rot",
        SymbolDef::function(3, 3, |_, args| Ok(vec![args[1].clone(), args[2].clone(), args[0].clone()])),
        "Rotate the third value to the top.\nStack: ( a b c -- b c a )",
    )?;
    add_builtin(env, "depth", SymbolDef::native(depth), "Number of values on the stack.\nStack: ( -- n )")?;
    add_builtin(env, "clear", SymbolDef::native(clear), "Remove every value from the stack.\nStack: ( ... -- )")?;
    add_builtin(
        env,
        "pick",
        SymbolDef::native(pick),
        "Copy the nth value below the index to the top; 0 pick is dup.\nStack: ( xn ... x0 n -- xn ... x0 xn )",
    )?;
    add_builtin(
        env,
        "roll",
        SymbolDef::native(roll),
        "Move the nth value below the index to the top; 1 roll is swap.\nStack: ( xn ... x0 n -- xn-1 ... x0 xn )",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::calculator::Calculator;
    use crate::error::RuntimeError;
    use crate::parser::Notation;
    use crate::primitives::test_support::calculator;
    use pretty_assertions::assert_eq;

    fn run(calc: &mut Calculator, source: &str) -> Result<String, RuntimeError> {
        let executable = calc.compile(source, Notation::Postfix).unwrap();
        calc.execute(&executable)?;
        Ok(calc.stack().iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" "))
    }

    fn stack_after(source: &str) -> String {
        run(&mut calculator(), source).unwrap()
    }

    #[test]
    fn test_fixed_words() {
        assert_eq!(stack_after("1 dup"), "1 1");
        assert_eq!(stack_after("1 2 pop"), "1");
        assert_eq!(stack_after("1 2 swap"), "2 1");
        assert_eq!(stack_after("1 2 over"), "1 2 1");
        assert_eq!(stack_after("1 2 3 rot"), "2 3 1");
    }

    #[test]
    fn test_depth_and_clear() {
        assert_eq!(stack_after("7 8 depth"), "7 8 2");
        assert_eq!(stack_after("7 8 clear"), "");
        assert_eq!(stack_after("depth"), "0");
    }

    #[test]
    fn test_pick_and_roll() {
        assert_eq!(stack_after("10 20 30 0 pick"), "10 20 30 30");
        assert_eq!(stack_after("10 20 30 2 pick"), "10 20 30 10");
        assert_eq!(stack_after("10 20 30 2 roll"), "20 30 10");
        assert_eq!(stack_after("10 20 30 1 roll"), "10 30 20");
        assert_eq!(stack_after("10 20 0 roll"), "10 20");
    }

    #[test]
    fn test_failures_leave_stack() {
        let mut calc = calculator();
        let err = run(&mut calc, "1 5 pick").unwrap_err();
        assert!(matches!(err.root_cause(), RuntimeError::StackUnderflow { .. }));
        assert_eq!(calc.stack_size(), 2);

        for source in ["1 18446744073709551615 pick", "1 18446744073709551615 roll"] {
            let mut calc = calculator();
            let err = run(&mut calc, source).unwrap_err();
            assert!(matches!(err.root_cause(), RuntimeError::StackUnderflow { .. }), "{}", source);
            assert_eq!(calc.stack_size(), 2);
        }

        let mut calc = calculator();
        let err = run(&mut calc, "1 0 1 - roll").unwrap_err();
        assert!(matches!(err.root_cause(), RuntimeError::Precondition(_)));
        assert_eq!(calc.stack_size(), 2);
    }

    #[test]
    fn test_explicit_counts_checked() {
        let mut calc = calculator();
        let err = run(&mut calc, "1 2 depth@1").unwrap_err();
        assert!(matches!(err.root_cause(), RuntimeError::StackValidation(_)));
    }
}
