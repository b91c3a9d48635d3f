// Cons cells and lists
//
// A list is a chain of pairs ending in null; `null` itself is the empty list.

use std::sync::Arc;

use num_bigint::BigInt;

use crate::builtins::add_builtin;
use crate::dispatch::UnaryDispatch;
use crate::environment::{EnvironmentBuilder, SymbolDef};
use crate::error::SetupError;
use crate::value::{Cons, Unit};

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    let domain = Arc::clone(env.domain());

    add_builtin(
        env,
        "cons",
        SymbolDef::function(2, 1, |domain, args| {
            Ok(vec![domain.create(Cons::new(args[0].clone(), args[1].clone()))?])
        }),
        "Pair of head and tail; same as head : tail.\nUsage: cons(head, tail)",
    )?;

    let car = UnaryDispatch::builder("car")
        .operation(|cons: &Cons| cons.car.value().clone())
        .build(&domain)?;
    add_builtin(env, "car", SymbolDef::unary(car), "Head of a pair.\nUsage: car(pair)")?;

    let cdr = UnaryDispatch::builder("cdr")
        .operation(|cons: &Cons| cons.cdr.value().clone())
        .build(&domain)?;
    add_builtin(env, "cdr", SymbolDef::unary(cdr), "Tail of a pair.\nUsage: cdr(pair)")?;

    add_builtin(
        env,
        "list",
        SymbolDef::variadic(0, |domain, args| domain.list(args.to_vec())),
        "List of the arguments, in order.\nUsage: list(a, b, ...)\nExample: list(1, 2) => [1 2]",
    )?;

    let len = UnaryDispatch::builder("len")
        .operation(|_: &Unit| BigInt::from(0))
        .operation(|text: &Arc<str>| BigInt::from(text.chars().count()))
        .operation(|cons: &Cons| BigInt::from(cons.len()))
        .build(&domain)?;
    add_builtin(
        env,
        "len",
        SymbolDef::unary(len),
        "Length of a list or string.\nUsage: len(x)\nExample: len(1 : 2 : null) => 2",
    )?;

    Ok(())
}
