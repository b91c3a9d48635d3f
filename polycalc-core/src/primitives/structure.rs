// Structural operators: member access and list construction

use std::sync::Arc;

use crate::error::{RuntimeError, SetupError};
use crate::operators::{BinaryOperator, BinaryOperatorBuilder, OperatorDictionaryBuilder, PRECEDENCE_CONS, PRECEDENCE_DOT};
use crate::value::{Composite, Cons, TypeTag};

pub const MEMBER_ACCESS: &str = ".";
pub const CONS: &str = ":";

pub fn register(ops: &mut OperatorDictionaryBuilder) -> Result<(), SetupError> {
    ops.register_binary(member_access())?;
    ops.register_binary(cons())?;
    ops.set_member_access(MEMBER_ACCESS);
    Ok(())
}

// Member access: ( object name -- member )
fn member_access() -> BinaryOperatorBuilder {
    BinaryOperator::builder(MEMBER_ACCESS, PRECEDENCE_DOT).dispatch(|d| {
        d.raw_operation(TypeTag::Object, TypeTag::Str, |domain, object, member| {
            match (object.payload::<Arc<dyn Composite>>(), member.payload::<Arc<str>>()) {
                (Some(object), Some(member)) => object.get(domain, member),
                _ => Err(RuntimeError::Type("member access expects (object, str)".to_string())),
            }
        })
    })
}

// Cons: ( head tail -- [head | tail] ), right-associative so `1 : 2 : null` is a list
fn cons() -> BinaryOperatorBuilder {
    BinaryOperator::builder(CONS, PRECEDENCE_CONS)
        .right_associative()
        .dispatch(|d| d.default_operation(|domain, head, tail| domain.create(Cons::new(head.clone(), tail.clone()))))
}
