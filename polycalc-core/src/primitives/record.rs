// Records: immutable objects with named fields
//
// `record("x", 1, "y", 2)` builds an object whose fields are read with the
// member access operator, `record("x", 1).x`. Field names may be strings or
// symbols.

use std::sync::Arc;

use crate::builtins::add_builtin;
use crate::domain::TypeDomain;
use crate::environment::{EnvironmentBuilder, SymbolDef};
use crate::error::{RuntimeError, SetupError};
use crate::value::{Composite, TypedValue, Value};

pub const RECORD_TYPE: &str = "record";

#[derive(Debug)]
pub struct Record {
    fields: Vec<(Arc<str>, TypedValue)>,
}

impl Record {
    pub fn new(fields: Vec<(Arc<str>, TypedValue)>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&TypedValue> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_ref() == name)
            .map(|(_, value)| value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_ref())
    }
}

impl Composite for Record {
    fn type_name(&self) -> &str {
        RECORD_TYPE
    }

    fn get(&self, _domain: &TypeDomain, member: &str) -> Result<TypedValue, RuntimeError> {
        self.field(member).cloned().ok_or_else(|| RuntimeError::NoMember {
            object: RECORD_TYPE.to_string(),
            member: member.to_string(),
        })
    }
}

fn field_name(value: &TypedValue) -> Result<Arc<str>, RuntimeError> {
    match value.value() {
        Value::Str(name) => Ok(Arc::clone(name)),
        Value::Symbol(symbol) => Ok(Arc::from(symbol.as_str())),
        _ => Err(RuntimeError::Precondition(format!(
            "record field names must be strings or symbols, got {}",
            value
        ))),
    }
}

// Construct record: ( name1 value1 name2 value2 ... -- record )
fn make_record(domain: &TypeDomain, args: &[TypedValue]) -> Result<TypedValue, RuntimeError> {
    if args.len() % 2 != 0 {
        return Err(RuntimeError::Precondition(format!(
            "record expects name/value pairs, got {} argument(s)",
            args.len()
        )));
    }

    let mut fields: Vec<(Arc<str>, TypedValue)> = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks_exact(2) {
        let name = field_name(&pair[0])?;
        if fields.iter().any(|(existing, _)| *existing == name) {
            return Err(RuntimeError::Precondition(format!("duplicate record field '{}'", name)));
        }
        fields.push((name, pair[1].clone()));
    }

    let record: Arc<dyn Composite> = Arc::new(Record::new(fields));
    domain.create(record)
}

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), SetupError> {
    add_builtin(
        env,
        "record",
        SymbolDef::variadic(2, make_record),
        "Object with named fields, read with '.'.\nUsage: record(name, value, ...)\nExample: record(\"x\", 1).x => 1",
    )
}
