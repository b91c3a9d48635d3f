// Runtime values: the closed set of payload types and the typed wrapper that
// ties a payload to the type domain which created it.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_complex::Complex64;

use crate::domain::TypeDomain;
use crate::error::RuntimeError;

// RUST CONCEPT: A closed set of type tags
// Every payload variant maps to exactly one tag. Tags are Copy so they can be
// used as hash keys for dispatch tables without allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Unit,
    Int,
    Float,
    Bool,
    Str,
    Complex,
    Object,
    Pair,
    Symbol,
}

impl TypeTag {
    pub const ALL: [TypeTag; 9] = [
        TypeTag::Unit,
        TypeTag::Int,
        TypeTag::Float,
        TypeTag::Bool,
        TypeTag::Str,
        TypeTag::Complex,
        TypeTag::Object,
        TypeTag::Pair,
        TypeTag::Symbol,
    ];

    /// Name used in diagnostics when no domain is at hand.
    pub fn default_name(self) -> &'static str {
        match self {
            TypeTag::Unit => "<null>",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::Str => "str",
            TypeTag::Complex => "complex",
            TypeTag::Object => "object",
            TypeTag::Pair => "pair",
            TypeTag::Symbol => "symbol",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Identity of the [`TypeDomain`] that created a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainId(pub(crate) u64);

/// Payload of the unit type. Terminates pair lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unit;

/// Interned identifier. Equality is equality of the text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Symbol(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn shares_storage(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Opaque object capability: anything that can answer member lookups.
///
/// The member-access operator `.` dispatches `(object, str)` to [`Composite::get`].
pub trait Composite: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn get(&self, domain: &TypeDomain, member: &str) -> Result<TypedValue, RuntimeError>;
}

// RUST CONCEPT: Cons cells hold typed values
// Lists are chains of pairs terminated by the unit value
#[derive(Debug, Clone, PartialEq)]
pub struct Cons {
    pub car: TypedValue,
    pub cdr: TypedValue,
}

impl Cons {
    pub fn new(car: TypedValue, cdr: TypedValue) -> Self {
        Self { car, cdr }
    }

    /// Number of cells in the cdr chain starting at this one.
    pub fn len(&self) -> usize {
        let mut count = 1;
        let mut current = &self.cdr;
        while let Value::Pair(next) = current.value() {
            count += 1;
            current = &next.cdr;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates the car of every cell, stopping at the first non-pair cdr.
    pub fn iter(&self) -> ConsIter<'_> {
        ConsIter { next: Some(self) }
    }

    /// The value in the cdr position of the last cell.
    pub fn terminator(&self) -> &TypedValue {
        let mut current = self;
        while let Value::Pair(next) = current.cdr.value() {
            current = next;
        }
        &current.cdr
    }
}

pub struct ConsIter<'a> {
    next: Option<&'a Cons>,
}

impl<'a> Iterator for ConsIter<'a> {
    type Item = &'a TypedValue;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next?;
        self.next = match cell.cdr.value() {
            Value::Pair(next) => Some(next.as_ref()),
            _ => None,
        };
        Some(&cell.car)
    }
}

#[derive(Clone)]
pub enum Value {
    Unit,
    Int(BigInt),
    Float(f64),
    Bool(bool),
    Str(Arc<str>),
    Complex(Complex64),
    Object(Arc<dyn Composite>),
    Pair(Arc<Cons>),
    Symbol(Symbol),
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Unit => TypeTag::Unit,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Bool(_) => TypeTag::Bool,
            Value::Str(_) => TypeTag::Str,
            Value::Complex(_) => TypeTag::Complex,
            Value::Object(_) => TypeTag::Object,
            Value::Pair(_) => TypeTag::Pair,
            Value::Symbol(_) => TypeTag::Symbol,
        }
    }
}

// RUST CONCEPT: Exact-type equality
// Values of different tags are never equal. Floats compare by IEEE total order
// so equality agrees with the ordering used by comparison operators.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b).is_eq(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Complex(a), Value::Complex(b)) => {
                a.re.total_cmp(&b.re).is_eq() && a.im.total_cmp(&b.im).is_eq()
            }
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Pair(a), Value::Pair(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "Unit"),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(n) => write!(f, "Float({:?})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Complex(c) => write!(f, "Complex({:?}, {:?})", c.re, c.im),
            Value::Object(o) => write!(f, "Object({:?})", o),
            Value::Pair(cons) => write!(f, "Pair({:?}, {:?})", cons.car, cons.cdr),
            Value::Symbol(s) => write!(f, "{:?}", s),
        }
    }
}

// This is the "data display" mode - strings WITH quotes, floats always with a
// fraction or exponent so they can't be confused with integers
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "null"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Complex(c) => {
                if c.im.is_sign_negative() {
                    write!(f, "{:?}{:?}I", c.re, c.im)
                } else {
                    write!(f, "{:?}+{:?}I", c.re, c.im)
                }
            }
            Value::Object(o) => write!(f, "<object:{}>", o.type_name()),
            Value::Pair(cons) => {
                write!(f, "[")?;
                for (i, item) in cons.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                let terminator = cons.terminator();
                if !terminator.is(TypeTag::Unit) {
                    write!(f, " | {}", terminator)?;
                }
                write!(f, "]")
            }
            Value::Symbol(s) => write!(f, "'{}", s.as_str()),
        }
    }
}

/// Conversion of a host value into a payload.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// A host type that is the payload of exactly one [`TypeTag`].
///
/// Dispatch tables and converters are registered against these types; the
/// registration records `TAG` and the closure receives the unwrapped payload.
pub trait Payload: IntoValue + Sized + 'static {
    const TAG: TypeTag;

    fn extract(value: &Value) -> Option<&Self>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self.into())
    }
}

// Payload impls are uniform except for the variant involved
macro_rules! payload {
    ($ty:ty, $tag:ident, $variant:ident) => {
        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl Payload for $ty {
            const TAG: TypeTag = TypeTag::$tag;

            fn extract(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

payload!(BigInt, Int, Int);
payload!(f64, Float, Float);
payload!(bool, Bool, Bool);
payload!(Arc<str>, Str, Str);
payload!(Complex64, Complex, Complex);
payload!(Arc<dyn Composite>, Object, Object);
payload!(Symbol, Symbol, Symbol);

impl IntoValue for Unit {
    fn into_value(self) -> Value {
        Value::Unit
    }
}

impl Payload for Unit {
    const TAG: TypeTag = TypeTag::Unit;

    fn extract(value: &Value) -> Option<&Self> {
        match value {
            Value::Unit => Some(&Unit),
            _ => None,
        }
    }
}

impl IntoValue for Cons {
    fn into_value(self) -> Value {
        Value::Pair(Arc::new(self))
    }
}

impl Payload for Cons {
    const TAG: TypeTag = TypeTag::Pair;

    fn extract(value: &Value) -> Option<&Self> {
        match value {
            Value::Pair(cons) => Some(cons.as_ref()),
            _ => None,
        }
    }
}

/// A payload stamped with the domain that created it.
///
/// Only [`TypeDomain::create`] builds these, so every typed value carries a
/// registered tag.
#[derive(Clone, PartialEq)]
pub struct TypedValue {
    domain: DomainId,
    value: Value,
}

impl TypedValue {
    pub(crate) fn new(domain: DomainId, value: Value) -> Self {
        Self { domain, value }
    }

    pub fn tag(&self) -> TypeTag {
        self.value.tag()
    }

    pub fn domain_id(&self) -> DomainId {
        self.domain
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Exact type check, never coerced.
    pub fn is(&self, tag: TypeTag) -> bool {
        self.tag() == tag
    }

    pub fn payload<T: Payload>(&self) -> Option<&T> {
        T::extract(&self.value)
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
