// Type-based dispatch for operators and functions.
//
// A binary dispatch table maps (left type, right type) to an implementation.
// Lookup order: exact variant, then a variant reachable through the domain's
// coercion rule for the pair, then the default operation, then an error.
// Unary tables are ordered: exact variant, then the first registered variant
// whose type the operand converts to, then the default.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::domain::TypeDomain;
use crate::error::{RuntimeError, SetupError};
use crate::value::{IntoValue, Payload, TypeTag, TypedValue};

pub type BinaryFn =
    Arc<dyn Fn(&TypeDomain, &TypedValue, &TypedValue) -> Result<TypedValue, RuntimeError> + Send + Sync>;
pub type UnaryFn =
    Arc<dyn Fn(&TypeDomain, &TypedValue) -> Result<TypedValue, RuntimeError> + Send + Sync>;

// RUST CONCEPT: Lifting typed closures into uniform entries
// Each registration captures the payload types as generic parameters and
// erases them behind the same function signature.
fn lift_binary<L, R, O, F>(op: F) -> BinaryFn
where
    L: Payload,
    R: Payload,
    O: IntoValue,
    F: Fn(&L, &R) -> Result<O, RuntimeError> + Send + Sync + 'static,
{
    Arc::new(move |domain, left, right| {
        let (l, r) = match (left.payload::<L>(), right.payload::<R>()) {
            (Some(l), Some(r)) => (l, r),
            _ => {
                return Err(RuntimeError::Type(format!(
                    "expected ({}, {}), got ({}, {})",
                    L::TAG,
                    R::TAG,
                    left.tag(),
                    right.tag()
                )));
            }
        };
        domain.create(op(l, r)?)
    })
}

fn lift_unary<T, O, F>(op: F) -> UnaryFn
where
    T: Payload,
    O: IntoValue,
    F: Fn(&T) -> Result<O, RuntimeError> + Send + Sync + 'static,
{
    Arc::new(move |domain, operand| {
        let value = operand.payload::<T>().ok_or_else(|| {
            RuntimeError::Type(format!("expected {}, got {}", T::TAG, operand.tag()))
        })?;
        domain.create(op(value)?)
    })
}

pub struct BinaryDispatchBuilder {
    name: String,
    variants: HashMap<(TypeTag, TypeTag), BinaryFn>,
    default: Option<BinaryFn>,
    duplicate: Option<(TypeTag, TypeTag)>,
}

impl BinaryDispatchBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variants: HashMap::new(),
            default: None,
            duplicate: None,
        }
    }

    fn insert(mut self, key: (TypeTag, TypeTag), op: BinaryFn) -> Self {
        if self.variants.insert(key, op).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(key);
        }
        self
    }

    pub fn operation<L, R, O, F>(self, op: F) -> Self
    where
        L: Payload,
        R: Payload,
        O: IntoValue,
        F: Fn(&L, &R) -> O + Send + Sync + 'static,
    {
        self.insert((L::TAG, R::TAG), lift_binary(move |l: &L, r: &R| Ok(op(l, r))))
    }

    pub fn try_operation<L, R, O, F>(self, op: F) -> Self
    where
        L: Payload,
        R: Payload,
        O: IntoValue,
        F: Fn(&L, &R) -> Result<O, RuntimeError> + Send + Sync + 'static,
    {
        self.insert((L::TAG, R::TAG), lift_binary(op))
    }

    /// Variant that sees whole typed values, for operations that return one of
    /// their operands.
    pub fn raw_operation<F>(self, left: TypeTag, right: TypeTag, op: F) -> Self
    where
        F: Fn(&TypeDomain, &TypedValue, &TypedValue) -> Result<TypedValue, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        self.insert((left, right), Arc::new(op))
    }

    /// Fallback used when no variant matches, before or after coercion.
    pub fn default_operation<F>(mut self, op: F) -> Self
    where
        F: Fn(&TypeDomain, &TypedValue, &TypedValue) -> Result<TypedValue, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        self.default = Some(Arc::new(op));
        self
    }

    pub fn build(self, domain: &Arc<TypeDomain>) -> Result<BinaryDispatch, SetupError> {
        if let Some((left, right)) = self.duplicate {
            return Err(SetupError::DuplicateVariant {
                name: self.name,
                left,
                right,
            });
        }
        for &(left, right) in self.variants.keys() {
            for tag in [left, right] {
                if !domain.is_registered(tag) {
                    return Err(SetupError::UnregisteredType(tag));
                }
            }
        }
        Ok(BinaryDispatch {
            name: self.name,
            domain: Arc::clone(domain),
            variants: self.variants,
            default: self.default,
        })
    }
}

pub struct BinaryDispatch {
    name: String,
    domain: Arc<TypeDomain>,
    variants: HashMap<(TypeTag, TypeTag), BinaryFn>,
    default: Option<BinaryFn>,
}

impl BinaryDispatch {
    pub fn builder(name: &str) -> BinaryDispatchBuilder {
        BinaryDispatchBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &Arc<TypeDomain> {
        &self.domain
    }

    pub fn apply(&self, left: &TypedValue, right: &TypedValue) -> Result<TypedValue, RuntimeError> {
        self.domain.check(left)?;
        self.domain.check(right)?;

        if let Some(op) = self.variants.get(&(left.tag(), right.tag())) {
            return op(&self.domain, left, right);
        }

        if let Some((l, r)) = self.domain.coerce_pair(left, right)? {
            if let Some(op) = self.variants.get(&(l.tag(), r.tag())) {
                trace!("{}: coerced ({}, {}) to {}", self.name, left.tag(), right.tag(), l.tag());
                return op(&self.domain, &l, &r);
            }
        }

        if let Some(op) = &self.default {
            return op(&self.domain, left, right);
        }

        Err(RuntimeError::Dispatch {
            operator: self.name.clone(),
            left: left.tag(),
            right: right.tag(),
        })
    }
}

impl fmt::Debug for BinaryDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.variants.keys().collect();
        keys.sort();
        f.debug_struct("BinaryDispatch")
            .field("name", &self.name)
            .field("variants", &keys)
            .field("default", &self.default.is_some())
            .finish()
    }
}

pub struct UnaryDispatchBuilder {
    name: String,
    variants: Vec<(TypeTag, UnaryFn)>,
    default: Option<UnaryFn>,
}

impl UnaryDispatchBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variants: Vec::new(),
            default: None,
        }
    }

    pub fn operation<T, O, F>(self, op: F) -> Self
    where
        T: Payload,
        O: IntoValue,
        F: Fn(&T) -> O + Send + Sync + 'static,
    {
        self.try_operation(move |value: &T| Ok(op(value)))
    }

    pub fn try_operation<T, O, F>(mut self, op: F) -> Self
    where
        T: Payload,
        O: IntoValue,
        F: Fn(&T) -> Result<O, RuntimeError> + Send + Sync + 'static,
    {
        self.variants.push((T::TAG, lift_unary(op)));
        self
    }

    pub fn raw_operation<F>(mut self, tag: TypeTag, op: F) -> Self
    where
        F: Fn(&TypeDomain, &TypedValue) -> Result<TypedValue, RuntimeError> + Send + Sync + 'static,
    {
        self.variants.push((tag, Arc::new(op)));
        self
    }

    pub fn default_operation<F>(mut self, op: F) -> Self
    where
        F: Fn(&TypeDomain, &TypedValue) -> Result<TypedValue, RuntimeError> + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(op));
        self
    }

    pub fn build(self, domain: &Arc<TypeDomain>) -> Result<UnaryDispatch, SetupError> {
        for (index, (tag, _)) in self.variants.iter().enumerate() {
            if !domain.is_registered(*tag) {
                return Err(SetupError::UnregisteredType(*tag));
            }
            if self.variants[..index].iter().any(|(seen, _)| seen == tag) {
                return Err(SetupError::DuplicateVariant {
                    name: self.name,
                    left: *tag,
                    right: *tag,
                });
            }
        }
        Ok(UnaryDispatch {
            name: self.name,
            domain: Arc::clone(domain),
            variants: self.variants,
            default: self.default,
        })
    }
}

pub struct UnaryDispatch {
    name: String,
    domain: Arc<TypeDomain>,
    variants: Vec<(TypeTag, UnaryFn)>,
    default: Option<UnaryFn>,
}

impl UnaryDispatch {
    pub fn builder(name: &str) -> UnaryDispatchBuilder {
        UnaryDispatchBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, operand: &TypedValue) -> Result<TypedValue, RuntimeError> {
        self.domain.check(operand)?;
        let tag = operand.tag();

        if let Some((_, op)) = self.variants.iter().find(|(variant, _)| *variant == tag) {
            return op(&self.domain, operand);
        }

        // First registered variant the operand can be converted to
        let reachable = self
            .variants
            .iter()
            .find(|(variant, _)| self.domain.has_converter(tag, *variant));
        if let Some((variant, op)) = reachable {
            trace!("{}: converting {} to {}", self.name, tag, variant);
            let converted = self.domain.convert(operand, *variant)?;
            return op(&self.domain, &converted);
        }

        if let Some(op) = &self.default {
            return op(&self.domain, operand);
        }

        Err(RuntimeError::UnaryDispatch {
            operator: self.name.clone(),
            operand: tag,
        })
    }
}

impl fmt::Debug for UnaryDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<_> = self.variants.iter().map(|(tag, _)| *tag).collect();
        f.debug_struct("UnaryDispatch")
            .field("name", &self.name)
            .field("variants", &tags)
            .field("default", &self.default.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coercion;
    use num_bigint::BigInt;
    use num_traits::ToPrimitive;
    use std::sync::Arc;

    fn domain() -> Arc<TypeDomain> {
        let mut builder = TypeDomain::builder();
        builder
            .register_type(TypeTag::Int, "int")
            .register_type(TypeTag::Float, "float")
            .register_type(TypeTag::Str, "str")
            .register_type(TypeTag::Bool, "bool")
            .register_converter::<BigInt, f64, _>(|i| i.to_f64().unwrap_or(f64::NAN))
            .register_converter::<bool, BigInt, _>(|b| BigInt::from(*b as u8))
            .register_symmetric_coercion_rule(TypeTag::Int, TypeTag::Float, Coercion::ToRight);
        Arc::new(builder.build().unwrap())
    }

    fn plus(domain: &Arc<TypeDomain>) -> BinaryDispatch {
        BinaryDispatch::builder("+")
            .operation(|l: &BigInt, r: &BigInt| l + r)
            .operation(|l: &f64, r: &f64| l + r)
            .operation(|l: &Arc<str>, r: &Arc<str>| format!("{}{}", l, r))
            .build(domain)
            .unwrap()
    }

    #[test]
    fn test_exact_variant() {
        let domain = domain();
        let op = plus(&domain);
        let result = op
            .apply(&domain.create(BigInt::from(2)).unwrap(), &domain.create(BigInt::from(3)).unwrap())
            .unwrap();
        assert_eq!(result.payload::<BigInt>(), Some(&BigInt::from(5)));
    }

    #[test]
    fn test_coerced_variant() {
        let domain = domain();
        let op = plus(&domain);
        let result = op
            .apply(&domain.create(BigInt::from(2)).unwrap(), &domain.create(0.5).unwrap())
            .unwrap();
        assert_eq!(result.payload::<f64>(), Some(&2.5));
    }

    #[test]
    fn test_default_then_error() {
        let domain = domain();
        let op = plus(&domain);
        let text = domain.create(String::from("a")).unwrap();
        let number = domain.create(1.0).unwrap();
        assert!(matches!(
            op.apply(&text, &number),
            Err(RuntimeError::Dispatch { left: TypeTag::Str, right: TypeTag::Float, .. })
        ));

        let with_default = BinaryDispatch::builder("first")
            .default_operation(|_, l, _| Ok(l.clone()))
            .build(&domain)
            .unwrap();
        assert_eq!(with_default.apply(&text, &number).unwrap(), text);
    }

    #[test]
    fn test_duplicate_variant_rejected() {
        let domain = domain();
        let result = BinaryDispatch::builder("+")
            .operation(|l: &BigInt, r: &BigInt| l + r)
            .operation(|l: &BigInt, r: &BigInt| l - r)
            .build(&domain);
        assert!(matches!(result, Err(SetupError::DuplicateVariant { .. })));
    }

    #[test]
    fn test_unary_conversion_order() {
        let domain = domain();
        let neg = UnaryDispatch::builder("neg")
            .operation(|i: &BigInt| -i)
            .operation(|f: &f64| -f)
            .build(&domain)
            .unwrap();

        let from_bool = neg.apply(&domain.create(true).unwrap()).unwrap();
        assert_eq!(from_bool.payload::<BigInt>(), Some(&BigInt::from(-1)));

        let text = domain.create(String::from("x")).unwrap();
        assert!(matches!(
            neg.apply(&text),
            Err(RuntimeError::UnaryDispatch { operand: TypeTag::Str, .. })
        ));
    }
}
