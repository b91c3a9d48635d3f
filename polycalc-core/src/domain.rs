// RUST CONCEPT: Type domain
// A registry of the payload types a calculator knows about, the converters
// between them, the coercion rules used when an operator sees two different
// types, and the truth evaluators used by logic operators. Built once, then
// shared read-only (behind Arc) by every operator and symbol.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use crate::error::{RuntimeError, SetupError};
use crate::value::{Cons, DomainId, IntoValue, Payload, TypeTag, TypedValue, Unit, Value};

pub type ConverterFn = Arc<dyn Fn(&Value) -> Result<Value, RuntimeError> + Send + Sync>;
pub type TruthFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

/// Which side of a mixed pair gets converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// The right operand is converted to the left operand's type.
    ToLeft,
    /// The left operand is converted to the right operand's type.
    ToRight,
}

#[derive(Clone)]
enum TruthRule {
    Constant(bool),
    Evaluate(TruthFn),
}

#[derive(Default)]
pub struct TypeDomainBuilder {
    names: BTreeMap<TypeTag, String>,
    converters: HashMap<(TypeTag, TypeTag), ConverterFn>,
    coercions: HashMap<(TypeTag, TypeTag), TypeTag>,
    truth: HashMap<TypeTag, TruthRule>,
    problems: Vec<SetupError>,
}

impl TypeDomainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type(&mut self, tag: TypeTag, name: &str) -> &mut Self {
        if self.names.insert(tag, name.to_string()).is_some() {
            self.problems.push(SetupError::DuplicateType(tag));
        }
        self
    }

    pub fn register_converter<S, D, F>(&mut self, convert: F) -> &mut Self
    where
        S: Payload,
        D: Payload,
        F: Fn(&S) -> D + Send + Sync + 'static,
    {
        self.register_try_converter::<S, D, _>(move |source| Ok(convert(source)))
    }

    /// Converter that may reject particular values.
    pub fn register_try_converter<S, D, F>(&mut self, convert: F) -> &mut Self
    where
        S: Payload,
        D: Payload,
        F: Fn(&S) -> Result<D, RuntimeError> + Send + Sync + 'static,
    {
        let converter: ConverterFn = Arc::new(move |value| {
            let source = S::extract(value).ok_or_else(|| {
                RuntimeError::Type(format!("expected {}, got {}", S::TAG, value.tag()))
            })?;
            convert(source).map(IntoValue::into_value)
        });
        self.converters.insert((S::TAG, D::TAG), converter);
        self
    }

    /// Registers the coercion for both orderings of `(left, right)`.
    pub fn register_symmetric_coercion_rule(
        &mut self,
        left: TypeTag,
        right: TypeTag,
        coercion: Coercion,
    ) -> &mut Self {
        let target = match coercion {
            Coercion::ToLeft => left,
            Coercion::ToRight => right,
        };
        self.coercions.insert((left, right), target);
        self.coercions.insert((right, left), target);
        self
    }

    pub fn register_truth_evaluator<T, F>(&mut self, evaluate: F) -> &mut Self
    where
        T: Payload,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let evaluator: TruthFn =
            Arc::new(move |value| T::extract(value).map(&evaluate).unwrap_or(false));
        self.truth.insert(T::TAG, TruthRule::Evaluate(evaluator));
        self
    }

    pub fn register_always_true(&mut self, tag: TypeTag) -> &mut Self {
        self.truth.insert(tag, TruthRule::Constant(true));
        self
    }

    pub fn register_always_false(&mut self, tag: TypeTag) -> &mut Self {
        self.truth.insert(tag, TruthRule::Constant(false));
        self
    }

    pub fn build(mut self) -> Result<TypeDomain, SetupError> {
        if let Some(problem) = self.problems.drain(..).next() {
            return Err(problem);
        }

        let registered = |tag: &TypeTag| self.names.contains_key(tag);
        for &(from, to) in self.converters.keys() {
            for tag in [from, to] {
                if !registered(&tag) {
                    return Err(SetupError::UnregisteredType(tag));
                }
            }
        }
        for tag in self.truth.keys() {
            if !registered(tag) {
                return Err(SetupError::UnregisteredType(*tag));
            }
        }
        for (&(left, right), &target) in &self.coercions {
            let source = if target == left { right } else { left };
            if !self.converters.contains_key(&(source, target)) {
                return Err(SetupError::MissingConverter {
                    left: source,
                    right: target,
                });
            }
        }

        let id = DomainId(NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed));
        Ok(TypeDomain {
            id,
            names: self.names,
            converters: self.converters,
            coercions: self.coercions,
            truth: self.truth,
        })
    }
}

pub struct TypeDomain {
    id: DomainId,
    names: BTreeMap<TypeTag, String>,
    converters: HashMap<(TypeTag, TypeTag), ConverterFn>,
    coercions: HashMap<(TypeTag, TypeTag), TypeTag>,
    truth: HashMap<TypeTag, TruthRule>,
}

impl std::fmt::Debug for TypeDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDomain")
            .field("id", &self.id)
            .field("types", &self.names)
            .finish_non_exhaustive()
    }
}

impl TypeDomain {
    pub fn builder() -> TypeDomainBuilder {
        TypeDomainBuilder::new()
    }

    pub fn id(&self) -> DomainId {
        self.id
    }

    pub fn is_registered(&self, tag: TypeTag) -> bool {
        self.names.contains_key(&tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.names.keys().copied()
    }

    /// Registered display name, e.g. `int` for [`TypeTag::Int`].
    pub fn name(&self, tag: TypeTag) -> &str {
        self.names
            .get(&tag)
            .map(String::as_str)
            .unwrap_or_else(|| tag.default_name())
    }

    pub fn create(&self, value: impl IntoValue) -> Result<TypedValue, RuntimeError> {
        let value = value.into_value();
        let tag = value.tag();
        if !self.is_registered(tag) {
            return Err(RuntimeError::UnknownType(tag));
        }
        Ok(TypedValue::new(self.id, value))
    }

    pub fn unit(&self) -> Result<TypedValue, RuntimeError> {
        self.create(Unit)
    }

    /// Cons list of `items` terminated by unit.
    pub fn list(&self, items: Vec<TypedValue>) -> Result<TypedValue, RuntimeError> {
        items
            .into_iter()
            .rev()
            .try_fold(self.unit()?, |tail, head| self.create(Cons::new(head, tail)))
    }

    pub fn check(&self, value: &TypedValue) -> Result<(), RuntimeError> {
        if value.domain_id() == self.id {
            Ok(())
        } else {
            Err(RuntimeError::DomainMismatch)
        }
    }

    pub fn has_converter(&self, from: TypeTag, to: TypeTag) -> bool {
        from == to || self.converters.contains_key(&(from, to))
    }

    pub fn convert(&self, value: &TypedValue, to: TypeTag) -> Result<TypedValue, RuntimeError> {
        self.check(value)?;
        let from = value.tag();
        if from == to {
            return Ok(value.clone());
        }
        let converter = self
            .converters
            .get(&(from, to))
            .ok_or(RuntimeError::NoConverter { from, to })?;
        let converted = converter(value.value()).map_err(|source| RuntimeError::Conversion {
            from,
            to,
            source: Box::new(source),
        })?;
        trace!("converted {} from {} to {}", value, from, to);
        self.create(converted)
    }

    /// Target type when an operator sees `(left, right)`, if a rule exists.
    pub fn coercion_target(&self, left: TypeTag, right: TypeTag) -> Option<TypeTag> {
        self.coercions.get(&(left, right)).copied()
    }

    /// Converts both operands to the common type, or `None` if no rule applies.
    pub fn coerce_pair(
        &self,
        left: &TypedValue,
        right: &TypedValue,
    ) -> Result<Option<(TypedValue, TypedValue)>, RuntimeError> {
        match self.coercion_target(left.tag(), right.tag()) {
            Some(target) => Ok(Some((
                self.convert(left, target)?,
                self.convert(right, target)?,
            ))),
            None => Ok(None),
        }
    }

    /// `None` means no truth rule covers this type.
    pub fn is_truthy(&self, value: &TypedValue) -> Option<bool> {
        match self.truth.get(&value.tag())? {
            TruthRule::Constant(result) => Some(*result),
            TruthRule::Evaluate(evaluate) => Some(evaluate(value.value())),
        }
    }

    /// Like [`TypeDomain::is_truthy`], but an undetermined result is an error.
    pub fn truth(&self, value: &TypedValue) -> Result<bool, RuntimeError> {
        self.is_truthy(value).ok_or_else(|| {
            RuntimeError::Precondition(format!(
                "truth value of {} is undetermined",
                self.name(value.tag())
            ))
        })
    }

    /// Payload of type `T`, converting if the value has another type.
    pub fn extract<T: Payload + Clone>(&self, value: &TypedValue) -> Result<T, RuntimeError> {
        let converted = self.convert(value, T::TAG)?;
        converted.payload::<T>().cloned().ok_or_else(|| {
            RuntimeError::Type(format!("expected {}, got {}", T::TAG, converted.tag()))
        })
    }
}
