// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The class/type lattice consumed by annotation resolution.
//!
//! Two closely related families live here:
//!
//! - [`AbstractValue`]: what the interpreter produces when it evaluates an
//!   expression. Annotation expressions evaluate to class values, containers
//!   (`List` before it is subscripted), the `Union`/`Optional` special forms,
//!   parameterized classes, unions, type parameters, instances (possibly
//!   carrying a constant) or ambiguous values.
//! - [`TypeDescriptor`]: the normalized result of resolving an annotation.
//!   Only `Class`, `TypeParameter`, `Generic`, `Union` and `Ambiguous`
//!   survive normalization.
//!
//! Values are grouped into [`Variable`]s: the set of values an expression may
//! hold, each bound at the analysis [`Node`] where it was produced.
//!
//! The lattice is single-threaded and shares classes through `Rc`.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

// ============================================================================
// Nodes
// ============================================================================

/// An opaque point in the analyzed program's control-flow graph.
///
/// Nodes are ordered by program order; a binding made at a node is visible
/// at that node and every later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Node(u32);

impl Node {
    /// The entry node of a module.
    pub const ROOT: Node = Node(0);

    /// Create a node with an explicit id.
    pub fn new(id: u32) -> Self {
        Node(id)
    }

    /// The node's id.
    pub fn id(&self) -> u32 {
        self.0
    }

    /// The node immediately after this one.
    pub fn successor(self) -> Node {
        Node(self.0 + 1)
    }
}

// ============================================================================
// Classes and Type Parameters
// ============================================================================

/// A class definition. Generic classes declare their type parameters in
/// `template`, in declaration order.
#[derive(Debug, PartialEq)]
pub struct ClassDef {
    /// The class name.
    pub name: String,
    /// Declared type parameters.
    pub template: Vec<TypeParameter>,
}

/// Shared handle to a class definition.
pub type ClassRef = Rc<ClassDef>;

impl ClassDef {
    /// Create a non-generic class.
    pub fn new(name: impl Into<String>) -> ClassRef {
        Rc::new(ClassDef {
            name: name.into(),
            template: Vec::new(),
        })
    }

    /// Create a generic class with the given declared type parameters.
    pub fn generic(name: impl Into<String>, template: Vec<TypeParameter>) -> ClassRef {
        Rc::new(ClassDef {
            name: name.into(),
            template,
        })
    }

    /// Whether the class declares type parameters.
    pub fn is_generic(&self) -> bool {
        !self.template.is_empty()
    }

    /// Names of the declared type parameters.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.template.iter().map(|p| p.name.as_str())
    }
}

/// A type parameter (`T = TypeVar("T", bound=...)`).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    /// The parameter's name.
    pub name: String,
    /// Declared upper bound; unbounded parameters instantiate to `Any`.
    pub bound: Option<Box<TypeDescriptor>>,
}

impl TypeParameter {
    /// Create an unbounded type parameter.
    pub fn new(name: impl Into<String>) -> Self {
        TypeParameter {
            name: name.into(),
            bound: None,
        }
    }

    /// Create a type parameter with an upper bound.
    pub fn with_bound(name: impl Into<String>, bound: TypeDescriptor) -> Self {
        TypeParameter {
            name: name.into(),
            bound: Some(Box::new(bound)),
        }
    }

    /// The default instantiation of this parameter at `node`: instances of
    /// its bound, or `Any` when it has none.
    pub fn instantiate(&self, node: Node) -> Variable {
        match &self.bound {
            Some(bound) => bound.instantiate(node),
            None => Variable::from_value(node, AbstractValue::Ambiguous(Ambiguity::Unsolvable)),
        }
    }
}

// ============================================================================
// Structural Building Blocks
// ============================================================================

/// Shape of a parameterized class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericKind {
    /// Parameters keyed by the base class's declared parameter names.
    Plain,
    /// A heterogeneous tuple; parameters keyed by position (`"0"`, `"1"`, ...).
    Tuple,
}

/// A class together with a binding for each of its type parameters.
///
/// `T` is [`AbstractValue`] for raw values and [`TypeDescriptor`] once
/// normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Generic<T> {
    /// The unparameterized class.
    pub base: ClassRef,
    /// Plain or tuple-shaped.
    pub kind: GenericKind,
    /// Parameter name to parameter value, in declaration order.
    pub params: Vec<(String, T)>,
}

impl<T> Generic<T> {
    /// Create a parameterized class.
    pub fn new(base: ClassRef, kind: GenericKind, params: Vec<(String, T)>) -> Self {
        Generic { base, kind, params }
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&T> {
        self.params
            .iter()
            .find(|(param_name, _)| param_name == name)
            .map(|(_, value)| value)
    }

    /// Rebuild with every parameter mapped through `f`, keeping base and kind.
    pub fn map_params<U>(&self, mut f: impl FnMut(&T) -> U) -> Generic<U> {
        Generic {
            base: Rc::clone(&self.base),
            kind: self.kind,
            params: self
                .params
                .iter()
                .map(|(name, value)| (name.clone(), f(value)))
                .collect(),
        }
    }

    /// Like [`map_params`](Self::map_params), stopping at the first error.
    pub fn try_map_params<U, E>(
        &self,
        mut f: impl FnMut(&T) -> Result<U, E>,
    ) -> Result<Generic<U>, E> {
        let mut params = Vec::with_capacity(self.params.len());
        for (name, value) in &self.params {
            params.push((name.clone(), f(value)?));
        }
        Ok(Generic {
            base: Rc::clone(&self.base),
            kind: self.kind,
            params,
        })
    }
}

/// An ordered set of alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Union<T> {
    /// The alternatives, in declaration order.
    pub options: Vec<T>,
}

impl<T> Union<T> {
    /// Create a union.
    pub fn new(options: Vec<T>) -> Self {
        Union { options }
    }

    /// Rebuild with every option mapped through `f`, keeping the order.
    pub fn map_options<U>(&self, f: impl FnMut(&T) -> U) -> Union<U> {
        Union {
            options: self.options.iter().map(f).collect(),
        }
    }

    /// Like [`map_options`](Self::map_options), stopping at the first error.
    pub fn try_map_options<U, E>(
        &self,
        f: impl FnMut(&T) -> Result<U, E>,
    ) -> Result<Union<U>, E> {
        Ok(Union {
            options: self.options.iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

/// An unconstrained value: the analysis could not narrow it further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambiguity {
    /// Could be anything (`Any`).
    Unsolvable,
    /// No value at all (`nothing`).
    Empty,
}

// ============================================================================
// Type Descriptors
// ============================================================================

/// A normalized, resolved annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// A concrete class.
    Class(ClassRef),
    /// A type parameter left for substitution.
    TypeParameter(TypeParameter),
    /// A parameterized class.
    Generic(Generic<TypeDescriptor>),
    /// A union of alternatives.
    Union(Union<TypeDescriptor>),
    /// Unconstrained.
    Ambiguous(Ambiguity),
}

impl TypeDescriptor {
    /// `Any`.
    pub fn unsolvable() -> Self {
        TypeDescriptor::Ambiguous(Ambiguity::Unsolvable)
    }

    /// `nothing`.
    pub fn empty() -> Self {
        TypeDescriptor::Ambiguous(Ambiguity::Empty)
    }

    /// Whether this descriptor is unconstrained.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, TypeDescriptor::Ambiguous(_))
    }

    /// Instances of this type, bound at `node`.
    ///
    /// Unions instantiate every option; type parameters instantiate their
    /// bound.
    pub fn instantiate(&self, node: Node) -> Variable {
        let mut var = Variable::new();
        self.instantiate_into(node, &mut var);
        var
    }

    fn instantiate_into(&self, node: Node, var: &mut Variable) {
        match self {
            TypeDescriptor::Class(_) | TypeDescriptor::Generic(_) => {
                var.add_binding(node, AbstractValue::instance(self.clone()));
            }
            TypeDescriptor::Union(union) => {
                for option in &union.options {
                    option.instantiate_into(node, var);
                }
            }
            TypeDescriptor::TypeParameter(param) => var.extend(param.instantiate(node)),
            TypeDescriptor::Ambiguous(ambiguity) => {
                var.add_binding(node, AbstractValue::Ambiguous(*ambiguity));
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Class(cls) => f.write_str(&cls.name),
            TypeDescriptor::TypeParameter(param) => f.write_str(&param.name),
            TypeDescriptor::Generic(generic) => {
                write_bracketed(f, &generic.base.name, generic.params.iter().map(|(_, v)| v))
            }
            TypeDescriptor::Union(union) => write_bracketed(f, "Union", union.options.iter()),
            TypeDescriptor::Ambiguous(Ambiguity::Unsolvable) => f.write_str("Any"),
            TypeDescriptor::Ambiguous(Ambiguity::Empty) => f.write_str("nothing"),
        }
    }
}

fn write_bracketed<'a, T: fmt::Display + 'a>(
    f: &mut fmt::Formatter<'_>,
    head: &str,
    items: impl Iterator<Item = &'a T>,
) -> fmt::Result {
    write!(f, "{}[", head)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

// ============================================================================
// Abstract Values
// ============================================================================

/// A Python constant carried by an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Tuple(Vec<Variable>),
}

/// An instance of a class, optionally with a known constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// The instance's class (a `Class` or `Generic` descriptor).
    pub cls: TypeDescriptor,
    /// The constant value, when known.
    pub constant: Option<Constant>,
}

/// Special typing forms that only make sense when subscripted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    /// `typing.Union`
    Union,
    /// `typing.Optional`
    Optional,
}

/// A value produced by the interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractValue {
    /// A class object.
    Class(ClassRef),
    /// A generic container before subscripting, e.g. `List`.
    AnnotationContainer(ClassRef),
    /// `Union` or `Optional` without brackets.
    SpecialForm(SpecialForm),
    /// A parameterized class with raw parameters.
    Parameterized(Generic<AbstractValue>),
    /// A union with raw options.
    Union(Union<AbstractValue>),
    /// A type parameter object.
    TypeParameter(TypeParameter),
    /// An instance of a class.
    Instance(Instance),
    /// An unconstrained value.
    Ambiguous(Ambiguity),
}

impl AbstractValue {
    /// An instance of `cls` with no known constant.
    pub fn instance(cls: TypeDescriptor) -> Self {
        AbstractValue::Instance(Instance {
            cls,
            constant: None,
        })
    }

    /// An instance of `cls` carrying `constant`.
    pub fn constant(cls: &ClassRef, constant: Constant) -> Self {
        AbstractValue::Instance(Instance {
            cls: TypeDescriptor::Class(Rc::clone(cls)),
            constant: Some(constant),
        })
    }

    /// Whether this value is unconstrained.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, AbstractValue::Ambiguous(_))
    }

    /// The string constant carried by this value, if any.
    pub fn str_constant(&self) -> Option<&str> {
        match self {
            AbstractValue::Instance(Instance {
                constant: Some(Constant::Str(s)),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    /// The tuple constant carried by this value, if any.
    pub fn tuple_constant(&self) -> Option<&[Variable]> {
        match self {
            AbstractValue::Instance(Instance {
                constant: Some(Constant::Tuple(items)),
                ..
            }) => Some(items),
            _ => None,
        }
    }

    /// Structural conversion of a type-like value to a descriptor.
    ///
    /// Returns `None` for values that do not denote a type. An instance of
    /// `NoneType` denotes `NoneType` itself.
    pub fn to_type(&self, builtins: &Builtins) -> Option<TypeDescriptor> {
        match self {
            AbstractValue::Class(cls) | AbstractValue::AnnotationContainer(cls) => {
                Some(TypeDescriptor::Class(Rc::clone(cls)))
            }
            AbstractValue::Parameterized(generic) => generic
                .try_map_params(|p| p.to_type(builtins).ok_or(()))
                .ok()
                .map(TypeDescriptor::Generic),
            AbstractValue::Union(union) => union
                .try_map_options(|o| o.to_type(builtins).ok_or(()))
                .ok()
                .map(TypeDescriptor::Union),
            AbstractValue::TypeParameter(param) => Some(TypeDescriptor::TypeParameter(param.clone())),
            AbstractValue::Ambiguous(ambiguity) => Some(TypeDescriptor::Ambiguous(*ambiguity)),
            AbstractValue::Instance(instance) if builtins.is_none_type(&instance.cls) => {
                Some(TypeDescriptor::Class(Rc::clone(&builtins.none_type)))
            }
            AbstractValue::Instance(_) | AbstractValue::SpecialForm(_) => None,
        }
    }

    /// Instances of the type this value denotes, bound at `node`.
    pub fn instantiate(&self, node: Node, builtins: &Builtins) -> Option<Variable> {
        self.to_type(builtins).map(|t| t.instantiate(node))
    }

    /// The class of this value, for merging.
    pub fn class_of(&self, builtins: &Builtins) -> TypeDescriptor {
        match self {
            AbstractValue::Instance(instance) => instance.cls.clone(),
            AbstractValue::Class(_)
            | AbstractValue::AnnotationContainer(_)
            | AbstractValue::SpecialForm(_)
            | AbstractValue::Parameterized(_)
            | AbstractValue::Union(_) => TypeDescriptor::Class(Rc::clone(&builtins.type_type)),
            AbstractValue::TypeParameter(_) => TypeDescriptor::unsolvable(),
            AbstractValue::Ambiguous(ambiguity) => TypeDescriptor::Ambiguous(*ambiguity),
        }
    }
}

impl fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractValue::Class(cls) | AbstractValue::AnnotationContainer(cls) => {
                f.write_str(&cls.name)
            }
            AbstractValue::SpecialForm(SpecialForm::Union) => f.write_str("Union"),
            AbstractValue::SpecialForm(SpecialForm::Optional) => f.write_str("Optional"),
            AbstractValue::Parameterized(generic) => {
                write_bracketed(f, &generic.base.name, generic.params.iter().map(|(_, v)| v))
            }
            AbstractValue::Union(union) => write_bracketed(f, "Union", union.options.iter()),
            AbstractValue::TypeParameter(param) => f.write_str(&param.name),
            AbstractValue::Instance(instance) => match &instance.constant {
                Some(Constant::None) => f.write_str("None"),
                Some(Constant::Bool(true)) => f.write_str("True"),
                Some(Constant::Bool(false)) => f.write_str("False"),
                Some(Constant::Int(i)) => write!(f, "{}", i),
                Some(Constant::Str(s)) => write!(f, "'{}'", s),
                Some(Constant::Tuple(items)) => {
                    f.write_str("(")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", item)?;
                    }
                    if items.len() == 1 {
                        f.write_str(",")?;
                    }
                    f.write_str(")")
                }
                None => write!(f, "<instance of {}>", instance.cls),
            },
            AbstractValue::Ambiguous(Ambiguity::Unsolvable) => f.write_str("Any"),
            AbstractValue::Ambiguous(Ambiguity::Empty) => f.write_str("nothing"),
        }
    }
}

// ============================================================================
// Variables
// ============================================================================

/// Errors converting a variable to a single value or constant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The variable does not hold exactly one value.
    #[error("Cannot get atomic value: {count} options")]
    NotAtomic { count: usize },

    /// The value is not the expected kind of constant.
    #[error("Expected a {expected} constant, got {found}")]
    NotConstant {
        expected: &'static str,
        found: String,
    },
}

/// One possible value of a variable, with the node that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// The value.
    pub data: AbstractValue,
    /// Where the value was bound.
    pub origin: Node,
}

/// The set of values an expression may hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variable {
    bindings: Vec<Binding>,
}

impl Variable {
    /// An empty variable.
    pub fn new() -> Self {
        Variable {
            bindings: Vec::new(),
        }
    }

    /// A variable holding a single value.
    pub fn from_value(node: Node, data: AbstractValue) -> Self {
        let mut var = Variable::new();
        var.add_binding(node, data);
        var
    }

    /// A variable holding each of `values`.
    pub fn from_values(node: Node, values: impl IntoIterator<Item = AbstractValue>) -> Self {
        let mut var = Variable::new();
        for data in values {
            var.add_binding(node, data);
        }
        var
    }

    /// Add a value bound at `node`. Duplicate values are kept once.
    pub fn add_binding(&mut self, node: Node, data: AbstractValue) {
        if !self.bindings.iter().any(|b| b.data == data) {
            self.bindings.push(Binding { data, origin: node });
        }
    }

    /// Merge another variable's bindings into this one.
    pub fn extend(&mut self, other: Variable) {
        for binding in other.bindings {
            self.add_binding(binding.origin, binding.data);
        }
    }

    /// All bindings.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Whether the variable has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// All values, regardless of where they were bound.
    pub fn data(&self) -> impl Iterator<Item = &AbstractValue> {
        self.bindings.iter().map(|b| &b.data)
    }

    /// The values visible at `node`.
    pub fn visible(&self, node: Node) -> Vec<&AbstractValue> {
        self.bindings
            .iter()
            .filter(|b| b.origin <= node)
            .map(|b| &b.data)
            .collect()
    }

    /// The single value of this variable.
    pub fn atomic_value(&self) -> Result<&AbstractValue, ConversionError> {
        match self.bindings.as_slice() {
            [binding] => Ok(&binding.data),
            bindings => Err(ConversionError::NotAtomic {
                count: bindings.len(),
            }),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bindings.as_slice() {
            [] => f.write_str("nothing"),
            [binding] => write!(f, "{}", binding.data),
            bindings => {
                for (i, binding) in bindings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{}", binding.data)?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Merging
// ============================================================================

/// Fold descriptors into one: duplicates collapse, nested unions flatten,
/// `Any` absorbs everything, and nothing at all yields `nothing`.
pub fn merge_values(values: impl IntoIterator<Item = TypeDescriptor>) -> TypeDescriptor {
    fn push_unique(merged: &mut Vec<TypeDescriptor>, t: TypeDescriptor) {
        if !merged.contains(&t) {
            merged.push(t);
        }
    }

    let mut merged: Vec<TypeDescriptor> = Vec::new();
    for value in values {
        match value {
            TypeDescriptor::Ambiguous(Ambiguity::Unsolvable) => return TypeDescriptor::unsolvable(),
            TypeDescriptor::Ambiguous(Ambiguity::Empty) => {}
            TypeDescriptor::Union(union) => {
                for option in union.options {
                    push_unique(&mut merged, option);
                }
            }
            other => push_unique(&mut merged, other),
        }
    }
    match merged.len() {
        0 => TypeDescriptor::empty(),
        1 => merged.remove(0),
        _ => TypeDescriptor::Union(Union::new(merged)),
    }
}

/// Merge the classes of `values` into a single class-union descriptor.
pub fn merge_classes<'a>(
    builtins: &Builtins,
    values: impl IntoIterator<Item = &'a AbstractValue>,
) -> TypeDescriptor {
    merge_values(values.into_iter().map(|v| v.class_of(builtins)))
}

// ============================================================================
// Scopes
// ============================================================================

/// A name to variable mapping (module globals or a frame's locals).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    names: BTreeMap<String, Variable>,
}

impl Scope {
    /// An empty scope.
    pub fn new() -> Self {
        Scope {
            names: BTreeMap::new(),
        }
    }

    /// Look up a name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.names.get(name)
    }

    /// Bind a name, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, var: Variable) {
        self.names.insert(name.into(), var);
    }

    /// Whether a name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name is bound.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ============================================================================
// Builtins
// ============================================================================

/// The builtin classes annotation resolution needs to know about.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub object_type: ClassRef,
    pub type_type: ClassRef,
    pub none_type: ClassRef,
    pub bool_type: ClassRef,
    pub int_type: ClassRef,
    pub float_type: ClassRef,
    pub str_type: ClassRef,
    pub bytes_type: ClassRef,
    pub tuple_type: ClassRef,
    pub list_type: ClassRef,
    pub dict_type: ClassRef,
    pub set_type: ClassRef,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    /// Create the builtin classes.
    pub fn new() -> Self {
        let single = || vec![TypeParameter::new("T")];
        Builtins {
            object_type: ClassDef::new("object"),
            type_type: ClassDef::new("type"),
            none_type: ClassDef::new("NoneType"),
            bool_type: ClassDef::new("bool"),
            int_type: ClassDef::new("int"),
            float_type: ClassDef::new("float"),
            str_type: ClassDef::new("str"),
            bytes_type: ClassDef::new("bytes"),
            tuple_type: ClassDef::generic("tuple", single()),
            list_type: ClassDef::generic("list", single()),
            dict_type: ClassDef::generic(
                "dict",
                vec![TypeParameter::new("K"), TypeParameter::new("V")],
            ),
            set_type: ClassDef::generic("set", single()),
        }
    }

    /// Resolve a builtin name.
    pub fn lookup(&self, name: &str) -> Option<AbstractValue> {
        let class = |cls: &ClassRef| Some(AbstractValue::Class(Rc::clone(cls)));
        let container = |cls: &ClassRef| Some(AbstractValue::AnnotationContainer(Rc::clone(cls)));
        match name {
            "object" => class(&self.object_type),
            "type" => class(&self.type_type),
            "NoneType" => class(&self.none_type),
            "bool" => class(&self.bool_type),
            "int" => class(&self.int_type),
            "float" => class(&self.float_type),
            "str" => class(&self.str_type),
            "bytes" => class(&self.bytes_type),
            "tuple" => class(&self.tuple_type),
            "list" => class(&self.list_type),
            "dict" => class(&self.dict_type),
            "set" => class(&self.set_type),
            "Tuple" => container(&self.tuple_type),
            "List" => container(&self.list_type),
            "Dict" => container(&self.dict_type),
            "Set" => container(&self.set_type),
            "Union" => Some(AbstractValue::SpecialForm(SpecialForm::Union)),
            "Optional" => Some(AbstractValue::SpecialForm(SpecialForm::Optional)),
            "Any" => Some(AbstractValue::Ambiguous(Ambiguity::Unsolvable)),
            "None" => Some(self.none()),
            "True" => Some(AbstractValue::constant(&self.bool_type, Constant::Bool(true))),
            "False" => Some(AbstractValue::constant(&self.bool_type, Constant::Bool(false))),
            _ => None,
        }
    }

    /// The `None` constant.
    pub fn none(&self) -> AbstractValue {
        AbstractValue::constant(&self.none_type, Constant::None)
    }

    /// A string constant.
    pub fn str_constant(&self, value: impl Into<String>) -> AbstractValue {
        AbstractValue::constant(&self.str_type, Constant::Str(value.into()))
    }

    /// An integer constant.
    pub fn int_constant(&self, value: i64) -> AbstractValue {
        AbstractValue::constant(&self.int_type, Constant::Int(value))
    }

    /// A tuple constant.
    pub fn tuple_constant(&self, items: Vec<Variable>) -> AbstractValue {
        AbstractValue::constant(&self.tuple_type, Constant::Tuple(items))
    }

    /// Whether `cls` is exactly `NoneType`.
    pub fn is_none_type(&self, cls: &TypeDescriptor) -> bool {
        matches!(cls, TypeDescriptor::Class(c) if Rc::ptr_eq(c, &self.none_type))
    }

    /// Whether `cls` is exactly `str`.
    pub fn is_str_type(&self, cls: &TypeDescriptor) -> bool {
        matches!(cls, TypeDescriptor::Class(c) if Rc::ptr_eq(c, &self.str_type))
    }
}
