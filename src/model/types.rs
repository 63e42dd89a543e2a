//! Symbol identities and the Java-like type vocabulary shared by every module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primitive types of the analyzed language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(Primitive::Boolean),
            "byte" => Some(Primitive::Byte),
            "short" => Some(Primitive::Short),
            "char" => Some(Primitive::Char),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "float" => Some(Primitive::Float),
            "double" => Some(Primitive::Double),
            "void" => Some(Primitive::Void),
            _ => None,
        }
    }

    /// Qualified name of the wrapper class, `None` for `void`.
    pub fn boxed_name(&self) -> Option<&'static str> {
        match self {
            Primitive::Boolean => Some("java.lang.Boolean"),
            Primitive::Byte => Some("java.lang.Byte"),
            Primitive::Short => Some("java.lang.Short"),
            Primitive::Char => Some("java.lang.Character"),
            Primitive::Int => Some("java.lang.Integer"),
            Primitive::Long => Some("java.lang.Long"),
            Primitive::Float => Some("java.lang.Float"),
            Primitive::Double => Some("java.lang.Double"),
            Primitive::Void => None,
        }
    }

    pub fn from_boxed_name(name: &str) -> Option<Self> {
        match name {
            "java.lang.Boolean" => Some(Primitive::Boolean),
            "java.lang.Byte" => Some(Primitive::Byte),
            "java.lang.Short" => Some(Primitive::Short),
            "java.lang.Character" => Some(Primitive::Char),
            "java.lang.Integer" => Some(Primitive::Int),
            "java.lang.Long" => Some(Primitive::Long),
            "java.lang.Float" => Some(Primitive::Float),
            "java.lang.Double" => Some(Primitive::Double),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Primitive::Boolean | Primitive::Void)
    }

    /// Identity or widening primitive conversion from `self` to `target`.
    pub fn widens_to(&self, target: Primitive) -> bool {
        use Primitive::*;
        if *self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Boolean | Double | Void => false,
        }
    }
}

/// A static type as reported by the semantic model.
///
/// Written as plain text in serialized models: `int`, `java.lang.String`,
/// `byte[][]`, `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JavaType {
    Primitive(Primitive),
    Reference(String),
    Array(Box<JavaType>),
    /// Type of the `null` literal.
    Null,
}

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const THROWABLE: &str = "java.lang.Throwable";
pub const ITERABLE: &str = "java.lang.Iterable";

impl JavaType {
    pub fn reference(name: impl Into<String>) -> Self {
        JavaType::Reference(name.into())
    }

    pub fn array_of(component: JavaType) -> Self {
        JavaType::Array(Box::new(component))
    }

    pub const BOOLEAN: JavaType = JavaType::Primitive(Primitive::Boolean);
    pub const INT: JavaType = JavaType::Primitive(Primitive::Int);
    pub const VOID: JavaType = JavaType::Primitive(Primitive::Void);

    pub fn is_primitive(&self) -> bool {
        matches!(self, JavaType::Primitive(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, JavaType::Primitive(Primitive::Void))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JavaType::Reference(name) if name == STRING)
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            JavaType::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// Primitive behind this type: itself, or the unboxed form of a wrapper.
    pub fn unboxed(&self) -> Option<Primitive> {
        match self {
            JavaType::Primitive(p) => Some(*p),
            JavaType::Reference(name) => Primitive::from_boxed_name(name),
            _ => None,
        }
    }

    /// Numeric after unboxing.
    pub fn is_numeric(&self) -> bool {
        self.unboxed().is_some_and(|p| p.is_numeric())
    }

    pub fn component(&self) -> Option<&JavaType> {
        match self {
            JavaType::Array(component) => Some(component),
            _ => None,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive(p) => write!(f, "{}", p.name()),
            JavaType::Reference(name) => write!(f, "{name}"),
            JavaType::Array(component) => write!(f, "{component}[]"),
            JavaType::Null => write!(f, "null"),
        }
    }
}

impl FromStr for JavaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty type name".to_string());
        }
        if let Some(component) = s.strip_suffix("[]") {
            return Ok(JavaType::array_of(component.parse()?));
        }
        if s == "null" {
            return Ok(JavaType::Null);
        }
        if let Some(p) = Primitive::from_name(s) {
            return Ok(JavaType::Primitive(p));
        }
        if s.chars().any(|c| c.is_whitespace() || c == '[' || c == ']') {
            return Err(format!("malformed type name: {s}"));
        }
        Ok(JavaType::Reference(s.to_string()))
    }
}

impl TryFrom<String> for JavaType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JavaType> for String {
    fn from(value: JavaType) -> Self {
        value.to_string()
    }
}

/// Declared accessibility, ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Private,
    /// Package-restricted (no modifier).
    Package,
    /// Subtype-restricted.
    Protected,
    Public,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessLevel::Private => "private",
            AccessLevel::Package => "package",
            AccessLevel::Protected => "protected",
            AccessLevel::Public => "public",
        };
        write!(f, "{name}")
    }
}

/// Declaration level a symbol lives at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationLevel {
    Type,
    Field,
    Executable,
}

impl fmt::Display for DeclarationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeclarationLevel::Type => "type",
            DeclarationLevel::Field => "field",
            DeclarationLevel::Executable => "executable",
        };
        write!(f, "{name}")
    }
}

/// Name used for constructors in executable references.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Identity of a library element.
///
/// Equality is purely structural over qualified names and parameter types,
/// so resolving the same library version against another source root yields
/// equal references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum SymbolRef {
    Type {
        name: String,
    },
    Field {
        owner: String,
        name: String,
    },
    Executable {
        owner: String,
        name: String,
        #[serde(default)]
        params: Vec<JavaType>,
    },
}

impl SymbolRef {
    pub fn ty(name: impl Into<String>) -> Self {
        SymbolRef::Type { name: name.into() }
    }

    pub fn field(owner: impl Into<String>, name: impl Into<String>) -> Self {
        SymbolRef::Field {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn method(owner: impl Into<String>, name: impl Into<String>, params: Vec<JavaType>) -> Self {
        SymbolRef::Executable {
            owner: owner.into(),
            name: name.into(),
            params,
        }
    }

    pub fn constructor(owner: impl Into<String>, params: Vec<JavaType>) -> Self {
        Self::method(owner, CONSTRUCTOR_NAME, params)
    }

    pub fn level(&self) -> DeclarationLevel {
        match self {
            SymbolRef::Type { .. } => DeclarationLevel::Type,
            SymbolRef::Field { .. } => DeclarationLevel::Field,
            SymbolRef::Executable { .. } => DeclarationLevel::Executable,
        }
    }

    /// The type itself for type references, the declaring type otherwise.
    pub fn owner_type(&self) -> &str {
        match self {
            SymbolRef::Type { name } => name,
            SymbolRef::Field { owner, .. } | SymbolRef::Executable { owner, .. } => owner,
        }
    }

    pub fn simple_name(&self) -> &str {
        match self {
            SymbolRef::Type { name } => simple_name(name),
            SymbolRef::Field { name, .. } | SymbolRef::Executable { name, .. } => name,
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, SymbolRef::Executable { name, .. } if name == CONSTRUCTOR_NAME)
    }

    /// Same name and parameter list, ignoring the declaring type.
    pub fn same_signature(&self, other: &SymbolRef) -> bool {
        match (self, other) {
            (
                SymbolRef::Executable { name: a, params: pa, .. },
                SymbolRef::Executable { name: b, params: pb, .. },
            ) => a == b && pa == pb,
            _ => false,
        }
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolRef::Type { name } => write!(f, "{name}"),
            SymbolRef::Field { owner, name } => write!(f, "{owner}.{name}"),
            SymbolRef::Executable { owner, name, params } => {
                let params = params.iter().map(|p| p.to_string()).collect::<Vec<_>>();
                write!(f, "{owner}#{name}({})", params.join(","))
            }
        }
    }
}

/// Package part of a qualified type name. Nested types (`a.b.Outer$Inner`)
/// share the package of their outermost type.
pub fn package_of(qualified: &str) -> &str {
    let outer = qualified.split('$').next().unwrap_or(qualified);
    match outer.rfind('.') {
        Some(idx) => &outer[..idx],
        None => "",
    }
}

pub fn simple_name(qualified: &str) -> &str {
    let tail = qualified.rsplit('.').next().unwrap_or(qualified);
    tail.rsplit('$').next().unwrap_or(tail)
}

/// Fallback heuristic for models that carry no structural anonymity flag:
/// binary names of anonymous classes have a `$` followed by a digit.
pub fn looks_anonymous(qualified: &str) -> bool {
    qualified
        .split('$')
        .skip(1)
        .any(|segment| segment.starts_with(|c: char| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_types() {
        assert_eq!("int".parse::<JavaType>().unwrap(), JavaType::INT);
        assert_eq!(
            "java.lang.String[][]".parse::<JavaType>().unwrap(),
            JavaType::array_of(JavaType::array_of(JavaType::reference(STRING)))
        );
        assert_eq!("null".parse::<JavaType>().unwrap(), JavaType::Null);
        assert!("int []x".parse::<JavaType>().is_err());
        assert!("".parse::<JavaType>().is_err());
    }

    #[test]
    fn test_type_serde_is_textual() {
        let ty = JavaType::array_of(JavaType::INT);
        assert_eq!(serde_json::to_string(&ty).unwrap(), "\"int[]\"");
        let back: JavaType = serde_json::from_str("\"a.B[]\"").unwrap();
        assert_eq!(back, JavaType::array_of(JavaType::reference("a.B")));
    }

    #[test]
    fn test_widening_table() {
        use Primitive::*;
        assert!(Byte.widens_to(Double));
        assert!(Char.widens_to(Int));
        assert!(!Char.widens_to(Short));
        assert!(!Short.widens_to(Char));
        assert!(Long.widens_to(Float));
        assert!(!Double.widens_to(Float));
        assert!(!Boolean.widens_to(Int));
        assert!(Int.widens_to(Int));
    }

    #[test]
    fn test_unboxing() {
        assert_eq!(
            JavaType::reference("java.lang.Integer").unboxed(),
            Some(Primitive::Int)
        );
        assert_eq!(JavaType::reference(STRING).unboxed(), None);
        assert!(JavaType::reference("java.lang.Double").is_numeric());
    }

    #[test]
    fn test_names() {
        assert_eq!(package_of("a.b.Outer$Inner"), "a.b");
        assert_eq!(package_of("Top"), "");
        assert_eq!(simple_name("a.b.Outer$Inner"), "Inner");
        assert!(looks_anonymous("a.Foo$1"));
        assert!(looks_anonymous("a.Foo$Inner$2"));
        assert!(!looks_anonymous("a.Foo$Inner"));
    }

    #[test]
    fn test_symbol_display_and_level() {
        let m = SymbolRef::method("a.Foo", "bar", vec![JavaType::INT]);
        assert_eq!(m.to_string(), "a.Foo#bar(int)");
        assert_eq!(m.level(), DeclarationLevel::Executable);
        assert_eq!(m.owner_type(), "a.Foo");
        assert!(SymbolRef::constructor("a.Foo", vec![]).is_constructor());
        assert!(m.same_signature(&SymbolRef::method("b.Sub", "bar", vec![JavaType::INT])));
    }
}
