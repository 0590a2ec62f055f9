//! Cursor-level IR shared by every backend
//!
//! The vocabulary mirrors libclang so that records produced from a
//! tree-sitter parse read exactly like the ones an editor plugin expects:
//! cursor kinds and type kinds carry libclang's spellings, kinds are grouped
//! into coarse classes, and locations are 1-based line/byte-column pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Language
// ============================================================================

/// Source language of a translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    C,
    Cpp,
    Unknown,
}

impl LanguageId {
    /// Detect the language from a file extension (without the leading dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "c" => LanguageId::C,
            "cc" | "cpp" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "h++" | "h" | "ipp" | "tpp" => {
                LanguageId::Cpp
            }
            _ => LanguageId::Unknown,
        }
    }

    /// Detect the language from a path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(LanguageId::Unknown)
    }

    /// Interpret the argument of a `-x` compiler flag
    pub fn from_flag(value: &str) -> Self {
        match value {
            "c" | "c-header" => LanguageId::C,
            "c++" | "c++-header" => LanguageId::Cpp,
            _ => LanguageId::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::C => "c",
            LanguageId::Cpp => "c++",
            LanguageId::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Node handles
// ============================================================================

/// Index of a cursor inside a translation unit's arena
///
/// `NodeId::NULL` plays the role of libclang's null cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const NULL: NodeId = NodeId(u32::MAX);

    pub fn new(index: usize) -> Self {
        NodeId(u32::try_from(index).unwrap_or(u32::MAX))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self == NodeId::NULL
    }
}

// ============================================================================
// Cursor kinds
// ============================================================================

/// Coarse classification of a cursor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindClass {
    Attribute,
    Declaration,
    Expression,
    Preprocessing,
    Reference,
    Statement,
    TranslationUnit,
    Unexposed,
    Invalid,
}

impl KindClass {
    /// Name used in `kind_type` fields; the invalid class has no name
    pub fn name(&self) -> &'static str {
        match self {
            KindClass::Attribute => "Attribute",
            KindClass::Declaration => "Declaration",
            KindClass::Expression => "Expression",
            KindClass::Preprocessing => "Preprocessing",
            KindClass::Reference => "Reference",
            KindClass::Statement => "Statement",
            KindClass::TranslationUnit => "TranslationUnit",
            KindClass::Unexposed => "Unexposed",
            KindClass::Invalid => "",
        }
    }
}

macro_rules! cursor_kinds {
    ($( $variant:ident => ($spelling:expr, $class:ident) ),* $(,)?) => {
        /// Kind of an AST cursor, spelled the way libclang spells it
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CursorKind {
            $( $variant, )*
        }

        impl CursorKind {
            pub fn spelling(&self) -> &'static str {
                match self {
                    $( CursorKind::$variant => $spelling, )*
                }
            }

            pub fn class(&self) -> KindClass {
                match self {
                    $( CursorKind::$variant => KindClass::$class, )*
                }
            }
        }
    };
}

cursor_kinds! {
    // declarations
    UnexposedDecl => ("UnexposedDecl", Declaration),
    StructDecl => ("StructDecl", Declaration),
    UnionDecl => ("UnionDecl", Declaration),
    ClassDecl => ("ClassDecl", Declaration),
    EnumDecl => ("EnumDecl", Declaration),
    FieldDecl => ("FieldDecl", Declaration),
    EnumConstantDecl => ("EnumConstantDecl", Declaration),
    FunctionDecl => ("FunctionDecl", Declaration),
    VarDecl => ("VarDecl", Declaration),
    ParmDecl => ("ParmDecl", Declaration),
    TypedefDecl => ("TypedefDecl", Declaration),
    CXXMethod => ("CXXMethod", Declaration),
    Namespace => ("Namespace", Declaration),
    LinkageSpec => ("LinkageSpec", Declaration),
    Constructor => ("CXXConstructor", Declaration),
    Destructor => ("CXXDestructor", Declaration),
    ConversionFunction => ("CXXConversion", Declaration),
    TemplateTypeParameter => ("TemplateTypeParameter", Declaration),
    NonTypeTemplateParameter => ("NonTypeTemplateParameter", Declaration),
    FunctionTemplate => ("FunctionTemplate", Declaration),
    ClassTemplate => ("ClassTemplate", Declaration),
    ClassTemplatePartialSpecialization => ("ClassTemplatePartialSpecialization", Declaration),
    NamespaceAlias => ("NamespaceAlias", Declaration),
    UsingDirective => ("UsingDirective", Declaration),
    UsingDeclaration => ("UsingDeclaration", Declaration),
    TypeAliasDecl => ("TypeAliasDecl", Declaration),
    TypeAliasTemplateDecl => ("TypeAliasTemplateDecl", Declaration),
    CXXAccessSpecifier => ("CXXAccessSpecifier", Declaration),
    StaticAssert => ("StaticAssert", Declaration),
    FriendDecl => ("FriendDecl", Declaration),
    // references
    TypeRef => ("TypeRef", Reference),
    CXXBaseSpecifier => ("C++ base class specifier", Reference),
    TemplateRef => ("TemplateRef", Reference),
    NamespaceRef => ("NamespaceRef", Reference),
    MemberRef => ("MemberRef", Reference),
    // invalid
    InvalidFile => ("InvalidFile", Invalid),
    NoDeclFound => ("NoDeclFound", Invalid),
    // expressions
    UnexposedExpr => ("UnexposedExpr", Expression),
    DeclRefExpr => ("DeclRefExpr", Expression),
    MemberRefExpr => ("MemberRefExpr", Expression),
    CallExpr => ("CallExpr", Expression),
    IntegerLiteral => ("IntegerLiteral", Expression),
    FloatingLiteral => ("FloatingLiteral", Expression),
    ImaginaryLiteral => ("ImaginaryLiteral", Expression),
    FixedPointLiteral => ("FixedPointLiteral", Expression),
    StringLiteral => ("StringLiteral", Expression),
    CharacterLiteral => ("CharacterLiteral", Expression),
    ParenExpr => ("ParenExpr", Expression),
    UnaryOperator => ("UnaryOperator", Expression),
    ArraySubscriptExpr => ("ArraySubscriptExpr", Expression),
    BinaryOperator => ("BinaryOperator", Expression),
    CompoundAssignOperator => ("CompoundAssignOperator", Expression),
    ConditionalOperator => ("ConditionalOperator", Expression),
    CStyleCastExpr => ("CStyleCastExpr", Expression),
    InitListExpr => ("InitListExpr", Expression),
    CXXStaticCastExpr => ("CXXStaticCastExpr", Expression),
    CXXBoolLiteralExpr => ("CXXBoolLiteralExpr", Expression),
    CXXNullPtrLiteralExpr => ("CXXNullPtrLiteralExpr", Expression),
    CXXThisExpr => ("CXXThisExpr", Expression),
    CXXThrowExpr => ("CXXThrowExpr", Expression),
    CXXNewExpr => ("CXXNewExpr", Expression),
    CXXDeleteExpr => ("CXXDeleteExpr", Expression),
    UnaryExpr => ("UnaryExpr", Expression),
    LambdaExpr => ("LambdaExpr", Expression),
    // statements
    UnexposedStmt => ("UnexposedStmt", Statement),
    LabelStmt => ("LabelStmt", Statement),
    CompoundStmt => ("CompoundStmt", Statement),
    CaseStmt => ("CaseStmt", Statement),
    DefaultStmt => ("DefaultStmt", Statement),
    IfStmt => ("IfStmt", Statement),
    SwitchStmt => ("SwitchStmt", Statement),
    WhileStmt => ("WhileStmt", Statement),
    DoStmt => ("DoStmt", Statement),
    ForStmt => ("ForStmt", Statement),
    GotoStmt => ("GotoStmt", Statement),
    ContinueStmt => ("ContinueStmt", Statement),
    BreakStmt => ("BreakStmt", Statement),
    ReturnStmt => ("ReturnStmt", Statement),
    CXXCatchStmt => ("CXXCatchStmt", Statement),
    CXXTryStmt => ("CXXTryStmt", Statement),
    CXXForRangeStmt => ("CXXForRangeStmt", Statement),
    NullStmt => ("NullStmt", Statement),
    DeclStmt => ("DeclStmt", Statement),
    // translation unit
    TranslationUnit => ("TranslationUnit", TranslationUnit),
    // attributes
    UnexposedAttr => ("UnexposedAttr", Attribute),
    CXXFinalAttr => ("attribute(final)", Attribute),
    CXXOverrideAttr => ("attribute(override)", Attribute),
    // preprocessing
    PreprocessingDirective => ("preprocessing directive", Preprocessing),
    MacroDefinition => ("macro definition", Preprocessing),
    MacroExpansion => ("macro expansion", Preprocessing),
    InclusionDirective => ("inclusion directive", Preprocessing),
}

impl CursorKind {
    pub fn is_declaration(&self) -> bool {
        self.class() == KindClass::Declaration
    }

    pub fn is_expression(&self) -> bool {
        self.class() == KindClass::Expression
    }

    pub fn is_statement(&self) -> bool {
        self.class() == KindClass::Statement
    }

    pub fn is_reference(&self) -> bool {
        self.class() == KindClass::Reference
    }

    pub fn is_invalid(&self) -> bool {
        self.class() == KindClass::Invalid
    }

    /// Literal expressions whose records carry a `value` field
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            CursorKind::IntegerLiteral
                | CursorKind::FloatingLiteral
                | CursorKind::ImaginaryLiteral
                | CursorKind::FixedPointLiteral
                | CursorKind::StringLiteral
                | CursorKind::CharacterLiteral
        )
    }

    /// Function-like declarations, including templates; lambdas excluded
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            CursorKind::FunctionDecl
                | CursorKind::CXXMethod
                | CursorKind::Constructor
                | CursorKind::Destructor
                | CursorKind::ConversionFunction
                | CursorKind::FunctionTemplate
        )
    }

    pub fn is_class(&self) -> bool {
        matches!(
            self,
            CursorKind::ClassDecl
                | CursorKind::StructDecl
                | CursorKind::UnionDecl
                | CursorKind::ClassTemplate
                | CursorKind::ClassTemplatePartialSpecialization
        )
    }

    pub fn is_type_declaration(&self) -> bool {
        self.is_class()
            || matches!(
                self,
                CursorKind::EnumDecl
                    | CursorKind::TypedefDecl
                    | CursorKind::TypeAliasDecl
                    | CursorKind::TypeAliasTemplateDecl
                    | CursorKind::TemplateTypeParameter
            )
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self, CursorKind::Namespace | CursorKind::NamespaceAlias)
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

// ============================================================================
// Locations
// ============================================================================

/// A point in a source file; `file` is the logical path the user asked about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// Half-open source range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Punctuation,
    Keyword,
    Identifier,
    Literal,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub range: SourceRange,
}

// ============================================================================
// Semantic properties
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Linkage {
    #[default]
    Invalid,
    NoLinkage,
    Internal,
    UniqueExternal,
    External,
}

impl Linkage {
    pub fn spelling(&self) -> &'static str {
        match self {
            Linkage::Invalid => "",
            Linkage::NoLinkage => "Nolinkage",
            Linkage::Internal => "Internal",
            Linkage::UniqueExternal => "UniqueExternal",
            Linkage::External => "External",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessSpecifier {
    #[default]
    Invalid,
    Public,
    Protected,
    Private,
}

impl AccessSpecifier {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim() {
            "public" => AccessSpecifier::Public,
            "protected" => AccessSpecifier::Protected,
            "private" => AccessSpecifier::Private,
            _ => AccessSpecifier::Invalid,
        }
    }

    pub fn spelling(&self) -> Option<&'static str> {
        match self {
            AccessSpecifier::Invalid => None,
            AccessSpecifier::Public => Some("public"),
            AccessSpecifier::Protected => Some("protected"),
            AccessSpecifier::Private => Some("private"),
        }
    }
}

/// Boolean facts about a cursor, all false for non-declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorFlags {
    pub is_definition: bool,
    pub is_dynamic_call: bool,
    pub is_variadic: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_static_method: bool,
}

// ============================================================================
// Types
// ============================================================================

macro_rules! type_kinds {
    ($( $variant:ident => $spelling:expr ),* $(,)?) => {
        /// Kind of a type, spelled the way libclang spells it
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum TypeKind {
            #[default]
            $( $variant, )*
        }

        impl TypeKind {
            pub fn spelling(&self) -> &'static str {
                match self {
                    $( TypeKind::$variant => $spelling, )*
                }
            }
        }
    };
}

type_kinds! {
    Invalid => "Invalid",
    Unexposed => "Unexposed",
    Void => "Void",
    Bool => "Bool",
    CharU => "Char_U",
    UChar => "UChar",
    Char16 => "Char16",
    Char32 => "Char32",
    UShort => "UShort",
    UInt => "UInt",
    ULong => "ULong",
    ULongLong => "ULongLong",
    CharS => "Char_S",
    SChar => "SChar",
    WChar => "WChar",
    Short => "Short",
    Int => "Int",
    Long => "Long",
    LongLong => "LongLong",
    Float => "Float",
    Double => "Double",
    LongDouble => "LongDouble",
    ShortAccum => "ShortAccum",
    Accum => "Accum",
    LongAccum => "LongAccum",
    UShortAccum => "UShortAccum",
    UAccum => "UAccum",
    ULongAccum => "ULongAccum",
    NullPtr => "NullPtr",
    Pointer => "Pointer",
    LValueReference => "LValueReference",
    RValueReference => "RValueReference",
    Record => "Record",
    Enum => "Enum",
    Typedef => "Typedef",
    FunctionProto => "FunctionProto",
    FunctionNoProto => "FunctionNoProto",
    ConstantArray => "ConstantArray",
    IncompleteArray => "IncompleteArray",
    Auto => "Auto",
}

impl TypeKind {
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            TypeKind::Void
                | TypeKind::Bool
                | TypeKind::CharU
                | TypeKind::UChar
                | TypeKind::Char16
                | TypeKind::Char32
                | TypeKind::UShort
                | TypeKind::UInt
                | TypeKind::ULong
                | TypeKind::ULongLong
                | TypeKind::CharS
                | TypeKind::SChar
                | TypeKind::WChar
                | TypeKind::Short
                | TypeKind::Int
                | TypeKind::Long
                | TypeKind::LongLong
                | TypeKind::Float
                | TypeKind::Double
                | TypeKind::LongDouble
                | TypeKind::ShortAccum
                | TypeKind::Accum
                | TypeKind::LongAccum
                | TypeKind::UShortAccum
                | TypeKind::UAccum
                | TypeKind::ULongAccum
                | TypeKind::NullPtr
        )
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeKind::LValueReference | TypeKind::RValueReference)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, TypeKind::FunctionProto | TypeKind::FunctionNoProto)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeKind::ConstantArray | TypeKind::IncompleteArray)
    }
}

/// Reference qualifier of a member function type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefQualifier {
    #[default]
    None,
    LValue,
    RValue,
}

/// A type as seen by queries
///
/// `element` is the pointee for pointers and references and the element type
/// for arrays; `result` and `params` describe function types; `declaration`
/// links records, enums and typedefs back to the cursor that declares them.
/// `spelling` is always the full clang spelling, qualifiers included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CxType {
    pub kind: TypeKind,
    pub spelling: String,
    /// Unqualified name of a named type; empty for compound types
    pub name: String,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
    pub is_pod: bool,
    pub ref_qualifier: RefQualifier,
    pub element: Option<Box<CxType>>,
    /// Written bound of an array type
    pub bound: Option<String>,
    pub result: Option<Box<CxType>>,
    pub params: Vec<CxType>,
    pub is_variadic: bool,
    pub declaration: Option<NodeId>,
    /// Underlying type for typedefs and deduced `auto`
    pub underlying: Option<Box<CxType>>,
}

impl CxType {
    pub fn invalid() -> Self {
        CxType::default()
    }

    /// A named type: builtin, record, enum, typedef or unexposed
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        let mut ty = CxType {
            kind,
            name: name.into(),
            is_pod: (kind.is_builtin() && kind != TypeKind::Void) || kind == TypeKind::Enum,
            ..CxType::default()
        };
        ty.respell();
        ty
    }

    pub fn builtin(kind: TypeKind, name: impl Into<String>) -> Self {
        Self::named(kind, name)
    }

    pub fn pointer_to(element: CxType) -> Self {
        let mut ty = CxType {
            kind: TypeKind::Pointer,
            is_pod: true,
            element: Some(Box::new(element)),
            ..CxType::default()
        };
        ty.respell();
        ty
    }

    pub fn reference_to(element: CxType, rvalue: bool) -> Self {
        let kind = if rvalue {
            TypeKind::RValueReference
        } else {
            TypeKind::LValueReference
        };
        let mut ty = CxType {
            kind,
            element: Some(Box::new(element)),
            ..CxType::default()
        };
        ty.respell();
        ty
    }

    pub fn array_of(element: CxType, bound: Option<String>) -> Self {
        let kind = if bound.is_some() {
            TypeKind::ConstantArray
        } else {
            TypeKind::IncompleteArray
        };
        let mut ty = CxType {
            kind,
            is_pod: element.is_pod,
            element: Some(Box::new(element)),
            bound,
            ..CxType::default()
        };
        ty.respell();
        ty
    }

    pub fn function(result: CxType, params: Vec<CxType>, is_variadic: bool, prototyped: bool) -> Self {
        let kind = if prototyped {
            TypeKind::FunctionProto
        } else {
            TypeKind::FunctionNoProto
        };
        let mut ty = CxType {
            kind,
            result: Some(Box::new(result)),
            params,
            is_variadic,
            ..CxType::default()
        };
        ty.respell();
        ty
    }

    /// Add cv-qualifiers and recompute the spelling
    pub fn with_qualifiers(mut self, is_const: bool, is_volatile: bool, is_restrict: bool) -> Self {
        self.is_const |= is_const;
        self.is_volatile |= is_volatile;
        self.is_restrict |= is_restrict;
        self.respell();
        self
    }

    pub fn is_valid(&self) -> bool {
        self.kind != TypeKind::Invalid
    }

    /// Pointee of a pointer or reference
    pub fn pointee(&self) -> Option<&CxType> {
        if self.kind == TypeKind::Pointer || self.kind.is_reference() {
            self.element.as_deref()
        } else {
            None
        }
    }

    /// The referred-to type for references, the type itself otherwise
    pub fn non_reference(self) -> CxType {
        match self.element {
            Some(element) if self.kind.is_reference() => *element,
            _ => self,
        }
    }

    /// Strip typedefs and deduced `auto` at every level
    pub fn canonical(&self) -> CxType {
        let mut ty = match self.kind {
            TypeKind::Typedef | TypeKind::Auto => {
                return match &self.underlying {
                    Some(under) => under.canonical().with_qualifiers(
                        self.is_const,
                        self.is_volatile,
                        self.is_restrict,
                    ),
                    None => self.clone(),
                };
            }
            _ => self.clone(),
        };
        ty.element = self.element.as_ref().map(|e| Box::new(e.canonical()));
        ty.result = self.result.as_ref().map(|r| Box::new(r.canonical()));
        ty.params = self.params.iter().map(CxType::canonical).collect();
        ty.respell();
        ty
    }

    pub fn respell(&mut self) {
        self.spelling = self.print("");
    }

    /// Clang's declarator-style type printer: `inner` is what has been
    /// printed for the enclosing declarators so far
    fn print(&self, inner: &str) -> String {
        let cv = cv_words(self.is_const, self.is_volatile, self.is_restrict);
        match self.kind {
            TypeKind::Pointer | TypeKind::LValueReference | TypeKind::RValueReference => {
                let mut out = match self.kind {
                    TypeKind::Pointer => String::from("*"),
                    TypeKind::LValueReference => String::from("&"),
                    _ => String::from("&&"),
                };
                out.push_str(&cv);
                if !inner.is_empty() {
                    if !cv.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(inner);
                }
                match &self.element {
                    Some(el) if el.kind.is_function() || el.kind.is_array() => {
                        el.print(&format!("({})", out))
                    }
                    Some(el) => el.print(&out),
                    None => out,
                }
            }
            TypeKind::ConstantArray | TypeKind::IncompleteArray => {
                let out = format!("{}[{}]", inner, self.bound.as_deref().unwrap_or(""));
                match &self.element {
                    Some(el) => el.print(&out),
                    None => out,
                }
            }
            TypeKind::FunctionProto | TypeKind::FunctionNoProto => {
                let mut params: Vec<&str> = self.params.iter().map(|p| p.spelling.as_str()).collect();
                if self.is_variadic {
                    params.push("...");
                }
                let mut out = format!("{}({})", inner, params.join(", "));
                if !cv.is_empty() {
                    out.push(' ');
                    out.push_str(&cv);
                }
                match self.ref_qualifier {
                    RefQualifier::LValue => out.push_str(" &"),
                    RefQualifier::RValue => out.push_str(" &&"),
                    RefQualifier::None => {}
                }
                match &self.result {
                    Some(result) => result.print(&out),
                    None => out,
                }
            }
            _ => {
                let base = qualify(&self.name, self.is_const, self.is_volatile);
                if inner.is_empty() {
                    base
                } else {
                    format!("{} {}", base, inner)
                }
            }
        }
    }
}

fn cv_words(is_const: bool, is_volatile: bool, is_restrict: bool) -> String {
    let mut words = Vec::new();
    if is_const {
        words.push("const");
    }
    if is_volatile {
        words.push("volatile");
    }
    if is_restrict {
        words.push("__restrict");
    }
    words.join(" ")
}

/// Prefix a base spelling with cv-qualifiers in clang's order
pub fn qualify(spelling: &str, is_const: bool, is_volatile: bool) -> String {
    let mut out = String::new();
    if is_const {
        out.push_str("const ");
    }
    if is_volatile {
        out.push_str("volatile ");
    }
    out.push_str(spelling);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // LanguageId Tests
    // =========================================================================

    #[test]
    fn test_language_from_extension() {
        assert_eq!(LanguageId::from_extension("c"), LanguageId::C);
        assert_eq!(LanguageId::from_extension("cpp"), LanguageId::Cpp);
        assert_eq!(LanguageId::from_extension("HPP"), LanguageId::Cpp);
        assert_eq!(LanguageId::from_extension("h"), LanguageId::Cpp);
        assert_eq!(LanguageId::from_extension("rs"), LanguageId::Unknown);
    }

    #[test]
    fn test_language_from_flag() {
        assert_eq!(LanguageId::from_flag("c"), LanguageId::C);
        assert_eq!(LanguageId::from_flag("c++"), LanguageId::Cpp);
        assert_eq!(LanguageId::from_flag("objective-c"), LanguageId::Unknown);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(LanguageId::from_path(Path::new("a/b.cc")), LanguageId::Cpp);
        assert_eq!(LanguageId::from_path(Path::new("Makefile")), LanguageId::Unknown);
    }

    // =========================================================================
    // NodeId Tests
    // =========================================================================

    #[test]
    fn test_null_node() {
        assert!(NodeId::NULL.is_null());
        assert!(!NodeId::new(0).is_null());
        assert_eq!(NodeId::new(7).index(), 7);
    }

    // =========================================================================
    // CursorKind Tests
    // =========================================================================

    #[test]
    fn test_kind_spellings() {
        assert_eq!(CursorKind::FunctionDecl.spelling(), "FunctionDecl");
        assert_eq!(CursorKind::Constructor.spelling(), "CXXConstructor");
        assert_eq!(CursorKind::InclusionDirective.spelling(), "inclusion directive");
        assert_eq!(CursorKind::CXXOverrideAttr.to_string(), "attribute(override)");
    }

    #[test]
    fn test_kind_classes() {
        assert_eq!(CursorKind::Namespace.class(), KindClass::Declaration);
        assert_eq!(CursorKind::TypeRef.class(), KindClass::Reference);
        assert_eq!(CursorKind::CallExpr.class(), KindClass::Expression);
        assert_eq!(CursorKind::CompoundStmt.class(), KindClass::Statement);
        assert_eq!(CursorKind::MacroDefinition.class(), KindClass::Preprocessing);
        assert_eq!(CursorKind::InvalidFile.class(), KindClass::Invalid);
        assert_eq!(KindClass::Invalid.name(), "");
    }

    #[test]
    fn test_kind_groups() {
        assert!(CursorKind::Destructor.is_function());
        assert!(!CursorKind::LambdaExpr.is_function());
        assert!(CursorKind::ClassTemplate.is_class());
        assert!(CursorKind::StringLiteral.is_literal());
        assert!(CursorKind::FixedPointLiteral.is_literal());
        assert!(!CursorKind::CXXBoolLiteralExpr.is_literal());
        assert!(CursorKind::TypedefDecl.is_type_declaration());
    }

    // =========================================================================
    // Semantic Property Tests
    // =========================================================================

    #[test]
    fn test_linkage_spelling() {
        assert_eq!(Linkage::Invalid.spelling(), "");
        assert_eq!(Linkage::NoLinkage.spelling(), "Nolinkage");
        assert_eq!(Linkage::UniqueExternal.spelling(), "UniqueExternal");
    }

    #[test]
    fn test_access_keyword() {
        assert_eq!(AccessSpecifier::from_keyword("public"), AccessSpecifier::Public);
        assert_eq!(AccessSpecifier::from_keyword(" private "), AccessSpecifier::Private);
        assert_eq!(AccessSpecifier::from_keyword("friend"), AccessSpecifier::Invalid);
        assert_eq!(AccessSpecifier::Invalid.spelling(), None);
    }

    // =========================================================================
    // Type Tests
    // =========================================================================

    #[test]
    fn test_builtin_type() {
        let int = CxType::builtin(TypeKind::Int, "int");
        assert!(int.is_valid());
        assert!(int.is_pod);
        assert!(!CxType::builtin(TypeKind::Void, "void").is_pod);
        assert!(!CxType::invalid().is_valid());
    }

    #[test]
    fn test_qualified_spelling() {
        let ty = CxType::builtin(TypeKind::Int, "int").with_qualifiers(true, false, false);
        assert_eq!(ty.spelling, "const int");
        assert_eq!(ty.name, "int");
        assert_eq!(qualify("char", true, true), "const volatile char");
    }

    #[test]
    fn test_declarator_spellings() {
        let int = CxType::builtin(TypeKind::Int, "int");
        let char_ty = CxType::builtin(TypeKind::CharS, "char");

        assert_eq!(CxType::pointer_to(int.clone()).spelling, "int *");
        assert_eq!(
            CxType::pointer_to(int.clone()).with_qualifiers(true, false, false).spelling,
            "int *const"
        );
        assert_eq!(
            CxType::pointer_to(CxType::pointer_to(char_ty.clone())).spelling,
            "char **"
        );
        assert_eq!(
            CxType::reference_to(int.clone().with_qualifiers(true, false, false), false).spelling,
            "const int &"
        );
        assert_eq!(CxType::reference_to(int.clone(), true).spelling, "int &&");
        assert_eq!(
            CxType::array_of(CxType::pointer_to(int.clone()), Some("3".into())).spelling,
            "int *[3]"
        );
        assert_eq!(
            CxType::pointer_to(CxType::array_of(int.clone(), Some("3".into()))).spelling,
            "int (*)[3]"
        );
    }

    #[test]
    fn test_function_spellings() {
        let int = CxType::builtin(TypeKind::Int, "int");
        let char_ty = CxType::builtin(TypeKind::CharS, "char");
        let f = CxType::function(int.clone(), vec![int.clone(), char_ty.clone()], false, true);
        assert_eq!(f.spelling, "int (int, char)");
        assert_eq!(CxType::pointer_to(f).spelling, "int (*)(int, char)");

        let printf = CxType::function(
            int.clone(),
            vec![CxType::pointer_to(char_ty.with_qualifiers(true, false, false))],
            true,
            true,
        );
        assert_eq!(printf.spelling, "int (const char *, ...)");

        let getter = CxType::function(int, Vec::new(), false, true).with_qualifiers(true, false, false);
        assert_eq!(getter.spelling, "int () const");
    }

    #[test]
    fn test_canonical_strips_typedefs() {
        let mut size = CxType::named(TypeKind::Typedef, "size_t");
        size.underlying = Some(Box::new(CxType::builtin(TypeKind::ULong, "unsigned long")));
        let ptr = CxType::pointer_to(size.with_qualifiers(true, false, false));
        assert_eq!(ptr.spelling, "const size_t *");
        assert_eq!(ptr.canonical().spelling, "const unsigned long *");
    }

    #[test]
    fn test_non_reference() {
        let int = CxType::builtin(TypeKind::Int, "int");
        let r = CxType::reference_to(int.clone(), false);
        assert_eq!(r.pointee(), Some(&int));
        assert_eq!(r.non_reference(), int);
    }

    #[test]
    fn test_type_kind_spellings() {
        assert_eq!(TypeKind::CharS.spelling(), "Char_S");
        assert_eq!(TypeKind::LValueReference.spelling(), "LValueReference");
        assert!(TypeKind::NullPtr.is_builtin());
        assert!(TypeKind::ConstantArray.is_array());
    }
}
