use lazy_static::lazy_static;

use super::components::SchemaComponentTable;
use super::simple_type_def::SimpleTypeDefinition;
use super::xstypes::QName;
use super::TypeDefinition;

// Namespaces used by the specification (pt. 1, §1.3.1)
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

lazy_static! {
    /// The `xs:anyType` qualified name
    pub static ref XS_ANY_TYPE_NAME: QName = QName::with_namespace(XS_NAMESPACE, "anyType");
    /// The `xs:anySimpleType` qualified name
    pub static ref XS_ANY_SIMPLE_TYPE_NAME: QName = QName::with_namespace(XS_NAMESPACE, "anySimpleType");
    pub static ref XS_STRING_NAME: QName = QName::with_namespace(XS_NAMESPACE, "string");
}

/// Storage width of an integer-derived built-in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntegerWidth {
    /// Fits 16 bits (`short`, `byte`, `unsignedByte`)
    Small,
    /// Fits 32 bits (`int`, `unsignedShort`)
    Regular,
    /// Fits 64 bits (`long`, `unsignedInt`)
    Big,
    /// `integer` and its unbounded derivations
    Unbounded,
}

/// Coarse value-space classification of a built-in, used when choosing a storage type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    String,
    Decimal,
    Integer(IntegerWidth),
    Float,
    Double,
    Boolean,
    Date,
    DateTime,
    Time,
    /// Durations, Gregorian fragments, `anyType`, list built-ins and everything else with no
    /// direct counterpart.
    Other,
}

macro_rules! builtin_types {
    ($($variant:ident => $local_name:literal : $family:expr,)*) => {
        /// The built-in datatypes of XSD 1.1 part 2 that are recognized by name.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum BuiltinType {
            $($variant,)*
        }

        impl BuiltinType {
            pub const ALL: &'static [BuiltinType] = &[$(BuiltinType::$variant,)*];

            pub fn from_local_name(name: &str) -> Option<Self> {
                match name {
                    $($local_name => Some(BuiltinType::$variant),)*
                    _ => None,
                }
            }

            pub fn local_name(self) -> &'static str {
                match self {
                    $(BuiltinType::$variant => $local_name,)*
                }
            }

            pub fn family(self) -> TypeFamily {
                match self {
                    $(BuiltinType::$variant => $family,)*
                }
            }
        }
    };
}

builtin_types! {
    AnyType => "anyType": TypeFamily::Other,
    AnySimpleType => "anySimpleType": TypeFamily::Other,
    AnyAtomicType => "anyAtomicType": TypeFamily::Other,
    String => "string": TypeFamily::String,
    NormalizedString => "normalizedString": TypeFamily::String,
    Token => "token": TypeFamily::String,
    Language => "language": TypeFamily::String,
    Name => "Name": TypeFamily::String,
    NCName => "NCName": TypeFamily::String,
    Id => "ID": TypeFamily::String,
    IdRef => "IDREF": TypeFamily::String,
    IdRefs => "IDREFS": TypeFamily::Other,
    Entity => "ENTITY": TypeFamily::String,
    Entities => "ENTITIES": TypeFamily::Other,
    NmToken => "NMTOKEN": TypeFamily::String,
    NmTokens => "NMTOKENS": TypeFamily::Other,
    AnyUri => "anyURI": TypeFamily::String,
    QName => "QName": TypeFamily::String,
    Notation => "NOTATION": TypeFamily::String,
    Base64Binary => "base64Binary": TypeFamily::String,
    HexBinary => "hexBinary": TypeFamily::String,
    Boolean => "boolean": TypeFamily::Boolean,
    Decimal => "decimal": TypeFamily::Decimal,
    Integer => "integer": TypeFamily::Integer(IntegerWidth::Unbounded),
    NonPositiveInteger => "nonPositiveInteger": TypeFamily::Integer(IntegerWidth::Unbounded),
    NegativeInteger => "negativeInteger": TypeFamily::Integer(IntegerWidth::Unbounded),
    NonNegativeInteger => "nonNegativeInteger": TypeFamily::Integer(IntegerWidth::Unbounded),
    PositiveInteger => "positiveInteger": TypeFamily::Integer(IntegerWidth::Unbounded),
    Long => "long": TypeFamily::Integer(IntegerWidth::Big),
    Int => "int": TypeFamily::Integer(IntegerWidth::Regular),
    Short => "short": TypeFamily::Integer(IntegerWidth::Small),
    Byte => "byte": TypeFamily::Integer(IntegerWidth::Small),
    UnsignedLong => "unsignedLong": TypeFamily::Integer(IntegerWidth::Unbounded),
    UnsignedInt => "unsignedInt": TypeFamily::Integer(IntegerWidth::Big),
    UnsignedShort => "unsignedShort": TypeFamily::Integer(IntegerWidth::Regular),
    UnsignedByte => "unsignedByte": TypeFamily::Integer(IntegerWidth::Small),
    Float => "float": TypeFamily::Float,
    Double => "double": TypeFamily::Double,
    Date => "date": TypeFamily::Date,
    DateTime => "dateTime": TypeFamily::DateTime,
    DateTimeStamp => "dateTimeStamp": TypeFamily::DateTime,
    Time => "time": TypeFamily::Time,
    Duration => "duration": TypeFamily::Other,
    YearMonthDuration => "yearMonthDuration": TypeFamily::Other,
    DayTimeDuration => "dayTimeDuration": TypeFamily::Other,
    GYear => "gYear": TypeFamily::Other,
    GYearMonth => "gYearMonth": TypeFamily::Other,
    GMonth => "gMonth": TypeFamily::Other,
    GMonthDay => "gMonthDay": TypeFamily::Other,
    GDay => "gDay": TypeFamily::Other,
}

impl BuiltinType {
    pub fn name(self) -> QName {
        QName::with_namespace(XS_NAMESPACE, self.local_name())
    }

    /// Maps a qualified name in the XML Schema namespace to its built-in.
    pub fn from_name(name: &QName) -> Option<Self> {
        if name.is_in_namespace(XS_NAMESPACE) {
            Self::from_local_name(&name.local_name)
        } else {
            None
        }
    }
}

/// Registers every [`BuiltinType`] under its `xs:` name.
pub(super) fn register_builtins(table: &mut SchemaComponentTable) {
    for &builtin in BuiltinType::ALL {
        table.insert_builtin(
            builtin.name(),
            TypeDefinition::Simple(SimpleTypeDefinition::builtin(builtin)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_follow_value_space() {
        assert_eq!(BuiltinType::Int.family(), TypeFamily::Integer(IntegerWidth::Regular));
        assert_eq!(BuiltinType::Long.family(), TypeFamily::Integer(IntegerWidth::Big));
        assert_eq!(
            BuiltinType::NonNegativeInteger.family(),
            TypeFamily::Integer(IntegerWidth::Unbounded)
        );
        assert_eq!(BuiltinType::Token.family(), TypeFamily::String);
        assert_eq!(BuiltinType::GYear.family(), TypeFamily::Other);
    }

    #[test]
    fn lookup_requires_xs_namespace() {
        assert_eq!(
            BuiltinType::from_name(&QName::with_namespace(XS_NAMESPACE, "dateTime")),
            Some(BuiltinType::DateTime)
        );
        assert_eq!(BuiltinType::from_name(&QName::local("dateTime")), None);
        assert_eq!(BuiltinType::from_local_name("ID"), Some(BuiltinType::Id));
    }
}
