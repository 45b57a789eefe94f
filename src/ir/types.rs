use std::fmt::{Display, Error, Formatter};

use crate::Name;

/// The tag carried by every value produced in the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IrType {
    Any,
    Bin,
    Context,
    Definition,
    Fricassee,
    Grouper,
    Zipper,
    Float,
    Int,
    Collector,
    LookupHandler,
    Accumulator,
    Name,
    Override,
    Frame,
    Str,
    Template,
    Distributor,
    Window,
    Builder,
    Bool,
}

impl IrType {
    pub const ALL: [IrType; 21] = [
        IrType::Any,
        IrType::Bin,
        IrType::Context,
        IrType::Definition,
        IrType::Fricassee,
        IrType::Grouper,
        IrType::Zipper,
        IrType::Float,
        IrType::Int,
        IrType::Collector,
        IrType::LookupHandler,
        IrType::Accumulator,
        IrType::Name,
        IrType::Override,
        IrType::Frame,
        IrType::Str,
        IrType::Template,
        IrType::Distributor,
        IrType::Window,
        IrType::Builder,
        IrType::Bool,
    ];

    /// Single-letter code used in mnemonics and the text format.
    pub fn letter(self) -> char {
        match self {
            IrType::Any => 'a',
            IrType::Bin => 'b',
            IrType::Context => 'c',
            IrType::Definition => 'd',
            IrType::Fricassee => 'e',
            IrType::Grouper => 'g',
            IrType::Zipper => 'p',
            IrType::Float => 'f',
            IrType::Int => 'i',
            IrType::Collector => 'k',
            IrType::LookupHandler => 'l',
            IrType::Accumulator => 'm',
            IrType::Name => 'n',
            IrType::Override => 'o',
            IrType::Frame => 'r',
            IrType::Str => 's',
            IrType::Template => 't',
            IrType::Distributor => 'u',
            IrType::Window => 'w',
            IrType::Builder => 'x',
            IrType::Bool => 'z',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            IrType::Any => "any",
            IrType::Bin => "bin",
            IrType::Context => "context",
            IrType::Definition => "definition",
            IrType::Fricassee => "fricassée chain",
            IrType::Grouper => "grouper",
            IrType::Zipper => "zipper",
            IrType::Float => "float",
            IrType::Int => "int",
            IrType::Collector => "collector",
            IrType::LookupHandler => "lookup handler",
            IrType::Accumulator => "accumulator",
            IrType::Name => "name",
            IrType::Override => "override",
            IrType::Frame => "frame",
            IrType::Str => "str",
            IrType::Template => "template",
            IrType::Distributor => "distributor",
            IrType::Window => "window",
            IrType::Builder => "attribute builder",
            IrType::Bool => "bool",
        }
    }
}

impl Display for IrType {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.description())
    }
}

/// The tag a boxed `any` value can have at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuntimeType {
    Bin,
    Bool,
    Float,
    Frame,
    Int,
    LookupHandler,
    Null,
    Str,
    Template,
}

impl RuntimeType {
    pub const ALL: [RuntimeType; 9] = [
        RuntimeType::Bin,
        RuntimeType::Bool,
        RuntimeType::Float,
        RuntimeType::Frame,
        RuntimeType::Int,
        RuntimeType::LookupHandler,
        RuntimeType::Null,
        RuntimeType::Str,
        RuntimeType::Template,
    ];

    /// The IR tag of the unboxed payload; `Null` has none.
    pub fn ir_type(self) -> Option<IrType> {
        match self {
            RuntimeType::Bin => Some(IrType::Bin),
            RuntimeType::Bool => Some(IrType::Bool),
            RuntimeType::Float => Some(IrType::Float),
            RuntimeType::Frame => Some(IrType::Frame),
            RuntimeType::Int => Some(IrType::Int),
            RuntimeType::LookupHandler => Some(IrType::LookupHandler),
            RuntimeType::Null => None,
            RuntimeType::Str => Some(IrType::Str),
            RuntimeType::Template => Some(IrType::Template),
        }
    }

    /// Name used in user-facing error messages.
    pub fn pretty_name(self) -> &'static str {
        match self {
            RuntimeType::Bin => "Bin",
            RuntimeType::Bool => "Bool",
            RuntimeType::Float => "Float",
            RuntimeType::Frame => "Frame",
            RuntimeType::Int => "Int",
            RuntimeType::LookupHandler => "LookupHandler",
            RuntimeType::Null => "Null",
            RuntimeType::Str => "Str",
            RuntimeType::Template => "Template",
        }
    }

    /// Name of the attribute that holds this type in the language's type-check frames.
    pub fn attribute_name(self) -> Name {
        match self {
            RuntimeType::Bin => name_atom!("bin"),
            RuntimeType::Bool => name_atom!("bool"),
            RuntimeType::Float => name_atom!("float"),
            RuntimeType::Frame => name_atom!("frame"),
            RuntimeType::Int => name_atom!("int"),
            RuntimeType::LookupHandler => name_atom!("lookup_handler"),
            RuntimeType::Null => name_atom!("null"),
            RuntimeType::Str => name_atom!("str"),
            RuntimeType::Template => name_atom!("template"),
        }
    }

    /// Code used in the text format; `Null` has no IR tag and prints as `-`.
    pub fn letter(self) -> char {
        self.ir_type().map_or('-', IrType::letter)
    }
}

impl Display for RuntimeType {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.pretty_name())
    }
}

/// What a function hands back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// A single boxed value.
    Any,
    /// A boxed value plus the attribute builders to add to the accumulated frame.
    Accumulator,
    /// A lazy pipeline chain.
    Fricassee,
}

impl ResultType {
    /// Tag of the value passed to `ret`.
    pub fn return_type(self) -> IrType {
        match self {
            ResultType::Any | ResultType::Accumulator => IrType::Any,
            ResultType::Fricassee => IrType::Fricassee,
        }
    }
}
