use std::fmt::{Display, Error, Formatter};

use AttributeContext::*;

/// Where in the source an attribute is being declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeContext {
    File,
    TemplateCreate,
    TemplateAmend,
    FrameCreate,
    FrameInstantiate,
    FunctionArgument,
    FunctionParameter,
}

impl AttributeContext {
    pub const ALL: [AttributeContext; 7] = [
        AttributeContext::File,
        AttributeContext::TemplateCreate,
        AttributeContext::TemplateAmend,
        AttributeContext::FrameCreate,
        AttributeContext::FrameInstantiate,
        AttributeContext::FunctionArgument,
        AttributeContext::FunctionParameter,
    ];

    pub fn description(self) -> &'static str {
        match self {
            AttributeContext::File => "file",
            AttributeContext::TemplateCreate => "template creation",
            AttributeContext::TemplateAmend => "template amendment",
            AttributeContext::FrameCreate => "literal frame",
            AttributeContext::FrameInstantiate => "frame instantiation",
            AttributeContext::FunctionArgument => "function-like template argument",
            AttributeContext::FunctionParameter => "function-like template parameter",
        }
    }

    /// Keyword used for the context immediate in the text format.
    pub fn keyword(self) -> &'static str {
        match self {
            AttributeContext::File => "file",
            AttributeContext::TemplateCreate => "template.create",
            AttributeContext::TemplateAmend => "template.amend",
            AttributeContext::FrameCreate => "frame.create",
            AttributeContext::FrameInstantiate => "frame.instantiate",
            AttributeContext::FunctionArgument => "function.argument",
            AttributeContext::FunctionParameter => "function.parameter",
        }
    }
}

impl Display for AttributeContext {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.description())
    }
}

/// The kind of attribute declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeFlavour {
    Definition,
    Drop,
    Now,
    Override,
    Required,
    Used,
}

impl AttributeFlavour {
    pub const ALL: [AttributeFlavour; 6] = [
        AttributeFlavour::Definition,
        AttributeFlavour::Drop,
        AttributeFlavour::Now,
        AttributeFlavour::Override,
        AttributeFlavour::Required,
        AttributeFlavour::Used,
    ];

    pub fn description(self) -> &'static str {
        match self {
            AttributeFlavour::Definition => "attribute declaration",
            AttributeFlavour::Drop => "drop attribute declaration",
            AttributeFlavour::Now => "eagerly evaluated attribute declaration",
            AttributeFlavour::Override => "attribute override",
            AttributeFlavour::Required => "required attribute",
            AttributeFlavour::Used => "used attribute",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AttributeFlavour::Definition | AttributeFlavour::Now => "d",
            AttributeFlavour::Drop => "x",
            AttributeFlavour::Override => "o",
            AttributeFlavour::Required => "r",
            AttributeFlavour::Used => "u",
        }
    }

    /// The contexts in which this flavour may appear. The table is not derivable
    /// from anything else; `Now` is the only flavour allowed in function-like
    /// templates and `Definition` the only one allowed in a file.
    pub fn allowed_contexts(self) -> &'static [AttributeContext] {
        match self {
            AttributeFlavour::Definition => &[
                TemplateCreate,
                TemplateAmend,
                FrameCreate,
                FrameInstantiate,
                File,
            ],
            AttributeFlavour::Drop => &[TemplateAmend, FrameInstantiate],
            AttributeFlavour::Now => &[
                TemplateCreate,
                TemplateAmend,
                FrameCreate,
                FrameInstantiate,
                FunctionArgument,
                FunctionParameter,
            ],
            AttributeFlavour::Override => &[TemplateAmend, FrameInstantiate],
            AttributeFlavour::Required => &[TemplateAmend, TemplateCreate],
            AttributeFlavour::Used => &[TemplateAmend, TemplateCreate],
        }
    }

    pub fn allowed(self, context: AttributeContext) -> bool {
        self.allowed_contexts().contains(&context)
    }
}

impl Display for AttributeFlavour {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn legality_matrix() {
        use AttributeFlavour as F;
        let expected: &[(AttributeFlavour, [bool; 7])] = &[
            // file, t.create, t.amend, f.create, f.inst, fn.arg, fn.param
            (F::Definition, [true, true, true, true, true, false, false]),
            (F::Drop, [false, false, true, false, true, false, false]),
            (F::Now, [false, true, true, true, true, true, true]),
            (F::Override, [false, false, true, false, true, false, false]),
            (F::Required, [false, true, true, false, false, false, false]),
            (F::Used, [false, true, true, false, false, false, false]),
        ];
        assert_eq!(expected.len(), AttributeFlavour::ALL.len());
        for (flavour, row) in expected {
            for (context, legal) in AttributeContext::ALL.iter().zip(row) {
                assert_eq!(
                    flavour.allowed(*context),
                    *legal,
                    "{:?} in {:?}",
                    flavour,
                    context
                );
            }
        }
    }

    #[test]
    fn drop_only_when_amending() {
        let contexts: Vec<_> = AttributeContext::ALL
            .into_iter()
            .filter(|c| AttributeFlavour::Drop.allowed(*c))
            .collect();
        assert_eq!(
            contexts,
            [
                AttributeContext::TemplateAmend,
                AttributeContext::FrameInstantiate
            ]
        );
    }
}
