use paste::paste;

use super::RuntimeType;

macro_rules! dispatch_trait {
    ($($tag:ident => $name:ident),*) => {
        paste! {
            /// The arms of a `br.a` branch, one optional arm per runtime type.
            ///
            /// Each arm jumps to a block whose parameters are the arm's captures
            /// followed by the unboxed value (nothing is appended for `Null`).
            pub trait Dispatch {
                type Block;
                type Value;

                fn arm(&mut self, tag: RuntimeType, target: &Self::Block, captures: &[Self::Value]);

                $(
                    #[doc = concat!("Register the arm taken for a boxed `", stringify!($tag), "`.")]
                    fn [<dispatch_ $name>](
                        &mut self,
                        target: &Self::Block,
                        captures: &[Self::Value],
                    ) {
                        self.arm(RuntimeType::$tag, target, captures)
                    }
                )*
            }
        }
    };
}

dispatch_trait!(
    Bin => bin,
    Bool => bool,
    Float => float,
    Frame => frame,
    Int => int,
    LookupHandler => lookup_handler,
    Null => null,
    Str => str,
    Template => template
);
