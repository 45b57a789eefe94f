//! The closed KWS instruction set.
//!
//! Every instruction is one row of the `instruction_set!` table below: builder
//! method, opcode variant, mnemonic, operand slots and result tag. The table
//! generates the [`Op`] enum and the [`Instructions`] extension trait, so every
//! backend sees exactly the same `(opcode, operands)` pairs through
//! [`Block::emit`] and [`Block::effect`].

use std::fmt::{Display, Error, Formatter};

use super::{AttributeContext, AttributeFlavour, Block, IrType, RuntimeType};
use crate::Name;

/// The shape of one operand position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    One(IrType),
    Many(IrType),
    Int,
    Float,
    Str,
    Names,
    Types,
    Context,
}

/// An operand supplied for a [`Slot`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<V> {
    One(V),
    Many(Vec<V>),
    Int(i64),
    Float(f64),
    Str(String),
    Names(Vec<Name>),
    Types(Vec<RuntimeType>),
    Context(AttributeContext),
}

impl<V> Arg<V> {
    /// The IR values referenced by this operand, if any.
    pub fn values(&self) -> &[V] {
        match self {
            Arg::One(value) => std::slice::from_ref(value),
            Arg::Many(values) => values,
            _ => &[],
        }
    }

    pub fn fits(&self, slot: Slot) -> bool {
        matches!(
            (self, slot),
            (Arg::One(_), Slot::One(_))
                | (Arg::Many(_), Slot::Many(_))
                | (Arg::Int(_), Slot::Int)
                | (Arg::Float(_), Slot::Float)
                | (Arg::Str(_), Slot::Str)
                | (Arg::Names(_), Slot::Names)
                | (Arg::Types(_), Slot::Types)
                | (Arg::Context(_), Slot::Context)
        )
    }
}

macro_rules! slot {
    ([$tag:ident]) => {
        Slot::Many(IrType::$tag)
    };
    (i64) => {
        Slot::Int
    };
    (f64) => {
        Slot::Float
    };
    (str) => {
        Slot::Str
    };
    (names) => {
        Slot::Names
    };
    (types) => {
        Slot::Types
    };
    (context) => {
        Slot::Context
    };
    ($tag:ident) => {
        Slot::One(IrType::$tag)
    };
}

macro_rules! arg_type {
    ($value:ty, [$tag:ident]) => { &[$value] };
    ($value:ty, i64) => { i64 };
    ($value:ty, f64) => { f64 };
    ($value:ty, str) => { &str };
    ($value:ty, names) => { &[&str] };
    ($value:ty, types) => { &[RuntimeType] };
    ($value:ty, context) => { AttributeContext };
    ($value:ty, $tag:ident) => { &$value };
}

macro_rules! operand {
    ([$tag:ident], $arg:ident) => {
        Arg::Many($arg.to_vec())
    };
    (i64, $arg:ident) => {
        Arg::Int($arg)
    };
    (f64, $arg:ident) => {
        Arg::Float($arg)
    };
    (str, $arg:ident) => {
        Arg::Str($arg.to_owned())
    };
    (names, $arg:ident) => {
        Arg::Names($arg.iter().map(|name| Name::from(*name)).collect())
    };
    (types, $arg:ident) => {
        Arg::Types($arg.to_vec())
    };
    (context, $arg:ident) => {
        Arg::Context($arg)
    };
    ($tag:ident, $arg:ident) => {
        Arg::One($arg.clone())
    };
}

macro_rules! instruction_set {
    (
        values {
            $(
                $(#[$meta:meta])*
                $method:ident => $variant:ident $mnemonic:literal
                    ($($arg:ident : $kind:tt),*) -> $result:ident;
            )*
        }
        effects {
            $(
                $(#[$emeta:meta])*
                $emethod:ident => $evariant:ident $emnemonic:literal
                    ($($earg:ident : $ekind:tt),*);
            )*
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Op {
            $($variant,)*
            $($evariant,)*
        }

        impl Op {
            pub const ALL: &'static [Op] = &[$(Op::$variant,)* $(Op::$evariant,)*];

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Op::$variant => $mnemonic,)*
                    $(Op::$evariant => $emnemonic,)*
                }
            }

            pub fn operands(self) -> &'static [Slot] {
                match self {
                    $(Op::$variant => &[$(slot!($kind)),*],)*
                    $(Op::$evariant => &[$(slot!($ekind)),*],)*
                }
            }

            /// Tag of the produced value; `None` for effects.
            pub fn result(self) -> Option<IrType> {
                match self {
                    $(Op::$variant => Some(IrType::$result),)*
                    $(Op::$evariant => None,)*
                }
            }
        }

        /// One builder method per instruction, available on every [`Block`].
        pub trait Instructions: Block {
            $(
                $(#[$meta])*
                fn $method(&self $(, $arg: arg_type!(Self::Value, $kind))*) -> Self::Value {
                    self.emit(Op::$variant, vec![$(operand!($kind, $arg)),*])
                }
            )*
            $(
                $(#[$emeta])*
                fn $emethod(&self $(, $earg: arg_type!(Self::Value, $ekind))*) {
                    self.effect(Op::$evariant, vec![$(operand!($ekind, $earg)),*])
                }
            )*
        }

        impl<B: Block + ?Sized> Instructions for B {}
    };
}

instruction_set! {
    values {
        add_f => AddF "add.f" (left: Float, right: Float) -> Float;
        add_i => AddI "add.i" (left: Int, right: Int) -> Int;
        sub_f => SubF "sub.f" (left: Float, right: Float) -> Float;
        sub_i => SubI "sub.i" (left: Int, right: Int) -> Int;
        mul_f => MulF "mul.f" (left: Float, right: Float) -> Float;
        mul_i => MulI "mul.i" (left: Int, right: Int) -> Int;
        div_f => DivF "div.f" (left: Float, right: Float) -> Float;
        div_i => DivI "div.i" (left: Int, right: Int) -> Int;
        mod_f => ModF "mod.f" (left: Float, right: Float) -> Float;
        mod_i => ModI "mod.i" (left: Int, right: Int) -> Int;
        neg_f => NegF "neg.f" (value: Float) -> Float;
        neg_i => NegI "neg.i" (value: Int) -> Int;
        /// Three-way comparison: negative, zero or positive.
        cmp_f => CmpF "cmp.f" (left: Float, right: Float) -> Int;
        cmp_i => CmpI "cmp.i" (left: Int, right: Int) -> Int;
        cmp_s => CmpS "cmp.s" (left: Str, right: Str) -> Int;
        cmp_z => CmpZ "cmp.z" (left: Bool, right: Bool) -> Int;
        sh_i => ShI "sh.i" (value: Int, offset: Int) -> Int;
        and_i => AndI "and.i" (left: Int, right: Int) -> Int;
        or_i => OrI "or.i" (left: Int, right: Int) -> Int;
        xor_i => XorI "xor.i" (left: Int, right: Int) -> Int;
        not_i => NotI "not.i" (value: Int) -> Int;
        and_z => AndZ "and.z" (left: Bool, right: Bool) -> Bool;
        or_z => OrZ "or.z" (left: Bool, right: Bool) -> Bool;
        xor_z => XorZ "xor.z" (left: Bool, right: Bool) -> Bool;
        not_z => NotZ "not.z" (value: Bool) -> Bool;
        is_finite => IsFinite "isfinite" (value: Float) -> Bool;
        is_nan => IsNan "isnan" (value: Float) -> Bool;

        f => ConstF "f" (value: f64) -> Float;
        i => ConstI "i" (value: i64) -> Int;
        s => ConstS "s" (value: str) -> Str;
        inf_f => InfF "inf.f" () -> Float;
        nan_f => NanF "nan.f" () -> Float;
        max_f => MaxF "max.f" () -> Float;
        min_f => MinF "min.f" () -> Float;
        max_i => MaxI "max.i" () -> Int;
        min_i => MinI "min.i" () -> Int;
        max_z => MaxZ "max.z" () -> Bool;
        min_z => MinZ "min.z" () -> Bool;
        nil_a => NilA "nil.a" () -> Any;
        nil_c => NilC "nil.c" () -> Context;
        nil_n => NilN "nil.n" () -> Name;
        nil_r => NilR "nil.r" () -> Frame;
        nil_w => NilW "nil.w" () -> Window;

        len_b => LenB "len.b" (blob: Bin) -> Int;
        len_s => LenS "len.s" (value: Str) -> Int;
        cat_b => CatB "cat.b" (first: Bin, second: Bin) -> Bin;
        cat_s => CatS "cat.s" (first: Str, second: Str) -> Str;

        btof => BToF "btof" (value: Bin) -> Float;
        btoi => BToI "btoi" (value: Bin) -> Int;
        btos => BToS "btos" (value: Bin) -> Str;
        btoz => BToZ "btoz" (value: Bin) -> Bool;
        ftob => FToB "ftob" (value: Float) -> Bin;
        ftoi => FToI "ftoi" (value: Float) -> Int;
        ftos => FToS "ftos" (value: Float) -> Str;
        ftoz => FToZ "ftoz" (value: Float) -> Bool;
        itob => IToB "itob" (value: Int) -> Bin;
        itof => IToF "itof" (value: Int) -> Float;
        itos => IToS "itos" (value: Int) -> Str;
        itoz => IToZ "itoz" (value: Int) -> Bool;
        stob => SToB "stob" (value: Str) -> Bin;
        stof => SToF "stof" (value: Str) -> Float;
        stoi => SToI "stoi" (value: Str) -> Int;
        stoz => SToZ "stoz" (value: Str) -> Bool;
        ztob => ZToB "ztob" (value: Bool) -> Bin;
        ztof => ZToF "ztof" (value: Bool) -> Float;
        ztoi => ZToI "ztoi" (value: Bool) -> Int;
        ztos => ZToS "ztos" (value: Bool) -> Str;

        btoa => BToA "btoa" (value: Bin) -> Any;
        ftoa => FToA "ftoa" (value: Float) -> Any;
        itoa => IToA "itoa" (value: Int) -> Any;
        stoa => SToA "stoa" (value: Str) -> Any;
        ztoa => ZToA "ztoa" (value: Bool) -> Any;
        rtoa => RToA "rtoa" (value: Frame) -> Any;
        ttoa => TToA "ttoa" (value: Template) -> Any;
        ltoa => LToA "ltoa" (value: LookupHandler) -> Any;
        /// Render any boxed value as a string.
        atos => AToS "atos" (value: Any) -> Str;
        /// Whether the boxed value has one of the listed runtime types.
        atoz => AToZ "atoz" (value: Any, types: types) -> Bool;

        new_r => NewR "new.r" (self_is_this: Bool, context: Context, gatherers: [Frame], builders: [Builder]) -> Frame;
        /// A list frame of the integers `start..=end`.
        new_r_i => NewRI "new.r.i" (context: Context, start: Int, end: Int) -> Frame;
        new_t => NewT "new.t" (context: Context, gatherers: [Frame], builders: [Builder]) -> Template;
        cat_r => CatR "cat.r" (context: Context, first: Frame, second: Frame) -> Frame;
        cat_rc => CatRC "cat.rc" (head: Frame, tail: Context) -> Context;
        ctr_c => CtrC "ctr.c" (context: Context) -> Frame;
        ctr_r => CtrR "ctr.r" (frame: Frame) -> Frame;
        ctxt_r => CtxtR "ctxt.r" (context: Context, frame: Frame) -> Context;
        /// `context` extended with `frame` for private attribute lookups.
        priv_cr => PrivCR "priv.cr" (context: Context, frame: Frame) -> Context;
        id => Id "id" (frame: Frame) -> Str;
        gather_i => GatherI "gather.i" (frame: Frame, ordinal: Int) -> Frame;
        gather_s => GatherS "gather.s" (frame: Frame, name: Str) -> Frame;
        rtox => RToX "rtox" (frame: Frame) -> Builder;
        /// Mark every attribute added by `inner` as private.
        priv_x => PrivX "priv.x" (inner: Builder) -> Builder;
        new_x_ia => NewXIA "new.x.ia" (ordinal: Int, value: Any) -> Builder;
        new_x_sd => NewXSD "new.x.sd" (site: context, name: Str, definition: Definition) -> Builder;
        new_x_sa => NewXSA "new.x.sa" (site: context, name: Str, value: Any) -> Builder;
        new_x_so => NewXSO "new.x.so" (site: context, name: Str, over: Override) -> Builder;
        drop_x => DropX "drop.x" (site: context, name: Str) -> Builder;
        require_x => RequireX "require.x" (site: context, name: Str) -> Builder;
        use_x => UseX "use.x" (site: context, name: Str) -> Builder;
        call_d => CallD "call.d" (definition: Definition, context: Context) -> Any;
        call_o => CallO "call.o" (over: Override, context: Context, original: Any) -> Any;
        debug_d => DebugD "debug.d" (definition: Definition, context: Context) -> Any;
        seal_d => SealD "seal.d" (definition: Definition, context: Context) -> Definition;
        seal_o => SealO "seal.o" (over: Override, context: Context) -> Override;
        ext => Ext "ext" (uri: str) -> Any;

        lookup => Lookup "lookup" (context: Context, names: names) -> Any;
        lookup_l => LookupL "lookup.l" (handler: LookupHandler, context: Context, names: Name) -> Any;
        add_n => AddN "add.n" (source: Name, names: names) -> Name;
        add_n_a => AddNA "add.n.a" (source: Name, value: Any) -> Name;
        add_n_i => AddNI "add.n.i" (source: Name, ordinal: Int) -> Name;
        add_n_r => AddNR "add.n.r" (source: Name, frame: Frame) -> Name;
        add_n_s => AddNS "add.n.s" (source: Name, name: Str) -> Name;
        ktol => KToL "ktol" (name: Str, context: Context, collector: Collector) -> LookupHandler;

        rtoe => RToE "rtoe" (source: Frame, context: Context) -> Fricassee;
        /// Zip the sources; `intersect` drops names missing from any source.
        new_p => NewP "new.p" (context: Context, intersect: Bool, zippers: [Zipper]) -> Fricassee;
        new_p_i => NewPI "new.p.i" (name: Str) -> Zipper;
        new_p_r => NewPR "new.p.r" (name: Str, frame: Frame) -> Zipper;
        new_p_s => NewPS "new.p.s" (name: Str) -> Zipper;
        cat_e => CatE "cat.e" (context: Context, chains: [Fricassee]) -> Fricassee;
        mtoe => MToE "mtoe" (context: Context, initial: Any, accumulator: Accumulator) -> Fricassee;
        filt_e => FiltE "filt.e" (source: Fricassee, clause: Definition) -> Fricassee;
        take_ed => TakeED "take.ed" (source: Fricassee, clause: Definition) -> Fricassee;
        take_ei => TakeEI "take.ei" (source: Fricassee, count: Int) -> Fricassee;
        takel_ei => TakeLEI "takel.ei" (source: Fricassee, count: Int) -> Fricassee;
        drop_ed => DropED "drop.ed" (source: Fricassee, clause: Definition) -> Fricassee;
        drop_ei => DropEI "drop.ei" (source: Fricassee, count: Int) -> Fricassee;
        dropl_ei => DropLEI "dropl.ei" (source: Fricassee, count: Int) -> Fricassee;
        ord_e_f => OrdEF "ord.e.f" (source: Fricassee, ascending: Bool, clause: Definition) -> Fricassee;
        ord_e_i => OrdEI "ord.e.i" (source: Fricassee, ascending: Bool, clause: Definition) -> Fricassee;
        ord_e_s => OrdES "ord.e.s" (source: Fricassee, ascending: Bool, clause: Definition) -> Fricassee;
        ord_e_z => OrdEZ "ord.e.z" (source: Fricassee, ascending: Bool, clause: Definition) -> Fricassee;
        rev_e => RevE "rev.e" (source: Fricassee) -> Fricassee;
        shuf_e => ShufE "shuf.e" (source: Fricassee) -> Fricassee;
        let_e => LetE "let.e" (source: Fricassee, builders: [Builder]) -> Fricassee;
        etoe_g => EToEG "etoe.g" (source: Fricassee, groupers: [Grouper]) -> Fricassee;
        etoe_m => EToEM "etoe.m" (source: Fricassee, initial: Any, accumulator: Accumulator) -> Fricassee;
        etoe_u => EToEU "etoe.u" (source: Fricassee, distributor: Distributor) -> Fricassee;

        new_g => NewG "new.g" (name: Str, collector: Collector) -> Grouper;
        new_g_a => NewGA "new.g.a" (name: Str, value: Any) -> Grouper;
        and_g => AndG "and.g" (groupers: [Grouper]) -> Grouper;
        or_g => OrG "or.g" (groupers: [Grouper]) -> Grouper;
        not_g => NotG "not.g" (grouper: Grouper) -> Grouper;
        powerset => Powerset "powerset" (groupers: [Grouper]) -> Grouper;
        adjacent_f => AdjacentF "adjacent.f" (name: Str, definition: Definition) -> Grouper;
        adjacent_i => AdjacentI "adjacent.i" (name: Str, definition: Definition) -> Grouper;
        adjacent_s => AdjacentS "adjacent.s" (name: Str, definition: Definition) -> Grouper;
        adjacent_z => AdjacentZ "adjacent.z" (name: Str, definition: Definition) -> Grouper;
        always_include_f => AlwaysIncludeF "alwaysinclude.f" (name: Str, key: Definition) -> Grouper;
        always_include_i => AlwaysIncludeI "alwaysinclude.i" (name: Str, key: Definition) -> Grouper;
        always_include_s => AlwaysIncludeS "alwaysinclude.s" (name: Str, key: Definition) -> Grouper;
        always_include_z => AlwaysIncludeZ "alwaysinclude.z" (name: Str, key: Definition) -> Grouper;
        disc_g_f => DiscGF "disc.g.f" (name: Str, key: Definition) -> Grouper;
        disc_g_i => DiscGI "disc.g.i" (name: Str, key: Definition) -> Grouper;
        disc_g_s => DiscGS "disc.g.s" (name: Str, key: Definition) -> Grouper;
        disc_g_z => DiscGZ "disc.g.z" (name: Str, key: Definition) -> Grouper;
        crosstab_f => CrosstabF "crosstab.f" (key: Definition) -> Grouper;
        crosstab_i => CrosstabI "crosstab.i" (key: Definition) -> Grouper;
        crosstab_s => CrosstabS "crosstab.s" (key: Definition) -> Grouper;
        crosstab_z => CrosstabZ "crosstab.z" (key: Definition) -> Grouper;
        buckets_f => BucketsF "buckets.f" (key: Definition, count: Int) -> Grouper;
        buckets_i => BucketsI "buckets.i" (key: Definition, count: Int) -> Grouper;
        buckets_s => BucketsS "buckets.s" (key: Definition, count: Int) -> Grouper;
        boundary => Boundary "boundary" (definition: Definition, trailing: Bool) -> Grouper;
        chunk_e => ChunkE "chunk.e" (width: Int) -> Grouper;
        stripe_e => StripeE "stripe.e" (width: Int) -> Grouper;
        ring_g => RingG "ring.g" (primitive: Int, size: Int) -> Grouper;
        window_g => WindowG "window.g" (length: Window, next: Window) -> Grouper;
        /// A window whose bounds come from the items themselves.
        contextual => Contextual "contextual" () -> Window;
        count_w => CountW "count.w" (count: Int) -> Window;
        duration_f => DurationF "duration.f" (definition: Definition, duration: Float) -> Window;
        duration_i => DurationI "duration.i" (definition: Definition, duration: Int) -> Window;
        session_f => SessionF "session.f" (definition: Definition, adjacent: Float, maximum: Float) -> Window;
        session_i => SessionI "session.i" (definition: Definition, adjacent: Int, maximum: Int) -> Window;

        etoa_ao => EToAAO "etoa.ao" (source: Fricassee, initial: Any, accumulator: Accumulator) -> Any;
        etoa_d => EToAD "etoa.d" (source: Fricassee, extractor: Definition) -> Any;
        etoa_dd => EToADD "etoa.dd" (source: Fricassee, extractor: Definition, alternate: Definition) -> Any;
        etod => EToD "etod" (source: Fricassee, compute: Definition) -> Definition;
        etod_a => EToDA "etod.a" (source: Fricassee, compute: Definition, empty: Any) -> Definition;
        /// Count the items in a chain.
        etoi => EToI "etoi" (source: Fricassee) -> Int;
        etor_ao => EToRAO "etor.ao" (source: Fricassee, initial: Any, over: Override) -> Frame;
        etor_i => EToRI "etor.i" (source: Fricassee, compute: Definition) -> Frame;
        etor_s => EToRS "etor.s" (source: Fricassee, compute_name: Definition, compute: Definition) -> Frame;
        cat_ke => CatKE "cat.ke" (collector: Collector, chain: Fricassee) -> Definition;
    }
    effects {
        /// Set an attribute by ordinal in a frame that is still being built.
        disperse_i => DisperseI "disperse.i" (frame: Frame, name: Int, value: Any);
        /// Set an attribute by name in a frame that is still being built.
        disperse_s => DisperseS "disperse.s" (frame: Frame, name: Str, value: Any);
    }
}

impl Op {
    /// The attribute flavour declared by an attribute builder instruction.
    pub fn flavour(self) -> Option<AttributeFlavour> {
        match self {
            Op::NewXSD => Some(AttributeFlavour::Definition),
            Op::NewXSA => Some(AttributeFlavour::Now),
            Op::NewXSO => Some(AttributeFlavour::Override),
            Op::DropX => Some(AttributeFlavour::Drop),
            Op::RequireX => Some(AttributeFlavour::Required),
            Op::UseX => Some(AttributeFlavour::Used),
            _ => None,
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Op> {
        Op::ALL.iter().copied().find(|op| op.mnemonic() == mnemonic)
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.mnemonic())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn mnemonics_are_unique() {
        let unique: HashSet<_> = Op::ALL.iter().map(|op| op.mnemonic()).collect();
        assert_eq!(unique.len(), Op::ALL.len());
        assert_eq!(Op::from_mnemonic("etoe.g"), Some(Op::EToEG));
        assert_eq!(Op::from_mnemonic("nope"), None);
    }

    #[test]
    fn coercion_grid_is_complete() {
        let scalars = [
            IrType::Bin,
            IrType::Bool,
            IrType::Float,
            IrType::Int,
            IrType::Str,
        ];
        for from in scalars {
            for to in scalars.iter().copied().chain([IrType::Any]) {
                if from == to {
                    continue;
                }
                let mnemonic = format!("{}to{}", from.letter(), to.letter());
                let op = Op::from_mnemonic(&mnemonic)
                    .unwrap_or_else(|| panic!("missing conversion {}", mnemonic));
                assert_eq!(op.operands(), &[Slot::One(from)]);
                assert_eq!(op.result(), Some(to));
            }
        }
    }

    #[test]
    fn attribute_builders_take_context_first() {
        for op in Op::ALL.iter().filter(|op| op.flavour().is_some()) {
            assert_eq!(op.operands()[0], Slot::Context, "{}", op);
            assert_eq!(op.operands()[1], Slot::One(IrType::Str), "{}", op);
            assert_eq!(op.result(), Some(IrType::Builder));
        }
    }

    #[test]
    fn privacy_and_window_ops() {
        assert!(Op::Contextual.operands().is_empty());
        assert_eq!(Op::Contextual.result(), Some(IrType::Window));
        assert_eq!(
            Op::from_mnemonic("priv.cr").map(Op::operands),
            Some(&[Slot::One(IrType::Context), Slot::One(IrType::Frame)][..])
        );
        assert_eq!(Op::PrivCR.result(), Some(IrType::Context));
        assert_eq!(Op::PrivX.operands(), &[Slot::One(IrType::Builder)]);
        assert_eq!(Op::PrivX.result(), Some(IrType::Builder));
        assert_eq!(Op::PrivX.flavour(), None);
    }

    #[test]
    fn effects_have_no_result() {
        let effects: Vec<_> = Op::ALL
            .iter()
            .filter(|op| op.result().is_none())
            .map(|op| op.mnemonic())
            .collect();
        assert_eq!(effects, ["disperse.i", "disperse.s"]);
    }
}
