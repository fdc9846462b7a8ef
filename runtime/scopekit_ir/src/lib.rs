//! Binding names for the scopekit environment engine.
//!
//! Every binding key in an environment is a [`Name`]: a 32-bit handle into a
//! shared [`StringInterner`]. Interning keeps binding-table keys `Copy` and
//! makes name comparison a single integer compare, which matters because the
//! resolver compares the same name against every environment on a chain.
//!
//! Any text is a legal name, including the empty string and text that is not
//! a valid identifier. [`is_syntactic_name`] and [`quote_name`] implement the
//! backtick escape used when such names are shown to a user.

mod interner;
mod name;
mod syntax;

pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use syntax::{is_reserved_word, is_syntactic_name, quote_name, RESERVED_WORDS};
