//! Internal utilities.

mod abort_on_drop;

pub(crate) use self::abort_on_drop::AbortOnDrop;
