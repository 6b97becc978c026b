//! sweepdict: a combinatorial algebra for configuration record sweeps.
//!
//! Building blocks each denote one configuration or a choice among
//! several; `+` concatenates, `*` takes the cartesian product, `|` zips
//! in parallel. Iterating the resulting tree lazily enumerates every flat
//! record, with a per-value collision protocol (override, accumulate,
//! error) governing how colliding keys merge.
//!
//! ```ignore
//! use sweepdict::{build, cdict, clist};
//!
//! let sweep = cdict! { seed: clist![1, 2, 3], lr: clist![1, 10] }
//!     * build::dict([("arch", "mlp")]);
//! for record in sweep.items() {
//!     let record = record?;
//! }
//! ```

#[macro_use]
mod macros;

pub mod build;
pub mod error;
pub mod node;
pub mod obs;
pub mod record;
pub mod slot;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only; errors and iterator types stay one level down.
///

pub mod prelude {
    pub use crate::{
        build,
        node::Node,
        record::Record,
        slot::{Combiner, Slot},
        value::Value,
    };
}
