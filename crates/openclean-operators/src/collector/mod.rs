//! Terminal consumers.
//!
//! Terminals end a chain: they never forward, answer every row with
//! [`RowOutcome::Drop`](crate::traits::RowOutcome::Drop), and refuse a
//! downstream consumer at construction time.

pub mod count;
pub mod distinct;
pub mod frame;
pub mod rows;
pub mod write;

pub use count::RowCount;
pub use distinct::Distinct;
pub use frame::DataFrameBuilder;
pub use rows::Collector;
pub use write::{Write, WriteSummary};

/// `Rewire` for a terminal: attaching anything after it is an error.
macro_rules! terminal_rewire {
    ($ty:ty $(, $gen:ident : $bound:path)?) => {
        impl$(<$gen: $bound>)? $crate::traits::Rewire for $ty {
            type Rewired<N: $crate::traits::Consumer> = N;

            fn with_downstream<N: $crate::traits::Consumer>(
                &self,
                _next: N,
            ) -> Result<Self::Rewired<N>, $crate::traits::OpError> {
                Err($crate::traits::OpError::IllegalDownstream(
                    $crate::traits::Consumer::name(self),
                ))
            }
        }
    };
}

pub(crate) use terminal_rewire;
