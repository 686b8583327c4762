// SPDX-License-Identifier: MIT

//! Workflow state sets
//!
//! Each workflow defines its own closed enumeration of states. States compare
//! by discriminant; `START` is where a fresh context begins and `END` is the
//! only terminal marker.

use std::fmt::Debug;
use std::hash::Hash;

/// A closed set of workflow states
pub trait StateSet: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// State a fresh context starts in
    const START: Self;
    /// Terminal state
    const END: Self;

    /// Every state in the set
    fn all() -> &'static [Self];

    fn is_end(&self) -> bool {
        *self == Self::END
    }
}

/// Declare a state enum implementing [`StateSet`].
///
/// ```
/// flowstep::flow_states! {
///     pub enum Checkout { Start, Paid, Shipped, End }
///     start = Start;
///     end = End;
/// }
///
/// use flowstep::StateSet;
/// assert_eq!(Checkout::all().len(), 4);
/// assert!(Checkout::End.is_end());
/// ```
#[macro_export]
macro_rules! flow_states {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }
        start = $start:ident;
        end = $end:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::flow::StateSet for $name {
            const START: Self = $name::$start;
            const END: Self = $name::$end;

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }
        }
    };
}
