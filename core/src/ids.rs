//! Dense index newtypes. Every entity array in `NetworkRep` is indexed by one of
//! these rather than a raw `usize`, so a `GateId` can never be used to index the
//! node array by mistake (spec.md §3.2 invariant 1: ids are contiguous dense
//! ranges per entity kind).

use std::fmt;

macro_rules! dense_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn new(index: usize) -> Self {
                $name(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }

        impl From<usize> for $name {
            fn from(i: usize) -> Self {
                $name::new(i)
            }
        }
    };
}

dense_id!(NodeId);
dense_id!(GateId);
dense_id!(GateTypeId);
dense_id!(FfrId);
dense_id!(MffcId);
dense_id!(FaultId);
dense_id!(DffId);
