#![allow(dead_code, unused_macros)]

/// Holds only if `Self` and `T` are the same type.
pub trait Same<T> {}

impl<T> Same<T> for T {}

pub fn assert_same<A: Same<B>, B>() {}

/// A payload that can be moved but not copied or cloned.
#[derive(Debug, PartialEq, Eq)]
pub struct MoveOnly(pub i32);

/// Whether the concrete type `$ty` satisfies the given bounds, as a `bool` constant.
macro_rules! implements {
    ($ty:ty: $($bound:tt)+) => {{
        trait DoesNotImpl {
            const IMPLS: bool = false;
        }
        impl<T: ?Sized> DoesNotImpl for T {}

        struct Wrapper<T: ?Sized>(::std::marker::PhantomData<T>);

        #[allow(dead_code)]
        impl<T: ?Sized + $($bound)+> Wrapper<T> {
            const IMPLS: bool = true;
        }

        <Wrapper<$ty>>::IMPLS
    }};
}
