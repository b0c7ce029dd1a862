//! Static shape check between a task and its argument tuple.
//!
//! A task is any `FnOnce` returning `Result<T, E>` whose parameters match the
//! argument tuple handed to [`Future::start`](crate::Future::start). Tasks
//! started with an allocator receive the allocator handle as their first
//! parameter, ahead of the tuple's elements.
//!
//! ```
//! use pool_future::Task;
//!
//! fn add(a: i32, b: i32) -> Result<i32, ()> {
//!     Ok(a + b)
//! }
//!
//! assert_eq!(Task::call(add, (2, 40)), Ok(42));
//! ```

/// A unit of work callable with the argument tuple `Args`.
pub trait Task<Args, T, E> {
    fn call(self, args: Args) -> Result<T, E>;
}

/// A unit of work taking an allocator handle `A` followed by `Args`.
pub trait TaskWith<A, Args, T, E> {
    fn call_with(self, allocator: A, args: Args) -> Result<T, E>;
}

macro_rules! impl_task {
    ($($arg:ident),*) => {
        impl<Func, T, E, $($arg,)*> Task<($($arg,)*), T, E> for Func
        where
            Func: FnOnce($($arg),*) -> Result<T, E>,
        {
            #[allow(non_snake_case)]
            fn call(self, ($($arg,)*): ($($arg,)*)) -> Result<T, E> {
                self($($arg),*)
            }
        }

        impl<Func, Alloc, T, E, $($arg,)*> TaskWith<Alloc, ($($arg,)*), T, E> for Func
        where
            Func: FnOnce(Alloc, $($arg),*) -> Result<T, E>,
        {
            #[allow(non_snake_case)]
            fn call_with(self, allocator: Alloc, ($($arg,)*): ($($arg,)*)) -> Result<T, E> {
                self(allocator, $($arg),*)
            }
        }
    };
}

impl_task!();
impl_task!(A1);
impl_task!(A1, A2);
impl_task!(A1, A2, A3);
impl_task!(A1, A2, A3, A4);
impl_task!(A1, A2, A3, A4, A5);
impl_task!(A1, A2, A3, A4, A5, A6);

#[cfg(test)]
mod tests {
    use super::{Task, TaskWith};

    fn answer() -> Result<u32, String> {
        Ok(42)
    }

    fn concat(a: &str, b: &str, c: &str) -> Result<String, String> {
        Ok(format!("{a}{b}{c}"))
    }

    #[test]
    fn test_call_without_arguments() {
        assert_eq!(Task::call(answer, ()), Ok(42));
    }

    #[test]
    fn test_call_spreads_tuple() {
        assert_eq!(Task::call(concat, ("a", "b", "c")), Ok("abc".to_string()));
    }

    #[test]
    fn test_call_closure_error() {
        let fail = |reason: String| -> Result<(), String> { Err(reason) };
        assert_eq!(Task::call(fail, ("bad".to_string(),)), Err("bad".to_string()));
    }

    #[test]
    fn test_call_with_allocator_first() {
        let sized = |cap: usize, fill: u8, len: usize| -> Result<Vec<u8>, ()> {
            let mut buf = Vec::with_capacity(cap);
            buf.resize(len, fill);
            Ok(buf)
        };
        let buf = TaskWith::call_with(sized, 16, (7u8, 4usize)).unwrap();
        assert_eq!(buf, vec![7, 7, 7, 7]);
        assert!(buf.capacity() >= 16);
    }
}
