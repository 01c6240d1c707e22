/// Locks a `Mutex`, panicking if a previous holder panicked.
///
/// ```rust, ignore
///  lock!(self.speculative).insert(key, value);
/// ```
macro_rules! lock {
    ($mutex:expr) => {
        $mutex.lock().expect("Failed to acquire lock")
    };
}

/// Takes the read side of an `RwLock`.
///
/// ```rust, ignore
///  let rules = read_lock!(self.rules).clone();
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Takes the write side of an `RwLock`.
///
/// ```rust, ignore
///  write_lock!(self.rules).clear();
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().expect("Failed to acquire write lock")
    };
}

/// Builds the boxed argument list for [`crate::Fake::invoke`].
///
/// Every expression is boxed as an [`crate::fake::ArgValue`], keeping its concrete type so
/// matchers and captures can downcast it again.
///
/// ```rust
/// use callcapture::{args, Fake};
///
/// let fake = Fake::new("clock");
/// let result = fake.invoke("delay", args![250_i32, String::from("ms")])?;
/// assert!(result.is_none());
/// # Ok::<(), callcapture::Error>(())
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::fake::ArgValue>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($arg) as $crate::fake::ArgValue),+]
    };
}
