use crate::Error;

/// Result slot of a [`Future`](crate::Future).
///
/// `Pending` is both the initial state and the state a future returns to
/// after its outcome has been taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E = Error> {
    Pending,
    Success(T),
    Failure(E),
}

impl<T, E> Default for Outcome<T, E> {
    fn default() -> Self {
        Outcome::Pending
    }
}

impl<T, E> Outcome<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Moves the value out, discarding a failure.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(self) -> Option<E> {
        match self {
            Outcome::Failure(err) => Some(err),
            _ => None,
        }
    }

    /// Replaces `self` with `Pending` and returns what was there.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl<T, E: From<Error>> Outcome<T, E> {
    /// Converts into a `Result`, reporting `Pending` as [`Error::NoValue`].
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
            Outcome::Pending => Err(E::from(Error::NoValue)),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err),
        }
    }
}
