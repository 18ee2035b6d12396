use std::{fmt, io};
use std::panic::Location;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A chain of error details, most recent first.
///
/// Each detail renders as one headline followed by optional `key: value`
/// context lines. Older errors in the chain are printed indented below the
/// newer one that wrapped them.
#[derive(Debug)]
pub struct Error {
    detail: Box<dyn ErrorDetail>,
    prev: Option<Box<Error>>,
    location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    #[track_caller]
    pub fn from_std<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Error::from(Box::new(error) as Box<dyn StdError + Send + Sync>)
    }

    /// Puts `self` behind `newer`: `newer` becomes the headline.
    pub fn chain(self, mut newer: Error) -> Self {
        fn append(error: Error, behind: &mut Error) {
            match behind.prev.as_mut() {
                Some(prev) => append(error, prev),
                None => behind.prev = Some(Box::new(error)),
            }
        }

        append(self, &mut newer);
        newer
    }

    /// The headline of the most recent detail.
    pub fn message(&self) -> String {
        self.detail.to_string()
    }

    /// Iterates over every error in the chain, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |e| e.prev.as_deref())
    }
}

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        std::iter::successors(self.source(), |&e| e.source())
            .map(|e| (None, e.to_string()))
            .collect()
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($($T:ty),* $(,)?) => {
        $(
            impl $crate::error::ErrorDetail for $T {
                fn context(&self) -> Vec<(Option<String>, String)> {
                    let error: &(dyn std::error::Error + Send + Sync) = self;
                    error.context()
                }
            }
        )*
    }
}

impl_error_detail_with_std_error!(io::Error, toml::de::Error, serde_json::Error, jwalk::Error);

impl ErrorDetail for String { }
impl ErrorDetail for &'static str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            detail: Box::new(detail),
            prev: None,
            location: Location::caller(),
        }
    }
}

impl Clone for Error {
    fn clone(&self) -> Self {
        Error {
            detail: Box::new(MakeshiftError::from(&*self.detail)),
            prev: self.prev.clone(),
            location: self.location,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backtrace = std::env::var_os("RUST_BACKTRACE").is_some();
        for (depth, error) in self.iter().enumerate() {
            let indent = " ".repeat(depth * 4);
            let newline = format!("\n{indent}");

            writeln!(f, "{indent}{}", error.detail.to_string().replace('\n', &newline))?;
            for (key, value) in error.detail.context() {
                let value = value.replace('\n', &newline);
                match key {
                    Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                    None => writeln!(f, "{indent}{value}")?,
                }
            }

            if backtrace {
                writeln!(f, "{indent}[{}]", error.location)?;
            }
        }

        Ok(())
    }
}

/// An error detail built from a message and ad-hoc context.
#[derive(Debug)]
pub struct MakeshiftError {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

impl From<&dyn ErrorDetail> for MakeshiftError {
    #[inline]
    fn from(detail: &dyn ErrorDetail) -> Self {
        MakeshiftError {
            message: detail.to_string(),
            parameters: detail.context(),
        }
    }
}

impl fmt::Display for MakeshiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for MakeshiftError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

/// Builds an [`Error`](crate::error::Error) from a message and context.
///
/// Context entries are either `"key" => value` or a bare `value`.
///
/// ```rust
/// let e = nbsite::error!("failed to copy", "from" => "a.css", "to" => "b.css");
/// assert_eq!(e.message(), "failed to copy");
/// assert!(e.to_string().contains("from: a.css"));
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr $(, $($rest:tt)*)?) => (
        $crate::error::Error::from($crate::error::MakeshiftError {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $($crate::error!(@param v $($rest)*);)?
                v
            },
        })
    );

    (@param $v:ident $key:expr => $value:expr $(, $($rest:tt)*)?) => {
        $v.push((Some($key.to_string()), $value.to_string()));
        $($crate::error!(@param $v $($rest)*);)?
    };

    (@param $v:ident $value:expr $(, $($rest:tt)*)?) => {
        $v.push((None, $value.to_string()));
        $($crate::error!(@param $v $($rest)*);)?
    };

    (@param $v:ident) => { };
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        self.map_err(|e| e.into().chain(other.into()))
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        self.map_err(|e| e.into().chain(f().into()))
    }
}
