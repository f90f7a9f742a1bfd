//! Error wrapper for raw panic payloads.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::Error;
use crate::error::AnyhowChain;

/// Boxed unwind payload, as produced by `std::panic::catch_unwind`.
pub type Payload = Box<dyn Any + Send + 'static>;

/// Text used for payloads that cannot be rendered.
const OPAQUE: &str = "opaque panic payload";

/// A non-[`Error`] value that was raised, e.g. by `panic!("...")`.
///
/// The text is rendered once on construction. Payloads that were errors
/// boxed as `Any` before being raised stay reachable through
/// [`source`](StdError::source).
pub struct CapturedValue {
    rendered: String,
    payload: Held,
}

enum Held {
    Error(Box<Error>),
    Foreign(Box<dyn StdError + Send + Sync + 'static>),
    Anyhow(anyhow::Error),
    // Mutex only to make the payload `Sync`; it is never contended.
    Opaque(Mutex<Payload>),
}

impl CapturedValue {
    /// Wrap any payload. Never fails.
    #[must_use]
    pub fn new(payload: Payload) -> Self {
        let payload = match payload.downcast::<Error>() {
            Ok(error) => {
                return Self {
                    rendered: error.to_string(),
                    payload: Held::Error(error),
                };
            }
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<Box<dyn StdError + Send + Sync>>() {
            Ok(error) => {
                return Self {
                    rendered: error.to_string(),
                    payload: Held::Foreign(*error),
                };
            }
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<anyhow::Error>() {
            Ok(error) => {
                return Self {
                    rendered: AnyhowChain(&error).to_string(),
                    payload: Held::Anyhow(*error),
                };
            }
            Err(payload) => payload,
        };

        Self {
            rendered: render(&*payload),
            payload: Held::Opaque(Mutex::new(payload)),
        }
    }

    /// The payload rendered as text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.rendered
    }

    /// Whether the original payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        let id = TypeId::of::<T>();
        match &self.payload {
            Held::Error(_) => id == TypeId::of::<Error>(),
            Held::Foreign(_) => id == TypeId::of::<Box<dyn StdError + Send + Sync>>(),
            Held::Anyhow(_) => id == TypeId::of::<anyhow::Error>(),
            Held::Opaque(payload) => {
                let payload = payload.lock().unwrap_or_else(PoisonError::into_inner);
                (**payload).is::<T>()
            }
        }
    }

    /// Give back the original payload.
    #[must_use]
    pub fn into_payload(self) -> Payload {
        match self.payload {
            Held::Error(error) => error as Payload,
            Held::Foreign(error) => Box::new(error) as Payload,
            Held::Anyhow(error) => Box::new(error) as Payload,
            Held::Opaque(payload) => payload.into_inner().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Best-effort reinterpretation of the payload as an error.
    #[must_use]
    pub fn as_error(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.payload {
            Held::Error(error) => Some(&**error),
            Held::Foreign(error) => Some(&**error),
            Held::Anyhow(error) => Some(&**error),
            Held::Opaque(_) => None,
        }
    }
}

fn render(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        return (*text).to_owned();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    if let Some(text) = payload.downcast_ref::<Cow<'static, str>>() {
        return text.to_string();
    }

    macro_rules! render_display {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(value) = payload.downcast_ref::<$ty>() {
                    return value.to_string();
                }
            )*
        };
    }
    render_display!(
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
    );

    OPAQUE.to_owned()
}

impl fmt::Display for CapturedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl fmt::Debug for CapturedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedValue")
            .field("payload", &self.rendered)
            .finish()
    }
}

impl StdError for CapturedValue {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.as_error()
    }
}
