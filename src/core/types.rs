/*!
 * Core Types
 * Identifier newtypes shared across the policy engine
 *
 * Labels and identities are short (team names, usernames), so they are stored
 * in inline-optimized strings that avoid a heap allocation for anything up to
 * 23 bytes. Equality is exact byte-wise comparison; the engine never
 * interprets structure inside an identifier.
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::borrow::Borrow;
use std::fmt;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(SmartString);

        impl $name {
            /// Create from any string-like value
            #[inline]
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(SmartString::from(value.as_ref()))
            }

            /// Get string slice
            #[inline(always)]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Check if empty
            #[inline(always)]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(s: String) -> Self {
                Self(SmartString::from(s))
            }
        }

        impl From<&String> for $name {
            #[inline]
            fn from(s: &String) -> Self {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Borrow<str> for $name {
            #[inline]
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

identifier! {
    /// Tag attached to an endpoint that selects which approval rules apply
    Label
}

identifier! {
    /// Opaque principal identity (requester or approver)
    UserId
}

identifier! {
    /// Identifier of the access request an approval was granted for
    RequestId
}
