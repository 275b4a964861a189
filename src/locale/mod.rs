//! Locale subsystem.
//!
//! # Data Flow
//! ```text
//! Request (matched route?, cookie, Accept-Language)
//!     → resolver.rs (route → stored → header → default)
//!     → [no route matched] redirect.rs (first GET route for the bare path)
//!     → session.rs (Set-Cookie, LocaleChanged event)
//! ```
//!
//! # Design Decisions
//! - No process-wide locale; the result lives in the request context
//! - Redirect search relies on expansion order and takes the first match

pub mod redirect;
pub mod resolver;
pub mod session;

pub use redirect::find_redirect;
pub use resolver::{parse_accept_language, LocaleInputs, LocaleResolver, LocaleSource};
pub use session::{locale_cookie, stored_locale, LocaleChanged, LocaleEvents};
