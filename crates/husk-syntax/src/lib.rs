//! Shell source processing
//!
//! Parsing, quoting and word expansion for POSIX shell, Bash, mksh and bats.
//! The grammar comes from `brush_parser`. Nothing here executes commands:
//! expansion works against a caller-supplied [`expand::Environ`] and refuses
//! command substitutions.
//!
//! ```
//! use husk_syntax::{expand, quote, LangVariant};
//! use std::collections::HashMap;
//!
//! let quoted = quote::quote("hello world", LangVariant::Bash).unwrap();
//! let fields = expand::fields(&quoted, &HashMap::<String, String>::new()).unwrap();
//! assert_eq!(fields, vec!["hello world"]);
//! ```

pub mod ast;
pub mod error;
pub mod expand;
pub mod lang;
pub mod parser;
pub mod pos;
pub mod quote;
mod source;

pub use ast::{File, Stmt};
pub use error::{Error, LangError, ParseError, QuoteError, Result};
pub use lang::LangVariant;
pub use parser::Parser;
pub use pos::Pos;
