//! Ordered (unfailing) Knuth-Bendix completion over hash-consed terms.

pub mod completion;
pub mod config;
pub mod critical;
pub mod equation;
pub mod error;
pub mod fresh;
pub mod matching;
pub mod metrics;
pub mod order;
pub mod parser;
pub mod repl;
pub mod rewrite;
pub mod subst;
pub mod symbol;
pub mod term;
pub mod trace;
pub mod unify;

pub use completion::{Completion, Status};
pub use config::CompletionConfig;
pub use equation::Equation;
pub use error::{KbError, Snapshot};
pub use order::{Kbo, Lpo, Precedence, ReductionOrder};

#[cfg(test)]
pub(crate) mod test_utils;
