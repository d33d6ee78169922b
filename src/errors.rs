//! Build error taxonomy.
//!
//! | Class | Raised by | Retry? |
//! |-------|-----------|--------|
//! | Structural | classification, dispatch table, state registration | no, fix the declaration |
//! | Resolution | sub-artifact resolution | yes, with a working compiler connection |
//! | Usage | document or dump requests before a build | no, build first |
//!
//! Errors from the low-level compiler collaborator are not part of this enum;
//! they travel through `anyhow::Error` exactly as the compiler produced them.

use forge_state::StateError;
use forge_types::{LifecycleHook, OnCompletionAction};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Structural,
    Resolution,
    Usage,
}

impl ErrorClass {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorClass::Resolution)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorClass::Structural => f.write_str("structural"),
            ErrorClass::Resolution => f.write_str("resolution"),
            ErrorClass::Usage => f.write_str("usage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgeError {
    /// A second bare handler claimed an on-completion action.
    DuplicateBareHandler {
        action: OnCompletionAction,
        existing: String,
        member: String,
    },
    /// A second external method claimed a lifecycle hook.
    MultipleHookMethods {
        hook: LifecycleHook,
        existing: String,
        member: String,
    },
    /// Two external methods share a selector.
    DuplicateSelector { signature: String, member: String },
    /// Config declares context use but the body cannot receive it.
    InconsistentForms { member: String },
    /// Config declares more than one of external/bare/internal.
    ConflictingRoles { member: String },
    /// Name registered twice at the same inheritance level.
    DuplicateMember { name: String },
    /// State registration or schema limit failure.
    State(StateError),
    /// Invalid build configuration.
    InvalidConfig { message: String },
    /// Deferred sub-artifacts exist and no connection was supplied.
    MissingCompilerConnection { pending: Vec<String> },
    /// A sub-artifact was read before it was resolved.
    UnresolvedSubArtifact { name: String },
    /// Programs were requested before they were built.
    NotBuilt { what: String },
}

impl ForgeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ForgeError::MissingCompilerConnection { .. } => ErrorClass::Resolution,
            ForgeError::NotBuilt { .. }
            | ForgeError::UnresolvedSubArtifact { .. } => ErrorClass::Usage,
            _ => ErrorClass::Structural,
        }
    }
}

impl fmt::Display for ForgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForgeError::DuplicateBareHandler {
                action,
                existing,
                member,
            } => write!(
                f,
                "duplicate bare handler for action {}: `{}` collides with `{}`",
                action, member, existing
            ),
            ForgeError::MultipleHookMethods {
                hook,
                existing,
                member,
            } => write!(
                f,
                "multiple {} methods specified: `{}` and `{}`",
                hook, existing, member
            ),
            ForgeError::DuplicateSelector { signature, member } => write!(
                f,
                "method `{}` reuses signature {} already routed by another method",
                member, signature
            ),
            ForgeError::InconsistentForms { member } => write!(
                f,
                "member `{}` declares that it uses execution context but its body takes no context",
                member
            ),
            ForgeError::ConflictingRoles { member } => write!(
                f,
                "member `{}` is configured as more than one of external method, bare handler and internal routine",
                member
            ),
            ForgeError::DuplicateMember { name } => {
                write!(f, "member `{}` is registered more than once", name)
            }
            ForgeError::State(e) => write!(f, "{}", e),
            ForgeError::InvalidConfig { message } => write!(f, "invalid build config: {}", message),
            ForgeError::MissingCompilerConnection { pending } => write!(
                f,
                "cannot finish build: missing compiler connection (pending sub-artifacts: {})",
                pending.join(", ")
            ),
            ForgeError::UnresolvedSubArtifact { name } => {
                write!(f, "sub-artifact `{}` has not been resolved yet", name)
            }
            ForgeError::NotBuilt { what } => write!(
                f,
                "{} not built yet, please build the programs first",
                what
            ),
        }
    }
}

impl std::error::Error for ForgeError {}

impl From<StateError> for ForgeError {
    fn from(e: StateError) -> Self {
        ForgeError::State(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes() {
        let missing = ForgeError::MissingCompilerConnection {
            pending: vec!["lsig".to_string()],
        };
        assert_eq!(missing.class(), ErrorClass::Resolution);
        assert!(missing.class().is_retryable());

        let dup = ForgeError::DuplicateMember {
            name: "x".to_string(),
        };
        assert_eq!(dup.class(), ErrorClass::Structural);
        assert!(!dup.class().is_retryable());

        let usage = ForgeError::NotBuilt {
            what: "approval program".to_string(),
        };
        assert_eq!(usage.class(), ErrorClass::Usage);
    }

    #[test]
    fn test_messages() {
        let e = ForgeError::MultipleHookMethods {
            hook: LifecycleHook::OptIn,
            existing: "a".to_string(),
            member: "b".to_string(),
        };
        assert_eq!(e.to_string(), "multiple opt in methods specified: `a` and `b`");

        let e = ForgeError::MissingCompilerConnection {
            pending: vec!["child".to_string()],
        };
        assert!(e.to_string().starts_with("cannot finish build: missing compiler connection"));
    }
}
