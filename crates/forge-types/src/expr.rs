//! Program expression tree.
//!
//! `Expr` is the handoff format between handler bodies and the low-level
//! compiler collaborator. It is deliberately small: state access, sequencing,
//! a handful of arithmetic/byte helpers and an `Op` passthrough for anything
//! backend specific. Nothing here selects instructions.
//!
//! Expressions are serde-serializable so they can be written by hand in a
//! JSON manifest:
//!
//! ```json
//! {"seq": [{"global_put": {"key": {"bytes": "counter"}, "value": {"int": 0}}}, "approve"]}
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Stack type of a stored or computed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Uint64,
    Bytes,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Uint64 => "uint64",
            ValueType::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const HEX_PREFIX: &str = "0x";

/// Byte string literal.
///
/// Serializes as a plain string when the bytes are valid UTF-8 and as a
/// `0x`-prefixed hex string otherwise. Text that itself starts with `0x` is
/// hex-encoded too, so every serialized form decodes back to the same bytes.
/// Deserializing a string that starts with `0x` and holds valid hex yields
/// the decoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 text when that reads back unambiguously, `0x` hex otherwise.
    pub fn display_string(&self) -> String {
        match std::str::from_utf8(&self.0) {
            Ok(s) if !s.starts_with(HEX_PREFIX) => s.to_string(),
            _ => format!("{}{}", HEX_PREFIX, hex::encode(&self.0)),
        }
    }
}

impl From<&str> for Bytes {
    fn from(s: &str) -> Self {
        Bytes(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Bytes(v)
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display_string())
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if let Some(stripped) = s.strip_prefix(HEX_PREFIX) {
            if let Ok(decoded) = hex::decode(stripped) {
                return Ok(Bytes(decoded));
            }
        }
        Ok(Bytes(s.into_bytes()))
    }
}

/// A program expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Int(u64),
    Bytes(Bytes),
    /// Evaluate in order; an empty sequence is a no-op.
    Seq(Vec<Expr>),
    Approve,
    Reject,
    /// Address of the account that sent the current call.
    Sender,
    /// Address of the application being called.
    CurrentAppAddress,
    /// Id of the application being called.
    CurrentAppId,
    /// Named argument of the enclosing method or routine.
    Arg(String),
    /// Set the ABI return value of the enclosing method.
    Output(Box<Expr>),
    GlobalGet(Box<Expr>),
    GlobalExists(Box<Expr>),
    GlobalPut {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    GlobalDel(Box<Expr>),
    LocalGet {
        account: Box<Expr>,
        key: Box<Expr>,
    },
    LocalExists {
        account: Box<Expr>,
        key: Box<Expr>,
    },
    LocalPut {
        account: Box<Expr>,
        key: Box<Expr>,
        value: Box<Expr>,
    },
    LocalDel {
        account: Box<Expr>,
        key: Box<Expr>,
    },
    Concat(Box<Expr>, Box<Expr>),
    /// Big-endian 8-byte encoding of a uint64.
    Itob(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Assert(Box<Expr>),
    /// Call an internal routine by name.
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Backend-specific operation, passed through untouched.
    Op {
        op: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn int(value: u64) -> Self {
        Expr::Int(value)
    }

    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Expr::Bytes(value.into())
    }

    pub fn seq(items: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Seq(items.into_iter().collect())
    }

    pub fn noop() -> Self {
        Expr::Seq(Vec::new())
    }

    pub fn arg(name: impl Into<String>) -> Self {
        Expr::Arg(name.into())
    }

    pub fn concat(left: Expr, right: Expr) -> Self {
        Expr::Concat(Box::new(left), Box::new(right))
    }

    pub fn itob(value: Expr) -> Self {
        Expr::Itob(Box::new(value))
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Expr::Add(Box::new(left), Box::new(right))
    }

    pub fn sub(left: Expr, right: Expr) -> Self {
        Expr::Sub(Box::new(left), Box::new(right))
    }

    pub fn not(value: Expr) -> Self {
        Expr::Not(Box::new(value))
    }

    pub fn assert(cond: Expr) -> Self {
        Expr::Assert(Box::new(cond))
    }

    pub fn output(value: Expr) -> Self {
        Expr::Output(Box::new(value))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn op(op: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Op {
            op: op.into(),
            args,
        }
    }

    /// True for `Seq([])` and nested empty sequences.
    pub fn is_noop(&self) -> bool {
        match self {
            Expr::Seq(items) => items.iter().all(Expr::is_noop),
            _ => false,
        }
    }

    /// Names of internal routines called anywhere in this expression.
    pub fn called_routines(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.visit(&mut |e| {
            if let Expr::Call { name, .. } = e {
                out.push(name.as_str());
            }
        });
        out
    }

    /// Pre-order traversal.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Int(_)
            | Expr::Bytes(_)
            | Expr::Approve
            | Expr::Reject
            | Expr::Sender
            | Expr::CurrentAppAddress
            | Expr::CurrentAppId
            | Expr::Arg(_) => {}
            Expr::Seq(items) | Expr::Call { args: items, .. } | Expr::Op { args: items, .. } => {
                for item in items {
                    item.visit(f);
                }
            }
            Expr::Output(a)
            | Expr::GlobalGet(a)
            | Expr::GlobalExists(a)
            | Expr::GlobalDel(a)
            | Expr::Itob(a)
            | Expr::Not(a)
            | Expr::Assert(a) => a.visit(f),
            Expr::GlobalPut { key, value } => {
                key.visit(f);
                value.visit(f);
            }
            Expr::LocalGet { account, key }
            | Expr::LocalExists { account, key }
            | Expr::LocalDel { account, key } => {
                account.visit(f);
                key.visit(f);
            }
            Expr::LocalPut {
                account,
                key,
                value,
            } => {
                account.visit(f);
                key.visit(f);
                value.visit(f);
            }
            Expr::Concat(a, b) | Expr::Add(a, b) | Expr::Sub(a, b) => {
                a.visit(f);
                b.visit(f);
            }
        }
    }
}
