//! ABI method signatures and selectors.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use std::fmt;

/// Length of a method selector in bytes.
pub const SELECTOR_LEN: usize = 4;

/// ABI argument/return types understood by the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiType {
    Bool,
    Byte,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Address,
    String,
    /// Dynamic byte array (`byte[]`).
    DynamicBytes,
    /// Static byte array (`byte[N]`).
    StaticBytes(usize),
    /// Reference types passed through the transaction's foreign arrays.
    Account,
    Asset,
    Application,
}

impl AbiType {
    pub fn type_string(&self) -> String {
        match self {
            AbiType::Bool => "bool".to_string(),
            AbiType::Byte => "byte".to_string(),
            AbiType::Uint8 => "uint8".to_string(),
            AbiType::Uint16 => "uint16".to_string(),
            AbiType::Uint32 => "uint32".to_string(),
            AbiType::Uint64 => "uint64".to_string(),
            AbiType::Address => "address".to_string(),
            AbiType::String => "string".to_string(),
            AbiType::DynamicBytes => "byte[]".to_string(),
            AbiType::StaticBytes(n) => format!("byte[{}]", n),
            AbiType::Account => "account".to_string(),
            AbiType::Asset => "asset".to_string(),
            AbiType::Application => "application".to_string(),
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_string())
    }
}

/// A named method argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AbiType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl MethodArg {
    pub fn new(name: impl Into<String>, ty: AbiType) -> Self {
        Self {
            name: name.into(),
            ty,
            desc: None,
        }
    }
}

/// Fully-named method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    pub args: Vec<MethodArg>,
    /// `None` means `void`.
    #[serde(default)]
    pub returns: Option<AbiType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl MethodSignature {
    /// Canonical signature string, e.g. `set(uint8,uint64)void`.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|a| a.ty.type_string()).collect();
        let ret = self
            .returns
            .as_ref()
            .map(|r| r.type_string())
            .unwrap_or_else(|| "void".to_string());
        format!("{}({}){}", self.name, args.join(","), ret)
    }

    /// First four bytes of SHA-512/256 over the signature string.
    pub fn selector(&self) -> [u8; SELECTOR_LEN] {
        let digest = Sha512_256::digest(self.signature().as_bytes());
        let mut out = [0u8; SELECTOR_LEN];
        out.copy_from_slice(&digest[..SELECTOR_LEN]);
        out
    }

    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector()))
    }

    pub fn arg_names(&self) -> Vec<String> {
        self.args.iter().map(|a| a.name.clone()).collect()
    }
}
