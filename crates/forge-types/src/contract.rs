//! Structural contract description (ordered method signatures and selectors).

use crate::abi::MethodSignature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArgJson {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractReturnsJson {
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMethodJson {
    pub name: String,
    pub args: Vec<ContractArgJson>,
    pub returns: ContractReturnsJson,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl From<&MethodSignature> for ContractMethodJson {
    fn from(sig: &MethodSignature) -> Self {
        Self {
            name: sig.name.clone(),
            args: sig
                .args
                .iter()
                .map(|a| ContractArgJson {
                    ty: a.ty.type_string(),
                    name: a.name.clone(),
                    desc: a.desc.clone(),
                })
                .collect(),
            returns: ContractReturnsJson {
                ty: sig
                    .returns
                    .as_ref()
                    .map(|r| r.type_string())
                    .unwrap_or_else(|| "void".to_string()),
            },
            selector: sig.selector_hex(),
            desc: sig.desc.clone(),
        }
    }
}

/// The interface document a compiler hands back alongside the programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    pub methods: Vec<ContractMethodJson>,
    #[serde(default)]
    pub networks: BTreeMap<String, serde_json::Value>,
}

impl ContractDescription {
    /// Build from method signatures, keeping their order.
    pub fn from_signatures<'a>(
        name: &str,
        desc: Option<&str>,
        signatures: impl IntoIterator<Item = &'a MethodSignature>,
    ) -> Self {
        Self {
            name: name.to_string(),
            desc: desc.map(str::to_string),
            methods: signatures.into_iter().map(ContractMethodJson::from).collect(),
            networks: BTreeMap::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&ContractMethodJson> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{AbiType, MethodArg};

    #[test]
    fn test_from_signatures_preserves_order() {
        let sigs = vec![
            MethodSignature {
                name: "zeta".to_string(),
                args: vec![],
                returns: None,
                desc: None,
            },
            MethodSignature {
                name: "alpha".to_string(),
                args: vec![MethodArg::new("v", AbiType::String)],
                returns: Some(AbiType::Uint64),
                desc: Some("first letter".to_string()),
            },
        ];
        let contract = ContractDescription::from_signatures("App", None, &sigs);
        let names: Vec<&str> = contract.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(contract.methods[1].returns.ty, "uint64");
        assert_eq!(contract.methods[0].returns.ty, "void");
        assert_eq!(contract.method("alpha").unwrap().args[0].ty, "string");
    }
}
