//! Name test vectors.
//!
//! The wire form of a name is fixed: each label as `len || bytes`, then a
//! zero byte. These vectors pin it down so stored names stay readable
//! across versions.

use namewrap_core::{DnsName, Node};

/// A name with its expected wire encoding.
#[derive(Debug, Clone)]
pub struct NameVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Dotted text form.
    pub text: &'static str,
    /// Expected wire bytes (hex).
    pub expected_wire: &'static str,
}

/// Get all name vectors.
pub fn all_vectors() -> Vec<NameVector> {
    vec![
        NameVector {
            name: "root",
            text: "",
            expected_wire: "00",
        },
        NameVector {
            name: "suffix",
            text: "eth",
            expected_wire: "0365746800",
        },
        NameVector {
            name: "leaf",
            text: "alice.eth",
            expected_wire: "05616c6963650365746800",
        },
        NameVector {
            name: "subname",
            text: "sub.alice.eth",
            expected_wire: "0373756205616c6963650365746800",
        },
    ]
}

/// Check every vector, returning `(name, matches, actual_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .into_iter()
        .map(|v| {
            let actual = match DnsName::parse(v.text) {
                Ok(name) => hex::encode(name.to_wire()),
                Err(e) => format!("parse error: {e}"),
            };
            (v.name.to_string(), actual == v.expected_wire, actual)
        })
        .collect()
}

/// The node of `text`, computed label by label from the root.
pub fn node_by_folding(text: &str) -> Option<Node> {
    let name = DnsName::parse(text).ok()?;
    Some(
        name.labels()
            .iter()
            .rev()
            .fold(Node::ROOT, |node, label| node.child(&label.hash())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, actual) in verify_all_vectors() {
            assert!(matches, "vector {name} encoded as {actual}");
        }
    }

    #[test]
    fn test_vectors_decode_back() {
        for v in all_vectors() {
            let bytes = hex::decode(v.expected_wire).unwrap();
            let decoded = DnsName::from_wire(&bytes).unwrap();
            assert_eq!(decoded.to_string(), v.text, "vector {}", v.name);
        }
    }

    #[test]
    fn test_namehash_matches_folding() {
        for v in all_vectors() {
            let name = DnsName::parse(v.text).unwrap();
            assert_eq!(Some(name.node()), node_by_folding(v.text), "vector {}", v.name);
        }
    }

    #[test]
    fn test_names_serialize_as_json() {
        let name = DnsName::parse("alice.eth").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        let back: DnsName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
