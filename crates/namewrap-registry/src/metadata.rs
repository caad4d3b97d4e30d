//! Static metadata service.

use namewrap_core::Node;

use crate::traits::MetadataService;

/// Builds `"{base_url}/{node_hex}"` for every node.
#[derive(Debug, Clone)]
pub struct StaticMetadata {
    base_url: String,
}

impl StaticMetadata {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl MetadataService for StaticMetadata {
    fn uri(&self, node: &Node) -> String {
        format!("{}/0x{}", self.base_url, node.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_format() {
        let metadata = StaticMetadata::new("https://metadata.example/");
        let node = Node::from_bytes([0xab; 32]);
        assert_eq!(
            metadata.uri(&node),
            format!("https://metadata.example/0x{}", "ab".repeat(32))
        );
    }
}
