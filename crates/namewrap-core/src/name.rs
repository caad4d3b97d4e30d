//! Names as ordered label sequences.
//!
//! A [`DnsName`] owns its labels, leftmost first. Child names are derived by
//! prepending a label. The length-prefixed wire form
//! (`len || label ... || 0x00`) only exists at serialization boundaries:
//! [`DnsName::to_wire`] and [`DnsName::from_wire`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::namehash;
use crate::error::{CoreError, Result};
use crate::types::{LabelHash, Node};
use crate::validation::{validate_label, validate_text_label, MAX_WIRE_LEN};

/// A single validated label (1 to 255 bytes).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Label(Vec<u8>);

impl Label {
    /// Build a label from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        validate_label(&bytes)?;
        Ok(Self(bytes))
    }

    /// Build a label from text, rejecting embedded separators.
    pub fn parse(text: &str) -> Result<Self> {
        validate_text_label(text)?;
        Ok(Self(text.as_bytes().to_vec()))
    }

    /// The label's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hash of this label.
    pub fn hash(&self) -> LabelHash {
        LabelHash::of(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<u8>> for Label {
    type Error = CoreError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Label::new(bytes)
    }
}

impl From<Label> for Vec<u8> {
    fn from(label: Label) -> Self {
        label.0
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A full name: labels ordered from the leftmost (most specific) label to
/// the rightmost one under the root.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DnsName {
    labels: Vec<Label>,
}

impl DnsName {
    /// The root name (no labels).
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a name from labels, leftmost first.
    pub fn from_labels(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Parse dotted text such as `"alice.eth"`. The empty string is the root.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let labels = text
            .split('.')
            .map(Label::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of labels.
    pub fn depth(&self) -> usize {
        self.labels.len()
    }

    /// The leftmost label, if any.
    pub fn first_label(&self) -> Option<&Label> {
        self.labels.first()
    }

    /// The name with its leftmost label removed. The root's parent is the root.
    pub fn parent(&self) -> DnsName {
        Self {
            labels: self.labels.iter().skip(1).cloned().collect(),
        }
    }

    /// Derive a child name by prepending `label`.
    pub fn child(&self, label: Label) -> DnsName {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push(label);
        labels.extend(self.labels.iter().cloned());
        Self { labels }
    }

    /// Node of this name.
    pub fn node(&self) -> Node {
        namehash(self)
    }

    /// Node of the parent name.
    pub fn parent_node(&self) -> Node {
        namehash(&self.parent())
    }

    /// Encode as length-prefixed labels followed by a zero byte.
    pub fn to_wire(&self) -> Vec<u8> {
        let len = self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1;
        let mut buf = Vec::with_capacity(len);
        for label in &self.labels {
            // Label length is bounded to 255 at construction.
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);
        buf
    }

    /// Decode the wire form produced by [`DnsName::to_wire`].
    ///
    /// Rejects truncated input and trailing bytes after the terminator.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_WIRE_LEN {
            return Err(CoreError::IncompatibleName(format!(
                "encoded name is {} bytes",
                bytes.len()
            )));
        }

        let mut labels = Vec::new();
        let mut offset = 0;
        loop {
            let len = *bytes
                .get(offset)
                .ok_or_else(|| CoreError::IncompatibleName("missing terminator".into()))?
                as usize;
            offset += 1;

            if len == 0 {
                break;
            }

            let end = offset + len;
            let label = bytes
                .get(offset..end)
                .ok_or_else(|| CoreError::IncompatibleName("truncated label".into()))?;
            labels.push(Label::new(label.to_vec())?);
            offset = end;
        }

        if offset != bytes.len() {
            return Err(CoreError::IncompatibleName(
                "trailing bytes after terminator".into(),
            ));
        }

        Ok(Self { labels })
    }
}

impl fmt::Debug for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DnsName({})", self)
    }
}

impl fmt::Display for DnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", label)?;
        }
        Ok(())
    }
}
