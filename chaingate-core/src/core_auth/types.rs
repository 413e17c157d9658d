//! Type definitions for Spaces, Channels and Permissions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a Space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceId(pub [u8; 32]);

impl SpaceId {
    /// Create a new random SpaceId
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut id = [0u8; 32];
        rand::rng().fill_bytes(&mut id);
        SpaceId(id)
    }

    /// Create SpaceId from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SpaceId(bytes)
    }

    /// Get bytes representation
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for SpaceId {
    fn from(bytes: [u8; 32]) -> Self {
        SpaceId(bytes)
    }
}

/// Unique identifier for a Channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
    /// Create a new random ChannelId
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut id = [0u8; 32];
        rand::rng().fill_bytes(&mut id);
        ChannelId(id)
    }

    /// Create ChannelId from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ChannelId(bytes)
    }

    /// Get bytes representation
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for ChannelId {
    fn from(bytes: [u8; 32]) -> Self {
        ChannelId(bytes)
    }
}

/// Permission requested on a space or channel.
///
/// `Undefined` is used for check kinds that carry no permission
/// (enabled-flag and membership lookups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Undefined,
    Read,
    Write,
    Invite,
    Join,
    Redact,
    ModifyBanning,
    PinMessage,
    AddRemoveChannels,
    ModifySpaceSettings,
    React,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Undefined => "Undefined",
            Permission::Read => "Read",
            Permission::Write => "Write",
            Permission::Invite => "Invite",
            Permission::Join => "Join",
            Permission::Redact => "Redact",
            Permission::ModifyBanning => "ModifyBanning",
            Permission::PinMessage => "PinMessage",
            Permission::AddRemoveChannels => "AddRemoveChannels",
            Permission::ModifySpaceSettings => "ModifySpaceSettings",
            Permission::React => "React",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
