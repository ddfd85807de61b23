//! Transcript types shared by the sequencer and the renderer
//!
//! Nothing here knows about terminals or timing.

/// A chat message in the scripted conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Read-only map view shown by reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEmbed {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Message(ChatMessage),
    Map(MapEmbed),
}

impl TranscriptEntry {
    #[cfg(test)]
    pub fn as_message(&self) -> Option<&ChatMessage> {
        match self {
            TranscriptEntry::Message(msg) => Some(msg),
            TranscriptEntry::Map(_) => None,
        }
    }
}

/// Append-only list of entries, cleared only as a whole
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push_message(&mut self, role: ChatRole, content: impl Into<String>) {
        self.entries.push(TranscriptEntry::Message(ChatMessage {
            role,
            content: content.into(),
        }));
    }

    pub fn push_map(&mut self, map: MapEmbed) {
        self.entries.push(TranscriptEntry::Map(map));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
