//! Session metadata: the small sidecar written next to the raw event
//! file when a capture finishes. Without it the flat record file has no
//! self-describing length or thread count.

use crate::config::AnalysisConfig;
use crate::domain::{FormatError, TraceError};
use crate::trace::event_log::EventLog;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

const SESSION_MAGIC: u32 = 0x4D54_7373; // "MTss"
const SESSION_VERSION: u32 = 1;

/// Describes one finished capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMeta {
    /// Path of the raw event file, relative to the metadata file.
    pub event_path: String,
    pub total_events: u64,
    pub total_threads: u32,
}

impl SessionMeta {
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), FormatError> {
        writer.write_u32::<LittleEndian>(SESSION_MAGIC)?;
        writer.write_u32::<LittleEndian>(SESSION_VERSION)?;
        crate::codec::write_str(writer, &self.event_path)?;
        writer.write_u64::<LittleEndian>(self.total_events)?;
        writer.write_u32::<LittleEndian>(self.total_threads)?;
        Ok(())
    }

    pub fn load<R: Read>(reader: &mut R) -> Result<Self, FormatError> {
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != SESSION_MAGIC {
            return Err(FormatError::BadMagic { kind: "session", found: magic });
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != SESSION_VERSION {
            return Err(FormatError::UnsupportedVersion {
                kind: "session",
                found: version,
                expected: SESSION_VERSION,
            });
        }
        let event_path = crate::codec::read_str(reader)?;
        let total_events = reader.read_u64::<LittleEndian>()?;
        let total_threads = reader.read_u32::<LittleEndian>()?;
        Ok(Self { event_path, total_events, total_threads })
    }

    /// Open the event log this session describes.
    pub fn open_log(&self, config: &AnalysisConfig) -> Result<EventLog, TraceError> {
        EventLog::new(&self.event_path, self.total_events, config)
    }
}
