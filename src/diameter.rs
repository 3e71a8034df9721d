/*
 * Diameter Header.
 *
 * Raw packet format:
 *   0                   1                   2                   3
 *   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |    Version    |                 Message Length                |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  | command flags |                  Command-Code                 |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                         Application-ID                        |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                      Hop-by-Hop Identifier                    |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                      End-to-End Identifier                    |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *
 * Command Flags:
 *   0 1 2 3 4 5 6 7
 *  +-+-+-+-+-+-+-+-+  R(equest), P(roxyable), E(rror)
 *  |R P E T r r r r|  T(Potentially re-transmitted message), r(eserved)
 *  +-+-+-+-+-+-+-+-+
 *
 */

use crate::avp::{Avp, AvpSpec};
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use std::io::{Read, Seek, Write};
use std::sync::Arc;

/// Command flags, as raw bits, mirroring how AVP flags are carried in `avp::flags`.
pub mod flags {
    pub const REQUEST: u8 = 0x80;
    pub const PROXYABLE: u8 = 0x40;
    pub const ERROR: u8 = 0x20;
    pub const RETRANSMIT: u8 = 0x10;
}

/// Command codes this HSS speaks: the base protocol's capability-exchange,
/// watchdog and disconnect triplet, plus the five S6a/S6d commands (TS 29.272).
/// `Unknown` carries any other code through so the peer layer can still answer
/// it with DIAMETER_COMMAND_UNSUPPORTED instead of failing to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    CapabilitiesExchange,
    DeviceWatchdog,
    DisconnectPeer,
    CancelLocation,
    UpdateLocation,
    AuthenticationInformation,
    PurgeUE,
    Notify,
    Unknown(u32),
}

impl CommandCode {
    pub fn code(&self) -> u32 {
        match self {
            CommandCode::CapabilitiesExchange => 257,
            CommandCode::DeviceWatchdog => 280,
            CommandCode::DisconnectPeer => 282,
            CommandCode::CancelLocation => 317,
            CommandCode::UpdateLocation => 316,
            CommandCode::AuthenticationInformation => 318,
            CommandCode::PurgeUE => 321,
            CommandCode::Notify => 323,
            CommandCode::Unknown(code) => *code,
        }
    }
}

impl From<u32> for CommandCode {
    fn from(code: u32) -> CommandCode {
        match code {
            257 => CommandCode::CapabilitiesExchange,
            280 => CommandCode::DeviceWatchdog,
            282 => CommandCode::DisconnectPeer,
            317 => CommandCode::CancelLocation,
            316 => CommandCode::UpdateLocation,
            318 => CommandCode::AuthenticationInformation,
            321 => CommandCode::PurgeUE,
            323 => CommandCode::Notify,
            other => CommandCode::Unknown(other),
        }
    }
}

/// Application-ids this HSS speaks: the base/common application used for
/// CER/CEA and DWR/DWA, and the 3GPP S6a application. `Unknown` lets an
/// unrecognised application-id still round-trip through the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationId {
    Common,
    S6a,
    Unknown(u32),
}

impl ApplicationId {
    pub fn id(&self) -> u32 {
        match self {
            ApplicationId::Common => 0,
            ApplicationId::S6a => 16777251,
            ApplicationId::Unknown(id) => *id,
        }
    }
}

impl From<u32> for ApplicationId {
    fn from(id: u32) -> ApplicationId {
        match id {
            0 => ApplicationId::Common,
            16777251 => ApplicationId::S6a,
            other => ApplicationId::Unknown(other),
        }
    }
}

#[derive(Debug)]
pub struct DiameterHeader {
    pub version: u8,
    pub length: u32,
    pub flags: u8,
    pub code: CommandCode,
    pub application_id: ApplicationId,
    pub hop_by_hop_id: u32,
    pub end_to_end_id: u32,
}

impl DiameterHeader {
    pub const LENGTH: u32 = 20;

    pub fn decode_from<R: Read>(reader: &mut R) -> Result<DiameterHeader> {
        let mut b = [0; 20];
        reader.read_exact(&mut b)?;

        let version = b[0];
        let length = u32::from_be_bytes([0, b[1], b[2], b[3]]);
        let flags = b[4];
        let code = u32::from_be_bytes([0, b[5], b[6], b[7]]);
        let application_id = u32::from_be_bytes([b[8], b[9], b[10], b[11]]);
        let hop_by_hop_id = u32::from_be_bytes([b[12], b[13], b[14], b[15]]);
        let end_to_end_id = u32::from_be_bytes([b[16], b[17], b[18], b[19]]);

        if version != 1 {
            return Err(Error::DecodeError(format!(
                "unsupported Diameter version: {}",
                version
            )));
        }

        Ok(DiameterHeader {
            version,
            length,
            flags,
            code: CommandCode::from(code),
            application_id: ApplicationId::from(application_id),
            hop_by_hop_id,
            end_to_end_id,
        })
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.version])?;
        writer.write_all(&self.length.to_be_bytes()[1..4])?;
        writer.write_all(&[self.flags])?;
        writer.write_all(&self.code.code().to_be_bytes()[1..4])?;
        writer.write_all(&self.application_id.id().to_be_bytes())?;
        writer.write_all(&self.hop_by_hop_id.to_be_bytes())?;
        writer.write_all(&self.end_to_end_id.to_be_bytes())?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct DiameterMessage {
    pub header: DiameterHeader,
    pub avps: Vec<Avp>,
    dict: Arc<Dictionary>,
}

impl DiameterMessage {
    pub fn new(
        code: CommandCode,
        application_id: ApplicationId,
        flags: u8,
        hop_by_hop_id: u32,
        end_to_end_id: u32,
        dict: Arc<Dictionary>,
    ) -> DiameterMessage {
        DiameterMessage {
            header: DiameterHeader {
                version: 1,
                length: DiameterHeader::LENGTH,
                flags,
                code,
                application_id,
                hop_by_hop_id,
                end_to_end_id,
            },
            avps: Vec::new(),
            dict,
        }
    }

    /// Builds an answer preamble for `req`: same command code and
    /// application-id, request flag cleared, hop-by-hop/end-to-end ids
    /// copied over so the peer layer's transaction table can match it.
    pub fn new_answer(req: &DiameterMessage) -> DiameterMessage {
        DiameterMessage::new(
            req.header.code,
            req.header.application_id,
            req.header.flags & !self::flags::REQUEST,
            req.header.hop_by_hop_id,
            req.header.end_to_end_id,
            Arc::clone(&req.dict),
        )
    }

    pub fn dictionary(&self) -> Arc<Dictionary> {
        Arc::clone(&self.dict)
    }

    pub fn get_command_code(&self) -> CommandCode {
        self.header.code
    }

    pub fn get_application_id(&self) -> ApplicationId {
        self.header.application_id
    }

    pub fn get_flags(&self) -> u8 {
        self.header.flags
    }

    pub fn is_request(&self) -> bool {
        self.header.flags & self::flags::REQUEST != 0
    }

    pub fn get_hop_by_hop_id(&self) -> u32 {
        self.header.hop_by_hop_id
    }

    pub fn get_end_to_end_id(&self) -> u32 {
        self.header.end_to_end_id
    }

    pub fn add_avp(&mut self, spec: AvpSpec) -> &mut DiameterMessage {
        let avp = Avp::new(spec.code, spec.vendor_id, spec.flags, spec.value, Arc::clone(&self.dict));
        self.avps.push(avp);
        self.header.length += avp_wire_len(self.avps.last().unwrap());
        self
    }

    pub fn get_avp(&self, code: u32) -> Option<&Avp> {
        self.avps.iter().find(|avp| avp.get_code() == code)
    }

    /// Polymorphic lookup by dictionary name, as called out in §4.1: returns
    /// `Ok(None)` when absent, `Err` only if the name is not in the dictionary
    /// at all (a programming error, not a wire condition).
    pub fn get_avp_by_name(&self, name: &str) -> Result<Option<&Avp>> {
        let (vendor_id, code) = self
            .dict
            .get_avp_code(name)
            .ok_or_else(|| Error::UnknownAvpCode(0))?;
        let vendor_id = if vendor_id == 0 { None } else { Some(vendor_id) };
        Ok(self
            .avps
            .iter()
            .find(|avp| avp.get_code() == code && avp.get_vendor_id() == vendor_id))
    }

    pub fn decode_from<R: Read + Seek>(reader: &mut R, dict: Arc<Dictionary>) -> Result<DiameterMessage> {
        let header = DiameterHeader::decode_from(reader)?;
        let body_len = header.length.saturating_sub(DiameterHeader::LENGTH);

        let mut avps = Vec::new();
        let mut offset = 0u32;
        while offset < body_len {
            let avp = Avp::decode_from(reader, Arc::clone(&dict))?;
            offset += avp_wire_len(&avp);
            avps.push(avp);
        }

        Ok(DiameterMessage { header, avps, dict })
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header.encode_to(writer)?;
        for avp in &self.avps {
            avp.encode_to(writer)?;
        }
        Ok(())
    }
}

fn avp_wire_len(avp: &Avp) -> u32 {
    avp.get_length() + avp.get_padding() as u32
}
