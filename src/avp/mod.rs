/*
 * AVP format:
 *   0                   1                   2                   3
 *   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                           AVP Code                            |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |V M P r r r r r|                 AVP Length                    |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                        Vendor-ID (optional)                   |
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *  |                             Data ...
 *  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
 *
 * V(endor), M(andatory), P(rivate), r(eserved)
 */

pub mod enumerated;
pub mod float32;
pub mod float64;
pub mod group;
pub mod identity;
pub mod integer32;
pub mod integer64;
pub mod ipv4;
pub mod ipv6;
pub mod octetstring;
pub mod time;
pub mod unsigned32;
pub mod unsigned64;
pub mod uri;
pub mod utf8string;

use crate::dictionary::{AvpTypeDef, Dictionary};
use crate::error::Result;
use core::fmt;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::sync::Arc;

pub use self::enumerated::Enumerated;
pub use self::float32::Float32;
pub use self::float64::Float64;
pub use self::group::Grouped;
pub use self::identity::Identity;
pub use self::integer32::Integer32;
pub use self::integer64::Integer64;
pub use self::ipv4::IPv4;
pub use self::ipv6::IPv6;
pub use self::octetstring::OctetString;
pub use self::time::Time;
pub use self::unsigned32::Unsigned32;
pub use self::unsigned64::Unsigned64;
pub use self::uri::DiameterURI;
pub use self::utf8string::UTF8String;

/// AVP flags, as raw bits rather than a struct, mirroring how command
/// flags are carried on `DiameterHeader`.
pub mod flags {
    pub const V: u8 = 0x80;
    pub const M: u8 = 0x40;
    pub const P: u8 = 0x20;
}

#[derive(Debug, Clone)]
pub struct AvpHeader {
    code: u32,
    flags: u8,
    length: u32,
    vendor_id: Option<u32>,
}

impl AvpHeader {
    pub fn decode_from<R: Read>(reader: &mut R) -> Result<AvpHeader> {
        let mut b = [0; 8];
        reader.read_exact(&mut b)?;

        let code = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
        let flags = b[4];
        let length = u32::from_be_bytes([0, b[5], b[6], b[7]]);

        if flags & self::flags::V != 0 {
            let mut b = [0; 4];
            reader.read_exact(&mut b)?;
            let vendor_id = u32::from_be_bytes(b);
            Ok(AvpHeader {
                code,
                flags,
                length,
                vendor_id: Some(vendor_id),
            })
        } else {
            Ok(AvpHeader {
                code,
                flags,
                length,
                vendor_id: None,
            })
        }
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.code.to_be_bytes())?;
        writer.write_all(&[self.flags])?;
        writer.write_all(&self.length.to_be_bytes()[1..4])?;
        if let Some(vendor_id) = self.vendor_id {
            writer.write_all(&vendor_id.to_be_bytes())?;
        }
        Ok(())
    }

    pub fn header_length(&self) -> u32 {
        if self.vendor_id.is_some() {
            12
        } else {
            8
        }
    }
}

#[derive(Debug, Clone)]
pub enum AvpValue {
    AddressIPv4(IPv4),
    AddressIPv6(IPv6),
    Identity(Identity),
    DiameterURI(DiameterURI),
    Enumerated(Enumerated),
    Float32(Float32),
    Float64(Float64),
    Grouped(Grouped),
    Integer32(Integer32),
    Integer64(Integer64),
    OctetString(OctetString),
    Time(Time),
    Unsigned32(Unsigned32),
    Unsigned64(Unsigned64),
    UTF8String(UTF8String),
}

impl fmt::Display for AvpValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AvpValue::AddressIPv4(v) => v.fmt(f),
            AvpValue::AddressIPv6(v) => v.fmt(f),
            AvpValue::Identity(v) => v.fmt(f),
            AvpValue::DiameterURI(v) => v.fmt(f),
            AvpValue::Enumerated(v) => v.fmt(f),
            AvpValue::Float32(v) => v.fmt(f),
            AvpValue::Float64(v) => v.fmt(f),
            AvpValue::Grouped(v) => v.fmt(f),
            AvpValue::Integer32(v) => v.fmt(f),
            AvpValue::Integer64(v) => v.fmt(f),
            AvpValue::OctetString(v) => v.fmt(f),
            AvpValue::Time(v) => v.fmt(f),
            AvpValue::Unsigned32(v) => v.fmt(f),
            AvpValue::Unsigned64(v) => v.fmt(f),
            AvpValue::UTF8String(v) => v.fmt(f),
        }
    }
}

impl AvpValue {
    pub fn length(&self) -> u32 {
        match self {
            AvpValue::AddressIPv4(v) => v.length(),
            AvpValue::AddressIPv6(v) => v.length(),
            AvpValue::Identity(v) => v.length(),
            AvpValue::DiameterURI(v) => v.length(),
            AvpValue::Enumerated(v) => v.length(),
            AvpValue::Float32(v) => v.length(),
            AvpValue::Float64(v) => v.length(),
            AvpValue::Grouped(v) => v.length(),
            AvpValue::Integer32(v) => v.length(),
            AvpValue::Integer64(v) => v.length(),
            AvpValue::OctetString(v) => v.length(),
            AvpValue::Time(v) => v.length(),
            AvpValue::Unsigned32(v) => v.length(),
            AvpValue::Unsigned64(v) => v.length(),
            AvpValue::UTF8String(v) => v.length(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AvpValue::AddressIPv4(_) => "Address",
            AvpValue::AddressIPv6(_) => "Address",
            AvpValue::Identity(_) => "DiameterIdentity",
            AvpValue::DiameterURI(_) => "DiameterURI",
            AvpValue::Enumerated(_) => "Enumerated",
            AvpValue::Float32(_) => "Float32",
            AvpValue::Float64(_) => "Float64",
            AvpValue::Grouped(_) => "Grouped",
            AvpValue::Integer32(_) => "Integer32",
            AvpValue::Integer64(_) => "Integer64",
            AvpValue::OctetString(_) => "OctetString",
            AvpValue::Time(_) => "Time",
            AvpValue::Unsigned32(_) => "Unsigned32",
            AvpValue::Unsigned64(_) => "Unsigned64",
            AvpValue::UTF8String(_) => "UTF8String",
        }
    }

    fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            AvpValue::AddressIPv4(v) => v.encode_to(writer),
            AvpValue::AddressIPv6(v) => v.encode_to(writer),
            AvpValue::Identity(v) => v.encode_to(writer),
            AvpValue::DiameterURI(v) => v.encode_to(writer),
            AvpValue::Enumerated(v) => v.encode_to(writer),
            AvpValue::Float32(v) => v.encode_to(writer),
            AvpValue::Float64(v) => v.encode_to(writer),
            AvpValue::Grouped(v) => v.encode_to(writer),
            AvpValue::Integer32(v) => v.encode_to(writer),
            AvpValue::Integer64(v) => v.encode_to(writer),
            AvpValue::OctetString(v) => v.encode_to(writer),
            AvpValue::Time(v) => v.encode_to(writer),
            AvpValue::Unsigned32(v) => v.encode_to(writer),
            AvpValue::Unsigned64(v) => v.encode_to(writer),
            AvpValue::UTF8String(v) => v.encode_to(writer),
        }
    }
}

macro_rules! impl_from_avp_value {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for AvpValue {
            fn from(value: $ty) -> Self {
                AvpValue::$variant(value)
            }
        }
    };
}

impl_from_avp_value!(AddressIPv4, IPv4);
impl_from_avp_value!(AddressIPv6, IPv6);
impl_from_avp_value!(Identity, Identity);
impl_from_avp_value!(DiameterURI, DiameterURI);
impl_from_avp_value!(Enumerated, Enumerated);
impl_from_avp_value!(Float32, Float32);
impl_from_avp_value!(Float64, Float64);
impl_from_avp_value!(Grouped, Grouped);
impl_from_avp_value!(Integer32, Integer32);
impl_from_avp_value!(Integer64, Integer64);
impl_from_avp_value!(OctetString, OctetString);
impl_from_avp_value!(Time, Time);
impl_from_avp_value!(Unsigned32, Unsigned32);
impl_from_avp_value!(Unsigned64, Unsigned64);
impl_from_avp_value!(UTF8String, UTF8String);

#[derive(Debug, Clone)]
pub struct Avp {
    header: AvpHeader,
    value: AvpValue,
    padding: u8,
    dict: Arc<Dictionary>,
}

impl Avp {
    pub fn new(
        code: u32,
        vendor_id: Option<u32>,
        flags: u8,
        value: AvpValue,
        dict: Arc<Dictionary>,
    ) -> Avp {
        let header_flags = flags | if vendor_id.is_some() { self::flags::V } else { 0 };
        let header_length = if vendor_id.is_some() { 12 } else { 8 };
        let padding = Avp::pad_to_32_bits(value.length());
        let header = AvpHeader {
            code,
            flags: header_flags,
            length: header_length + value.length(),
            vendor_id,
        };
        Avp {
            header,
            value,
            padding,
            dict,
        }
    }

    pub fn get_code(&self) -> u32 {
        self.header.code
    }

    pub fn get_flags(&self) -> u8 {
        self.header.flags
    }

    pub fn is_mandatory(&self) -> bool {
        self.header.flags & self::flags::M != 0
    }

    pub fn get_vendor_id(&self) -> Option<u32> {
        self.header.vendor_id
    }

    pub fn get_length(&self) -> u32 {
        self.header.length
    }

    pub fn get_padding(&self) -> u8 {
        self.padding
    }

    pub fn get_value(&self) -> &AvpValue {
        &self.value
    }

    pub fn decode_from<R: Read + Seek>(reader: &mut R, dict: Arc<Dictionary>) -> Result<Avp> {
        let header = AvpHeader::decode_from(reader)?;
        let value_length = header.length - header.header_length();

        let avp_type = dict
            .get_avp_type(header.vendor_id.unwrap_or(0), header.code)
            .unwrap_or(AvpTypeDef::OctetString);

        let value = match avp_type {
            AvpTypeDef::AddressIPv4 => AvpValue::AddressIPv4(IPv4::decode_from(reader)?),
            AvpTypeDef::AddressIPv6 => AvpValue::AddressIPv6(IPv6::decode_from(reader)?),
            AvpTypeDef::Float32 => AvpValue::Float32(Float32::decode_from(reader)?),
            AvpTypeDef::Float64 => AvpValue::Float64(Float64::decode_from(reader)?),
            AvpTypeDef::Enumerated => AvpValue::Enumerated(Enumerated::decode_from(reader)?),
            AvpTypeDef::Integer32 => AvpValue::Integer32(Integer32::decode_from(reader)?),
            AvpTypeDef::Integer64 => AvpValue::Integer64(Integer64::decode_from(reader)?),
            AvpTypeDef::Unsigned32 => AvpValue::Unsigned32(Unsigned32::decode_from(reader)?),
            AvpTypeDef::Unsigned64 => AvpValue::Unsigned64(Unsigned64::decode_from(reader)?),
            AvpTypeDef::UTF8String => {
                AvpValue::UTF8String(UTF8String::decode_from(reader, value_length as usize)?)
            }
            AvpTypeDef::OctetString => {
                AvpValue::OctetString(OctetString::decode_from(reader, value_length as usize)?)
            }
            AvpTypeDef::Identity => {
                AvpValue::Identity(Identity::decode_from(reader, value_length as usize)?)
            }
            AvpTypeDef::DiameterURI => {
                AvpValue::DiameterURI(DiameterURI::decode_from(reader, value_length as usize)?)
            }
            AvpTypeDef::Time => AvpValue::Time(Time::decode_from(reader)?),
            AvpTypeDef::Grouped => AvpValue::Grouped(Grouped::decode_from(
                reader,
                value_length as usize,
                Arc::clone(&dict),
            )?),
        };

        let padding = Avp::pad_to_32_bits(value_length);
        if padding > 0 {
            reader.seek(SeekFrom::Current(padding as i64))?;
        }

        Ok(Avp {
            header,
            value,
            padding,
            dict,
        })
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header.encode_to(writer)?;
        self.value.encode_to(writer)?;
        for _ in 0..self.padding {
            writer.write_all(&[0])?;
        }
        Ok(())
    }

    fn pad_to_32_bits(length: u32) -> u8 {
        ((4 - (length & 0b11)) % 4) as u8
    }

    pub fn get_integer32(&self) -> Option<i32> {
        match &self.value {
            AvpValue::Integer32(v) => Some(v.value()),
            _ => None,
        }
    }

    pub fn get_integer64(&self) -> Option<i64> {
        match &self.value {
            AvpValue::Integer64(v) => Some(v.value()),
            _ => None,
        }
    }

    pub fn get_unsigned32(&self) -> Option<u32> {
        match &self.value {
            AvpValue::Unsigned32(v) => Some(v.value()),
            AvpValue::Enumerated(v) => Some(v.value() as u32),
            _ => None,
        }
    }

    pub fn get_unsigned64(&self) -> Option<u64> {
        match &self.value {
            AvpValue::Unsigned64(v) => Some(v.value()),
            _ => None,
        }
    }

    pub fn get_enumerated(&self) -> Option<i32> {
        match &self.value {
            AvpValue::Enumerated(v) => Some(v.value()),
            _ => None,
        }
    }

    pub fn get_utf8string(&self) -> Option<&str> {
        match &self.value {
            AvpValue::UTF8String(v) => Some(v.value()),
            _ => None,
        }
    }

    pub fn get_octetstring(&self) -> Option<&[u8]> {
        match &self.value {
            AvpValue::OctetString(v) => Some(v.value()),
            AvpValue::Identity(v) => Some(v.value()),
            _ => None,
        }
    }

    pub fn get_identity(&self) -> Option<std::borrow::Cow<'_, str>> {
        match &self.value {
            AvpValue::Identity(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_grouped(&self) -> Option<&Grouped> {
        match &self.value {
            AvpValue::Grouped(v) => Some(v),
            _ => None,
        }
    }

    pub fn fmt(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let name = self
            .dict
            .get_avp_name(self.header.vendor_id.unwrap_or(0), self.header.code)
            .unwrap_or("Unknown");
        let vendor_id = self.header.vendor_id.map(|v| v.to_string()).unwrap_or_default();

        write!(
            f,
            "{:indent$}{:<40} {:>8} {:>5}  {} {} {}  {:<16}  {}",
            "",
            name,
            vendor_id,
            self.header.code,
            bool_mark(self.header.flags & self::flags::V != 0),
            bool_mark(self.header.flags & self::flags::M != 0),
            bool_mark(self.header.flags & self::flags::P != 0),
            self.value.type_name(),
            self.value,
            indent = depth * 2
        )?;

        if let AvpValue::Grouped(g) = &self.value {
            g.fmt(f, depth)?;
        }

        Ok(())
    }
}

fn bool_mark(v: bool) -> &'static str {
    if v {
        "✓"
    } else {
        "✗"
    }
}

impl fmt::Display for Avp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt(f, 0)
    }
}

/// Builds the pieces of an AVP without requiring the caller to hold a
/// `Dictionary` reference; `DiameterMessage::add_avp`/`Grouped::add_avp`
/// fill in the dictionary they already own.
pub struct AvpSpec {
    pub code: u32,
    pub vendor_id: Option<u32>,
    pub flags: u8,
    pub value: AvpValue,
}

#[macro_export]
macro_rules! avp {
    ($code:expr, $vendor_id:expr, $flags:expr, $value:expr) => {
        $crate::avp::AvpSpec {
            code: $code,
            vendor_id: $vendor_id,
            flags: $flags,
            value: $value.into(),
        }
    };
    ($code:expr, $vendor_id:expr, $flags:expr, $value:expr, $dict:expr) => {
        Avp::new($code, $vendor_id, $flags, $value.into(), $dict)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_encode_header() {
        let data = [
            0x00, 0x00, 0x00, 0x64, // avp code
            0x40, 0x00, 0x00, 0x0C, // flags, length
        ];

        let mut cursor = Cursor::new(&data);
        let header = AvpHeader::decode_from(&mut cursor).unwrap();

        assert_eq!(header.code, 100);
        assert_eq!(header.length, 12);
        assert_eq!(header.flags, self::flags::M);
        assert_eq!(header.vendor_id, None);

        let mut encoded = Vec::new();
        header.encode_to(&mut encoded).unwrap();
        assert_eq!(encoded, data);
    }

    #[test]
    fn test_decode_encode_header_with_vendor() {
        let data = [
            0x00, 0x00, 0x00, 0x64, // avp code
            0x80, 0x00, 0x00, 0x0C, // flags, length
            0x00, 0x00, 0x00, 0xC8, // vendor_id
        ];

        let mut cursor = Cursor::new(&data);
        let header = AvpHeader::decode_from(&mut cursor).unwrap();

        assert_eq!(header.code, 100);
        assert_eq!(header.length, 12);
        assert_eq!(header.flags, self::flags::V);
        assert_eq!(header.vendor_id, Some(200));

        let mut encoded = Vec::new();
        header.encode_to(&mut encoded).unwrap();
        assert_eq!(encoded, data);
    }

    #[test]
    fn test_avp_round_trip() {
        let dict = Arc::new(Dictionary::new(&[&crate::dictionary::DEFAULT_DICT_XML]));
        let avp = Avp::new(
            264,
            None,
            self::flags::M,
            Identity::new("host.example.com").into(),
            Arc::clone(&dict),
        );
        let mut encoded = Vec::new();
        avp.encode_to(&mut encoded).unwrap();
        let mut cursor = Cursor::new(&encoded);
        let decoded = Avp::decode_from(&mut cursor, dict).unwrap();
        assert_eq!(decoded.get_code(), 264);
        assert_eq!(decoded.get_identity().unwrap(), "host.example.com");
    }
}
