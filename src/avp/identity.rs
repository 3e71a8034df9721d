use crate::avp::octetstring::OctetString;
use crate::error::Result;
use std::fmt;
use std::io::Read;
use std::io::Write;

/// DiameterIdentity, per RFC 6733 4.3.1 — an OctetString holding the
/// FQDN of a Diameter node, restricted to the ASCII subset in practice.
#[derive(Debug, Clone)]
pub struct Identity(OctetString);

impl Identity {
    pub fn new(value: &str) -> Identity {
        Identity(OctetString::new(value.as_bytes().to_vec()))
    }

    pub fn value(&self) -> &[u8] {
        self.0.value()
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.0.value())
    }

    pub fn decode_from<R: Read>(reader: &mut R, len: usize) -> Result<Identity> {
        let avp = OctetString::decode_from(reader, len)?;
        Ok(Identity(avp))
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.0.encode_to(writer)
    }

    pub fn length(&self) -> u32 {
        self.0.length()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
