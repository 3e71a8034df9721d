use crate::avp::octetstring::OctetString;
use crate::error::Result;
use std::fmt;
use std::io::Read;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct DiameterURI(OctetString);

impl DiameterURI {
    pub fn new(value: &str) -> DiameterURI {
        DiameterURI(OctetString::new(value.as_bytes().to_vec()))
    }

    pub fn value(&self) -> &[u8] {
        self.0.value()
    }

    pub fn decode_from<R: Read>(reader: &mut R, len: usize) -> Result<DiameterURI> {
        let avp = OctetString::decode_from(reader, len)?;
        Ok(DiameterURI(avp))
    }

    pub fn encode_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.0.encode_to(writer)
    }

    pub fn length(&self) -> u32 {
        self.0.length()
    }
}

impl fmt::Display for DiameterURI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_encode_decode() {
        let avp = DiameterURI::new("aaa://host.example.com:3868");
        let mut encoded = Vec::new();
        avp.encode_to(&mut encoded).unwrap();
        let mut cursor = Cursor::new(&encoded);
        let avp = DiameterURI::decode_from(&mut cursor, encoded.len()).unwrap();
        assert_eq!(avp.to_string(), "aaa://host.example.com:3868");
    }
}
