use crate::diameter::{ApplicationId, CommandCode, DiameterHeader, DiameterMessage};
use std::fmt;

impl fmt::Display for DiameterMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        writeln!(
            f,
            "  {:<40} {:>8} {:>5}  {} {} {}  {:<16}  {}",
            "AVP", "Vendor", "Code", "V", "M", "P", "Type", "Value"
        )?;

        for avp in &self.avps {
            writeln!(f, "{}", avp)?;
        }

        Ok(())
    }
}

impl fmt::Display for DiameterHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request_flag = if self.flags & crate::diameter::flags::REQUEST != 0 {
            "Request"
        } else {
            "Answer"
        };
        let error_flag = if self.flags & crate::diameter::flags::ERROR != 0 {
            " Error"
        } else {
            ""
        };
        let proxyable_flag = if self.flags & crate::diameter::flags::PROXYABLE != 0 {
            " Proxyable"
        } else {
            ""
        };
        let retransmit_flag = if self.flags & crate::diameter::flags::RETRANSMIT != 0 {
            " Retransmit"
        } else {
            ""
        };

        write!(
            f,
            "{}({}) {}({}) {}{}{}{} {}, {}",
            self.code,
            self.code.code(),
            self.application_id,
            self.application_id.id(),
            request_flag,
            error_flag,
            proxyable_flag,
            retransmit_flag,
            self.hop_by_hop_id,
            self.end_to_end_id
        )
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
