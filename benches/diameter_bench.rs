#![feature(test)]

extern crate test;
use diameter::avp;
use diameter::avp::flags::M;
use diameter::avp::Grouped;
use diameter::avp::Identity;
use diameter::avp::UTF8String;
use diameter::avp::OctetString;
use diameter::avp::Unsigned32;
use diameter::dictionary;
use diameter::dictionary::Dictionary;
use diameter::flags;
use diameter::ApplicationId;
use diameter::CommandCode;
use diameter::DiameterHeader;
use diameter::DiameterMessage;
use std::io::Cursor;
use std::sync::Arc;
use test::black_box;
use test::Bencher;

#[bench]
fn bench_decode_header(b: &mut Bencher) {
    let data = test_data();
    b.iter(|| {
        let mut cursor = Cursor::new(&data);
        black_box(DiameterHeader::decode_from(&mut cursor).unwrap())
    });
}

#[bench]
fn bench_encode_header(b: &mut Bencher) {
    let data = test_data();
    let mut cursor = Cursor::new(&data);
    let header = DiameterHeader::decode_from(&mut cursor).unwrap();

    let mut encoded = Vec::new();
    b.iter(|| {
        encoded.clear();
        black_box(header.encode_to(&mut encoded).unwrap());
    });
}

#[bench]
fn bench_decode_air(b: &mut Bencher) {
    let dict = Dictionary::new(&[&dictionary::DEFAULT_DICT_XML]);
    let dict = Arc::new(dict);

    let message = air_message(Arc::clone(&dict));
    let mut data = Vec::new();
    message.encode_to(&mut data).unwrap();

    b.iter(|| {
        let mut cursor = Cursor::new(&data);
        black_box(DiameterMessage::decode_from(&mut cursor, Arc::clone(&dict)).unwrap())
    });
}

#[bench]
fn bench_encode_air(b: &mut Bencher) {
    let dict = Dictionary::new(&[&dictionary::DEFAULT_DICT_XML]);
    let dict = Arc::new(dict);

    let message = air_message(dict);
    let mut encoded = Vec::new();
    b.iter(|| {
        encoded.clear();
        black_box(message.encode_to(&mut encoded).unwrap());
    });
}

fn test_data() -> &'static [u8] {
    return &[
        0x01, 0x00, 0x00, 0x14, // version, length
        0x80, 0x00, 0x01, 0x3E, // flags, code (318, AIR)
        0x01, 0x00, 0x00, 0x23, // application_id (16777251, S6a)
        0x00, 0x00, 0x00, 0x03, // hop_by_hop_id
        0x00, 0x00, 0x00, 0x04, // end_to_end_id
    ];
}

/// Builds a representative Authentication-Information-Request: the command
/// the HSS decodes most often, used to benchmark the wire codec against a
/// realistic AVP set (identity, grouped, enumerated, unsigned32).
fn air_message(dict: Arc<Dictionary>) -> DiameterMessage {
    let mut message = DiameterMessage::new(
        CommandCode::AuthenticationInformation,
        ApplicationId::S6a,
        flags::REQUEST | flags::PROXYABLE,
        1123158610,
        3102381851,
        Arc::clone(&dict),
    );

    message.add_avp(avp!(264, None, M, Identity::new("mme1.epc.mnc001.mcc001.3gppnetwork.org")));
    message.add_avp(avp!(296, None, M, Identity::new("epc.mnc001.mcc001.3gppnetwork.org")));
    message.add_avp(avp!(283, None, M, Identity::new("epc.mnc001.mcc001.3gppnetwork.org")));
    message.add_avp(avp!(293, None, M, Identity::new("hss1.epc.mnc001.mcc001.3gppnetwork.org")));
    message.add_avp(avp!(1, None, M, UTF8String::new("999000000000001")));
    message.add_avp(avp!(1407, Some(10415), M, OctetString::new(vec![0x21, 0xf4, 0x75])));

    let mut requested_info = Grouped::new(vec![], Arc::clone(&dict));
    requested_info.add_avp(1411, Some(10415), M, OctetString::new(vec![0; 14]).into());
    requested_info.add_avp(1412, Some(10415), M, Unsigned32::new(0).into());
    message.add_avp(avp!(1408, Some(10415), M, requested_info));
    message.add_avp(avp!(1410, Some(10415), M, Unsigned32::new(1)));

    message
}

fn main() {}
