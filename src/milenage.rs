//! The Milenage authentication and key generation function set, per
//! 3GPP TS 35.206 §4.1, plus the TS 33.401 Annex A.2 KASME derivation used
//! to assemble a full EPS authentication vector for the Authentication-
//! Information command (§4.3).
//!
//! Milenage's seven functions (f1, f1*, f2, f3, f4, f5, f5*) all reduce to
//! the same `calculate_output` template driven by per-function rotate
//! amounts and XOR constants; f1/f1* alone fold SQN and AMF into the input
//! instead of reusing the plain template.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const R1: u32 = 64;
const R2: u32 = 0;
const R3: u32 = 32;
const R4: u32 = 64;
const R5: u32 = 96;

const C1: [u8; 16] = [0; 16];
const C2: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
const C3: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2];
const C4: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4];
const C5: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8];

/// A fully assembled EPS authentication vector, as returned by [`make_vector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vector {
    pub rand: [u8; 16],
    pub xres: [u8; 8],
    pub autn: [u8; 16],
    pub kasme: [u8; 32],
}

fn aes_encrypt_block(key: &[u8; 16], block: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(key.into());
    let mut out = *block;
    cipher.encrypt_block((&mut out).into());
    out
}

fn xor16(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for i in 0..16 {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// Cyclically rotates a 128-bit value left by `bits` bits (`bits` is always
/// a multiple of 8 for Milenage's r_1..r_5, but the general form is kept to
/// mirror the spec's bit-oriented definition).
fn rot(input: &[u8; 16], bits: u32) -> [u8; 16] {
    let bytes = (bits / 8) as usize % 16;
    let mut out = [0u8; 16];
    for i in 0..16 {
        out[i] = input[(i + bytes) % 16];
    }
    out
}

/// OPc = E_K(OP) XOR OP (TS 35.206 §4.1). A provisioning-time operation:
/// this implementation stores OPc directly on the subscriber and never
/// persists OP, but the derivation is exposed for the out-of-scope
/// provisioning surface to call when a subscriber is created from OP+K.
pub fn derive_opc(k: &[u8; 16], op: &[u8; 16]) -> [u8; 16] {
    xor16(&aes_encrypt_block(k, op), op)
}

/// The shared template behind f2, f3, f4 and f5/f5*: TEMP = E_K(RAND XOR OPc),
/// OUT = E_K(rot(TEMP XOR OPc, r) XOR c) XOR OPc.
fn calculate_output(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16], r: u32, c: &[u8; 16]) -> [u8; 16] {
    let temp = aes_encrypt_block(k, &xor16(rand, opc));
    let rotated = rot(&xor16(&temp, opc), r);
    let pre = xor16(&rotated, c);
    xor16(&aes_encrypt_block(k, &pre), opc)
}

/// f1 & f1*: OUT1 = E_K(TEMP XOR rot(IN1 XOR OPc, 64) XOR c_1) XOR OPc, where
/// IN1 is (SQN || AMF) repeated twice. MAC-A = OUT1[0..7], MAC-S = OUT1[8..15].
fn f1_output(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16], sqn: &[u8; 6], amf: &[u8; 2]) -> [u8; 16] {
    let temp = aes_encrypt_block(k, &xor16(rand, opc));

    let mut in1 = [0u8; 16];
    in1[0..6].copy_from_slice(sqn);
    in1[6..8].copy_from_slice(amf);
    in1[8..14].copy_from_slice(sqn);
    in1[14..16].copy_from_slice(amf);

    let rotated = rot(&xor16(&in1, opc), R1);
    let pre = xor16(&xor16(&temp, &rotated), &C1);
    xor16(&aes_encrypt_block(k, &pre), opc)
}

/// MAC-A, the network authentication code (TS 35.206 §4.1, function f1).
pub fn f1(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16], sqn: &[u8; 6], amf: &[u8; 2]) -> [u8; 8] {
    let out1 = f1_output(k, rand, opc, sqn, amf);
    let mut mac_a = [0u8; 8];
    mac_a.copy_from_slice(&out1[0..8]);
    mac_a
}

/// MAC-S, the resynchronisation authentication code (function f1*).
pub fn f1_star(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16], sqn: &[u8; 6], amf: &[u8; 2]) -> [u8; 8] {
    let out1 = f1_output(k, rand, opc, sqn, amf);
    let mut mac_s = [0u8; 8];
    mac_s.copy_from_slice(&out1[8..16]);
    mac_s
}

/// RES, the signed response (function f2): OUT2[8..15].
pub fn f2(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16]) -> [u8; 8] {
    let out2 = calculate_output(k, rand, opc, R2, &C2);
    let mut res = [0u8; 8];
    res.copy_from_slice(&out2[8..16]);
    res
}

/// CK, the confidentiality key (function f3).
pub fn f3(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16]) -> [u8; 16] {
    calculate_output(k, rand, opc, R3, &C3)
}

/// IK, the integrity key (function f4).
pub fn f4(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16]) -> [u8; 16] {
    calculate_output(k, rand, opc, R4, &C4)
}

/// AK, the anonymity key used with f1/f2 (function f5): OUT2[0..5].
pub fn f5(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16]) -> [u8; 6] {
    let out2 = calculate_output(k, rand, opc, R2, &C2);
    let mut ak = [0u8; 6];
    ak.copy_from_slice(&out2[0..6]);
    ak
}

/// AK*, the anonymity key used during resynchronisation (function f5*): OUT5[0..5].
pub fn f5_star(k: &[u8; 16], rand: &[u8; 16], opc: &[u8; 16]) -> [u8; 6] {
    let out5 = calculate_output(k, rand, opc, R5, &C5);
    let mut ak_star = [0u8; 6];
    ak_star.copy_from_slice(&out5[0..6]);
    ak_star
}

fn sqn_xor_ak(sqn: &[u8; 6], ak: &[u8; 6]) -> [u8; 6] {
    let mut out = [0u8; 6];
    for i in 0..6 {
        out[i] = sqn[i] ^ ak[i];
    }
    out
}

/// AUTN = (SQN XOR AK) || AMF || MAC-A (16 bytes).
pub fn calculate_autn(sqn: &[u8; 6], ak: &[u8; 6], amf: &[u8; 2], mac_a: &[u8; 8]) -> [u8; 16] {
    let mut autn = [0u8; 16];
    autn[0..6].copy_from_slice(&sqn_xor_ak(sqn, ak));
    autn[6..8].copy_from_slice(amf);
    autn[8..16].copy_from_slice(mac_a);
    autn
}

/// KASME = HMAC-SHA256(CK || IK, FC=0x10 || PLMN(3B) || 0x0003 || (SQN XOR AK)(6B) || 0x0006),
/// per TS 33.401 Annex A.2.
pub fn calculate_kasme(ck: &[u8; 16], ik: &[u8; 16], plmn: &[u8; 3], sqn: &[u8; 6], ak: &[u8; 6]) -> [u8; 32] {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(ck);
    key.extend_from_slice(ik);

    let mut data = Vec::with_capacity(1 + 3 + 2 + 6 + 2);
    data.push(0x10);
    data.extend_from_slice(plmn);
    data.extend_from_slice(&[0x00, 0x03]);
    data.extend_from_slice(&sqn_xor_ak(sqn, ak));
    data.extend_from_slice(&[0x00, 0x06]);

    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts keys of any length");
    mac.update(&data);
    let digest = mac.finalize().into_bytes();
    let mut kasme = [0u8; 32];
    kasme.copy_from_slice(&digest);
    kasme
}

/// Generates a 128-bit cryptographically random RAND challenge.
pub fn generate_rand() -> [u8; 16] {
    let mut rand = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut rand);
    rand
}

/// Assembles a full EPS authentication vector (RAND, XRES, AUTN, KASME) for
/// one Authentication-Information answer entry. When `rand` is `None` a
/// fresh OS-backed random challenge is drawn.
pub fn make_vector(
    k: &[u8; 16],
    opc: &[u8; 16],
    amf: &[u8; 2],
    sqn: &[u8; 6],
    plmn: &[u8; 3],
    rand: Option<[u8; 16]>,
) -> Vector {
    let rand = rand.unwrap_or_else(generate_rand);

    let mac_a = f1(k, &rand, opc, sqn, amf);
    let xres = f2(k, &rand, opc);
    let ck = f3(k, &rand, opc);
    let ik = f4(k, &rand, opc);
    let ak = f5(k, &rand, opc);
    let autn = calculate_autn(sqn, &ak, amf, &mac_a);
    let kasme = calculate_kasme(&ck, &ik, plmn, sqn, &ak);

    Vector {
        rand,
        xres,
        autn,
        kasme,
    }
}
