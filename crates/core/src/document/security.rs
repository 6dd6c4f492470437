//! Standard security handlers (`/Filter /Standard`).
//!
//! Handlers are built from the `/Encrypt` dictionary without a password and
//! stay locked until [`PDFSecurityHandler::authenticate`] succeeds.

use super::saslprep::saslprep;
use crate::codec::aes::{aes_cbc_decrypt, aes_cbc_encrypt, decrypt_with_iv_prefix};
use crate::codec::arcfour::rc4;
use crate::error::{PdfError, Result};
use crate::model::objects::PDFObject;
use bitflags::bitflags;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::collections::HashMap;

/// Padding appended to user passwords before hashing.
pub const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

bitflags! {
    /// User access permissions from the `/P` entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        const PRINT = 1 << 2;
        const MODIFY = 1 << 3;
        const COPY = 1 << 4;
        const ANNOTATE = 1 << 5;
        const FILL_FORMS = 1 << 8;
        const EXTRACT_FOR_ACCESSIBILITY = 1 << 9;
        const ASSEMBLE = 1 << 10;
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

/// A security handler decrypts strings and streams once authenticated.
pub trait PDFSecurityHandler: Send + Sync {
    /// Try `password` as the user password, then as the owner password.
    /// On success the file key is kept and `true` is returned.
    fn authenticate(&mut self, password: &str) -> bool;

    fn is_authenticated(&self) -> bool;

    fn permissions(&self) -> Permissions;

    /// Decrypt `data` belonging to object `objid`/`genno`. `attrs` is the
    /// stream dictionary for streams and `None` for strings.
    fn decrypt(
        &self,
        objid: u32,
        genno: u32,
        data: &[u8],
        attrs: Option<&HashMap<String, PDFObject>>,
    ) -> Result<Vec<u8>>;

    fn decrypt_string(&self, objid: u32, genno: u32, data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt(objid, genno, data, None)
    }

    fn decrypt_stream(
        &self,
        objid: u32,
        genno: u32,
        data: &[u8],
        attrs: &HashMap<String, PDFObject>,
    ) -> Result<Vec<u8>> {
        self.decrypt(objid, genno, data, Some(attrs))
    }
}

/// Crypt filter method (`/CFM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CryptMethod {
    Identity,
    /// RC4
    V2,
    /// AES-128-CBC
    AESV2,
    /// AES-256-CBC
    AESV3,
}

/// String and stream methods plus the `/EncryptMetadata` switch.
#[derive(Debug, Clone, Copy)]
struct CryptFilters {
    strf: CryptMethod,
    stmf: CryptMethod,
    encrypt_metadata: bool,
}

impl CryptFilters {
    fn uniform(method: CryptMethod) -> Self {
        Self {
            strf: method,
            stmf: method,
            encrypt_metadata: true,
        }
    }

    /// Read `/StrF`, `/StmF` and `/CF` from a V4/V5 dictionary.
    fn from_encrypt(encrypt: &HashMap<String, PDFObject>) -> Result<Self> {
        let cf = encrypt
            .get("CF")
            .and_then(|v| v.as_dict().ok())
            .cloned()
            .unwrap_or_default();
        let method = |key: &str| {
            let name = encrypt
                .get(key)
                .and_then(|v| v.as_name().ok())
                .unwrap_or("Identity");
            resolve_crypt_method(&cf, name)
        };
        Ok(Self {
            strf: method("StrF")?,
            stmf: method("StmF")?,
            encrypt_metadata: encrypt
                .get("EncryptMetadata")
                .and_then(|v| v.as_bool().ok())
                .unwrap_or(true),
        })
    }

    /// Method for a string (`attrs == None`) or a stream.
    fn select(&self, attrs: Option<&HashMap<String, PDFObject>>) -> CryptMethod {
        match attrs {
            None => self.strf,
            Some(attrs) => {
                let is_metadata = attrs
                    .get("Type")
                    .and_then(|t| t.as_name().ok())
                    .is_some_and(|name| name == "Metadata");
                if is_metadata && !self.encrypt_metadata {
                    CryptMethod::Identity
                } else {
                    self.stmf
                }
            }
        }
    }
}

fn resolve_crypt_method(cf: &HashMap<String, PDFObject>, name: &str) -> Result<CryptMethod> {
    if name == "Identity" {
        return Ok(CryptMethod::Identity);
    }
    let filter = cf.get(name).and_then(|v| v.as_dict().ok()).ok_or_else(|| {
        PdfError::EncryptionError(format!("crypt filter {name} not found in /CF"))
    })?;
    match filter
        .get("CFM")
        .and_then(|v| v.as_name().ok())
        .unwrap_or("None")
    {
        "None" => Ok(CryptMethod::Identity),
        "V2" => Ok(CryptMethod::V2),
        "AESV2" => Ok(CryptMethod::AESV2),
        "AESV3" => Ok(CryptMethod::AESV3),
        other => Err(PdfError::EncryptionError(format!(
            "unknown crypt filter method {other}"
        ))),
    }
}

fn locked() -> PdfError {
    PdfError::EncryptionError("document is locked".into())
}

/// Password bytes for revisions 2-4: Latin-1 when representable, UTF-8 otherwise.
fn legacy_password_bytes(password: &str) -> Vec<u8> {
    password
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()
        .unwrap_or_else(|| password.as_bytes().to_vec())
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PASSWORD_PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    padded
}

fn xor_key(key: &[u8], i: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ i).collect()
}

/// RC4 and AES-128 handler for revisions 2, 3 and 4.
pub struct RC4SecurityHandler {
    r: i64,
    /// File key length in bytes.
    key_len: usize,
    o: Vec<u8>,
    u: Vec<u8>,
    p: u32,
    docid: Vec<u8>,
    filters: CryptFilters,
    key: Option<Vec<u8>>,
}

impl RC4SecurityHandler {
    pub fn new(encrypt: &HashMap<String, PDFObject>, docid: &[u8]) -> Result<Self> {
        let r = get_int(encrypt, "R")?;
        let v = get_int_default(encrypt, "V", 0);
        let (key_len, filters) = match r {
            2 => (5, CryptFilters::uniform(CryptMethod::V2)),
            3 => {
                let bits = get_int_default(encrypt, "Length", 40).clamp(40, 128);
                (bits as usize / 8, CryptFilters::uniform(CryptMethod::V2))
            }
            4 if v == 4 => {
                let filters = CryptFilters::from_encrypt(encrypt)?;
                if filters.strf == CryptMethod::AESV3 || filters.stmf == CryptMethod::AESV3 {
                    return Err(PdfError::EncryptionError(
                        "AESV3 crypt filter requires revision 5 or 6".into(),
                    ));
                }
                (16, filters)
            }
            other => {
                return Err(PdfError::EncryptionError(format!(
                    "unsupported revision R={other} for V={v}"
                )));
            }
        };
        Ok(Self {
            r,
            key_len,
            o: get_bytes(encrypt, "O")?,
            u: get_bytes(encrypt, "U")?,
            p: get_int(encrypt, "P")? as u32,
            docid: docid.to_vec(),
            filters,
            key: None,
        })
    }

    fn compute_key(&self, password: &[u8]) -> Vec<u8> {
        let mut context = md5::Context::new();
        context.consume(pad_password(password));
        context.consume(&self.o);
        context.consume(self.p.to_le_bytes());
        context.consume(&self.docid);
        if self.r >= 4 && !self.filters.encrypt_metadata {
            context.consume([0xFF; 4]);
        }
        let mut hash = context.finalize().0;
        if self.r >= 3 {
            for _ in 0..50 {
                hash = md5::compute(&hash[..self.key_len]).0;
            }
        }
        hash[..self.key_len].to_vec()
    }

    fn compute_u(&self, key: &[u8]) -> Vec<u8> {
        if self.r == 2 {
            return rc4(key, &PASSWORD_PADDING);
        }
        let mut context = md5::Context::new();
        context.consume(PASSWORD_PADDING);
        context.consume(&self.docid);
        let mut result = rc4(key, &context.finalize().0);
        for i in 1..20u8 {
            result = rc4(&xor_key(key, i), &result);
        }
        result
    }

    fn authenticate_user(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.compute_key(password);
        let u = self.compute_u(&key);
        let matches = if self.r == 2 {
            u == self.u
        } else {
            self.u.len() >= 16 && u[..16] == self.u[..16]
        };
        matches.then_some(key)
    }

    /// Recover the user password from `/O` and authenticate with it.
    fn authenticate_owner(&self, password: &[u8]) -> Option<Vec<u8>> {
        let mut hash = md5::compute(pad_password(password)).0;
        if self.r >= 3 {
            for _ in 0..50 {
                hash = md5::compute(hash).0;
            }
        }
        let key = &hash[..self.key_len];
        let user_password = if self.r == 2 {
            rc4(key, &self.o)
        } else {
            (0..20u8)
                .rev()
                .fold(self.o.clone(), |data, i| rc4(&xor_key(key, i), &data))
        };
        self.authenticate_user(&user_password)
    }

    fn object_key(&self, key: &[u8], objid: u32, genno: u32, aes: bool) -> Vec<u8> {
        let mut context = md5::Context::new();
        context.consume(key);
        context.consume(&objid.to_le_bytes()[..3]);
        context.consume(&genno.to_le_bytes()[..2]);
        if aes {
            context.consume(b"sAlT");
        }
        let hash = context.finalize().0;
        hash[..(key.len() + 5).min(16)].to_vec()
    }
}

impl PDFSecurityHandler for RC4SecurityHandler {
    fn authenticate(&mut self, password: &str) -> bool {
        let password = legacy_password_bytes(password);
        let key = self
            .authenticate_user(&password)
            .or_else(|| self.authenticate_owner(&password));
        match key {
            Some(key) => {
                self.key = Some(key);
                true
            }
            None => false,
        }
    }

    fn is_authenticated(&self) -> bool {
        self.key.is_some()
    }

    fn permissions(&self) -> Permissions {
        Permissions::from_bits_truncate(self.p)
    }

    fn decrypt(
        &self,
        objid: u32,
        genno: u32,
        data: &[u8],
        attrs: Option<&HashMap<String, PDFObject>>,
    ) -> Result<Vec<u8>> {
        let key = self.key.as_deref().ok_or_else(locked)?;
        match self.filters.select(attrs) {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::V2 => Ok(rc4(&self.object_key(key, objid, genno, false), data)),
            CryptMethod::AESV2 => {
                decrypt_with_iv_prefix(&self.object_key(key, objid, genno, true), data)
            }
            CryptMethod::AESV3 => Err(PdfError::EncryptionError(
                "AESV3 crypt filter requires revision 5 or 6".into(),
            )),
        }
    }
}

/// AES-256 handler for revisions 5 and 6.
pub struct AES256SecurityHandler {
    r: i64,
    o: Vec<u8>,
    u: Vec<u8>,
    oe: Vec<u8>,
    ue: Vec<u8>,
    p: u32,
    filters: CryptFilters,
    key: Option<Vec<u8>>,
}

impl AES256SecurityHandler {
    pub fn new(encrypt: &HashMap<String, PDFObject>) -> Result<Self> {
        let r = get_int(encrypt, "R")?;
        if !matches!(r, 5 | 6) {
            return Err(PdfError::EncryptionError(format!(
                "AES-256 handler requires R=5 or R=6, got R={r}"
            )));
        }
        let field = |key: &str, min: usize| -> Result<Vec<u8>> {
            let value = get_bytes(encrypt, key)?;
            if value.len() < min {
                return Err(PdfError::EncryptionError(format!(
                    "/{key} is {} bytes, expected {min}",
                    value.len()
                )));
            }
            Ok(value)
        };
        Ok(Self {
            r,
            o: field("O", 48)?,
            u: field("U", 48)?,
            oe: field("OE", 32)?,
            ue: field("UE", 32)?,
            p: get_int(encrypt, "P")? as u32,
            filters: CryptFilters::from_encrypt(encrypt)?,
            key: None,
        })
    }

    /// UTF-8 password, SASLprep'ed for revision 6, capped at 127 bytes.
    fn normalize_password(&self, password: &str) -> Vec<u8> {
        let prepared = if self.r == 6 {
            saslprep(password).unwrap_or_else(|err| {
                tracing::debug!(%err, "password rejected by SASLprep, using it verbatim");
                password.to_string()
            })
        } else {
            password.to_string()
        };
        let bytes = prepared.as_bytes();
        bytes[..bytes.len().min(127)].to_vec()
    }

    fn password_hash(&self, password: &[u8], salt: &[u8], udata: &[u8]) -> Result<Vec<u8>> {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        hasher.update(udata);
        let k = hasher.finalize().to_vec();
        if self.r == 5 {
            Ok(k)
        } else {
            r6_hash(k, password, udata)
        }
    }

    /// Validate against `hash_field` (`/U` or `/O`) and unwrap the file key
    /// from `key_field` (`/UE` or `/OE`).
    fn try_password(
        &self,
        password: &[u8],
        hash_field: &[u8],
        key_field: &[u8],
        udata: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        let validation = self.password_hash(password, &hash_field[32..40], udata)?;
        if validation[..32] != hash_field[..32] {
            return Ok(None);
        }
        let intermediate = self.password_hash(password, &hash_field[40..48], udata)?;
        aes_cbc_decrypt(&intermediate[..32], &[0u8; 16], &key_field[..32]).map(Some)
    }
}

/// Revision 6 hardening: at least 64 rounds of AES-128 plus a SHA-2 chosen by
/// the ciphertext.
fn r6_hash(mut k: Vec<u8>, password: &[u8], udata: &[u8]) -> Result<Vec<u8>> {
    let mut round: u32 = 0;
    loop {
        let block: Vec<u8> = [password, &k[..], udata].concat();
        let k1 = block.repeat(64);
        let e = aes_cbc_encrypt(&k[..16], &k[16..32], &k1)?;
        let selector = e[..16].iter().map(|&b| u32::from(b) % 3).sum::<u32>() % 3;
        k = match selector {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };
        round += 1;
        let last = e.last().copied().unwrap_or(0);
        if round >= 64 && u32::from(last) <= round - 32 {
            break;
        }
    }
    k.truncate(32);
    Ok(k)
}

impl PDFSecurityHandler for AES256SecurityHandler {
    fn authenticate(&mut self, password: &str) -> bool {
        let password = self.normalize_password(password);
        let attempt = self
            .try_password(&password, &self.u, &self.ue, &[])
            .and_then(|key| match key {
                Some(key) => Ok(Some(key)),
                None => self.try_password(&password, &self.o, &self.oe, &self.u[..48]),
            });
        match attempt {
            Ok(Some(key)) => {
                self.key = Some(key);
                true
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(%err, "AES-256 key derivation failed");
                false
            }
        }
    }

    fn is_authenticated(&self) -> bool {
        self.key.is_some()
    }

    fn permissions(&self) -> Permissions {
        Permissions::from_bits_truncate(self.p)
    }

    fn decrypt(
        &self,
        _objid: u32,
        _genno: u32,
        data: &[u8],
        attrs: Option<&HashMap<String, PDFObject>>,
    ) -> Result<Vec<u8>> {
        let key = self.key.as_deref().ok_or_else(locked)?;
        match self.filters.select(attrs) {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::AESV3 => decrypt_with_iv_prefix(key, data),
            other => Err(PdfError::EncryptionError(format!(
                "{other:?} crypt filter is not valid with revision {}",
                self.r
            ))),
        }
    }
}

fn get_int(encrypt: &HashMap<String, PDFObject>, key: &str) -> Result<i64> {
    encrypt
        .get(key)
        .ok_or_else(|| PdfError::EncryptionError(format!("missing /{key} in /Encrypt")))?
        .as_int()
}

fn get_int_default(encrypt: &HashMap<String, PDFObject>, key: &str, default: i64) -> i64 {
    encrypt
        .get(key)
        .and_then(|v| v.as_int().ok())
        .unwrap_or(default)
}

fn get_bytes(encrypt: &HashMap<String, PDFObject>, key: &str) -> Result<Vec<u8>> {
    encrypt
        .get(key)
        .ok_or_else(|| PdfError::EncryptionError(format!("missing /{key} in /Encrypt")))?
        .as_string()
        .map(<[u8]>::to_vec)
}

/// Build the handler named by an `/Encrypt` dictionary. `docid` is the first
/// element of the trailer `/ID`.
pub fn create_security_handler(
    encrypt: &HashMap<String, PDFObject>,
    docid: &[u8],
) -> Result<Box<dyn PDFSecurityHandler>> {
    let filter = encrypt
        .get("Filter")
        .and_then(|v| v.as_name().ok())
        .unwrap_or("Standard");
    if filter != "Standard" {
        return Err(PdfError::EncryptionError(format!(
            "unsupported security handler /{filter}"
        )));
    }
    let v = get_int_default(encrypt, "V", 0);
    let r = get_int(encrypt, "R")?;
    match (v, r) {
        (0..=2, 2 | 3) | (4, 4) => Ok(Box::new(RC4SecurityHandler::new(encrypt, docid)?)),
        (5, 5 | 6) => Ok(Box::new(AES256SecurityHandler::new(encrypt)?)),
        _ => Err(PdfError::EncryptionError(format!(
            "unsupported encryption V={v} R={r}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RC4_40_O: [u8; 32] = [
        1, 169, 240, 206, 242, 141, 0, 248, 223, 176, 37, 143, 94, 240, 197, 92, 157, 247, 200,
        22, 149, 143, 54, 49, 0, 175, 119, 236, 2, 38, 36, 84,
    ];
    const RC4_40_U: [u8; 32] = [
        105, 75, 157, 162, 248, 9, 199, 124, 114, 119, 140, 251, 202, 194, 4, 129, 178, 114, 5,
        208, 231, 211, 34, 98, 54, 130, 131, 100, 102, 106, 151, 8,
    ];
    const RC4_128_O: [u8; 32] = [
        208, 72, 209, 82, 158, 83, 93, 24, 132, 205, 56, 86, 54, 123, 24, 75, 74, 144, 223, 1,
        230, 55, 209, 110, 202, 6, 91, 175, 78, 100, 144, 11,
    ];
    const RC4_128_U: [u8; 32] = [
        9, 52, 18, 54, 59, 157, 50, 124, 122, 197, 1, 68, 199, 199, 85, 241, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0, 0, 0, 0,
    ];
    const DOCID: [u8; 16] = [
        101, 26, 148, 254, 235, 120, 104, 211, 18, 169, 123, 55, 114, 112, 134, 14,
    ];

    fn encrypt_dict(v: i64, r: i64, length: i64, o: &[u8], u: &[u8]) -> HashMap<String, PDFObject> {
        HashMap::from([
            ("Filter".to_string(), PDFObject::Name("Standard".into())),
            ("V".to_string(), PDFObject::Int(v)),
            ("R".to_string(), PDFObject::Int(r)),
            ("P".to_string(), PDFObject::Int(-4)),
            ("Length".to_string(), PDFObject::Int(length)),
            ("O".to_string(), PDFObject::String(o.to_vec())),
            ("U".to_string(), PDFObject::String(u.to_vec())),
        ])
    }

    #[test]
    fn rc4_40_user_password() {
        let encrypt = encrypt_dict(1, 2, 40, &RC4_40_O, &RC4_40_U);
        let mut handler = create_security_handler(&encrypt, &DOCID).unwrap();
        assert!(!handler.is_authenticated());
        assert!(!handler.authenticate("wrong"));
        assert!(!handler.authenticate(""));
        assert!(handler.authenticate("foo"));
        assert!(handler.is_authenticated());
    }

    #[test]
    fn rc4_128_object_keys_differ() {
        let encrypt = encrypt_dict(2, 3, 128, &RC4_128_O, &RC4_128_U);
        let mut handler = RC4SecurityHandler::new(&encrypt, &DOCID).unwrap();
        assert!(handler.authenticate("foo"));
        let plain = b"Hello, PDF encryption!";
        let a = handler.decrypt_string(1, 0, plain).unwrap();
        let b = handler.decrypt_string(2, 0, plain).unwrap();
        let c = handler.decrypt_string(1, 1, plain).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(handler.decrypt_string(1, 0, &a).unwrap(), plain);
    }

    #[test]
    fn locked_handler_refuses_to_decrypt() {
        let encrypt = encrypt_dict(1, 2, 40, &RC4_40_O, &RC4_40_U);
        let handler = RC4SecurityHandler::new(&encrypt, &DOCID).unwrap();
        assert!(matches!(
            handler.decrypt_string(1, 0, b"x"),
            Err(PdfError::EncryptionError(_))
        ));
    }

    #[test]
    fn permissions_from_p() {
        let encrypt = encrypt_dict(1, 2, 40, &RC4_40_O, &RC4_40_U);
        let handler = RC4SecurityHandler::new(&encrypt, &DOCID).unwrap();
        let perms = handler.permissions();
        assert!(perms.contains(Permissions::PRINT | Permissions::COPY));
        assert!(perms.contains(Permissions::PRINT_HIGH_QUALITY));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let encrypt = encrypt_dict(99, 99, 40, &[0; 32], &[0; 32]);
        assert!(create_security_handler(&encrypt, &[]).is_err());
    }

    #[test]
    fn unsupported_filter_is_rejected() {
        let mut encrypt = encrypt_dict(1, 2, 40, &RC4_40_O, &RC4_40_U);
        encrypt.insert("Filter".into(), PDFObject::Name("Adobe.PubSec".into()));
        assert!(create_security_handler(&encrypt, &DOCID).is_err());
    }

    #[test]
    fn metadata_stream_left_alone_when_not_encrypted() {
        let filters = CryptFilters {
            strf: CryptMethod::AESV2,
            stmf: CryptMethod::AESV2,
            encrypt_metadata: false,
        };
        let attrs = HashMap::from([("Type".to_string(), PDFObject::Name("Metadata".into()))]);
        assert_eq!(filters.select(Some(&attrs)), CryptMethod::Identity);
        assert_eq!(filters.select(Some(&HashMap::new())), CryptMethod::AESV2);
        assert_eq!(filters.select(None), CryptMethod::AESV2);
    }

    #[test]
    fn aes256_r5_password() {
        const O: [u8; 48] = [
            197, 126, 60, 46, 218, 22, 190, 91, 132, 46, 198, 222, 145, 49, 111, 125, 24, 147,
            223, 122, 6, 21, 159, 78, 155, 195, 49, 220, 252, 161, 203, 182, 215, 56, 115, 236,
            23, 247, 193, 14, 39, 184, 210, 207, 56, 201, 114, 199,
        ];
        const U: [u8; 48] = [
            179, 236, 138, 87, 238, 76, 63, 44, 188, 66, 38, 224, 89, 1, 136, 216, 233, 86, 206,
            51, 43, 103, 248, 173, 26, 183, 85, 55, 229, 239, 180, 149, 88, 136, 28, 124, 249,
            186, 223, 59, 180, 7, 178, 19, 84, 51, 249, 188,
        ];
        const OE: [u8; 32] = [
            91, 206, 49, 194, 37, 90, 49, 81, 128, 220, 14, 148, 72, 121, 213, 222, 45, 98, 227,
            35, 15, 76, 191, 10, 54, 211, 184, 43, 81, 250, 80, 231,
        ];
        const UE: [u8; 32] = [
            121, 209, 78, 72, 9, 195, 93, 96, 16, 97, 189, 216, 198, 84, 195, 205, 125, 73, 208,
            81, 173, 33, 196, 195, 9, 4, 57, 3, 226, 247, 31, 8,
        ];
        let stdcf = HashMap::from([("CFM".to_string(), PDFObject::Name("AESV3".into()))]);
        let mut encrypt = encrypt_dict(5, 5, 256, &O, &U);
        encrypt.insert("OE".into(), PDFObject::String(OE.to_vec()));
        encrypt.insert("UE".into(), PDFObject::String(UE.to_vec()));
        encrypt.insert("StrF".into(), PDFObject::Name("StdCF".into()));
        encrypt.insert("StmF".into(), PDFObject::Name("StdCF".into()));
        encrypt.insert(
            "CF".into(),
            PDFObject::Dict(HashMap::from([("StdCF".to_string(), PDFObject::Dict(stdcf))])),
        );

        let mut handler = create_security_handler(&encrypt, &[]).unwrap();
        assert!(!handler.authenticate("wrong"));
        assert!(!handler.authenticate(""));
        assert!(handler.authenticate("foo"));
    }

    #[test]
    fn aesv2_payload_round_trip() {
        let mut encrypt = encrypt_dict(4, 4, 128, &RC4_128_O, &RC4_128_U);
        let stdcf = HashMap::from([("CFM".to_string(), PDFObject::Name("AESV2".into()))]);
        encrypt.insert("StrF".into(), PDFObject::Name("StdCF".into()));
        encrypt.insert("StmF".into(), PDFObject::Name("StdCF".into()));
        encrypt.insert(
            "CF".into(),
            PDFObject::Dict(HashMap::from([("StdCF".to_string(), PDFObject::Dict(stdcf))])),
        );
        let mut handler = RC4SecurityHandler::new(&encrypt, &DOCID).unwrap();
        handler.key = Some(vec![7u8; 16]);

        let object_key = handler.object_key(&[7u8; 16], 3, 0, true);
        let iv = [9u8; 16];
        let mut block = b"0123456789".to_vec();
        block.extend_from_slice(&[6u8; 6]);
        let mut payload = iv.to_vec();
        payload.extend(aes_cbc_encrypt(&object_key, &iv, &block).unwrap());

        assert_eq!(handler.decrypt_string(3, 0, &payload).unwrap(), b"0123456789");
        assert!(handler.is_authenticated());
    }

    #[test]
    fn password_padding_is_applied() {
        assert_eq!(pad_password(b""), PASSWORD_PADDING);
        let padded = pad_password(b"foo");
        assert_eq!(&padded[..3], b"foo");
        assert_eq!(&padded[3..], &PASSWORD_PADDING[..29]);
    }
}
