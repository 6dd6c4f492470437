//! AES-CBC helpers for the standard security handler.

use crate::error::{PdfError, Result};
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};

type Aes128CbcDec = Decryptor<aes::Aes128>;
type Aes256CbcDec = Decryptor<aes::Aes256>;
type Aes128CbcEnc = Encryptor<aes::Aes128>;

fn check_block_input(iv: &[u8], data: &[u8]) -> Result<()> {
    if iv.len() != 16 {
        return Err(PdfError::EncryptionError(format!(
            "AES IV must be 16 bytes, got {}",
            iv.len()
        )));
    }
    if data.len() % 16 != 0 {
        return Err(PdfError::DecodeError(format!(
            "AES data length {} is not a multiple of 16",
            data.len()
        )));
    }
    Ok(())
}

/// Decrypt data using AES-CBC with a 128 or 256 bit key, no padding removal.
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    check_block_input(iv, data)?;
    let mut buf = data.to_vec();
    let invalid = |e| PdfError::DecodeError(format!("AES: {e}"));
    match key.len() {
        16 => {
            Aes128CbcDec::new(key.into(), iv.into())
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(invalid)?;
        }
        32 => {
            Aes256CbcDec::new(key.into(), iv.into())
                .decrypt_padded_mut::<NoPadding>(&mut buf)
                .map_err(invalid)?;
        }
        n => {
            return Err(PdfError::EncryptionError(format!(
                "AES key must be 16 or 32 bytes, got {n}"
            )));
        }
    }
    Ok(buf)
}

/// Encrypt data using AES-128-CBC. No padding is applied.
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    check_block_input(iv, data)?;
    if key.len() != 16 {
        return Err(PdfError::EncryptionError(format!(
            "AES-128 key must be 16 bytes, got {}",
            key.len()
        )));
    }
    let mut buf = data.to_vec();
    Aes128CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, data.len())
        .map_err(|e| PdfError::EncryptionError(format!("AES: {e}")))?;
    Ok(buf)
}

/// Remove PKCS#7 padding from AES-decrypted data.
///
/// Returns data unchanged if the padding is invalid.
pub fn unpad_aes(data: &[u8]) -> &[u8] {
    let Some(&last) = data.last() else {
        return data;
    };
    let pad_len = last as usize;
    if pad_len == 0 || pad_len > 16 || pad_len > data.len() {
        return data;
    }
    let start = data.len() - pad_len;
    if data[start..].iter().all(|&b| b == last) {
        &data[..start]
    } else {
        data
    }
}

/// Decrypt a PDF AES payload: 16-byte IV prefix, then PKCS#7-padded data.
pub fn decrypt_with_iv_prefix(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 16 {
        return Err(PdfError::DecodeError(format!(
            "AES payload of {} bytes has no IV",
            data.len()
        )));
    }
    let (iv, body) = data.split_at(16);
    // Some writers leave a truncated trailing block; drop it.
    let body = &body[..body.len() - body.len() % 16];
    let plain = aes_cbc_decrypt(key, iv, body)?;
    Ok(unpad_aes(&plain).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpad_valid_and_invalid() {
        assert_eq!(unpad_aes(b"abc\x03\x03\x03"), b"abc");
        assert_eq!(unpad_aes(b"abc\x02\x03"), b"abc\x02\x03");
        assert_eq!(unpad_aes(b"abc\x00"), b"abc\x00");
        assert_eq!(unpad_aes(b""), b"");
    }

    #[test]
    fn encrypt_then_decrypt_128() {
        let key = [7u8; 16];
        let iv = [1u8; 16];
        let plain = *b"sixteen byte blk";
        let cipher = aes_cbc_encrypt(&key, &iv, &plain).unwrap();
        assert_ne!(cipher, plain);
        assert_eq!(aes_cbc_decrypt(&key, &iv, &cipher).unwrap(), plain);
    }

    #[test]
    fn bad_lengths_are_errors() {
        assert!(aes_cbc_decrypt(&[0; 5], &[0; 16], &[0; 16]).is_err());
        assert!(aes_cbc_decrypt(&[0; 16], &[0; 16], &[0; 15]).is_err());
        assert!(decrypt_with_iv_prefix(&[0; 16], &[0; 8]).is_err());
    }
}
