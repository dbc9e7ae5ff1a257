use crc::{Crc, CRC_16_IBM_3740};

use crate::error::{FrameError, Result};

/// Checksum trailer width in bytes.
pub const CHECKSUM_LEN: usize = 2;

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection, no xorout.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute the link checksum over `data`.
pub fn checksum(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Check the big-endian trailer of `frame` and return the covered body.
pub fn verify_checksum(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < CHECKSUM_LEN {
        return Err(FrameError::TooShort {
            len: frame.len(),
            min: CHECKSUM_LEN,
        });
    }

    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_LEN);
    let received = u16::from_be_bytes([trailer[0], trailer[1]]);
    let computed = checksum(body);
    if received != computed {
        return Err(FrameError::ChecksumMismatch { received, computed });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_published_check_value() {
        assert_eq!(checksum(b"123456789"), 0x29B1);
    }

    #[test]
    fn verify_returns_body() {
        let mut frame = vec![0x00, 0xE6, 0x32];
        let crc = checksum(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());

        let body = verify_checksum(&frame).unwrap();
        assert_eq!(body, &[0x00, 0xE6, 0x32]);
    }

    #[test]
    fn verify_rejects_short_input() {
        assert_eq!(
            verify_checksum(&[0x01]),
            Err(FrameError::TooShort { len: 1, min: 2 })
        );
        assert!(verify_checksum(&[]).is_err());
    }

    #[test]
    fn verify_rejects_flipped_bit() {
        let mut frame = vec![0x00, 0xE6, 0x32];
        let crc = checksum(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());
        frame[2] ^= 0x01;

        assert!(matches!(
            verify_checksum(&frame),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn trailer_is_big_endian() {
        let body = [0x00, 0x85];
        let crc = checksum(&body);
        let mut frame = body.to_vec();
        frame.push((crc >> 8) as u8);
        frame.push((crc & 0xFF) as u8);
        assert!(verify_checksum(&frame).is_ok());
    }
}
