//! Record encode / decode

use bytes::{Buf, BufMut, Bytes, BytesMut};
use contracts::{GnssRecord, ImuRecord, SensorKind, SensorRecord, StarTrackerRecord};

use crate::FramingError;

/// Tail padding after the `i32` validity flag (struct alignment is 8)
const VALIDITY_PADDING: usize = 4;

/// Encode a record into its fixed-size wire form
pub fn encode(record: &SensorRecord) -> Bytes {
    let mut buf = BytesMut::with_capacity(record.kind().record_size());
    encode_into(record, &mut buf);
    buf.freeze()
}

/// Append the wire form of a record to `buf`
pub fn encode_into(record: &SensorRecord, buf: &mut impl BufMut) {
    match record {
        SensorRecord::Imu(r) => {
            put_f64s(buf, &r.vel_inc);
            put_f64s(buf, &r.ang_inc);
            buf.put_f64_le(r.t_inc);
            buf.put_i32_le(r.validity);
            buf.put_bytes(0, VALIDITY_PADDING);
        }
        SensorRecord::Gnss(r) => {
            put_f64s(buf, &r.position_m);
            put_f64s(buf, &r.velocity_enu_m_s);
            buf.put_f64_le(r.dop);
            buf.put_i32_le(r.validity);
            buf.put_bytes(0, VALIDITY_PADDING);
        }
        SensorRecord::StarTracker(r) => {
            buf.put_f64_le(r.time_tag);
            put_f64s(buf, &r.quaternion);
        }
    }
}

/// Decode a record of `kind`
///
/// # Errors
/// `SizeMismatch` unless `bytes.len()` equals the kind's record size exactly.
pub fn decode(kind: SensorKind, bytes: &[u8]) -> Result<SensorRecord, FramingError> {
    let expected = kind.record_size();
    if bytes.len() != expected {
        return Err(FramingError::SizeMismatch {
            kind,
            expected,
            actual: bytes.len(),
        });
    }

    let mut buf = bytes;
    let record = match kind {
        SensorKind::Imu => SensorRecord::Imu(ImuRecord {
            vel_inc: get_f64s(&mut buf),
            ang_inc: get_f64s(&mut buf),
            t_inc: buf.get_f64_le(),
            validity: buf.get_i32_le(),
        }),
        SensorKind::Gnss => SensorRecord::Gnss(GnssRecord {
            position_m: get_f64s(&mut buf),
            velocity_enu_m_s: get_f64s(&mut buf),
            dop: buf.get_f64_le(),
            validity: buf.get_i32_le(),
        }),
        SensorKind::StarTracker => SensorRecord::StarTracker(StarTrackerRecord {
            time_tag: buf.get_f64_le(),
            quaternion: get_f64s(&mut buf),
        }),
    };
    Ok(record)
}

#[inline]
fn put_f64s(buf: &mut impl BufMut, values: &[f64]) {
    for v in values {
        buf.put_f64_le(*v);
    }
}

#[inline]
fn get_f64s<const N: usize>(buf: &mut &[u8]) -> [f64; N] {
    std::array::from_fn(|_| buf.get_f64_le())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_imu() -> SensorRecord {
        SensorRecord::Imu(ImuRecord {
            vel_inc: [0.1, -0.2, 9.81e-2],
            ang_inc: [1e-6, -2e-6, 3.5e-6],
            t_inc: 0.01,
            validity: 1,
        })
    }

    fn sample_gnss() -> SensorRecord {
        SensorRecord::Gnss(GnssRecord {
            position_m: [6_378_137.0, -12.5, 4.0e5],
            velocity_enu_m_s: [7.5e3, -1.0, f64::MIN_POSITIVE],
            dop: 0.8,
            validity: 1,
        })
    }

    fn sample_star() -> SensorRecord {
        SensorRecord::StarTracker(StarTrackerRecord {
            time_tag: 1234.5,
            quaternion: [0.5, -0.5, 0.5, -0.5],
        })
    }

    #[test]
    fn test_encoded_length_is_fixed() {
        for record in [sample_imu(), sample_gnss(), sample_star()] {
            assert_eq!(encode(&record).len(), record.kind().record_size());
        }
    }

    #[test]
    fn test_round_trip_is_exact() {
        for record in [sample_imu(), sample_gnss(), sample_star()] {
            let decoded = decode(record.kind(), &encode(&record)).unwrap();
            assert_eq!(decoded, record);
        }
    }

    #[test]
    fn test_imu_layout() {
        let bytes = encode(&sample_imu());
        assert_eq!(&bytes[0..8], &0.1f64.to_le_bytes());
        assert_eq!(&bytes[48..56], &0.01f64.to_le_bytes());
        assert_eq!(&bytes[56..60], &1i32.to_le_bytes());
        assert_eq!(&bytes[60..64], &[0u8; 4]);
    }

    #[test]
    fn test_star_tracker_layout() {
        let bytes = encode(&sample_star());
        assert_eq!(&bytes[0..8], &1234.5f64.to_le_bytes());
        assert_eq!(&bytes[32..40], &(-0.5f64).to_le_bytes());
    }

    #[test]
    fn test_padding_ignored_on_decode() {
        let mut bytes = encode(&sample_gnss()).to_vec();
        bytes[60..64].copy_from_slice(&[0xAA; 4]);
        assert_eq!(decode(SensorKind::Gnss, &bytes).unwrap(), sample_gnss());
    }

    #[test]
    fn test_nan_survives_bit_exact() {
        let record = SensorRecord::StarTracker(StarTrackerRecord {
            time_tag: f64::NAN,
            quaternion: [1.0, 0.0, 0.0, 0.0],
        });
        let bytes = encode(&record);
        let SensorRecord::StarTracker(decoded) = decode(SensorKind::StarTracker, &bytes).unwrap()
        else {
            panic!("expected star tracker record");
        };
        assert_eq!(decoded.time_tag.to_bits(), f64::NAN.to_bits());
    }

    #[test]
    fn test_wrong_length_always_fails() {
        for kind in SensorKind::ALL {
            let size = kind.record_size();
            for len in [0, 1, size - 1, size + 1, size * 2] {
                let err = decode(kind, &vec![0u8; len]).unwrap_err();
                assert_eq!(
                    err,
                    FramingError::SizeMismatch {
                        kind,
                        expected: size,
                        actual: len
                    }
                );
            }
        }
    }

    #[test]
    fn test_decode_as_other_kind_fails_for_star_tracker_payload() {
        let bytes = encode(&sample_star());
        assert!(decode(SensorKind::Imu, &bytes).is_err());
    }
}
