//! # Encoded Polyline Codec
//!
//! Decoder and encoder for the compact polyline format used by directions
//! providers: each coordinate is stored as a signed delta from the previous
//! one, scaled by 1e5, zig-zag encoded, and packed into printable ASCII in
//! 5-bit chunks offset by 63.
//!
//! Reference: Google's "Encoded Polyline Algorithm Format".

use crate::error::{Result, TourSimError};
use crate::GpsPoint;

const COORD_FACTOR: f64 = 1e5;

/// Decode an encoded polyline string into a coordinate sequence.
///
/// An empty string decodes to an empty path. Truncated chunk sequences and
/// characters outside the encoding alphabet are errors.
///
/// # Example
///
/// ```rust
/// use tour_sim::decode_polyline;
///
/// let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert!((points[0].latitude - 38.5).abs() < 1e-9);
/// assert!((points[0].longitude - -120.2).abs() < 1e-9);
/// ```
pub fn decode_polyline(encoded: &str) -> Result<Vec<GpsPoint>> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let (delta_lat, next) = decode_signed(bytes, index)?;
        let (delta_lng, next) = decode_signed(bytes, next)?;
        lat += delta_lat;
        lng += delta_lng;
        points.push(GpsPoint::new(
            lat as f64 / COORD_FACTOR,
            lng as f64 / COORD_FACTOR,
        ));
        index = next;
    }

    Ok(points)
}

/// Encode a coordinate sequence into the polyline string format.
///
/// Coordinates are rounded to 1e-5 degrees (about 1 m), the format's
/// precision.
pub fn encode_polyline(points: &[GpsPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for p in points {
        let lat = (p.latitude * COORD_FACTOR).round() as i64;
        let lng = (p.longitude * COORD_FACTOR).round() as i64;
        encode_signed(lat - prev_lat, &mut out);
        encode_signed(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Decode one zig-zag signed value starting at `index`.
///
/// Returns the value and the index of the byte after its last chunk.
fn decode_signed(bytes: &[u8], mut index: usize) -> Result<(i64, usize)> {
    let mut accumulated: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(index).ok_or_else(|| TourSimError::PolylineDecode {
            position: index,
            message: "truncated chunk sequence".to_string(),
        })?;

        if !(63..=126).contains(&byte) {
            return Err(TourSimError::PolylineDecode {
                position: index,
                message: format!("byte 0x{byte:02x} outside encoding alphabet"),
            });
        }
        // 11 chunks of 5 bits exceeds any delta the format can produce.
        if shift > 50 {
            return Err(TourSimError::PolylineDecode {
                position: index,
                message: "chunk sequence overflows".to_string(),
            });
        }

        let chunk = (byte - 63) as u64;
        accumulated |= (chunk & 0x1f) << shift;
        index += 1;

        if chunk & 0x20 == 0 {
            break;
        }
        shift += 5;
    }

    // Zig-zag: LSB is the sign bit.
    let value = if accumulated & 1 == 1 {
        !((accumulated >> 1) as i64)
    } else {
        (accumulated >> 1) as i64
    };

    Ok((value, index))
}

/// Encode one signed value as zig-zag 5-bit chunks.
fn encode_signed(value: i64, out: &mut String) {
    let mut v: u64 = if value < 0 {
        !((value as u64) << 1)
    } else {
        (value as u64) << 1
    };

    while v >= 0x20 {
        out.push((((v & 0x1f) as u8 | 0x20) + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    // The published reference vector from the format documentation.
    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decode_reference_vector() {
        let points = decode_polyline(REFERENCE).unwrap();
        assert_eq!(points.len(), 3);

        assert!(approx_eq(points[0].latitude, 38.5));
        assert!(approx_eq(points[0].longitude, -120.2));
        assert!(approx_eq(points[1].latitude, 40.7));
        assert!(approx_eq(points[1].longitude, -120.95));
        assert!(approx_eq(points[2].latitude, 43.252));
        assert!(approx_eq(points[2].longitude, -126.453));
    }

    #[test]
    fn test_encode_reference_vector() {
        let points = vec![
            GpsPoint::new(38.5, -120.2),
            GpsPoint::new(40.7, -120.95),
            GpsPoint::new(43.252, -126.453),
        ];
        assert_eq!(encode_polyline(&points), REFERENCE);
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_polyline("").unwrap(), Vec::new());
    }

    #[test]
    fn test_decode_single_point() {
        let points = decode_polyline("_p~iF~ps|U").unwrap();
        assert_eq!(points.len(), 1);
        assert!(approx_eq(points[0].latitude, 38.5));
        assert!(approx_eq(points[0].longitude, -120.2));
    }

    #[test]
    fn test_decode_truncated_is_error() {
        // A complete latitude delta but no longitude delta after it.
        let err = decode_polyline("_p~iF").unwrap_err();
        assert!(matches!(err, TourSimError::PolylineDecode { .. }));

        // A continuation bit with nothing following.
        let err = decode_polyline("_").unwrap_err();
        assert!(matches!(err, TourSimError::PolylineDecode { .. }));
    }

    #[test]
    fn test_decode_bad_byte_is_error() {
        let err = decode_polyline("_p~iF~ps|U _ulL").unwrap_err();
        match err {
            TourSimError::PolylineDecode { position, .. } => assert_eq!(position, 10),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_then_positive_deltas() {
        // Walk south then back north; deltas change sign across points.
        let points = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(-0.00005, 0.00005),
            GpsPoint::new(0.0001, -0.0001),
        ];
        let decoded = decode_polyline(&encode_polyline(&points)).unwrap();
        assert_eq!(decoded.len(), 3);
        for (orig, round) in points.iter().zip(decoded.iter()) {
            assert!(approx_eq(orig.latitude, round.latitude));
            assert!(approx_eq(orig.longitude, round.longitude));
        }
    }
}
