/*!
Wire codec for the AS_PATH attribute body.

Each wire segment is `[type:u8][length:u8]` followed by `length` ASNs of
two or four octets each, big-endian, per RFC 4271 §4.3 and RFC 6793. The
decoder normalizes on the way in; the encoder only ever splits over-length
segments, never merges, so [wire_size] can precompute the exact octet
count the attribute framer writes into the outer length field.
*/
use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::trace;

use crate::error::AsPathError;
use crate::models::*;

/// Octets of a wire segment header (type and length).
const SEGMENT_HEADER_SIZE: usize = 2;

trait ReadUtils: Buf {
    fn require(&self, bytes: usize, what: &str) -> Result<(), AsPathError> {
        if self.remaining() < bytes {
            return Err(AsPathError::MalformedAttribute(format!(
                "{what} extends past the attribute boundary"
            )));
        }
        Ok(())
    }

    /// Read one ASN at the session width; two-octet values are
    /// zero-extended into 32-bit storage.
    fn read_asn(&mut self, asn_len: AsnLength) -> Asn {
        match asn_len {
            AsnLength::Bits16 => Asn::from(self.get_u16()),
            AsnLength::Bits32 => Asn::new(self.get_u32()),
        }
    }
}

impl<T: Buf> ReadUtils for T {}

/// Parse one AS_PATH attribute body into a normalized [AsPath].
///
/// The outer attribute length is `input.len()`; an empty input is the
/// empty path, a first-class value distinct from an absent attribute.
/// Malformed input (odd outer length, a header or segment body running
/// past the attribute, a zero-length segment, an unknown segment type)
/// is an UPDATE-level error for the caller to escalate.
pub fn decode_as_path(mut input: &[u8], asn_len: AsnLength) -> Result<AsPath, AsPathError> {
    if input.len() % 2 != 0 {
        return Err(AsPathError::MalformedAttribute(format!(
            "odd attribute length {}",
            input.len()
        )));
    }

    let mut path = AsPath::new();
    while input.has_remaining() {
        input.require(SEGMENT_HEADER_SIZE, "segment header")?;
        let segment_type = SegmentType::try_from(input.get_u8())?;
        let count = input.get_u8() as usize;
        if count == 0 {
            return Err(AsPathError::MalformedAttribute(
                "zero-length segment".to_string(),
            ));
        }
        input.require(count * asn_len.octets(), "segment body")?;

        let mut members = Vec::with_capacity(count);
        for _ in 0..count {
            members.push(input.read_asn(asn_len));
        }
        path.append_segment(AsPathSegment::new(segment_type, members));
    }

    trace!("decoded AS_PATH with {} segment(s)", path.len());
    path.normalize();
    Ok(path)
}

/// Serialize a normalized [AsPath] onto the tail of `out`.
///
/// Segments longer than [AS_SEGMENT_MAX] are written as consecutive wire
/// segments of the same type. In 16-bit mode any ASN above 65535 is
/// written as `AS_TRANS`; the true values travel in a parallel AS4_PATH
/// attribute maintained outside this crate. Emission never merges
/// segments -- normalization is the sole merger -- so the byte count
/// always equals [wire_size].
///
/// Panics if the path is not normalized; encoding a raw draft is a
/// programmer error.
pub fn encode_as_path(path: &AsPath, asn_len: AsnLength, out: &mut BytesMut) {
    assert!(
        path.is_normalized(),
        "refusing to encode a non-normalized AS path"
    );

    for segment in path.segments() {
        let type_code = u8::from(segment.segment_type());
        for chunk in segment.asns().chunks(AS_SEGMENT_MAX) {
            out.put_u8(type_code);
            out.put_u8(chunk.len() as u8);
            for asn in chunk {
                match asn_len {
                    AsnLength::Bits32 => out.put_u32(asn.to_u32()),
                    AsnLength::Bits16 if asn.fits_two_octets() => {
                        out.put_u16(asn.to_u32() as u16)
                    }
                    AsnLength::Bits16 => out.put_u16(Asn::TRANSITION.to_u32() as u16),
                }
            }
        }
    }
}

/// Exact octet count [encode_as_path] will produce for this path,
/// including the headers of any split-off segments. This is the value the
/// attribute framer writes into the outer length field before emission.
pub fn wire_size(path: &AsPath, asn_len: AsnLength) -> usize {
    assert!(
        path.is_normalized(),
        "refusing to size a non-normalized AS path"
    );

    path.segments()
        .iter()
        .map(|segment| {
            let wire_segments = segment.len().div_ceil(AS_SEGMENT_MAX);
            wire_segments * SEGMENT_HEADER_SIZE + segment.len() * asn_len.octets()
        })
        .sum()
}

impl AsPath {
    /// Encode into a standalone buffer, sized up front via [wire_size].
    pub fn encode(&self, asn_len: AsnLength) -> Bytes {
        let mut bytes = BytesMut::with_capacity(wire_size(self, asn_len));
        encode_as_path(self, asn_len, &mut bytes);
        bytes.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_as_path() {
        let data = &[
            2, // sequence
            3, // 3 ASes in path
            0, 1, // AS1
            0, 2, // AS2
            0, 3, // AS3
        ];
        let path = decode_as_path(data, AsnLength::Bits16).unwrap();
        assert_eq!(path, AsPath::from_sequence([1, 2, 3]));

        let data = &[
            2, // sequence
            3, // 3 ASes in path
            0, 0, 0, 10, // AS10
            0, 0, 0, 20, // AS20
            0, 0, 0, 30, // AS30
        ];
        let path = decode_as_path(data, AsnLength::Bits32).unwrap();
        assert_eq!(path, AsPath::from_sequence([10, 20, 30]));
    }

    #[test]
    fn test_parse_segment_types() {
        let data = &[
            1, // AS set
            2, // 2 ASes
            0, 5, 0, 2,
        ];
        let path = decode_as_path(data, AsnLength::Bits16).unwrap();
        // set members come back sorted
        assert_eq!(path.segments[0], AsPathSegment::set([2, 5]));

        let data = &[
            3, // confed sequence
            1, 0, 1, //
            4, // confed set
            1, 0, 2,
        ];
        let path = decode_as_path(data, AsnLength::Bits16).unwrap();
        assert!(matches!(path.segments[0], AsPathSegment::ConfedSequence(_)));
        assert!(matches!(path.segments[1], AsPathSegment::ConfedSet(_)));

        let data = &[
            5, // not a segment type
            1, 0, 1,
        ];
        let err = decode_as_path(data, AsnLength::Bits16).unwrap_err();
        assert!(matches!(err, AsPathError::MalformedAttribute(_)));
    }

    #[test]
    fn test_parse_empty_is_empty_path() {
        let path = decode_as_path(&[], AsnLength::Bits32).unwrap();
        assert!(path.is_empty());
        assert_eq!(0, wire_size(&path, AsnLength::Bits32));
        assert_eq!("", path.to_string());
    }

    #[test]
    fn test_parse_malformed() {
        // odd outer length
        assert!(decode_as_path(&[2, 1, 0], AsnLength::Bits16).is_err());
        // zero-length segment
        assert!(decode_as_path(&[2, 0], AsnLength::Bits16).is_err());
        // trailing header with no room for its body
        assert!(decode_as_path(&[2, 1, 0, 1, 2, 1], AsnLength::Bits16).is_err());
        // segment body overflows the attribute
        assert!(decode_as_path(&[2, 3, 0, 1, 0, 2], AsnLength::Bits16).is_err());
        assert!(decode_as_path(&[2, 2, 0, 0, 0, 1], AsnLength::Bits32).is_err());
    }

    #[test]
    fn test_parse_merges_adjacent_sequences() {
        let data = &[
            2, 2, 0, 1, 0, 2, // AS_SEQUENCE 1 2
            2, 1, 0, 3, // AS_SEQUENCE 3
        ];
        let path = decode_as_path(data, AsnLength::Bits16).unwrap();
        assert_eq!(path, AsPath::from_sequence([1, 2, 3]));
    }

    #[test]
    fn test_encode_roundtrip() {
        let mut path = AsPath::from_segments(vec![
            AsPathSegment::sequence([10, 20, 30]),
            AsPathSegment::set([9, 2, 2]),
            AsPathSegment::ConfedSequence(vec![Asn::new(64512)]),
        ]);
        path.normalize();

        for asn_len in [AsnLength::Bits16, AsnLength::Bits32] {
            let bytes = path.encode(asn_len);
            assert_eq!(bytes.len(), wire_size(&path, asn_len));
            let reparsed = decode_as_path(&bytes, asn_len).unwrap();
            assert_eq!(reparsed, path);
        }
    }

    #[test]
    fn test_encode_16bit_transition() {
        let path = AsPath::from_sequence([65536, 7]);
        assert_eq!(6, wire_size(&path, AsnLength::Bits16));

        let bytes = path.encode(AsnLength::Bits16);
        // 23456 = 0x5ba0 stands in for 65536
        assert_eq!(&[2, 2, 0x5b, 0xa0, 0, 7], bytes.as_ref());
    }

    #[test]
    fn test_encode_splits_overlength_segment() {
        let members: Vec<u32> = (1..=300).collect();
        let path = AsPath::from_sequence(&members);

        assert_eq!(2 * 2 + 300 * 4, wire_size(&path, AsnLength::Bits32));

        let bytes = path.encode(AsnLength::Bits32);
        assert_eq!(1204, bytes.len());
        assert_eq!(2, bytes[0]);
        assert_eq!(255, bytes[1]);
        let second_header = 2 + 255 * 4;
        assert_eq!(2, bytes[second_header]);
        assert_eq!(45, bytes[second_header + 1]);

        // the split is invisible after reparse
        let reparsed = decode_as_path(&bytes, AsnLength::Bits32).unwrap();
        assert_eq!(reparsed, path);
    }

    #[test]
    fn test_wire_size_matches_encode() {
        let mut paths = vec![
            AsPath::new(),
            AsPath::from_sequence([1]),
            AsPath::from_sequence((1..=513).collect::<Vec<u32>>()),
            AsPath::from_segments(vec![
                AsPathSegment::sequence([70000, 2]),
                AsPathSegment::set([5, 6]),
                AsPathSegment::ConfedSequence(vec![Asn::new(64512), Asn::new(64513)]),
                AsPathSegment::ConfedSet(vec![Asn::new(64520)]),
            ]),
        ];
        for path in paths.iter_mut() {
            path.normalize();
            for asn_len in [AsnLength::Bits16, AsnLength::Bits32] {
                assert_eq!(
                    wire_size(path, asn_len),
                    path.encode(asn_len).len(),
                    "size mismatch for {path} at {asn_len:?}"
                );
            }
        }
    }

    #[test]
    #[should_panic(expected = "non-normalized")]
    fn test_encode_rejects_raw_draft() {
        let path = AsPath::from_segments(vec![
            AsPathSegment::sequence([1]),
            AsPathSegment::sequence([2]),
        ]);
        path.encode(AsnLength::Bits32);
    }
}
