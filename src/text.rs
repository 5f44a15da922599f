/*!
Textual AS path parsing.

The renderer lives on [AsPath::display]; this module provides the reverse
direction. The grammar is the one the renderer produces: whitespace and
commas separate members, `{}` bracket a set, `[]` a confed set, `()` a
confed sequence, and bare numbers form a plain sequence. Numbers are
accepted in every ASN display form regardless of the format currently in
effect.
*/
use crate::error::AsPathError;
use crate::models::*;
use std::str::FromStr;

impl FromStr for AsPath {
    type Err = AsPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = AsPath::new();
        let mut open: Option<SegmentType> = None;
        let mut rest = s;

        loop {
            rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            let Some(c) = rest.chars().next() else { break };

            match c {
                '{' | '(' | '[' => {
                    if open.is_some() {
                        return Err(AsPathError::MalformedText(format!(
                            "'{c}' opened inside another segment"
                        )));
                    }
                    let segment_type = match c {
                        '{' => SegmentType::AsSet,
                        '(' => SegmentType::ConfedSequence,
                        _ => SegmentType::ConfedSet,
                    };
                    open = Some(segment_type);
                    path.append_segment(AsPathSegment::new(segment_type, vec![]));
                    rest = &rest[1..];
                }
                '}' | ')' | ']' => {
                    let closes = match c {
                        '}' => SegmentType::AsSet,
                        ')' => SegmentType::ConfedSequence,
                        _ => SegmentType::ConfedSet,
                    };
                    if open != Some(closes) {
                        return Err(AsPathError::MalformedText(format!("unbalanced '{c}'")));
                    }
                    open = None;
                    rest = &rest[1..];
                }
                c if c.is_ascii_digit() => {
                    let end = rest
                        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                        .unwrap_or(rest.len());
                    let (number, tail) = rest.split_at(end);
                    let asn: Asn = number.parse()?;

                    // A bare number after a bracketed segment opens a new
                    // sequence; brackets never produce an AsSequence, so a
                    // trailing AsSequence is always extendable.
                    let extend = open.is_some()
                        || matches!(path.segments.last(), Some(AsPathSegment::AsSequence(_)));
                    if extend {
                        if let Some(seg) = path.segments.last_mut() {
                            seg.append_asns(&[asn]);
                        }
                    } else {
                        path.append_segment(AsPathSegment::AsSequence(vec![asn]));
                    }
                    rest = tail;
                }
                c => {
                    return Err(AsPathError::MalformedText(format!(
                        "unrecognized token starting at '{c}'"
                    )));
                }
            }
        }

        if open.is_some() {
            return Err(AsPathError::MalformedText(
                "unclosed segment bracket".to_string(),
            ));
        }

        path.normalize();
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> AsPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(AsPath::from_sequence([10, 20, 30]), parse("10 20 30"));
        assert_eq!(AsPath::new(), parse(""));
        assert_eq!(AsPath::new(), parse("   "));
    }

    #[test]
    fn test_parse_mixed_segments() {
        let path = parse("1 2 {3,4,5,6}");
        assert_eq!(
            AsPath::from_segments(vec![
                AsPathSegment::sequence([1, 2]),
                AsPathSegment::set([3, 4, 5, 6]),
            ]),
            path
        );

        let path = parse("(64512 64513) [64520] 10");
        assert_eq!(
            AsPath::from_segments(vec![
                AsPathSegment::ConfedSequence(vec![Asn::new(64512), Asn::new(64513)]),
                AsPathSegment::ConfedSet(vec![Asn::new(64520)]),
                AsPathSegment::sequence([10]),
            ]),
            path
        );
    }

    #[test]
    fn test_parse_normalizes() {
        // set members sorted, duplicates kept
        assert_eq!("{2,2,5,9}", parse("{5,2,9,2}").to_string());
        // sequences around an emptied set coalesce
        assert_eq!(AsPath::from_sequence([1, 2]), parse("1 {} 2"));
    }

    #[test]
    fn test_parse_accepts_all_asn_forms() {
        assert_eq!(AsPath::from_sequence([65546, 7]), parse("1.10 7"));
        assert_eq!(AsPath::from_sequence([65546]), parse("0.1.0.10"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in [
            "1 x 2", "{1 2", "1)", "{1]", "( [ ] )", "1. 2", "1.2.3", "seq", "4294967296",
        ] {
            assert!(bad.parse::<AsPath>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_display_roundtrip_under_all_formats() {
        let mut path = AsPath::from_segments(vec![
            AsPathSegment::sequence([70000, 2]),
            AsPathSegment::set([5, 70001]),
            AsPathSegment::ConfedSequence(vec![Asn::new(64512)]),
            AsPathSegment::ConfedSet(vec![Asn::new(64520), Asn::new(64521)]),
        ]);
        path.normalize();

        for format in [
            AsnFormat::Plain,
            AsnFormat::Dot,
            AsnFormat::DotPlus,
            AsnFormat::Ip,
        ] {
            let rendered = path.to_string_with(format);
            let reparsed: AsPath = rendered.parse().unwrap();
            assert_eq!(path, reparsed, "round trip failed for {rendered:?}");
        }
    }
}
