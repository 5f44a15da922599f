use crate::error::AsPathError;
use crate::models::{Asn, AsnFormat, AsnLength};
use itertools::Itertools;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::{Display, Formatter};


/// Maximum number of ASNs a single wire segment can carry. Internal
/// segments may grow past this; the encoder splits them on output.
pub const AS_SEGMENT_MAX: usize = 255;

/// AS path segment type octet.
///
/// <https://datatracker.ietf.org/doc/html/rfc4271#section-4.3> defines
/// types 1 and 2; <https://datatracker.ietf.org/doc/html/rfc5065> adds the
/// confederation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SegmentType {
    AsSet = 1,
    AsSequence = 2,
    ConfedSequence = 3,
    ConfedSet = 4,
}

/// Enum of AS path segment.
///
/// Sequence variants are ordered hop lists; set variants are unordered
/// and hold their members sorted once normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsPathSegment {
    AsSequence(Vec<Asn>),
    AsSet(Vec<Asn>),
    ConfedSequence(Vec<Asn>),
    ConfedSet(Vec<Asn>),
}

impl AsPathSegment {
    pub fn new(segment_type: SegmentType, members: Vec<Asn>) -> Self {
        match segment_type {
            SegmentType::AsSet => AsPathSegment::AsSet(members),
            SegmentType::AsSequence => AsPathSegment::AsSequence(members),
            SegmentType::ConfedSequence => AsPathSegment::ConfedSequence(members),
            SegmentType::ConfedSet => AsPathSegment::ConfedSet(members),
        }
    }

    /// Shorthand for creating an `AsSequence` segment.
    pub fn sequence<S: AsRef<[u32]>>(seq: S) -> Self {
        AsPathSegment::AsSequence(seq.as_ref().iter().copied().map_into().collect())
    }

    /// Shorthand for creating an `AsSet` segment.
    pub fn set<S: AsRef<[u32]>>(seq: S) -> Self {
        AsPathSegment::AsSet(seq.as_ref().iter().copied().map_into().collect())
    }

    pub fn segment_type(&self) -> SegmentType {
        match self {
            AsPathSegment::AsSequence(_) => SegmentType::AsSequence,
            AsPathSegment::AsSet(_) => SegmentType::AsSet,
            AsPathSegment::ConfedSequence(_) => SegmentType::ConfedSequence,
            AsPathSegment::ConfedSet(_) => SegmentType::ConfedSet,
        }
    }

    /// The segment members in storage order.
    pub fn asns(&self) -> &[Asn] {
        self.as_ref()
    }

    fn members_mut(&mut self) -> &mut Vec<Asn> {
        let (AsPathSegment::AsSequence(x)
        | AsPathSegment::AsSet(x)
        | AsPathSegment::ConfedSequence(x)
        | AsPathSegment::ConfedSet(x)) = self;
        x
    }

    /// Total number of ASNs within this segment. For the number of hops
    /// this segment adds to a route, use [AsPathSegment::route_len].
    pub fn len(&self) -> usize {
        self.asns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.asns().is_empty()
    }

    /// Number of AS hops this segment contributes to the route length: a
    /// sequence counts its members, a set counts one, confederation
    /// segments count zero.
    pub fn route_len(&self) -> usize {
        match self {
            AsPathSegment::AsSequence(v) => v.len(),
            AsPathSegment::AsSet(_) => 1,
            AsPathSegment::ConfedSequence(_) | AsPathSegment::ConfedSet(_) => 0,
        }
    }

    /// Gets if a segment represents the local members of an autonomous
    /// system confederation.
    ///
    /// <https://datatracker.ietf.org/doc/html/rfc5065#section-5>
    pub fn is_confed(&self) -> bool {
        matches!(
            self,
            AsPathSegment::ConfedSequence(_) | AsPathSegment::ConfedSet(_)
        )
    }

    /// Gets if a segment is one of the two unordered (set) variants.
    pub fn is_set(&self) -> bool {
        matches!(self, AsPathSegment::AsSet(_) | AsPathSegment::ConfedSet(_))
    }

    /// Append ASNs to the tail of this segment, copying from the caller's
    /// slice.
    pub fn append_asns(&mut self, asns: &[Asn]) {
        self.members_mut().extend_from_slice(asns);
    }

    /// Prepend `count` copies of `asn` at the head of this segment.
    ///
    /// A prepend of [AS_SEGMENT_MAX] or more is refused and leaves the
    /// segment unchanged; callers wanting a longer run must split it
    /// across segments themselves.
    pub fn prepend_asns(&mut self, asn: Asn, count: usize) -> Result<(), AsPathError> {
        if count >= AS_SEGMENT_MAX {
            return Err(AsPathError::PrependOverflow {
                length: self.len(),
                count,
            });
        }

        let members = self.members_mut();
        members.splice(0..0, std::iter::repeat(asn).take(count));
        Ok(())
    }

    fn sort_members(&mut self) {
        self.members_mut().sort_unstable();
    }

    /// Merge `other` into `self` when the pair is packable, draining
    /// `other`. Only two adjacent plain sequences pack; the confederation
    /// variants never do.
    fn pack_in_place(&mut self, other: &mut Self) -> bool {
        match (self, other) {
            (AsPathSegment::AsSequence(x), AsPathSegment::AsSequence(y)) => {
                x.append(y);
                true
            }
            _ => false,
        }
    }
}

impl AsRef<[Asn]> for AsPathSegment {
    fn as_ref(&self) -> &[Asn] {
        let (AsPathSegment::AsSequence(x)
        | AsPathSegment::AsSet(x)
        | AsPathSegment::ConfedSequence(x)
        | AsPathSegment::ConfedSet(x)) = self;
        x
    }
}

impl<'a> IntoIterator for &'a AsPathSegment {
    type Item = &'a Asn;
    type IntoIter = std::slice::Iter<'a, Asn>;

    fn into_iter(self) -> Self::IntoIter {
        self.asns().iter()
    }
}

/// An AS path value: the ordered chain of segments carried by one
/// AS_PATH attribute.
///
/// Values of this type are freely mutable drafts. Once handed to
/// [crate::AsPathStore::intern] the path becomes shared and immutable;
/// composition on a shared path starts from a clone of its body.
#[derive(Debug, PartialEq, Clone, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsPath {
    pub segments: Vec<AsPathSegment>,
}

impl AsPath {
    pub fn new() -> AsPath {
        AsPath { segments: vec![] }
    }

    /// Shorthand for creating an `AsPath` consisting of a single
    /// `AsSequence` segment.
    pub fn from_sequence<S: AsRef<[u32]>>(seq: S) -> Self {
        AsPath {
            segments: vec![AsPathSegment::sequence(seq)],
        }
    }

    pub fn from_segments(segments: Vec<AsPathSegment>) -> AsPath {
        AsPath { segments }
    }

    /// Adds a new segment to the end of the path. No validation or merging
    /// is performed during this step.
    pub fn append_segment(&mut self, segment: AsPathSegment) {
        self.segments.push(segment);
    }

    /// Check if the path has no segments at all. An empty path is a valid,
    /// first-class value (an iBGP-originated route carries one).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments in the chain.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[AsPathSegment] {
        &self.segments
    }

    /// Iterate over every ASN in every segment, in chain order.
    pub fn iter_asns(&self) -> impl Iterator<Item = Asn> + '_ {
        self.segments.iter().flat_map(|seg| seg.asns().iter().copied())
    }

    /// Canonicalize the chain so that equal-meaning paths share one
    /// representation: set members are sorted ascending (duplicates
    /// survive), empty segments are dropped, and adjacent packable
    /// segments are merged. Idempotent, and independent of the on-wire
    /// segment length limit.
    pub fn normalize(&mut self) {
        for seg in self.segments.iter_mut() {
            if seg.is_set() {
                seg.sort_members();
            }
        }
        self.segments.retain(|seg| !seg.is_empty());

        if self.segments.len() < 2 {
            return;
        }

        let mut end_index = 0;
        let mut scan_index = 1;
        while scan_index < self.segments.len() {
            let (a, b) = self.segments.split_at_mut(scan_index);
            if !AsPathSegment::pack_in_place(&mut a[end_index], &mut b[0]) {
                end_index += 1;
                self.segments.swap(end_index, scan_index);
            }
            scan_index += 1;
        }
        self.segments.truncate(end_index + 1);
    }

    /// Whether the chain is already in the canonical form [AsPath::normalize]
    /// produces.
    pub fn is_normalized(&self) -> bool {
        for (index, seg) in self.segments.iter().enumerate() {
            if seg.is_empty() {
                return false;
            }
            if seg.is_set() && !seg.asns().windows(2).all(|w| w[0] <= w[1]) {
                return false;
            }
            if let (AsPathSegment::AsSequence(_), Some(AsPathSegment::AsSequence(_))) =
                (seg, self.segments.get(index + 1))
            {
                return false;
            }
        }
        true
    }

    /// Checks if any segment of this path contains the given ASN.
    pub fn contains_asn(&self, asn: Asn) -> bool {
        self.iter_asns().contains(&asn)
    }

    /// Loop detection: the number of occurrences of `asn` across all
    /// segments.
    pub fn loop_check(&self, asn: Asn) -> usize {
        self.iter_asns().filter(|a| *a == asn).count()
    }

    /// True iff the leftmost segment is an `AsSequence` whose first member
    /// is `asn`. This is the ingress check that a peer put its own AS
    /// first.
    pub fn first_as_is(&self, asn: Asn) -> bool {
        match self.segments.first() {
            Some(AsPathSegment::AsSequence(v)) => v.first() == Some(&asn),
            _ => false,
        }
    }

    /// Compare the leftmost AS of two paths, skipping any leading
    /// confederation segments. Both remainders must open with an
    /// `AsSequence`; used by the MED comparison.
    pub fn leftmost_as_equal(a: &AsPath, b: &AsPath) -> bool {
        fn first_sequence_as(path: &AsPath) -> Option<Asn> {
            match path.segments.iter().find(|seg| !seg.is_confed()) {
                Some(AsPathSegment::AsSequence(v)) => v.first().copied(),
                _ => None,
            }
        }

        match (first_sequence_as(a), first_sequence_as(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Confederation variant of [AsPath::leftmost_as_equal]: both paths
    /// must open directly with a `ConfedSequence`.
    pub fn leftmost_confed_equal(a: &AsPath, b: &AsPath) -> bool {
        match (a.segments.first(), b.segments.first()) {
            (
                Some(AsPathSegment::ConfedSequence(x)),
                Some(AsPathSegment::ConfedSequence(y)),
            ) => match (x.first(), y.first()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            _ => false,
        }
    }

    /// True when the path is non-empty and every ASN in it is in the
    /// private-use range.
    pub fn all_private(&self) -> bool {
        !self.is_empty() && self.iter_asns().all(|asn| asn.is_private())
    }

    /// The AS-hop metric used in route selection: sequences count their
    /// members, a set counts one, confederation segments count zero.
    pub fn count_hops(&self) -> usize {
        self.segments.iter().map(AsPathSegment::route_len).sum()
    }

    /// Confederation counterpart of [AsPath::count_hops]: confed
    /// sequences count their members, a confed set counts one.
    pub fn count_confeds(&self) -> usize {
        self.segments
            .iter()
            .map(|seg| match seg {
                AsPathSegment::ConfedSequence(v) => v.len(),
                AsPathSegment::ConfedSet(_) => 1,
                _ => 0,
            })
            .sum()
    }

    /// Raw total of ASNs across all segments.
    pub fn count_asns(&self) -> usize {
        self.segments.iter().map(AsPathSegment::len).sum()
    }

    /// Number of ASNs that do not fit a two-octet field.
    pub fn count_four_byte_asns(&self) -> usize {
        self.iter_asns().filter(|asn| !asn.fits_two_octets()).count()
    }

    /// Get the wire width required to carry every ASN of this path without
    /// `AS_TRANS` substitution.
    pub fn required_asn_length(&self) -> AsnLength {
        if self.count_four_byte_asns() == 0 {
            AsnLength::Bits16
        } else {
            AsnLength::Bits32
        }
    }

    /// Highest non-private ASN in the path; [Asn::RESERVED] (zero) when
    /// there is none.
    pub fn highest_public(&self) -> Asn {
        self.iter_asns()
            .filter(|asn| !asn.is_private())
            .max()
            .unwrap_or(Asn::RESERVED)
    }

    /// Place `head`'s segment chain in front of this path's, then
    /// normalize. When `head`'s tail and this path's head are both plain
    /// sequences they coalesce into one segment; any other shapes simply
    /// concatenate, which handles arbitrary multi-segment operands.
    pub fn prepend(&mut self, head: &AsPath) {
        if head.is_empty() {
            return;
        }
        self.segments.splice(0..0, head.segments.iter().cloned());
        self.normalize();
    }

    fn push_leftmost(&mut self, asn: Asn, segment_type: SegmentType) {
        match self.segments.first_mut() {
            Some(seg) if seg.segment_type() == segment_type && !seg.is_empty() => {
                seg.members_mut().insert(0, asn);
            }
            _ => {
                self.segments
                    .insert(0, AsPathSegment::new(segment_type, vec![asn]));
            }
        }
    }

    /// Record one AS as the new leftmost hop, the egress operation a
    /// speaker applies with its own AS number.
    pub fn add_sequence(&mut self, asn: Asn) {
        self.push_leftmost(asn, SegmentType::AsSequence);
    }

    /// As [AsPath::add_sequence], for speakers inside a confederation.
    pub fn add_confed_sequence(&mut self, asn: Asn) {
        self.push_leftmost(asn, SegmentType::ConfedSequence);
    }

    /// Aggregate two paths per RFC 4271 §9.2.2.2: keep the common leading
    /// prefix with its segment types, and collect every remaining ASN from
    /// both operands into one trailing `AsSet` with duplicates suppressed.
    pub fn aggregate(a: &AsPath, b: &AsPath) -> AsPath {
        let mut result = AsPath::new();

        let pairs = a.segments.iter().zip(b.segments.iter());
        let mut consumed = 0;
        let mut tail_offset = 0;
        for (seg1, seg2) in pairs {
            if seg1.segment_type() != seg2.segment_type() {
                break;
            }

            let (m1, m2) = (seg1.asns(), seg2.asns());
            let matched = m1.iter().zip(m2).take_while(|(x, y)| x == y).count();
            if matched > 0 {
                result.append_segment(AsPathSegment::new(
                    seg1.segment_type(),
                    m1[..matched].to_vec(),
                ));
            }

            if matched != m1.len() || m1.len() != m2.len() {
                tail_offset = matched;
                break;
            }
            consumed += 1;
        }

        let mut members: Vec<Asn> = Vec::new();
        for path in [a, b] {
            for (index, seg) in path.segments.iter().enumerate().skip(consumed) {
                let skip = if index == consumed { tail_offset } else { 0 };
                for asn in &seg.asns()[skip.min(seg.len())..] {
                    if !members.contains(asn) {
                        members.push(*asn);
                    }
                }
            }
        }
        if !members.is_empty() {
            result.append_segment(AsPathSegment::AsSet(members));
        }

        result.normalize();
        result
    }

    /// Delete a leading `ConfedSequence` and any confederation segments
    /// immediately following it, as required when a route leaves the
    /// confederation boundary.
    ///
    /// <https://datatracker.ietf.org/doc/html/rfc5065#section-6.1>
    pub fn strip_leading_confeds(&mut self) {
        if !matches!(self.segments.first(), Some(AsPathSegment::ConfedSequence(_))) {
            return;
        }

        let keep_from = self
            .segments
            .iter()
            .position(|seg| !seg.is_confed())
            .unwrap_or(self.segments.len());
        self.segments.drain(..keep_from);
    }

    /// Remove every confederation segment from the chain. Returns false
    /// and leaves the path untouched when there is nothing to remove;
    /// otherwise the surviving chain is renormalized, since deleting a
    /// confed segment can make two sequences adjacent.
    pub fn strip_confeds(&mut self) -> bool {
        let before = self.segments.len();
        self.segments.retain(|seg| !seg.is_confed());
        if self.segments.len() == before {
            return false;
        }
        self.normalize();
        true
    }

    /// Content key for the intern store: each run of same-typed segments
    /// contributes its type code once, every member contributes its value.
    pub(crate) fn store_key(&self) -> u64 {
        let mut key: u64 = 0;
        let mut prev: Option<SegmentType> = None;
        for seg in &self.segments {
            let segment_type = seg.segment_type();
            if prev != Some(segment_type) {
                key = key.wrapping_add(u8::from(segment_type) as u64);
            }
            for asn in seg.asns() {
                key = key.wrapping_add(asn.to_u32() as u64);
            }
            prev = Some(segment_type);
        }
        key
    }

    /// Render this path under a display format.
    pub fn display(&self, format: AsnFormat) -> AsPathDisplay<'_> {
        AsPathDisplay { path: self, format }
    }

    /// Render to an owned string under a display format. Segments are
    /// space-separated; ordered members by spaces, unordered by commas;
    /// `{}` brackets a set, `[]` a confed set, `()` a confed sequence.
    pub fn to_string_with(&self, format: AsnFormat) -> String {
        self.display(format).to_string()
    }
}

/// Helper struct for rendering an [AsPath] under an [AsnFormat], obtained
/// from [AsPath::display].
pub struct AsPathDisplay<'a> {
    path: &'a AsPath,
    format: AsnFormat,
}

impl Display for AsPathDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, segment) in self.path.segments.iter().enumerate() {
            if index != 0 {
                write!(f, " ")?;
            }

            let (brackets, separator) = match segment.segment_type() {
                SegmentType::AsSequence => (None, ' '),
                SegmentType::ConfedSequence => (Some(('(', ')')), ' '),
                SegmentType::AsSet => (Some(('{', '}')), ','),
                SegmentType::ConfedSet => (Some(('[', ']')), ','),
            };

            if let Some((open, _)) = brackets {
                write!(f, "{open}")?;
            }
            for (i, asn) in segment.asns().iter().enumerate() {
                if i != 0 {
                    write!(f, "{separator}")?;
                }
                write!(f, "{}", asn.display(self.format))?;
            }
            if let Some((_, close)) = brackets {
                write!(f, "{close}")?;
            }
        }

        Ok(())
    }
}

impl Display for AsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.display(AsnFormat::Plain), f)
    }
}
