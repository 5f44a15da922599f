/*!
Content-keyed intern store for AS paths.

Every distinct normalized path is held once, behind an [Arc]; the strong
count is the reference count, so retaining a path is an `Arc::clone` and
[AsPathStore::release] prunes the entry when the store holds the last
reference. Interned paths are immutable and carry their rendering,
computed once under the display format in effect at intern time.

One store belongs to one BGP instance. All mutating calls take `&mut
self`; wrap the store in a mutex before sharing it across threads.
*/
use crate::error::AsPathError;
use crate::models::*;
use crate::wire;
use log::debug;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Initial bucket capacity, sized for a full-table BGP speaker.
const STORE_CAPACITY: usize = 32 * 1024;

/// An immutable, shared AS path plus its cached rendering.
///
/// Obtained from [AsPathStore::intern]; dereferences to [AsPath] for the
/// whole query surface. Mutating compositions start from a clone of the
/// body: `interned.path().clone()`.
#[derive(Debug)]
pub struct InternedAsPath {
    path: AsPath,
    repr: String,
}

impl InternedAsPath {
    pub fn path(&self) -> &AsPath {
        &self.path
    }

    /// The rendering cached at intern time.
    pub fn as_str(&self) -> &str {
        &self.repr
    }
}

impl Deref for InternedAsPath {
    type Target = AsPath;

    fn deref(&self) -> &AsPath {
        &self.path
    }
}

impl PartialEq for InternedAsPath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for InternedAsPath {}

impl Hash for InternedAsPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl Display for InternedAsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr)
    }
}

/// The AS path subsystem of one BGP instance: the intern table and the
/// process-wide ASN display format.
pub struct AsPathStore {
    format: AsnFormat,
    buckets: HashMap<u64, SmallVec<[Arc<InternedAsPath>; 1]>>,
}

impl Default for AsPathStore {
    fn default() -> Self {
        AsPathStore::new()
    }
}

impl AsPathStore {
    pub fn new() -> AsPathStore {
        AsPathStore::with_format(AsnFormat::default())
    }

    pub fn with_format(format: AsnFormat) -> AsPathStore {
        AsPathStore {
            format,
            buckets: HashMap::with_capacity(STORE_CAPACITY),
        }
    }

    pub fn format(&self) -> AsnFormat {
        self.format
    }

    /// Change the display format for paths interned from here on. Cached
    /// renderings of already-interned paths keep the format they were
    /// created under.
    pub fn set_format(&mut self, format: AsnFormat) {
        self.format = format;
    }

    /// Normalize `path` and return the shared object for its content,
    /// installing the draft if it is the first of its kind. Equal-meaning
    /// drafts always come back as the same allocation:
    ///
    /// ```rust
    /// use bgp_aspath::{AsPath, AsPathStore};
    /// use std::sync::Arc;
    ///
    /// let mut store = AsPathStore::new();
    /// let a = store.intern(AsPath::from_sequence([1, 2, 3]));
    /// let b = store.intern("1 2 3".parse().unwrap());
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn intern(&mut self, mut path: AsPath) -> Arc<InternedAsPath> {
        path.normalize();
        let bucket = self.buckets.entry(path.store_key()).or_default();
        if let Some(existing) = bucket.iter().find(|entry| entry.path == path) {
            return Arc::clone(existing);
        }

        let repr = path.to_string_with(self.format);
        let entry = Arc::new(InternedAsPath { path, repr });
        bucket.push(Arc::clone(&entry));
        entry
    }

    /// The interned empty path. Empty is a first-class value, distinct
    /// from an absent attribute.
    pub fn empty(&mut self) -> Arc<InternedAsPath> {
        self.intern(AsPath::new())
    }

    /// Parse one AS_PATH attribute body and intern the result; the entry
    /// point for UPDATE ingress.
    pub fn decode(
        &mut self,
        input: &[u8],
        asn_len: AsnLength,
    ) -> Result<Arc<InternedAsPath>, AsPathError> {
        Ok(self.intern(wire::decode_as_path(input, asn_len)?))
    }

    /// Hand a reference back. When the store holds the last remaining
    /// reference the entry is removed and freed. Every `Arc` cloned out of
    /// the store should eventually come back through here, or the entry
    /// outlives its users.
    pub fn release(&mut self, path: Arc<InternedAsPath>) {
        let key = path.path.store_key();
        drop(path);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.retain(|entry| Arc::strong_count(entry) > 1);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Census of interned paths.
    pub fn len(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Four-octet compatibility join: take the first `hops` hops of
    /// `left` (sequence and confed-sequence members count one each, a set
    /// of either kind counts one), prepend them to the whole of `right`,
    /// and intern the normalized result. Both inputs are released.
    ///
    /// When the cut would land inside a confederation sequence the
    /// reconstructed `right` cannot be grafted without losing
    /// information, so the join fails soft: `right` is released and
    /// `left` comes back unchanged.
    pub fn truncate_join(
        &mut self,
        left: Arc<InternedAsPath>,
        right: Arc<InternedAsPath>,
        hops: usize,
    ) -> Arc<InternedAsPath> {
        let mut joined = AsPath::new();
        let mut remaining = hops;

        for segment in left.path().segments() {
            if remaining == 0 {
                break;
            }
            match segment {
                AsPathSegment::AsSequence(members) | AsPathSegment::ConfedSequence(members) => {
                    if remaining < members.len() {
                        if segment.is_confed() {
                            debug!(
                                "truncating {left} at {hops} hops would split a \
                                 confederation sequence, keeping the existing path"
                            );
                            self.release(right);
                            return left;
                        }
                        joined.append_segment(AsPathSegment::new(
                            segment.segment_type(),
                            members[..remaining].to_vec(),
                        ));
                        remaining = 0;
                    } else {
                        remaining -= members.len();
                        joined.append_segment(segment.clone());
                    }
                }
                AsPathSegment::AsSet(_) | AsPathSegment::ConfedSet(_) => {
                    remaining -= 1;
                    joined.append_segment(segment.clone());
                }
            }
        }

        joined
            .segments
            .extend(right.path().segments().iter().cloned());
        self.release(left);
        self.release(right);
        self.intern(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedups_equivalent_paths() {
        let mut store = AsPathStore::new();

        let split = wire::decode_as_path(
            &[2, 2, 0, 1, 0, 2, 2, 1, 0, 3],
            AsnLength::Bits16,
        )
        .unwrap();
        let whole = wire::decode_as_path(&[2, 3, 0, 1, 0, 2, 0, 3], AsnLength::Bits16).unwrap();

        let a = store.intern(split);
        let b = store.intern(whole);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(1, store.len());
        assert_eq!("1 2 3", a.as_str());
    }

    #[test]
    fn test_intern_distinguishes_segment_types() {
        let mut store = AsPathStore::new();
        // same members, different segment types
        let seq = store.intern(AsPath::from_segments(vec![AsPathSegment::sequence([1])]));
        let set = store.intern(AsPath::from_segments(vec![AsPathSegment::set([1])]));
        assert!(!Arc::ptr_eq(&seq, &set));
        assert_eq!(2, store.len());
    }

    #[test]
    fn test_release_prunes_at_last_reference() {
        let mut store = AsPathStore::new();
        let a = store.intern(AsPath::from_sequence([5, 6]));
        let retained = Arc::clone(&a);
        assert_eq!(1, store.len());

        store.release(a);
        assert_eq!(1, store.len(), "still retained elsewhere");

        store.release(retained);
        assert_eq!(0, store.len());
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_path_is_first_class() {
        let mut store = AsPathStore::new();
        let empty = store.empty();
        assert!(empty.is_empty());
        assert_eq!("", empty.as_str());
        assert!(Arc::ptr_eq(&empty, &store.empty()));
    }

    #[test]
    fn test_format_applies_at_intern_time() {
        let mut store = AsPathStore::with_format(AsnFormat::Dot);
        let a = store.intern(AsPath::from_sequence([65546]));
        assert_eq!("1.10", a.as_str());

        store.set_format(AsnFormat::Plain);
        let b = store.intern(AsPath::from_sequence([65547]));
        assert_eq!("65547", b.as_str());
        // already-interned rendering is unchanged
        assert_eq!("1.10", a.as_str());
    }

    #[test]
    fn test_decode_interns() {
        let mut store = AsPathStore::new();
        let a = store
            .decode(&[2, 2, 0, 10, 0, 20], AsnLength::Bits16)
            .unwrap();
        assert_eq!("10 20", a.as_str());
        assert!(store.decode(&[2, 0], AsnLength::Bits16).is_err());
    }

    #[test]
    fn test_truncate_join_mid_sequence() {
        let mut store = AsPathStore::new();
        let left = store.intern(AsPath::from_sequence([1, 2, 3, 4]));
        let right = store.intern(AsPath::from_sequence([70001, 70002]));

        let joined = store.truncate_join(left, right, 2);
        assert_eq!("1 2 70001 70002", joined.as_str());
        assert_eq!(1, store.len());
    }

    #[test]
    fn test_truncate_join_counts_sets_as_one_hop() {
        let mut store = AsPathStore::new();
        let left = store.intern(AsPath::from_segments(vec![
            AsPathSegment::sequence([1]),
            AsPathSegment::set([2, 3]),
            AsPathSegment::sequence([4]),
        ]));
        let right = store.intern(AsPath::from_sequence([9]));

        let joined = store.truncate_join(left, right, 2);
        assert_eq!("1 {2,3} 9", joined.as_str());
    }

    #[test]
    fn test_truncate_join_full_left() {
        let mut store = AsPathStore::new();
        let left = store.intern(AsPath::from_sequence([1, 2]));
        let right = store.intern(AsPath::from_sequence([3]));

        let joined = store.truncate_join(left, right, 10);
        assert_eq!("1 2 3", joined.as_str());
    }

    #[test]
    fn test_truncate_join_refuses_to_split_confed_sequence() {
        let mut store = AsPathStore::new();
        let left = store.intern(AsPath::from_segments(vec![
            AsPathSegment::ConfedSequence(vec![Asn::new(64512), Asn::new(64513)]),
            AsPathSegment::sequence([1]),
        ]));
        let right = store.intern(AsPath::from_sequence([70001]));
        let left_ptr = Arc::as_ptr(&left);

        let result = store.truncate_join(left, right, 1);
        assert_eq!(left_ptr, Arc::as_ptr(&result));
        assert_eq!(1, store.len(), "right was released");
    }
}
