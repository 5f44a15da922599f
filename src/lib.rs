/*!
`bgp-aspath` is the AS_PATH engine of a BGP speaker: it parses,
normalizes, interns, composes, compares, encodes, and renders the AS_PATH
attribute carried in BGP UPDATE messages (RFC 4271 §4.3, RFC 5065,
RFC 6793).

The crate has three layers:

- **[models]** -- the data model: [Asn] with its display formats,
  [AsPathSegment], and the mutable [AsPath] value with the whole
  composition and query surface (prepend, aggregate, loop check,
  confederation stripping, hop counts, rendering).
- **[wire]** -- the codec. [wire::decode_as_path] turns an attribute body
  into a normalized path; [wire::wire_size] precomputes the exact octet
  count [wire::encode_as_path] will write, including four-octet
  `AS_TRANS` substitution and over-length segment splitting, so the outer
  attribute length can be committed before emission.
- **[store]** -- [AsPathStore], the per-instance intern table. Paths with
  the same meaning share one immutable [InternedAsPath] allocation, so
  equality is pointer equality and every path's rendering is computed
  once.

# Examples

Ingress: decode an attribute body, intern it, query it.

```rust
use bgp_aspath::{AsPathStore, AsnLength, Asn};

let mut store = AsPathStore::new();
let attr = [
    0x02, 0x03, // AS_SEQUENCE of 3
    0x00, 0x00, 0x00, 0x0a, // AS10
    0x00, 0x00, 0x00, 0x14, // AS20
    0x00, 0x00, 0x00, 0x1e, // AS30
];

let path = store.decode(&attr, AsnLength::Bits32).unwrap();
assert_eq!("10 20 30", path.as_str());
assert_eq!(3, path.count_hops());
assert_eq!(0, path.loop_check(Asn::new(65001)));
```

Egress: compose a fresh draft from a shared path, intern the result, and
emit it at the session's ASN width.

```rust
use bgp_aspath::{wire, AsPath, AsPathStore, AsnLength, Asn};

let mut store = AsPathStore::new();
let learned = store.intern(AsPath::from_sequence([10, 20, 30]));

let mut draft = learned.path().clone();
draft.add_sequence(Asn::new(65001));
let advertised = store.intern(draft);
assert_eq!("65001 10 20 30", advertised.as_str());

let size = wire::wire_size(advertised.path(), AsnLength::Bits16);
let body = advertised.path().encode(AsnLength::Bits16);
assert_eq!(size, body.len());
```
*/
pub mod error;
pub mod models;
pub mod store;
mod text;
pub mod wire;

pub use crate::error::AsPathError;
pub use crate::models::*;
pub use crate::store::{AsPathStore, InternedAsPath};
pub use crate::wire::{decode_as_path, encode_as_path, wire_size};
