use crate::error::AsPathError;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// AS number length on the wire: 16 or 32 bits, negotiated per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsnLength {
    Bits16,
    Bits32,
}

impl AsnLength {
    pub const fn is_four_byte(&self) -> bool {
        match self {
            AsnLength::Bits16 => false,
            AsnLength::Bits32 => true,
        }
    }

    /// Octets one ASN occupies on the wire at this length.
    pub const fn octets(&self) -> usize {
        match self {
            AsnLength::Bits16 => 2,
            AsnLength::Bits32 => 4,
        }
    }
}

/// ASN -- Autonomous System Number
///
/// Stored as the full 32-bit value regardless of session wire width;
/// two-octet values read off the wire are zero-extended.
#[derive(Clone, Copy, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Asn {
    asn: u32,
}

impl Ord for Asn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.asn.cmp(&other.asn)
    }
}

impl PartialOrd for Asn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Asn {
    fn eq(&self, other: &Self) -> bool {
        self.asn == other.asn
    }
}

impl Hash for Asn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.asn.hash(state);
    }
}

impl Asn {
    /// ASN 0, reserved by RFC 7607.
    pub const RESERVED: Self = Asn::new(0);
    /// AS_TRANS, the two-octet placeholder for four-octet ASNs (RFC 6793).
    #[doc(alias("AS_TRANS"))]
    pub const TRANSITION: Self = Asn::new(23456);
    /// Largest value representable in a two-octet field.
    pub const MAX16: u32 = u16::MAX as u32;

    #[inline]
    pub const fn new(asn: u32) -> Self {
        Asn { asn }
    }

    /// Gets the wire width required to carry this ASN without substitution.
    pub const fn required_len(&self) -> AsnLength {
        if self.asn <= Asn::MAX16 {
            return AsnLength::Bits16;
        }

        AsnLength::Bits32
    }

    /// Whether the value survives a two-octet encoding as itself.
    #[inline]
    pub const fn fits_two_octets(&self) -> bool {
        self.asn <= Asn::MAX16
    }

    /// Checks if the given ASN is reserved for private use.
    ///
    /// <https://datatracker.ietf.org/doc/rfc6996/>
    #[inline]
    pub const fn is_private(&self) -> bool {
        match self.asn {
            64512..=65534 => true,           // reserved by RFC6996
            4200000000..=4294967294 => true, // reserved by RFC6996
            _ => false,
        }
    }

    /// Return AS number as u32.
    #[inline]
    pub const fn to_u32(&self) -> u32 {
        self.asn
    }

    /// Render this ASN under a display format.
    ///
    /// ```rust
    /// use bgp_aspath::{Asn, AsnFormat};
    /// assert_eq!("1.10", Asn::new(65546).display(AsnFormat::Dot).to_string());
    /// ```
    #[inline]
    pub const fn display(self, format: AsnFormat) -> AsnDisplay {
        AsnDisplay { asn: self, format }
    }
}

impl PartialEq<u32> for Asn {
    #[inline]
    fn eq(&self, other: &u32) -> bool {
        self.asn == *other
    }
}

impl From<u32> for Asn {
    #[inline]
    fn from(v: u32) -> Self {
        Asn::new(v)
    }
}

impl From<u16> for Asn {
    #[inline]
    fn from(v: u16) -> Self {
        Asn::new(v as u32)
    }
}

impl From<Asn> for u32 {
    #[inline]
    fn from(value: Asn) -> Self {
        value.asn
    }
}

impl Display for Asn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.asn)
    }
}

impl Debug for Asn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.asn)
    }
}

/// Parse an ASN in any of the four display forms: plain decimal
/// (`64512`), dotted (`1.10`), or dotted-quad (`0.1.0.10`). Three dotted
/// groups, more than four, a trailing dot, and out-of-range groups are
/// rejected.
impl FromStr for Asn {
    type Err = AsPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || AsPathError::MalformedText(format!("invalid AS number: {s:?}"));

        if s.is_empty() {
            return Err(bad());
        }

        let mut groups = [0u32; 4];
        let mut count = 0usize;
        for part in s.split('.') {
            if count == 4 || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            groups[count] = part.parse::<u32>().map_err(|_| bad())?;
            count += 1;
        }

        match (count, groups) {
            (1, [value, ..]) => Ok(Asn::new(value)),
            (2, [hi, lo, ..]) if hi <= 0xffff && lo <= 0xffff => Ok(Asn::new((hi << 16) | lo)),
            (4, octets) if octets.iter().all(|&o| o <= 0xff) => Ok(Asn::new(
                (octets[0] << 24) | (octets[1] << 16) | (octets[2] << 8) | octets[3],
            )),
            _ => Err(bad()),
        }
    }
}

/// ASN display format, a process-wide presentation setting.
///
/// Rendering is strict (follows the selected format); parsing is liberal
/// and accepts every form regardless of the format in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsnFormat {
    /// Full 32-bit decimal value.
    #[default]
    Plain,
    /// `hi.lo` halves when the value needs four octets, decimal otherwise.
    Dot,
    /// Always `hi.lo`, with values below 65536 shown as `0.n`.
    DotPlus,
    /// The four octets of the value, dotted-quad style.
    Ip,
}

/// Helper struct for rendering an [Asn] under an [AsnFormat], obtained
/// from [Asn::display].
#[derive(Debug, Clone, Copy)]
pub struct AsnDisplay {
    asn: Asn,
    format: AsnFormat,
}

impl Display for AsnDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = self.asn.to_u32();
        match self.format {
            AsnFormat::Plain => write!(f, "{value}"),
            AsnFormat::Dot if value <= Asn::MAX16 => write!(f, "{value}"),
            AsnFormat::Dot | AsnFormat::DotPlus => {
                write!(f, "{}.{}", value >> 16, value & 0xffff)
            }
            AsnFormat::Ip => write!(
                f,
                "{}.{}.{}.{}",
                value >> 24,
                (value >> 16) & 0xff,
                (value >> 8) & 0xff,
                value & 0xff
            ),
        }
    }
}
