//! Identifier type registry.
//!
//! The closed set of lookup categories the bot supports. Each kind carries
//! its display name, lookup endpoint path, example value, and validation
//! pattern as data, so adding a category is a data change rather than a new
//! branch in the conversation flow.

use std::sync::LazyLock;

use regex::Regex;

/// A supported lookup category.
///
/// The variant order is the menu order shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Phone,
    Aadhaar,
    Gst,
    Upi,
    Ifsc,
    Pincode,
    Vehicle,
}

/// Static data describing one identifier kind.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierSpec {
    /// Unique short code, also used as the button callback payload.
    pub key: &'static str,
    /// Display name shown on menu buttons and prompts.
    pub name: &'static str,
    /// Path + query prefix on the lookup service; the percent-encoded value
    /// is appended verbatim.
    pub endpoint_path: &'static str,
    /// Example value shown in the prompt placeholder.
    pub example: &'static str,
    /// Anchored full-string validation pattern. Case-sensitive: GST and
    /// IFSC require uppercase letters and no normalization is performed.
    pub pattern: &'static str,
}

const PHONE: IdentifierSpec = IdentifierSpec {
    key: "phone",
    name: "📱 Phone Number",
    endpoint_path: "/search_phone?number=",
    example: "9876543210",
    pattern: r"^[0-9]{10}$",
};

const AADHAAR: IdentifierSpec = IdentifierSpec {
    key: "aadhaar",
    name: "🆔 Aadhaar Card",
    endpoint_path: "/search_aadhaar?aadhaar=",
    example: "123456789012",
    pattern: r"^[0-9]{12}$",
};

const GST: IdentifierSpec = IdentifierSpec {
    key: "gst",
    name: "🏢 GST Number",
    endpoint_path: "/search_gst?gst=",
    example: "27ABCDE1234F1Z5",
    pattern: r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z]{1}[1-9A-Z]{1}Z[0-9A-Z]{1}$",
};

const UPI: IdentifierSpec = IdentifierSpec {
    key: "upi",
    name: "💸 UPI ID",
    endpoint_path: "/search_upi?upi=",
    example: "username@bank",
    pattern: r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9]+$",
};

const IFSC: IdentifierSpec = IdentifierSpec {
    key: "ifsc",
    name: "🏦 IFSC Code",
    endpoint_path: "/search_ifsc?ifsc=",
    example: "SBIN0001234",
    pattern: r"^[A-Z]{4}0[A-Z0-9]{6}$",
};

const PINCODE: IdentifierSpec = IdentifierSpec {
    key: "pincode",
    name: "📮 Pincode",
    endpoint_path: "/search_pincode?pincode=",
    example: "110001",
    pattern: r"^[0-9]{6}$",
};

const VEHICLE: IdentifierSpec = IdentifierSpec {
    key: "vehicle",
    name: "🚗 Vehicle RC",
    endpoint_path: "/search_vehicle?rc=",
    example: "UP32QP0001",
    pattern: r"^[A-Z]{2}[0-9]{1,2}[A-Z]{1,2}[0-9]{1,4}$",
};

// Compiled once on first use. The patterns are static constants; the
// `anchored_patterns` test exercises every one of them.
#[allow(clippy::expect_used)]
static COMPILED: LazyLock<[Regex; IdentifierKind::ALL.len()]> = LazyLock::new(|| {
    IdentifierKind::ALL
        .map(|kind| Regex::new(kind.spec().pattern).expect("static pattern compiles"))
});

impl IdentifierKind {
    /// All supported kinds, in menu order.
    pub const ALL: [IdentifierKind; 7] = [
        Self::Phone,
        Self::Aadhaar,
        Self::Gst,
        Self::Upi,
        Self::Ifsc,
        Self::Pincode,
        Self::Vehicle,
    ];

    /// Look up a kind by its registry key. Returns `None` for unknown keys.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.spec().key == key)
    }

    /// Static spec for this kind.
    #[must_use]
    pub fn spec(self) -> &'static IdentifierSpec {
        match self {
            Self::Phone => &PHONE,
            Self::Aadhaar => &AADHAAR,
            Self::Gst => &GST,
            Self::Upi => &UPI,
            Self::Ifsc => &IFSC,
            Self::Pincode => &PINCODE,
            Self::Vehicle => &VEHICLE,
        }
    }

    /// Registry key for this kind.
    #[must_use]
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Display name for this kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Validate a raw input against this kind's pattern.
    ///
    /// Full-string match only: the patterns are anchored and `$` in the
    /// regex crate means end of haystack, so partial matches, embedded
    /// values, and trailing newlines are all rejected.
    #[must_use]
    pub fn validate(self, raw: &str) -> bool {
        COMPILED[self.index()].is_match(raw)
    }

    fn index(self) -> usize {
        match self {
            Self::Phone => 0,
            Self::Aadhaar => 1,
            Self::Gst => 2,
            Self::Upi => 3,
            Self::Ifsc => 4,
            Self::Pincode => 5,
            Self::Vehicle => 6,
        }
    }
}
