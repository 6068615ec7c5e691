use crate::{
    Result,
    constants::{MAX_DISPLAY_NAME_LENGTH, MAX_IDENTITY_ID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an enrolled identity.
///
/// Identifiers come from the external user registry and are treated as
/// opaque. They are trimmed on construction and must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

impl IdentityId {
    /// Create a new identity identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if the identifier is empty after trimming
    /// or longer than `MAX_IDENTITY_ID_LENGTH` bytes.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();

        if id.is_empty() {
            return Err(Error::InvalidInput(
                "Identity id must not be empty".to_string(),
            ));
        }

        if id.len() > MAX_IDENTITY_ID_LENGTH {
            return Err(Error::InvalidInput(format!(
                "Identity id must be at most {MAX_IDENTITY_ID_LENGTH} bytes, got {}",
                id.len()
            )));
        }

        Ok(IdentityId(id.to_string()))
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        IdentityId(uuid::Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for IdentityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        IdentityId::new(s)
    }
}

impl TryFrom<String> for IdentityId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        IdentityId::new(&value)
    }
}

impl From<IdentityId> for String {
    fn from(value: IdentityId) -> Self {
        value.0
    }
}

/// An enrolled person: stable identifier plus display name.
///
/// Owned by the user registry; the access engine only ever holds copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: String,
}

impl Identity {
    /// Create a new identity.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if the display name is empty or too long.
    pub fn new(id: IdentityId, display_name: &str) -> Result<Self> {
        let display_name = display_name.trim();

        if display_name.is_empty() {
            return Err(Error::InvalidInput(
                "Display name must not be empty".to_string(),
            ));
        }

        if display_name.len() > MAX_DISPLAY_NAME_LENGTH {
            return Err(Error::InvalidInput(format!(
                "Display name must be at most {MAX_DISPLAY_NAME_LENGTH} bytes"
            )));
        }

        Ok(Self {
            id,
            display_name: display_name.to_string(),
        })
    }

    /// Create an identity whose id and display name are the same string.
    ///
    /// Convenient for registries that key people by username.
    pub fn named(name: &str) -> Result<Self> {
        Self::new(IdentityId::new(name)?, name)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}

/// Fixed-length numeric feature vector describing one face.
///
/// Values must be finite and the vector non-empty. Two signatures can only
/// be compared when their dimensions agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct FaceSignature(Vec<f64>);

impl FaceSignature {
    /// Create a signature from raw values.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if `values` is empty or contains NaN or
    /// infinite components.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidInput(
                "Signature must not be empty".to_string(),
            ));
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "Signature component {index} is not finite"
            )));
        }

        Ok(FaceSignature(values))
    }

    /// Number of components.
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Borrow the components.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consume the signature, returning its components.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Fail with `Error::InvalidSignature` unless `other` has the same dimension.
    pub fn ensure_same_dimension(&self, other: &FaceSignature) -> Result<()> {
        if self.dimension() != other.dimension() {
            return Err(Error::InvalidSignature {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        Ok(())
    }

    /// Euclidean distance to another signature.
    ///
    /// # Errors
    /// Returns `Error::InvalidSignature` if the dimensions differ.
    pub fn euclidean_distance(&self, other: &FaceSignature) -> Result<f64> {
        self.ensure_same_dimension(other)?;

        let sum: f64 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();

        Ok(sum.sqrt())
    }

    /// Element-wise mean of one or more samples.
    ///
    /// The centroid of a single sample is that sample, unchanged.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` for an empty slice and
    /// `Error::InvalidSignature` if the samples disagree on dimension.
    pub fn centroid(samples: &[FaceSignature]) -> Result<FaceSignature> {
        let (first, rest) = samples
            .split_first()
            .ok_or_else(|| Error::InvalidInput("Cannot reduce zero samples".to_string()))?;

        if rest.is_empty() {
            return Ok(first.clone());
        }

        let mut sums = first.0.clone();
        for sample in rest {
            first.ensure_same_dimension(sample)?;
            for (acc, value) in sums.iter_mut().zip(&sample.0) {
                *acc += value;
            }
        }

        let count = samples.len() as f64;
        sums.iter_mut().for_each(|v| *v /= count);

        Ok(FaceSignature(sums))
    }
}

impl TryFrom<Vec<f64>> for FaceSignature {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        FaceSignature::new(values)
    }
}

impl From<FaceSignature> for Vec<f64> {
    fn from(signature: FaceSignature) -> Self {
        signature.0
    }
}

/// One comparable entry: an identity and the signature it is matched by.
///
/// For multi-sample enrollments the signature is the centroid of all stored
/// samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub identity: Identity,
    pub signature: FaceSignature,
}

impl Candidate {
    pub fn new(identity: Identity, signature: FaceSignature) -> Self {
        Self {
            identity,
            signature,
        }
    }
}

/// How repeated enrollments of the same identity are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentPolicy {
    /// Keep every sample; compare against their centroid.
    #[default]
    MultiSample,

    /// Keep only the latest sample.
    SingleActive,
}

impl EnrollmentPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentPolicy::MultiSample => "multi_sample",
            EnrollmentPolicy::SingleActive => "single_active",
        }
    }
}

impl fmt::Display for EnrollmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrollmentPolicy {
    type Err = Error;

    /// Accepts `multi_sample` / `multi` and `single_active` / `single`,
    /// with dashes or underscores.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "multi_sample" | "multi" => Ok(EnrollmentPolicy::MultiSample),
            "single_active" | "single" => Ok(EnrollmentPolicy::SingleActive),
            _ => Err(Error::Config(format!("Unknown enrollment policy: {s}"))),
        }
    }
}

/// Actuators mirrored from the controller board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Fan,
    Lights,
}

impl DeviceKind {
    /// Every device the controller reports, in display order.
    pub const ALL: [DeviceKind; 2] = [DeviceKind::Fan, DeviceKind::Lights];

    /// Lowercase identifier used in packets and APIs ("fan", "lights").
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Fan => "fan",
            DeviceKind::Lights => "lights",
        }
    }

    /// Uppercase token used in outbound commands ("FAN", "LIGHTS").
    #[must_use]
    pub fn command_token(self) -> &'static str {
        match self {
            DeviceKind::Fan => "FAN",
            DeviceKind::Lights => "LIGHTS",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            DeviceKind::Fan => "Fan",
            DeviceKind::Lights => "Lights",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = Error;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fan" => Ok(DeviceKind::Fan),
            "lights" => Ok(DeviceKind::Lights),
            _ => Err(Error::UnknownDevice(s.to_string())),
        }
    }
}

/// Power state of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    #[default]
    Off,
}

impl PowerState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PowerState::On => "on",
            PowerState::Off => "off",
        }
    }

    #[must_use]
    pub fn command_token(self) -> &'static str {
        match self {
            PowerState::On => "ON",
            PowerState::Off => "OFF",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, PowerState::On)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PowerState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(PowerState::On),
            "off" => Ok(PowerState::Off),
            _ => Err(Error::InvalidPowerState(s.to_string())),
        }
    }
}

/// Outcome of one authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Matched,
    Rejected,
}

impl Verdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Matched => "matched",
            Verdict::Rejected => "rejected",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_matched(self) -> bool {
        matches!(self, Verdict::Matched)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verdict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "matched" => Ok(Verdict::Matched),
            "rejected" => Ok(Verdict::Rejected),
            _ => Err(Error::InvalidInput(format!("Unknown verdict: {s}"))),
        }
    }
}
