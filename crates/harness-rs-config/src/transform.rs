//! Sentinel values that expand into generated content.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Sentinel that requests a fresh temporary directory.
pub const TEMP_DIR_SENTINEL: &str = "__TMP_DIR__";
/// Prefix of temporary directories allocated for sentinel fields.
pub const TEMP_DIR_PREFIX: &str = "harness";

const RANDOM_PREFIX: &str = "__RND_";
const RANDOM_SUFFIX: &str = "__";
/// Upper bound on generated string length.
pub const MAX_RANDOM_LENGTH: usize = 4096;

/// Pending transform for a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Store the value as-is.
    None,
    /// Replace the value with a new temporary directory path.
    TempDir,
    /// Replace the value with this many random alphanumeric characters.
    RandomString(usize),
}

impl Transform {
    /// Classify a raw string value.
    ///
    /// `__TMP_DIR__` must match exactly. `__RND_<n>__` may appear anywhere in
    /// the value, and the whole value is replaced by `n` random characters.
    /// A marker with something other than a decimal length is an error.
    pub fn detect(value: &str) -> Result<Self, String> {
        if value == TEMP_DIR_SENTINEL {
            return Ok(Transform::TempDir);
        }
        let mut malformed = None;
        for (start, _) in value.match_indices(RANDOM_PREFIX) {
            let rest = &value[start + RANDOM_PREFIX.len()..];
            let Some(end) = rest.find(RANDOM_SUFFIX) else {
                continue;
            };
            let length = &rest[..end];
            if !length.is_empty() && length.bytes().all(|b| b.is_ascii_digit()) {
                return random_length(length).map(Transform::RandomString);
            }
            malformed.get_or_insert(length);
        }
        match malformed {
            Some(length) => Err(format!("invalid random string length {length:?}")),
            None => Ok(Transform::None),
        }
    }
}

fn random_length(digits: &str) -> Result<usize, String> {
    let length = digits
        .parse::<usize>()
        .map_err(|err| format!("invalid random string length {digits:?}: {err}"))?;
    if length > MAX_RANDOM_LENGTH {
        return Err(format!(
            "random string length {length} exceeds {MAX_RANDOM_LENGTH}"
        ));
    }
    Ok(length)
}

/// Generate `length` random alphanumeric characters.
pub fn random_string<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}
